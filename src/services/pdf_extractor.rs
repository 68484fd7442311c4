//! PDF 文本提取 - 业务能力层
//!
//! 按小组 ID 找到对应的 PDF，提取纯文本；配置了 LLM 时再整理成想法文档。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ExtractError;
use crate::models::is_safe_path_id;
use crate::services::LlmService;

/// 文本提取能力
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// 返回小组关联 PDF 的文本
    async fn extract(&self, sub_group_id: &str) -> Result<String, ExtractError>;
}

/// 从本地目录读取 `{subGroupId}.pdf`
pub struct PdfIdeasExtractor {
    pdf_folder: PathBuf,
    llm: Option<LlmService>,
}

impl PdfIdeasExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            pdf_folder: PathBuf::from(&config.pdf_folder),
            llm: config.llm_enabled().then(|| LlmService::new(config)),
        }
    }

    /// 只提取原文，不调用 LLM
    pub fn text_only(pdf_folder: impl Into<PathBuf>) -> Self {
        Self {
            pdf_folder: pdf_folder.into(),
            llm: None,
        }
    }

    /// 小组 ID 对应的 PDF 路径
    pub fn pdf_path(&self, sub_group_id: &str) -> Result<PathBuf, ExtractError> {
        if !is_safe_path_id(sub_group_id) {
            return Err(ExtractError::InvalidSubGroupId {
                sub_group_id: sub_group_id.to_string(),
            });
        }

        Ok(self.pdf_folder.join(format!("{sub_group_id}.pdf")))
    }
}

#[async_trait]
impl TextExtractor for PdfIdeasExtractor {
    async fn extract(&self, sub_group_id: &str) -> Result<String, ExtractError> {
        let path = self.pdf_path(sub_group_id)?;
        let text = extract_pdf_text(&path).await?;

        info!(
            "[小组 {}] ✓ PDF 文本提取完成，共 {} 字符",
            sub_group_id,
            text.chars().count()
        );

        match &self.llm {
            Some(llm) => {
                info!("[小组 {}] 🤖 正在生成想法...", sub_group_id);
                llm.generate_ideas(&text)
                    .await
                    .map_err(|e| ExtractError::Llm(e.to_string()))
            }
            None => Ok(text),
        }
    }
}

/// 提取 PDF 文本
///
/// pdf-extract 是同步且 CPU 密集的，放到 blocking 线程里执行；
/// 解析中的 panic 也会被当成解析失败。
pub async fn extract_pdf_text(path: &Path) -> Result<String, ExtractError> {
    let path_str = path.display().to_string();

    match tokio::fs::try_exists(path).await {
        Ok(true) => {}
        Ok(false) => return Err(ExtractError::PdfNotFound { path: path_str }),
        Err(e) => {
            return Err(ExtractError::ExtractionFailed {
                path: path_str,
                message: e.to_string(),
            })
        }
    }

    debug!("正在解析 PDF: {}", path_str);

    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text(&owned).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())
    .and_then(|r| r)
    .map_err(|message| ExtractError::ExtractionFailed {
        path: path_str.clone(),
        message,
    })?;

    if text.trim().is_empty() {
        return Err(ExtractError::EmptyText { path: path_str });
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_path_uses_sub_group_id() {
        let extractor = PdfIdeasExtractor::text_only("/data/pdfs");
        assert_eq!(
            extractor.pdf_path("G1").unwrap(),
            PathBuf::from("/data/pdfs/G1.pdf")
        );
    }

    #[test]
    fn test_pdf_path_rejects_traversal() {
        let extractor = PdfIdeasExtractor::text_only("/data/pdfs");
        for bad in ["", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(
                matches!(
                    extractor.pdf_path(bad),
                    Err(ExtractError::InvalidSubGroupId { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PdfIdeasExtractor::text_only(dir.path());

        let err = extractor.extract("G404").await.unwrap_err();
        assert!(matches!(err, ExtractError::PdfNotFound { .. }));
    }

    #[tokio::test]
    async fn test_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("G1.pdf"), b"definitely not a pdf").unwrap();
        let extractor = PdfIdeasExtractor::text_only(dir.path());

        let err = extractor.extract("G1").await.unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_path_is_not_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();

        // 父路径是普通文件，stat 返回 ENOTDIR 而不是 NotFound
        let err = extract_pdf_text(&file.join("G1.pdf")).await.unwrap_err();
        assert!(
            matches!(err, ExtractError::ExtractionFailed { .. }),
            "got {err:?}"
        );
    }
}
