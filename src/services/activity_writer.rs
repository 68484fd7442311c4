//! 活动写入服务 - 业务能力层
//!
//! 只负责"发送日志 / 通知"能力，不关心流程

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ActivityError;
use crate::models::{LogEntry, Notification};

/// 日志 / 通知发送能力
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn send_log(&self, entry: &LogEntry) -> Result<(), ActivityError>;

    async fn send_notification(&self, notification: &Notification) -> Result<(), ActivityError>;
}

/// 活动写入服务
///
/// 每条消息都会作为结构化事件输出到 tracing；
/// 配置了文件路径时再以 JSON lines 追加到文件。
pub struct ActivityWriter {
    log_file_path: Option<PathBuf>,
}

impl ActivityWriter {
    pub fn new(config: &Config) -> Self {
        if config.activity_log_file.trim().is_empty() {
            Self::tracing_only()
        } else {
            Self::with_path(&config.activity_log_file)
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: Some(path.into()),
        }
    }

    /// 只输出到 tracing
    pub fn tracing_only() -> Self {
        Self {
            log_file_path: None,
        }
    }

    async fn append<T: Serialize>(&self, kind: &str, message: &T) -> Result<(), ActivityError> {
        let Some(path) = &self.log_file_path else {
            return Ok(());
        };

        let line = json!({ "kind": kind, "message": serde_json::to_value(message)? });
        let mut line = serde_json::to_string(&line)?;
        line.push('\n');

        let write_failed = |source: std::io::Error| ActivityError::WriteFailed {
            path: path.display().to_string(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(write_failed)?;
        file.write_all(line.as_bytes()).await.map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;

        debug!("写入活动日志: {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl ActivitySink for ActivityWriter {
    async fn send_log(&self, entry: &LogEntry) -> Result<(), ActivityError> {
        info!(
            target: "activity",
            sub_group_id = %entry.sub_group_id,
            user_id = entry.user_id.as_deref().unwrap_or("-"),
            action = %entry.action,
            timestamp = %entry.timestamp,
            "{}",
            entry.message
        );
        self.append("log", entry).await
    }

    async fn send_notification(&self, notification: &Notification) -> Result<(), ActivityError> {
        info!(
            target: "activity",
            email = %notification.email,
            subject = %notification.subject,
            "发送通知"
        );
        self.append("notification", notification).await
    }
}
