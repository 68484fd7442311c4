/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// 初始化 tracing
///
/// 日志级别读取 `RUST_LOG`，默认 `generate_ideas=info,tower_http=info`
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "generate_ideas=info,activity=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 想法生成服务启动");
    info!("🌐 监听地址: {}", config.bind_addr);
    info!("📚 文档API: {}", config.doc_api_base_url);
    info!("📁 PDF 目录: {}", config.pdf_folder);
    info!(
        "🤖 LLM 生成: {}",
        if config.llm_enabled() {
            config.llm_model_name.as_str()
        } else {
            "关闭（直接使用 PDF 原文）"
        }
    );
    if config.amqp_enabled() {
        info!(
            "📨 活动消息: RabbitMQ {} (exchange: {})",
            config.amqp_uri(),
            config.exchange_name
        );
    } else {
        info!("📨 活动消息: 本地文件 {}", config.activity_log_file);
    }
    info!(
        "📧 成员通知: {}",
        if config.notify_on_generate { "开启" } else { "关闭" }
    );
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("项目想法生成", 4), "项目想法...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
