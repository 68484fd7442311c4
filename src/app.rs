use crate::api::{self, AppState};
use crate::clients::{build_http_client, DocClient, SubGroupClient};
use crate::config::Config;
use crate::services::{ActivitySink, ActivityWriter, AmqpPublisher, PdfIdeasExtractor};
use crate::utils::logging;
use crate::workflow::UploadFlow;
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    router: Router,
}

impl App {
    /// 初始化应用：校验配置、组装客户端和流程
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        logging::log_startup(&config);

        let http = build_http_client(&config).context("无法创建 HTTP 客户端")?;

        let store = Arc::new(DocClient::new(&config, http.clone()));
        let activity: Arc<dyn ActivitySink> = if config.amqp_enabled() {
            Arc::new(AmqpPublisher::new(&config))
        } else {
            Arc::new(ActivityWriter::new(&config))
        };
        let mut flow = UploadFlow::new(store, activity);

        if config.notify_on_generate {
            flow = flow.with_notifications(Arc::new(SubGroupClient::new(&config, http)));
        }

        let extractor = Arc::new(PdfIdeasExtractor::new(&config));
        let router = api::router(AppState::new(flow, extractor));

        Ok(Self { config, router })
    }

    /// 运行 HTTP 服务，直到收到 Ctrl+C
    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("无法监听 {}", self.config.bind_addr))?;

        info!("✓ 服务已启动: http://{}", self.config.bind_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        info!("👋 服务已停止");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
}
