//! API 模块
//!
//! 对外暴露的 HTTP 接口，只做参数映射，流程交给 `workflow::UploadFlow`

pub mod ideas;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::error::{AppError, UploadError};
use crate::services::TextExtractor;
use crate::workflow::UploadFlow;

/// 所有 handler 共享的状态
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<UploadFlow>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl AppState {
    pub fn new(flow: UploadFlow, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            flow: Arc::new(flow),
            extractor,
        }
    }
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/ideas/generate/{sub_group_id}/{user_id}",
            get(ideas::generate_ideas),
        )
        .route("/ideas/upload", post(ideas::upload))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// 上传失败和"已写入但日志失败"使用不同的状态码，响应体保持固定格式
fn upload_status(err: &UploadError) -> StatusCode {
    match err {
        UploadError::Upload(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("请求处理失败: {}", self);

        match &self {
            AppError::Upload(err) => match err.body() {
                Some(body) => (upload_status(err), Json(body)).into_response(),
                None => internal_error(),
            },
            AppError::Request(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
            AppError::Api(_) | AppError::Config(_) | AppError::Extract(_) => internal_error(),
        }
    }
}

/// 未受保护的故障：不暴露结构化信息
fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
