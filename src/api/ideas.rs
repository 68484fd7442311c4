//! 想法生成 / 上传接口

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use super::AppState;
use crate::error::AppResult;
use crate::models::{check_path_id, UploadRequest};
use crate::utils::logging::truncate_text;

/// `GET /ideas/generate/{subGroupId}/{userId}`
///
/// 提取小组 PDF 的文本，作为 md 文档上传
pub async fn generate_ideas(
    State(state): State<AppState>,
    Path((sub_group_id, user_id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    check_path_id("subGroupId", &sub_group_id)?;
    info!("[小组 {}] 🚀 用户 {} 请求生成想法", sub_group_id, user_id);

    let text = state.extractor.extract(&sub_group_id).await?;
    info!(
        "[小组 {}] 文档预览: {}",
        sub_group_id,
        truncate_text(&text, 80)
    );

    let request = UploadRequest::markdown(&sub_group_id, &user_id, text);
    let body = state.flow.run(&request).await?;

    Ok(Json(body))
}

/// `POST /ideas/upload`
///
/// 调用方提交的 JSON 原样作为文档内容
pub async fn upload(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Value>> {
    let request = UploadRequest::from_payload(payload)?;
    info!(
        "[小组 {}] 📥 收到 {} 文档上传",
        request.sub_group_id, request.file_type
    );

    let body = state.flow.run(&request).await?;

    Ok(Json(body))
}
