//! 上传流程 - 流程层
//!
//! 核心职责：定义"一次上传"的完整处理流程
//!
//! 流程顺序：
//! 1. 查询 (subGroupId, type) 是否已有文档
//! 2. 有 → 更新；没有 → 创建
//! 3. md 类型写入成功后：通知（可选）→ 日志
//! 4. 原样返回文档 API 的响应
//!
//! 查询和写入之间不是原子的，同一小组并发上传可能各自创建一份文档。

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{DocumentStore, UserDirectory};
use crate::error::{ActivityError, UploadError};
use crate::models::{LogEntry, Notification, UploadRequest, MARKDOWN_TYPE};
use crate::services::ActivitySink;

/// 上传流程
///
/// - 决定创建还是更新
/// - 决定何时发送日志 / 通知
/// - 不持有任何 HTTP 细节，只依赖能力 trait
pub struct UploadFlow {
    store: Arc<dyn DocumentStore>,
    activity: Arc<dyn ActivitySink>,
    directory: Option<Arc<dyn UserDirectory>>,
}

impl UploadFlow {
    /// 创建新的上传流程（不发送通知）
    pub fn new(store: Arc<dyn DocumentStore>, activity: Arc<dyn ActivitySink>) -> Self {
        Self {
            store,
            activity,
            directory: None,
        }
    }

    /// md 文档写入成功后同时通知小组成员
    pub fn with_notifications(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub async fn run(&self, request: &UploadRequest) -> Result<Value, UploadError> {
        self.upload(
            &request.sub_group_id,
            &request.file_type,
            &request.payload,
            request.user_id.as_deref(),
        )
        .await
    }

    /// 上传文档
    ///
    /// # 参数
    /// - `sub_group_id`: 小组 ID
    /// - `file_type`: 文档类型标签，`md` 时触发日志
    /// - `file_data`: 原样发送的请求体
    /// - `user_id`: 写日志用的用户 ID
    ///
    /// # 返回
    /// 文档 API 的 JSON 响应；失败时见 [`UploadError`]
    pub async fn upload(
        &self,
        sub_group_id: &str,
        file_type: &str,
        file_data: &Value,
        user_id: Option<&str>,
    ) -> Result<Value, UploadError> {
        let existing = self
            .store
            .exists(sub_group_id, file_type)
            .await
            .map_err(|e| {
                error!("[小组 {}] ❌ 查询已有文档失败: {}", sub_group_id, e);
                UploadError::Lookup(e)
            })?;

        let (action, result) = match existing {
            Some(doc_id) => {
                info!(
                    "[小组 {}] 📝 已存在 {} 文档 {}，执行更新",
                    sub_group_id, file_type, doc_id
                );
                ("update", self.store.update(&doc_id, file_data).await)
            }
            None => {
                info!(
                    "[小组 {}] 📤 没有 {} 文档，执行创建",
                    sub_group_id, file_type
                );
                ("create", self.store.create(file_data).await)
            }
        };

        let response = result.map_err(|e| {
            error!("[小组 {}] ❌ 上传文件失败: {}", sub_group_id, e);
            UploadError::Upload(e)
        })?;

        info!(
            "[小组 {}] ✓ 文档{}成功 (status: {})",
            sub_group_id,
            if action == "update" { "更新" } else { "创建" },
            response.status
        );

        if file_type == MARKDOWN_TYPE {
            self.send_side_effects(sub_group_id, user_id)
                .await
                .map_err(|e| {
                    error!(
                        "[小组 {}] ⚠️ 文档已写入，但发送通知/日志失败: {}",
                        sub_group_id, e
                    );
                    UploadError::Logging(e)
                })?;
        }

        response.json(action).map_err(|e| {
            error!("[小组 {}] ❌ 文档API响应不是合法 JSON: {}", sub_group_id, e);
            UploadError::MalformedResponse(e)
        })
    }

    /// 通知（如果启用）后写日志
    async fn send_side_effects(
        &self,
        sub_group_id: &str,
        user_id: Option<&str>,
    ) -> Result<(), ActivityError> {
        if self.directory.is_some() {
            self.notify_users(sub_group_id).await?;
        }

        if user_id.is_none() {
            warn!("[小组 {}] 请求没有携带 userId，日志中用户为空", sub_group_id);
        }

        self.activity
            .send_log(&LogEntry::generate_ideas(sub_group_id, user_id))
            .await
    }

    /// 给小组每位成员发送"想法已生成"通知
    ///
    /// # 返回
    /// 发送的通知数量；未启用通知时为 0
    pub async fn notify_users(&self, sub_group_id: &str) -> Result<usize, ActivityError> {
        let Some(directory) = &self.directory else {
            return Ok(0);
        };

        let emails = directory.user_emails(sub_group_id).await?;
        for email in &emails {
            self.activity
                .send_notification(&Notification::ideas_generated(email.as_str()))
                .await?;
        }

        info!("[小组 {}] 📧 已通知 {} 位成员", sub_group_id, emails.len());
        Ok(emails.len())
    }
}
