/// 小组 API 客户端
///
/// 只用于查询小组成员的邮箱，给通知流程使用
use super::{endpoint_url, path_id};
use crate::config::Config;
use crate::error::ApiError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// 用户查询能力
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 返回小组内所有成员的邮箱
    async fn user_emails(&self, sub_group_id: &str) -> Result<Vec<String>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct SubGroupResponse {
    #[serde(rename = "SubGroup")]
    sub_group: SubGroupRecord,
}

#[derive(Debug, Deserialize)]
struct SubGroupRecord {
    #[serde(rename = "subGroupUsers", default)]
    users: Vec<SubGroupUser>,
}

#[derive(Debug, Deserialize)]
struct SubGroupUser {
    #[serde(default)]
    email: Option<String>,
}

/// 小组 API 客户端
#[derive(Clone)]
pub struct SubGroupClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    key: String,
}

impl SubGroupClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.subgroup_api_base_url.trim_end_matches('/').to_string(),
            app_id: config.subgroup_app_id.clone(),
            key: config.subgroup_key.clone(),
        }
    }
}

#[async_trait]
impl UserDirectory for SubGroupClient {
    async fn user_emails(&self, sub_group_id: &str) -> Result<Vec<String>, ApiError> {
        let sub_group_id = path_id("subgroup", sub_group_id)?;
        let url = endpoint_url(&self.base_url, &["subgroup", sub_group_id])?;
        let endpoint = url.to_string();
        debug!("查询小组成员: {}", endpoint);

        let response = self
            .http
            .get(url)
            .header("X-SubGroup-AppId", self.app_id.as_str())
            .header("X-SubGroup-Key", self.key.as_str())
            .send()
            .await
            .map_err(|source| ApiError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        parse_emails(&body, &endpoint)
    }
}

/// 从小组响应中取出邮箱，没有邮箱的成员跳过
fn parse_emails(body: &str, endpoint: &str) -> Result<Vec<String>, ApiError> {
    let parsed: SubGroupResponse =
        serde_json::from_str(body).map_err(|source| ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        })?;

    Ok(parsed
        .sub_group
        .users
        .into_iter()
        .filter_map(|u| u.email)
        .filter(|e| !e.trim().is_empty())
        .collect())
}
