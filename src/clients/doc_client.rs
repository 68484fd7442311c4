/// 文档 API 客户端
///
/// 封装对第三方文档 API 的三个调用：查询是否存在、创建、更新
use super::{endpoint_url, path_id};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{DocId, ExistsResponse, RemoteResponse};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::debug;

/// 文档存储能力
///
/// 按 (subGroupId, type) 定位文档；写入语义为原地更新，没有版本。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 查询小组下指定类型的文档，存在时返回文档 ID
    async fn exists(&self, sub_group_id: &str, file_type: &str)
        -> Result<Option<DocId>, ApiError>;

    /// 以 payload 作为完整请求体创建文档
    async fn create(&self, payload: &Value) -> Result<RemoteResponse, ApiError>;

    /// 按文档 ID 原地更新
    async fn update(&self, doc_id: &str, payload: &Value) -> Result<RemoteResponse, ApiError>;
}

/// 文档 API 客户端
#[derive(Clone)]
pub struct DocClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    key: String,
}

impl DocClient {
    /// 创建新的文档客户端
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.doc_api_base_url.trim_end_matches('/').to_string(),
            app_id: config.doc_app_id.clone(),
            key: config.doc_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 附加静态凭证头
    fn with_credentials(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Doc-AppId", self.app_id.as_str())
            .header("X-Doc-Key", self.key.as_str())
    }

    /// 发送写请求，非 2xx 视为失败
    async fn send_write(
        &self,
        request: RequestBuilder,
        endpoint: String,
    ) -> Result<RemoteResponse, ApiError> {
        let response = request
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

        debug!("文档API响应 ({}): {}", endpoint, status);

        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        Ok(RemoteResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DocumentStore for DocClient {
    async fn exists(
        &self,
        sub_group_id: &str,
        file_type: &str,
    ) -> Result<Option<DocId>, ApiError> {
        let sub_group_id = path_id("doc/subgrouptype", sub_group_id)?;
        let url = endpoint_url(&self.base_url, &["doc", "subgrouptype", sub_group_id])?;
        let endpoint = url.to_string();
        debug!("查询文档: {} (type: {})", endpoint, file_type);

        let request = self
            .with_credentials(self.http.get(url))
            .header("type", file_type);

        let response = request
            .send()
            .await
            .map_err(|source| ApiError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        // 状态码不作判断，只看响应体里的 Result.Success
        let text = response
            .text()
            .await
            .map_err(|source| ApiError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        let parsed: ExistsResponse =
            serde_json::from_str(&text).map_err(|source| ApiError::JsonParseFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        parsed.into_doc_id(&endpoint)
    }

    async fn create(&self, payload: &Value) -> Result<RemoteResponse, ApiError> {
        let url = endpoint_url(&self.base_url, &["doc", ""])?;
        let endpoint = url.to_string();
        debug!("创建文档: {}", endpoint);

        let request = self.with_credentials(self.http.post(url)).json(payload);
        self.send_write(request, endpoint).await
    }

    async fn update(&self, doc_id: &str, payload: &Value) -> Result<RemoteResponse, ApiError> {
        // docId 来自远端响应，同样不能信任
        let doc_id = path_id("doc", doc_id)?;
        let url = endpoint_url(&self.base_url, &["doc", doc_id])?;
        let endpoint = url.to_string();
        debug!("更新文档: {}", endpoint);

        let request = self.with_credentials(self.http.put(url)).json(payload);
        self.send_write(request, endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = Config {
            doc_api_base_url: "http://localhost:9000/DocAPI_REST/rest/v1/".into(),
            ..Config::default()
        };
        let client = DocClient::new(&config, reqwest::Client::new());
        assert_eq!(client.base_url(), "http://localhost:9000/DocAPI_REST/rest/v1");
    }

    fn unreachable_client() -> DocClient {
        let config = Config {
            doc_api_base_url: "http://127.0.0.1:1".into(),
            ..Config::default()
        };
        DocClient::new(&config, reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_unsafe_ids_are_rejected_before_sending() {
        let client = unreachable_client();

        let err = client.exists("..", "md").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidId { .. }), "got {err:?}");

        let err = client
            .update("x/../../", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidId { .. }), "got {err:?}");
    }
}
