pub mod doc_client;
pub mod subgroup_client;

pub use doc_client::{DocClient, DocumentStore};
pub use subgroup_client::{SubGroupClient, UserDirectory};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::is_safe_path_id;
use reqwest::Url;
use std::time::Duration;

/// 构建所有外部 API 共用的 HTTP 客户端
///
/// 默认不设超时；`request_timeout_secs` 大于 0 时生效。
pub fn build_http_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if config.request_timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
    }
    builder.build()
}

/// 在 base URL 后追加路径段
///
/// 每段单独做百分号编码，`?`、`#`、`/` 不会改变路由；空段表示结尾的 `/`。
pub fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let invalid = |message: &str| ApiError::InvalidUrl {
        url: base.to_string(),
        message: message.to_string(),
    };

    let mut url = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base"))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// 要拼进 URL 的 ID 先过一遍检查
pub fn path_id<'a>(endpoint: &str, id: &'a str) -> Result<&'a str, ApiError> {
    if is_safe_path_id(id) {
        Ok(id)
    } else {
        Err(ApiError::InvalidId {
            endpoint: endpoint.to_string(),
            id: id.to_string(),
        })
    }
}
