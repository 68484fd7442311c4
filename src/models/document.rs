//! 文档相关的数据结构
//!
//! 远端文档 API 是第三方契约，字段名保持其原样（`Result`、`DocAPI`、`docId` 等）。

use crate::error::{ApiError, RequestError};
use serde::Deserialize;
use serde_json::{json, Value};

/// 生成的 markdown 文档的类型标签
pub const MARKDOWN_TYPE: &str = "md";

/// 远端分配的文档 ID
pub type DocId = String;

/// `GET /doc/subgrouptype/{subGroupId}` 的响应
#[derive(Debug, Clone, Deserialize)]
pub struct ExistsResponse {
    #[serde(rename = "Result")]
    pub result: ResultStatus,
    #[serde(rename = "DocAPI", default)]
    pub doc_api: Option<DocApiRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultStatus {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocApiRecord {
    #[serde(rename = "docId", default)]
    pub doc_id: Option<Value>,
}

impl ExistsResponse {
    /// 解析出已有文档的 ID
    ///
    /// `Success` 为 false 时返回 `None`；空字符串、0、null 同样视为没有文档。
    /// 为 true 却没有 `DocAPI` 视为响应格式错误。
    pub fn into_doc_id(self, endpoint: &str) -> Result<Option<DocId>, ApiError> {
        if !self.result.success {
            return Ok(None);
        }

        let missing = || ApiError::MissingField {
            endpoint: endpoint.to_string(),
            field: "DocAPI.docId".to_string(),
        };

        let raw = self.doc_api.ok_or_else(missing)?.doc_id;
        match raw {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(missing()),
        }
    }
}

/// 文档 API 写入（create / update）后的原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn json(&self, endpoint: &str) -> Result<Value, ApiError> {
        serde_json::from_str(&self.body).map_err(|source| ApiError::JsonParseFailed {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// 一次上传请求
///
/// 要么由生成流程合成，要么是调用方提交的原始 JSON。`payload` 原样作为请求体发送。
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub sub_group_id: String,
    pub file_type: String,
    pub user_id: Option<String>,
    pub payload: Value,
}

impl UploadRequest {
    /// 生成流程使用的 markdown 文档
    pub fn markdown(sub_group_id: &str, user_id: &str, document: String) -> Self {
        Self {
            sub_group_id: sub_group_id.to_string(),
            file_type: MARKDOWN_TYPE.to_string(),
            user_id: Some(user_id.to_string()),
            payload: json!({
                "document": document,
                "subGroupId": sub_group_id,
                "type": MARKDOWN_TYPE,
            }),
        }
    }

    /// 从调用方提交的 JSON 构建
    ///
    /// 必须包含 `subGroupId`（字符串或数字）和 `type`（字符串）；`userId` 可选。
    pub fn from_payload(payload: Value) -> Result<Self, RequestError> {
        let sub_group_id = id_field(&payload, "subGroupId")?
            .ok_or_else(|| RequestError::MissingField {
                field: "subGroupId".to_string(),
            })?;
        check_path_id("subGroupId", &sub_group_id)?;

        let file_type = match payload.get("type") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(RequestError::InvalidField {
                    field: "type".to_string(),
                    expected: "string".to_string(),
                })
            }
            None => {
                return Err(RequestError::MissingField {
                    field: "type".to_string(),
                })
            }
        };

        let user_id = id_field(&payload, "userId")?;

        Ok(Self {
            sub_group_id,
            file_type,
            user_id,
            payload,
        })
    }
}

/// ID 能否原样作为一个 URL 路径段或文件名
///
/// 拒绝空串、`.`、`..`、路径分隔符、`?`、`#` 和控制字符。
pub fn is_safe_path_id(id: &str) -> bool {
    !id.trim().is_empty()
        && id != "."
        && id != ".."
        && !id.contains(|c: char| matches!(c, '/' | '\\' | '?' | '#') || c.is_control())
}

/// 校验调用方传入的 ID
pub fn check_path_id(field: &str, id: &str) -> Result<(), RequestError> {
    if is_safe_path_id(id) {
        Ok(())
    } else {
        Err(RequestError::InvalidField {
            field: field.to_string(),
            expected: "an id without path characters".to_string(),
        })
    }
}

/// 读取字符串或数字形式的 ID 字段
fn id_field(payload: &Value, field: &str) -> Result<Option<String>, RequestError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(RequestError::InvalidField {
            field: field.to_string(),
            expected: "string or number".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(value: Value) -> ExistsResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_exists_response_success_with_string_id() {
        let resp = parse(json!({
            "Result": { "Success": true, "ErrorMessage": "" },
            "DocAPI": { "docId": "D42" }
        }));
        assert_eq!(resp.into_doc_id("doc").unwrap(), Some("D42".to_string()));
    }

    #[test]
    fn test_exists_response_numeric_id() {
        let resp = parse(json!({
            "Result": { "Success": true },
            "DocAPI": { "docId": 42 }
        }));
        assert_eq!(resp.into_doc_id("doc").unwrap(), Some("42".to_string()));
    }

    #[test]
    fn test_exists_response_not_found() {
        let resp = parse(json!({
            "Result": { "Success": false, "ErrorMessage": "Document not found" },
            "DocAPI": { "docId": 0 }
        }));
        assert_eq!(resp.into_doc_id("doc").unwrap(), None);
    }

    #[test]
    fn test_exists_response_falsy_id_means_absent() {
        for doc_id in [json!(""), json!("  "), json!(0), json!(null)] {
            let resp = parse(json!({
                "Result": { "Success": true },
                "DocAPI": { "docId": doc_id.clone() }
            }));
            assert_eq!(resp.into_doc_id("doc").unwrap(), None, "docId {doc_id}");
        }
    }

    #[test]
    fn test_exists_response_success_without_record_is_error() {
        let resp = parse(json!({ "Result": { "Success": true } }));
        assert!(matches!(
            resp.into_doc_id("doc"),
            Err(ApiError::MissingField { field, .. }) if field == "DocAPI.docId"
        ));
    }

    #[test]
    fn test_markdown_request_payload() {
        let req = UploadRequest::markdown("G1", "U7", "# Ideas".to_string());
        assert_eq!(req.file_type, "md");
        assert_eq!(req.user_id.as_deref(), Some("U7"));
        assert_eq!(
            req.payload,
            json!({ "document": "# Ideas", "subGroupId": "G1", "type": "md" })
        );
    }

    #[test]
    fn test_from_payload_keeps_body_verbatim() {
        let body = json!({ "subGroupId": 12, "type": "pdf", "document": "x", "extra": [1, 2] });
        let req = UploadRequest::from_payload(body.clone()).unwrap();
        assert_eq!(req.sub_group_id, "12");
        assert_eq!(req.file_type, "pdf");
        assert_eq!(req.user_id, None);
        assert_eq!(req.payload, body);
    }

    #[test]
    fn test_from_payload_reads_optional_user_id() {
        let req =
            UploadRequest::from_payload(json!({ "subGroupId": "G1", "type": "md", "userId": 3 }))
                .unwrap();
        assert_eq!(req.user_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_from_payload_missing_fields() {
        let err = UploadRequest::from_payload(json!({ "type": "md" })).unwrap_err();
        assert!(matches!(err, RequestError::MissingField { field } if field == "subGroupId"));

        let err = UploadRequest::from_payload(json!({ "subGroupId": "G1" })).unwrap_err();
        assert!(matches!(err, RequestError::MissingField { field } if field == "type"));

        let err = UploadRequest::from_payload(json!({ "subGroupId": "G1", "type": 5 })).unwrap_err();
        assert!(matches!(err, RequestError::InvalidField { field, .. } if field == "type"));
    }

    #[test]
    fn test_from_payload_rejects_path_characters_in_sub_group_id() {
        for bad in ["G9?G1", "x/../../", "..", "G1#frag", "a\\b", ""] {
            let err = UploadRequest::from_payload(json!({ "subGroupId": bad, "type": "pdf" }))
                .unwrap_err();
            assert!(
                matches!(&err, RequestError::InvalidField { field, .. } if field == "subGroupId"),
                "{bad} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_safe_path_id() {
        assert!(is_safe_path_id("G1"));
        assert!(is_safe_path_id("42"));
        assert!(is_safe_path_id("group one"));
        assert!(!is_safe_path_id("."));
        assert!(!is_safe_path_id("a\nb"));
    }
}
