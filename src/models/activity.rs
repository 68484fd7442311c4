//! 日志与通知消息

use chrono::{FixedOffset, SecondsFormat, Utc};
use serde::Serialize;

/// 生成想法后记录的动作名称
pub const GENERATE_IDEAS_ACTION: &str = "Generate ideas";

pub const NOTIFY_SUBJECT: &str = "Project summary and ideas generated successfully!";
pub const NOTIFY_BODY: &str = "Head to the project page to view the details. Feel free to Upload a new PDF file to generate the response again. \n Disclaimer: Content generated using AI, please check for accuracy.";

/// 日志条目
///
/// 字段名与日志服务约定的消息格式一致（`type` / `description`）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub sub_group_id: String,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub action: String,
    #[serde(rename = "description")]
    pub message: String,
    pub timestamp: String,
}

impl LogEntry {
    pub fn new(
        sub_group_id: impl Into<String>,
        user_id: Option<String>,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sub_group_id: sub_group_id.into(),
            user_id,
            action: action.into(),
            message: message.into(),
            timestamp: singapore_timestamp(),
        }
    }

    /// "生成想法" 动作的日志
    pub fn generate_ideas(sub_group_id: &str, user_id: Option<&str>) -> Self {
        let who = user_id.unwrap_or("unknown user");
        Self::new(
            sub_group_id,
            user_id.map(str::to_string),
            GENERATE_IDEAS_ACTION,
            format!("{who} generated ideas and project summary for {sub_group_id}"),
        )
    }
}

/// 发给单个用户的通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub email: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// 想法生成完成的通知
    pub fn ideas_generated(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            subject: NOTIFY_SUBJECT.to_string(),
            body: NOTIFY_BODY.to_string(),
        }
    }
}

/// 新加坡时间（UTC+8）的 ISO-8601 时间戳
pub fn singapore_timestamp() -> String {
    let now = Utc::now();
    match FixedOffset::east_opt(8 * 3600) {
        Some(offset) => now
            .with_timezone(&offset)
            .to_rfc3339_opts(SecondsFormat::Millis, false),
        None => now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_ideas_entry_contains_both_ids() {
        let entry = LogEntry::generate_ideas("G1", Some("U7"));
        assert_eq!(entry.action, "Generate ideas");
        assert_eq!(entry.user_id.as_deref(), Some("U7"));
        assert!(entry.message.contains("G1"));
        assert!(entry.message.contains("U7"));
    }

    #[test]
    fn test_generate_ideas_entry_without_user() {
        let entry = LogEntry::generate_ideas("G1", None);
        assert_eq!(entry.user_id, None);
        assert_eq!(
            entry.message,
            "unknown user generated ideas and project summary for G1"
        );
    }

    #[test]
    fn test_log_entry_wire_format() {
        let mut entry = LogEntry::generate_ideas("G1", Some("U7"));
        entry.timestamp = "2024-01-01T08:00:00.000+08:00".into();

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "subGroupId": "G1",
                "userId": "U7",
                "type": "Generate ideas",
                "description": "U7 generated ideas and project summary for G1",
                "timestamp": "2024-01-01T08:00:00.000+08:00"
            })
        );
    }

    #[test]
    fn test_timestamp_is_utc_plus_8() {
        assert!(singapore_timestamp().ends_with("+08:00"));
    }
}
