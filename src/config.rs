use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// 默认配置文件路径（可通过 `GENERATE_IDEAS_CONFIG` 覆盖）
pub const DEFAULT_CONFIG_FILE: &str = "generate_ideas.toml";

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 服务监听地址
    pub bind_addr: String,
    // --- 文档 API 配置 ---
    pub doc_api_base_url: String,
    pub doc_app_id: String,
    pub doc_key: String,
    // --- 小组 API 配置（通知用户时查询邮箱） ---
    pub subgroup_api_base_url: String,
    pub subgroup_app_id: String,
    pub subgroup_key: String,
    /// PDF 存放目录，文件名为 `{subGroupId}.pdf`
    pub pdf_folder: String,
    /// 活动日志文件（JSON lines），为空则只输出到 tracing；配置了消息队列时不使用
    pub activity_log_file: String,
    // --- RabbitMQ 配置（host 为空时日志 / 通知写本地文件） ---
    pub rabbitmq_host: String,
    pub rabbitmq_port: u16,
    pub exchange_name: String,
    /// direct / fanout / topic / headers
    pub exchange_type: String,
    pub log_routing_key: String,
    pub notif_routing_key: String,
    /// 生成成功后是否给小组成员发送通知
    pub notify_on_generate: bool,
    /// 外部请求超时（秒），0 表示不设置
    pub request_timeout_secs: u64,
    // --- LLM 配置（api_key 为空时直接使用 PDF 原文） ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            doc_api_base_url: "https://personal-rc7vnnm9.outsystemscloud.com/DocAPI_REST/rest/v1"
                .to_string(),
            doc_app_id: String::new(),
            doc_key: String::new(),
            subgroup_api_base_url:
                "https://personal-rc7vnnm9.outsystemscloud.com/SubGroupAPI_REST/rest/v1".to_string(),
            subgroup_app_id: String::new(),
            subgroup_key: String::new(),
            pdf_folder: "pdfs".to_string(),
            activity_log_file: "activity.log".to_string(),
            rabbitmq_host: String::new(),
            rabbitmq_port: 5672,
            exchange_name: String::new(),
            exchange_type: "topic".to_string(),
            log_routing_key: String::new(),
            notif_routing_key: String::new(),
            notify_on_generate: false,
            request_timeout_secs: 0,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        // .env 不存在不算错误
        let _ = dotenvy::dotenv();

        let path = std::env::var("GENERATE_IDEAS_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };

        base.with_env_overrides()
    }

    /// 只使用默认值 + 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，缺失的字段使用默认值
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::FileReadFailed {
                path: path.to_string(),
                source,
            }
        })?;

        Self::from_toml_str(&content).map_err(|source| ConfigError::FileParseFailed {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: env_or("BIND_ADDR", self.bind_addr),
            doc_api_base_url: env_or("DOC_API_BASE_URL", self.doc_api_base_url),
            doc_app_id: env_or("X_Doc_AppId", self.doc_app_id),
            doc_key: env_or("X_Doc_Key", self.doc_key),
            subgroup_api_base_url: env_or("SUBGROUP_API_BASE_URL", self.subgroup_api_base_url),
            subgroup_app_id: env_or("SubGrpAppId", self.subgroup_app_id),
            subgroup_key: env_or("SubGrpKey", self.subgroup_key),
            pdf_folder: env_or("PDF_FOLDER", self.pdf_folder),
            activity_log_file: env_or("ACTIVITY_LOG_FILE", self.activity_log_file),
            rabbitmq_host: env_or("RABBITMQ_HOST", self.rabbitmq_host),
            rabbitmq_port: env_parse("RABBITMQ_PORT", "u16", self.rabbitmq_port)?,
            exchange_name: env_or("EXCHANGE_NAME", self.exchange_name),
            exchange_type: env_or("EXCHANGE_TYPE", self.exchange_type),
            log_routing_key: env_or("LOG_ROUTING_KEY", self.log_routing_key),
            notif_routing_key: env_or("NOTIF_ROUTING_KEY", self.notif_routing_key),
            notify_on_generate: env_parse("NOTIFY_ON_GENERATE", "bool", self.notify_on_generate)?,
            request_timeout_secs: env_parse(
                "REQUEST_TIMEOUT_SECS",
                "u64",
                self.request_timeout_secs,
            )?,
            llm_api_key: env_or("LLM_API_KEY", self.llm_api_key),
            llm_api_base_url: env_or("LLM_API_BASE_URL", self.llm_api_base_url),
            llm_model_name: env_or("LLM_MODEL_NAME", self.llm_model_name),
        })
    }

    /// 启动前检查必填项
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("X_Doc_AppId", &self.doc_app_id),
            ("X_Doc_Key", &self.doc_key),
            ("DOC_API_BASE_URL", &self.doc_api_base_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingValue {
                    name: name.to_string(),
                });
            }
        }

        if self.notify_on_generate
            && (self.subgroup_app_id.is_empty() || self.subgroup_key.is_empty())
        {
            return Err(ConfigError::MissingValue {
                name: "SubGrpAppId / SubGrpKey".to_string(),
            });
        }

        if self.amqp_enabled() {
            let mut required = vec![
                ("EXCHANGE_NAME", &self.exchange_name),
                ("LOG_ROUTING_KEY", &self.log_routing_key),
            ];
            if self.notify_on_generate {
                required.push(("NOTIF_ROUTING_KEY", &self.notif_routing_key));
            }
            for (name, value) in required {
                if value.trim().is_empty() {
                    return Err(ConfigError::MissingValue {
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn llm_enabled(&self) -> bool {
        !self.llm_api_key.trim().is_empty()
    }

    /// 配置了 RabbitMQ 时日志和通知发布到交换机
    pub fn amqp_enabled(&self) -> bool {
        !self.rabbitmq_host.trim().is_empty()
    }

    pub fn amqp_uri(&self) -> String {
        format!("amqp://{}:{}", self.rabbitmq_host.trim(), self.rabbitmq_port)
    }
}

fn env_or(var_name: &str, default: String) -> String {
    std::env::var(var_name).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_overrides_only_given_fields() {
        let config = Config::from_toml_str(
            r#"
            doc_app_id = "app"
            doc_key = "key"
            notify_on_generate = true
            "#,
        )
        .unwrap();

        assert_eq!(config.doc_app_id, "app");
        assert_eq!(config.doc_key, "key");
        assert!(config.notify_on_generate);
        // 未给出的字段保持默认
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.request_timeout_secs, 0);
    }

    #[test]
    fn test_validate_requires_doc_credentials() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue { name } if name == "X_Doc_AppId"));

        let config = Config {
            doc_app_id: "app".into(),
            doc_key: "key".into(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_subgroup_credentials_when_notifying() {
        let config = Config {
            doc_app_id: "app".into(),
            doc_key: "key".into(),
            notify_on_generate: true,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_llm_enabled_follows_api_key() {
        let mut config = Config::default();
        assert!(!config.llm_enabled());
        config.llm_api_key = "sk-test".into();
        assert!(config.llm_enabled());
    }

    #[test]
    fn test_amqp_settings() {
        let config = Config::from_toml_str(
            r#"
            rabbitmq_host = "rabbitmq"
            exchange_name = "activity"
            log_routing_key = "log.generate"
            "#,
        )
        .unwrap();

        assert!(config.amqp_enabled());
        assert_eq!(config.amqp_uri(), "amqp://rabbitmq:5672");
        assert_eq!(config.exchange_type, "topic");
        assert!(!Config::default().amqp_enabled());
    }

    #[test]
    fn test_validate_requires_exchange_when_broker_configured() {
        let config = Config {
            doc_app_id: "app".into(),
            doc_key: "key".into(),
            rabbitmq_host: "localhost".into(),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue { name } if name == "EXCHANGE_NAME"));

        let config = Config {
            exchange_name: "activity".into(),
            log_routing_key: "log".into(),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(Config::from_toml_str("notify_on_generate = \"maybe\"").is_err());
    }
}
