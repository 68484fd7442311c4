use serde_json::{json, Value};
use thiserror::Error;

/// 上传失败时返回给调用方的固定信息
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload file";
/// 文档已写入但日志/通知失败时返回的固定信息
pub const LOGGING_FAILED_MESSAGE: &str = "Failed to send notification / logs";

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文本提取错误
    #[error("文本提取错误: {0}")]
    Extract(#[from] ExtractError),
    /// 请求参数错误
    #[error("请求错误: {0}")]
    Request(#[from] RequestError),
    /// 上传流程错误
    #[error("上传流程错误: {0}")]
    Upload(#[from] UploadError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回非 2xx 状态码
    #[error("API返回错误状态 ({endpoint}): {status}, body={body}")]
    BadStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    /// 响应缺少必需字段
    #[error("API响应缺少字段 ({endpoint}): {field}")]
    MissingField { endpoint: String, field: String },
    /// ID 含有路径字符，不能拼进 URL
    #[error("非法的路径ID ({endpoint}): '{id}'")]
    InvalidId { endpoint: String, id: String },
    /// 配置的 base URL 无法解析
    #[error("非法的API地址 '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填配置为空
    #[error("缺少必填配置: {name}")]
    MissingValue { name: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// PDF 文本提取错误
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 小组 ID 不能作为文件名
    #[error("非法的小组ID: {sub_group_id}")]
    InvalidSubGroupId { sub_group_id: String },
    /// PDF 不存在
    #[error("PDF 文件不存在: {path}")]
    PdfNotFound { path: String },
    /// pdf-extract 解析失败
    #[error("PDF 解析失败 ({path}): {message}")]
    ExtractionFailed { path: String, message: String },
    /// PDF 没有可提取的文本（扫描件等）
    #[error("PDF 没有可提取的文本: {path}")]
    EmptyText { path: String },
    /// 生成想法失败
    #[error("生成想法失败: {0}")]
    Llm(String),
}

/// 请求参数错误
#[derive(Debug, Error)]
pub enum RequestError {
    /// 缺少必需字段
    #[error("缺少必需字段: {field}")]
    MissingField { field: String },
    /// 字段类型不正确
    #[error("字段 {field} 类型错误, 期望 {expected}")]
    InvalidField { field: String, expected: String },
}

/// 日志 / 通知发送错误
#[derive(Debug, Error)]
pub enum ActivityError {
    /// 写入活动日志失败
    #[error("写入活动日志失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("活动消息序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 查询小组成员失败
    #[error("查询小组成员失败: {0}")]
    Directory(#[from] ApiError),
    /// 消息队列连接或发布失败
    #[error("消息队列发布失败: {0}")]
    Broker(#[from] lapin::Error),
}

/// 上传流程错误
///
/// `Upload` 和 `Logging` 是两个受保护的阶段，对外的 JSON 完全固定；
/// 其余变体没有结构化的响应体。
#[derive(Debug, Error)]
pub enum UploadError {
    /// 查询已有文档失败
    #[error("查询已有文档失败: {0}")]
    Lookup(#[source] ApiError),
    /// 创建 / 更新文档失败
    #[error("上传文件失败: {0}")]
    Upload(#[source] ApiError),
    /// 文档已写入，但日志或通知失败
    #[error("发送通知/日志失败: {0}")]
    Logging(#[source] ActivityError),
    /// 文档 API 返回的响应不是 JSON
    #[error("文档API响应格式错误: {0}")]
    MalformedResponse(#[source] ApiError),
}

impl UploadError {
    /// 受保护阶段对外的 JSON 响应体
    pub fn body(&self) -> Option<Value> {
        match self {
            UploadError::Upload(_) => Some(json!({ "error": UPLOAD_FAILED_MESSAGE })),
            UploadError::Logging(_) => Some(json!({ "error": LOGGING_FAILED_MESSAGE })),
            UploadError::Lookup(_) | UploadError::MalformedResponse(_) => None,
        }
    }

    /// 文档是否已经写入远端
    pub fn write_committed(&self) -> bool {
        matches!(self, UploadError::Logging(_))
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
