//! # Generate Ideas
//!
//! 为小组生成"项目摘要和想法"文档，并保存到文档 API
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 只封装外部 HTTP API，不做判断
//! - `DocClient` - 文档 API：查询 / 创建 / 更新
//! - `SubGroupClient` - 小组 API：查询成员邮箱
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `PdfIdeasExtractor` - 提取 PDF 文本（可选 LLM 整理）
//! - `AmqpPublisher` / `ActivityWriter` - 发送日志 / 通知（RabbitMQ 或本地文件）
//!
//! ### ③ 流程层（Workflow）
//! - `UploadFlow` - 一次上传的完整流程（查询 → 创建/更新 → 通知/日志）
//!
//! ### ④ 接口层（API）
//! - `api/` - HTTP 路由和错误到响应的映射
//! - `App` - 组装以上各层并运行服务
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult, UploadError};
pub use models::UploadRequest;
pub use workflow::UploadFlow;
