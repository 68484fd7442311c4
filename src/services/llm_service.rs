//! LLM 服务 - 业务能力层
//!
//! 只负责"根据 PDF 文本生成项目摘要和想法"，不关心上传流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（自定义 base url 和模型）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::utils::logging::truncate_text;

/// 发给 LLM 的 PDF 文本上限（字符数）
const MAX_PROMPT_CHARS: usize = 24_000;

const IDEAS_SYSTEM_PROMPT: &str = "You are helping a student project team. \
Read the project brief and answer in Markdown with two sections: \
'## Project Summary' (a concise summary of the brief) and \
'## Ideas' (a numbered list of concrete project ideas that satisfy the brief).";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 把 PDF 原文整理成 markdown
/// - 不关心文档存在与否、上传和日志
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（去掉首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(2048u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    /// 根据 PDF 文本生成项目摘要和想法（markdown）
    pub async fn generate_ideas(&self, pdf_text: &str) -> Result<String> {
        let ideas = self
            .send_to_llm(&build_ideas_prompt(pdf_text), Some(IDEAS_SYSTEM_PROMPT))
            .await?;

        if ideas.is_empty() {
            anyhow::bail!("LLM 返回内容为空");
        }
        Ok(ideas)
    }
}

fn build_ideas_prompt(pdf_text: &str) -> String {
    format!(
        "Project brief:\n\n{}",
        truncate_text(pdf_text.trim(), MAX_PROMPT_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_truncated() {
        let long = "a".repeat(MAX_PROMPT_CHARS + 100);
        let prompt = build_ideas_prompt(&long);
        assert!(prompt.ends_with("..."));
        assert!(prompt.chars().count() < MAX_PROMPT_CHARS + 40);
    }

    #[test]
    fn test_prompt_keeps_short_text() {
        assert_eq!(
            build_ideas_prompt("  Build a todo app  "),
            "Project brief:\n\nBuild a todo app"
        );
    }

    /// 需要真实的 LLM_API_KEY
    #[tokio::test]
    #[ignore]
    async fn test_generate_ideas_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().unwrap();
        let service = LlmService::new(&config);

        let ideas = service
            .generate_ideas("Build a web app that helps students split group project tasks.")
            .await
            .unwrap();
        println!("{}", ideas);
        assert!(!ideas.is_empty());
    }
}
