//! LLM 客户端抽象（Planner 的外部协作方）
//!
//! 一次请求 = system + 历史消息 + 固定的工具 schema 集合；一次响应 = 可选文本 + 零或多个工具调用。
//! RetryingLlmClient 提供有界重试（指数退避），默认 max_retries = 0，即不重试。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::memory::Message;
use crate::tools::ToolSchema;

/// LLM 调用错误（传输 / 超时 / 响应格式错误）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Timeout")]
    Timeout,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// 是否值得重试（鉴权、请求错误等重试无意义）
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::RateLimited | LlmError::Timeout => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::MalformedResponse(_) => false,
        }
    }
}

/// Planner 提议的一次工具调用（id 即 correlation token）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// 单次 LLM 响应
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    /// 纯文本响应（无工具调用）
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// LLM 客户端 trait：带工具 schema 的非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<Completion, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// 重试配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
        }
    }
}

impl RetryConfig {
    /// 第 attempt 次重试前的等待时间（attempt 从 0 开始），指数增长并封顶
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// 包装任意 LlmClient：瞬时错误按 RetryConfig 退避重试，其余错误直接返回
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    config: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<Completion, LlmError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(messages, tools).await {
                Ok(c) => return Ok(c),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let wait = self.config.backoff(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        "LLM call failed ({}), retrying",
                        e
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}
