//! Mock LLM 客户端（用于测试与无 API Key 的本地运行）
//!
//! 按顺序返回预置的响应脚本并记录每次请求；脚本用尽后返回 fallback（默认一段纯文本，即隐式 finish）。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{Completion, LlmClient, LlmError};
use crate::memory::Message;
use crate::tools::ToolSchema;

const DEFAULT_FALLBACK: &str =
    "Mock planner: no LLM configured. Set OPENAI_API_KEY or DEEPSEEK_API_KEY to run real research.";

/// Mock 客户端：脚本化响应
#[derive(Debug)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<Completion, LlmError>>>,
    fallback: Completion,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::with_script(Vec::new())
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: Vec<Result<Completion, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Completion::text(DEFAULT_FALLBACK),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 脚本用尽后每轮都返回该响应（例如始终提议一次搜索，用于测试轮数上限）
    pub fn with_fallback(mut self, fallback: Completion) -> Self {
        self.fallback = fallback;
        self
    }

    /// 已收到的请求（每次为完整的 messages）
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolSchema],
    ) -> Result<Completion, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
