//! Planner：拼装规划上下文并调用 LLM
//!
//! 每轮上下文 = 一条 system 消息（固定指令 + 当前 Scratchpad 快照 + 可执行任务 id）+ 完整对话历史；
//! 工具 schema 集合固定不变。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{Completion, LlmClient};
use crate::memory::{Message, Scratchpad};
use crate::tools::{tool_schemas, ToolSchema};

pub const SYSTEM_PROMPT: &str = "\
You are a research agent with access to a knowledge base about Acme Robotics.
You MUST only answer from retrieved information, never from prior knowledge.

You maintain a scratchpad of tasks to track your research progress.
Before doing anything, always consult the current scratchpad state in the system message.

Your workflow:
1. Decompose the question into tasks using `add_task`. Use `depends_on` when one task requires
   the result of another.
2. Execute tasks by calling `search` to retrieve relevant documents.
3. Mark each task done with `complete_task` once you have retrieved useful results.
4. When all tasks needed to answer the question are complete, call `finish` with a synthesized answer.

Rules:
- Always use `search`, never answer from memory.
- Call `finish` only when you have enough retrieved information to answer fully.
- If you hit a dead end on a task, mark it complete with a note and move on.
";

const SCRATCHPAD_HEADER: &str = "--- Current Scratchpad ---";

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    instructions: String,
    tools: Vec<ToolSchema>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            instructions: SYSTEM_PROMPT.to_string(),
            tools: tool_schemas(),
        }
    }

    /// 覆盖固定指令（例如换一个知识库主题）
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn tools(&self) -> &[ToolSchema] {
        &self.tools
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 本轮的 system 内容
    pub fn system_content(&self, scratchpad: &Scratchpad) -> String {
        let runnable: Vec<String> = scratchpad
            .runnable_tasks()
            .iter()
            .map(|t| t.id.to_string())
            .collect();
        let runnable = if runnable.is_empty() {
            "none".to_string()
        } else {
            runnable.join(", ")
        };
        format!(
            "{}\n\n{}\n{}\n\nRunnable task ids: {}",
            self.instructions,
            SCRATCHPAD_HEADER,
            scratchpad.snapshot(),
            runnable
        )
    }

    pub fn build_context(&self, scratchpad: &Scratchpad, history: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(self.system_content(scratchpad)));
        messages.extend_from_slice(history);
        messages
    }

    /// 单次规划调用；LLM 失败映射为 PlannerFailure
    pub async fn plan(
        &self,
        scratchpad: &Scratchpad,
        history: &[Message],
    ) -> Result<Completion, AgentError> {
        let messages = self.build_context(scratchpad, history);
        let completion = self.llm.complete(&messages, &self.tools).await?;
        Ok(completion)
    }
}
