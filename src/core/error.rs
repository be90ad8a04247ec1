//! 错误类型
//!
//! ToolError：工具级校验错误，作为 tool result 的 error payload 回传给 Planner，本轮不终止；
//! AgentError：运行级错误（Planner / Search 失败、配置错误），直接终止当前 run。

use thiserror::Error;

use crate::llm::LlmError;
use crate::memory::TaskId;
use crate::search::SearchError;

/// 工具执行中的可恢复错误（回传给 Planner，由其决定下一步）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Invalid dependency: task {0} does not exist")]
    InvalidDependency(TaskId),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),

    /// 仅在 strict_dependencies 开启时出现
    #[error("Task {task_id} has unmet dependencies: {missing:?}")]
    UnmetDependencies { task_id: TaskId, missing: Vec<TaskId> },

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// 仅在 search.isolate_failures 开启时出现；默认单次搜索失败会终止整个 run
    #[error("Search failed: {0}")]
    SearchFailed(String),
}

impl ToolError {
    /// 稳定的错误码，写入 payload 的 "error" 字段
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::InvalidDependency(_) => "invalid_dependency",
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::UnknownTask(_) => "unknown_task",
            ToolError::UnmetDependencies { .. } => "unmet_dependencies",
            ToolError::InvalidArguments { .. } => "invalid_arguments",
            ToolError::SearchFailed(_) => "search_failed",
        }
    }
}

/// 终止 run 的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Planner failure: {0}")]
    PlannerFailure(#[from] LlmError),

    #[error("Search failure: {0}")]
    SearchFailure(#[from] SearchError),

    #[error("Config error: {0}")]
    Config(String),
}
