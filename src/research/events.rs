//! 研究过程事件：轮次、规划、工具调用、观察与最终答案，可序列化为 JSON 供前端展示

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResearchEvent {
    /// 新一轮开始（从 1 计）
    RoundStarted { round: usize, max_rounds: usize },
    /// 正在调用 Planner
    Planning,
    /// Planner 提议的工具调用
    ToolCall {
        call_id: String,
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）
    Observation {
        call_id: String,
        tool: String,
        preview: String,
    },
    /// 工具返回了错误 payload（run 继续）
    ToolFailure {
        call_id: String,
        tool: String,
        reason: String,
    },
    /// run 结束
    Finished { outcome: String, answer: String },
    /// run 因错误终止
    Error { text: String },
}
