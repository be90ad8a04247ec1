//! 工具层：固定的 4 个研究工具
//!
//! - search：只读检索，同一轮内可并发（Query 类）
//! - add_task / complete_task / finish：修改 Scratchpad，按发出顺序串行执行（Mutation 类）
//!
//! 未知工具名也归入 Mutation 通道，返回 unknown_tool 错误 payload，run 继续。

pub mod dispatcher;
pub mod schema;

pub use dispatcher::{ToolDispatcher, ToolPayload, ToolResult};
pub use schema::{
    tool_schemas, AddTaskArgs, CompleteTaskArgs, FinishArgs, SearchArgs, ToolSchema,
};

/// 工具调用的执行类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// 只读，可并发
    Query,
    /// 写 Scratchpad，串行
    Mutation,
}

/// 已知工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    Search,
    AddTask,
    CompleteTask,
    Finish,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::Search,
        ToolName::AddTask,
        ToolName::CompleteTask,
        ToolName::Finish,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "search" => Some(ToolName::Search),
            "add_task" => Some(ToolName::AddTask),
            "complete_task" => Some(ToolName::CompleteTask),
            "finish" => Some(ToolName::Finish),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::Search => "search",
            ToolName::AddTask => "add_task",
            ToolName::CompleteTask => "complete_task",
            ToolName::Finish => "finish",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::Search => "Search the Acme Robotics knowledge base.",
            ToolName::AddTask => "Add a new research task to the scratchpad.",
            ToolName::CompleteTask => "Mark a task as complete and record its result.",
            ToolName::Finish => "Provide the final synthesized answer and end the research loop.",
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolName::Search => ToolKind::Query,
            _ => ToolKind::Mutation,
        }
    }
}

/// 按名称分类；未知名称走 Mutation 通道
pub fn classify(name: &str) -> ToolKind {
    ToolName::parse(name)
        .map(|t| t.kind())
        .unwrap_or(ToolKind::Mutation)
}
