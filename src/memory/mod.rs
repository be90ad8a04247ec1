//! 单次 run 的状态：对话历史与任务草稿板

pub mod conversation;
pub mod scratchpad;

pub use conversation::{ConversationHistory, Message, Role};
pub use scratchpad::{Scratchpad, Task, TaskId, TaskStatus};
