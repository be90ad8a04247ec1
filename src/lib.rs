//! Scout - 依赖感知的研究 Agent
//!
//! 模块划分：
//! - **agent**: ResearchAgent（ask / ask_detailed）与按配置组装
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）、嵌入
//! - **memory**: 单次 run 的对话历史与任务草稿板
//! - **observability**: tracing 初始化
//! - **research**: Planner、过程事件、研究主循环
//! - **search**: 检索契约与向量检索实现
//! - **tools**: 固定工具集、schema 与派发器

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod research;
pub mod search;
pub mod tools;

pub use agent::{create_agent, create_agent_with_config, ResearchAgent};
pub use core::{AgentError, ToolError};
pub use research::{ResearchEvent, ResearchResult, ResolutionOutcome};
