//! 研究层：Planner、过程事件、依赖感知的研究主循环

pub mod events;
pub mod loop_;
pub mod planner;

pub use events::ResearchEvent;
pub use loop_::{
    research_loop, ResearchResult, ResearchSession, ResolutionOutcome, DEFAULT_MAX_ROUNDS,
    NO_RESULTS_ANSWER, PARTIAL_ANSWER_HEADER,
};
pub use planner::{Planner, SYSTEM_PROMPT};
