//! 研究主循环
//!
//! 每轮：构建上下文 -> Planner 单次调用 -> 无工具调用则隐式结束；否则 search 并发执行、
//! 其余工具按发出顺序串行执行 -> 依次写入 Planner 消息、search 结果、其余结果 -> 若 finish 成功则结束。
//! 轮数达到 max_rounds 仍未结束则为 Exhausted，由 ResolutionOutcome::resolve 给出兜底答案。

use tokio::sync::mpsc::UnboundedSender;

use crate::core::AgentError;
use crate::llm::ToolCall;
use crate::memory::{ConversationHistory, Message, Scratchpad};
use crate::research::{Planner, ResearchEvent};
use crate::tools::{classify, ToolDispatcher, ToolKind, ToolPayload, ToolResult};

/// 默认轮数上限
pub const DEFAULT_MAX_ROUNDS: usize = 10;
/// 部分答案的首行
pub const PARTIAL_ANSWER_HEADER: &str = "[Partial answer - max iterations reached]";
/// 没有任何已完成结果时的固定答案
pub const NO_RESULTS_ANSWER: &str =
    "Unable to answer: no results retrieved within iteration limit.";
/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// run 的结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Planner 没有提议任何工具调用，其文本即答案
    ImplicitFinish(String),
    /// finish 工具成功执行
    ExplicitFinish(String),
    /// 轮数用尽
    Exhausted,
}

impl ResolutionOutcome {
    /// 纯函数：由结束方式与最终 Scratchpad 得出答案
    pub fn resolve(&self, scratchpad: &Scratchpad) -> String {
        match self {
            ResolutionOutcome::ExplicitFinish(answer) if !answer.trim().is_empty() => {
                answer.clone()
            }
            ResolutionOutcome::ImplicitFinish(text) if !text.trim().is_empty() => text.clone(),
            _ => fallback_answer(scratchpad),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResolutionOutcome::ImplicitFinish(_) => "implicit_finish",
            ResolutionOutcome::ExplicitFinish(_) => "explicit_finish",
            ResolutionOutcome::Exhausted => "exhausted",
        }
    }
}

fn fallback_answer(scratchpad: &Scratchpad) -> String {
    // 空白答案视为未设置
    if let Some(answer) = scratchpad.final_answer().filter(|a| !a.trim().is_empty()) {
        return answer.to_string();
    }
    let lines: Vec<String> = scratchpad
        .completed_results()
        .map(|(description, result)| format!("- {}: {}", description, result))
        .collect();
    if lines.is_empty() {
        NO_RESULTS_ANSWER.to_string()
    } else {
        format!("{}\n{}", PARTIAL_ANSWER_HEADER, lines.join("\n"))
    }
}

/// 单次 run 的结果
#[derive(Debug, Clone)]
pub struct ResearchResult {
    pub answer: String,
    pub outcome: ResolutionOutcome,
    /// 实际执行的轮数
    pub rounds: usize,
    pub scratchpad: Scratchpad,
    /// 完整 transcript（不含每轮重新生成的 system 消息）
    pub messages: Vec<Message>,
}

/// 研究会话配置
pub struct ResearchSession<'a> {
    /// Planner（必需）
    pub planner: &'a Planner,
    /// 工具派发器（必需）
    pub dispatcher: &'a ToolDispatcher,
    pub max_rounds: usize,
    pub strict_dependencies: bool,
    /// 可选：事件推送通道
    pub event_tx: Option<&'a UnboundedSender<ResearchEvent>>,
}

impl<'a> ResearchSession<'a> {
    pub fn new(planner: &'a Planner, dispatcher: &'a ToolDispatcher) -> Self {
        Self {
            planner,
            dispatcher,
            max_rounds: DEFAULT_MAX_ROUNDS,
            strict_dependencies: false,
            event_tx: None,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_strict_dependencies(mut self, strict: bool) -> Self {
        self.strict_dependencies = strict;
        self
    }

    /// 设置事件推送通道
    pub fn with_event_tx(mut self, tx: &'a UnboundedSender<ResearchEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send(&self, ev: ResearchEvent) {
        if let Some(tx) = self.event_tx {
            let _ = tx.send(ev);
        }
    }
}

/// 运行一次研究：Planner 失败或（未隔离的）搜索失败直接返回错误，轮数用尽不算错误
pub async fn research_loop(
    session: &ResearchSession<'_>,
    question: &str,
) -> Result<ResearchResult, AgentError> {
    let result = run(session, question).await;
    if let Err(e) = &result {
        tracing::error!("research run failed: {}", e);
        session.send(ResearchEvent::Error {
            text: e.to_string(),
        });
    }
    result
}

async fn run(session: &ResearchSession<'_>, question: &str) -> Result<ResearchResult, AgentError> {
    tracing::info!(
        question = %question,
        max_rounds = session.max_rounds,
        "research run started"
    );
    let mut scratchpad =
        Scratchpad::new(question).with_strict_dependencies(session.strict_dependencies);
    let mut history = ConversationHistory::new();
    let mut outcome = ResolutionOutcome::Exhausted;
    let mut rounds = 0;

    for round in 1..=session.max_rounds {
        rounds = round;
        tracing::debug!(round, tasks = scratchpad.tasks().len(), "round started");
        session.send(ResearchEvent::RoundStarted {
            round,
            max_rounds: session.max_rounds,
        });

        session.send(ResearchEvent::Planning);
        let completion = session.planner.plan(&scratchpad, history.messages()).await?;
        let text = completion.content.unwrap_or_default();

        if completion.tool_calls.is_empty() {
            history.push(Message::assistant(text.clone()));
            outcome = ResolutionOutcome::ImplicitFinish(text);
            break;
        }

        let calls = completion.tool_calls;
        for call in &calls {
            session.send(ResearchEvent::ToolCall {
                call_id: call.id.clone(),
                tool: call.name.clone(),
                args: call.arguments.clone(),
            });
        }
        let (queries, mutations): (Vec<ToolCall>, Vec<ToolCall>) = calls
            .iter()
            .cloned()
            .partition(|c| classify(&c.name) == ToolKind::Query);

        let query_results = session.dispatcher.run_queries(&queries).await?;

        let mut finished = false;
        let mut mutation_results = Vec::with_capacity(mutations.len());
        for call in &mutations {
            let (result, did_finish) = session.dispatcher.run_mutation(call, &mut scratchpad);
            finished |= did_finish;
            mutation_results.push(result);
        }

        history.push(Message::assistant_with_tool_calls(text, calls));
        for result in query_results.iter().chain(mutation_results.iter()) {
            report(session, result);
            history.push(result.to_message());
        }

        if finished {
            let answer = scratchpad.final_answer().unwrap_or_default().to_string();
            outcome = ResolutionOutcome::ExplicitFinish(answer);
            break;
        }
    }

    if outcome == ResolutionOutcome::Exhausted {
        tracing::warn!(rounds, "round budget exhausted, resolving from scratchpad");
    } else if matches!(
        &outcome,
        ResolutionOutcome::ImplicitFinish(t) | ResolutionOutcome::ExplicitFinish(t) if t.trim().is_empty()
    ) {
        tracing::warn!("planner returned an empty answer, resolving from scratchpad");
    }

    let answer = outcome.resolve(&scratchpad);
    let (_, _, total_tokens) = session.planner.token_usage();
    tracing::info!(
        outcome = outcome.label(),
        rounds,
        tasks = scratchpad.tasks().len(),
        total_tokens,
        "research run finished"
    );
    session.send(ResearchEvent::Finished {
        outcome: outcome.label().to_string(),
        answer: answer.clone(),
    });

    Ok(ResearchResult {
        answer,
        outcome,
        rounds,
        scratchpad,
        messages: history.into_messages(),
    })
}

fn report(session: &ResearchSession<'_>, result: &ToolResult) {
    let ev = match &result.payload {
        ToolPayload::Success(_) => ResearchEvent::Observation {
            call_id: result.call_id.clone(),
            tool: result.name.clone(),
            preview: preview(&result.content()),
        },
        ToolPayload::Error(e) => ResearchEvent::ToolFailure {
            call_id: result.call_id.clone(),
            tool: result.name.clone(),
            reason: e.to_string(),
        },
    };
    session.send(ev);
}

fn preview(content: &str) -> String {
    if content.chars().count() > OBSERVATION_PREVIEW_CHARS {
        let head: String = content.chars().take(OBSERVATION_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}
