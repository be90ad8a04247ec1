//! 工具派发器
//!
//! Query 类（search）：同一轮内并发执行，受 Semaphore 限流，join_all 汇合后按发出顺序返回；
//! Mutation 类（add_task / complete_task / finish / 未知工具）：调用方按发出顺序逐个调用 run_mutation，
//! 独占 &mut Scratchpad。每次调用输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::SearchSection;
use crate::core::{AgentError, ToolError};
use crate::llm::ToolCall;
use crate::memory::{Message, Scratchpad};
use crate::search::{SearchClient, SearchError};
use crate::tools::{AddTaskArgs, CompleteTaskArgs, FinishArgs, SearchArgs, ToolName};

/// 工具执行结果：成功值原样回传，失败回传 {"error": kind, "message": ...}
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    Success(Value),
    Error(ToolError),
}

impl ToolPayload {
    pub fn to_value(&self) -> Value {
        match self {
            ToolPayload::Success(v) => v.clone(),
            ToolPayload::Error(e) => json!({
                "error": e.kind(),
                "message": e.to_string(),
            }),
        }
    }
}

/// 与 correlation token（call_id）配对的工具结果
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub payload: ToolPayload,
}

impl ToolResult {
    fn success(call: &ToolCall, value: Value) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            payload: ToolPayload::Success(value),
        }
    }

    fn error(call: &ToolCall, err: ToolError) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            payload: ToolPayload::Error(err),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, ToolPayload::Error(_))
    }

    /// 写入 Tool 消息的内容
    pub fn content(&self) -> String {
        self.payload.to_value().to_string()
    }

    pub fn to_message(&self) -> Message {
        Message::tool_result(self.call_id.clone(), self.content())
    }
}

pub struct ToolDispatcher {
    search: Arc<dyn SearchClient>,
    default_top_k: usize,
    semaphore: Arc<Semaphore>,
    isolate_failures: bool,
    timeout: Option<Duration>,
}

impl ToolDispatcher {
    pub fn new(search: Arc<dyn SearchClient>) -> Self {
        Self {
            search,
            default_top_k: 3,
            semaphore: Arc::new(Semaphore::new(4)),
            isolate_failures: false,
            timeout: None,
        }
    }

    pub fn from_config(search: Arc<dyn SearchClient>, cfg: &SearchSection) -> Self {
        Self::new(search)
            .with_default_top_k(cfg.default_top_k)
            .with_max_concurrent(cfg.max_concurrent)
            .with_isolate_failures(cfg.isolate_failures)
            .with_timeout(cfg.timeout_secs.map(Duration::from_secs))
    }

    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k.max(1);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        self
    }

    /// 开启后单次搜索失败只产生 search_failed payload，不终止 run
    pub fn with_isolate_failures(mut self, isolate: bool) -> Self {
        self.isolate_failures = isolate;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 并发执行本轮全部 search 调用；结果顺序与 calls 一致，与完成先后无关。
    /// 未开启隔离时，任一搜索失败即返回 SearchFailure（按发出顺序取第一个错误）。
    pub async fn run_queries(&self, calls: &[ToolCall]) -> Result<Vec<ToolResult>, AgentError> {
        let outcomes = join_all(calls.iter().map(|call| self.run_search(call))).await;
        outcomes
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(AgentError::from)
    }

    async fn run_search(&self, call: &ToolCall) -> Result<ToolResult, SearchError> {
        let start = Instant::now();
        let args: SearchArgs = match decode(ToolName::Search, &call.arguments) {
            Ok(args) => args,
            Err(e) => {
                audit(&call.name, "invalid_arguments", start, &call.arguments);
                return Ok(ToolResult::error(call, e));
            }
        };
        if args.query.trim().is_empty() {
            audit(&call.name, "invalid_arguments", start, &call.arguments);
            return Ok(ToolResult::error(
                call,
                ToolError::InvalidArguments {
                    tool: call.name.clone(),
                    reason: "query must not be blank".to_string(),
                },
            ));
        }
        let top_k = args.top_k.unwrap_or(self.default_top_k);
        tracing::info!(query = %args.query, top_k, "Invoking tool: search");

        let outcome = {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|e| SearchError::Transport(e.to_string()))?;
            let fut = self.search.search(&args.query, top_k);
            match self.timeout {
                Some(limit) => timeout(limit, fut)
                    .await
                    .unwrap_or(Err(SearchError::Timeout)),
                None => fut.await,
            }
        };

        match outcome {
            Ok(mut hits) => {
                hits.truncate(top_k);
                audit(&call.name, "ok", start, &call.arguments);
                let value = serde_json::to_value(&hits).unwrap_or_default();
                Ok(ToolResult::success(call, value))
            }
            Err(e) if self.isolate_failures => {
                audit(&call.name, "error", start, &call.arguments);
                tracing::warn!(call_id = %call.id, "search failed, isolated: {}", e);
                Ok(ToolResult::error(call, ToolError::SearchFailed(e.to_string())))
            }
            Err(e) => {
                audit(&call.name, "error", start, &call.arguments);
                Err(e)
            }
        }
    }

    /// 执行单个 Mutation 类调用；返回 (结果, 是否成功调用了 finish)
    pub fn run_mutation(&self, call: &ToolCall, scratchpad: &mut Scratchpad) -> (ToolResult, bool) {
        let start = Instant::now();
        let outcome = apply_mutation(call, scratchpad);
        let (result, finished) = match outcome {
            Ok((value, finished)) => {
                audit(&call.name, "ok", start, &call.arguments);
                (ToolResult::success(call, value), finished)
            }
            Err(e) => {
                audit(&call.name, e.kind(), start, &call.arguments);
                tracing::warn!(tool = %call.name, call_id = %call.id, "tool error: {}", e);
                (ToolResult::error(call, e), false)
            }
        };
        (result, finished)
    }
}

fn apply_mutation(call: &ToolCall, scratchpad: &mut Scratchpad) -> Result<(Value, bool), ToolError> {
    let tool = ToolName::parse(&call.name).ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
    match tool {
        ToolName::AddTask => {
            let args: AddTaskArgs = decode(tool, &call.arguments)?;
            tracing::info!(
                description = %args.description,
                depends_on = ?args.depends_on,
                "Invoking tool: add_task"
            );
            let task_id = scratchpad.add_task(args.description, &args.depends_on)?;
            Ok((json!({ "task_id": task_id }), false))
        }
        ToolName::CompleteTask => {
            let args: CompleteTaskArgs = decode(tool, &call.arguments)?;
            tracing::info!(task_id = args.task_id, "Invoking tool: complete_task");
            scratchpad.complete_task(args.task_id, args.result)?;
            Ok((json!({ "status": "ok" }), false))
        }
        ToolName::Finish => {
            let args: FinishArgs = decode(tool, &call.arguments)?;
            tracing::info!("Invoking tool: finish");
            scratchpad.set_final_answer(args.answer);
            Ok((json!({ "status": "done" }), true))
        }
        ToolName::Search => Err(ToolError::InvalidArguments {
            tool: call.name.clone(),
            reason: "search runs in the concurrent query lane".to_string(),
        }),
    }
}

/// 解析工具参数；无法解析的原始字符串（Planner 给出非法 JSON）同样视为 InvalidArguments
fn decode<T: DeserializeOwned>(tool: ToolName, arguments: &Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone()).map_err(|e| ToolError::InvalidArguments {
        tool: tool.as_str().to_string(),
        reason: e.to_string(),
    })
}

fn audit(tool: &str, outcome: &str, start: Instant, args: &Value) {
    let audit = json!({
        "event": "tool_audit",
        "tool": tool,
        "ok": outcome == "ok",
        "outcome": outcome,
        "duration_ms": start.elapsed().as_millis() as u64,
        "args_preview": args_preview(args),
    });
    tracing::info!(audit = %audit.to_string(), "tool");
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
