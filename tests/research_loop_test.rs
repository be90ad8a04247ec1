//! 研究主循环集成测试：脚本化 Planner + 假检索 / 真实 VectorStore

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use scout::llm::{Completion, LexicalEmbedder, LlmError, MockLlmClient, ToolCall};
    use scout::memory::{Role, TaskStatus};
    use scout::research::{
        Planner, ResearchEvent, ResolutionOutcome, NO_RESULTS_ANSWER,
    };
    use scout::search::{
        Document, SearchClient, SearchError, SearchHit, VectorStore, ACME_DOCUMENTS,
    };
    use scout::tools::ToolDispatcher;
    use scout::{AgentError, ResearchAgent};

    fn tc(id: &str, name: &str, args: Value) -> ToolCall {
        ToolCall::new(id, name, args)
    }

    fn calls(list: Vec<ToolCall>) -> Result<Completion, LlmError> {
        Ok(Completion::tool_calls(list))
    }

    /// 按查询词决定延迟；命中内容即查询本身，并记录完成顺序
    struct DelayedSearch {
        completed: Mutex<Vec<String>>,
    }

    impl DelayedSearch {
        fn new() -> Self {
            Self {
                completed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchClient for DelayedSearch {
        async fn search(&self, query: &str, _top_k: usize) -> Result<Vec<SearchHit>, SearchError> {
            let delay = match query {
                "slow" => 120,
                "medium" => 60,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.completed.lock().unwrap().push(query.to_string());
            Ok(vec![SearchHit {
                doc_id: 0,
                content: query.to_string(),
                score: 1.0,
            }])
        }

        async fn list_documents(&self) -> Result<Vec<Document>, SearchError> {
            Ok(Vec::new())
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl SearchClient for FailingSearch {
        async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<SearchHit>, SearchError> {
            Err(SearchError::Transport("vector store unavailable".into()))
        }

        async fn list_documents(&self) -> Result<Vec<Document>, SearchError> {
            Err(SearchError::Transport("vector store unavailable".into()))
        }
    }

    async fn acme_store() -> Arc<VectorStore> {
        let docs = ACME_DOCUMENTS.iter().map(|d| d.to_string()).collect();
        Arc::new(
            VectorStore::build(docs, Arc::new(LexicalEmbedder::new(1024)))
                .await
                .unwrap(),
        )
    }

    fn tool_contents(messages: &[scout::memory::Message]) -> Vec<(String, Value)> {
        messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| {
                (
                    m.tool_call_id.clone().unwrap_or_default(),
                    serde_json::from_str(&m.content).unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_who_founded_acme_end_to_end() {
        let answer = "Acme Robotics was founded in 2019 by Dana Holt.";
        let llm = Arc::new(MockLlmClient::with_script(vec![
            calls(vec![tc("c1", "add_task", json!({"description": "Find the founder"}))]),
            calls(vec![tc("c2", "search", json!({"query": "Acme founder founded"}))]),
            calls(vec![tc(
                "c3",
                "complete_task",
                json!({"task_id": 0, "result": "Dana Holt founded Acme in 2019"}),
            )]),
            calls(vec![tc("c4", "finish", json!({"answer": answer}))]),
        ]));
        let agent = ResearchAgent::new(llm.clone(), acme_store().await);

        let result = agent.ask_detailed("Who founded Acme?").await.unwrap();
        assert_eq!(result.answer, answer);
        assert_eq!(result.outcome, ResolutionOutcome::ExplicitFinish(answer.to_string()));
        assert_eq!(result.rounds, 4);
        assert_eq!(result.scratchpad.final_answer(), Some(answer));
        assert_eq!(result.scratchpad.tasks()[0].status, TaskStatus::Complete);
        assert_eq!(llm.request_count(), 4);

        let tools = tool_contents(&result.messages);
        assert_eq!(tools[0], ("c1".to_string(), json!({"task_id": 0})));
        let hits = tools[1].1.as_array().unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0]["doc_id"], 0);
        assert!(hits[0]["content"].as_str().unwrap().contains("Dana Holt"));
        assert_eq!(tools[2].1, json!({"status": "ok"}));
        assert_eq!(tools[3].1, json!({"status": "done"}));

        // 第 4 轮的上下文里 Scratchpad 已反映任务完成
        let last_request = &llm.requests()[3];
        assert_eq!(last_request[0].role, Role::System);
        assert!(last_request[0].content.contains("\"status\": \"complete\""));
        assert!(last_request[0].content.contains("Who founded Acme?"));
    }

    #[tokio::test]
    async fn test_who_founded_acme_in_two_rounds() {
        let answer = "Acme Robotics was founded by Dana Holt.";
        let llm = Arc::new(MockLlmClient::with_script(vec![
            calls(vec![
                tc("t0", "add_task", json!({"description": "Find the founder"})),
                tc("s0", "search", json!({"query": "Acme founder founded", "top_k": 1})),
            ]),
            calls(vec![
                tc("c0", "complete_task", json!({"task_id": 0, "result": "Dana Holt"})),
                tc("f0", "finish", json!({"answer": answer})),
            ]),
        ]));
        let agent = ResearchAgent::new(llm.clone(), acme_store().await);

        let result = agent.ask_detailed("Who founded Acme?").await.unwrap();
        assert_eq!(result.answer, answer);
        assert_eq!(result.rounds, 2);
        assert_eq!(llm.request_count(), 2);
        assert_eq!(result.scratchpad.final_answer(), Some(answer));

        let tools = tool_contents(&result.messages);
        let ids: Vec<&str> = tools.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["s0", "t0", "c0", "f0"]);
        let hits = tools[0].1.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["doc_id"], 0);
        assert_eq!(tools[1].1, json!({"task_id": 0}));
    }

    #[tokio::test]
    async fn test_blank_finish_answer_resolves_from_scratchpad() {
        let llm = Arc::new(MockLlmClient::with_script(vec![calls(vec![
            tc("a", "add_task", json!({"description": "find founder"})),
            tc("c", "complete_task", json!({"task_id": 0, "result": "Dana Holt"})),
            tc("f", "finish", json!({"answer": ""})),
        ])]));
        let agent = ResearchAgent::new(llm, Arc::new(DelayedSearch::new()));

        let result = agent.ask_detailed("Who founded Acme?").await.unwrap();
        assert_eq!(result.rounds, 1);
        assert_eq!(result.outcome, ResolutionOutcome::ExplicitFinish(String::new()));
        assert_eq!(
            result.answer,
            "[Partial answer - max iterations reached]\n- find founder: Dana Holt"
        );
    }

    #[tokio::test]
    async fn test_concurrent_searches_keep_emission_order() {
        let search = Arc::new(DelayedSearch::new());
        let llm = Arc::new(MockLlmClient::with_script(vec![
            calls(vec![
                tc("s1", "search", json!({"query": "slow"})),
                tc("m1", "add_task", json!({"description": "collect"})),
                tc("s2", "search", json!({"query": "medium"})),
                tc("s3", "search", json!({"query": "fast"})),
            ]),
            calls(vec![tc("f", "finish", json!({"answer": "ok"}))]),
        ]));
        let agent = ResearchAgent::new(llm, search.clone());

        let result = agent.ask_detailed("q").await.unwrap();

        // 完成顺序与发出顺序相反，说明并发执行
        assert_eq!(
            *search.completed.lock().unwrap(),
            vec!["fast", "medium", "slow"]
        );

        let tools = tool_contents(&result.messages);
        let ids: Vec<&str> = tools.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3", "m1", "f"]);
        assert_eq!(tools[0].1[0]["content"], "slow");
        assert_eq!(tools[1].1[0]["content"], "medium");
        assert_eq!(tools[2].1[0]["content"], "fast");

        // Planner 消息在其结果之前
        assert_eq!(result.messages[0].role, Role::Assistant);
        assert_eq!(result.messages[0].tool_calls.len(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_returns_partial_answer() {
        let llm = Arc::new(
            MockLlmClient::with_script(vec![
                calls(vec![
                    tc("a1", "add_task", json!({"description": "Find founder"})),
                    tc("a2", "add_task", json!({"description": "Find funding", "depends_on": [0]})),
                ]),
                calls(vec![
                    tc("c1", "complete_task", json!({"task_id": 0, "result": "Dana Holt"})),
                    tc("c2", "complete_task", json!({"task_id": 1, "result": "$42M Series B"})),
                ]),
            ])
            .with_fallback(Completion::tool_calls(vec![tc(
                "s",
                "search",
                json!({"query": "more"}),
            )])),
        );
        let agent = ResearchAgent::new(llm.clone(), Arc::new(DelayedSearch::new())).with_max_rounds(4);

        let result = agent.ask_detailed("Tell me about Acme").await.unwrap();
        assert_eq!(result.outcome, ResolutionOutcome::Exhausted);
        assert_eq!(result.rounds, 4);
        assert_eq!(llm.request_count(), 4);
        assert_eq!(
            result.answer,
            "[Partial answer - max iterations reached]\n- Find founder: Dana Holt\n- Find funding: $42M Series B"
        );
    }

    #[tokio::test]
    async fn test_exhausted_without_results() {
        let llm = Arc::new(MockLlmClient::new().with_fallback(Completion::tool_calls(vec![
            tc("s", "search", json!({"query": "anything"})),
        ])));
        let agent = ResearchAgent::new(llm, Arc::new(DelayedSearch::new())).with_max_rounds(3);
        assert_eq!(agent.ask("q").await.unwrap(), NO_RESULTS_ANSWER);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_and_run_continues() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            calls(vec![
                tc("x", "deleteEverything", json!({})),
                tc("a", "add_task", json!({"description": "still works"})),
            ]),
            calls(vec![tc("f", "finish", json!({"answer": "done anyway"}))]),
        ]));
        let agent = ResearchAgent::new(llm, Arc::new(DelayedSearch::new()));

        let result = agent.ask_detailed("q").await.unwrap();
        assert_eq!(result.answer, "done anyway");
        assert_eq!(result.rounds, 2);
        assert_eq!(result.scratchpad.tasks().len(), 1);

        let tools = tool_contents(&result.messages);
        assert_eq!(tools[0].0, "x");
        assert_eq!(tools[0].1["error"], "unknown_tool");
        assert_eq!(tools[1].1, json!({"task_id": 0}));
    }

    #[tokio::test]
    async fn test_implicit_finish_uses_planner_text() {
        let llm = Arc::new(MockLlmClient::with_script(vec![Ok(Completion::text(
            "Dana Holt founded Acme.",
        ))]));
        let agent = ResearchAgent::new(llm, Arc::new(DelayedSearch::new()));
        let result = agent.ask_detailed("Who founded Acme?").await.unwrap();
        assert_eq!(
            result.outcome,
            ResolutionOutcome::ImplicitFinish("Dana Holt founded Acme.".into())
        );
        assert_eq!(result.answer, "Dana Holt founded Acme.");
        assert_eq!(result.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_planner_failure_aborts_run() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            calls(vec![tc("a", "add_task", json!({"description": "t"}))]),
            Err(LlmError::Api {
                status: 500,
                message: "upstream".into(),
            }),
        ]));
        let agent = ResearchAgent::new(llm, Arc::new(DelayedSearch::new()));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let err = agent.ask_with_events("q", &tx).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::PlannerFailure(LlmError::Api { status: 500, .. })
        ));

        drop(tx);
        let mut last = None;
        while let Some(ev) = rx.recv().await {
            last = Some(ev);
        }
        assert!(matches!(last, Some(ResearchEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_search_failure_aborts_by_default() {
        let llm = Arc::new(MockLlmClient::with_script(vec![calls(vec![tc(
            "s",
            "search",
            json!({"query": "x"}),
        )])]));
        let agent = ResearchAgent::new(llm, Arc::new(FailingSearch));
        assert!(matches!(
            agent.ask("q").await,
            Err(AgentError::SearchFailure(SearchError::Transport(_)))
        ));
    }

    #[tokio::test]
    async fn test_search_failure_isolated_when_enabled() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            calls(vec![tc("s", "search", json!({"query": "x"}))]),
            calls(vec![tc("f", "finish", json!({"answer": "recovered"}))]),
        ]));
        let dispatcher = ToolDispatcher::new(Arc::new(FailingSearch)).with_isolate_failures(true);
        let agent = ResearchAgent::from_parts(Planner::new(llm), dispatcher);

        let result = agent.ask_detailed("q").await.unwrap();
        assert_eq!(result.answer, "recovered");
        let tools = tool_contents(&result.messages);
        assert_eq!(tools[0].1["error"], "search_failed");
    }

    #[tokio::test]
    async fn test_strict_dependencies_reject_early_completion() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            calls(vec![
                tc("a", "add_task", json!({"description": "first"})),
                tc("b", "add_task", json!({"description": "second", "depends_on": [0]})),
                tc("c", "complete_task", json!({"task_id": 1, "result": "too early"})),
            ]),
            calls(vec![tc("f", "finish", json!({"answer": "end"}))]),
        ]));
        let agent = ResearchAgent::new(llm, Arc::new(DelayedSearch::new()))
            .with_strict_dependencies(true);

        let result = agent.ask_detailed("q").await.unwrap();
        let tools = tool_contents(&result.messages);
        assert_eq!(tools[2].1["error"], "unmet_dependencies");
        assert_eq!(result.scratchpad.tasks()[1].status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_advisory_dependencies_allow_early_completion() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            calls(vec![
                tc("a", "add_task", json!({"description": "first"})),
                tc("b", "add_task", json!({"description": "second", "depends_on": [0]})),
                tc("c", "complete_task", json!({"task_id": 1, "result": "early"})),
            ]),
            calls(vec![tc("f", "finish", json!({"answer": "end"}))]),
        ]));
        let agent = ResearchAgent::new(llm, Arc::new(DelayedSearch::new()));

        let result = agent.ask_detailed("q").await.unwrap();
        assert_eq!(tool_contents(&result.messages)[2].1, json!({"status": "ok"}));
        assert_eq!(result.scratchpad.tasks()[1].status, TaskStatus::Complete);
    }
}
