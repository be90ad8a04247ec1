//! Headless 研究 Agent
//!
//! ResearchAgent 持有只读共享的 Planner 与 ToolDispatcher，ask 每次新建 Scratchpad 与对话历史，
//! 多个 ask 可并发执行而无需同步。create_agent 按配置组装 LLM、嵌入与默认知识库。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::{load_config, AppConfig};
use crate::core::AgentError;
use crate::llm::{
    create_embedder_from_config, create_llm_from_config, EmbeddingProvider, LexicalEmbedder,
    LlmClient,
};
use crate::research::{
    research_loop, Planner, ResearchEvent, ResearchResult, ResearchSession, DEFAULT_MAX_ROUNDS,
};
use crate::search::{SearchClient, VectorStore, ACME_DOCUMENTS};
use crate::tools::ToolDispatcher;

pub struct ResearchAgent {
    planner: Planner,
    dispatcher: ToolDispatcher,
    max_rounds: usize,
    strict_dependencies: bool,
}

impl ResearchAgent {
    /// 使用默认派发参数（top_k 3、并发 4、失败不隔离）
    pub fn new(llm: Arc<dyn LlmClient>, search: Arc<dyn SearchClient>) -> Self {
        Self::from_parts(Planner::new(llm), ToolDispatcher::new(search))
    }

    pub fn from_parts(planner: Planner, dispatcher: ToolDispatcher) -> Self {
        Self {
            planner,
            dispatcher,
            max_rounds: DEFAULT_MAX_ROUNDS,
            strict_dependencies: false,
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

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// 回答一个问题：只返回最终答案
    pub async fn ask(&self, question: &str) -> Result<String, AgentError> {
        Ok(self.ask_detailed(question).await?.answer)
    }

    /// 回答一个问题：返回结束方式、轮数、最终 Scratchpad 与完整 transcript
    pub async fn ask_detailed(&self, question: &str) -> Result<ResearchResult, AgentError> {
        research_loop(&self.session(), question).await
    }

    /// 同 ask_detailed，并把过程事件推送到 tx
    pub async fn ask_with_events(
        &self,
        question: &str,
        tx: &UnboundedSender<ResearchEvent>,
    ) -> Result<ResearchResult, AgentError> {
        research_loop(&self.session().with_event_tx(tx), question).await
    }

    fn session(&self) -> ResearchSession<'_> {
        ResearchSession::new(&self.planner, &self.dispatcher)
            .with_max_rounds(self.max_rounds)
            .with_strict_dependencies(self.strict_dependencies)
    }
}

/// 加载配置（config/default.toml + SCOUT__* 环境变量）并组装 Agent
pub async fn create_agent(config_path: Option<PathBuf>) -> Result<ResearchAgent, AgentError> {
    let cfg = load_config(config_path).map_err(|e| AgentError::Config(e.to_string()))?;
    create_agent_with_config(&cfg).await
}

/// 按给定配置组装：LLM 后端、嵌入、默认 Acme 知识库上的 VectorStore
pub async fn create_agent_with_config(cfg: &AppConfig) -> Result<ResearchAgent, AgentError> {
    if cfg.search.default_top_k == 0 {
        return Err(AgentError::Config(
            "search.default_top_k must be at least 1".to_string(),
        ));
    }

    let llm = create_llm_from_config(cfg);

    // DeepSeek 不提供 embeddings，自定义 base_url 只用于 openai
    let embedder: Arc<dyn EmbeddingProvider> = match cfg.llm.provider.to_lowercase().as_str() {
        "openai" => create_embedder_from_config(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.embedding_model,
            None,
        ),
        "mock" => Arc::new(LexicalEmbedder::default()),
        _ => create_embedder_from_config(None, &cfg.llm.embedding_model, None),
    };
    let documents = ACME_DOCUMENTS.iter().map(|d| d.to_string()).collect();
    let store = VectorStore::build(documents, embedder).await?;

    let dispatcher = ToolDispatcher::from_config(Arc::new(store), &cfg.search);
    Ok(ResearchAgent::from_parts(Planner::new(llm), dispatcher)
        .with_max_rounds(cfg.research.max_rounds)
        .with_strict_dependencies(cfg.research.strict_dependencies))
}
