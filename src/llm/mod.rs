//! LLM 层：Planner 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）与嵌入

pub mod embedding;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::config::AppConfig;

pub use embedding::{create_embedder_from_config, EmbeddingProvider, LexicalEmbedder, OpenAiEmbedder};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage, DEEPSEEK_BASE_URL, OPENAI_BASE_URL};
pub use traits::{Completion, LlmClient, LlmError, RetryConfig, RetryingLlmClient, ToolCall};

/// 根据配置与环境变量选择 LLM 后端（OpenAI 兼容 / DeepSeek / Mock），并按 [llm.retry] 包装重试
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let timeout = cfg.llm.timeouts.request;

    let base: Arc<dyn LlmClient> = match provider.as_str() {
        "deepseek" => match std::env::var("DEEPSEEK_API_KEY") {
            Ok(key) => {
                let base_url = cfg.llm.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL);
                tracing::info!("Using DeepSeek LLM ({})", cfg.llm.model);
                Arc::new(OpenAiClient::new(Some(base_url), &cfg.llm.model, Some(&key), timeout))
            }
            Err(_) => {
                tracing::warn!("DEEPSEEK_API_KEY not set, using Mock LLM");
                Arc::new(MockLlmClient::new())
            }
        },
        "openai" => match std::env::var("OPENAI_API_KEY") {
            Ok(key) => {
                tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
                Arc::new(OpenAiClient::new(
                    cfg.llm.base_url.as_deref(),
                    &cfg.llm.model,
                    Some(&key),
                    timeout,
                ))
            }
            Err(_) => {
                tracing::warn!("OPENAI_API_KEY not set, using Mock LLM");
                Arc::new(MockLlmClient::new())
            }
        },
        other => {
            if other != "mock" {
                tracing::warn!("Unknown LLM provider '{}', using Mock LLM", other);
            }
            Arc::new(MockLlmClient::new())
        }
    };

    let retry = RetryConfig::from(&cfg.llm.retry);
    if retry.max_retries > 0 {
        Arc::new(RetryingLlmClient::new(base, retry))
    } else {
        base
    }
}
