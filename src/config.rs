//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SCOUT__*` 覆盖（双下划线表示嵌套，如 `SCOUT__RESEARCH__MAX_ROUNDS=5`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::llm::RetryConfig;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub research: ResearchSection,
    pub llm: LlmSection,
    pub search: SearchSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [research] 段：轮数上限与依赖约束策略
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchSection {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    /// true 时 complete_task 拒绝依赖未完成的任务；默认仅作为提示
    #[serde(default)]
    pub strict_dependencies: bool,
}

impl Default for ResearchSection {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            strict_dependencies: false,
        }
    }
}

fn default_max_rounds() -> usize {
    10
}

/// [llm] 段：后端选择、超时与重试
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// openai / deepseek / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
    #[serde(default)]
    pub retry: LlmRetrySection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            embedding_model: default_embedding_model(),
            timeouts: LlmTimeoutsSection::default(),
            retry: LlmRetrySection::default(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [llm.retry] 段：默认不重试，Planner 失败直接终止 run
#[derive(Debug, Clone, Deserialize)]
pub struct LlmRetrySection {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for LlmRetrySection {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl From<&LlmRetrySection> for RetryConfig {
    fn from(s: &LlmRetrySection) -> Self {
        RetryConfig {
            max_retries: s.max_retries,
            initial_backoff_ms: s.initial_backoff_ms,
            max_backoff_ms: s.max_backoff_ms,
        }
    }
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8000
}

/// [search] 段：默认 top_k、并发上限、失败隔离与单次超时
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// true 时单次搜索失败只作为该调用的错误结果，不终止 run
    #[serde(default)]
    pub isolate_failures: bool,
    /// 未设置则不加超时
    pub timeout_secs: Option<u64>,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_concurrent: default_max_concurrent(),
            isolate_failures: false,
            timeout_secs: None,
        }
    }
}

fn default_top_k() -> usize {
    3
}

fn default_max_concurrent() -> usize {
    4
}

/// 从 config 目录加载配置，环境变量 SCOUT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SCOUT__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SCOUT")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
