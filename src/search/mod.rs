//! 检索层：只读查询能力
//!
//! 核心循环只依赖 SearchClient 契约：search 返回按 score 降序、长度不超过 top_k 的命中列表；
//! list_documents 为调试用途。默认实现为 VectorStore（固定语料 + 余弦相似度）。

pub mod corpus;
pub mod vector_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use corpus::ACME_DOCUMENTS;
pub use vector_store::VectorStore;

/// 单条检索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: usize,
    pub content: String,
    pub score: f32,
}

/// 语料中的文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: usize,
    pub content: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Search transport error: {0}")]
    Transport(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Search timed out")]
    Timeout,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, SearchError>;

    async fn list_documents(&self) -> Result<Vec<Document>, SearchError>;
}
