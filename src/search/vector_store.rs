//! 向量检索：构建时一次性嵌入全部文档，查询时按余弦相似度排序取 top_k

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::EmbeddingProvider;
use crate::search::{Document, SearchClient, SearchError, SearchHit};

pub struct VectorStore {
    documents: Vec<String>,
    matrix: Vec<Vec<f32>>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorStore {
    /// 嵌入全部文档；嵌入失败或数量不一致时返回 SearchError::Embedding
    pub async fn build(
        documents: Vec<String>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, SearchError> {
        let matrix = embedder
            .embed(&documents)
            .await
            .map_err(SearchError::Embedding)?;
        if matrix.len() != documents.len() {
            return Err(SearchError::Embedding(format!(
                "expected {} vectors, got {}",
                documents.len(),
                matrix.len()
            )));
        }
        tracing::info!(documents = documents.len(), "vector store ready");
        Ok(Self {
            documents,
            matrix,
            embedder,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// 余弦相似度；分母加 1e-10 避免零向量除零
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + 1e-10)
}

#[async_trait]
impl SearchClient for VectorStore {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, SearchError> {
        tracing::debug!(query = %query, top_k, "vector search");
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(SearchError::Embedding)?
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::Embedding("no vector for query".to_string()))?;

        let mut scored: Vec<(usize, f32)> = self
            .matrix
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(v, &query_vec)))
            .collect();
        // 降序；同分按 doc_id 升序，保证结果确定
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(doc_id, score)| SearchHit {
                doc_id,
                content: self.documents[doc_id].clone(),
                score,
            })
            .collect())
    }

    async fn list_documents(&self) -> Result<Vec<Document>, SearchError> {
        Ok(self
            .documents
            .iter()
            .enumerate()
            .map(|(doc_id, content)| Document {
                doc_id,
                content: content.clone(),
            })
            .collect())
    }
}
