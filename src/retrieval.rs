//! Retrieval engine: similarity search and retrieval-augmented answering.
//!
//! Ranking happens in application code: the store hands back the scoped
//! candidate chunks and [`cosine_similarity`] scores them against the query
//! embedding. Chunks without a vector (failed embeddings) never participate.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::clients::{CompletionClient, EmbeddingClient};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::stores::ChunkStore;

/// Fixed reply returned by [`RetrievalEngine::answer`] when the user has no
/// indexed chunks at all; no completion call is made in that case.
pub const NOTHING_INDEXED_ANSWER: &str =
    "You have no indexed materials yet. Index a material and ask again.";

/// One ranked search result.
#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
    pub material_id: Uuid,
    pub material_title: String,
    pub content: String,
    pub chunk_index: usize,
    pub similarity: f32,
}

/// A contributing material, cited with its best similarity score.
#[derive(Clone, Debug, Serialize)]
pub struct SourceRef {
    pub material_id: Uuid,
    pub material_title: String,
    pub similarity: f32,
}

/// A grounded answer plus the materials it drew from.
#[derive(Clone, Debug, Serialize)]
pub struct LibraryAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Cosine similarity between two vectors.
///
/// A zero-magnitude vector (or mismatched lengths) yields 0.0 — never a
/// division error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 {
        return 0.0;
    }
    dot / magnitude
}

/// Searches and answers over a user's indexed chunks.
pub struct RetrievalEngine {
    completion: Arc<dyn CompletionClient>,
    embedding: Arc<dyn EmbeddingClient>,
    chunks: Arc<dyn ChunkStore>,
    config: PipelineConfig,
}

impl RetrievalEngine {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        embedding: Arc<dyn EmbeddingClient>,
        chunks: Arc<dyn ChunkStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            completion,
            embedding,
            chunks,
            config,
        }
    }

    /// Rank the user's chunks against `query`.
    ///
    /// Scans one material when `material_scope` is set, otherwise every
    /// material the user owns. Returns the top `limit` hits by descending
    /// similarity, ties broken by ascending chunk index.
    #[instrument(skip(self, query), fields(%user_id, limit))]
    pub async fn search(
        &self,
        user_id: Uuid,
        query: &str,
        limit: usize,
        material_scope: Option<Uuid>,
    ) -> Result<Vec<SearchHit>, PipelineError> {
        let query_vector = self.embedding.embed(query).await?;
        let candidates = self.chunks.scoped_chunks(user_id, material_scope).await?;

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .filter_map(|source| {
                let vector = source.chunk.embedding.as_ref()?;
                let similarity = cosine_similarity(&query_vector, vector);
                Some(SearchHit {
                    material_id: source.chunk.material_id,
                    material_title: source.material_title,
                    content: source.chunk.content,
                    chunk_index: source.chunk.chunk_index,
                    similarity,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    /// Answer a question from the user's own library.
    ///
    /// Retrieves grounding chunks first, then asks the completion service to
    /// answer strictly from that context, naming the source material. Each
    /// contributing material appears once in `sources`, cited with its best
    /// score.
    #[instrument(skip(self, question), fields(%user_id))]
    pub async fn answer(
        &self,
        user_id: Uuid,
        question: &str,
    ) -> Result<LibraryAnswer, PipelineError> {
        let hits = self
            .search(user_id, question, self.config.default_search_limit, None)
            .await?;

        if hits.is_empty() {
            return Ok(LibraryAnswer {
                answer: NOTHING_INDEXED_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let context = hits
            .iter()
            .map(|hit| format!("[From material: {}]\n{}", hit.material_title, hit.content))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let prompt = grounded_prompt(question, &context);
        let answer = self.completion.complete(&prompt).await?;

        let mut sources: Vec<SourceRef> = Vec::new();
        for hit in &hits {
            match sources
                .iter_mut()
                .find(|source| source.material_id == hit.material_id)
            {
                Some(source) => source.similarity = source.similarity.max(hit.similarity),
                None => sources.push(SourceRef {
                    material_id: hit.material_id,
                    material_title: hit.material_title.clone(),
                    similarity: hit.similarity,
                }),
            }
        }

        Ok(LibraryAnswer { answer, sources })
    }
}

fn grounded_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a study assistant. Answer the user's question using ONLY the\n\
         information in the provided context.\n\n\
         Context from the user's materials:\n{context}\n\n\
         Question: {question}\n\n\
         Rules:\n\
         1. Answer only from the context\n\
         2. If the context is not enough, say so\n\
         3. Name which material the information comes from\n\
         4. Be concrete and helpful\n\n\
         Answer:"
    )
}
