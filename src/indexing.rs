//! Semantic index builder: chunk, embed, persist.
//!
//! Re-indexing is idempotent: all prior chunks of the material are discarded
//! before the deterministic splitter runs, so no duplicate or orphaned
//! generations ever coexist. Embedding failures are per-chunk: the chunk is
//! persisted with a null vector (excluded from ranking) and its siblings
//! continue.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::chunking;
use crate::clients::EmbeddingClient;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::material::Chunk;
use crate::stores::{ChunkStore, MaterialStore};

/// Builds and rebuilds the per-material chunk index.
pub struct SemanticIndexer {
    embedding: Arc<dyn EmbeddingClient>,
    materials: Arc<dyn MaterialStore>,
    chunks: Arc<dyn ChunkStore>,
    config: PipelineConfig,
}

impl SemanticIndexer {
    pub fn new(
        embedding: Arc<dyn EmbeddingClient>,
        materials: Arc<dyn MaterialStore>,
        chunks: Arc<dyn ChunkStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            embedding,
            materials,
            chunks,
            config,
        }
    }

    /// Index (or re-index) one material.
    ///
    /// Returns the number of successfully embedded chunks. Too little text is
    /// a no-op returning 0, not an error. A vector of unexpected length
    /// aborts the run: dimensionality is fixed by the embedding service and
    /// must be uniform across all chunks of all materials.
    #[instrument(skip(self), fields(%material_id))]
    pub async fn index_material(&self, material_id: Uuid) -> Result<usize, PipelineError> {
        let material = self
            .materials
            .material(material_id)
            .await?
            .ok_or(PipelineError::MaterialNotFound(material_id))?;

        let Some(text) = material.trimmed_text() else {
            return Ok(0);
        };
        if material.has_error_text() || text.chars().count() < self.config.min_text_len {
            return Ok(0);
        }

        let discarded = self.chunks.delete_chunks(material_id).await?;
        if discarded > 0 {
            debug!(%material_id, discarded, "discarded prior chunks for re-index");
        }

        let drafts = chunking::split(text, &self.config.chunking);
        let expected_dim = self.embedding.dimension();

        let outcomes: Vec<_> = stream::iter(drafts.into_iter().map(|draft| {
            let embedding = Arc::clone(&self.embedding);
            async move {
                let vector = embedding.embed(&draft.content).await;
                (draft, vector)
            }
        }))
        .buffer_unordered(self.config.embed_limit)
        .collect()
        .await;

        let mut rows = Vec::with_capacity(outcomes.len());
        let mut embedded = 0usize;
        for (draft, vector) in outcomes {
            let embedding = match vector {
                Ok(values) => {
                    if values.len() != expected_dim {
                        return Err(PipelineError::DimensionMismatch {
                            expected: expected_dim,
                            got: values.len(),
                        });
                    }
                    embedded += 1;
                    Some(values)
                }
                Err(err) => {
                    warn!(%material_id, chunk_index = draft.index, error = %err,
                        "embedding failed; chunk persists without a vector");
                    None
                }
            };
            rows.push(Chunk {
                id: Uuid::new_v4(),
                material_id,
                user_id: material.user_id,
                chunk_index: draft.index,
                content: draft.content,
                char_start: draft.char_start,
                char_end: draft.char_end,
                embedding,
            });
        }

        // Persistence order is irrelevant; chunks carry explicit indices.
        rows.sort_by_key(|chunk| chunk.chunk_index);
        self.chunks.insert_chunks(rows).await?;

        debug!(%material_id, embedded, "indexing complete");
        Ok(embedded)
    }
}
