//! The [`ContentPipeline`] facade: one handle over both engines.
//!
//! Wires the generation orchestrator, the semantic indexer, and the retrieval
//! engine to shared clients and stores, then exposes every pipeline operation
//! as a single method. Callers that need finer control can still construct
//! the engines directly.

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::clients::{CompletionClient, EmbeddingClient};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::generation::{MaterialStatus, Orchestrator, ProcessingReport};
use crate::indexing::SemanticIndexer;
use crate::material::{Artifact, Material};
use crate::retrieval::{LibraryAnswer, RetrievalEngine, SearchHit};
use crate::stores::{ArtifactStore, ChunkStore, MaterialStore};

/// Shared entry point for content intelligence operations.
pub struct ContentPipeline {
    materials: Arc<dyn MaterialStore>,
    orchestrator: Orchestrator,
    indexer: SemanticIndexer,
    retrieval: RetrievalEngine,
}

impl ContentPipeline {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        embedding: Arc<dyn EmbeddingClient>,
        materials: Arc<dyn MaterialStore>,
        artifacts: Arc<dyn ArtifactStore>,
        chunks: Arc<dyn ChunkStore>,
        config: PipelineConfig,
    ) -> Self {
        let orchestrator = Orchestrator::new(
            Arc::clone(&completion),
            Arc::clone(&materials),
            Arc::clone(&artifacts),
            config.clone(),
        );
        let indexer = SemanticIndexer::new(
            Arc::clone(&embedding),
            Arc::clone(&materials),
            Arc::clone(&chunks),
            config.clone(),
        );
        let retrieval = RetrievalEngine::new(completion, embedding, chunks, config);
        Self {
            materials,
            orchestrator,
            indexer,
            retrieval,
        }
    }

    /// Convenience constructor for a single store implementing all three
    /// storage traits (as [`crate::stores::MemoryStore`] and
    /// [`crate::stores::SqliteStore`] both do).
    pub fn from_store<S>(
        completion: Arc<dyn CompletionClient>,
        embedding: Arc<dyn EmbeddingClient>,
        store: Arc<S>,
        config: PipelineConfig,
    ) -> Self
    where
        S: MaterialStore + ArtifactStore + ChunkStore + 'static,
    {
        Self::new(
            completion,
            embedding,
            Arc::clone(&store) as Arc<dyn MaterialStore>,
            Arc::clone(&store) as Arc<dyn ArtifactStore>,
            store as Arc<dyn ChunkStore>,
            config,
        )
    }

    // ── Ingestion ──────────────────────────────────────────────────────

    /// Register a new material, returning its id.
    #[instrument(skip(self, title, text), fields(%user_id))]
    pub async fn add_material(
        &self,
        user_id: Uuid,
        title: impl Into<String>,
        text: Option<String>,
    ) -> Result<Uuid, PipelineError> {
        let material = Material::new(user_id, title.into(), text);
        let id = material.id;
        self.materials.insert_material(material).await?;
        Ok(id)
    }

    /// Delete a material together with its artifacts and chunks.
    pub async fn delete_material(&self, material_id: Uuid) -> Result<(), PipelineError> {
        self.materials.delete_material(material_id).await?;
        Ok(())
    }

    // ── Generation ─────────────────────────────────────────────────────

    /// Run the full generation pass for one material.
    pub async fn process(&self, material_id: Uuid) -> Result<ProcessingReport, PipelineError> {
        self.orchestrator.process(material_id).await
    }

    /// Regenerate a single format named by its wire string (e.g. `"quiz"`,
    /// `"podcast_script"`).
    pub async fn regenerate(
        &self,
        material_id: Uuid,
        format: &str,
    ) -> Result<Artifact, PipelineError> {
        let format = format.parse()?;
        self.orchestrator.regenerate(material_id, format).await
    }

    /// Current status plus which artifacts exist.
    pub async fn status(&self, material_id: Uuid) -> Result<MaterialStatus, PipelineError> {
        self.orchestrator.status(material_id).await
    }

    // ── Indexing and retrieval ─────────────────────────────────────────

    /// Build (or rebuild) the chunk index for one material. Returns how many
    /// chunks were successfully embedded.
    pub async fn index_material(&self, material_id: Uuid) -> Result<usize, PipelineError> {
        self.indexer.index_material(material_id).await
    }

    /// Rank a user's indexed chunks against a query.
    pub async fn search(
        &self,
        user_id: Uuid,
        query: &str,
        limit: usize,
        material_scope: Option<Uuid>,
    ) -> Result<Vec<SearchHit>, PipelineError> {
        self.retrieval
            .search(user_id, query, limit, material_scope)
            .await
    }

    /// Answer a question grounded in the user's indexed library.
    pub async fn ask_library(
        &self,
        user_id: Uuid,
        question: &str,
    ) -> Result<LibraryAnswer, PipelineError> {
        self.retrieval.answer(user_id, question).await
    }
}
