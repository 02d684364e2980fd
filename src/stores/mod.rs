//! Storage traits for materials, artifacts, and chunks.
//!
//! The pipeline engines talk to storage only through these traits, so the
//! same orchestrator/indexer/retrieval code runs against the in-memory store
//! in tests and the SQLite store in production.
//!
//! Ownership rules enforced by every implementation:
//! - artifacts are unique per (material, format) and replaced on upsert;
//! - chunks are replaced wholesale on re-index (delete, then insert);
//! - deleting a material cascades to its artifacts and chunks.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

use crate::material::{Artifact, ArtifactFormat, Chunk, Material, ProcessingStatus};

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Errors raised by store operations.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The underlying backend failed (connection, constraint, migration, ...).
    #[error("backend error: {0}")]
    #[diagnostic(
        code(studysmith::store::backend),
        help("Check that the database is reachable and migrations have run.")
    )]
    Backend(String),

    /// A persisted value could not be decoded.
    #[error("corrupt stored value: {0}")]
    #[diagnostic(code(studysmith::store::corrupt))]
    Corrupt(String),

    /// JSON (de)serialization failure for structured columns.
    #[error(transparent)]
    #[diagnostic(code(studysmith::store::serde))]
    Serde(#[from] serde_json::Error),
}

/// A chunk joined with the title of its owning material, as retrieval needs
/// it for source labeling.
#[derive(Clone, Debug)]
pub struct ChunkSource {
    pub chunk: Chunk,
    pub material_title: String,
}

/// CRUD surface for materials. Status transitions are driven exclusively by
/// the generation orchestrator.
#[async_trait]
pub trait MaterialStore: Send + Sync {
    async fn insert_material(&self, material: Material) -> Result<(), StoreError>;

    async fn material(&self, id: Uuid) -> Result<Option<Material>, StoreError>;

    async fn set_status(&self, id: Uuid, status: ProcessingStatus) -> Result<(), StoreError>;

    /// Replace the material's text slot (also used for error placeholders).
    async fn set_text(&self, id: Uuid, text: Option<String>) -> Result<(), StoreError>;

    /// Record (or clear) the reason for the last total processing failure.
    async fn set_failure_reason(
        &self,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<(), StoreError>;

    /// Delete the material together with its artifacts and chunks.
    async fn delete_material(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Storage for derived artifacts. At most one row per (material, format).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Insert the artifact, replacing any existing one of the same format.
    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError>;

    async fn artifact(
        &self,
        material_id: Uuid,
        format: ArtifactFormat,
    ) -> Result<Option<Artifact>, StoreError>;

    /// Formats for which an artifact currently exists.
    async fn formats_for(&self, material_id: Uuid) -> Result<Vec<ArtifactFormat>, StoreError>;
}

/// Storage for text chunks and their embeddings.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Remove every chunk of the material, returning how many were deleted.
    async fn delete_chunks(&self, material_id: Uuid) -> Result<usize, StoreError>;

    async fn insert_chunks(&self, chunks: Vec<Chunk>) -> Result<(), StoreError>;

    /// Chunks visible to a ranking scan: the given material's when a scope is
    /// set, otherwise every chunk owned by the user. Ordered by material and
    /// chunk index for deterministic tie-breaking downstream.
    async fn scoped_chunks(
        &self,
        user_id: Uuid,
        material_id: Option<Uuid>,
    ) -> Result<Vec<ChunkSource>, StoreError>;

    /// All chunks of one material ordered by chunk index.
    async fn chunks_for_material(&self, material_id: Uuid) -> Result<Vec<Chunk>, StoreError>;
}
