//! ```text
//! Ingested text ──► generation::Orchestrator ──► Artifacts (notes, quiz, ...)
//!                          │
//!                          └─ per-format fan-out, bounded concurrency
//!
//! Ingested text ──► chunking::split ──► indexing::SemanticIndexer ──► Chunks
//!                                                │
//!                                                └─ embeddings (per-chunk
//!                                                   failure tolerated)
//!
//! Stored chunks ──► retrieval::RetrievalEngine ──► ranked hits /
//!                                                  grounded answers
//! ```
//!
//! Both engines share the storage traits in [`stores`] and the service client
//! traits in [`clients`]; [`pipeline::ContentPipeline`] wires everything into
//! one handle.

pub mod chunking;
pub mod clients;
pub mod config;
pub mod error;
pub mod generation;
pub mod indexing;
pub mod material;
pub mod pipeline;
pub mod retrieval;
pub mod stores;

pub use clients::{ClientError, CompletionClient, EmbeddingClient, GeminiClient};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use generation::{MaterialStatus, Orchestrator, ProcessingReport};
pub use indexing::SemanticIndexer;
pub use material::{Artifact, ArtifactFormat, Chunk, Material, ProcessingStatus};
pub use pipeline::ContentPipeline;
pub use retrieval::{LibraryAnswer, RetrievalEngine, SearchHit, SourceRef};
pub use stores::{ArtifactStore, ChunkStore, MaterialStore, MemoryStore, StoreError};

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;
