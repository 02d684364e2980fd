//! Crate-level error surface for pipeline operations.
//!
//! The taxonomy mirrors how failures are handled:
//! - input errors reject immediately with nothing mutated and no service call;
//! - task errors stay inside the engines (an absent artifact, a `None`
//!   embedding) and never appear here;
//! - everything that does escape an operation is a [`PipelineError`].

use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

use crate::clients::ClientError;
use crate::material::{ArtifactFormat, UnknownFormat};
use crate::stores::StoreError;

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    /// The referenced material does not exist.
    #[error("material not found: {0}")]
    #[diagnostic(code(studysmith::pipeline::not_found))]
    MaterialNotFound(Uuid),

    /// The material has no text; upstream extraction never ran or failed.
    #[error("material has no text to work with")]
    #[diagnostic(
        code(studysmith::pipeline::missing_text),
        help("Text must be extracted upstream before the pipeline can run.")
    )]
    MissingText,

    /// The material's text slot holds an error placeholder from a failed
    /// run, not real content.
    #[error("material was not processed successfully; ingest it again first")]
    #[diagnostic(code(studysmith::pipeline::error_placeholder))]
    ErrorPlaceholderText,

    /// Too little text to produce anything useful. Local and non-retryable;
    /// no external call is made.
    #[error("not enough text to process (minimum {min} characters)")]
    #[diagnostic(code(studysmith::pipeline::insufficient_text))]
    InsufficientText { min: usize },

    /// A `process` call arrived while another run holds the material.
    #[error("material is already being processed")]
    #[diagnostic(
        code(studysmith::pipeline::already_processing),
        help("Wait for the current run to finish, then retry or regenerate.")
    )]
    AlreadyProcessing,

    /// A single-format regeneration task failed. Terminal for this call;
    /// the remedy is another explicit `regenerate`.
    #[error("generation for {format} failed: {reason}")]
    #[diagnostic(code(studysmith::pipeline::task_failed))]
    TaskFailed {
        format: ArtifactFormat,
        reason: String,
    },

    /// The embedding service returned a vector of unexpected length. This is
    /// a configuration error, never a per-chunk failure.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    #[diagnostic(
        code(studysmith::pipeline::dimension_mismatch),
        help("All chunks must share the embedding service's fixed dimensionality.")
    )]
    DimensionMismatch { expected: usize, got: usize },

    /// Client error surfaced from an operation with no task-level fallback
    /// (query embedding, grounded answer synthesis).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] ClientError),

    /// Storage failure.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    /// The caller named a format the pipeline does not know.
    #[error(transparent)]
    #[diagnostic(code(studysmith::pipeline::unknown_format))]
    UnknownFormat(#[from] UnknownFormat),
}
