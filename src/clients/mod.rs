//! Service client traits for the external text-completion and embedding
//! providers.
//!
//! The pipeline never constructs clients itself; callers build one at startup
//! (see [`gemini::GeminiClient`]) and inject it as `Arc<dyn ...>` into the
//! orchestrator, indexer, and retrieval engine. Failures surface as
//! [`ClientError`] and are handled at task granularity — one failed call never
//! cancels sibling work.

pub mod gemini;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Errors raised by completion and embedding calls.
#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    /// Transport-level failure (connection refused, timeout, TLS, ...).
    #[error("transport error: {0}")]
    #[diagnostic(
        code(studysmith::client::transport),
        help("Check network connectivity and the configured base URL.")
    )]
    Transport(String),

    /// The service answered with a non-success HTTP status.
    #[error("service returned status {status}: {message}")]
    #[diagnostic(code(studysmith::client::api))]
    Api { status: u16, message: String },

    /// The service answered, but the payload held no usable content.
    #[error("service returned an empty response")]
    #[diagnostic(code(studysmith::client::empty))]
    Empty,

    /// The payload could not be decoded into the expected shape.
    #[error("malformed service response: {0}")]
    #[diagnostic(code(studysmith::client::malformed))]
    Malformed(String),

    /// No API key was available when building the client from the environment.
    #[error("GEMINI_API_KEY is not set")]
    #[diagnostic(
        code(studysmith::client::missing_api_key),
        help("Set GEMINI_API_KEY in the environment or a .env file.")
    )]
    MissingApiKey,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Blocking-style text completion: one prompt in, one text reply out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ClientError>;
}

/// Fixed-dimensionality text embedding.
///
/// The dimensionality is a property of the service and must be uniform across
/// all chunks of all materials; the indexer treats a mismatched vector as a
/// configuration error, not a per-call failure.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError>;

    /// Length of every vector this client returns.
    fn dimension(&self) -> usize;
}
