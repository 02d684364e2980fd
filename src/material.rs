//! Core domain entities: materials, derived artifacts, and text chunks.
//!
//! A [`Material`] is one unit of ingested learning content owned by a user.
//! The generation orchestrator derives [`Artifact`]s from it (one per
//! [`ArtifactFormat`]); the semantic indexer derives [`Chunk`]s. Both child
//! collections are owned exclusively by their material and are deleted with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Marker written into a material's text slot when a run failed before any
/// usable text existed. Regeneration refuses to operate on placeholder text.
pub const ERROR_TEXT_PREFIX: &str = "[ERROR]";

// ============================================================================
// Processing status
// ============================================================================

/// Lifecycle of a material through the generation pipeline.
///
/// ```text
/// Pending --process--> Processing --(>=1 format ok)--> Completed
///                      Processing --(0 formats ok)---> Failed
/// ```
///
/// Only the orchestrator mutates this; `regenerate` never touches it.
/// Re-entry happens only through a fresh `process` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// Stable wire name, used for persistence and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    /// Parse a wire name back into a status.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ProcessingStatus::Pending),
            "processing" => Some(ProcessingStatus::Processing),
            "completed" => Some(ProcessingStatus::Completed),
            "failed" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Artifact formats
// ============================================================================

/// The closed set of derived study products.
///
/// Wire names match the persisted rows: `smart_notes`, `tldr`, `quiz`,
/// `glossary`, `flashcards`, `podcast_script`. The bulk `process` pass runs
/// [`ArtifactFormat::DEFAULT_SET`]; the podcast script is generated only on
/// demand through `regenerate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactFormat {
    #[serde(rename = "smart_notes")]
    Notes,
    #[serde(rename = "tldr")]
    Summary,
    #[serde(rename = "quiz")]
    Quiz,
    #[serde(rename = "glossary")]
    Glossary,
    #[serde(rename = "flashcards")]
    Flashcards,
    #[serde(rename = "podcast_script")]
    Script,
}

/// A format string the pipeline does not recognise. A client error, never a
/// pipeline failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown artifact format: {0}")]
pub struct UnknownFormat(pub String);

impl ArtifactFormat {
    /// Formats produced by the bulk `process` pass, in generation order.
    pub const DEFAULT_SET: [ArtifactFormat; 5] = [
        ArtifactFormat::Notes,
        ArtifactFormat::Summary,
        ArtifactFormat::Quiz,
        ArtifactFormat::Glossary,
        ArtifactFormat::Flashcards,
    ];

    /// Every known format, including on-demand ones.
    pub const ALL: [ArtifactFormat; 6] = [
        ArtifactFormat::Notes,
        ArtifactFormat::Summary,
        ArtifactFormat::Quiz,
        ArtifactFormat::Glossary,
        ArtifactFormat::Flashcards,
        ArtifactFormat::Script,
    ];

    /// Stable wire name, used for persistence and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactFormat::Notes => "smart_notes",
            ArtifactFormat::Summary => "tldr",
            ArtifactFormat::Quiz => "quiz",
            ArtifactFormat::Glossary => "glossary",
            ArtifactFormat::Flashcards => "flashcards",
            ArtifactFormat::Script => "podcast_script",
        }
    }

    /// Whether this format's content is a serialized JSON payload rather
    /// than prose. Structured formats pass schema validation before being
    /// accepted.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            ArtifactFormat::Quiz | ArtifactFormat::Glossary | ArtifactFormat::Flashcards
        )
    }
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactFormat {
    type Err = UnknownFormat;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "smart_notes" => Ok(ArtifactFormat::Notes),
            "tldr" => Ok(ArtifactFormat::Summary),
            "quiz" => Ok(ArtifactFormat::Quiz),
            "glossary" => Ok(ArtifactFormat::Glossary),
            "flashcards" => Ok(ArtifactFormat::Flashcards),
            "podcast_script" => Ok(ArtifactFormat::Script),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// One unit of ingested learning content.
///
/// `text` is the single canonical content field; upstream extraction (file
/// parsing, OCR) must have populated it before either engine runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub text: Option<String>,
    pub status: ProcessingStatus,
    /// Human-readable reason for the last total processing failure, kept for
    /// direct display. Cleared when a fresh run starts.
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Material {
    /// Create a fresh material in `Pending` status.
    pub fn new(user_id: Uuid, title: impl Into<String>, text: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            text,
            status: ProcessingStatus::Pending,
            failure_reason: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Trimmed text, or `None` when the slot is empty or blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// True when the text slot holds an error placeholder from a failed run
    /// instead of real content.
    pub fn has_error_text(&self) -> bool {
        self.trimmed_text()
            .is_some_and(|t| t.starts_with(ERROR_TEXT_PREFIX))
    }
}

/// One derived study product for a material in one fixed output format.
///
/// At most one artifact exists per (material, format); regeneration replaces
/// it in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub material_id: Uuid,
    pub format: ArtifactFormat,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(material_id: Uuid, format: ArtifactFormat, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            material_id,
            format,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A contiguous slice of a material's text paired with its embedding vector.
///
/// `embedding` is `None` when the embedding call failed for this slice; such
/// chunks persist (they still describe coverage) but are excluded from
/// similarity ranking. Offsets are byte offsets into the source text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub material_id: Uuid,
    pub user_id: Uuid,
    pub chunk_index: usize,
    pub content: String,
    pub char_start: usize,
    pub char_end: usize,
    pub embedding: Option<Vec<f32>>,
}
