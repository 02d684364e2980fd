//! Cleanup and schema validation for structured generation output.
//!
//! Models frequently wrap JSON replies in markdown code fences; [`clean`]
//! strips that incidental wrapping before validation. Validation is minimal
//! on purpose: it checks the shape the frontend relies on, nothing more. A
//! failure here degrades to a single task failure and never aborts sibling
//! generation tasks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::material::ArtifactFormat;

/// Replies at or below this trimmed length count as empty (mirrors the
/// upstream "model returned nothing useful" heuristic).
const MIN_REPLY_LEN: usize = 10;

/// Why a generation reply was rejected.
#[derive(Debug, Error)]
pub enum StructuredError {
    #[error("reply was empty")]
    Empty,
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("schema violation: {0}")]
    Schema(String),
}

// ── Payload shapes ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizPayload {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlossaryPayload {
    pub terms: Vec<GlossaryTerm>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub term: String,
    pub definition: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlashcardsPayload {
    pub cards: Vec<Flashcard>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

// ── Cleaning & validation ──────────────────────────────────────────────

/// Strip markdown code fences (```json ... ``` or ``` ... ```) around a reply.
pub fn clean(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Clean a reply and validate it against the format's minimal schema.
///
/// Returns the content to persist: the cleaned JSON payload for structured
/// formats, the trimmed prose otherwise.
pub fn validate(format: ArtifactFormat, raw: &str) -> Result<String, StructuredError> {
    let cleaned = clean(raw);
    if cleaned.len() <= MIN_REPLY_LEN {
        return Err(StructuredError::Empty);
    }
    if !format.is_structured() {
        return Ok(cleaned.to_string());
    }

    match format {
        ArtifactFormat::Quiz => {
            let payload: QuizPayload =
                serde_json::from_str(cleaned).map_err(|err| StructuredError::Json(err.to_string()))?;
            if payload.questions.is_empty() {
                return Err(StructuredError::Schema("quiz has no questions".into()));
            }
            for (position, question) in payload.questions.iter().enumerate() {
                if question.options.is_empty() {
                    return Err(StructuredError::Schema(format!(
                        "question {position} has no options"
                    )));
                }
                if question.correct >= question.options.len() {
                    return Err(StructuredError::Schema(format!(
                        "question {position} marks option {} correct but only {} exist",
                        question.correct,
                        question.options.len()
                    )));
                }
            }
        }
        ArtifactFormat::Glossary => {
            serde_json::from_str::<GlossaryPayload>(cleaned)
                .map_err(|err| StructuredError::Json(err.to_string()))?;
        }
        ArtifactFormat::Flashcards => {
            let payload: FlashcardsPayload =
                serde_json::from_str(cleaned).map_err(|err| StructuredError::Json(err.to_string()))?;
            if payload.cards.is_empty() {
                return Err(StructuredError::Schema("no cards generated".into()));
            }
        }
        // Prose formats returned above.
        _ => {}
    }
    Ok(cleaned.to_string())
}
