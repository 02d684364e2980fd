//! The generation orchestrator: fan-out study-artifact generation.
//!
//! # Execution model
//!
//! 1. Input checks run first; nothing is mutated and no service call is made
//!    when they fail.
//! 2. The material moves to `Processing`.
//! 3. One task per default format builds its prompt and calls the completion
//!    service. Tasks run concurrently under a bounded fan-out limit and are
//!    isolated: a timeout, empty reply, or schema violation in one task is
//!    recorded as that format being absent and never cancels siblings.
//! 4. Structured replies pass cleanup and schema validation
//!    ([`structured`]); a validation failure degrades to a task failure.
//! 5. Zero successes fail the run (`Failed`, reason retained); one or more
//!    successes complete it, with each artifact replacing any prior one of
//!    the same format.
//!
//! Nothing retries automatically; the remedy for a failed task is a later
//! explicit [`Orchestrator::regenerate`].

pub mod prompts;
pub mod structured;

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::chunking::floor_char_boundary;
use crate::clients::CompletionClient;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::material::{Artifact, ArtifactFormat, Material, ProcessingStatus};
use crate::stores::{ArtifactStore, MaterialStore};

/// Marker appended when prompt content had to be cut.
const TRUNCATION_MARKER: &str = "\n\n[... text truncated due to length ...]";

/// Reason retained on the material when every generation task failed.
const TOTAL_FAILURE_REASON: &str =
    "The model could not process this material. Try different content.";

// ── Results ────────────────────────────────────────────────────────────

/// One failed generation task.
#[derive(Clone, Debug)]
pub struct TaskFailure {
    pub format: ArtifactFormat,
    pub reason: String,
}

/// Outcome of a full `process` run.
#[derive(Clone, Debug)]
pub struct ProcessingReport {
    /// Final material status (`Completed` or `Failed`).
    pub status: ProcessingStatus,
    /// Formats whose artifacts were persisted, in canonical order.
    pub succeeded: Vec<ArtifactFormat>,
    /// Per-task failures, for diagnostics.
    pub failed: Vec<TaskFailure>,
    /// Human-readable reason, set only on total failure.
    pub failure_reason: Option<String>,
}

/// Current status plus the formats for which artifacts exist.
#[derive(Clone, Debug)]
pub struct MaterialStatus {
    pub status: ProcessingStatus,
    pub artifacts_present: Vec<ArtifactFormat>,
}

// ── Orchestrator ───────────────────────────────────────────────────────

/// Drives the material status machine and the per-format generation fan-out.
pub struct Orchestrator {
    completion: Arc<dyn CompletionClient>,
    materials: Arc<dyn MaterialStore>,
    artifacts: Arc<dyn ArtifactStore>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        materials: Arc<dyn MaterialStore>,
        artifacts: Arc<dyn ArtifactStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            completion,
            materials,
            artifacts,
            config,
        }
    }

    /// Run the full generation pass for one material.
    ///
    /// Total failure is reported through the returned
    /// [`ProcessingReport`], not as an `Err`; `Err` is reserved for input
    /// and storage errors. A storage error that aborts a run in flight
    /// still lands the material in `Failed` (with the reason recorded), so
    /// a later `process` call is never blocked by a stale `Processing`.
    #[instrument(skip(self), fields(%material_id))]
    pub async fn process(&self, material_id: Uuid) -> Result<ProcessingReport, PipelineError> {
        let material = self.require_material(material_id).await?;
        if material.status == ProcessingStatus::Processing {
            return Err(PipelineError::AlreadyProcessing);
        }
        let text = material
            .trimmed_text()
            .ok_or(PipelineError::MissingText)?
            .to_string();
        if text.chars().count() < self.config.min_text_len {
            return Err(PipelineError::InsufficientText {
                min: self.config.min_text_len,
            });
        }

        self.materials
            .set_status(material_id, ProcessingStatus::Processing)
            .await?;

        // An error escaping past this point must not strand the material in
        // `Processing`: park it in `Failed` first so a fresh run can re-enter.
        match self.run_formats(&material, &text).await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.mark_failed(material_id, &err).await;
                Err(err)
            }
        }
    }

    async fn run_formats(
        &self,
        material: &Material,
        text: &str,
    ) -> Result<ProcessingReport, PipelineError> {
        let material_id = material.id;
        if material.failure_reason.is_some() {
            self.materials
                .set_failure_reason(material_id, None)
                .await?;
        }

        let prepared = truncate_for_prompt(text, self.config.max_prompt_len);
        let outcomes = self.fan_out(material, &prepared).await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (format, outcome) in outcomes {
            match outcome {
                Ok(content) => {
                    self.artifacts
                        .upsert_artifact(Artifact::new(material_id, format, content))
                        .await?;
                    succeeded.push(format);
                }
                Err(reason) => failed.push(TaskFailure { format, reason }),
            }
        }
        succeeded.sort_by_key(canonical_position);
        failed.sort_by_key(|failure| canonical_position(&failure.format));

        if succeeded.is_empty() {
            self.materials
                .set_status(material_id, ProcessingStatus::Failed)
                .await?;
            // Retained on the material so the frontend can show it directly.
            self.materials
                .set_failure_reason(material_id, Some(TOTAL_FAILURE_REASON.to_string()))
                .await?;
            warn!(%material_id, "all generation tasks failed");
            return Ok(ProcessingReport {
                status: ProcessingStatus::Failed,
                succeeded,
                failed,
                failure_reason: Some(TOTAL_FAILURE_REASON.to_string()),
            });
        }

        self.materials
            .set_status(material_id, ProcessingStatus::Completed)
            .await?;
        debug!(%material_id, ok = succeeded.len(), "processing complete");
        Ok(ProcessingReport {
            status: ProcessingStatus::Completed,
            succeeded,
            failed,
            failure_reason: None,
        })
    }

    /// Regenerate a single format, replacing the existing artifact.
    ///
    /// Never touches the material's status. Fails fast when text is absent
    /// or is an error placeholder left by a failed run.
    #[instrument(skip(self), fields(%material_id, %format))]
    pub async fn regenerate(
        &self,
        material_id: Uuid,
        format: ArtifactFormat,
    ) -> Result<Artifact, PipelineError> {
        let material = self.require_material(material_id).await?;
        let text = material
            .trimmed_text()
            .ok_or(PipelineError::MissingText)?
            .to_string();
        if material.has_error_text() {
            return Err(PipelineError::ErrorPlaceholderText);
        }

        let prepared = truncate_for_prompt(&text, self.config.max_prompt_len);
        let content = run_task(self.completion.as_ref(), format, &material.title, &prepared)
            .await
            .map_err(|reason| PipelineError::TaskFailed { format, reason })?;

        let artifact = Artifact::new(material_id, format, content);
        self.artifacts.upsert_artifact(artifact.clone()).await?;
        Ok(artifact)
    }

    /// Current status plus which artifacts exist.
    pub async fn status(&self, material_id: Uuid) -> Result<MaterialStatus, PipelineError> {
        let material = self.require_material(material_id).await?;
        let artifacts_present = self.artifacts.formats_for(material_id).await?;
        Ok(MaterialStatus {
            status: material.status,
            artifacts_present,
        })
    }

    /// Best-effort landing in `Failed` when a run aborts mid-flight. The
    /// triggering error is already on its way to the caller, so secondary
    /// store failures are only logged.
    async fn mark_failed(&self, material_id: Uuid, err: &PipelineError) {
        if let Err(store_err) = self
            .materials
            .set_status(material_id, ProcessingStatus::Failed)
            .await
        {
            warn!(%material_id, error = %store_err, "could not mark aborted run as failed");
            return;
        }
        if let Err(store_err) = self
            .materials
            .set_failure_reason(material_id, Some(err.to_string()))
            .await
        {
            warn!(%material_id, error = %store_err, "could not record the abort reason");
        }
    }

    async fn require_material(&self, material_id: Uuid) -> Result<Material, PipelineError> {
        self.materials
            .material(material_id)
            .await?
            .ok_or(PipelineError::MaterialNotFound(material_id))
    }

    /// Run one bounded-concurrency task per default format, collecting every
    /// outcome. Failures stay per-format.
    async fn fan_out(
        &self,
        material: &Material,
        content: &str,
    ) -> Vec<(ArtifactFormat, Result<String, String>)> {
        stream::iter(ArtifactFormat::DEFAULT_SET.into_iter().map(|format| {
            let completion = Arc::clone(&self.completion);
            let title = material.title.clone();
            let content = content.to_string();
            async move {
                let outcome = run_task(completion.as_ref(), format, &title, &content).await;
                (format, outcome)
            }
        }))
        .buffer_unordered(self.config.fanout_limit)
        .collect()
        .await
    }
}

/// Build the prompt, call the completion service, and validate the reply.
/// Any error collapses into a display-ready reason string.
async fn run_task(
    completion: &dyn CompletionClient,
    format: ArtifactFormat,
    title: &str,
    content: &str,
) -> Result<String, String> {
    let prompt = prompts::build(format, title, content);
    let raw = completion.complete(&prompt).await.map_err(|err| {
        warn!(%format, error = %err, "generation task failed");
        err.to_string()
    })?;
    structured::validate(format, &raw).map_err(|err| {
        warn!(%format, error = %err, "reply rejected");
        err.to_string()
    })
}

fn canonical_position(format: &ArtifactFormat) -> usize {
    ArtifactFormat::ALL
        .iter()
        .position(|candidate| candidate == format)
        .unwrap_or(ArtifactFormat::ALL.len())
}

/// Cap prompt content, appending a marker when cut. The cut lands on a char
/// boundary so multibyte text never splits.
fn truncate_for_prompt(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let cut = floor_char_boundary(text, max_len);
    let mut prepared = text[..cut].to_string();
    prepared.push_str(TRUNCATION_MARKER);
    prepared
}
