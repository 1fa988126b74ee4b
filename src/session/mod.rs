//! Submission session
//!
//! [`SubmissionState`] is what the page shows; it only changes through
//! [`SessionEvent`]s. The [`Orchestrator`] runs the remote pipeline one
//! stage at a time and reports every transition as an event, so a UI can
//! mirror the state by applying the same events.

pub mod orchestrator;
pub mod state;

use thiserror::Error;

pub use crate::backend::AudioFile;
use crate::backend::BackendError;
pub use orchestrator::{Command, Orchestrator, ProofOutcome};
pub use state::{SessionEvent, Stage, SubmissionState};

/// Why a submission or verification did not complete. The display text is
/// what ends up in the status message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No audio file selected.")]
    NoFile,

    #[error("No wallet account connected.")]
    NoAccount,

    #[error("No proof has been generated yet.")]
    NoProof,

    #[error("{message}")]
    CreditsExhausted { message: String },

    #[error("Unexpected score in proof output: {0}")]
    InvalidScore(String),

    #[error("{source}")]
    Stage {
        stage: Stage,
        #[source]
        source: BackendError,
    },

    #[error("{0}")]
    Verify(#[source] BackendError),
}

impl PipelineError {
    pub(crate) fn stage(stage: Stage) -> impl FnOnce(BackendError) -> Self {
        move |source| PipelineError::Stage { stage, source }
    }

    /// Stage the error happened in, when it came from a backend call
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::NoAccount => Some(Stage::Uploading),
            PipelineError::CreditsExhausted { .. } | PipelineError::InvalidScore(_) => {
                Some(Stage::GeneratingProof)
            }
            _ => None,
        }
    }
}
