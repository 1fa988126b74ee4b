use serde::{Deserialize, Serialize};

use crate::backend::AudioFile;
use crate::rating::Rating;

pub const UPLOADING_MESSAGE: &str = "Uploading and Processing Audio File...";
pub const RECORDING_INPUT_MESSAGE: &str = "Saving audio data...";
pub const GENERATING_WITNESS_MESSAGE: &str = "Generating Witness...";
pub const GENERATING_PROOF_MESSAGE: &str = "Generating Proof will take sometime...";
pub const VERIFY_SUCCEEDED_MESSAGE: &str = "Proof verification succeeded.";
pub const VERIFY_FAILED_MESSAGE: &str = "Proof verification failed.";
pub const NOT_CALCULATED_LABEL: &str = "Not Calculated yet";

/// Position in the submission pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    Idle,
    Uploading,
    RecordingInput,
    GeneratingWitness,
    GeneratingProof,
    Done,
    Failed,
}

impl Stage {
    /// Remote stages in the order they run
    pub const PIPELINE: [Stage; 4] = [
        Stage::Uploading,
        Stage::RecordingInput,
        Stage::GeneratingWitness,
        Stage::GeneratingProof,
    ];

    /// Status text shown while the stage runs
    pub fn status_message(self) -> Option<&'static str> {
        match self {
            Stage::Uploading => Some(UPLOADING_MESSAGE),
            Stage::RecordingInput => Some(RECORDING_INPUT_MESSAGE),
            Stage::GeneratingWitness => Some(GENERATING_WITNESS_MESSAGE),
            Stage::GeneratingProof => Some(GENERATING_PROOF_MESSAGE),
            Stage::Idle | Stage::Done | Stage::Failed => None,
        }
    }

    /// 1-based step number among the remote stages
    pub fn step(self) -> Option<u32> {
        Self::PIPELINE
            .iter()
            .position(|s| *s == self)
            .map(|i| i as u32 + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::Uploading => "Uploading",
            Stage::RecordingInput => "Recording input",
            Stage::GeneratingWitness => "Generating witness",
            Stage::GeneratingProof => "Generating proof",
            Stage::Done => "Done",
            Stage::Failed => "Failed",
        }
    }

    pub fn is_running(self) -> bool {
        self.step().is_some()
    }
}

/// State transition reported by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SubmitStarted,
    StageEntered(Stage),
    Status(String),
    InputRecorded {
        latest_uuid: String,
    },
    ProofGenerated {
        score: f64,
        rating: Rating,
        proof_hex: String,
        score_hex: String,
    },
    PipelineFailed {
        stage: Stage,
        message: String,
    },
    VerifyStarted,
    VerifyFinished {
        verified: bool,
    },
    VerifyFailed {
        message: String,
    },
}

/// Everything the page shows about the current submission. Lives only in
/// memory.
#[derive(Debug, Clone, Default)]
pub struct SubmissionState {
    pub selected_file: Option<AudioFile>,
    pub stage: Stage,
    /// Workflow identifier assigned by `/uploadinput`
    pub latest_uuid: Option<String>,
    /// Latest status text; overwritten at every transition
    pub status_message: String,
    pub proof_hex: String,
    pub score_hex: String,
    pub score: Option<f64>,
    pub rating: Option<Rating>,
    pub pipeline_busy: bool,
    pub verify_busy: bool,
    pub proof_generated: bool,
    pub verified: Option<bool>,
}

impl SubmissionState {
    pub fn select_file(&mut self, file: AudioFile) {
        self.selected_file = Some(file);
    }

    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::SubmitStarted => {
                self.pipeline_busy = true;
                self.proof_generated = false;
                self.status_message.clear();
                self.latest_uuid = None;
                self.verified = None;
                self.stage = Stage::Idle;
            }
            SessionEvent::StageEntered(stage) => {
                self.stage = *stage;
                if let Some(message) = stage.status_message() {
                    self.status_message = message.to_string();
                }
            }
            SessionEvent::Status(message) => {
                self.status_message = message.clone();
            }
            SessionEvent::InputRecorded { latest_uuid } => {
                self.latest_uuid = Some(latest_uuid.clone());
            }
            SessionEvent::ProofGenerated {
                score,
                rating,
                proof_hex,
                score_hex,
            } => {
                self.score = Some(*score);
                self.rating = Some(*rating);
                self.proof_hex = proof_hex.clone();
                self.score_hex = score_hex.clone();
                self.stage = Stage::Done;
                self.pipeline_busy = false;
                self.proof_generated = true;
            }
            SessionEvent::PipelineFailed { message, .. } => {
                self.status_message = message.clone();
                self.stage = Stage::Failed;
                self.pipeline_busy = false;
            }
            SessionEvent::VerifyStarted => {
                self.verify_busy = true;
            }
            SessionEvent::VerifyFinished { verified } => {
                self.status_message = if *verified {
                    VERIFY_SUCCEEDED_MESSAGE
                } else {
                    VERIFY_FAILED_MESSAGE
                }
                .to_string();
                self.verified = Some(*verified);
                self.verify_busy = false;
            }
            SessionEvent::VerifyFailed { message } => {
                self.status_message = message.clone();
                self.verify_busy = false;
            }
        }
    }

    /// Upload control enabled
    pub fn can_submit(&self) -> bool {
        !self.pipeline_busy
    }

    /// Verify control enabled
    pub fn can_verify(&self) -> bool {
        self.proof_generated && !self.verify_busy
    }

    pub fn rating_label(&self) -> String {
        self.rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| NOT_CALCULATED_LABEL.to_string())
    }
}
