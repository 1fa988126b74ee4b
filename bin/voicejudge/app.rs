use std::path::Path;

use chrono::{DateTime, Utc};
use voice_judge::wallet::Accounts;
use voice_judge::{AudioFile, Command, ModelDescriptor, SessionEvent, SubmissionState};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingPath,
}

pub struct App {
    pub model_name: String,
    pub backend_url: String,
    pub descriptor: ModelDescriptor,
    pub descriptor_loaded: bool,
    pub accounts: Accounts,
    /// Mirror of the orchestrator's state, kept current through events
    pub state: SubmissionState,
    pub input_mode: InputMode,
    pub path_input: String,
    pub error_message: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub should_quit: bool,
}

impl App {
    pub fn new(model_name: String, backend_url: String) -> Self {
        Self {
            model_name,
            backend_url,
            descriptor: ModelDescriptor::default(),
            descriptor_loaded: false,
            accounts: Vec::new(),
            state: SubmissionState::default(),
            input_mode: InputMode::Normal,
            path_input: String::new(),
            error_message: None,
            last_update: None,
            should_quit: false,
        }
    }

    pub fn active_account(&self) -> Option<&str> {
        self.accounts.first().map(String::as_str)
    }

    pub fn set_accounts(&mut self, accounts: Accounts) {
        self.accounts = accounts;
    }

    pub fn set_descriptor(&mut self, descriptor: ModelDescriptor) {
        self.descriptor = descriptor;
        self.descriptor_loaded = true;
    }

    pub fn apply_event(&mut self, event: &SessionEvent) {
        self.state.apply(event);
        self.last_update = Some(Utc::now());
    }

    pub fn start_editing(&mut self) {
        self.input_mode = InputMode::EditingPath;
        self.error_message = None;
    }

    pub fn cancel_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn push_char(&mut self, c: char) {
        self.path_input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.path_input.pop();
    }

    /// Read the file named in the path input and make it the selection
    pub async fn confirm_path(&mut self) {
        self.input_mode = InputMode::Normal;
        let path = self.path_input.trim().to_string();
        if path.is_empty() {
            return;
        }
        self.select_path(Path::new(&path)).await;
    }

    pub async fn select_path(&mut self, path: &Path) {
        self.path_input = path.display().to_string();
        match AudioFile::read(path).await {
            Ok(file) => {
                tracing::debug!("Selected {} ({} bytes)", file.name, file.bytes.len());
                self.state.select_file(file);
                self.error_message = None;
            }
            Err(e) => {
                self.error_message = Some(format!("{}: {e}", path.display()));
            }
        }
    }

    /// Command for the upload control, or `None` while it is disabled
    pub fn submit_command(&mut self) -> Option<Command> {
        if !self.state.can_submit() {
            return None;
        }
        // the submit always answers with a failure or a proof event; the
        // previous proof is gone from here on
        self.state.apply(&SessionEvent::SubmitStarted);
        Some(Command::Submit(self.state.selected_file.clone()))
    }

    /// Command for the verify control, or `None` while it is disabled
    pub fn verify_command(&self) -> Option<Command> {
        if !self.state.can_verify() {
            return None;
        }
        if !self.descriptor.is_loaded() {
            tracing::warn!("Verifying without a loaded model descriptor");
        }
        Some(Command::Verify(self.descriptor.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_judge::{Rating, Stage};

    fn app() -> App {
        App::new("VoiceJudge3".to_string(), "http://localhost:5000".to_string())
    }

    #[test]
    fn test_submit_disabled_while_busy() {
        let mut app = app();
        assert!(matches!(app.submit_command(), Some(Command::Submit(None))));
        assert!(app.submit_command().is_none());

        app.apply_event(&SessionEvent::PipelineFailed {
            stage: Stage::Idle,
            message: "No audio file selected.".to_string(),
        });
        assert!(app.submit_command().is_some());
    }

    #[test]
    fn test_verify_enabled_after_proof() {
        let mut app = app();
        assert!(app.verify_command().is_none());
        app.apply_event(&SessionEvent::ProofGenerated {
            score: 5.0,
            rating: Rating::B,
            proof_hex: "0xp".to_string(),
            score_hex: "0x05".to_string(),
        });
        assert!(matches!(app.verify_command(), Some(Command::Verify(_))));
        app.apply_event(&SessionEvent::VerifyStarted);
        assert!(app.verify_command().is_none());
        assert!(app.last_update.is_some());
    }

    #[test]
    fn test_submit_disables_verify_immediately() {
        let mut app = app();
        app.apply_event(&SessionEvent::ProofGenerated {
            score: 5.0,
            rating: Rating::B,
            proof_hex: "0xp".to_string(),
            score_hex: "0x05".to_string(),
        });
        assert!(app.verify_command().is_some());

        assert!(app.submit_command().is_some());
        assert!(app.state.pipeline_busy);
        assert!(app.verify_command().is_none());
    }

    #[tokio::test]
    async fn test_select_missing_file_reports_error() {
        let mut app = app();
        app.path_input = "/nonexistent/clip.wav".to_string();
        app.confirm_path().await;
        assert!(app.error_message.is_some());
        assert!(app.state.selected_file.is_none());
    }

    #[tokio::test]
    async fn test_select_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let mut app = app();
        app.select_path(&path).await;
        let selected = app.state.selected_file.as_ref().unwrap();
        assert_eq!(selected.name, "clip.wav");
        assert_eq!(selected.bytes, b"RIFF");
    }
}
