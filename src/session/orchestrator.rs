use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::state::{SessionEvent, Stage, SubmissionState};
use super::PipelineError;
use crate::backend::{AudioFile, BackendClient, BackendError};
use crate::config::ClientConfig;
use crate::rating::Rating;
use crate::registry::ModelDescriptor;
use crate::wallet::Accounts;

/// Request sent to a running orchestrator
#[derive(Debug, Clone)]
pub enum Command {
    Submit(Option<AudioFile>),
    /// Verify the last proof against the descriptor's verifier
    Verify(ModelDescriptor),
}

/// Result of a full pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct ProofOutcome {
    pub latest_uuid: String,
    pub score: f64,
    pub rating: Rating,
    pub proof_hex: String,
    pub score_hex: String,
    pub message: Option<String>,
}

/// Drives the upload → input → witness → proof pipeline and the verify
/// action. Every transition is applied to the owned [`SubmissionState`]
/// and, when a listener is attached, forwarded as a [`SessionEvent`].
pub struct Orchestrator {
    backend: BackendClient,
    model_name: String,
    network_url: Option<String>,
    fallback_verifier: Option<String>,
    accounts: watch::Receiver<Accounts>,
    state: SubmissionState,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl Orchestrator {
    pub fn new(
        backend: BackendClient,
        model_name: impl Into<String>,
        accounts: watch::Receiver<Accounts>,
    ) -> Self {
        Self {
            backend,
            model_name: model_name.into(),
            network_url: None,
            fallback_verifier: None,
            accounts,
            state: SubmissionState::default(),
            events: None,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        accounts: watch::Receiver<Accounts>,
    ) -> Result<Self, BackendError> {
        let backend = BackendClient::from_config(config)?;
        Ok(Self::new(backend, config.model_name.clone(), accounts)
            .with_network_url(config.network_url.clone())
            .with_fallback_verifier(config.verifier_address.clone()))
    }

    /// RPC URL handed to the backend for on-chain verification
    pub fn with_network_url(mut self, url: Option<String>) -> Self {
        self.network_url = url;
        self
    }

    /// Verifier used when the model descriptor has none
    pub fn with_fallback_verifier(mut self, verifier: Option<String>) -> Self {
        self.fallback_verifier = verifier;
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn emit(&mut self, event: SessionEvent) {
        self.state.apply(&event);
        if let Some(tx) = &self.events {
            // listener gone: keep running, state stays authoritative
            let _ = tx.send(event);
        }
    }

    fn enter(&mut self, stage: Stage) {
        info!("Pipeline stage: {}", stage.label());
        self.emit(SessionEvent::StageEntered(stage));
    }

    /// Active account, read at the moment a request needs it
    fn current_account(&self) -> Result<String, PipelineError> {
        self.accounts
            .borrow()
            .first()
            .cloned()
            .ok_or(PipelineError::NoAccount)
    }

    /// Run the full pipeline for `file`. The first failing stage aborts
    /// the rest; its message becomes the status message.
    pub async fn submit(&mut self, file: Option<&AudioFile>) -> Result<ProofOutcome, PipelineError> {
        self.emit(SessionEvent::SubmitStarted);
        let Some(file) = file else {
            let err = PipelineError::NoFile;
            self.emit(SessionEvent::PipelineFailed {
                stage: Stage::Idle,
                message: err.to_string(),
            });
            return Err(err);
        };

        match self.run_pipeline(file).await {
            Ok(outcome) => {
                if let Some(message) = &outcome.message {
                    self.emit(SessionEvent::Status(message.clone()));
                }
                self.emit(SessionEvent::ProofGenerated {
                    score: outcome.score,
                    rating: outcome.rating,
                    proof_hex: outcome.proof_hex.clone(),
                    score_hex: outcome.score_hex.clone(),
                });
                info!(
                    "Proof generated for {} (score {}, rating {})",
                    outcome.latest_uuid, outcome.score, outcome.rating
                );
                Ok(outcome)
            }
            Err(err) => {
                let stage = self.state.stage;
                warn!("Pipeline failed during {}: {}", stage.label(), err);
                self.emit(SessionEvent::PipelineFailed {
                    stage,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run_pipeline(&mut self, file: &AudioFile) -> Result<ProofOutcome, PipelineError> {
        let model_name = self.model_name.clone();

        self.enter(Stage::Uploading);
        let address = self.current_account()?;
        let input_data = self
            .backend
            .upload_audio(&model_name, &address, file)
            .await
            .map_err(PipelineError::stage(Stage::Uploading))?;

        self.enter(Stage::RecordingInput);
        let latest_uuid = self
            .backend
            .upload_input(&model_name, &input_data)
            .await
            .map_err(PipelineError::stage(Stage::RecordingInput))?;
        self.emit(SessionEvent::InputRecorded {
            latest_uuid: latest_uuid.clone(),
        });

        self.enter(Stage::GeneratingWitness);
        let witness_status = self
            .backend
            .generate_witness(&model_name, &latest_uuid)
            .await
            .map_err(PipelineError::stage(Stage::GeneratingWitness))?;
        self.emit(SessionEvent::Status(witness_status));

        self.enter(Stage::GeneratingProof);
        let address = self.current_account()?;
        let proof = self
            .backend
            .prove(&model_name, &address, &latest_uuid)
            .await
            .map_err(PipelineError::stage(Stage::GeneratingProof))?;

        if proof.proof_hex.is_empty() {
            return Err(PipelineError::CreditsExhausted {
                message: proof
                    .message
                    .clone()
                    .unwrap_or_else(|| "The backend returned no proof".to_string()),
            });
        }
        let score = proof
            .score()
            .ok_or_else(|| PipelineError::InvalidScore(proof.output.to_string()))?;
        let rating = Rating::from_score(score);
        debug!(score, %rating, "Score rated");

        Ok(ProofOutcome {
            latest_uuid,
            score,
            rating,
            score_hex: proof.score_hex(),
            proof_hex: proof.proof_hex,
            message: proof.message,
        })
    }

    /// Verify the last generated proof on-chain through the backend.
    ///
    /// The verifier address is read from `descriptor` at call time; nothing
    /// checks that the stored workflow identifier belongs to that model.
    pub async fn verify(&mut self, descriptor: &ModelDescriptor) -> Result<bool, PipelineError> {
        if !self.state.proof_generated {
            return Err(PipelineError::NoProof);
        }
        let latest_uuid = self
            .state
            .latest_uuid
            .clone()
            .ok_or(PipelineError::NoProof)?;

        self.emit(SessionEvent::VerifyStarted);

        let verifier = descriptor
            .verifier()
            .map(str::to_string)
            .or_else(|| self.fallback_verifier.clone());
        if verifier.is_none() {
            warn!("Verifying {} without a verifier address", latest_uuid);
        }

        let result = self
            .backend
            .verify_proof(
                &self.model_name,
                &latest_uuid,
                verifier.as_deref(),
                self.network_url.as_deref(),
            )
            .await;

        match result {
            Ok(verified) => {
                info!("Verification of {}: {}", latest_uuid, verified);
                self.emit(SessionEvent::VerifyFinished { verified });
                Ok(verified)
            }
            Err(e) => {
                let err = PipelineError::Verify(e);
                warn!("Verification request failed: {}", err);
                self.emit(SessionEvent::VerifyFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Serve commands until the sender side is dropped. Commands run one at
    /// a time in arrival order, so a submit issued during a verification
    /// starts once it finishes.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Submit(file) => {
                    if let Err(e) = self.submit(file.as_ref()).await {
                        debug!("Submit finished with error: {}", e);
                    }
                }
                Command::Verify(descriptor) => {
                    if let Err(e) = self.verify(&descriptor).await {
                        debug!("Verify finished with error: {}", e);
                    }
                }
            }
        }
        debug!("Command channel closed, orchestrator stopping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{GENERATING_PROOF_MESSAGE, VERIFY_SUCCEEDED_MESSAGE};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    const ACCOUNT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn orchestrator(
        server: &MockServer,
        accounts: Accounts,
    ) -> (Orchestrator, watch::Sender<Accounts>) {
        let (tx, rx) = watch::channel(accounts);
        let backend = BackendClient::new(&server.base_url(), None).unwrap();
        (Orchestrator::new(backend, "VoiceJudge3", rx), tx)
    }

    fn mock_pipeline(server: &MockServer, output: serde_json::Value) {
        server.mock(|when, then| {
            when.method(POST).path("/voicejudge");
            then.status(200)
                .json_body(json!({"status": "ok", "res": {"input_data": [[1], [0.1]]}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/uploadinput");
            then.status(200)
                .json_body(json!({"status": "success", "res": {"latest_uuid": "uuid-1"}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/genwitness");
            then.status(200)
                .json_body(json!({"status": "success", "res": "Witness generated successfully."}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/prove");
            then.status(200).json_body(json!({
                "status": "success",
                "res": {"output": output, "output_hex": "0x05", "proof_hex": "0xproof"},
                "message": "Proof created successfully"
            }));
        });
    }

    fn clip() -> AudioFile {
        AudioFile::new("clip.wav", b"RIFF".to_vec())
    }

    #[tokio::test]
    async fn test_no_file_fails_without_requests() {
        let server = MockServer::start();
        let any = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });
        let (mut orch, _tx) = orchestrator(&server, vec![ACCOUNT.to_string()]);

        let err = orch.submit(None).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoFile));
        assert_eq!(orch.state().status_message, "No audio file selected.");
        assert!(!orch.state().pipeline_busy);
        any.assert_hits(0);
    }

    #[tokio::test]
    async fn test_empty_submit_clears_previous_proof() {
        let server = MockServer::start();
        mock_pipeline(&server, json!(5));
        let verify = server.mock(|when, then| {
            when.method(POST).path("/verifyproof");
            then.status(200).json_body(json!({"status": "ok", "res": true}));
        });
        let (mut orch, _tx) = orchestrator(&server, vec![ACCOUNT.to_string()]);

        orch.submit(Some(&clip())).await.unwrap();
        assert!(orch.state().can_verify());

        let err = orch.submit(None).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoFile));
        assert!(!orch.state().proof_generated);
        assert!(!orch.state().can_verify());
        assert!(orch.state().latest_uuid.is_none());
        assert_eq!(orch.state().status_message, "No audio file selected.");

        let err = orch.verify(&ModelDescriptor::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoProof));
        verify.assert_hits(0);
    }

    #[tokio::test]
    async fn test_no_account_fails_at_upload() {
        let server = MockServer::start();
        mock_pipeline(&server, json!(5));
        let (mut orch, _tx) = orchestrator(&server, vec![]);

        let err = orch.submit(Some(&clip())).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoAccount));
        assert_eq!(orch.state().stage, Stage::Failed);
        assert!(!orch.state().proof_generated);
    }

    #[tokio::test]
    async fn test_events_follow_stage_order() {
        let server = MockServer::start();
        mock_pipeline(&server, json!("7.5"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (orch, _accounts) = orchestrator(&server, vec![ACCOUNT.to_string()]);
        let mut orch = orch.with_events(tx);

        let outcome = orch.submit(Some(&clip())).await.unwrap();
        assert_eq!(outcome.rating, Rating::S);
        assert_eq!(outcome.score_hex, "0x05");

        let mut stages = Vec::new();
        let mut statuses = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::StageEntered(stage) => stages.push(stage),
                SessionEvent::Status(s) => statuses.push(s),
                _ => {}
            }
        }
        assert_eq!(stages, Stage::PIPELINE.to_vec());
        assert_eq!(
            statuses,
            vec![
                "Witness generated successfully.".to_string(),
                "Proof created successfully".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_account_read_per_request() {
        let server = MockServer::start();
        let upload = server.mock(|when, then| {
            when.method(POST).path("/voicejudge").body_contains("0xfirst");
            then.status(200)
                .json_body(json!({"status": "ok", "res": {"input_data": [[1]]}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/uploadinput");
            then.status(200)
                .json_body(json!({"status": "success", "res": {"latest_uuid": "uuid-9"}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/genwitness");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({"status": "success", "res": "ok"}));
        });
        let prove = server.mock(|when, then| {
            when.method(POST)
                .path("/prove")
                .json_body_partial(r#"{"address": "0xsecond"}"#);
            then.status(200).json_body(json!({
                "status": "success",
                "res": {"output": 1.0, "proof_hex": "0xp"},
                "message": "Proof created successfully"
            }));
        });

        let (mut orch, accounts) = orchestrator(&server, vec!["0xfirst".to_string()]);
        let run = tokio::spawn(async move { orch.submit(Some(&clip())).await });

        // switch accounts once the upload went out, while the witness is pending
        while upload.hits_async().await == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        accounts.send_replace(vec!["0xsecond".to_string()]);

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.rating, Rating::D);
        upload.assert_hits(1);
        prove.assert_hits(1);
    }

    #[tokio::test]
    async fn test_credits_exhausted_uses_backend_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/voicejudge");
            then.status(200)
                .json_body(json!({"status": "ok", "res": {"input_data": [[1]]}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/uploadinput");
            then.status(200)
                .json_body(json!({"status": "success", "res": {"latest_uuid": "u"}}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/genwitness");
            then.status(200).json_body(json!({"status": "success", "res": "ok"}));
        });
        server.mock(|when, then| {
            when.method(POST).path("/prove");
            then.status(200).json_body(json!({
                "status": "success",
                "res": {"output_hex": "", "output": [], "proof_hex": ""},
                "message": "You don't have enought credits"
            }));
        });
        let (mut orch, _tx) = orchestrator(&server, vec![ACCOUNT.to_string()]);

        let err = orch.submit(Some(&clip())).await.unwrap_err();
        assert!(matches!(err, PipelineError::CreditsExhausted { .. }));
        assert_eq!(orch.state().status_message, "You don't have enought credits");
        assert!(!orch.state().can_verify());
        assert_eq!(orch.state().latest_uuid.as_deref(), Some("u"));
    }

    #[tokio::test]
    async fn test_non_numeric_score_is_rejected() {
        let server = MockServer::start();
        mock_pipeline(&server, json!({"unexpected": true}));
        let (mut orch, _tx) = orchestrator(&server, vec![ACCOUNT.to_string()]);

        let err = orch.submit(Some(&clip())).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidScore(_)));
        assert!(!orch.state().proof_generated);
    }

    #[tokio::test]
    async fn test_verify_requires_proof() {
        let server = MockServer::start();
        let verify = server.mock(|when, then| {
            when.method(POST).path("/verifyproof");
            then.status(200).json_body(json!({"status": "ok", "res": true}));
        });
        let (mut orch, _tx) = orchestrator(&server, vec![ACCOUNT.to_string()]);

        let err = orch.verify(&ModelDescriptor::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoProof));
        assert!(!orch.state().verify_busy);
        verify.assert_hits(0);
    }

    #[tokio::test]
    async fn test_verify_uses_descriptor_then_fallback() {
        let server = MockServer::start();
        mock_pipeline(&server, json!(5));
        let from_descriptor = server.mock(|when, then| {
            when.method(POST).path("/verifyproof").json_body(json!({
                "model_name": "VoiceJudge3",
                "latest_uuid": "uuid-1",
                "address": "0xverifier",
                "rpc_url": "http://rpc:8545"
            }));
            then.status(200).json_body(json!({"status": "ok", "res": true}));
        });
        let from_fallback = server.mock(|when, then| {
            when.method(POST)
                .path("/verifyproof")
                .json_body_partial(r#"{"address": "0xfallback"}"#);
            then.status(200).json_body(json!({"status": "ok", "res": false}));
        });

        let (orch, _tx) = orchestrator(&server, vec![ACCOUNT.to_string()]);
        let mut orch = orch
            .with_network_url(Some("http://rpc:8545".to_string()))
            .with_fallback_verifier(Some("0xfallback".to_string()));
        orch.submit(Some(&clip())).await.unwrap();

        let descriptor = ModelDescriptor {
            name: "VoiceJudge3".to_string(),
            creator: "0xcreator".to_string(),
            verifier: "0xverifier".to_string(),
        };
        assert!(orch.verify(&descriptor).await.unwrap());
        assert_eq!(orch.state().status_message, VERIFY_SUCCEEDED_MESSAGE);

        assert!(!orch.verify(&ModelDescriptor::default()).await.unwrap());
        from_descriptor.assert_hits(1);
        from_fallback.assert_hits(1);
    }

    #[tokio::test]
    async fn test_run_serves_commands_in_order() {
        let server = MockServer::start();
        mock_pipeline(&server, json!(5));
        server.mock(|when, then| {
            when.method(POST).path("/verifyproof");
            then.status(200).json_body(json!({"status": "ok", "res": true}));
        });
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let (orch, _accounts) = orchestrator(&server, vec![ACCOUNT.to_string()]);
        let orch = orch.with_events(events_tx);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(orch.run(cmd_rx));
        cmd_tx.send(Command::Submit(Some(clip()))).unwrap();
        cmd_tx
            .send(Command::Verify(ModelDescriptor::default()))
            .unwrap();
        drop(cmd_tx);
        worker.await.unwrap();

        let mut state = SubmissionState::default();
        while let Ok(event) = events_rx.try_recv() {
            state.apply(&event);
        }
        assert_eq!(state.rating, Some(Rating::B));
        assert_eq!(state.verified, Some(true));
        assert!(!state.pipeline_busy);
        assert!(!state.verify_busy);
    }

    #[test]
    fn test_generating_proof_message() {
        assert_eq!(
            Stage::GeneratingProof.status_message(),
            Some(GENERATING_PROOF_MESSAGE)
        );
    }
}
