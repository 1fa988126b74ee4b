//! Submit command - score one audio file through the proving pipeline

use crate::commands::{connect_wallet, fetch_descriptor};
use crate::print_banner;
use crate::style::*;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use voice_judge::session::state::{VERIFY_FAILED_MESSAGE, VERIFY_SUCCEEDED_MESSAGE};
use voice_judge::{AudioFile, ClientConfig, Orchestrator, SessionEvent, Stage};

pub async fn run(config: &ClientConfig, file: PathBuf, verify: bool) -> Result<()> {
    print_banner();
    print_header("Submit Recording");

    if !file.exists() {
        return Err(anyhow!("File not found: {}", file.display()));
    }
    let audio = AudioFile::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let wallet = connect_wallet(config).await;
    let account = wallet
        .active_account()
        .unwrap_or_else(|| "not connected".to_string());

    print_key_value("File", &audio.name);
    print_key_value("Size", &format!("{} bytes", audio.bytes.len()));
    print_key_value("Model", &config.model_name);
    print_key_value("Backend", &config.backend_url);
    print_key_value("Account", &account);
    println!();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let mut orchestrator = Orchestrator::from_config(config, wallet.watch())?.with_events(tx);
    let submitted = orchestrator.submit(Some(&audio)).await;

    let verified = match (&submitted, verify) {
        (Ok(_), true) => {
            let descriptor = fetch_descriptor(config).await;
            Some(orchestrator.verify(&descriptor).await)
        }
        _ => None,
    };

    drop(orchestrator);
    printer.await?;

    let outcome = submitted?;
    println!();

    let score = format!("  Score:  {}", outcome.score);
    let rating = format!("  Rating: {}", outcome.rating);
    let workflow = format!("  Workflow: {}", outcome.latest_uuid);
    let score_hex = format!("  Score hex: {}", truncate_hex(&outcome.score_hex, 10));
    let proof = match hex_byte_len(&outcome.proof_hex) {
        Some(len) => format!(
            "  Proof: {} ({} bytes)",
            truncate_hex(&outcome.proof_hex, 10),
            len
        ),
        None => format!("  Proof: {}", truncate_hex(&outcome.proof_hex, 10)),
    };
    print_box(
        "Proof Generated",
        &["", &score, &rating, &workflow, &score_hex, &proof, ""],
    );
    println!();

    match verified {
        Some(Ok(true)) | None => Ok(()),
        Some(Ok(false)) => Err(anyhow!(VERIFY_FAILED_MESSAGE)),
        Some(Err(e)) => Err(e.into()),
    }
}

fn print_event(event: &SessionEvent) {
    let total = Stage::PIPELINE.len() as u32;
    match event {
        SessionEvent::StageEntered(stage) => {
            if let (Some(step), Some(message)) = (stage.step(), stage.status_message()) {
                print_step(step, total, message);
            }
        }
        SessionEvent::Status(message) => print_info(message),
        SessionEvent::InputRecorded { latest_uuid } => {
            print_key_value("Workflow", latest_uuid);
        }
        SessionEvent::ProofGenerated { score, rating, .. } => {
            print_success(&format!(
                "Score {} rated {}{}{}",
                score,
                rating_color(*rating),
                rating,
                colors::RESET
            ));
        }
        SessionEvent::PipelineFailed { message, .. } => print_error(message),
        SessionEvent::VerifyStarted => print_info("Verifying proof on-chain..."),
        SessionEvent::VerifyFinished { verified: true } => print_success(VERIFY_SUCCEEDED_MESSAGE),
        SessionEvent::VerifyFinished { verified: false } => print_warning(VERIFY_FAILED_MESSAGE),
        SessionEvent::VerifyFailed { message } => print_error(message),
        SessionEvent::SubmitStarted => {}
    }
}
