use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Proving backend routes consumed by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    VoiceJudge,
    UploadInput,
    GenWitness,
    Prove,
    VerifyProof,
    Health,
    UserBalance,
    CheckModelName,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::VoiceJudge => "/voicejudge",
            Endpoint::UploadInput => "/uploadinput",
            Endpoint::GenWitness => "/genwitness",
            Endpoint::Prove => "/prove",
            Endpoint::VerifyProof => "/verifyproof",
            Endpoint::Health => "/",
            Endpoint::UserBalance => "/userbalance",
            Endpoint::CheckModelName => "/checkmodelname",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Audio file selected for scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl AudioFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    /// MIME type guessed from the extension
    pub fn mime_type(&self) -> &'static str {
        let ext = Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "wav" => "audio/wav",
            "mp3" => "audio/mpeg",
            "ogg" => "audio/ogg",
            "flac" => "audio/flac",
            "m4a" => "audio/mp4",
            "webm" => "audio/webm",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadInputRequest<'a> {
    pub model_name: &'a str,
    pub input_data: &'a Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct WitnessRequest<'a> {
    pub model_name: &'a str,
    pub latest_uuid: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProveRequest<'a> {
    pub model_name: &'a str,
    pub address: &'a str,
    pub latest_uuid: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub model_name: &'a str,
    pub latest_uuid: &'a str,
    pub address: Option<&'a str>,
    pub rpc_url: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadInputResult {
    pub latest_uuid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProveResultRaw {
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub output_hex: Option<String>,
    #[serde(default)]
    pub proof_hex: String,
}

/// Result of `/prove`
#[derive(Debug, Clone, PartialEq)]
pub struct ProveResponse {
    /// Rescaled model output as returned by the backend
    pub output: Value,
    /// Field-element encoding of the output, when the backend sends it
    pub output_hex: Option<String>,
    pub proof_hex: String,
    pub message: Option<String>,
}

impl ProveResponse {
    /// Numeric score; the backend sends either a number or a numeric string
    pub fn score(&self) -> Option<f64> {
        match &self.output {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Hex payload shown next to the proof. Falls back to the raw output
    /// when the backend omits `output_hex`.
    pub fn score_hex(&self) -> String {
        match self.output_hex.as_deref() {
            Some(hex) if !hex.is_empty() => hex.to_string(),
            _ => match &self.output {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}

/// Request credits an account holds for a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(rename = "onChainReq", default)]
    pub on_chain: u64,
    #[serde(rename = "offChainReq", default)]
    pub off_chain: u64,
    #[serde(rename = "totalReq", default)]
    pub total: u64,
}

impl Credits {
    /// Off-chain proofs still available
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.off_chain)
    }
}

/// Result of `/userbalance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBalance {
    pub credits: Credits,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelNameCheck {
    pub is_valid: bool,
}
