use super::types::*;
use super::BackendError;
use crate::config::ClientConfig;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the Voice Judge proving backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client. Without a timeout, requests wait as long as the
    /// backend takes (proof generation can run for minutes).
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(30));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(BackendError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        Self::new(&config.backend_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Upload the audio file; returns the model input extracted from it
    pub async fn upload_audio(
        &self,
        model_name: &str,
        address: &str,
        file: &AudioFile,
    ) -> Result<Value, BackendError> {
        let endpoint = Endpoint::VoiceJudge;
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("fileName", file.name.clone())
            .text("model_name", model_name.to_string())
            .text("address", address.to_string());

        debug!(file = %file.name, size = file.bytes.len(), "Uploading audio");
        let resp = self
            .client
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;

        let body = read_envelope(endpoint, resp).await?;
        let res = take_res(endpoint, body)?;
        match res {
            Value::Object(mut map) => map
                .remove("input_data")
                .filter(|v| !v.is_null())
                .ok_or(BackendError::MissingField {
                    endpoint,
                    field: "res.input_data",
                }),
            _ => Err(BackendError::MissingField {
                endpoint,
                field: "res.input_data",
            }),
        }
    }

    /// Store the model input; returns the workflow identifier
    pub async fn upload_input(
        &self,
        model_name: &str,
        input_data: &Value,
    ) -> Result<String, BackendError> {
        let endpoint = Endpoint::UploadInput;
        let request = UploadInputRequest {
            model_name,
            input_data,
        };
        let body = self.post_json(endpoint, &request).await?;
        let res: UploadInputResult = parse_res(endpoint, body, "res.latest_uuid")?;
        Ok(res.latest_uuid)
    }

    /// Generate the witness; returns the backend's status text
    pub async fn generate_witness(
        &self,
        model_name: &str,
        latest_uuid: &str,
    ) -> Result<String, BackendError> {
        let endpoint = Endpoint::GenWitness;
        let request = WitnessRequest {
            model_name,
            latest_uuid,
        };
        let body = self.post_json(endpoint, &request).await?;
        parse_res(endpoint, body, "res")
    }

    pub async fn prove(
        &self,
        model_name: &str,
        address: &str,
        latest_uuid: &str,
    ) -> Result<ProveResponse, BackendError> {
        let endpoint = Endpoint::Prove;
        let request = ProveRequest {
            model_name,
            address,
            latest_uuid,
        };
        let mut body = self.post_json(endpoint, &request).await?;
        let message = body
            .get_mut("message")
            .map(Value::take)
            .and_then(|m| m.as_str().map(str::to_string));
        let raw: ProveResultRaw = parse_res(endpoint, body, "res")?;
        Ok(ProveResponse {
            output: raw.output,
            output_hex: raw.output_hex,
            proof_hex: raw.proof_hex,
            message,
        })
    }

    /// Ask the backend to verify the stored proof against the on-chain
    /// verifier. Anything but `res: true` counts as a failed verification,
    /// including the backend's error envelope.
    pub async fn verify_proof(
        &self,
        model_name: &str,
        latest_uuid: &str,
        verifier: Option<&str>,
        rpc_url: Option<&str>,
    ) -> Result<bool, BackendError> {
        let endpoint = Endpoint::VerifyProof;
        let request = VerifyRequest {
            model_name,
            latest_uuid,
            address: verifier,
            rpc_url,
        };
        let resp = self
            .client
            .post(self.url(endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;
        let body = read_json(endpoint, resp).await?;
        if is_error_envelope(&body) {
            warn!("Backend reported an error while verifying {}", latest_uuid);
        }
        Ok(matches!(body.get("res"), Some(Value::Bool(true))))
    }

    /// Probe the backend root
    pub async fn health(&self) -> Result<String, BackendError> {
        let endpoint = Endpoint::Health;
        let body = self.get(endpoint, &[]).await?;
        parse_res(endpoint, body, "res")
    }

    pub async fn user_balance(
        &self,
        model_name: &str,
        address: &str,
    ) -> Result<UserBalance, BackendError> {
        let endpoint = Endpoint::UserBalance;
        let mut body = self
            .get(endpoint, &[("address", address), ("model_name", model_name)])
            .await?;
        let message = body
            .get_mut("message")
            .map(Value::take)
            .and_then(|m| m.as_str().map(str::to_string));
        let credits: Credits = parse_res(endpoint, body, "res")?;
        Ok(UserBalance { credits, message })
    }

    /// Whether a model name is still free on the backend
    pub async fn check_model_name(&self, model_name: &str) -> Result<bool, BackendError> {
        let endpoint = Endpoint::CheckModelName;
        let body = self.get(endpoint, &[("model_name", model_name)]).await?;
        let check: ModelNameCheck = parse_res(endpoint, body, "res.is_valid")?;
        Ok(check.is_valid)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<Value, BackendError> {
        debug!("POST {}", endpoint);
        let resp = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;
        read_envelope(endpoint, resp).await
    }

    async fn get(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<Value, BackendError> {
        debug!("GET {}", endpoint);
        let resp = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;
        read_envelope(endpoint, resp).await
    }
}

async fn read_json(endpoint: Endpoint, resp: Response) -> Result<Value, BackendError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            endpoint,
            status: status.as_u16(),
            body,
        });
    }
    let text = resp
        .text()
        .await
        .map_err(|source| BackendError::Transport { endpoint, source })?;
    serde_json::from_str(&text).map_err(|e| BackendError::Parse {
        endpoint,
        reason: e.to_string(),
    })
}

/// Read a JSON body and turn the backend's `{"status": "Error"}` envelope
/// into an error
async fn read_envelope(endpoint: Endpoint, resp: Response) -> Result<Value, BackendError> {
    let body = read_json(endpoint, resp).await?;
    if is_error_envelope(&body) {
        let message = body
            .get("res")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Backend reported an error for {}", endpoint));
        return Err(BackendError::Remote { endpoint, message });
    }
    Ok(body)
}

fn is_error_envelope(body: &Value) -> bool {
    body.get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("error"))
}

fn take_res(endpoint: Endpoint, body: Value) -> Result<Value, BackendError> {
    match body {
        Value::Object(mut map) => match map.remove("res") {
            Some(res) if !res.is_null() => Ok(res),
            _ => Err(BackendError::MissingField {
                endpoint,
                field: "res",
            }),
        },
        _ => Err(BackendError::MissingField {
            endpoint,
            field: "res",
        }),
    }
}

fn parse_res<T: DeserializeOwned>(
    endpoint: Endpoint,
    body: Value,
    field: &'static str,
) -> Result<T, BackendError> {
    let res = take_res(endpoint, body)?;
    serde_json::from_value(res).map_err(|_| BackendError::MissingField { endpoint, field })
}
