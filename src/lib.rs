//! Voice Judge client
//!
//! Connects a wallet, uploads an audio file to the Voice Judge proving
//! backend, drives the upload → input → witness → proof pipeline and
//! verifies the resulting proof on-chain through the backend.
//!
//! ## Module Structure
//!
//! - `config`: layered configuration (defaults, TOML file, env/CLI)
//! - `rating`: score to letter-grade mapping
//! - `backend`: REST client for the proving backend
//! - `wallet`: wallet providers and the account connector
//! - `registry`: model descriptor lookup on the marketplace contract
//! - `session`: submission state, events and the orchestrator

/// Layered client configuration
pub mod config;

/// Score to rating mapping
pub mod rating;

/// Proving backend REST client
pub mod backend;

/// Wallet providers and account tracking
pub mod wallet;

/// Marketplace contract model descriptors
pub mod registry;

/// Submission state machine and orchestrator
pub mod session;

pub use backend::{BackendClient, BackendError};
pub use config::{ClientConfig, ConfigError};
pub use rating::Rating;
pub use registry::{ContractRegistry, ModelDescriptor, ModelRegistry, RegistryError};
pub use session::{
    AudioFile, Command, Orchestrator, PipelineError, SessionEvent, Stage, SubmissionState,
};
pub use wallet::{
    AccountSubscription, JsonRpcWallet, StaticWallet, WalletConnector, WalletError,
    WalletProvider,
};

/// Model name the Voice Judge application is registered under
pub const DEFAULT_MODEL_NAME: &str = "VoiceJudge3";
