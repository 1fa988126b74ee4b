//! Wallet integration
//!
//! A [`WalletProvider`] hands out the accounts a wallet exposes; the
//! [`WalletConnector`] asks for access once and keeps the account list
//! current for the rest of the session.

pub mod connector;
pub mod rpc;

use async_trait::async_trait;
use thiserror::Error;

pub use connector::{AccountSubscription, Accounts, WalletConnector};
pub use rpc::JsonRpcWallet;

/// EIP-1193 code for a request the user declined
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to reach wallet: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Wallet HTTP error: {0}")]
    Http(u16),

    #[error("Wallet RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid wallet response: {0}")]
    Parse(String),
}

impl WalletError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }
}

/// Source of wallet accounts
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask for account access; may prompt the user
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Accounts currently exposed, without prompting
    async fn accounts(&self) -> Result<Vec<String>, WalletError>;
}

/// Fixed account taken from configuration
pub struct StaticWallet {
    account: String,
}

impl StaticWallet {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

#[async_trait]
impl WalletProvider for StaticWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        Ok(vec![self.account.clone()])
    }

    async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        Ok(vec![self.account.clone()])
    }
}
