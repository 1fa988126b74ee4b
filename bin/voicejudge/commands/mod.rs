//! One-shot commands

pub mod balance;
pub mod check_name;
pub mod config;
pub mod health;
pub mod model;
pub mod rating;
pub mod submit;

use std::sync::Arc;

use tracing::{debug, warn};
use voice_judge::registry::load_descriptor;
use voice_judge::{
    ClientConfig, ContractRegistry, JsonRpcWallet, ModelDescriptor, ModelRegistry, RegistryError,
    StaticWallet, WalletConnector, WalletProvider,
};

/// Wallet provider selected by the configuration. A fixed account wins over
/// a wallet URL.
pub fn wallet_provider(config: &ClientConfig) -> Option<Arc<dyn WalletProvider>> {
    if let Some(account) = &config.wallet.account {
        return Some(Arc::new(StaticWallet::new(account.clone())));
    }
    config
        .wallet
        .url
        .as_deref()
        .map(|url| Arc::new(JsonRpcWallet::new(url)) as Arc<dyn WalletProvider>)
}

/// Mount the wallet connector, or a disconnected one when no wallet is set up
pub async fn connect_wallet(config: &ClientConfig) -> WalletConnector {
    match wallet_provider(config) {
        Some(provider) => {
            WalletConnector::mount(provider, config.account_poll_interval()).await
        }
        None => {
            debug!("No wallet configured");
            WalletConnector::disconnected()
        }
    }
}

pub fn model_registry(config: &ClientConfig) -> Option<ContractRegistry> {
    match ContractRegistry::from_config(config) {
        Ok(registry) => Some(registry),
        Err(RegistryError::NotConfigured) => {
            debug!("Marketplace contract not configured");
            None
        }
        Err(e) => {
            warn!("Model registry unavailable: {}", e);
            None
        }
    }
}

pub async fn fetch_descriptor(config: &ClientConfig) -> ModelDescriptor {
    let registry = model_registry(config);
    load_descriptor(
        registry.as_ref().map(|r| r as &dyn ModelRegistry),
        &config.model_name,
    )
    .await
}
