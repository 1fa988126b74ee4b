//! Model descriptors from the AI marketplace contract
//!
//! Every model registered on the marketplace records who created it and
//! which verifier contract checks its proofs. The client reads the
//! descriptor once per session.

use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use alloy::sol;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ClientConfig;

sol! {
    #[sol(rpc)]
    interface IAIMarketPlace {
        struct Model {
            string name;
            address creator;
            address verifier;
        }

        function getModel(string memory modelName) external view returns (Model memory);
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Marketplace contract is not configured")]
    NotConfigured,

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid marketplace address: {0}")]
    InvalidAddress(String),

    #[error("Contract call failed: {0}")]
    Call(String),
}

/// Marketplace entry for a model. The empty descriptor stands for
/// "not loaded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub creator: String,
    pub verifier: String,
}

impl ModelDescriptor {
    pub fn is_loaded(&self) -> bool {
        !self.creator.is_empty() || !self.verifier.is_empty()
    }

    pub fn verifier(&self) -> Option<&str> {
        (!self.verifier.is_empty()).then_some(self.verifier.as_str())
    }

    pub fn creator(&self) -> Option<&str> {
        (!self.creator.is_empty()).then_some(self.creator.as_str())
    }
}

impl From<IAIMarketPlace::Model> for ModelDescriptor {
    fn from(model: IAIMarketPlace::Model) -> Self {
        Self {
            name: model.name,
            creator: model.creator.to_string(),
            verifier: model.verifier.to_string(),
        }
    }
}

/// Lookup of model descriptors by name
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    async fn get_model(&self, model_name: &str) -> Result<ModelDescriptor, RegistryError>;
}

/// Registry backed by the marketplace contract
pub struct ContractRegistry {
    rpc_url: Url,
    address: Address,
}

impl ContractRegistry {
    pub fn new(rpc_url: &str, address: Address) -> Result<Self, RegistryError> {
        let rpc_url = rpc_url
            .parse()
            .map_err(|e| RegistryError::InvalidRpcUrl(format!("{}", e)))?;
        Ok(Self { rpc_url, address })
    }

    /// Registry for the configured network and marketplace, if both are set
    pub fn from_config(config: &ClientConfig) -> Result<Self, RegistryError> {
        let rpc_url = config
            .network_url
            .as_deref()
            .ok_or(RegistryError::NotConfigured)?;
        let address = config
            .marketplace_address()
            .map_err(|e| RegistryError::InvalidAddress(e.to_string()))?
            .ok_or(RegistryError::NotConfigured)?;
        Self::new(rpc_url, address)
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl ModelRegistry for ContractRegistry {
    async fn get_model(&self, model_name: &str) -> Result<ModelDescriptor, RegistryError> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = IAIMarketPlace::new(self.address, &provider);

        let result = contract
            .getModel(model_name.to_string())
            .call()
            .await
            .map_err(|e| RegistryError::Call(e.to_string()))?;

        Ok(result._0.into())
    }
}

/// Read the descriptor once. Failures leave it empty and are only logged.
pub async fn load_descriptor(
    registry: Option<&dyn ModelRegistry>,
    model_name: &str,
) -> ModelDescriptor {
    let Some(registry) = registry else {
        debug!("No model registry configured");
        return ModelDescriptor::default();
    };
    match registry.get_model(model_name).await {
        Ok(descriptor) => {
            info!(
                "Loaded model {} (creator {}, verifier {})",
                model_name, descriptor.creator, descriptor.verifier
            );
            descriptor
        }
        Err(e) => {
            debug!("Failed to load model {}: {}", model_name, e);
            ModelDescriptor::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    struct FixedRegistry(ModelDescriptor);

    #[async_trait]
    impl ModelRegistry for FixedRegistry {
        async fn get_model(&self, _model_name: &str) -> Result<ModelDescriptor, RegistryError> {
            Ok(self.0.clone())
        }
    }

    struct FailingRegistry;

    #[async_trait]
    impl ModelRegistry for FailingRegistry {
        async fn get_model(&self, _model_name: &str) -> Result<ModelDescriptor, RegistryError> {
            Err(RegistryError::Call("execution reverted".to_string()))
        }
    }

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor {
            name: "VoiceJudge3".to_string(),
            creator: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            verifier: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".to_string(),
        }
    }

    #[test]
    fn test_empty_descriptor_is_not_loaded() {
        let empty = ModelDescriptor::default();
        assert!(!empty.is_loaded());
        assert!(empty.verifier().is_none());
        assert!(empty.creator().is_none());
        assert!(descriptor().is_loaded());
    }

    #[test]
    fn test_from_contract_model() {
        let creator = Address::from_str("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap();
        let verifier = Address::from_str("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512").unwrap();
        let model = IAIMarketPlace::Model {
            name: "VoiceJudge3".to_string(),
            creator,
            verifier,
        };
        let descriptor = ModelDescriptor::from(model);
        assert_eq!(descriptor.name, "VoiceJudge3");
        assert_eq!(
            Address::from_str(&descriptor.creator).unwrap(),
            creator
        );
        assert_eq!(
            Address::from_str(descriptor.verifier().unwrap()).unwrap(),
            verifier
        );
    }

    #[tokio::test]
    async fn test_load_descriptor_swallows_failure() {
        let loaded = load_descriptor(Some(&FailingRegistry), "VoiceJudge3").await;
        assert_eq!(loaded, ModelDescriptor::default());

        let none = load_descriptor(None, "VoiceJudge3").await;
        assert!(!none.is_loaded());
    }

    #[tokio::test]
    async fn test_load_descriptor_fixed() {
        let registry = FixedRegistry(descriptor());
        let loaded = load_descriptor(Some(&registry), "VoiceJudge3").await;
        assert_eq!(loaded, descriptor());
    }

    #[test]
    fn test_from_config_requires_network_and_address() {
        let mut config = ClientConfig::default();
        assert!(matches!(
            ContractRegistry::from_config(&config),
            Err(RegistryError::NotConfigured)
        ));
        config.network_url = Some("http://localhost:8545".to_string());
        assert!(matches!(
            ContractRegistry::from_config(&config),
            Err(RegistryError::NotConfigured)
        ));
        config.marketplace_address =
            Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string());
        let registry = ContractRegistry::from_config(&config).unwrap();
        assert_eq!(
            registry.address(),
            Address::from_str("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap()
        );
    }
}
