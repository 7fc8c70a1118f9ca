//! Builder for constructing engines.
//!
//! Every component defaults to the one described by the configuration: a
//! keychain holding the configured private key, clients for each configured
//! chain and a cached balance view over those clients. Tests and embedders
//! replace any of them.

use crate::balance::{BalanceProvider, CachedBalanceProvider};
use crate::engine::Engine;
use juneo_account::{AccountError, Keychain};
use juneo_config::Config;
use juneo_delivery::{DeliveryError, DeliveryService};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
	#[error("Delivery error: {0}")]
	Delivery(#[from] DeliveryError),
}

/// Builder for an [`Engine`] with replaceable components.
pub struct EngineBuilder {
	config: Config,
	keychain: Option<Keychain>,
	delivery: Option<Arc<DeliveryService>>,
	balances: Option<Arc<dyn BalanceProvider>>,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			keychain: None,
			delivery: None,
			balances: None,
		}
	}

	pub fn with_keychain(mut self, keychain: Keychain) -> Self {
		self.keychain = Some(keychain);
		self
	}

	/// Uses `delivery` instead of clients built from the chain configuration.
	pub fn with_delivery(mut self, delivery: Arc<DeliveryService>) -> Self {
		self.delivery = Some(delivery);
		self
	}

	pub fn with_balance_provider(mut self, balances: Arc<dyn BalanceProvider>) -> Self {
		self.balances = Some(balances);
		self
	}

	pub fn build(self) -> Result<Engine, BuilderError> {
		if self.config.platform_chain().is_none() {
			return Err(BuilderError::Config(
				"No platform chain configured".into(),
			));
		}

		let keychain = match self.keychain {
			Some(keychain) => keychain,
			None => Keychain::from_secret(self.config.account.private_key.clone())?,
		};
		let primary = keychain.primary().clone();
		tracing::info!(component = "account", address = %primary.address(), "Loaded");

		let delivery = match self.delivery {
			Some(delivery) => delivery,
			None => Arc::new(DeliveryService::from_config(
				&self.config,
				&self.config.account.private_key,
			)?),
		};
		tracing::info!(component = "delivery", chains = self.config.chains.len(), "Loaded");

		let balances = match self.balances {
			Some(balances) => balances,
			None => Arc::new(CachedBalanceProvider::new(
				delivery.clone(),
				&self.config,
				keychain.addresses(),
				primary.evm_address(),
			)),
		};

		Ok(Engine::new(self.config, keychain, delivery, balances))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::ScriptedChain;
	use juneo_config::builders::config::{local_platform_chain_id, ConfigBuilder};

	#[test]
	fn test_build_with_injected_delivery() {
		let chain = Arc::new(ScriptedChain::new());
		let delivery =
			DeliveryService::default().with_chain(local_platform_chain_id(), chain.clone());
		let engine = EngineBuilder::new(ConfigBuilder::new().build())
			.with_delivery(Arc::new(delivery))
			.build()
			.unwrap();
		assert_eq!(engine.keychain().addresses().len(), 1);
		assert_eq!(engine.config().chains.len(), 3);
	}

	#[test]
	fn test_invalid_private_key_is_rejected() {
		let config = ConfigBuilder::new().private_key("0x1234").build();
		let result = EngineBuilder::new(config)
			.with_delivery(Arc::new(DeliveryService::default()))
			.build();
		assert!(matches!(result, Err(BuilderError::Account(_))));
	}

	#[test]
	fn test_missing_platform_chain_is_rejected() {
		let mut config = ConfigBuilder::new().build();
		config.chains.retain(|chain| chain.id != local_platform_chain_id());
		let result = EngineBuilder::new(config)
			.with_delivery(Arc::new(DeliveryService::default()))
			.build();
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}
}
