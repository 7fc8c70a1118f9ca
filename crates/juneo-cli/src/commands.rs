//! Subcommand implementations.

use juneo_account::Keychain;
use juneo_config::Config;
use juneo_core::{Engine, EngineBuilder, Operation, OperationStatus};
use juneo_types::{current_timestamp, VmKind};
use std::error::Error;
use std::path::Path;

/// Reads an operation from a JSON file, e.g.
/// `{"type": "delegate", "node_id": "NodeID-...", "amount": 1000000000, ...}`.
pub async fn load_operation(path: &Path) -> Result<Operation, Box<dyn Error>> {
	let content = tokio::fs::read_to_string(path).await?;
	Ok(serde_json::from_str(&content)?)
}

/// Staking reward for `amount` over `[start_time, end_time]`.
pub fn reward(
	config: &Config,
	amount: u64,
	start_time: Option<u64>,
	end_time: u64,
) -> Result<u64, Box<dyn Error>> {
	let start_time = start_time.unwrap_or_else(current_timestamp);
	if end_time <= start_time {
		return Err(format!("end time {} is not after start time {}", end_time, start_time).into());
	}
	Ok(juneo_builder::reward::reward(
		&config.staking.reward,
		end_time - start_time,
		start_time,
		amount,
	))
}

/// Chain-prefixed addresses of the configured key, plus its EVM address.
pub fn addresses(config: &Config) -> Result<Vec<(String, String)>, Box<dyn Error>> {
	let keychain = Keychain::from_secret(config.account.private_key.clone())?;
	let primary = keychain.primary();
	let mut lines = Vec::new();
	for chain in &config.chains {
		let address = match chain.vm {
			VmKind::Evm => primary.evm_address().to_hex(),
			VmKind::Platform | VmKind::Jvm => primary
				.address()
				.to_chain_address(&chain.alias, &config.network.hrp)?,
		};
		lines.push((chain.alias.clone(), address));
	}
	Ok(lines)
}

fn engine(config: Config) -> Result<Engine, Box<dyn Error>> {
	Ok(EngineBuilder::new(config).build()?)
}

pub async fn estimate(config: Config, path: &Path) -> Result<(), Box<dyn Error>> {
	let operation = load_operation(path).await?;
	let engine = engine(config)?;
	let summary = engine.estimate(&operation).await?;

	for leg in &summary.legs {
		let alias = engine
			.config()
			.chain_by_id(&leg.chain_id)
			.map(|chain| chain.alias.as_str())
			.unwrap_or("?");
		println!("{} on {}: fee {} of {}", leg.kind, alias, leg.fee.amount, leg.fee.asset_id);
	}
	for fee in summary.fees() {
		println!("total fee: {} of {}", fee.amount, fee.asset_id);
	}
	if summary.reward > 0 {
		println!("estimated reward: {}", summary.reward);
	}
	Ok(())
}

pub async fn execute(config: Config, path: &Path) -> Result<(), Box<dyn Error>> {
	let operation = load_operation(path).await?;
	let engine = engine(config)?;
	let mut executable = engine.estimate(&operation).await?.into_executable();
	tracing::info!(operation_id = %executable.id(), "Executing operation");

	let result = engine.execute(&mut executable).await;
	println!("{}", serde_json::to_string_pretty(&executable.snapshot())?);
	match result? {
		OperationStatus::Done => Ok(()),
		status => Err(format!("operation ended in {}", status).into()),
	}
}
