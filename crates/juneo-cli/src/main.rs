//! Command-line client for the Juneo operation engine.
//!
//! Loads a network configuration, then estimates or executes operations
//! described in JSON files, computes staking rewards and prints the
//! addresses of the configured key.

use clap::{Parser, Subcommand};
use juneo_config::Config;
use std::path::PathBuf;

mod commands;

/// Command-line arguments for the client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Computes the staking reward of a stake
	Reward {
		/// Stake amount in atomic units
		#[arg(long)]
		amount: u64,
		/// Unix start time; defaults to now
		#[arg(long)]
		start_time: Option<u64>,
		/// Unix end time
		#[arg(long)]
		end_time: u64,
	},
	/// Estimates the fees of an operation
	Estimate {
		/// JSON file describing the operation
		operation: PathBuf,
	},
	/// Estimates then executes an operation
	Execute {
		/// JSON file describing the operation
		operation: PathBuf,
	},
	/// Prints the addresses of the configured key
	Address,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		network = config.network.id,
		chains = config.chains.len(),
		"Loaded configuration"
	);

	match args.command {
		Command::Reward {
			amount,
			start_time,
			end_time,
		} => {
			let reward = commands::reward(&config, amount, start_time, end_time)?;
			println!("{}", reward);
		},
		Command::Estimate { operation } => commands::estimate(config, &operation).await?,
		Command::Execute { operation } => commands::execute(config, &operation).await?,
		Command::Address => {
			for (alias, address) in commands::addresses(&config)? {
				println!("{}: {}", alias, address);
			}
		},
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_default_values() {
		let args = Args::try_parse_from(["juneo", "address"]).unwrap();
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(matches!(args.command, Command::Address));
	}

	#[test]
	fn test_args_reward_command() {
		let args = Args::try_parse_from([
			"juneo",
			"--config",
			"custom.toml",
			"reward",
			"--amount",
			"1000",
			"--end-time",
			"2000000000",
		])
		.unwrap();
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		match args.command {
			Command::Reward {
				amount,
				start_time,
				end_time,
			} => {
				assert_eq!(amount, 1_000);
				assert_eq!(start_time, None);
				assert_eq!(end_time, 2_000_000_000);
			},
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_args_require_command() {
		assert!(Args::try_parse_from(["juneo"]).is_err());
	}
}
