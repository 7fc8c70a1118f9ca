//! Transaction monitoring for submitted legs.
//!
//! Polls a transaction's status at a fixed interval until its chain reports
//! it accepted or rejected, or the operation deadline passes. Only one poll
//! per leg is in flight at a time.

use juneo_delivery::{DeliveryError, DeliveryService};
use juneo_types::{truncate_id, BlockchainId, TransactionId, TransactionStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// How monitoring a leg ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegOutcome {
	/// The chain reported a final status.
	Final(TransactionStatus),
	/// The deadline passed first.
	TimedOut,
}

#[derive(Clone)]
pub struct TransactionMonitor {
	delivery: Arc<DeliveryService>,
	poll_interval: Duration,
}

impl TransactionMonitor {
	pub fn new(delivery: Arc<DeliveryService>, poll_interval: Duration) -> Self {
		Self {
			delivery,
			poll_interval,
		}
	}

	/// Monitors a submitted transaction until it is final or `deadline` passes.
	///
	/// `on_status` sees every status the chain reports, so receipts follow
	/// the chain between polls. Errors from `on_status` stop monitoring.
	/// Errors from the chain are logged and the poll is retried; if the last
	/// poll before the deadline failed, that error is returned instead of
	/// [`LegOutcome::TimedOut`].
	#[instrument(skip_all, fields(chain = %truncate_id(&chain.to_string()), tx_id = %truncate_id(&tx_id.to_string())))]
	pub async fn monitor<E, F>(
		&self,
		chain: &BlockchainId,
		tx_id: &TransactionId,
		deadline: Instant,
		mut on_status: F,
	) -> Result<LegOutcome, E>
	where
		E: From<DeliveryError>,
		F: FnMut(TransactionStatus) -> Result<(), E>,
	{
		let start_time = Instant::now();
		let mut last_error: Option<DeliveryError> = None;

		loop {
			// Check if we've exceeded the deadline
			if Instant::now() >= deadline {
				tracing::warn!(
					elapsed_ms = start_time.elapsed().as_millis() as u64,
					failing = last_error.is_some(),
					"Transaction monitoring deadline reached"
				);
				return match last_error {
					Some(e) => Err(e.into()),
					None => Ok(LegOutcome::TimedOut),
				};
			}

			match self.delivery.status(chain, tx_id).await {
				Ok(status) => {
					last_error = None;
					on_status(status)?;
					if status.is_final() {
						tracing::info!(status = ?status, "Finalized");
						return Ok(LegOutcome::Final(status));
					}
					tracing::debug!(
						status = ?status,
						elapsed_ms = start_time.elapsed().as_millis() as u64,
						"Waiting for transaction to be finalized"
					);
				},
				Err(e) => {
					let message = match &e {
						DeliveryError::NoProviderAvailable(_) => "No client for chain",
						_ => "Checking transaction status",
					};
					tracing::warn!(error = %e, "{}", message);
					last_error = Some(e);
				},
			}

			tokio::time::sleep(self.poll_interval).await;
		}
	}
}
