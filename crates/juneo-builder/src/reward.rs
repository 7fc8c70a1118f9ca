//! Staking reward calculation.
//!
//! Rates are fixed point with `REWARD_PRECISION` (1 000 000) standing for
//! 100%. All arithmetic is integer so results are reproducible.

use juneo_config::{RewardConfig, REWARD_PRECISION};

const PRECISION: u128 = REWARD_PRECISION as u128;

/// Linear interpolation of a rate over `[from_time, to_time]`, clamped to
/// the window's end rates outside it.
fn interpolate(time: u64, from_time: u64, to_time: u64, from_rate: u64, to_rate: u64) -> u128 {
	if time <= from_time || to_time <= from_time {
		return u128::from(from_rate);
	}
	if time >= to_time {
		return u128::from(to_rate);
	}
	let elapsed = u128::from(time - from_time);
	let window = u128::from(to_time - from_time);
	let (from_rate, to_rate) = (u128::from(from_rate), u128::from(to_rate));
	if to_rate >= from_rate {
		from_rate + (to_rate - from_rate) * elapsed / window
	} else {
		from_rate - (from_rate - to_rate) * elapsed / window
	}
}

/// Base reward rate at `current_time`.
pub fn base_rate(config: &RewardConfig, current_time: u64) -> u128 {
	if current_time < config.diminishing_reward_time {
		interpolate(
			current_time,
			config.start_reward_time,
			config.diminishing_reward_time,
			config.start_reward,
			config.diminishing_reward,
		)
	} else if current_time < config.target_reward_time {
		interpolate(
			current_time,
			config.diminishing_reward_time,
			config.target_reward_time,
			config.diminishing_reward,
			config.target_reward,
		)
	} else {
		u128::from(config.target_reward)
	}
}

/// Multiplier for the stake period: `(1 - share)` at the minimum period,
/// rising linearly to 100% at the maximum.
pub fn stake_period_ratio(config: &RewardConfig, stake_period: u64) -> u128 {
	let share = u128::from(config.stake_period_reward_share).min(PRECISION);
	let span = u128::from(config.max_stake_period.saturating_sub(config.min_stake_period));
	let position = u128::from(stake_period.saturating_sub(config.min_stake_period));
	let bonus = if span == 0 {
		share
	} else {
		share * position.min(span) / span
	};
	PRECISION - share + bonus
}

/// Reward for staking `stake_amount` for `stake_period` seconds starting at
/// `current_time`.
///
/// Zero outside `[min_stake_period, max_stake_period]`, for a zero target
/// reward or a zero stake.
pub fn reward(
	config: &RewardConfig,
	stake_period: u64,
	current_time: u64,
	stake_amount: u64,
) -> u64 {
	if stake_period < config.min_stake_period
		|| stake_period > config.max_stake_period
		|| config.target_reward == 0
		|| stake_amount == 0
	{
		return 0;
	}
	let rate = base_rate(config, current_time) * stake_period_ratio(config, stake_period) / PRECISION;
	let reward = u128::from(stake_amount) * rate / PRECISION;
	u64::try_from(reward).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
	use super::*;

	const DAY: u64 = 86_400;

	fn config() -> RewardConfig {
		RewardConfig {
			min_stake_period: 14 * DAY,
			max_stake_period: 365 * DAY,
			stake_period_reward_share: 500_000,
			start_reward_time: 1_000,
			start_reward: 200_000,
			diminishing_reward_time: 2_000,
			diminishing_reward: 100_000,
			target_reward_time: 3_000,
			target_reward: 50_000,
		}
	}

	#[test]
	fn test_zero_conditions() {
		let config = config();
		assert_eq!(reward(&config, 14 * DAY - 1, 1_000, 1_000_000), 0);
		assert_eq!(reward(&config, 365 * DAY + 1, 1_000, 1_000_000), 0);
		assert_eq!(reward(&config, 100 * DAY, 1_000, 0), 0);

		let no_target = RewardConfig {
			target_reward: 0,
			..config
		};
		assert_eq!(reward(&no_target, 100 * DAY, 1_000, 1_000_000), 0);
	}

	#[test]
	fn test_base_rate_windows() {
		let config = config();
		assert_eq!(base_rate(&config, 0), 200_000);
		assert_eq!(base_rate(&config, 1_000), 200_000);
		assert_eq!(base_rate(&config, 1_500), 150_000);
		assert_eq!(base_rate(&config, 2_000), 100_000);
		assert_eq!(base_rate(&config, 2_500), 75_000);
		assert_eq!(base_rate(&config, 3_000), 50_000);
		assert_eq!(base_rate(&config, 10_000), 50_000);
	}

	#[test]
	fn test_stake_period_ratio_bounds() {
		let config = config();
		assert_eq!(stake_period_ratio(&config, 14 * DAY), 500_000);
		assert_eq!(stake_period_ratio(&config, 365 * DAY), 1_000_000);
	}

	#[test]
	fn test_exact_values() {
		let config = config();
		// Full period at the flat target rate: 5% of the stake.
		assert_eq!(reward(&config, 365 * DAY, 5_000, 1_000_000_000), 50_000_000);
		// Minimum period halves the rate.
		assert_eq!(reward(&config, 14 * DAY, 5_000, 1_000_000_000), 25_000_000);
		// Start of the schedule.
		assert_eq!(reward(&config, 365 * DAY, 1_000, 1_000_000_000), 200_000_000);
	}

	#[test]
	fn test_monotonic_in_stake_period() {
		let config = config();
		let mut previous = 0;
		for days in 14..=365 {
			let value = reward(&config, days * DAY, 2_500, 10_000_000_000);
			assert!(value >= previous, "reward decreased at {} days", days);
			previous = value;
		}
	}
}
