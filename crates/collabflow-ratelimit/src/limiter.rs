// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use collabflow_core::Tier;
use collabflow_kv::KvStore;
use tracing::instrument;

use crate::error::Result;
use crate::limits::TierLimits;

const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;

/// The outcome of a [`RateLimiter::check_request`] /
/// `check_connection` / `check_message` call (spec §4.5
/// `checkAndConsume`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decision {
	pub allowed: bool,
	pub reason: Option<String>,
}

impl Decision {
	fn allow() -> Self {
		Self { allowed: true, reason: None }
	}

	fn deny(reason: impl Into<String>) -> Self {
		Self { allowed: false, reason: Some(reason.into()) }
	}
}

/// Tiered quota enforcement over a shared counter store (spec §4.5,
/// component C5). Three independent budgets per identity: hourly/daily
/// request counts, open connections, and a windowed per-connection
/// message rate. Every counter lives in the KV store with a TTL
/// matching its window, so a crash never leaves a stuck quota.
pub struct RateLimiter {
	kv: Arc<dyn KvStore>,
	base_per_hour: u64,
	base_per_day: u64,
}

impl RateLimiter {
	pub fn new(kv: Arc<dyn KvStore>, base_per_hour: u64, base_per_day: u64) -> Self {
		Self { kv, base_per_hour, base_per_day }
	}

	fn limits(&self, tier: Tier) -> TierLimits {
		TierLimits::for_tier(tier, self.base_per_hour, self.base_per_day)
	}

	/// Consumes one unit of the hourly and daily request budgets for
	/// `user_id`. Denies on whichever budget is exhausted first.
	#[instrument(skip(self))]
	pub async fn check_request(&self, user_id: &str, tier: Tier) -> Result<Decision> {
		let limits = self.limits(tier);
		let now = now_secs();

		let hour_key = format!("ratelimit:req:hour:{}:{user_id}", tier.as_str());
		let hour_count = self.kv.incr(&hour_key, 1, Some(Duration::from_secs(seconds_to_boundary(now, SECS_PER_HOUR)))).await?;
		if hour_count as u64 > limits.max_per_hour {
			return Ok(Decision::deny(format!("hourly request budget of {} exceeded", limits.max_per_hour)));
		}

		let day_key = format!("ratelimit:req:day:{}:{user_id}", tier.as_str());
		let day_count = self.kv.incr(&day_key, 1, Some(Duration::from_secs(seconds_to_boundary(now, SECS_PER_DAY)))).await?;
		if day_count as u64 > limits.max_per_day {
			return Ok(Decision::deny(format!("daily request budget of {} exceeded", limits.max_per_day)));
		}

		Ok(Decision::allow())
	}

	/// Reserves one open-connection slot for `user_id`. On denial the
	/// reservation is rolled back so a rejected handshake never leaks a
	/// permanent slot (spec §4.6 "refusal closes with CONN_LIMIT").
	#[instrument(skip(self))]
	pub async fn check_connection(&self, user_id: &str, tier: Tier) -> Result<Decision> {
		let limits = self.limits(tier);
		let key = format!("ratelimit:conn:{}:{user_id}", tier.as_str());
		let count = self.kv.incr(&key, 1, None).await?;
		if count as u64 > limits.max_connections {
			self.kv.incr(&key, -1, None).await?;
			return Ok(Decision::deny(format!("connection limit of {} exceeded", limits.max_connections)));
		}
		Ok(Decision::allow())
	}

	/// Releases a previously reserved connection slot (spec §4.6
	/// disconnect: "releases the C5 connection slot").
	pub async fn release_connection(&self, user_id: &str, tier: Tier) -> Result<()> {
		let key = format!("ratelimit:conn:{}:{user_id}", tier.as_str());
		self.kv.incr(&key, -1, None).await?;
		Ok(())
	}

	/// Consumes one unit of `connection_id`'s windowed message budget
	/// (spec §4.6 "every dispatch first consults C5's message-rate
	/// budget").
	#[instrument(skip(self))]
	pub async fn check_message(&self, connection_id: &str, tier: Tier) -> Result<Decision> {
		let limits = self.limits(tier);
		let key = format!("ratelimit:msg:{}:{connection_id}", tier.as_str());
		let count = self.kv.incr(&key, 1, Some(Duration::from_secs(limits.message_window_secs))).await?;
		if count as u64 > limits.max_messages_per_window {
			return Ok(Decision::deny(format!("message rate of {} per {}s exceeded", limits.max_messages_per_window, limits.message_window_secs)));
		}
		Ok(Decision::allow())
	}
}

fn now_secs() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn seconds_to_boundary(now: u64, window: u64) -> u64 {
	(window - (now % window)).max(1)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use collabflow_testing::InMemoryKv;

	use super::*;

	fn limiter() -> RateLimiter {
		RateLimiter::new(Arc::new(InMemoryKv::new()), 3, 10)
	}

	#[tokio::test]
	async fn request_budget_denies_after_hourly_cap() {
		let rl = limiter();
		for _ in 0..3 {
			assert!(rl.check_request("u1", Tier::Free).await.unwrap().allowed);
		}
		let decision = rl.check_request("u1", Tier::Free).await.unwrap();
		assert!(!decision.allowed);
		assert!(decision.reason.unwrap().contains("hourly"));
	}

	#[tokio::test]
	async fn connection_budget_rolls_back_on_denial() {
		let rl = limiter();
		assert!(rl.check_connection("u1", Tier::Free).await.unwrap().allowed);
		assert!(rl.check_connection("u1", Tier::Free).await.unwrap().allowed);
		let denied = rl.check_connection("u1", Tier::Free).await.unwrap();
		assert!(!denied.allowed);

		rl.release_connection("u1", Tier::Free).await.unwrap();
		rl.release_connection("u1", Tier::Free).await.unwrap();
		assert!(rl.check_connection("u1", Tier::Free).await.unwrap().allowed);
	}

	#[tokio::test]
	async fn message_budget_is_scoped_per_connection() {
		let rl = limiter();
		for _ in 0..10 {
			assert!(rl.check_message("conn-a", Tier::Free).await.unwrap().allowed);
		}
		assert!(!rl.check_message("conn-a", Tier::Free).await.unwrap().allowed);
		// A different connection has its own independent budget.
		assert!(rl.check_message("conn-b", Tier::Free).await.unwrap().allowed);
	}
}
