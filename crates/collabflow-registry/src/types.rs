// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How [`crate::ServiceRegistry::discover`] picks among the matching
/// instances (spec §4.3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadBalanceStrategy {
	First,
	Random,
	RoundRobin,
}

impl Default for LoadBalanceStrategy {
	fn default() -> Self {
		LoadBalanceStrategy::RoundRobin
	}
}

/// Health as last observed by the probe loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum HealthStatus {
	Healthy,
	Unhealthy,
	/// Registered but not yet probed.
	Unknown,
}

/// What a service announces when it registers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
	pub name: String,
	pub version: String,
	pub base_url: String,
	pub health_path: String,
}

/// Running counters kept per registered instance (spec §4.3 "updates
/// per-service counters").
#[derive(Default)]
pub struct ServiceCounters {
	pub calls: AtomicU64,
	pub failures: AtomicU64,
}

impl ServiceCounters {
	pub fn snapshot(&self) -> (u64, u64) {
		(self.calls.load(Ordering::Relaxed), self.failures.load(Ordering::Relaxed))
	}
}

/// A registered instance and its current health.
pub struct ServiceRecord {
	pub id: String,
	pub config: ServiceConfig,
	pub status: HealthStatus,
	pub counters: ServiceCounters,
}

impl ServiceRecord {
	pub fn new(id: String, config: ServiceConfig) -> Self {
		Self { id, config, status: HealthStatus::Unknown, counters: ServiceCounters::default() }
	}
}

/// Filters applied by [`crate::ServiceRegistry::discover`].
#[derive(Clone, Debug, Default)]
pub struct DiscoverOptions {
	pub require_healthy: bool,
	pub preferred_version: Option<String>,
	pub strategy: LoadBalanceStrategy,
}

/// Parameters for [`crate::ServiceRegistry::call`].
#[derive(Clone, Debug)]
pub struct CallOptions {
	pub method: reqwest::Method,
	pub path: String,
	pub headers: Vec<(String, String)>,
	pub body: Option<Vec<u8>>,
	pub timeout: Duration,
	pub retries: u32,
}

impl Default for CallOptions {
	fn default() -> Self {
		Self {
			method: reqwest::Method::GET,
			path: String::new(),
			headers: Vec::new(),
			body: None,
			timeout: Duration::from_secs(10),
			retries: 0,
		}
	}
}
