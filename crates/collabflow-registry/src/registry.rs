// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use rand::Rng;
use tokio::time::Instant;
use uuid::Uuid;

use collabflow_kv::KvStore;

use crate::error::{RegistryError, Result};
use crate::types::{CallOptions, DiscoverOptions, HealthStatus, LoadBalanceStrategy, ServiceConfig, ServiceRecord};

const REGISTRY_HASH_KEY: &str = "service:registry";
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// A discovered instance, cheap to clone and hand back to callers
/// (spec §4.3 `discover`).
#[derive(Clone, Debug)]
pub struct DiscoveredService {
	pub id: String,
	pub config: ServiceConfig,
}

/// Health-driven service registry (spec §4.3, component C3). Registered
/// instances live both in the KV hash `service:registry` (so a restart
/// can rehydrate) and in an in-memory `DashMap` consulted by `discover`
/// for low-latency lookups.
pub struct ServiceRegistry {
	kv: Arc<dyn KvStore>,
	http: reqwest::Client,
	services: DashMap<String, ServiceRecord>,
	round_robin: DashMap<String, AtomicUsize>,
}

impl ServiceRegistry {
	pub fn new(kv: Arc<dyn KvStore>) -> Self {
		Self { kv, http: reqwest::Client::new(), services: DashMap::new(), round_robin: DashMap::new() }
	}

	/// Registers a new instance, persists it, and runs an immediate
	/// health probe before returning (spec §4.3).
	pub async fn register(&self, config: ServiceConfig) -> Result<String> {
		let id = Uuid::new_v4().to_string();
		let serialized = serde_json::to_vec(&config)
			.map_err(|e| RegistryError::CallFailed(format!("failed to serialize service config: {e}")))?;
		self.kv
			.hset(REGISTRY_HASH_KEY, &id, serialized)
			.await
			.map_err(|e| RegistryError::CallFailed(e.to_string()))?;
		self.services.insert(id.clone(), ServiceRecord::new(id.clone(), config));
		self.probe_one(&id).await;
		Ok(id)
	}

	/// Removes an instance from both the KV hash and memory (spec §4.3).
	pub async fn deregister(&self, service_id: &str) -> Result<()> {
		self.kv.hdel(REGISTRY_HASH_KEY, service_id).await.map_err(|e| RegistryError::CallFailed(e.to_string()))?;
		self.services.remove(service_id);
		Ok(())
	}

	/// Filters registered instances by name, health, and version, then
	/// applies the requested load-balancing strategy (spec §4.3).
	pub fn discover(&self, name: &str, opts: &DiscoverOptions) -> Result<DiscoveredService> {
		let mut candidates: Vec<String> = self
			.services
			.iter()
			.filter(|entry| entry.config.name == name)
			.filter(|entry| !opts.require_healthy || entry.status == HealthStatus::Healthy)
			.filter(|entry| {
				opts.preferred_version.as_ref().map(|v| &entry.config.version == v).unwrap_or(true)
			})
			.map(|entry| entry.id.clone())
			.collect();
		candidates.sort();

		if candidates.is_empty() {
			return Err(RegistryError::NoAvailableService(name.to_string()));
		}

		let chosen = match opts.strategy {
			LoadBalanceStrategy::First => candidates[0].clone(),
			LoadBalanceStrategy::Random => {
				let idx = rand::thread_rng().gen_range(0..candidates.len());
				candidates[idx].clone()
			}
			LoadBalanceStrategy::RoundRobin => {
				let counter = self.round_robin.entry(name.to_string()).or_default();
				let idx = counter.fetch_add(1, Ordering::Relaxed) % candidates.len();
				candidates[idx].clone()
			}
		};

		let record = self.services.get(&chosen).expect("chosen id came from services map");
		Ok(DiscoveredService { id: record.id.clone(), config: record.config.clone() })
	}

	/// Discovers an instance and issues the request, retrying up to
	/// `opts.retries` times with `2^attempt` second backoff (spec §4.3).
	/// The final attempt's error propagates.
	pub async fn call(&self, name: &str, opts: CallOptions) -> Result<Vec<u8>> {
		let discover_opts = DiscoverOptions { require_healthy: true, ..Default::default() };
		let mut attempt = 0;
		loop {
			let target = self.discover(name, &discover_opts)?;
			match self.issue(&target, &opts).await {
				Ok(body) => {
					if let Some(record) = self.services.get(&target.id) {
						record.counters.calls.fetch_add(1, Ordering::Relaxed);
					}
					return Ok(body);
				}
				Err(err) => {
					if let Some(record) = self.services.get(&target.id) {
						record.counters.calls.fetch_add(1, Ordering::Relaxed);
						record.counters.failures.fetch_add(1, Ordering::Relaxed);
					}
					if attempt >= opts.retries {
						return Err(err);
					}
					let delay = Duration::from_secs(2u64.saturating_pow(attempt));
					tracing::warn!(service = name, attempt, error = %err, "service call failed, retrying");
					tokio::time::sleep(delay).await;
					attempt += 1;
				}
			}
		}
	}

	async fn issue(&self, target: &DiscoveredService, opts: &CallOptions) -> Result<Vec<u8>> {
		let url = format!("{}{}", target.config.base_url, opts.path);
		let mut request = self.http.request(opts.method.clone(), &url).timeout(opts.timeout);
		for (name, value) in &opts.headers {
			request = request.header(name, value);
		}
		if let Some(body) = &opts.body {
			request = request.body(body.clone());
		}
		let response = request.send().await.map_err(|e| RegistryError::CallFailed(e.to_string()))?;
		if !response.status().is_success() {
			return Err(RegistryError::CallFailed(format!("status {}", response.status())));
		}
		response.bytes().await.map(|b| b.to_vec()).map_err(|e| RegistryError::CallFailed(e.to_string()))
	}

	/// Probes every registered instance's `health_path` and updates its
	/// status, logging transitions (spec §4.3). Intended to be driven
	/// by a periodic `tokio::time::interval` in `bin/server`.
	pub async fn probe_all(&self) {
		let ids: Vec<String> = self.services.iter().map(|entry| entry.id.clone()).collect();
		for id in ids {
			self.probe_one(&id).await;
		}
	}

	async fn probe_one(&self, service_id: &str) {
		let Some(config) = self.services.get(service_id).map(|r| r.config.clone()) else {
			return;
		};
		let url = format!("{}{}", config.base_url, config.health_path);
		let probed_at = Instant::now();
		let healthy = match self.http.get(&url).timeout(HEALTH_PROBE_TIMEOUT).send().await {
			Ok(response) if response.status().is_success() => response
				.json::<serde_json::Value>()
				.await
				.map(|body| body.get("status").and_then(|v| v.as_str()) == Some("healthy"))
				.unwrap_or(false),
			_ => false,
		};
		let new_status = if healthy { HealthStatus::Healthy } else { HealthStatus::Unhealthy };

		if let Some(mut record) = self.services.get_mut(service_id) {
			if record.status != new_status {
				tracing::info!(
					service = %config.name,
					id = service_id,
					from = ?record.status,
					to = ?new_status,
					elapsed_ms = probed_at.elapsed().as_millis() as u64,
					"service health transition"
				);
			}
			record.status = new_status;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use collabflow_testing::InMemoryKv;

	fn config(name: &str) -> ServiceConfig {
		ServiceConfig {
			name: name.to_string(),
			version: "1.0.0".to_string(),
			base_url: "http://127.0.0.1:0".to_string(),
			health_path: "/health".to_string(),
		}
	}

	#[tokio::test]
	async fn discover_fails_when_no_instances_registered() {
		let registry = ServiceRegistry::new(Arc::new(InMemoryKv::new()));
		let err = registry.discover("ai-worker", &DiscoverOptions::default()).unwrap_err();
		assert!(matches!(err, RegistryError::NoAvailableService(_)));
	}

	#[tokio::test]
	async fn round_robin_cycles_through_registered_instances() {
		let registry = ServiceRegistry::new(Arc::new(InMemoryKv::new()));
		let a = registry.register(config("ai-worker")).await.unwrap();
		let b = registry.register(config("ai-worker")).await.unwrap();
		// Health is unknown until a real probe succeeds; discover without
		// require_healthy still finds them.
		let opts = DiscoverOptions { strategy: LoadBalanceStrategy::RoundRobin, ..Default::default() };
		let first = registry.discover("ai-worker", &opts).unwrap().id;
		let second = registry.discover("ai-worker", &opts).unwrap().id;
		assert_ne!(first, second);
		assert!([a.clone(), b.clone()].contains(&first));
		assert!([a, b].contains(&second));
	}

	#[tokio::test]
	async fn deregister_removes_instance_from_discovery() {
		let registry = ServiceRegistry::new(Arc::new(InMemoryKv::new()));
		let id = registry.register(config("ai-worker")).await.unwrap();
		registry.deregister(&id).await.unwrap();
		let err = registry.discover("ai-worker", &DiscoverOptions::default()).unwrap_err();
		assert!(matches!(err, RegistryError::NoAvailableService(_)));
	}
}
