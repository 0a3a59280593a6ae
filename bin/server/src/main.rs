// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use collabflow_cache::CacheManager;
use collabflow_collab::CollabCoordinator;
use collabflow_core::ServerConfig;
use collabflow_eventbus::EventBus;
use collabflow_flow::{FlowManager, InMemoryDocumentStore};
use collabflow_gateway::Gateway;
use collabflow_kv::RedisKv;
use collabflow_ratelimit::RateLimiter;
use collabflow_registry::ServiceRegistry;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const CACHE_KEY_PREFIX: &str = "collabflow";

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let config = ServerConfig::from_env()?;
	init_tracing(&config.log_level);

	let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
	rt.block_on(run(config))
}

/// Loads config, wires every component together the way spec §2's
/// control-flow summary describes, and serves forever. No other
/// function in this binary installs a tracing subscriber (A1).
async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
	let kv = Arc::new(RedisKv::connect(&config.kv_url).await?) as Arc<dyn collabflow_kv::KvStore>;

	let cache = Arc::new(CacheManager::new(kv.clone(), CACHE_KEY_PREFIX));
	let bus = Arc::new(EventBus::new(kv.clone()));
	let rate_limiter = Arc::new(RateLimiter::new(kv.clone(), config.rate_max_per_hour, config.rate_max_per_day));
	let registry = Arc::new(ServiceRegistry::new(kv.clone()));

	// The document store is an external persistence engine per spec §1;
	// this process owns only the in-memory cache-coherent façade over it.
	let document_store = InMemoryDocumentStore::shared();
	let flow_manager = Arc::new(FlowManager::new(document_store, cache.clone(), bus.clone()));
	let collab = Arc::new(CollabCoordinator::new(kv.clone(), bus.clone(), flow_manager.clone()));

	spawn_health_monitor(registry.clone(), config.health_probe_interval);

	let gateway = Gateway::new(config.token_signing_key.clone(), rate_limiter, collab, bus);
	let listener = TcpListener::bind(DEFAULT_BIND_ADDR).await?;
	info!(addr = DEFAULT_BIND_ADDR, "collabflow gateway listening");
	gateway.serve(listener).await;

	Ok(())
}

/// Periodic health probing (spec §4.3 "every `intervalMs`, probes each
/// service's `healthPath`"). Runs for the lifetime of the process; a
/// probe failure is logged by the registry itself and never aborts the
/// loop.
fn spawn_health_monitor(registry: Arc<ServiceRegistry>, interval: std::time::Duration) {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);
		loop {
			ticker.tick().await;
			registry.probe_all().await;
		}
	});
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
		error!("tracing subscriber already initialized");
	}
}
