// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::env;
use std::time::Duration;

use crate::error::CoreError;

/// Process-wide configuration, built from the environment variables named
/// in spec §6. Kept as a plain struct with explicit parsing rather than a
/// config-framework dependency, matching the teacher's avoidance of extra
/// machinery for this kind of one-shot startup plumbing.
#[derive(Clone, Debug)]
pub struct ServerConfig {
	pub kv_url: String,
	pub doc_store_url: String,
	pub token_signing_key: Vec<u8>,
	pub log_level: String,
	pub rate_max_per_hour: u64,
	pub rate_max_per_day: u64,
	pub health_probe_interval: Duration,
}

const MIN_SIGNING_KEY_LEN: usize = 32;
const DEFAULT_MAX_PER_HOUR: u64 = 1_000;
const DEFAULT_MAX_PER_DAY: u64 = 10_000;
const DEFAULT_HEALTH_PROBE_INTERVAL_MS: u64 = 30_000;

impl ServerConfig {
	/// Loads configuration from the process environment.
	///
	/// Fails with `VALIDATION_ERROR` if `TOKEN_SIGNING_KEY` is absent or
	/// shorter than 32 bytes (spec §6).
	pub fn from_env() -> crate::Result<Self> {
		let token_signing_key = env::var("TOKEN_SIGNING_KEY")
			.map_err(|_| CoreError::validation("TOKEN_SIGNING_KEY is required"))?
			.into_bytes();
		if token_signing_key.len() < MIN_SIGNING_KEY_LEN {
			return Err(CoreError::validation(format!(
				"TOKEN_SIGNING_KEY must be at least {MIN_SIGNING_KEY_LEN} bytes"
			)));
		}

		Ok(Self {
			kv_url: env::var("KV_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
			doc_store_url: env::var("DOC_STORE_URL")
				.unwrap_or_else(|_| "mongodb://127.0.0.1:27017/collabflow".into()),
			token_signing_key,
			log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
			rate_max_per_hour: parse_env_u64("RATE_MAX_PER_HOUR", DEFAULT_MAX_PER_HOUR),
			rate_max_per_day: parse_env_u64("RATE_MAX_PER_DAY", DEFAULT_MAX_PER_DAY),
			health_probe_interval: Duration::from_millis(parse_env_u64(
				"HEALTH_PROBE_INTERVAL_MS",
				DEFAULT_HEALTH_PROBE_INTERVAL_MS,
			)),
		})
	}
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
	env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_short_signing_key() {
		unsafe {
			env::set_var("TOKEN_SIGNING_KEY", "too-short");
		}
		let result = ServerConfig::from_env();
		unsafe {
			env::remove_var("TOKEN_SIGNING_KEY");
		}
		assert!(result.is_err());
	}

	#[test]
	fn accepts_valid_key_and_applies_defaults() {
		unsafe {
			env::set_var("TOKEN_SIGNING_KEY", "x".repeat(32));
			env::remove_var("RATE_MAX_PER_HOUR");
		}
		let cfg = ServerConfig::from_env().unwrap();
		unsafe {
			env::remove_var("TOKEN_SIGNING_KEY");
		}
		assert_eq!(cfg.rate_max_per_hour, DEFAULT_MAX_PER_HOUR);
		assert_eq!(cfg.health_probe_interval, Duration::from_millis(DEFAULT_HEALTH_PROBE_INTERVAL_MS));
	}
}
