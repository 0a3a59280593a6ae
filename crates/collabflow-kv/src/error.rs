// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::CoreError;

/// Errors local to the KV adapter. `Unavailable` is the only variant a
/// caller needs to special-case (spec §4.1 "fails with KV_UNAVAILABLE on
/// transport loss"); everything else collapses to a processing error.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
	#[error("kv store unavailable: {0}")]
	Unavailable(String),
	#[error("kv operation failed: {0}")]
	Other(String),
}

impl From<KvError> for CoreError {
	fn from(err: KvError) -> Self {
		match err {
			KvError::Unavailable(msg) => CoreError::kv_unavailable(msg),
			KvError::Other(msg) => CoreError::processing(msg),
		}
	}
}

impl From<redis::RedisError> for KvError {
	fn from(err: redis::RedisError) -> Self {
		if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
			KvError::Unavailable(err.to_string())
		} else {
			KvError::Other(err.to_string())
		}
	}
}

pub type Result<T> = std::result::Result<T, KvError>;
