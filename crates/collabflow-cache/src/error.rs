// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::CoreError;

/// Cache-specific failures that callers need to distinguish from a
/// plain miss. Most failure modes (transport loss, bad payload) are
/// swallowed by [`crate::CacheManager`] itself per spec §4.2 — this
/// enum only covers the configuration-time mistakes that should abort
/// startup rather than degrade silently.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
	#[error("invalid cache key prefix: {0}")]
	InvalidPrefix(String),
}

impl From<CacheError> for CoreError {
	fn from(err: CacheError) -> Self {
		match err {
			CacheError::InvalidPrefix(msg) => CoreError::validation(msg),
		}
	}
}

pub type Result<T> = std::result::Result<T, CacheError>;
