// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::CoreError;
use collabflow_kv::KvError;

/// Errors local to quota enforcement (spec §4.5). There is no "quota
/// exceeded" variant here — that's a normal `Decision::Denied`, not a
/// failure; this only covers the counter store itself misbehaving.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
	#[error(transparent)]
	Kv(#[from] KvError),
}

impl From<RateLimitError> for CoreError {
	fn from(err: RateLimitError) -> Self {
		match err {
			RateLimitError::Kv(kv) => kv.into(),
		}
	}
}

pub type Result<T> = std::result::Result<T, RateLimitError>;
