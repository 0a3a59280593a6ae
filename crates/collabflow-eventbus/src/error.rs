// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::CoreError;
use collabflow_kv::KvError;

/// Errors local to the event bus (spec §4.4): either the underlying KV
/// transport failed, or a payload didn't round-trip through JSON.
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
	#[error(transparent)]
	Kv(#[from] KvError),
	#[error("event payload failed to (de)serialize: {0}")]
	Serde(#[from] serde_json::Error),
}

impl From<EventBusError> for CoreError {
	fn from(err: EventBusError) -> Self {
		match err {
			EventBusError::Kv(kv) => kv.into(),
			EventBusError::Serde(e) => CoreError::processing(e.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, EventBusError>;
