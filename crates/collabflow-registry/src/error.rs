// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::CoreError;

/// Errors local to service discovery and the outbound call helper
/// (spec §4.3).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	#[error("no available service for '{0}'")]
	NoAvailableService(String),
	#[error("service call failed: {0}")]
	CallFailed(String),
}

impl From<RegistryError> for CoreError {
	fn from(err: RegistryError) -> Self {
		match err {
			RegistryError::NoAvailableService(name) => {
				CoreError::service_unavailable(format!("no available service for '{name}'"))
			}
			RegistryError::CallFailed(msg) => CoreError::service_unavailable(msg),
		}
	}
}

pub type Result<T> = std::result::Result<T, RegistryError>;
