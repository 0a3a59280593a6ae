// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::CoreError;

/// Errors local to the flow document model and its storage boundary
/// (spec §4.7). `Validation` names the first offending transaction or
/// invariant, per spec "the error names the first offending
/// transaction or invariant".
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
	#[error("flow not found: {0}")]
	NotFound(String),
	#[error("{0}")]
	Validation(String),
	#[error("concurrent write conflict on flow {0}, retry")]
	VersionConflict(String),
	#[error("document store unavailable: {0}")]
	StoreUnavailable(String),
}

impl From<FlowError> for CoreError {
	fn from(err: FlowError) -> Self {
		match err {
			FlowError::NotFound(msg) => CoreError::not_found(msg),
			FlowError::Validation(msg) => CoreError::validation(msg),
			FlowError::VersionConflict(msg) => CoreError::service_unavailable(msg),
			FlowError::StoreUnavailable(msg) => CoreError::service_unavailable(msg),
		}
	}
}

pub type Result<T> = std::result::Result<T, FlowError>;
