// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::CoreError;

/// Errors local to the gateway's handshake and per-connection loop
/// (spec §4.6). Each one names the wire-level frame a failed handshake
/// or dispatch ends in.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
	#[error("authentication failed: {0}")]
	AuthFailed(String),
	#[error("connection limit exceeded")]
	ConnLimit,
	#[error("malformed client frame: {0}")]
	Malformed(String),
	#[error(transparent)]
	Core(#[from] CoreError),
}

impl From<GatewayError> for CoreError {
	fn from(err: GatewayError) -> Self {
		match err {
			GatewayError::AuthFailed(msg) => CoreError::auth_failed(msg),
			GatewayError::ConnLimit => CoreError::conn_limit("connection limit exceeded"),
			GatewayError::Malformed(msg) => CoreError::validation(msg),
			GatewayError::Core(core_err) => core_err,
		}
	}
}

pub type Result<T> = std::result::Result<T, GatewayError>;
