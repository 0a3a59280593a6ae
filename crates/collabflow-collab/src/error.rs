// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_core::CoreError;
use collabflow_flow::FlowError;

/// Errors local to the collaboration coordinator (spec §4.8). Most of
/// these flatten directly into the shared taxonomy; this enum exists
/// so call sites keep `?`-propagation ergonomics before that flattening.
#[derive(Debug, thiserror::Error)]
pub enum CollabError {
	#[error("not a member of project")]
	NotInProject,
	#[error("image payload exceeds size limit")]
	SizeLimit,
	#[error(transparent)]
	Flow(#[from] FlowError),
	#[error("collaboration coordinator unavailable: {0}")]
	Unavailable(String),
	/// A mutation already mapped to the closed taxonomy by the drain
	/// task (e.g. a validation failure surfaced through
	/// [`CoreError`]); carried through rather than re-flattened so the
	/// original [`ErrorKind`](collabflow_core::ErrorKind) survives.
	#[error(transparent)]
	Core(#[from] CoreError),
}

impl From<CollabError> for CoreError {
	fn from(err: CollabError) -> Self {
		match err {
			CollabError::NotInProject => CoreError::not_in_project("not a member of this project"),
			CollabError::SizeLimit => CoreError::size_limit("image payload exceeds 10 MiB"),
			CollabError::Flow(flow_err) => flow_err.into(),
			CollabError::Unavailable(msg) => CoreError::service_unavailable(msg),
			CollabError::Core(core_err) => core_err,
		}
	}
}

pub type Result<T> = std::result::Result<T, CollabError>;
