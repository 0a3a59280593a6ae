// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::fmt;

/// The closed error taxonomy a client may observe (spec §7). Every
/// component-local error eventually maps into one of these before it
/// crosses the gateway boundary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
	AuthFailed,
	ConnLimit,
	RateLimit,
	ValidationError,
	NotFound,
	NotInProject,
	SizeLimit,
	KvUnavailable,
	ServiceUnavailable,
	ProcessingError,
}

impl ErrorKind {
	/// The wire tag sent in `error { type, message }` frames (spec §6).
	pub fn as_wire_tag(self) -> &'static str {
		match self {
			ErrorKind::AuthFailed => "AUTH_FAILED",
			ErrorKind::ConnLimit => "CONN_LIMIT",
			ErrorKind::RateLimit => "RATE_LIMIT",
			ErrorKind::ValidationError => "VALIDATION_ERROR",
			ErrorKind::NotFound => "NOT_FOUND",
			ErrorKind::NotInProject => "NOT_IN_PROJECT",
			ErrorKind::SizeLimit => "SIZE_LIMIT",
			ErrorKind::KvUnavailable => "KV_UNAVAILABLE",
			ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
			ErrorKind::ProcessingError => "PROCESSING_ERROR",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_wire_tag())
	}
}

/// A taxonomy-tagged error carrying an operator-facing message. Never
/// carries stack traces or internal details that would leak to a client
/// (spec §7 "no stack traces or server internals leak").
#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CoreError {
	pub kind: ErrorKind,
	pub message: String,
}

impl CoreError {
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into() }
	}

	pub fn auth_failed(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::AuthFailed, message)
	}

	pub fn conn_limit(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ConnLimit, message)
	}

	pub fn rate_limit(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::RateLimit, message)
	}

	pub fn validation(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ValidationError, message)
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::NotFound, message)
	}

	pub fn not_in_project(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::NotInProject, message)
	}

	pub fn size_limit(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::SizeLimit, message)
	}

	pub fn kv_unavailable(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::KvUnavailable, message)
	}

	pub fn service_unavailable(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ServiceUnavailable, message)
	}

	pub fn processing(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ProcessingError, message)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_tags_match_spec_taxonomy() {
		assert_eq!(ErrorKind::AuthFailed.as_wire_tag(), "AUTH_FAILED");
		assert_eq!(ErrorKind::NotInProject.as_wire_tag(), "NOT_IN_PROJECT");
		assert_eq!(ErrorKind::ServiceUnavailable.as_wire_tag(), "SERVICE_UNAVAILABLE");
	}

	#[test]
	fn display_never_leaks_more_than_kind_and_message() {
		let err = CoreError::validation("missing target node 'ghost'");
		assert_eq!(err.to_string(), "VALIDATION_ERROR: missing target node 'ghost'");
	}
}
