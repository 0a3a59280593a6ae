// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use async_trait::async_trait;

use collabflow_core::Result;

use crate::types::AiRequest;

/// The contract an external AI worker fulfills (spec §1 "out of
/// scope... AIWorker contract", §4.9, component C9). No concrete
/// implementation ships in this repository; this trait exists so
/// in-process tests of the collaboration coordinator can substitute a
/// fake worker without a real model invocation, and so a future
/// in-process worker (as opposed to one reached purely over the event
/// bus) has a typed seam to implement.
///
/// The worker is assumed single-consumer per request — this crate
/// does not coordinate worker concurrency (spec §4.9).
#[async_trait]
pub trait AIWorker: Send + Sync {
	/// Handles one intent. A production worker normally never
	/// implements this directly — it instead subscribes to
	/// `ai:request:*` on the event bus and publishes its own response.
	/// This method exists for the in-process fakes used in tests.
	async fn handle(&self, request: AiRequest) -> Result<()>;
}
