// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A controllable clock for deterministic tests of TTL- and
/// window-dependent behavior (rate limits, cursor expiry).
#[derive(Default)]
pub struct FakeClock {
	millis: AtomicU64,
}

impl FakeClock {
	pub fn new() -> Self {
		Self { millis: AtomicU64::new(0) }
	}

	pub fn now_millis(&self) -> u64 {
		self.millis.load(Ordering::SeqCst)
	}

	pub fn advance(&self, by: Duration) {
		self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
	}
}
