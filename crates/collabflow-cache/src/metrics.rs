// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Running counters and average response time for the cache manager
/// (spec §4.2). Cheap enough to snapshot on every request.
#[derive(Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	misses: AtomicU64,
	sets: AtomicU64,
	deletes: AtomicU64,
	invalidations: AtomicU64,
	errors: AtomicU64,
	response_time_total_nanos: AtomicU64,
	response_time_samples: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CacheMetricsSnapshot {
	pub hits: u64,
	pub misses: u64,
	pub sets: u64,
	pub deletes: u64,
	pub invalidations: u64,
	pub errors: u64,
	pub avg_response_time: Duration,
}

impl CacheMetrics {
	pub fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_miss(&self) {
		self.misses.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_set(&self) {
		self.sets.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_delete(&self, count: u64) {
		self.deletes.fetch_add(count, Ordering::Relaxed);
	}

	pub fn record_invalidation(&self) {
		self.invalidations.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_error(&self) {
		self.errors.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_response_time(&self, elapsed: Duration) {
		self.response_time_total_nanos.fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
		self.response_time_samples.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> CacheMetricsSnapshot {
		let samples = self.response_time_samples.load(Ordering::Relaxed);
		let avg = if samples == 0 {
			Duration::ZERO
		} else {
			Duration::from_nanos(self.response_time_total_nanos.load(Ordering::Relaxed) / samples)
		};
		CacheMetricsSnapshot {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
			sets: self.sets.load(Ordering::Relaxed),
			deletes: self.deletes.load(Ordering::Relaxed),
			invalidations: self.invalidations.load(Ordering::Relaxed),
			errors: self.errors.load(Ordering::Relaxed),
			avg_response_time: avg,
		}
	}
}
