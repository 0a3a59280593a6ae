// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{KvError, Result};

/// Retries a transient `Unavailable` failure with exponential backoff,
/// `2^attempt * base` up to `max_attempts`, then surfaces the last error
/// (spec §4.1: "retried transparently with exponential backoff up to a
/// bound; then surfaced").
pub async fn with_backoff<T, F, Fut>(base: Duration, max_attempts: u32, mut op: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut attempt = 0;
	loop {
		match op().await {
			Ok(value) => return Ok(value),
			Err(KvError::Unavailable(msg)) if attempt + 1 < max_attempts => {
				let delay = base * 2u32.pow(attempt);
				warn!(attempt, ?delay, error = %msg, "kv transport loss, retrying");
				tokio::time::sleep(delay).await;
				attempt += 1;
			}
			Err(err) => return Err(err),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[tokio::test]
	async fn retries_until_success() {
		let calls = AtomicU32::new(0);
		let result: Result<u32> = with_backoff(Duration::from_millis(1), 5, || {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			async move {
				if n < 2 {
					Err(KvError::Unavailable("transport down".into()))
				} else {
					Ok(42)
				}
			}
		})
		.await;
		assert_eq!(result.unwrap(), 42);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn surfaces_after_bound() {
		let result: Result<u32> =
			with_backoff(Duration::from_millis(1), 2, || async { Err(KvError::Unavailable("down".into())) })
				.await;
		assert!(matches!(result, Err(KvError::Unavailable(_))));
	}
}
