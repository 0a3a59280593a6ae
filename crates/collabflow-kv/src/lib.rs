// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Typed KV store adapter (spec §4.1, component C1). Values are byte
//! strings; this crate is format-agnostic — callers (the cache manager,
//! the event bus, the rate limiter) own serialization.

pub use error::{KvError, Result};
pub use redis_store::RedisKv;
pub use store::{KvMessage, KvStore, KvSubscription};

mod error;
mod redis_store;
pub mod retry;
mod store;
