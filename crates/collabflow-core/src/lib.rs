// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Shared kernel: error taxonomy, ids, config and time primitives used by
//! every other `collabflow-*` crate.

pub use config::ServerConfig;
pub use error::{CoreError, ErrorKind};
pub use ids::{ConnectionId, FlowId, ProjectId, RequestId, UserId};
pub use tier::Tier;

pub mod config;
mod error;
mod ids;
mod tier;

pub type Result<T> = std::result::Result<T, CoreError>;
