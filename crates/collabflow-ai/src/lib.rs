// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(not(debug_assertions), deny(warnings))]

//! The `AIWorker` contract (spec §4.9, component C9): event types
//! exchanged with an external AI pipeline plus a trait seam for
//! in-process fakes. The model invocation itself is out of scope
//! (spec §1) — nothing here calls out to an actual model.

pub use types::{AiIntent, AiRequest, AiResponse, GhostProposal};
pub use worker::AIWorker;

mod types;
mod worker;
