// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Typed publish/subscribe over the KV store adapter (spec §4.4,
//! component C4). The gateway, flow manager, collaboration coordinator
//! and AI worker all talk to each other exclusively through this bus —
//! none of them hold a direct reference to another component's inbox.

pub use bus::{Delivery, EventBus, Subscription};
pub use error::{EventBusError, Result};

mod bus;
mod error;
pub mod topics;
