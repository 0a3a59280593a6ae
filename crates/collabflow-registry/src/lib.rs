// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Health-driven service registry and discovery (spec §4.3, component
//! C3). Services announce themselves once; callers that need to reach
//! them go through [`ServiceRegistry::discover`] or [`ServiceRegistry::call`]
//! rather than holding a fixed address.

pub use error::{RegistryError, Result};
pub use registry::{DiscoveredService, ServiceRegistry};
pub use types::{CallOptions, DiscoverOptions, HealthStatus, LoadBalanceStrategy, ServiceConfig};

mod error;
mod registry;
mod types;
