// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

mod auth;
mod error;
mod gateway;
mod protocol;
mod rooms;

pub use auth::{issue_token, verify_token, TokenClaims};
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use protocol::{ClientEvent, RosterEntry, ServerEvent};
pub use rooms::{ConnectionHandle, RoomRegistry};
