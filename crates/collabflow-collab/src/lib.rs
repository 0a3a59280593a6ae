// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

mod coordinator;
mod error;
mod events;
mod ghost;
mod queue;
mod room;

pub use coordinator::CollabCoordinator;
pub use error::{CollabError, Result};
pub use events::CollabEvent;
pub use ghost::ghost_to_batch;
pub use queue::QueueItem;
pub use room::{CursorSnapshot, JoinResponse, RoomState, RosterMember};
