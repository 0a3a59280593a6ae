// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Authoritative flow document model, transactional mutation, and
//! version history (spec §3, §4.7, component C7). Nothing outside this
//! crate mutates a [`FlowDocument`] directly — every change goes
//! through [`FlowManager::update_flow`] so invariants I1-I6 and the
//! version-increment rule (I5) are enforced in one place.

pub use apply::apply_batch;
pub use document_store::{DocumentStore, InMemoryDocumentStore};
pub use error::{FlowError, Result};
pub use manager::{CreateFlowOptions, FlowManager, FlowUpdateEvent, GetFlowFilters};
pub use model::{
	Branch, Edge, FlowDocument, FlowMetadata, FlowStatus, FrameView, Node, NodeType, Position, Size, Version,
};
pub use template::Template;
pub use transaction::{MutationBatch, Transaction};
pub use validate::validate_invariants;

mod apply;
mod document_store;
mod error;
mod manager;
mod model;
mod template;
mod transaction;
mod validate;
