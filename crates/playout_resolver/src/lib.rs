// SPDX-License-Identifier: MIT OR Apache-2.0
//! Incremental resolving of compiled playout timelines.
//!
//! This crate keeps a resolved view of every group's compiled timeline up to
//! date while the operator edits the plan:
//! - Debounced resolve scheduling, coalesced to the earliest requested time
//! - At most one resolve pass in flight, with run-again deferral
//! - Stale in-flight results discarded after invalidation, never published
//! - Exact wakeups at the next state-change event instead of polling
//!
//! ## Architecture
//!
//! The resolver is built on:
//! - [`ResolverSession`], one per device timeline, driving a single
//!   background task
//! - [`ResolvePrimitive`], the external timeline-resolution library behind a
//!   trait seam
//! - The device-mapping table, stored here and routed downstream
//!
//! Timeline compilation itself lives in the `playout_timeline` crate.

pub mod mappings;
pub mod primitive;
pub mod session;

pub use mappings::{Mapping, Mappings};
pub use primitive::{
    LayerState, ResolveError, ResolvePrimitive, ResolvedObject, ResolvedStates, ResolvedTimeline,
    TimeInstance, TimelineState,
};
pub use session::ResolverSession;
