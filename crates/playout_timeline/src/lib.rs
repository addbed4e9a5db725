// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback-plan compilation for live playout.
//!
//! This crate turns a group's prepared playback schedule into a runtime
//! timeline tree ready for device-control resolution:
//! - Section and part wrappers with decoupled visibility and repeat behavior
//! - Pause freezing (mid-playback holds)
//! - One-at-a-time and concurrent group modes
//! - Globally-unique ids with reference-consistent renaming
//!
//! ## Architecture
//!
//! The compiler is built on:
//! - A tagged-variant tree node ([`CompiledTimelineObject`]) with a uniform
//!   `children` field
//! - Time expressions ([`Expr`]) that are numbers, reference text, or binary
//!   trees
//! - A two-pass id rewriter ([`rewrite_ids`]) scoped to one compilation call
//!
//! Compilation is synchronous, pure and total; incremental resolving lives in
//! the `playout_resolver` crate.

pub mod compile;
pub mod expr;
pub mod object;
pub mod plan;
pub mod rewrite;

pub use compile::{compile_group, CompileOptions, LeafAdjust, NoAdjust, PartContent};
pub use expr::{BinaryExpr, Enable, Expr, Operator};
pub use object::{CompiledTimelineObject, Keyframe, NodeKind};
pub use plan::{Group, Part, PlayingPart, PreparedSchedule, Section, TimelineLeaf};
pub use rewrite::rewrite_ids;
