// SPDX-License-Identifier: MIT OR Apache-2.0
//! The external resolve primitive and the shapes exchanged with it.
//!
//! The resolution algorithm itself (evaluating time expressions into absolute
//! instances) is not implemented here; it is reached through the
//! [`ResolvePrimitive`] trait. This module only fixes the calling discipline
//! and the data shapes the session stores and republishes.

use playout_timeline::CompiledTimelineObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error raised by the resolve primitive.
///
/// The session catches these at the boundary, keeps the last published
/// snapshot and schedules a retry; they never propagate out of the resolve
/// loop.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// An enable expression could not be evaluated
    #[error("expression could not be evaluated: {0}")]
    Expression(String),

    /// Objects reference each other in a cycle
    #[error("circular reference involving object {0}")]
    CircularReference(String),

    /// Any other primitive failure
    #[error("{0}")]
    Other(String),
}

/// One absolute occurrence of an object on the resolved timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInstance {
    /// Absolute start in milliseconds
    pub start: u64,
    /// Absolute end (`None` = open-ended)
    pub end: Option<u64>,
}

/// A flattened object with its resolved time instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedObject {
    /// Object id
    pub id: String,
    /// Target layer
    pub layer: String,
    /// Absolute occurrences within the resolve horizon
    pub instances: Vec<TimeInstance>,
    /// Device-command payload
    pub content: Value,
}

/// Output of the first resolve stage: expressions evaluated into absolute
/// instances over a bounded horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTimeline {
    /// Resolved objects, flattened
    pub objects: Vec<ResolvedObject>,
    /// The time the resolve was anchored at
    pub resolve_time: u64,
}

/// Output of the second resolve stage: per-layer states precomputed over the
/// horizon, plus the event times at which the state changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStates {
    /// The resolved timeline the states were derived from
    pub timeline: ResolvedTimeline,
    /// Times at which some layer's state changes; not necessarily sorted,
    /// [`next_event_after`](Self::next_event_after) scans the whole list
    pub event_times: Vec<u64>,
}

impl ResolvedStates {
    /// The next state-change event strictly after `time`, if any
    pub fn next_event_after(&self, time: u64) -> Option<u64> {
        self.event_times.iter().copied().filter(|t| *t > time).min()
    }
}

/// What one layer is playing at a single instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    /// The active object's id
    pub object_id: String,
    /// The active object's content
    pub content: Value,
}

/// The full instant state: every active layer at one point in time
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineState {
    /// The instant the state describes
    pub time: u64,
    /// Active object per layer
    pub layers: indexmap::IndexMap<String, LayerState>,
}

/// The external timeline-resolution library.
///
/// Implementations must be pure with respect to the session: all mutable
/// working memory goes through the `Cache`, which the session owns and
/// threads through consecutive calls.
pub trait ResolvePrimitive: Send + Sync + 'static {
    /// Reusable working memory between resolve calls
    type Cache: Default + Send;

    /// Evaluate every enable expression into absolute instances, bounded by
    /// `limit_time`
    fn resolve_timeline(
        &self,
        objects: &[CompiledTimelineObject],
        time: u64,
        limit_time: u64,
        cache: &mut Self::Cache,
    ) -> Result<ResolvedTimeline, ResolveError>;

    /// Precompute per-layer states over the resolved horizon
    fn resolve_all_states(
        &self,
        resolved: &ResolvedTimeline,
        cache: &mut Self::Cache,
    ) -> Result<ResolvedStates, ResolveError>;

    /// Derive the instant state at `time` from precomputed states.
    /// Infallible by contract: a time outside the horizon yields an empty
    /// state.
    fn state_at(&self, states: &ResolvedStates, time: u64) -> TimelineState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_event_after_is_strict() {
        let states = ResolvedStates {
            timeline: ResolvedTimeline {
                objects: Vec::new(),
                resolve_time: 0,
            },
            event_times: vec![500, 100, 1000],
        };
        assert_eq!(states.next_event_after(0), Some(100));
        assert_eq!(states.next_event_after(100), Some(500));
        assert_eq!(states.next_event_after(1000), None);
    }
}
