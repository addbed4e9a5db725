// SPDX-License-Identifier: MIT OR Apache-2.0
//! Authoring-time playback plan: groups, parts and prepared schedules.
//!
//! These types are produced upstream by the plan editor. The compiler treats
//! them as read-only input; canonical parts are shared via `Arc` and never
//! mutated during compilation.

use crate::expr::Enable;
use crate::object::Keyframe;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// An authoring-time leaf on a part's own timeline, carrying one device
/// command
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineLeaf {
    /// Leaf id, unique within its part
    pub id: String,
    /// When the command is active, relative to the part
    pub enable: Enable,
    /// Target layer
    pub layer: String,
    /// Device-command payload
    pub content: Value,
    /// Classes other objects can reference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Keyframes overriding content for sub-intervals
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyframes: Vec<Keyframe>,
}

/// A canonical part: one playable item of the plan
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Part {
    /// Part id, unique within the plan
    pub id: String,
    /// Display name
    pub name: String,
    /// The part's own timeline leaves
    pub timeline: Vec<TimelineLeaf>,
    /// Whether the part's content loops while it plays
    pub looping: bool,
    /// Resolved duration in milliseconds (`None` = infinite)
    pub duration: Option<u64>,
}

/// A group of parts, played one-at-a-time or concurrently
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    /// Group id, unique within the plan
    pub id: String,
    /// Display name
    pub name: String,
    /// Sequential playlist mode; when false, parts play independently
    pub one_at_a_time: bool,
}

/// One scheduled occurrence of a canonical part inside a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayingPart {
    /// Absolute start time in milliseconds
    pub start_time: u64,
    /// Play duration (`None` = infinite)
    pub duration: Option<u64>,
    /// The canonical part (shared, never mutated)
    pub part: Arc<Part>,
}

impl PlayingPart {
    /// Absolute end time, `None` when the part plays forever
    pub fn end_time(&self) -> Option<u64> {
        self.duration.map(|d| self.start_time + d)
    }
}

/// A contiguous span of the prepared schedule
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    /// Absolute start time in milliseconds
    pub start_time: u64,
    /// Absolute end time (`None` = open-ended)
    pub end_time: Option<u64>,
    /// Duration of one iteration (`None` = unbounded)
    pub duration: Option<u64>,
    /// Whether the section's content loops for as long as the section exists
    pub repeating: bool,
    /// When set, playback is frozen at this absolute time
    pub pause_time: Option<u64>,
    /// Parts playing within this section, in play order
    pub parts: Vec<PlayingPart>,
}

/// The precomputed "what plays when" structure for one group.
///
/// `Single` is used for one-at-a-time groups: one ordered run of sections,
/// where a trailing looping block is expressed as sections flagged
/// `repeating`. `Multi` is used when parts play concurrently, each with its
/// own independent section instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PreparedSchedule {
    /// Sequential playback of one run of sections
    Single {
        /// Sections in play order
        sections: Vec<Section>,
    },
    /// Concurrent playback, one section run per part id
    Multi {
        /// Section instances per part id, in part order
        parts: IndexMap<String, Vec<Section>>,
    },
}
