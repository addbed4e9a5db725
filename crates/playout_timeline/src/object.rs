// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiled timeline tree nodes.

use crate::expr::Enable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Whether a compiled node is a leaf command or a grouping wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeKind {
    /// Carries a device command
    #[default]
    Leaf,
    /// Groups child objects; its enable scopes their times
    Group,
}

/// A keyframe attached to a compiled object, overriding part of its content
/// for a sub-interval
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Keyframe {
    /// Keyframe id; unique within the compiled tree
    pub id: String,
    /// When the keyframe applies, relative to its object
    pub enable: Enable,
    /// Content overrides
    pub content: Value,
    /// Classes this keyframe responds to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

/// A node in the compiled runtime timeline tree.
///
/// Wrapper nodes produced by the compiler are `Group` kind and use `children`;
/// device commands are `Leaf` kind with an empty `children`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompiledTimelineObject {
    /// Object id; unique within one compiled tree
    pub id: String,
    /// When the object is active
    pub enable: Enable,
    /// Target layer (empty for pure grouping wrappers)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub layer: String,
    /// Device-command payload (opaque to the compiler)
    pub content: Value,
    /// Classes other objects can reference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Keyframes overriding content for sub-intervals
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyframes: Vec<Keyframe>,
    /// Leaf or grouping wrapper
    pub kind: NodeKind,
    /// Child objects (empty for leaves)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CompiledTimelineObject>,
}

impl CompiledTimelineObject {
    /// Create a grouping wrapper
    pub fn group(id: impl Into<String>, enable: Enable) -> Self {
        Self {
            id: id.into(),
            enable,
            kind: NodeKind::Group,
            content: Value::Object(serde_json::Map::new()),
            ..Self::default()
        }
    }

    /// Create a leaf command object
    pub fn leaf(id: impl Into<String>, enable: Enable, layer: impl Into<String>, content: Value) -> Self {
        Self {
            id: id.into(),
            enable,
            layer: layer.into(),
            content,
            kind: NodeKind::Leaf,
            ..Self::default()
        }
    }

    /// Is this a grouping wrapper?
    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// Shift this node's own numeric `start`/`end` by `delta` milliseconds.
    ///
    /// Deliberately not recursive: children are timed relative to their
    /// parent, so moving a node's window moves the whole subtree with it.
    pub fn shift_window(&mut self, delta: i64) {
        if let Some(start) = &mut self.enable.start {
            start.shift(delta);
        }
        if let Some(end) = &mut self.enable.end {
            end.shift(delta);
        }
    }

    /// Collect every id in this subtree, including keyframe ids
    pub fn collect_ids(&self, out: &mut Vec<String>) {
        out.push(self.id.clone());
        for keyframe in &self.keyframes {
            out.push(keyframe.id.clone());
        }
        for child in &self.children {
            child.collect_ids(out);
        }
    }

    /// Check that every id in this subtree is unique
    pub fn ids_are_unique(&self) -> bool {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        let unique: HashSet<&str> = ids.iter().map(String::as_str).collect();
        unique.len() == ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    #[test]
    fn test_shift_window_leaves_children_alone() {
        let mut root = CompiledTimelineObject::group("root", Enable::span(1000i64, Some(3000)));
        root.children.push(CompiledTimelineObject::group(
            "child",
            Enable::span(500i64, None),
        ));

        root.shift_window(-1000);

        assert_eq!(root.enable.start, Some(Expr::Number(0)));
        assert_eq!(root.enable.end, Some(Expr::Number(2000)));
        // Parent-relative child times are untouched
        assert_eq!(root.children[0].enable.start, Some(Expr::Number(500)));
    }

    #[test]
    fn test_collect_ids_includes_keyframes() {
        let mut leaf = CompiledTimelineObject::leaf("a", Enable::default(), "l1", Value::Null);
        leaf.keyframes.push(Keyframe {
            id: "a_kf".to_string(),
            ..Keyframe::default()
        });
        let mut root = CompiledTimelineObject::group("root", Enable::default());
        root.children.push(leaf);

        let mut ids = Vec::new();
        root.collect_ids(&mut ids);
        assert_eq!(ids, vec!["root", "a", "a_kf"]);
        assert!(root.ids_are_unique());
    }
}
