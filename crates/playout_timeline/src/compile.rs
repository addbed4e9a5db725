// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiles a group's prepared schedule into a runtime timeline tree.
//!
//! The compiler is pure and total: it never panics on empty sections, parts
//! without leaves, zero or infinite durations, or a pause landing exactly on
//! a part boundary. A group that is not scheduled to play compiles to `None`.
//!
//! Two wrapper nodes are emitted per section: an outer node carrying the
//! section's absolute visibility window, and an inner content node carrying
//! the repeat/duration/pause behavior. Splitting the two keeps "when the
//! section exists" independent from "how its content loops".

use crate::expr::{Enable, Expr};
use crate::object::{CompiledTimelineObject, NodeKind};
use crate::plan::{Group, PlayingPart, PreparedSchedule, Section, TimelineLeaf};
use crate::rewrite::rewrite_ids;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Per-instance adjustment of a part's timeline leaf.
///
/// Called once per emitted copy of a leaf, always on a deep clone; the
/// canonical part's own timeline is never touched. `original` is the
/// authoring leaf the clone was made from.
pub trait LeafAdjust {
    /// Adjust one cloned leaf for this specific playback instance
    fn adjust(
        &self,
        leaf: &mut CompiledTimelineObject,
        playing: &PlayingPart,
        original: &TimelineLeaf,
        pause_time: Option<u64>,
    );
}

/// Leaf adjustment that leaves every clone as authored
pub struct NoAdjust;

impl LeafAdjust for NoAdjust {
    fn adjust(
        &self,
        _leaf: &mut CompiledTimelineObject,
        _playing: &PlayingPart,
        _original: &TimelineLeaf,
        _pause_time: Option<u64>,
    ) {
    }
}

/// Strategy replacing a part's own leaves with caller-produced content.
///
/// Extension point for alternate playback modes; when present the part's
/// authored timeline is ignored.
pub trait PartContent {
    /// Produce the leaves for one playing-part instance
    fn leaves(&self, playing: &PlayingPart, pause_time: Option<u64>) -> Vec<CompiledTimelineObject>;
}

/// Collaborators used while compiling one group
pub struct CompileOptions<'a> {
    /// Per-instance leaf adjustment
    pub adjust: &'a dyn LeafAdjust,
    /// Optional replacement strategy for part content
    pub part_content: Option<&'a dyn PartContent>,
}

impl CompileOptions<'static> {
    /// Options with no adjustment and no content override
    pub fn new() -> Self {
        Self {
            adjust: &NoAdjust,
            part_content: None,
        }
    }
}

impl Default for CompileOptions<'static> {
    fn default() -> Self {
        Self::new()
    }
}

/// Id uniqueness scope for one compilation call.
///
/// Explicitly threaded through the recursion; there is no ambient counter, so
/// compiling the same inputs twice yields structurally identical trees.
struct IdScope {
    used: HashSet<String>,
    next_instance: u64,
}

impl IdScope {
    fn new() -> Self {
        Self {
            used: HashSet::new(),
            next_instance: 0,
        }
    }

    /// Reserve an id generated by the compiler itself
    fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// Make `node`'s subtree collision-free against everything emitted so
    /// far, renaming the whole subtree when any of its ids is already taken
    fn claim(&mut self, node: &mut CompiledTimelineObject) {
        let mut ids = Vec::new();
        node.collect_ids(&mut ids);

        if ids.iter().any(|id| self.used.contains(id)) {
            loop {
                self.next_instance += 1;
                let n = self.next_instance;
                let free = ids.iter().all(|id| !self.used.contains(&format!("{id}_{n}")));
                if free {
                    rewrite_ids(node, |old| format!("{old}_{n}"));
                    break;
                }
            }
            ids.clear();
            node.collect_ids(&mut ids);
        }
        self.used.extend(ids);
    }
}

/// Compile a group's prepared schedule into its runtime timeline.
///
/// Returns `None` when the group is not scheduled to play (`schedule` is
/// `None`) or when nothing playable remains after pruning; neither case is an
/// error.
pub fn compile_group(
    group: &Group,
    schedule: Option<&PreparedSchedule>,
    opts: &CompileOptions,
) -> Option<Vec<CompiledTimelineObject>> {
    let schedule = schedule?;
    let mut scope = IdScope::new();

    let root = match schedule {
        PreparedSchedule::Single { sections } => compile_single(group, sections, opts, &mut scope)?,
        PreparedSchedule::Multi { parts } => compile_multi(group, parts, opts, &mut scope)?,
    };
    Some(vec![root])
}

/// One-at-a-time playback: one root wrapper spanning every section, children
/// shifted relative to the earliest section start
fn compile_single(
    group: &Group,
    sections: &[Section],
    opts: &CompileOptions,
    scope: &mut IdScope,
) -> Option<CompiledTimelineObject> {
    let root_start = sections.iter().map(|s| s.start_time).min()?;
    // Bounded only when every section is bounded
    let root_end = sections
        .iter()
        .try_fold(0u64, |acc, s| s.end_time.map(|end| acc.max(end)));

    let root_id = format!("group_{}", group.id);
    scope.reserve(&root_id);
    let mut root =
        CompiledTimelineObject::group(root_id, Enable::span(root_start, root_end.map(|e| e as i64)));

    for (index, section) in sections.iter().enumerate() {
        if let Some(node) = compile_section(group, section, &index.to_string(), opts, scope) {
            root.children.push(node);
        }
    }
    if root.children.is_empty() {
        return None;
    }

    // Only the outer section wrappers carry absolute times; everything below
    // them is already parent-relative, so shift each wrapper's own window
    for child in &mut root.children {
        child.shift_window(-(root_start as i64));
    }
    Some(root)
}

/// Concurrent playback: one sub-wrapper per part id, each holding that part's
/// own section instances, pruned when empty
fn compile_multi(
    group: &Group,
    parts: &IndexMap<String, Vec<Section>>,
    opts: &CompileOptions,
    scope: &mut IdScope,
) -> Option<CompiledTimelineObject> {
    let root_id = format!("group_{}", group.id);
    scope.reserve(&root_id);
    let mut root = CompiledTimelineObject::group(root_id, Enable::starting_at(0i64));

    for (part_id, sections) in parts {
        let sub_id = format!("group_{}_part_{part_id}", group.id);
        scope.reserve(&sub_id);
        let mut sub = CompiledTimelineObject::group(sub_id, Enable::starting_at(0i64));

        for (index, section) in sections.iter().enumerate() {
            if let Some(node) =
                compile_section(group, section, &format!("{part_id}_{index}"), opts, scope)
            {
                sub.children.push(node);
            }
        }
        if !sub.children.is_empty() {
            root.children.push(sub);
        }
    }

    if root.children.is_empty() {
        None
    } else {
        Some(root)
    }
}

fn compile_section(
    group: &Group,
    section: &Section,
    label: &str,
    opts: &CompileOptions,
    scope: &mut IdScope,
) -> Option<CompiledTimelineObject> {
    let outer_id = format!("group_{}_section_{label}", group.id);
    let content_id = format!("{outer_id}_content");
    scope.reserve(&outer_id);
    scope.reserve(&content_id);

    let mut content = CompiledTimelineObject::group(content_id, content_enable(section));
    for playing in &section.parts {
        if !include_playing_part(section, playing) {
            continue;
        }
        if let Some(node) = compile_part_instance(section, playing, opts, scope) {
            content.children.push(node);
        }
    }
    // Empty sections are not emitted at all
    if content.children.is_empty() {
        return None;
    }

    let mut outer = CompiledTimelineObject::group(
        outer_id,
        Enable::span(section.start_time, section.end_time.map(|e| e as i64)),
    );
    outer.children.push(content);
    Some(outer)
}

/// The content node's enable: how the section's content loops, decoupled from
/// the outer visibility window
fn content_enable(section: &Section) -> Enable {
    let paused = section.pause_time.is_some();
    let duration = if paused {
        None
    } else if section.repeating {
        section.duration
    } else if let Some(end) = section.end_time {
        Some(end.saturating_sub(section.start_time))
    } else {
        None
    };
    let repeating = if !paused && section.repeating {
        section.duration
    } else {
        None
    };

    Enable {
        start: Some(Expr::Number(0)),
        duration: duration.map(Expr::from),
        repeating: repeating.map(Expr::from),
        ..Enable::default()
    }
}

/// A paused section emits only the part whose interval straddles the pause
/// point; an unbounded part straddles every pause at or after its start
fn include_playing_part(section: &Section, playing: &PlayingPart) -> bool {
    match section.pause_time {
        Some(pause) => {
            playing.start_time <= pause && playing.end_time().map_or(true, |end| pause < end)
        }
        None => true,
    }
}

fn compile_part_instance(
    section: &Section,
    playing: &PlayingPart,
    opts: &CompileOptions,
    scope: &mut IdScope,
) -> Option<CompiledTimelineObject> {
    let pause_time = section.pause_time;
    let part = playing.part.as_ref();

    let children: Vec<CompiledTimelineObject> = match opts.part_content {
        Some(strategy) => strategy.leaves(playing, pause_time),
        None => part
            .timeline
            .iter()
            .map(|leaf| {
                // Deep clone; the canonical part stays untouched
                let mut obj = CompiledTimelineObject {
                    id: leaf.id.clone(),
                    enable: leaf.enable.clone(),
                    layer: leaf.layer.clone(),
                    content: leaf.content.clone(),
                    classes: leaf.classes.clone(),
                    keyframes: leaf.keyframes.clone(),
                    kind: NodeKind::Leaf,
                    children: Vec::new(),
                };
                opts.adjust.adjust(&mut obj, playing, leaf, pause_time);
                obj
            })
            .collect(),
    };
    if children.is_empty() {
        return None;
    }

    let enable = if pause_time.is_some() {
        // Frozen at the pause point: neither duration nor repeating
        Enable::starting_at(0i64)
    } else {
        Enable {
            start: Some(Expr::Number(
                playing.start_time as i64 - section.start_time as i64,
            )),
            duration: playing.duration.map(Expr::from),
            repeating: if part.looping {
                part.duration.map(Expr::from)
            } else {
                None
            },
            ..Enable::default()
        }
    };

    let mut wrapper = CompiledTimelineObject::group(format!("part_{}", part.id), enable);
    wrapper.children = children;
    // A part emitted more than once gets its whole subtree renamed so ids
    // stay unique across the compilation
    scope.claim(&mut wrapper);
    Some(wrapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Part;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn clip_part(id: &str, length: u64) -> Arc<Part> {
        Arc::new(Part {
            id: id.to_string(),
            name: id.to_string(),
            timeline: vec![TimelineLeaf {
                id: format!("{id}_video"),
                enable: Enable::span(0i64, Some(length as i64)),
                layer: "l_video".to_string(),
                content: json!({ "file": format!("{id}.mov") }),
                classes: Vec::new(),
                keyframes: Vec::new(),
            }],
            looping: false,
            duration: Some(length),
        })
    }

    fn playing(part: &Arc<Part>, start: u64, duration: Option<u64>) -> PlayingPart {
        PlayingPart {
            start_time: start,
            duration,
            part: Arc::clone(part),
        }
    }

    fn group() -> Group {
        Group {
            id: "g1".to_string(),
            name: "Group 1".to_string(),
            one_at_a_time: true,
        }
    }

    fn worked_example() -> PreparedSchedule {
        let a = clip_part("a", 1000);
        let b = clip_part("b", 500);
        PreparedSchedule::Single {
            sections: vec![
                Section {
                    start_time: 0,
                    end_time: Some(1000),
                    duration: Some(1000),
                    repeating: false,
                    pause_time: None,
                    parts: vec![playing(&a, 0, Some(1000))],
                },
                Section {
                    start_time: 1000,
                    end_time: None,
                    duration: Some(500),
                    repeating: true,
                    pause_time: None,
                    parts: vec![playing(&b, 1000, Some(500))],
                },
            ],
        }
    }

    #[test]
    fn test_no_schedule_compiles_to_none() {
        assert!(compile_group(&group(), None, &CompileOptions::new()).is_none());
    }

    #[test]
    fn test_empty_sections_compile_to_none() {
        let schedule = PreparedSchedule::Single {
            sections: Vec::new(),
        };
        assert!(compile_group(&group(), Some(&schedule), &CompileOptions::new()).is_none());
    }

    #[test]
    fn test_worked_example() {
        let schedule = worked_example();
        let objects = compile_group(&group(), Some(&schedule), &CompileOptions::new()).unwrap();

        assert_eq!(objects.len(), 1);
        let root = &objects[0];
        assert_eq!(root.enable.start, Some(Expr::Number(0)));
        // Section B is open-ended, so the root is too
        assert!(root.enable.end.is_none());
        assert_eq!(root.children.len(), 2);

        let section_b = &root.children[1];
        assert_eq!(section_b.enable.start, Some(Expr::Number(1000)));
        let content_b = &section_b.children[0];
        assert_eq!(content_b.enable.duration, Some(Expr::Number(500)));
        assert_eq!(content_b.enable.repeating, Some(Expr::Number(500)));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let schedule = worked_example();
        let first = compile_group(&group(), Some(&schedule), &CompileOptions::new());
        let second = compile_group(&group(), Some(&schedule), &CompileOptions::new());
        assert_eq!(first, second);
    }

    #[test]
    fn test_time_containment_with_bounded_sections() {
        let a = clip_part("a", 400);
        let schedule = PreparedSchedule::Single {
            sections: vec![
                Section {
                    start_time: 5000,
                    end_time: Some(5400),
                    duration: Some(400),
                    repeating: false,
                    pause_time: None,
                    parts: vec![playing(&a, 5000, Some(400))],
                },
                Section {
                    start_time: 5400,
                    end_time: Some(6000),
                    duration: Some(600),
                    repeating: false,
                    pause_time: None,
                    parts: vec![playing(&a, 5400, Some(600))],
                },
            ],
        };
        let objects = compile_group(&group(), Some(&schedule), &CompileOptions::new()).unwrap();
        let root = &objects[0];

        assert_eq!(root.enable.start, Some(Expr::Number(5000)));
        assert_eq!(root.enable.end, Some(Expr::Number(6000)));
        // Section wrappers are root-relative
        assert_eq!(root.children[0].enable.start, Some(Expr::Number(0)));
        assert_eq!(root.children[0].enable.end, Some(Expr::Number(400)));
        assert_eq!(root.children[1].enable.start, Some(Expr::Number(400)));

        // Everything below the section wrappers is parent-relative and must
        // not move with the root shift: content at 0, the part wrapper at its
        // offset within the section, the leaf at its authored time
        let content = &root.children[0].children[0];
        assert_eq!(content.enable.start, Some(Expr::Number(0)));
        let wrapper = &content.children[0];
        assert_eq!(wrapper.enable.start, Some(Expr::Number(0)));
        let leaf = &wrapper.children[0];
        assert_eq!(leaf.enable.start, Some(Expr::Number(0)));
        assert_eq!(leaf.enable.end, Some(Expr::Number(400)));
    }

    #[test]
    fn test_late_schedule_keeps_inner_times_non_negative() {
        // A part starting mid-section, in a schedule that begins well after
        // zero: the wrapper offset stays section-relative regardless of where
        // the schedule sits on the absolute axis
        let a = clip_part("a", 400);
        let schedule = PreparedSchedule::Single {
            sections: vec![Section {
                start_time: 5000,
                end_time: Some(6000),
                duration: Some(1000),
                repeating: false,
                pause_time: None,
                parts: vec![playing(&a, 5600, Some(400))],
            }],
        };
        let objects = compile_group(&group(), Some(&schedule), &CompileOptions::new()).unwrap();
        let root = &objects[0];
        assert_eq!(root.enable.start, Some(Expr::Number(5000)));
        assert_eq!(root.children[0].enable.start, Some(Expr::Number(0)));

        let content = &root.children[0].children[0];
        assert_eq!(content.enable.start, Some(Expr::Number(0)));
        let wrapper = &content.children[0];
        assert_eq!(wrapper.enable.start, Some(Expr::Number(600)));
        assert_eq!(wrapper.children[0].enable.start, Some(Expr::Number(0)));
    }

    #[test]
    fn test_repeated_part_ids_are_unique() {
        // Same canonical part in both sections: the second emission must be
        // renamed, references included
        let a = clip_part("a", 400);
        let schedule = PreparedSchedule::Single {
            sections: vec![
                Section {
                    start_time: 0,
                    end_time: Some(400),
                    duration: Some(400),
                    repeating: false,
                    pause_time: None,
                    parts: vec![playing(&a, 0, Some(400))],
                },
                Section {
                    start_time: 400,
                    end_time: Some(800),
                    duration: Some(400),
                    repeating: false,
                    pause_time: None,
                    parts: vec![playing(&a, 400, Some(400))],
                },
            ],
        };
        let objects = compile_group(&group(), Some(&schedule), &CompileOptions::new()).unwrap();
        assert!(objects[0].ids_are_unique());
    }

    #[test]
    fn test_references_stay_resolvable_across_repeats() {
        // A part whose leaves reference each other, emitted twice: after
        // renaming, every referenced token must still exist in the tree
        let part = Arc::new(Part {
            id: "x".to_string(),
            name: "x".to_string(),
            timeline: vec![
                TimelineLeaf {
                    id: "x_video".to_string(),
                    enable: Enable::span(0i64, Some(400)),
                    layer: "l_video".to_string(),
                    content: Value::Null,
                    classes: Vec::new(),
                    keyframes: Vec::new(),
                },
                TimelineLeaf {
                    id: "x_gfx".to_string(),
                    enable: Enable::starting_at(Expr::from("#x_video.start + 100")),
                    layer: "l_gfx".to_string(),
                    content: Value::Null,
                    classes: Vec::new(),
                    keyframes: Vec::new(),
                },
            ],
            looping: false,
            duration: Some(400),
        });
        let section = |start: u64| Section {
            start_time: start,
            end_time: Some(start + 400),
            duration: Some(400),
            repeating: false,
            pause_time: None,
            parts: vec![playing(&part, start, Some(400))],
        };
        let schedule = PreparedSchedule::Single {
            sections: vec![section(0), section(400)],
        };
        let objects = compile_group(&group(), Some(&schedule), &CompileOptions::new()).unwrap();
        let root = &objects[0];
        assert!(root.ids_are_unique());

        let mut ids = Vec::new();
        root.collect_ids(&mut ids);
        let id_set: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for token in referenced_tokens(root) {
            assert!(id_set.contains(token.as_str()), "dangling reference: {token}");
        }
    }

    /// Collect every token of the shape `#<ident>` from text expressions in
    /// the subtree
    fn referenced_tokens(node: &CompiledTimelineObject) -> Vec<String> {
        fn from_enable(enable: &Enable, out: &mut Vec<String>) {
            let texts = [
                &enable.start,
                &enable.end,
                &enable.duration,
                &enable.repeating,
                &enable.while_active,
            ];
            for expr in texts.into_iter().flatten() {
                if let Expr::Text(text) = expr {
                    for piece in text.split('#').skip(1) {
                        let token: String = piece
                            .chars()
                            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                            .collect();
                        if !token.is_empty() {
                            out.push(token);
                        }
                    }
                }
            }
        }
        fn walk(node: &CompiledTimelineObject, out: &mut Vec<String>) {
            from_enable(&node.enable, out);
            for keyframe in &node.keyframes {
                from_enable(&keyframe.enable, out);
            }
            for child in &node.children {
                walk(child, out);
            }
        }
        let mut out = Vec::new();
        walk(node, &mut out);
        out
    }

    #[test]
    fn test_pause_emits_only_straddling_part() {
        let a = clip_part("a", 500);
        let b = clip_part("b", 500);
        let schedule = PreparedSchedule::Single {
            sections: vec![Section {
                start_time: 0,
                end_time: None,
                duration: Some(1000),
                repeating: false,
                pause_time: Some(750),
                parts: vec![playing(&a, 0, Some(500)), playing(&b, 500, Some(500))],
            }],
        };
        let objects = compile_group(&group(), Some(&schedule), &CompileOptions::new()).unwrap();
        let content = &objects[0].children[0].children[0];

        // Only part b straddles t=750
        assert_eq!(content.children.len(), 1);
        let wrapper = &content.children[0];
        assert_eq!(wrapper.id, "part_b");
        assert!(wrapper.enable.duration.is_none());
        assert!(wrapper.enable.repeating.is_none());
        // Paused content node is frozen too
        assert!(content.enable.duration.is_none());
        assert!(content.enable.repeating.is_none());
    }

    #[test]
    fn test_pause_boundaries_are_inclusive_exclusive() {
        let a = clip_part("a", 500);
        let section = |pause| Section {
            start_time: 0,
            end_time: None,
            duration: Some(500),
            repeating: false,
            pause_time: Some(pause),
            parts: vec![playing(&a, 0, Some(500))],
        };

        // Pause exactly at the part start: included
        assert!(include_playing_part(&section(0), &playing(&a, 0, Some(500))));
        // Pause exactly at the part end: excluded
        assert!(!include_playing_part(&section(500), &playing(&a, 0, Some(500))));
        // Unbounded part straddles any pause at or after its start
        assert!(include_playing_part(&section(500), &playing(&a, 0, None)));
    }

    #[test]
    fn test_multi_mode_prunes_empty_wrappers() {
        let a = clip_part("a", 400);
        let empty = Arc::new(Part {
            id: "empty".to_string(),
            name: "Empty".to_string(),
            timeline: Vec::new(),
            looping: false,
            duration: None,
        });

        let mut parts = IndexMap::new();
        parts.insert(
            "a".to_string(),
            vec![Section {
                start_time: 100,
                end_time: Some(500),
                duration: Some(400),
                repeating: false,
                pause_time: None,
                parts: vec![playing(&a, 100, Some(400))],
            }],
        );
        parts.insert(
            "empty".to_string(),
            vec![Section {
                start_time: 0,
                end_time: None,
                duration: None,
                repeating: false,
                pause_time: None,
                parts: vec![playing(&empty, 0, None)],
            }],
        );

        let multi_group = Group {
            id: "g2".to_string(),
            name: "Group 2".to_string(),
            one_at_a_time: false,
        };
        let schedule = PreparedSchedule::Multi { parts };
        let objects = compile_group(&multi_group, Some(&schedule), &CompileOptions::new()).unwrap();
        let root = &objects[0];

        // The part with no playable leaves is pruned entirely
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id, "group_g2_part_a");
        assert!(root.ids_are_unique());
    }

    #[test]
    fn test_looping_part_repeats_with_its_duration() {
        let mut part = clip_part("loop", 250);
        Arc::get_mut(&mut part).unwrap().looping = true;
        let schedule = PreparedSchedule::Single {
            sections: vec![Section {
                start_time: 0,
                end_time: Some(1000),
                duration: Some(1000),
                repeating: false,
                pause_time: None,
                parts: vec![playing(&part, 0, Some(1000))],
            }],
        };
        let objects = compile_group(&group(), Some(&schedule), &CompileOptions::new()).unwrap();
        let wrapper = &objects[0].children[0].children[0].children[0];
        assert_eq!(wrapper.enable.repeating, Some(Expr::Number(250)));
    }

    #[test]
    fn test_part_content_override_replaces_leaves() {
        struct StillFrame;
        impl PartContent for StillFrame {
            fn leaves(
                &self,
                playing: &PlayingPart,
                _pause_time: Option<u64>,
            ) -> Vec<CompiledTimelineObject> {
                vec![CompiledTimelineObject::leaf(
                    format!("{}_still", playing.part.id),
                    Enable::starting_at(0i64),
                    "l_video",
                    Value::Null,
                )]
            }
        }

        let a = clip_part("a", 400);
        let schedule = PreparedSchedule::Single {
            sections: vec![Section {
                start_time: 0,
                end_time: Some(400),
                duration: Some(400),
                repeating: false,
                pause_time: None,
                parts: vec![playing(&a, 0, Some(400))],
            }],
        };
        let opts = CompileOptions {
            adjust: &NoAdjust,
            part_content: Some(&StillFrame),
        };
        let objects = compile_group(&group(), Some(&schedule), &opts).unwrap();
        let wrapper = &objects[0].children[0].children[0].children[0];
        assert_eq!(wrapper.children[0].id, "a_still");
    }

    #[test]
    fn test_adjust_runs_on_clones_only() {
        struct Mark;
        impl LeafAdjust for Mark {
            fn adjust(
                &self,
                leaf: &mut CompiledTimelineObject,
                _playing: &PlayingPart,
                _original: &TimelineLeaf,
                _pause_time: Option<u64>,
            ) {
                leaf.classes.push("adjusted".to_string());
            }
        }

        let a = clip_part("a", 400);
        let schedule = PreparedSchedule::Single {
            sections: vec![Section {
                start_time: 0,
                end_time: Some(400),
                duration: Some(400),
                repeating: false,
                pause_time: None,
                parts: vec![playing(&a, 0, Some(400))],
            }],
        };
        let opts = CompileOptions {
            adjust: &Mark,
            part_content: None,
        };
        let objects = compile_group(&group(), Some(&schedule), &opts).unwrap();
        let leaf = &objects[0].children[0].children[0].children[0].children[0];
        assert_eq!(leaf.classes, vec!["adjusted"]);
        // Canonical part untouched
        assert!(a.timeline[0].classes.is_empty());
    }
}
