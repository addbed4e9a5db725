// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-place id renaming for compiled subtrees.
//!
//! When the compiler emits the same canonical part more than once, the second
//! emission's subtree is routed through [`rewrite_ids`] so its ids cannot
//! collide with the first. Renaming is two-pass: first every id in the
//! subtree is renamed and recorded, then every enable expression is rewritten
//! so cross-references keep pointing at the renamed objects.

use crate::expr::{Enable, Expr};
use crate::object::CompiledTimelineObject;
use std::collections::HashMap;

/// Rename every id in `node`'s subtree (children and keyframes included) via
/// `make_new_id`, then rewrite every enable expression in the subtree so that
/// references to renamed ids follow the rename.
///
/// The rename table lives only for the duration of this call.
pub fn rewrite_ids<F>(node: &mut CompiledTimelineObject, mut make_new_id: F)
where
    F: FnMut(&str) -> String,
{
    let mut table = HashMap::new();
    rename_pass(node, &mut make_new_id, &mut table);
    rewrite_pass(node, &table);
}

/// Pass 1: depth-first rename, recording old -> new
fn rename_pass<F>(node: &mut CompiledTimelineObject, make_new_id: &mut F, table: &mut HashMap<String, String>)
where
    F: FnMut(&str) -> String,
{
    let new_id = make_new_id(&node.id);
    table.insert(std::mem::replace(&mut node.id, new_id.clone()), new_id);

    for keyframe in &mut node.keyframes {
        let new_id = make_new_id(&keyframe.id);
        table.insert(std::mem::replace(&mut keyframe.id, new_id.clone()), new_id);
    }
    for child in &mut node.children {
        rename_pass(child, make_new_id, table);
    }
}

/// Pass 2: depth-first rewrite of every enable expression
fn rewrite_pass(node: &mut CompiledTimelineObject, table: &HashMap<String, String>) {
    rewrite_enable(&mut node.enable, table);
    for keyframe in &mut node.keyframes {
        rewrite_enable(&mut keyframe.enable, table);
    }
    for child in &mut node.children {
        rewrite_pass(child, table);
    }
}

fn rewrite_enable(enable: &mut Enable, table: &HashMap<String, String>) {
    for expr in enable.exprs_mut() {
        rewrite_expr(expr, table);
    }
}

fn rewrite_expr(expr: &mut Expr, table: &HashMap<String, String>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Text(text) => *text = replace_id_tokens(text, table),
        Expr::Binary(binary) => {
            rewrite_expr(&mut binary.lhs, table);
            rewrite_expr(&mut binary.rhs, table);
        }
    }
}

/// Substitute renamed ids inside a textual expression.
///
/// Substitution is anchored on identifier-token boundaries: a token is a
/// maximal run of `[A-Za-z0-9_]`. An id that is a prefix or substring of
/// another id can therefore never corrupt the longer id.
fn replace_id_tokens(text: &str, table: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut token = String::new();

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            token.push(ch);
        } else {
            flush_token(&mut out, &mut token, table);
            out.push(ch);
        }
    }
    flush_token(&mut out, &mut token, table);
    out
}

fn flush_token(out: &mut String, token: &mut String, table: &HashMap<String, String>) {
    if token.is_empty() {
        return;
    }
    match table.get(token.as_str()) {
        Some(renamed) => out.push_str(renamed),
        None => out.push_str(token),
    }
    token.clear();
}
