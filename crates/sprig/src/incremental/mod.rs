//! # Incremental reparsing
//!
//! After an edit, most of a buffer is unchanged, and so is most of its tree.
//! The recorded edits are composed into a segment map from new-buffer
//! offsets to old-buffer offsets; while parsing, whenever the automaton sits
//! at the start of an unedited segment it asks this module for a subtree of
//! the previous tree that can be pushed wholesale instead of re-lexing its
//! span.
//!
//! A subtree qualifies only when reparsing it from scratch would provably
//! rebuild it identically:
//!
//! - its old span plus its recorded lookahead lies entirely inside one
//!   unedited segment,
//! - the automaton is in the same state the subtree was originally shifted
//!   from, and the current state has a goto for its symbol,
//! - it contains no error or missing nodes,
//! - the external scanner, if the language has one, is in the same
//!   serialized state as when the subtree was first scanned.
//!
//! Reuse is an optimization with a belt: if a parse error shows up
//! immediately after a reused push, the whole parse is rerun without reuse.

mod edit;

pub use edit::InputEdit;

use crate::language::{ParseState, StateId};
use crate::syntax::{GreenElement, GreenNode, SyntaxTree, TextSize};
use std::sync::Arc;

/// One maximal run of bytes the edits did not touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    new_start: u32,
    old_start: u32,
    len: u32,
}

impl Segment {
    const fn new_end(self) -> u32 {
        self.new_start + self.len
    }

    const fn old_end(self) -> u32 {
        self.old_start + self.len
    }
}

/// Apply one edit (expressed in the coordinates the previous edits produced)
/// to the segment map.
fn apply_edit(segments: Vec<Segment>, edit: InputEdit) -> Vec<Segment> {
    let start = u32::from(edit.start);
    let old_end = u32::from(edit.old_end);
    let delta = edit.delta();
    let mut out = Vec::with_capacity(segments.len() + 1);

    for seg in segments {
        let seg_end = seg.new_end();
        if seg.new_start < start {
            let keep_end = seg_end.min(start);
            out.push(Segment {
                new_start: seg.new_start,
                old_start: seg.old_start,
                len: keep_end - seg.new_start,
            });
        }
        if seg_end > old_end {
            let cut = seg.new_start.max(old_end);
            let shifted = i64::from(cut) + delta;
            let new_start = u32::try_from(shifted).unwrap_or(0);
            out.push(Segment {
                new_start,
                old_start: seg.old_start + (cut - seg.new_start),
                len: seg_end - cut,
            });
        }
    }
    out
}

/// The previous tree plus the composed edit map, queried during a parse.
pub(crate) struct ReuseSource<'a> {
    root: &'a Arc<GreenNode>,
    segments: Vec<Segment>,
    has_scanner: bool,
}

impl<'a> ReuseSource<'a> {
    /// `None` when the tree has no recorded edits; the zero-edit case is
    /// handled by returning the old tree outright, not by reuse.
    pub(crate) fn new(tree: &'a SyntaxTree) -> Option<Self> {
        if tree.edits().is_empty() {
            return None;
        }
        let old_len = u32::from(tree.text_len());
        let mut segments = vec![Segment {
            new_start: 0,
            old_start: 0,
            len: old_len,
        }];
        for &edit in tree.edits() {
            segments = apply_edit(segments, edit);
        }
        segments.retain(|seg| seg.len > 0);
        Some(Self {
            root: tree.green_root(),
            segments,
            has_scanner: tree.language().has_external_scanner(),
        })
    }

    /// Largest old subtree that starts at `pos` (new coordinates) and can be
    /// pushed in the given automaton state.
    pub(crate) fn candidate(
        &mut self,
        pos: TextSize,
        state_id: StateId,
        state: &ParseState,
        ext: Option<&[u8]>,
    ) -> Option<Arc<GreenNode>> {
        let pos = u32::from(pos);
        let seg = *self
            .segments
            .iter()
            .find(|seg| seg.new_start <= pos && pos < seg.new_end())?;
        let old_pos = seg.old_start + (pos - seg.new_start);
        let window_end = seg.old_end();

        let mut node = self.root;
        let mut offset = 0u32;
        loop {
            if offset == old_pos && self.qualifies(node, offset, window_end, state_id, state, ext) {
                return Some(Arc::clone(node));
            }

            // Descend into the child whose old span contains the position.
            let mut child_offset = offset;
            let mut next: Option<(&Arc<GreenNode>, u32)> = None;
            for child in node.children() {
                let len = u32::from(child.text_len());
                if child_offset <= old_pos && old_pos < child_offset + len {
                    match child {
                        GreenElement::Node(inner) => next = Some((inner, child_offset)),
                        GreenElement::Token(_) => return None,
                    }
                    break;
                }
                child_offset += len;
            }
            let (inner, inner_offset) = next?;
            node = inner;
            offset = inner_offset;
        }
    }

    fn qualifies(
        &self,
        node: &Arc<GreenNode>,
        offset: u32,
        window_end: u32,
        state_id: StateId,
        state: &ParseState,
        ext: Option<&[u8]>,
    ) -> bool {
        let len = u32::from(node.text_len());
        if len == 0 || node.has_error() {
            return false;
        }
        if node.parse_state() != state_id {
            return false;
        }
        if state.goto(node.symbol()).is_none() {
            return false;
        }
        if offset + len + node.lookahead_bytes() > window_end {
            return false;
        }
        if self.has_scanner {
            let matches = match (node.scanner_snapshot(), ext) {
                (Some(snapshot), Some(current)) => snapshot.at_start.as_ref() == current,
                _ => false,
            };
            if !matches {
                return false;
            }
        }
        true
    }
}
