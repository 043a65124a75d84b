//! In-place topology operators.
//!
//! Every operator mutates a [`Mesh`] and returns an [`EditReport`] describing
//! what changed. Invalid input (unknown indices, boundary edges, zero
//! amounts) is not an error: the operator leaves the mesh alone and returns
//! an empty report.
//!
//! Indices in a report always refer to the mesh *after* the edit, including
//! any compaction the operator performed.

mod bevel;
mod delete;
mod extrude;
mod knife;
mod merge;
mod transform;

pub use bevel::{Bevel, bevel_edges};
pub use delete::{delete_faces, delete_vertices, flip_faces};
pub use extrude::{Extrude, ExtrudeNormal, ExtrudeStyle, extrude_faces};
pub use knife::{KnifeHit, knife_face};
pub use merge::{Merge, MergePosition, MergeScope, merge_vertices};
pub use transform::translate_vertices;

use crate::Mesh;
use crate::remap::{Compaction, IndexRemap};
use crate::selection::SelectionState;
use std::collections::BTreeSet;
use std::ops::Range;

/// Summary of one operator application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditReport {
    /// Vertices appended by the operator.
    pub vertices_added: Range<u32>,
    /// Faces appended by the operator.
    pub faces_added: Range<u32>,
    /// Pre-existing faces whose index lists changed.
    pub faces_modified: BTreeSet<u32>,
    /// Vertices whose position changed without a topology change.
    pub vertices_moved: BTreeSet<u32>,
    /// Number of vertices removed.
    pub vertices_removed: usize,
    /// Number of faces removed.
    pub faces_removed: usize,
    /// Old-to-new vertex mapping, if vertices were removed.
    pub vertex_remap: Option<IndexRemap>,
    /// Old-to-new face mapping, if faces were removed.
    pub face_remap: Option<IndexRemap>,
    /// True if only vertex positions changed.
    pub positions_only: bool,
}

impl EditReport {
    /// A report for an edit that changed nothing.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Returns true if the operator left the mesh untouched.
    pub fn is_empty(&self) -> bool {
        self.vertices_added.is_empty()
            && self.faces_added.is_empty()
            && self.faces_modified.is_empty()
            && self.vertices_moved.is_empty()
            && self.vertices_removed == 0
            && self.faces_removed == 0
    }

    /// Returns true if vertex or face indices were renumbered.
    pub fn renumbered(&self) -> bool {
        self.vertex_remap.is_some() || self.face_remap.is_some()
    }

    /// Brings a selection made before the edit in line with the edited mesh.
    ///
    /// Removed elements are dropped and surviving ones renumbered.
    pub fn apply_to_selection(&self, mesh: &Mesh, selection: &mut SelectionState) {
        if let Some(remap) = &self.vertex_remap {
            selection.remap_vertices(remap);
        }
        if let Some(remap) = &self.face_remap {
            selection.remap_faces(mesh, remap);
        }
        selection.retain_valid(mesh);
    }

    /// Rewrites the report's indices through a compaction.
    pub(crate) fn compacted(mut self, compaction: Compaction) -> Self {
        if compaction.is_noop() {
            return self;
        }
        let Compaction { vertices, faces } = compaction;

        self.vertices_added = remap_range(&self.vertices_added, &vertices);
        self.faces_added = remap_range(&self.faces_added, &faces);
        self.faces_modified = self
            .faces_modified
            .iter()
            .filter_map(|&f| faces.get(f))
            .collect();
        self.vertices_moved = self
            .vertices_moved
            .iter()
            .filter_map(|&v| vertices.get(v))
            .collect();
        self.vertices_removed += vertices.removed_count();
        self.faces_removed += faces.removed_count();
        if !vertices.is_identity() {
            self.vertex_remap = Some(vertices);
        }
        if !faces.is_identity() {
            self.face_remap = Some(faces);
        }
        self
    }
}

/// Maps a contiguous block of appended indices through a remap.
///
/// Appended elements sit after every original one, so the kept part of the
/// block stays contiguous.
fn remap_range(range: &Range<u32>, remap: &IndexRemap) -> Range<u32> {
    let mut kept = range.clone().filter_map(|i| remap.get(i));
    match kept.next() {
        Some(start) => {
            let end = kept.last().unwrap_or(start) + 1;
            start..end
        }
        None => {
            let end = remap.new_len() as u32;
            end..end
        }
    }
}

/// Index range covering elements appended from `start` up to `end`.
pub(crate) fn appended(start: usize, end: usize) -> Range<u32> {
    start as u32..end as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_range() {
        let remap = IndexRemap::from_keep(&[true, false, false, true, true, true]);
        assert_eq!(remap_range(&(3..6), &remap), 1..4);
        assert_eq!(remap_range(&(1..3), &remap), 4..4);
    }

    #[test]
    fn test_empty_report() {
        let report = EditReport::unchanged();
        assert!(report.is_empty());
        assert!(!report.renumbered());
    }
}
