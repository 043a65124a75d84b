//! Position-only edits.

use super::EditReport;
use crate::Mesh;
use glam::Vec3;
use std::collections::BTreeSet;

/// Moves vertices by `offset`. Connectivity is untouched.
pub fn translate_vertices(
    mesh: &mut Mesh,
    vertices: impl IntoIterator<Item = u32>,
    offset: Vec3,
) -> EditReport {
    if offset == Vec3::ZERO {
        return EditReport::unchanged();
    }
    let mut moved = BTreeSet::new();
    for v in vertices {
        if let Some(vertex) = mesh.vertices.get_mut(v as usize) {
            if moved.insert(v) {
                vertex.position += offset;
            }
        }
    }
    EditReport {
        positions_only: !moved.is_empty(),
        vertices_moved: moved,
        ..Default::default()
    }
}
