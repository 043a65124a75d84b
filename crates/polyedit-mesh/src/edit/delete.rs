//! Element removal and winding flips.

use super::EditReport;
use crate::Mesh;
use std::collections::BTreeSet;
use tracing::debug;

/// Removes faces (polygons or lines) in one renumbering pass.
///
/// With `remove_orphans`, vertices that only the removed faces referenced
/// are removed too.
pub fn delete_faces(
    mesh: &mut Mesh,
    faces: impl IntoIterator<Item = u32>,
    remove_orphans: bool,
) -> EditReport {
    let mut keep_faces = vec![true; mesh.face_count()];
    let mut touched = BTreeSet::new();
    for f in faces {
        if let Some(slot) = keep_faces.get_mut(f as usize) {
            if *slot {
                *slot = false;
                touched.extend(mesh.faces[f as usize].vertices.iter().copied());
            }
        }
    }
    if keep_faces.iter().all(|&k| k) {
        return EditReport::unchanged();
    }

    let mut keep_vertices = Vec::new();
    if remove_orphans {
        let mut used = vec![false; mesh.vertex_count()];
        for (face, _) in mesh.faces.iter().zip(&keep_faces).filter(|(_, keep)| **keep) {
            for &v in &face.vertices {
                if let Some(slot) = used.get_mut(v as usize) {
                    *slot = true;
                }
            }
        }
        keep_vertices = used
            .iter()
            .enumerate()
            .map(|(v, &u)| u || !touched.contains(&(v as u32)))
            .collect();
    }

    let compaction = mesh.compact(&keep_vertices, &keep_faces);
    debug!(
        faces = compaction.faces.removed_count(),
        vertices = compaction.vertices.removed_count(),
        "deleted faces"
    );
    EditReport::default().compacted(compaction)
}

/// Removes vertices and every face that references one of them.
pub fn delete_vertices(mesh: &mut Mesh, vertices: impl IntoIterator<Item = u32>) -> EditReport {
    let mut keep = vec![true; mesh.vertex_count()];
    for v in vertices {
        if let Some(slot) = keep.get_mut(v as usize) {
            *slot = false;
        }
    }
    if keep.iter().all(|&k| k) {
        return EditReport::unchanged();
    }

    let compaction = mesh.compact(&keep, &[]);
    debug!(
        vertices = compaction.vertices.removed_count(),
        faces = compaction.faces.removed_count(),
        "deleted vertices"
    );
    EditReport::default().compacted(compaction)
}

/// Reverses the winding of each face, keeping corner attributes in place.
pub fn flip_faces(mesh: &mut Mesh, faces: impl IntoIterator<Item = u32>) -> EditReport {
    let mut modified = BTreeSet::new();
    for f in faces {
        if let Some(face) = mesh.faces.get_mut(f as usize) {
            if modified.insert(f) {
                face.reverse();
            }
        }
    }
    EditReport {
        faces_modified: modified,
        ..Default::default()
    }
}
