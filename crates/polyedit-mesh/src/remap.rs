//! Batched index remapping.
//!
//! Deleting elements from an indexed mesh shifts every index above the deleted
//! one. Rather than shifting once per deletion, callers collect a keep-mask,
//! build one [`IndexRemap`] and rewrite all references in a single pass.

use crate::Mesh;

/// Old-index to new-index mapping produced by a compaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRemap {
    map: Vec<Option<u32>>,
    new_len: usize,
}

impl IndexRemap {
    /// A mapping that keeps all `len` indices in place.
    pub fn identity(len: usize) -> Self {
        Self {
            map: (0..len as u32).map(Some).collect(),
            new_len: len,
        }
    }

    /// Builds a mapping that drops every index whose flag is false.
    pub fn from_keep(keep: &[bool]) -> Self {
        let mut next = 0u32;
        let map = keep
            .iter()
            .map(|&k| {
                if k {
                    next += 1;
                    Some(next - 1)
                } else {
                    None
                }
            })
            .collect();
        Self {
            map,
            new_len: next as usize,
        }
    }

    /// New index of `old`, or `None` if it was removed or never existed.
    pub fn get(&self, old: u32) -> Option<u32> {
        self.map.get(old as usize).copied().flatten()
    }

    /// Number of indices before compaction.
    pub fn old_len(&self) -> usize {
        self.map.len()
    }

    /// Number of indices after compaction.
    pub fn new_len(&self) -> usize {
        self.new_len
    }

    /// Number of removed indices.
    pub fn removed_count(&self) -> usize {
        self.map.len() - self.new_len
    }

    /// Returns true if nothing was removed.
    pub fn is_identity(&self) -> bool {
        self.removed_count() == 0
    }
}

/// Vertex and face mappings from one [`Mesh::compact`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compaction {
    /// Vertex index mapping.
    pub vertices: IndexRemap,
    /// Face index mapping.
    pub faces: IndexRemap,
}

impl Compaction {
    /// Returns true if neither vertices nor faces were removed.
    pub fn is_noop(&self) -> bool {
        self.vertices.is_identity() && self.faces.is_identity()
    }
}

impl Mesh {
    /// Removes vertices and faces in one pass and renumbers all references.
    ///
    /// Masks shorter than the element count keep the remaining elements.
    /// A face that references a removed vertex is removed as well, so the
    /// result never holds a dangling index.
    pub fn compact(&mut self, keep_vertices: &[bool], keep_faces: &[bool]) -> Compaction {
        let vertex_keep: Vec<bool> = (0..self.vertices.len())
            .map(|i| keep_vertices.get(i).copied().unwrap_or(true))
            .collect();
        let vertices = IndexRemap::from_keep(&vertex_keep);

        let face_keep: Vec<bool> = self
            .faces
            .iter()
            .enumerate()
            .map(|(i, face)| {
                keep_faces.get(i).copied().unwrap_or(true)
                    && face.vertices.iter().all(|&v| vertices.get(v).is_some())
            })
            .collect();
        let faces = IndexRemap::from_keep(&face_keep);

        if vertices.is_identity() && faces.is_identity() {
            return Compaction { vertices, faces };
        }

        let mut kept_vertex = vertex_keep.iter();
        self.vertices.retain(|_| kept_vertex.next().copied().unwrap_or(true));

        let mut kept_face = face_keep.iter();
        self.faces.retain(|_| kept_face.next().copied().unwrap_or(true));

        for face in &mut self.faces {
            for v in &mut face.vertices {
                // Faces with removed vertices were dropped above.
                *v = vertices.get(*v).unwrap_or(*v);
            }
        }

        Compaction { vertices, faces }
    }

    /// Removes vertices and renumbers every face's vertex indices.
    ///
    /// Faces that referenced a removed vertex go too; use [`Mesh::compact`]
    /// when the face mapping is needed.
    pub fn compact_vertices(&mut self, keep: &[bool]) -> IndexRemap {
        self.compact(keep, &[]).vertices
    }

    /// Removes faces and renumbers face indices.
    pub fn compact_faces(&mut self, keep: &[bool]) -> IndexRemap {
        self.compact(&[], keep).faces
    }

    /// Removes the candidate vertices that no face references.
    pub fn remove_orphans(&mut self, candidates: impl IntoIterator<Item = u32>) -> IndexRemap {
        let used = self.referenced_vertices();
        let mut keep = vec![true; self.vertices.len()];
        for v in candidates {
            if let Some(slot) = keep.get_mut(v as usize) {
                *slot = used[v as usize];
            }
        }
        self.compact(&keep, &[]).vertices
    }
}
