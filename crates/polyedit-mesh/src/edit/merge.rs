//! Distance-based vertex merging.

use super::EditReport;
use crate::Mesh;
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Where a merged cluster ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MergePosition {
    /// At the lowest-index member, which keeps its position.
    #[default]
    Representative,
    /// At the average of the members.
    Centroid,
}

/// Which vertices may merge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MergeScope {
    /// Every vertex of the mesh.
    #[default]
    All,
    /// Only these vertices; clusters never grow through others.
    Vertices(BTreeSet<u32>),
}

/// Collapses vertices closer than a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Merge {
    /// Maximum distance between two vertices that merge.
    pub threshold: f32,
    /// Position of the merged vertex.
    pub position: MergePosition,
}

impl Default for Merge {
    fn default() -> Self {
        Self {
            threshold: 1e-4,
            position: MergePosition::Representative,
        }
    }
}

impl Merge {
    /// Creates a merge with the given distance threshold.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Moves merged vertices to the cluster centroid.
    pub fn at_centroid(mut self) -> Self {
        self.position = MergePosition::Centroid;
        self
    }

    /// Applies this merge to `mesh`.
    pub fn apply(&self, mesh: &mut Mesh, scope: &MergeScope) -> EditReport {
        merge_vertices(mesh, scope, self)
    }
}

/// Disjoint sets over `0..n`; every root is the smallest member of its set.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}

/// Merges every pair of candidate vertices within `merge.threshold`.
///
/// Clusters are the transitive closure of the pairwise test over the
/// candidates. Each cluster collapses onto its lowest index. Faces are
/// rewritten with consecutive repeats collapsed; polygons left with fewer
/// than three corners (lines with fewer than two) are removed. Vertices no
/// longer referenced are removed in a single renumbering pass.
pub fn merge_vertices(mesh: &mut Mesh, scope: &MergeScope, merge: &Merge) -> EditReport {
    let vertex_count = mesh.vertex_count();
    let candidates: Vec<u32> = match scope {
        MergeScope::All => (0..vertex_count as u32).collect(),
        MergeScope::Vertices(set) => set
            .iter()
            .copied()
            .filter(|&v| (v as usize) < vertex_count)
            .collect(),
    };

    let positions: Vec<Vec3> = candidates
        .iter()
        .map(|&v| mesh.vertices[v as usize].position)
        .collect();
    let mut sets = UnionFind::new(candidates.len());
    for i in 0..candidates.len() {
        for j in i + 1..candidates.len() {
            if positions[i].distance(positions[j]) <= merge.threshold {
                sets.union(i, j);
            }
        }
    }

    // Candidates are ascending, so the root of each set is its lowest vertex.
    let mut clusters: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for i in 0..candidates.len() {
        let root = sets.find(i);
        clusters
            .entry(candidates[root])
            .or_default()
            .push(candidates[i]);
    }
    clusters.retain(|_, members| members.len() > 1);
    if clusters.is_empty() {
        return EditReport::unchanged();
    }

    let mut target: Vec<u32> = (0..vertex_count as u32).collect();
    let mut merged = BTreeSet::new();
    let mut absorbed: BTreeMap<u32, AttributeMap> = BTreeMap::new();
    for (&representative, members) in &clusters {
        for &m in members {
            target[m as usize] = representative;
            if m != representative {
                merged.insert(m);
                absorbed.insert(m, absorb_attributes(mesh, representative, m));
            }
        }
        if merge.position == MergePosition::Centroid {
            let sum: Vec3 = members
                .iter()
                .map(|&m| mesh.vertices[m as usize].position)
                .sum();
            mesh.vertices[representative as usize].position = sum / members.len() as f32;
        }
    }

    let mut modified = BTreeSet::new();
    let mut keep_faces = vec![true; mesh.face_count()];
    let mut freed = merged.clone();
    for (fi, face) in mesh.faces.iter_mut().enumerate() {
        if !face.vertices.iter().any(|&v| merged.contains(&v)) {
            continue;
        }
        let was_line = face.is_line();
        face.pad_attribute_indices();

        let n = face.len();
        for k in 0..n {
            if let Some(map) = absorbed.get(&face.vertices[k]) {
                remap_corner(&mut face.uv_indices, k, n, &map.uvs);
                remap_corner(&mut face.normal_indices, k, n, &map.normals);
            }
        }
        let mapped: Vec<u32> = face
            .vertices
            .iter()
            .map(|&v| target.get(v as usize).copied().unwrap_or(v))
            .collect();
        let kept: Vec<usize> = (0..n)
            .filter(|&k| mapped[k] != mapped[(k + n - 1) % n] || n == 1)
            .collect();
        let distinct: BTreeSet<u32> = mapped.iter().copied().collect();

        let min_corners = if was_line { 2 } else { 3 };
        if kept.len() < min_corners || distinct.len() < min_corners {
            info!(face = fi, "dropping face collapsed by merge");
            keep_faces[fi] = false;
            freed.extend(face.vertices.iter().copied());
            continue;
        }

        face.vertices = kept.iter().map(|&k| mapped[k]).collect();
        if !face.uv_indices.is_empty() {
            face.uv_indices = kept.iter().map(|&k| face.uv_indices[k]).collect();
        }
        if !face.normal_indices.is_empty() {
            face.normal_indices = kept.iter().map(|&k| face.normal_indices[k]).collect();
        }
        modified.insert(fi as u32);
    }

    let mut used = vec![false; vertex_count];
    for (face, _) in mesh.faces.iter().zip(&keep_faces).filter(|(_, keep)| **keep) {
        for &v in &face.vertices {
            if let Some(slot) = used.get_mut(v as usize) {
                *slot = true;
            }
        }
    }
    let keep_vertices: Vec<bool> = (0..vertex_count)
        .map(|v| used[v] || !freed.contains(&(v as u32)))
        .collect();

    debug!(
        clusters = clusters.len(),
        merged = merged.len(),
        "merged vertices"
    );

    let report = EditReport {
        faces_modified: modified,
        ..Default::default()
    };
    let compaction = mesh.compact(&keep_vertices, &keep_faces);
    report.compacted(compaction)
}

/// Where each UV and normal of a merged vertex landed on its representative.
struct AttributeMap {
    uvs: Vec<u32>,
    normals: Vec<u32>,
}

/// Appends the member's attributes to the representative, reusing equal
/// values already there.
fn absorb_attributes(mesh: &mut Mesh, representative: u32, member: u32) -> AttributeMap {
    let uvs = mesh.vertices[member as usize].uvs.clone();
    let normals = mesh.vertices[member as usize].normals.clone();
    let target = &mut mesh.vertices[representative as usize];
    AttributeMap {
        uvs: uvs.into_iter().map(|uv| index_or_push(&mut target.uvs, uv)).collect(),
        normals: normals
            .into_iter()
            .map(|normal| index_or_push(&mut target.normals, normal))
            .collect(),
    }
}

fn index_or_push<T: PartialEq>(list: &mut Vec<T>, value: T) -> u32 {
    match list.iter().position(|x| *x == value) {
        Some(i) => i as u32,
        None => {
            list.push(value);
            (list.len() - 1) as u32
        }
    }
}

/// Points one corner at the representative's copy of its attribute.
///
/// An empty list means index 0 everywhere; it is filled in only if the
/// corner needs another index.
fn remap_corner(indices: &mut Vec<u32>, corner: usize, len: usize, map: &[u32]) {
    let old = indices.get(corner).copied().unwrap_or(0);
    let Some(&new) = map.get(old as usize) else {
        return;
    };
    if new == old {
        return;
    }
    if indices.is_empty() {
        indices.resize(len, 0);
    }
    indices[corner] = new;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Face, MeshBuilder, Vertex};
    use glam::Vec2;

    /// Two quads side by side whose shared edge was duplicated.
    fn split_seam() -> Mesh {
        let mut builder = MeshBuilder::new();
        builder.vertex(Vec3::new(0.0, 0.0, 0.0)); // 0
        builder.vertex(Vec3::new(1.0, 0.0, 0.0)); // 1
        builder.vertex(Vec3::new(1.0, 1.0, 0.0)); // 2
        builder.vertex(Vec3::new(0.0, 1.0, 0.0)); // 3
        builder.vertex(Vec3::new(1.0, 0.0, 0.0)); // 4 == 1
        builder.vertex(Vec3::new(2.0, 0.0, 0.0)); // 5
        builder.vertex(Vec3::new(2.0, 1.0, 0.0)); // 6
        builder.vertex(Vec3::new(1.0, 1.0, 0.00001)); // 7 ~= 2
        builder.quad(0, 1, 2, 3);
        builder.quad(4, 5, 6, 7);
        builder.build()
    }

    #[test]
    fn test_merge_welds_seam() {
        let mut mesh = split_seam();
        let report = merge_vertices(&mut mesh, &MergeScope::All, &Merge::new(1e-3));

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(report.vertices_removed, 2);
        assert_eq!(mesh.faces[1].vertices, vec![1, 4, 5, 2]);
        assert!(report.faces_modified.contains(&1));
        assert!(mesh.validate().is_ok());
        // The representative keeps its own position.
        assert_eq!(mesh.vertices[2].position, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut mesh = split_seam();
        merge_vertices(&mut mesh, &MergeScope::All, &Merge::new(1e-3));
        let once = mesh.clone();
        let report = merge_vertices(&mut mesh, &MergeScope::All, &Merge::new(1e-3));
        assert!(report.is_empty());
        assert_eq!(mesh, once);
    }

    #[test]
    fn test_merge_scope_limits_candidates() {
        let mut mesh = split_seam();
        let scope = MergeScope::Vertices([1, 4].into_iter().collect());
        merge_vertices(&mut mesh, &scope, &Merge::new(1e-3));
        assert_eq!(mesh.vertex_count(), 7);
        assert_eq!(mesh.faces[1].vertices, vec![1, 4, 5, 6]);
    }

    #[test]
    fn test_merge_drops_degenerate_faces() {
        let mut builder = MeshBuilder::new();
        builder.vertex(Vec3::new(0.0, 0.0, 0.0));
        builder.vertex(Vec3::new(0.0, 0.0, 0.0));
        builder.vertex(Vec3::new(1.0, 0.0, 0.0));
        builder.vertex(Vec3::new(5.0, 5.0, 0.0));
        builder.triangle(0, 1, 2);
        builder.line(0, 1);
        builder.line(2, 3);
        let mut mesh = builder.build();

        let report = merge_vertices(&mut mesh, &MergeScope::All, &Merge::default());
        assert_eq!(report.faces_removed, 2);
        // Only the untouched line survives, renumbered after 0 and 1 went.
        assert_eq!(mesh.faces, vec![Face::line(0, 1)]);
        assert_eq!(mesh.vertex_count(), 2);
    }

    #[test]
    fn test_merge_centroid() {
        let mut builder = MeshBuilder::new();
        builder.vertex(Vec3::new(0.0, 0.0, 0.0));
        builder.vertex(Vec3::new(0.2, 0.0, 0.0));
        builder.vertex(Vec3::new(0.0, 5.0, 0.0));
        builder.triangle(0, 1, 2);
        builder.line(1, 2);
        let mut mesh = builder.build();

        Merge::new(0.5)
            .at_centroid()
            .apply(&mut mesh, &MergeScope::All);
        assert_eq!(mesh.vertex_count(), 2);
        assert!((mesh.vertices[0].position - Vec3::new(0.1, 0.0, 0.0)).length() < 1e-6);
        assert_eq!(mesh.faces, vec![Face::line(0, 1)]);
    }

    #[test]
    fn test_union_find_roots_are_minimal() {
        let mut sets = UnionFind::new(5);
        sets.union(4, 2);
        sets.union(3, 4);
        sets.union(1, 3);
        assert_eq!(sets.find(4), 1);
        assert_eq!(sets.find(0), 0);
    }

    #[test]
    fn test_merge_carries_corner_uvs() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Vertex::new(Vec3::ZERO).with_uv(Vec2::ZERO));
        mesh.add_vertex(Vertex::new(Vec3::X).with_uv(Vec2::X));
        mesh.add_vertex(Vertex::new(Vec3::Y).with_uv(Vec2::Y));
        // Coincident with 0, with a second UV used across a seam.
        mesh.add_vertex(
            Vertex::new(Vec3::ZERO)
                .with_uv(Vec2::ZERO)
                .with_uv(Vec2::splat(0.9))
                .with_normal(Vec3::Z),
        );
        mesh.add_vertex(Vertex::new(Vec3::NEG_X).with_uv(Vec2::splat(0.2)));
        mesh.add_face(Face::new(vec![0, 1, 2]));
        mesh.add_face(Face {
            vertices: vec![3, 2, 4],
            uv_indices: vec![1, 0, 0],
            normal_indices: Vec::new(),
            material: 0,
        });

        let report = merge_vertices(&mut mesh, &MergeScope::All, &Merge::new(1e-3));
        assert_eq!(report.vertices_removed, 1);
        assert_eq!(mesh.faces[1].vertices, vec![0, 2, 3]);
        assert!(mesh.validate().is_ok());

        // The equal UV is shared, the seam UV is appended.
        assert_eq!(mesh.vertices[0].uvs, vec![Vec2::ZERO, Vec2::splat(0.9)]);
        assert_eq!(mesh.vertices[0].normals, vec![Vec3::Z]);
        assert_eq!(mesh.corner_uv(1, 0), Some(Vec2::splat(0.9)));
        assert_eq!(mesh.corner_uv(0, 0), Some(Vec2::ZERO));
    }
}
