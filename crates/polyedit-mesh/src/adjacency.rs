//! Mesh adjacency data structures.
//!
//! [`MeshAdjacency`] is derived data: it is built from a [`Mesh`] in one pass
//! and never updated incrementally. Build a fresh one after every topology
//! edit and pass it by reference to the selection functions.
//!
//! All neighbor and incidence lists are sorted by ascending index, so
//! traversals that take "the first candidate" behave the same across rebuilds.

use crate::{Mesh, VertexPair};
use std::collections::HashMap;

/// Adjacency information for a mesh.
///
/// Provides lookups for:
/// - vertices connected to a vertex by an edge (polygon or line)
/// - polygons incident to an edge
/// - polygons sharing an edge with a polygon
/// - lines sharing an endpoint with a line
#[derive(Debug, Clone, Default)]
pub struct MeshAdjacency {
    /// Indexed by vertex.
    vertex_neighbors: Vec<Vec<u32>>,
    /// Polygons per edge. Lines are not included.
    edge_faces: HashMap<VertexPair, Vec<u32>>,
    /// Lines per vertex pair.
    pair_lines: HashMap<VertexPair, Vec<u32>>,
    /// Indexed by face; empty for lines.
    face_neighbors: Vec<Vec<u32>>,
    /// Indexed by face; empty for polygons.
    line_neighbors: Vec<Vec<u32>>,
}

impl MeshAdjacency {
    /// Builds adjacency information for a mesh.
    ///
    /// Runs in time linear in the total number of face corners (plus the
    /// neighbor fan-out of shared edges). Faces referencing out-of-range
    /// vertices are skipped; [`Mesh::validate`] reports them.
    pub fn build(mesh: &Mesh) -> Self {
        let vertex_count = mesh.vertex_count();
        let face_count = mesh.face_count();

        let mut vertex_neighbors: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
        let mut edge_faces: HashMap<VertexPair, Vec<u32>> = HashMap::new();
        let mut pair_lines: HashMap<VertexPair, Vec<u32>> = HashMap::new();
        let mut vertex_lines: HashMap<u32, Vec<u32>> = HashMap::new();

        for (fi, face) in mesh.faces.iter().enumerate() {
            let fi = fi as u32;
            if face.vertices.iter().any(|&v| v as usize >= vertex_count) {
                continue;
            }

            for (a, b) in face.edges() {
                if a == b {
                    continue;
                }
                vertex_neighbors[a as usize].push(b);
                vertex_neighbors[b as usize].push(a);

                let pair = VertexPair::new(a, b);
                if face.is_line() {
                    pair_lines.entry(pair).or_default().push(fi);
                } else {
                    edge_faces.entry(pair).or_default().push(fi);
                }
            }

            if face.is_line() {
                for &v in &face.vertices {
                    vertex_lines.entry(v).or_default().push(fi);
                }
            }
        }

        for list in &mut vertex_neighbors {
            list.sort_unstable();
            list.dedup();
        }

        let mut face_neighbors: Vec<Vec<u32>> = vec![Vec::new(); face_count];
        for faces in edge_faces.values_mut() {
            // A face listing the same edge twice is still one incidence.
            faces.dedup();
            for &f in faces.iter() {
                for &g in faces.iter() {
                    if f != g {
                        face_neighbors[f as usize].push(g);
                    }
                }
            }
        }
        for list in &mut face_neighbors {
            list.sort_unstable();
            list.dedup();
        }

        let mut line_neighbors: Vec<Vec<u32>> = vec![Vec::new(); face_count];
        for lines in vertex_lines.values() {
            for &l in lines {
                for &m in lines {
                    if l != m {
                        line_neighbors[l as usize].push(m);
                    }
                }
            }
        }
        for list in &mut line_neighbors {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            vertex_neighbors,
            edge_faces,
            pair_lines,
            face_neighbors,
            line_neighbors,
        }
    }

    /// Number of vertices the adjacency was built for.
    pub fn vertex_count(&self) -> usize {
        self.vertex_neighbors.len()
    }

    /// Number of faces the adjacency was built for.
    pub fn face_count(&self) -> usize {
        self.face_neighbors.len()
    }

    /// Vertices connected to `vertex` by an edge, ascending.
    pub fn neighbors(&self, vertex: u32) -> &[u32] {
        self.vertex_neighbors
            .get(vertex as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Polygons containing the edge, ascending.
    pub fn faces_of_edge(&self, pair: VertexPair) -> &[u32] {
        self.edge_faces
            .get(&pair)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Lines spanning exactly this vertex pair.
    pub fn lines_of_pair(&self, pair: VertexPair) -> &[u32] {
        self.pair_lines
            .get(&pair)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Polygons sharing at least one edge with `face`, ascending.
    pub fn adjacent_faces(&self, face: u32) -> &[u32] {
        self.face_neighbors
            .get(face as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Lines sharing an endpoint with `line`, ascending.
    pub fn adjacent_lines(&self, line: u32) -> &[u32] {
        self.line_neighbors
            .get(line as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if the edge belongs to exactly one polygon.
    pub fn is_boundary_edge(&self, pair: VertexPair) -> bool {
        self.faces_of_edge(pair).len() == 1
    }

    /// Returns true if at least one polygon contains the edge.
    pub fn has_edge(&self, pair: VertexPair) -> bool {
        self.edge_faces.contains_key(&pair)
    }

    /// All polygon edges, sorted.
    pub fn edges(&self) -> Vec<VertexPair> {
        let mut edges: Vec<VertexPair> = self.edge_faces.keys().copied().collect();
        edges.sort_unstable();
        edges
    }
}
