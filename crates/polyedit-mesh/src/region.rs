//! Connected-region selection.
//!
//! Flood fills from a seed element over the matching adjacency: the vertex
//! graph for vertices and edges, shared edges for polygons, shared endpoints
//! for lines.

use crate::adjacency::MeshAdjacency;
use crate::selection::{ElementHit, ElementSet};
use crate::{Mesh, VertexPair};
use std::collections::{BTreeSet, VecDeque};

/// Selects every element connected to `hit`.
///
/// For an edge seed the result holds every polygon edge whose endpoints lie in
/// the seed's vertex component. Seeds that do not exist in the mesh yield an
/// empty set.
pub fn select_connected(mesh: &Mesh, adjacency: &MeshAdjacency, hit: ElementHit) -> ElementSet {
    let mut set = ElementSet::new();
    if !hit.is_valid(mesh) {
        return set;
    }

    match hit {
        ElementHit::Vertex(v) => {
            set.vertices = flood(v, |x| adjacency.neighbors(x));
        }
        ElementHit::Edge(pair) => {
            let component = flood(pair.low(), |x| adjacency.neighbors(x));
            set.edges = component_edges(adjacency, &component);
        }
        ElementHit::Face(f) => {
            set.faces = flood(f, |x| adjacency.adjacent_faces(x));
        }
        ElementHit::Line(l) => {
            set.lines = flood(l, |x| adjacency.adjacent_lines(x));
        }
    }

    set
}

/// Breadth-first traversal from `seed`, returning every visited index.
fn flood<'a>(seed: u32, next: impl Fn(u32) -> &'a [u32]) -> BTreeSet<u32> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(seed);
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        for &n in next(current) {
            if visited.insert(n) {
                queue.push_back(n);
            }
        }
    }

    visited
}

fn component_edges(adjacency: &MeshAdjacency, component: &BTreeSet<u32>) -> BTreeSet<VertexPair> {
    let mut edges = BTreeSet::new();
    for &v in component {
        for &n in adjacency.neighbors(v) {
            let pair = VertexPair::new(v, n);
            if adjacency.has_edge(pair) {
                edges.insert(pair);
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeshBuilder;
    use glam::Vec3;

    /// Two disjoint islands: a quad strip (faces 0, 1) and a lone triangle
    /// (face 2), plus a line chain (faces 3, 4) and a separate line (face 5).
    fn islands() -> Mesh {
        let mut builder = MeshBuilder::new();
        for i in 0..6 {
            builder.vertex(Vec3::new(i as f32, 0.0, 0.0));
        }
        for i in 0..3 {
            builder.vertex(Vec3::new(i as f32 + 10.0, 1.0, 0.0));
        }
        for i in 0..5 {
            builder.vertex(Vec3::new(i as f32, 5.0, 0.0));
        }
        // 0 1 2 / 3 4 5 strip
        builder.quad(0, 1, 4, 3);
        builder.quad(1, 2, 5, 4);
        builder.triangle(6, 7, 8);
        builder.line(9, 10);
        builder.line(10, 11);
        builder.line(12, 13);
        builder.build()
    }

    #[test]
    fn test_connected_faces() {
        let mesh = islands();
        let adj = MeshAdjacency::build(&mesh);
        let set = select_connected(&mesh, &adj, ElementHit::Face(0));
        assert_eq!(set.faces.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(set.vertices.is_empty());

        let set = select_connected(&mesh, &adj, ElementHit::Face(2));
        assert_eq!(set.faces.iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_connected_vertices_and_edges() {
        let mesh = islands();
        let adj = MeshAdjacency::build(&mesh);
        let set = select_connected(&mesh, &adj, ElementHit::Vertex(7));
        assert_eq!(set.vertices.iter().copied().collect::<Vec<_>>(), vec![6, 7, 8]);

        let set = select_connected(&mesh, &adj, ElementHit::Edge(VertexPair::new(1, 4)));
        // 7 edges in the two-quad strip.
        assert_eq!(set.edges.len(), 7);
        assert!(set.edges.iter().all(|e| e.high() <= 5));
    }

    #[test]
    fn test_connected_lines() {
        let mesh = islands();
        let adj = MeshAdjacency::build(&mesh);
        let set = select_connected(&mesh, &adj, ElementHit::Line(3));
        assert_eq!(set.lines.iter().copied().collect::<Vec<_>>(), vec![3, 4]);
        assert!(set.faces.is_empty());
    }

    #[test]
    fn test_closure_under_adjacency() {
        let mesh = islands();
        let adj = MeshAdjacency::build(&mesh);
        let set = select_connected(&mesh, &adj, ElementHit::Face(1));
        for &f in &set.faces {
            for n in adj.adjacent_faces(f) {
                assert!(set.faces.contains(n));
            }
        }
    }

    #[test]
    fn test_invalid_seed_is_empty() {
        let mesh = islands();
        let adj = MeshAdjacency::build(&mesh);
        assert!(select_connected(&mesh, &adj, ElementHit::Face(99)).is_empty());
        // A line index is not a polygon.
        assert!(select_connected(&mesh, &adj, ElementHit::Face(3)).is_empty());
        assert!(select_connected(&mesh, &adj, ElementHit::Vertex(99)).is_empty());
    }
}
