//! Belt and edge loop selection.
//!
//! A belt (edge ring) crosses quads through opposite edges, following the quad
//! "grain". An edge loop follows the straightest continuation through
//! vertices, by edge direction rather than topology.
//!
//! # Usage
//!
//! ```ignore
//! let adjacency = MeshAdjacency::build(&mesh);
//!
//! // Select the belt of quads around a cylinder
//! let belt = select_belt(&mesh, &adjacency, VertexPair::new(0, 4));
//!
//! // Follow a nearly straight chain of edges
//! let path = select_edge_loop(&mesh, &adjacency, VertexPair::new(1, 2), 0.9);
//! ```

use crate::adjacency::MeshAdjacency;
use crate::{Mesh, VertexPair};
use std::collections::{BTreeSet, HashSet};

/// Slack on the edge loop threshold, so `1.0` still follows collinear chains.
const DOT_TOLERANCE: f32 = 1e-5;

/// A strip of quads crossed through opposite edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Belt {
    /// Crossed edges in order along the belt, seed included.
    pub edges: Vec<VertexPair>,
    /// Quads the belt passes through.
    pub faces: BTreeSet<u32>,
    /// True if the belt wraps back to the seed edge.
    pub closed: bool,
}

/// A chain of edges following the straightest continuation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeLoop {
    /// Vertices in path order.
    pub vertices: Vec<u32>,
    /// Edges in path order, seed included.
    pub edges: Vec<VertexPair>,
    /// True if the path returns to its first vertex.
    pub closed: bool,
}

/// Selects the belt through `seed`.
///
/// The walk runs outward from both polygons bordering the seed. Inside each
/// quad it crosses to the opposite edge, then to the next polygon bordering
/// that edge. It stops at a non-quad polygon, an open boundary, or an edge
/// already crossed. Non-quad polygons are never part of the belt.
pub fn select_belt(mesh: &Mesh, adjacency: &MeshAdjacency, seed: VertexPair) -> Belt {
    let mut belt = Belt::default();
    let bordering = adjacency.faces_of_edge(seed);
    if bordering.is_empty() {
        return belt;
    }

    let mut crossed = HashSet::new();
    crossed.insert(seed);

    let (first, closed) =
        walk_belt(mesh, adjacency, seed, bordering[0], &mut crossed, &mut belt.faces);
    if closed {
        belt.edges.push(seed);
        belt.edges.extend(first);
        belt.closed = true;
        return belt;
    }

    let second = match bordering.get(1) {
        Some(&other) => walk_belt(mesh, adjacency, seed, other, &mut crossed, &mut belt.faces).0,
        None => Vec::new(),
    };

    belt.edges.extend(first.into_iter().rev());
    belt.edges.push(seed);
    belt.edges.extend(second);
    belt
}

/// Walks the belt from `start` into `face`. Returns the crossed edges and
/// whether the walk came back to `start`.
fn walk_belt(
    mesh: &Mesh,
    adjacency: &MeshAdjacency,
    start: VertexPair,
    mut face: u32,
    crossed: &mut HashSet<VertexPair>,
    faces: &mut BTreeSet<u32>,
) -> (Vec<VertexPair>, bool) {
    let mut edges = Vec::new();
    let mut edge = start;

    loop {
        let Some(opposite) = opposite_edge(mesh, face, edge) else {
            break;
        };
        faces.insert(face);

        if opposite == start {
            return (edges, true);
        }
        if !crossed.insert(opposite) {
            break;
        }
        edges.push(opposite);

        let Some(&next) = adjacency
            .faces_of_edge(opposite)
            .iter()
            .find(|&&f| f != face)
        else {
            break;
        };
        face = next;
        edge = opposite;
    }

    (edges, false)
}

/// The edge two positions along the 4-cycle from `edge`, for quads only.
fn opposite_edge(mesh: &Mesh, face: u32, edge: VertexPair) -> Option<VertexPair> {
    let f = mesh.faces.get(face as usize)?;
    if f.len() != 4 {
        return None;
    }
    let v = &f.vertices;
    let k = (0..4).find(|&k| VertexPair::new(v[k], v[(k + 1) % 4]) == edge)?;
    Some(VertexPair::new(v[(k + 2) % 4], v[(k + 3) % 4]))
}

/// Selects the edge loop through `seed`.
///
/// From each end, the walk moves to the neighbor whose edge direction best
/// matches the current travel direction, as long as the dot product of the
/// two normalized directions reaches `threshold`. Ties go to the lowest
/// vertex index.
pub fn select_edge_loop(
    mesh: &Mesh,
    adjacency: &MeshAdjacency,
    seed: VertexPair,
    threshold: f32,
) -> EdgeLoop {
    let (a, b) = seed.vertices();
    if seed.is_degenerate() || adjacency.neighbors(a).binary_search(&b).is_err() {
        return EdgeLoop::default();
    }

    let mut visited_edges = HashSet::new();
    let mut visited_vertices = HashSet::new();
    visited_edges.insert(seed);
    visited_vertices.insert(a);
    visited_vertices.insert(b);

    let forward = walk_loop(mesh, adjacency, a, b, a, threshold, &mut visited_edges, &mut visited_vertices);

    let mut result = EdgeLoop::default();
    if forward.closed {
        result.vertices.push(a);
        result.vertices.push(b);
        result.vertices.extend(&forward.vertices);
        result.edges.push(seed);
        result.edges.extend(forward.edges);
        result.closed = true;
        return result;
    }

    let backward = walk_loop(mesh, adjacency, b, a, b, threshold, &mut visited_edges, &mut visited_vertices);

    result.vertices.extend(backward.vertices.iter().rev());
    result.vertices.push(a);
    result.vertices.push(b);
    result.vertices.extend(forward.vertices);

    result.edges.extend(backward.edges.iter().rev());
    result.edges.push(seed);
    result.edges.extend(forward.edges);
    result
}

/// Walks from `current`, having arrived from `previous`. `origin` is the
/// vertex that closes the loop when reached again.
#[allow(clippy::too_many_arguments)]
fn walk_loop(
    mesh: &Mesh,
    adjacency: &MeshAdjacency,
    mut previous: u32,
    mut current: u32,
    origin: u32,
    threshold: f32,
    visited_edges: &mut HashSet<VertexPair>,
    visited_vertices: &mut HashSet<u32>,
) -> EdgeLoop {
    let mut path = EdgeLoop::default();

    while let Some(next) = straightest_neighbor(mesh, adjacency, previous, current, threshold) {
        let edge = VertexPair::new(current, next);
        if !visited_edges.insert(edge) {
            break;
        }
        path.edges.push(edge);
        if next == origin {
            path.closed = true;
            break;
        }
        if !visited_vertices.insert(next) {
            break;
        }
        path.vertices.push(next);
        previous = current;
        current = next;
    }

    path
}

fn straightest_neighbor(
    mesh: &Mesh,
    adjacency: &MeshAdjacency,
    previous: u32,
    current: u32,
    threshold: f32,
) -> Option<u32> {
    let from = mesh.position(previous)?;
    let at = mesh.position(current)?;
    let travel = (at - from).normalize_or_zero();

    let mut best: Option<(u32, f32)> = None;
    for &n in adjacency.neighbors(current) {
        if n == previous {
            continue;
        }
        let Some(p) = mesh.position(n) else {
            continue;
        };
        let dot = travel.dot((p - at).normalize_or_zero());
        if dot + DOT_TOLERANCE < threshold {
            continue;
        }
        // Neighbors are ascending; only a strictly better candidate replaces.
        if best.is_none_or(|(_, d)| dot > d) {
            best = Some((n, dot));
        }
    }

    best.map(|(n, _)| n)
}
