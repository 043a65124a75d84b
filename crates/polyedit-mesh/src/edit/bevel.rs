//! Edge bevel.
//!
//! Beveling replaces an edge shared by two polygons with a strip of quads.
//! Each endpoint is split into a ring of new vertices running from one face's
//! plane to the other's, either along a straight chamfer or a quarter-circle
//! fillet.
//!
//! # Usage
//!
//! ```ignore
//! let report = Bevel::rounded(0.1, 4).apply(&mut mesh, [VertexPair::new(1, 2)]);
//! report.apply_to_selection(&mesh, &mut selection);
//! ```

use super::{EditReport, appended};
use crate::{Face, Mesh, MeshAdjacency, VertexPair};
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f32::consts::FRAC_PI_2;
use tracing::debug;

/// Amounts below this are treated as zero.
const MIN_AMOUNT: f32 = 1e-6;

/// Ring ends closer than this are welded into one vertex.
const WELD_DISTANCE: f32 = 1e-5;

/// Corners whose edges are closer to parallel than this are not mitered.
const MIN_CORNER_SINE: f32 = 1e-4;

/// Bevels edges shared by exactly two polygons.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bevel {
    /// Distance from the original edge to each side of the bevel.
    pub amount: f32,
    /// Number of quads across the bevel (1 = flat chamfer).
    pub segments: u32,
    /// Whether to follow a quarter-circle profile instead of a straight one.
    pub fillet: bool,
    /// Material of the new faces; `None` uses the first bordering face's.
    pub material: Option<u32>,
}

impl Default for Bevel {
    fn default() -> Self {
        Self {
            amount: 0.1,
            segments: 1,
            fillet: false,
            material: None,
        }
    }
}

impl Bevel {
    /// Creates a single-segment chamfer.
    pub fn chamfer(amount: f32) -> Self {
        Self {
            amount,
            ..Default::default()
        }
    }

    /// Creates a rounded bevel.
    pub fn rounded(amount: f32, segments: u32) -> Self {
        Self {
            amount,
            segments,
            fillet: true,
            material: None,
        }
    }

    /// Sets the material of the bevel faces.
    pub fn with_material(mut self, material: u32) -> Self {
        self.material = Some(material);
        self
    }

    /// Applies this bevel to `edges` of `mesh`.
    pub fn apply(&self, mesh: &mut Mesh, edges: impl IntoIterator<Item = VertexPair>) -> EditReport {
        bevel_edges(mesh, edges, self)
    }

    /// Position of ring `k` for an endpoint at `origin`, where `along_a` and
    /// `along_b` are the inward offsets into the two faces.
    fn ring_position(&self, origin: Vec3, along_a: Vec3, along_b: Vec3, k: u32) -> Vec3 {
        let segments = self.segments.max(1);
        let s = k as f32 / segments as f32;
        if self.fillet {
            let theta = s * FRAC_PI_2;
            let center = origin + (along_a + along_b) * self.amount;
            center - along_b * self.amount * theta.cos() - along_a * self.amount * theta.sin()
        } else {
            origin + along_a.lerp(along_b, s) * self.amount
        }
    }
}

/// Bevels each edge of `edges` that borders exactly two polygons.
///
/// Boundary and non-manifold edges are skipped. All edges are measured
/// against the mesh as it was before the call, so edges sharing an endpoint
/// are beveled together: the endpoint is split once, a face between two
/// beveled edges gets a single mitered corner, and a cap polygon closes the
/// hole left where three or more ring ends meet. Endpoints left unreferenced
/// are removed at the end in one pass.
pub fn bevel_edges(
    mesh: &mut Mesh,
    edges: impl IntoIterator<Item = VertexPair>,
    bevel: &Bevel,
) -> EditReport {
    if bevel.amount.abs() < MIN_AMOUNT {
        return EditReport::unchanged();
    }
    let requested: BTreeSet<VertexPair> = edges.into_iter().collect();
    let adjacency = MeshAdjacency::build(mesh);

    let vertex_start = mesh.vertex_count();
    let face_start = mesh.face_count();

    let mut ringed = Vec::new();
    for &edge in &requested {
        match ring_edge(mesh, &adjacency, edge, bevel) {
            Some(edge) => ringed.push(edge),
            None => debug!(?edge, "skipping bevel edge without two bordering polygons"),
        }
    }
    if ringed.is_empty() {
        return EditReport::unchanged();
    }

    // Faces around every endpoint, each listed once.
    let mut at_vertex: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for edge in &ringed {
        at_vertex.entry(edge.a).or_default();
        at_vertex.entry(edge.b).or_default();
    }
    for (fi, face) in mesh.faces[..face_start].iter().enumerate() {
        for &v in &face.vertices {
            if let Some(faces) = at_vertex.get_mut(&v) {
                if faces.last() != Some(&(fi as u32)) {
                    faces.push(fi as u32);
                }
            }
        }
    }

    let splitter = Splitter {
        adjacency: &adjacency,
        by_pair: ringed
            .iter()
            .enumerate()
            .map(|(i, edge)| (VertexPair::new(edge.a, edge.b), i))
            .collect(),
        ringed: &ringed,
        bevel,
    };
    let mut plan = SplitPlan::default();
    for (&v, faces) in &at_vertex {
        splitter.split(mesh, v, faces, &mut plan);
    }

    let mut modified = BTreeSet::new();
    for (&fi, corners) in &plan.corners {
        let mut padded = mesh.faces[fi as usize].clone();
        padded.pad_attribute_indices();
        let mut rebuilt = Vec::with_capacity(padded.len() + 2);
        for (k, &v) in padded.vertices.iter().enumerate() {
            match corners.get(&k) {
                Some(replacement) => {
                    rebuilt.extend(replacement.iter().map(|&r| (plan.resolve(r), Some(k))));
                }
                None => rebuilt.push((v, Some(k))),
            }
        }
        mesh.faces[fi as usize] = padded.from_corners(&rebuilt);
        modified.insert(fi);
    }

    for edge in &ringed {
        let material = bevel
            .material
            .unwrap_or(mesh.faces[edge.face_a as usize].material);
        for k in 0..edge.chain_a.len() - 1 {
            let quad = [
                edge.chain_b[k],
                edge.chain_a[k],
                edge.chain_a[k + 1],
                edge.chain_b[k + 1],
            ]
            .map(|v| plan.resolve(v));
            mesh.add_face(Face::new(quad.to_vec()).with_material(material));
        }
    }
    for cap in std::mem::take(&mut plan.caps) {
        mesh.add_face(cap);
    }

    let report = EditReport {
        vertices_added: appended(vertex_start, mesh.vertex_count()),
        faces_added: appended(face_start, mesh.face_count()),
        faces_modified: modified,
        ..Default::default()
    };

    let used = mesh.referenced_vertices();
    let keep: Vec<bool> = (0..mesh.vertex_count())
        .map(|v| {
            let v32 = v as u32;
            used[v] || !(at_vertex.contains_key(&v32) || plan.alias.contains_key(&v32))
        })
        .collect();
    let compaction = mesh.compact(&keep, &[]);

    debug!(
        edges = ringed.len(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "beveled edges"
    );
    report.compacted(compaction)
}

/// An edge that will be beveled, with its rings already appended.
struct RingedEdge {
    /// Endpoints ordered along face A's winding.
    a: u32,
    b: u32,
    face_a: u32,
    /// Ring vertices split from `a`, running from face A to face B.
    chain_a: Vec<u32>,
    /// Ring vertices split from `b`, running from face A to face B.
    chain_b: Vec<u32>,
}

impl RingedEdge {
    fn chain_at(&self, v: u32) -> &[u32] {
        if v == self.a { &self.chain_a } else { &self.chain_b }
    }

    /// First ring pair at `v` in the direction a cap must run, which is
    /// opposite to the bridge quad that shares it.
    fn cap_pair(&self, v: u32) -> (u32, u32) {
        if v == self.a {
            (self.chain_a[1], self.chain_a[0])
        } else {
            (self.chain_b[0], self.chain_b[1])
        }
    }
}

/// Validates an edge and appends its ring vertices.
fn ring_edge(
    mesh: &mut Mesh,
    adjacency: &MeshAdjacency,
    edge: VertexPair,
    bevel: &Bevel,
) -> Option<RingedEdge> {
    let &[face_a, face_b] = adjacency.faces_of_edge(edge) else {
        return None;
    };

    // Orient the edge along face A's winding.
    let (low, high) = edge.vertices();
    let (a, b) = if mesh.faces[face_a as usize].directed_edge_corner(low, high).is_some() {
        (low, high)
    } else {
        (high, low)
    };

    let pa = mesh.position(a)?;
    let pb = mesh.position(b)?;
    let direction = (pb - pa).normalize_or_zero();
    let along_a = inward_offset(mesh, face_a, pa, direction);
    let along_b = inward_offset(mesh, face_b, pa, direction);
    if direction == Vec3::ZERO || along_a == Vec3::ZERO || along_b == Vec3::ZERO {
        return None;
    }

    let segments = bevel.segments.max(1);
    let mut chain_a = Vec::with_capacity(segments as usize + 1);
    let mut chain_b = Vec::with_capacity(segments as usize + 1);
    for k in 0..=segments {
        let ra = mesh.vertices[a as usize].moved_to(bevel.ring_position(pa, along_a, along_b, k));
        let rb = mesh.vertices[b as usize].moved_to(bevel.ring_position(pb, along_a, along_b, k));
        chain_a.push(mesh.add_vertex(ra));
        chain_b.push(mesh.add_vertex(rb));
    }

    Some(RingedEdge {
        a,
        b,
        face_a,
        chain_a,
        chain_b,
    })
}

/// Unit vector in the face plane, perpendicular to the edge, pointing into
/// the face.
fn inward_offset(mesh: &Mesh, face: u32, on_edge: Vec3, direction: Vec3) -> Vec3 {
    let offset = mesh.face_normal(face).cross(direction).normalize_or_zero();
    if offset.dot(mesh.face_centroid(face) - on_edge) < 0.0 {
        -offset
    } else {
        offset
    }
}

/// Corner rewrites collected over every endpoint, applied in one pass.
#[derive(Debug, Default)]
struct SplitPlan {
    /// Face -> corner -> vertices replacing that corner, in winding order.
    corners: BTreeMap<u32, BTreeMap<usize, Vec<u32>>>,
    /// Ring vertices welded onto another ring vertex.
    alias: HashMap<u32, u32>,
    caps: Vec<Face>,
}

impl SplitPlan {
    fn set_corner(&mut self, face: u32, corner: usize, replacement: Vec<u32>) {
        self.corners.entry(face).or_default().insert(corner, replacement);
    }

    // Weld targets are never welded themselves, so one lookup suffices.
    fn resolve(&self, v: u32) -> u32 {
        self.alias.get(&v).copied().unwrap_or(v)
    }
}

/// A polygon corner at the split vertex, in fan order.
#[derive(Debug, Clone, Copy)]
struct FanStep {
    face: u32,
    corner: usize,
    /// Neighbor across the edge shared with the previous step.
    enter: u32,
    /// Neighbor across the edge shared with the next step.
    exit: u32,
    /// Whether fan order matches the face winding at this corner.
    forward: bool,
}

/// Polygons around a vertex chained through shared edges.
#[derive(Debug)]
struct Fan {
    steps: Vec<FanStep>,
    /// The last step shares an edge with the first.
    closed: bool,
}

/// A beveled edge between two fan steps, with its ring in fan order.
#[derive(Debug, Clone)]
struct Link {
    edge: usize,
    chain: Vec<u32>,
}

impl Link {
    fn first(&self) -> u32 {
        self.chain[0]
    }

    fn last(&self) -> u32 {
        self.chain[self.chain.len() - 1]
    }
}

struct Splitter<'a> {
    adjacency: &'a MeshAdjacency,
    by_pair: HashMap<VertexPair, usize>,
    ringed: &'a [RingedEdge],
    bevel: &'a Bevel,
}

impl Splitter<'_> {
    /// Plans the corner rewrites for every face around endpoint `v`.
    fn split(&self, mesh: &mut Mesh, v: u32, faces: &[u32], plan: &mut SplitPlan) {
        let polygons: Vec<u32> = faces
            .iter()
            .copied()
            .filter(|&f| mesh.faces[f as usize].is_polygon())
            .collect();
        for fan in self.fans(mesh, v, &polygons) {
            self.split_fan(mesh, v, fan, plan);
        }

        // Lines keep the ring vertex closest to their far end.
        let ring: Vec<u32> = self
            .ringed
            .iter()
            .filter(|edge| edge.a == v || edge.b == v)
            .flat_map(|edge| edge.chain_at(v).iter().map(|&r| plan.resolve(r)))
            .collect();
        for &f in faces {
            let face = &mesh.faces[f as usize];
            if !face.is_line() {
                continue;
            }
            let Some(corner) = face.corner_of(v) else {
                continue;
            };
            let target = mesh.position(face.vertices[1 - corner]).unwrap_or(Vec3::ZERO);
            if let Some(closest) = nearest(mesh, &ring, target) {
                plan.set_corner(f, corner, vec![closest]);
            }
        }
    }

    fn partner(&self, v: u32, face: u32, across: u32) -> Option<u32> {
        match *self.adjacency.faces_of_edge(VertexPair::new(v, across)) {
            [x, y] => Some(if x == face { y } else { x }),
            _ => None,
        }
    }

    /// Groups the polygons around `v` into fans. Open fans start at a face
    /// with an unshared edge; the rest are closed cycles.
    fn fans(&self, mesh: &Mesh, v: u32, polygons: &[u32]) -> Vec<Fan> {
        let mut visited = BTreeSet::new();
        let mut fans = Vec::new();

        for &face in polygons {
            if visited.contains(&face) {
                continue;
            }
            let Some(step) = fan_step(mesh, v, face, None) else {
                continue;
            };
            let start = if self.partner(v, face, step.enter).is_none() {
                step
            } else if self.partner(v, face, step.exit).is_none() {
                FanStep {
                    enter: step.exit,
                    exit: step.enter,
                    forward: false,
                    ..step
                }
            } else {
                continue;
            };
            fans.push(self.walk(mesh, v, start, &mut visited));
        }

        for &face in polygons {
            if visited.contains(&face) {
                continue;
            }
            if let Some(start) = fan_step(mesh, v, face, None) {
                fans.push(self.walk(mesh, v, start, &mut visited));
            }
        }
        fans
    }

    fn walk(&self, mesh: &Mesh, v: u32, start: FanStep, visited: &mut BTreeSet<u32>) -> Fan {
        visited.insert(start.face);
        let mut steps = vec![start];
        let mut closed = false;
        let mut current = start;
        while let Some(next_face) = self.partner(v, current.face, current.exit) {
            if next_face == start.face {
                closed = current.exit == start.enter;
                break;
            }
            if visited.contains(&next_face) {
                break;
            }
            let Some(next) = fan_step(mesh, v, next_face, Some(current.exit)) else {
                break;
            };
            visited.insert(next_face);
            steps.push(next);
            current = next;
        }
        Fan { steps, closed }
    }

    /// The beveled edge entered by step `i`, if any. Step 0 is entered from
    /// the last step in a closed fan and from outside in an open one.
    fn link(&self, v: u32, steps: &[FanStep], closed: bool, i: usize) -> Option<Link> {
        if i == 0 && !closed {
            return None;
        }
        let previous = steps[(i + steps.len() - 1) % steps.len()];
        let edge = *self.by_pair.get(&VertexPair::new(v, steps[i].enter))?;
        let ringed = &self.ringed[edge];
        let chain = ringed.chain_at(v);
        let chain = if previous.face == ringed.face_a {
            chain.to_vec()
        } else {
            chain.iter().rev().copied().collect()
        };
        Some(Link { edge, chain })
    }

    fn split_fan(&self, mesh: &mut Mesh, v: u32, fan: Fan, plan: &mut SplitPlan) {
        let Fan { mut steps, closed } = fan;
        let n = steps.len();
        if closed {
            let Some(first) = (0..n).find(|&i| self.link(v, &steps, closed, i).is_some()) else {
                return;
            };
            steps.rotate_left(first);
        }
        let links: Vec<Option<Link>> = (0..n).map(|i| self.link(v, &steps, closed, i)).collect();
        if links.iter().all(Option::is_none) {
            return;
        }

        // Sectors run between consecutive beveled edges.
        let mut sectors = Vec::new();
        let mut begin = 0;
        let mut start = links[0].clone();
        for (i, link) in links.iter().enumerate().skip(1) {
            if let Some(link) = link {
                sectors.push((begin..i, start.take(), Some(link.clone())));
                start = Some(link.clone());
                begin = i;
            }
        }
        sectors.push((begin..n, start, links[0].clone()));

        for (range, start, end) in sectors {
            let sector = &steps[range];
            let replacements = match (start, end) {
                (None, None) => continue,
                (Some(start), None) => vec![vec![start.last()]; sector.len()],
                (None, Some(end)) => vec![vec![end.first()]; sector.len()],
                (Some(start), Some(end)) => self.close_sector(mesh, v, sector, &start, &end, plan),
            };
            for (step, mut replacement) in sector.iter().zip(replacements) {
                if !step.forward {
                    replacement.reverse();
                }
                plan.set_corner(step.face, step.corner, replacement);
            }
        }

        let beveled: Vec<&Link> = links.iter().flatten().collect();
        if closed && beveled.len() >= 2 {
            self.cap(mesh, v, &beveled, plan);
        }
    }

    /// Replacements, in fan order, for a sector bounded by beveled edges on
    /// both sides.
    ///
    /// One face of the sector bridges from the start ring to the end ring;
    /// faces before it keep the start ring vertex and faces after it the end
    /// ring vertex.
    fn close_sector(
        &self,
        mesh: &mut Mesh,
        v: u32,
        sector: &[FanStep],
        start: &Link,
        end: &Link,
        plan: &mut SplitPlan,
    ) -> Vec<Vec<u32>> {
        let k = sector.len();
        let (enter, leave) = (start.last(), end.first());

        let bridged = |middle: Vec<u32>| -> Vec<Vec<u32>> {
            let at = if k >= 3 { 1 } else { 0 };
            (0..k)
                .map(|i| match i.cmp(&at) {
                    Ordering::Less => vec![enter],
                    Ordering::Equal => middle.clone(),
                    Ordering::Greater => vec![leave],
                })
                .collect()
        };

        if start.edge == end.edge {
            // The only beveled edge here: its ring closes the fan.
            return bridged(start.chain.iter().rev().copied().collect());
        }

        if k == 1 {
            if let Some(miter) = corner_point(mesh, v, &sector[0], self.bevel.amount) {
                mesh.vertices[enter as usize].position = miter;
                plan.alias.insert(leave, enter);
                return vec![vec![enter]];
            }
            return vec![vec![enter, leave]];
        }

        let (Some(p), Some(q)) = (mesh.position(enter), mesh.position(leave)) else {
            return bridged(vec![enter, leave]);
        };
        if p.distance(q) < WELD_DISTANCE {
            plan.alias.insert(leave, enter);
            return vec![vec![enter]; k];
        }
        bridged(vec![enter, leave])
    }

    /// Closes the hole between the rings of a closed fan with one polygon.
    fn cap(&self, mesh: &Mesh, v: u32, beveled: &[&Link], plan: &mut SplitPlan) {
        let mut ring: Vec<u32> = beveled
            .iter()
            .flat_map(|link| link.chain.iter().map(|&r| plan.resolve(r)))
            .collect();
        ring.dedup();
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return;
        }

        let first = &self.ringed[beveled[0].edge];
        let (x, y) = first.cap_pair(v);
        let (x, y) = (plan.resolve(x), plan.resolve(y));
        let n = ring.len();
        if !(0..n).any(|i| ring[i] == x && ring[(i + 1) % n] == y) {
            ring.reverse();
        }

        let material = self
            .bevel
            .material
            .unwrap_or(mesh.faces[first.face_a as usize].material);
        plan.caps.push(Face::new(ring).with_material(material));
    }
}

/// The corner of `face` at `v`, oriented so `enter` is the side reached
/// through `from`. With no `from` the face winding decides.
fn fan_step(mesh: &Mesh, v: u32, face: u32, from: Option<u32>) -> Option<FanStep> {
    let f = &mesh.faces[face as usize];
    let corner = f.corner_of(v)?;
    let n = f.len();
    let prev = f.vertices[(corner + n - 1) % n];
    let next = f.vertices[(corner + 1) % n];
    if prev == next || prev == v || next == v {
        return None;
    }
    let forward = match from {
        None => true,
        Some(u) if u == prev => true,
        Some(u) if u == next => false,
        Some(_) => return None,
    };
    let (enter, exit) = if forward { (prev, next) } else { (next, prev) };
    Some(FanStep {
        face,
        corner,
        enter,
        exit,
        forward,
    })
}

/// Where the offset lines of both edges at a face corner meet.
///
/// Returns `None` when the edges are close to parallel.
fn corner_point(mesh: &Mesh, v: u32, step: &FanStep, amount: f32) -> Option<Vec3> {
    let origin = mesh.position(v)?;
    let d1 = (mesh.position(step.enter)? - origin).normalize_or_zero();
    let d2 = (mesh.position(step.exit)? - origin).normalize_or_zero();
    let sine = d1.cross(d2).length();
    (sine >= MIN_CORNER_SINE).then(|| origin + (d1 + d2) * (amount / sine))
}

/// Ring vertex closest to `target`. Ties keep the earlier ring.
fn nearest(mesh: &Mesh, ring: &[u32], target: Vec3) -> Option<u32> {
    ring.iter().copied().min_by(|&x, &y| {
        let dx = mesh.position(x).map_or(f32::INFINITY, |p| p.distance_squared(target));
        let dy = mesh.position(y).map_or(f32::INFINITY, |p| p.distance_squared(target));
        dx.total_cmp(&dy)
    })
}
