//! Single-face knife cut.

use super::{EditReport, appended};
use crate::{Face, Mesh, Vertex};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A point on a face edge, given as the edge's starting corner and the
/// fraction along it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KnifeHit {
    /// Corner where the edge starts; the edge runs to the next corner.
    pub corner: usize,
    /// Fraction along the edge, strictly between 0 and 1.
    pub t: f32,
}

impl KnifeHit {
    /// Creates a knife hit.
    pub fn new(corner: usize, t: f32) -> Self {
        Self { corner, t }
    }
}

/// Splits one polygon in two along the segment between two edge points.
///
/// Two vertices are inserted at the hit points. The face's corner cycle is
/// split into two runs closed by the new vertices: the first replaces the
/// original face, the second is appended with the same material. No other
/// face is touched, so neighbors sharing the cut edges keep their original
/// (unsplit) edges.
///
/// Both hits on the same edge, out-of-range indices, a line, or `t` outside
/// `(0, 1)` leave the mesh unchanged.
pub fn knife_face(mesh: &mut Mesh, face: u32, a: KnifeHit, b: KnifeHit) -> EditReport {
    let Some(original) = mesh.faces.get(face as usize) else {
        return EditReport::unchanged();
    };
    let n = original.len();
    let valid = original.is_polygon()
        && a.corner < n
        && b.corner < n
        && a.corner != b.corner
        && [a.t, b.t].iter().all(|&t| t > 0.0 && t < 1.0)
        && original
            .vertices
            .iter()
            .all(|&v| (v as usize) < mesh.vertex_count());
    if !valid {
        debug!(face, "knife cut rejected");
        return EditReport::unchanged();
    }

    let (first, second) = if a.corner < b.corner { (a, b) } else { (b, a) };
    let (i, j) = (first.corner, second.corner);

    let vertex_start = mesh.vertex_count();
    let cut_i = split_point(mesh, face, i, first.t);
    let cut_j = split_point(mesh, face, j, second.t);
    let vi = mesh.add_vertex(cut_i);
    let vj = mesh.add_vertex(cut_j);

    let mut original = std::mem::take(&mut mesh.faces[face as usize]);
    original.pad_attribute_indices();
    let v = &original.vertices;

    // Run between the two cuts, then the wrap-around run.
    let mut inner: Vec<(u32, Option<usize>)> = (i + 1..=j).map(|k| (v[k], Some(k))).collect();
    inner.push((vj, None));
    inner.push((vi, None));

    let mut outer: Vec<(u32, Option<usize>)> = (j + 1..n)
        .chain(0..=i)
        .map(|k| (v[k], Some(k)))
        .collect();
    outer.push((vi, None));
    outer.push((vj, None));

    let inner_face = original.from_corners(&inner);
    let outer_face = original.from_corners(&outer);

    let face_start = mesh.face_count();
    mesh.faces[face as usize] = inner_face;
    mesh.add_face(outer_face);

    debug!(face, new_face = face_start, "knife split face");

    EditReport {
        vertices_added: appended(vertex_start, mesh.vertex_count()),
        faces_added: appended(face_start, mesh.face_count()),
        faces_modified: [face].into_iter().collect(),
        ..Default::default()
    }
}

/// Builds the vertex inserted on the edge starting at `corner`.
///
/// UVs and normals are interpolated only when both edge corners have one;
/// the bone weight comes from the nearer end.
fn split_point(mesh: &Mesh, face: u32, corner: usize, t: f32) -> Vertex {
    let f = &mesh.faces[face as usize];
    let next = (corner + 1) % f.len();
    let start = &mesh.vertices[f.vertices[corner] as usize];
    let end = &mesh.vertices[f.vertices[next] as usize];

    let mut vertex = Vertex::new(start.position.lerp(end.position, t));
    if let (Some(uv0), Some(uv1)) = (mesh.corner_uv(face, corner), mesh.corner_uv(face, next)) {
        vertex.uvs.push(uv0.lerp(uv1, t));
    }
    if let (Some(n0), Some(n1)) = (
        mesh.corner_normal(face, corner),
        mesh.corner_normal(face, next),
    ) {
        vertex.normals.push(n0.lerp(n1, t).normalize_or_zero());
    }
    vertex.weight = if t < 0.5 { start.weight } else { end.weight };
    vertex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeshBuilder;
    use glam::{Vec2, Vec3};

    fn unit_quad() -> Mesh {
        let mut builder = MeshBuilder::new();
        builder.vertex_with_uv(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 0.0));
        builder.vertex_with_uv(Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 0.0));
        builder.vertex_with_uv(Vec3::new(1.0, 1.0, 0.0), Vec2::new(1.0, 1.0));
        builder.vertex_with_uv(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, 1.0));
        builder.material(3).quad(0, 1, 2, 3);
        builder.build()
    }

    #[test]
    fn test_knife_conserves_area() {
        let mut mesh = unit_quad();
        let before = mesh.face_area(0);

        let report = knife_face(&mut mesh, 0, KnifeHit::new(0, 0.5), KnifeHit::new(2, 0.5));

        assert_eq!(report.vertices_added, 4..6);
        assert_eq!(report.faces_added, 1..2);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.faces[0].vertices, vec![1, 2, 5, 4]);
        assert_eq!(mesh.faces[1].vertices, vec![3, 0, 4, 5]);
        assert_eq!(mesh.faces[1].material, 3);

        let after = mesh.face_area(0) + mesh.face_area(1);
        assert!((before - after).abs() < 1e-5);
        assert!(mesh.face_normal(0).dot(Vec3::Z) > 0.99);
        assert!(mesh.face_normal(1).dot(Vec3::Z) > 0.99);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_knife_interpolates_attributes() {
        let mut mesh = unit_quad();
        knife_face(&mut mesh, 0, KnifeHit::new(2, 0.25), KnifeHit::new(0, 0.5));
        // Hits are ordered by corner: the corner 0 hit becomes vertex 4.
        assert_eq!(mesh.vertices[4].position, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(mesh.vertices[4].uvs, vec![Vec2::new(0.5, 0.0)]);
        assert_eq!(mesh.vertices[5].position, Vec3::new(0.75, 1.0, 0.0));
        assert!(mesh.vertices[5].normals.is_empty());
    }

    #[test]
    fn test_knife_adjacent_edges_cut_corner() {
        let mut mesh = unit_quad();
        let report = knife_face(&mut mesh, 0, KnifeHit::new(0, 0.5), KnifeHit::new(1, 0.5));
        assert!(!report.is_empty());
        assert_eq!(mesh.faces[0].vertices, vec![1, 5, 4]);
        assert_eq!(mesh.faces[1].vertices, vec![2, 3, 0, 4, 5]);
    }

    #[test]
    fn test_knife_rejects_invalid_input() {
        let mut mesh = unit_quad();
        let snapshot = mesh.clone();

        assert!(knife_face(&mut mesh, 0, KnifeHit::new(1, 0.2), KnifeHit::new(1, 0.7)).is_empty());
        assert!(knife_face(&mut mesh, 0, KnifeHit::new(0, 0.0), KnifeHit::new(2, 0.5)).is_empty());
        assert!(knife_face(&mut mesh, 0, KnifeHit::new(0, 0.5), KnifeHit::new(4, 0.5)).is_empty());
        assert!(knife_face(&mut mesh, 5, KnifeHit::new(0, 0.5), KnifeHit::new(2, 0.5)).is_empty());

        mesh.add_face(Face::line(0, 2));
        let with_line = mesh.clone();
        assert!(knife_face(&mut mesh, 1, KnifeHit::new(0, 0.5), KnifeHit::new(1, 0.5)).is_empty());
        assert_eq!(mesh, with_line);
        mesh.faces.pop();
        assert_eq!(mesh, snapshot);
    }
}
