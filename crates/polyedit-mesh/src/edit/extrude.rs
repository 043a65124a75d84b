//! Face extrusion.

use super::{EditReport, appended};
use crate::{Mesh, Vertex};
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Direction each face is pushed along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExtrudeNormal {
    /// Each face moves along its own normal.
    #[default]
    PerFace,
    /// All faces move along the average normal of the extruded faces.
    Averaged,
}

/// Shape of the extruded cap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExtrudeStyle {
    /// The cap keeps the face's shape.
    #[default]
    Plain,
    /// The cap is scaled toward its centroid; `scale = 1` matches `Plain`.
    Tapered {
        /// Size of the cap relative to the original face.
        scale: f32,
    },
}

/// Extrudes polygons out of the surface.
///
/// Each polygon gets its own copy of its corner vertices, moved along the
/// normal; side quads join the old and new rings and the polygon itself
/// becomes the cap. Neighboring faces are extruded independently, so shared
/// corners are duplicated once per face.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Extrude {
    /// Distance along the normal (negative pushes inward).
    pub distance: f32,
    /// How the direction is chosen.
    pub normal: ExtrudeNormal,
    /// Cap shape.
    pub style: ExtrudeStyle,
    /// Material of the side quads; `None` uses the extruded face's.
    pub material: Option<u32>,
}

impl Default for Extrude {
    fn default() -> Self {
        Self {
            distance: 1.0,
            normal: ExtrudeNormal::PerFace,
            style: ExtrudeStyle::Plain,
            material: None,
        }
    }
}

impl Extrude {
    /// Creates a plain per-face extrusion.
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            ..Default::default()
        }
    }

    /// Extrudes along the faces' averaged normal.
    pub fn averaged(mut self) -> Self {
        self.normal = ExtrudeNormal::Averaged;
        self
    }

    /// Scales the cap toward its centroid.
    pub fn tapered(mut self, scale: f32) -> Self {
        self.style = ExtrudeStyle::Tapered { scale };
        self
    }

    /// Sets the material of the side quads.
    pub fn with_material(mut self, material: u32) -> Self {
        self.material = Some(material);
        self
    }

    /// Applies this extrusion to `faces` of `mesh`.
    pub fn apply(&self, mesh: &mut Mesh, faces: impl IntoIterator<Item = u32>) -> EditReport {
        extrude_faces(mesh, faces, self)
    }
}

/// Extrudes each polygon in `faces`, in ascending order.
///
/// Lines and unknown indices are ignored.
pub fn extrude_faces(
    mesh: &mut Mesh,
    faces: impl IntoIterator<Item = u32>,
    extrude: &Extrude,
) -> EditReport {
    let vertex_count = mesh.vertex_count();
    let faces: BTreeSet<u32> = faces
        .into_iter()
        .filter(|&f| {
            mesh.faces.get(f as usize).is_some_and(|face| {
                face.is_polygon() && face.vertices.iter().all(|&v| (v as usize) < vertex_count)
            })
        })
        .collect();
    if faces.is_empty() {
        return EditReport::unchanged();
    }

    let shared_normal = match extrude.normal {
        ExtrudeNormal::PerFace => None,
        ExtrudeNormal::Averaged => {
            let sum: Vec3 = faces.iter().map(|&f| mesh.face_normal(f)).sum();
            Some(sum.normalize_or_zero())
        }
    };

    let vertex_start = mesh.vertex_count();
    let face_start = mesh.face_count();

    for &face in &faces {
        let normal = shared_normal.unwrap_or_else(|| mesh.face_normal(face));
        extrude_one(mesh, face, normal * extrude.distance, extrude);
    }

    debug!(
        faces = faces.len(),
        vertices_added = mesh.vertex_count() - vertex_start,
        "extruded faces"
    );

    EditReport {
        vertices_added: appended(vertex_start, mesh.vertex_count()),
        faces_added: appended(face_start, mesh.face_count()),
        faces_modified: faces,
        ..Default::default()
    }
}

fn extrude_one(mesh: &mut Mesh, face: u32, offset: Vec3, extrude: &Extrude) {
    let centroid = mesh.face_centroid(face) + offset;
    let mut original = mesh.faces[face as usize].clone();
    original.pad_attribute_indices();
    let n = original.len();

    let ring: Vec<u32> = original
        .vertices
        .iter()
        .map(|&v| {
            let source = &mesh.vertices[v as usize];
            let moved = source.position + offset;
            let position = match extrude.style {
                ExtrudeStyle::Plain => moved,
                ExtrudeStyle::Tapered { scale } => moved.lerp(centroid, 1.0 - scale),
            };
            let vertex: Vertex = source.moved_to(position);
            mesh.add_vertex(vertex)
        })
        .collect();

    let material = extrude.material.unwrap_or(original.material);
    for k in 0..n {
        let next = (k + 1) % n;
        let side = original
            .from_corners(&[
                (original.vertices[k], Some(k)),
                (original.vertices[next], Some(next)),
                (ring[next], Some(next)),
                (ring[k], Some(k)),
            ])
            .with_material(material);
        mesh.add_face(side);
    }

    // The face becomes the cap over the new ring.
    let cap = &mut mesh.faces[face as usize];
    cap.pad_attribute_indices();
    cap.vertices.clone_from(&ring);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeshBuilder;

    fn two_quads() -> Mesh {
        let mut builder = MeshBuilder::new();
        for y in 0..2 {
            for x in 0..3 {
                builder.vertex(Vec3::new(x as f32, y as f32, 0.0));
            }
        }
        builder.quad(0, 1, 4, 3);
        builder.quad(1, 2, 5, 4);
        builder.build()
    }

    #[test]
    fn test_extrude_single_face() {
        let mut mesh = two_quads();
        let report = extrude_faces(&mut mesh, [0], &Extrude::new(2.0));

        assert_eq!(report.vertices_added, 6..10);
        assert_eq!(report.faces_added, 2..6);
        assert_eq!(mesh.faces[0].vertices, vec![6, 7, 8, 9]);
        for v in 6..10 {
            assert!((mesh.vertices[v].position.z - 2.0).abs() < 1e-6);
        }
        // Side quad over edge 0 -> 1.
        assert_eq!(mesh.faces[2].vertices, vec![0, 1, 7, 6]);
        assert!(mesh.validate().is_ok());

        // Side normals face outward: the first side faces -Y.
        assert!(mesh.face_normal(2).dot(-Vec3::Y) > 0.99);
    }

    #[test]
    fn test_extrude_duplicates_shared_vertices() {
        let mut mesh = two_quads();
        let report = Extrude::new(1.0).apply(&mut mesh, [0, 1]);
        assert_eq!(report.vertices_added.len(), 8);
        assert_eq!(report.faces_added.len(), 8);
        assert_eq!(report.faces_modified.len(), 2);
    }

    #[test]
    fn test_extrude_tapered() {
        let mut mesh = two_quads();
        extrude_faces(&mut mesh, [0], &Extrude::new(1.0).tapered(0.5));
        let cap = &mesh.faces[0];
        let p = mesh.vertices[cap.vertices[0] as usize].position;
        assert!((p - Vec3::new(0.25, 0.25, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_extrude_averaged_normal() {
        let mut builder = MeshBuilder::new();
        builder.vertex(Vec3::new(0.0, 0.0, 0.0));
        builder.vertex(Vec3::new(1.0, 0.0, 0.0));
        builder.vertex(Vec3::new(0.0, 1.0, 0.0));
        builder.vertex(Vec3::new(0.0, 0.0, 1.0));
        builder.triangle(0, 1, 2); // +Z
        builder.triangle(0, 3, 1); // +Y
        let mut mesh = builder.build();

        extrude_faces(&mut mesh, [0, 1], &Extrude::new(1.0).averaged());
        let expected = (Vec3::Z + Vec3::Y).normalize();
        let moved = mesh.vertices[4].position - mesh.vertices[0].position;
        assert!((moved - expected).length() < 1e-5);
    }

    #[test]
    fn test_extrude_ignores_lines() {
        let mut mesh = two_quads();
        mesh.add_face(crate::Face::line(0, 5));
        assert!(extrude_faces(&mut mesh, [2, 9], &Extrude::default()).is_empty());
    }
}
