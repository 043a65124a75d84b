//! Core mesh types.
//!
//! Meshes are indexed polygon soups: faces reference vertices by index, and
//! each face corner may pick one of several UVs / normals stored on its vertex.

use crate::error::MeshError;
use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An unordered pair of vertex indices identifying an edge.
///
/// The smaller index is always stored first, so `VertexPair::new(3, 1)` and
/// `VertexPair::new(1, 3)` compare and hash equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexPair(u32, u32);

impl VertexPair {
    /// Creates a pair from two vertex indices in any order.
    pub fn new(a: u32, b: u32) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    /// The smaller vertex index.
    pub fn low(self) -> u32 {
        self.0
    }

    /// The larger vertex index.
    pub fn high(self) -> u32 {
        self.1
    }

    /// Returns both indices, smaller first.
    pub fn vertices(self) -> (u32, u32) {
        (self.0, self.1)
    }

    /// Returns true if `v` is one of the endpoints.
    pub fn contains(self, v: u32) -> bool {
        self.0 == v || self.1 == v
    }

    /// Returns the endpoint opposite to `v`.
    pub fn other(self, v: u32) -> Option<u32> {
        if self.0 == v {
            Some(self.1)
        } else if self.1 == v {
            Some(self.0)
        } else {
            None
        }
    }

    /// Returns true if both endpoints are the same vertex.
    pub fn is_degenerate(self) -> bool {
        self.0 == self.1
    }
}

impl From<(u32, u32)> for VertexPair {
    fn from((a, b): (u32, u32)) -> Self {
        Self::new(a, b)
    }
}

/// Skinning influences for a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoneWeight {
    /// Bone indices.
    pub bones: [u32; 4],
    /// Weight per bone; unused slots are zero.
    pub weights: [f32; 4],
}

impl BoneWeight {
    /// A vertex bound entirely to one bone.
    pub fn single(bone: u32) -> Self {
        Self {
            bones: [bone, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// A mesh vertex.
///
/// A vertex may carry several UVs and normals; face corners select one of
/// them through their attribute-index lists.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Position in model space.
    pub position: Vec3,
    /// Texture coordinates referenced by face corners.
    pub uvs: Vec<Vec2>,
    /// Normals referenced by face corners.
    pub normals: Vec<Vec3>,
    /// Optional skinning record.
    pub weight: Option<BoneWeight>,
}

impl Vertex {
    /// Creates a vertex with a position and no attributes.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Appends a UV coordinate.
    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uvs.push(uv);
        self
    }

    /// Appends a normal.
    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normals.push(normal);
        self
    }

    /// Copies this vertex's attributes onto a new position.
    pub fn moved_to(&self, position: Vec3) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }
}

/// A polygon face or a two-vertex construction line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Face {
    /// Vertex indices in winding order.
    pub vertices: Vec<u32>,
    /// Per-corner index into the vertex's UV list. Empty means index 0.
    pub uv_indices: Vec<u32>,
    /// Per-corner index into the vertex's normal list. Empty means index 0.
    pub normal_indices: Vec<u32>,
    /// Material index.
    pub material: u32,
}

impl Face {
    /// Creates a face from vertex indices.
    pub fn new(vertices: Vec<u32>) -> Self {
        Self {
            vertices,
            ..Default::default()
        }
    }

    /// Creates a construction line between two vertices.
    pub fn line(a: u32, b: u32) -> Self {
        Self::new(vec![a, b])
    }

    /// Sets the material index.
    pub fn with_material(mut self, material: u32) -> Self {
        self.material = material;
        self
    }

    /// Number of corners.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the face has no corners.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns true for two-vertex construction lines.
    pub fn is_line(&self) -> bool {
        self.vertices.len() == 2
    }

    /// Returns true for faces with at least three corners.
    pub fn is_polygon(&self) -> bool {
        self.vertices.len() >= 3
    }

    /// Iterates the directed edges of the face cycle.
    ///
    /// A line yields its single edge once; a polygon yields one edge per corner.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let n = self.vertices.len();
        let count = match n {
            0 | 1 => 0,
            2 => 1,
            _ => n,
        };
        (0..count).map(move |k| (self.vertices[k], self.vertices[(k + 1) % n]))
    }

    /// Returns the corner at which vertex `v` appears first.
    pub fn corner_of(&self, v: u32) -> Option<usize> {
        self.vertices.iter().position(|&x| x == v)
    }

    /// Returns the corner `k` whose edge `k -> k + 1` runs from `a` to `b`.
    pub fn directed_edge_corner(&self, a: u32, b: u32) -> Option<usize> {
        let n = self.vertices.len();
        if n < 2 {
            return None;
        }
        (0..n).find(|&k| self.vertices[k] == a && self.vertices[(k + 1) % n] == b)
    }

    /// Returns true if the face cycle contains the edge in either direction.
    pub fn contains_edge(&self, pair: VertexPair) -> bool {
        self.edges().any(|(a, b)| VertexPair::new(a, b) == pair)
    }

    /// UV index used by a corner.
    pub fn uv_index(&self, corner: usize) -> u32 {
        self.uv_indices.get(corner).copied().unwrap_or(0)
    }

    /// Normal index used by a corner.
    pub fn normal_index(&self, corner: usize) -> u32 {
        self.normal_indices.get(corner).copied().unwrap_or(0)
    }

    /// Pads non-empty attribute-index lists to the corner count.
    ///
    /// Must run before any operator consumes per-corner attributes.
    pub fn pad_attribute_indices(&mut self) {
        let n = self.vertices.len();
        if !self.uv_indices.is_empty() {
            self.uv_indices.resize(n, 0);
        }
        if !self.normal_indices.is_empty() {
            self.normal_indices.resize(n, 0);
        }
    }

    /// Reverses the winding, keeping attribute indices on their corners.
    pub fn reverse(&mut self) {
        self.pad_attribute_indices();
        self.vertices.reverse();
        self.uv_indices.reverse();
        self.normal_indices.reverse();
    }

    /// Builds a face from a subset of this face's corners.
    ///
    /// `corners` entries of `None` are new vertices given by the paired index;
    /// they use attribute index 0.
    pub(crate) fn from_corners(&self, corners: &[(u32, Option<usize>)]) -> Self {
        let vertices = corners.iter().map(|&(v, _)| v).collect();
        let pick = |list: &Vec<u32>| -> Vec<u32> {
            if list.is_empty() {
                return Vec::new();
            }
            corners
                .iter()
                .map(|&(_, corner)| corner.and_then(|c| list.get(c).copied()).unwrap_or(0))
                .collect()
        };
        Self {
            vertices,
            uv_indices: pick(&self.uv_indices),
            normal_indices: pick(&self.normal_indices),
            material: self.material,
        }
    }
}

/// An indexed polygon mesh.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    /// Vertex array.
    pub vertices: Vec<Vertex>,
    /// Faces and construction lines.
    pub faces: Vec<Face>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    /// Returns the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of faces, lines included.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    /// Appends a face and returns its index.
    pub fn add_face(&mut self, face: Face) -> u32 {
        let index = self.faces.len() as u32;
        self.faces.push(face);
        index
    }

    /// Position of a vertex.
    pub fn position(&self, vertex: u32) -> Option<Vec3> {
        self.vertices.get(vertex as usize).map(|v| v.position)
    }

    /// Sum of `p[k] x p[k+1]` around the face: twice the vector area.
    fn newell_vector(&self, face: u32) -> Vec3 {
        let Some(f) = self.faces.get(face as usize) else {
            return Vec3::ZERO;
        };
        if !f.is_polygon() {
            return Vec3::ZERO;
        }
        let n = f.vertices.len();
        let mut sum = Vec3::ZERO;
        for k in 0..n {
            let cur = self.position(f.vertices[k]).unwrap_or(Vec3::ZERO);
            let next = self.position(f.vertices[(k + 1) % n]).unwrap_or(Vec3::ZERO);
            sum += cur.cross(next);
        }
        sum
    }

    /// Unit normal of a polygon (zero for lines and degenerate faces).
    pub fn face_normal(&self, face: u32) -> Vec3 {
        self.newell_vector(face).normalize_or_zero()
    }

    /// Area of a (planar) polygon.
    pub fn face_area(&self, face: u32) -> f32 {
        self.newell_vector(face).length() * 0.5
    }

    /// Average of the face's corner positions.
    pub fn face_centroid(&self, face: u32) -> Vec3 {
        let Some(f) = self.faces.get(face as usize) else {
            return Vec3::ZERO;
        };
        if f.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = f
            .vertices
            .iter()
            .filter_map(|&v| self.position(v))
            .sum();
        sum / f.len() as f32
    }

    /// UV used by a face corner, if the vertex has one at that index.
    pub fn corner_uv(&self, face: u32, corner: usize) -> Option<Vec2> {
        let f = self.faces.get(face as usize)?;
        let v = *f.vertices.get(corner)?;
        let vertex = self.vertices.get(v as usize)?;
        vertex.uvs.get(f.uv_index(corner) as usize).copied()
    }

    /// Normal used by a face corner, if the vertex has one at that index.
    pub fn corner_normal(&self, face: u32, corner: usize) -> Option<Vec3> {
        let f = self.faces.get(face as usize)?;
        let v = *f.vertices.get(corner)?;
        let vertex = self.vertices.get(v as usize)?;
        vertex.normals.get(f.normal_index(corner) as usize).copied()
    }

    /// All distinct edges of polygons and lines.
    pub fn edges(&self) -> BTreeSet<VertexPair> {
        self.faces
            .iter()
            .flat_map(|f| f.edges())
            .map(|(a, b)| VertexPair::new(a, b))
            .filter(|p| !p.is_degenerate())
            .collect()
    }

    /// Indices of polygons whose cycle contains the edge.
    ///
    /// Linear scan; use [`crate::MeshAdjacency`] for repeated queries.
    pub fn faces_with_edge(&self, pair: VertexPair) -> Vec<u32> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_polygon() && f.contains_edge(pair))
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Flags, per vertex, whether any face references it.
    pub fn referenced_vertices(&self) -> Vec<bool> {
        let mut used = vec![false; self.vertices.len()];
        for face in &self.faces {
            for &v in &face.vertices {
                if let Some(slot) = used.get_mut(v as usize) {
                    *slot = true;
                }
            }
        }
        used
    }

    /// Pads every face's attribute-index lists.
    pub fn pad_attribute_indices(&mut self) {
        for face in &mut self.faces {
            face.pad_attribute_indices();
        }
    }

    /// Checks the index invariants of the mesh.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        for (fi, face) in self.faces.iter().enumerate() {
            let face_id = fi as u32;
            if face.len() < 2 {
                return Err(MeshError::TooFewVertices {
                    face: face_id,
                    len: face.len(),
                });
            }
            for (attribute, list) in [("uv", &face.uv_indices), ("normal", &face.normal_indices)] {
                if !list.is_empty() && list.len() != face.len() {
                    return Err(MeshError::AttributeLength {
                        face: face_id,
                        attribute,
                        len: list.len(),
                        expected: face.len(),
                    });
                }
            }
            for (corner, &v) in face.vertices.iter().enumerate() {
                let Some(vertex) = self.vertices.get(v as usize) else {
                    return Err(MeshError::VertexOutOfRange {
                        face: face_id,
                        vertex: v,
                        vertex_count,
                    });
                };
                if !face.uv_indices.is_empty() && face.uv_index(corner) as usize >= vertex.uvs.len()
                {
                    return Err(MeshError::AttributeOutOfRange {
                        face: face_id,
                        corner,
                        attribute: "uv",
                        index: face.uv_index(corner),
                        available: vertex.uvs.len(),
                    });
                }
                if !face.normal_indices.is_empty()
                    && face.normal_index(corner) as usize >= vertex.normals.len()
                {
                    return Err(MeshError::AttributeOutOfRange {
                        face: face_id,
                        corner,
                        attribute: "normal",
                        index: face.normal_index(corner),
                        available: vertex.normals.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builder for constructing meshes vertex by vertex.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    mesh: Mesh,
    material: u32,
}

impl MeshBuilder {
    /// Creates a new mesh builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex with position only.
    pub fn vertex(&mut self, position: Vec3) -> u32 {
        self.mesh.add_vertex(Vertex::new(position))
    }

    /// Adds a vertex with position and one UV.
    pub fn vertex_with_uv(&mut self, position: Vec3, uv: Vec2) -> u32 {
        self.mesh.add_vertex(Vertex::new(position).with_uv(uv))
    }

    /// Adds a vertex with position, one UV and one normal.
    pub fn vertex_with_attributes(&mut self, position: Vec3, uv: Vec2, normal: Vec3) -> u32 {
        self.mesh
            .add_vertex(Vertex::new(position).with_uv(uv).with_normal(normal))
    }

    /// Sets the material used by subsequently added faces.
    pub fn material(&mut self, material: u32) -> &mut Self {
        self.material = material;
        self
    }

    /// Adds a polygon from vertex indices.
    pub fn polygon(&mut self, vertices: &[u32]) -> u32 {
        self.mesh
            .add_face(Face::new(vertices.to_vec()).with_material(self.material))
    }

    /// Adds a triangle.
    pub fn triangle(&mut self, i0: u32, i1: u32, i2: u32) -> u32 {
        self.polygon(&[i0, i1, i2])
    }

    /// Adds a quad.
    pub fn quad(&mut self, i0: u32, i1: u32, i2: u32, i3: u32) -> u32 {
        self.polygon(&[i0, i1, i2, i3])
    }

    /// Adds a construction line.
    pub fn line(&mut self, a: u32, b: u32) -> u32 {
        self.mesh
            .add_face(Face::line(a, b).with_material(self.material))
    }

    /// Builds the final mesh.
    pub fn build(self) -> Mesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Mesh {
        let mut builder = MeshBuilder::new();
        let v0 = builder.vertex(Vec3::new(0.0, 0.0, 0.0));
        let v1 = builder.vertex(Vec3::new(1.0, 0.0, 0.0));
        let v2 = builder.vertex(Vec3::new(1.0, 1.0, 0.0));
        let v3 = builder.vertex(Vec3::new(0.0, 1.0, 0.0));
        builder.quad(v0, v1, v2, v3);
        builder.build()
    }

    #[test]
    fn test_vertex_pair_is_unordered() {
        assert_eq!(VertexPair::new(3, 1), VertexPair::new(1, 3));
        assert_eq!(VertexPair::new(3, 1).vertices(), (1, 3));
        assert_eq!(VertexPair::new(3, 1).other(3), Some(1));
        assert_eq!(VertexPair::new(3, 1).other(2), None);
    }

    #[test]
    fn test_face_edges() {
        let quad = Face::new(vec![0, 1, 2, 3]);
        let edges: Vec<_> = quad.edges().collect();
        assert_eq!(edges, vec![(0, 1), (1, 2), (2, 3), (3, 0)]);

        let line = Face::line(4, 5);
        assert_eq!(line.edges().collect::<Vec<_>>(), vec![(4, 5)]);
        assert!(line.is_line());
        assert!(!line.is_polygon());
    }

    #[test]
    fn test_directed_edge_corner() {
        let quad = Face::new(vec![0, 1, 2, 3]);
        assert_eq!(quad.directed_edge_corner(3, 0), Some(3));
        assert_eq!(quad.directed_edge_corner(0, 3), None);
        assert!(quad.contains_edge(VertexPair::new(0, 3)));
    }

    #[test]
    fn test_face_normal_and_area() {
        let mesh = unit_quad();
        assert!((mesh.face_normal(0) - Vec3::Z).length() < 1e-6);
        assert!((mesh.face_area(0) - 1.0).abs() < 1e-6);
        assert!((mesh.face_centroid(0) - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_pad_attribute_indices() {
        let mut face = Face::new(vec![0, 1, 2]);
        face.pad_attribute_indices();
        assert!(face.uv_indices.is_empty());

        face.uv_indices = vec![1];
        face.pad_attribute_indices();
        assert_eq!(face.uv_indices, vec![1, 0, 0]);
    }

    #[test]
    fn test_reverse_keeps_corner_attributes() {
        let mut face = Face::new(vec![0, 1, 2]);
        face.uv_indices = vec![5, 6, 7];
        face.reverse();
        assert_eq!(face.vertices, vec![2, 1, 0]);
        assert_eq!(face.uv_indices, vec![7, 6, 5]);
    }

    #[test]
    fn test_corner_attributes() {
        let mut builder = MeshBuilder::new();
        let a = builder.vertex_with_uv(Vec3::ZERO, Vec2::new(0.25, 0.5));
        let b = builder.vertex(Vec3::X);
        let c = builder.vertex(Vec3::Y);
        builder.triangle(a, b, c);
        let mesh = builder.build();

        assert_eq!(mesh.corner_uv(0, 0), Some(Vec2::new(0.25, 0.5)));
        assert_eq!(mesh.corner_uv(0, 1), None);
        assert_eq!(mesh.corner_normal(0, 0), None);
    }

    #[test]
    fn test_validate() {
        let mut mesh = unit_quad();
        assert!(mesh.validate().is_ok());

        mesh.faces[0].vertices[2] = 10;
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::VertexOutOfRange { vertex: 10, .. })
        ));

        let mut mesh = unit_quad();
        mesh.faces[0].uv_indices = vec![0, 0];
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::AttributeLength { attribute: "uv", .. })
        ));
    }

    #[test]
    fn test_mesh_edges_include_lines() {
        let mut mesh = unit_quad();
        mesh.add_face(Face::line(0, 2));
        let edges = mesh.edges();
        assert_eq!(edges.len(), 5);
        assert!(edges.contains(&VertexPair::new(2, 0)));
        assert_eq!(mesh.faces_with_edge(VertexPair::new(0, 2)), Vec::<u32>::new());
        assert_eq!(mesh.faces_with_edge(VertexPair::new(0, 1)), vec![0]);
    }

    #[test]
    fn test_referenced_vertices() {
        let mut mesh = unit_quad();
        mesh.add_vertex(Vertex::new(Vec3::splat(5.0)));
        assert_eq!(mesh.referenced_vertices(), vec![true, true, true, true, false]);
    }
}
