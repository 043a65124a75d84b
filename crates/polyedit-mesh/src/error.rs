//! Mesh error types.

use thiserror::Error;

/// Violations of the mesh index invariants, reported by [`crate::Mesh::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        /// Offending face.
        face: u32,
        /// Referenced vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A face has fewer corners than a line.
    #[error("face {face} has {len} vertices, at least 2 are required")]
    TooFewVertices {
        /// Offending face.
        face: u32,
        /// Number of corners.
        len: usize,
    },

    /// A non-empty attribute-index list does not match the corner count.
    #[error("face {face} has {len} {attribute} indices, expected {expected}")]
    AttributeLength {
        /// Offending face.
        face: u32,
        /// `"uv"` or `"normal"`.
        attribute: &'static str,
        /// Length of the attribute-index list.
        len: usize,
        /// Number of corners.
        expected: usize,
    },

    /// A corner picks an attribute its vertex does not have.
    #[error("face {face} corner {corner} uses {attribute} {index}, but the vertex has {available}")]
    AttributeOutOfRange {
        /// Offending face.
        face: u32,
        /// Corner within the face.
        corner: usize,
        /// `"uv"` or `"normal"`.
        attribute: &'static str,
        /// Referenced attribute index.
        index: u32,
        /// Number of attributes on the vertex.
        available: usize,
    },
}
