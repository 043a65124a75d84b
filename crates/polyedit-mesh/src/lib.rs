//! Polygon mesh editing for polyedit.
//!
//! Provides the indexed mesh model, a rebuild-per-query adjacency cache,
//! selection state, selection algorithms (connected regions, belts, edge
//! loops) and in-place topology operators (knife, bevel, extrude, merge).
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use polyedit_mesh::{Bevel, MeshAdjacency, MeshBuilder, VertexPair, select_connected, ElementHit};
//!
//! let mut builder = MeshBuilder::new();
//! builder.vertex(Vec3::new(-1.0, 0.5, 0.0));
//! builder.vertex(Vec3::new(0.0, 0.0, 0.0));
//! builder.vertex(Vec3::new(0.0, 1.0, 0.0));
//! builder.vertex(Vec3::new(1.0, 0.5, 0.0));
//! builder.triangle(0, 1, 2);
//! builder.triangle(1, 3, 2);
//! let mut mesh = builder.build();
//!
//! let adjacency = MeshAdjacency::build(&mesh);
//! let region = select_connected(&mesh, &adjacency, ElementHit::Face(0));
//! assert_eq!(region.faces.len(), 2);
//!
//! let report = Bevel::chamfer(0.1).apply(&mut mesh, [VertexPair::new(1, 2)]);
//! assert_eq!(report.faces_added.len(), 1);
//! ```

mod adjacency;
pub mod edit;
mod error;
mod loops;
mod mesh;
mod region;
mod remap;
mod selection;

pub use adjacency::MeshAdjacency;
pub use edit::{
    Bevel, EditReport, Extrude, ExtrudeNormal, ExtrudeStyle, KnifeHit, Merge, MergePosition,
    MergeScope, bevel_edges, delete_faces, delete_vertices, extrude_faces, flip_faces, knife_face,
    merge_vertices, translate_vertices,
};
pub use error::MeshError;
pub use loops::{Belt, EdgeLoop, select_belt, select_edge_loop};
pub use mesh::{BoneWeight, Face, Mesh, MeshBuilder, Vertex, VertexPair};
pub use region::select_connected;
pub use remap::{Compaction, IndexRemap};
pub use selection::{ElementHit, ElementKind, ElementMask, ElementSet, SelectOp, SelectionState};
