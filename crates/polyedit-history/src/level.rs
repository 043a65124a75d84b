//! Update levels.

use crate::MeshSnapshot;
use polyedit_mesh::Mesh;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How much of the host's derived state an edit invalidates.
///
/// Levels are ordered: a host that handles `Topology` also handles the
/// cheaper levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UpdateLevel {
    /// Only the selection changed.
    Selection,
    /// Vertex data changed; connectivity is the same.
    Position,
    /// Vertex or face counts, face index lists or materials changed.
    Topology,
}

impl UpdateLevel {
    /// The cheapest level covering the difference between two snapshots.
    ///
    /// Returns `None` if they are identical.
    pub fn classify(before: &MeshSnapshot, after: &MeshSnapshot) -> Option<Self> {
        Self::between_meshes(&before.mesh, &after.mesh).or_else(|| {
            (before.selection != after.selection).then_some(UpdateLevel::Selection)
        })
    }

    /// Like [`UpdateLevel::classify`], looking at the meshes only.
    pub fn between_meshes(before: &Mesh, after: &Mesh) -> Option<Self> {
        if before.vertex_count() != after.vertex_count() || before.faces != after.faces {
            Some(UpdateLevel::Topology)
        } else if before.vertices != after.vertices {
            Some(UpdateLevel::Position)
        } else {
            None
        }
    }

    /// Returns true if the host must rebuild index buffers.
    pub fn rebuilds_topology(self) -> bool {
        self == UpdateLevel::Topology
    }
}
