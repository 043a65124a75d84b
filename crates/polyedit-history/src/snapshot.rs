//! Full mesh snapshots.

use polyedit_mesh::{Mesh, SelectionState};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A copy of the mesh, and optionally the selection, at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshSnapshot {
    /// The captured mesh.
    pub mesh: Mesh,
    /// The captured selection, if it was included.
    pub selection: Option<SelectionState>,
}

impl MeshSnapshot {
    /// Captures the current state.
    pub fn capture(mesh: &Mesh, selection: Option<&SelectionState>) -> Self {
        Self {
            mesh: mesh.clone(),
            selection: selection.cloned(),
        }
    }

    /// Writes the snapshot back.
    ///
    /// Without a captured selection the live selection is kept, minus
    /// entries that no longer exist in the restored mesh.
    pub fn restore(&self, mesh: &mut Mesh, selection: &mut SelectionState) {
        mesh.clone_from(&self.mesh);
        match &self.selection {
            Some(captured) => selection.clone_from(captured),
            None => selection.retain_valid(mesh),
        }
    }
}
