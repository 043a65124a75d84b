//! History error types.

use crate::UpdateLevel;
use thiserror::Error;

/// Errors that can occur during history operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// No more undo steps available.
    #[error("nothing to undo")]
    NothingToUndo,

    /// No more redo steps available.
    #[error("nothing to redo")]
    NothingToRedo,

    /// The caller declared a cheaper update than the edit actually needs.
    #[error("edit declared as {declared:?} but changed {required:?}")]
    LevelUnderstated {
        /// Level given by the caller.
        declared: UpdateLevel,
        /// Level observed by comparing the snapshots.
        required: UpdateLevel,
    },

    /// A position-only record was applied to a mesh with a different vertex count.
    #[error("position record holds {expected} vertices, mesh has {found}")]
    VertexCountMismatch {
        /// Vertices stored in the record.
        expected: usize,
        /// Vertices in the mesh.
        found: usize,
    },
}
