//! Host command-stack integration.

use crate::error::HistoryError;
use crate::{EditHistory, MeshSnapshot, UpdateLevel};

/// Receives committed edits.
///
/// Hosts with their own command stack implement this to take ownership of
/// snapshot pairs; [`EditHistory`] is the built-in implementation.
pub trait UndoSink {
    /// Stores one edit. Returns the level actually recorded, or `None` if
    /// nothing changed.
    fn push(
        &mut self,
        before: MeshSnapshot,
        after: MeshSnapshot,
        level: UpdateLevel,
        label: &str,
    ) -> Result<Option<UpdateLevel>, HistoryError>;
}

impl UndoSink for EditHistory {
    fn push(
        &mut self,
        before: MeshSnapshot,
        after: MeshSnapshot,
        level: UpdateLevel,
        label: &str,
    ) -> Result<Option<UpdateLevel>, HistoryError> {
        self.commit(before, after, level, label)
    }
}
