//! Undo/redo for polyedit meshes.
//!
//! Edits are bracketed by [`MeshSnapshot`]s and classified into an
//! [`UpdateLevel`]. [`EditHistory`] stores each record at the cost of its
//! level, so selection clicks and vertex drags stay cheap while topology
//! edits keep full snapshots.

mod error;
mod history;
mod level;
mod sink;
mod snapshot;

pub use error::HistoryError;
pub use history::{EditHistory, EditRecord, HistoryConfig};
pub use level::UpdateLevel;
pub use sink::UndoSink;
pub use snapshot::MeshSnapshot;
