//! Interactive editing for polyedit meshes.
//!
//! [`EditSession`] ties a mesh, its selection and an undo history together:
//! selection queries and operators each become one history record, and a
//! [`MeshSync`] hook tells the host what to rebuild. Pointer input runs
//! through the [`DragState`] machine, which turns presses into clicks or
//! previewed drags of an [`InteractiveOp`].

mod config;
mod drag;
mod session;

pub use config::EditorConfig;
pub use drag::{DragConfig, DragEffect, DragEvent, DragState};
pub use session::{EditSession, InteractiveOp, MeshSync};
