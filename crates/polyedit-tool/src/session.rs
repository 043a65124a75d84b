//! Editing session.
//!
//! [`EditSession`] owns the mesh, its selection and the undo history. Every
//! selection query and operator runs inside [`EditSession::edit`], which
//! brackets it with snapshots, records one history entry and tells the host
//! what to refresh through [`MeshSync`].

use crate::config::EditorConfig;
use crate::drag::{DragEffect, DragEvent, DragState};
use glam::Vec3;
use polyedit_history::{EditHistory, HistoryError, MeshSnapshot, UpdateLevel};
use polyedit_mesh::{
    Bevel, EditReport, ElementHit, ElementKind, ElementMask, ElementSet, Extrude, KnifeHit, Merge,
    MergeScope, Mesh, MeshAdjacency, SelectOp, SelectionState, VertexPair, delete_faces,
    flip_faces, knife_face, select_belt, select_connected, select_edge_loop, translate_vertices,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Host hook called after the mesh (or the preview) changes.
///
/// `level` says how much derived state the host must rebuild.
pub trait MeshSync {
    /// Brings the host in line with `mesh`.
    fn sync(&mut self, mesh: &Mesh, level: UpdateLevel);
}

impl<F> MeshSync for F
where
    F: FnMut(&Mesh, UpdateLevel),
{
    fn sync(&mut self, mesh: &Mesh, level: UpdateLevel) {
        self(mesh, level)
    }
}

/// Operator driven by pointer drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InteractiveOp {
    /// Bevels the selected edges; the drag sets the width.
    Bevel,
    /// Extrudes the selected faces; the drag sets the distance.
    Extrude,
}

impl InteractiveOp {
    /// History label.
    pub fn label(self) -> &'static str {
        match self {
            InteractiveOp::Bevel => "Bevel",
            InteractiveOp::Extrude => "Extrude",
        }
    }

    /// Bevel widths cannot be negative; extrusions may go inward.
    fn clamp(self, amount: f32) -> f32 {
        match self {
            InteractiveOp::Bevel => amount.max(0.0),
            InteractiveOp::Extrude => amount,
        }
    }
}

struct Preview {
    op: InteractiveOp,
    mesh: Mesh,
}

/// A mesh under interactive editing.
pub struct EditSession {
    mesh: Mesh,
    selection: SelectionState,
    history: EditHistory,
    config: EditorConfig,
    sync: Option<Box<dyn MeshSync>>,
    drag: DragState,
    tool: Option<InteractiveOp>,
    preview: Option<Preview>,
}

impl EditSession {
    /// Starts a session on `mesh` with an empty selection and history.
    pub fn new(mesh: Mesh, config: EditorConfig) -> Self {
        Self {
            mesh,
            selection: SelectionState::new(),
            history: EditHistory::new(config.history.clone()),
            config,
            sync: None,
            drag: DragState::Idle,
            tool: None,
            preview: None,
        }
    }

    /// Installs the host hook.
    pub fn with_sync(mut self, sync: impl MeshSync + 'static) -> Self {
        self.sync = Some(Box::new(sync));
        self
    }

    /// Replaces the host hook.
    pub fn set_sync(&mut self, sync: Option<Box<dyn MeshSync>>) {
        self.sync = sync;
    }

    /// The committed mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Consumes the session, returning the committed mesh.
    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    /// The current selection.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The undo history.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// The session configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current drag state.
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Operator that drags drive, if any.
    pub fn tool(&self) -> Option<InteractiveOp> {
        self.tool
    }

    /// Switches the drag operator. A live preview is discarded.
    pub fn set_tool(&mut self, tool: Option<InteractiveOp>) {
        self.reset_drag();
        self.tool = tool;
    }

    /// The mesh shown while a drag is live.
    pub fn preview_mesh(&self) -> Option<&Mesh> {
        self.preview.as_ref().map(|p| &p.mesh)
    }

    /// Adjacency of the committed mesh, built fresh.
    pub fn adjacency(&self) -> MeshAdjacency {
        MeshAdjacency::build(&self.mesh)
    }

    /// Runs `f` as one undoable edit.
    ///
    /// The change is classified from snapshots taken around `f`. If it needs
    /// a costlier level than `declared`, the mesh and selection are put back
    /// and [`HistoryError::LevelUnderstated`] is returned. Returns the
    /// recorded level, or `None` if `f` changed nothing.
    pub fn edit<F>(
        &mut self,
        label: &str,
        declared: UpdateLevel,
        f: F,
    ) -> Result<Option<UpdateLevel>, HistoryError>
    where
        F: FnOnce(&mut Mesh, &mut SelectionState),
    {
        let before = self.snapshot();
        f(&mut self.mesh, &mut self.selection);
        let after = self.snapshot();

        if let Some(required) = UpdateLevel::classify(&before, &after) {
            if declared < required {
                before.restore(&mut self.mesh, &mut self.selection);
                return Err(HistoryError::LevelUnderstated { declared, required });
            }
        }

        let level = self.history.commit(before, after, declared, label)?;
        if let Some(level) = level {
            self.notify(level);
        }
        Ok(level)
    }

    /// Reverts the last edit.
    pub fn undo(&mut self) -> Result<UpdateLevel, HistoryError> {
        self.reset_drag();
        let level = self.history.undo(&mut self.mesh, &mut self.selection)?;
        self.notify(level);
        Ok(level)
    }

    /// Reapplies the last undone edit.
    pub fn redo(&mut self) -> Result<UpdateLevel, HistoryError> {
        self.reset_drag();
        let level = self.history.redo(&mut self.mesh, &mut self.selection)?;
        self.notify(level);
        Ok(level)
    }

    // Selection

    /// Applies a picked element. Clicking empty space with
    /// [`SelectOp::Replace`] clears the selection.
    pub fn click(
        &mut self,
        hit: Option<ElementHit>,
        op: SelectOp,
    ) -> Result<Option<UpdateLevel>, HistoryError> {
        self.edit("Select", UpdateLevel::Selection, |mesh, selection| {
            match hit.filter(|h| h.is_valid(mesh)) {
                Some(hit) => selection.select_hit(hit, op),
                None if op == SelectOp::Replace => {
                    selection.apply(&ElementSet::new(), SelectOp::Replace)
                }
                None => {}
            }
        })
    }

    /// Selects everything connected to `hit`.
    pub fn select_connected(
        &mut self,
        hit: ElementHit,
        op: SelectOp,
    ) -> Result<Option<UpdateLevel>, HistoryError> {
        let set = select_connected(&self.mesh, &self.adjacency(), hit);
        self.select_set("Select connected", &set, op)
    }

    /// Selects the quad belt crossing `seed`, edges and faces.
    pub fn select_belt(
        &mut self,
        seed: VertexPair,
        op: SelectOp,
    ) -> Result<Option<UpdateLevel>, HistoryError> {
        let belt = select_belt(&self.mesh, &self.adjacency(), seed);
        let set = ElementSet {
            edges: belt.edges.into_iter().collect(),
            faces: belt.faces,
            ..Default::default()
        };
        self.select_set("Select belt", &set, op)
    }

    /// Selects the edge loop through `seed` using the configured threshold.
    pub fn select_edge_loop(
        &mut self,
        seed: VertexPair,
        op: SelectOp,
    ) -> Result<Option<UpdateLevel>, HistoryError> {
        let edge_loop = select_edge_loop(
            &self.mesh,
            &self.adjacency(),
            seed,
            self.config.loop_threshold,
        );
        let set = ElementSet {
            edges: edge_loop.edges.into_iter().collect(),
            ..Default::default()
        };
        self.select_set("Select loop", &set, op)
    }

    /// Selects every element of every kind.
    pub fn select_all(&mut self) -> Result<Option<UpdateLevel>, HistoryError> {
        self.edit("Select all", UpdateLevel::Selection, |mesh, selection| {
            selection.select_all(mesh)
        })
    }

    /// Inverts the selection of one element kind.
    pub fn invert_selection(&mut self, kind: ElementKind) -> Result<Option<UpdateLevel>, HistoryError> {
        self.edit("Invert selection", UpdateLevel::Selection, |mesh, selection| {
            selection.invert(mesh, kind)
        })
    }

    /// Deselects everything.
    pub fn clear_selection(&mut self) -> Result<Option<UpdateLevel>, HistoryError> {
        self.edit("Clear selection", UpdateLevel::Selection, |_, selection| {
            selection.clear()
        })
    }

    /// Changes which element types selection queries affect.
    pub fn set_mask(&mut self, mask: ElementMask) -> Result<Option<UpdateLevel>, HistoryError> {
        self.edit("Selection mode", UpdateLevel::Selection, |_, selection| {
            selection.mask = mask
        })
    }

    fn select_set(
        &mut self,
        label: &str,
        set: &ElementSet,
        op: SelectOp,
    ) -> Result<Option<UpdateLevel>, HistoryError> {
        self.edit(label, UpdateLevel::Selection, |_, selection| {
            selection.apply(set, op)
        })
    }

    // Operators

    /// Splits `face` between two edge hits.
    pub fn knife(&mut self, face: u32, a: KnifeHit, b: KnifeHit) -> Result<EditReport, HistoryError> {
        self.operate("Knife", UpdateLevel::Topology, |mesh, _| {
            knife_face(mesh, face, a, b)
        })
    }

    /// Bevels the selected edges with the configured profile.
    pub fn bevel_selected(&mut self, amount: f32) -> Result<EditReport, HistoryError> {
        let bevel = self.bevel(amount);
        self.operate("Bevel", UpdateLevel::Topology, |mesh, selection| {
            bevel.apply(mesh, selection.elements.edges.iter().copied())
        })
    }

    /// Extrudes the selected faces.
    pub fn extrude_selected(&mut self, distance: f32) -> Result<EditReport, HistoryError> {
        let extrude = Extrude::new(distance);
        self.operate("Extrude", UpdateLevel::Topology, |mesh, selection| {
            extrude.apply(mesh, selection.elements.faces.iter().copied())
        })
    }

    /// Welds coincident vertices among those the selection covers.
    pub fn merge_selected(&mut self) -> Result<EditReport, HistoryError> {
        let merge = Merge::new(self.config.merge_threshold);
        self.operate("Merge", UpdateLevel::Topology, |mesh, selection| {
            let scope = MergeScope::Vertices(selection.covered_vertices(mesh));
            merge.apply(mesh, &scope)
        })
    }

    /// Welds coincident vertices across the whole mesh.
    pub fn merge_all(&mut self) -> Result<EditReport, HistoryError> {
        let merge = Merge::new(self.config.merge_threshold);
        self.operate("Merge all", UpdateLevel::Topology, |mesh, _| {
            merge.apply(mesh, &MergeScope::All)
        })
    }

    /// Deletes the selected faces and lines.
    pub fn delete_selected(&mut self, remove_orphans: bool) -> Result<EditReport, HistoryError> {
        self.operate("Delete", UpdateLevel::Topology, |mesh, selection| {
            let faces = selection.elements.faces.iter().chain(&selection.elements.lines);
            delete_faces(mesh, faces.copied(), remove_orphans)
        })
    }

    /// Reverses the winding of the selected faces.
    pub fn flip_selected(&mut self) -> Result<EditReport, HistoryError> {
        self.operate("Flip", UpdateLevel::Topology, |mesh, selection| {
            flip_faces(mesh, selection.elements.faces.iter().copied())
        })
    }

    /// Moves every vertex the selection covers.
    pub fn translate_selected(&mut self, offset: Vec3) -> Result<EditReport, HistoryError> {
        self.operate("Move", UpdateLevel::Position, |mesh, selection| {
            let vertices = selection.covered_vertices(mesh);
            translate_vertices(mesh, vertices, offset)
        })
    }

    /// Runs an operator inside [`EditSession::edit`] and carries the
    /// selection over to the edited mesh.
    fn operate<F>(
        &mut self,
        label: &str,
        declared: UpdateLevel,
        op: F,
    ) -> Result<EditReport, HistoryError>
    where
        F: FnOnce(&mut Mesh, &SelectionState) -> EditReport,
    {
        let mut report = EditReport::unchanged();
        self.edit(label, declared, |mesh, selection| {
            report = op(mesh, selection);
            report.apply_to_selection(mesh, selection);
        })?;
        Ok(report)
    }

    fn bevel(&self, amount: f32) -> Bevel {
        Bevel {
            amount,
            segments: self.config.bevel_segments.max(1),
            fillet: self.config.bevel_fillet,
            ..Default::default()
        }
    }

    // Pointer

    /// Feeds one pointer event through the drag machine and carries out the
    /// resulting effects.
    ///
    /// Previews run on a scratch copy; the committed mesh only changes on a
    /// successful release, as a single history record.
    pub fn pointer(&mut self, event: DragEvent) -> Result<Vec<DragEffect>, HistoryError> {
        let (state, effects) = self.drag.handle(event, &self.config.drag);
        self.drag = state;

        for effect in &effects {
            match *effect {
                DragEffect::BeginPreview => self.begin_preview(),
                DragEffect::UpdatePreview { amount } => self.update_preview(amount),
                DragEffect::Commit { amount } => self.commit_preview(amount)?,
                DragEffect::Discard => self.discard_preview(),
                DragEffect::Click { hit } => {
                    self.click(hit, SelectOp::Replace)?;
                }
            }
        }
        Ok(effects)
    }

    fn begin_preview(&mut self) {
        if let Some(op) = self.tool {
            debug!(?op, "begin preview");
            self.preview = Some(Preview {
                op,
                mesh: self.mesh.clone(),
            });
        }
    }

    fn update_preview(&mut self, amount: f32) {
        let Some(op) = self.preview.as_ref().map(|p| p.op) else {
            return;
        };
        let mut scratch = self.mesh.clone();
        let amount = op.clamp(amount);
        match op {
            InteractiveOp::Bevel => {
                self.bevel(amount)
                    .apply(&mut scratch, self.selection.elements.edges.iter().copied());
            }
            InteractiveOp::Extrude => {
                Extrude::new(amount)
                    .apply(&mut scratch, self.selection.elements.faces.iter().copied());
            }
        }

        if let Some(preview) = self.preview.as_mut() {
            preview.mesh = scratch;
            if let Some(sync) = self.sync.as_mut() {
                sync.sync(&preview.mesh, UpdateLevel::Topology);
            }
        }
    }

    fn commit_preview(&mut self, amount: f32) -> Result<(), HistoryError> {
        let Some(preview) = self.preview.take() else {
            return Ok(());
        };
        let amount = preview.op.clamp(amount);
        debug!(op = ?preview.op, amount, "commit preview");
        match preview.op {
            InteractiveOp::Bevel => self.bevel_selected(amount)?,
            InteractiveOp::Extrude => self.extrude_selected(amount)?,
        };
        Ok(())
    }

    fn reset_drag(&mut self) {
        self.discard_preview();
        self.drag = DragState::Idle;
    }

    fn discard_preview(&mut self) {
        if self.preview.take().is_some() {
            debug!("discard preview");
            self.notify(UpdateLevel::Topology);
        }
    }

    fn snapshot(&self) -> MeshSnapshot {
        let selection = self
            .config
            .include_selection_in_snapshots
            .then_some(&self.selection);
        MeshSnapshot::capture(&self.mesh, selection)
    }

    fn notify(&mut self, level: UpdateLevel) {
        if let Some(sync) = self.sync.as_mut() {
            sync.sync(&self.mesh, level);
        }
    }
}
