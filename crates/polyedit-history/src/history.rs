//! Level-aware undo/redo.
//!
//! Each committed edit is stored at the cost its update level needs: a
//! selection change keeps two selections, a position change keeps two vertex
//! arrays, and only topology changes keep whole meshes.

use crate::error::HistoryError;
use crate::{MeshSnapshot, UpdateLevel};
use polyedit_mesh::{Mesh, SelectionState, Vertex};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Configuration for edit history.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryConfig {
    /// Maximum number of records to keep. 0 = unlimited.
    pub max_records: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_records: 100 }
    }
}

impl HistoryConfig {
    /// Creates config with unlimited records.
    pub fn unlimited() -> Self {
        Self { max_records: 0 }
    }

    /// Creates config with a specific limit.
    pub fn with_limit(max: usize) -> Self {
        Self { max_records: max }
    }
}

/// State stored by one record, trimmed to its level.
#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Selection {
        before: Option<SelectionState>,
        after: Option<SelectionState>,
    },
    Position {
        before: Vec<Vertex>,
        after: Vec<Vertex>,
        before_selection: Option<SelectionState>,
        after_selection: Option<SelectionState>,
    },
    Topology {
        before: MeshSnapshot,
        after: MeshSnapshot,
    },
}

impl Payload {
    fn compact(before: MeshSnapshot, after: MeshSnapshot, level: UpdateLevel) -> Self {
        match level {
            UpdateLevel::Selection => Payload::Selection {
                before: before.selection,
                after: after.selection,
            },
            UpdateLevel::Position => Payload::Position {
                before: before.mesh.vertices,
                after: after.mesh.vertices,
                before_selection: before.selection,
                after_selection: after.selection,
            },
            UpdateLevel::Topology => Payload::Topology { before, after },
        }
    }
}

/// One undoable edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    label: String,
    level: UpdateLevel,
    payload: Payload,
}

impl EditRecord {
    /// Creates a record, keeping only what `level` needs.
    pub fn new(
        label: impl Into<String>,
        level: UpdateLevel,
        before: MeshSnapshot,
        after: MeshSnapshot,
    ) -> Self {
        Self {
            label: label.into(),
            level,
            payload: Payload::compact(before, after, level),
        }
    }

    /// User-facing description.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Level of the change.
    pub fn level(&self) -> UpdateLevel {
        self.level
    }

    /// Number of vertices held across both sides of the record.
    pub fn stored_vertex_count(&self) -> usize {
        match &self.payload {
            Payload::Selection { .. } => 0,
            Payload::Position { before, after, .. } => before.len() + after.len(),
            Payload::Topology { before, after } => {
                before.mesh.vertex_count() + after.mesh.vertex_count()
            }
        }
    }

    /// Number of faces held across both sides of the record.
    pub fn stored_face_count(&self) -> usize {
        match &self.payload {
            Payload::Topology { before, after } => {
                before.mesh.face_count() + after.mesh.face_count()
            }
            _ => 0,
        }
    }

    /// Restores the state before the edit.
    pub fn revert(&self, mesh: &mut Mesh, selection: &mut SelectionState) -> Result<(), HistoryError> {
        match &self.payload {
            Payload::Selection { before, .. } => restore_selection(before, mesh, selection),
            Payload::Position {
                before,
                before_selection,
                ..
            } => {
                restore_vertices(before, mesh)?;
                restore_selection(before_selection, mesh, selection);
            }
            Payload::Topology { before, .. } => before.restore(mesh, selection),
        }
        Ok(())
    }

    /// Restores the state after the edit.
    pub fn reapply(&self, mesh: &mut Mesh, selection: &mut SelectionState) -> Result<(), HistoryError> {
        match &self.payload {
            Payload::Selection { after, .. } => restore_selection(after, mesh, selection),
            Payload::Position {
                after,
                after_selection,
                ..
            } => {
                restore_vertices(after, mesh)?;
                restore_selection(after_selection, mesh, selection);
            }
            Payload::Topology { after, .. } => after.restore(mesh, selection),
        }
        Ok(())
    }
}

fn restore_vertices(vertices: &[Vertex], mesh: &mut Mesh) -> Result<(), HistoryError> {
    if vertices.len() != mesh.vertex_count() {
        return Err(HistoryError::VertexCountMismatch {
            expected: vertices.len(),
            found: mesh.vertex_count(),
        });
    }
    mesh.vertices.clone_from_slice(vertices);
    Ok(())
}

fn restore_selection(
    stored: &Option<SelectionState>,
    mesh: &Mesh,
    selection: &mut SelectionState,
) {
    match stored {
        Some(stored) => selection.clone_from(stored),
        None => selection.retain_valid(mesh),
    }
}

/// Linear undo/redo stack of [`EditRecord`]s.
///
/// # Example
///
/// ```ignore
/// let before = MeshSnapshot::capture(&mesh, Some(&selection));
/// let report = Bevel::chamfer(0.1).apply(&mut mesh, edges);
/// report.apply_to_selection(&mesh, &mut selection);
/// let after = MeshSnapshot::capture(&mesh, Some(&selection));
///
/// history.commit(before, after, UpdateLevel::Topology, "Bevel")?;
///
/// // Later
/// let level = history.undo(&mut mesh, &mut selection)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    /// All records (oldest first).
    records: Vec<EditRecord>,
    /// Number of applied records; records at and after this index are redoable.
    current: usize,
    config: HistoryConfig,
}

impl EditHistory {
    /// Creates a new empty history.
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            records: Vec::new(),
            current: 0,
            config,
        }
    }

    /// Records an edit.
    ///
    /// The level is observed from the snapshots; the record is stored at that
    /// level, which may be cheaper than `declared`. Identical snapshots record
    /// nothing and return `Ok(None)`. Any redo steps are discarded.
    pub fn commit(
        &mut self,
        before: MeshSnapshot,
        after: MeshSnapshot,
        declared: UpdateLevel,
        label: impl Into<String>,
    ) -> Result<Option<UpdateLevel>, HistoryError> {
        let label = label.into();
        let Some(level) = UpdateLevel::classify(&before, &after) else {
            debug!(%label, "skipping empty edit");
            return Ok(None);
        };
        if declared < level {
            warn!(%label, ?declared, required = ?level, "rejecting understated edit");
            return Err(HistoryError::LevelUnderstated {
                declared,
                required: level,
            });
        }

        self.records.truncate(self.current);
        self.records.push(EditRecord::new(label, level, before, after));
        self.current = self.records.len();

        if self.config.max_records > 0 && self.records.len() > self.config.max_records {
            let remove_count = self.records.len() - self.config.max_records;
            self.records.drain(0..remove_count);
            self.current = self.current.saturating_sub(remove_count);
        }

        if let Some(record) = self.records.last() {
            info!(label = record.label(), ?level, "committed edit");
        }
        Ok(Some(level))
    }

    /// Reverts the most recent applied record and returns its level.
    pub fn undo(
        &mut self,
        mesh: &mut Mesh,
        selection: &mut SelectionState,
    ) -> Result<UpdateLevel, HistoryError> {
        if self.current == 0 {
            return Err(HistoryError::NothingToUndo);
        }
        let record = &self.records[self.current - 1];
        record.revert(mesh, selection)?;
        self.current -= 1;
        debug!(label = record.label(), level = ?record.level(), "undo");
        Ok(record.level())
    }

    /// Reapplies the next undone record and returns its level.
    pub fn redo(
        &mut self,
        mesh: &mut Mesh,
        selection: &mut SelectionState,
    ) -> Result<UpdateLevel, HistoryError> {
        let Some(record) = self.records.get(self.current) else {
            return Err(HistoryError::NothingToRedo);
        };
        record.reapply(mesh, selection)?;
        let level = record.level();
        debug!(label = record.label(), ?level, "redo");
        self.current += 1;
        Ok(level)
    }

    /// Returns true if undo is possible.
    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    /// Returns true if redo is possible.
    pub fn can_redo(&self) -> bool {
        self.current < self.records.len()
    }

    /// Returns how many undo steps are available.
    pub fn undo_count(&self) -> usize {
        self.current
    }

    /// Returns how many redo steps are available.
    pub fn redo_count(&self) -> usize {
        self.records.len() - self.current
    }

    /// Labels of all records, oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(EditRecord::label).collect()
    }

    /// The record the next undo would revert.
    pub fn undo_record(&self) -> Option<&EditRecord> {
        self.current.checked_sub(1).and_then(|i| self.records.get(i))
    }

    /// The record the next redo would reapply.
    pub fn redo_record(&self) -> Option<&EditRecord> {
        self.records.get(self.current)
    }

    /// Returns a reference to all records.
    pub fn records(&self) -> &[EditRecord] {
        &self.records
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.records.clear();
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use polyedit_mesh::{
        Bevel, ElementHit, MeshBuilder, SelectOp, VertexPair, translate_vertices,
    };

    fn two_triangles() -> Mesh {
        let mut builder = MeshBuilder::new();
        builder.vertex(Vec3::new(-1.0, 0.5, 0.0));
        builder.vertex(Vec3::new(0.0, 0.0, 0.0));
        builder.vertex(Vec3::new(0.0, 1.0, 0.0));
        builder.vertex(Vec3::new(1.0, 0.5, 0.0));
        builder.triangle(0, 1, 2);
        builder.triangle(1, 3, 2);
        builder.build()
    }

    fn snap(mesh: &Mesh, selection: &SelectionState) -> MeshSnapshot {
        MeshSnapshot::capture(mesh, Some(selection))
    }

    fn moved(mesh: &Mesh, by: f32) -> Mesh {
        let mut mesh = mesh.clone();
        translate_vertices(&mut mesh, [0], Vec3::splat(by));
        mesh
    }

    #[test]
    fn test_empty_history() {
        let mut history = EditHistory::default();
        let mut mesh = Mesh::new();
        let mut selection = SelectionState::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(
            history.undo(&mut mesh, &mut selection),
            Err(HistoryError::NothingToUndo)
        );
        assert_eq!(
            history.redo(&mut mesh, &mut selection),
            Err(HistoryError::NothingToRedo)
        );
    }

    #[test]
    fn test_undo_round_trip_topology() {
        let mut history = EditHistory::default();
        let mut mesh = two_triangles();
        let mut selection = SelectionState::new();
        selection.select_hit(ElementHit::Edge(VertexPair::new(1, 2)), SelectOp::Add);
        let original = mesh.clone();
        let original_selection = selection.clone();

        let before = snap(&mesh, &selection);
        let report = Bevel::chamfer(0.1).apply(&mut mesh, [VertexPair::new(1, 2)]);
        report.apply_to_selection(&mesh, &mut selection);
        let beveled = mesh.clone();
        let after = snap(&mesh, &selection);

        let level = history
            .commit(before, after, UpdateLevel::Topology, "Bevel")
            .unwrap();
        assert_eq!(level, Some(UpdateLevel::Topology));

        assert_eq!(
            history.undo(&mut mesh, &mut selection),
            Ok(UpdateLevel::Topology)
        );
        assert_eq!(mesh, original);
        assert_eq!(selection, original_selection);

        assert_eq!(
            history.redo(&mut mesh, &mut selection),
            Ok(UpdateLevel::Topology)
        );
        assert_eq!(mesh, beveled);
    }

    #[test]
    fn test_position_payload_is_compact() {
        let mut history = EditHistory::default();
        let selection = SelectionState::new();
        let mesh = two_triangles();
        let after = moved(&mesh, 1.0);

        let level = history
            .commit(
                snap(&mesh, &selection),
                snap(&after, &selection),
                UpdateLevel::Topology,
                "Move",
            )
            .unwrap();
        assert_eq!(level, Some(UpdateLevel::Position));

        let record = history.undo_record().unwrap();
        assert_eq!(record.level(), UpdateLevel::Position);
        assert_eq!(record.stored_vertex_count(), 8);
        assert_eq!(record.stored_face_count(), 0);

        let mut live = after.clone();
        let mut live_selection = selection.clone();
        history.undo(&mut live, &mut live_selection).unwrap();
        assert_eq!(live, mesh);
    }

    #[test]
    fn test_selection_payload_is_compact() {
        let mut history = EditHistory::default();
        let mesh = two_triangles();
        let before = SelectionState::new();
        let mut after = before.clone();
        after.select_hit(ElementHit::Face(1), SelectOp::Add);

        history
            .commit(snap(&mesh, &before), snap(&mesh, &after), UpdateLevel::Selection, "Select")
            .unwrap();
        let record = history.undo_record().unwrap();
        assert_eq!(record.stored_vertex_count(), 0);

        let mut live = mesh.clone();
        let mut selection = after.clone();
        history.undo(&mut live, &mut selection).unwrap();
        assert_eq!(selection, before);
        history.redo(&mut live, &mut selection).unwrap();
        assert_eq!(selection, after);
    }

    #[test]
    fn test_understated_level_rejected() {
        let mut history = EditHistory::default();
        let selection = SelectionState::new();
        let mesh = two_triangles();
        let result = history.commit(
            snap(&mesh, &selection),
            snap(&moved(&mesh, 1.0), &selection),
            UpdateLevel::Selection,
            "Move",
        );
        assert_eq!(
            result,
            Err(HistoryError::LevelUnderstated {
                declared: UpdateLevel::Selection,
                required: UpdateLevel::Position,
            })
        );
        assert!(!history.can_undo());
    }

    #[test]
    fn test_identical_snapshots_record_nothing() {
        let mut history = EditHistory::default();
        let snapshot = snap(&two_triangles(), &SelectionState::new());
        let level = history
            .commit(snapshot.clone(), snapshot, UpdateLevel::Topology, "Nothing")
            .unwrap();
        assert_eq!(level, None);
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn test_commit_truncates_redo() {
        let mut history = EditHistory::default();
        let selection = SelectionState::new();
        let base = two_triangles();
        let mut mesh = base.clone();
        let mut live_selection = selection.clone();

        for (i, label) in ["a", "b", "c"].into_iter().enumerate() {
            let next = moved(&mesh, i as f32 + 1.0);
            history
                .commit(snap(&mesh, &selection), snap(&next, &selection), UpdateLevel::Position, label)
                .unwrap();
            mesh = next;
        }
        history.undo(&mut mesh, &mut live_selection).unwrap();
        history.undo(&mut mesh, &mut live_selection).unwrap();
        assert_eq!(history.redo_count(), 2);

        let next = moved(&mesh, 10.0);
        history
            .commit(snap(&mesh, &selection), snap(&next, &selection), UpdateLevel::Position, "d")
            .unwrap();
        assert_eq!(history.labels(), vec!["a", "d"]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_records() {
        let mut history = EditHistory::new(HistoryConfig::with_limit(3));
        let selection = SelectionState::new();
        let mut mesh = two_triangles();

        for i in 1..=5 {
            let next = moved(&mesh, 1.0);
            history
                .commit(
                    snap(&mesh, &selection),
                    snap(&next, &selection),
                    UpdateLevel::Position,
                    format!("move {i}"),
                )
                .unwrap();
            mesh = next;
        }

        assert_eq!(history.records().len(), 3);
        assert_eq!(history.labels(), vec!["move 3", "move 4", "move 5"]);
        assert_eq!(history.undo_count(), 3);
    }

    #[test]
    fn test_position_record_rejects_mismatched_mesh() {
        let mut history = EditHistory::default();
        let selection = SelectionState::new();
        let mesh = two_triangles();
        history
            .commit(
                snap(&mesh, &selection),
                snap(&moved(&mesh, 1.0), &selection),
                UpdateLevel::Position,
                "Move",
            )
            .unwrap();

        let mut other = Mesh::new();
        let mut live_selection = SelectionState::new();
        assert_eq!(
            history.undo(&mut other, &mut live_selection),
            Err(HistoryError::VertexCountMismatch {
                expected: 4,
                found: 0
            })
        );
        assert!(history.can_undo());
    }

    #[test]
    fn test_clear() {
        let mut history = EditHistory::default();
        let selection = SelectionState::new();
        let mesh = two_triangles();
        history
            .commit(
                snap(&mesh, &selection),
                snap(&moved(&mesh, 1.0), &selection),
                UpdateLevel::Position,
                "Move",
            )
            .unwrap();
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.labels().is_empty());
    }
}
