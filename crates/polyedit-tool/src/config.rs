//! Editor configuration.

use crate::drag::DragConfig;
use polyedit_history::HistoryConfig;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for an [`crate::EditSession`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EditorConfig {
    /// Undo stack limits.
    pub history: HistoryConfig,
    /// Drag thresholds and scale.
    pub drag: DragConfig,
    /// Minimum direction agreement for edge loop selection.
    pub loop_threshold: f32,
    /// Distance under which merge collapses vertices.
    pub merge_threshold: f32,
    /// Segments used by interactive bevels.
    pub bevel_segments: u32,
    /// Whether interactive bevels are rounded.
    pub bevel_fillet: bool,
    /// Whether snapshots capture the selection. When off, selection changes
    /// are not undoable.
    pub include_selection_in_snapshots: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            drag: DragConfig::default(),
            loop_threshold: 0.9,
            merge_threshold: 1e-4,
            bevel_segments: 1,
            bevel_fillet: false,
            include_selection_in_snapshots: true,
        }
    }
}

impl EditorConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the history limits.
    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    /// Sets the drag thresholds.
    pub fn with_drag(mut self, drag: DragConfig) -> Self {
        self.drag = drag;
        self
    }

    /// Sets the edge loop threshold.
    pub fn with_loop_threshold(mut self, threshold: f32) -> Self {
        self.loop_threshold = threshold;
        self
    }

    /// Sets the merge distance.
    pub fn with_merge_threshold(mut self, threshold: f32) -> Self {
        self.merge_threshold = threshold;
        self
    }

    /// Sets the interactive bevel profile.
    pub fn with_bevel(mut self, segments: u32, fillet: bool) -> Self {
        self.bevel_segments = segments;
        self.bevel_fillet = fillet;
        self
    }

    /// Excludes the selection from snapshots.
    pub fn without_selection_history(mut self) -> Self {
        self.include_selection_in_snapshots = false;
        self
    }
}
