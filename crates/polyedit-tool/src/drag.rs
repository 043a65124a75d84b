//! Press / drag / release state machine for interactive operators.
//!
//! The machine is pure: it consumes pointer events and emits effects for the
//! session to carry out. A press that never travels past the pixel threshold
//! is a click; one that does becomes a drag whose vertical travel sets the
//! operator amount.

use glam::Vec2;
use polyedit_mesh::ElementHit;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Thresholds and scale of a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DragConfig {
    /// Pointer travel, in pixels, that turns a press into a drag.
    pub pixel_threshold: f32,
    /// Amounts smaller than this are discarded on release.
    pub commit_epsilon: f32,
    /// Operator units per pixel of upward travel.
    pub units_per_pixel: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            pixel_threshold: 4.0,
            commit_epsilon: 1e-4,
            units_per_pixel: 0.01,
        }
    }
}

impl DragConfig {
    /// Operator amount for a pointer at `pos` after pressing at `origin`.
    ///
    /// Screen y grows downward, so dragging up gives a positive amount.
    pub fn amount(&self, origin: Vec2, pos: Vec2) -> f32 {
        (origin.y - pos.y) * self.units_per_pixel
    }
}

/// Pointer input, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    /// Button pressed over `hit` (if anything was under the pointer).
    Press {
        /// Pointer position.
        pos: Vec2,
        /// Element under the pointer.
        hit: Option<ElementHit>,
    },
    /// Pointer moved.
    Move {
        /// Pointer position.
        pos: Vec2,
    },
    /// Button released.
    Release {
        /// Pointer position.
        pos: Vec2,
    },
    /// Interaction aborted (escape key, focus loss).
    Cancel,
}

/// What the session should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEffect {
    /// Take the base snapshot for previews.
    BeginPreview,
    /// Recompute the preview at this amount.
    UpdatePreview {
        /// Operator amount.
        amount: f32,
    },
    /// Apply the operator for real and record it.
    Commit {
        /// Operator amount.
        amount: f32,
    },
    /// Drop the preview; the mesh is unchanged.
    Discard,
    /// A plain selection click.
    Click {
        /// Element under the pointer at press time.
        hit: Option<ElementHit>,
    },
}

/// Interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No button held.
    #[default]
    Idle,
    /// Button held, not yet moved past the threshold.
    Pending {
        /// Press position.
        origin: Vec2,
        /// Element under the pointer at press time.
        hit: Option<ElementHit>,
    },
    /// Dragging with a live preview.
    Active {
        /// Press position.
        origin: Vec2,
        /// Latest amount.
        amount: f32,
    },
}

impl DragState {
    /// Returns true while a preview is live.
    pub fn is_active(&self) -> bool {
        matches!(self, DragState::Active { .. })
    }

    /// Advances the machine by one event.
    pub fn handle(self, event: DragEvent, config: &DragConfig) -> (DragState, Vec<DragEffect>) {
        match (self, event) {
            (DragState::Idle, DragEvent::Press { pos, hit }) => {
                (DragState::Pending { origin: pos, hit }, Vec::new())
            }
            (DragState::Idle, _) => (DragState::Idle, Vec::new()),

            (DragState::Pending { origin, .. }, DragEvent::Move { pos }) => {
                if origin.distance(pos) > config.pixel_threshold {
                    let amount = config.amount(origin, pos);
                    (
                        DragState::Active { origin, amount },
                        vec![DragEffect::BeginPreview, DragEffect::UpdatePreview { amount }],
                    )
                } else {
                    (self, Vec::new())
                }
            }
            (DragState::Pending { hit, .. }, DragEvent::Release { .. }) => {
                (DragState::Idle, vec![DragEffect::Click { hit }])
            }
            (DragState::Pending { .. }, DragEvent::Press { pos, hit }) => {
                (DragState::Pending { origin: pos, hit }, Vec::new())
            }
            (DragState::Pending { .. }, DragEvent::Cancel) => (DragState::Idle, Vec::new()),

            (DragState::Active { origin, .. }, DragEvent::Move { pos }) => {
                let amount = config.amount(origin, pos);
                (
                    DragState::Active { origin, amount },
                    vec![DragEffect::UpdatePreview { amount }],
                )
            }
            (DragState::Active { origin, .. }, DragEvent::Release { pos }) => {
                let amount = config.amount(origin, pos);
                let effect = if amount.abs() < config.commit_epsilon {
                    DragEffect::Discard
                } else {
                    DragEffect::Commit { amount }
                };
                (DragState::Idle, vec![effect])
            }
            (DragState::Active { .. }, DragEvent::Cancel) => {
                (DragState::Idle, vec![DragEffect::Discard])
            }
            (DragState::Active { .. }, DragEvent::Press { .. }) => (self, Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(x: f32, y: f32) -> DragEvent {
        DragEvent::Press {
            pos: Vec2::new(x, y),
            hit: Some(ElementHit::Face(0)),
        }
    }

    fn moved(x: f32, y: f32) -> DragEvent {
        DragEvent::Move {
            pos: Vec2::new(x, y),
        }
    }

    fn release(x: f32, y: f32) -> DragEvent {
        DragEvent::Release {
            pos: Vec2::new(x, y),
        }
    }

    #[test]
    fn test_click_without_travel() {
        let config = DragConfig::default();
        let (state, effects) = DragState::Idle.handle(press(10.0, 10.0), &config);
        assert!(effects.is_empty());
        let (state, effects) = state.handle(moved(11.0, 12.0), &config);
        assert!(matches!(state, DragState::Pending { .. }));
        assert!(effects.is_empty());
        let (state, effects) = state.handle(release(11.0, 12.0), &config);
        assert_eq!(state, DragState::Idle);
        assert_eq!(
            effects,
            vec![DragEffect::Click {
                hit: Some(ElementHit::Face(0))
            }]
        );
    }

    #[test]
    fn test_drag_commits_amount() {
        let config = DragConfig::default();
        let (state, _) = DragState::Idle.handle(press(0.0, 100.0), &config);
        let (state, effects) = state.handle(moved(0.0, 90.0), &config);
        assert!(state.is_active());
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0], DragEffect::BeginPreview);
        assert!(matches!(
            effects[1],
            DragEffect::UpdatePreview { amount } if (amount - 0.1).abs() < 1e-6
        ));

        let (state, effects) = state.handle(moved(0.0, 80.0), &config);
        assert!(matches!(
            effects[0],
            DragEffect::UpdatePreview { amount } if (amount - 0.2).abs() < 1e-6
        ));

        let (state, effects) = state.handle(release(0.0, 50.0), &config);
        assert_eq!(state, DragState::Idle);
        assert!(matches!(
            effects[0],
            DragEffect::Commit { amount } if (amount - 0.5).abs() < 1e-6
        ));
    }

    #[test]
    fn test_release_near_origin_discards() {
        let config = DragConfig::default();
        let (state, _) = DragState::Idle.handle(press(0.0, 0.0), &config);
        let (state, _) = state.handle(moved(20.0, 0.0), &config);
        assert!(state.is_active());
        // Horizontal travel only: zero amount.
        let (state, effects) = state.handle(release(20.0, 0.0), &config);
        assert_eq!(state, DragState::Idle);
        assert_eq!(effects, vec![DragEffect::Discard]);
    }

    #[test]
    fn test_cancel() {
        let config = DragConfig::default();
        let (state, _) = DragState::Idle.handle(press(0.0, 0.0), &config);
        let (state, effects) = state.handle(DragEvent::Cancel, &config);
        assert_eq!(state, DragState::Idle);
        assert!(effects.is_empty());

        let (state, _) = state.handle(press(0.0, 0.0), &config);
        let (state, _) = state.handle(moved(0.0, -50.0), &config);
        let (state, effects) = state.handle(DragEvent::Cancel, &config);
        assert_eq!(state, DragState::Idle);
        assert_eq!(effects, vec![DragEffect::Discard]);
    }

    #[test]
    fn test_idle_ignores_moves() {
        let config = DragConfig::default();
        let (state, effects) = DragState::Idle.handle(moved(5.0, 5.0), &config);
        assert_eq!(state, DragState::Idle);
        assert!(effects.is_empty());
        let (state, effects) = state.handle(release(5.0, 5.0), &config);
        assert_eq!(state, DragState::Idle);
        assert!(effects.is_empty());
    }
}
