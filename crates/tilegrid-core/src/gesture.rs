#![forbid(unsafe_code)]

//! Drag-reorder state machine.
//!
//! [`OrderMaintainer`] owns the [`OrderedSequence`] shown by the grid and
//! keeps it consistent while a tile is dragged. Each resolved target index
//! is applied as one remove-then-reinsert splice, so the sequence and the
//! rendered grid move in lock-step.
//!
//! # State Machine
//!
//! ```text
//!            start_drag                 move_drag (target != dragging)
//!   Idle ─────────────────► Dragging ◄───────────────┐
//!    ▲                         │  └──────────────────┘
//!    │   end_drag / cancel_drag│
//!    └─────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. While dragging, the held item is always at `dragging_index`.
//! 2. `move_drag` never changes the multiset of identifiers.
//! 3. Out-of-range targets are clamped to `[0, len)`; they are never errors.
//! 4. Outside a gesture the maintainer is the only writer; inside a gesture
//!    the `replace_order`/`append`/`remove` paths are rejected.
//!
//! # Failure Modes
//!
//! - `end_drag` without a gesture returns the current order unchanged.
//! - `move_drag` without a gesture is ignored.

use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::sequence::{ItemId, OrderedSequence};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What an abandoned gesture does to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Restore the order captured at drag start. Nothing is committed.
    #[default]
    Revert,
    /// Keep the order as last resolved and commit it like a normal drop.
    CommitLastResolved,
}

// ---------------------------------------------------------------------------
// Gesture results
// ---------------------------------------------------------------------------

/// Result of finishing a gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureEnd {
    /// The order in effect after the gesture.
    pub order: Vec<ItemId>,
    /// Whether `order` differs from the order at drag start.
    pub changed: bool,
    /// Whether the order should be sent to the store.
    pub commit: bool,
}

/// Ephemeral per-gesture state. Never outlives one gesture.
#[derive(Debug, Clone)]
struct DragSession {
    dragging_index: usize,
    origin_index: usize,
    snapshot: OrderedSequence,
    moves: u32,
}

// ---------------------------------------------------------------------------
// OrderMaintainer
// ---------------------------------------------------------------------------

/// Owner of the grid order and the active drag session.
#[derive(Debug, Clone, Default)]
pub struct OrderMaintainer {
    order: OrderedSequence,
    session: Option<DragSession>,
}

impl OrderMaintainer {
    /// Create a maintainer around an existing order.
    #[must_use]
    pub fn new(order: OrderedSequence) -> Self {
        Self {
            order,
            session: None,
        }
    }

    /// Current order.
    #[inline]
    #[must_use]
    pub fn order(&self) -> &OrderedSequence {
        &self.order
    }

    /// Whether a gesture is in progress.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Index of the held item, if dragging.
    #[inline]
    #[must_use]
    pub fn dragging_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.dragging_index)
    }

    /// Index the held item started from, if dragging.
    #[inline]
    #[must_use]
    pub fn origin_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.origin_index)
    }

    /// Splices applied so far in the current gesture.
    #[inline]
    #[must_use]
    pub fn move_count(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.moves)
    }

    /// The item being dragged, if any.
    #[must_use]
    pub fn held_item(&self) -> Option<&ItemId> {
        self.dragging_index().and_then(|i| self.order.get(i))
    }

    /// Begin a gesture on the item at `initial`, clamped into range.
    ///
    /// Returns the clamped index actually held.
    pub fn start_drag(&mut self, initial: isize) -> Result<usize, OrderError> {
        if self.session.is_some() {
            return Err(OrderError::GestureActive);
        }
        let index = self.order.clamp_index(initial).ok_or(OrderError::Empty)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "drag.start",
            requested = initial,
            index,
            len = self.order.len()
        );

        self.session = Some(DragSession {
            dragging_index: index,
            origin_index: index,
            snapshot: self.order.clone(),
            moves: 0,
        });
        Ok(index)
    }

    /// Move the held item toward `target`, clamped into range.
    ///
    /// Returns `true` when the order changed. Repeating the current index
    /// is a no-op.
    pub fn move_drag(&mut self, target: isize) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(to) = self.order.clamp_index(target) else {
            return false;
        };
        let from = session.dragging_index;
        if !self.order.move_item(from, to) {
            return false;
        }
        session.dragging_index = to;
        session.moves += 1;

        #[cfg(feature = "tracing")]
        tracing::debug!(message = "drag.move", from, to, requested = target);

        true
    }

    /// Finish the gesture, keeping the current order.
    ///
    /// A gesture without net movement yields the order unchanged with
    /// `changed == false`. Without an active gesture there is nothing to
    /// commit, so `commit == false` as well.
    pub fn end_drag(&mut self) -> GestureEnd {
        let Some(session) = self.session.take() else {
            return GestureEnd {
                order: self.order.to_vec(),
                changed: false,
                commit: false,
            };
        };
        let changed = session.snapshot != self.order;

        #[cfg(feature = "tracing")]
        tracing::debug!(message = "drag.end", changed, len = self.order.len());

        GestureEnd {
            order: self.order.to_vec(),
            changed,
            commit: true,
        }
    }

    /// Abandon the gesture according to `policy`.
    ///
    /// Returns `None` when no gesture was active.
    pub fn cancel_drag(&mut self, policy: CancelPolicy) -> Option<GestureEnd> {
        if self.session.is_none() {
            return None;
        }
        match policy {
            CancelPolicy::CommitLastResolved => Some(self.end_drag()),
            CancelPolicy::Revert => {
                let session = self.session.take()?;

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    message = "drag.cancel",
                    moves = session.moves,
                    origin = session.origin_index
                );

                self.order = session.snapshot;
                Some(GestureEnd {
                    order: self.order.to_vec(),
                    changed: false,
                    commit: false,
                })
            }
        }
    }

    /// Replace the whole order, e.g. after a re-fetch.
    pub fn replace_order(&mut self, order: OrderedSequence) -> Result<(), OrderError> {
        self.ensure_idle()?;
        self.order = order;
        Ok(())
    }

    /// Append an item at the end.
    pub fn append(&mut self, id: ItemId) -> Result<usize, OrderError> {
        self.ensure_idle()?;
        self.order.append(id)
    }

    /// Remove an item, returning the rank it held.
    pub fn remove(&mut self, id: &ItemId) -> Result<usize, OrderError> {
        self.ensure_idle()?;
        self.order.remove(id)
    }

    fn ensure_idle(&self) -> Result<(), OrderError> {
        if self.session.is_some() {
            return Err(OrderError::GestureActive);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maintainer(n: usize) -> OrderMaintainer {
        OrderMaintainer::new(OrderedSequence::from_ids((0..n).map(|i| format!("m{i}"))).unwrap())
    }

    fn ids(m: &OrderMaintainer) -> Vec<&str> {
        m.order().iter().map(ItemId::as_str).collect()
    }

    #[test]
    fn drag_two_to_five() {
        let mut m = maintainer(10);
        assert_eq!(m.start_drag(2), Ok(2));
        assert_eq!(m.held_item(), Some(&ItemId::new("m2")));
        assert!(m.move_drag(5));
        assert_eq!(m.dragging_index(), Some(5));
        assert_eq!(m.held_item(), Some(&ItemId::new("m2")));
        assert_eq!(
            ids(&m),
            ["m0", "m1", "m3", "m4", "m5", "m2", "m6", "m7", "m8", "m9"]
        );

        let end = m.end_drag();
        assert!(end.changed);
        assert!(end.commit);
        assert!(!m.is_dragging());
        assert_eq!(end.order, m.order().to_vec());
    }

    #[test]
    fn repeated_same_target_is_noop() {
        let mut m = maintainer(5);
        m.start_drag(1).unwrap();
        let before = m.order().clone();
        for _ in 0..5 {
            assert!(!m.move_drag(1));
        }
        assert_eq!(m.order(), &before);
    }

    #[test]
    fn click_without_movement_is_unchanged() {
        let mut m = maintainer(3);
        m.start_drag(0).unwrap();
        let end = m.end_drag();
        assert!(!end.changed);
        assert_eq!(end.order.len(), 3);
    }

    #[test]
    fn move_and_back_is_unchanged() {
        let mut m = maintainer(4);
        m.start_drag(0).unwrap();
        assert!(m.move_drag(3));
        assert!(m.move_drag(0));
        assert!(!m.end_drag().changed);
    }

    #[test]
    fn out_of_range_targets_clamp() {
        let mut m = maintainer(4);
        m.start_drag(1).unwrap();
        assert!(m.move_drag(42));
        assert_eq!(m.dragging_index(), Some(3));
        assert!(m.move_drag(-7));
        assert_eq!(m.dragging_index(), Some(0));
        assert_eq!(ids(&m), ["m1", "m0", "m2", "m3"]);
    }

    #[test]
    fn start_clamps_and_rejects_empty() {
        let mut m = maintainer(3);
        assert_eq!(m.start_drag(10), Ok(2));
        assert_eq!(m.start_drag(0), Err(OrderError::GestureActive));
        m.end_drag();

        let mut empty = OrderMaintainer::default();
        assert_eq!(empty.start_drag(0), Err(OrderError::Empty));
        assert!(!empty.move_drag(0));
    }

    #[test]
    fn idle_move_is_ignored() {
        let mut m = maintainer(3);
        assert!(!m.move_drag(2));
        assert_eq!(ids(&m), ["m0", "m1", "m2"]);
    }

    #[test]
    fn idle_end_commits_nothing() {
        let mut m = maintainer(3);
        let end = m.end_drag();
        assert!(!end.commit);
        assert!(!end.changed);
        assert_eq!(end.order, m.order().to_vec());

        m.start_drag(1).unwrap();
        assert!(m.end_drag().commit);
        assert!(!m.end_drag().commit);
    }

    #[test]
    fn cancel_revert_restores_snapshot() {
        let mut m = maintainer(5);
        m.start_drag(0).unwrap();
        m.move_drag(4);
        let end = m.cancel_drag(CancelPolicy::Revert).unwrap();
        assert!(!end.commit);
        assert!(!end.changed);
        assert_eq!(ids(&m), ["m0", "m1", "m2", "m3", "m4"]);
        assert!(!m.is_dragging());
    }

    #[test]
    fn cancel_commit_keeps_last_resolved() {
        let mut m = maintainer(3);
        m.start_drag(0).unwrap();
        m.move_drag(2);
        let end = m.cancel_drag(CancelPolicy::CommitLastResolved).unwrap();
        assert!(end.commit);
        assert!(end.changed);
        assert_eq!(ids(&m), ["m1", "m2", "m0"]);
    }

    #[test]
    fn cancel_when_idle_is_none() {
        let mut m = maintainer(3);
        assert_eq!(m.cancel_drag(CancelPolicy::Revert), None);
    }

    #[test]
    fn mutations_rejected_while_dragging() {
        let mut m = maintainer(3);
        m.start_drag(0).unwrap();
        assert_eq!(m.append(ItemId::new("x")), Err(OrderError::GestureActive));
        assert_eq!(
            m.remove(&ItemId::new("m1")),
            Err(OrderError::GestureActive)
        );
        assert_eq!(
            m.replace_order(OrderedSequence::new()),
            Err(OrderError::GestureActive)
        );
        m.end_drag();
        assert_eq!(m.append(ItemId::new("x")), Ok(3));
        assert_eq!(m.remove(&ItemId::new("m0")), Ok(0));
    }

    #[test]
    fn cancel_policy_serde_names() {
        let json = serde_json::to_string(&CancelPolicy::CommitLastResolved).unwrap();
        assert_eq!(json, r#""commit_last_resolved""#);
        let p: CancelPolicy = serde_json::from_str(r#""revert""#).unwrap();
        assert_eq!(p, CancelPolicy::Revert);
    }
}
