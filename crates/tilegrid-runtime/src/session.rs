#![forbid(unsafe_code)]

//! Drag session: pointer events in, live order and background commits out.
//!
//! [`GridSession`] is the glue between the pure core and the outside world.
//! It maps client coordinates through the [`GridViewport`], drives the
//! [`OrderMaintainer`], tells observers about every splice, and hands the
//! final order of each gesture to the [`OrderCommitter`].
//!
//! # Lifecycle
//!
//! ```text
//! drag_start(rect) ──► drag_move(x, y)* ──► drag_end()    → one full replace
//!                                      └──► drag_cancel() → per CancelPolicy
//! ```
//!
//! # Persistence failures
//!
//! A failed commit never touches the visible order. The session records that
//! the store is behind ("dirty"), and the next gesture end re-sends the local
//! order even if that gesture itself changed nothing.

use std::sync::Arc;

use thiserror::Error;
use tilegrid_core::{
    BoxRect, GeometryError, GestureEnd, GridLayout, GridViewport, ItemId, OrderError,
    OrderMaintainer, OrderedSequence, resolve_index,
};
use web_time::Duration;

use crate::catalog::{Catalog, CatalogItem};
use crate::commit::{CommitOutcome, CommitStatus, OrderCommitter};
use crate::config::EngineConfig;
use crate::observe::{OrderObservers, Subscription};
use crate::store::{OrderStore, StoreError, UserId};

/// Longest `add_item`/`remove_item` wait for in-flight commits.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure of a session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The dragged box's center is not inside the grid content.
    #[error("drag started outside the grid at ({x}, {y})")]
    OutsideGrid { x: f64, y: f64 },
}

/// One user's grid: order, gesture, observers, and commit pipeline.
pub struct GridSession {
    user: UserId,
    store: Arc<dyn OrderStore>,
    committer: OrderCommitter,
    maintainer: OrderMaintainer,
    viewport: GridViewport,
    box_size: Option<(f64, f64)>,
    observers: OrderObservers,
    config: EngineConfig,
    dirty: bool,
    outcomes: Vec<CommitOutcome>,
}

impl std::fmt::Debug for GridSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridSession")
            .field("user", &self.user)
            .field("len", &self.maintainer.order().len())
            .field("dragging", &self.maintainer.is_dragging())
            .field("viewport", &self.viewport)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl GridSession {
    /// Read `user`'s stored order and start a session around it.
    pub fn load(
        store: Arc<dyn OrderStore>,
        user: UserId,
        config: EngineConfig,
    ) -> Result<Self, SessionError> {
        let order = OrderedSequence::from_ids(store.read_order(&user)?)?;
        tracing::debug!(
            target: "tilegrid.session",
            user = %user,
            len = order.len(),
            "session loaded"
        );
        let committer = OrderCommitter::spawn(Arc::clone(&store), config.retry_policy());
        Ok(Self {
            user,
            store,
            committer,
            maintainer: OrderMaintainer::new(order),
            viewport: GridViewport::default(),
            box_size: None,
            observers: OrderObservers::new(),
            config,
            dirty: false,
            outcomes: Vec::new(),
        })
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current order, as rendered.
    #[must_use]
    pub fn order(&self) -> &[ItemId] {
        self.maintainer.order().as_slice()
    }

    /// Whether `id` is on the grid.
    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.maintainer.order().contains(id)
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.maintainer.is_dragging()
    }

    /// The item under the pointer, while dragging.
    #[must_use]
    pub fn held_item(&self) -> Option<&ItemId> {
        self.maintainer.held_item()
    }

    /// Whether the store may be behind the local order after a failed commit.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Update container bounds or scroll offset.
    pub fn set_viewport(&mut self, viewport: GridViewport) {
        self.viewport = viewport;
    }

    #[must_use]
    pub fn viewport(&self) -> GridViewport {
        self.viewport
    }

    /// Set the uniform box size used for resolution.
    pub fn set_box_size(&mut self, width: f64, height: f64) -> Result<(), SessionError> {
        // Validates the size against the current container.
        self.layout_for(width, height)?;
        self.box_size = Some((width, height));
        Ok(())
    }

    /// Register an order-change callback.
    pub fn subscribe(&self, callback: impl Fn(&[ItemId]) + 'static) -> Subscription {
        self.observers.subscribe(callback)
    }

    /// Begin dragging the box at `rect`.
    ///
    /// The held index is resolved from the box center; the box's own size
    /// becomes the grid box size.
    pub fn drag_start(&mut self, rect: BoxRect) -> Result<usize, SessionError> {
        let layout = self.layout_for(rect.width, rect.height)?;
        let (x, y) = rect.center();
        let pointer = self
            .viewport
            .locate(x, y)
            .ok_or(SessionError::OutsideGrid { x, y })?;
        let index = self.maintainer.start_drag(resolve_index(&layout, pointer))?;
        self.box_size = Some((rect.width, rect.height));
        Ok(index)
    }

    /// Feed one pointer move. Returns `true` when the order changed.
    ///
    /// Pointers outside the grid content are ignored.
    pub fn drag_move(&mut self, client_x: f64, client_y: f64) -> bool {
        if !self.maintainer.is_dragging() {
            return false;
        }
        let Some(pointer) = self.viewport.locate(client_x, client_y) else {
            tracing::trace!(target: "tilegrid.session", client_x, client_y, "pointer outside grid");
            return false;
        };
        let Some((width, height)) = self.box_size else {
            return false;
        };
        let layout = match self.layout_for(width, height) {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!(target: "tilegrid.session", error = %e, "cannot resolve drag move");
                return false;
            }
        };
        let changed = self.maintainer.move_drag(resolve_index(&layout, pointer));
        if changed {
            self.observers.notify(self.maintainer.order().as_slice());
        }
        changed
    }

    /// Finish the gesture and queue the final order for the store.
    pub fn drag_end(&mut self) -> Vec<ItemId> {
        let end = self.maintainer.end_drag();
        self.finish(end)
    }

    /// Abandon the gesture according to the configured cancel policy.
    ///
    /// Returns `None` if no gesture was active.
    pub fn drag_cancel(&mut self) -> Option<Vec<ItemId>> {
        let before = self.maintainer.order().to_vec();
        let end = self.maintainer.cancel_drag(self.config.gesture.cancel_policy)?;
        if end.order != before {
            self.observers.notify(&end.order);
        }
        Some(self.finish(end))
    }

    fn finish(&mut self, end: GestureEnd) -> Vec<ItemId> {
        self.absorb_outcomes();
        let owed = end.changed || !self.config.gesture.skip_unchanged_commit || self.dirty;
        if end.commit && owed {
            self.commit(end.order.clone());
        } else {
            tracing::debug!(
                target: "tilegrid.session",
                user = %self.user,
                changed = end.changed,
                "commit skipped"
            );
        }
        end.order
    }

    fn commit(&mut self, order: Vec<ItemId>) {
        if let Err(e) = self.committer.submit(self.user.clone(), order) {
            tracing::error!(target: "tilegrid.session", user = %self.user, error = %e, "commit not queued");
            self.dirty = true;
        }
    }

    /// Put `id` at the end of the grid.
    ///
    /// Writes to the store first; the local order changes only on success.
    pub fn add_item(&mut self, id: ItemId) -> Result<usize, SessionError> {
        if self.maintainer.is_dragging() {
            return Err(OrderError::GestureActive.into());
        }
        if self.contains(&id) {
            return Err(OrderError::DuplicateItem(id).into());
        }
        self.flush();
        self.absorb_outcomes();
        let rank = self.store.append_item(&self.user, &id)?;
        let index = self.maintainer.append(id)?;
        if rank != index {
            tracing::warn!(
                target: "tilegrid.session",
                user = %self.user,
                rank,
                index,
                "store rank differs from local index; re-sending order"
            );
            self.dirty = true;
        }
        if self.dirty {
            self.commit(self.order().to_vec());
        }
        self.observers.notify(self.maintainer.order().as_slice());
        Ok(index)
    }

    /// Take `id` off the grid; remaining ranks are renumbered densely.
    pub fn remove_item(&mut self, id: &ItemId) -> Result<usize, SessionError> {
        if self.maintainer.is_dragging() {
            return Err(OrderError::GestureActive.into());
        }
        if !self.contains(id) {
            return Err(OrderError::UnknownItem(id.clone()).into());
        }
        self.flush();
        self.absorb_outcomes();
        let stored = self.store.remove_item(&self.user, id)?;
        let index = self.maintainer.remove(id)?;
        if stored.as_slice() != self.order() {
            self.dirty = true;
        }
        if self.dirty {
            self.commit(self.order().to_vec());
        }
        self.observers.notify(self.maintainer.order().as_slice());
        Ok(index)
    }

    /// Re-read the stored order, discarding the local one.
    pub fn reload(&mut self) -> Result<(), SessionError> {
        if self.maintainer.is_dragging() {
            return Err(OrderError::GestureActive.into());
        }
        self.flush();
        self.absorb_outcomes();
        let order = OrderedSequence::from_ids(self.store.read_order(&self.user)?)?;
        self.maintainer.replace_order(order)?;
        self.dirty = false;
        self.observers.notify(self.maintainer.order().as_slice());
        Ok(())
    }

    /// Drain commit outcomes reported since the last poll.
    ///
    /// Polling is optional for correctness: gesture ends and item changes
    /// pick up failures themselves and keep the outcomes for this call.
    pub fn poll_commits(&mut self) -> Vec<CommitOutcome> {
        self.absorb_outcomes();
        std::mem::take(&mut self.outcomes)
    }

    /// Move reported outcomes into the session, updating the dirty flag.
    fn absorb_outcomes(&mut self) {
        let outcomes = self.committer.poll_outcomes();
        let latest = self.committer.submitted();
        for outcome in &outcomes {
            match &outcome.status {
                CommitStatus::Committed { .. } if outcome.seq == latest => self.dirty = false,
                CommitStatus::Failed { error, attempts } => {
                    tracing::warn!(
                        target: "tilegrid.session",
                        user = %self.user,
                        seq = outcome.seq,
                        attempts,
                        error = %error,
                        "order not persisted; keeping local order"
                    );
                    if outcome.seq == latest {
                        self.dirty = true;
                    }
                }
                _ => {}
            }
        }
        self.outcomes.extend(outcomes);
    }

    /// Block until queued commits finish or `timeout` elapses.
    pub fn wait_for_commits(&self, timeout: Duration) -> bool {
        self.committer.wait_idle(timeout)
    }

    /// Renderable content in current order.
    ///
    /// Ids the catalog does not know are skipped.
    pub fn tiles(&self, catalog: &dyn Catalog) -> Vec<CatalogItem> {
        self.order()
            .iter()
            .filter_map(|id| {
                let item = catalog.lookup(id);
                if item.is_none() {
                    tracing::warn!(target: "tilegrid.session", item = %id, "item missing from catalog");
                }
                item
            })
            .collect()
    }

    fn flush(&self) {
        if !self.committer.wait_idle(FLUSH_TIMEOUT) {
            tracing::warn!(target: "tilegrid.session", user = %self.user, "commits still in flight");
        }
    }

    fn layout_for(&self, box_width: f64, box_height: f64) -> Result<GridLayout, GeometryError> {
        self.viewport
            .layout(box_width, box_height, self.maintainer.order().len())?
            .with_gap(self.config.grid.gap_px)
    }
}
