#![forbid(unsafe_code)]

//! Core: grid geometry resolution and the drag-reorder state machine.
//!
//! # Role in TileGrid
//! `tilegrid-core` is the pure half of the engine. It maps a pointer to a
//! grid cell and keeps the item order consistent while a tile is dragged.
//! It performs no I/O and holds no shared state.
//!
//! # Primary responsibilities
//! - **Geometry**: [`geometry::resolve_index`] turns container bounds, box
//!   size, item count, and a content pointer into a linear cell index,
//!   including the spread gap of a partial last row.
//! - **Order**: [`sequence::OrderedSequence`] is the duplicate-free item order.
//! - **Gesture**: [`gesture::OrderMaintainer`] runs the
//!   Idle → Dragging → Idle state machine and applies one splice per
//!   index change.
//!
//! # How it fits in the system
//! `tilegrid-runtime` feeds pointer events through these types, notifies
//! observers, and commits the final order to the ordered-list store.

pub mod error;
pub mod geometry;
pub mod gesture;
pub mod sequence;

pub use error::{GeometryError, OrderError};
pub use geometry::{
    BoxRect, DEFAULT_GAP_PX, GridGeometry, GridLayout, GridViewport, MAX_GRID_CELLS, Pointer,
    resolve_index,
};
pub use gesture::{CancelPolicy, GestureEnd, OrderMaintainer};
pub use sequence::{ItemId, OrderedSequence};
