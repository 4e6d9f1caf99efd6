#![forbid(unsafe_code)]

//! TileGrid public facade crate.
//!
//! Re-exports the engine types most callers need and offers a prelude.
//! The `subscriber` feature adds a one-call tracing subscriber installer.
//!
//! ```
//! use tilegrid::prelude::*;
//!
//! let layout = GridLayout::new(964.0, 632.0, 300.0, 300.0, 4).unwrap();
//! // Four items in three columns: the lone last-row tile is always index 3.
//! assert_eq!(resolve_index(&layout, Pointer::new(700.0, 400.0)), 3);
//! ```

use thiserror::Error;

// --- Core re-exports -------------------------------------------------------

pub use tilegrid_core::{
    BoxRect, CancelPolicy, DEFAULT_GAP_PX, GeometryError, GestureEnd, GridGeometry, GridLayout,
    GridViewport, ItemId, MAX_GRID_CELLS, OrderError, OrderMaintainer, OrderedSequence, Pointer,
    resolve_index,
};

// --- Runtime re-exports ----------------------------------------------------

pub use tilegrid_runtime::{
    Catalog, CatalogItem, CommitOutcome, CommitStatus, ConfigError, EngineConfig, GridSession,
    JsonFileStore, LogFormat, MemoryCatalog, MemoryStore, OrderStore, RetryPolicy, SessionError,
    StoreError, Subscription, UserId,
};

#[cfg(feature = "subscriber")]
pub use tilegrid_runtime::init_subscriber;

// --- Errors ---------------------------------------------------------------

/// Top-level error type for TileGrid callers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Standard result type for TileGrid APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BoxRect, CancelPolicy, Error, GridLayout, GridViewport, ItemId, OrderMaintainer,
        OrderedSequence, Pointer, Result, resolve_index,
    };

    pub use crate::{Catalog, EngineConfig, GridSession, MemoryStore, OrderStore, UserId};

    pub use crate::core;
    pub use crate::runtime;
}

pub use tilegrid_core as core;
pub use tilegrid_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Result<GridLayout> {
        Ok(GridLayout::new(964.0, 632.0, 300.0, 300.0, 6)?.with_gap(16.0)?)
    }

    #[test]
    fn geometry_errors_convert() {
        assert!(layout().is_ok());
        let err: Error = GridLayout::new(0.0, 10.0, 1.0, 1.0, 1).unwrap_err().into();
        assert!(matches!(err, Error::Geometry(_)));
        assert_eq!(err.to_string(), "container_width must be > 0, got 0");
    }

    #[test]
    fn order_errors_convert() {
        let mut seq = OrderedSequence::new();
        seq.append(ItemId::new("a")).unwrap();
        let err: Error = seq.append(ItemId::new("a")).unwrap_err().into();
        assert!(matches!(err, Error::Order(OrderError::DuplicateItem(_))));
    }

    #[test]
    fn session_round_trip_through_facade() -> Result<()> {
        use std::sync::Arc;

        let user = UserId::new("u");
        let store = Arc::new(MemoryStore::new().with_order(
            &user,
            &[ItemId::new("a"), ItemId::new("b")],
        )?);
        let mut session = GridSession::load(store, user, EngineConfig::default())?;
        session.set_viewport(GridViewport::new(0.0, 0.0, 964.0, 300.0));
        session.drag_start(BoxRect::new(0.0, 0.0, 300.0, 300.0))?;
        session.drag_move(400.0, 100.0);
        assert_eq!(session.drag_end(), vec![ItemId::new("b"), ItemId::new("a")]);
        Ok(())
    }
}
