#![forbid(unsafe_code)]

//! Grid geometry: pointer position to linear cell index.
//!
//! The grid is a wrap-around row of fixed-size boxes separated by a fixed
//! gap. Full rows use that gap; a partially filled last row spreads its
//! boxes across the container width, so its effective gap differs and is
//! only used when resolving positions inside that row.
//!
//! # Coordinate contract
//!
//! [`resolve_index`] takes a [`Pointer`] relative to the grid *content*
//! origin, i.e. with the vertical scroll offset already compensated. Use
//! [`GridViewport::locate`] to go from client coordinates to a content
//! pointer; it also rejects points outside the container, which the
//! resolver itself never does.
//!
//! # Determinism
//!
//! Every function here is pure. Identical `(layout, pointer)` inputs always
//! produce identical indices.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Fixed gap between boxes, in pixels.
pub const DEFAULT_GAP_PX: f64 = 16.0;

/// Largest number of cells (`columns * rows`) a layout may span.
pub const MAX_GRID_CELLS: u64 = u32::MAX as u64;

/// Round half up (`2.5 -> 3`, `-2.5 -> -2`).
///
/// Matches the rounding of browser layout code, which differs from
/// [`f64::round`] for negative halves.
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// A point relative to the grid content origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pointer {
    /// Horizontal offset from the left edge of the grid.
    pub x: f64,
    /// Vertical offset from the top of the grid content (scroll compensated).
    pub y: f64,
}

impl Pointer {
    /// Create a new pointer.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A box in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl BoxRect {
    /// Create a new box rectangle.
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Center point in client coordinates.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// The grid container as seen from client coordinates.
///
/// `content_height` is the full scrollable height, not the visible height,
/// so rows below the fold still resolve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GridViewport {
    /// Left edge of the container.
    pub left: f64,
    /// Top edge of the visible container.
    pub top: f64,
    /// Container width.
    pub width: f64,
    /// Total content height (visible plus scrolled-out).
    pub content_height: f64,
    /// Current vertical scroll offset.
    pub scroll_top: f64,
}

impl GridViewport {
    /// Create a viewport with no scroll.
    pub const fn new(left: f64, top: f64, width: f64, content_height: f64) -> Self {
        Self {
            left,
            top,
            width,
            content_height,
            scroll_top: 0.0,
        }
    }

    /// Set the vertical scroll offset.
    #[must_use]
    pub const fn with_scroll_top(mut self, scroll_top: f64) -> Self {
        self.scroll_top = scroll_top;
        self
    }

    /// Client position of the content origin: the container top minus the
    /// scroll offset.
    #[inline]
    pub fn content_origin(&self) -> (f64, f64) {
        (self.left, self.top - self.scroll_top)
    }

    /// Map a client point to a content pointer.
    ///
    /// Returns `None` for points outside the container content or for
    /// non-finite input.
    pub fn locate(&self, client_x: f64, client_y: f64) -> Option<Pointer> {
        if !client_x.is_finite() || !client_y.is_finite() {
            return None;
        }
        let (origin_x, origin_y) = self.content_origin();
        if client_x < origin_x
            || client_x >= origin_x + self.width
            || client_y < origin_y
            || client_y >= origin_y + self.content_height
        {
            return None;
        }
        Some(Pointer::new(client_x - origin_x, client_y - origin_y))
    }

    /// Build the layout for `item_count` boxes of the given size.
    pub fn layout(
        &self,
        box_width: f64,
        box_height: f64,
        item_count: usize,
    ) -> Result<GridLayout, GeometryError> {
        GridLayout::new(
            self.width,
            self.content_height,
            box_width,
            box_height,
            item_count,
        )
    }
}

/// Validated grid dimensions.
///
/// Construction rejects non-finite values, non-positive box or container
/// sizes, and negative gaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    container_width: f64,
    container_height: f64,
    box_width: f64,
    box_height: f64,
    item_count: usize,
    gap_px: f64,
}

fn positive(field: &'static str, value: f64) -> Result<f64, GeometryError> {
    if !value.is_finite() {
        return Err(GeometryError::NotFinite { field, value });
    }
    if value <= 0.0 {
        return Err(GeometryError::NonPositive { field, value });
    }
    Ok(value)
}

impl GridLayout {
    /// Create a layout with the default gap.
    pub fn new(
        container_width: f64,
        container_height: f64,
        box_width: f64,
        box_height: f64,
        item_count: usize,
    ) -> Result<Self, GeometryError> {
        Self {
            container_width: positive("container_width", container_width)?,
            container_height: positive("container_height", container_height)?,
            box_width: positive("box_width", box_width)?,
            box_height: positive("box_height", box_height)?,
            item_count,
            gap_px: DEFAULT_GAP_PX,
        }
        .bounded()
    }

    /// Replace the inter-box gap.
    pub fn with_gap(mut self, gap_px: f64) -> Result<Self, GeometryError> {
        if !gap_px.is_finite() {
            return Err(GeometryError::NotFinite {
                field: "gap_px",
                value: gap_px,
            });
        }
        if gap_px < 0.0 {
            return Err(GeometryError::NegativeGap(gap_px));
        }
        self.gap_px = gap_px;
        self.bounded()
    }

    /// Reject layouts whose cells a linear index cannot address.
    fn bounded(self) -> Result<Self, GeometryError> {
        let (columns, rows) = self.cell_counts();
        if columns * rows > MAX_GRID_CELLS as f64 {
            return Err(GeometryError::TooManyCells {
                columns,
                rows,
                max: MAX_GRID_CELLS,
            });
        }
        Ok(self)
    }

    /// Columns and rows before integer conversion, each at least 1.
    fn cell_counts(&self) -> (f64, f64) {
        let pitch_x = self.box_width + self.gap_px;
        let pitch_y = self.box_height + self.gap_px;
        let columns = round_half_up((self.container_width + self.gap_px) / pitch_x).max(1.0);
        let rows = round_half_up((self.container_height + self.gap_px) / pitch_y).max(1.0);
        (columns, rows)
    }

    /// Replace the item count, keeping dimensions.
    #[must_use]
    pub const fn with_item_count(mut self, item_count: usize) -> Self {
        self.item_count = item_count;
        self
    }

    #[inline]
    pub const fn container_width(&self) -> f64 {
        self.container_width
    }

    #[inline]
    pub const fn container_height(&self) -> f64 {
        self.container_height
    }

    #[inline]
    pub const fn box_width(&self) -> f64 {
        self.box_width
    }

    #[inline]
    pub const fn box_height(&self) -> f64 {
        self.box_height
    }

    #[inline]
    pub const fn item_count(&self) -> usize {
        self.item_count
    }

    #[inline]
    pub const fn gap_px(&self) -> f64 {
        self.gap_px
    }

    /// Compute occupied grid dimensions.
    pub fn geometry(&self) -> GridGeometry {
        // Bounded by MAX_GRID_CELLS at construction.
        let (columns, rows) = self.cell_counts();
        let (columns, rows) = (columns as usize, rows as usize);
        let last_row_count = self.item_count % columns;
        let last_row_gap = (last_row_count > 1).then(|| {
            round_half_up(
                (self.container_width - last_row_count as f64 * self.box_width)
                    / (last_row_count - 1) as f64,
            )
        });

        GridGeometry {
            columns,
            rows,
            last_row_count,
            last_row_gap,
        }
    }
}

/// Derived grid dimensions for one layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Boxes per full row (always >= 1).
    pub columns: usize,
    /// Rows spanned by the container content (always >= 1).
    pub rows: usize,
    /// Boxes in the last row; 0 means the last row is full.
    pub last_row_count: usize,
    /// Spread gap of a partial last row holding two or more boxes.
    pub last_row_gap: Option<f64>,
}

impl GridGeometry {
    /// Row under a content-relative `y`.
    #[inline]
    pub fn cell_row(&self, layout: &GridLayout, y: f64) -> isize {
        ((y + layout.gap_px) / (layout.box_height + layout.gap_px)).floor() as isize
    }

    /// Column under a content-relative `x` within `row`.
    pub fn cell_column(&self, layout: &GridLayout, row: isize, x: f64) -> isize {
        let in_last_row = row == self.rows as isize - 1;
        let gap = if in_last_row {
            match self.last_row_count {
                0 => layout.gap_px,
                1 => return 0,
                _ => self.effective_last_row_gap(layout),
            }
        } else {
            layout.gap_px
        };
        ((x + gap) / (layout.box_width + gap)).floor() as isize
    }

    /// Last-row gap, or the fixed gap when spreading would leave a
    /// non-positive pitch.
    fn effective_last_row_gap(&self, layout: &GridLayout) -> f64 {
        self.last_row_gap
            .filter(|gap| layout.box_width + gap > 0.0)
            .unwrap_or(layout.gap_px)
    }

    /// Linear index under `pointer`. Not clamped to the item count.
    ///
    /// Saturates instead of overflowing for pointers far outside the grid.
    pub fn index_at(&self, layout: &GridLayout, pointer: Pointer) -> isize {
        let row = self.cell_row(layout, pointer.y);
        let column = self.cell_column(layout, row, pointer.x);
        let columns = isize::try_from(self.columns).unwrap_or(isize::MAX);
        row.saturating_mul(columns).saturating_add(column)
    }
}

/// Resolve the linear cell index under `pointer`.
///
/// The pointer must already be inside the container content (see
/// [`GridViewport::locate`]). The result is not clamped to
/// `[0, item_count)`; callers clamp before use.
pub fn resolve_index(layout: &GridLayout, pointer: Pointer) -> isize {
    layout.geometry().index_at(layout, pointer)
}
