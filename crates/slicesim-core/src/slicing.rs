//! Slice geometry: from slicer parameters to pixel regions.
//!
//! The slicer stack occupies a central crop window of the field grid. Each
//! slitlet is `gamma * resel_per_slice` pixels high and
//! `gamma * resel_per_slice * n_spaxels * aspect` pixels wide, and the
//! slitlets are laid side by side along the stacking axis:
//!
//! ```text
//!   vertical stacking             horizontal stacking
//!   ┌──────────────┐              ┌────┬────┬────┐
//!   │   slitlet 0  │              │    │    │    │
//!   ├──────────────┤              │ 0  │ 1  │ 2  │
//!   │   slitlet 1  │              │    │    │    │
//!   ├──────────────┤              └────┴────┴────┘
//!   │   slitlet 2  │
//!   └──────────────┘
//! ```

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{SlitPatternGeometry, StackingAxis};

/// Errors from slice-region computation.
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("Slice size is zero ({width}x{height} px); increase gamma or resolution elements per slice")]
    EmptySlice { width: usize, height: usize },

    #[error("Slicer crop window {width}x{height} px does not fit the {cols}x{rows} grid")]
    WindowExceedsGrid {
        width: usize,
        height: usize,
        cols: usize,
        rows: usize,
    },

    #[error("Invalid slicer geometry: {0}")]
    InvalidGeometry(String),

    #[error("Slice regions {first} and {second} overlap")]
    Overlap { first: usize, second: usize },
}

/// A rectangular pixel window `[x_start, x_end) x [y_start, y_end)`.
///
/// `x` indexes grid columns and `y` indexes grid rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SliceRegion {
    pub x_start: usize,
    pub x_end: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl SliceRegion {
    pub fn width(&self) -> usize {
        self.x_end.saturating_sub(self.x_start)
    }

    pub fn height(&self) -> usize {
        self.y_end.saturating_sub(self.y_start)
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Row range, for slicing `(row, col)` arrays.
    pub fn rows(&self) -> Range<usize> {
        self.y_start..self.y_end
    }

    /// Column range, for slicing `(row, col)` arrays.
    pub fn cols(&self) -> Range<usize> {
        self.x_start..self.x_end
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows().contains(&row) && self.cols().contains(&col)
    }

    pub fn overlaps(&self, other: &SliceRegion) -> bool {
        self.x_start < other.x_end
            && other.x_start < self.x_end
            && self.y_start < other.y_end
            && other.y_start < self.y_end
    }

    /// Whether the window lies inside a `rows x cols` grid.
    pub fn fits_within(&self, rows: usize, cols: usize) -> bool {
        self.x_start <= self.x_end && self.y_start <= self.y_end && self.x_end <= cols && self.y_end <= rows
    }
}

impl fmt::Display for SliceRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x=[{}, {}) y=[{}, {})",
            self.x_start, self.x_end, self.y_start, self.y_end
        )
    }
}

/// Pixel layout of the whole slicer stack on a field grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceLayout {
    /// Central window covered by the stack.
    pub crop: SliceRegion,
    /// One region per slitlet, in slitlet order.
    pub regions: Vec<SliceRegion>,
    /// Pixel width of a single slitlet.
    pub slice_pixel_width: usize,
    /// Pixel height of a single slitlet.
    pub slice_pixel_height: usize,
}

impl SliceLayout {
    /// Compute slice regions on a `(rows, cols)` grid.
    ///
    /// # Arguments
    /// * `grid_shape` - Field grid shape `(rows, cols)`.
    /// * `gamma` - Pixels per resolution element.
    /// * `resel_per_slice` - Resolution elements across one slice.
    /// * `geometry` - Slicer description.
    pub fn compute(
        grid_shape: (usize, usize),
        gamma: usize,
        resel_per_slice: f64,
        geometry: &SlitPatternGeometry,
    ) -> Result<Self, SliceError> {
        geometry.validate().map_err(SliceError::InvalidGeometry)?;
        if !resel_per_slice.is_finite() || resel_per_slice <= 0.0 {
            return Err(SliceError::InvalidGeometry(format!(
                "resolution elements per slice must be positive, got {}",
                resel_per_slice
            )));
        }

        let (rows, cols) = grid_shape;
        let height_px = gamma as f64 * resel_per_slice;
        let slice_pixel_height = height_px as usize;
        let slice_pixel_width = (height_px
            * geometry.n_spaxels_per_slitlet as f64
            * geometry.stack_width_height_aspect_ratio) as usize;

        if slice_pixel_width == 0 || slice_pixel_height == 0 {
            return Err(SliceError::EmptySlice {
                width: slice_pixel_width,
                height: slice_pixel_height,
            });
        }

        let n = geometry.n_slitlets;
        let exceeds = |width: usize, height: usize| SliceError::WindowExceedsGrid {
            width,
            height,
            cols,
            rows,
        };
        let (crop_width, crop_height) = match geometry.stacking_axis {
            StackingAxis::Vertical => (
                slice_pixel_width,
                slice_pixel_height
                    .checked_mul(n)
                    .ok_or_else(|| exceeds(slice_pixel_width, usize::MAX))?,
            ),
            StackingAxis::Horizontal => (
                slice_pixel_width
                    .checked_mul(n)
                    .ok_or_else(|| exceeds(usize::MAX, slice_pixel_height))?,
                slice_pixel_height,
            ),
        };

        if crop_width > cols || crop_height > rows {
            return Err(exceeds(crop_width, crop_height));
        }

        // The stack fits the grid, so every offset below is bounded by it.
        let x0 = cols / 2 - crop_width / 2;
        let y0 = rows / 2 - crop_height / 2;
        let crop = SliceRegion {
            x_start: x0,
            x_end: x0 + crop_width,
            y_start: y0,
            y_end: y0 + crop_height,
        };

        let regions = (0..n)
            .map(|s| match geometry.stacking_axis {
                StackingAxis::Vertical => SliceRegion {
                    x_start: x0,
                    x_end: x0 + slice_pixel_width,
                    y_start: y0 + s * slice_pixel_height,
                    y_end: y0 + (s + 1) * slice_pixel_height,
                },
                StackingAxis::Horizontal => SliceRegion {
                    x_start: x0 + s * slice_pixel_width,
                    x_end: x0 + (s + 1) * slice_pixel_width,
                    y_start: y0,
                    y_end: y0 + slice_pixel_height,
                },
            })
            .collect();

        Ok(Self {
            crop,
            regions,
            slice_pixel_width,
            slice_pixel_height,
        })
    }

    /// Number of slitlet regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Check no two regions overlap.
    pub fn ensure_disjoint(&self) -> Result<(), SliceError> {
        for (i, a) in self.regions.iter().enumerate() {
            for (j, b) in self.regions.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    return Err(SliceError::Overlap { first: i, second: j });
                }
            }
        }
        Ok(())
    }

    /// Sum of the region areas.
    pub fn covered_area(&self) -> usize {
        self.regions.iter().map(SliceRegion::area).sum()
    }
}
