//! Contour storage (§4.1): an ordered point sequence carrying the iso-level it was
//! traced at and the region indices (or perimeter sentinels) lying to either side.

use glam::DVec2;
use slotmap::new_key_type;

use crate::math::{almost_equal, crossing_point};

new_key_type! {
    /// Arena key identifying a traced contour within a [`crate::BuildResult`].
    pub struct ContourId;
}

/// Sentinel used for `left_index`/`right_index` when a side of the contour faces
/// outside the TIN's perimeter rather than a region.
pub const PERIMETER_SIDE: i64 = -1;

/// Whether a contour was traced through the TIN's interior or runs along its
/// perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ContourKind {
    /// Traced by following iso-value crossings through the interior.
    Interior,
    /// Runs along one or more perimeter edges (the boundary contour produced by
    /// the region assembler's special case).
    Boundary,
}

/// A single traced contour: an ordered polyline at a fixed iso-level, open or
/// closed.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Contour {
    /// The iso-level this contour was traced at.
    pub z: f64,
    /// Whether the point sequence forms a closed loop.
    pub closed_loop: bool,
    /// What produced this contour.
    pub kind: ContourKind,
    /// Region index on the left of the contour's direction of travel, or
    /// [`PERIMETER_SIDE`].
    pub left_index: i64,
    /// Region index on the right of the contour's direction of travel, or
    /// [`PERIMETER_SIDE`].
    pub right_index: i64,
    /// The traced points, in travel order.
    pub points: Vec<DVec2>,
}

impl Contour {
    pub(crate) fn new(z: f64, kind: ContourKind) -> Self {
        Self {
            z,
            closed_loop: false,
            kind,
            left_index: PERIMETER_SIDE,
            right_index: PERIMETER_SIDE,
            points: Vec::new(),
        }
    }

    /// Appends a raw point, skipping it if it equals the last point appended
    /// bit-for-bit (§4.1: this is an exact-equality guard, not a tolerance
    /// one — that belongs only to `complete()`'s closure snap).
    pub(crate) fn append(&mut self, point: DVec2) {
        if let Some(last) = self.points.last() {
            if last.x == point.x && last.y == point.y {
                return;
            }
        }
        self.points.push(point);
    }

    /// Appends the interpolated crossing of `z` on the segment `a..b`.
    pub(crate) fn append_crossing(&mut self, a: DVec2, za: f64, b: DVec2, zb: f64, z: f64) {
        self.append(crossing_point(a, za, b, zb, z));
    }

    /// Appends a vertex the contour passes exactly through.
    pub(crate) fn append_vertex(&mut self, point: DVec2) {
        self.append(point);
    }

    /// Finalizes the contour. If `closed_loop` is true, guarantees
    /// `points[0] == points[last]` bit-exact: when the last stored point is
    /// already numerically close to the first, it is snapped to an exact copy;
    /// otherwise an exact copy of the first point is appended to close the loop.
    pub(crate) fn complete(&mut self, closed_loop: bool) {
        self.closed_loop = closed_loop;
        if !closed_loop || self.points.is_empty() {
            return;
        }
        let first = self.points[0];
        let last = *self.points.last().unwrap();
        if almost_equal(first.x, last.x) && almost_equal(first.y, last.y) {
            *self.points.last_mut().unwrap() = first;
        } else {
            self.points.push(first);
        }
    }
}
