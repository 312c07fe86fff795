//! Region storage (§4.4, §3 `ContourRegion`): the geometry accumulator produced
//! by stitching, before and after nesting is resolved.

use glam::DVec2;
use slotmap::new_key_type;

use crate::contour::ContourId;

new_key_type! {
    /// Arena key identifying a region within a [`crate::BuildResult`].
    pub struct RegionId;
}

/// Whether a region is bounded purely by interior contours, or includes at
/// least one perimeter arc (and is therefore the outside of the domain, or a
/// slice of it, rather than a fully interior level band).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionKind {
    /// Bounded entirely by interior (non-boundary) contours.
    Interior,
    /// Includes at least one boundary contour stitched along the perimeter.
    Perimeter,
}

/// A polygonal region bounded by one or more contour members, carrying the
/// interval index it belongs to and its position in the nesting tree.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContourRegion {
    /// Whether this region touches the perimeter.
    pub kind: RegionKind,
    /// Interval index this region belongs to.
    pub region_index: i64,
    /// Ordered list of `(contour, forward)`; `forward` is true when the
    /// contour is walked in its stored direction.
    pub members: Vec<(ContourId, bool)>,
    /// Signed area accumulated from the member contours.
    pub signed_area: f64,
    /// `signed_area.abs()`.
    pub abs_area: f64,
    /// `abs_area` minus the `abs_area` of every immediate child.
    pub adjusted_area: f64,
    /// A point guaranteed to lie strictly inside this region's boundary,
    /// used by the nesting test.
    pub test_point: DVec2,
    /// The immediate enclosing region, if any.
    pub parent: Option<RegionId>,
    /// Regions whose immediate enclosing parent is this one.
    pub children: Vec<RegionId>,
}

impl ContourRegion {
    pub(crate) fn new(kind: RegionKind, region_index: i64) -> Self {
        Self {
            kind,
            region_index,
            members: Vec::new(),
            signed_area: 0.0,
            abs_area: 0.0,
            adjusted_area: 0.0,
            test_point: DVec2::ZERO,
            parent: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn finalize_area(&mut self) {
        self.abs_area = self.signed_area.abs();
        self.adjusted_area = self.abs_area;
    }
}
