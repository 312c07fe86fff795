//! Tip bookkeeping (§4.3): the loose end of an open contour where it meets the
//! perimeter, linked into the cyclic chain its owning [`crate::perimeter::PerimeterLink`]
//! keeps in sweep order.

use crate::contour::ContourId;
use crate::perimeter::PerimeterLinkId;

slotmap::new_key_type! {
    /// Arena key for a [`TipLink`].
    pub struct TipId;
}

/// One loose end of an open contour, anchored to the perimeter edge it crosses
/// (or passes through a vertex of).
#[derive(Debug, Clone)]
pub struct TipLink {
    /// The perimeter edge this tip is anchored to.
    pub perimeter_link: PerimeterLinkId,
    /// The contour this tip belongs to.
    pub contour: ContourId,
    /// Whether this is the contour's start (`true`) or its terminal end
    /// (`false`).
    pub is_start: bool,
    /// Position within the anchoring edge's through-vertex sweep: `0` for a
    /// through-edge tip, `1..` for a through-vertex tip found at that sweep
    /// step. Used to order multiple tips sharing one perimeter edge.
    pub sweep_index: u32,
    /// Next tip around the perimeter, in the order the stitching phase should
    /// visit it.
    pub next: Option<TipId>,
    /// Previous tip around the perimeter.
    pub prior: Option<TipId>,
}

impl TipLink {
    pub(crate) fn new(
        perimeter_link: PerimeterLinkId,
        contour: ContourId,
        is_start: bool,
        sweep_index: u32,
    ) -> Self {
        Self {
            perimeter_link,
            contour,
            is_start,
            sweep_index,
            next: None,
            prior: None,
        }
    }
}
