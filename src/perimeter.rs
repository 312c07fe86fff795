//! Perimeter bookkeeping (§4.3): a cyclic list mirroring the TIN's perimeter,
//! one [`PerimeterLink`] per perimeter edge, each owning the tips that land on it.

use std::collections::VecDeque;

use crate::tin::EdgeId;
use crate::tip::TipId;

/// Index into a [`crate::builder::ContourBuilder`]'s perimeter list.
///
/// Perimeter links are built once from the TIN's perimeter enumeration and live
/// for the lifetime of the builder, so a flat index is enough; unlike contours,
/// regions and tips they are never created or removed mid-build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PerimeterLinkId(pub u32);

/// One node of the perimeter's cyclic list.
#[derive(Debug, Clone)]
pub struct PerimeterLink {
    /// The perimeter edge this link wraps.
    pub edge: EdgeId,
    /// Next perimeter link, continuing counter-clockwise.
    pub next: PerimeterLinkId,
    /// Previous perimeter link.
    pub prior: PerimeterLinkId,
    /// First tip of this edge's chain, in traversal order.
    pub tip0: Option<TipId>,
    /// Last tip of this edge's chain.
    pub tip1: Option<TipId>,
    /// Through-edge tips (sweep index 0), accumulated during tracing: starts
    /// pushed to the front, terminations pushed to the back. Drained into
    /// `tip0..tip1` by [`crate::tracer::finalize_tip_chains`].
    pub(crate) pending_edge_tips: VecDeque<TipId>,
    /// Through-vertex tips (sweep index >= 1), accumulated in discovery order
    /// and sorted by sweep index before being merged ahead of the edge tips.
    pub(crate) pending_vertex_tips: Vec<TipId>,
}

impl PerimeterLink {
    pub(crate) fn new(edge: EdgeId, next: PerimeterLinkId, prior: PerimeterLinkId) -> Self {
        Self {
            edge,
            next,
            prior,
            tip0: None,
            tip1: None,
            pending_edge_tips: VecDeque::new(),
            pending_vertex_tips: Vec::new(),
        }
    }
}

/// Builds the cyclic perimeter link list from a TIN's perimeter edge
/// enumeration.
pub(crate) fn build_perimeter_links(edges: &[EdgeId]) -> Vec<PerimeterLink> {
    let n = edges.len();
    (0..n)
        .map(|i| {
            let next = PerimeterLinkId(((i + 1) % n) as u32);
            let prior = PerimeterLinkId(((i + n - 1) % n) as u32);
            PerimeterLink::new(edges[i], next, prior)
        })
        .collect()
}
