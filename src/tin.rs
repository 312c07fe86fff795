//! The read-only contract a caller's Delaunay triangulation must satisfy (§6.1).
//!
//! This crate never builds or mutates a triangulation; it only walks one through
//! this trait. Implementations are expected to be cheap, side-effect-free views
//! over whatever triangulation structure the caller already owns.

use glam::DVec2;

/// Stable index of a directed half-edge.
///
/// Half-edges are allocated in dual pairs: for every edge `e`, `index(dual(e))`
/// must equal `index(e) ^ 1`. Indices need not be contiguous, but every value in
/// `0..=max_edge_index` must resolve to a valid edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// The raw index backing this edge id.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A read-only view over a Delaunay (or otherwise fully triangulated) TIN.
///
/// `Vertex` is whatever opaque handle the caller's triangulation uses to name a
/// point; this crate only ever compares, hashes and looks up coordinates/values
/// for it.
pub trait Tin {
    /// The caller's vertex handle type.
    type Vertex: Copy + Eq + std::hash::Hash;

    /// The vertex this directed edge starts at.
    fn start(&self, edge: EdgeId) -> Self::Vertex;

    /// The vertex this directed edge ends at, or `None` if `edge` is a perimeter
    /// "ghost" half-edge with no real triangle on its side.
    fn end(&self, edge: EdgeId) -> Option<Self::Vertex>;

    /// The next edge of the same triangle, in the triangle's winding order.
    fn forward(&self, edge: EdgeId) -> EdgeId;

    /// The previous edge of the same triangle. Equivalent to `forward(forward(edge))`
    /// for a triangle (three edges), but implementations may provide it directly.
    fn reverse(&self, edge: EdgeId) -> EdgeId;

    /// The opposite directed half-edge sharing the same undirected edge, on the
    /// other side. For a perimeter edge this is a ghost half-edge whose `end` is
    /// `None`.
    fn dual(&self, edge: EdgeId) -> EdgeId;

    /// The 2D planar coordinates of a vertex.
    fn position(&self, vertex: Self::Vertex) -> DVec2;

    /// The largest edge index the TIN will ever hand back, used to size scratch
    /// bit sets. Every index in `0..=max_edge_index` must be a valid edge.
    fn max_edge_index(&self) -> u32;

    /// The stable index backing `edge`, used to address bit sets and the
    /// perimeter-edge lookup table. Defaults to `edge.index()`; implementations
    /// whose `EdgeId` does not directly carry its own bit-set slot may override
    /// this.
    fn index(&self, edge: EdgeId) -> u32 {
        edge.index()
    }

    /// The perimeter (convex hull boundary) edges, oriented so the triangulated
    /// interior lies on their left, listed counter-clockwise starting anywhere.
    fn perimeter_edges(&self) -> Vec<EdgeId>;

    /// Every directed edge the TIN is prepared to answer queries about, including
    /// both real half-edges and perimeter ghost half-edges. Used by the
    /// closed-loop phase to seed fully-interior contours and to precompute the
    /// perimeter-termination bit set.
    fn all_edges(&self) -> Vec<EdgeId> {
        (0..=self.max_edge_index()).map(EdgeId).collect()
    }

    /// The next edge, in rotational order, among the edges emanating from
    /// `start(edge)`. Repeated application sweeps a full turn around the vertex
    /// for interior vertices, or runs out (reaches a perimeter ghost edge) for
    /// hull vertices.
    ///
    /// The default implementation derives this from `dual`/`reverse`, which is
    /// the standard quad-edge identity (`onext(e) = dual(reverse(e))`) and holds
    /// for any consistent half-edge TIN; implementations may override it if they
    /// maintain an explicit vertex fan instead.
    fn pinwheel(&self, edge: EdgeId) -> EdgeId {
        self.dual(self.reverse(edge))
    }

    /// True when `edge` borders the perimeter: its dual has no end vertex.
    fn is_perimeter(&self, edge: EdgeId) -> bool {
        self.end(self.dual(edge)).is_none()
    }
}

/// Supplies the scalar field being contoured (§6.2).
///
/// Implemented automatically for any `Fn(Vertex) -> f64`, so most callers can
/// just pass a closure.
pub trait Valuator<Vertex> {
    /// Returns the scalar value at `vertex`. Implementations should not return
    /// NaN; the builder treats that as [`crate::ContourError::InvalidValue`].
    fn value(&self, vertex: Vertex) -> f64;
}

impl<Vertex, F> Valuator<Vertex> for F
where
    F: Fn(Vertex) -> f64,
{
    fn value(&self, vertex: Vertex) -> f64 {
        self(vertex)
    }
}
