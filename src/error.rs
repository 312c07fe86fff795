//! Error types returned by the public API.

/// Errors that can occur while tracing contours or assembling regions over a TIN.
#[derive(Debug, thiserror::Error)]
pub enum ContourError {
    /// The TIN does not expose a usable perimeter (no edges, or the perimeter
    /// enumeration returned an empty or inconsistent cycle).
    #[error("TIN is not usable for contouring: {reason}")]
    InvalidTin {
        /// Human-readable explanation of what was wrong with the TIN.
        reason: String,
    },

    /// The requested contour levels were empty or not strictly increasing.
    #[error("contour levels must be non-empty and strictly increasing, got {levels:?}")]
    InvalidLevels {
        /// The levels that were rejected.
        levels: Vec<f64>,
    },

    /// The valuator produced a non-finite value for some vertex.
    #[error("valuator returned a non-finite value ({value}) for a vertex")]
    InvalidValue {
        /// The offending value.
        value: f64,
    },

    /// The tracer reached a state the algorithm does not expect, indicating either
    /// a malformed TIN (duplicate or degenerate triangles, inconsistent duals) or a
    /// bug in the tracer itself.
    #[error("contour walk hit an unexpected structure at edge index {edge} ({state})")]
    StructuralFailure {
        /// Stable index of the edge where the walk got stuck.
        edge: u32,
        /// Short description of what was expected.
        state: &'static str,
    },

    /// [`crate::BuildResult::check_integrity`] found that the region areas do not
    /// sum to the envelope area within tolerance.
    #[error(
        "integrity check failed for {description}: expected {expected}, got {actual} (tolerance {tolerance})"
    )]
    IntegrityFailure {
        /// What was being checked (e.g. which level band).
        description: String,
        /// The expected (envelope) area.
        expected: f64,
        /// The actual (summed region) area.
        actual: f64,
        /// The relative tolerance that was exceeded.
        tolerance: f64,
    },
}
