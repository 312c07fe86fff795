//! The public entry point: wires the perimeter preparation, per-level tracing,
//! region assembly and nesting together into one build (§6.3).

use std::collections::HashMap;

use glam::DVec2;
use slotmap::SlotMap;
use tracing::debug_span;

use crate::assembler::assemble_regions;
use crate::bitset::EdgeBitSet;
use crate::contour::{Contour, ContourId};
use crate::error::ContourError;
use crate::nest::nest_regions;
use crate::perimeter::{build_perimeter_links, PerimeterLink};
use crate::region::{ContourRegion, RegionId, RegionKind};
use crate::tin::{EdgeId, Tin, Valuator};
use crate::tip::{TipId, TipLink};
use crate::tracer::{build_perimeter_termination, finalize_tip_chains, trace_level, TraceCounters};

const DEFAULT_INTEGRITY_TOLERANCE: f64 = 1e-6;

/// Owns the once-per-build perimeter preparation (§4.2 "Preparation") so it
/// can be reused across multiple [`ContourBuilder::build`] calls against the
/// same TIN.
pub struct ContourBuilder {
    perimeter_links: Vec<PerimeterLink>,
    perimeter_index: HashMap<u32, usize>,
    perimeter_termination: EdgeBitSet,
    envelope: Vec<DVec2>,
}

impl ContourBuilder {
    /// Prepares the perimeter bookkeeping for `tin`. Fails if the TIN's
    /// perimeter enumeration is empty.
    pub fn new<T: Tin>(tin: &T) -> Result<Self, ContourError> {
        let edges: Vec<EdgeId> = tin.perimeter_edges();
        if edges.is_empty() {
            return Err(ContourError::InvalidTin {
                reason: "perimeter edge enumeration is empty".to_string(),
            });
        }

        let perimeter_links = build_perimeter_links(&edges);
        let perimeter_index: HashMap<u32, usize> = edges
            .iter()
            .enumerate()
            .map(|(i, &e)| (tin.index(e), i))
            .collect();
        let perimeter_termination = build_perimeter_termination(tin, &edges);
        let mut envelope: Vec<DVec2> = edges.iter().map(|&e| tin.position(tin.start(e))).collect();
        if let Some(&first) = envelope.first() {
            envelope.push(first);
        }

        Ok(Self {
            perimeter_links,
            perimeter_index,
            perimeter_termination,
            envelope,
        })
    }

    /// Traces every level and, when `build_regions` is true, assembles and
    /// nests the resulting regions (§4.2-§4.5).
    pub fn build<T: Tin>(
        &self,
        tin: &T,
        valuator: &dyn Valuator<T::Vertex>,
        levels: &[f64],
        build_regions: bool,
    ) -> Result<BuildResult, ContourError> {
        validate_levels(levels)?;

        let mut perimeter_links = self.perimeter_links.clone();
        let mut contours: SlotMap<ContourId, Contour> = SlotMap::with_key();
        let mut tips: SlotMap<TipId, TipLink> = SlotMap::with_key();
        let mut contour_tips: HashMap<ContourId, (Option<TipId>, Option<TipId>)> = HashMap::new();
        let mut counters = TraceCounters::default();

        for (level_index, &z) in levels.iter().enumerate() {
            let _span = debug_span!("build_level", level_index).entered();
            trace_level(
                tin,
                valuator,
                level_index,
                z,
                &mut perimeter_links,
                &self.perimeter_index,
                &self.perimeter_termination,
                &mut contours,
                &mut tips,
                &mut contour_tips,
                &mut counters,
            )?;
            tracing::debug!(
                level_index,
                level = z,
                contour_count = contours.len(),
                "level traced"
            );
        }

        finalize_tip_chains(&mut perimeter_links, &mut tips);

        let mut regions: SlotMap<RegionId, ContourRegion> = SlotMap::with_key();
        let mut root_regions = Vec::new();
        if build_regions {
            let _span = debug_span!("assemble_regions").entered();
            let assembled = assemble_regions(
                tin,
                valuator,
                levels,
                &perimeter_links,
                &tips,
                &contour_tips,
                &mut contours,
            )?;
            for region in assembled {
                regions.insert(region);
            }
            root_regions = nest_regions(&mut regions, &contours);
        }

        Ok(BuildResult {
            contours,
            regions,
            root_regions,
            envelope: self.envelope.clone(),
            counters,
        })
    }
}

/// The outcome of one [`ContourBuilder::build`] call.
#[derive(Debug, Clone)]
pub struct BuildResult {
    contours: SlotMap<ContourId, Contour>,
    regions: SlotMap<RegionId, ContourRegion>,
    root_regions: Vec<RegionId>,
    envelope: Vec<DVec2>,
    counters: TraceCounters,
}

impl BuildResult {
    /// Every traced contour: interior (open and closed) plus, when regions
    /// were built, the boundary contours produced by stitching.
    pub fn contours(&self) -> impl Iterator<Item = (ContourId, &Contour)> {
        self.contours.iter()
    }

    /// Looks up a single contour by id.
    pub fn contour(&self, id: ContourId) -> Option<&Contour> {
        self.contours.get(id)
    }

    /// Every assembled region, empty unless the build requested them.
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &ContourRegion)> {
        self.regions.iter()
    }

    /// Looks up a single region by id.
    pub fn region(&self, id: RegionId) -> Option<&ContourRegion> {
        self.regions.get(id)
    }

    /// Regions with no parent: the roots of the nesting forest.
    pub fn root_regions(&self) -> &[RegionId] {
        &self.root_regions
    }

    /// The TIN's perimeter polygon, closed (first point duplicated at the end).
    pub fn envelope(&self) -> &[DVec2] {
        &self.envelope
    }

    /// Total edge-crossing transitions taken across all traced levels.
    pub fn edge_transit_count(&self) -> u64 {
        self.counters.edge_transits
    }

    /// Total through-vertex transitions taken across all traced levels.
    pub fn vertex_transit_count(&self) -> u64 {
        self.counters.vertex_transits
    }

    fn envelope_area(&self) -> f64 {
        crate::math::signed_area(&self.envelope).abs()
    }

    /// Checks that region areas reconcile with the envelope area (§6.4),
    /// using the default relative tolerance of `1e-6`.
    pub fn check_integrity_default(&self) -> Result<(), ContourError> {
        self.check_integrity(DEFAULT_INTEGRITY_TOLERANCE)
    }

    /// Checks that region areas reconcile with the envelope area (§6.4):
    /// the `absArea` sum over Perimeter-typed regions, and the `adjustedArea`
    /// sum over all regions, must each equal the envelope area within
    /// `tolerance` (relative).
    pub fn check_integrity(&self, tolerance: f64) -> Result<(), ContourError> {
        let expected = self.envelope_area();

        let perimeter_sum: f64 = self
            .regions
            .values()
            .filter(|r| r.kind == RegionKind::Perimeter)
            .map(|r| r.abs_area)
            .sum();
        check_area_sum("perimeter region area", expected, perimeter_sum, tolerance)?;

        let adjusted_sum: f64 = self.regions.values().map(|r| r.adjusted_area).sum();
        check_area_sum("adjusted region area", expected, adjusted_sum, tolerance)?;

        Ok(())
    }
}

fn check_area_sum(
    description: &str,
    expected: f64,
    actual: f64,
    tolerance: f64,
) -> Result<(), ContourError> {
    let denom = expected.abs().max(f64::MIN_POSITIVE);
    if ((actual - expected).abs() / denom) > tolerance {
        tracing::error!(description, expected, actual, tolerance, "integrity check failed");
        return Err(ContourError::IntegrityFailure {
            description: description.to_string(),
            expected,
            actual,
            tolerance,
        });
    }
    Ok(())
}

fn validate_levels(levels: &[f64]) -> Result<(), ContourError> {
    if levels.is_empty() || !levels.windows(2).all(|w| w[0] < w[1]) {
        return Err(ContourError::InvalidLevels {
            levels: levels.to_vec(),
        });
    }
    Ok(())
}

/// Convenience wrapper around [`ContourBuilder::new`] followed by
/// [`ContourBuilder::build`], for callers who do not need to reuse the
/// perimeter preparation across multiple builds.
pub fn contour_tin<T: Tin>(
    tin: &T,
    valuator: &dyn Valuator<T::Vertex>,
    levels: &[f64],
    build_regions: bool,
) -> Result<BuildResult, ContourError> {
    ContourBuilder::new(tin)?.build(tin, valuator, levels, build_regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_levels() {
        let levels: Vec<f64> = Vec::new();
        let err = validate_levels(&levels);
        assert!(matches!(err, Err(ContourError::InvalidLevels { .. })));
    }

    #[test]
    fn rejects_non_increasing_levels() {
        let levels = vec![1.0, 1.0];
        let err = validate_levels(&levels);
        assert!(matches!(err, Err(ContourError::InvalidLevels { .. })));
    }

    #[test]
    fn accepts_strictly_increasing_levels() {
        let levels = vec![0.0, 1.0, 2.0];
        assert!(validate_levels(&levels).is_ok());
    }
}
