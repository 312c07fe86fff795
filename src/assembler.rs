//! The region assembler (§4.4, C5): stitches the perimeter's tip chains and the
//! traced contours into closed polygonal [`ContourRegion`]s, and seeds a region
//! for every closed-loop contour that never touches the hull.
//!
//! Runs once, after every level has been traced and [`crate::tracer::finalize_tip_chains`]
//! has settled the final `tip0..tip1` ordering on every [`PerimeterLink`].

use std::collections::{HashMap, HashSet};

use glam::DVec2;
use slotmap::SlotMap;

use crate::contour::{Contour, ContourId, ContourKind, PERIMETER_SIDE};
use crate::error::ContourError;
use crate::math::signed_area;
use crate::perimeter::PerimeterLink;
use crate::region::{ContourRegion, RegionKind};
use crate::tin::{Tin, Valuator};
use crate::tip::{TipId, TipLink};

/// Returns the point a member contour presents at its start or end, depending
/// on whether `at_start` asks for the contour's first point or its last.
fn junction_point(contour: &Contour, at_start: bool) -> DVec2 {
    if at_start {
        contour.points[0]
    } else {
        *contour.points.last().unwrap()
    }
}

/// Flattens a region's members into one closed point ring, respecting each
/// member's `forward` flag, for area computation and point-in-polygon testing.
pub(crate) fn region_ring(region: &ContourRegion, contours: &SlotMap<ContourId, Contour>) -> Vec<DVec2> {
    let mut ring = Vec::new();
    for &(contour_id, forward) in &region.members {
        let contour = &contours[contour_id];
        if forward {
            ring.extend(contour.points.iter().copied());
        } else {
            ring.extend(contour.points.iter().rev().copied());
        }
    }
    ring
}

fn finalize_region(region: &mut ContourRegion, contours: &SlotMap<ContourId, Contour>) {
    let ring = region_ring(region, contours);
    region.signed_area = signed_area(&ring);
    region.finalize_area();
    region.test_point = test_point(region, contours);
}

/// §4.5 test point selection: the midpoint of the first member's first stored
/// edge, which is guaranteed to lie strictly between two vertices of that
/// member and never coincide with a vertex of whatever region ends up
/// enclosing this one.
fn test_point(region: &ContourRegion, contours: &SlotMap<ContourId, Contour>) -> DVec2 {
    let (first_contour, _) = region.members[0];
    let points = &contours[first_contour].points;
    if points.len() >= 2 {
        (points[0] + points[1]) / 2.0
    } else {
        points[0]
    }
}

/// Builds the single hull-spanning region used when no contour at any level
/// touches the perimeter (§4.4 "special case").
fn build_hull_region<T: Tin>(
    tin: &T,
    valuator: &dyn Valuator<T::Vertex>,
    levels: &[f64],
    perimeter_links: &[PerimeterLink],
    contours: &mut SlotMap<ContourId, Contour>,
) -> Result<ContourRegion, ContourError> {
    let mut boundary = Contour::new(f64::NAN, ContourKind::Boundary);
    for link in perimeter_links {
        boundary.append_vertex(tin.position(tin.start(link.edge)));
    }
    boundary.complete(true);

    let a0 = tin.start(perimeter_links[0].edge);
    let za0 = valuator.value(a0);
    if !za0.is_finite() {
        return Err(ContourError::InvalidValue { value: za0 });
    }
    let left_index = levels
        .iter()
        .position(|&zi| zi > za0)
        .map(|i| i as i64)
        .unwrap_or(levels.len() as i64);
    boundary.left_index = left_index;
    boundary.right_index = PERIMETER_SIDE;

    let boundary_id = contours.insert(boundary);
    let mut region = ContourRegion::new(RegionKind::Perimeter, left_index);
    region.members.push((boundary_id, true));
    Ok(region)
}

/// Runs one full stitching loop (§4.4 "Stitching loop") starting at
/// `origin_tip`, traveling `origin_tip`'s contour in direction `forward0`,
/// alternating interior-contour members with freshly built perimeter-arc
/// ("Boundary") members until the loop returns to its own origin.
///
/// The perimeter arc after a member must continue from the point that
/// member's traversal *left* the hull at, not the point it *entered* at:
/// `contour_tips` (the contour's `(startTip, terminalTip)` pair) resolves
/// that exit tip for each member before its arc is walked.
#[allow(clippy::too_many_arguments)]
fn stitch_region<T: Tin>(
    tin: &T,
    perimeter_links: &[PerimeterLink],
    tips: &SlotMap<TipId, TipLink>,
    contour_tips: &HashMap<ContourId, (Option<TipId>, Option<TipId>)>,
    contours: &mut SlotMap<ContourId, Contour>,
    origin_tip: TipId,
    forward0: bool,
    traversed_forward: &mut HashSet<ContourId>,
    traversed_backward: &mut HashSet<ContourId>,
) -> ContourRegion {
    let origin_contour = tips[origin_tip].contour;
    let region_index = {
        let c = &contours[origin_contour];
        if forward0 { c.left_index } else { c.right_index }
    };
    let mut region = ContourRegion::new(RegionKind::Perimeter, region_index);

    let mut node = origin_tip;
    let mut forward = forward0;
    loop {
        let contour_id = tips[node].contour;
        region.members.push((contour_id, forward));
        if forward {
            traversed_forward.insert(contour_id);
        } else {
            traversed_backward.insert(contour_id);
        }

        let mut boundary = Contour::new(contours[contour_id].z, ContourKind::Boundary);
        boundary.left_index = region_index;
        boundary.right_index = PERIMETER_SIDE;
        boundary.append(junction_point(&contours[contour_id], !forward));

        let (start_tip, terminal_tip) = contour_tips[&contour_id];
        let exit_tip = if forward { terminal_tip } else { start_tip }
            .expect("a member contour's traversed end must have a registered tip");

        let mut next_node = tips[exit_tip].next;
        if next_node.is_none() {
            let mut cursor = perimeter_links[tips[exit_tip].perimeter_link.0 as usize].next;
            loop {
                let link = &perimeter_links[cursor.0 as usize];
                if let Some(t0) = link.tip0 {
                    next_node = Some(t0);
                    break;
                }
                boundary.append_vertex(tin.position(tin.start(link.edge)));
                cursor = link.next;
            }
        }
        let next_node = next_node.unwrap();
        let next_contour_id = tips[next_node].contour;
        boundary.append(junction_point(&contours[next_contour_id], tips[next_node].is_start));
        boundary.complete(false);

        let boundary_id = contours.insert(boundary);
        region.members.push((boundary_id, true));

        if next_node == origin_tip {
            break;
        }
        forward = tips[next_node].is_start;
        node = next_node;
    }
    region
}

/// Assembles every [`ContourRegion`] from the traced contours and the
/// finalized perimeter tip chains (§4.4). Must run after
/// [`crate::tracer::finalize_tip_chains`]. Newly built Boundary contours are
/// inserted into `contours`.
pub(crate) fn assemble_regions<T: Tin>(
    tin: &T,
    valuator: &dyn Valuator<T::Vertex>,
    levels: &[f64],
    perimeter_links: &[PerimeterLink],
    tips: &SlotMap<TipId, TipLink>,
    contour_tips: &HashMap<ContourId, (Option<TipId>, Option<TipId>)>,
    contours: &mut SlotMap<ContourId, Contour>,
) -> Result<Vec<ContourRegion>, ContourError> {
    let mut regions = Vec::new();

    let has_any_tip = perimeter_links.iter().any(|l| l.tip0.is_some());
    if !has_any_tip {
        regions.push(build_hull_region(tin, valuator, levels, perimeter_links, contours)?);
    } else {
        let mut traversed_forward = HashSet::new();
        let mut traversed_backward = HashSet::new();
        for link_index in 0..perimeter_links.len() {
            let mut node = perimeter_links[link_index].tip0;
            while let Some(tip_id) = node {
                let tip = &tips[tip_id];
                let contour_id = tip.contour;
                if tip.is_start && !traversed_forward.contains(&contour_id) {
                    let region = stitch_region(
                        tin,
                        perimeter_links,
                        tips,
                        contour_tips,
                        contours,
                        tip_id,
                        true,
                        &mut traversed_forward,
                        &mut traversed_backward,
                    );
                    regions.push(region);
                } else if !tip.is_start && !traversed_backward.contains(&contour_id) {
                    let region = stitch_region(
                        tin,
                        perimeter_links,
                        tips,
                        contour_tips,
                        contours,
                        tip_id,
                        false,
                        &mut traversed_forward,
                        &mut traversed_backward,
                    );
                    regions.push(region);
                }
                node = tips[tip_id].next;
            }
        }
    }

    // Closed-loop regions: every closed, non-empty Interior contour becomes its
    // own single-member region, keyed by whichever side of it turned out to
    // wind counter-clockwise (§4.4 "Closed-loop regions").
    let closed_contours: Vec<ContourId> = contours
        .iter()
        .filter(|(_, c)| c.kind == ContourKind::Interior && c.closed_loop && c.points.len() >= 2)
        .map(|(id, _)| id)
        .collect();
    for contour_id in closed_contours {
        let contour = &contours[contour_id];
        let area = signed_area(&contour.points);
        let region_index = if area > 0.0 {
            contour.left_index
        } else {
            contour.right_index
        };
        let mut region = ContourRegion::new(RegionKind::Interior, region_index);
        region.members.push((contour_id, true));
        regions.push(region);
    }

    for region in &mut regions {
        finalize_region(region, contours);
    }

    Ok(regions)
}
