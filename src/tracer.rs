//! The contour tracer (§4.2, C4): single-level walk driving start detection,
//! through-edge/through-vertex transitions, and termination, over a single
//! iso-level `z`.

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::bitset::EdgeBitSet;
use crate::contour::{Contour, ContourId, ContourKind};
use crate::error::ContourError;
use crate::perimeter::{PerimeterLink, PerimeterLinkId};
use crate::tin::{EdgeId, Tin, Valuator};
use crate::tip::{TipId, TipLink};

/// Diagnostic counters accumulated over a build (§6.3).
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceCounters {
    /// Number of edge-crossing transitions taken across all levels.
    pub edge_transits: u64,
    /// Number of through-vertex transitions taken across all levels.
    pub vertex_transits: u64,
}

#[derive(Debug, Clone, Copy)]
enum WalkState<V> {
    ThroughEdge(EdgeId),
    ThroughVertex(V, EdgeId),
}

enum WalkEnd {
    Closed,
    Open { anchor_edge: EdgeId },
}

enum VertexStepOutcome<V> {
    Exit {
        opp: EdgeId,
        descending_edge: EdgeId,
        g: V,
        zg: f64,
        k: V,
        zk: f64,
    },
    Transfer {
        consumed_edge: EdgeId,
        new_vertex: V,
        new_support: EdgeId,
    },
    Rotate {
        next_support: EdgeId,
    },
}

fn value<T: Tin>(
    tin: &T,
    valuator: &dyn Valuator<T::Vertex>,
    vertex: T::Vertex,
) -> Result<f64, ContourError> {
    let _ = tin;
    let v = valuator.value(vertex);
    if !v.is_finite() {
        return Err(ContourError::InvalidValue { value: v });
    }
    Ok(v)
}

fn mark_visited<T: Tin>(tin: &T, visited: &mut EdgeBitSet, edge: EdgeId) {
    visited.set(tin.index(edge));
    visited.set(tin.index(tin.dual(edge)));
}

/// Creates an interior contour for the level at `level_index`, with
/// `left_index`/`right_index` set to the uphill/downhill interval indices either
/// side of it (§4.4's stitching and closed-loop region assignment rely on
/// these: `left_index = level_index + 1` is the region above `z`,
/// `right_index = level_index` is the region below it).
fn new_interior_contour(z: f64, level_index: usize) -> Contour {
    let mut contour = Contour::new(z, ContourKind::Interior);
    contour.left_index = (level_index + 1) as i64;
    contour.right_index = level_index as i64;
    contour
}

/// Examines the triangle opposite a through-vertex support edge, per the
/// THROUGH_VERTEX step description in §4.2.
fn vertex_step<T: Tin>(
    tin: &T,
    valuator: &dyn Valuator<T::Vertex>,
    z: f64,
    support: EdgeId,
) -> Result<VertexStepOutcome<T::Vertex>, ContourError> {
    let opp = tin.forward(support);
    let k = tin.start(opp);
    let g = tin.end(opp).ok_or(ContourError::StructuralFailure {
        edge: tin.index(support),
        state: "through-vertex sweep reached an edge with no third vertex",
    })?;
    let zk = value(tin, valuator, k)?;
    let zg = value(tin, valuator, g)?;
    if zg > z && z > zk {
        Ok(VertexStepOutcome::Exit {
            opp,
            descending_edge: tin.dual(opp),
            g,
            zg,
            k,
            zk,
        })
    } else if zg == z && zk < z {
        let new_support = tin.pinwheel(tin.reverse(support));
        Ok(VertexStepOutcome::Transfer {
            consumed_edge: tin.reverse(support),
            new_vertex: g,
            new_support,
        })
    } else {
        Ok(VertexStepOutcome::Rotate {
            next_support: tin.pinwheel(support),
        })
    }
}

/// True when the walker's current representative edge (the just-crossed edge
/// for THROUGH_EDGE, the support edge for THROUGH_VERTEX) shows the walk is
/// about to leave the hull.
fn is_terminal<T: Tin>(tin: &T, perimeter_termination: &EdgeBitSet, current: EdgeId) -> bool {
    perimeter_termination.get(tin.index(tin.dual(current))) || tin.end(tin.forward(current)).is_none()
}

#[allow(clippy::too_many_arguments)]
fn run_walk<T: Tin>(
    tin: &T,
    valuator: &dyn Valuator<T::Vertex>,
    z: f64,
    contour: &mut Contour,
    mut state: WalkState<T::Vertex>,
    closed_loop: bool,
    start_edge: Option<EdgeId>,
    start_vertex: Option<T::Vertex>,
    visited: &mut EdgeBitSet,
    perimeter_termination: &EdgeBitSet,
    counters: &mut TraceCounters,
) -> Result<WalkEnd, ContourError> {
    let max_turns = tin.max_edge_index() as usize + 4;
    let mut rotation_count = 0usize;
    // The walk is seeded at its own starting position (the crossing already
    // appended by the caller), so the closed-loop return-to-start check must
    // not fire before at least one step has been taken away from it.
    let mut first_iteration = true;
    loop {
        match state {
            WalkState::ThroughEdge(e) => {
                if !closed_loop {
                    // The seed position itself sits on the perimeter (both its
                    // endpoints are hull vertices), so the termination check
                    // must not fire before the walk has actually stepped away
                    // from it.
                    if !first_iteration && is_terminal(tin, perimeter_termination, e) {
                        return Ok(WalkEnd::Open { anchor_edge: e });
                    }
                } else if !first_iteration && start_vertex.is_none() && start_edge == Some(e) {
                    return Ok(WalkEnd::Closed);
                }
                first_iteration = false;

                let a = tin.start(e);
                let b = tin.end(e).ok_or(ContourError::StructuralFailure {
                    edge: tin.index(e),
                    state: "through-edge position missing end vertex",
                })?;
                let za = value(tin, valuator, a)?;
                let zb = value(tin, valuator, b)?;
                debug_assert!(
                    za > z && z > zb,
                    "through-edge invariant z(A) > z > z(B) violated"
                );

                let c = tin
                    .end(tin.forward(e))
                    .ok_or(ContourError::StructuralFailure {
                        edge: tin.index(e),
                        state: "through-edge: forward face has no third vertex",
                    })?;
                let zc = value(tin, valuator, c)?;

                let pa = tin.position(a);
                let pb = tin.position(b);
                let pc = tin.position(c);

                if zc < z {
                    let edge_used = tin.reverse(e);
                    contour.append_crossing(pa, za, pc, zc, z);
                    mark_visited(tin, visited, edge_used);
                    state = WalkState::ThroughEdge(tin.dual(edge_used));
                    counters.edge_transits += 1;
                } else if zc > z {
                    let edge_used = tin.forward(e);
                    contour.append_crossing(pc, zc, pb, zb, z);
                    mark_visited(tin, visited, edge_used);
                    state = WalkState::ThroughEdge(tin.dual(edge_used));
                    counters.edge_transits += 1;
                } else {
                    contour.append_vertex(pc);
                    state = WalkState::ThroughVertex(c, tin.reverse(e));
                    rotation_count = 0;
                    counters.vertex_transits += 1;
                }
            }
            WalkState::ThroughVertex(vertex, support) => {
                if !closed_loop {
                    if !first_iteration && is_terminal(tin, perimeter_termination, support) {
                        return Ok(WalkEnd::Open {
                            anchor_edge: support,
                        });
                    }
                } else if !first_iteration && start_edge.is_none() && start_vertex == Some(vertex) {
                    return Ok(WalkEnd::Closed);
                }
                first_iteration = false;

                match vertex_step(tin, valuator, z, support)? {
                    VertexStepOutcome::Exit {
                        opp,
                        descending_edge,
                        g,
                        zg,
                        k,
                        zk,
                    } => {
                        let pg = tin.position(g);
                        let pk = tin.position(k);
                        contour.append_crossing(pg, zg, pk, zk, z);
                        mark_visited(tin, visited, opp);
                        state = WalkState::ThroughEdge(descending_edge);
                        counters.edge_transits += 1;
                    }
                    VertexStepOutcome::Transfer {
                        consumed_edge,
                        new_vertex,
                        new_support,
                    } => {
                        contour.append_vertex(tin.position(new_vertex));
                        mark_visited(tin, visited, consumed_edge);
                        state = WalkState::ThroughVertex(new_vertex, new_support);
                        rotation_count = 0;
                        counters.vertex_transits += 1;
                    }
                    VertexStepOutcome::Rotate { next_support } => {
                        rotation_count += 1;
                        if rotation_count > max_turns {
                            return Err(ContourError::StructuralFailure {
                                edge: tin.index(support),
                                state: "through-vertex sweep completed a full turn without a transition",
                            });
                        }
                        state = WalkState::ThroughVertex(vertex, next_support);
                    }
                }
            }
        }
    }
}

/// Finds the perimeter link that anchors a terminated open contour, walking
/// outward from the walk's final representative edge if it does not already
/// coincide with a registered perimeter edge.
fn anchor_tip<T: Tin>(
    tin: &T,
    perimeter_index: &HashMap<u32, usize>,
    anchor_edge: EdgeId,
) -> Result<(usize, u32), ContourError> {
    if let Some(&link) = perimeter_index.get(&tin.index(anchor_edge)) {
        return Ok((link, 0));
    }
    let mut current = anchor_edge;
    let max_steps = tin.max_edge_index() + 4;
    for step in 1..=max_steps {
        current = tin.pinwheel(current);
        if let Some(&link) = perimeter_index.get(&tin.index(current)) {
            return Ok((link, step));
        }
        if current == anchor_edge {
            break;
        }
    }
    Err(ContourError::StructuralFailure {
        edge: tin.index(anchor_edge),
        state: "open contour termination could not be anchored to a perimeter edge",
    })
}

#[allow(clippy::too_many_arguments)]
fn register_tip(
    perimeter_links: &mut [PerimeterLink],
    tips: &mut SlotMap<TipId, TipLink>,
    contour_tips: &mut HashMap<ContourId, (Option<TipId>, Option<TipId>)>,
    link_index: usize,
    contour: ContourId,
    is_start: bool,
    sweep_index: u32,
) {
    let link_id = PerimeterLinkId(link_index as u32);
    let tip = tips.insert(TipLink::new(link_id, contour, is_start, sweep_index));
    let link = &mut perimeter_links[link_index];
    if sweep_index == 0 {
        if is_start {
            link.pending_edge_tips.push_front(tip);
        } else {
            link.pending_edge_tips.push_back(tip);
        }
    } else {
        link.pending_vertex_tips.push(tip);
    }
    let entry = contour_tips.entry(contour).or_insert((None, None));
    if is_start {
        entry.0 = Some(tip);
    } else {
        entry.1 = Some(tip);
    }
}

/// Drains each perimeter link's pending tip buffers into its final `tip0..tip1`
/// chain: through-vertex tips first (sorted by sweep index ascending), then
/// through-edge tips in their accumulated start-prepended/termination-appended
/// order. Must run once, after every level has been traced.
pub(crate) fn finalize_tip_chains(
    perimeter_links: &mut [PerimeterLink],
    tips: &mut SlotMap<TipId, TipLink>,
) {
    for link in perimeter_links.iter_mut() {
        link.pending_vertex_tips
            .sort_by_key(|id| tips[*id].sweep_index);
        let mut chain: Vec<TipId> = std::mem::take(&mut link.pending_vertex_tips);
        chain.extend(link.pending_edge_tips.drain(..));
        for window in chain.windows(2) {
            tips[window[0]].next = Some(window[1]);
            tips[window[1]].prior = Some(window[0]);
        }
        link.tip0 = chain.first().copied();
        link.tip1 = chain.last().copied();
    }
}

/// Traces every contour at a single iso-level `z`, inserting the produced
/// contours into `contours`, registering perimeter tips for open contours, and
/// updating the shared diagnostic counters.
#[allow(clippy::too_many_arguments)]
pub(crate) fn trace_level<T: Tin>(
    tin: &T,
    valuator: &dyn Valuator<T::Vertex>,
    level_index: usize,
    z: f64,
    perimeter_links: &mut [PerimeterLink],
    perimeter_index: &HashMap<u32, usize>,
    perimeter_termination: &EdgeBitSet,
    contours: &mut SlotMap<ContourId, Contour>,
    tips: &mut SlotMap<TipId, TipLink>,
    contour_tips: &mut HashMap<ContourId, (Option<TipId>, Option<TipId>)>,
    counters: &mut TraceCounters,
) -> Result<(), ContourError> {
    let mut visited = EdgeBitSet::new(tin.max_edge_index());
    let link_count = perimeter_links.len();

    // Open-contour phase: walk the perimeter counter-clockwise (§4.2).
    for link_index in 0..link_count {
        let edge = perimeter_links[link_index].edge;
        let a = tin.start(edge);
        let b = tin.end(edge).ok_or(ContourError::InvalidTin {
            reason: "perimeter edge has no end vertex".to_string(),
        })?;
        let za = value(tin, valuator, a)?;
        let zb = value(tin, valuator, b)?;

        if za > z && z > zb {
            trace!(level = z, edge = edge.0, "open through-edge start");
            let mut contour = new_interior_contour(z, level_index);
            let pa = tin.position(a);
            let pb = tin.position(b);
            contour.append_crossing(pa, za, pb, zb, z);
            mark_visited(tin, &mut visited, edge);
            counters.edge_transits += 1;

            let end = run_walk(
                tin,
                valuator,
                z,
                &mut contour,
                WalkState::ThroughEdge(edge),
                false,
                None,
                None,
                &mut visited,
                perimeter_termination,
                counters,
            )?;
            contour.complete(false);
            let contour_id = contours.insert(contour);
            register_tip(perimeter_links, tips, contour_tips, link_index, contour_id, true, 0);
            if let WalkEnd::Open { anchor_edge } = end {
                let (link, sweep) = anchor_tip(tin, perimeter_index, anchor_edge)?;
                register_tip(perimeter_links, tips, contour_tips, link, contour_id, false, sweep);
            }
        } else if za == z {
            trace!(level = z, edge = edge.0, "open through-vertex start sweep");
            let mut support = edge;
            let mut sweep_index = 1u32;
            let max_steps = tin.max_edge_index() + 4;
            loop {
                if sweep_index as u32 > max_steps {
                    break;
                }
                match vertex_step(tin, valuator, z, support)? {
                    VertexStepOutcome::Exit {
                        opp,
                        descending_edge,
                        g,
                        zg,
                        k,
                        zk,
                    } => {
                        let mut contour = new_interior_contour(z, level_index);
                        contour.append_vertex(tin.position(a));
                        let pg = tin.position(g);
                        let pk = tin.position(k);
                        contour.append_crossing(pg, zg, pk, zk, z);
                        mark_visited(tin, &mut visited, opp);
                        counters.edge_transits += 1;

                        let end = run_walk(
                            tin,
                            valuator,
                            z,
                            &mut contour,
                            WalkState::ThroughEdge(descending_edge),
                            false,
                            None,
                            None,
                            &mut visited,
                            perimeter_termination,
                            counters,
                        )?;
                        contour.complete(false);
                        let contour_id = contours.insert(contour);
                        register_tip(
                            perimeter_links,
                            tips,
                            contour_tips,
                            link_index,
                            contour_id,
                            true,
                            sweep_index,
                        );
                        if let WalkEnd::Open { anchor_edge } = end {
                            let (link, sweep) = anchor_tip(tin, perimeter_index, anchor_edge)?;
                            register_tip(perimeter_links, tips, contour_tips, link, contour_id, false, sweep);
                        }
                        break;
                    }
                    VertexStepOutcome::Transfer {
                        consumed_edge,
                        new_vertex,
                        new_support,
                    } => {
                        if is_terminal(tin, perimeter_termination, new_support) {
                            let mut contour = new_interior_contour(z, level_index);
                            contour.append_vertex(tin.position(a));
                            contour.append_vertex(tin.position(new_vertex));
                            mark_visited(tin, &mut visited, consumed_edge);
                            counters.vertex_transits += 1;
                            contour.complete(false);
                            let contour_id = contours.insert(contour);
                            register_tip(
                                perimeter_links,
                                tips,
                                contour_tips,
                                link_index,
                                contour_id,
                                true,
                                sweep_index,
                            );
                            let (link, sweep) = anchor_tip(tin, perimeter_index, new_support)?;
                            register_tip(perimeter_links, tips, contour_tips, link, contour_id, false, sweep);
                            break;
                        }

                        let mut contour = new_interior_contour(z, level_index);
                        contour.append_vertex(tin.position(a));
                        contour.append_vertex(tin.position(new_vertex));
                        mark_visited(tin, &mut visited, consumed_edge);
                        counters.vertex_transits += 1;

                        let end = run_walk(
                            tin,
                            valuator,
                            z,
                            &mut contour,
                            WalkState::ThroughVertex(new_vertex, new_support),
                            false,
                            None,
                            None,
                            &mut visited,
                            perimeter_termination,
                            counters,
                        )?;
                        contour.complete(false);
                        let contour_id = contours.insert(contour);
                        register_tip(
                            perimeter_links,
                            tips,
                            contour_tips,
                            link_index,
                            contour_id,
                            true,
                            sweep_index,
                        );
                        if let WalkEnd::Open { anchor_edge } = end {
                            let (link, sweep) = anchor_tip(tin, perimeter_index, anchor_edge)?;
                            register_tip(perimeter_links, tips, contour_tips, link, contour_id, false, sweep);
                        }
                        break;
                    }
                    VertexStepOutcome::Rotate { next_support } => {
                        support = next_support;
                        sweep_index += 1;
                        if tin.is_perimeter(support) {
                            // The fan around `A` ran out without a transition:
                            // this degenerate vertex does not start a contour.
                            debug!(level = z, vertex_edge = edge.0, "through-vertex start exhausted");
                            break;
                        }
                    }
                }
            }
        }
    }

    // Closed-loop phase: every edge not yet visited (§4.2).
    for edge in tin.all_edges() {
        if tin.end(edge).is_none() {
            continue;
        }
        if visited.get(tin.index(edge)) {
            continue;
        }
        let a = tin.start(edge);
        let b = tin.end(edge).unwrap();
        let za = value(tin, valuator, a)?;
        let zb = value(tin, valuator, b)?;

        if (za - z) * (zb - z) < 0.0 {
            let (e, pa, za, pb, zb) = if za > z {
                (edge, tin.position(a), za, tin.position(b), zb)
            } else {
                let d = tin.dual(edge);
                (d, tin.position(b), zb, tin.position(a), za)
            };
            trace!(level = z, edge = e.0, "closed through-edge start");
            let mut contour = new_interior_contour(z, level_index);
            contour.append_crossing(pa, za, pb, zb, z);
            mark_visited(tin, &mut visited, e);
            counters.edge_transits += 1;

            run_walk(
                tin,
                valuator,
                z,
                &mut contour,
                WalkState::ThroughEdge(e),
                true,
                Some(e),
                None,
                &mut visited,
                perimeter_termination,
                counters,
            )?;
            contour.complete(true);
            if contour.points.len() >= 2 {
                contours.insert(contour);
            }
        } else if za == z && zb == z {
            let c = tin.end(tin.forward(edge));
            let d = tin.end(tin.forward(tin.dual(edge)));
            let (Some(c), Some(d)) = (c, d) else {
                continue;
            };
            let zc = value(tin, valuator, c)?;
            let zd = value(tin, valuator, d)?;
            let high_is_forward = zc >= z && zd < z;
            let high_is_dual = zd >= z && zc < z;
            if !(high_is_forward ^ high_is_dual) {
                debug!(
                    level = z,
                    edge = edge.0,
                    "flat closed-loop segment with ambiguous side, skipped"
                );
                continue;
            }
            let g = if high_is_forward { edge } else { tin.dual(edge) };
            trace!(level = z, edge = g.0, "closed flat-segment start");

            let p_start = tin.start(g);
            let p_end = tin.end(g).unwrap();
            let mut contour = new_interior_contour(z, level_index);
            contour.append_vertex(tin.position(p_start));
            contour.append_vertex(tin.position(p_end));
            mark_visited(tin, &mut visited, g);
            counters.vertex_transits += 1;

            let support = tin.pinwheel(tin.reverse(g));
            run_walk(
                tin,
                valuator,
                z,
                &mut contour,
                WalkState::ThroughVertex(p_end, support),
                true,
                None,
                Some(p_start),
                &mut visited,
                perimeter_termination,
                counters,
            )?;
            contour.complete(true);
            if contour.points.len() >= 2 {
                contours.insert(contour);
            }
        }
    }

    Ok(())
}

/// Precomputes the `perimeterTermination` bit set (§4.2 Preparation): for
/// every edge whose dual ends at a perimeter vertex, the edge's own bit is
/// set, letting the walker test "is my dual about to leave the hull" with a
/// single indexed lookup.
pub(crate) fn build_perimeter_termination<T: Tin>(
    tin: &T,
    perimeter_edges: &[EdgeId],
) -> EdgeBitSet {
    let mut perimeter_vertices = std::collections::HashSet::new();
    for &e in perimeter_edges {
        perimeter_vertices.insert(tin.start(e));
    }
    let mut bits = EdgeBitSet::new(tin.max_edge_index());
    for edge in tin.all_edges() {
        if let Some(v) = tin.end(tin.dual(edge)) {
            if perimeter_vertices.contains(&v) {
                bits.set(tin.index(edge));
            }
        }
    }
    bits
}
