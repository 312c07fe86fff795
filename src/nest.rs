//! The nest organiser (§4.5, C6): resolves parent/child containment between
//! assembled regions and derives each region's `adjusted_area`.

use slotmap::SlotMap;

use crate::contour::{Contour, ContourId};
use crate::math::point_in_polygon;
use crate::region::{ContourRegion, RegionId};

use crate::assembler::region_ring;

/// Resolves containment among `regions` in place: the nesting test point of
/// each region is checked against every region with strictly larger
/// `abs_area`, from largest to smallest, and the *last* (smallest enclosing)
/// match found wins as its immediate parent (§4.5 "largest area first,
/// tie-break arbitrary but deterministic").
///
/// Returns the ids of regions with no parent (the forest roots).
pub(crate) fn nest_regions(
    regions: &mut SlotMap<RegionId, ContourRegion>,
    contours: &SlotMap<ContourId, Contour>,
) -> Vec<RegionId> {
    // `regions.keys()` walks slots in allocation order, so a stable sort here
    // keeps tie-breaking between equal-area regions deterministic.
    let mut order: Vec<RegionId> = regions.keys().collect();
    order.sort_by(|&a, &b| {
        regions[b]
            .abs_area
            .partial_cmp(&regions[a].abs_area)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let rings: std::collections::HashMap<RegionId, Vec<glam::DVec2>> = order
        .iter()
        .map(|&id| (id, region_ring(&regions[id], contours)))
        .collect();

    for (i, &candidate) in order.iter().enumerate() {
        if regions[candidate].kind == crate::region::RegionKind::Perimeter {
            // Perimeter regions represent the outside of the domain (or a
            // slice of it) and are never nested as a child (§4.5).
            continue;
        }
        let test_point = regions[candidate].test_point;
        let mut parent = None;
        for &other in order.iter().take(i) {
            if point_in_polygon(test_point, &rings[&other]) {
                parent = Some(other);
            }
        }
        regions[candidate].parent = parent;
    }

    for &id in &order {
        if let Some(parent) = regions[id].parent {
            regions[parent].children.push(id);
        }
    }

    for &id in &order {
        let children_area: f64 = regions[id].children.iter().map(|&c| regions[c].abs_area).sum();
        regions[id].adjusted_area = (regions[id].abs_area - children_area).max(0.0);
    }

    order.into_iter().filter(|&id| regions[id].parent.is_none()).collect()
}
