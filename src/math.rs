//! Small numeric helpers shared by the tracer and region assembler.

use glam::DVec2;

/// Linearly interpolates the crossing of the iso-level `z` on the segment `a..b`,
/// where `za`/`zb` are the scalar values at `a`/`b` respectively.
///
/// `(x, y) = ((z - za)*b + (zb - z)*a) / (zb - za)`
#[inline]
pub(crate) fn crossing_point(a: DVec2, za: f64, b: DVec2, zb: f64, z: f64) -> DVec2 {
    ((z - za) * b + (zb - z) * a) / (zb - za)
}

/// Tests whether two values are close enough to be considered the same point when
/// closing a contour, using `|a - b| <= 16 * ulp((|a| + |b|) / 2)`.
///
/// NaN is never close to anything.
#[inline]
pub(crate) fn almost_equal(a: f64, b: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    let mid = (a.abs() + b.abs()) / 2.0;
    (a - b).abs() <= 16.0 * ulp(mid)
}

/// Returns the unit in the last place of `x`: the gap to the next representable `f64`.
#[inline]
fn ulp(x: f64) -> f64 {
    if x == 0.0 {
        return f64::MIN_POSITIVE;
    }
    let bits = x.to_bits();
    let next = f64::from_bits(bits + 1);
    next - x
}

/// The signed area of a closed polygon given as a point sequence (first point not
/// necessarily repeated at the end).
///
/// `A = 1/2 * sum(x_i * y_{i+1} - x_{i+1} * y_i)`
pub(crate) fn signed_area(points: &[DVec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let p0 = points[i];
        let p1 = points[(i + 1) % points.len()];
        sum += p0.x * p1.y - p1.x * p0.y;
    }
    sum / 2.0
}

/// Point-in-polygon test using the crossing-number method described in §4.5: counts
/// left and right crossings and requires their parities to agree, treating border
/// points as outside.
pub(crate) fn point_in_polygon(point: DVec2, polygon: &[DVec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut r_cross = 0_u32;
    let mut l_cross = 0_u32;
    let n = polygon.len();
    for i in 0..n {
        let p0 = polygon[i];
        let p1 = polygon[(i + 1) % n];
        if p0.y == p1.y {
            continue;
        }
        if (p1.y > point.y) != (p0.y > point.y) {
            let xt = (p1.x * p0.y - p0.x * p1.y + point.y * (p0.x - p1.x)) / (p0.y - p1.y);
            if xt > point.x {
                r_cross += 1;
            }
        }
        if (p1.y < point.y) != (p0.y < point.y) {
            let xt = (p1.x * p0.y - p0.x * p1.y + point.y * (p0.x - p1.x)) / (p0.y - p1.y);
            if xt < point.x {
                l_cross += 1;
            }
        }
    }
    if r_cross % 2 != l_cross % 2 {
        // On the border; treated as outside.
        return false;
    }
    r_cross % 2 == 1
}
