//! Stateless triangle geometry used by the terrain queries.
//!
//! Degenerate triangles (near-zero area) never intersect anything and are infinitely far away
//! from every point, so a bad triangle in the source data can never block or support an actor.

use misc::*;

/// Squared length of the (unnormalized) normal below which a triangle is considered degenerate
const DEGENERATE_NORMAL_SQ: f32 = 1.0e-12;

/// Slack allowed on barycentric coordinates so shared edges and vertices count as hits
const BARYCENTRIC_EPSILON: f32 = 1.0e-5;

/// Unit normal of the triangle's plane, oriented so that z is never negative.
/// Zero for degenerate triangles
pub fn triangle_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
    if normal.z < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Point where the segment p0->p1 crosses the triangle, inclusive of its edges.
///
/// Segments lying in (or parallel to) the triangle's plane do not intersect, nor do zero-length
/// segments.
pub fn segment_triangle_intersect(
    p0: Vec3,
    p1: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<Vec3> {
    let u = v1 - v0;
    let v = v2 - v0;
    let normal = u.cross(v);
    if normal.length_squared() < DEGENERATE_NORMAL_SQ {
        return None;
    }

    let dir = p1 - p0;
    let a = -normal.dot(p0 - v0);
    let b = normal.dot(dir);
    if b.abs() <= f32::EPSILON * normal.length() * dir.length() {
        return None;
    }

    let r = a / b;
    if !(0.0..=1.0).contains(&r) {
        return None;
    }

    let point = p0 + dir * r;

    let uu = u.dot(u);
    let uv = u.dot(v);
    let vv = v.dot(v);
    let w = point - v0;
    let wu = w.dot(u);
    let wv = w.dot(v);
    let d = uv * uv - uu * vv;

    let s = (uv * wv - vv * wu) / d;
    if s < -BARYCENTRIC_EPSILON || s > 1.0 + BARYCENTRIC_EPSILON {
        return None;
    }

    let t = (uv * wu - uu * wv) / d;
    if t < -BARYCENTRIC_EPSILON || s + t > 1.0 + BARYCENTRIC_EPSILON {
        return None;
    }

    Some(point)
}

/// Closest point to `p` on the triangle, including its interior. None if degenerate
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let ab = b - a;
    let ac = c - a;
    if ab.cross(ac).length_squared() < DEGENERATE_NORMAL_SQ {
        return None;
    }

    // vertex region a
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return Some(a);
    }

    // vertex region b
    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return Some(b);
    }

    // edge ab
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return Some(a + ab * v);
    }

    // vertex region c
    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return Some(c);
    }

    // edge ac
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return Some(a + ac * w);
    }

    // edge bc
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return Some(b + (c - b) * w);
    }

    // interior
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    Some(a + ab * v + ac * w)
}

/// Euclidean distance from `p` to the triangle. Infinite if degenerate
pub fn point_distance_to_triangle(p: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
    closest_point_on_triangle(p, v0, v1, v2)
        .map(|closest| closest.distance(p))
        .unwrap_or(f32::INFINITY)
}

/// Horizontal offset of length `distance` perpendicular to the step `from -> to`.
/// Zero if the step has no horizontal length
pub fn lateral_offset(from: Vec2, to: Vec2, distance: f32) -> Vec2 {
    (to - from).perp().normalize_or_zero() * distance
}
