use crate::geom::point::Point;

/// Axis-aligned bounding box of a set of points.
///
/// Returns `(min_corner, max_corner)`. Panics on an empty slice; scene
/// construction guarantees at least one vertex.
pub fn bounding_box(pts: &[Point]) -> (Point, Point) {
    assert!(!pts.is_empty(), "bounding_box requires at least one point");
    let mut pmin = pts[0];
    let mut pmax = pts[0];
    for p in &pts[1..] {
        pmin.x = pmin.x.min(p.x);
        pmin.y = pmin.y.min(p.y);
        pmin.z = pmin.z.min(p.z);
        pmax.x = pmax.x.max(p.x);
        pmax.y = pmax.y.max(p.y);
        pmax.z = pmax.z.max(p.z);
    }
    (pmin, pmax)
}
