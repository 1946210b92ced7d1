//! In-place Douglas-Peucker simplification of flat coordinate buffers.
//!
//! Unlike a classic RDP pass that returns a reduced geometry, this variant keeps
//! every vertex and records in the third component of each triple the squared
//! distance at which the vertex became significant. A tile at any zoom can then
//! select its own subset by comparing that importance against the zoom's
//! tolerance, without re-running the algorithm.
//!
//! # Coordinate Spaces
//!
//! Buffers are in the normalized projection plane, so the tolerance passed in is
//! already divided by `zoom_scale(max_zoom) * extent` and squared.

/// Mark significant vertices of `coords[start..end)` (point indices, half-open).
///
/// The first and last point of the range are the chord endpoints; the caller is
/// responsible for marking them (they are never written here). Every interior
/// vertex that ends up significant gets its squared distance stored as its
/// importance; insignificant vertices are left untouched.
///
/// Iterative, with an explicit stack. When several vertices tie for the
/// maximum distance the first one (in ascending index order) wins.
///
/// # Arguments
///
/// * `coords` - Flat `(x, y, importance)` buffer
/// * `start` - Index of the first point of the range
/// * `end` - One past the index of the last point of the range
/// * `sq_tolerance` - Squared distance a vertex must exceed to be kept
pub fn simplify(coords: &mut [f64], start: usize, end: usize, sq_tolerance: f64) {
    if end < start + 3 {
        return;
    }

    let mut stack = vec![(start, end - 1)];

    while let Some((first, last)) = stack.pop() {
        let (ax, ay) = (coords[first * 3], coords[first * 3 + 1]);
        let (bx, by) = (coords[last * 3], coords[last * 3 + 1]);

        let mut max_sq_dist = sq_tolerance;
        let mut index = None;

        for i in first + 1..last {
            let d = sq_seg_dist(coords[i * 3], coords[i * 3 + 1], ax, ay, bx, by);
            if d > max_sq_dist {
                index = Some(i);
                max_sq_dist = d;
            }
        }

        let Some(index) = index else {
            continue;
        };

        coords[index * 3 + 2] = max_sq_dist;
        // Right half first so the left half is processed first
        if last - index > 1 {
            stack.push((index, last));
        }
        if index - first > 1 {
            stack.push((first, index));
        }
    }
}

/// Squared distance from point `(px, py)` to segment `a`-`b`.
pub fn sq_seg_dist(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let mut x = ax;
    let mut y = ay;
    let mut dx = bx - ax;
    let mut dy = by - ay;

    if dx != 0.0 || dy != 0.0 {
        let t = ((px - ax) * dx + (py - ay) * dy) / (dx * dx + dy * dy);

        if t > 1.0 {
            x = bx;
            y = by;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    dx = px - x;
    dy = py - y;

    dx * dx + dy * dy
}
