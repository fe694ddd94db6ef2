//! Arc-length helpers over planar polylines.
//!
//! Offsets are metres measured along the line from its first coordinate.
//! Every function here expects a line with at least one coordinate; lines
//! coming out of [`StreetNetwork`][crate::StreetNetwork] always have two.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, EuclideanLength, Intersects, LineInterpolatePoint, LineLocatePoint, LineString, Point};

/// Coordinates closer than this are the same point for deduplication.
pub const COORD_EPS_M: f64 = 1e-9;

#[inline]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Total planar length.
#[inline]
pub fn length(line: &LineString<f64>) -> f64 {
    line.euclidean_length()
}

/// Offset of the orthogonal projection of `point` onto `line`.
pub fn locate(line: &LineString<f64>, point: Coord<f64>) -> f64 {
    let fraction = line.line_locate_point(&Point::from(point)).unwrap_or(0.0);
    fraction * length(line)
}

/// The point `offset` metres along `line`, clamped to its ends.
pub fn point_at(line: &LineString<f64>, offset: f64) -> Coord<f64> {
    let total = length(line);
    let first = line.0.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
    if total <= 0.0 || offset <= 0.0 {
        return first;
    }
    if offset >= total {
        return line.0.last().copied().unwrap_or(first);
    }
    line.line_interpolate_point(offset / total)
        .map(|p| p.0)
        .unwrap_or(first)
}

/// Coordinates of `line` between two offsets, in travel order.
///
/// When `start > end` the piece is walked backwards.  The first and last
/// coordinates are the interpolated points at `start` and `end`; interior
/// vertices are copied verbatim.
pub fn substring(line: &LineString<f64>, start: f64, end: f64) -> Vec<Coord<f64>> {
    if start > end {
        let mut coords = substring(line, end, start);
        coords.reverse();
        return coords;
    }
    let total = length(line);
    let start = start.clamp(0.0, total);
    let end   = end.clamp(0.0, total);

    let mut out = vec![point_at(line, start)];
    let mut walked = 0.0;
    for segment in line.lines() {
        walked += segment.euclidean_length();
        if walked >= end {
            break;
        }
        if walked > start {
            push_distinct(&mut out, segment.end);
        }
    }
    push_distinct(&mut out, point_at(line, end));
    out
}

/// Append `c` unless it duplicates the current last coordinate.
#[inline]
pub fn push_distinct(out: &mut Vec<Coord<f64>>, c: Coord<f64>) {
    match out.last() {
        Some(&last) if distance(last, c) <= COORD_EPS_M => {}
        _ => out.push(c),
    }
}

/// Append every coordinate of `coords`, eliding boundary duplicates.
pub fn extend_distinct(out: &mut Vec<Coord<f64>>, coords: impl IntoIterator<Item = Coord<f64>>) {
    for c in coords {
        push_distinct(out, c);
    }
}

/// `true` if `line` cuts or touches `other` anywhere farther than
/// `tolerance` from all of the `allowed` points.
///
/// Stretches where the two run along each other do not count: a walker may
/// retrace its own trail but not cut across it.  Used with the node the
/// walker stands on (or an edge's own endpoints) as the allowed points.
pub fn crosses(
    line:      &LineString<f64>,
    other:     &LineString<f64>,
    allowed:   &[Coord<f64>],
    tolerance: f64,
) -> bool {
    if line.0.len() < 2 || other.0.len() < 2 || !line.intersects(other) {
        return false;
    }
    let is_allowed = |c: Coord<f64>| allowed.iter().any(|a| distance(*a, c) <= tolerance);

    for a in line.lines() {
        for b in other.lines() {
            match line_intersection(a, b) {
                None => {}
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    if !is_allowed(intersection) {
                        return true;
                    }
                }
                Some(LineIntersection::Collinear { .. }) => {}
            }
        }
    }
    false
}

/// `true` if `line` runs along `other` for more than `tolerance` metres.
///
/// The counterpart of [`crosses`]: a walker heading home must not retrace
/// its trail either.
pub fn overlaps(line: &LineString<f64>, other: &LineString<f64>, tolerance: f64) -> bool {
    if line.0.len() < 2 || other.0.len() < 2 || !line.intersects(other) {
        return false;
    }
    line.lines().any(|a| {
        other.lines().any(|b| {
            matches!(
                line_intersection(a, b),
                Some(LineIntersection::Collinear { intersection }) if intersection.euclidean_length() > tolerance
            )
        })
    })
}
