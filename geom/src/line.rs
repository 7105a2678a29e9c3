use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Bearing, Distance, LonLat, EPSILON_DIST};

/// A segment between two distinct points. Planar operations run in a local east/north frame in
/// meters anchored at the first point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(LonLat, LonLat);

impl Line {
    /// Returns None if the points are the same or nearly so.
    pub fn new(pt1: LonLat, pt2: LonLat) -> Option<Line> {
        if pt1.gps_dist_meters(pt2) < EPSILON_DIST {
            return None;
        }
        Some(Line(pt1, pt2))
    }

    pub fn pt1(&self) -> LonLat {
        self.0
    }

    pub fn pt2(&self) -> LonLat {
        self.1
    }

    pub fn points(&self) -> Vec<LonLat> {
        vec![self.0, self.1]
    }

    pub fn length(&self) -> Distance {
        self.0.gps_dist_meters(self.1)
    }

    pub fn bearing(&self) -> Bearing {
        self.0.bearing_to(self.1)
    }

    pub fn reversed(&self) -> Line {
        Line(self.1, self.0)
    }

    /// Unit direction in the local frame.
    fn unit(&self) -> (f64, f64) {
        let (e, n) = self.0.meters_to(self.1);
        let len = (e * e + n * n).sqrt();
        (e / len, n / len)
    }

    /// Keeps the first point and moves the second, so the segment ends up with the given
    /// length.
    pub fn extend_forward(&self, length: Distance) -> Line {
        let ratio = length.safe_percent(self.length());
        Line(self.0, self.0.lerp(self.1, ratio))
    }

    /// Keeps the second point and moves the first, so the segment ends up with the given
    /// length.
    pub fn extend_backward(&self, length: Distance) -> Line {
        let ratio = length.safe_percent(self.length());
        Line(self.1.lerp(self.0, ratio), self.1)
    }

    /// Translates the segment perpendicular to itself. Positive widths go to the right of the
    /// direction of travel.
    pub fn shift(&self, width: Distance) -> Line {
        let (de, dn) = self.unit();
        let w = width.inner_meters();
        Line(
            self.0.offset_meters(dn * w, -de * w),
            self.1.offset_meters(dn * w, -de * w),
        )
    }

    /// Moves `pt` perpendicular to this segment's direction. Positive goes right.
    pub fn shift_pt(&self, pt: LonLat, width: Distance) -> LonLat {
        let (de, dn) = self.unit();
        let w = width.inner_meters();
        pt.offset_meters(dn * w, -de * w)
    }

    /// Moves `pt` parallel to this segment's direction.
    pub fn slide_pt(&self, pt: LonLat, dist: Distance) -> LonLat {
        let (de, dn) = self.unit();
        let d = dist.inner_meters();
        pt.offset_meters(de * d, dn * d)
    }

    /// Parameters (t on self, u on other) where the two infinite lines cross, or None if
    /// they're parallel.
    fn crossing_params(&self, other: &Line) -> Option<(f64, f64)> {
        let origin = self.0;
        let p = (0.0, 0.0);
        let r = origin.meters_to(self.1);
        let q = origin.meters_to(other.0);
        let q2 = origin.meters_to(other.1);
        let s = (q2.0 - q.0, q2.1 - q.1);

        let denom = r.0 * s.1 - r.1 * s.0;
        let scale = (r.0 * r.0 + r.1 * r.1).sqrt() * (s.0 * s.0 + s.1 * s.1).sqrt();
        if denom.abs() <= 1e-12 * scale {
            return None;
        }
        let qp = (q.0 - p.0, q.1 - p.1);
        let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
        let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
        Some((t, u))
    }

    /// Where two segments cross, if they do.
    pub fn intersection(&self, other: &Line) -> Option<LonLat> {
        let (t, u) = self.crossing_params(other)?;
        let eps = 1e-9;
        if (-eps..=1.0 + eps).contains(&t) && (-eps..=1.0 + eps).contains(&u) {
            Some(self.0.lerp(self.1, t))
        } else {
            None
        }
    }

    /// Where the two infinite lines through these segments cross.
    pub fn infinite_intersection(&self, other: &Line) -> Option<LonLat> {
        let (t, _) = self.crossing_params(other)?;
        Some(self.0.lerp(self.1, t))
    }

    /// The fraction along this segment of the closest point to `pt`, clamped to [0, 1].
    pub fn project(&self, pt: LonLat) -> f64 {
        let (e, n) = self.0.meters_to(self.1);
        let (pe, pn) = self.0.meters_to(pt);
        let len_sq = e * e + n * n;
        ((pe * e + pn * n) / len_sq).clamp(0.0, 1.0)
    }

    pub fn percent_along(&self, t: f64) -> LonLat {
        self.0.lerp(self.1, t)
    }

    pub fn dist_to_pt(&self, pt: LonLat) -> Distance {
        pt.gps_dist_meters(self.percent_along(self.project(pt)))
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line({} -> {})", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> LonLat {
        LonLat::new(-121.95, 37.28)
    }

    #[test]
    fn extend_keeps_the_fixed_end() {
        let l = Line::new(origin(), origin().offset_meters(0.0, 10.0)).unwrap();
        let fwd = l.extend_forward(Distance::meters(30.0));
        assert_eq!(fwd.pt1(), l.pt1());
        assert!((fwd.length().inner_meters() - 30.0).abs() < 0.01);
        let back = l.extend_backward(Distance::meters(25.0));
        assert_eq!(back.pt2(), l.pt2());
        assert!((back.length().inner_meters() - 25.0).abs() < 0.01);
    }

    #[test]
    fn shift_positive_is_right() {
        // Heading north, right is east.
        let l = Line::new(origin(), origin().offset_meters(0.0, 10.0)).unwrap();
        let shifted = l.shift(Distance::meters(3.0));
        let (e, n) = origin().meters_to(shifted.pt1());
        assert!((e - 3.0).abs() < 1e-6);
        assert!(n.abs() < 1e-6);
    }

    #[test]
    fn crossing_segments() {
        let a = Line::new(
            origin().offset_meters(-10.0, 0.0),
            origin().offset_meters(10.0, 0.0),
        )
        .unwrap();
        let b = Line::new(
            origin().offset_meters(0.0, -10.0),
            origin().offset_meters(0.0, 10.0),
        )
        .unwrap();
        let pt = a.intersection(&b).unwrap();
        assert!(pt.approx_eq(origin(), Distance::meters(0.01)));

        let short = Line::new(
            origin().offset_meters(0.0, 5.0),
            origin().offset_meters(0.0, 10.0),
        )
        .unwrap();
        assert!(a.intersection(&short).is_none());
        assert!(a.infinite_intersection(&short).is_some());
        assert!(a.intersection(&a.shift(Distance::meters(1.0))).is_none());
    }
}
