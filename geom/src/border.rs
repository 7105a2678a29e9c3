use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Bearing, Distance, Line, LonLat, EPSILON_DIST};

/// Which piece to keep when an operation splits a border in two or more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Piece {
    First,
    Last,
}

/// An ordered sequence of points along the edge of a lane or guideway. Unlike a strict polyline,
/// a border may be empty or a single point; most operations degrade to returning the input
/// unchanged in that case.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Border {
    pts: Vec<LonLat>,
}

impl Border {
    pub fn new(pts: Vec<LonLat>) -> Border {
        Border { pts }
    }

    pub fn points(&self) -> &Vec<LonLat> {
        &self.pts
    }

    pub fn num_pts(&self) -> usize {
        self.pts.len()
    }

    /// True if there are at least 2 points.
    pub fn is_valid(&self) -> bool {
        self.pts.len() >= 2
    }

    pub fn first_pt(&self) -> Option<LonLat> {
        self.pts.first().cloned()
    }

    pub fn last_pt(&self) -> Option<LonLat> {
        self.pts.last().cloned()
    }

    pub fn first_line(&self) -> Option<Line> {
        if self.pts.len() < 2 {
            return None;
        }
        Line::new(self.pts[0], self.pts[1])
    }

    pub fn last_line(&self) -> Option<Line> {
        let n = self.pts.len();
        if n < 2 {
            return None;
        }
        Line::new(self.pts[n - 2], self.pts[n - 1])
    }

    /// All non-degenerate segments, in order.
    pub fn lines(&self) -> Vec<Line> {
        self.pts
            .windows(2)
            .filter_map(|pair| Line::new(pair[0], pair[1]))
            .collect()
    }

    pub fn length(&self) -> Distance {
        self.pts
            .windows(2)
            .map(|pair| pair[0].gps_dist_meters(pair[1]))
            .sum()
    }

    pub fn reversed(&self) -> Border {
        let mut pts = self.pts.clone();
        pts.reverse();
        Border::new(pts)
    }

    /// The bearing from the first point to the last.
    pub fn bearing(&self) -> Option<Bearing> {
        let first = self.first_pt()?;
        let last = self.last_pt()?;
        if first.gps_dist_meters(last) < EPSILON_DIST {
            return None;
        }
        Some(first.bearing_to(last))
    }

    pub fn last_bearing(&self) -> Option<Bearing> {
        self.last_line().map(|l| l.bearing())
    }

    pub fn first_bearing(&self) -> Option<Bearing> {
        self.first_line().map(|l| l.bearing())
    }

    /// Shifts every point orthogonally by the same width. Positive is rightward.
    pub fn shift(&self, width: Distance) -> Border {
        self.parallel_shift(&vec![width; self.pts.len()], None)
    }

    /// Shifts each point orthogonally by its own offset. Positive is rightward. The direction at
    /// each point comes from the neighboring segments, joined with a miter so uniform offsets
    /// produce parallel segments. If `reference` is present, every point moves perpendicular to
    /// it instead.
    ///
    /// Returns the input unchanged if there are fewer than 2 points or not enough offsets.
    pub fn parallel_shift(&self, offsets: &[Distance], reference: Option<&Line>) -> Border {
        let n = self.pts.len();
        if n < 2 || n > offsets.len() {
            return self.clone();
        }

        if let Some(reference) = reference {
            return Border::new(
                self.pts
                    .iter()
                    .zip(offsets)
                    .map(|(pt, w)| reference.shift_pt(*pt, *w))
                    .collect(),
            );
        }

        let mut result = Vec::with_capacity(n);
        for (idx, pt) in self.pts.iter().enumerate() {
            let width = offsets[idx].inner_meters();
            if width == 0.0 {
                result.push(*pt);
                continue;
            }
            match self.vertex_normal(idx) {
                Some((ne, nn, miter)) => {
                    result.push(pt.offset_meters(ne * width * miter, nn * width * miter));
                }
                None => {
                    // Every neighboring segment is degenerate
                    result.push(*pt);
                }
            }
        }
        Border::new(result)
    }

    /// The rightward unit normal at a vertex in the local frame, plus a miter scale factor.
    fn vertex_normal(&self, idx: usize) -> Option<(f64, f64, f64)> {
        let pt = self.pts[idx];
        let unit_towards = |from: LonLat, to: LonLat| -> Option<(f64, f64)> {
            let (e, n) = pt.meters_to(to);
            let (fe, fn_) = pt.meters_to(from);
            let (de, dn) = (e - fe, n - fn_);
            let len = (de * de + dn * dn).sqrt();
            if len < EPSILON_DIST.inner_meters() {
                None
            } else {
                Some((de / len, dn / len))
            }
        };
        let incoming = if idx > 0 {
            unit_towards(self.pts[idx - 1], pt)
        } else {
            None
        };
        let outgoing = if idx + 1 < self.pts.len() {
            unit_towards(pt, self.pts[idx + 1])
        } else {
            None
        };

        let (de, dn, miter) = match (incoming, outgoing) {
            (Some(a), Some(b)) => {
                let sum = (a.0 + b.0, a.1 + b.1);
                let len = (sum.0 * sum.0 + sum.1 * sum.1).sqrt();
                if len < 1e-6 {
                    // A full reversal; no sensible join
                    (b.0, b.1, 1.0)
                } else {
                    let cos_half = (sum.0 * a.0 + sum.1 * a.1) / len;
                    // Cap very sharp corners, like a miter limit
                    (sum.0 / len, sum.1 / len, (1.0 / cos_half.max(0.5)))
                }
            }
            (Some(a), None) => (a.0, a.1, 1.0),
            (None, Some(b)) => (b.0, b.1, 1.0),
            (None, None) => {
                return None;
            }
        };
        Some((dn, -de, miter))
    }

    /// Extends the last segment forward so it ends up `length` long, keeping its first point.
    pub fn extend_end_to(&self, length: Distance) -> Border {
        match self.last_line() {
            Some(line) => {
                let mut pts = self.pts.clone();
                let n = pts.len();
                pts[n - 1] = line.extend_forward(length).pt2();
                Border::new(pts)
            }
            None => self.clone(),
        }
    }

    /// Extends the last segment forward by `delta`.
    pub fn extend_end_by(&self, delta: Distance) -> Border {
        match self.last_line() {
            Some(line) => self.extend_end_to(line.length() + delta),
            None => self.clone(),
        }
    }

    /// Extends the first segment backward so it ends up `length` long, keeping its second
    /// point.
    pub fn extend_start_to(&self, length: Distance) -> Border {
        match self.first_line() {
            Some(line) => {
                let mut pts = self.pts.clone();
                pts[0] = line.extend_backward(length).pt1();
                Border::new(pts)
            }
            None => self.clone(),
        }
    }

    /// Extends the first segment backward by `delta`.
    pub fn extend_start_by(&self, delta: Distance) -> Border {
        match self.first_line() {
            Some(line) => self.extend_start_to(line.length() + delta),
            None => self.clone(),
        }
    }

    /// Splits at a distance along the border, interpolating a new point if needed. If the
    /// distance isn't strictly inside, returns the whole border and nothing else.
    pub fn cut_by_distance(&self, dist: Distance) -> (Border, Option<Border>) {
        let total = self.length();
        if dist <= Distance::ZERO || dist >= total || self.pts.len() < 2 {
            return (self.clone(), None);
        }

        let mut before = vec![self.pts[0]];
        let mut so_far = Distance::ZERO;
        for (idx, pair) in self.pts.windows(2).enumerate() {
            let seg = pair[0].gps_dist_meters(pair[1]);
            if so_far + seg >= dist {
                let t = (dist - so_far).safe_percent(seg);
                let split = pair[0].lerp(pair[1], t);
                let mut after = vec![split];
                if split.gps_dist_meters(pair[1]) >= EPSILON_DIST {
                    after.push(pair[1]);
                }
                after.extend_from_slice(&self.pts[idx + 2..]);
                if split.gps_dist_meters(pair[0]) >= EPSILON_DIST {
                    before.push(split);
                }
                return (Border::new(before), Some(Border::new(after)));
            }
            so_far += seg;
            before.push(pair[1]);
        }
        (self.clone(), None)
    }

    /// Like `cut_by_distance`, but the position is a fraction of the total length.
    pub fn cut_by_relative_distance(&self, fraction: f64) -> (Border, Option<Border>) {
        self.cut_by_distance(self.length() * fraction)
    }

    /// Splits at the point on the border closest to `pt`, keeping one side.
    pub fn cut_by_point(&self, pt: LonLat, keep: Piece) -> Border {
        let dist = match self.dist_along_of_point(pt) {
            Some(d) => d,
            None => {
                return self.clone();
            }
        };
        match (self.cut_by_distance(dist), keep) {
            ((before, Some(_)), Piece::First) => before,
            ((_, Some(after)), Piece::Last) => after,
            ((whole, None), _) => whole,
        }
    }

    /// Removes `dist` from the end (or the start). If the border is too short, returns it
    /// unchanged.
    pub fn reduce_by_distance(&self, dist: Distance, at_the_end: bool) -> Border {
        let total = self.length();
        if dist <= Distance::ZERO || dist >= total {
            return self.clone();
        }
        if at_the_end {
            self.cut_by_distance(total - dist).0
        } else {
            match self.cut_by_distance(dist) {
                (_, Some(after)) => after,
                (whole, None) => whole,
            }
        }
    }

    /// Drops interior points closer than `min` to the previously kept point. Endpoints stay.
    pub fn drop_small_edges(&self, min: Distance) -> Border {
        if self.pts.len() < 3 {
            return self.clone();
        }
        let last = self.pts[self.pts.len() - 1];
        let mut result = vec![self.pts[0]];
        for pt in &self.pts[1..self.pts.len() - 1] {
            let prev = result[result.len() - 1];
            if prev.gps_dist_meters(*pt) >= min && pt.gps_dist_meters(last) >= min {
                result.push(*pt);
            }
        }
        result.push(last);
        Border::new(result)
    }

    /// The point at some distance along, clamped to the ends.
    pub fn dist_along(&self, dist: Distance) -> Option<LonLat> {
        let first = self.first_pt()?;
        if dist <= Distance::ZERO {
            return Some(first);
        }
        let mut so_far = Distance::ZERO;
        for pair in self.pts.windows(2) {
            let seg = pair[0].gps_dist_meters(pair[1]);
            if so_far + seg >= dist {
                return Some(pair[0].lerp(pair[1], (dist - so_far).safe_percent(seg)));
            }
            so_far += seg;
        }
        self.last_pt()
    }

    pub fn percent_along(&self, fraction: f64) -> Option<LonLat> {
        self.dist_along(self.length() * fraction.clamp(0.0, 1.0))
    }

    /// The closest point on the border to `pt`, with the distance along the border to it and
    /// the distance away from it.
    pub fn project_pt(&self, pt: LonLat) -> Option<(LonLat, Distance, Distance)> {
        if self.pts.len() == 1 {
            return Some((self.pts[0], Distance::ZERO, self.pts[0].gps_dist_meters(pt)));
        }
        let mut best: Option<(LonLat, Distance, Distance)> = None;
        let mut so_far = Distance::ZERO;
        for pair in self.pts.windows(2) {
            let seg = pair[0].gps_dist_meters(pair[1]);
            if let Some(line) = Line::new(pair[0], pair[1]) {
                let t = line.project(pt);
                let closest = line.percent_along(t);
                let away = closest.gps_dist_meters(pt);
                if best.map(|(_, _, d)| away < d).unwrap_or(true) {
                    best = Some((closest, so_far + seg * t, away));
                }
            }
            so_far += seg;
        }
        best.or_else(|| {
            self.first_pt()
                .map(|first| (first, Distance::ZERO, first.gps_dist_meters(pt)))
        })
    }

    pub fn closest_pt(&self, pt: LonLat) -> Option<(LonLat, Distance)> {
        self.project_pt(pt).map(|(closest, _, away)| (closest, away))
    }

    pub fn dist_along_of_point(&self, pt: LonLat) -> Option<Distance> {
        self.project_pt(pt).map(|(_, along, _)| along)
    }

    /// Normalized projection of a point onto the border: 0 is the start, 1 is the end.
    pub fn project_normalized(&self, pt: LonLat) -> Option<f64> {
        let along = self.dist_along_of_point(pt)?;
        Some(along.safe_percent(self.length()))
    }

    /// The first place (walking along self) where the two borders cross.
    pub fn intersection(&self, other: &Border) -> Option<LonLat> {
        let others = other.lines();
        for l1 in self.lines() {
            let mut hits: Vec<LonLat> = others.iter().filter_map(|l2| l1.intersection(l2)).collect();
            if !hits.is_empty() {
                let start = l1.pt1();
                hits.sort_by(|a, b| {
                    start
                        .gps_dist_meters(*a)
                        .cmp(&start.gps_dist_meters(*b))
                });
                return Some(hits[0]);
            }
        }
        None
    }

    pub fn intersects(&self, other: &Border) -> bool {
        self.intersection(other).is_some()
    }

    /// Appends another border, dropping the duplicate joint point if they meet.
    pub fn concat(&self, other: &Border) -> Border {
        let mut pts = self.pts.clone();
        let mut rest = other.pts.as_slice();
        if let (Some(last), Some(first)) = (self.last_pt(), other.first_pt()) {
            if last.approx_eq(first, EPSILON_DIST) {
                rest = &rest[1..];
            }
        }
        pts.extend_from_slice(rest);
        Border::new(pts)
    }

    /// Resamples the first `length` meters with `n` evenly spaced intervals, keeping the rest of
    /// the original points. Returns the new border and how many points the resampled start has
    /// (n + 1), so callers can line up per-point widths.
    pub fn densify_start(&self, n: usize, length: Distance) -> (Border, usize) {
        if n == 0 || self.pts.len() < 2 {
            return (self.clone(), 0);
        }
        let length = length.min(self.length());
        let mut pts = Vec::new();
        for i in 0..=n {
            if let Some(pt) = self.dist_along(length * (i as f64 / n as f64)) {
                pts.push(pt);
            }
        }
        let resampled = pts.len();
        let mut so_far = Distance::ZERO;
        for pair in self.pts.windows(2) {
            so_far += pair[0].gps_dist_meters(pair[1]);
            if so_far > length + EPSILON_DIST {
                pts.push(pair[1]);
            }
        }
        (Border::new(pts), resampled)
    }

    pub fn to_geo(&self) -> geo::LineString {
        geo::LineString::new(self.pts.iter().map(|pt| pt.to_geo()).collect())
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::from(&self.to_geo()))
    }
}

impl From<Line> for Border {
    fn from(line: Line) -> Border {
        Border::new(line.points())
    }
}

impl From<geo::LineString> for Border {
    fn from(ls: geo::LineString) -> Border {
        Border::new(ls.0.into_iter().map(LonLat::from).collect())
    }
}

impl fmt::Display for Border {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Border([")?;
        for pt in &self.pts {
            writeln!(f, "  {},", pt)?;
        }
        write!(f, "])")
    }
}

/// Raised-cosine widths, growing from zero to `width` over n intervals.
pub fn shaped_widths(width: Distance, n: usize) -> Vec<Distance> {
    if n == 0 {
        return vec![width];
    }
    (0..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            width * (1.0 - ((t * std::f64::consts::PI).cos() + 1.0) / 2.0).abs()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;

    fn origin() -> LonLat {
        LonLat::new(-121.95, 37.28)
    }

    fn north_border(meters: f64) -> Border {
        Border::new(vec![
            origin(),
            origin().offset_meters(0.0, meters / 2.0),
            origin().offset_meters(0.0, meters),
        ])
    }

    fn random_border(rng: &mut XorShiftRng) -> Border {
        let mut pts = vec![origin()];
        let mut heading: f64 = rng.gen_range(0.0..360.0);
        for _ in 0..rng.gen_range(2..8) {
            heading += rng.gen_range(-20.0..20.0);
            let dist = rng.gen_range(5.0..50.0);
            let last = pts[pts.len() - 1];
            pts.push(last.project_away(Distance::meters(dist), Bearing::degrees(heading)));
        }
        Border::new(pts)
    }

    #[test]
    fn zero_shift_is_identity() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..50 {
            let border = random_border(&mut rng);
            let shifted = border.shift(Distance::ZERO);
            assert_eq!(border, shifted);
        }
    }

    #[test]
    fn uniform_shift_keeps_distance() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        for _ in 0..50 {
            let border = random_border(&mut rng);
            let shifted = border.shift(Distance::meters(3.0));
            for pt in shifted.points() {
                let (_, away) = border.closest_pt(*pt).unwrap();
                // Miter joins can push corners a bit further out
                assert!(away.inner_meters() > 2.9, "{} too close", away);
            }
        }
    }

    #[test]
    fn shifting_too_few_points_or_offsets_is_identity() {
        let single = Border::new(vec![origin()]);
        assert_eq!(single.shift(Distance::meters(3.0)), single);
        let border = north_border(10.0);
        assert_eq!(border.parallel_shift(&[Distance::meters(1.0)], None), border);
    }

    #[test]
    fn cut_by_distance_splits_mid_segment() {
        let border = north_border(100.0);
        let (before, after) = border.cut_by_distance(Distance::meters(30.0));
        let after = after.unwrap();
        assert!((before.length().inner_meters() - 30.0).abs() < 0.01);
        assert!((after.length().inner_meters() - 70.0).abs() < 0.01);
        assert_eq!(before.last_pt(), after.first_pt());

        let (whole, nothing) = border.cut_by_distance(Distance::meters(200.0));
        assert_eq!(whole, border);
        assert!(nothing.is_none());
        assert!(border.cut_by_distance(Distance::ZERO).1.is_none());
    }

    #[test]
    fn extend_and_reduce() {
        let border = north_border(10.0);
        let longer = border.extend_end_by(Distance::meters(20.0));
        assert!((longer.length().inner_meters() - 30.0).abs() < 0.01);
        let longer = border.extend_start_to(Distance::meters(25.0));
        assert!((longer.length().inner_meters() - 30.0).abs() < 0.01);
        assert_eq!(longer.last_pt(), border.last_pt());

        let shorter = border.reduce_by_distance(Distance::meters(4.0), true);
        assert!((shorter.length().inner_meters() - 6.0).abs() < 0.01);
        assert_eq!(shorter.first_pt(), border.first_pt());
        assert_eq!(border.reduce_by_distance(Distance::meters(40.0), true), border);
    }

    #[test]
    fn concat_drops_joint() {
        let a = north_border(10.0);
        let b = Border::new(vec![
            a.last_pt().unwrap(),
            a.last_pt().unwrap().offset_meters(10.0, 0.0),
        ]);
        let joined = a.concat(&b);
        assert_eq!(joined.num_pts(), a.num_pts() + b.num_pts() - 1);
        assert!((joined.length() - a.length() - b.length()).abs() < Distance::meters(0.01));
    }

    #[test]
    fn crossing_borders() {
        let a = north_border(20.0);
        let b = Border::new(vec![
            origin().offset_meters(-5.0, 5.0),
            origin().offset_meters(5.0, 5.0),
        ]);
        let pt = a.intersection(&b).unwrap();
        assert!(pt.approx_eq(origin().offset_meters(0.0, 5.0), Distance::meters(0.01)));
        let norm = a.project_normalized(pt).unwrap();
        assert!((norm - 0.25).abs() < 0.001);
        let after = a.cut_by_point(pt, Piece::Last);
        assert!((after.length().inner_meters() - 15.0).abs() < 0.01);
    }

    #[test]
    fn shaped_widths_taper() {
        let widths = shaped_widths(Distance::meters(3.0), 16);
        assert_eq!(widths.len(), 17);
        assert_eq!(widths[0], Distance::ZERO);
        assert_eq!(widths[16], Distance::meters(3.0));
        assert!(widths.windows(2).all(|pair| pair[0] <= pair[1]));

        let (dense, count) = north_border(30.0).densify_start(16, Distance::meters(10.0));
        assert_eq!(count, 17);
        // The original midpoint at 15m survives, as does the end
        assert_eq!(dense.num_pts(), 19);
    }
}
