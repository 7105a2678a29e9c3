use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Border, Distance, Line, LonLat};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: LonLat,
    pub radius: Distance,
}

impl Circle {
    pub fn new(center: LonLat, radius: Distance) -> Circle {
        Circle { center, radius }
    }

    pub fn contains_pt(&self, pt: LonLat) -> bool {
        self.center.gps_dist_meters(pt) <= self.radius
    }

    /// Where a segment crosses this circle, nudged inward by `margin` so the result is safely
    /// inside. If both ends are on the same side, there's no crossing.
    pub fn intersection_with_line(&self, line: &Line, margin: Distance) -> Option<LonLat> {
        let r = (self.radius - margin).inner_meters();
        if r <= 0.0 {
            return None;
        }
        let (ax, ay) = self.center.meters_to(line.pt1());
        let (bx, by) = self.center.meters_to(line.pt2());
        let (dx, dy) = (bx - ax, by - ay);

        // |a + t*d|^2 = r^2
        let qa = dx * dx + dy * dy;
        let qb = 2.0 * (ax * dx + ay * dy);
        let qc = ax * ax + ay * ay - r * r;
        let disc = qb * qb - 4.0 * qa * qc;
        if qa == 0.0 || disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let mut candidates = vec![(-qb - sqrt_disc) / (2.0 * qa), (-qb + sqrt_disc) / (2.0 * qa)];
        candidates.retain(|t| (0.0..=1.0).contains(t));
        let t = candidates.into_iter().next()?;
        Some(line.percent_along(t))
    }

    /// Keeps the longest run of the border that's inside the circle, cutting the segments that
    /// cross the boundary. Returns None if nothing is inside.
    pub fn crop_border(&self, border: &Border, margin: Distance) -> Option<Border> {
        let pts = border.points();
        let mut runs: Vec<Vec<LonLat>> = Vec::new();
        let mut current: Vec<LonLat> = Vec::new();

        for (idx, pt) in pts.iter().enumerate() {
            let inside = self.contains_pt(*pt);
            if idx > 0 {
                let prev = pts[idx - 1];
                let prev_inside = self.contains_pt(prev);
                if prev_inside != inside {
                    // Walk the crossing segment from the inside end, so the quadratic root picked
                    // is the boundary crossing.
                    let crossing = if prev_inside {
                        Line::new(*pt, prev).and_then(|l| self.intersection_with_line(&l, margin))
                    } else {
                        Line::new(prev, *pt).and_then(|l| self.intersection_with_line(&l, margin))
                    };
                    if let Some(crossing) = crossing {
                        current.push(crossing);
                    }
                    if prev_inside {
                        runs.push(std::mem::take(&mut current));
                    }
                }
            }
            if inside {
                current.push(*pt);
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }

        runs.into_iter()
            .map(Border::new)
            .filter(|b| b.is_valid())
            .max_by(|a, b| a.length().cmp(&b.length()))
    }
}

impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Circle({}, {})", self.center, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_is_nudged_inside() {
        let center = LonLat::new(-121.95, 37.28);
        let circle = Circle::new(center, Distance::meters(50.0));
        let line = Line::new(center, center.offset_meters(100.0, 0.0)).unwrap();
        let pt = circle
            .intersection_with_line(&line, Distance::meters(1.0))
            .unwrap();
        assert!((center.gps_dist_meters(pt).inner_meters() - 49.0).abs() < 0.05);

        let outside = Line::new(
            center.offset_meters(60.0, 0.0),
            center.offset_meters(100.0, 0.0),
        )
        .unwrap();
        assert!(circle
            .intersection_with_line(&outside, Distance::ZERO)
            .is_none());
    }

    #[test]
    fn crop_through_the_middle() {
        let center = LonLat::new(-121.95, 37.28);
        let circle = Circle::new(center, Distance::meters(50.0));
        let border = Border::new(vec![
            center.offset_meters(-200.0, 0.0),
            center.offset_meters(-10.0, 0.0),
            center.offset_meters(200.0, 0.0),
        ]);
        let cropped = circle.crop_border(&border, Distance::ZERO).unwrap();
        assert_eq!(cropped.num_pts(), 3);
        assert!((cropped.length().inner_meters() - 100.0).abs() < 0.2);
        let far = Border::new(vec![
            center.offset_meters(300.0, 0.0),
            center.offset_meters(400.0, 0.0),
        ]);
        assert!(circle.crop_border(&far, Distance::ZERO).is_none());
    }
}
