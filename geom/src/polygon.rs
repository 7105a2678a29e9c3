use std::fmt;

use geo::{Area, BooleanOps, Centroid, Contains, ConvexHull, Intersects, IsConvex};
use serde::{Deserialize, Serialize};

use crate::gps::EARTH_RADIUS_METERS;
use crate::{Border, Distance, LonLat, Piece};

// Anything smaller (in squared degrees) is a numerical sliver, not a real overlap. Roughly
// 1 cm^2 at mid latitudes.
const MIN_AREA: f64 = 1e-16;

/// A region made of one or more disjoint pieces, in lon/lat space. Every polygon built here is
/// normalized through a union with nothing, which resolves self-intersections the way a
/// zero-width buffer would.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<LonLat>>", into = "Vec<Vec<LonLat>>")]
pub struct Polygon {
    inner: geo::MultiPolygon,
}

impl Polygon {
    /// Builds a polygon from the outline of a ring; the ring doesn't need to be closed. Returns
    /// None if there aren't enough points or nothing is left after repair.
    pub fn from_ring(pts: &[LonLat]) -> Option<Polygon> {
        if pts.len() < 3 {
            return None;
        }
        let ring = geo::LineString::new(pts.iter().map(|pt| pt.to_geo()).collect());
        let raw = geo::MultiPolygon::new(vec![geo::Polygon::new(ring, Vec::new())]);
        Polygon::repaired(raw)
    }

    /// The corridor between two borders running in the same direction: the left border, then
    /// the right border walked backwards.
    pub fn from_borders(left: &Border, right: &Border) -> Option<Polygon> {
        let mut pts = left.points().clone();
        pts.extend(right.points().iter().rev().cloned());
        Polygon::from_ring(&pts)
    }

    /// The smallest convex polygon containing every point.
    pub fn convex_hull(pts: &[LonLat]) -> Option<Polygon> {
        let mp = geo::MultiPoint::new(pts.iter().map(|pt| geo::Point::from(pt.to_geo())).collect());
        Polygon::from_geo(geo::MultiPolygon::new(vec![mp.convex_hull()]))
    }

    fn repaired(raw: geo::MultiPolygon) -> Option<Polygon> {
        let fixed = raw.union(&geo::MultiPolygon::new(Vec::new()));
        Polygon::from_geo(fixed)
    }

    /// Wraps a geo multipolygon, discarding it if it's empty or a sliver.
    pub fn from_geo(mp: geo::MultiPolygon) -> Option<Polygon> {
        let parts: Vec<geo::Polygon> = mp
            .0
            .into_iter()
            .filter(|p| p.unsigned_area() > MIN_AREA)
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(Polygon {
            inner: geo::MultiPolygon::new(parts),
        })
    }

    pub fn to_geo(&self) -> &geo::MultiPolygon {
        &self.inner
    }

    /// The disjoint pieces of this polygon.
    pub fn parts(&self) -> Vec<Polygon> {
        self.inner
            .0
            .iter()
            .map(|p| Polygon {
                inner: geo::MultiPolygon::new(vec![p.clone()]),
            })
            .collect()
    }

    pub fn num_parts(&self) -> usize {
        self.inner.0.len()
    }

    /// Area in squared degrees. Only meaningful for comparing polygons near each other.
    pub fn area(&self) -> f64 {
        self.inner.unsigned_area()
    }

    /// Approximate area in square meters, using the local scale at the centroid.
    pub fn area_sq_meters(&self) -> f64 {
        let lat = self
            .centroid()
            .map(|pt| pt.latitude)
            .unwrap_or(0.0)
            .to_radians();
        let meters_per_degree = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;
        self.area() * meters_per_degree * meters_per_degree * lat.cos()
    }

    pub fn centroid(&self) -> Option<LonLat> {
        self.inner
            .centroid()
            .map(|pt| LonLat::new(pt.x(), pt.y()))
    }

    pub fn intersection(&self, other: &Polygon) -> Option<Polygon> {
        if !self.intersects(other) {
            return None;
        }
        Polygon::from_geo(self.inner.intersection(&other.inner))
    }

    pub fn union(&self, other: &Polygon) -> Polygon {
        match Polygon::from_geo(self.inner.union(&other.inner)) {
            Some(p) => p,
            // Both inputs had area, so this only happens with degenerate numerics
            None => self.clone(),
        }
    }

    pub fn difference(&self, other: &Polygon) -> Option<Polygon> {
        Polygon::from_geo(self.inner.difference(&other.inner))
    }

    pub fn union_all(polygons: Vec<Polygon>) -> Option<Polygon> {
        let mut iter = polygons.into_iter();
        let mut result = iter.next()?;
        for p in iter {
            result = result.union(&p);
        }
        Some(result)
    }

    pub fn intersects(&self, other: &Polygon) -> bool {
        self.inner.intersects(&other.inner)
    }

    pub fn intersects_border(&self, border: &Border) -> bool {
        border.is_valid() && self.inner.intersects(&border.to_geo())
    }

    pub fn contains_pt(&self, pt: LonLat) -> bool {
        self.inner.contains(&geo::Point::from(pt.to_geo()))
    }

    /// True if the first piece's outline is convex.
    pub fn is_convex(&self) -> bool {
        self.inner
            .0
            .first()
            .map(|p| p.exterior().is_convex())
            .unwrap_or(false)
    }

    /// The pieces of the border inside this polygon, or outside of it if `invert`. Each piece
    /// runs in the same direction as the input.
    pub fn clip_border(&self, border: &Border, invert: bool) -> Vec<Border> {
        if !border.is_valid() {
            return Vec::new();
        }
        let mls = geo::MultiLineString::new(vec![border.to_geo()]);
        let mut pieces: Vec<(Distance, Border)> = Vec::new();
        for ls in self.inner.clip(&mls, invert) {
            let mut piece = Border::from(ls);
            if !piece.is_valid() {
                continue;
            }
            let (Some(first), Some(last)) = (piece.first_pt(), piece.last_pt()) else {
                continue;
            };
            let start = border.dist_along_of_point(first).unwrap_or(Distance::ZERO);
            let end = border.dist_along_of_point(last).unwrap_or(Distance::ZERO);
            if end < start {
                piece = piece.reversed();
            }
            pieces.push((start.min(end), piece));
        }
        pieces.sort_by(|a, b| a.0.cmp(&b.0));
        pieces.into_iter().map(|(_, b)| b).collect()
    }

    /// Removes the portion of a border inside this polygon. If that leaves several pieces, keeps
    /// the first or last one along the border. A border that doesn't touch the polygon comes
    /// back unchanged; None means nothing usable is left.
    pub fn cut_border(&self, border: &Border, keep: Piece) -> Option<Border> {
        if !self.intersects_border(border) {
            return Some(border.clone());
        }
        let mut pieces = self.clip_border(border, true);
        if pieces.is_empty() {
            return None;
        }
        match keep {
            Piece::First => Some(pieces.remove(0)),
            Piece::Last => pieces.pop(),
        }
    }

    /// Outer rings of every piece, without the closing point.
    pub fn exterior_rings(&self) -> Vec<Vec<LonLat>> {
        self.inner
            .0
            .iter()
            .map(|p| {
                let mut pts: Vec<LonLat> = p.exterior().coords().map(|c| LonLat::from(*c)).collect();
                if pts.len() > 1 && pts[0] == pts[pts.len() - 1] {
                    pts.pop();
                }
                pts
            })
            .collect()
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::from(&self.inner))
    }
}

impl From<Vec<Vec<LonLat>>> for Polygon {
    fn from(rings: Vec<Vec<LonLat>>) -> Polygon {
        let parts = rings
            .into_iter()
            .map(|ring| {
                geo::Polygon::new(
                    geo::LineString::new(ring.into_iter().map(|pt| pt.to_geo()).collect()),
                    Vec::new(),
                )
            })
            .collect();
        Polygon {
            inner: geo::MultiPolygon::new(parts),
        }
    }
}

impl From<Polygon> for Vec<Vec<LonLat>> {
    fn from(p: Polygon) -> Vec<Vec<LonLat>> {
        p.exterior_rings()
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Polygon({} parts, {:.1} m^2)",
            self.num_parts(),
            self.area_sq_meters()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> LonLat {
        LonLat::new(-121.95, 37.28)
    }

    fn square(center: LonLat, half: f64) -> Polygon {
        Polygon::from_ring(&[
            center.offset_meters(-half, -half),
            center.offset_meters(half, -half),
            center.offset_meters(half, half),
            center.offset_meters(-half, half),
        ])
        .unwrap()
    }

    #[test]
    fn boolean_ops() {
        let a = square(origin(), 10.0);
        let b = square(origin().offset_meters(10.0, 0.0), 10.0);
        let x = a.intersection(&b).unwrap();
        assert!((x.area_sq_meters() - 200.0).abs() < 2.0);
        assert!((a.union(&b).area_sq_meters() - 600.0).abs() < 5.0);
        assert!((a.difference(&b).unwrap().area_sq_meters() - 200.0).abs() < 2.0);

        let far = square(origin().offset_meters(100.0, 0.0), 10.0);
        assert!(a.intersection(&far).is_none());
        assert_eq!(a.union(&far).num_parts(), 2);
    }

    #[test]
    fn bowtie_gets_repaired() {
        let o = origin();
        let bowtie = Polygon::from_ring(&[
            o.offset_meters(-10.0, -10.0),
            o.offset_meters(10.0, 10.0),
            o.offset_meters(10.0, -10.0),
            o.offset_meters(-10.0, 10.0),
        ])
        .unwrap();
        assert!(bowtie.area_sq_meters() > 1.0);
        assert!(bowtie.intersection(&square(o, 10.0)).is_some());
    }

    #[test]
    fn cut_border_keeps_requested_piece() {
        let o = origin();
        let block = square(o, 5.0);
        let border = Border::new(vec![o.offset_meters(0.0, -50.0), o.offset_meters(0.0, 50.0)]);
        let first = block.cut_border(&border, Piece::First).unwrap();
        let last = block.cut_border(&border, Piece::Last).unwrap();
        assert!((first.length().inner_meters() - 45.0).abs() < 0.1);
        assert!((last.length().inner_meters() - 45.0).abs() < 0.1);
        let tolerance = Distance::meters(0.01);
        assert!(first.first_pt().unwrap().approx_eq(border.first_pt().unwrap(), tolerance));
        assert!(last.last_pt().unwrap().approx_eq(border.last_pt().unwrap(), tolerance));

        let elsewhere = Border::new(vec![o.offset_meters(50.0, -50.0), o.offset_meters(50.0, 50.0)]);
        assert_eq!(block.cut_border(&elsewhere, Piece::First), Some(elsewhere));

        let inside = Border::new(vec![o.offset_meters(0.0, -1.0), o.offset_meters(0.0, 1.0)]);
        assert!(block.cut_border(&inside, Piece::First).is_none());
    }

    #[test]
    fn wire_format_is_rings_of_pairs() {
        let sq = square(origin(), 10.0);
        let raw = serde_json::to_string(&sq).unwrap();
        let back: Polygon = serde_json::from_str(&raw).unwrap();
        assert!((back.area() - sq.area()).abs() < 1e-15);
        assert_eq!(sq.exterior_rings()[0].len(), 4);
    }
}
