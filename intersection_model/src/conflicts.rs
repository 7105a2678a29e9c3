//! Where guideways overlap, and how dangerous each overlap is.

use std::collections::HashMap;

use abstutil::skip_fail;
use geom::{Border, Polygon};
use ordered_float::OrderedFloat;

use crate::{ConflictZone, Guideway, GuidewayID, GuidewayType, TurnDirection};

/// Overlaps of guideway pairs, computed once per unordered pair.
struct OverlapCache {
    polygons: HashMap<GuidewayID, Option<Polygon>>,
    overlaps: HashMap<(GuidewayID, GuidewayID), Option<Polygon>>,
}

impl OverlapCache {
    fn new(guideways: &[Guideway]) -> OverlapCache {
        OverlapCache {
            polygons: guideways.iter().map(|g| (g.id, g.polygon())).collect(),
            overlaps: HashMap::new(),
        }
    }

    fn overlap(&mut self, g1: GuidewayID, g2: GuidewayID) -> Option<Polygon> {
        let key = if g1 < g2 { (g1, g2) } else { (g2, g1) };
        if let Some(cached) = self.overlaps.get(&key) {
            return cached.clone();
        }
        let result = match (self.polygons.get(&g1), self.polygons.get(&g2)) {
            (Some(Some(p1)), Some(Some(p2))) => p1.intersection(p2),
            _ => None,
        };
        self.overlaps.insert(key, result.clone());
        result
    }
}

/// Pairs that can't conflict: a guideway with itself, guideways out of the same path, and two
/// crosswalks.
fn can_conflict(g1: &Guideway, g2: &Guideway) -> bool {
    if g1.id == g2.id {
        return false;
    }
    if g1.origin_path.is_some() && g1.origin_path == g2.origin_path {
        return false;
    }
    !(g1.guideway_type == GuidewayType::Footway && g2.guideway_type == GuidewayType::Footway)
}

/// Where the overlap starts along the first guideway's median, from 0 to 1. None if the overlap
/// never reaches the median, like two parallel lanes that only share an edge.
pub fn conflict_distance(guideway: &Guideway, overlap: &Polygon) -> Option<f64> {
    if !overlap.intersects_border(&guideway.median) {
        return None;
    }
    let start = overlap
        .clip_border(&guideway.median, false)
        .first()
        .and_then(|piece| piece.first_pt())?;
    guideway.median.project_normalized(start)
}

/// 4 if a pedestrian is involved, 1 for right turns and signalized crossings, 3 for
/// unsignalized crossings, 2 for everything roughly parallel.
pub fn priority(g1: &Guideway, g2: &Guideway) -> u8 {
    if g1.guideway_type == GuidewayType::Footway || g2.guideway_type == GuidewayType::Footway {
        return 4;
    }
    if g1.direction == TurnDirection::Right || g2.direction == TurnDirection::Right {
        return 1;
    }
    let perpendicular = match (g1.median.bearing(), g2.median.bearing()) {
        (Some(b1), Some(b2)) => b1.is_roughly_perpendicular(b2),
        _ => false,
    };
    match (perpendicular, g1.signalized) {
        (true, true) => 1,
        (true, false) => 3,
        (false, _) => 2,
    }
}

/// Every conflict zone, grouped by the first guideway and ordered along it.
pub fn conflict_zones(guideways: &[Guideway]) -> Vec<ConflictZone> {
    let mut cache = OverlapCache::new(guideways);
    let mut result = Vec::new();
    for g1 in guideways {
        let mut found: Vec<(f64, &Guideway, Polygon)> = Vec::new();
        for g2 in guideways {
            if !can_conflict(g1, g2) {
                continue;
            }
            let overlap = skip_fail!(cache.overlap(g1.id, g2.id));
            // Both medians have to reach the overlap, so every zone has a mirror
            if !overlap.intersects_border(&g2.median) {
                continue;
            }
            match conflict_distance(g1, &overlap) {
                Some(distance) => found.push((distance, g2, overlap)),
                None => debug!("Can't place the overlap of {} and {} along it", g1, g2),
            }
        }
        found.sort_by_key(|(distance, _, _)| OrderedFloat(*distance));
        for (sequence, (distance, g2, polygon)) in found.into_iter().enumerate() {
            let priority = priority(g1, g2);
            result.push(ConflictZone {
                id: format!("{}_{}_{}", g1.id.0, g2.id.0, sequence),
                guideway1: g1.id,
                guideway2: g2.id,
                polygon,
                distance,
                sequence,
                priority,
                code: format!(
                    "{}{}{}",
                    priority,
                    g1.guideway_type.letter(),
                    g2.guideway_type.letter()
                ),
            });
        }
    }
    result
}

/// How far along a border the polygon reaches, from 0 to 1.
fn furthest_reach(border: &Border, polygon: &Polygon) -> Option<f64> {
    polygon
        .exterior_rings()
        .into_iter()
        .flatten()
        .filter_map(|pt| border.project_normalized(pt))
        .max_by(|a, b| a.total_cmp(b))
}

/// Trims every guideway to end after its last conflict. Guideways without conflicts keep their
/// full borders.
pub fn set_reduced_borders(guideways: &mut [Guideway], zones: &[ConflictZone]) {
    for g in guideways.iter_mut() {
        let last = zones
            .iter()
            .filter(|z| z.guideway1 == g.id)
            .max_by(|a, b| a.distance.total_cmp(&b.distance));
        let cut = last.and_then(|z| furthest_reach(&g.median, &z.polygon));
        let reduce = |b: &Border| match cut {
            Some(fraction) if fraction < 1.0 => b.cut_by_relative_distance(fraction).0,
            _ => b.clone(),
        };
        g.reduced_left_border = Some(reduce(&g.left_border));
        g.reduced_right_border = Some(reduce(&g.right_border));
        g.reduced_median = Some(reduce(&g.median));
    }
}

#[cfg(test)]
mod tests {
    use geom::{Distance, LonLat};

    use super::*;
    use crate::{Direction, Lane, LaneID, LaneIndex, PathID};

    fn straight(id: usize, from: (f64, f64), to: (f64, f64), signalized: bool) -> Guideway {
        let o = LonLat::new(-121.95, 37.28);
        let left = Border::new(vec![o.offset_meters(from.0, from.1), o.offset_meters(to.0, to.1)]);
        let mut lane = Lane::new(
            LaneIndex::through(1),
            "",
            Direction::ToIntersection,
            left.clone(),
            left.shift(Distance::meters(3.0)),
            Distance::meters(3.0),
        );
        lane.id = LaneID(id);
        lane.path_ids = vec![PathID(id as i64)];
        lane.traffic_signals = signalized;
        Guideway::new(
            &lane,
            &lane,
            TurnDirection::Through,
            lane.left_border.clone(),
            lane.right_border.clone(),
            None,
        )
    }

    #[test]
    fn crossing_pair() {
        // Eastbound and northbound through the origin
        let east = straight(1, (-50.0, 1.5), (50.0, 1.5), false);
        let north = straight(2, (-1.5, -50.0), (-1.5, 50.0), false);
        let zones = conflict_zones(&[east.clone(), north.clone()]);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].guideway1, east.id);
        assert_eq!(zones[0].code, "3DD");
        assert_eq!(zones[1].guideway1, north.id);
        // About halfway along
        assert!((zones[0].distance - 0.485).abs() < 0.02, "{}", zones[0].distance);
        // Both see the same square
        let a1 = zones[0].polygon.area_sq_meters();
        let a2 = zones[1].polygon.area_sq_meters();
        assert!((a1 - 9.0).abs() < 0.2, "{}", a1);
        assert!((a1 - a2).abs() < 1e-6);

        let mut guideways = vec![east, north];
        set_reduced_borders(&mut guideways, &zones);
        let reduced = guideways[0].reduced_median.as_ref().unwrap().length();
        assert!((reduced.inner_meters() - 51.5).abs() < 0.2, "{}", reduced);
    }

    #[test]
    fn edge_adjacent_corridors_never_conflict() {
        // The corridors overlap by half a meter, well short of either median
        let a = straight(1, (-50.0, 1.5), (50.0, 1.5), false);
        let b = straight(2, (-50.0, 4.0), (50.0, 4.0), false);
        assert!(conflict_zones(&[a, b]).is_empty());
    }

    #[test]
    fn same_path_never_conflicts() {
        let a = straight(1, (-50.0, 1.5), (50.0, 1.5), true);
        let mut b = straight(2, (-50.0, 3.0), (50.0, 3.0), true);
        b.origin_path = a.origin_path;
        assert!(conflict_zones(&[a, b]).is_empty());
    }

    #[test]
    fn priorities() {
        let east = straight(1, (-50.0, 1.5), (50.0, 1.5), true);
        let north = straight(2, (-1.5, -50.0), (-1.5, 50.0), true);
        let west = straight(3, (50.0, 0.0), (-50.0, 0.0), true);
        assert_eq!(priority(&east, &north), 1);
        assert_eq!(priority(&east, &west), 2);
        let mut right = north.clone();
        right.direction = TurnDirection::Right;
        assert_eq!(priority(&east, &right), 1);
        let mut walk = north.clone();
        walk.guideway_type = GuidewayType::Footway;
        assert_eq!(priority(&east, &walk), 4);
    }
}
