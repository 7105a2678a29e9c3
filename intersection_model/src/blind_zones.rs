//! What a driver waiting at the stop line can't see, because other traffic is in the way.

use abstutil::skip_fail;
use geom::{Bearing, Border, Distance, LonLat, Piece, Polygon, EPSILON_DIST};
use ordered_float::OrderedFloat;

use crate::{BlindZone, ConflictZone, Guideway, GuidewayID, GuidewayType};

/// Sector fans get one ray at least every this many degrees.
const MAX_RAY_STEP_DEGREES: f64 = 5.0;

/// A point some fraction along a border, kept off the very ends.
pub fn normalized_to_geo(border: &Border, normalized: f64) -> Option<LonLat> {
    border.percent_along(normalized.clamp(0.0001, 0.9999))
}

/// The angular extent of some points as seen from `pov`: the most counterclockwise bearing and
/// how many degrees clockwise the sector spans. None if the points surround the viewer.
pub fn get_sector(pov: LonLat, pts: &[LonLat]) -> Option<(Bearing, f64)> {
    let visible: Vec<LonLat> = pts
        .iter()
        .filter(|pt| pov.gps_dist_meters(**pt) > EPSILON_DIST)
        .cloned()
        .collect();
    if visible.is_empty() {
        return None;
    }
    let reference = pov.bearing_to(LonLat::center(&visible));
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for pt in &visible {
        let delta = reference.signed_delta(pov.bearing_to(*pt));
        min = min.min(delta);
        max = max.max(delta);
    }
    let span = max - min;
    if span <= 0.0 || span >= 180.0 {
        return None;
    }
    Some((reference.rotate_degs(min), span))
}

/// A fan from the viewer covering the sector, out to `far`.
pub fn sector_polygon(pov: LonLat, start: Bearing, span: f64, far: Distance) -> Option<Polygon> {
    let steps = (span / MAX_RAY_STEP_DEGREES).ceil().max(1.0) as usize;
    let mut pts = vec![pov];
    for i in 0..=steps {
        let bearing = start.rotate_degs(span * i as f64 / steps as f64);
        pts.push(pov.project_away(far, bearing));
    }
    Polygon::from_ring(&pts)
}

/// The fan covering a polygon as seen from the viewer. The bisector has to cross the polygon;
/// if it doesn't, the sector wrapped around the wrong way and is flipped.
fn covering_sector(pov: LonLat, polygon: &Polygon, far: Distance) -> Option<Polygon> {
    let pts: Vec<LonLat> = polygon.exterior_rings().into_iter().flatten().collect();
    let (start, span) = get_sector(pov, &pts)?;
    let crosses = |start: Bearing, span: f64| {
        let bisector = start.rotate_degs(span / 2.0);
        polygon.intersects_border(&Border::new(vec![pov, pov.project_away(far, bisector)]))
    };
    if crosses(start, span) {
        return sector_polygon(pov, start, span, far);
    }
    let flipped_start = start.rotate_degs(span);
    let flipped_span = 360.0 - span;
    if crosses(flipped_start, flipped_span) {
        debug!("Flipped a sector seen from {}", pov);
        return sector_polygon(pov, flipped_start, flipped_span, far);
    }
    None
}

/// Non-convex outlines are covered edge by edge, so concave notches don't leave gaps.
pub fn combine_sector_polygons(pov: LonLat, polygon: &Polygon, far: Distance) -> Option<Polygon> {
    if polygon.is_convex() {
        return covering_sector(pov, polygon, far);
    }
    let mut sectors = Vec::new();
    for ring in polygon.exterior_rings() {
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            if let Some((start, span)) = get_sector(pov, &[a, b]) {
                sectors.extend(sector_polygon(pov, start, span, far));
            }
        }
    }
    Polygon::union_all(sectors)
}

/// The area hidden behind a polygon, keeping the largest piece. Everything in the sector past the
/// hull of the viewer and the polygon is hidden, and so are the parts of that hull outside the
/// polygon that the viewer can't reach without crossing it, like the inside of a U facing away.
pub fn shadow_polygon(pov: LonLat, blocker: &Polygon, far: Distance) -> Option<Polygon> {
    let sector = combine_sector_polygons(pov, blocker, far)?;
    let mut pts: Vec<LonLat> = blocker.exterior_rings().into_iter().flatten().collect();
    pts.push(pov);
    let hull = Polygon::convex_hull(&pts)?;

    let mut hidden: Vec<Polygon> = sector.difference(&hull).map(|p| p.parts()).unwrap_or_default();
    if let Some(between) = hull.difference(blocker) {
        hidden.extend(
            between
                .parts()
                .into_iter()
                .filter(|p| !touches(p, pov)),
        );
    }
    Polygon::union_all(hidden)?
        .parts()
        .into_iter()
        .max_by_key(|p| OrderedFloat(p.area()))
}

fn touches(polygon: &Polygon, pt: LonLat) -> bool {
    polygon
        .exterior_rings()
        .into_iter()
        .flatten()
        .any(|corner| corner.gps_dist_meters(pt) <= EPSILON_DIST)
}

/// The union of the shadows cast by every vehicle or train guideway except the viewer's and
/// the shadowed one, with the guideways that contributed.
pub fn get_shadows(
    pov: LonLat,
    viewer: GuidewayID,
    shadowed: GuidewayID,
    guideways: &[Guideway],
    far: Distance,
) -> Option<(Polygon, Vec<GuidewayID>)> {
    let mut shadows = Vec::new();
    let mut blockers = Vec::new();
    for g in guideways {
        if !g.guideway_type.blocks_view() || g.id == viewer || g.id == shadowed {
            continue;
        }
        let polygon = skip_fail!(g.reduced_polygon());
        if polygon.contains_pt(pov) {
            continue;
        }
        if let Some(shadow) = shadow_polygon(pov, &polygon, far) {
            shadows.push(shadow);
            blockers.push(g.id);
        }
    }
    Some((Polygon::union_all(shadows)?, blockers))
}

/// The part of the shadowed guideway's corridor before its conflict with the viewer.
fn corridor_before_conflict(shadowed: &Guideway, conflict: &Polygon) -> Option<Polygon> {
    let start = conflict
        .exterior_rings()
        .into_iter()
        .flatten()
        .filter_map(|pt| shadowed.median.project_normalized(pt))
        .min_by(|a, b| a.total_cmp(b))?;
    let cut = shadowed.cut(start, Piece::First)?;
    cut.polygon()
}

/// The shadowed guideway's blind zone as seen from `pov`, up to where it conflicts with the
/// viewer.
pub fn blind_zone_polygon(
    pov: LonLat,
    viewer: &Guideway,
    shadowed: &Guideway,
    conflict: &ConflictZone,
    guideways: &[Guideway],
    far: Distance,
) -> Option<(Polygon, Vec<GuidewayID>)> {
    let (shadows, blockers) = get_shadows(pov, viewer.id, shadowed.id, guideways, far)?;
    let zone = shadows.intersection(&shadowed.polygon()?)?;
    let zone = zone.intersection(&corridor_before_conflict(shadowed, &conflict.polygon)?)?;
    Some((zone, blockers))
}

/// Blind zones for every conflict seen by a driver waiting at the stop line.
pub fn blind_zones(
    guideways: &[Guideway],
    conflicts: &[ConflictZone],
    far: Distance,
) -> Vec<BlindZone> {
    let find = |id: GuidewayID| guideways.iter().find(|g| g.id == id);
    let mut result = Vec::new();
    for conflict in conflicts {
        let (Some(viewer), Some(shadowed)) = (find(conflict.guideway1), find(conflict.guideway2))
        else {
            continue;
        };
        if viewer.guideway_type != GuidewayType::Drive {
            continue;
        }
        let Some(pov) = normalized_to_geo(&viewer.median, viewer.stop_line) else {
            continue;
        };
        match blind_zone_polygon(pov, viewer, shadowed, conflict, guideways, far) {
            Some((polygon, blockers)) => {
                result.push(BlindZone {
                    id: result.len(),
                    viewer: viewer.id,
                    shadowed: shadowed.id,
                    conflict_zone: conflict.id.clone(),
                    point_of_view: pov,
                    relative_position: viewer.stop_line,
                    polygon,
                    blockers,
                });
            }
            None => debug!("Nothing hidden for conflict {}", conflict.id),
        }
    }
    result
}
