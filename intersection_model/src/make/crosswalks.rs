use geom::{Border, Line, LonLat};

use crate::{Config, Direction, Lane, LaneIndex, Path};

/// A footway tagged as a crossing becomes a crosswalk lane.
pub fn crosswalk_from_path(path: &Path, config: &Config) -> Option<Lane> {
    if !path.tags.contains("highway", "foot") || !path.tags.contains("footway", "crossing") {
        return None;
    }
    if !path.left_border.is_valid() || path.nodes.len() < 2 {
        return None;
    }
    let center = path.left_border.shift(config.lane_width / 2.0);
    let half = config.footway_width / 2.0;
    let mut lane = crosswalk_lane(center.shift(-half), center.shift(half), config);
    lane.name = path.name().to_string();
    lane.highway = path.tags.get("highway").cloned();
    lane.path_ids = vec![path.id];
    lane.nodes = path.nodes.clone();
    lane.extra_tags = path.tags.clone();
    Some(lane)
}

fn crosswalk_lane(left: Border, right: Border, config: &Config) -> Lane {
    let mut lane = Lane::new(
        LaneIndex::crosswalk(),
        "crosswalk",
        Direction::Undefined,
        left,
        right,
        config.footway_width,
    );
    lane.bearing = lane.median.bearing();
    lane.compass = lane.bearing.map(|b| b.compass());
    lane
}

/// Adds a crosswalk across every named approach that doesn't have a tagged one. The crosswalk
/// runs from the right edge of the approach at the stop line to the far edge of the street,
/// set back by half its width.
pub fn simulated_crosswalks(lanes: &[Lane], existing: &[Lane], config: &Config) -> Vec<Lane> {
    let existing_polygons: Vec<_> = existing.iter().filter_map(|c| c.polygon()).collect();
    let mut result: Vec<Lane> = Vec::new();
    let mut covered: Vec<(String, geom::Bearing)> = Vec::new();

    for rep in lanes {
        if rep.direction != Direction::ToIntersection || !rep.has_name() || rep.is_link() {
            continue;
        }
        if rep.is_cycleway() || rep.is_rail() || rep.index_from_right() != 0 {
            continue;
        }
        let Some(bearing) = rep.median.last_bearing() else {
            continue;
        };
        let tolerance = config.parallel_tolerance_degrees;
        if covered
            .iter()
            .any(|(name, b)| *name == rep.name && b.approx_eq(bearing, tolerance))
        {
            continue;
        }
        covered.push((rep.name.clone(), bearing));

        let group: Vec<&Lane> = lanes
            .iter()
            .filter(|l| {
                l.name == rep.name
                    && l.direction == Direction::ToIntersection
                    && !l.is_cycleway()
                    && !l.is_rail()
                    && l.median
                        .last_bearing()
                        .map(|b| b.approx_eq(bearing, tolerance))
                        .unwrap_or(false)
            })
            .collect();
        let crossed = group.iter().any(|l| {
            l.polygon()
                .map(|p| existing_polygons.iter().any(|c| c.intersects(&p)))
                .unwrap_or(false)
        });
        if crossed {
            continue;
        }

        let Some(start) = rep.right_border.last_pt() else {
            continue;
        };
        let mut far_candidates: Vec<LonLat> =
            group.iter().filter_map(|l| l.left_border.last_pt()).collect();
        // The exits going the other way make up the rest of the street
        far_candidates.extend(
            lanes
                .iter()
                .filter(|l| {
                    l.name == rep.name
                        && l.direction == Direction::FromIntersection
                        && !l.is_cycleway()
                        && !l.is_rail()
                        && l.median
                            .first_bearing()
                            .map(|b| b.approx_eq(bearing.opposite(), tolerance))
                            .unwrap_or(false)
                })
                .filter_map(|l| l.right_border.first_pt()),
        );
        let Some(far) = far_candidates
            .into_iter()
            .max_by_key(|pt| start.gps_dist_meters(*pt))
        else {
            continue;
        };

        let half = config.footway_width / 2.0;
        let back = bearing.opposite();
        let a = start.project_away(half, back);
        let b = far.project_away(half, back);
        let Some(line) = Line::new(a, b) else {
            continue;
        };
        let median = Border::from(line);
        let mut lane = crosswalk_lane(median.shift(-half), median.shift(half), config);
        lane.name = rep.name.clone();
        lane.path_ids = rep.path_ids.last().cloned().into_iter().collect();
        lane.extra_tags = vec![("footway", "crossing"), ("crossing", "unmarked")]
            .into_iter()
            .collect();
        lane.highway = Some("footway".to_string());
        lane.traffic_signals = rep.traffic_signals;
        debug!("Simulated crosswalk across {} ({})", rep.name, bearing.compass());
        result.push(lane);
    }
    result
}
