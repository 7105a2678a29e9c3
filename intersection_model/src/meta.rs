//! Summaries of lanes and of the whole intersection, derived from the finished geometry.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use geom::{Distance, LonLat};
use raw_map::{NodeID, RawNode};

use crate::make::bicycle::{bicycle_lane_location, is_shared, Side};
use crate::{Config, Direction, IntersectionMeta, Lane, LaneMeta, TriState};

/// "Main Street to_intersection". Links are named after the streets they connect.
pub fn identification(lane: &Lane, streets: &[Lane]) -> String {
    if !lane.is_link() {
        return format!("{} {}", lane.name, lane.direction);
    }
    let street_at = |node: Option<&NodeID>| {
        node.and_then(|n| {
            streets
                .iter()
                .find(|l| !l.is_link() && l.has_name() && l.nodes.contains(n))
                .map(|l| l.name.clone())
        })
        .unwrap_or_else(|| lane.name.clone())
    };
    format!(
        "{} - {} Link {}",
        street_at(lane.nodes.first()),
        street_at(lane.nodes.last()),
        lane.direction
    )
}

/// Which sides of the lane's path have a dedicated bicycle lane.
fn bicycle_sides(lane: &Lane) -> (bool, bool) {
    if lane.extra_tags.is_empty() || is_shared(&lane.extra_tags) {
        return (false, false);
    }
    let location = bicycle_lane_location(&lane.extra_tags);
    let sides = [location.forward, location.backward];
    (
        sides.contains(&Some(Side::Right)),
        sides.contains(&Some(Side::Left)),
    )
}

pub fn lane_meta(
    lane: &Lane,
    streets: &[Lane],
    crosswalks: &[Lane],
    public_transit_stop: bool,
    timestamp: DateTime<Utc>,
) -> LaneMeta {
    let right_turn_dedicated_link = lane.direction == Direction::ToIntersection
        && streets.iter().any(|link| {
            link.is_link()
                && link
                    .nodes
                    .first()
                    .map(|n| lane.nodes.contains(n))
                    .unwrap_or(false)
        });
    let number_of_crosswalks = match lane.polygon() {
        Some(polygon) => crosswalks
            .iter()
            .filter_map(|cw| cw.polygon())
            .filter(|cw| cw.intersects(&polygon))
            .count(),
        None => 0,
    };
    let (bicycle_lane_on_the_right, bicycle_lane_on_the_left) = bicycle_sides(lane);

    LaneMeta {
        id: lane.id,
        identification: identification(lane, streets),
        total_number_of_vehicle_lanes: if lane.is_cycleway() || lane.is_crosswalk() {
            0
        } else {
            lane.counts.total()
        },
        number_of_left_turning_lanes: lane.counts.left,
        number_of_right_turning_lanes: lane.counts.right,
        right_turn_dedicated_link,
        bicycle_lane_on_the_right,
        bicycle_lane_on_the_left,
        rail_track: lane.is_rail(),
        lane_type: lane.lane_type.clone(),
        traffic_signals: TriState::from_bool(lane.traffic_signals),
        number_of_crosswalks,
        compass: lane.compass,
        public_transit_stop,
        timestamp,
    }
}

/// Twice the mean distance from the center to where the lanes meet the intersection, plus room
/// for crosswalks on both sides.
pub fn diameter(lanes: &[Lane], center: LonLat, crosswalk_width: Distance) -> Distance {
    let mut ends = Vec::new();
    for lane in lanes.iter().filter(|l| !l.is_link()) {
        let pick = |b: &geom::Border| match lane.direction {
            Direction::ToIntersection => b.last_pt(),
            _ => b.first_pt(),
        };
        ends.extend(pick(&lane.left_border));
        ends.extend(pick(&lane.right_border));
    }
    if ends.is_empty() {
        return Distance::ZERO;
    }
    let total: Distance = ends.iter().map(|pt| center.gps_dist_meters(*pt)).sum();
    total / (ends.len() as f64) * 2.0 + crosswalk_width * 2.0
}

/// The sharpest bend, in degrees, between the first and last segment of any approach.
pub fn curvature(lanes: &[Lane]) -> f64 {
    lanes
        .iter()
        .filter(|l| l.direction == Direction::ToIntersection)
        .filter_map(|l| Some(l.median.first_bearing()?.abs_delta(l.median.last_bearing()?)))
        .fold(0.0, f64::max)
}

/// Traffic signals and stop signs, each inferred from the other when missing. A stop sign means
/// there's no signal unless one is tagged, and the other way around.
pub fn control_states(lanes: &[Lane]) -> (TriState, TriState) {
    let signal = lanes.iter().any(|l| l.traffic_signals);
    let stop = lanes.iter().any(|l| l.stop_sign);
    let signals = if signal {
        TriState::Yes
    } else if stop {
        TriState::No
    } else {
        TriState::Unknown
    };
    let stop_sign = if stop {
        TriState::Yes
    } else if signal {
        TriState::No
    } else {
        TriState::Unknown
    };
    (signals, stop_sign)
}

pub fn intersection_meta(
    lanes: &[Lane],
    nodes: &BTreeMap<NodeID, RawNode>,
    center: LonLat,
    config: &Config,
    timestamp: DateTime<Utc>,
) -> IntersectionMeta {
    let groups = |direction: Direction| {
        lanes
            .iter()
            .filter(|l| l.direction == direction && !l.is_link() && !l.is_cycleway())
            .map(|l| (identification(l, lanes), l.compass))
            .collect::<BTreeSet<_>>()
            .len()
    };
    let counts: Vec<usize> = lanes
        .iter()
        .filter(|l| !l.is_link() && !l.is_cycleway() && l.direction != Direction::Undefined)
        .map(|l| l.counts.total())
        .collect();
    let (traffic_signals, stop_sign) = control_states(lanes);
    let (right, left) = lanes.iter().fold((false, false), |(r, l), lane| {
        let (r2, l2) = bicycle_sides(lane);
        (r || r2, l || l2)
    });
    let diameter = diameter(lanes, center, config.crosswalk_width);

    let nearest = |keep: &dyn Fn(&RawNode) -> bool| {
        nodes
            .values()
            .filter(|n| keep(n))
            .map(|n| center.gps_dist_meters(n.pt))
            .min()
    };
    let distance_to_railway_crossing = nearest(&|n| n.is_railway_crossing());
    let distance_to_next_intersection = nearest(&|n| {
        n.street_names.len() >= 2 && center.gps_dist_meters(n.pt) > diameter / 2.0
    });

    IntersectionMeta {
        number_of_approaches: groups(Direction::ToIntersection),
        number_of_exits: groups(Direction::FromIntersection),
        min_number_of_lanes: counts.iter().cloned().min().unwrap_or(0),
        max_number_of_lanes: counts.iter().cloned().max().unwrap_or(0),
        traffic_signals,
        stop_sign,
        bicycle_lane_on_the_right: right,
        bicycle_lane_on_the_left: left,
        diameter,
        curvature: curvature(lanes),
        distance_to_railway_crossing,
        distance_to_next_intersection,
        timestamp,
    }
}
