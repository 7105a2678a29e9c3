//! Builds the geometry of an intersection from raw map data: paths, lanes, crosswalks, and then
//! the guideways between lanes.

use std::collections::BTreeMap;

use geom::LonLat;
use raw_map::{NodeID, RawNode, RawWay};

use crate::{Config, Lane, LaneID, Path};

pub mod bicycle;
pub mod crop;
pub mod crosswalks;
pub mod guideways;
pub mod lanes;
pub mod merge;
pub mod paths;
pub mod railway;
pub mod transit;

/// Turns ways of one kind (streets, tracks or footways) into directed, bordered paths cropped
/// to the area around the center.
pub fn prepare_paths(
    ways: &[RawWay],
    nodes: &mut BTreeMap<NodeID, RawNode>,
    center: LonLat,
    config: &Config,
) -> Vec<Path> {
    let raw: Vec<Path> = ways.iter().map(|w| Path::from_way(w, nodes)).collect();
    let mut paths = paths::split_bidirectional_paths(raw);
    paths.retain(|p| p.nodes.len() >= 2);
    paths::set_direction(&mut paths, center, nodes);
    paths::fill_missing_lane_counts(&mut paths, config.chain_tolerance_degrees);
    let width = if paths.iter().all(|p| p.is_railway()) && !paths.is_empty() {
        config.rail_track_width
    } else {
        config.lane_width
    };
    paths::add_borders(&mut paths, nodes, width);
    crop::remove_elements_beyond_radius(paths, nodes, center, config)
}

/// Lanes of every path, merged across consecutive paths.
pub fn merged_lanes(
    paths: &[Path],
    nodes: &BTreeMap<NodeID, RawNode>,
    config: &Config,
) -> Vec<Lane> {
    let lanes: Vec<Lane> = paths
        .iter()
        .flat_map(|p| lanes::build_lanes(p, config))
        .collect();
    let mut merged = merge::merge_lanes(lanes, nodes, config.chain_tolerance_degrees);
    lanes::add_shaped_borders(&mut merged, config);
    merged
}

/// Bicycle lanes of every street path, merged.
pub fn merged_cycleways(
    paths: &[Path],
    nodes: &BTreeMap<NodeID, RawNode>,
    config: &Config,
) -> Vec<Lane> {
    let lanes: Vec<Lane> = paths
        .iter()
        .filter(|p| !p.is_link())
        .flat_map(|p| bicycle::build_bicycle_lanes(p, config))
        .collect();
    merge::merge_lanes(lanes, nodes, config.chain_tolerance_degrees)
}

/// Numbers every lane of every collection from 1, in order.
pub fn assign_lane_ids(collections: Vec<&mut Vec<Lane>>) {
    let mut next = 1;
    for lanes in collections {
        for lane in lanes.iter_mut() {
            lane.id = LaneID(next);
            next += 1;
        }
    }
}

/// How far each lane's intersection end is from the center.
pub fn set_distance_to_center(lanes: &mut [Lane], center: LonLat) {
    for lane in lanes {
        if let Some(pt) = lane.intersection_end() {
            lane.distance_to_center = center.gps_dist_meters(pt);
        }
    }
}
