use std::collections::{BTreeMap, BTreeSet};

use abstutil::MultiMap;
use raw_map::{NodeID, RawNode};

use crate::{Direction, Lane, LaneIndex};

/// Chains lanes of the same street, index and direction across consecutive paths into one lane
/// each. Lanes continue one another when one ends at the node where the other starts, without
/// bending more than the tolerance. Unnamed lanes pass through on their own.
pub fn merge_lanes(
    lanes: Vec<Lane>,
    nodes: &BTreeMap<NodeID, RawNode>,
    tolerance_degrees: f64,
) -> Vec<Lane> {
    let mut groups: BTreeMap<(String, LaneIndex, Direction), Vec<Lane>> = BTreeMap::new();
    let mut result = Vec::new();
    for lane in lanes {
        if !lane.has_name() {
            result.push(lane);
            continue;
        }
        groups
            .entry((lane.name.clone(), lane.index, lane.direction))
            .or_default()
            .push(lane);
    }

    for (_, group) in groups {
        result.extend(merge_group(group, tolerance_degrees));
    }

    for (idx, lane) in result.iter_mut().enumerate() {
        lane.approach_id = idx;
        lane.bearing = lane.left_border.bearing();
        lane.compass = lane.bearing.map(|b| b.compass());
        lane.length = lane.median.length();
        add_node_tags(lane, nodes);
    }
    result
}

fn merge_group(group: Vec<Lane>, tolerance_degrees: f64) -> Vec<Lane> {
    let mut starts_at: MultiMap<NodeID, usize> = MultiMap::new();
    for (idx, lane) in group.iter().enumerate() {
        if let Some(first) = lane.nodes.first() {
            starts_at.insert(*first, idx);
        }
    }

    let mut next: BTreeMap<usize, usize> = BTreeMap::new();
    let mut has_prev: BTreeSet<usize> = BTreeSet::new();
    for (idx, lane) in group.iter().enumerate() {
        let Some(last) = lane.nodes.last() else {
            continue;
        };
        for candidate in starts_at.get(*last) {
            if *candidate == idx || has_prev.contains(candidate) {
                continue;
            }
            if continues(lane, &group[*candidate], tolerance_degrees) {
                next.insert(idx, *candidate);
                has_prev.insert(*candidate);
                break;
            }
        }
    }

    let mut result = Vec::new();
    let mut used: BTreeSet<usize> = BTreeSet::new();
    for start in 0..group.len() {
        if has_prev.contains(&start) || used.contains(&start) {
            continue;
        }
        result.push(follow_chain(&group, start, &next, &mut used));
    }
    // Lanes stuck in a cycle have no start; keep them whole
    for idx in 0..group.len() {
        if !used.contains(&idx) {
            result.push(follow_chain(&group, idx, &next, &mut used));
        }
    }
    result
}

fn follow_chain(
    group: &[Lane],
    start: usize,
    next: &BTreeMap<usize, usize>,
    used: &mut BTreeSet<usize>,
) -> Lane {
    let mut merged = group[start].clone();
    used.insert(start);
    let mut current = start;
    while let Some(idx) = next.get(&current) {
        if !used.insert(*idx) {
            break;
        }
        append(&mut merged, &group[*idx]);
        current = *idx;
    }
    merged
}

/// Both lanes are pieces of the same path direction; the second must not bend away.
fn continues(lane: &Lane, candidate: &Lane, tolerance_degrees: f64) -> bool {
    if lane.path_ids == candidate.path_ids {
        return false;
    }
    match (lane.left_border.bearing(), candidate.left_border.bearing()) {
        (Some(b1), Some(b2)) => b1.approx_eq(b2, tolerance_degrees),
        _ => false,
    }
}

fn append(merged: &mut Lane, other: &Lane) {
    merged.nodes.extend(other.nodes.iter().skip(1).cloned());
    merged.left_border = merged.left_border.concat(&other.left_border);
    merged.right_border = merged.right_border.concat(&other.right_border);
    merged.median = merged.median.concat(&other.median);
    merged.path_ids.extend(other.path_ids.iter().cloned());
    // Approaches are described by the path at the stop line
    if merged.direction == Direction::ToIntersection {
        merged.counts = other.counts;
        merged.lane_type = other.lane_type.clone();
    }
    for (k, v) in other.extra_tags.inner() {
        if !merged.extra_tags.contains_key(k) {
            merged.extra_tags.insert(k.clone(), v.clone());
        }
    }
}

/// Copies node tags onto the lane, first value wins. Nodes near the intersection are visited
/// first.
fn add_node_tags(lane: &mut Lane, nodes: &BTreeMap<NodeID, RawNode>) {
    let mut ids = lane.nodes.clone();
    if lane.direction == Direction::ToIntersection {
        ids.reverse();
    }
    for id in ids {
        let Some(node) = nodes.get(&id) else {
            continue;
        };
        lane.traffic_signals |= node.is_traffic_signal();
        lane.stop_sign |= node.is_stop_sign();
        for (k, v) in node.tags.inner() {
            if !lane.extra_tags.contains_key(k) {
                lane.extra_tags.insert(k.clone(), v.clone());
            }
        }
    }
}
