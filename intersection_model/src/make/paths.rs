use std::collections::BTreeMap;

use geom::{Border, Distance, LonLat};
use raw_map::{NodeID, RawNode};

use crate::{Direction, Path, PathID};

/// Turns a two-way path into two one-way paths, or returns a one-way path untouched. Tags with a
/// `:forward`/`:backward` suffix move onto the plain key of the matching direction, and bicycle
/// lane tags are split so each half only sees the lanes on its own right side.
pub fn split_bidirectional(path: Path) -> (Path, Option<Path>) {
    if path.is_oneway() || path.is_railway() || path.is_footway() {
        return (path, None);
    }

    let total_lanes = path
        .tags
        .get("lanes")
        .and_then(|raw| raw.trim().parse::<usize>().ok());
    let directional_lanes = path.tags.contains_key("lanes:forward")
        || path.tags.contains_key("lanes:backward");

    let mut forward = path.clone();
    forward.id = PathID(path.id.0 * 1000);
    forward.from_two_way = true;
    forward.tags.insert("oneway", "yes");
    remap_directional_tags(&mut forward, ":forward");
    // The left side of a forward half belongs to traffic going the other way
    for key in keys_with_prefix(&forward, "cycleway:left") {
        forward.tags.remove(&key);
    }

    let mut backward = path.clone();
    backward.id = PathID(path.id.0 * 1000 + 1);
    backward.from_two_way = true;
    backward.nodes.reverse();
    backward.tags.insert("oneway", "yes");
    remap_directional_tags(&mut backward, ":backward");
    for key in keys_with_prefix(&backward, "cycleway:right") {
        backward.tags.remove(&key);
    }
    for key in keys_with_prefix(&path, "cycleway:left") {
        if let Some(value) = path.tags.get(&key) {
            let new_key = key.replacen("cycleway:left", "cycleway:right", 1);
            backward.tags.remove(&key);
            backward.tags.insert(new_key, value.clone());
        }
    }

    if !directional_lanes {
        if let Some(n) = total_lanes {
            forward.tags.insert("lanes", ((n + 1) / 2).max(1).to_string());
            backward.tags.insert("lanes", (n / 2).max(1).to_string());
        }
    }

    (forward, Some(backward))
}

fn keys_with_prefix(path: &Path, prefix: &str) -> Vec<String> {
    path.tags
        .inner()
        .keys()
        .filter(|k| k.starts_with(prefix))
        .cloned()
        .collect()
}

/// Moves `key:<suffix>` and `key:both_ways` values onto `key`, and drops the values meant for
/// the other direction.
fn remap_directional_tags(path: &mut Path, suffix: &str) {
    let other = if suffix == ":forward" {
        ":backward"
    } else {
        ":forward"
    };
    let original = path.tags.clone();
    if original.contains_key("turn:lanes:forward") || original.contains_key("turn:lanes:backward")
    {
        path.tags.remove("turn:lanes");
    }

    for (key, value) in original.inner() {
        if key.ends_with(other) {
            path.tags.remove(key);
        } else if let Some(base) = key.strip_suffix(suffix) {
            path.tags.remove(key);
            path.tags.insert(base, value.clone());
        } else if let Some(base) = key.strip_suffix(":both_ways") {
            path.tags.remove(key);
            // The directional value wins over the shared one
            if !original.contains_key(&format!("{}{}", base, suffix)) {
                path.tags.insert(base, value.clone());
            }
        }
    }
}

pub fn split_bidirectional_paths(paths: Vec<Path>) -> Vec<Path> {
    let mut result = Vec::new();
    for path in paths {
        let (forward, backward) = split_bidirectional(path);
        result.push(forward);
        if let Some(backward) = backward {
            result.push(backward);
        }
    }
    result
}

/// Decides which paths approach the center and which leave it, and records their bearings.
pub fn set_direction(paths: &mut Vec<Path>, center: LonLat, nodes: &BTreeMap<NodeID, RawNode>) {
    for path in paths {
        let pts = path.pts(nodes);
        if pts.len() >= 2 {
            let first = pts[0];
            let last = pts[pts.len() - 1];
            if first.gps_dist_meters(last) > Distance::ZERO {
                let bearing = first.bearing_to(last);
                path.bearing = Some(bearing);
                path.compass = Some(bearing.compass());
            }
        }
        path.direction = if pts.len() < 2 || path.is_link() {
            Direction::Undefined
        } else if center.gps_dist_meters(pts[0]) > center.gps_dist_meters(pts[pts.len() - 1]) {
            Direction::ToIntersection
        } else {
            Direction::FromIntersection
        };
    }
}

/// Exits without any lane information inherit the trunk lane count of the approach they
/// continue, if exactly one same-named approach ends where they start with a compatible
/// bearing.
pub fn fill_missing_lane_counts(paths: &mut Vec<Path>, tolerance_degrees: f64) {
    let mut updates: Vec<(usize, usize)> = Vec::new();
    for (idx, path) in paths.iter().enumerate() {
        if path.tags.contains_key("lanes") || path.tags.contains_key("turn:lanes") {
            continue;
        }
        if path.direction != Direction::FromIntersection || !path.has_name() {
            continue;
        }
        let (Some(first), Some(bearing)) = (path.nodes.first(), path.bearing) else {
            continue;
        };
        let predecessors: Vec<&Path> = paths
            .iter()
            .filter(|p| {
                p.id != path.id
                    && p.name() == path.name()
                    && p.direction == Direction::ToIntersection
                    && p.nodes.last() == Some(first)
                    && p.bearing
                        .map(|b| b.approx_eq(bearing, tolerance_degrees))
                        .unwrap_or(false)
            })
            .collect();
        if predecessors.len() == 1 {
            updates.push((idx, predecessors[0].count_lanes().trunk));
        }
    }
    for (idx, trunk) in updates {
        debug!(
            "{} inherits {} lanes from its approach",
            paths[idx].id, trunk
        );
        paths[idx].tags.insert("lanes", trunk.to_string());
    }
}

/// The outer borders of a path's trunk lanes. One-way paths are centered on their nodes; each
/// half of a two-way way keeps its left border on the nodes, so the halves sit side by side.
/// Paths with fewer than 2 located nodes get empty borders.
pub fn add_borders(paths: &mut Vec<Path>, nodes: &BTreeMap<NodeID, RawNode>, lane_width: Distance) {
    for path in paths {
        let pts = path.pts(nodes);
        if pts.len() < 2 {
            path.left_border = Border::default();
            path.right_border = Border::default();
            continue;
        }
        let center_line = Border::new(pts);
        let width = lane_width * (path.count_lanes().trunk as f64);
        if path.from_two_way {
            path.right_border = center_line.shift(width);
            path.left_border = center_line;
        } else {
            path.left_border = center_line.shift(-width / 2.0);
            path.right_border = center_line.shift(width / 2.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use abstutil::Tags;
    use geom::Border;
    use raw_map::WayID;

    use super::*;

    fn path(id: i64, tags: Vec<(&str, &str)>) -> Path {
        Path {
            id: PathID(id),
            way: WayID(id),
            nodes: vec![NodeID(1), NodeID(2), NodeID(3)],
            tags: tags.into_iter().collect::<Tags>(),
            direction: Direction::Undefined,
            bearing: None,
            compass: None,
            left_border: Border::default(),
            right_border: Border::default(),
            from_two_way: false,
            cropped: false,
        }
    }

    #[test]
    fn oneway_passes_through() {
        let (p, other) = split_bidirectional(path(7, vec![("oneway", "yes")]));
        assert!(other.is_none());
        assert_eq!(p.id, PathID(7));
    }

    #[test]
    fn two_way_split() {
        let (fwd, back) = split_bidirectional(path(
            7,
            vec![
                ("name", "Main Street"),
                ("lanes", "3"),
                ("turn:lanes:forward", "left|through"),
                ("turn:lanes:backward", "through|right"),
                ("destination:backward", "Downtown"),
                ("cycleway:left", "lane"),
                ("cycleway:right", "shared_lane"),
            ],
        ));
        let back = back.unwrap();

        assert_eq!(fwd.id, PathID(7000));
        assert_eq!(back.id, PathID(7001));
        assert_eq!(back.nodes, vec![NodeID(3), NodeID(2), NodeID(1)]);

        assert!(fwd.tags.is("turn:lanes", "left|through"));
        assert!(back.tags.is("turn:lanes", "through|right"));
        assert!(back.tags.is("destination", "Downtown"));
        assert!(!fwd.tags.contains_key("destination"));

        assert!(fwd.tags.is("lanes", "2"));
        assert!(back.tags.is("lanes", "1"));

        assert!(fwd.tags.is("cycleway:right", "shared_lane"));
        assert!(!fwd.tags.contains_key("cycleway:left"));
        assert!(back.tags.is("cycleway:right", "lane"));
        assert!(!back.tags.contains_key("cycleway:left"));
    }

    #[test]
    fn both_ways_applies_to_each_half() {
        let (fwd, back) = split_bidirectional(path(
            1,
            vec![("turn:lanes:both_ways", "left"), ("turn:lanes:forward", "through")],
        ));
        assert!(fwd.tags.is("turn:lanes", "through"));
        assert!(back.unwrap().tags.is("turn:lanes", "left"));
    }

    #[test]
    fn footways_stay_whole() {
        let (p, other) = split_bidirectional(path(3, vec![("highway", "footway")]));
        assert!(other.is_none());
        assert_eq!(p.id, PathID(3));
    }

    #[test]
    fn halves_sit_side_by_side() {
        let o = LonLat::new(-121.95, 37.28);
        let mut nodes = BTreeMap::new();
        for (id, east) in [(1, -50.0), (2, 0.0), (3, 50.0)] {
            nodes.insert(
                NodeID(id),
                RawNode::new(NodeID(id), o.offset_meters(east, 0.0), Tags::empty()),
            );
        }
        let (fwd, back) = split_bidirectional(path(5, vec![("lanes", "2")]));
        let mut paths = vec![fwd, back.unwrap()];
        add_borders(&mut paths, &nodes, Distance::meters(3.0));
        // Eastbound traffic keeps to the south of the nodes, westbound to the north
        let fwd_right = paths[0].right_border.first_pt().unwrap();
        let back_right = paths[1].right_border.first_pt().unwrap();
        assert!(fwd_right.y() < o.y());
        assert!(back_right.y() > o.y());
        assert!(paths[0].left_border.first_pt().unwrap().approx_eq(
            o.offset_meters(-50.0, 0.0),
            Distance::meters(0.01)
        ));
    }

    #[test]
    fn lane_count_inherited_from_single_approach() {
        let mut approach = path(1, vec![("name", "Main Street"), ("lanes", "3")]);
        approach.direction = Direction::ToIntersection;
        approach.bearing = Some(geom::Bearing::degrees(90.0));
        approach.nodes = vec![NodeID(1), NodeID(2)];
        let mut exit = path(2, vec![("name", "Main Street")]);
        exit.direction = Direction::FromIntersection;
        exit.bearing = Some(geom::Bearing::degrees(100.0));
        exit.nodes = vec![NodeID(2), NodeID(3)];

        let mut paths = vec![approach, exit];
        fill_missing_lane_counts(&mut paths, 60.0);
        assert!(paths[1].tags.is("lanes", "3"));
    }
}
