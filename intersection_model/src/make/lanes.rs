use std::collections::BTreeMap;

use geom::{shaped_widths, Border, Distance};
use raw_map::NO_NAME;

use crate::make::bicycle::{space_for_bicycle_lanes, Side};
use crate::{Config, Direction, Lane, LaneIndex, LaneRole, Path, PathID};

/// Splits a path into lanes. Trunk lanes come first, walking right from the path's left border,
/// then bicycle space and right turn lanes on the right edge, then bicycle space and left turn
/// lanes walking left from the left border.
pub fn build_lanes(path: &Path, config: &Config) -> Vec<Lane> {
    if path.nodes.len() < 2 {
        warn!("{} has fewer than 2 nodes, no lanes", path.id);
        return Vec::new();
    }
    if !path.left_border.is_valid() || !path.right_border.is_valid() {
        warn!("{} has no borders, no lanes", path.id);
        return Vec::new();
    }

    let w = if path.is_railway() {
        config.rail_track_width
    } else {
        config.lane_width
    };
    let types = path.lane_types();
    let counts = path.count_lanes();
    let lane_type = |idx: usize| types.get(idx).cloned().unwrap_or_default();

    let mut lanes = Vec::new();
    let mut left = path.left_border.clone();
    for i in (1..=counts.trunk).rev() {
        let right = left.shift(w);
        lanes.push(path_lane(
            path,
            LaneIndex::through(i),
            &lane_type(i + counts.right - 1),
            left,
            right.clone(),
            w,
            config,
        ));
        left = right;
    }

    let space = space_for_bicycle_lanes(path, Side::Right, config);
    if space > Distance::ZERO {
        left = left.shift(space);
    }
    for i in (1..=counts.right).rev() {
        let right = left.shift(w);
        lanes.push(path_lane(
            path,
            LaneIndex::right(i),
            &lane_type(i - 1),
            left,
            right.clone(),
            w,
            config,
        ));
        left = right;
    }

    let mut right = path.left_border.clone();
    let space = space_for_bicycle_lanes(path, Side::Left, config);
    if space > Distance::ZERO {
        right = right.shift(-space);
    }
    for i in 1..=counts.left {
        let left = right.shift(-w);
        lanes.push(path_lane(
            path,
            LaneIndex::left(i),
            &lane_type(counts.right + counts.trunk + i - 1),
            left.clone(),
            right,
            w,
            config,
        ));
        right = left;
    }
    lanes
}

fn path_lane(
    path: &Path,
    index: LaneIndex,
    lane_type: &str,
    left: Border,
    right: Border,
    width: Distance,
    config: &Config,
) -> Lane {
    let mut lane = Lane::new(index, lane_type, path.direction, left, right, width);
    lane.name = lane_name(path);
    lane.highway = path.tags.get("highway").cloned();
    lane.path_ids = vec![path.id];
    lane.counts = path.count_lanes();
    lane.nodes = path.nodes.clone();
    lane.extra_tags = path.tags.clone();
    lane.crosswalk_width = config.crosswalk_width;
    lane
}

/// The street name, or for unnamed links, the kind of link.
pub fn lane_name(path: &Path) -> String {
    if path.has_name() {
        return path.name().to_string();
    }
    if path.is_link() {
        if let Some(hwy) = path.tags.get("highway") {
            return hwy.clone();
        }
    }
    NO_NAME.to_string()
}

/// Left turn pockets open up gradually. The first left lane tapers from nothing to full width
/// over the start of the lane; lanes further left stack on the previous one's shaped border.
pub fn add_shaped_borders(lanes: &mut Vec<Lane>, config: &Config) {
    let mut groups: BTreeMap<(String, Direction, Vec<PathID>), Vec<usize>> = BTreeMap::new();
    for (idx, lane) in lanes.iter().enumerate() {
        if lane.index.role == LaneRole::Left {
            groups
                .entry((lane.name.clone(), lane.direction, lane.path_ids.clone()))
                .or_default()
                .push(idx);
        }
    }

    for (_, mut group) in groups {
        group.sort_by_key(|idx| lanes[*idx].index.number);
        let mut prev_left_shaped: Option<Border> = None;
        for idx in group {
            let lane = &mut lanes[idx];
            let (densified, count) = lane
                .right_border
                .densify_start(config.shape_points, config.shape_length);
            let right_shaped = prev_left_shaped
                .clone()
                .unwrap_or_else(|| lane.right_border.clone());
            // Both shaped borders of a stacked lane are built on the same densified points
            let base = if prev_left_shaped.is_some() {
                right_shaped.clone()
            } else {
                densified
            };
            let mut offsets: Vec<Distance> = shaped_widths(-lane.width, config.shape_points)
                .into_iter()
                .take(count)
                .collect();
            while offsets.len() < base.num_pts() {
                offsets.push(-lane.width);
            }
            let left_shaped = base.parallel_shift(&offsets, None);
            lane.right_shaped_border = Some(right_shaped);
            lane.left_shaped_border = Some(left_shaped.clone());
            prev_left_shaped = Some(left_shaped);
        }
    }
}

#[cfg(test)]
mod tests {
    use abstutil::Tags;
    use geom::LonLat;
    use raw_map::{NodeID, WayID};

    use super::*;

    fn east_path(tags: Vec<(&str, &str)>, config: &Config) -> Path {
        let start = LonLat::new(-121.95, 37.28);
        let end = start.offset_meters(100.0, 0.0);
        let mut path = Path {
            id: PathID(1),
            way: WayID(1),
            nodes: vec![NodeID(1), NodeID(2)],
            tags: tags.into_iter().collect::<Tags>(),
            direction: Direction::ToIntersection,
            bearing: None,
            compass: None,
            left_border: Border::default(),
            right_border: Border::default(),
            from_two_way: false,
            cropped: false,
        };
        let center = Border::new(vec![start, end]);
        let half = config.lane_width * (path.count_lanes().trunk as f64) / 2.0;
        path.left_border = center.shift(-half);
        path.right_border = center.shift(half);
        path
    }

    #[test]
    fn turn_lanes_chain() {
        let config = Config::default();
        let path = east_path(
            vec![
                ("name", "A Street"),
                ("highway", "primary"),
                ("oneway", "yes"),
                ("cycleway", "no"),
                ("lanes", "3"),
                ("turn:lanes", "left|through|right"),
            ],
            &config,
        );
        let lanes = build_lanes(&path, &config);
        let ids: Vec<String> = lanes.iter().map(|l| l.index.to_string()).collect();
        assert_eq!(ids, vec!["1", "1R", "1L"]);
        assert_eq!(lanes[0].lane_type, "through");
        assert_eq!(lanes[1].lane_type, "right");
        assert_eq!(lanes[2].lane_type, "left");

        // Left lane, trunk, right lane are adjacent
        assert_eq!(lanes[2].right_border, path.left_border);
        assert_eq!(lanes[0].left_border, path.left_border);
        assert_eq!(lanes[1].left_border, lanes[0].right_border);
        for lane in &lanes {
            assert_eq!(lane.index_from_left() + lane.index_from_right(), 2);
        }
    }

    #[test]
    fn shaped_border_tapers() {
        let config = Config::default();
        let path = east_path(
            vec![("name", "A Street"), ("oneway", "yes"), ("turn:lanes", "left|left|")],
            &config,
        );
        let mut lanes = build_lanes(&path, &config);
        add_shaped_borders(&mut lanes, &config);
        let first = lanes.iter().find(|l| l.index == LaneIndex::left(1)).unwrap();
        let shaped = first.left_shaped_border.as_ref().unwrap();
        let start = shaped.first_pt().unwrap();
        assert!(start.gps_dist_meters(first.right_border.first_pt().unwrap()) < Distance::meters(0.1));
        let end = shaped.last_pt().unwrap();
        assert!(end.gps_dist_meters(first.left_border.last_pt().unwrap()) < Distance::meters(0.1));

        let second = lanes.iter().find(|l| l.index == LaneIndex::left(2)).unwrap();
        assert_eq!(second.right_shaped_border.as_ref(), Some(shaped));
    }
}
