use abstutil::Tags;
use geom::{Border, Distance};

use crate::{Config, Direction, Lane, LaneCounts, LaneIndex, Path};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Where a path's bicycle lanes run: one for traffic moving with the path, and optionally one
/// contraflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BicycleLocation {
    pub forward: Option<Side>,
    pub backward: Option<Side>,
}

impl BicycleLocation {
    fn new(forward: Option<Side>, backward: Option<Side>) -> BicycleLocation {
        BicycleLocation { forward, backward }
    }

    /// How much room bicycle lanes take on one side of the path.
    pub fn space(&self, side: Side, width: Distance) -> Distance {
        let count = [self.forward, self.backward]
            .iter()
            .filter(|s| **s == Some(side))
            .count();
        width * (count as f64)
    }
}

/// Classifies the OSM cycleway tagging schemes. Later cases refine earlier ones, so the last
/// match wins.
pub fn bicycle_lane_location(tags: &Tags) -> BicycleLocation {
    let mut result = BicycleLocation::default();
    let lane = Some("lane");
    let no = Some("no");
    let opposite = Some("opposite_lane");

    // L1a: one lane on the right, tagged a few equivalent ways
    if tags.matches_all(&[("cycleway", lane)])
        || tags.matches_all(&[("cycleway:right", lane), ("cycleway:left", lane)])
        || tags.matches_all(&[("cycleway:both", lane)])
    {
        result = BicycleLocation::new(Some(Side::Right), None);
    }
    // L2
    if tags.matches_all(&[("cycleway:right", lane)]) {
        result = BicycleLocation::new(Some(Side::Right), None);
    }
    // L1b: a two-way bicycle lane on the right
    if tags.matches_all(&[("cycleway:right", lane), ("cycleway:right:oneway", no)]) {
        result = BicycleLocation::new(Some(Side::Right), Some(Side::Right));
    }
    // M1: contraflow on the left
    if tags.matches_all(&[("cycleway", lane), ("oneway:bicycle", no)])
        || tags.matches_all(&[("cycleway:left", opposite), ("cycleway:right", lane)])
    {
        result = BicycleLocation::new(Some(Side::Right), Some(Side::Left));
    }
    // M2b: only on the left
    if tags.matches_all(&[("cycleway:left", lane), ("cycleway:right", None)])
        && !tags.contains_key("cycleway")
    {
        result = BicycleLocation::new(Some(Side::Left), None);
    }
    // M2d: a two-way bicycle lane on the left
    if tags.matches_all(&[
        ("oneway:bicycle", no),
        ("cycleway:left", lane),
        ("cycleway:left:oneway", no),
    ]) {
        result = BicycleLocation::new(Some(Side::Left), Some(Side::Left));
    }
    // M3a: contraflow only, on the left
    if tags.matches_all(&[("oneway:bicycle", no), ("cycleway:left", opposite)])
        || tags.matches_all(&[("oneway:bicycle", no), ("cycleway", opposite)])
    {
        result = BicycleLocation::new(None, Some(Side::Left));
    }
    // M3b: contraflow only, on the right
    if tags.matches_all(&[("oneway:bicycle", no), ("cycleway:right", opposite)]) {
        result = BicycleLocation::new(None, Some(Side::Right));
    }
    result
}

/// Bicycles share the rightmost lane when tagged so, or when nothing says otherwise.
pub fn is_shared(tags: &Tags) -> bool {
    tags.contains("cycleway", "shared")
        || tags.contains("cycleway:right", "shared")
        || !tags.has_any(&["cycleway", "cycleway:right", "cycleway:left", "cycleway:both"])
}

/// Bicycle lanes along a street path. Contraflow lanes are reversed so they run in their own
/// direction of travel.
pub fn build_bicycle_lanes(path: &Path, config: &Config) -> Vec<Lane> {
    if path.nodes.len() < 2 || path.tags.is("bicycle", "no") || path.is_railway() {
        return Vec::new();
    }
    if !path.left_border.is_valid() || !path.right_border.is_valid() {
        return Vec::new();
    }
    let w = config.bicycle_lane_width;

    if is_shared(&path.tags) {
        let right = path.right_border.clone();
        let left = right.shift(-w);
        return vec![bicycle_lane(path, left, right, path.direction, false, config)];
    }

    let location = bicycle_lane_location(&path.tags);
    let mut result = Vec::new();
    let mut forward_lane: Option<(Border, Border)> = None;
    if let Some(side) = location.forward {
        let (left, right) = match side {
            Side::Right => {
                let left = path.right_border.clone();
                let right = left.shift(w);
                (left, right)
            }
            Side::Left => {
                let right = path.left_border.clone();
                let left = right.shift(-w);
                (left, right)
            }
        };
        result.push(bicycle_lane(
            path,
            left.clone(),
            right.clone(),
            path.direction,
            false,
            config,
        ));
        forward_lane = Some((left, right));
    }

    // A two-way path was already split, and each half carries its own lanes
    if let (Some(side), false) = (location.backward, path.from_two_way) {
        let (left, right) = match side {
            Side::Right => {
                let left = match (&forward_lane, location.forward) {
                    (Some((_, fwd_right)), Some(Side::Right)) => fwd_right.clone(),
                    _ => path.right_border.clone(),
                };
                let right = left.shift(w);
                (left, right)
            }
            Side::Left => {
                let right = match (&forward_lane, location.forward) {
                    (Some((fwd_left, _)), Some(Side::Left)) => fwd_left.clone(),
                    _ => path.left_border.clone(),
                };
                let left = right.shift(-w);
                (left, right)
            }
        };
        // Traveling the other way, the borders swap sides
        result.push(bicycle_lane(
            path,
            right.reversed(),
            left.reversed(),
            path.direction.opposite(),
            true,
            config,
        ));
    }
    result
}

fn bicycle_lane(
    path: &Path,
    left: Border,
    right: Border,
    direction: Direction,
    reversed: bool,
    config: &Config,
) -> Lane {
    let mut lane = Lane::new(
        LaneIndex::bicycle(),
        "cycleway",
        direction,
        left,
        right,
        config.bicycle_lane_width,
    );
    lane.name = path.name().to_string();
    lane.highway = path.tags.get("highway").cloned();
    lane.path_ids = vec![path.id];
    lane.counts = LaneCounts::single();
    lane.nodes = path.nodes.clone();
    if reversed {
        lane.nodes.reverse();
    }
    lane.extra_tags = path.tags.clone();
    lane.crosswalk_width = config.crosswalk_width;
    lane
}

/// How much room bicycle lanes need on one side of a path, so motor lanes can be moved over.
pub fn space_for_bicycle_lanes(path: &Path, side: Side, config: &Config) -> Distance {
    if path.tags.is("bicycle", "no") || path.is_railway() || is_shared(&path.tags) {
        return Distance::ZERO;
    }
    let mut location = bicycle_lane_location(&path.tags);
    if path.from_two_way {
        location.backward = None;
    }
    location.space(side, config.bicycle_lane_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: Vec<(&str, &str)>) -> Tags {
        pairs.into_iter().collect()
    }

    #[test]
    fn locations() {
        let right = BicycleLocation::new(Some(Side::Right), None);
        assert_eq!(bicycle_lane_location(&tags(vec![("cycleway", "lane")])), right);
        assert_eq!(
            bicycle_lane_location(&tags(vec![("cycleway:right", "lane")])),
            right
        );
        assert_eq!(
            bicycle_lane_location(&tags(vec![
                ("cycleway:right", "lane"),
                ("cycleway:right:oneway", "no")
            ])),
            BicycleLocation::new(Some(Side::Right), Some(Side::Right))
        );
        assert_eq!(
            bicycle_lane_location(&tags(vec![("cycleway", "lane"), ("oneway:bicycle", "no")])),
            BicycleLocation::new(Some(Side::Right), Some(Side::Left))
        );
        assert_eq!(
            bicycle_lane_location(&tags(vec![("cycleway:left", "lane")])),
            BicycleLocation::new(Some(Side::Left), None)
        );
        assert_eq!(
            bicycle_lane_location(&tags(vec![
                ("oneway:bicycle", "no"),
                ("cycleway", "opposite_lane")
            ])),
            BicycleLocation::new(None, Some(Side::Left))
        );
        assert_eq!(
            bicycle_lane_location(&tags(vec![("highway", "primary")])),
            BicycleLocation::default()
        );
    }

    #[test]
    fn sharing() {
        assert!(is_shared(&tags(vec![("highway", "primary")])));
        assert!(is_shared(&tags(vec![("cycleway", "shared_lane")])));
        assert!(!is_shared(&tags(vec![("cycleway:left", "lane")])));
    }

    #[test]
    fn space_counts_both_directions() {
        let loc = BicycleLocation::new(Some(Side::Right), Some(Side::Right));
        let w = Distance::meters(1.0);
        assert_eq!(loc.space(Side::Right, w), Distance::meters(2.0));
        assert_eq!(loc.space(Side::Left, w), Distance::ZERO);
    }
}
