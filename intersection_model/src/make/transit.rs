use std::collections::BTreeMap;

use geom::{Distance, LonLat};
use raw_map::{NodeID, RawNode};

use crate::Lane;

/// Transit stops inside the crop radius.
pub fn transit_stops(
    nodes: &BTreeMap<NodeID, RawNode>,
    center: LonLat,
    radius: Distance,
) -> Vec<NodeID> {
    nodes
        .values()
        .filter(|n| convert_osm::is_transit_stop(&n.tags) && center.gps_dist_meters(n.pt) <= radius)
        .map(|n| n.id)
        .collect()
}

/// The stops close to a lane's right edge, where passengers board.
pub fn stops_along(
    lane: &Lane,
    stops: &[NodeID],
    nodes: &BTreeMap<NodeID, RawNode>,
    max_dist: Distance,
) -> Vec<NodeID> {
    stops
        .iter()
        .filter(|id| {
            nodes
                .get(id)
                .and_then(|n| lane.right_border.closest_pt(n.pt))
                .map(|(_, away)| away <= max_dist)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use abstutil::Tags;
    use geom::Border;

    use super::*;
    use crate::{Direction, LaneIndex};

    #[test]
    fn stop_near_the_curb() {
        let o = LonLat::new(-121.95, 37.28);
        let mut nodes = BTreeMap::new();
        let mut near = RawNode::new(NodeID(1), o.offset_meters(50.0, -5.0), Tags::empty());
        near.tags.insert("highway", "bus_stop");
        let mut far = RawNode::new(NodeID(2), o.offset_meters(50.0, -40.0), Tags::empty());
        far.tags.insert("public_transport", "stop_position");
        far.tags.insert("highway", "platform");
        nodes.insert(near.id, near);
        nodes.insert(far.id, far);

        let stops = transit_stops(&nodes, o, Distance::meters(150.0));
        assert_eq!(stops, vec![NodeID(1), NodeID(2)]);

        let left = Border::new(vec![o, o.offset_meters(100.0, 0.0)]);
        let lane = Lane::new(
            LaneIndex::through(1),
            "",
            Direction::ToIntersection,
            left.clone(),
            left.shift(Distance::meters(3.0)),
            Distance::meters(3.0),
        );
        let along = stops_along(&lane, &stops, &nodes, Distance::meters(20.0));
        assert_eq!(along, vec![NodeID(1)]);
    }
}
