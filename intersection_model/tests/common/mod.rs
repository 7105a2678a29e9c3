//! Small synthetic maps, laid out in meters around a fixed origin.

#![allow(dead_code)]

use abstio::CityName;
use abstutil::Tags;
use geom::LonLat;
use raw_map::{NodeID, RawNode, RawTopology, RawWay, WayID};

pub fn origin() -> LonLat {
    LonLat::new(-121.95, 37.28)
}

pub fn at(east: f64, north: f64) -> LonLat {
    origin().offset_meters(east, north)
}

pub fn city() -> CityName {
    CityName::new("USA", "California", "Campbell")
}

pub fn streets(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub struct MapBuilder {
    map: RawTopology,
}

impl MapBuilder {
    pub fn new() -> MapBuilder {
        MapBuilder {
            map: RawTopology::blank("Campbell, California, USA"),
        }
    }

    pub fn node(mut self, id: i64, east: f64, north: f64, tags: Vec<(&str, &str)>) -> MapBuilder {
        self.map.nodes.insert(
            NodeID(id),
            RawNode::new(NodeID(id), at(east, north), tags.into_iter().collect::<Tags>()),
        );
        self
    }

    pub fn way(mut self, id: i64, nodes: Vec<i64>, tags: Vec<(&str, &str)>) -> MapBuilder {
        self.map.ways.insert(
            WayID(id),
            RawWay {
                id: WayID(id),
                nodes: nodes.into_iter().map(NodeID).collect(),
                tags: tags.into_iter().collect(),
            },
        );
        self
    }

    pub fn build(mut self) -> RawTopology {
        self.map.annotate_street_names();
        self.map
    }
}

/// A Street runs east and B Street runs north, both one-way with 2 lanes, crossing at node 0.
pub fn crossing_one_way_streets(signalized: bool) -> RawTopology {
    let center_tags = if signalized {
        vec![("highway", "traffic_signals")]
    } else {
        Vec::new()
    };
    MapBuilder::new()
        .node(0, 0.0, 0.0, center_tags)
        .node(1, -100.0, 0.0, vec![])
        .node(2, 100.0, 0.0, vec![])
        .node(3, 0.0, -100.0, vec![])
        .node(4, 0.0, 100.0, vec![])
        .way(
            1,
            vec![1, 0, 2],
            vec![
                ("highway", "primary"),
                ("name", "A Street"),
                ("oneway", "yes"),
                ("lanes", "2"),
            ],
        )
        .way(
            2,
            vec![3, 0, 4],
            vec![
                ("highway", "primary"),
                ("name", "B Street"),
                ("oneway", "yes"),
                ("lanes", "2"),
            ],
        )
        .build()
}

/// Like `crossing_one_way_streets`, but A Street's approach has a left, a through and a right
/// turn lane.
pub fn turn_lane_approach() -> RawTopology {
    MapBuilder::new()
        .node(0, 0.0, 0.0, vec![])
        .node(1, -100.0, 0.0, vec![])
        .node(2, 100.0, 0.0, vec![])
        .node(3, 0.0, -100.0, vec![])
        .node(4, 0.0, 100.0, vec![])
        .way(
            1,
            vec![1, 0],
            vec![
                ("highway", "primary"),
                ("name", "A Street"),
                ("oneway", "yes"),
                ("lanes", "3"),
                ("turn:lanes", "left|through|right"),
            ],
        )
        .way(
            2,
            vec![0, 2],
            vec![
                ("highway", "primary"),
                ("name", "A Street"),
                ("oneway", "yes"),
                ("lanes", "1"),
            ],
        )
        .way(
            3,
            vec![3, 0, 4],
            vec![("highway", "residential"), ("name", "B Street")],
        )
        .build()
}

/// A Street runs east, B Street runs south. A slip lane leaves A Street 40 m before the
/// junction and joins B Street 40 m after it.
pub fn slip_lane() -> RawTopology {
    MapBuilder::new()
        .node(0, 0.0, 0.0, vec![])
        .node(1, -100.0, 0.0, vec![])
        .node(2, 100.0, 0.0, vec![])
        .node(3, 0.0, 100.0, vec![])
        .node(4, 0.0, -100.0, vec![])
        .node(5, -40.0, 0.0, vec![])
        .node(6, -10.0, -10.0, vec![])
        .node(7, 0.0, -40.0, vec![])
        .way(
            1,
            vec![1, 5, 0, 2],
            vec![("highway", "primary"), ("name", "A Street"), ("oneway", "yes")],
        )
        .way(
            2,
            vec![3, 0, 7, 4],
            vec![("highway", "primary"), ("name", "B Street"), ("oneway", "yes")],
        )
        .way(
            3,
            vec![5, 6, 7],
            vec![("highway", "primary_link"), ("oneway", "yes")],
        )
        .build()
}
