//! Which ways of a city matter for which layer of an intersection.

use abstutil::Tags;
use raw_map::{RawTopology, RawWay};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkType {
    /// Roads cars can use
    Drive,
    /// Anything that isn't a planned or private way
    All,
}

const DRIVE_EXCLUSIONS: &[(&str, &[&str])] = &[
    ("area", &["yes"]),
    (
        "highway",
        &[
            "cycleway",
            "footway",
            "path",
            "pedestrian",
            "steps",
            "track",
            "corridor",
            "proposed",
            "construction",
            "bridleway",
            "abandoned",
            "platform",
            "raceway",
            "service",
        ],
    ),
    ("motor_vehicle", &["no"]),
    ("motorcar", &["no"]),
    (
        "service",
        &[
            "parking",
            "parking_aisle",
            "driveway",
            "private",
            "emergency_access",
        ],
    ),
    ("access", &["private"]),
];

const ALL_EXCLUSIONS: &[(&str, &[&str])] = &[
    ("area", &["yes"]),
    (
        "highway",
        &["proposed", "construction", "abandoned", "platform", "raceway"],
    ),
    ("service", &["private"]),
    ("access", &["private"]),
];

impl NetworkType {
    fn exclusions(self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            NetworkType::Drive => DRIVE_EXCLUSIONS,
            NetworkType::All => ALL_EXCLUSIONS,
        }
    }

    pub fn matches(self, tags: &Tags) -> bool {
        if tags.contains_key("landuse") {
            return false;
        }
        !self
            .exclusions()
            .iter()
            .any(|(key, values)| tags.is_any(key, values))
    }
}

/// Streets making up the drivable network.
pub fn is_street(way: &RawWay) -> bool {
    way.tags.contains_key("highway") && NetworkType::Drive.matches(&way.tags)
}

pub fn is_railway(way: &RawWay) -> bool {
    way.tags.contains_key("railway")
        && NetworkType::All.matches(&way.tags)
        && !way.tags.is_any(
            "railway",
            &[
                "subway",
                "abandoned",
                "disused",
                "razed",
                "construction",
                "proposed",
                "platform",
            ],
        )
}

pub fn is_footway(way: &RawWay) -> bool {
    way.tags.contains("highway", "foot") && NetworkType::All.matches(&way.tags)
}

/// Bus stops, tram stops, stop positions. Anything mentioning a stop.
pub fn is_transit_stop(tags: &Tags) -> bool {
    tags.contains_key("highway") && tags.any_value_contains("stop") && !tags.is("highway", "stop")
}

/// Keeps only the ways passing the filter and the nodes they reference, plus any standalone
/// nodes passing `keep_node`.
pub fn subset<F: Fn(&RawWay) -> bool, G: Fn(&Tags) -> bool>(
    map: &RawTopology,
    keep_way: F,
    keep_node: G,
) -> RawTopology {
    let mut result = RawTopology::blank(&map.name);
    for way in map.ways.values().filter(|w| keep_way(w)) {
        for id in &way.nodes {
            if let Some(node) = map.nodes.get(id) {
                result.nodes.insert(*id, node.clone());
            }
        }
        result.ways.insert(way.id, way.clone());
    }
    for node in map.nodes.values() {
        if keep_node(&node.tags) {
            result.nodes.insert(node.id, node.clone());
        }
    }
    result
}
