//! The convert_osm crate produces a RawTopology from an OSM extract: every node and way of one
//! city, tags untouched. Everything downstream (street detection, splitting, the per-intersection
//! lane model) starts here.

#[macro_use]
extern crate log;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use abstutil::{deserialize_btreemap, serialize_btreemap, Tags};
use geom::LonLat;

pub use self::streets::{
    center, intersection_nodes, match_street_tuples, select_close_nodes, split_streets,
    IntersectingStreets, StreetTuple,
};

mod streets;

/// Ways without a name tag are tracked under this placeholder; it never forms an intersection.
pub const NO_NAME: &str = "no_name";

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeID(pub i64);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "https://www.openstreetmap.org/node/{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WayID(pub i64);

impl fmt::Display for WayID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "https://www.openstreetmap.org/way/{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    pub id: NodeID,
    pub pt: LonLat,
    pub tags: Tags,
    /// Names of every named way passing through this node. Stored as a set; on the wire it's a
    /// plain array.
    #[serde(default)]
    pub street_names: BTreeSet<String>,
}

impl RawNode {
    pub fn new(id: NodeID, pt: LonLat, tags: Tags) -> RawNode {
        RawNode {
            id,
            pt,
            tags,
            street_names: BTreeSet::new(),
        }
    }

    pub fn is_traffic_signal(&self) -> bool {
        self.tags.is("highway", "traffic_signals")
            || self.tags.contains_key("traffic_signals")
            || self.tags.is("crossing", "traffic_signals")
    }

    pub fn is_stop_sign(&self) -> bool {
        self.tags.is("highway", "stop")
    }

    pub fn is_railway_crossing(&self) -> bool {
        self.tags.is_any("railway", &["level_crossing", "crossing", "tram_level_crossing"])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawWay {
    pub id: WayID,
    pub nodes: Vec<NodeID>,
    pub tags: Tags,
}

impl RawWay {
    pub fn name(&self) -> &str {
        self.tags.get("name").map(|x| x.as_str()).unwrap_or(NO_NAME)
    }

    pub fn is_highway(&self) -> bool {
        self.tags.contains_key("highway")
    }

    /// Slip roads and ramps, like `trunk_link` or `primary_link`.
    pub fn is_link(&self) -> bool {
        self.tags
            .get("highway")
            .map(|hwy| hwy.ends_with("_link"))
            .unwrap_or(false)
    }

    pub fn is_oneway(&self) -> bool {
        self.tags.is_any("oneway", &["yes", "true", "1", "-1"])
            || self.tags.is("junction", "roundabout")
    }

    /// Splits into two ways sharing the node at index `i`. The pieces get new ids derived from
    /// the original, remember where they came from, and are marked as split.
    pub fn split_at(&self, i: usize) -> Option<(RawWay, RawWay)> {
        if i == 0 || i + 1 >= self.nodes.len() {
            return None;
        }
        let original_id = self
            .tags
            .get("original_id")
            .cloned()
            .unwrap_or_else(|| self.id.0.to_string());

        let mut pieces = Vec::new();
        for (k, nodes) in [(1, &self.nodes[..=i]), (2, &self.nodes[i..])] {
            let mut tags = self.tags.clone();
            tags.insert("original_id", original_id.clone());
            tags.insert("split", "yes");
            pieces.push(RawWay {
                id: WayID(self.id.0 * 10 + k),
                nodes: nodes.to_vec(),
                tags,
            });
        }
        let second = pieces.pop()?;
        let first = pieces.pop()?;
        Some((first, second))
    }
}

/// Every node and way of one city (or one uploaded selection).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTopology {
    /// Usually "City, State, Country"
    pub name: String,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub nodes: BTreeMap<NodeID, RawNode>,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub ways: BTreeMap<WayID, RawWay>,
}

impl RawTopology {
    pub fn blank(name: &str) -> RawTopology {
        RawTopology {
            name: name.to_string(),
            nodes: BTreeMap::new(),
            ways: BTreeMap::new(),
        }
    }

    /// Names of all ways tagged as highways.
    pub fn street_names(&self) -> BTreeSet<String> {
        self.ways
            .values()
            .filter(|w| w.is_highway() && w.tags.contains_key("name"))
            .map(|w| w.name().to_string())
            .collect()
    }

    /// Annotate every node with the names of the named ways touching it. Idempotent.
    pub fn annotate_street_names(&mut self) {
        for way in self.ways.values() {
            if !way.tags.contains_key("name") || way.name() == NO_NAME {
                continue;
            }
            for id in &way.nodes {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.street_names.insert(way.name().to_string());
                } else {
                    debug!("{} references missing {}", way.id, id);
                }
            }
        }
    }

    /// Node ids of every way with exactly this name.
    pub fn nodes_of_street(&self, name: &str) -> BTreeSet<NodeID> {
        self.ways
            .values()
            .filter(|w| w.name() == name)
            .flat_map(|w| w.nodes.iter().cloned())
            .collect()
    }

    pub fn pt(&self, id: NodeID) -> Option<LonLat> {
        self.nodes.get(&id).map(|n| n.pt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn way(id: i64, nodes: Vec<i64>, tags: Vec<(&str, &str)>) -> RawWay {
        RawWay {
            id: WayID(id),
            nodes: nodes.into_iter().map(NodeID).collect(),
            tags: tags.into_iter().collect(),
        }
    }

    #[test]
    fn split_at_interior_node() {
        let w = way(7, vec![1, 2, 3], vec![("name", "Main Street")]);
        let (a, b) = w.split_at(1).unwrap();
        assert_eq!(a.id, WayID(71));
        assert_eq!(b.id, WayID(72));
        assert_eq!(a.nodes, vec![NodeID(1), NodeID(2)]);
        assert_eq!(b.nodes, vec![NodeID(2), NodeID(3)]);
        assert!(a.tags.is("split", "yes"));
        assert!(b.tags.is("original_id", "7"));

        // Splitting a piece again keeps the first ancestor
        let long = way(8, vec![1, 2, 3, 4], vec![]);
        let (_, rest) = long.split_at(1).unwrap();
        let (c, _) = rest.split_at(1).unwrap();
        assert!(c.tags.is("original_id", "8"));

        assert!(w.split_at(0).is_none());
        assert!(w.split_at(2).is_none());
    }

    #[test]
    fn street_name_sets_survive_json() {
        let mut map = RawTopology::blank("Test, California, USA");
        for (id, lon) in [(1, -122.0), (2, -122.001), (3, -122.002)] {
            map.nodes.insert(
                NodeID(id),
                RawNode::new(NodeID(id), LonLat::new(lon, 37.0), Tags::empty()),
            );
        }
        map.ways.insert(
            WayID(10),
            way(10, vec![1, 2, 3], vec![("name", "A Street"), ("highway", "primary")]),
        );
        map.ways.insert(
            WayID(11),
            way(11, vec![2, 2], vec![("name", "B Street"), ("highway", "residential")]),
        );
        map.annotate_street_names();
        map.annotate_street_names();
        assert_eq!(map.nodes[&NodeID(2)].street_names.len(), 2);

        let raw = serde_json::to_string(&map).unwrap();
        let back: RawTopology = serde_json::from_str(&raw).unwrap();
        assert_eq!(map, back);
    }
}
