use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use abstutil::Tags;
use geom::{Bearing, Border, Compass, LonLat};
use raw_map::{NodeID, RawNode, RawWay, WayID, NO_NAME};

/// Paths come from OSM ways, so most ids match the way. Halves of a two-way way get
/// `way * 1000` (forward) and `way * 1000 + 1` (backward).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathID(pub i64);

impl fmt::Display for PathID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Path #{}", self.0)
    }
}

/// Which way something travels, relative to the intersection center.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The last node is closer to the center than the first.
    ToIntersection,
    FromIntersection,
    /// Links, crosswalks, and anything too short to tell.
    Undefined,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::ToIntersection => Direction::FromIntersection,
            Direction::FromIntersection => Direction::ToIntersection,
            Direction::Undefined => Direction::Undefined,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::ToIntersection => write!(f, "to_intersection"),
            Direction::FromIntersection => write!(f, "from_intersection"),
            Direction::Undefined => write!(f, "undefined"),
        }
    }
}

/// How a path's lanes split between dedicated turn lanes and the trunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneCounts {
    /// Left turn lanes
    pub left: usize,
    /// Right turn lanes
    pub right: usize,
    /// Everything else
    pub trunk: usize,
}

impl LaneCounts {
    /// A path with one lane and no turn lanes. Bicycle lanes and crosswalks always count like
    /// this.
    pub fn single() -> LaneCounts {
        LaneCounts {
            left: 0,
            right: 0,
            trunk: 1,
        }
    }

    pub fn total(&self) -> usize {
        self.left + self.right + self.trunk
    }
}

/// One direction of travel along a piece of an OSM way, with its outer borders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub id: PathID,
    pub way: WayID,
    pub nodes: Vec<NodeID>,
    pub tags: Tags,
    pub direction: Direction,
    /// From the first node to the last
    pub bearing: Option<Bearing>,
    pub compass: Option<Compass>,
    pub left_border: Border,
    pub right_border: Border,
    /// Built from one half of a two-way way.
    pub from_two_way: bool,
    /// Cut short by the crop radius.
    pub cropped: bool,
}

impl Path {
    /// Starts a path from a way. Nodes without coordinates are dropped, and ways tagged
    /// `oneway=-1` are reversed so the nodes follow the direction of travel.
    pub fn from_way(way: &RawWay, nodes: &BTreeMap<NodeID, RawNode>) -> Path {
        let mut path_nodes: Vec<NodeID> = way
            .nodes
            .iter()
            .filter(|id| nodes.contains_key(id))
            .cloned()
            .collect();
        let mut tags = way.tags.clone();
        if tags.is("oneway", "-1") {
            path_nodes.reverse();
            tags.insert("oneway", "yes");
        }
        Path {
            id: PathID(way.id.0),
            way: way.id,
            nodes: path_nodes,
            tags,
            direction: Direction::Undefined,
            bearing: None,
            compass: None,
            left_border: Border::default(),
            right_border: Border::default(),
            from_two_way: false,
            cropped: false,
        }
    }

    pub fn name(&self) -> &str {
        self.tags.get("name").map(|x| x.as_str()).unwrap_or(NO_NAME)
    }

    pub fn has_name(&self) -> bool {
        self.name() != NO_NAME
    }

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

    pub fn is_railway(&self) -> bool {
        self.tags.contains_key("railway") && !self.tags.contains_key("highway")
    }

    pub fn is_footway(&self) -> bool {
        self.tags
            .get("highway")
            .map(|hwy| hwy.contains("foot"))
            .unwrap_or(false)
    }

    /// The tokens of `turn:lanes`, ordered from the rightmost lane. `none` means a plain lane.
    fn turn_tokens(&self) -> Vec<String> {
        match self.tags.get("turn:lanes") {
            Some(raw) => {
                let mut tokens: Vec<String> = raw
                    .split('|')
                    .map(|t| {
                        let t = t.trim();
                        if t == "none" || t == "None" {
                            String::new()
                        } else {
                            t.to_string()
                        }
                    })
                    .collect();
                tokens.reverse();
                tokens
            }
            None => Vec::new(),
        }
    }

    /// The number of lanes, from `lanes` or from the `turn:lanes` tokens, whichever is larger.
    /// Railways always have one track.
    pub fn num_lanes(&self) -> usize {
        if self.is_railway() {
            return 1;
        }
        let tagged = self
            .tags
            .get("lanes")
            .and_then(|raw| raw.split(';').next())
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(0);
        tagged.max(self.turn_tokens().len()).max(1)
    }

    /// The type of every lane, from the rightmost. Lanes with no `turn:lanes` information are
    /// plain (empty type).
    pub fn lane_types(&self) -> Vec<String> {
        let n = self.num_lanes();
        if self.is_railway() {
            return vec!["rail_track".to_string(); n];
        }
        let mut types = self.turn_tokens();
        // Missing tokens are taken to be the leftmost lanes
        while types.len() < n {
            types.push(String::new());
        }
        types
    }

    pub fn count_lanes(&self) -> LaneCounts {
        let n = self.num_lanes();
        if self.is_railway() {
            return LaneCounts {
                left: 0,
                right: 0,
                trunk: n,
            };
        }
        let types = self.lane_types();
        let left = types.iter().filter(|t| *t == "left").count();
        let right = types.iter().filter(|t| *t == "right").count();
        LaneCounts {
            left,
            right,
            trunk: n.saturating_sub(left + right),
        }
    }

    pub fn pts(&self, nodes: &BTreeMap<NodeID, RawNode>) -> Vec<LonLat> {
        self.nodes
            .iter()
            .filter_map(|id| nodes.get(id).map(|n| n.pt))
            .collect()
    }

    pub fn length(&self) -> geom::Distance {
        self.left_border.length()
    }
}
