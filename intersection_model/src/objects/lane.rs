use std::fmt;

use serde::{Deserialize, Serialize};

use abstutil::Tags;
use geom::{Bearing, Border, Compass, Distance, LonLat, Polygon};
use raw_map::{NodeID, NO_NAME};

use crate::{Direction, LaneCounts, LaneMeta, PathID};

/// Unique among every lane, track, cycleway and crosswalk of one intersection. Numbered from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaneID(pub usize);

impl fmt::Display for LaneID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lane #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LaneRole {
    /// Trunk lanes, numbered from the right starting at 1
    Through,
    /// Dedicated left turn lanes, numbered outwards from the trunk
    Left,
    /// Dedicated right turn lanes, numbered inwards from the curb
    Right,
    Bicycle,
    Crosswalk,
}

/// The position of a lane within its path, like "1", "2L" or "1R".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LaneIndex {
    pub number: usize,
    pub role: LaneRole,
}

impl LaneIndex {
    pub fn through(number: usize) -> LaneIndex {
        LaneIndex {
            number,
            role: LaneRole::Through,
        }
    }

    pub fn left(number: usize) -> LaneIndex {
        LaneIndex {
            number,
            role: LaneRole::Left,
        }
    }

    pub fn right(number: usize) -> LaneIndex {
        LaneIndex {
            number,
            role: LaneRole::Right,
        }
    }

    pub fn bicycle() -> LaneIndex {
        LaneIndex {
            number: 1,
            role: LaneRole::Bicycle,
        }
    }

    pub fn crosswalk() -> LaneIndex {
        LaneIndex {
            number: 1,
            role: LaneRole::Crosswalk,
        }
    }
}

impl fmt::Display for LaneIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let suffix = match self.role {
            LaneRole::Through => "",
            LaneRole::Left => "L",
            LaneRole::Right => "R",
            LaneRole::Bicycle => "B",
            LaneRole::Crosswalk => "C",
        };
        write!(f, "{}{}", self.number, suffix)
    }
}

/// One lane of a street, railway track, bicycle lane or crosswalk. Before merging, a lane covers
/// one path; afterwards it may chain several paths of the same street.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneID,
    /// Position in the merged collection this lane belongs to.
    pub approach_id: usize,
    pub index: LaneIndex,
    /// The `turn:lanes` token ("left", "through;right", ...), "rail_track", "cycleway",
    /// "crosswalk", or empty for a plain lane.
    pub lane_type: String,
    pub direction: Direction,
    pub name: String,
    pub highway: Option<String>,
    /// The paths this lane was built from, in travel order.
    pub path_ids: Vec<PathID>,
    /// Counts of the path at the intersection end.
    pub counts: LaneCounts,
    pub nodes: Vec<NodeID>,
    pub left_border: Border,
    pub right_border: Border,
    pub median: Border,
    /// Tapered borders for left turn pockets.
    pub left_shaped_border: Option<Border>,
    pub right_shaped_border: Option<Border>,
    pub width: Distance,
    pub crosswalk_width: Distance,
    pub bearing: Option<Bearing>,
    pub compass: Option<Compass>,
    pub length: Distance,
    pub distance_to_center: Distance,
    /// Tags of the paths and nodes, first value wins.
    pub extra_tags: Tags,
    /// Some node along the lane has a traffic signal.
    pub traffic_signals: bool,
    pub stop_sign: bool,
    pub meta: Option<LaneMeta>,
}

impl Lane {
    /// A lane between two borders, with everything else blank.
    pub fn new(
        index: LaneIndex,
        lane_type: &str,
        direction: Direction,
        left_border: Border,
        right_border: Border,
        width: Distance,
    ) -> Lane {
        let median = left_border.shift(width / 2.0);
        let length = median.length();
        Lane {
            id: LaneID(0),
            approach_id: 0,
            index,
            lane_type: lane_type.to_string(),
            direction,
            name: NO_NAME.to_string(),
            highway: None,
            path_ids: Vec::new(),
            counts: LaneCounts::single(),
            nodes: Vec::new(),
            left_border,
            right_border,
            median,
            left_shaped_border: None,
            right_shaped_border: None,
            width,
            crosswalk_width: Distance::ZERO,
            bearing: None,
            compass: None,
            length,
            distance_to_center: Distance::ZERO,
            extra_tags: Tags::empty(),
            traffic_signals: false,
            stop_sign: false,
            meta: None,
        }
    }

    pub fn has_name(&self) -> bool {
        self.name != NO_NAME
    }

    pub fn is_link(&self) -> bool {
        self.highway
            .as_ref()
            .map(|hwy| hwy.ends_with("_link"))
            .unwrap_or(false)
    }

    pub fn is_cycleway(&self) -> bool {
        self.lane_type == "cycleway"
    }

    pub fn is_rail(&self) -> bool {
        self.lane_type == "rail_track"
    }

    pub fn is_crosswalk(&self) -> bool {
        self.lane_type == "crosswalk"
    }

    /// No turn restriction at all.
    pub fn is_plain(&self) -> bool {
        self.lane_type.is_empty()
    }

    pub fn allows(&self, movement: &str) -> bool {
        self.lane_type.contains(movement)
    }

    /// 0 for the leftmost lane of the path.
    pub fn index_from_left(&self) -> usize {
        let c = self.counts;
        let n = self.index.number;
        match self.index.role {
            LaneRole::Left => c.left.saturating_sub(n),
            LaneRole::Right => c.total().saturating_sub(n),
            LaneRole::Through => (c.left + c.trunk).saturating_sub(n),
            LaneRole::Bicycle | LaneRole::Crosswalk => 0,
        }
    }

    /// 0 for the rightmost lane of the path. Bicycle lanes are always rightmost.
    pub fn index_from_right(&self) -> usize {
        let c = self.counts;
        let n = self.index.number;
        match self.index.role {
            LaneRole::Left => (c.right + c.trunk + n).saturating_sub(1),
            LaneRole::Right => n.saturating_sub(1),
            LaneRole::Through => (c.right + n).saturating_sub(1),
            LaneRole::Bicycle | LaneRole::Crosswalk => 0,
        }
    }

    /// The path touching the intersection: the last one for approaches, otherwise the first.
    pub fn intersection_path(&self) -> Option<PathID> {
        match self.direction {
            Direction::ToIntersection => self.path_ids.last().cloned(),
            _ => self.path_ids.first().cloned(),
        }
    }

    /// The end of the lane nearest the intersection, on its median.
    pub fn intersection_end(&self) -> Option<LonLat> {
        match self.direction {
            Direction::ToIntersection => self.median.last_pt(),
            _ => self.median.first_pt(),
        }
    }

    pub fn polygon(&self) -> Option<Polygon> {
        Polygon::from_borders(&self.left_border, &self.right_border)
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({} {} {})",
            self.id, self.name, self.index, self.direction
        )
    }
}
