use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use geom::{Compass, Distance};

use crate::LaneID;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    Yes,
    No,
    Unknown,
}

impl TriState {
    pub fn from_bool(x: bool) -> TriState {
        if x {
            TriState::Yes
        } else {
            TriState::No
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TriState::Yes => write!(f, "yes"),
            TriState::No => write!(f, "no"),
            TriState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Derived attributes of one merged lane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneMeta {
    pub id: LaneID,
    /// "Main Street to_intersection", or "A Street - B Street Link from_intersection" for links
    pub identification: String,
    pub total_number_of_vehicle_lanes: usize,
    pub number_of_left_turning_lanes: usize,
    pub number_of_right_turning_lanes: usize,
    /// A slip lane leaves from this lane.
    pub right_turn_dedicated_link: bool,
    pub bicycle_lane_on_the_right: bool,
    pub bicycle_lane_on_the_left: bool,
    pub rail_track: bool,
    pub lane_type: String,
    pub traffic_signals: TriState,
    pub number_of_crosswalks: usize,
    pub compass: Option<Compass>,
    pub public_transit_stop: bool,
    pub timestamp: DateTime<Utc>,
}

/// Derived attributes of the whole intersection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionMeta {
    pub number_of_approaches: usize,
    pub number_of_exits: usize,
    pub min_number_of_lanes: usize,
    pub max_number_of_lanes: usize,
    pub traffic_signals: TriState,
    pub stop_sign: TriState,
    pub bicycle_lane_on_the_right: bool,
    pub bicycle_lane_on_the_left: bool,
    pub diameter: Distance,
    /// The largest bend along any approach, in degrees.
    pub curvature: f64,
    pub distance_to_railway_crossing: Option<Distance>,
    pub distance_to_next_intersection: Option<Distance>,
    pub timestamp: DateTime<Utc>,
}
