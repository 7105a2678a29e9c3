use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use geom::Distance;

/// Tunable widths, radii and tolerances used while building an intersection. Missing fields in a
/// config file fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lane_width: Distance,
    pub bicycle_lane_width: Distance,
    pub rail_track_width: Distance,
    /// Distance kept clear in front of a crosswalk when shortening turn borders.
    pub crosswalk_width: Distance,
    /// Width of crosswalk lanes, tagged or simulated.
    pub footway_width: Distance,

    /// Left turn pockets taper in over this many points...
    pub shape_points: usize,
    /// ... spread over this length at the start of the lane.
    pub shape_length: Distance,

    /// Everything beyond this distance from the center is cropped away.
    pub crop_radius: Distance,
    /// Nodes with two or more street names closer than this to the first intersection node are
    /// treated as part of the same intersection.
    pub node_selection_radius: Distance,
    /// Half the side of the area fetched around a point when the caller doesn't have a map yet.
    pub initial_size: Distance,

    /// Bearings within this many degrees are parallel.
    pub parallel_tolerance_degrees: f64,
    /// Consecutive pieces of one lane can bend by up to this many degrees.
    pub chain_tolerance_degrees: f64,
    /// Max gap between an approach's end and the start of a same-name exit for a through move.
    pub through_gap: Distance,
    /// Destinations further than this from the end of the origin can't be reached by a turn.
    pub turn_eligibility_distance: Distance,
    /// Turn borders are never shortened by more than this for crosswalks.
    pub max_crosswalk_reduction: Distance,
    /// Points along a turn arc.
    pub arc_points: usize,

    /// A U-turn starts only from lanes ending this close to the center.
    pub u_turn_center_distance: Distance,
    /// A U-turn lands only on lanes starting this close to the origin and at least this long.
    pub u_turn_landing_distance: Distance,
    /// U-turn radii above this are suspicious and retried with a shorter origin.
    pub u_turn_radius_warning: Distance,
    /// U-turn radii above this are rejected.
    pub u_turn_radius_limit: Distance,

    pub transit_stop_distance: Distance,
    /// How far sector rays reach when computing blind zones.
    pub blind_zone_far_distance: Distance,
    /// Paths shorter than this after cropping are dropped.
    pub min_element_length: Distance,
    /// A cropped path gets a synthetic end node if its last real node is further than this from
    /// the cut.
    pub synthetic_node_gap: Distance,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            lane_width: Distance::meters(3.048),
            bicycle_lane_width: Distance::meters(1.0),
            rail_track_width: Distance::meters(2.0),
            crosswalk_width: Distance::meters(1.82),
            footway_width: Distance::meters(1.8),

            shape_points: 16,
            shape_length: Distance::meters(10.0),

            crop_radius: Distance::meters(150.0),
            node_selection_radius: Distance::meters(50.0),
            initial_size: Distance::meters(500.0),

            parallel_tolerance_degrees: 30.0,
            chain_tolerance_degrees: 60.0,
            through_gap: Distance::meters(15.0),
            turn_eligibility_distance: Distance::meters(50.0),
            max_crosswalk_reduction: Distance::meters(12.0),
            arc_points: 12,

            u_turn_center_distance: Distance::meters(35.0),
            u_turn_landing_distance: Distance::meters(25.0),
            u_turn_radius_warning: Distance::meters(50.0),
            u_turn_radius_limit: Distance::meters(100.0),

            transit_stop_distance: Distance::meters(20.0),
            blind_zone_far_distance: Distance::meters(10_000.0),
            min_element_length: Distance::meters(5.0),
            synthetic_node_gap: Distance::meters(5.0),
        }
    }
}

impl Config {
    /// Reads a JSON config file.
    pub fn load(path: &str) -> Result<Config> {
        let raw = fs_err::read_to_string(path)?;
        let config: Config =
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path))?;
        info!("Loaded config from {}", path);
        Ok(config)
    }
}
