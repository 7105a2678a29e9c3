//! A lane-level model of one road intersection, built from raw OpenStreetMap topology.
//!
//! Street ways become directed paths, paths become lanes, and lanes are chained across
//! consecutive paths. From there, every legal movement between lanes becomes a guideway with its
//! own borders. Overlapping guideways form conflict zones, and other traffic standing in the way
//! of a driver waiting at the stop line casts blind zones.
//!
//! Everything works on lon/lat coordinates from the `geom` crate. Bad geometry never aborts the
//! whole intersection: the affected lane or guideway is skipped and logged.

#[macro_use]
extern crate log;

pub use crate::config::Config;
pub use crate::intersection::{process_next, IntersectionData};
pub use crate::objects::blind_zone::BlindZone;
pub use crate::objects::conflict::ConflictZone;
pub use crate::objects::guideway::{Cut, Guideway, GuidewayID, GuidewayType, TurnDirection};
pub use crate::objects::lane::{Lane, LaneID, LaneIndex, LaneRole};
pub use crate::objects::meta::{IntersectionMeta, LaneMeta, TriState};
pub use crate::objects::path::{Direction, LaneCounts, Path, PathID};

pub mod blind_zones;
mod config;
pub mod conflicts;
mod intersection;
pub mod make;
pub mod meta;
mod objects;
pub mod turns;
