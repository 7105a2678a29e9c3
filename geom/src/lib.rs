//! Geometry on lon/lat point sequences: distances and bearings on a spherical Earth, borders
//! (polylines) that can be shifted, extended and cut, circles, and polygon boolean algebra.
//!
//! Planar operations work in a local east/north frame measured in meters, which is accurate at
//! the scale of one intersection.

#[macro_use]
extern crate log;

pub use crate::angle::{Bearing, Compass};
pub use crate::border::{shaped_widths, Border, Piece};
pub use crate::circle::Circle;
pub use crate::distance::Distance;
pub use crate::gps::{LonLat, EARTH_RADIUS_METERS};
pub use crate::line::Line;
pub use crate::polygon::Polygon;

mod angle;
mod border;
mod circle;
mod distance;
mod gps;
mod line;
mod polygon;

/// Points closer than this are considered the same.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.01);

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
