use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Bearing, Distance};

/// Mean radius of the spherical Earth model.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// longitude is x, latitude is y
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    pub fn x(&self) -> f64 {
        self.longitude
    }

    pub fn y(&self) -> f64 {
        self.latitude
    }

    pub fn gps_dist_meters(&self, other: LonLat) -> Distance {
        // Haversine distance
        let lon1 = self.longitude.to_radians();
        let lon2 = other.longitude.to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;

        let a = (delta_lat / 2.0).sin().powi(2)
            + (delta_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        Distance::meters(EARTH_RADIUS_METERS * c)
    }

    /// The initial compass bearing of the great circle from here to `other`.
    pub fn bearing_to(&self, other: LonLat) -> Bearing {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let x = delta_lon.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
        Bearing::degrees(x.atan2(y).to_degrees())
    }

    /// Follows a great circle from here for some distance along an initial bearing.
    pub fn project_away(&self, dist: Distance, bearing: Bearing) -> LonLat {
        let delta = dist.inner_meters() / EARTH_RADIUS_METERS;
        let theta = bearing.inner_degrees().to_radians();
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
        LonLat::new(
            (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
            lat2.to_degrees(),
        )
    }

    /// Moves by a small local offset, in meters east and north. Uses an equirectangular
    /// approximation, fine at intersection scale.
    pub fn offset_meters(&self, east: f64, north: f64) -> LonLat {
        let dlat = (north / EARTH_RADIUS_METERS).to_degrees();
        let cos_lat = self.latitude.to_radians().cos().max(1e-9);
        let dlon = (east / (EARTH_RADIUS_METERS * cos_lat)).to_degrees();
        LonLat::new(self.longitude + dlon, self.latitude + dlat)
    }

    /// The local offset from here to `other`, in meters (east, north). Inverse of
    /// `offset_meters`.
    pub fn meters_to(&self, other: LonLat) -> (f64, f64) {
        let cos_lat = self.latitude.to_radians().cos().max(1e-9);
        let east = (other.longitude - self.longitude).to_radians() * EARTH_RADIUS_METERS * cos_lat;
        let north = (other.latitude - self.latitude).to_radians() * EARTH_RADIUS_METERS;
        (east, north)
    }

    /// Linear interpolation in coordinate space; `t` = 0 is self, 1 is `other`.
    pub fn lerp(&self, other: LonLat, t: f64) -> LonLat {
        LonLat::new(
            self.longitude + (other.longitude - self.longitude) * t,
            self.latitude + (other.latitude - self.latitude) * t,
        )
    }

    pub fn approx_eq(&self, other: LonLat, threshold: Distance) -> bool {
        self.gps_dist_meters(other) <= threshold
    }

    pub fn center(pts: &[LonLat]) -> LonLat {
        let mut lon = 0.0;
        let mut lat = 0.0;
        for pt in pts {
            lon += pt.longitude;
            lat += pt.latitude;
        }
        let len = pts.len().max(1) as f64;
        LonLat {
            longitude: lon / len,
            latitude: lat / len,
        }
    }

    pub fn to_geo(&self) -> geo::Coord {
        geo::Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}

impl From<(f64, f64)> for LonLat {
    fn from(pair: (f64, f64)) -> LonLat {
        LonLat::new(pair.0, pair.1)
    }
}

impl From<LonLat> for (f64, f64) {
    fn from(pt: LonLat) -> (f64, f64) {
        (pt.longitude, pt.latitude)
    }
}

impl From<geo::Coord> for LonLat {
    fn from(c: geo::Coord) -> LonLat {
        LonLat::new(c.x, c.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearings_match_compass_directions() {
        let pt = LonLat::new(-121.95, 37.28);
        let north = LonLat::new(-121.95, 37.29);
        let east = LonLat::new(-121.94, 37.28);
        assert!(pt.bearing_to(north).inner_degrees() < 0.001);
        assert!((pt.bearing_to(east).inner_degrees() - 90.0).abs() < 0.01);
        assert!((north.bearing_to(pt).inner_degrees() - 180.0).abs() < 0.001);
    }

    #[test]
    fn project_away_round_trips() {
        let pt = LonLat::new(-121.95, 37.28);
        let far = pt.project_away(Distance::meters(1000.0), Bearing::degrees(60.0));
        assert!((pt.gps_dist_meters(far).inner_meters() - 1000.0).abs() < 0.5);
        assert!((pt.bearing_to(far).inner_degrees() - 60.0).abs() < 0.1);
    }

    #[test]
    fn local_offsets_invert() {
        let pt = LonLat::new(2.35, 48.85);
        let moved = pt.offset_meters(30.0, -40.0);
        let (e, n) = pt.meters_to(moved);
        assert!((e - 30.0).abs() < 1e-6);
        assert!((n + 40.0).abs() < 1e-6);
        assert!((pt.gps_dist_meters(moved).inner_meters() - 50.0).abs() < 0.1);
    }

    #[test]
    fn serializes_as_pair() {
        let pt = LonLat::new(1.5, 2.5);
        assert_eq!(serde_json::to_string(&pt).unwrap(), "[1.5,2.5]");
        let back: LonLat = serde_json::from_str("[1.5,2.5]").unwrap();
        assert_eq!(pt, back);
    }
}
