use std::fmt;

use serde::{Deserialize, Serialize};

/// A compass bearing in degrees, clockwise from north, normalized to [0, 360).
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Bearing(f64);

impl Bearing {
    pub fn degrees(degs: f64) -> Bearing {
        if !degs.is_finite() {
            warn!("Bad bearing {}, using north", degs);
            return Bearing(0.0);
        }
        Bearing(degs.rem_euclid(360.0))
    }

    pub fn inner_degrees(self) -> f64 {
        self.0
    }

    pub fn opposite(self) -> Bearing {
        Bearing::degrees(self.0 + 180.0)
    }

    pub fn rotate_degs(self, degrees: f64) -> Bearing {
        Bearing::degrees(self.0 + degrees)
    }

    /// How far to turn clockwise to get from this bearing to `other`, in [0, 360).
    pub fn clockwise_delta(self, other: Bearing) -> f64 {
        (other.0 - self.0).rem_euclid(360.0)
    }

    /// The signed smallest rotation from this bearing to `other`, in (-180, 180]. Positive is
    /// clockwise.
    pub fn signed_delta(self, other: Bearing) -> f64 {
        let d = self.clockwise_delta(other);
        if d > 180.0 {
            d - 360.0
        } else {
            d
        }
    }

    /// The unsigned smallest angle between two bearings, in [0, 180].
    pub fn abs_delta(self, other: Bearing) -> f64 {
        self.signed_delta(other).abs()
    }

    /// True if the two bearings differ by less than `tolerance` degrees.
    pub fn approx_eq(self, other: Bearing, tolerance: f64) -> bool {
        self.abs_delta(other) < tolerance
    }

    /// Roughly perpendicular: the clockwise delta falls in (45, 135) or (225, 315).
    pub fn is_roughly_perpendicular(self, other: Bearing) -> bool {
        let d = self.clockwise_delta(other);
        (d > 45.0 && d < 135.0) || (d > 225.0 && d < 315.0)
    }

    pub fn compass(self) -> Compass {
        Compass::from_bearing(self)
    }
}

impl fmt::Display for Bearing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Bearing({} degrees)", self.0)
    }
}

/// The eight rhumbs of the compass rose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    const ALL: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    pub fn from_bearing(b: Bearing) -> Compass {
        let idx = ((b.inner_degrees() / 45.0 + 0.5) as usize) % 8;
        Compass::ALL[idx]
    }

    pub fn describe(self) -> &'static str {
        match self {
            Compass::N => "N",
            Compass::NE => "NE",
            Compass::E => "E",
            Compass::SE => "SE",
            Compass::S => "S",
            Compass::SW => "SW",
            Compass::W => "W",
            Compass::NW => "NW",
        }
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
