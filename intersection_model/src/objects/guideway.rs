use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Border, Piece, Polygon};

use crate::{Lane, LaneID, PathID};

/// `100 * origin + destination` for movements between two lanes; `101 * crosswalk` for
/// crossings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuidewayID(pub usize);

impl GuidewayID {
    pub fn between(origin: LaneID, destination: LaneID) -> GuidewayID {
        GuidewayID(100 * origin.0 + destination.0)
    }

    pub fn crossing(crosswalk: LaneID) -> GuidewayID {
        GuidewayID(101 * crosswalk.0)
    }
}

impl fmt::Display for GuidewayID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Guideway #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GuidewayType {
    Drive,
    Bicycle,
    Railway,
    Footway,
}

impl GuidewayType {
    pub fn from_lane(lane: &Lane) -> GuidewayType {
        if lane.is_cycleway() {
            GuidewayType::Bicycle
        } else if lane.is_rail() {
            GuidewayType::Railway
        } else if lane.is_crosswalk() {
            GuidewayType::Footway
        } else {
            GuidewayType::Drive
        }
    }

    /// One letter, used in conflict codes.
    pub fn letter(self) -> char {
        match self {
            GuidewayType::Drive => 'D',
            GuidewayType::Bicycle => 'B',
            GuidewayType::Railway => 'R',
            GuidewayType::Footway => 'F',
        }
    }

    /// Vehicles that can hide something from a viewer.
    pub fn blocks_view(self) -> bool {
        matches!(self, GuidewayType::Drive | GuidewayType::Railway)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    Through,
    Left,
    Right,
    UTurn,
    /// Crosswalks
    Undefined,
}

/// One cut applied to a guideway: where (as a fraction of its length) and which side was kept.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    pub relative: f64,
    pub keep_end: bool,
}

/// A feasible movement through the intersection, from the start of one lane to the end of
/// another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Guideway {
    pub id: GuidewayID,
    pub guideway_type: GuidewayType,
    pub direction: TurnDirection,
    pub origin_lane: LaneID,
    pub destination_lane: LaneID,
    /// The origin lane's path touching the intersection. Guideways from the same path never
    /// conflict.
    pub origin_path: Option<PathID>,
    pub name: String,
    pub signalized: bool,
    pub left_border: Border,
    pub right_border: Border,
    pub median: Border,
    /// Borders ending just after the last conflict along this guideway.
    pub reduced_left_border: Option<Border>,
    pub reduced_right_border: Option<Border>,
    pub reduced_median: Option<Border>,
    /// Where the origin lane ends, as a fraction along the median. Drivers look from here.
    pub stop_line: f64,
    pub cut_history: Vec<Cut>,
}

impl Guideway {
    /// Builds a guideway between two lanes. The median is derived from the borders unless
    /// given.
    pub fn new(
        origin: &Lane,
        destination: &Lane,
        direction: TurnDirection,
        left_border: Border,
        right_border: Border,
        median: Option<Border>,
    ) -> Guideway {
        let id = if origin.is_crosswalk() {
            GuidewayID::crossing(origin.id)
        } else {
            GuidewayID::between(origin.id, destination.id)
        };
        let median = median.unwrap_or_else(|| left_border.shift(origin.width / 2.0));
        let stop_line = origin
            .median
            .last_pt()
            .and_then(|pt| median.project_normalized(pt))
            .unwrap_or(0.0);
        let name = if origin.name == destination.name {
            origin.name.clone()
        } else {
            format!("{} - {}", origin.name, destination.name)
        };
        Guideway {
            id,
            guideway_type: GuidewayType::from_lane(origin),
            direction,
            origin_lane: origin.id,
            destination_lane: destination.id,
            origin_path: origin.intersection_path(),
            name,
            signalized: origin.traffic_signals,
            left_border,
            right_border,
            median,
            reduced_left_border: None,
            reduced_right_border: None,
            reduced_median: None,
            stop_line,
            cut_history: Vec::new(),
        }
    }

    pub fn polygon(&self) -> Option<Polygon> {
        Polygon::from_borders(&self.left_border, &self.right_border)
    }

    /// The polygon up to the last conflict, falling back to the whole guideway.
    pub fn reduced_polygon(&self) -> Option<Polygon> {
        match (&self.reduced_left_border, &self.reduced_right_border) {
            (Some(left), Some(right)) => Polygon::from_borders(left, right),
            _ => self.polygon(),
        }
    }

    /// A copy cut at a fraction of its length, keeping the beginning or the end. The cut is
    /// recorded; reduced borders are dropped since they no longer apply. Returns None if the
    /// cut leaves nothing.
    pub fn cut(&self, relative: f64, keep: Piece) -> Option<Guideway> {
        let cut_one = |b: &Border| -> Option<Border> {
            let (first, last) = b.cut_by_relative_distance(relative);
            let piece = match (keep, last) {
                (Piece::First, Some(_)) => first,
                (Piece::Last, Some(last)) => last,
                // The cut fell on an end
                (Piece::First, None) => {
                    if relative <= 0.0 {
                        return None;
                    }
                    first
                }
                (Piece::Last, None) => {
                    if relative >= 1.0 {
                        return None;
                    }
                    first
                }
            };
            if piece.is_valid() {
                Some(piece)
            } else {
                None
            }
        };
        let mut result = self.clone();
        result.left_border = cut_one(&self.left_border)?;
        result.right_border = cut_one(&self.right_border)?;
        result.median = cut_one(&self.median)?;
        result.reduced_left_border = None;
        result.reduced_right_border = None;
        result.reduced_median = None;
        result.cut_history.push(Cut {
            relative,
            keep_end: keep == Piece::Last,
        });
        Some(result)
    }
}

impl fmt::Display for Guideway {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({:?} {:?}, {} -> {})",
            self.id, self.guideway_type, self.direction, self.origin_lane, self.destination_lane
        )
    }
}
