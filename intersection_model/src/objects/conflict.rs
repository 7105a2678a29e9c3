use std::fmt;

use serde::{Deserialize, Serialize};

use geom::Polygon;

use crate::GuidewayID;

/// Where two guideways overlap, seen from the first one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictZone {
    /// "g1_g2_seq"
    pub id: String,
    pub guideway1: GuidewayID,
    pub guideway2: GuidewayID,
    pub polygon: Polygon,
    /// Where the conflict starts along guideway1, as a fraction of its median.
    pub distance: f64,
    /// Order among guideway1's conflicts, starting from 0.
    pub sequence: usize,
    /// 1 is the least severe, 4 the most.
    pub priority: u8,
    /// The priority followed by both guideway types, like "3DD".
    pub code: String,
}

impl fmt::Display for ConflictZone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Conflict {} ({})", self.id, self.code)
    }
}
