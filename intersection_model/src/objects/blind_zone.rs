use serde::{Deserialize, Serialize};

use geom::{LonLat, Polygon};

use crate::GuidewayID;

/// The part of a guideway a viewer can't see, because other vehicles are in the way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlindZone {
    pub id: usize,
    /// Where the viewer drives
    pub viewer: GuidewayID,
    /// Where the hidden traffic comes from
    pub shadowed: GuidewayID,
    pub conflict_zone: String,
    pub point_of_view: LonLat,
    /// As a fraction along the viewer's median
    pub relative_position: f64,
    pub polygon: Polygon,
    /// Guideways that cast the shadow
    pub blockers: Vec<GuidewayID>,
}
