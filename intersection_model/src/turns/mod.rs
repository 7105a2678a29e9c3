//! Which lanes can reach which, and the shape of the movement between them.

use std::collections::{BTreeMap, BTreeSet};

use abstutil::MultiMap;
use geom::{Border, Distance, Line, LonLat, Piece, Polygon};
use raw_map::{NodeID, RawNode};

use crate::{Config, Lane, TurnDirection};

pub mod bicycle;
pub mod left_turn;
pub mod right_turn;
pub mod through;
pub mod u_turn;

/// The origins of turn arcs and splices get extended this far to find where they cross.
const EXTENSION_FOR_CROSSING: Distance = Distance::const_meters(300.0);

/// Lookups shared by every turn predicate, built once per intersection.
pub struct TurnContext<'a> {
    /// Candidate origins and destinations. Vehicles only turn onto vehicle lanes, bicycles onto
    /// bicycle lanes, and so on.
    pub lanes: &'a [Lane],
    /// Every street lane, used to know which nodes belong to a street and where the cross
    /// streets are.
    pub streets: &'a [Lane],
    pub config: &'a Config,
    pub center: LonLat,
    nodes: &'a BTreeMap<NodeID, RawNode>,
    street_nodes: BTreeMap<String, BTreeSet<NodeID>>,
    starts_at: MultiMap<NodeID, usize>,
}

impl<'a> TurnContext<'a> {
    pub fn new(
        lanes: &'a [Lane],
        streets: &'a [Lane],
        config: &'a Config,
        center: LonLat,
        nodes: &'a BTreeMap<NodeID, RawNode>,
    ) -> TurnContext<'a> {
        let mut street_nodes: BTreeMap<String, BTreeSet<NodeID>> = BTreeMap::new();
        for lane in streets.iter().chain(lanes.iter()) {
            street_nodes
                .entry(lane.name.clone())
                .or_default()
                .extend(lane.nodes.iter().cloned());
        }
        let mut starts_at = MultiMap::new();
        for (idx, lane) in lanes.iter().enumerate() {
            if let Some(first) = lane.nodes.first() {
                starts_at.insert(*first, idx);
            }
        }
        TurnContext {
            lanes,
            streets,
            config,
            center,
            nodes,
            street_nodes,
            starts_at,
        }
    }

    pub fn node_pt(&self, id: NodeID) -> Option<LonLat> {
        self.nodes.get(&id).map(|n| n.pt)
    }

    /// Candidate lanes starting at a node.
    pub fn lanes_starting_at(&self, node: NodeID) -> impl Iterator<Item = &'a Lane> + '_ {
        self.starts_at.get(node).iter().map(move |idx| &self.lanes[*idx])
    }

    /// True if the destination touches the origin's street.
    pub fn crosses_street(&self, origin: &Lane, destination: &Lane) -> bool {
        match self.street_nodes.get(&origin.name) {
            Some(nodes) => destination.nodes.iter().any(|n| nodes.contains(n)),
            None => false,
        }
    }

    /// True if the destination starts close enough to the end of the origin to turn onto.
    pub fn within_reach(&self, origin: &Lane, destination: &Lane) -> bool {
        match (origin.median.last_pt(), destination.median.first_pt()) {
            (Some(a), Some(b)) => a.gps_dist_meters(b) <= self.config.turn_eligibility_distance,
            _ => false,
        }
    }
}

/// Classifies the movement by how far the bearing turns clockwise.
pub fn turn_type(origin: &Lane, destination: &Lane) -> Option<TurnDirection> {
    let delta = origin.bearing?.clockwise_delta(destination.bearing?);
    if delta > 315.0 {
        Some(TurnDirection::UTurn)
    } else if delta > 225.0 {
        Some(TurnDirection::Left)
    } else if delta > 45.0 && delta < 135.0 {
        Some(TurnDirection::Right)
    } else if delta < 45.0 {
        Some(TurnDirection::Through)
    } else {
        None
    }
}

/// The first node of the origin that the destination also uses.
pub fn common_node(origin: &Lane, destination: &Lane) -> Option<NodeID> {
    origin
        .nodes
        .iter()
        .find(|n| destination.nodes.contains(n))
        .cloned()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderSide {
    Left,
    Right,
    Median,
}

impl BorderSide {
    pub const ALL: [BorderSide; 3] = [BorderSide::Left, BorderSide::Right, BorderSide::Median];

    pub fn of(self, lane: &Lane) -> &Border {
        match self {
            BorderSide::Left => &lane.left_border,
            BorderSide::Right => &lane.right_border,
            BorderSide::Median => &lane.median,
        }
    }

    /// Prefers the tapered border if the lane has one.
    pub fn shaped_of(self, lane: &Lane) -> &Border {
        let shaped = match self {
            BorderSide::Left => lane.left_shaped_border.as_ref(),
            BorderSide::Right => lane.right_shaped_border.as_ref(),
            BorderSide::Median => None,
        };
        shaped.unwrap_or_else(|| self.of(lane))
    }
}

/// The space a crosswalk of some width takes next to a lane: the lane itself, lengthened and
/// widened on both sides.
fn crosswalk_space(lane: &Lane, width: Distance) -> Option<Polygon> {
    let extend = |b: &Border| b.extend_end_by(width).extend_start_by(width);
    let left = extend(&lane.left_border).shift(-width);
    let right = extend(&lane.right_border).shift(width);
    Polygon::from_borders(&left, &right)
}

/// Trims a turn border so it stops short of the cross streets, leaving room for a crosswalk.
/// Origins keep the part before the cross street; destinations keep the part after. Never trims
/// more than the configured maximum.
pub fn shorten_border_for_crosswalk(
    ctx: &TurnContext,
    border: &Border,
    street_name: &str,
    keep: Piece,
    crosswalk_width: Distance,
) -> Border {
    let Some(bearing) = border.bearing() else {
        return border.clone();
    };
    let mut result = border.clone();
    for lane in ctx.streets {
        if !lane.has_name() || lane.name == street_name || lane.is_link() {
            continue;
        }
        let Some(other) = lane.median.last_bearing() else {
            continue;
        };
        // Fold into [0, 90]; parallel streets don't cross this one
        let mut delta = bearing.abs_delta(other);
        if delta > 90.0 {
            delta = 180.0 - delta;
        }
        if delta < ctx.config.parallel_tolerance_degrees {
            continue;
        }
        let Some(space) = crosswalk_space(lane, crosswalk_width) else {
            continue;
        };
        if let Some(cut) = space.cut_border(&result, keep) {
            if cut.is_valid() {
                result = cut.drop_small_edges(Distance::meters(0.1));
            }
        }
    }

    let max = ctx.config.max_crosswalk_reduction;
    if border.length() - result.length() > max {
        result = border
            .reduce_by_distance(max, keep == Piece::First)
            .drop_small_edges(Distance::meters(0.1));
    }
    result
}

/// Points along a circular arc tangent to the end of the origin and the start of the
/// destination. `sign` is 1 for right turns and -1 for left turns. The first point is the end
/// of the origin. Returns None when the borders don't cross or the geometry makes no sense.
pub fn construct_turn_arc(
    origin: &Border,
    destination: &Border,
    sign: f64,
    num_points: usize,
) -> Option<Vec<LonLat>> {
    let origin_end = origin.last_pt()?;
    let extended_origin = origin.extend_end_to(EXTENSION_FOR_CROSSING);
    let extended_destination = destination.extend_start_to(EXTENSION_FOR_CROSSING);
    let corner = extended_origin.intersection(&extended_destination)?;
    let after = extended_destination.cut_by_point(corner, Piece::Last);
    let next = *after.points().get(1)?;

    let from_origin = corner.gps_dist_meters(origin_end);
    let from_destination = corner.gps_dist_meters(next);
    let bearing1 = origin_end.bearing_to(corner);
    let bearing2 = corner.bearing_to(next);
    let angle = (sign * (bearing2.inner_degrees() - bearing1.inner_degrees()) + 360.0) % 360.0;
    if angle < 1.0 || angle >= 179.0 {
        debug!("No arc for an angle of {:.1} degrees", angle);
        return None;
    }

    let (d, delta) = if from_origin < from_destination {
        (from_origin, Distance::ZERO)
    } else {
        (from_destination, from_origin - from_destination)
    };
    let half = (angle / 2.0).to_radians();
    let radius = d.inner_meters() / half.tan();
    if radius < 0.0 {
        error!("Negative turn radius {}", radius);
        return None;
    }

    let line = Line::new(origin_end, corner)?;
    let mut pts = Vec::new();
    for i in 0..=num_points {
        let frac = i as f64 / num_points as f64;
        let along = delta.inner_meters() + radius * (angle.to_radians() * frac).sin();
        let base = line.slide_pt(origin_end, Distance::meters(along));
        let offset = sign * 2.0 * radius * (half * frac).sin().powi(2);
        pts.push(line.shift_pt(base, Distance::meters(offset)));
    }
    Some(pts)
}

/// Joins a border, the inside of an arc (without its endpoints) and another border.
pub fn join_with_arc(origin: &Border, arc: &[LonLat], destination: &Border) -> Border {
    let inner = if arc.len() > 2 {
        Border::new(arc[1..arc.len() - 1].to_vec())
    } else {
        Border::default()
    };
    origin.concat(&inner).concat(destination)
}

/// A direct turn between two lanes: both ends are trimmed back from the cross streets, then
/// connected by an arc.
pub fn turn_border(
    ctx: &TurnContext,
    origin: &Lane,
    destination: &Lane,
    side: BorderSide,
    sign: f64,
    crosswalk_factor: f64,
) -> Option<Border> {
    let mut origin_border = side.of(origin).clone();
    let mut destination_border = side.of(destination).clone();
    // Lanes sharing a node past the center would otherwise overlap before the turn
    if let Some(pt) = common_node(origin, destination).and_then(|n| ctx.node_pt(n)) {
        origin_border = origin_border.cut_by_point(pt, Piece::First);
        destination_border = destination_border.cut_by_point(pt, Piece::Last);
    }

    let width = origin.crosswalk_width * crosswalk_factor;
    let origin_border =
        shorten_border_for_crosswalk(ctx, &origin_border, &origin.name, Piece::First, width);
    let destination_border = shorten_border_for_crosswalk(
        ctx,
        &destination_border,
        &destination.name,
        Piece::Last,
        width,
    );
    let arc = construct_turn_arc(
        &origin_border,
        &destination_border,
        sign,
        ctx.config.arc_points,
    )?;
    Some(join_with_arc(&origin_border, &arc, &destination_border))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_angle_arc() {
        let o = LonLat::new(-121.95, 37.28);
        // Eastbound, ending 10 m before the corner; then southbound, starting 10 m after it
        let origin = Border::new(vec![o.offset_meters(-100.0, 0.0), o.offset_meters(-10.0, 0.0)]);
        let destination =
            Border::new(vec![o.offset_meters(0.0, -10.0), o.offset_meters(0.0, -100.0)]);
        let arc = construct_turn_arc(&origin, &destination, 1.0, 12).unwrap();
        assert_eq!(arc.len(), 13);
        let tolerance = Distance::meters(0.2);
        assert!(arc[0].approx_eq(origin.last_pt().unwrap(), tolerance));
        assert!(arc[12].approx_eq(destination.first_pt().unwrap(), tolerance));
        // A quarter circle of radius 10 m around (-10, -10)
        let pivot = o.offset_meters(-10.0, -10.0);
        for pt in &arc {
            assert!((pivot.gps_dist_meters(*pt).inner_meters() - 10.0).abs() < 0.2);
        }

        // Turning left onto it makes no sense
        assert!(construct_turn_arc(&origin, &destination, -1.0, 12).is_none());
    }

    #[test]
    fn arc_joins_without_duplicates() {
        let o = LonLat::new(-121.95, 37.28);
        let origin = Border::new(vec![o.offset_meters(-100.0, 0.0), o.offset_meters(-10.0, 0.0)]);
        let destination =
            Border::new(vec![o.offset_meters(0.0, -10.0), o.offset_meters(0.0, -100.0)]);
        let arc = construct_turn_arc(&origin, &destination, 1.0, 12).unwrap();
        let joined = join_with_arc(&origin, &arc, &destination);
        assert_eq!(joined.num_pts(), 2 + 11 + 2);
    }
}
