use geom::{Border, Distance, Line, LonLat, Piece};

use crate::turns::{join_with_arc, shorten_border_for_crosswalk, TurnContext};
use crate::{Direction, Guideway, Lane, LaneRole, TurnDirection};

/// The perpendicular probe for the landing point reaches this far.
const LANDING_PROBE: Distance = Distance::const_meters(1000.0);
/// Where to retry from when the first attempt gives a suspiciously wide turn.
const RETRY_FRACTION: f64 = 0.95;

/// Only from the leftmost lane, close to the center, and not from lanes dedicated to going
/// straight or turning right.
pub fn is_u_turn_allowed(ctx: &TurnContext, lane: &Lane) -> bool {
    if lane.direction != Direction::ToIntersection || lane.is_cycleway() || lane.is_rail() {
        return false;
    }
    if lane.index_from_left() != 0 || lane.index.role == LaneRole::Right {
        return false;
    }
    if lane.allows("through") && !lane.allows("left") {
        return false;
    }
    if lane.allows("right") && !lane.allows("left") {
        return false;
    }
    lane.left_border
        .last_pt()
        .map(|pt| pt.gps_dist_meters(ctx.center) <= ctx.config.u_turn_center_distance)
        .unwrap_or(false)
}

/// The leftmost exit of the same street going back the other way.
pub fn u_turn_destinations<'a>(ctx: &TurnContext<'a>, origin: &Lane) -> Vec<&'a Lane> {
    let (Some(bearing), Some(end)) = (origin.bearing, origin.median.last_pt()) else {
        return Vec::new();
    };
    let landing = ctx.config.u_turn_landing_distance;
    ctx.lanes
        .iter()
        .filter(|dest| {
            dest.direction == Direction::FromIntersection
                && dest.has_name()
                && dest.name == origin.name
                && dest.index_from_left() == 0
                && dest
                    .bearing
                    .map(|b| b.abs_delta(bearing) > 150.0)
                    .unwrap_or(false)
                && dest
                    .median
                    .first_pt()
                    .map(|pt| pt.gps_dist_meters(end) <= landing)
                    .unwrap_or(false)
                && dest.median.length() > landing
        })
        .collect()
}

/// A half circle from the end of the origin onto the destination. The radius is half the
/// distance from the origin's end straight across to the destination.
pub fn u_turn_guideway(ctx: &TurnContext, origin: &Lane, destination: &Lane) -> Option<Guideway> {
    let width = origin.crosswalk_width;
    let origin_median =
        shorten_border_for_crosswalk(ctx, &origin.median, &origin.name, Piece::First, width);
    let destination_median = shorten_border_for_crosswalk(
        ctx,
        &destination.median,
        &destination.name,
        Piece::Last,
        width,
    );

    let (mut arc, mut landing, mut radius) = u_turn_arc(ctx, &origin_median, &destination_median)?;
    if radius > ctx.config.u_turn_radius_warning {
        warn!(
            "U-turn from {} to {} has a radius of {}, retrying from further back",
            origin, destination, radius
        );
        let (shorter, _) = origin_median.cut_by_relative_distance(RETRY_FRACTION);
        (arc, landing, radius) = u_turn_arc(ctx, &shorter, &destination_median)?;
    }
    if radius > ctx.config.u_turn_radius_limit {
        warn!(
            "Rejecting U-turn from {} to {} with a radius of {}",
            origin, destination, radius
        );
        return None;
    }

    let origin_piece = origin_median.cut_by_point(*arc.first()?, Piece::First);
    let median = join_with_arc(&origin_piece, &arc, &landing);
    if !median.is_valid() {
        return None;
    }
    let half = origin.width / 2.0;
    Some(Guideway::new(
        origin,
        destination,
        TurnDirection::UTurn,
        median.shift(-half),
        median.shift(half),
        Some(median),
    ))
}

/// The arc points, the part of the destination after it, and the radius.
fn u_turn_arc(
    ctx: &TurnContext,
    origin: &Border,
    destination: &Border,
) -> Option<(Vec<LonLat>, Border, Distance)> {
    let last = origin.last_line()?;
    let end = last.pt2();
    let probe = Line::new(end, last.shift_pt(end, -LANDING_PROBE))?;
    let (landing_pt, landing) = match Border::from(probe).intersection(destination) {
        Some(hit) => (hit, destination.cut_by_point(hit, Piece::Last)),
        None => {
            let start = destination.first_pt()?;
            (last.shift_pt(end, -last.dist_to_pt(start)), destination.clone())
        }
    };
    let radius = end.gps_dist_meters(landing_pt) / 2.0;
    if radius <= Distance::ZERO {
        return None;
    }

    let n = ctx.config.arc_points;
    let r = radius.inner_meters();
    let mut pts = Vec::new();
    for i in 0..=n {
        let theta = std::f64::consts::PI * i as f64 / n as f64;
        let base = last.slide_pt(end, Distance::meters(r * theta.sin()));
        pts.push(last.shift_pt(base, Distance::meters(-r * (1.0 - theta.cos()))));
    }
    Some((pts, landing, radius))
}
