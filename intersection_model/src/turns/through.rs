use crate::turns::TurnContext;
use crate::{Direction, Guideway, Lane, TurnDirection};

/// Approaching lanes without a turn restriction, or explicitly allowing through traffic.
/// Bicycle lanes and tracks always continue.
pub fn is_through_allowed(lane: &Lane) -> bool {
    lane.direction == Direction::ToIntersection
        && (lane.is_plain() || lane.allows("through") || lane.is_cycleway() || lane.is_rail())
}

/// The lane continuing straight on from the origin. Tries, in order: the same lane of a path
/// starting where the origin ends; the same lane of the same street just across the
/// intersection; any exit at the same position from the right heading roughly the same way.
pub fn through_destination<'a>(ctx: &TurnContext<'a>, origin: &Lane) -> Option<&'a Lane> {
    let bearing = origin.bearing?;
    let parallel = ctx.config.parallel_tolerance_degrees;
    let aligned = |dest: &Lane, tolerance: f64| {
        dest.bearing
            .map(|b| b.approx_eq(bearing, tolerance))
            .unwrap_or(false)
    };

    if let Some(last) = origin.nodes.last() {
        if let Some(dest) = ctx.lanes_starting_at(*last).find(|dest| {
            dest.direction == Direction::FromIntersection
                && dest.index == origin.index
                && aligned(dest, parallel)
        }) {
            return Some(dest);
        }
    }

    let gap = |dest: &Lane| match (origin.median.last_pt(), dest.median.first_pt()) {
        (Some(a), Some(b)) => Some(a.gps_dist_meters(b)),
        _ => None,
    };
    if let Some(dest) = ctx.lanes.iter().find(|dest| {
        dest.direction == Direction::FromIntersection
            && dest.has_name()
            && dest.name == origin.name
            && dest.index == origin.index
            && aligned(dest, ctx.config.chain_tolerance_degrees)
            && gap(dest).map(|d| d < ctx.config.through_gap).unwrap_or(false)
    }) {
        return Some(dest);
    }

    ctx.lanes.iter().find(|dest| {
        dest.direction == Direction::FromIntersection
            && !dest.is_link()
            && dest.index_from_right() == origin.index_from_right()
            && aligned(dest, parallel)
            && ctx.within_reach(origin, dest)
    })
}

/// Straight on: the origin's borders continue into the destination's.
pub fn through_guideway(origin: &Lane, destination: &Lane) -> Guideway {
    Guideway::new(
        origin,
        destination,
        TurnDirection::Through,
        origin.left_border.concat(&destination.left_border),
        origin.right_border.concat(&destination.right_border),
        Some(origin.median.concat(&destination.median)),
    )
}
