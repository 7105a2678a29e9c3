use crate::turns::{turn_border, turn_type, BorderSide, TurnContext};
use crate::{Direction, Guideway, Lane, LaneRole, TurnDirection};

/// Left turns need room to wait for oncoming traffic.
const LEFT_TURN_CROSSWALK_FACTOR: f64 = 5.0;

/// Dedicated left turn lanes, bicycle lanes, and the only lane of a street without any turn
/// lanes.
pub fn is_left_turn_allowed(lane: &Lane) -> bool {
    if lane.direction != Direction::ToIntersection || lane.is_link() {
        return false;
    }
    let lone_lane = lane.index.role == LaneRole::Through
        && lane.counts.left == 0
        && lane.counts.trunk == 1
        && lane.is_plain();
    lane.allows("left") || lane.is_cycleway() || lone_lane
}

/// Exits of a cross street at the same position from the left, reached by turning left.
pub fn left_turn_destinations<'a>(ctx: &TurnContext<'a>, origin: &Lane) -> Vec<&'a Lane> {
    ctx.lanes
        .iter()
        .filter(|dest| {
            dest.direction == Direction::FromIntersection
                && dest.has_name()
                && dest.name != origin.name
                && !dest.is_link()
                && dest.index_from_left() == origin.index_from_left()
                && ctx.crosses_street(origin, dest)
                && turn_type(origin, dest) == Some(TurnDirection::Left)
                && ctx.within_reach(origin, dest)
        })
        .collect()
}

pub fn left_turn_guideway(ctx: &TurnContext, origin: &Lane, destination: &Lane) -> Option<Guideway> {
    let border = |side| {
        turn_border(
            ctx,
            origin,
            destination,
            side,
            -1.0,
            LEFT_TURN_CROSSWALK_FACTOR,
        )
    };
    let left = border(BorderSide::Left)?;
    let right = border(BorderSide::Right)?;
    let median = border(BorderSide::Median)?;
    Some(Guideway::new(
        origin,
        destination,
        TurnDirection::Left,
        left,
        right,
        Some(median),
    ))
}
