use geom::{Border, Distance, Piece};

use crate::turns::through::is_through_allowed;
use crate::turns::{turn_border, turn_type, BorderSide, TurnContext};
use crate::{Direction, Guideway, Lane, LaneIndex, LaneRole, TurnDirection};

/// Links get lengthened at both ends so they're guaranteed to cross the lanes they connect.
const LINK_SPLICE_EXTENSION: Distance = Distance::const_meters(10.0);

/// Dedicated right turn lanes, the rightmost untagged lane when there's no right turn lane,
/// bicycle lanes, and through lanes feeding a slip lane.
pub fn is_right_turn_allowed(ctx: &TurnContext, lane: &Lane) -> bool {
    if lane.direction != Direction::ToIntersection {
        return false;
    }
    let curb_lane =
        lane.index == LaneIndex::through(1) && lane.is_plain() && lane.counts.right == 0;
    lane.allows("right")
        || lane.index.role == LaneRole::Right
        || curb_lane
        || lane.is_cycleway()
        || (is_through_allowed(lane) && connected_link(ctx, lane).is_some())
}

/// A slip lane leaving from somewhere along the origin.
pub fn connected_link<'a>(ctx: &TurnContext<'a>, origin: &Lane) -> Option<&'a Lane> {
    ctx.lanes.iter().find(|link| {
        link.is_link()
            && link.index.number == origin.index.number
            && link
                .nodes
                .first()
                .map(|n| origin.nodes.contains(n))
                .unwrap_or(false)
    })
}

/// The exit a slip lane feeds into.
pub fn link_destination<'a>(ctx: &TurnContext<'a>, link: &Lane) -> Option<&'a Lane> {
    let last = link.nodes.last()?;
    ctx.lanes.iter().find(|dest| {
        dest.direction == Direction::FromIntersection
            && !dest.is_link()
            && dest.index.number == link.index.number
            && dest.nodes.contains(last)
    })
}

/// Exits at the same position from the right, reached by turning right.
pub fn right_turn_destinations<'a>(ctx: &TurnContext<'a>, origin: &Lane) -> Vec<&'a Lane> {
    if let Some(link) = connected_link(ctx, origin) {
        return link_destination(ctx, link).into_iter().collect();
    }
    ctx.lanes
        .iter()
        .filter(|dest| {
            dest.direction == Direction::FromIntersection
                && dest.name != origin.name
                && !dest.is_link()
                && dest.index_from_right() == origin.index_from_right()
                && turn_type(origin, dest) == Some(TurnDirection::Right)
                && ctx.within_reach(origin, dest)
        })
        .collect()
}

/// Follows the origin up to where the link leaves it, the link, then the destination from where
/// the link joins it.
pub fn splice_link(origin: &Border, link: &Border, destination: &Border) -> Option<Border> {
    let link = link
        .extend_start_by(LINK_SPLICE_EXTENSION)
        .extend_end_by(LINK_SPLICE_EXTENSION);
    let enter = origin.intersection(&link)?;
    let exit = destination.intersection(&link)?;
    let head = origin.cut_by_point(enter, Piece::First);
    let middle = link
        .cut_by_point(enter, Piece::Last)
        .cut_by_point(exit, Piece::First);
    let tail = destination.cut_by_point(exit, Piece::Last);
    if !head.is_valid() || !middle.is_valid() || !tail.is_valid() {
        return None;
    }
    Some(head.concat(&middle).concat(&tail))
}

pub fn right_turn_guideway(
    ctx: &TurnContext,
    origin: &Lane,
    destination: &Lane,
) -> Option<Guideway> {
    let link = connected_link(ctx, origin).filter(|link| {
        link_destination(ctx, link)
            .map(|d| d.id == destination.id)
            .unwrap_or(false)
    });
    let border = |side: BorderSide| match link {
        Some(link) => splice_link(
            side.shaped_of(origin),
            side.shaped_of(link),
            side.of(destination),
        ),
        None => turn_border(ctx, origin, destination, side, 1.0, 1.0),
    };
    let left = border(BorderSide::Left)?;
    let right = border(BorderSide::Right)?;
    let median = border(BorderSide::Median)?;
    Some(Guideway::new(
        origin,
        destination,
        TurnDirection::Right,
        left,
        right,
        Some(median),
    ))
}
