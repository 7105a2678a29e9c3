use std::collections::HashSet;

use crate::turns::{bicycle, left_turn, right_turn, through, u_turn, TurnContext};
use crate::{Guideway, Lane, TurnDirection};

/// Every movement out of the vehicle lanes: through, left, right and U-turns.
pub fn vehicle_guideways(ctx: &TurnContext) -> Vec<Guideway> {
    let mut result = Vec::new();
    for origin in ctx.lanes {
        if through::is_through_allowed(origin) {
            match through::through_destination(ctx, origin) {
                Some(dest) => result.push(through::through_guideway(origin, dest)),
                None => debug!("No through destination for {}", origin),
            }
        }
        if left_turn::is_left_turn_allowed(origin) {
            for dest in left_turn::left_turn_destinations(ctx, origin) {
                keep(
                    &mut result,
                    left_turn::left_turn_guideway(ctx, origin, dest),
                    TurnDirection::Left,
                    origin,
                    dest,
                );
            }
        }
        if right_turn::is_right_turn_allowed(ctx, origin) {
            for dest in right_turn::right_turn_destinations(ctx, origin) {
                keep(
                    &mut result,
                    right_turn::right_turn_guideway(ctx, origin, dest),
                    TurnDirection::Right,
                    origin,
                    dest,
                );
            }
        }
        if u_turn::is_u_turn_allowed(ctx, origin) {
            for dest in u_turn::u_turn_destinations(ctx, origin) {
                keep(
                    &mut result,
                    u_turn::u_turn_guideway(ctx, origin, dest),
                    TurnDirection::UTurn,
                    origin,
                    dest,
                );
            }
        }
    }
    ensure_unique(result)
}

/// Bicycles go straight, turn right like cars, and turn left in two stages.
pub fn bicycle_guideways(ctx: &TurnContext) -> Vec<Guideway> {
    let mut result = Vec::new();
    for origin in ctx.lanes.iter().filter(|l| l.is_cycleway()) {
        if through::is_through_allowed(origin) {
            if let Some(dest) = through::through_destination(ctx, origin) {
                result.push(through::through_guideway(origin, dest));
            }
        }
        if right_turn::is_right_turn_allowed(ctx, origin) {
            for dest in right_turn::right_turn_destinations(ctx, origin) {
                keep(
                    &mut result,
                    right_turn::right_turn_guideway(ctx, origin, dest),
                    TurnDirection::Right,
                    origin,
                    dest,
                );
            }
        }
        for dest in bicycle::two_stage_left_destinations(ctx, origin) {
            keep(
                &mut result,
                bicycle::two_stage_left_guideway(origin, dest),
                TurnDirection::Left,
                origin,
                dest,
            );
        }
    }
    ensure_unique(result)
}

/// Trains only go straight.
pub fn railway_guideways(ctx: &TurnContext) -> Vec<Guideway> {
    let result = ctx
        .lanes
        .iter()
        .filter(|l| l.is_rail() && through::is_through_allowed(l))
        .filter_map(|origin| {
            through::through_destination(ctx, origin)
                .map(|dest| through::through_guideway(origin, dest))
        })
        .collect();
    ensure_unique(result)
}

/// A crosswalk is its own guideway, in no particular direction.
pub fn crosswalk_guideways(crosswalks: &[Lane]) -> Vec<Guideway> {
    let result = crosswalks
        .iter()
        .map(|cw| {
            Guideway::new(
                cw,
                cw,
                TurnDirection::Undefined,
                cw.left_border.clone(),
                cw.right_border.clone(),
                Some(cw.median.clone()),
            )
        })
        .collect();
    ensure_unique(result)
}

fn keep(
    result: &mut Vec<Guideway>,
    guideway: Option<Guideway>,
    direction: TurnDirection,
    origin: &Lane,
    destination: &Lane,
) {
    match guideway {
        Some(g) => result.push(g),
        None => warn!(
            "Couldn't build the {:?} guideway from {} to {}",
            direction, origin, destination
        ),
    }
}

fn ensure_unique(guideways: Vec<Guideway>) -> Vec<Guideway> {
    let mut ids = HashSet::new();
    let mut keep = Vec::new();
    for g in guideways {
        if ids.contains(&g.id) {
            warn!("Duplicate guideway {}", g.id);
        } else {
            ids.insert(g.id);
            keep.push(g);
        }
    }
    keep
}
