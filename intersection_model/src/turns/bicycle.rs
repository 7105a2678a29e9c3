use geom::{Border, Distance, Piece};

use crate::turns::left_turn::left_turn_destinations;
use crate::turns::{BorderSide, TurnContext};
use crate::{Guideway, Lane, TurnDirection};

const CROSSING_EXTENSION: Distance = Distance::const_meters(300.0);

/// Cyclists turn left in two stages: straight across to the far corner, then straight across
/// the other street.
pub fn two_stage_left_destinations<'a>(ctx: &TurnContext<'a>, origin: &Lane) -> Vec<&'a Lane> {
    if !origin.is_cycleway() {
        return Vec::new();
    }
    left_turn_destinations(ctx, origin)
}

fn two_stage_border(origin: &Border, destination: &Border) -> Option<Border> {
    let first = origin.extend_end_to(CROSSING_EXTENSION);
    let second = destination.extend_start_to(CROSSING_EXTENSION);
    let corner = first.intersection(&second)?;
    let result = first
        .cut_by_point(corner, Piece::First)
        .concat(&second.cut_by_point(corner, Piece::Last));
    if result.is_valid() {
        Some(result)
    } else {
        None
    }
}

pub fn two_stage_left_guideway(origin: &Lane, destination: &Lane) -> Option<Guideway> {
    let border = |side: BorderSide| two_stage_border(side.of(origin), side.of(destination));
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

#[cfg(test)]
mod tests {
    use geom::LonLat;

    use super::*;
    use crate::{Direction, LaneIndex};

    #[test]
    fn square_corner() {
        let o = LonLat::new(-121.95, 37.28);
        let lane = |pts: Vec<(f64, f64)>, direction| {
            let left = Border::new(pts.into_iter().map(|(e, n)| o.offset_meters(e, n)).collect());
            let right = left.shift(Distance::meters(1.0));
            let mut lane = Lane::new(
                LaneIndex::bicycle(),
                "cycleway",
                direction,
                left,
                right,
                Distance::meters(1.0),
            );
            lane.bearing = lane.median.bearing();
            lane
        };
        // Eastbound ending west of the center, then northbound starting north of it
        let origin = lane(vec![(-80.0, 0.0), (-10.0, 0.0)], Direction::ToIntersection);
        let destination = lane(vec![(5.0, 10.0), (5.0, 80.0)], Direction::FromIntersection);
        let g = two_stage_left_guideway(&origin, &destination).unwrap();
        assert_eq!(g.direction, TurnDirection::Left);
        // The left border goes through the corner at (5, 0)
        let corner = o.offset_meters(5.0, 0.0);
        assert!(g
            .left_border
            .points()
            .iter()
            .any(|pt| pt.approx_eq(corner, Distance::meters(0.1))));
        assert_eq!(g.left_border.num_pts(), 3);
    }
}
