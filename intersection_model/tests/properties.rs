mod common;

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use geom::{Border, Distance};
use intersection_model::turns::left_turn::is_left_turn_allowed;
use intersection_model::turns::right_turn::is_right_turn_allowed;
use intersection_model::turns::through::is_through_allowed;
use intersection_model::turns::TurnContext;
use intersection_model::{
    Config, Direction, GuidewayType, IntersectionData, Lane, LaneCounts, LaneIndex, LaneRole,
    TurnDirection,
};

use common::{at, city, streets};

fn build(map: &raw_map::RawTopology) -> IntersectionData {
    abstutil::logger::setup_for_tests();
    IntersectionData::build(
        city(),
        &streets(&["A Street", "B Street"]),
        map,
        Config::default(),
    )
    .unwrap()
}

fn fixtures() -> Vec<IntersectionData> {
    vec![
        build(&common::crossing_one_way_streets(false)),
        build(&common::crossing_one_way_streets(true)),
        build(&common::turn_lane_approach()),
        build(&common::slip_lane()),
    ]
}

#[test]
fn conflicts_are_symmetric() {
    for data in fixtures() {
        for z in &data.conflict_zones {
            assert_ne!(z.guideway1, z.guideway2);
            let g1 = data.guideway(z.guideway1).unwrap();
            let g2 = data.guideway(z.guideway2).unwrap();
            if g1.origin_path.is_some() {
                assert_ne!(g1.origin_path, g2.origin_path, "{}", z);
            }

            let mirror = data
                .conflict_zones
                .iter()
                .find(|other| other.guideway1 == z.guideway2 && other.guideway2 == z.guideway1)
                .unwrap_or_else(|| panic!("{} has no mirror", z));
            let (a1, a2) = (z.polygon.area_sq_meters(), mirror.polygon.area_sq_meters());
            assert!((a1 - a2).abs() <= 0.01 * a1.max(a2), "{} vs {}", a1, a2);
        }
    }
}

#[test]
fn lane_indexes_add_up() {
    for data in fixtures() {
        for lane in data.all_lanes() {
            if !matches!(
                lane.index.role,
                LaneRole::Left | LaneRole::Through | LaneRole::Right
            ) {
                continue;
            }
            assert_eq!(
                lane.index_from_left() + lane.index_from_right(),
                lane.counts.total() - 1,
                "{}",
                lane
            );
        }
    }
}

#[test]
fn blind_zones_stay_inside_the_shadowed_guideway() {
    for data in fixtures() {
        for zone in &data.blind_zones {
            let shadowed = data.guideway(zone.shadowed).unwrap().polygon().unwrap();
            let outside = zone
                .polygon
                .difference(&shadowed)
                .map(|p| p.area_sq_meters())
                .unwrap_or(0.0);
            assert!(outside < 0.05, "{} sq m of blind zone {} spill out", outside, zone.id);
        }
    }
}

#[test]
fn through_guideways_are_as_long_as_their_lanes() {
    let data = build(&common::crossing_one_way_streets(false));
    let through = data
        .guideways_by_type(GuidewayType::Drive)
        .into_iter()
        .filter(|g| g.direction == TurnDirection::Through)
        .collect::<Vec<_>>();
    assert!(!through.is_empty());
    for g in through {
        let origin = data.lane(g.origin_lane).unwrap();
        let destination = data.lane(g.destination_lane).unwrap();
        let expected = origin.median.length() + destination.median.length();
        assert!(
            (g.median.length() - expected).abs() < Distance::meters(0.1),
            "{} vs {}",
            g.median.length(),
            expected
        );
    }
}

#[test]
fn guideways_start_and_end_on_their_lanes() {
    // Tapered turn lanes start off their median, so only plain approaches here
    for data in [
        build(&common::crossing_one_way_streets(false)),
        build(&common::slip_lane()),
    ] {
        for g in data.guideways_by_type(GuidewayType::Drive) {
            let origin = data.lane(g.origin_lane).unwrap();
            let destination = data.lane(g.destination_lane).unwrap();
            assert!(g
                .median
                .first_pt()
                .unwrap()
                .approx_eq(origin.median.first_pt().unwrap(), Distance::meters(0.5)));
            assert!(g
                .median
                .last_pt()
                .unwrap()
                .approx_eq(destination.median.last_pt().unwrap(), Distance::meters(0.5)));
        }
    }
}

/// An eastbound approach lane at the given position from the left of a path.
fn synthetic_lane(index: LaneIndex, lane_type: &str, counts: LaneCounts, from_left: usize) -> Lane {
    let width = Distance::meters(3.0);
    let north = -3.0 * from_left as f64;
    let left = Border::new(vec![at(-100.0, north), at(0.0, north)]);
    let right = left.shift(width);
    let mut lane = Lane::new(
        index,
        lane_type,
        Direction::ToIntersection,
        left,
        right,
        width,
    );
    lane.name = "A Street".to_string();
    lane.counts = counts;
    lane
}

/// Turn lanes tagged with a single movement, next to trunk lanes on a street with at least two of
/// them, only ever allow that one movement. Untagged trunk lanes go straight, and the rightmost
/// one may also turn right when there's no dedicated right turn lane.
#[test]
fn single_movement_lanes_allow_one_turn() {
    let mut rng = XorShiftRng::seed_from_u64(42);
    let config = Config::default();
    let nodes = BTreeMap::new();
    for _ in 0..50 {
        let counts = LaneCounts {
            left: rng.gen_range(0..3),
            right: rng.gen_range(0..3),
            trunk: rng.gen_range(2..5),
        };
        let tag_trunk = rng.gen_bool(0.5);

        let mut lanes = Vec::new();
        let mut from_left = 0;
        for n in (1..=counts.left).rev() {
            lanes.push(synthetic_lane(LaneIndex::left(n), "left", counts, from_left));
            from_left += 1;
        }
        for n in (1..=counts.trunk).rev() {
            let lane_type = if tag_trunk { "through" } else { "" };
            lanes.push(synthetic_lane(LaneIndex::through(n), lane_type, counts, from_left));
            from_left += 1;
        }
        for n in (1..=counts.right).rev() {
            lanes.push(synthetic_lane(LaneIndex::right(n), "right", counts, from_left));
            from_left += 1;
        }

        let ctx = TurnContext::new(&lanes, &lanes, &config, at(0.0, 0.0), &nodes);
        for (idx, lane) in lanes.iter().enumerate() {
            assert_eq!(lane.index_from_left(), idx, "{:?} {}", counts, lane.index);
            let allowed = [
                is_through_allowed(lane),
                is_left_turn_allowed(lane),
                is_right_turn_allowed(&ctx, lane),
            ];
            let curb_lane =
                !tag_trunk && counts.right == 0 && lane.index == LaneIndex::through(1);
            assert_eq!(
                allowed.iter().filter(|x| **x).count(),
                if curb_lane { 2 } else { 1 },
                "{:?} {} {:?}",
                counts,
                lane.index,
                allowed
            );
        }
    }
}

#[test]
fn rightmost_untagged_lane_turns_right() {
    let config = Config::default();
    let nodes = BTreeMap::new();
    let counts = LaneCounts {
        left: 0,
        right: 0,
        trunk: 2,
    };
    let lanes = vec![
        synthetic_lane(LaneIndex::through(2), "", counts, 0),
        synthetic_lane(LaneIndex::through(1), "", counts, 1),
    ];
    let ctx = TurnContext::new(&lanes, &lanes, &config, at(0.0, 0.0), &nodes);
    assert!(!is_right_turn_allowed(&ctx, &lanes[0]));
    assert!(is_right_turn_allowed(&ctx, &lanes[1]));
    assert!(is_through_allowed(&lanes[1]));
    assert!(!is_left_turn_allowed(&lanes[1]));
}

#[test]
fn street_names_survive_a_round_trip() {
    let data = build(&common::turn_lane_approach());
    let raw = abstutil::to_json(&data.nodes).unwrap();
    let back: BTreeMap<raw_map::NodeID, raw_map::RawNode> =
        abstutil::from_json(raw.as_bytes()).unwrap();
    assert_eq!(back, data.nodes);
    let center = &back[&raw_map::NodeID(0)];
    assert_eq!(center.street_names.len(), 2);
    assert!(center.street_names.contains("A Street"));
}
