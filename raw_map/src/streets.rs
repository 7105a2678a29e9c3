use std::collections::BTreeSet;

use geom::{Distance, LonLat};

use crate::{NodeID, RawTopology, RawWay, NO_NAME};

/// Sorted street names meeting at one intersection.
pub type StreetTuple = Vec<String>;

/// A street tuple found by scanning shared nodes. Nearby distinct intersections sharing a node
/// can produce spurious extra groupings: a pair of streets that's also part of a larger tuple is
/// only a candidate. The heuristic is unverified for 4+-way junctions, so candidates are kept
/// and labeled instead of dropped.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntersectingStreets {
    Confirmed(StreetTuple),
    CandidateSubset(StreetTuple),
}

impl IntersectingStreets {
    pub fn streets(&self) -> &StreetTuple {
        match self {
            IntersectingStreets::Confirmed(x) => x,
            IntersectingStreets::CandidateSubset(x) => x,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, IntersectingStreets::Confirmed(_))
    }
}

impl RawTopology {
    /// Every group of two or more highway streets sharing a node, sorted by street names.
    pub fn intersecting_streets(&self) -> Vec<IntersectingStreets> {
        let valid = self.street_names();
        let mut found: BTreeSet<StreetTuple> = BTreeSet::new();
        for node in self.nodes.values() {
            if node.street_names.len() < 2 {
                continue;
            }
            if node.street_names.iter().all(|s| valid.contains(s)) {
                found.insert(node.street_names.iter().cloned().collect());
            }
        }

        let multiples: Vec<&StreetTuple> = found.iter().filter(|x| x.len() > 2).collect();
        found
            .iter()
            .map(|x| {
                if x.len() == 2
                    && multiples
                        .iter()
                        .any(|y| x.iter().all(|street| y.contains(street)))
                {
                    IntersectingStreets::CandidateSubset(x.clone())
                } else {
                    IntersectingStreets::Confirmed(x.clone())
                }
            })
            .collect()
    }
}

/// Nodes shared by every street in the tuple.
pub fn intersection_nodes(map: &RawTopology, streets: &[String]) -> BTreeSet<NodeID> {
    let mut result: Option<BTreeSet<NodeID>> = None;
    for street in streets {
        let nodes = map.nodes_of_street(street);
        result = Some(match result {
            Some(prev) => prev.intersection(&nodes).cloned().collect(),
            None => nodes,
        });
    }
    result.unwrap_or_default()
}

/// Only keeps nodes within `too_far` of the first one. Returns None for no input.
pub fn select_close_nodes(
    map: &RawTopology,
    nodes: &BTreeSet<NodeID>,
    too_far: Distance,
) -> Option<BTreeSet<NodeID>> {
    let first = map.pt(*nodes.iter().next()?)?;
    Some(
        nodes
            .iter()
            .filter(|id| {
                map.pt(**id)
                    .map(|pt| first.gps_dist_meters(pt) <= too_far)
                    .unwrap_or(false)
            })
            .cloned()
            .collect(),
    )
}

/// The mean position of the nodes.
pub fn center(map: &RawTopology, nodes: &BTreeSet<NodeID>) -> Option<LonLat> {
    let pts: Vec<LonLat> = nodes.iter().filter_map(|id| map.pt(*id)).collect();
    if pts.is_empty() {
        return None;
    }
    Some(LonLat::center(&pts))
}

/// Splits ways of the named streets at interior nodes where two or more of those streets meet,
/// so every piece either ends or starts at the junction. Ways of other streets pass through.
pub fn split_streets(map: &RawTopology, ways: Vec<RawWay>, streets: &[String]) -> Vec<RawWay> {
    let mut result = Vec::new();
    let mut queue = ways;
    while let Some(way) = queue.pop() {
        if way.name() == NO_NAME || !streets.iter().any(|s| s == way.name()) {
            result.push(way);
            continue;
        }
        let split_idx = way.nodes.iter().enumerate().position(|(i, id)| {
            if i == 0 || i + 1 == way.nodes.len() {
                return false;
            }
            map.nodes
                .get(id)
                .map(|n| n.street_names.iter().filter(|s| streets.contains(*s)).count() > 1)
                .unwrap_or(false)
        });
        match split_idx.and_then(|i| way.split_at(i)) {
            Some((a, b)) => {
                // A piece may still cross another of the streets further along
                queue.push(b);
                queue.push(a);
            }
            None => {
                let mut way = way;
                if !way.tags.contains_key("split") {
                    way.tags.insert("split", "no");
                }
                result.push(way);
            }
        }
    }
    result.sort_by_key(|w| w.id);
    result
}

/// Matches an address like "Solano and Pierce, Albany, California" against street tuples. Every
/// street fragment before the first comma must appear in the tuple's joined names.
pub fn match_street_tuples(
    candidates: &[IntersectingStreets],
    address: &str,
) -> BTreeSet<StreetTuple> {
    let fragments: Vec<&str> = address
        .split(',')
        .next()
        .unwrap_or("")
        .split(" and ")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if fragments.is_empty() {
        return BTreeSet::new();
    }
    candidates
        .iter()
        .filter(|x| x.is_confirmed())
        .map(|x| x.streets())
        .filter(|x| {
            let joined = x.join(" ");
            fragments.iter().all(|f| joined.contains(f))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use abstutil::Tags;

    use super::*;
    use crate::{RawNode, WayID};

    // Three streets: A runs east-west through node 2, B runs north-south through node 2, C
    // touches B at node 5 only. An unnamed service road also touches node 2.
    fn fixture() -> RawTopology {
        let mut map = RawTopology::blank("Test");
        let pts = [
            (1, -122.002, 37.0),
            (2, -122.0, 37.0),
            (3, -121.998, 37.0),
            (4, -122.0, 37.002),
            (5, -122.0, 36.998),
            (6, -121.998, 36.998),
            (7, -122.0, 36.999),
        ];
        for (id, lon, lat) in pts {
            map.nodes.insert(
                NodeID(id),
                RawNode::new(NodeID(id), LonLat::new(lon, lat), Tags::empty()),
            );
        }
        let ways = vec![
            (100, vec![1, 2, 3], "A Street", "primary"),
            (200, vec![4, 2, 7, 5], "B Street", "secondary"),
            (300, vec![5, 6], "C Street", "residential"),
        ];
        for (id, nodes, name, hwy) in ways {
            map.ways.insert(
                WayID(id),
                RawWay {
                    id: WayID(id),
                    nodes: nodes.into_iter().map(NodeID).collect(),
                    tags: vec![("name", name), ("highway", hwy)].into_iter().collect(),
                },
            );
        }
        map.ways.insert(
            WayID(400),
            RawWay {
                id: WayID(400),
                nodes: vec![NodeID(2), NodeID(6)],
                tags: vec![("highway", "service")].into_iter().collect(),
            },
        );
        map.annotate_street_names();
        map
    }

    fn tuple(names: &[&str]) -> StreetTuple {
        names.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn finds_intersections() {
        let map = fixture();
        let found = map.intersecting_streets();
        assert_eq!(
            found,
            vec![
                IntersectingStreets::Confirmed(tuple(&["A Street", "B Street"])),
                IntersectingStreets::Confirmed(tuple(&["B Street", "C Street"])),
            ]
        );
        assert!(map.nodes[&NodeID(2)].street_names.len() == 2);
    }

    #[test]
    fn pairs_inside_bigger_tuples_are_candidates() {
        let mut map = fixture();
        map.nodes
            .get_mut(&NodeID(5))
            .unwrap()
            .street_names
            .insert("A Street".to_string());
        let found = map.intersecting_streets();
        assert!(found.contains(&IntersectingStreets::Confirmed(tuple(&[
            "A Street", "B Street", "C Street"
        ]))));
        assert!(found.contains(&IntersectingStreets::CandidateSubset(tuple(&[
            "A Street", "B Street"
        ]))));
    }

    #[test]
    fn nodes_center_and_split() {
        let map = fixture();
        let streets = tuple(&["A Street", "B Street"]);
        let nodes = intersection_nodes(&map, &streets);
        assert_eq!(nodes, vec![NodeID(2)].into_iter().collect());
        let close = select_close_nodes(&map, &nodes, Distance::meters(50.0)).unwrap();
        assert_eq!(close, nodes);
        let c = center(&map, &close).unwrap();
        assert!(c.approx_eq(LonLat::new(-122.0, 37.0), Distance::meters(0.1)));

        let ways: Vec<RawWay> = map.ways.values().cloned().collect();
        let split = split_streets(&map, ways, &streets);
        // A and B split at node 2, C and the service road untouched
        assert_eq!(split.len(), 6);
        for way in &split {
            if way.name() == "A Street" || way.name() == "B Street" {
                assert!(way.tags.is("split", "yes"));
                assert!(way.nodes[0] == NodeID(2) || *way.nodes.last().unwrap() == NodeID(2));
            }
        }
        assert!(split.iter().any(|w| w.id == WayID(1001)));
        assert!(split.iter().any(|w| w.id == WayID(2002)));
    }

    #[test]
    fn addresses() {
        let found = fixture().intersecting_streets();
        let matched = match_street_tuples(&found, "A and B, Test, California");
        assert_eq!(matched.len(), 1);
        let matched = match_street_tuples(&found, "B, Test, California");
        assert_eq!(matched.len(), 2);
        assert!(match_street_tuples(&found, ", Test").is_empty());
    }
}
