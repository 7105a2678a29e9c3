use std::collections::BTreeSet;

use raw_map::{NodeID, RawWay};

/// Splits railway ways at every interior node also used by a street, so tracks end where they
/// cross the road. Pieces that can't be split further are marked `split=no` unless they came
/// from a split.
pub fn split_railways(ways: Vec<RawWay>, street_nodes: &BTreeSet<NodeID>) -> Vec<RawWay> {
    let mut result = Vec::new();
    let mut queue = ways;
    while let Some(way) = queue.pop() {
        let split_idx = way.nodes.iter().enumerate().position(|(i, id)| {
            i > 0 && i + 1 < way.nodes.len() && street_nodes.contains(id)
        });
        match split_idx.and_then(|i| way.split_at(i)) {
            Some((a, b)) => {
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

#[cfg(test)]
mod tests {
    use abstutil::Tags;
    use raw_map::WayID;

    use super::*;

    #[test]
    fn splits_at_street_crossings() {
        let way = RawWay {
            id: WayID(7),
            nodes: vec![NodeID(1), NodeID(2), NodeID(3), NodeID(4), NodeID(5)],
            tags: vec![("railway", "rail")].into_iter().collect::<Tags>(),
        };
        let crossings: BTreeSet<NodeID> =
            vec![NodeID(2), NodeID(4), NodeID(5)].into_iter().collect();
        let pieces = split_railways(vec![way], &crossings);
        let ids: Vec<WayID> = pieces.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![WayID(71), WayID(721), WayID(722)]);
        assert_eq!(pieces[0].nodes, vec![NodeID(1), NodeID(2)]);
        assert_eq!(pieces[1].nodes, vec![NodeID(2), NodeID(3), NodeID(4)]);
        assert_eq!(pieces[2].nodes, vec![NodeID(4), NodeID(5)]);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|w| w.tags.is("split", "yes")));
        assert!(pieces.iter().all(|w| w.tags.is("original_id", "7")));
    }
}
