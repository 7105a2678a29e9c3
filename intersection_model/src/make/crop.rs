use std::collections::BTreeMap;

use abstutil::Tags;
use geom::{Circle, Distance, LonLat};
use raw_map::{NodeID, RawNode};

use crate::{Config, Path};

/// Cuts every path down to the part inside the crop circle. Nodes outside are dropped from the
/// path; the borders are cut exactly at the circle, and a synthetic node is added where the cut
/// is far from the last real node. Paths left shorter than the minimum element length vanish.
pub fn remove_elements_beyond_radius(
    paths: Vec<Path>,
    nodes: &mut BTreeMap<NodeID, RawNode>,
    center: LonLat,
    config: &Config,
) -> Vec<Path> {
    let circle = Circle::new(center, config.crop_radius);
    let mut result = Vec::new();
    for mut path in paths {
        let inside: Vec<NodeID> = path
            .nodes
            .iter()
            .filter(|id| {
                nodes
                    .get(id)
                    .map(|n| circle.contains_pt(n.pt))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        if inside.is_empty() {
            continue;
        }

        if inside.len() < path.nodes.len() {
            let left = circle.crop_border(&path.left_border, Distance::ZERO);
            let right = circle.crop_border(&path.right_border, Distance::ZERO);
            let (Some(left), Some(right)) = (left, right) else {
                debug!("{} has no borders left after cropping", path.id);
                continue;
            };
            let first_cut = path.nodes.first() != inside.first();
            let last_cut = path.nodes.last() != inside.last();
            path.left_border = left;
            path.right_border = right;
            path.nodes = inside;
            path.cropped = true;

            if last_cut {
                if let Some(pt) = cut_point(&path, true) {
                    add_synthetic_node(&mut path, nodes, pt, true, config);
                }
            }
            if first_cut {
                if let Some(pt) = cut_point(&path, false) {
                    add_synthetic_node(&mut path, nodes, pt, false, config);
                }
            }
        }

        if path.length() <= config.min_element_length {
            debug!("{} is too short after cropping", path.id);
            continue;
        }
        result.push(path);
    }
    result
}

/// Where the borders got cut. Unsplit streets use the middle of the two borders; pieces of a
/// split street use the left border.
fn cut_point(path: &Path, at_the_end: bool) -> Option<LonLat> {
    let pick = |b: &geom::Border| if at_the_end { b.last_pt() } else { b.first_pt() };
    let left = pick(&path.left_border)?;
    if path.tags.is("split", "no") {
        let right = pick(&path.right_border)?;
        Some(left.lerp(right, 0.5))
    } else {
        Some(left)
    }
}

fn add_synthetic_node(
    path: &mut Path,
    nodes: &mut BTreeMap<NodeID, RawNode>,
    pt: LonLat,
    at_the_end: bool,
    config: &Config,
) {
    let neighbor = if at_the_end {
        path.nodes.last()
    } else {
        path.nodes.first()
    };
    let Some(neighbor) = neighbor.and_then(|id| nodes.get(id)) else {
        return;
    };
    if neighbor.pt.gps_dist_meters(pt) <= config.synthetic_node_gap {
        return;
    }

    let id = next_synthetic_id(nodes);
    let mut node = RawNode::new(id, pt, Tags::empty());
    if path.has_name() {
        node.street_names.insert(path.name().to_string());
    }
    nodes.insert(id, node);
    if at_the_end {
        path.nodes.push(id);
    } else {
        path.nodes.insert(0, id);
    }
}

/// Synthetic nodes get negative ids, counting down from -1.
pub fn next_synthetic_id(nodes: &BTreeMap<NodeID, RawNode>) -> NodeID {
    let lowest = nodes.keys().next().map(|id| id.0).unwrap_or(0);
    NodeID(lowest.min(0) - 1)
}

/// Keeps the street paths that matter for this intersection: named paths of the street tuple
/// with usable borders, and links touching those streets.
pub fn clean_paths(
    paths: Vec<Path>,
    streets: &[String],
    nodes: &BTreeMap<NodeID, RawNode>,
) -> Vec<Path> {
    paths
        .into_iter()
        .filter(|p| {
            if p.nodes.len() < 2 || !p.left_border.is_valid() || !p.right_border.is_valid() {
                return false;
            }
            if streets.iter().any(|s| s == p.name()) {
                return true;
            }
            p.is_link()
                && p.nodes.iter().any(|id| {
                    nodes
                        .get(id)
                        .map(|n| n.street_names.iter().any(|s| streets.contains(s)))
                        .unwrap_or(false)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_ids_count_down() {
        let mut nodes = BTreeMap::new();
        let pt = LonLat::new(-121.95, 37.28);
        assert_eq!(next_synthetic_id(&nodes), NodeID(-1));
        nodes.insert(NodeID(5), RawNode::new(NodeID(5), pt, Tags::empty()));
        assert_eq!(next_synthetic_id(&nodes), NodeID(-1));
        nodes.insert(NodeID(-1), RawNode::new(NodeID(-1), pt, Tags::empty()));
        assert_eq!(next_synthetic_id(&nodes), NodeID(-2));
    }
}
