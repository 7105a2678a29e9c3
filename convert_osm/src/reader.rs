use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;

use abstutil::Tags;
use geom::LonLat;
use raw_map::{NodeID, RawNode, RawTopology, RawWay, WayID};

// References to missing nodes are just filtered out. We assume elements come in order: nodes,
// then ways. Relations aren't used.

#[derive(Deserialize)]
struct OverpassResponse {
    elements: Vec<Element>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

/// Reads an Overpass-style JSON response: `{"elements": [...]}`.
pub fn read_overpass_json(name: &str, raw: &[u8]) -> Result<RawTopology> {
    let response: OverpassResponse =
        serde_json::from_slice(raw).context("parsing an Overpass response")?;
    let mut map = RawTopology::blank(name);
    let mut ways = Vec::new();
    for element in response.elements {
        match element {
            Element::Node { id, lat, lon, tags } => {
                insert_node(&mut map, NodeID(id), LonLat::new(lon, lat), clean_tags(tags))?;
            }
            Element::Way { id, nodes, tags } => {
                ways.push((WayID(id), nodes.into_iter().map(NodeID).collect(), tags));
            }
            Element::Other => {}
        }
    }
    // Overpass doesn't always honor the node-first ordering, so resolve ways at the end
    for (id, nodes, tags) in ways {
        insert_way(&mut map, id, nodes, clean_tags(tags))?;
    }
    finish(&mut map);
    Ok(map)
}

/// Reads an .osm XML file's contents.
pub fn read_osm_xml(name: &str, raw: &str) -> Result<RawTopology> {
    let tree = roxmltree::Document::parse(raw).context("parsing .osm XML")?;
    let mut map = RawTopology::blank(name);

    for obj in tree.descendants() {
        if !obj.is_element() {
            continue;
        }
        match obj.tag_name().name() {
            "node" => {
                let id = NodeID(parse_attr(&obj, "id")?);
                let pt = LonLat::new(parse_attr(&obj, "lon")?, parse_attr(&obj, "lat")?);
                insert_node(&mut map, id, pt, read_xml_tags(&obj))?;
            }
            "way" => {
                let id = WayID(parse_attr(&obj, "id")?);
                let mut nodes = Vec::new();
                for child in obj.children() {
                    if child.tag_name().name() == "nd" {
                        nodes.push(NodeID(parse_attr(&child, "ref")?));
                    }
                }
                insert_way(&mut map, id, nodes, read_xml_tags(&obj))?;
            }
            _ => {}
        }
    }
    finish(&mut map);
    Ok(map)
}

fn insert_node(map: &mut RawTopology, id: NodeID, pt: LonLat, tags: Tags) -> Result<()> {
    if map.nodes.contains_key(&id) {
        bail!("Duplicate {}, your input is corrupt", id);
    }
    map.nodes.insert(id, RawNode::new(id, pt, tags));
    Ok(())
}

fn insert_way(map: &mut RawTopology, id: WayID, nodes: Vec<NodeID>, tags: Tags) -> Result<()> {
    if map.ways.contains_key(&id) {
        bail!("Duplicate {}, your input is corrupt", id);
    }
    let before = nodes.len();
    // Just skip missing nodes
    let nodes: Vec<NodeID> = nodes
        .into_iter()
        .filter(|n| map.nodes.contains_key(n))
        .collect();
    if nodes.len() != before {
        debug!("{} references {} missing nodes", id, before - nodes.len());
    }
    if !nodes.is_empty() {
        map.ways.insert(id, RawWay { id, nodes, tags });
    }
    Ok(())
}

fn finish(map: &mut RawTopology) {
    map.annotate_street_names();
    info!(
        "{}: found {} nodes, {} ways",
        map.name,
        map.nodes.len(),
        map.ways.len()
    );
}

fn clean_tags(raw: BTreeMap<String, String>) -> Tags {
    raw.into_iter()
        .filter(|(k, _)| keep_tag(k))
        .collect()
}

fn read_xml_tags(obj: &roxmltree::Node) -> Tags {
    let mut tags = Tags::empty();
    for child in obj.children() {
        if child.tag_name().name() == "tag" {
            if let (Some(key), Some(value)) = (child.attribute("k"), child.attribute("v")) {
                if keep_tag(key) {
                    tags.insert(key, value);
                }
            }
        }
    }
    tags
}

// Filter out really useless data
fn keep_tag(key: &str) -> bool {
    !key.starts_with("tiger:") && !key.starts_with("old_name:")
}

fn parse_attr<T: std::str::FromStr>(obj: &roxmltree::Node, key: &str) -> Result<T> {
    let raw = obj
        .attribute(key)
        .with_context(|| format!("<{}> missing {}", obj.tag_name().name(), key))?;
    match raw.parse::<T>() {
        Ok(x) => Ok(x),
        Err(_) => bail!("<{}> has bad {}={}", obj.tag_name().name(), key, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overpass_json() {
        let raw = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 37.0, "lon": -122.0},
                {"type": "node", "id": 2, "lat": 37.001, "lon": -122.0,
                 "tags": {"highway": "traffic_signals", "tiger:cfcc": "A41"}},
                {"type": "way", "id": 10, "nodes": [1, 2, 3],
                 "tags": {"name": "Main Street", "highway": "primary"}},
                {"type": "relation", "id": 99, "members": []}
            ]
        }"#;
        let map = read_overpass_json("Test", raw.as_bytes()).unwrap();
        assert_eq!(map.nodes.len(), 2);
        assert_eq!(map.ways[&WayID(10)].nodes, vec![NodeID(1), NodeID(2)]);
        assert!(!map.nodes[&NodeID(2)].tags.contains_key("tiger:cfcc"));
        assert!(map.nodes[&NodeID(2)].is_traffic_signal());
        assert!(map.nodes[&NodeID(1)].street_names.contains("Main Street"));
    }

    #[test]
    fn duplicates_are_errors() {
        let raw = r#"{"elements": [
            {"type": "node", "id": 1, "lat": 37.0, "lon": -122.0},
            {"type": "node", "id": 1, "lat": 37.0, "lon": -122.0}
        ]}"#;
        assert!(read_overpass_json("Test", raw.as_bytes()).is_err());
    }

    #[test]
    fn osm_xml() {
        let raw = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <bounds minlat="36.9" minlon="-122.1" maxlat="37.1" maxlon="-121.9"/>
  <node id="1" lat="37.0" lon="-122.0"/>
  <node id="2" lat="37.001" lon="-122.0">
    <tag k="highway" v="stop"/>
  </node>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="name" v="Main Street"/>
    <tag k="highway" v="residential"/>
  </way>
</osm>"#;
        let map = read_osm_xml("Test", raw).unwrap();
        assert_eq!(map.nodes.len(), 2);
        assert!(map.nodes[&NodeID(2)].is_stop_sign());
        assert_eq!(map.ways[&WayID(10)].name(), "Main Street");
    }
}
