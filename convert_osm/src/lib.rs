//! Turns raw OpenStreetMap extracts (Overpass JSON or .osm XML) into a `RawTopology`, and slices
//! that topology into the layers the intersection model consumes.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use anyhow::Result;

use raw_map::RawTopology;

pub use self::filter::{is_footway, is_railway, is_street, is_transit_stop, subset, NetworkType};
pub use self::reader::{read_osm_xml, read_overpass_json};

mod filter;
mod reader;

/// Loads a city from a file, picking the parser by extension.
pub fn load(path: &str, name: &str) -> Result<RawTopology> {
    let raw = fs_err::read(path)?;
    if path.ends_with(".osm") || path.ends_with(".xml") {
        read_osm_xml(name, std::str::from_utf8(&raw)?)
    } else {
        read_overpass_json(name, &raw)
    }
}
