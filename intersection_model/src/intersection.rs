use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};

use abstio::{BlobStore, CityName, WorkQueue};
use abstutil::{deserialize_btreemap, serialize_btreemap, Counter};
use geom::{Distance, LonLat, Piece};
use raw_map::{NodeID, RawNode, RawTopology};

use crate::make::guideways::{
    bicycle_guideways, crosswalk_guideways, railway_guideways, vehicle_guideways,
};
use crate::make::{self, crop, crosswalks, railway, transit};
use crate::turns::TurnContext;
use crate::{
    blind_zones, conflicts, meta, BlindZone, Config, ConflictZone, Direction, Guideway,
    GuidewayID, GuidewayType, IntersectionMeta, Lane, LaneID, Path,
};

/// Everything known about one intersection: the raw nodes around it, the paths and lanes built
/// from them, and the guideways, conflicts and blind zones added by later stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionData {
    pub city: CityName,
    /// Sorted
    pub streets: Vec<String>,
    pub center: LonLat,
    pub crop_radius: Distance,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub nodes: BTreeMap<NodeID, RawNode>,

    pub paths: Vec<Path>,
    pub railways: Vec<Path>,
    pub footways: Vec<Path>,

    pub merged_lanes: Vec<Lane>,
    pub merged_tracks: Vec<Lane>,
    pub merged_cycleways: Vec<Lane>,
    pub crosswalks: Vec<Lane>,
    pub transit_stops: Vec<NodeID>,

    #[serde(default)]
    pub guideways: Vec<Guideway>,
    #[serde(default)]
    pub conflict_zones: Vec<ConflictZone>,
    #[serde(default)]
    pub blind_zones: Vec<BlindZone>,
    #[serde(rename = "meta_data", default)]
    pub meta: Option<IntersectionMeta>,

    pub config: Config,
}

impl IntersectionData {
    /// Builds the lane geometry of the intersection where all of `streets` meet. Guideways,
    /// conflicts, blind zones and meta are left for the later stages.
    pub fn new(
        city: CityName,
        streets: &[String],
        map: &RawTopology,
        config: Config,
    ) -> Result<IntersectionData> {
        let mut streets = streets.to_vec();
        streets.sort();
        streets.dedup();
        if streets.len() < 2 {
            bail!("An intersection needs at least 2 streets, not {:?}", streets);
        }
        info!("Building {:?} in {}", streets, city.describe());

        let mut map = map.clone();
        map.annotate_street_names();
        let shared = raw_map::intersection_nodes(&map, &streets);
        if shared.is_empty() {
            bail!("{:?} don't meet in {}", streets, map.name);
        }
        let close = raw_map::select_close_nodes(&map, &shared, config.node_selection_radius)
            .with_context(|| format!("selecting the nodes of {:?}", streets))?;
        let center = raw_map::center(&map, &close)
            .with_context(|| format!("finding the center of {:?}", streets))?;

        let street_ways = convert_osm::subset(&map, convert_osm::is_street, |_| false)
            .ways
            .into_values()
            .collect();
        let street_ways = raw_map::split_streets(&map, street_ways, &streets);
        let mut nodes = map.nodes.clone();

        let paths = make::prepare_paths(&street_ways, &mut nodes, center, &config);
        let paths = crop::clean_paths(paths, &streets, &nodes);
        if paths.is_empty() {
            bail!("No usable paths for {:?} in {}", streets, map.name);
        }
        info!("{} street paths", paths.len());
        let mut merged_lanes = make::merged_lanes(&paths, &nodes, &config);
        let mut merged_cycleways = make::merged_cycleways(&paths, &nodes, &config);
        info!(
            "{} merged lanes, {} merged cycleways",
            merged_lanes.len(),
            merged_cycleways.len()
        );

        let street_nodes: BTreeSet<NodeID> =
            paths.iter().flat_map(|p| p.nodes.iter().cloned()).collect();
        let rail_ways = convert_osm::subset(&map, convert_osm::is_railway, |_| false)
            .ways
            .into_values()
            .collect();
        let rail_ways = railway::split_railways(rail_ways, &street_nodes);
        let railways = make::prepare_paths(&rail_ways, &mut nodes, center, &config);
        let mut merged_tracks = make::merged_lanes(&railways, &nodes, &config);
        info!("{} railway paths, {} tracks", railways.len(), merged_tracks.len());

        let foot_ways: Vec<_> = convert_osm::subset(&map, convert_osm::is_footway, |_| false)
            .ways
            .into_values()
            .collect();
        let footways = make::prepare_paths(&foot_ways, &mut nodes, center, &config);
        let mut crosswalks: Vec<Lane> = footways
            .iter()
            .filter_map(|p| crosswalks::crosswalk_from_path(p, &config))
            .collect();
        let simulated = crosswalks::simulated_crosswalks(&merged_lanes, &crosswalks, &config);
        info!(
            "{} tagged crosswalks, {} simulated",
            crosswalks.len(),
            simulated.len()
        );
        crosswalks.extend(simulated);

        make::assign_lane_ids(vec![
            &mut merged_lanes,
            &mut merged_tracks,
            &mut merged_cycleways,
            &mut crosswalks,
        ]);
        for lanes in [
            &mut merged_lanes,
            &mut merged_tracks,
            &mut merged_cycleways,
            &mut crosswalks,
        ] {
            make::set_distance_to_center(lanes, center);
        }

        let transit_stops = transit::transit_stops(&nodes, center, config.crop_radius);

        // Only keep nodes something refers to, and whatever else is nearby
        let mut referenced: BTreeSet<NodeID> = transit_stops.iter().cloned().collect();
        for p in paths.iter().chain(railways.iter()).chain(footways.iter()) {
            referenced.extend(p.nodes.iter().cloned());
        }
        nodes.retain(|id, n| {
            referenced.contains(id) || center.gps_dist_meters(n.pt) <= config.crop_radius
        });

        let mut data = IntersectionData {
            city,
            streets,
            center,
            crop_radius: config.crop_radius,
            nodes,
            paths,
            railways,
            footways,
            merged_lanes,
            merged_tracks,
            merged_cycleways,
            crosswalks,
            transit_stops,
            guideways: Vec::new(),
            conflict_zones: Vec::new(),
            blind_zones: Vec::new(),
            meta: None,
            config,
        };
        data.add_lane_meta();
        Ok(data)
    }

    /// Runs every stage.
    pub fn build(
        city: CityName,
        streets: &[String],
        map: &RawTopology,
        config: Config,
    ) -> Result<IntersectionData> {
        let mut data = IntersectionData::new(city, streets, map, config)?;
        abstutil::time_it("guideways", || data.add_guideways());
        abstutil::time_it("conflict zones", || data.add_conflict_zones());
        abstutil::time_it("blind zones", || data.add_blind_zones());
        data.add_meta();
        Ok(data)
    }

    fn add_lane_meta(&mut self) {
        let timestamp = Utc::now();
        let metas: Vec<_> = self
            .merged_lanes
            .iter()
            .chain(self.merged_tracks.iter())
            .chain(self.merged_cycleways.iter())
            .map(|lane| {
                let stops = transit::stops_along(
                    lane,
                    &self.transit_stops,
                    &self.nodes,
                    self.config.transit_stop_distance,
                );
                meta::lane_meta(
                    lane,
                    &self.merged_lanes,
                    &self.crosswalks,
                    !stops.is_empty(),
                    timestamp,
                )
            })
            .collect();
        for (lane, meta) in self
            .merged_lanes
            .iter_mut()
            .chain(self.merged_tracks.iter_mut())
            .chain(self.merged_cycleways.iter_mut())
            .zip(metas)
        {
            lane.meta = Some(meta);
        }
    }

    /// Replaces the guideways with every movement through the intersection.
    pub fn add_guideways(&mut self) {
        let mut guideways = Vec::new();
        {
            let ctx = TurnContext::new(
                &self.merged_lanes,
                &self.merged_lanes,
                &self.config,
                self.center,
                &self.nodes,
            );
            guideways.extend(vehicle_guideways(&ctx));
        }
        {
            let ctx = TurnContext::new(
                &self.merged_cycleways,
                &self.merged_lanes,
                &self.config,
                self.center,
                &self.nodes,
            );
            guideways.extend(bicycle_guideways(&ctx));
        }
        {
            let ctx = TurnContext::new(
                &self.merged_tracks,
                &self.merged_tracks,
                &self.config,
                self.center,
                &self.nodes,
            );
            guideways.extend(railway_guideways(&ctx));
        }
        guideways.extend(crosswalk_guideways(&self.crosswalks));

        let mut counts = Counter::new();
        for g in &guideways {
            counts.inc(format!("{:?} {:?}", g.guideway_type, g.direction));
        }
        for (kind, count) in counts.borrow() {
            info!("{} guideways: {}", kind, count);
        }
        self.guideways = guideways;
        self.conflict_zones.clear();
        self.blind_zones.clear();
    }

    /// Replaces the conflict zones, and trims every guideway to its last conflict.
    pub fn add_conflict_zones(&mut self) {
        self.conflict_zones = conflicts::conflict_zones(&self.guideways);
        conflicts::set_reduced_borders(&mut self.guideways, &self.conflict_zones);
        info!("{} conflict zones", self.conflict_zones.len());
    }

    pub fn add_blind_zones(&mut self) {
        self.blind_zones = blind_zones::blind_zones(
            &self.guideways,
            &self.conflict_zones,
            self.config.blind_zone_far_distance,
        );
        info!("{} blind zones", self.blind_zones.len());
    }

    pub fn add_meta(&mut self) {
        self.meta = Some(meta::intersection_meta(
            &self.merged_lanes,
            &self.nodes,
            self.center,
            &self.config,
            Utc::now(),
        ));
    }

    pub fn all_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.merged_lanes
            .iter()
            .chain(self.merged_tracks.iter())
            .chain(self.merged_cycleways.iter())
            .chain(self.crosswalks.iter())
    }

    pub fn lane(&self, id: LaneID) -> Option<&Lane> {
        self.all_lanes().find(|l| l.id == id)
    }

    pub fn approaches(&self) -> impl Iterator<Item = &Lane> {
        self.all_lanes()
            .filter(|l| l.direction == Direction::ToIntersection)
    }

    pub fn exits(&self) -> impl Iterator<Item = &Lane> {
        self.all_lanes()
            .filter(|l| l.direction == Direction::FromIntersection)
    }

    pub fn guideway(&self, id: GuidewayID) -> Option<&Guideway> {
        self.guideways.iter().find(|g| g.id == id)
    }

    /// Guideways starting from the merged street lane with this approach id.
    pub fn guideways_by_approach(&self, approach_id: usize) -> Vec<&Guideway> {
        let lanes = self.lane_ids_with_approach(approach_id);
        self.guideways
            .iter()
            .filter(|g| lanes.contains(&g.origin_lane))
            .collect()
    }

    /// Guideways ending on the merged street lane with this approach id.
    pub fn guideways_by_exit(&self, approach_id: usize) -> Vec<&Guideway> {
        let lanes = self.lane_ids_with_approach(approach_id);
        self.guideways
            .iter()
            .filter(|g| lanes.contains(&g.destination_lane))
            .collect()
    }

    fn lane_ids_with_approach(&self, approach_id: usize) -> BTreeSet<LaneID> {
        self.merged_lanes
            .iter()
            .filter(|l| l.approach_id == approach_id)
            .map(|l| l.id)
            .collect()
    }

    pub fn guideways_by_type(&self, guideway_type: GuidewayType) -> Vec<&Guideway> {
        self.guideways
            .iter()
            .filter(|g| g.guideway_type == guideway_type)
            .collect()
    }

    /// Conflicts seen from this guideway, ordered along it.
    pub fn conflicts_for(&self, id: GuidewayID) -> Vec<&ConflictZone> {
        self.conflict_zones
            .iter()
            .filter(|z| z.guideway1 == id)
            .collect()
    }

    pub fn blind_zones_for(&self, viewer: GuidewayID) -> Vec<&BlindZone> {
        self.blind_zones
            .iter()
            .filter(|z| z.viewer == viewer)
            .collect()
    }

    /// A guideway cut at a fraction of its length, keeping the beginning or the end.
    pub fn get_reduced_guideway(
        &self,
        id: GuidewayID,
        relative: f64,
        keep: Piece,
    ) -> Option<Guideway> {
        self.guideway(id)?.cut(relative, keep)
    }

    pub fn key(&self) -> String {
        abstio::intersection_key(&self.city, &self.streets)
    }

    /// Stores the intersection under its key, which is returned.
    pub fn save(&self, store: &mut dyn BlobStore) -> Result<String> {
        let key = self.key();
        abstio::write_json(store, &key, self)?;
        info!("Saved {}", key);
        Ok(key)
    }

    pub fn load(
        store: &dyn BlobStore,
        city: &CityName,
        streets: &[String],
    ) -> Result<IntersectionData> {
        let mut streets = streets.to_vec();
        streets.sort();
        let key = abstio::intersection_key(city, &streets);
        abstio::read_json(store, &key).with_context(|| format!("loading {}", key))
    }

    /// Lanes, crosswalks, guideways, conflict and blind zones, each feature tagged with a
    /// `type` property.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::new();
        let mut push = |geometry: geojson::Geometry, props: Vec<(&str, serde_json::Value)>| {
            let mut feature = Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            };
            for (k, v) in props {
                feature.set_property(k, v);
            }
            features.push(feature);
        };

        for lane in self.all_lanes() {
            let Some(polygon) = lane.polygon() else {
                continue;
            };
            let kind = if lane.is_crosswalk() { "crosswalk" } else { "lane" };
            push(
                polygon.to_geojson(),
                vec![
                    ("type", kind.into()),
                    ("id", lane.id.0.into()),
                    ("name", lane.name.clone().into()),
                    ("lane_id", lane.index.to_string().into()),
                    ("lane_type", lane.lane_type.clone().into()),
                    ("direction", lane.direction.to_string().into()),
                ],
            );
        }
        for g in &self.guideways {
            push(
                g.median.to_geojson(),
                vec![
                    ("type", "guideway".into()),
                    ("id", g.id.0.into()),
                    ("guideway_type", format!("{:?}", g.guideway_type).into()),
                    ("direction", format!("{:?}", g.direction).into()),
                    ("name", g.name.clone().into()),
                ],
            );
        }
        for z in &self.conflict_zones {
            push(
                z.polygon.to_geojson(),
                vec![
                    ("type", "conflict_zone".into()),
                    ("id", z.id.clone().into()),
                    ("code", z.code.clone().into()),
                    ("priority", z.priority.into()),
                ],
            );
        }
        for z in &self.blind_zones {
            push(
                z.polygon.to_geojson(),
                vec![
                    ("type", "blind_zone".into()),
                    ("id", z.id.into()),
                    ("viewer", z.viewer.0.into()),
                    ("shadowed", z.shadowed.0.into()),
                    ("conflict_zone", z.conflict_zone.clone().into()),
                ],
            );
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    pub fn write_geojson_file(&self, path: &str) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.to_geojson())?;
        fs_err::write(path, contents)?;
        info!("Wrote {}", path);
        Ok(())
    }
}

/// Claims the next intersection row, builds it from the city's map, and stores the result.
/// Failures mark the row as an error instead of propagating. Returns the claimed row, if there
/// was one.
pub fn process_next(
    queue: &mut WorkQueue,
    store: &mut dyn BlobStore,
    city: &CityName,
    map: &RawTopology,
    config: &Config,
) -> Option<usize> {
    let id = queue.claim(Utc::now())?;
    let name = queue.get(id)?.name.clone();
    let result = (|| -> Result<String> {
        let streets: Vec<String> = name.split(" -x- ").map(|s| s.trim().to_string()).collect();
        let data = IntersectionData::build(city.clone(), &streets, map, config.clone())?;
        data.save(store)
    })();
    queue.finish(id, result, Utc::now());
    Some(id)
}
