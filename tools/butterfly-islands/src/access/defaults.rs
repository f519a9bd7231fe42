//! Effective access of an edge
//!
//! Explicit tags are completed with defaults implied by the highway or
//! waterway classification, then expanded along the inheritance tree with
//! `forward:`/`backward:` layers applied on top of the plain layer.

use rayon::prelude::*;

use super::model::{AccessMap, AccessModel};
use crate::network::{Classification, Edge, EdgeId, Network};

/// Flattened mode → value map of one edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AccessState(AccessMap);

impl AccessState {
    pub fn get(&self, mode: &str) -> Option<&str> {
        self.0.get(mode).map(String::as_str)
    }

    /// True if `mode` has a positive value (absent counts as `no`)
    pub fn is_positive(&self, mode: &str) -> bool {
        AccessModel::is_positive(self.get(mode).unwrap_or("no"))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &AccessMap {
        &self.0
    }
}

fn set_default(tags: &mut AccessMap, key: &str, value: &str) {
    tags.entry(key.to_string())
        .or_insert_with(|| value.to_string());
}

fn apply_highway_defaults(tags: &mut AccessMap, highway: &str) {
    if tags.get("sidewalk").is_some_and(|v| v != "no") {
        set_default(tags, "foot", "yes");
    }
    if tags.iter().any(|(k, v)| k.contains("cycleway") && v != "no") {
        set_default(tags, "bicycle", "yes");
    }

    match highway {
        "residential" => {
            set_default(tags, "vehicle", "yes");
            set_default(tags, "foot", "yes");
            set_default(tags, "bicycle", "yes");
        }
        "service" | "unclassified" | "tertiary" | "tertiary_link" | "secondary"
        | "secondary_link" => {
            set_default(tags, "vehicle", "yes");
        }
        "primary" | "primary_link" => {
            set_default(tags, "vehicle", "yes");
            set_default(tags, "hgv", "yes");
        }
        "motorway" | "trunk" | "motorway_link" | "trunk_link" => {
            set_default(tags, "vehicle", "yes");
            set_default(tags, "bicycle", "no");
            set_default(tags, "foot", "no");
        }
        "steps" => {
            set_default(tags, "access", "no");
            set_default(tags, "foot", "yes");
        }
        "path" => {
            set_default(tags, "motor_vehicle", "no");
            set_default(tags, "emergency", "destination");
        }
        "footway" => {
            set_default(tags, "foot", "designated");
        }
        "bus_guideway" => {
            set_default(tags, "access", "no");
            set_default(tags, "bus", "designated");
        }
        "road" => {
            set_default(tags, "access", "no");
        }
        _ => {
            set_default(tags, "access", "yes");
        }
    }
}

fn apply_waterway_defaults(tags: &mut AccessMap, waterway: &str) {
    if waterway == "river" {
        set_default(tags, "boat", "yes");
    }
}

/// Direction layers; later layers override earlier ones
const DIRECTION_PREFIXES: [&str; 3] = ["", "forward:", "backward:"];

/// Compute the effective access of an edge
pub fn default_access(model: &AccessModel, edge: &Edge) -> AccessState {
    let mut tags: AccessMap = edge
        .tags
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    match edge.classification() {
        Classification::Highway => {
            let highway = edge.highway().unwrap_or_default().to_string();
            apply_highway_defaults(&mut tags, &highway);
        }
        Classification::Waterway => {
            let waterway = edge.waterway().unwrap_or_default().to_string();
            apply_waterway_defaults(&mut tags, &waterway);
        }
        Classification::Other => tags.clear(),
    }

    let mut state = AccessMap::new();
    for prefix in DIRECTION_PREFIXES {
        let layer: AccessMap = tags
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(prefix)
                    .filter(|mode| model.is_transport_mode(mode))
                    .map(|mode| (mode.to_string(), v.clone()))
            })
            .collect();
        if layer.is_empty() {
            continue;
        }
        for (mode, value) in model.expand_values(&layer) {
            if model.is_transport_mode(&mode) {
                state.insert(mode, value);
            }
        }
    }

    AccessState(state)
}

/// True if `mode` has a positive access value in `state`
pub fn is_accessible(state: &AccessState, mode: &str) -> bool {
    state.is_positive(mode)
}

/// Effective access of every edge in a network, indexed by [`EdgeId`]
///
/// Computed once per detector pass and shared read-only by all modes.
#[derive(Debug)]
pub struct AccessTable {
    states: Vec<AccessState>,
}

impl AccessTable {
    pub fn compute(model: &AccessModel, network: &Network) -> Self {
        let states = network
            .edge_ids()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|&id| default_access(model, network.edge(id)))
            .collect();
        Self { states }
    }

    pub fn state(&self, edge: EdgeId) -> &AccessState {
        &self.states[edge.index()]
    }

    /// Access value of `mode` on `edge`
    pub fn value(&self, edge: EdgeId, mode: &str) -> Option<&str> {
        self.states[edge.index()].get(mode)
    }

    pub fn is_accessible(&self, edge: EdgeId, mode: &str) -> bool {
        self.states[edge.index()].is_positive(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{NetworkBuilder, Tags};

    fn edge(tags: &[(&str, &str)]) -> Edge {
        let mut b = NetworkBuilder::new();
        b.add_vertex(1, 0.0, 0.0);
        b.add_vertex(2, 0.0, 0.001);
        b.add_edge(1, &[1, 2], Tags::from_pairs(tags));
        b.build().edge(EdgeId(0)).clone()
    }

    fn access(tags: &[(&str, &str)]) -> AccessState {
        default_access(&AccessModel::standard(), &edge(tags))
    }

    #[test]
    fn test_residential_defaults() {
        let state = access(&[("highway", "residential")]);
        assert!(state.is_positive("foot"));
        assert!(state.is_positive("bicycle"));
        assert!(state.is_positive("motorcar"));
        assert!(state.is_positive("hgv_articulated"));
        assert!(!state.is_positive("horse"));
        assert!(!state.is_positive("boat"));
    }

    #[test]
    fn test_motorway_defaults() {
        let state = access(&[("highway", "motorway")]);
        assert!(state.is_positive("motorcar"));
        assert!(!state.is_positive("bicycle"));
        assert!(!state.is_positive("foot"));
        assert_eq!(state.get("bicycle"), Some("no"));
    }

    #[test]
    fn test_explicit_tags_win_over_defaults() {
        let state = access(&[("highway", "motorway"), ("bicycle", "designated")]);
        assert!(state.is_positive("bicycle"));
        let state = access(&[("highway", "residential"), ("motor_vehicle", "no")]);
        assert!(!state.is_positive("motorcar"));
        assert!(state.is_positive("bicycle"));
    }

    #[test]
    fn test_sidewalk_and_cycleway() {
        let state = access(&[("highway", "secondary"), ("sidewalk", "both")]);
        assert!(state.is_positive("foot"));
        let state = access(&[("highway", "secondary"), ("sidewalk", "no")]);
        assert!(!state.is_positive("foot"));
        let state = access(&[("highway", "footway"), ("cycleway:right", "lane")]);
        assert!(state.is_positive("bicycle"));
        let state = access(&[("highway", "footway"), ("cycleway", "no")]);
        assert!(!state.is_positive("bicycle"));
    }

    #[test]
    fn test_special_highways() {
        let steps = access(&[("highway", "steps")]);
        assert!(steps.is_positive("foot"));
        assert!(!steps.is_positive("bicycle"));

        // Paths only get defaults for motorised traffic
        let path = access(&[("highway", "path")]);
        assert!(!path.is_positive("foot"));
        assert!(!path.is_positive("motorcar"));
        assert!(path.is_positive("emergency"));

        let guideway = access(&[("highway", "bus_guideway")]);
        assert!(guideway.is_positive("bus"));
        assert!(!guideway.is_positive("minibus"));

        let road = access(&[("highway", "road")]);
        assert!(!road.is_positive("foot"));

        let footway = access(&[("highway", "footway")]);
        assert_eq!(footway.get("foot"), Some("designated"));
        assert!(!footway.is_positive("bicycle"));
    }

    #[test]
    fn test_other_highway_open_to_all() {
        let track = access(&[("highway", "track")]);
        assert!(track.is_positive("foot"));
        assert!(track.is_positive("motorcar"));
        assert!(track.is_positive("boat"));
    }

    #[test]
    fn test_waterways() {
        let river = access(&[("waterway", "river")]);
        assert!(river.is_positive("boat"));
        assert!(river.is_positive("canoe"));
        assert!(!river.is_positive("ship"));
        assert!(!river.is_positive("foot"));

        let stream = access(&[("waterway", "stream")]);
        assert!(stream.is_empty());
    }

    #[test]
    fn test_unclassified_edge_has_no_access() {
        let state = access(&[("building", "yes"), ("access", "yes")]);
        assert!(state.is_empty());
        assert!(!is_accessible(&state, "foot"));
    }

    #[test]
    fn test_directional_layers_override() {
        let state = access(&[
            ("highway", "residential"),
            ("forward:bicycle", "no"),
        ]);
        assert_eq!(state.get("bicycle"), Some("no"));
        assert!(state.is_positive("foot"));

        let state = access(&[
            ("highway", "residential"),
            ("forward:vehicle", "no"),
            ("backward:bicycle", "yes"),
        ]);
        assert_eq!(state.get("bicycle"), Some("yes"));
        assert_eq!(state.get("motorcar"), Some("no"));
    }

    #[test]
    fn test_access_table() {
        let mut b = NetworkBuilder::new();
        b.add_vertex(1, 0.0, 0.0);
        b.add_vertex(2, 0.0, 0.001);
        b.add_edge(1, &[1, 2], Tags::from_pairs(&[("highway", "footway")]));
        b.add_edge(2, &[1, 2], Tags::from_pairs(&[("highway", "motorway")]));
        let network = b.build();
        let table = AccessTable::compute(&AccessModel::standard(), &network);
        assert!(table.is_accessible(EdgeId(0), "foot"));
        assert!(!table.is_accessible(EdgeId(0), "motorcar"));
        assert!(table.is_accessible(EdgeId(1), "motorcar"));
        assert_eq!(table.state(EdgeId(1)), &access(&[("highway", "motorway")]));
        assert_eq!(table.value(EdgeId(0), "foot"), Some("designated"));
        assert_eq!(table.value(EdgeId(1), "foot"), Some("no"));
    }
}
