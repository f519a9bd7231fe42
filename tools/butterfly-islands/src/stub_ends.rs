//! Stub end detection
//!
//! Looks for very short dangling ends on highways: the run of vertices from
//! an open end up to the first vertex where another highway connects. A run
//! shorter than the configured limit is usually a digitising slip.
//!
//! An end vertex tagged `noexit=yes` is never reported; other `noexit`
//! values (`no`, `fixme`, ...) do not stop the check.

use geo::{Distance, Haversine, Point};
use rayon::prelude::*;

use crate::config::DetectorConfig;
use crate::finding::{ErrorCode, Finding};
use crate::network::{Edge, EdgeId, Network, VertexId};

/// Highway values the check never looks at
pub const BAD_HIGHWAYS: [&str; 2] = ["services", "rest_area"];

fn is_checked_highway(edge: &Edge) -> bool {
    edge.highway().is_some_and(|h| !BAD_HIGHWAYS.contains(&h))
}

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = Point::new(lon1, lat1);
    let p2 = Point::new(lon2, lat2);
    Haversine::distance(p1, p2)
}

/// Dangling run at one end of an edge
#[derive(Debug, Clone, PartialEq)]
pub struct StubEnd {
    pub edge: EdgeId,
    /// Meters from the open end to the first connection
    pub length_m: f64,
    /// Vertices of the run, starting at the open end
    pub vertices: Vec<VertexId>,
}

pub struct StubEndDetector<'a> {
    config: &'a DetectorConfig,
}

impl<'a> StubEndDetector<'a> {
    pub fn new(config: &'a DetectorConfig) -> Self {
        Self { config }
    }

    /// Findings for every stub end, ascending by edge, first end first
    pub fn run(&self, network: &Network) -> Vec<Finding> {
        let severity = self.config.severity.get(ErrorCode::StubEnd);
        self.stub_ends(network)
            .into_iter()
            .map(|stub| {
                Finding::new(
                    ErrorCode::StubEnd,
                    severity,
                    format!("Stub end ({}m)", stub.length_m.round() as i64),
                )
                .with_edges(vec![stub.edge])
                .with_vertices(stub.vertices)
            })
            .collect()
    }

    pub fn stub_ends(&self, network: &Network) -> Vec<StubEnd> {
        let ids: Vec<EdgeId> = network.edge_ids().collect();
        let stubs: Vec<StubEnd> = ids
            .par_iter()
            .flat_map_iter(|&id| self.check_edge(network, id))
            .collect();
        tracing::debug!(stub_ends = stubs.len(), "stub end check complete");
        stubs
    }

    fn check_edge(&self, network: &Network, id: EdgeId) -> Vec<StubEnd> {
        let edge = network.edge(id);
        if !is_checked_highway(edge) || edge.is_closed() {
            return Vec::new();
        }

        let forward = edge.vertices.iter().copied();
        let backward = edge.vertices.iter().rev().copied();
        [
            distance_to_connection(network, id, forward),
            distance_to_connection(network, id, backward),
        ]
        .into_iter()
        .flatten()
        .filter(|(length, vertices)| {
            *length < self.config.stub_end_max_length_m && !vertices.is_empty()
        })
        .map(|(length_m, vertices)| StubEnd {
            edge: id,
            length_m,
            vertices,
        })
        .collect()
    }
}

/// Other checked highways meeting `edge` at `vertex`
fn has_connection(network: &Network, vertex: VertexId, edge: EdgeId) -> bool {
    network
        .referrers(vertex)
        .iter()
        .any(|&other| other != edge && is_checked_highway(network.edge(other)))
}

/// Walk `order` from its first vertex until another highway connects.
///
/// Returns `None` when the end is tagged `noexit=yes` or lies outside the
/// extract.
fn distance_to_connection(
    network: &Network,
    edge: EdgeId,
    mut order: impl Iterator<Item = VertexId>,
) -> Option<(f64, Vec<VertexId>)> {
    let mut previous = order.next()?;
    let start = network.vertex(previous);
    if start.tags.is("noexit", "yes") || start.outside {
        return None;
    }

    let mut distance = 0.0;
    let mut run = Vec::new();
    for vertex in order {
        if has_connection(network, previous, edge) {
            break;
        }
        run.push(previous);
        let (a, b) = (network.vertex(previous), network.vertex(vertex));
        distance += haversine_distance(a.lat, a.lon, b.lat, b.lon);
        previous = vertex;
    }
    Some((distance, run))
}
