//! Read-only network snapshot
//!
//! Vertices, edges and relations live in flat arenas and reference each
//! other by index (`VertexId`, `EdgeId`, `RelationId`). The reverse
//! relations needed by the detector (vertex → referring edges, edge →
//! parent relations) are precomputed when the snapshot is built, so the
//! snapshot is immutable and can be shared across worker threads.

mod builder;
mod spatial;
mod tags;

use std::fmt;
use std::str::FromStr;

use crate::error::IslandsError;

pub use builder::{MemberKind, NetworkBuilder, RawMember};
pub use spatial::SpatialIndex;
pub use tags::Tags;

/// Index of a vertex in a [`Network`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Index of an edge in a [`Network`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Index of a relation in a [`Network`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(pub u32);

macro_rules! impl_index {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

impl_index!(VertexId, EdgeId, RelationId);

#[derive(Debug, Clone)]
pub struct Vertex {
    pub osm_id: i64,
    pub lat: f64,
    pub lon: f64,
    /// Outside the loaded area: a connection to the rest of the network
    pub outside: bool,
    pub tags: Tags,
}

/// What kind of network an edge belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Highway,
    Waterway,
    Other,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub osm_id: i64,
    /// Ordered vertices; at least two, no zero-length segments
    pub vertices: Vec<VertexId>,
    pub tags: Tags,
}

impl Edge {
    pub fn first(&self) -> VertexId {
        self.vertices[0]
    }

    pub fn last(&self) -> VertexId {
        self.vertices[self.vertices.len() - 1]
    }

    /// First and last vertex coincide and the ring has at least 3 vertices
    pub fn is_closed(&self) -> bool {
        self.vertices.len() > 2 && self.first() == self.last()
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    pub fn highway(&self) -> Option<&str> {
        self.tags.get_str("highway")
    }

    pub fn waterway(&self) -> Option<&str> {
        self.tags.get_str("waterway")
    }

    pub fn classification(&self) -> Classification {
        if self.tags.has("highway") {
            Classification::Highway
        } else if self.tags.has("waterway") {
            Classification::Waterway
        } else {
            Classification::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRef {
    Vertex(VertexId),
    Edge(EdgeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub role: String,
    pub target: MemberRef,
}

#[derive(Debug, Clone)]
pub struct Relation {
    pub osm_id: i64,
    pub members: Vec<Member>,
    pub tags: Tags,
}

impl Relation {
    /// Edges that appear with `role`
    pub fn edges_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = EdgeId> + 'a {
        self.members.iter().filter_map(move |m| match m.target {
            MemberRef::Edge(edge) if m.role == role => Some(edge),
            _ => None,
        })
    }
}

/// Geographic bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

impl FromStr for Bounds {
    type Err = IslandsError;

    /// Parse `min_lat,min_lon,max_lat,max_lon`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IslandsError::InvalidBounds(s.to_string());
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        let [min_lat, min_lon, max_lat, max_lon] = parts[..] else {
            return Err(invalid());
        };
        if min_lat > max_lat || min_lon > max_lon {
            return Err(invalid());
        }
        Ok(Bounds::new(min_lat, min_lon, max_lat, max_lon))
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

/// Immutable graph snapshot shared by all analysis passes
#[derive(Debug)]
pub struct Network {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    relations: Vec<Relation>,
    /// vertex → edges that contain it (each edge listed once)
    referrers: Vec<Vec<EdgeId>>,
    /// edge → relations that list it as a member
    edge_relations: Vec<Vec<RelationId>>,
    spatial: SpatialIndex,
}

impl Network {
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    pub fn relation(&self, id: RelationId) -> &Relation {
        &self.relations[id.index()]
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn n_relations(&self) -> usize {
        self.relations.len()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(|i| EdgeId(i as u32))
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(|i| VertexId(i as u32))
    }

    pub fn relation_ids(&self) -> impl Iterator<Item = RelationId> + '_ {
        (0..self.relations.len()).map(|i| RelationId(i as u32))
    }

    /// Edges containing `vertex`
    pub fn referrers(&self, vertex: VertexId) -> &[EdgeId] {
        &self.referrers[vertex.index()]
    }

    /// Relations listing `edge` as a member
    pub fn relations_of(&self, edge: EdgeId) -> &[RelationId] {
        &self.edge_relations[edge.index()]
    }

    pub fn is_outside(&self, vertex: VertexId) -> bool {
        self.vertices[vertex.index()].outside
    }

    #[cfg(test)]
    pub fn edge_by_osm_id(&self, osm_id: i64) -> Option<EdgeId> {
        self.edges
            .iter()
            .position(|e| e.osm_id == osm_id)
            .map(|i| EdgeId(i as u32))
    }

    pub fn vertex_by_osm_id(&self, osm_id: i64) -> Option<VertexId> {
        self.vertices
            .iter()
            .position(|v| v.osm_id == osm_id)
            .map(|i| VertexId(i as u32))
    }

    /// Vertices inside `bounds`, ascending
    pub fn vertices_in(&self, bounds: &Bounds) -> Vec<VertexId> {
        let mut found = self.spatial.within(bounds);
        found.sort_unstable();
        found
    }

    /// Edges with at least one vertex inside `bounds`, ascending
    pub fn edges_in(&self, bounds: &Bounds) -> Vec<EdgeId> {
        let mut found: Vec<EdgeId> = self
            .spatial
            .within(bounds)
            .into_iter()
            .flat_map(|v| self.referrers(v).iter().copied())
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}
