//! Incremental construction of a [`Network`] from OSM primitives
//!
//! Primitives are added with their OSM ids; the builder resolves references
//! to arena indices, drops what cannot be resolved and precomputes the
//! reverse relations on [`NetworkBuilder::build`].

use rustc_hash::FxHashMap;

use super::{
    Bounds, Edge, EdgeId, Member, MemberRef, Network, Relation, RelationId, SpatialIndex, Tags,
    Vertex, VertexId,
};
use super::spatial::IndexedPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

/// Relation member as read from OSM, before id resolution
#[derive(Debug, Clone)]
pub struct RawMember {
    pub role: String,
    pub kind: MemberKind,
    pub ref_id: i64,
}

impl RawMember {
    pub fn new(role: &str, kind: MemberKind, ref_id: i64) -> Self {
        Self {
            role: role.to_string(),
            kind,
            ref_id,
        }
    }
}

struct PendingRelation {
    osm_id: i64,
    members: Vec<RawMember>,
    tags: Tags,
}

#[derive(Default)]
pub struct NetworkBuilder {
    vertices: Vec<Vertex>,
    vertex_index: FxHashMap<i64, VertexId>,
    edges: Vec<Edge>,
    edge_index: FxHashMap<i64, EdgeId>,
    relations: Vec<PendingRelation>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, osm_id: i64, lat: f64, lon: f64) -> VertexId {
        self.add_vertex_with_tags(osm_id, lat, lon, Tags::new())
    }

    /// Add a vertex; a repeated OSM id keeps the first occurrence
    pub fn add_vertex_with_tags(&mut self, osm_id: i64, lat: f64, lon: f64, tags: Tags) -> VertexId {
        if let Some(&existing) = self.vertex_index.get(&osm_id) {
            tracing::trace!(osm_id, "duplicate node, keeping first occurrence");
            return existing;
        }
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex {
            osm_id,
            lat,
            lon,
            outside: false,
            tags,
        });
        self.vertex_index.insert(osm_id, id);
        id
    }

    pub fn vertex_id(&self, osm_id: i64) -> Option<VertexId> {
        self.vertex_index.get(&osm_id).copied()
    }

    /// Flag a vertex as a connection to the network outside the loaded area
    pub fn set_outside(&mut self, osm_id: i64, outside: bool) {
        if let Some(&id) = self.vertex_index.get(&osm_id) {
            self.vertices[id.index()].outside = outside;
        }
    }

    /// Flag every vertex outside all of `bounds`
    pub fn mark_outside(&mut self, bounds: &[Bounds]) {
        if bounds.is_empty() {
            return;
        }
        for vertex in &mut self.vertices {
            vertex.outside = !bounds.iter().any(|b| b.contains(vertex.lat, vertex.lon));
        }
    }

    /// Add an edge over node ids.
    ///
    /// Unknown node ids are skipped and consecutive repeats collapsed. Edges
    /// left with fewer than two vertices are dropped and `None` is returned.
    pub fn add_edge(&mut self, osm_id: i64, node_refs: &[i64], tags: Tags) -> Option<EdgeId> {
        if self.edge_index.contains_key(&osm_id) {
            tracing::trace!(osm_id, "duplicate way, keeping first occurrence");
            return None;
        }

        let mut vertices: Vec<VertexId> = Vec::with_capacity(node_refs.len());
        for &node in node_refs {
            let Some(&vertex) = self.vertex_index.get(&node) else {
                tracing::trace!(way = osm_id, node, "way references unknown node");
                continue;
            };
            if vertices.last() == Some(&vertex) {
                tracing::trace!(way = osm_id, node, "collapsing zero-length segment");
                continue;
            }
            vertices.push(vertex);
        }

        if vertices.len() < 2 {
            tracing::trace!(way = osm_id, "dropping way with fewer than two vertices");
            return None;
        }

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            osm_id,
            vertices,
            tags,
        });
        self.edge_index.insert(osm_id, id);
        Some(id)
    }

    /// Queue a relation; members are resolved on [`build`](Self::build)
    pub fn add_relation(&mut self, osm_id: i64, members: Vec<RawMember>, tags: Tags) {
        self.relations.push(PendingRelation {
            osm_id,
            members,
            tags,
        });
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    fn resolve_member(&self, relation: i64, member: &RawMember) -> Option<Member> {
        let target = match member.kind {
            MemberKind::Node => self.vertex_index.get(&member.ref_id).map(|&v| MemberRef::Vertex(v)),
            MemberKind::Way => self.edge_index.get(&member.ref_id).map(|&e| MemberRef::Edge(e)),
            MemberKind::Relation => {
                tracing::trace!(relation, member = member.ref_id, "skipping nested relation member");
                return None;
            }
        };
        if target.is_none() {
            tracing::trace!(relation, member = member.ref_id, "relation member not loaded");
        }
        target.map(|target| Member {
            role: member.role.clone(),
            target,
        })
    }

    pub fn build(self) -> Network {
        let relations: Vec<Relation> = self
            .relations
            .iter()
            .map(|pending| Relation {
                osm_id: pending.osm_id,
                members: pending
                    .members
                    .iter()
                    .filter_map(|m| self.resolve_member(pending.osm_id, m))
                    .collect(),
                tags: pending.tags.clone(),
            })
            .collect();

        let mut referrers: Vec<Vec<EdgeId>> = vec![Vec::new(); self.vertices.len()];
        for (i, edge) in self.edges.iter().enumerate() {
            let id = EdgeId(i as u32);
            for &v in &edge.vertices {
                let list = &mut referrers[v.index()];
                if list.last() != Some(&id) && !list.contains(&id) {
                    list.push(id);
                }
            }
        }

        let mut edge_relations: Vec<Vec<RelationId>> = vec![Vec::new(); self.edges.len()];
        for (i, relation) in relations.iter().enumerate() {
            let id = RelationId(i as u32);
            for member in &relation.members {
                if let MemberRef::Edge(edge) = member.target {
                    let list = &mut edge_relations[edge.index()];
                    if !list.contains(&id) {
                        list.push(id);
                    }
                }
            }
        }

        let points = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| IndexedPoint {
                coords: [v.lon, v.lat],
                vertex: VertexId(i as u32),
            })
            .collect();

        tracing::debug!(
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            relations = relations.len(),
            "network snapshot built"
        );

        Network {
            vertices: self.vertices,
            edges: self.edges,
            relations,
            referrers,
            edge_relations,
            spatial: SpatialIndex::build(points),
        }
    }
}
