//! PBF ingestion
//!
//! Reads nodes, routable ways (`highway` or `waterway`) and turn
//! restriction relations from an `.osm.pbf` extract into a [`Network`].
//! Every vertex outside the loaded bounds becomes a boundary vertex.

use std::path::Path;

use osmpbf::{Element, ElementReader, RelMemberType};

use crate::error::IslandsError;
use crate::network::{Bounds, MemberKind, Network, NetworkBuilder, RawMember, Tags};

struct PendingWay {
    id: i64,
    refs: Vec<i64>,
    tags: Tags,
}

fn is_routable_way(tags: &Tags) -> bool {
    tags.has("highway") || tags.has("waterway")
}

fn member_kind(kind: RelMemberType) -> MemberKind {
    match kind {
        RelMemberType::Node => MemberKind::Node,
        RelMemberType::Way => MemberKind::Way,
        RelMemberType::Relation => MemberKind::Relation,
    }
}

/// Load a network snapshot from a PBF file
pub fn load_pbf<P: AsRef<Path>>(path: P, bounds: &[Bounds]) -> Result<Network, IslandsError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IslandsError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }

    let reader = ElementReader::from_path(path)?;
    let mut builder = NetworkBuilder::new();
    let mut ways = Vec::new();
    let mut relations = Vec::new();

    reader.for_each(|element| match element {
        Element::Node(node) => {
            let tags: Tags = node.tags().collect();
            builder.add_vertex_with_tags(node.id(), node.lat(), node.lon(), tags);
        }
        Element::DenseNode(node) => {
            let tags: Tags = node.tags().collect();
            builder.add_vertex_with_tags(node.id(), node.lat(), node.lon(), tags);
        }
        Element::Way(way) => {
            let tags: Tags = way.tags().collect();
            if is_routable_way(&tags) {
                ways.push(PendingWay {
                    id: way.id(),
                    refs: way.refs().collect(),
                    tags,
                });
            }
        }
        Element::Relation(relation) => {
            let tags: Tags = relation.tags().collect();
            if !tags.is("type", "restriction") {
                return;
            }
            let members = relation
                .members()
                .map(|member| {
                    RawMember::new(
                        member.role().unwrap_or(""),
                        member_kind(member.member_type),
                        member.member_id,
                    )
                })
                .collect();
            relations.push((relation.id(), members, tags));
        }
    })?;

    let n_ways = ways.len();
    for way in ways {
        builder.add_edge(way.id, &way.refs, way.tags);
    }
    let n_relations = relations.len();
    for (id, members, tags) in relations {
        builder.add_relation(id, members, tags);
    }

    tracing::info!(
        nodes = builder.n_vertices(),
        ways = n_ways,
        edges = builder.n_edges(),
        restrictions = n_relations,
        "parsed PBF"
    );

    builder.mark_outside(bounds);
    Ok(builder.build())
}
