//! Per-mode travel direction of an edge
//!
//! The plain `oneway` tag applies to every mode; `<mode>:forward` and
//! `<mode>:backward` refine it for one mode. Pedestrians ignore `oneway`
//! unless the edge is a footway or carries explicit foot direction tags.

use serde::Serialize;

use crate::access::{default_access, AccessModel, AccessState};
use crate::network::{Edge, VertexId};

/// Travel direction along the vertex order of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Oneway {
    /// Against the vertex order only
    Backward,
    /// Both directions
    Both,
    /// Along the vertex order only
    Forward,
}

impl Oneway {
    /// `-1`, `0` or `1`
    pub fn as_i8(self) -> i8 {
        match self {
            Oneway::Backward => -1,
            Oneway::Both => 0,
            Oneway::Forward => 1,
        }
    }
}

/// Direction from the plain `oneway` tag
pub fn plain_oneway(edge: &Edge) -> Oneway {
    match edge.tags.get_str("oneway") {
        Some("-1") | Some("reverse") => Oneway::Backward,
        Some("yes") | Some("true") | Some("1") | Some("on") => Oneway::Forward,
        _ => Oneway::Both,
    }
}

fn normalize(mode: Option<&str>) -> Option<&str> {
    mode.filter(|m| !m.trim().is_empty())
}

/// Direction in which `mode` may travel along `edge`.
///
/// Without a mode only the plain `oneway` tag counts and the result is
/// always `Some`. With a mode, `None` means the mode cannot travel the edge
/// in either direction.
pub fn oneway_direction(edge: &Edge, mode: Option<&str>) -> Option<Oneway> {
    let plain = plain_oneway(edge);
    let Some(mode) = normalize(mode) else {
        return Some(plain);
    };

    let forward_key = format!("{mode}:forward");
    let backward_key = format!("{mode}:backward");

    if mode == "foot"
        && edge.highway() != Some("footway")
        && !edge.tags.has("foot:forward")
        && !edge.tags.has("foot:backward")
    {
        return Some(Oneway::Both);
    }

    let forward = edge.tags.is(&forward_key, "yes")
        || (!edge.tags.has(&forward_key) && plain != Oneway::Backward);
    let backward = edge.tags.is(&backward_key, "yes")
        || (!edge.tags.has(&backward_key) && plain != Oneway::Forward);

    match (forward, backward) {
        (true, false) => Some(Oneway::Forward),
        (false, true) => Some(Oneway::Backward),
        (false, false) => None,
        (true, true) => Some(Oneway::Both),
    }
}

/// Vertex where `mode` enters `edge`, given its precomputed access state
pub fn entry_vertex_with(edge: &Edge, mode: Option<&str>, state: &AccessState) -> Option<VertexId> {
    let direction = oneway_direction(edge, mode)?;
    if let Some(mode) = normalize(mode) {
        if !state.is_positive(mode) {
            return None;
        }
    }
    Some(match direction {
        Oneway::Backward => edge.last(),
        _ => edge.first(),
    })
}

/// Vertex where `mode` leaves `edge`, given its precomputed access state
pub fn exit_vertex_with(edge: &Edge, mode: Option<&str>, state: &AccessState) -> Option<VertexId> {
    let direction = oneway_direction(edge, mode)?;
    if let Some(mode) = normalize(mode) {
        if !state.is_positive(mode) {
            return None;
        }
    }
    Some(match direction {
        Oneway::Backward => edge.first(),
        _ => edge.last(),
    })
}

/// Vertex where `mode` enters `edge`; `None` if the mode cannot use it
pub fn entry_vertex(model: &AccessModel, edge: &Edge, mode: Option<&str>) -> Option<VertexId> {
    entry_vertex_with(edge, mode, &default_access(model, edge))
}

/// Vertex where `mode` leaves `edge`; `None` if the mode cannot use it
pub fn exit_vertex(model: &AccessModel, edge: &Edge, mode: Option<&str>) -> Option<VertexId> {
    exit_vertex_with(edge, mode, &default_access(model, edge))
}
