//! Diagnostic findings
//!
//! A [`Finding`] references edges and vertices of the snapshot it was
//! produced from. [`Finding::to_record`] resolves those to OSM ids for
//! output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::network::{EdgeId, Network, VertexId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RoutingIsland,
    LonelyWay,
    StubEnd,
}

impl ErrorCode {
    pub const fn code(self) -> u32 {
        match self {
            ErrorCode::RoutingIsland => 55_000,
            ErrorCode::LonelyWay => 55_001,
            ErrorCode::StubEnd => 333_300_239,
        }
    }

    pub const fn default_severity(self) -> Severity {
        match self {
            ErrorCode::RoutingIsland => Severity::Other,
            ErrorCode::LonelyWay | ErrorCode::StubEnd => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Other,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Other => "OTHER",
        };
        f.write_str(s)
    }
}

/// Severity per error code, overridable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityTable {
    pub routing_island: Severity,
    pub lonely_way: Severity,
    pub stub_end: Severity,
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            routing_island: ErrorCode::RoutingIsland.default_severity(),
            lonely_way: ErrorCode::LonelyWay.default_severity(),
            stub_end: ErrorCode::StubEnd.default_severity(),
        }
    }
}

impl SeverityTable {
    pub fn get(&self, code: ErrorCode) -> Severity {
        match code {
            ErrorCode::RoutingIsland => self.routing_island,
            ErrorCode::LonelyWay => self.lonely_way,
            ErrorCode::StubEnd => self.stub_end,
        }
    }

    pub fn set(&mut self, code: ErrorCode, severity: Severity) {
        match code {
            ErrorCode::RoutingIsland => self.routing_island = severity,
            ErrorCode::LonelyWay => self.lonely_way = severity,
            ErrorCode::StubEnd => self.stub_end = severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub edges: Vec<EdgeId>,
    pub vertices: Vec<VertexId>,
}

impl Finding {
    pub fn new(code: ErrorCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            edges: Vec::new(),
            vertices: Vec::new(),
        }
    }

    pub fn with_edges(mut self, edges: Vec<EdgeId>) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_vertices(mut self, vertices: Vec<VertexId>) -> Self {
        self.vertices = vertices;
        self
    }

    pub fn to_record(&self, network: &Network) -> FindingRecord {
        FindingRecord {
            code: self.code.code(),
            kind: self.code,
            severity: self.severity,
            message: self.message.clone(),
            ways: self.edges.iter().map(|&e| network.edge(e).osm_id).collect(),
            nodes: self
                .vertices
                .iter()
                .map(|&v| network.vertex(v).osm_id)
                .collect(),
        }
    }
}

/// Output form of a [`Finding`] with OSM ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingRecord {
    pub code: u32,
    pub kind: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub ways: Vec<i64>,
    pub nodes: Vec<i64>,
}

impl fmt::Display for FindingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.severity, self.code, self.message)?;
        if !self.ways.is_empty() {
            let ways: Vec<String> = self.ways.iter().map(i64::to_string).collect();
            write!(f, " ways={}", ways.join(","))?;
        }
        if !self.nodes.is_empty() {
            let nodes: Vec<String> = self.nodes.iter().map(i64::to_string).collect();
            write!(f, " nodes={}", nodes.join(","))?;
        }
        Ok(())
    }
}
