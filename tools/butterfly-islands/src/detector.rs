//! Routing island detection
//!
//! A detector pass runs in three phases over one immutable snapshot:
//!
//! 1. **Collecting**: classify routable edges (in parallel) into highway and
//!    waterway candidate pools, reporting lonely ways on the way.
//! 2. **Per-mode analysis**: every land mode over the highway pool and every
//!    water mode over the waterway pool (in parallel). Each mode grows its
//!    boundary registries and collects the accessible edges that are not
//!    both reachable from and able to reach the outside into islands.
//! 3. **Reporting**: one finding per lonely way, then one per distinct island
//!    (islands with the same edges and directionality in several modes share
//!    a finding naming all of them), then stub ends.
//!
//! A mode that fails is logged and skipped; the pass itself never fails.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::access::{AccessModel, AccessTable, ModeId};
use crate::components::ComponentCollector;
use crate::config::DetectorConfig;
use crate::error::AnalysisError;
use crate::finding::{ErrorCode, Finding, SeverityTable};
use crate::network::{Edge, EdgeId, Network};
use crate::reachability::{exit_table, BoundaryReachability};
use crate::restrictions::RestrictionIndex;
use crate::stub_ends::StubEndDetector;

/// Highway values that never take part in routing analysis
pub const IGNORE_HIGHWAY: [&str; 3] = ["services", "rest_area", "platform"];

/// Waterway values that never take part in routing analysis
pub const IGNORE_WATERWAY: [&str; 3] = ["services", "rest_area", "dam"];

pub const LONELY_WAY_MESSAGE: &str = "Routable way not connected to other ways";

pub fn is_routable_highway(edge: &Edge) -> bool {
    edge.highway().is_some_and(|h| !IGNORE_HIGHWAY.contains(&h))
}

pub fn is_routable_waterway(edge: &Edge) -> bool {
    edge.waterway().is_some_and(|w| !IGNORE_WATERWAY.contains(&w))
}

/// Which side of the boundary an island lacks a connection to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directionality {
    /// Reachable from outside, but cannot reach it
    IncomingOnly,
    /// Can reach outside, but is not reachable from it
    OutgoingOnly,
    /// Neither
    Isolated,
}

impl Directionality {
    /// The missing connection, as shown in finding messages
    pub fn missing(self) -> &'static str {
        match self {
            Directionality::IncomingOnly => "outgoing",
            Directionality::OutgoingOnly => "incoming",
            Directionality::Isolated => "isolated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    pub mode: &'static str,
    pub directionality: Directionality,
    /// Sorted ascending
    pub edges: Vec<EdgeId>,
}

impl Island {
    pub fn message(&self) -> String {
        island_message(&[self.mode], self.directionality)
    }
}

fn island_message(modes: &[&str], directionality: Directionality) -> String {
    format!("Routing island ({}: {})", modes.join(", "), directionality.missing())
}

/// Candidate pools of one pass, each ascending
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Candidates {
    pub highways: Vec<EdgeId>,
    pub waterways: Vec<EdgeId>,
    pub lonely: Vec<EdgeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Skip,
    Lonely,
    Candidate { highway: bool, waterway: bool },
}

fn visit(network: &Network, id: EdgeId) -> Visit {
    let edge = network.edge(id);
    let highway = is_routable_highway(edge);
    let waterway = is_routable_waterway(edge);
    if !(highway || waterway) || edge.vertices.len() < 2 {
        return Visit::Skip;
    }
    if edge.vertices.iter().all(|&v| network.is_outside(v)) {
        return Visit::Skip;
    }

    let lonely = edge.vertices.iter().all(|&v| {
        !network.is_outside(v) && network.referrers(v).iter().all(|&other| other == id)
    });
    if lonely {
        Visit::Lonely
    } else {
        Visit::Candidate { highway, waterway }
    }
}

/// Classify every edge of the network
pub fn collect_candidates(network: &Network) -> Candidates {
    let ids: Vec<EdgeId> = network.edge_ids().collect();
    let visits: Vec<Visit> = ids.par_iter().map(|&id| visit(network, id)).collect();

    let mut candidates = Candidates::default();
    for (id, visit) in ids.into_iter().zip(visits) {
        match visit {
            Visit::Skip => {}
            Visit::Lonely => candidates.lonely.push(id),
            Visit::Candidate { highway, waterway } => {
                if highway {
                    candidates.highways.push(id);
                }
                if waterway {
                    candidates.waterways.push(id);
                }
            }
        }
    }
    candidates
}

/// Result of the collecting and analysis phases
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub lonely_ways: Vec<EdgeId>,
    pub islands: Vec<Island>,
    /// Modes whose analysis failed
    pub skipped_modes: Vec<String>,
}

impl Report {
    pub fn findings(&self, severities: &SeverityTable) -> Vec<Finding> {
        let lonely = self.lonely_ways.iter().map(|&edge| {
            Finding::new(
                ErrorCode::LonelyWay,
                severities.get(ErrorCode::LonelyWay),
                LONELY_WAY_MESSAGE,
            )
            .with_edges(vec![edge])
        });
        let islands = self.merged_islands().into_iter().map(|(island, modes)| {
            Finding::new(
                ErrorCode::RoutingIsland,
                severities.get(ErrorCode::RoutingIsland),
                island_message(&modes, island.directionality),
            )
            .with_edges(island.edges.clone())
        });
        lonely.chain(islands).collect()
    }

    /// Islands grouped by edge set and directionality, in order of first
    /// appearance, each with the modes it was found for
    fn merged_islands(&self) -> Vec<(&Island, Vec<&'static str>)> {
        let mut index: FxHashMap<(&[EdgeId], Directionality), usize> = FxHashMap::default();
        let mut merged: Vec<(&Island, Vec<&'static str>)> = Vec::new();
        for island in &self.islands {
            let key = (island.edges.as_slice(), island.directionality);
            match index.get(&key) {
                Some(&i) => merged[i].1.push(island.mode),
                None => {
                    index.insert(key, merged.len());
                    merged.push((island, vec![island.mode]));
                }
            }
        }
        merged
    }

    /// Islands reported for `mode`
    pub fn islands_for<'a>(&'a self, mode: &'a str) -> impl Iterator<Item = &'a Island> + 'a {
        self.islands.iter().filter(move |i| i.mode == mode)
    }
}

/// Shared read-only state of one pass
struct Pass<'n> {
    network: &'n Network,
    access: AccessTable,
    restrictions: RestrictionIndex,
    exits: Vec<bool>,
    candidates: Candidates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pool {
    Highways,
    Waterways,
}

pub struct RoutingIslandDetector<'a> {
    model: &'a AccessModel,
    config: &'a DetectorConfig,
    modes: Option<Vec<String>>,
    stub_ends: bool,
}

impl<'a> RoutingIslandDetector<'a> {
    pub fn new(model: &'a AccessModel, config: &'a DetectorConfig) -> Self {
        Self {
            model,
            config,
            modes: None,
            stub_ends: true,
        }
    }

    /// Analyse only these mode keys instead of every land and water mode
    pub fn with_modes(mut self, modes: Vec<String>) -> Self {
        self.modes = Some(modes);
        self
    }

    /// Include the stub end check in [`run`](Self::run)
    pub fn with_stub_ends(mut self, enabled: bool) -> Self {
        self.stub_ends = enabled;
        self
    }

    /// Run a full pass and return all findings
    pub fn run(&self, network: &Network) -> Vec<Finding> {
        let report = self.analyze(network);
        let mut findings = report.findings(&self.config.severity);

        if self.stub_ends {
            findings.extend(StubEndDetector::new(self.config).run(network));
        }

        tracing::info!(
            lonely_ways = report.lonely_ways.len(),
            islands = report.islands.len(),
            findings = findings.len(),
            "routing island pass complete"
        );
        findings
    }

    /// Collecting and per-mode analysis phases
    pub fn analyze(&self, network: &Network) -> Report {
        let pass = Pass {
            network,
            access: AccessTable::compute(self.model, network),
            restrictions: RestrictionIndex::build(network),
            exits: exit_table(network, self.config.amenity_exits),
            candidates: collect_candidates(network),
        };
        tracing::debug!(
            highways = pass.candidates.highways.len(),
            waterways = pass.candidates.waterways.len(),
            lonely = pass.candidates.lonely.len(),
            "collected candidate edges"
        );

        let modes = self.mode_keys();
        let results: Vec<Result<Vec<Island>, AnalysisError>> = modes
            .par_iter()
            .map(|mode| self.analyze_mode(&pass, mode))
            .collect();

        let mut report = Report {
            lonely_ways: pass.candidates.lonely.clone(),
            ..Report::default()
        };
        for (mode, result) in modes.into_iter().zip(results) {
            match result {
                Ok(islands) => report.islands.extend(islands),
                Err(err) => {
                    tracing::warn!(%mode, error = %err, "skipping mode");
                    report.skipped_modes.push(mode);
                }
            }
        }
        report
    }

    fn mode_keys(&self) -> Vec<String> {
        if let Some(modes) = &self.modes {
            return modes.clone();
        }
        ["land", "water"]
            .into_iter()
            .filter_map(|family| self.model.get(family))
            .flat_map(|family| self.model.analysis_modes(family))
            .map(|id| self.model.key(id).to_string())
            .collect()
    }

    fn pool_for(&self, mode: ModeId) -> Result<Pool, AnalysisError> {
        let family = self.model.family_of(mode);
        match family.map(|f| self.model.key(f)) {
            Some("land") => Ok(Pool::Highways),
            Some("water") => Ok(Pool::Waterways),
            other => Err(AnalysisError::NoCandidatePool {
                mode: self.model.key(mode).to_string(),
                family: other.unwrap_or("all").to_string(),
            }),
        }
    }

    fn analyze_mode(&self, pass: &Pass<'_>, mode: &str) -> Result<Vec<Island>, AnalysisError> {
        let id = self
            .model
            .get(mode)
            .ok_or_else(|| AnalysisError::UnknownMode(mode.to_string()))?;
        let mode = self.model.key(id);

        type SameKind = fn(&Edge) -> bool;
        let (candidates, same_kind) = match self.pool_for(id)? {
            Pool::Highways => (
                pass.candidates.highways.as_slice(),
                is_routable_highway as SameKind,
            ),
            Pool::Waterways => (
                pass.candidates.waterways.as_slice(),
                is_routable_waterway as SameKind,
            ),
        };
        let cap = self.config.max_iterations;

        let reach = BoundaryReachability::new(
            pass.network,
            &pass.access,
            &pass.restrictions,
            &pass.exits,
            mode,
        );
        let registry = reach.analyze(candidates, cap, same_kind);

        let remaining: Vec<EdgeId> = registry
            .pool
            .iter()
            .copied()
            .filter(|e| !(registry.incoming.contains(e) && registry.outgoing.contains(e)))
            .filter(|&e| pass.access.is_accessible(e, mode))
            .collect();

        let components = ComponentCollector::new(pass.network, &pass.access, &pass.restrictions, cap)
            .collect(&remaining, mode);

        let islands: Vec<Island> = components
            .into_iter()
            .map(|edges| Island {
                mode,
                directionality: directionality(&edges, &registry.incoming, &registry.outgoing),
                edges,
            })
            .collect();

        tracing::debug!(
            mode,
            pool = registry.pool.len(),
            incoming = registry.incoming.len(),
            outgoing = registry.outgoing.len(),
            ignored = registry.ignored.len(),
            islands = islands.len(),
            "mode analysed"
        );
        Ok(islands)
    }
}

fn directionality(
    edges: &[EdgeId],
    incoming: &FxHashSet<EdgeId>,
    outgoing: &FxHashSet<EdgeId>,
) -> Directionality {
    if edges.iter().all(|e| incoming.contains(e)) {
        Directionality::IncomingOnly
    } else if edges.iter().all(|e| outgoing.contains(e)) {
        Directionality::OutgoingOnly
    } else {
        Directionality::Isolated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Bounds, NetworkBuilder, Tags};

    fn residential() -> Tags {
        Tags::from_pairs(&[("highway", "residential")])
    }

    #[test]
    fn test_collect_candidates() {
        let mut b = NetworkBuilder::new();
        for i in 1..=8 {
            b.add_vertex(i, 0.0, i as f64 * 0.001);
        }
        b.add_edge(1, &[1, 2], residential());
        b.add_edge(2, &[3, 4], residential());
        b.add_edge(3, &[4, 5], Tags::from_pairs(&[("waterway", "river")]));
        b.add_edge(4, &[6, 7], Tags::from_pairs(&[("highway", "services")]));
        b.add_edge(5, &[7, 8], Tags::from_pairs(&[("building", "yes")]));
        let network = b.build();

        let candidates = collect_candidates(&network);
        assert_eq!(candidates.lonely, vec![EdgeId(0)]);
        assert_eq!(candidates.highways, vec![EdgeId(1)]);
        assert_eq!(candidates.waterways, vec![EdgeId(2)]);
    }

    #[test]
    fn test_boundary_edge_is_not_lonely() {
        let mut b = NetworkBuilder::new();
        b.add_vertex(1, 0.0, 0.0);
        b.add_vertex(2, 0.0, 0.001);
        b.add_vertex(3, 5.0, 5.0);
        b.add_vertex(4, 5.0, 5.001);
        b.add_edge(1, &[1, 2], residential());
        b.add_edge(2, &[3, 4], residential());
        b.mark_outside(&[Bounds::new(-1.0, 0.0005, 1.0, 1.0)]);
        let network = b.build();

        let candidates = collect_candidates(&network);
        assert!(candidates.lonely.is_empty());
        // The second edge lies entirely outside the extract
        assert_eq!(candidates.highways, vec![EdgeId(0)]);
    }

    #[test]
    fn test_directionality_messages() {
        let island = Island {
            mode: "motorcar",
            directionality: Directionality::IncomingOnly,
            edges: vec![EdgeId(0)],
        };
        assert_eq!(island.message(), "Routing island (motorcar: outgoing)");
        assert_eq!(Directionality::OutgoingOnly.missing(), "incoming");
        assert_eq!(Directionality::Isolated.missing(), "isolated");

        let incoming: FxHashSet<EdgeId> = [EdgeId(0), EdgeId(1)].into_iter().collect();
        let outgoing: FxHashSet<EdgeId> = [EdgeId(1)].into_iter().collect();
        assert_eq!(
            directionality(&[EdgeId(0)], &incoming, &outgoing),
            Directionality::IncomingOnly
        );
        assert_eq!(
            directionality(&[EdgeId(2)], &incoming, &outgoing),
            Directionality::Isolated
        );
    }

    #[test]
    fn test_identical_islands_share_a_finding() {
        let island = |mode, directionality, edges: &[u32]| Island {
            mode,
            directionality,
            edges: edges.iter().map(|&e| EdgeId(e)).collect(),
        };
        let report = Report {
            islands: vec![
                island("foot", Directionality::Isolated, &[0, 1]),
                island("bicycle", Directionality::Isolated, &[0, 1]),
                island("bicycle", Directionality::Isolated, &[2]),
                island("motorcar", Directionality::IncomingOnly, &[0, 1]),
                island("motorcar", Directionality::Isolated, &[0, 1]),
            ],
            ..Report::default()
        };

        let findings = report.findings(&SeverityTable::default());
        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Routing island (foot, bicycle, motorcar: isolated)",
                "Routing island (bicycle: isolated)",
                "Routing island (motorcar: outgoing)",
            ]
        );
        assert_eq!(findings[0].edges, vec![EdgeId(0), EdgeId(1)]);
        assert_eq!(findings[1].edges, vec![EdgeId(2)]);
    }

    #[test]
    fn test_unknown_and_poolless_modes_are_skipped() {
        let mut b = NetworkBuilder::new();
        b.add_vertex(1, 0.0, 0.0);
        b.add_vertex(2, 0.0, 0.001);
        b.add_vertex(3, 0.0, 0.002);
        b.add_edge(1, &[1, 2], residential());
        b.add_edge(2, &[2, 3], residential());
        let network = b.build();

        let model = AccessModel::standard();
        let config = DetectorConfig::default();
        let report = RoutingIslandDetector::new(&model, &config)
            .with_modes(vec!["hovercraft".into(), "train".into(), "foot".into()])
            .analyze(&network);

        assert_eq!(report.skipped_modes, vec!["hovercraft".to_string(), "train".to_string()]);
        assert_eq!(report.islands.len(), 1);
        assert_eq!(report.islands[0].mode, "foot");
        assert_eq!(report.islands[0].edges, vec![EdgeId(0), EdgeId(1)]);
    }
}
