//! Turn restriction index
//!
//! Restrictions are looked up by their "from" edge. Only the edge-to-edge
//! pair is modelled: via members (vertex or edge) are ignored, so a via-way
//! restriction forbids its from → to transition wherever the two edges meet.
//!
//! ## Exemptions
//!
//! A restriction forbids a transition when
//! - it has an `except` tag and the queried mode is in that list, or
//! - it has no `except` tag and no mode is given.

use rustc_hash::FxHashMap;

use crate::network::{EdgeId, Network};

/// A restriction as seen from one "from" edge
#[derive(Debug, Clone)]
struct EdgeRestriction {
    to: Vec<EdgeId>,
    /// `None` when the relation has no `except` tag
    except: Option<Vec<String>>,
}

impl EdgeRestriction {
    fn forbids(&self, to: EdgeId, mode: Option<&str>) -> bool {
        if !self.to.contains(&to) {
            return false;
        }
        match (&self.except, mode) {
            (Some(except), Some(mode)) => except.iter().any(|m| m == mode),
            (None, None) => true,
            _ => false,
        }
    }
}

fn parse_except(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Index for turn restriction lookups between adjacent edges
#[derive(Debug, Default)]
pub struct RestrictionIndex {
    by_from: FxHashMap<EdgeId, Vec<EdgeRestriction>>,
}

impl RestrictionIndex {
    /// Build the index from every `type=restriction` relation
    pub fn build(network: &Network) -> Self {
        let mut by_from: FxHashMap<EdgeId, Vec<EdgeRestriction>> = FxHashMap::default();
        let mut skipped = 0usize;

        for id in network.relation_ids() {
            let relation = network.relation(id);
            if !relation.tags.is("type", "restriction") {
                continue;
            }

            let from: Vec<EdgeId> = relation.edges_with_role("from").collect();
            let to: Vec<EdgeId> = relation.edges_with_role("to").collect();
            if from.is_empty() || to.is_empty() {
                tracing::trace!(
                    relation = relation.osm_id,
                    "restriction without from/to way, skipping"
                );
                skipped += 1;
                continue;
            }

            let except = relation.tags.get_str("except").map(parse_except);
            for from_edge in from {
                by_from.entry(from_edge).or_default().push(EdgeRestriction {
                    to: to.clone(),
                    except: except.clone(),
                });
            }
        }

        let index = Self { by_from };
        tracing::debug!(
            restricted_edges = index.n_restricted_edges(),
            restrictions = index.n_restrictions(),
            skipped,
            "turn restriction index built"
        );
        index
    }

    /// True unless a restriction forbids moving from `from` onto `to`.
    ///
    /// A blank mode counts as no mode.
    pub fn is_reachable(&self, from: EdgeId, to: EdgeId, mode: Option<&str>) -> bool {
        let Some(rules) = self.by_from.get(&from) else {
            return true;
        };
        let mode = mode.filter(|m| !m.trim().is_empty());
        !rules.iter().any(|rule| rule.forbids(to, mode))
    }

    /// Number of edges with at least one restriction
    pub fn n_restricted_edges(&self) -> usize {
        self.by_from.len()
    }

    /// Number of (from edge, relation) entries
    pub fn n_restrictions(&self) -> usize {
        self.by_from.values().map(|v| v.len()).sum()
    }
}

/// Check a single transition without a prebuilt index
pub fn is_reachable(network: &Network, from: EdgeId, to: EdgeId, mode: Option<&str>) -> bool {
    let mode = mode.filter(|m| !m.trim().is_empty());
    !network.relations_of(from).iter().any(|&id| {
        let relation = network.relation(id);
        if !relation.tags.is("type", "restriction") {
            return false;
        }
        let rule = EdgeRestriction {
            to: relation.edges_with_role("to").collect(),
            except: relation.tags.get_str("except").map(parse_except),
        };
        relation.edges_with_role("from").any(|e| e == from) && rule.forbids(to, mode)
    })
}
