//! Boundary reachability for one transport mode
//!
//! Edges touching the boundary seed two registries: **incoming** (edges
//! through which the mode can enter the extract) and **outgoing** (edges
//! through which it can leave). Both are grown layer by layer across
//! neighbours that the mode can actually traverse in the right direction.
//! Neighbours the mode may not use at all go to **ignored**, so the three
//! registries stay disjoint.

use rustc_hash::FxHashSet;

use crate::access::AccessTable;
use crate::fixpoint::{fixpoint, Fixpoint};
use crate::network::{Edge, EdgeId, Network, Vertex, VertexId};
use crate::oneway::{entry_vertex_with, exit_vertex_with, oneway_direction, Oneway};
use crate::restrictions::RestrictionIndex;

/// Amenities through which traffic leaves the road network
pub const AMENITY_EXITS: [&str; 5] = [
    "parking_entrance",
    "parking",
    "parking_space",
    "motorcycle_parking",
    "ferry_terminal",
];

/// True if the vertex connects to the world outside the extract
pub fn outside_connection(vertex: &Vertex, amenity_exits: bool) -> bool {
    vertex.outside
        || (amenity_exits
            && vertex
                .tags
                .get_str("amenity")
                .is_some_and(|a| AMENITY_EXITS.contains(&a)))
}

/// [`outside_connection`] for every vertex, indexed by [`VertexId`]
pub fn exit_table(network: &Network, amenity_exits: bool) -> Vec<bool> {
    network
        .vertex_ids()
        .map(|v| outside_connection(network.vertex(v), amenity_exits))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    Incoming,
    Outgoing,
}

/// Registries of one mode after growth
#[derive(Debug, Default)]
pub struct Registry {
    pub incoming: FxHashSet<EdgeId>,
    pub outgoing: FxHashSet<EdgeId>,
    pub ignored: FxHashSet<EdgeId>,
    /// Candidate pool the registries were seeded from (possibly expanded)
    pub pool: Vec<EdgeId>,
}

/// Grow `pool` to every edge passing `keep` that transitively shares a
/// vertex with it. At most `cap` layers are added.
pub fn expand_network(
    network: &Network,
    pool: &[EdgeId],
    cap: usize,
    keep: impl Fn(&Edge) -> bool,
) -> Vec<EdgeId> {
    let mut expanded: FxHashSet<EdgeId> = pool.iter().copied().collect();
    let mut frontier: Vec<EdgeId> = pool.to_vec();

    let outcome = fixpoint(cap, || {
        let mut next = Vec::new();
        for &edge in &frontier {
            for &v in &network.edge(edge).vertices {
                for &neighbour in network.referrers(v) {
                    if !expanded.contains(&neighbour) && keep(network.edge(neighbour)) {
                        expanded.insert(neighbour);
                        next.push(neighbour);
                    }
                }
            }
        }
        frontier = next;
        !frontier.is_empty()
    });
    if !outcome.converged {
        tracing::trace!(steps = outcome.steps, "network expansion hit iteration cap");
    }

    let mut expanded: Vec<EdgeId> = expanded.into_iter().collect();
    expanded.sort_unstable();
    expanded
}

pub struct BoundaryReachability<'a> {
    network: &'a Network,
    access: &'a AccessTable,
    restrictions: &'a RestrictionIndex,
    exits: &'a [bool],
    mode: &'a str,
}

impl<'a> BoundaryReachability<'a> {
    pub fn new(
        network: &'a Network,
        access: &'a AccessTable,
        restrictions: &'a RestrictionIndex,
        exits: &'a [bool],
        mode: &'a str,
    ) -> Self {
        Self {
            network,
            access,
            restrictions,
            exits,
            mode,
        }
    }

    #[inline]
    fn is_exit(&self, vertex: VertexId) -> bool {
        self.exits[vertex.index()]
    }

    fn entry(&self, edge: EdgeId) -> Option<VertexId> {
        entry_vertex_with(self.network.edge(edge), Some(self.mode), self.access.state(edge))
    }

    fn exit(&self, edge: EdgeId) -> Option<VertexId> {
        exit_vertex_with(self.network.edge(edge), Some(self.mode), self.access.state(edge))
    }

    /// Candidates whose entry vertex is an outside connection are incoming,
    /// those whose exit vertex is are outgoing. Bidirectional candidates
    /// touching the outside at either end are both.
    pub fn seed(&self, candidates: &[EdgeId]) -> (FxHashSet<EdgeId>, FxHashSet<EdgeId>) {
        let mut incoming = FxHashSet::default();
        let mut outgoing = FxHashSet::default();

        for &id in candidates {
            let edge = self.network.edge(id);
            if !edge.vertices.iter().any(|&v| self.is_exit(v)) {
                continue;
            }

            let entry = self.entry(id);
            let exit = self.exit(id);
            let entry_outside = entry.is_some_and(|v| self.is_exit(v));
            let exit_outside = exit.is_some_and(|v| self.is_exit(v));

            if entry_outside {
                incoming.insert(id);
            }
            if exit_outside {
                outgoing.insert(id);
            }
            if oneway_direction(edge, Some(self.mode)) == Some(Oneway::Both)
                && entry.is_some()
                && exit.is_some()
                && (entry_outside || exit_outside)
            {
                incoming.insert(id);
                outgoing.insert(id);
            }
        }

        (incoming, outgoing)
    }

    /// Move edges the mode may not use from `set` to `ignored`
    pub fn filter_inaccessible(&self, set: &mut FxHashSet<EdgeId>, ignored: &mut FxHashSet<EdgeId>) {
        set.retain(|&edge| {
            let accessible = self.access.is_accessible(edge, self.mode);
            if !accessible {
                ignored.insert(edge);
            }
            accessible
        });
    }

    /// One growth layer. Returns whether any edge was added to `set`.
    pub fn grow(
        &self,
        set: &mut FxHashSet<EdgeId>,
        growth: Growth,
        ignored: &mut FxHashSet<EdgeId>,
    ) -> bool {
        let mut to_add: FxHashSet<EdgeId> = FxHashSet::default();
        let mut to_ignore: FxHashSet<EdgeId> = FxHashSet::default();

        for &member in set.iter() {
            let member_edge = self.network.edge(member);
            for &v in &member_edge.vertices {
                for &candidate in self.network.referrers(v) {
                    if set.contains(&candidate)
                        || ignored.contains(&candidate)
                        || to_add.contains(&candidate)
                    {
                        continue;
                    }
                    // Inaccessible neighbours are not traversed
                    if !self.access.is_accessible(candidate, self.mode) {
                        to_ignore.insert(candidate);
                        continue;
                    }
                    if self.links(member, member_edge, candidate, growth) {
                        to_add.insert(candidate);
                    }
                }
            }
        }

        ignored.extend(to_ignore);
        let changed = !to_add.is_empty();
        set.extend(to_add);
        changed
    }

    fn links(&self, member: EdgeId, member_edge: &Edge, candidate: EdgeId, growth: Growth) -> bool {
        let candidate_edge = self.network.edge(candidate);
        if oneway_direction(candidate_edge, Some(self.mode)) == Some(Oneway::Both)
            || candidate_edge.is_closed()
        {
            return true;
        }
        match growth {
            Growth::Incoming => {
                self.entry(candidate).is_some_and(|v| member_edge.contains(v))
                    && self.restrictions.is_reachable(member, candidate, Some(self.mode))
            }
            Growth::Outgoing => {
                self.exit(candidate).is_some_and(|v| member_edge.contains(v))
                    && self.restrictions.is_reachable(candidate, member, Some(self.mode))
            }
        }
    }

    /// Repeat [`grow`](Self::grow) until nothing changes or `cap` steps ran
    pub fn grow_to_fixpoint(
        &self,
        set: &mut FxHashSet<EdgeId>,
        growth: Growth,
        ignored: &mut FxHashSet<EdgeId>,
        cap: usize,
    ) -> Fixpoint {
        let outcome = fixpoint(cap, || self.grow(set, growth, ignored));
        if !outcome.converged {
            tracing::trace!(
                mode = self.mode,
                ?growth,
                steps = outcome.steps,
                "reachability growth hit iteration cap"
            );
        }
        outcome
    }

    /// Seed, expand the pool when a direction has no seed, filter and grow
    /// both registries
    pub fn analyze(
        &self,
        candidates: &[EdgeId],
        cap: usize,
        same_kind: impl Fn(&Edge) -> bool,
    ) -> Registry {
        let (mut incoming, mut outgoing) = self.seed(candidates);

        let pool = if incoming.is_empty() || outgoing.is_empty() {
            let expanded = expand_network(self.network, candidates, cap, same_kind);
            let (more_incoming, more_outgoing) = self.seed(&expanded);
            incoming.extend(more_incoming);
            outgoing.extend(more_outgoing);
            expanded
        } else {
            candidates.to_vec()
        };

        let mut ignored = FxHashSet::default();
        self.filter_inaccessible(&mut incoming, &mut ignored);
        self.filter_inaccessible(&mut outgoing, &mut ignored);

        self.grow_to_fixpoint(&mut incoming, Growth::Incoming, &mut ignored, cap);
        self.grow_to_fixpoint(&mut outgoing, Growth::Outgoing, &mut ignored, cap);

        Registry {
            incoming,
            outgoing,
            ignored,
            pool,
        }
    }
}
