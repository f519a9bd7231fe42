//! Connected components of edges with identical access
//!
//! Components are grown for one transport mode from the lowest unassigned
//! edge through shared vertices. A neighbour joins only if its access value
//! for that mode equals the seed's and no turn restriction (for an
//! unspecified mode) forbids moving between the two edges in either
//! direction. Values of other modes play no part.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::access::AccessTable;
use crate::fixpoint::fixpoint;
use crate::network::{EdgeId, Network};
use crate::restrictions::RestrictionIndex;

pub struct ComponentCollector<'a> {
    network: &'a Network,
    access: &'a AccessTable,
    restrictions: &'a RestrictionIndex,
    cap: usize,
}

impl<'a> ComponentCollector<'a> {
    pub fn new(
        network: &'a Network,
        access: &'a AccessTable,
        restrictions: &'a RestrictionIndex,
        cap: usize,
    ) -> Self {
        Self {
            network,
            access,
            restrictions,
            cap,
        }
    }

    /// Partition `edges` into components for `mode`; each component is
    /// sorted and the list is ordered by smallest member
    pub fn collect(&self, edges: &[EdgeId], mode: &str) -> Vec<Vec<EdgeId>> {
        let mut pool: BTreeSet<EdgeId> = edges.iter().copied().collect();
        let mut components = Vec::new();

        while let Some(seed) = pool.pop_first() {
            let mut component: FxHashSet<EdgeId> = FxHashSet::default();
            component.insert(seed);

            let outcome = fixpoint(self.cap, || self.grow(seed, mode, &mut component, &pool));
            if !outcome.converged {
                tracing::trace!(
                    seed = self.network.edge(seed).osm_id,
                    steps = outcome.steps,
                    "component growth hit iteration cap"
                );
            }

            let mut members: Vec<EdgeId> = component.into_iter().collect();
            members.sort_unstable();
            for member in &members {
                pool.remove(member);
            }
            components.push(members);
        }

        components
    }

    fn joins(&self, member: EdgeId, neighbour: EdgeId) -> bool {
        self.restrictions.is_reachable(member, neighbour, None)
            && self.restrictions.is_reachable(neighbour, member, None)
    }

    fn grow(
        &self,
        seed: EdgeId,
        mode: &str,
        component: &mut FxHashSet<EdgeId>,
        pool: &BTreeSet<EdgeId>,
    ) -> bool {
        let value = self.access.value(seed, mode);
        let mut to_add: FxHashSet<EdgeId> = FxHashSet::default();

        for &member in component.iter() {
            for &v in &self.network.edge(member).vertices {
                for &neighbour in self.network.referrers(v) {
                    if pool.contains(&neighbour)
                        && !component.contains(&neighbour)
                        && self.access.value(neighbour, mode) == value
                        && self.joins(member, neighbour)
                    {
                        to_add.insert(neighbour);
                    }
                }
            }
        }

        let changed = !to_add.is_empty();
        component.extend(to_add);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessModel;
    use crate::network::{MemberKind, NetworkBuilder, RawMember, Tags};

    fn collect(network: &Network, edges: &[EdgeId], cap: usize) -> Vec<Vec<u32>> {
        collect_for(network, edges, cap, "foot")
    }

    fn collect_for(network: &Network, edges: &[EdgeId], cap: usize, mode: &str) -> Vec<Vec<u32>> {
        let access = AccessTable::compute(&AccessModel::standard(), network);
        let restrictions = RestrictionIndex::build(network);
        ComponentCollector::new(network, &access, &restrictions, cap)
            .collect(edges, mode)
            .into_iter()
            .map(|c| c.into_iter().map(|e| e.0).collect())
            .collect()
    }

    fn star(tags: &[&[(&str, &str)]]) -> Network {
        let mut b = NetworkBuilder::new();
        b.add_vertex(0, 0.0, 0.0);
        for (i, t) in tags.iter().enumerate() {
            let i = i as i64 + 1;
            b.add_vertex(i, i as f64 * 0.001, 0.0);
            b.add_edge(100 + i, &[0, i], Tags::from_pairs(t));
        }
        b.build()
    }

    #[test]
    fn test_same_access_joins() {
        let residential: &[(&str, &str)] = &[("highway", "residential")];
        let network = star(&[residential, residential, &[("highway", "footway")]]);
        let all: Vec<EdgeId> = network.edge_ids().collect();
        assert_eq!(collect(&network, &all, 100), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_other_modes_do_not_split() {
        let residential: &[(&str, &str)] = &[("highway", "residential")];
        let no_bikes: &[(&str, &str)] = &[("highway", "residential"), ("bicycle", "no")];
        let network = star(&[residential, no_bikes]);
        let all: Vec<EdgeId> = network.edge_ids().collect();

        assert_eq!(collect_for(&network, &all, 100, "foot"), vec![vec![0, 1]]);
        assert_eq!(collect_for(&network, &all, 100, "motorcar"), vec![vec![0, 1]]);
        assert_eq!(
            collect_for(&network, &all, 100, "bicycle"),
            vec![vec![0], vec![1]]
        );
    }

    #[test]
    fn test_growth_limited_to_pool() {
        let residential: &[(&str, &str)] = &[("highway", "residential")];
        let network = star(&[residential, residential, residential]);
        assert_eq!(
            collect(&network, &[EdgeId(0), EdgeId(2)], 100),
            vec![vec![0, 2]]
        );
        assert_eq!(collect(&network, &[EdgeId(1)], 100), vec![vec![1]]);
    }

    #[test]
    fn test_cap_splits_components() {
        let mut b = NetworkBuilder::new();
        for i in 1..=4 {
            b.add_vertex(i, 0.0, i as f64 * 0.001);
        }
        for i in 1..=3 {
            b.add_edge(i, &[i, i + 1], Tags::from_pairs(&[("highway", "residential")]));
        }
        let network = b.build();
        let all: Vec<EdgeId> = network.edge_ids().collect();

        assert_eq!(collect(&network, &all, 100), vec![vec![0, 1, 2]]);
        assert_eq!(collect(&network, &all, 1), vec![vec![0, 1], vec![2]]);
        assert_eq!(collect(&network, &all, 0), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_restriction_blocks_union() {
        let mut b = NetworkBuilder::new();
        b.add_vertex(1, 0.0, 0.0);
        b.add_vertex(2, 0.0, 0.001);
        b.add_vertex(3, 0.0, 0.002);
        b.add_edge(10, &[1, 2], Tags::from_pairs(&[("highway", "residential")]));
        b.add_edge(11, &[2, 3], Tags::from_pairs(&[("highway", "residential")]));
        b.add_relation(
            1,
            vec![
                RawMember::new("from", MemberKind::Way, 11),
                RawMember::new("via", MemberKind::Node, 2),
                RawMember::new("to", MemberKind::Way, 10),
            ],
            Tags::from_pairs(&[("type", "restriction")]),
        );
        let network = b.build();
        let all: Vec<EdgeId> = network.edge_ids().collect();
        assert_eq!(collect(&network, &all, 100), vec![vec![0], vec![1]]);
    }
}
