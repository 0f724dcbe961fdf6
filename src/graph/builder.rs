//! Deterministic SPMD graph construction
//!
//! Every rank runs the same construction over the full edge list and keeps
//! only its own partition, so no communication is needed to agree on
//! locators, delegate slots or degrees.

use super::{DistributedGraph, GraphError, GraphResult, VertexLocator};
use std::collections::{BTreeMap, HashMap};

/// Builds per-rank [`DistributedGraph`] partitions from an undirected edge
/// list.
///
/// Duplicate undirected edges are collapsed and self-loops are kept once.
/// A vertex is owned by rank `label % ranks`; vertices whose degree reaches
/// the delegate threshold are replicated as delegates, with slots assigned
/// in label order and adjacency held by the master replica only.
pub struct GraphBuilder {
    edges: Vec<(u64, u64)>,
    delegate_threshold: u32,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            delegate_threshold: 1024,
        }
    }

    /// Builder pre-loaded with an edge list.
    pub fn from_edges(edges: &[(u64, u64)]) -> Self {
        let mut builder = Self::new();
        builder.edges.extend_from_slice(edges);
        builder
    }

    /// Degree at which a vertex becomes a delegate. `u32::MAX` disables
    /// delegation entirely.
    pub fn with_delegate_threshold(mut self, threshold: u32) -> Self {
        self.delegate_threshold = threshold;
        self
    }

    /// Adds one undirected edge.
    pub fn add_edge(&mut self, u: u64, v: u64) -> &mut Self {
        self.edges.push((u, v));
        self
    }

    /// Builds the partition owned by `rank` in a cluster of `ranks`.
    pub fn build(&self, rank: usize, ranks: usize) -> GraphResult<DistributedGraph> {
        if ranks == 0 {
            return Err(GraphError::NoRanks);
        }
        if rank >= ranks {
            return Err(GraphError::RankOutOfRange { rank, ranks });
        }

        let mut edges: Vec<(u64, u64)> = self
            .edges
            .iter()
            .map(|&(u, v)| if u <= v { (u, v) } else { (v, u) })
            .collect();
        edges.sort_unstable();
        edges.dedup();

        // global degrees; a self-loop contributes once
        let mut degrees: BTreeMap<u64, u32> = BTreeMap::new();
        for &(u, v) in &edges {
            *degrees.entry(u).or_insert(0) += 1;
            if v != u {
                *degrees.entry(v).or_insert(0) += 1;
            }
        }

        // delegate slots in label order
        let mut delegate_slots: HashMap<u64, u32> = HashMap::new();
        let mut delegates = Vec::new();
        let mut delegate_labels = Vec::new();
        let mut delegate_degrees = Vec::new();
        for (&label, &degree) in &degrees {
            if degree >= self.delegate_threshold {
                let slot = delegate_labels.len() as u32;
                let master = (label % ranks as u64) as usize;
                delegate_slots.insert(label, slot);
                delegates.push(VertexLocator::delegate(master, slot));
                delegate_labels.push(label);
                delegate_degrees.push(degree);
            }
        }

        // ordinary locators: per-owner indices in label order
        let mut locators: HashMap<u64, VertexLocator> = HashMap::new();
        let mut next_index = vec![0u32; ranks];
        let mut local_labels = Vec::new();
        for (&label, _) in &degrees {
            if let Some(&slot) = delegate_slots.get(&label) {
                locators.insert(label, delegates[slot as usize]);
            } else {
                let owner = (label % ranks as u64) as usize;
                let locator = VertexLocator::ordinary(owner, next_index[owner]);
                next_index[owner] += 1;
                if owner == rank {
                    local_labels.push(label);
                }
                locators.insert(label, locator);
            }
        }

        let mut local_adj: Vec<Vec<VertexLocator>> = vec![Vec::new(); local_labels.len()];
        let mut delegate_adj: HashMap<u32, Vec<VertexLocator>> = delegates
            .iter()
            .filter(|d| d.owner() == rank)
            .map(|d| (d.index() as u32, Vec::new()))
            .collect();
        for &(u, v) in &edges {
            let lu = locators[&u];
            let lv = locators[&v];
            Self::attach(rank, &mut local_adj, &mut delegate_adj, lu, lv);
            if u != v {
                Self::attach(rank, &mut local_adj, &mut delegate_adj, lv, lu);
            }
        }
        for adjacency in local_adj.iter_mut() {
            adjacency.sort_unstable();
        }
        for adjacency in delegate_adj.values_mut() {
            adjacency.sort_unstable();
        }

        Ok(DistributedGraph {
            rank,
            local_adj,
            local_labels,
            delegate_adj,
            delegates,
            delegate_labels,
            delegate_degrees,
            locators,
        })
    }

    fn attach(
        rank: usize,
        local_adj: &mut [Vec<VertexLocator>],
        delegate_adj: &mut HashMap<u32, Vec<VertexLocator>>,
        at: VertexLocator,
        neighbor: VertexLocator,
    ) {
        if at.owner() != rank {
            return;
        }
        if at.is_delegate() {
            if let Some(adjacency) = delegate_adj.get_mut(&(at.index() as u32)) {
                adjacency.push(neighbor);
            }
        } else {
            local_adj[at.index()].push(neighbor);
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star_and_triangle() -> Vec<(u64, u64)> {
        // vertex 0 is a hub of degree 5; 10-11-12 form a triangle
        vec![
            (0, 1),
            (0, 2),
            (0, 3),
            (0, 4),
            (0, 10),
            (10, 11),
            (10, 12),
            (11, 12),
        ]
    }

    #[test]
    fn test_degrees_and_labels_round_trip() {
        for ranks in 1..=3 {
            let builder = GraphBuilder::from_edges(&star_and_triangle());
            for rank in 0..ranks {
                let graph = builder.build(rank, ranks).unwrap();
                for v in graph.vertices() {
                    let label = graph.locator_to_label(v);
                    assert_eq!(graph.locator_of(label), Some(v));
                    let expected = match label {
                        0 => 5,
                        10 => 3,
                        11 | 12 => 2,
                        _ => 1,
                    };
                    assert_eq!(graph.degree(v), expected, "label {label}");
                }
            }
        }
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let graph = GraphBuilder::from_edges(&[(1, 2), (2, 1), (1, 2)])
            .build(0, 1)
            .unwrap();
        let v1 = graph.locator_of(1).unwrap();
        assert_eq!(graph.degree(v1), 1);
        assert_eq!(graph.edges(v1).len(), 1);
    }

    #[test]
    fn test_self_loop_counts_once() {
        let graph = GraphBuilder::from_edges(&[(5, 5), (5, 6)]).build(0, 1).unwrap();
        let v5 = graph.locator_of(5).unwrap();
        assert_eq!(graph.degree(v5), 2);
        assert!(graph.edges(v5).contains(&v5));
    }

    #[test]
    fn test_high_degree_vertices_become_delegates() {
        let builder =
            GraphBuilder::from_edges(&star_and_triangle()).with_delegate_threshold(4);
        for ranks in 1..=3 {
            for rank in 0..ranks {
                let graph = builder.build(rank, ranks).unwrap();
                assert_eq!(graph.delegate_count(), 1);
                let hub = graph.locator_of(0).unwrap();
                assert!(hub.is_delegate());
                assert_eq!(graph.degree(hub), 5);
                // adjacency lives on the master only
                if hub.owner() == rank {
                    assert_eq!(graph.edges(hub).len(), 5);
                    assert_eq!(graph.controllers().count(), 1);
                } else {
                    assert!(graph.edges(hub).is_empty());
                    assert_eq!(graph.controllers().count(), 0);
                }
            }
        }
    }

    #[test]
    fn test_every_edge_stored_exactly_once_per_endpoint() {
        let edges = star_and_triangle();
        for ranks in 1..=4 {
            let builder = GraphBuilder::from_edges(&edges);
            let mut stored = 0usize;
            for rank in 0..ranks {
                let graph = builder.build(rank, ranks).unwrap();
                stored += graph
                    .vertices()
                    .chain(graph.controllers())
                    .map(|v| graph.edges(v).len())
                    .sum::<usize>();
            }
            assert_eq!(stored, 2 * edges.len());
        }
    }

    #[test]
    fn test_rank_out_of_range() {
        let builder = GraphBuilder::from_edges(&[(1, 2)]);
        assert_eq!(
            builder.build(2, 2).unwrap_err(),
            GraphError::RankOutOfRange { rank: 2, ranks: 2 }
        );
        assert_eq!(builder.build(0, 0).unwrap_err(), GraphError::NoRanks);
    }
}
