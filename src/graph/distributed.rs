//! Per-rank view of a partitioned undirected graph

use super::VertexLocator;
use std::collections::HashMap;

/// One rank's partition of the graph.
///
/// Holds the adjacency of the ordinary vertices owned here and of the
/// delegates mastered here, plus the replicated delegate tables (labels,
/// degrees, masters) every rank keeps so per-replica state can be
/// initialized without communication.
#[derive(Debug)]
pub struct DistributedGraph {
    pub(super) rank: usize,
    pub(super) local_adj: Vec<Vec<VertexLocator>>,
    pub(super) local_labels: Vec<u64>,
    pub(super) delegate_adj: HashMap<u32, Vec<VertexLocator>>,
    pub(super) delegates: Vec<VertexLocator>,
    pub(super) delegate_labels: Vec<u64>,
    pub(super) delegate_degrees: Vec<u32>,
    pub(super) locators: HashMap<u64, VertexLocator>,
}

impl DistributedGraph {
    /// Rank this partition belongs to.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Undirected degree of a vertex stored or replicated here. A self-loop
    /// counts once.
    pub fn degree(&self, v: VertexLocator) -> u32 {
        if v.is_delegate() {
            self.delegate_degrees[v.index()]
        } else {
            debug_assert_eq!(v.owner(), self.rank);
            self.local_adj[v.index()].len() as u32
        }
    }

    /// Targets of the undirected edges of a vertex stored here. Empty for
    /// delegate replicas that are not the master.
    pub fn edges(&self, v: VertexLocator) -> &[VertexLocator] {
        if v.is_delegate() {
            self.delegate_adj
                .get(&(v.index() as u32))
                .map(Vec::as_slice)
                .unwrap_or(&[])
        } else {
            debug_assert_eq!(v.owner(), self.rank);
            &self.local_adj[v.index()]
        }
    }

    /// Ordinary vertices owned by this rank.
    pub fn vertices(&self) -> impl Iterator<Item = VertexLocator> + '_ {
        let rank = self.rank;
        (0..self.local_adj.len() as u32).map(move |index| VertexLocator::ordinary(rank, index))
    }

    /// Delegates mastered on this rank.
    pub fn controllers(&self) -> impl Iterator<Item = VertexLocator> + '_ {
        let rank = self.rank;
        self.delegates
            .iter()
            .copied()
            .filter(move |d| d.owner() == rank)
    }

    /// Every delegate slot, including replicas this rank does not master.
    pub fn delegate_vertices(&self) -> impl Iterator<Item = VertexLocator> + '_ {
        self.delegates.iter().copied()
    }

    /// Stable label of a vertex stored or replicated here, for logging.
    pub fn locator_to_label(&self, v: VertexLocator) -> u64 {
        if v.is_delegate() {
            self.delegate_labels[v.index()]
        } else {
            debug_assert_eq!(v.owner(), self.rank);
            self.local_labels[v.index()]
        }
    }

    /// Locator of a labelled vertex, on any rank.
    pub fn locator_of(&self, label: u64) -> Option<VertexLocator> {
        self.locators.get(&label).copied()
    }

    /// Number of ordinary vertices owned by this rank.
    pub fn local_vertex_count(&self) -> usize {
        self.local_adj.len()
    }

    /// Number of delegate slots (the same on every rank).
    pub fn delegate_count(&self) -> usize {
        self.delegates.len()
    }
}
