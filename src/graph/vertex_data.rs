//! Typed per-vertex state maps

use super::{DistributedGraph, VertexLocator};
use std::ops::{Index, IndexMut};

/// Per-vertex storage addressable by locator.
///
/// One slot per locally owned ordinary vertex plus one per delegate slot.
/// Delegate slots exist on every rank so initialization and `reset` work
/// uniformly, but only the master replica's slot is authoritative.
pub struct VertexData<T> {
    local: Vec<T>,
    delegates: Vec<T>,
}

impl<T: Clone> VertexData<T> {
    /// A map over `graph`'s vertices with every slot set to `init`.
    pub fn new(graph: &DistributedGraph, init: T) -> Self {
        Self {
            local: vec![init.clone(); graph.local_vertex_count()],
            delegates: vec![init; graph.delegate_count()],
        }
    }

    /// Sets every slot back to `value` between passes.
    pub fn reset(&mut self, value: T) {
        for slot in self.local.iter_mut() {
            *slot = value.clone();
        }
        for slot in self.delegates.iter_mut() {
            *slot = value.clone();
        }
    }
}

impl<T> Index<VertexLocator> for VertexData<T> {
    type Output = T;

    fn index(&self, v: VertexLocator) -> &T {
        if v.is_delegate() {
            &self.delegates[v.index()]
        } else {
            &self.local[v.index()]
        }
    }
}

impl<T> IndexMut<VertexLocator> for VertexData<T> {
    fn index_mut(&mut self, v: VertexLocator) -> &mut T {
        if v.is_delegate() {
            &mut self.delegates[v.index()]
        } else {
            &mut self.local[v.index()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn test_index_and_reset() {
        let graph = GraphBuilder::from_edges(&[(1, 2), (2, 3), (1, 3)])
            .build(0, 1)
            .unwrap();
        let mut data = VertexData::new(&graph, 0u32);
        for v in graph.vertices() {
            data[v] = graph.degree(v);
        }
        for v in graph.vertices() {
            assert_eq!(data[v], 2);
        }
        data.reset(9);
        for v in graph.vertices() {
            assert_eq!(data[v], 9);
        }
    }

    #[test]
    fn test_delegate_slots_are_addressable_on_every_rank() {
        let builder = GraphBuilder::from_edges(&[(0, 1), (0, 2), (0, 3), (1, 2)])
            .with_delegate_threshold(3);
        for rank in 0..2 {
            let graph = builder.build(rank, 2).unwrap();
            let mut data = VertexData::new(&graph, 0u32);
            for d in graph.delegate_vertices() {
                data[d] = graph.degree(d);
            }
            let hub = graph.locator_of(0).unwrap();
            assert_eq!(data[hub], 3);
        }
    }
}
