//! Degree-oriented directed graph
//!
//! Orients every surviving undirected edge from its lower endpoint to its
//! higher endpoint under the `(degree, locator)` key and stores only the
//! outgoing side, so each triangle has a unique lowest vertex and is
//! enumerated exactly once. Degrees in the key are original container
//! degrees; a self-loop counts toward them but never becomes a directed
//! edge.

use crate::comm::Comm;
use crate::error::{EngineError, EngineResult};
use crate::graph::{DistributedGraph, VertexData, VertexLocator};
use crate::traversal::{self, Visitor, VisitorQueue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One directed edge, stored at the lower endpoint and keyed by the higher
/// endpoint's locator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DogEdge {
    /// Degree of the higher endpoint at construction time
    pub target_degree: u32,
    /// Triangles counted on this edge in the current sweep
    pub triangle_count: u32,
}

/// Out-adjacency of one vertex in the directed graph.
pub type DogAdjacency = BTreeMap<VertexLocator, DogEdge>;

/// State of the orientation pass.
pub struct DogState<'a> {
    pub degree: &'a VertexData<u32>,
    pub dog: &'a mut VertexData<DogAdjacency>,
}

/// Degree announcement from one 2-core vertex to a neighbor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DogVisitor {
    vertex: VertexLocator,
    from: VertexLocator,
    from_degree: u32,
}

impl<'a> Visitor<DogState<'a>> for DogVisitor {
    fn seed(vertex: VertexLocator) -> Self {
        Self {
            vertex,
            from: vertex,
            from_degree: 0,
        }
    }

    fn target(&self) -> VertexLocator {
        self.vertex
    }

    fn init_visit(
        &self,
        graph: &DistributedGraph,
        queue: &mut VisitorQueue<Self>,
        state: &mut DogState<'a>,
    ) -> EngineResult<bool> {
        if state.degree[self.vertex] < 2 {
            return Ok(false);
        }
        let my_degree = graph.degree(self.vertex);
        for &neighbor in graph.edges(self.vertex) {
            if neighbor == self.vertex {
                continue;
            }
            queue.queue_visitor(DogVisitor {
                vertex: neighbor,
                from: self.vertex,
                from_degree: my_degree,
            });
        }
        Ok(true)
    }

    fn pre_visit(
        &self,
        graph: &DistributedGraph,
        state: &mut DogState<'a>,
    ) -> EngineResult<bool> {
        if state.degree[self.vertex] < 2 {
            return Ok(false);
        }
        let my_degree = graph.degree(self.vertex);
        if (self.from_degree, self.from) > (my_degree, self.vertex) {
            state.dog[self.vertex].insert(
                self.from,
                DogEdge {
                    target_degree: self.from_degree,
                    triangle_count: 0,
                },
            );
        }
        Ok(false)
    }

    fn visit(
        &self,
        graph: &DistributedGraph,
        _queue: &mut VisitorQueue<Self>,
        _state: &mut DogState<'a>,
    ) -> EngineResult<bool> {
        Err(EngineError::Invariant {
            vertex: graph.locator_to_label(self.vertex),
            message: "degree announcement has no delivery stage",
        })
    }
}

/// Builds the directed out-adjacency of every 2-core vertex.
///
/// Each edge ends up stored exactly once, at the endpoint from which it
/// points upward.
pub fn build_dog(
    graph: &DistributedGraph,
    comm: &mut Comm,
    core2_degree: &VertexData<u32>,
    dog: &mut VertexData<DogAdjacency>,
) -> EngineResult<()> {
    let mut state = DogState {
        degree: core2_degree,
        dog,
    };
    traversal::traverse::<DogVisitor, _>(graph, comm, &mut state)
}

/// Global shape of the directed graph, reduced across all ranks.
#[derive(Debug, Clone, Copy)]
pub struct DogStats {
    pub global_edge_count: u64,
    pub max_out_degree: u64,
    pub max_degree: u64,
}

/// Directed edge count and degree maxima over every rank's partition.
pub fn dog_stats(
    graph: &DistributedGraph,
    comm: &mut Comm,
    dog: &VertexData<DogAdjacency>,
) -> EngineResult<DogStats> {
    let mut local_edges = 0u64;
    let mut local_max_out = 0u64;
    let mut local_max_degree = 0u64;
    for v in graph.vertices().chain(graph.controllers()) {
        local_edges += dog[v].len() as u64;
        local_max_out = local_max_out.max(dog[v].len() as u64);
        local_max_degree = local_max_degree.max(graph.degree(v) as u64);
    }
    Ok(DogStats {
        global_edge_count: comm.all_reduce(local_edges, |a, b| a + b)?,
        max_out_degree: comm.all_reduce(local_max_out, |a, b| a.max(b))?,
        max_degree: comm.all_reduce(local_max_degree, |a, b| a.max(b))?,
    })
}
