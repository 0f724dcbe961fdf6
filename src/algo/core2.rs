//! 2-core reduction
//!
//! Peels every vertex whose degree in what remains is below 2. A peeled
//! vertex zeroes its count and sends one decrement to each neighbor; a
//! decrement that drops a still-alive neighbor below 2 peels it in turn.
//! Decrements reaching an already-peeled vertex are ignored, which keeps
//! the pass correct under arbitrary message interleavings.

use crate::comm::Comm;
use crate::error::{EngineError, EngineResult};
use crate::graph::{DistributedGraph, VertexData, VertexLocator};
use crate::traversal::{self, Visitor, VisitorQueue};
use serde::{Deserialize, Serialize};

/// State of the 2-core pass.
pub struct Core2State<'a> {
    pub degree: &'a mut VertexData<u32>,
    pub alive: &'a mut VertexData<bool>,
}

/// One degree decrement addressed to a neighbor of a peeled vertex.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Core2Visitor {
    vertex: VertexLocator,
}

impl<'a> Visitor<Core2State<'a>> for Core2Visitor {
    fn seed(vertex: VertexLocator) -> Self {
        Self { vertex }
    }

    fn target(&self) -> VertexLocator {
        self.vertex
    }

    fn init_visit(
        &self,
        graph: &DistributedGraph,
        queue: &mut VisitorQueue<Self>,
        state: &mut Core2State<'a>,
    ) -> EngineResult<bool> {
        if !state.alive[self.vertex] {
            return Ok(false);
        }
        if state.degree[self.vertex] < 2 {
            state.alive[self.vertex] = false;
            state.degree[self.vertex] = 0;
            for &neighbor in graph.edges(self.vertex) {
                queue.queue_visitor(Core2Visitor { vertex: neighbor });
            }
        }
        Ok(true)
    }

    fn pre_visit(
        &self,
        _graph: &DistributedGraph,
        state: &mut Core2State<'a>,
    ) -> EngineResult<bool> {
        if !state.alive[self.vertex] {
            // late decrement for a vertex that was already peeled
            return Ok(false);
        }
        state.degree[self.vertex] -= 1;
        if state.degree[self.vertex] < 2 {
            state.alive[self.vertex] = false;
            state.degree[self.vertex] = 0;
            return Ok(true);
        }
        Ok(false)
    }

    fn visit(
        &self,
        graph: &DistributedGraph,
        queue: &mut VisitorQueue<Self>,
        state: &mut Core2State<'a>,
    ) -> EngineResult<bool> {
        if state.alive[self.vertex] {
            return Err(EngineError::Invariant {
                vertex: graph.locator_to_label(self.vertex),
                message: "peeled vertex found alive while propagating decrements",
            });
        }
        for &neighbor in graph.edges(self.vertex) {
            queue.queue_visitor(Core2Visitor { vertex: neighbor });
        }
        Ok(true)
    }
}

/// Peels the graph to its 2-core. On return, `degree[v]` is 0 for peeled
/// vertices and the surviving degree (at least 2) for the rest; `alive[v]`
/// marks survival.
pub fn reduce_to_2core(
    graph: &DistributedGraph,
    comm: &mut Comm,
    degree: &mut VertexData<u32>,
    alive: &mut VertexData<bool>,
) -> EngineResult<()> {
    alive.reset(true);
    for v in graph.vertices() {
        degree[v] = graph.degree(v);
    }
    for d in graph.delegate_vertices() {
        degree[d] = graph.degree(d);
    }
    let mut state = Core2State { degree, alive };
    traversal::traverse::<Core2Visitor, _>(graph, comm, &mut state)
}
