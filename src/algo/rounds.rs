//! Round scheduler
//!
//! Assigns every vertex of the directed graph a round equal to the length
//! of the longest directed path into it, then groups wedge sources into
//! logarithmic bins by round. Processing bins in order lets the pruning
//! loop restart from a bounded prefix when deletions cascade.
//!
//! The numbering runs in two traversals. First every vertex reports itself
//! to its successors to accumulate in-degrees. Then rounds start at 1
//! everywhere, zero-in-degree vertices are set to 0, each such source sets
//! itself to 1 and propagates 1, and every receiver takes the max of the
//! incoming rounds while counting down its expected in-edges; at zero it
//! increments its round and propagates. A final local pass decrements every
//! round, which lands the sources at 0 and every other vertex at one more
//! than the maximum round of its predecessors.

use super::dog::DogAdjacency;
use crate::comm::Comm;
use crate::error::{EngineError, EngineResult};
use crate::graph::{DistributedGraph, VertexData, VertexLocator};
use crate::traversal::{self, Visitor, VisitorQueue};
use serde::{Deserialize, Serialize};

/// State of the in-degree pass.
pub struct InDegreeState<'a> {
    pub dog: &'a VertexData<DogAdjacency>,
    pub in_degree: &'a mut VertexData<u32>,
}

/// One in-edge report to a directed successor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InDegreeVisitor {
    vertex: VertexLocator,
}

impl<'a> Visitor<InDegreeState<'a>> for InDegreeVisitor {
    fn seed(vertex: VertexLocator) -> Self {
        Self { vertex }
    }

    fn target(&self) -> VertexLocator {
        self.vertex
    }

    fn init_visit(
        &self,
        _graph: &DistributedGraph,
        queue: &mut VisitorQueue<Self>,
        state: &mut InDegreeState<'a>,
    ) -> EngineResult<bool> {
        for &successor in state.dog[self.vertex].keys() {
            queue.queue_visitor(InDegreeVisitor { vertex: successor });
        }
        Ok(false)
    }

    fn pre_visit(
        &self,
        _graph: &DistributedGraph,
        state: &mut InDegreeState<'a>,
    ) -> EngineResult<bool> {
        state.in_degree[self.vertex] += 1;
        Ok(false)
    }

    fn visit(
        &self,
        graph: &DistributedGraph,
        _queue: &mut VisitorQueue<Self>,
        _state: &mut InDegreeState<'a>,
    ) -> EngineResult<bool> {
        Err(EngineError::Invariant {
            vertex: graph.locator_to_label(self.vertex),
            message: "in-degree report has no delivery stage",
        })
    }
}

/// State of the round-assignment pass.
pub struct RoundState<'a> {
    pub dog: &'a VertexData<DogAdjacency>,
    pub in_degree: &'a mut VertexData<u32>,
    pub round: &'a mut VertexData<u32>,
}

/// A predecessor's round, delivered to a directed successor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoundVisitor {
    vertex: VertexLocator,
    round: u32,
}

impl<'a> Visitor<RoundState<'a>> for RoundVisitor {
    fn seed(vertex: VertexLocator) -> Self {
        Self { vertex, round: 0 }
    }

    fn target(&self) -> VertexLocator {
        self.vertex
    }

    fn init_visit(
        &self,
        _graph: &DistributedGraph,
        queue: &mut VisitorQueue<Self>,
        state: &mut RoundState<'a>,
    ) -> EngineResult<bool> {
        if state.in_degree[self.vertex] != 0 {
            return Ok(false);
        }
        if state.round[self.vertex] != 0 {
            return Ok(false);
        }
        state.round[self.vertex] = 1;
        for &successor in state.dog[self.vertex].keys() {
            queue.queue_visitor(RoundVisitor {
                vertex: successor,
                round: 1,
            });
        }
        Ok(false)
    }

    fn pre_visit(
        &self,
        graph: &DistributedGraph,
        state: &mut RoundState<'a>,
    ) -> EngineResult<bool> {
        if state.in_degree[self.vertex] == 0 {
            return Err(EngineError::Invariant {
                vertex: graph.locator_to_label(self.vertex),
                message: "round message at a vertex with no pending in-edges",
            });
        }
        state.round[self.vertex] = state.round[self.vertex].max(self.round);
        state.in_degree[self.vertex] -= 1;
        if state.in_degree[self.vertex] == 0 {
            // every in-edge has reported; finalize and propagate
            state.round[self.vertex] += 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn visit(
        &self,
        _graph: &DistributedGraph,
        queue: &mut VisitorQueue<Self>,
        state: &mut RoundState<'a>,
    ) -> EngineResult<bool> {
        for &successor in state.dog[self.vertex].keys() {
            queue.queue_visitor(RoundVisitor {
                vertex: successor,
                round: state.round[self.vertex],
            });
        }
        Ok(false)
    }
}

/// Computes `in_degree` and `round` for every local vertex and returns the
/// global maximum round.
pub fn assign_rounds(
    graph: &DistributedGraph,
    comm: &mut Comm,
    dog: &VertexData<DogAdjacency>,
    in_degree: &mut VertexData<u32>,
    round: &mut VertexData<u32>,
) -> EngineResult<u32> {
    in_degree.reset(0);
    round.reset(1);
    comm.barrier()?;
    {
        let mut state = InDegreeState {
            dog,
            in_degree: &mut *in_degree,
        };
        traversal::traverse::<InDegreeVisitor, _>(graph, comm, &mut state)?;
    }
    for v in graph.vertices().chain(graph.controllers()) {
        if in_degree[v] == 0 {
            round[v] = 0;
        }
    }
    comm.barrier()?;
    {
        let mut state = RoundState {
            dog,
            in_degree: &mut *in_degree,
            round: &mut *round,
        };
        traversal::traverse::<RoundVisitor, _>(graph, comm, &mut state)?;
    }
    let mut local_max = 0u32;
    for v in graph.vertices().chain(graph.controllers()) {
        round[v] -= 1;
        local_max = local_max.max(round[v]);
    }
    let global_max = comm.all_reduce(local_max, |a, b| a.max(b))?;
    Ok(global_max)
}

/// Logarithmic bin of a round; rounds 0 and 1 share bin 0.
fn log2_bin(round: u32) -> usize {
    (32 - round.leading_zeros()).saturating_sub(1) as usize
}

/// Groups this rank's wedge sources (vertices with outgoing directed edges)
/// into bins by round. Every rank produces the same number of bins because
/// the count comes from the global maximum round.
pub fn bin_sources(
    graph: &DistributedGraph,
    dog: &VertexData<DogAdjacency>,
    round: &VertexData<u32>,
    global_max_round: u32,
) -> Vec<Vec<VertexLocator>> {
    let mut bins = vec![Vec::new(); log2_bin(global_max_round) + 1];
    for v in graph.vertices().chain(graph.controllers()) {
        if !dog[v].is_empty() {
            bins[log2_bin(round[v])].push(v);
        }
    }
    bins
}
