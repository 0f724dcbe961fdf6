//! Bulk-synchronous visitor traversal
//!
//! A traversal seeds a visitor at every local source, then repeatedly
//! drains the local queue and exchanges the visitors that crossed a rank
//! boundary, until a global reduction sees no message in flight anywhere.
//! Message ordering between distinct source/destination pairs is not
//! guaranteed and visitor logic must not rely on it.
//!
//! Delegates are handled by one rule at this boundary: a visitor addressed
//! to a delegate is delivered on the sending rank's replica first, and a
//! replica that is not the master forwards it to the master without running
//! any hook. `pre_visit` and `visit` therefore only ever execute at the
//! authoritative owner of the target vertex.

use crate::comm::{Comm, CommError};
use crate::error::EngineResult;
use crate::graph::{DistributedGraph, VertexLocator};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

/// A message-sized unit of work addressed to one vertex.
///
/// Implementations are plain data records; batches are serialized whenever
/// they cross a rank boundary. The type parameter `S` bundles the
/// per-vertex maps and counters the pass mutates.
pub trait Visitor<S>: Copy + Serialize + DeserializeOwned + 'static {
    /// Visitor used to seed a traversal at a local source vertex.
    fn seed(vertex: VertexLocator) -> Self;

    /// Destination vertex of this visitor.
    fn target(&self) -> VertexLocator;

    /// Runs once per local source when the traversal starts; may queue
    /// visitors. The returned flag is visitor-specific and ignored by the
    /// driver.
    fn init_visit(
        &self,
        graph: &DistributedGraph,
        queue: &mut VisitorQueue<Self>,
        state: &mut S,
    ) -> EngineResult<bool>;

    /// Runs on delivery at the authoritative owner. Returning `true` asks
    /// the driver to invoke [`Visitor::visit`] as well.
    fn pre_visit(&self, graph: &DistributedGraph, state: &mut S) -> EngineResult<bool>;

    /// Final delivery stage at the owner; may queue further visitors.
    fn visit(
        &self,
        graph: &DistributedGraph,
        queue: &mut VisitorQueue<Self>,
        state: &mut S,
    ) -> EngineResult<bool>;
}

/// LIFO queue of visitors pending on one rank.
pub struct VisitorQueue<V> {
    pending: Vec<V>,
}

impl<V> VisitorQueue<V> {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Queues a visitor for eventual delivery.
    pub fn queue_visitor(&mut self, visitor: V) {
        self.pending.push(visitor);
    }

    fn pop(&mut self) -> Option<V> {
        self.pending.pop()
    }
}

/// Runs a visitor pass seeded at every local source (ordinary vertices and
/// controllers) to global quiescence.
pub fn traverse<V, S>(graph: &DistributedGraph, comm: &mut Comm, state: &mut S) -> EngineResult<()>
where
    V: Visitor<S>,
{
    let sources: Vec<VertexLocator> = graph.vertices().chain(graph.controllers()).collect();
    traverse_from::<V, S>(graph, comm, &sources, state)
}

/// Runs a visitor pass seeded only at the given local sources.
pub fn traverse_from<V, S>(
    graph: &DistributedGraph,
    comm: &mut Comm,
    sources: &[VertexLocator],
    state: &mut S,
) -> EngineResult<()>
where
    V: Visitor<S>,
{
    let rank = comm.rank();
    let ranks = comm.ranks();
    let mut queue = VisitorQueue::new();
    for &source in sources {
        V::seed(source).init_visit(graph, &mut queue, state)?;
    }

    let mut supersteps = 0u64;
    loop {
        let mut outbound: Vec<Vec<V>> = (0..ranks).map(|_| Vec::new()).collect();
        let mut sent = 0u64;
        while let Some(visitor) = queue.pop() {
            let target = visitor.target();
            if target.owner() != rank {
                // remote ordinary vertex, or a delegate whose local replica
                // is not the master and forwards without running hooks
                outbound[target.owner()].push(visitor);
                sent += 1;
                continue;
            }
            if visitor.pre_visit(graph, state)? {
                visitor.visit(graph, &mut queue, state)?;
            }
        }

        let mut encoded = Vec::with_capacity(ranks);
        for batch in &outbound {
            encoded.push(bincode::serialize(batch).map_err(CommError::from)?);
        }
        let inbound = comm.exchange(encoded)?;
        let in_flight = comm.all_reduce(sent, |a, b| a + b)?;
        for (from, payload) in inbound.into_iter().enumerate() {
            if from == rank {
                continue;
            }
            let batch: Vec<V> = bincode::deserialize(&payload).map_err(CommError::from)?;
            for visitor in batch {
                queue.queue_visitor(visitor);
            }
        }
        supersteps += 1;
        if in_flight == 0 {
            break;
        }
    }
    trace!("traversal quiesced after {} supersteps", supersteps);
    Ok(())
}
