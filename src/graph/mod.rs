//! Distributed graph container
//!
//! A partitioned, undirected graph handle plus the typed per-vertex state
//! maps the engine's passes mutate. Every vertex has exactly one owner
//! rank; high-degree vertices become delegates, replicated on every rank
//! with one designated master replica holding the authoritative state and
//! adjacency.

mod builder;
mod distributed;
mod locator;
mod vertex_data;

pub use builder::GraphBuilder;
pub use distributed::DistributedGraph;
pub use locator::VertexLocator;
pub use vertex_data::VertexData;

use thiserror::Error;

/// Errors from graph construction and lookup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// Requested a partition for a rank outside the cluster
    #[error("rank {rank} is out of range for a cluster of {ranks} ranks")]
    RankOutOfRange { rank: usize, ranks: usize },

    /// A cluster of zero ranks cannot hold a graph
    #[error("cluster must have at least one rank")]
    NoRanks,
}

pub type GraphResult<T> = Result<T, GraphError>;
