//! ktruss
//!
//! A distributed k-truss decomposition engine. A k-truss is the maximal
//! edge-induced subgraph in which every edge lies in at least k-2 triangles
//! of the subgraph; the engine reports, for every k from 3 upward, how many
//! edges survive, and stops when none do.
//!
//! # Architecture
//!
//! The job runs as a fixed set of peer ranks that share nothing and
//! communicate only by message passing ([`comm`]). Each rank holds one
//! partition of the undirected graph ([`graph`]), with high-degree vertices
//! replicated as delegates behind a single master replica. Algorithm passes
//! are expressed as visitors — plain-data messages addressed to vertices —
//! driven to global quiescence by a bulk-synchronous queue ([`traversal`]).
//!
//! On top of that substrate, the engine ([`algo`]) peels the graph to its
//! 2-core, orients every surviving edge from its lower to its higher
//! endpoint under the `(degree, locator)` key, schedules vertices into
//! logarithmic bins by longest-path rounds, and counts triangles with a
//! probe/credit wedge sweep, pruning under-supported edges bin by bin until
//! each k-truss stabilizes.
//!
//! # Example
//!
//! ```rust
//! use ktruss::{ktruss_decomposition, Cluster, GraphBuilder, TrussConfig};
//!
//! // a triangle with a pendant edge: the 3-truss keeps the triangle
//! let builder = GraphBuilder::from_edges(&[(1, 2), (1, 3), (2, 3), (3, 4)]);
//! let cluster = Cluster::new(2);
//! let reports = cluster
//!     .run(|mut comm| {
//!         let graph = builder.build(comm.rank(), comm.ranks())?;
//!         ktruss_decomposition(&graph, &mut comm, &TrussConfig::default())
//!     })
//!     .unwrap();
//! assert_eq!(reports[0].max_k, 3);
//! ```

pub mod algo;
pub mod comm;
pub mod error;
pub mod graph;
pub mod traversal;

pub use algo::{ktruss, ktruss_decomposition, TrussConfig, TrussLevel, TrussReport};
pub use comm::{Cluster, Comm, CommError};
pub use error::{EngineError, EngineResult};
pub use graph::{DistributedGraph, GraphBuilder, GraphError, VertexData, VertexLocator};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
