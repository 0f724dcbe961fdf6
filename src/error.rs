//! Crate-level error types

use crate::comm::CommError;
use crate::graph::GraphError;
use thiserror::Error;

/// Errors that abort a k-truss job.
///
/// There is no local recovery: any error on any rank surfaces immediately
/// and the remaining ranks fail through the communicator.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Communication failure between ranks
    #[error("Communication error: {0}")]
    Comm(#[from] CommError),

    /// Graph container error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Internal invariant violation, identifying the offending vertex
    #[error("Invariant violation at vertex {vertex}: {message}")]
    Invariant { vertex: u64, message: &'static str },
}

pub type EngineResult<T> = Result<T, EngineError>;
