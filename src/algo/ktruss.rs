//! k-truss pruning loop
//!
//! Runs the passes in order: 2-core reduction once, orientation once, then
//! for every k from 3 upward a fresh round assignment, a binned wedge sweep
//! with the restart heuristic, and a pruning pre-pass for the next k. The
//! loop ends when no directed edge survives.

use super::core2::reduce_to_2core;
use super::dog::{build_dog, dog_stats, DogAdjacency};
use super::rounds::{assign_rounds, bin_sources};
use super::wedges::sweep_wedges;
use crate::comm::Comm;
use crate::error::EngineResult;
use crate::graph::{DistributedGraph, VertexData};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Tuning knobs for the pruning loop.
#[derive(Debug, Clone)]
pub struct TrussConfig {
    /// Deletions below this fraction of the remaining edges are carried
    /// forward to later bins instead of forcing an immediate recount. The
    /// final surviving edges do not depend on this value, only the message
    /// volume does.
    pub restart_fraction: f64,
}

impl Default for TrussConfig {
    fn default() -> Self {
        Self {
            restart_fraction: 0.01,
        }
    }
}

/// Surviving-edge count for one k.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrussLevel {
    pub k: u32,
    pub edges_remaining: u64,
}

/// Outcome of a full decomposition; identical on every rank.
#[derive(Debug, Clone)]
pub struct TrussReport {
    /// One entry per reported k, ending with the first empty one
    pub levels: Vec<TrussLevel>,
    /// Largest k whose truss is non-empty (2 for triangle-free graphs)
    pub max_k: u32,
    pub elapsed: Duration,
}

/// Runs the full decomposition with default configuration and returns the
/// largest k whose truss is non-empty.
pub fn ktruss(graph: &DistributedGraph, comm: &mut Comm) -> EngineResult<u64> {
    let report = ktruss_decomposition(graph, comm, &TrussConfig::default())?;
    Ok(report.max_k as u64)
}

/// Runs the full decomposition, reporting the surviving-edge count for
/// every k until the truss empties.
pub fn ktruss_decomposition(
    graph: &DistributedGraph,
    comm: &mut Comm,
    config: &TrussConfig,
) -> EngineResult<TrussReport> {
    let rank0 = comm.rank() == 0;
    let job_timer = Instant::now();

    let mut core2_degree = VertexData::new(graph, 0u32);
    let mut alive = VertexData::new(graph, true);
    let timer = Instant::now();
    reduce_to_2core(graph, comm, &mut core2_degree, &mut alive)?;
    if rank0 {
        info!(
            "2-core reduction complete in {:.3}s",
            timer.elapsed().as_secs_f64()
        );
    }

    let mut dog = VertexData::new(graph, DogAdjacency::new());
    let timer = Instant::now();
    build_dog(graph, comm, &core2_degree, &mut dog)?;
    if rank0 {
        info!(
            "degree-oriented graph built in {:.3}s",
            timer.elapsed().as_secs_f64()
        );
    }
    let stats = dog_stats(graph, comm, &dog)?;
    if rank0 {
        info!("global directed edge count = {}", stats.global_edge_count);
        info!("largest directed out-degree = {}", stats.max_out_degree);
        info!("largest original degree = {}", stats.max_degree);
    }

    let mut in_degree = VertexData::new(graph, 0u32);
    let mut round = VertexData::new(graph, 0u32);
    let mut levels = Vec::new();
    let mut global_edges_remain = 0u64;
    let mut k = 3u32;
    loop {
        let k_timer = Instant::now();
        let global_max_round = assign_rounds(graph, comm, &dog, &mut in_degree, &mut round)?;
        if rank0 {
            debug!("k = {}: global max round = {}", k, global_max_round);
        }
        let bins = bin_sources(graph, &dog, &round, global_max_round);

        let mut global_edges_deleted = 0u64;
        let mut local_edges_remain = 0u64;
        let mut bin_index = 0;
        while bin_index < bins.len() {
            let sources = &bins[bin_index];
            comm.barrier()?;
            let tally = sweep_wedges(graph, comm, sources, &mut dog)?;
            let global_wedges = comm.all_reduce(tally.wedges_checked, |a, b| a + b)?;
            if rank0 {
                debug!(
                    "bin {} of {}: {} wedges checked",
                    bin_index + 1,
                    bins.len(),
                    global_wedges
                );
            }

            let mut local_deleted = 0u64;
            for &source in sources {
                let adjacency = &mut dog[source];
                let before = adjacency.len();
                adjacency.retain(|_, edge| edge.triangle_count >= k - 2);
                local_deleted += (before - adjacency.len()) as u64;
                local_edges_remain += adjacency.len() as u64;
            }
            global_edges_deleted += comm.all_reduce(local_deleted, |a, b| a + b)?;

            let last_bin = bin_index + 1 == bins.len();
            let few = (global_edges_deleted as f64)
                < global_edges_remain as f64 * config.restart_fraction;
            if global_edges_deleted == 0 || (few && !last_bin) {
                bin_index += 1;
            } else {
                // deletions invalidate counts at later bins; recount from
                // the top with fresh counters
                if rank0 {
                    info!(
                        "restarting sweep -- deleted {} edges at bin {} of {}",
                        global_edges_deleted,
                        bin_index + 1,
                        bins.len()
                    );
                }
                local_edges_remain = 0;
                for v in graph.vertices().chain(graph.controllers()) {
                    for edge in dog[v].values_mut() {
                        edge.triangle_count = 0;
                    }
                }
                global_edges_deleted = 0;
                bin_index = 0;
            }
        }
        global_edges_remain = comm.all_reduce(local_edges_remain, |a, b| a + b)?;
        if rank0 {
            info!(
                "K = {}   global_edges_remain = {}  time = {:.3}s",
                k,
                global_edges_remain,
                k_timer.elapsed().as_secs_f64()
            );
        }
        levels.push(TrussLevel {
            k,
            edges_remaining: global_edges_remain,
        });

        // pre-pass prune for the next k; survivors start the next sweep at 0
        k += 1;
        let mut local_remaining = 0u64;
        for v in graph.vertices().chain(graph.controllers()) {
            let adjacency = &mut dog[v];
            adjacency.retain(|_, edge| {
                if edge.triangle_count >= k - 2 {
                    edge.triangle_count = 0;
                    true
                } else {
                    false
                }
            });
            local_remaining += adjacency.len() as u64;
        }
        let survivors_before = global_edges_remain;
        global_edges_remain = comm.all_reduce(local_remaining, |a, b| a + b)?;
        if global_edges_remain == 0 {
            if survivors_before > 0 {
                if rank0 {
                    info!("K = {}   global_edges_remain = 0", k);
                }
                levels.push(TrussLevel {
                    k,
                    edges_remaining: 0,
                });
            }
            break;
        }
    }

    let elapsed = job_timer.elapsed();
    if rank0 {
        info!("total k-truss time = {:.3}s", elapsed.as_secs_f64());
    }
    let max_k = levels
        .iter()
        .filter(|level| level.edges_remaining > 0)
        .map(|level| level.k)
        .max()
        .unwrap_or(2);
    Ok(TrussReport {
        levels,
        max_k,
        elapsed,
    })
}
