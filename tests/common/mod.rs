//! Shared helpers for the end-to-end tests

use ktruss::{ktruss_decomposition, Cluster, EngineResult, GraphBuilder, TrussConfig, TrussReport};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Runs the full decomposition and returns the per-k surviving-edge counts,
/// asserting along the way that every rank reports the same thing.
pub fn decompose(
    edges: &[(u64, u64)],
    ranks: usize,
    delegate_threshold: u32,
    config: &TrussConfig,
) -> Vec<(u32, u64)> {
    let _ = tracing_subscriber::fmt::try_init();
    let builder = GraphBuilder::from_edges(edges).with_delegate_threshold(delegate_threshold);
    let cluster = Cluster::new(ranks).with_timeout(Duration::from_secs(10));
    let reports = cluster
        .run(|mut comm| -> EngineResult<TrussReport> {
            let graph = builder.build(comm.rank(), comm.ranks())?;
            ktruss_decomposition(&graph, &mut comm, config)
        })
        .unwrap();
    let levels = report_levels(&reports[0]);
    for report in &reports[1..] {
        assert_eq!(
            report_levels(report),
            levels,
            "ranks disagree on the decomposition"
        );
    }
    levels
}

pub fn report_levels(report: &TrussReport) -> Vec<(u32, u64)> {
    report
        .levels
        .iter()
        .map(|level| (level.k, level.edges_remaining))
        .collect()
}

/// Brute-force reference: iteratively removes edges supported by fewer than
/// k-2 triangles until stable, for every k until the graph empties.
pub fn brute_force_levels(edges: &[(u64, u64)]) -> Vec<(u32, u64)> {
    let mut surviving: HashSet<(u64, u64)> = edges
        .iter()
        .map(|&(u, v)| if u <= v { (u, v) } else { (v, u) })
        .filter(|&(u, v)| u != v)
        .collect();
    let mut levels = Vec::new();
    let mut k = 3u32;
    loop {
        loop {
            let adjacency = adjacency_of(&surviving);
            let doomed: Vec<(u64, u64)> = surviving
                .iter()
                .filter(|&&(u, v)| (support(&adjacency, u, v) as u64) < (k - 2) as u64)
                .copied()
                .collect();
            if doomed.is_empty() {
                break;
            }
            for edge in doomed {
                surviving.remove(&edge);
            }
        }
        levels.push((k, surviving.len() as u64));
        if surviving.is_empty() {
            break;
        }
        k += 1;
    }
    levels
}

fn adjacency_of(edges: &HashSet<(u64, u64)>) -> HashMap<u64, HashSet<u64>> {
    let mut adjacency: HashMap<u64, HashSet<u64>> = HashMap::new();
    for &(u, v) in edges {
        adjacency.entry(u).or_default().insert(v);
        adjacency.entry(v).or_default().insert(u);
    }
    adjacency
}

/// Number of triangles the edge {u, v} participates in.
fn support(adjacency: &HashMap<u64, HashSet<u64>>, u: u64, v: u64) -> usize {
    match (adjacency.get(&u), adjacency.get(&v)) {
        (Some(nu), Some(nv)) => nu.intersection(nv).count(),
        _ => 0,
    }
}
