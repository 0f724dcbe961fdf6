//! End-to-end decomposition scenarios
//!
//! Each scenario runs at 1, 2 and 3 ranks, both without delegates and with
//! a low delegate threshold that forces high-degree vertices through the
//! master-replica forwarding path.

mod common;

use common::{brute_force_levels, decompose};
use ktruss::TrussConfig;

fn scenario(edges: &[(u64, u64)], expected: &[(u32, u64)]) {
    assert_eq!(brute_force_levels(edges), expected, "scenario self-check");
    let config = TrussConfig::default();
    for ranks in 1..=3 {
        for threshold in [u32::MAX, 3] {
            assert_eq!(
                decompose(edges, ranks, threshold, &config),
                expected,
                "ranks = {ranks}, delegate threshold = {threshold}"
            );
        }
    }
}

#[test]
fn test_single_triangle() {
    scenario(&[(1, 2), (1, 3), (2, 3)], &[(3, 3), (4, 0)]);
}

#[test]
fn test_path_has_no_truss() {
    scenario(&[(1, 2), (2, 3), (3, 4)], &[(3, 0)]);
}

#[test]
fn test_k4_survives_to_k4() {
    let edges = [(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)];
    scenario(&edges, &[(3, 6), (4, 6), (5, 0)]);
}

#[test]
fn test_k5_survives_to_k5() {
    let edges: Vec<(u64, u64)> = (1..=5u64)
        .flat_map(|u| ((u + 1)..=5).map(move |v| (u, v)))
        .collect();
    scenario(&edges, &[(3, 10), (4, 10), (5, 10), (6, 0)]);
}

#[test]
fn test_two_triangles_sharing_an_edge() {
    // the shared edge alone cannot carry a 4-truss
    let edges = [(1, 2), (2, 3), (1, 3), (2, 4), (3, 4)];
    scenario(&edges, &[(3, 5), (4, 0)]);
}

#[test]
fn test_triangle_with_pendant_edge() {
    let edges = [(1, 2), (1, 3), (2, 3), (3, 4)];
    scenario(&edges, &[(3, 3), (4, 0)]);
}

#[test]
fn test_two_cliques_joined_by_a_bridge() {
    // K4 and a triangle joined by one edge: the bridge dies at k=3, the
    // triangle at k=4, the K4 at k=5
    let mut edges: Vec<(u64, u64)> = vec![(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)];
    edges.extend([(10, 11), (10, 12), (11, 12), (4, 10)]);
    scenario(&edges, &[(3, 9), (4, 6), (5, 0)]);
}

#[test]
fn test_self_loops_are_inert() {
    let edges = [(1, 2), (1, 3), (2, 3), (2, 2)];
    scenario(&edges, &[(3, 3), (4, 0)]);
}
