//! k-truss engine
//!
//! The passes that make up the decomposition, in the order the pruning loop
//! runs them: 2-core reduction, degree-oriented orientation, round
//! assignment with logarithmic bins, and the wedge sweep that counts and
//! prunes triangles until the graph empties.

pub mod core2;
pub mod dog;
pub mod ktruss;
pub mod rounds;
pub mod wedges;

pub use core2::reduce_to_2core;
pub use dog::{build_dog, dog_stats, DogAdjacency, DogEdge, DogStats};
pub use ktruss::{ktruss, ktruss_decomposition, TrussConfig, TrussLevel, TrussReport};
pub use rounds::{assign_rounds, bin_sources};
pub use wedges::{sweep_wedges, WedgeTally};
