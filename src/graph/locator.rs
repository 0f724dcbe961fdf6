//! Vertex locators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compact, totally ordered identifier for a vertex.
///
/// Ordinary vertices carry their owning rank and a local index on that
/// rank. Delegates carry the rank of their master replica and a global
/// delegate slot valid on every rank. The derived ordering (delegate flag,
/// then owner, then index) is arbitrary but identical on all ranks, which
/// is all the engine's priority tie-breaks need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexLocator {
    delegate: bool,
    owner: u16,
    index: u32,
}

impl VertexLocator {
    /// Locator for an ordinary vertex owned by `owner`.
    pub fn ordinary(owner: usize, index: u32) -> Self {
        Self {
            delegate: false,
            owner: owner as u16,
            index,
        }
    }

    /// Locator for delegate slot `slot`, mastered on `master`.
    pub fn delegate(master: usize, slot: u32) -> Self {
        Self {
            delegate: true,
            owner: master as u16,
            index: slot,
        }
    }

    /// Whether this vertex is replicated on every rank.
    pub fn is_delegate(&self) -> bool {
        self.delegate
    }

    /// Owning rank (the master rank for delegates).
    pub fn owner(&self) -> usize {
        self.owner as usize
    }

    /// Local index on the owner, or the global delegate slot.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for VertexLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.delegate {
            write!(f, "d{}@{}", self.index, self.owner)
        } else {
            write!(f, "v{}@{}", self.index, self.owner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_total_and_consistent() {
        let a = VertexLocator::ordinary(0, 5);
        let b = VertexLocator::ordinary(1, 0);
        let c = VertexLocator::delegate(0, 0);
        assert!(a < b);
        assert!(b < c, "ordinary vertices sort before delegates");
        assert_eq!(a, VertexLocator::ordinary(0, 5));
    }

    #[test]
    fn test_display() {
        assert_eq!(VertexLocator::ordinary(2, 7).to_string(), "v7@2");
        assert_eq!(VertexLocator::delegate(1, 3).to_string(), "d3@1");
    }
}
