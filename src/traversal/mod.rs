//! Traversal over a chain of one-to-many levels.
//!
//! # The Flat-Array Problem
//!
//! Hierarchical records are stored flat: each level is an ordered id
//! sequence, each non-root level a parallel parent-id sequence. There is
//! no tree in memory, so structural questions become array problems:
//!
//! ```text
//! Question                       │ Mechanism
//! ───────────────────────────────┼──────────────────────────────
//! "How many strokes per flash?"  │ Frequency table over parent ids
//! "Which storm owns trigger 31?" │ Hop-by-hop id replication
//! "Keep only these strokes"      │ Downward + upward set pruning
//! ```
//!
//! # Module Overview
//!
//! - [`index`]: hash-based identifier-to-position lookup, the primitive
//!   under everything else
//! - [`chain`]: the explicit ordered list of level descriptors and
//!   resolution between two level names
//! - [`engine`]: the three public operations built on top
//!
//! Relationships are restricted to a linear chain of one-to-many levels.
//! This is not a general graph library: no many-to-many links, no lateral
//! edges, and non-adjacent levels relate only by composing adjacent hops.

pub mod chain;
pub mod engine;
pub mod index;

pub use chain::{Direction, Level, LevelChain, Span};
pub use engine::ChainTraversal;
pub use index::IdIndex;
