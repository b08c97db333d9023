//! # lineage
//!
//! Consistent structural traversal over strictly hierarchical record chains
//! stored as flat identifier arrays: child counting, ancestor replication,
//! and bidirectional pruning.
//!
//! **Default build** is traversal-first (minimal dependencies). Parallel
//! field filtering and serde support are opt-in via feature flags.
//!
//! A chain is an ordered list of levels, root to leaf. Each level is a
//! flat ordered sequence of entity ids; each non-root level carries a
//! parallel parent-id sequence pointing one level up:
//!
//! ```text
//! storms    [0, 1, 2]
//! flashes   [1, 2, 3, 4, 5, 6, 7, 8]      parents [0, 0, 0, 2, 2, 2, 2, 2]
//! strokes   [4, 6, 7, 9, 13, ...]         parents [1, 1, 2, 3, 4, ...]
//! triggers  [1, 3, 5, 8, 9, ...]          parents [4, 4, 4, 4, 6, ...]
//! ```
//!
//! [`ChainTraversal`] answers structural questions over such chains using
//! only id-to-position hashing and array masking:
//!
//! - [`ChainTraversal::count_children`]: children per record, at any level
//! - [`ChainTraversal::replicate_parent_ids`]: an ancestor's id propagated
//!   down to a deep level, any number of hops
//! - [`ChainTraversal::reduce_to_entities`]: a new dataset holding exactly
//!   the records structurally connected to a selection
//!
//! Datasets stay behind the [`HierarchicalStore`] boundary; the in-memory
//! [`ArrayDataset`] is provided for assembling and filtering them.

pub mod dataset;
/// Error types used across `lineage`.
pub mod error;
pub mod traversal;
pub mod validate;


pub use crate::dataset::{ArrayDataset, DatasetBuilder, FieldData, HierarchicalStore};
pub use crate::traversal::{ChainTraversal, Direction, IdIndex, Level, LevelChain, Span};
pub use crate::validate::{
    check_chain, ChainHealth, Severity, ValidationIssue, ValidationReport,
};

pub use error::{Error, Result};
