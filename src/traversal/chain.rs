//! Level chain configuration and resolution.
//!
//! The chain is an explicit ordered list of level descriptors, root
//! first. Each level names its dimension, its entity-id field, and (for
//! every level but the root) the parent-id field pointing one level up.
//! Keeping the ordering explicit means arbitrary depths work without
//! special-casing any particular number of levels.

use std::hash::Hash;

use crate::dataset::HierarchicalStore;
use crate::error::{Error, Result};

/// One level of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    dimension: String,
    entity_field: String,
    parent_field: Option<String>,
}

impl Level {
    /// Dimension the level's records are stored on.
    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    /// Field holding the level's entity ids.
    pub fn entity_field(&self) -> &str {
        &self.entity_field
    }

    /// Field holding immediate parent ids, absent at the root.
    pub fn parent_field(&self) -> Option<&str> {
        self.parent_field.as_deref()
    }
}

/// Direction of a resolved span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From an ancestor level toward a descendant level.
    Downward,
    /// From a descendant level toward an ancestor level.
    Upward,
}

/// Resolved sub-chain between two levels, as indices into the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Index of the level the span starts at.
    pub from: usize,
    /// Index of the level the span ends at.
    pub to: usize,
}

impl Span {
    /// Traversal direction. Identity spans report `Downward`.
    pub fn direction(&self) -> Direction {
        if self.from <= self.to {
            Direction::Downward
        } else {
            Direction::Upward
        }
    }

    /// Number of adjacent-level hops covered.
    pub fn hops(&self) -> usize {
        self.from.abs_diff(self.to)
    }

    /// Whether both endpoints are the same level.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

/// The ordered chain of levels, root to leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChain {
    levels: Vec<Level>,
}

impl LevelChain {
    /// Build the chain from entity-id and parent-id field names, resolving
    /// each field against the store and rejecting malformed configuration
    /// eagerly.
    ///
    /// `entity_fields` is ordered root to leaf; `parent_fields` has one
    /// entry per non-root level, in the same order.
    pub fn from_store<I, S>(
        store: &S,
        entity_fields: &[&str],
        parent_fields: &[&str],
    ) -> Result<Self>
    where
        I: Eq + Hash,
        S: HierarchicalStore<I>,
    {
        if entity_fields.is_empty() {
            return Err(Error::MalformedChain {
                message: "a chain needs at least one level".to_string(),
            });
        }
        if parent_fields.len() + 1 != entity_fields.len() {
            return Err(Error::MalformedChain {
                message: format!(
                    "{} entity fields need {} parent fields, got {}",
                    entity_fields.len(),
                    entity_fields.len() - 1,
                    parent_fields.len()
                ),
            });
        }

        let all_names: Vec<&str> = entity_fields
            .iter()
            .chain(parent_fields.iter())
            .copied()
            .collect();
        for (i, name) in all_names.iter().enumerate() {
            if all_names[..i].contains(name) {
                return Err(Error::MalformedChain {
                    message: format!("field '{name}' configured twice"),
                });
            }
        }

        let mut levels = Vec::with_capacity(entity_fields.len());
        for (i, &entity_field) in entity_fields.iter().enumerate() {
            let dimension = resolve_id_field(store, entity_field)?;
            if levels
                .iter()
                .any(|l: &Level| l.dimension == dimension)
            {
                return Err(Error::MalformedChain {
                    message: format!("dimension '{dimension}' used by two levels"),
                });
            }
            let parent_field = if i == 0 {
                None
            } else {
                let name = parent_fields[i - 1];
                let parent_dim = resolve_id_field(store, name)?;
                if parent_dim != dimension {
                    return Err(Error::MalformedChain {
                        message: format!(
                            "parent field '{name}' is stored on '{parent_dim}', \
                             expected '{dimension}'"
                        ),
                    });
                }
                Some(name.to_string())
            };
            levels.push(Level {
                dimension,
                entity_field: entity_field.to_string(),
                parent_field,
            });
        }

        Ok(Self { levels })
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the chain has no levels. Construction rejects this, so a
    /// built chain always returns `false`.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// All level descriptors, root first.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Level descriptor at a chain index.
    pub fn level(&self, index: usize) -> &Level {
        &self.levels[index]
    }

    /// The root level.
    pub fn root(&self) -> &Level {
        &self.levels[0]
    }

    /// The deepest level.
    pub fn leaf(&self) -> &Level {
        &self.levels[self.levels.len() - 1]
    }

    /// Resolve a level by entity-field name or dimension name.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.levels
            .iter()
            .position(|l| l.entity_field == name || l.dimension == name)
            .ok_or_else(|| Error::UnknownLevel {
                name: name.to_string(),
            })
    }

    /// Chain index of a dimension, if the dimension is part of the chain.
    pub fn index_of_dimension(&self, dimension: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.dimension == dimension)
    }

    /// Resolve the ordered sub-chain connecting two level names.
    ///
    /// In a linear chain any two configured levels are related, so the
    /// only failure here is an unknown name; operations that need a fixed
    /// direction check the resulting [`Span`] themselves.
    pub fn span(&self, from: &str, to: &str) -> Result<Span> {
        Ok(Span {
            from: self.index_of(from)?,
            to: self.index_of(to)?,
        })
    }
}

fn resolve_id_field<I, S>(store: &S, name: &str) -> Result<String>
where
    I: Eq + Hash,
    S: HierarchicalStore<I>,
{
    let dimension = store
        .dimension_of(name)
        .ok_or_else(|| Error::UnknownField {
            name: name.to_string(),
        })?
        .to_string();
    let data = store.field(&dimension, name)?;
    if data.as_ids().is_none() {
        return Err(Error::FieldKind {
            field: name.to_string(),
            expected: "identifier",
        });
    }
    Ok(dimension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ArrayDataset;

    fn three_level() -> ArrayDataset<i64> {
        ArrayDataset::builder()
            .dimension("nstorms", 2)
            .dimension("nflashes", 3)
            .dimension("nstrokes", 4)
            .ids("nstorms", "storm_id", vec![0, 1])
            .ids("nflashes", "flash_id", vec![1, 2, 3])
            .ids("nflashes", "flash_parent_storm_id", vec![0, 0, 1])
            .ids("nstrokes", "stroke_id", vec![4, 5, 6, 7])
            .ids("nstrokes", "stroke_parent_flash_id", vec![1, 1, 2, 3])
            .values("nstrokes", "stroke_power", vec![1.0, 2.0, 3.0, 4.0])
            .build()
            .unwrap()
    }

    fn chain(d: &ArrayDataset<i64>) -> LevelChain {
        LevelChain::from_store(
            d,
            &["storm_id", "flash_id", "stroke_id"],
            &["flash_parent_storm_id", "stroke_parent_flash_id"],
        )
        .unwrap()
    }

    #[test]
    fn test_chain_layout() {
        let d = three_level();
        let c = chain(&d);
        assert_eq!(c.len(), 3);
        assert_eq!(c.root().dimension(), "nstorms");
        assert_eq!(c.root().parent_field(), None);
        assert_eq!(c.leaf().entity_field(), "stroke_id");
        assert_eq!(c.level(1).parent_field(), Some("flash_parent_storm_id"));
    }

    #[test]
    fn test_index_of_accepts_field_or_dimension() {
        let d = three_level();
        let c = chain(&d);
        assert_eq!(c.index_of("flash_id").unwrap(), 1);
        assert_eq!(c.index_of("nflashes").unwrap(), 1);
        assert!(matches!(
            c.index_of("nope"),
            Err(Error::UnknownLevel { .. })
        ));
    }

    #[test]
    fn test_span_direction_and_hops() {
        let d = three_level();
        let c = chain(&d);
        let down = c.span("storm_id", "stroke_id").unwrap();
        assert_eq!(down.direction(), Direction::Downward);
        assert_eq!(down.hops(), 2);

        let up = c.span("stroke_id", "nstorms").unwrap();
        assert_eq!(up.direction(), Direction::Upward);

        let same = c.span("flash_id", "nflashes").unwrap();
        assert!(same.is_identity());
        assert_eq!(same.hops(), 0);
    }

    #[test]
    fn test_rejects_mismatched_field_counts() {
        let d = three_level();
        let err = LevelChain::from_store(
            &d,
            &["storm_id", "flash_id", "stroke_id"],
            &["flash_parent_storm_id"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedChain { .. }));
    }

    #[test]
    fn test_rejects_duplicate_configured_field() {
        let d = three_level();
        let err = LevelChain::from_store(
            &d,
            &["storm_id", "storm_id"],
            &["flash_parent_storm_id"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedChain { .. }));
    }

    #[test]
    fn test_rejects_parent_field_on_wrong_dimension() {
        let d = three_level();
        let err = LevelChain::from_store(
            &d,
            &["storm_id", "flash_id"],
            &["stroke_parent_flash_id"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedChain { .. }));
    }

    #[test]
    fn test_rejects_non_identifier_field() {
        let d = three_level();
        let err = LevelChain::from_store(
            &d,
            &["storm_id", "flash_id", "stroke_power"],
            &["flash_parent_storm_id", "stroke_parent_flash_id"],
        )
        .unwrap_err();
        assert!(matches!(err, Error::FieldKind { .. }));
    }

    #[test]
    fn test_rejects_empty_chain() {
        let d = three_level();
        let err = LevelChain::from_store(&d, &[], &[]).unwrap_err();
        assert!(matches!(err, Error::MalformedChain { .. }));
    }
}
