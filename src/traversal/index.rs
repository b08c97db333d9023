//! Identifier-to-position indexing.
//!
//! Every traversal operation reduces to the same primitive: given a
//! level's entity-id sequence, find the position of an arbitrary id.
//! Ids are unsorted and non-contiguous, so the index is a hash map built
//! in one pass, giving O(N + Q) lookups for Q queries instead of an
//! O(N * Q) scan.

use std::collections::HashMap;
use std::hash::Hash;

/// Hash index from identifier to position within one level.
///
/// Ids are expected to be unique within a level. If a duplicate slips in,
/// the first occurrence wins; [`crate::validate::check_chain`] reports
/// duplicates so they can be fixed upstream.
#[derive(Debug, Clone)]
pub struct IdIndex<'a, I> {
    positions: HashMap<&'a I, usize>,
}

impl<'a, I> IdIndex<'a, I>
where
    I: Eq + Hash,
{
    /// Build the index over a level's id sequence.
    pub fn build(ids: &'a [I]) -> Self {
        let mut positions = HashMap::with_capacity(ids.len());
        for (pos, id) in ids.iter().enumerate() {
            let _ = positions.entry(id).or_insert(pos);
        }
        Self { positions }
    }

    /// Position of a single id, if present.
    pub fn get(&self, id: &I) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Whether an id is present.
    pub fn contains(&self, id: &I) -> bool {
        self.positions.contains_key(id)
    }

    /// Positions of each query id, `None` where absent.
    ///
    /// Absent ids are not an error; downstream pruning relies on partial
    /// matches being silently dropped.
    pub fn locate(&self, queries: &[I]) -> Vec<Option<usize>> {
        queries.iter().map(|id| self.get(id)).collect()
    }

    /// Number of distinct indexed ids.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_unsorted_ids() {
        let ids = [46i64, 4, 23, 9, 13];
        let index = IdIndex::build(&ids);
        assert_eq!(
            index.locate(&[13, 46, 7, 4]),
            vec![Some(4), Some(0), None, Some(1)]
        );
    }

    #[test]
    fn test_missing_id_is_none() {
        let ids = [1i64, 2, 3];
        let index = IdIndex::build(&ids);
        assert_eq!(index.get(&99), None);
        assert!(!index.contains(&99));
        assert!(index.contains(&2));
    }

    #[test]
    fn test_duplicate_first_occurrence_wins() {
        let ids = [7i64, 8, 7];
        let index = IdIndex::build(&ids);
        assert_eq!(index.get(&7), Some(0));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_empty_level() {
        let ids: [i64; 0] = [];
        let index = IdIndex::build(&ids);
        assert!(index.is_empty());
        assert_eq!(index.locate(&[1]), vec![None]);
    }

    #[test]
    fn test_string_ids() {
        let ids = ["cell-b".to_string(), "cell-a".to_string()];
        let index = IdIndex::build(&ids);
        assert_eq!(index.get(&"cell-a".to_string()), Some(1));
        assert_eq!(index.get(&"cell-z".to_string()), None);
    }
}
