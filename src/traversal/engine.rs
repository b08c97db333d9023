//! The traversal engine: counting, replication, reduction.
//!
//! Every operation here is a bounded sequence of array scans and hash
//! lookups over already-resident data. Nothing walks object references,
//! nothing mutates the source dataset, and inter-level passes always run
//! in chain order because each depends on the previous level's result.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::dataset::HierarchicalStore;
use crate::error::{Error, Result};
use crate::traversal::chain::{Direction, LevelChain};
use crate::traversal::index::IdIndex;
use crate::validate::{Severity, ValidationIssue, ValidationReport};

/// Stateless-per-call traversal over a configured level chain.
///
/// Constructed once with a dataset reference and the ordered entity-id
/// and parent-id field names; malformed configuration is rejected here,
/// not at first call. All operations read the dataset and build fresh
/// outputs, so concurrent read-only use from several threads is safe.
///
/// ```text
/// storm_id   [0, 1, 2]                      root
/// flash_id   [1, 2, 3, 4, ...]              parent: flash_parent_storm_id
/// stroke_id  [4, 6, 7, 9, ...]              parent: stroke_parent_flash_id
/// trig_id    [1, 3, 5, 8, ...]              parent: trig_parent_stroke_id
/// ```
pub struct ChainTraversal<'a, I, S> {
    store: &'a S,
    chain: LevelChain,
    _ids: PhantomData<I>,
}

impl<'a, I, S> ChainTraversal<'a, I, S>
where
    I: Clone + Eq + Hash + 'a,
    S: HierarchicalStore<I>,
{
    /// Configure a traversal over `store`.
    ///
    /// `entity_fields` is ordered root to leaf; `parent_fields` has one
    /// entry per non-root level, in the same order.
    pub fn new(store: &'a S, entity_fields: &[&str], parent_fields: &[&str]) -> Result<Self> {
        let chain = LevelChain::from_store(store, entity_fields, parent_fields)?;
        debug!(levels = chain.len(), "configured level chain");
        Ok(Self {
            store,
            chain,
            _ids: PhantomData,
        })
    }

    /// The configured chain.
    pub fn chain(&self) -> &LevelChain {
        &self.chain
    }

    /// The dataset this traversal reads from.
    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Immediate child counts for each named level.
    ///
    /// Each output sequence has one entry per record of its named level,
    /// in that level's original id order, with 0 (never a gap) for ids
    /// that no child points at. Requesting the leaf level fails with
    /// [`Error::LeafLevel`].
    pub fn count_children(&self, levels: &[&str]) -> Result<Vec<Vec<usize>>> {
        levels
            .iter()
            .map(|name| self.immediate_child_counts(name))
            .collect()
    }

    /// Descendant counts at an arbitrary depth below `ancestor`.
    ///
    /// Composed transitively from adjacent parent links; precomputed
    /// multi-hop parent fields are never consulted. Records whose
    /// ancestry is broken at an intermediate hop contribute to no count.
    pub fn count_descendants(&self, ancestor: &str, descendant: &str) -> Result<Vec<usize>> {
        let span = self.chain.span(ancestor, descendant)?;
        if span.is_identity() || span.direction() == Direction::Upward {
            return Err(Error::NotAncestor {
                ancestor: ancestor.to_string(),
                descendant: descendant.to_string(),
            });
        }
        if span.hops() == 1 {
            return self.immediate_child_counts(ancestor);
        }
        let ancestors = self.ancestors_at(span.to, span.from)?;
        let entities = self.entity_ids(span.from)?;
        let mut frequency: HashMap<&I, usize> = HashMap::with_capacity(entities.len());
        for id in ancestors.iter().flatten() {
            *frequency.entry(id).or_insert(0) += 1;
        }
        Ok(entities
            .iter()
            .map(|id| frequency.get(id).copied().unwrap_or(0))
            .collect())
    }

    /// Replicate a stored one-hop parent field up to `target_level`.
    ///
    /// `field` holds, at some deep level, the id of each record's
    /// immediate parent. The result has one entry per record of that deep
    /// level, in its original order, carrying the record's ancestor id at
    /// `target_level`. A record whose ancestry cannot be located at an
    /// intermediate hop yields `None` without aborting the batch; use
    /// [`replicate_parent_ids_strict`](Self::replicate_parent_ids_strict)
    /// to turn the first gap into an error instead.
    ///
    /// When `target_level` is the immediate parent of the field's own
    /// level the values come back unchanged.
    pub fn replicate_parent_ids(&self, target_level: &str, field: &str) -> Result<Vec<Option<I>>> {
        let (deep, target) = self.replication_span(target_level, field)?;
        let dimension = self.chain.level(deep).dimension();
        let values = id_slice(self.store, dimension, field)?;
        let seed: Vec<Option<I>> = values.iter().cloned().map(Some).collect();
        self.walk_up(deep - 1, seed, target)
    }

    /// Strict-boundary variant of [`replicate_parent_ids`](Self::replicate_parent_ids).
    pub fn replicate_parent_ids_strict(&self, target_level: &str, field: &str) -> Result<Vec<I>> {
        self.replicate_parent_ids(target_level, field)?
            .into_iter()
            .enumerate()
            .map(|(record, id)| {
                id.ok_or_else(|| Error::BrokenAncestry {
                    target: target_level.to_string(),
                    record,
                })
            })
            .collect()
    }

    /// Reduce the whole hierarchy to the records structurally connected
    /// to a selection at one level.
    ///
    /// Records at `level` survive iff their id is selected (ids absent
    /// from the level are silently ignored). Below `level`, a record
    /// survives iff its immediate parent survived; above, an ancestor
    /// survives iff some surviving record points at it. Every level comes
    /// back as a stable filter of its original order, and every field
    /// stored on a chain dimension is carried through by positional
    /// filtering with its category intact. Cached count and multi-hop
    /// parent fields are filtered like any other field, never recomputed.
    /// Dimensions outside the chain are copied unchanged.
    ///
    /// An empty selection produces a dataset with every chain dimension
    /// at length zero.
    pub fn reduce_to_entities(&self, level: &str, selected: &[I]) -> Result<S> {
        let anchor = self.chain.index_of(level)?;
        let depth = self.chain.len();
        let mut keep: Vec<Vec<usize>> = vec![Vec::new(); depth];

        let wanted: HashSet<&I> = selected.iter().collect();
        let ids = self.entity_ids(anchor)?;
        let mut retained: HashSet<&'a I> = HashSet::new();
        for (pos, id) in ids.iter().enumerate() {
            if wanted.contains(id) {
                keep[anchor].push(pos);
                let _ = retained.insert(id);
            }
        }
        debug!(level = anchor, retained = keep[anchor].len(), "anchored selection");

        // Downward restriction: keep a record iff its parent survived.
        for index in anchor + 1..depth {
            let parents = self.parent_ids(index)?;
            let ids = self.entity_ids(index)?;
            let mut next: HashSet<&'a I> = HashSet::new();
            for (pos, parent) in parents.iter().enumerate() {
                if retained.contains(parent) {
                    keep[index].push(pos);
                    let _ = next.insert(&ids[pos]);
                }
            }
            debug!(level = index, retained = keep[index].len(), "downward restriction");
            retained = next;
        }

        // Upward generalization: keep an ancestor iff it is still pointed
        // at from below. The anchor level itself is exempt, so selecting
        // a childless entity keeps it.
        for index in (0..anchor).rev() {
            let parents_below = self.parent_ids(index + 1)?;
            let referenced: HashSet<&I> = keep[index + 1]
                .iter()
                .map(|&pos| &parents_below[pos])
                .collect();
            let ids = self.entity_ids(index)?;
            for (pos, id) in ids.iter().enumerate() {
                if referenced.contains(id) {
                    keep[index].push(pos);
                }
            }
            debug!(level = index, retained = keep[index].len(), "upward generalization");
        }

        self.assemble(&keep)
    }

    /// Compare a cached multi-hop parent field against composition from
    /// the adjacent links. Divergent and unlocatable records come back as
    /// warnings; no other operation ever consults the cache.
    pub fn audit_cached_parents(
        &self,
        target_level: &str,
        cached_field: &str,
    ) -> Result<ValidationReport> {
        let (deep, target) = self.replication_span(target_level, cached_field)?;
        let dimension = self.chain.level(deep).dimension();
        let cached = id_slice(self.store, dimension, cached_field)?;
        let derived = self.ancestors_at(deep, target)?;

        let mut report = ValidationReport::new();
        for (record, (stored, composed)) in cached.iter().zip(derived.iter()).enumerate() {
            match composed {
                Some(id) if id == stored => {}
                Some(_) => report.add(
                    ValidationIssue::new(
                        Severity::Warning,
                        format!("cached ancestor id in '{cached_field}' diverges from adjacent links"),
                    )
                    .with_record(record),
                ),
                None => report.add(
                    ValidationIssue::new(
                        Severity::Warning,
                        format!("ancestry below '{target_level}' cannot be composed"),
                    )
                    .with_record(record),
                ),
            }
        }
        Ok(report)
    }

    /// Resolve a (target ancestor level, one-hop parent field) pair to
    /// chain indices, rejecting pairs that do not point strictly upward.
    fn replication_span(&self, target_level: &str, field: &str) -> Result<(usize, usize)> {
        let target = self.chain.index_of(target_level)?;
        let dimension = self
            .store
            .dimension_of(field)
            .ok_or_else(|| Error::UnknownField {
                name: field.to_string(),
            })?;
        let deep = self
            .chain
            .index_of_dimension(dimension)
            .ok_or_else(|| Error::UnknownLevel {
                name: dimension.to_string(),
            })?;
        if deep == 0 || target >= deep {
            return Err(Error::NotAncestor {
                ancestor: target_level.to_string(),
                descendant: field.to_string(),
            });
        }
        Ok((deep, target))
    }

    /// Ancestor id at `target` for every record of level `deep`, composed
    /// from the authoritative adjacent parent fields.
    fn ancestors_at(&self, deep: usize, target: usize) -> Result<Vec<Option<I>>> {
        let seed: Vec<Option<I>> = self.parent_ids(deep)?.iter().cloned().map(Some).collect();
        self.walk_up(deep - 1, seed, target)
    }

    /// Map ids living at level `at` to ids at `target`, one hop at a time.
    /// Unlocatable ids collapse to `None` and stay there.
    fn walk_up(&self, mut at: usize, mut current: Vec<Option<I>>, target: usize) -> Result<Vec<Option<I>>> {
        while at > target {
            let index = IdIndex::build(self.entity_ids(at)?);
            let parents = self.parent_ids(at)?;
            for slot in current.iter_mut() {
                *slot = slot
                    .take()
                    .and_then(|id| index.get(&id))
                    .map(|pos| parents[pos].clone());
            }
            trace!(level = at, "replicated one hop up");
            at -= 1;
        }
        Ok(current)
    }

    fn immediate_child_counts(&self, name: &str) -> Result<Vec<usize>> {
        let index = self.chain.index_of(name)?;
        if index + 1 == self.chain.len() {
            return Err(Error::LeafLevel {
                name: name.to_string(),
            });
        }
        let entities = self.entity_ids(index)?;
        let parents = self.parent_ids(index + 1)?;
        let mut frequency: HashMap<&I, usize> = HashMap::with_capacity(entities.len());
        for id in parents {
            *frequency.entry(id).or_insert(0) += 1;
        }
        Ok(entities
            .iter()
            .map(|id| frequency.get(id).copied().unwrap_or(0))
            .collect())
    }

    fn entity_ids(&self, index: usize) -> Result<&'a [I]> {
        let level = self.chain.level(index);
        id_slice(self.store, level.dimension(), level.entity_field())
    }

    fn parent_ids(&self, index: usize) -> Result<&'a [I]> {
        let level = self.chain.level(index);
        match level.parent_field() {
            Some(field) => id_slice(self.store, level.dimension(), field),
            None => Err(Error::UnknownField {
                name: format!("parent field of '{}'", level.entity_field()),
            }),
        }
    }

    fn assemble(&self, keep: &[Vec<usize>]) -> Result<S> {
        let mut dimensions = Vec::new();
        let mut fields = Vec::new();
        for dimension in self.store.dimensions() {
            match self.chain.index_of_dimension(dimension) {
                Some(index) => {
                    let positions = &keep[index];
                    dimensions.push((dimension.to_string(), positions.len()));
                    for name in self.store.fields_of(dimension) {
                        let data = self.store.field(dimension, name)?;
                        fields.push((
                            dimension.to_string(),
                            name.to_string(),
                            data.take_positions(positions),
                        ));
                    }
                }
                None => {
                    dimensions.push((dimension.to_string(), self.store.dimension_len(dimension)?));
                    for name in self.store.fields_of(dimension) {
                        let data = self.store.field(dimension, name)?;
                        fields.push((dimension.to_string(), name.to_string(), data.clone()));
                    }
                }
            }
        }
        S::from_parts(dimensions, fields)
    }
}

fn id_slice<'s, I, S>(store: &'s S, dimension: &str, field: &str) -> Result<&'s [I]>
where
    S: HierarchicalStore<I>,
{
    store
        .field(dimension, field)?
        .as_ids()
        .ok_or_else(|| Error::FieldKind {
            field: field.to_string(),
            expected: "identifier",
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;
    use crate::dataset::ArrayDataset;

    fn three_level() -> ArrayDataset<i64> {
        ArrayDataset::builder()
            .dimension("nstorms", 2)
            .dimension("nflashes", 3)
            .dimension("nstrokes", 5)
            .ids("nstorms", "storm_id", vec![0, 1])
            .ids("nflashes", "flash_id", vec![10, 11, 12])
            .ids("nflashes", "flash_parent_storm_id", vec![0, 0, 1])
            .ids("nstrokes", "stroke_id", vec![7, 8, 9, 5, 6])
            .ids("nstrokes", "stroke_parent_flash_id", vec![10, 10, 11, 12, 12])
            .ids("nstrokes", "stroke_parent_storm_id", vec![0, 0, 0, 1, 1])
            .build()
            .unwrap()
    }

    fn traversal(d: &ArrayDataset<i64>) -> ChainTraversal<'_, i64, ArrayDataset<i64>> {
        ChainTraversal::new(
            d,
            &["storm_id", "flash_id", "stroke_id"],
            &["flash_parent_storm_id", "stroke_parent_flash_id"],
        )
        .unwrap()
    }

    #[test]
    fn test_leaf_level_has_no_children() {
        let d = three_level();
        let t = traversal(&d);
        assert_eq!(
            t.count_children(&["stroke_id"]).unwrap_err(),
            Error::LeafLevel {
                name: "stroke_id".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let d = three_level();
        let t = traversal(&d);
        assert!(matches!(
            t.count_children(&["bolt_id"]),
            Err(Error::UnknownLevel { .. })
        ));
    }

    #[test]
    fn test_count_descendants_requires_downward_span() {
        let d = three_level();
        let t = traversal(&d);
        assert!(matches!(
            t.count_descendants("stroke_id", "storm_id"),
            Err(Error::NotAncestor { .. })
        ));
        assert!(matches!(
            t.count_descendants("flash_id", "flash_id"),
            Err(Error::NotAncestor { .. })
        ));
    }

    #[test]
    fn test_replicate_rejects_non_ancestor_target() {
        let d = three_level();
        let t = traversal(&d);
        // Target at or below the field's own level points the wrong way.
        assert!(matches!(
            t.replicate_parent_ids("stroke_id", "stroke_parent_flash_id"),
            Err(Error::NotAncestor { .. })
        ));
        // A field stored at the root has no parent level to replicate.
        assert!(matches!(
            t.replicate_parent_ids("storm_id", "storm_id"),
            Err(Error::NotAncestor { .. })
        ));
    }

    #[test]
    fn test_broken_ancestry_is_soft_by_default() {
        let d = ArrayDataset::builder()
            .dimension("nstorms", 1)
            .dimension("nflashes", 2)
            .dimension("nstrokes", 2)
            .ids("nstorms", "storm_id", vec![0])
            .ids("nflashes", "flash_id", vec![10, 11])
            .ids("nflashes", "flash_parent_storm_id", vec![0, 0])
            .ids("nstrokes", "stroke_id", vec![1, 2])
            // Flash 99 does not exist; record 1's ancestry is broken.
            .ids("nstrokes", "stroke_parent_flash_id", vec![10, 99])
            .build()
            .unwrap();
        let t = ChainTraversal::new(
            &d,
            &["storm_id", "flash_id", "stroke_id"],
            &["flash_parent_storm_id", "stroke_parent_flash_id"],
        )
        .unwrap();

        let storms = t
            .replicate_parent_ids("storm_id", "stroke_parent_flash_id")
            .unwrap();
        assert_eq!(storms, vec![Some(0), None]);

        assert_eq!(
            t.replicate_parent_ids_strict("storm_id", "stroke_parent_flash_id")
                .unwrap_err(),
            Error::BrokenAncestry {
                target: "storm_id".to_string(),
                record: 1
            }
        );

        // The broken record contributes to no count.
        assert_eq!(
            t.count_descendants("storm_id", "stroke_id").unwrap(),
            vec![1]
        );
    }

    #[test]
    fn test_audit_cached_parents_flags_divergence() {
        let d = three_level();
        let t = traversal(&d);
        let clean = t
            .audit_cached_parents("storm_id", "stroke_parent_storm_id")
            .unwrap();
        assert!(clean.is_clean());

        let corrupted = ArrayDataset::builder()
            .dimension("nstorms", 2)
            .dimension("nflashes", 3)
            .dimension("nstrokes", 5)
            .ids("nstorms", "storm_id", vec![0, 1])
            .ids("nflashes", "flash_id", vec![10, 11, 12])
            .ids("nflashes", "flash_parent_storm_id", vec![0, 0, 1])
            .ids("nstrokes", "stroke_id", vec![7, 8, 9, 5, 6])
            .ids("nstrokes", "stroke_parent_flash_id", vec![10, 10, 11, 12, 12])
            .ids("nstrokes", "stroke_parent_storm_id", vec![0, 1, 0, 1, 1])
            .build()
            .unwrap();
        let t = ChainTraversal::new(
            &corrupted,
            &["storm_id", "flash_id", "stroke_id"],
            &["flash_parent_storm_id", "stroke_parent_flash_id"],
        )
        .unwrap();
        let report = t
            .audit_cached_parents("storm_id", "stroke_parent_storm_id")
            .unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].record, Some(1));
    }

    #[test]
    fn test_source_dataset_is_never_mutated() {
        let d = three_level();
        let before = d.clone();
        let t = traversal(&d);
        let _ = t.count_children(&["storm_id", "flash_id"]).unwrap();
        let _ = t.reduce_to_entities("flash_id", &[10]).unwrap();
        let _ = t.count_children(&["bolt_id"]).unwrap_err();
        assert_eq!(d, before);
    }
}
