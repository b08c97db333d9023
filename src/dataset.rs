//! The hierarchical dataset collaborator.
//!
//! A dataset is a set of named **dimensions**, each an ordered sequence of
//! records, and a set of named **fields**, each stored on exactly one
//! dimension with one scalar entry per record. Field names are unique
//! across the whole dataset, so a field name alone identifies both the
//! data and the dimension it lives on.
//!
//! The traversal engine touches datasets only through the
//! [`HierarchicalStore`] trait: read a field, know a dimension's length,
//! and assemble a new dataset from filtered parts. It deliberately offers
//! no slicing, joining, or grouping; the engine re-derives those from flat
//! arrays and parent links.

use crate::error::{Error, Result};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Storage for one field: a flat ordered sequence of scalars.
///
/// Two categories exist and are preserved through positional filtering:
/// identifier-typed data (entity ids, parent ids) and attached numeric
/// attributes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldData<I> {
    /// Identifier-typed field.
    Ids(Vec<I>),
    /// Attached numeric attribute.
    Values(Vec<f64>),
}

impl<I> FieldData<I> {
    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            FieldData::Ids(ids) => ids.len(),
            FieldData::Values(values) => values.len(),
        }
    }

    /// Whether the field has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View as identifier data, if that is what this field holds.
    pub fn as_ids(&self) -> Option<&[I]> {
        match self {
            FieldData::Ids(ids) => Some(ids),
            FieldData::Values(_) => None,
        }
    }

    /// View as numeric attribute data, if that is what this field holds.
    pub fn as_values(&self) -> Option<&[f64]> {
        match self {
            FieldData::Values(values) => Some(values),
            FieldData::Ids(_) => None,
        }
    }

    /// Stable positional filter preserving the storage category.
    ///
    /// Panics if a position is out of bounds; callers are expected to
    /// derive positions from this field's own dimension.
    pub fn take_positions(&self, positions: &[usize]) -> FieldData<I>
    where
        I: Clone,
    {
        match self {
            FieldData::Ids(ids) => {
                FieldData::Ids(positions.iter().map(|&p| ids[p].clone()).collect())
            }
            FieldData::Values(values) => {
                #[cfg(feature = "rayon")]
                {
                    FieldData::Values(positions.par_iter().map(|&p| values[p]).collect())
                }
                #[cfg(not(feature = "rayon"))]
                {
                    FieldData::Values(positions.iter().map(|&p| values[p]).collect())
                }
            }
        }
    }
}

/// Read and construction boundary between a dataset and the traversal engine.
pub trait HierarchicalStore<I> {
    /// Length of a dimension.
    fn dimension_len(&self, dimension: &str) -> Result<usize>;

    /// Read a field stored on the given dimension.
    fn field(&self, dimension: &str, name: &str) -> Result<&FieldData<I>>;

    /// The dimension a field is stored on, if the field exists.
    fn dimension_of(&self, field: &str) -> Option<&str>;

    /// All dimension names, in insertion order.
    fn dimensions(&self) -> Vec<&str>;

    /// Names of the fields stored on a dimension, in insertion order.
    fn fields_of(&self, dimension: &str) -> Vec<&str>;

    /// Assemble a new dataset from dimension lengths and per-field data.
    ///
    /// Each field entry is `(dimension, name, data)`. Implementations must
    /// reject fields whose length disagrees with their dimension.
    fn from_parts(
        dimensions: Vec<(String, usize)>,
        fields: Vec<(String, String, FieldData<I>)>,
    ) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct FieldEntry<I> {
    name: String,
    dimension: String,
    data: FieldData<I>,
}

/// In-memory hierarchical dataset.
///
/// Dimension and field insertion order is preserved, so datasets built
/// from the same parts in the same order compare equal and filtered
/// outputs are deterministic.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayDataset<I> {
    dimensions: Vec<(String, usize)>,
    fields: Vec<FieldEntry<I>>,
}

impl<I> ArrayDataset<I> {
    /// Start building a dataset.
    pub fn builder() -> DatasetBuilder<I> {
        DatasetBuilder::new()
    }

    /// Read a field by name alone.
    pub fn field_data(&self, name: &str) -> Result<&FieldData<I>> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.data)
            .ok_or_else(|| Error::UnknownField {
                name: name.to_string(),
            })
    }

    /// Read an identifier field by name alone.
    pub fn ids(&self, name: &str) -> Result<&[I]> {
        self.field_data(name)?
            .as_ids()
            .ok_or_else(|| Error::FieldKind {
                field: name.to_string(),
                expected: "identifier",
            })
    }

    /// Read a numeric attribute field by name alone.
    pub fn values(&self, name: &str) -> Result<&[f64]> {
        self.field_data(name)?
            .as_values()
            .ok_or_else(|| Error::FieldKind {
                field: name.to_string(),
                expected: "numeric",
            })
    }

    fn check(
        dimensions: &[(String, usize)],
        fields: &[FieldEntry<I>],
    ) -> Result<()> {
        for (i, (name, _)) in dimensions.iter().enumerate() {
            if dimensions[..i].iter().any(|(other, _)| other == name) {
                return Err(Error::DuplicateName { name: name.clone() });
            }
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|other| other.name == field.name) {
                return Err(Error::DuplicateName {
                    name: field.name.clone(),
                });
            }
            let len = dimensions
                .iter()
                .find(|(name, _)| *name == field.dimension)
                .map(|&(_, len)| len)
                .ok_or_else(|| Error::UnknownDimension {
                    name: field.dimension.clone(),
                })?;
            if field.data.len() != len {
                return Err(Error::LengthMismatch {
                    field: field.name.clone(),
                    expected: len,
                    found: field.data.len(),
                });
            }
        }
        Ok(())
    }
}

impl<I> HierarchicalStore<I> for ArrayDataset<I> {
    fn dimension_len(&self, dimension: &str) -> Result<usize> {
        self.dimensions
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|&(_, len)| len)
            .ok_or_else(|| Error::UnknownDimension {
                name: dimension.to_string(),
            })
    }

    fn field(&self, dimension: &str, name: &str) -> Result<&FieldData<I>> {
        let entry = self
            .fields
            .iter()
            .find(|f| f.name == name && f.dimension == dimension)
            .ok_or_else(|| Error::UnknownField {
                name: name.to_string(),
            })?;
        Ok(&entry.data)
    }

    fn dimension_of(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.dimension.as_str())
    }

    fn dimensions(&self) -> Vec<&str> {
        self.dimensions.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn fields_of(&self, dimension: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.dimension == dimension)
            .map(|f| f.name.as_str())
            .collect()
    }

    fn from_parts(
        dimensions: Vec<(String, usize)>,
        fields: Vec<(String, String, FieldData<I>)>,
    ) -> Result<Self> {
        let fields: Vec<FieldEntry<I>> = fields
            .into_iter()
            .map(|(dimension, name, data)| FieldEntry {
                name,
                dimension,
                data,
            })
            .collect();
        Self::check(&dimensions, &fields)?;
        Ok(Self { dimensions, fields })
    }
}

/// Chained construction of an [`ArrayDataset`], validated at `build`.
#[derive(Debug, Clone)]
pub struct DatasetBuilder<I> {
    dimensions: Vec<(String, usize)>,
    fields: Vec<FieldEntry<I>>,
}

impl<I> DatasetBuilder<I> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            dimensions: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Declare a dimension with a fixed record count.
    pub fn dimension(mut self, name: impl Into<String>, len: usize) -> Self {
        self.dimensions.push((name.into(), len));
        self
    }

    /// Attach an identifier field to a dimension.
    pub fn ids(
        mut self,
        dimension: impl Into<String>,
        name: impl Into<String>,
        ids: Vec<I>,
    ) -> Self {
        self.fields.push(FieldEntry {
            name: name.into(),
            dimension: dimension.into(),
            data: FieldData::Ids(ids),
        });
        self
    }

    /// Attach a numeric attribute field to a dimension.
    pub fn values(
        mut self,
        dimension: impl Into<String>,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Self {
        self.fields.push(FieldEntry {
            name: name.into(),
            dimension: dimension.into(),
            data: FieldData::Values(values),
        });
        self
    }

    /// Validate lengths and name uniqueness, producing the dataset.
    pub fn build(self) -> Result<ArrayDataset<I>> {
        ArrayDataset::check(&self.dimensions, &self.fields)?;
        Ok(ArrayDataset {
            dimensions: self.dimensions,
            fields: self.fields,
        })
    }
}

impl<I> Default for DatasetBuilder<I> {
    fn default() -> Self {
        Self::new()
    }
}
