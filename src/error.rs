use core::fmt;

/// Result alias for `lineage`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by dataset access and chain traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A requested level name is not part of the configured chain.
    UnknownLevel {
        /// The name that failed to resolve.
        name: String,
    },

    /// Two levels were given in an order that is not ancestor-above-descendant.
    NotAncestor {
        /// Level that was required to be the ancestor.
        ancestor: String,
        /// Level that was required to be the descendant.
        descendant: String,
    },

    /// The deepest level of the chain has no child level to count into.
    LeafLevel {
        /// The requested level name.
        name: String,
    },

    /// An intermediate parent id could not be located while replicating
    /// ancestor ids in strict mode.
    BrokenAncestry {
        /// The target ancestor level of the replication.
        target: String,
        /// Index of the record whose ancestry is broken.
        record: usize,
    },

    /// Chain configuration rejected at construction.
    MalformedChain {
        /// Description of the configuration problem.
        message: String,
    },

    /// Dimension not present in the dataset.
    UnknownDimension {
        /// The missing dimension name.
        name: String,
    },

    /// Field not present in the dataset.
    UnknownField {
        /// The missing field name.
        name: String,
    },

    /// A dimension or field name was registered twice.
    DuplicateName {
        /// The repeated name.
        name: String,
    },

    /// A field's length disagrees with the dimension it is stored on.
    LengthMismatch {
        /// Field name.
        field: String,
        /// Length of the dimension.
        expected: usize,
        /// Length of the field data.
        found: usize,
    },

    /// A field holds a different category of data than the operation needs.
    FieldKind {
        /// Field name.
        field: String,
        /// Category the operation required.
        expected: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownLevel { name } => {
                write!(f, "level '{name}' is not part of the configured chain")
            }
            Error::NotAncestor {
                ancestor,
                descendant,
            } => {
                write!(f, "level '{ancestor}' is not an ancestor of '{descendant}'")
            }
            Error::LeafLevel { name } => {
                write!(f, "level '{name}' is the leaf of the chain and has no children")
            }
            Error::BrokenAncestry { target, record } => {
                write!(f, "ancestry toward level '{target}' is broken at record {record}")
            }
            Error::MalformedChain { message } => write!(f, "malformed chain: {message}"),
            Error::UnknownDimension { name } => write!(f, "no dimension named '{name}'"),
            Error::UnknownField { name } => write!(f, "no field named '{name}'"),
            Error::DuplicateName { name } => write!(f, "name '{name}' registered twice"),
            Error::LengthMismatch {
                field,
                expected,
                found,
            } => {
                write!(
                    f,
                    "field '{field}' has {found} entries, its dimension has {expected}"
                )
            }
            Error::FieldKind { field, expected } => {
                write!(f, "field '{field}' does not hold {expected} data")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
