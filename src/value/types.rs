//! Base-type and cardinality definitions for the typed value model

use std::fmt;

/// The scalar kind carried by single, multiple and ordered values
///
/// Record values have no container-level base type; each field carries its
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// Identifier token
    Identifier,
    /// Boolean value (true/false)
    Boolean,
    /// Integer numeric value
    Integer,
    /// IEEE double-precision numeric value
    Float,
    /// String value
    String,
    /// Point value (two integer coordinates)
    Point,
    /// Pair of identifiers (orientation-insensitive)
    Pair,
    /// Duration in seconds (non-negative)
    Duration,
    /// Reference to a stored file
    File,
    /// URI token
    Uri,
}

impl BaseType {
    /// All base types, in declaration order.
    pub const ALL: [BaseType; 10] = [
        BaseType::Identifier,
        BaseType::Boolean,
        BaseType::Integer,
        BaseType::Float,
        BaseType::String,
        BaseType::Point,
        BaseType::Pair,
        BaseType::Duration,
        BaseType::File,
        BaseType::Uri,
    ];

    /// The QTI attribute name for this base type.
    pub fn qti_name(&self) -> &'static str {
        match self {
            BaseType::Identifier => "identifier",
            BaseType::Boolean => "boolean",
            BaseType::Integer => "integer",
            BaseType::Float => "float",
            BaseType::String => "string",
            BaseType::Point => "point",
            BaseType::Pair => "pair",
            BaseType::Duration => "duration",
            BaseType::File => "file",
            BaseType::Uri => "uri",
        }
    }

    /// Parse a QTI attribute name back into a base type.
    pub fn from_qti_name(name: &str) -> Option<BaseType> {
        BaseType::ALL.iter().copied().find(|bt| bt.qti_name() == name)
    }

    /// Whether values of this base type participate in numeric operations
    /// such as weighting and mapped-response aggregation.
    pub fn is_numeric(&self) -> bool {
        matches!(self, BaseType::Integer | BaseType::Float)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qti_name())
    }
}

/// The shape of a value: one scalar, an unordered bag, a sequence, or a
/// named-field record
///
/// Null values carry no cardinality at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Exactly one scalar
    Single,
    /// Unordered bag of scalars, duplicates counted
    Multiple,
    /// Ordered sequence of scalars
    Ordered,
    /// Mapping from field identifier to scalar, base types may differ per field
    Record,
}

impl Cardinality {
    /// All cardinalities, in declaration order.
    pub const ALL: [Cardinality; 4] = [
        Cardinality::Single,
        Cardinality::Multiple,
        Cardinality::Ordered,
        Cardinality::Record,
    ];

    /// The QTI attribute name for this cardinality.
    pub fn qti_name(&self) -> &'static str {
        match self {
            Cardinality::Single => "single",
            Cardinality::Multiple => "multiple",
            Cardinality::Ordered => "ordered",
            Cardinality::Record => "record",
        }
    }

    /// Parse a QTI attribute name back into a cardinality.
    pub fn from_qti_name(name: &str) -> Option<Cardinality> {
        Cardinality::ALL
            .iter()
            .copied()
            .find(|c| c.qti_name() == name)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qti_name())
    }
}
