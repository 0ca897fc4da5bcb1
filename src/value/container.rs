//! The algebraic value carried by every assessment variable

use std::fmt;

use indexmap::IndexMap;

use crate::identifier::Identifier;
use crate::value::error::ValueError;
use crate::value::single::SingleValue;
use crate::value::types::{BaseType, Cardinality};

/// The value of an assessment variable
///
/// Every non-null value carries a [`Cardinality`] and, except for records, a
/// single [`BaseType`] shared by all of its elements. Empty multiple, ordered
/// and record containers are not representable: constructing one yields
/// [`Value::Null`], mirroring the treatment of empty containers in the QTI
/// information model.
#[derive(Clone)]
pub enum Value {
    /// The absence of a value; carries no cardinality or base type
    Null,
    /// Exactly one scalar
    Single(SingleValue),
    /// Unordered bag of scalars; duplicates are retained in storage but
    /// collapse under equality
    Multiple(Vec<SingleValue>),
    /// Ordered sequence of scalars
    Ordered(Vec<SingleValue>),
    /// Named fields, each with its own base type; insertion order is
    /// preserved for serialization but irrelevant to equality
    Record(IndexMap<Identifier, SingleValue>),
}

/// Checks that all elements share the base type of the first.
fn check_uniform_base_type(values: &[SingleValue]) -> Result<(), ValueError> {
    let mut elements = values.iter();
    let Some(first) = elements.next() else {
        return Ok(());
    };
    let expected = first.base_type();
    for element in elements {
        let found = element.base_type();
        if found != expected {
            return Err(ValueError::MixedBaseTypes { expected, found });
        }
    }
    Ok(())
}

impl Value {
    /// Wrap one scalar.
    pub fn single(value: impl Into<SingleValue>) -> Value {
        Value::Single(value.into())
    }

    /// Build a multiple (bag) value.
    ///
    /// Rejects mixed base types; an empty vector yields [`Value::Null`].
    pub fn multiple(values: Vec<SingleValue>) -> Result<Value, ValueError> {
        check_uniform_base_type(&values)?;
        if values.is_empty() {
            return Ok(Value::Null);
        }
        Ok(Value::Multiple(values))
    }

    /// Build an ordered (sequence) value.
    ///
    /// Rejects mixed base types; an empty vector yields [`Value::Null`].
    pub fn ordered(values: Vec<SingleValue>) -> Result<Value, ValueError> {
        check_uniform_base_type(&values)?;
        if values.is_empty() {
            return Ok(Value::Null);
        }
        Ok(Value::Ordered(values))
    }

    /// Build a record value; an empty map yields [`Value::Null`].
    pub fn record(fields: IndexMap<Identifier, SingleValue>) -> Value {
        if fields.is_empty() {
            return Value::Null;
        }
        Value::Record(fields)
    }

    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The cardinality, or `None` for null.
    pub fn cardinality(&self) -> Option<Cardinality> {
        match self {
            Value::Null => None,
            Value::Single(_) => Some(Cardinality::Single),
            Value::Multiple(_) => Some(Cardinality::Multiple),
            Value::Ordered(_) => Some(Cardinality::Ordered),
            Value::Record(_) => Some(Cardinality::Record),
        }
    }

    /// The shared base type, or `None` for null and record values.
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            Value::Null | Value::Record(_) => None,
            Value::Single(value) => Some(value.base_type()),
            // Construction guarantees uniformity and non-emptiness.
            Value::Multiple(values) | Value::Ordered(values) => {
                values.first().map(SingleValue::base_type)
            }
        }
    }

    /// The scalar, if this is a single value.
    pub fn as_single(&self) -> Option<&SingleValue> {
        match self {
            Value::Single(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric view of a single integer or float value.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_single().and_then(SingleValue::as_f64)
    }

    /// Number of scalar elements (0 for null, field count for records).
    pub fn element_count(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Single(_) => 1,
            Value::Multiple(values) | Value::Ordered(values) => values.len(),
            Value::Record(fields) => fields.len(),
        }
    }

    /// Whether the value contains the given scalar.
    ///
    /// For records this looks at field values, not field names.
    pub fn contains(&self, scalar: &SingleValue) -> bool {
        match self {
            Value::Null => false,
            Value::Single(value) => value == scalar,
            Value::Multiple(values) | Value::Ordered(values) => values.contains(scalar),
            Value::Record(fields) => fields.values().any(|value| value == scalar),
        }
    }
}

/// Set equality over bags: every element of each side appears in the other.
///
/// Element repeats collapse, so `{B,B,C}` equals `{C,B}`. Mutual containment
/// avoids hashing, which float elements do not support.
fn bag_set_eq(left: &[SingleValue], right: &[SingleValue]) -> bool {
    left.iter().all(|value| right.contains(value))
        && right.iter().all(|value| left.contains(value))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Single(a), Value::Single(b)) => a == b,
            (Value::Multiple(a), Value::Multiple(b)) => bag_set_eq(a, b),
            (Value::Ordered(a), Value::Ordered(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl From<SingleValue> for Value {
    fn from(value: SingleValue) -> Self {
        Value::Single(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Single(value) => write!(f, "{value}"),
            Value::Multiple(values) => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Ordered(values) => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Record(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect();
                write!(f, "({})", rendered.join(", "))
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cardinality() {
            None => f.write_str("Null"),
            Some(cardinality) => write!(f, "{cardinality}({self})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    #[test]
    fn empty_containers_are_null() {
        assert!(Value::multiple(vec![]).unwrap().is_null());
        assert!(Value::ordered(vec![]).unwrap().is_null());
        assert!(Value::record(IndexMap::new()).is_null());
    }

    #[test]
    fn null_has_no_cardinality_or_base_type() {
        assert_eq!(Value::Null.cardinality(), None);
        assert_eq!(Value::Null.base_type(), None);
    }

    #[test]
    fn mixed_base_types_are_rejected() {
        let result = Value::multiple(vec![SingleValue::Integer(1), SingleValue::Boolean(true)]);
        assert_eq!(
            result,
            Err(ValueError::MixedBaseTypes {
                expected: BaseType::Integer,
                found: BaseType::Boolean,
            })
        );
    }

    #[test]
    fn multiple_equality_collapses_repeats() {
        let bbc = Value::multiple(vec![
            SingleValue::Identifier(ident("B")),
            SingleValue::Identifier(ident("B")),
            SingleValue::Identifier(ident("C")),
        ])
        .unwrap();
        let cb = Value::multiple(vec![
            SingleValue::Identifier(ident("C")),
            SingleValue::Identifier(ident("B")),
        ])
        .unwrap();
        let bd = Value::multiple(vec![
            SingleValue::Identifier(ident("B")),
            SingleValue::Identifier(ident("D")),
        ])
        .unwrap();
        assert_eq!(bbc, cb);
        assert_ne!(bbc, bd);
        // Storage still retains the duplicates.
        assert_eq!(bbc.element_count(), 3);
    }

    #[test]
    fn ordered_equality_is_positional() {
        let ab = Value::ordered(vec![
            SingleValue::Identifier(ident("A")),
            SingleValue::Identifier(ident("B")),
        ])
        .unwrap();
        let ba = Value::ordered(vec![
            SingleValue::Identifier(ident("B")),
            SingleValue::Identifier(ident("A")),
        ])
        .unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn multiple_and_ordered_never_compare_equal() {
        let multiple = Value::multiple(vec![SingleValue::Integer(1)]).unwrap();
        let ordered = Value::ordered(vec![SingleValue::Integer(1)]).unwrap();
        assert_ne!(multiple, ordered);
    }

    #[test]
    fn records_allow_heterogeneous_fields() {
        let mut fields = IndexMap::new();
        fields.insert(ident("label"), SingleValue::String("q1".to_string()));
        fields.insert(ident("score"), SingleValue::Float(0.5));
        let record = Value::record(fields);
        assert_eq!(record.cardinality(), Some(Cardinality::Record));
        assert_eq!(record.base_type(), None);
        assert_eq!(record.element_count(), 2);
    }

    #[test]
    fn record_equality_ignores_field_order() {
        let mut forward = IndexMap::new();
        forward.insert(ident("a"), SingleValue::Integer(1));
        forward.insert(ident("b"), SingleValue::Integer(2));
        let mut backward = IndexMap::new();
        backward.insert(ident("b"), SingleValue::Integer(2));
        backward.insert(ident("a"), SingleValue::Integer(1));
        assert_eq!(Value::record(forward), Value::record(backward));
    }
}
