//! Scalar values and their canonical string forms
//!
//! Every scalar has exactly one canonical string rendering (its [`Display`]
//! implementation) and a [`SingleValue::parse`] inverse; the serialization
//! layer writes and reads these strings verbatim, so
//! `parse(bt, v.to_string()) == v` must hold for every representable scalar.

use std::fmt;

use crate::identifier::Identifier;
use crate::value::error::ValueError;
use crate::value::types::BaseType;

/// A reference to a stored file
///
/// The engine only carries the opaque storage path; upload metadata (content
/// type, original file name) belongs to the storage layer that produced the
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef(String);

impl FileRef {
    /// Create a file reference from a non-empty storage path.
    pub fn new(path: &str) -> Result<Self, ValueError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(ValueError::malformed(BaseType::File, path));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The storage path.
    pub fn path(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One concrete typed scalar
///
/// The variant set mirrors [`BaseType`] one-to-one.
#[derive(Clone)]
pub enum SingleValue {
    /// Identifier token
    Identifier(Identifier),
    /// Boolean
    Boolean(bool),
    /// Integer
    Integer(i64),
    /// IEEE double
    Float(f64),
    /// String, preserved verbatim
    String(String),
    /// Point as (x, y) integer coordinates
    Point(i64, i64),
    /// Pair of identifiers; equality is orientation-insensitive
    Pair(Identifier, Identifier),
    /// Duration in non-negative seconds
    Duration(f64),
    /// Stored-file reference
    File(FileRef),
    /// URI token, kept opaque (relative references are permitted)
    Uri(String),
}

impl SingleValue {
    /// The base type of this scalar.
    pub fn base_type(&self) -> BaseType {
        match self {
            SingleValue::Identifier(_) => BaseType::Identifier,
            SingleValue::Boolean(_) => BaseType::Boolean,
            SingleValue::Integer(_) => BaseType::Integer,
            SingleValue::Float(_) => BaseType::Float,
            SingleValue::String(_) => BaseType::String,
            SingleValue::Point(_, _) => BaseType::Point,
            SingleValue::Pair(_, _) => BaseType::Pair,
            SingleValue::Duration(_) => BaseType::Duration,
            SingleValue::File(_) => BaseType::File,
            SingleValue::Uri(_) => BaseType::Uri,
        }
    }

    /// Parse the canonical string form of a scalar of the given base type.
    ///
    /// String values are taken verbatim; every other kind is
    /// whitespace-trimmed first. Booleans additionally accept the QTI content
    /// forms `1`/`0` (the canonical rendering is always `true`/`false`).
    pub fn parse(base_type: BaseType, text: &str) -> Result<SingleValue, ValueError> {
        let trimmed = text.trim();
        match base_type {
            BaseType::Identifier => Ok(SingleValue::Identifier(Identifier::parse(trimmed)?)),
            BaseType::Boolean => match trimmed {
                "true" | "1" => Ok(SingleValue::Boolean(true)),
                "false" | "0" => Ok(SingleValue::Boolean(false)),
                _ => Err(ValueError::malformed(base_type, text)),
            },
            BaseType::Integer => trimmed
                .parse::<i64>()
                .map(SingleValue::Integer)
                .map_err(|_| ValueError::malformed(base_type, text)),
            BaseType::Float => trimmed
                .parse::<f64>()
                .map(SingleValue::Float)
                .map_err(|_| ValueError::malformed(base_type, text)),
            BaseType::String => Ok(SingleValue::String(text.to_string())),
            BaseType::Point => {
                let mut parts = trimmed.split_whitespace();
                let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
                    return Err(ValueError::malformed(base_type, text));
                };
                let x = x
                    .parse::<i64>()
                    .map_err(|_| ValueError::malformed(base_type, text))?;
                let y = y
                    .parse::<i64>()
                    .map_err(|_| ValueError::malformed(base_type, text))?;
                Ok(SingleValue::Point(x, y))
            }
            BaseType::Pair => {
                let mut parts = trimmed.split_whitespace();
                let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(ValueError::malformed(base_type, text));
                };
                Ok(SingleValue::Pair(
                    Identifier::parse(first)?,
                    Identifier::parse(second)?,
                ))
            }
            BaseType::Duration => {
                let seconds = trimmed
                    .parse::<f64>()
                    .map_err(|_| ValueError::malformed(base_type, text))?;
                SingleValue::duration(seconds)
            }
            BaseType::File => Ok(SingleValue::File(FileRef::new(text)?)),
            BaseType::Uri => {
                if trimmed.is_empty() {
                    return Err(ValueError::malformed(base_type, text));
                }
                Ok(SingleValue::Uri(trimmed.to_string()))
            }
        }
    }

    /// Create a duration scalar, rejecting negative seconds.
    pub fn duration(seconds: f64) -> Result<SingleValue, ValueError> {
        if seconds < 0.0 {
            return Err(ValueError::NegativeDuration(seconds));
        }
        Ok(SingleValue::Duration(seconds))
    }

    /// Numeric view of this scalar, if it has one.
    ///
    /// Only integers and floats are numeric for weighting purposes; durations
    /// deliberately are not.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SingleValue::Integer(i) => Some(*i as f64),
            SingleValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether this scalar participates in numeric operations.
    pub fn is_numeric(&self) -> bool {
        self.base_type().is_numeric()
    }
}

impl PartialEq for SingleValue {
    fn eq(&self, other: &Self) -> bool {
        use SingleValue::*;
        match (self, other) {
            (Identifier(a), Identifier(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Point(ax, ay), Point(bx, by)) => ax == bx && ay == by,
            // Pairs are associations: orientation does not matter.
            (Pair(a1, a2), Pair(b1, b2)) => {
                (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1)
            }
            (Duration(a), Duration(b)) => a == b,
            (File(a), File(b)) => a == b,
            (Uri(a), Uri(b)) => a == b,
            _ => false,
        }
    }
}

/// Canonical string form, shared with the serialization layer.
impl fmt::Display for SingleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingleValue::Identifier(identifier) => write!(f, "{identifier}"),
            SingleValue::Boolean(b) => write!(f, "{b}"),
            SingleValue::Integer(i) => write!(f, "{i}"),
            SingleValue::Float(value) => write!(f, "{value}"),
            SingleValue::String(s) => f.write_str(s),
            SingleValue::Point(x, y) => write!(f, "{x} {y}"),
            SingleValue::Pair(first, second) => write!(f, "{first} {second}"),
            SingleValue::Duration(seconds) => write!(f, "{seconds}"),
            SingleValue::File(file) => write!(f, "{file}"),
            SingleValue::Uri(uri) => f.write_str(uri),
        }
    }
}

impl fmt::Debug for SingleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.base_type(), self)
    }
}

impl From<bool> for SingleValue {
    fn from(value: bool) -> Self {
        SingleValue::Boolean(value)
    }
}

impl From<i64> for SingleValue {
    fn from(value: i64) -> Self {
        SingleValue::Integer(value)
    }
}

impl From<f64> for SingleValue {
    fn from(value: f64) -> Self {
        SingleValue::Float(value)
    }
}

impl From<&str> for SingleValue {
    fn from(value: &str) -> Self {
        SingleValue::String(value.to_string())
    }
}

impl From<Identifier> for SingleValue {
    fn from(value: Identifier) -> Self {
        SingleValue::Identifier(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    #[test]
    fn canonical_strings_round_trip() {
        let samples = [
            SingleValue::Identifier(ident("CHOICE_A")),
            SingleValue::Boolean(true),
            SingleValue::Boolean(false),
            SingleValue::Integer(-42),
            SingleValue::Float(3.25),
            SingleValue::Float(1.0),
            SingleValue::String("hello  world".to_string()),
            SingleValue::Point(10, -20),
            SingleValue::Pair(ident("A"), ident("B")),
            SingleValue::duration(12.5).unwrap(),
            SingleValue::File(FileRef::new("uploads/essay-1.txt").unwrap()),
            SingleValue::Uri("../items/item-1.xml".to_string()),
        ];
        for value in samples {
            let text = value.to_string();
            let reparsed = SingleValue::parse(value.base_type(), &text).unwrap();
            assert_eq!(reparsed, value, "round-trip failed for {text:?}");
        }
    }

    #[test]
    fn boolean_accepts_content_forms_only() {
        assert_eq!(
            SingleValue::parse(BaseType::Boolean, "1").unwrap(),
            SingleValue::Boolean(true)
        );
        assert_eq!(
            SingleValue::parse(BaseType::Boolean, " false ").unwrap(),
            SingleValue::Boolean(false)
        );
        assert!(SingleValue::parse(BaseType::Boolean, "TRUE").is_err());
        assert!(SingleValue::parse(BaseType::Boolean, "yes").is_err());
    }

    #[test]
    fn point_requires_two_coordinates() {
        assert_eq!(
            SingleValue::parse(BaseType::Point, "10 20").unwrap(),
            SingleValue::Point(10, 20)
        );
        assert!(SingleValue::parse(BaseType::Point, "10").is_err());
        assert!(SingleValue::parse(BaseType::Point, "10 20 30").is_err());
        assert!(SingleValue::parse(BaseType::Point, "10 twenty").is_err());
    }

    #[test]
    fn pair_equality_ignores_orientation() {
        let ab = SingleValue::Pair(ident("A"), ident("B"));
        let ba = SingleValue::Pair(ident("B"), ident("A"));
        let ac = SingleValue::Pair(ident("A"), ident("C"));
        assert_eq!(ab, ba);
        assert_ne!(ab, ac);
        // The stored orientation is preserved for serialization.
        assert_eq!(ab.to_string(), "A B");
        assert_eq!(ba.to_string(), "B A");
    }

    #[test]
    fn duration_rejects_negative_seconds() {
        assert!(SingleValue::duration(0.0).is_ok());
        assert_eq!(
            SingleValue::duration(-1.5),
            Err(ValueError::NegativeDuration(-1.5))
        );
        assert!(SingleValue::parse(BaseType::Duration, "-3").is_err());
    }

    #[test]
    fn string_text_is_preserved_verbatim() {
        let parsed = SingleValue::parse(BaseType::String, "  padded  ").unwrap();
        assert_eq!(parsed, SingleValue::String("  padded  ".to_string()));
    }

    #[test]
    fn numeric_view() {
        assert_eq!(SingleValue::Integer(4).as_f64(), Some(4.0));
        assert_eq!(SingleValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(SingleValue::duration(4.0).unwrap().as_f64(), None);
        assert_eq!(SingleValue::Boolean(true).as_f64(), None);
    }
}
