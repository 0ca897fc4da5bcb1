//! Identifier grammars for variable names and cross-item references
//!
//! Three flavours are used throughout the engine: plain [`Identifier`]s for
//! variable and node names, [`ComplexReferenceIdentifier`]s which may carry a
//! single embedded dot as one opaque token, and [`VariableReferenceIdentifier`]s
//! which are the split form (a bare local name, or an `itemRef.variable` pair).

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing identifier text
///
/// Positions are 1-based character positions into the offending string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The supplied text was empty
    #[error("identifier text is empty")]
    Empty,

    /// The first character may only be a letter or underscore
    #[error("invalid identifier start character '{ch}' at position 1")]
    InvalidStart {
        /// The offending character
        ch: char,
    },

    /// A character other than letter, digit, underscore or hyphen appeared
    #[error("invalid identifier character '{ch}' at position {position}")]
    InvalidChar {
        /// The offending character
        ch: char,
        /// 1-based character position
        position: usize,
    },

    /// More than one dot appeared in a reference that permits at most one
    #[error("second '.' at position {position}: at most one dot is permitted in a reference")]
    SecondDot {
        /// 1-based character position of the second dot
        position: usize,
    },

    /// A dotted reference had nothing on one side of its dot
    #[error("empty {side} part in dotted reference '{text}'")]
    EmptyDottedPart {
        /// Which side of the dot was empty (`"item"` or `"variable"`)
        side: &'static str,
        /// The complete reference text
        text: String,
    },
}

/// Checks `text` against the identifier grammar.
///
/// `allow_dot` admits at most one `.` after the first character, which is the
/// only difference between the plain and complex reference grammars.
fn check_identifier(text: &str, allow_dot: bool) -> Result<(), IdentifierError> {
    let mut chars = text.chars().enumerate();
    match chars.next() {
        None => return Err(IdentifierError::Empty),
        Some((_, ch)) if ch.is_alphabetic() || ch == '_' => {}
        Some((_, ch)) => return Err(IdentifierError::InvalidStart { ch }),
    }

    let mut dot_seen = false;
    for (index, ch) in chars {
        match ch {
            '.' if allow_dot => {
                if dot_seen {
                    return Err(IdentifierError::SecondDot {
                        position: index + 1,
                    });
                }
                dot_seen = true;
            }
            c if c.is_alphanumeric() || c == '_' || c == '-' => {}
            c => {
                return Err(IdentifierError::InvalidChar {
                    ch: c,
                    position: index + 1,
                });
            }
        }
    }
    Ok(())
}

/// A plain identifier: `[letter|_][letter|digit|_|-]*`
///
/// Immutable once constructed. Equality, ordering and hashing are defined
/// purely on the underlying text, which is what makes identifiers usable as
/// session-state map keys and guarantees serialization round-trips.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Parse externally supplied text, enforcing the grammar.
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        check_identifier(text, false)?;
        Ok(Self(text.to_string()))
    }

    /// Construct without validation.
    ///
    /// Only for identifiers known correct from the QTI specification itself
    /// (built-in variable names and the like). The caller guarantees the text
    /// satisfies the grammar; no check is performed.
    pub fn assume_legal(text: &str) -> Self {
        Self(text.to_string())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An identifier that may additionally carry a single `.` after its first
/// character.
///
/// Used wherever an attribute value must be able to hold a dotted cross-item
/// reference as one opaque token before it is split into a
/// [`VariableReferenceIdentifier`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComplexReferenceIdentifier(String);

impl ComplexReferenceIdentifier {
    /// Parse externally supplied text, enforcing the grammar.
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        check_identifier(text, true)?;
        Ok(Self(text.to_string()))
    }

    /// Construct without validation; the caller guarantees the grammar holds.
    pub fn assume_legal(text: &str) -> Self {
        Self(text.to_string())
    }

    /// The reference text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token carries a dot.
    pub fn contains_dot(&self) -> bool {
        self.0.contains('.')
    }
}

impl fmt::Display for ComplexReferenceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ComplexReferenceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComplexReferenceIdentifier({})", self.0)
    }
}

impl FromStr for ComplexReferenceIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Identifier> for ComplexReferenceIdentifier {
    fn from(identifier: Identifier) -> Self {
        Self(identifier.0)
    }
}

/// A variable reference: either a bare local identifier, or an
/// `itemRefIdentifier.itemVariableIdentifier` pair produced by splitting on
/// the single permitted dot.
///
/// Exactly one of the two forms is populated by construction.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariableReferenceIdentifier {
    /// A reference into the current scope's own variables
    Local(Identifier),
    /// A reference crossing from a test into one of its item instances
    Dotted {
        /// The item reference named before the dot
        item: Identifier,
        /// The variable named after the dot
        variable: Identifier,
    },
}

impl VariableReferenceIdentifier {
    /// Parse reference text, splitting on the single permitted dot.
    ///
    /// More than one dot is an error, as is an empty item or variable part.
    pub fn parse(text: &str) -> Result<Self, IdentifierError> {
        if let Some((byte_index, _)) = text.match_indices('.').nth(1) {
            // Report the character position of the second dot, 1-based.
            let position = text[..byte_index].chars().count() + 1;
            return Err(IdentifierError::SecondDot { position });
        }
        match text.split_once('.') {
            None => Ok(Self::Local(Identifier::parse(text)?)),
            Some((item, variable)) => {
                if item.is_empty() {
                    return Err(IdentifierError::EmptyDottedPart {
                        side: "item",
                        text: text.to_string(),
                    });
                }
                if variable.is_empty() {
                    return Err(IdentifierError::EmptyDottedPart {
                        side: "variable",
                        text: text.to_string(),
                    });
                }
                Ok(Self::Dotted {
                    item: Identifier::parse(item)?,
                    variable: Identifier::parse(variable)?,
                })
            }
        }
    }

    /// Construct a local reference.
    pub fn local(identifier: Identifier) -> Self {
        Self::Local(identifier)
    }

    /// Construct a dotted reference.
    pub fn dotted(item: Identifier, variable: Identifier) -> Self {
        Self::Dotted { item, variable }
    }

    /// Whether this is the dotted (cross-item) form.
    pub fn is_dotted(&self) -> bool {
        matches!(self, Self::Dotted { .. })
    }

    /// The item reference identifier, if this is the dotted form.
    pub fn item_identifier(&self) -> Option<&Identifier> {
        match self {
            Self::Local(_) => None,
            Self::Dotted { item, .. } => Some(item),
        }
    }

    /// The variable name being referenced, in either form.
    pub fn variable_identifier(&self) -> &Identifier {
        match self {
            Self::Local(identifier) => identifier,
            Self::Dotted { variable, .. } => variable,
        }
    }
}

impl fmt::Display for VariableReferenceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(identifier) => write!(f, "{identifier}"),
            Self::Dotted { item, variable } => write!(f, "{item}.{variable}"),
        }
    }
}

impl fmt::Debug for VariableReferenceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VariableReferenceIdentifier({self})")
    }
}

impl FromStr for VariableReferenceIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&ComplexReferenceIdentifier> for VariableReferenceIdentifier {
    type Error = IdentifierError;

    fn try_from(reference: &ComplexReferenceIdentifier) -> Result<Self, Self::Error> {
        Self::parse(reference.as_str())
    }
}
