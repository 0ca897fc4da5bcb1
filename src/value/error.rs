//! Error types for value construction and scalar parsing

use thiserror::Error;

use crate::identifier::IdentifierError;
use crate::value::types::BaseType;

/// Errors raised while constructing or parsing typed values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Scalar text did not match the canonical form for its base type
    #[error("cannot parse '{text}' as a {base_type} value")]
    MalformedScalar {
        /// The base type the text was parsed against
        base_type: BaseType,
        /// The offending text
        text: String,
    },

    /// Durations are non-negative seconds
    #[error("duration must be non-negative, got {0}")]
    NegativeDuration(f64),

    /// Multiple/ordered container elements must share one base type
    #[error("container elements mix base types: expected {expected}, found {found}")]
    MixedBaseTypes {
        /// Base type of the first element
        expected: BaseType,
        /// Base type of the offending element
        found: BaseType,
    },

    /// An embedded identifier failed the identifier grammar
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

impl ValueError {
    /// Create a malformed-scalar error.
    pub(crate) fn malformed(base_type: BaseType, text: &str) -> Self {
        Self::MalformedScalar {
            base_type,
            text: text.to_string(),
        }
    }
}
