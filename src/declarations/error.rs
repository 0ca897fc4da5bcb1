//! Errors raised while assembling declarations

use thiserror::Error;

use crate::declarations::VariableKind;
use crate::identifier::Identifier;

/// Errors raised by declaration constructors
///
/// These guard the structural rules the XML schema would otherwise enforce:
/// base types agree with cardinality, correct responses and mappings appear
/// only on response declarations, and identifiers stay unique within their
/// owner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeclarationError {
    /// Record declarations carry per-field base types, never a shared one
    #[error("record variable '{identifier}' must not declare a base type")]
    RecordWithBaseType {
        /// The offending variable
        identifier: Identifier,
    },

    /// Non-record declarations must name the base type of their elements
    #[error("variable '{identifier}' must declare a base type")]
    MissingBaseType {
        /// The offending variable
        identifier: Identifier,
    },

    /// Only response declarations may carry a correct response
    #[error("{kind} variable '{identifier}' cannot carry a correct response")]
    CorrectResponseOnNonResponse {
        /// The offending variable
        identifier: Identifier,
        /// The variable's actual kind
        kind: VariableKind,
    },

    /// Only response declarations may carry a mapping
    #[error("{kind} variable '{identifier}' cannot carry a mapping")]
    MappingOnNonResponse {
        /// The offending variable
        identifier: Identifier,
        /// The variable's actual kind
        kind: VariableKind,
    },

    /// A mapping's lower bound exceeded its upper bound
    #[error("mapping lower bound {lower} exceeds upper bound {upper}")]
    BadMappingBounds {
        /// The declared lower bound
        lower: f64,
        /// The declared upper bound
        upper: f64,
    },

    /// Variable identifiers are unique across all three namespaces of an
    /// item, and across the outcomes of a test
    #[error("'{scope}' declares variable '{identifier}' more than once")]
    DuplicateVariable {
        /// The owning item or test
        scope: Identifier,
        /// The repeated variable identifier
        identifier: Identifier,
    },

    /// Built-in variable names cannot be declared explicitly
    #[error("'{scope}' declares reserved built-in variable '{identifier}'")]
    ReservedIdentifier {
        /// The owning item or test
        scope: Identifier,
        /// The reserved name
        identifier: Identifier,
    },

    /// Tests declare outcome variables only
    #[error("test '{test}' declares {kind} variable '{identifier}'; tests carry outcomes only")]
    TestVariableNotOutcome {
        /// The owning test
        test: Identifier,
        /// The offending variable
        identifier: Identifier,
        /// The variable's actual kind
        kind: VariableKind,
    },

    /// Item reference identifiers are unique within a test
    #[error("test '{test}' references item '{identifier}' more than once")]
    DuplicateItemRef {
        /// The owning test
        test: Identifier,
        /// The repeated item reference identifier
        identifier: Identifier,
    },

    /// Weight identifiers are unique per item reference
    #[error("item reference '{item_ref}' declares weight '{identifier}' more than once")]
    DuplicateWeight {
        /// The owning item reference
        item_ref: Identifier,
        /// The repeated weight identifier
        identifier: Identifier,
    },

    /// Weights multiply scores and must be finite
    #[error("item reference '{item_ref}' declares non-finite weight '{identifier}' = {value}")]
    NonFiniteWeight {
        /// The owning item reference
        item_ref: Identifier,
        /// The offending weight identifier
        identifier: Identifier,
        /// The declared value
        value: f64,
    },
}
