//! Errors raised while resolving variable references

use thiserror::Error;

use crate::identifier::Identifier;
use crate::plan::TestPlanNodeKey;

/// A reference that could not be resolved against its scope
///
/// Every variant names what was looked up and where, so a caller can report
/// the failure without holding on to the scope itself. The static binder
/// catches most of these ahead of evaluation; at runtime they surface as
/// typed errors, never as panics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The identifier is not a declared variable of the scope
    #[error("variable '{variable}' is not declared in '{scope}'")]
    UnknownVariable {
        /// Identifier of the item or test resolved against
        scope: Identifier,
        /// The undeclared variable
        variable: Identifier,
    },

    /// A dotted reference was used while evaluating inside an item
    #[error("dotted reference '{item}.{variable}' cannot be resolved in item scope")]
    DottedInItemScope {
        /// The item part of the reference
        item: Identifier,
        /// The variable part of the reference
        variable: Identifier,
    },

    /// A dotted reference names an item reference the test does not declare
    #[error("test '{test}' has no item reference '{item}'")]
    UnknownItemRef {
        /// Identifier of the test resolved against
        test: Identifier,
        /// The unmatched item reference identifier
        item: Identifier,
    },

    /// A dotted reference does not pick out a unique item instance
    #[error(
        "reference into item '{item}' does not pick a unique instance \
         ({instances} in plan, {entered} entered)"
    )]
    AmbiguousReference {
        /// The item reference identifier
        item: Identifier,
        /// How many instances the plan holds
        instances: usize,
        /// How many of those have been entered
        entered: usize,
    },

    /// A write targeted an item instance that has never been entered
    #[error("item instance '{key}' has not been entered; nothing to write to")]
    InstanceNotEntered {
        /// Key of the targeted instance
        key: TestPlanNodeKey,
    },

    /// A weight was supplied for a resolution that never crosses item scopes
    #[error("weight cannot be applied to local reference '{variable}'")]
    WeightOnLocal {
        /// The locally resolved variable
        variable: Identifier,
    },

    /// A built-in variable was the target of a write
    #[error("built-in variable '{variable}' cannot be set")]
    BuiltinNotSettable {
        /// The built-in name
        variable: Identifier,
    },
}
