//! Static validation of variable references
//!
//! The binder checks `(lookup, reference)` pairs against item and test
//! declarations before any session exists, reporting everything it finds as
//! severity-tagged [`ValidationIssue`]s in one accumulating
//! [`ValidationResult`]. Errors mark references that will fail or silently
//! yield null at runtime; warnings mark tolerated constructs such as a
//! correct-response lookup against an outcome variable.

pub mod binder;
pub mod issue;

pub use binder::{BindingScope, BoundReference, ExpectedShape, validate_lookups};
pub use issue::{IssueCode, Severity, ValidationIssue, ValidationResult};
