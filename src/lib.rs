//! QTI assessment-state runtime core
//!
//! Typed values, test-plan navigation, session state containers with
//! lossless XML round-tripping, and cross-scope variable resolution for
//! QTI-style assessment delivery engines.

pub mod declarations;
pub mod identifier;
pub mod marshal;
pub mod plan;
pub mod resolve;
pub mod session;
pub mod validation;
pub mod value;

// Re-export main types
pub use declarations::{ItemDef, ItemRef, TestDef, VariableDeclaration, VariableKind};
pub use identifier::{Identifier, IdentifierError, VariableReferenceIdentifier};
pub use marshal::MarshalError;
pub use plan::{TestPlan, TestPlanBuilder, TestPlanNodeKey};
pub use resolve::{AmbiguityPolicy, EvaluationScope, Lookup, ResolutionError};
pub use session::{ItemSessionState, SessionStatus, TestSessionState};
pub use validation::{ValidationIssue, ValidationResult, validate_lookups};
pub use value::{BaseType, Cardinality, SingleValue, Value};
