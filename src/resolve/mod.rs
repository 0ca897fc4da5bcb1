//! Cross-scope variable resolution
//!
//! The resolution engine answers one question: given a reference that may
//! name a variable in the current scope or reach across from a test into one
//! of its item instances, where does the value live and what is it right
//! now? [`EvaluationScope`] carries the definitions and state of the scope
//! an expression runs in; [`Lookup`] picks between the variable's current
//! value, its declared correct response and its declared default; dotted
//! references are disambiguated through the test plan under an explicit
//! [`AmbiguityPolicy`].
//!
//! Resolution is synchronous, performs no I/O and never panics on bad input:
//! unresolvable references come back as [`ResolutionError`] values, and the
//! one runtime-tolerated misuse (weighting a non-numeric value) logs a
//! diagnostic and yields [`Value::Null`].
//!
//! [`Value::Null`]: crate::value::Value::Null

pub mod error;
pub mod scope;

pub use error::ResolutionError;
pub use scope::{AmbiguityPolicy, EvaluationScope, Lookup};
