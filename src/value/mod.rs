//! Typed value model for assessment variables
//!
//! Every variable holds a [`Value`]: null, or a combination of
//! [`Cardinality`] (single/multiple/ordered/record) and [`BaseType`] shared
//! by the contained scalars. Canonical scalar strings live in
//! [`SingleValue`]'s `Display`/`parse` pair and are what the serialization
//! layer reads and writes.

pub mod container;
pub mod error;
pub mod single;
pub mod types;

pub use container::Value;
pub use error::ValueError;
pub use single::{FileRef, SingleValue};
pub use types::{BaseType, Cardinality};
