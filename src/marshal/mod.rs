//! Lossless XML marshalling of session state and test plans
//!
//! Each container type owns one element: `itemSessionState`,
//! `testSessionState` and `testPlan`. Booleans are the literal strings
//! `"true"`/`"false"`, every scalar is written in its canonical string form,
//! and unknown elements or attributes are hard errors rather than being
//! skipped. Unmarshalling is all-or-nothing: it either returns a fully
//! populated container or an error naming the offending element, never a
//! partial result.

use thiserror::Error;

use crate::plan::PlanError;
use crate::value::{Cardinality, ValueError};

pub mod item;
pub mod plan;
pub(crate) mod values;
pub(crate) mod xml;

pub use item::{marshal_item_session_state, unmarshal_item_session_state};
pub use plan::{marshal_test_plan, unmarshal_test_plan};
pub use test::{marshal_test_session_state, unmarshal_test_session_state};

/// Errors raised while reading or writing serialized state
#[derive(Error, Debug)]
pub enum MarshalError {
    /// The underlying XML was malformed
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be read
    #[error("malformed xml attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Writer output was not valid UTF-8
    #[error("serialized output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The document's root element was not the expected container element
    #[error("expected root element '{expected}', found '{found}'")]
    UnexpectedRoot {
        /// The container element this call unmarshals
        expected: &'static str,
        /// What the document actually started with
        found: String,
    },

    /// An element that does not belong to the format appeared
    #[error("unexpected element '{element}' inside '{inside}'")]
    UnexpectedElement {
        /// The offending element name
        element: String,
        /// The enclosing element
        inside: String,
    },

    /// Character data appeared where only elements are allowed
    #[error("unexpected text inside '{inside}'")]
    UnexpectedText {
        /// The enclosing element
        inside: String,
    },

    /// A required attribute was absent
    #[error("element '{element}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// The element missing the attribute
        element: String,
        /// The absent attribute
        attribute: &'static str,
    },

    /// An attribute that does not belong to the format appeared
    #[error("element '{element}' has unexpected attribute '{attribute}'")]
    UnexpectedAttribute {
        /// The carrying element
        element: String,
        /// The offending attribute name
        attribute: String,
    },

    /// An attribute value failed to parse
    #[error("attribute '{attribute}' of '{element}' has invalid value '{value}'")]
    BadAttribute {
        /// The carrying element
        element: String,
        /// The attribute name
        attribute: &'static str,
        /// The rejected value
        value: String,
    },

    /// Value children appeared on an element with no cardinality attribute
    #[error("element '{element}' carries no cardinality but has children")]
    NullWithChildren {
        /// The offending element
        element: String,
    },

    /// The number of value children did not fit the declared cardinality
    #[error("element '{element}' with cardinality '{cardinality}' holds {count} value children")]
    WrongValueCount {
        /// The offending element
        element: String,
        /// The declared cardinality
        cardinality: Cardinality,
        /// How many value children were present
        count: usize,
    },

    /// A record value repeated a field identifier
    #[error("record element '{element}' repeats field '{field}'")]
    DuplicateField {
        /// The offending element
        element: String,
        /// The repeated field name
        field: String,
    },

    /// A map-like element repeated an entry
    #[error("element '{element}' repeats entry for '{identifier}'")]
    DuplicateEntry {
        /// The offending element
        element: String,
        /// The repeated entry name
        identifier: String,
    },

    /// Scalar text did not parse under its declared base type
    #[error("scalar text '{text}' inside '{element}' is malformed")]
    BadScalar {
        /// The enclosing element
        element: String,
        /// The rejected text
        text: String,
        /// The underlying parse failure
        #[source]
        source: ValueError,
    },

    /// A stored node key disagreed with the node's recomputed position
    #[error("stored key '{stored}' does not match recomputed position '{computed}'")]
    KeyMismatch {
        /// The key attribute as stored
        stored: String,
        /// The key recomputed from document structure
        computed: String,
    },

    /// Serialized test state targeted a key outside its own plan
    #[error("serialized state references '{key}', which is not an item instance of the plan")]
    UnknownPlanKey {
        /// The unresolvable key text
        key: String,
    },

    /// A required child element was absent
    #[error("element '{inside}' is missing required child '{element}'")]
    MissingElement {
        /// The absent child
        element: &'static str,
        /// The element that should contain it
        inside: String,
    },

    /// Node keys and plan structure failed to reassemble
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The document ended in the middle of a container
    #[error("unexpected end of document while reading '{inside}'")]
    UnexpectedEof {
        /// The element still open when input ran out
        inside: String,
    },
}
