//! Static declarations: variables, mappings, items, tests
//!
//! Declarations are what references are bound against. Items declare
//! variables in three namespaces, tests declare outcomes and reference items
//! through [`ItemRef`]s carrying scoring weights. The [`xml`] submodule loads
//! all of this from QTI-style fragments, reporting structural problems
//! through a [`LoadingContext`](xml::LoadingContext) instead of aborting.

use std::fmt;

pub mod error;
pub mod item;
pub mod mapping;
pub mod variable;
pub mod xml;

pub use error::DeclarationError;
pub use item::ItemDef;
pub use mapping::{MapEntry, Mapping};
pub use test::{ItemRef, TestDef};
pub use variable::VariableDeclaration;
pub use xml::{
    CollectingContext, LoadError, LoadNotice, LoadedTest, LoadingContext, load_item, load_test,
};

/// Name of the built-in timing variable carried by items and tests.
pub const BUILTIN_DURATION: &str = "duration";

/// Name of the built-in attempt counter carried by items.
pub const BUILTIN_NUM_ATTEMPTS: &str = "numAttempts";

/// The three namespaces an item variable can live in
///
/// Template variables are randomized inputs, response variables hold what
/// the candidate submitted, and outcome variables hold computed results.
/// Tests declare outcomes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Inputs randomized per attempt by template processing
    Template,
    /// Candidate-supplied answers
    Response,
    /// Computed results
    Outcome,
}

impl VariableKind {
    /// Every kind, in template/response/outcome order.
    pub const ALL: [VariableKind; 3] = [
        VariableKind::Template,
        VariableKind::Response,
        VariableKind::Outcome,
    ];

    /// The QTI element declaring a variable of this kind.
    pub fn declaration_element(self) -> &'static str {
        match self {
            VariableKind::Template => "templateDeclaration",
            VariableKind::Response => "responseDeclaration",
            VariableKind::Outcome => "outcomeDeclaration",
        }
    }

    /// Look a kind up by its declaration element name.
    pub fn from_declaration_element(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.declaration_element() == name)
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableKind::Template => "template",
            VariableKind::Response => "response",
            VariableKind::Outcome => "outcome",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_elements_round_trip() {
        for kind in VariableKind::ALL {
            assert_eq!(
                VariableKind::from_declaration_element(kind.declaration_element()),
                Some(kind)
            );
        }
        assert_eq!(VariableKind::from_declaration_element("declaration"), None);
    }
}
