//! The declaration set of one assessment item

use indexmap::IndexMap;

use crate::declarations::error::DeclarationError;
use crate::declarations::variable::VariableDeclaration;
use crate::declarations::{BUILTIN_DURATION, BUILTIN_NUM_ATTEMPTS};
use crate::identifier::Identifier;

/// Everything this engine needs to know about one item definition
///
/// Variable identifiers are unique across all three namespaces of the item,
/// so one map holds every declaration and its [`kind`] tells the namespaces
/// apart. The built-in `duration` and `numAttempts` variables are implicit
/// and may not be declared explicitly.
///
/// [`kind`]: VariableDeclaration::kind
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDef {
    identifier: Identifier,
    title: Option<String>,
    declarations: IndexMap<Identifier, VariableDeclaration>,
}

impl ItemDef {
    /// Assemble an item definition from its variable declarations.
    ///
    /// Fails on duplicate identifiers and on attempts to declare a reserved
    /// built-in name.
    pub fn new(
        identifier: Identifier,
        declarations: Vec<VariableDeclaration>,
    ) -> Result<Self, DeclarationError> {
        let mut by_identifier = IndexMap::with_capacity(declarations.len());
        for declaration in declarations {
            let name = declaration.identifier().clone();
            if name.as_str() == BUILTIN_DURATION || name.as_str() == BUILTIN_NUM_ATTEMPTS {
                return Err(DeclarationError::ReservedIdentifier {
                    scope: identifier,
                    identifier: name,
                });
            }
            if by_identifier.insert(name.clone(), declaration).is_some() {
                return Err(DeclarationError::DuplicateVariable {
                    scope: identifier,
                    identifier: name,
                });
            }
        }
        Ok(Self {
            identifier,
            title: None,
            declarations: by_identifier,
        })
    }

    /// Attach the item's human-readable title.
    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    /// The item's identifier.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// The item's title, if one was given.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Look up a declaration by variable name, across all three namespaces.
    pub fn declaration(&self, identifier: &Identifier) -> Option<&VariableDeclaration> {
        self.declarations.get(identifier)
    }

    /// All declarations, in declaration order.
    pub fn declarations(&self) -> impl Iterator<Item = &VariableDeclaration> {
        self.declarations.values()
    }
}
