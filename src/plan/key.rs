//! Stable keys identifying positions in a test plan

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;
use thiserror::Error;

use crate::identifier::{Identifier, IdentifierError};

/// Errors raised while parsing node keys or assembling a test plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The supplied key text was empty
    #[error("test plan node key is empty")]
    EmptyKey,

    /// The key text carried no `:` instance separator
    #[error("test plan node key '{text}' is missing its ':<instance>' suffix")]
    MissingInstance {
        /// The complete key text
        text: String,
    },

    /// The instance suffix was not a positive integer
    #[error("test plan node key '{text}' has invalid instance number '{instance}'")]
    InvalidInstance {
        /// The complete key text
        text: String,
        /// The offending instance token
        instance: String,
    },

    /// A segment of the identifier chain violated the identifier grammar
    #[error("test plan node key '{text}' has an invalid identifier segment")]
    InvalidIdentifier {
        /// The complete key text
        text: String,
        /// The underlying grammar failure
        #[source]
        source: IdentifierError,
    },

    /// A node was added under a parent that cannot carry it
    #[error("test plan cannot place '{child}' under '{parent}'")]
    BadParent {
        /// The parent's node type name
        parent: &'static str,
        /// The rejected child's node type name
        child: &'static str,
    },
}

/// Identifier chains are almost always `part.section.item`, so four slots
/// cover real plans without spilling to the heap.
pub(crate) type IdentifierChain = SmallVec<[Identifier; 4]>;

/// The unique, reproducible position of a node in a [`TestPlan`]
///
/// A key is the chain of identifiers from the top-level test part down to the
/// node itself, plus a 1-based occurrence index distinguishing repeated
/// instantiations of the same chain (selection with replacement produces
/// those). The string form is `PART.SECTION.ITEM:2` and round-trips exactly
/// through [`parse`](Self::parse) and [`Display`].
///
/// [`TestPlan`]: crate::plan::TestPlan
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TestPlanNodeKey {
    chain: IdentifierChain,
    instance: u32,
}

impl TestPlanNodeKey {
    /// Assembles a key from parts the caller has already validated.
    ///
    /// The chain must be non-empty and the instance 1-based; the plan builder
    /// guarantees both.
    pub(crate) fn from_chain(chain: IdentifierChain, instance: u32) -> Self {
        debug_assert!(!chain.is_empty());
        debug_assert!(instance >= 1);
        Self { chain, instance }
    }

    /// Parse the `A.B.C:instance` string form.
    pub fn parse(text: &str) -> Result<Self, PlanError> {
        if text.is_empty() {
            return Err(PlanError::EmptyKey);
        }
        let Some((chain_text, instance_text)) = text.rsplit_once(':') else {
            return Err(PlanError::MissingInstance {
                text: text.to_string(),
            });
        };
        let instance = instance_text
            .parse::<u32>()
            .ok()
            .filter(|instance| *instance >= 1)
            .ok_or_else(|| PlanError::InvalidInstance {
                text: text.to_string(),
                instance: instance_text.to_string(),
            })?;
        let mut chain = IdentifierChain::new();
        for segment in chain_text.split('.') {
            let identifier =
                Identifier::parse(segment).map_err(|source| PlanError::InvalidIdentifier {
                    text: text.to_string(),
                    source,
                })?;
            chain.push(identifier);
        }
        Ok(Self { chain, instance })
    }

    /// The node's own identifier, the last segment of the chain.
    pub fn identifier(&self) -> &Identifier {
        // from_chain and parse both guarantee a non-empty chain.
        &self.chain[self.chain.len() - 1]
    }

    /// The identifier chain from the top-level test part down to this node.
    pub fn chain(&self) -> &[Identifier] {
        &self.chain
    }

    /// The 1-based occurrence index among nodes sharing this chain.
    pub fn instance(&self) -> u32 {
        self.instance
    }
}

impl fmt::Display for TestPlanNodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, identifier) in self.chain.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            write!(f, "{identifier}")?;
        }
        write!(f, ":{}", self.instance)
    }
}

impl fmt::Debug for TestPlanNodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestPlanNodeKey({self})")
    }
}

impl FromStr for TestPlanNodeKey {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
