//! Session state containers for items and tests
//!
//! [`ItemSessionState`] records everything mutable about one item instance;
//! [`TestSessionState`] holds the test plan, test-level outcomes and the item
//! states created as the candidate moves through the plan. Containers never
//! consult variable declarations: they store whatever the processing layers
//! write, and the validation framework checks writes against declarations at
//! bind time instead.

use std::fmt;

use thiserror::Error;

use crate::plan::TestPlanNodeKey;

pub mod item;

pub use item::ItemSessionState;
pub use test::TestSessionState;

/// Errors raised by session container operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An item operation targeted a node that is not an item instance
    #[error("test plan node '{key}' is not an item instance")]
    NotAnItem {
        /// The targeted node's key
        key: TestPlanNodeKey,
    },
}

/// The QTI `sessionStatus` reported for an item's response values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Values are the declared defaults; the candidate has not yet responded
    Initial,
    /// Values have been bound but submission has not yet happened
    PendingSubmission,
    /// Values are submitted but response processing has not yet run
    PendingResponseProcessing,
    /// Response processing has run over the submitted values
    Final,
}

impl SessionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [SessionStatus; 4] = [
        SessionStatus::Initial,
        SessionStatus::PendingSubmission,
        SessionStatus::PendingResponseProcessing,
        SessionStatus::Final,
    ];

    /// The QTI attribute value for this status.
    pub fn qti_name(self) -> &'static str {
        match self {
            SessionStatus::Initial => "initial",
            SessionStatus::PendingSubmission => "pendingSubmission",
            SessionStatus::PendingResponseProcessing => "pendingResponseProcessing",
            SessionStatus::Final => "final",
        }
    }

    /// Look a status up by its QTI attribute value.
    pub fn from_qti_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.qti_name() == name)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qti_name())
    }
}
