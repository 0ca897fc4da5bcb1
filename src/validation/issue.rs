//! Severity-tagged issues and the accumulating result

use std::fmt;

/// How serious a reported issue is
///
/// Errors describe references that cannot produce a useful value at runtime;
/// warnings describe constructs the engine tolerates with a degraded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Tolerated at runtime, but almost certainly not what was meant
    Warning,
    /// The reference will fail or silently yield null at runtime
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Machine-readable classification of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    /// The referenced variable is not declared in its scope
    UnknownVariable,
    /// A dotted reference names an item reference the test does not declare
    UnknownItemRef,
    /// A dotted reference appears in item scope
    DottedInItemScope,
    /// A weight is attached to a reference that never leaves its scope
    WeightOnLocal,
    /// A weight identifier has no entry in the item reference's table
    UnknownWeight,
    /// A weight is attached to a variable that is not single numeric
    WeightNotNumeric,
    /// A correct-response lookup targets something without one
    CorrectOnNonResponse,
    /// Declared cardinality or base type differs from the expected shape
    ShapeMismatch,
}

impl IssueCode {
    /// Stable name used in reports and logs.
    pub fn name(self) -> &'static str {
        match self {
            IssueCode::UnknownVariable => "unknownVariable",
            IssueCode::UnknownItemRef => "unknownItemRef",
            IssueCode::DottedInItemScope => "dottedInItemScope",
            IssueCode::WeightOnLocal => "weightOnLocal",
            IssueCode::UnknownWeight => "unknownWeight",
            IssueCode::WeightNotNumeric => "weightNotNumeric",
            IssueCode::CorrectOnNonResponse => "correctOnNonResponse",
            IssueCode::ShapeMismatch => "shapeMismatch",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One problem reported against one reference
///
/// The subject is the reference text the issue was raised for, so reports
/// stay meaningful after the checked definitions go out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    severity: Severity,
    code: IssueCode,
    subject: String,
    message: String,
}

impl ValidationIssue {
    /// Report an error against a subject.
    pub fn error(code: IssueCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Report a warning against a subject.
    pub fn warning(
        code: IssueCode,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// The issue's severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The issue's classification.
    pub fn code(&self) -> IssueCode {
        self.code
    }

    /// The reference text the issue was raised for.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Human-readable description of the problem.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this issue is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity, self.code, self.subject, self.message
        )
    }
}

/// Accumulated outcome of one validation pass
///
/// Validation never aborts: every reference is checked and every problem
/// recorded, in input order. Callers decide policy through [`has_errors`]
/// rather than by catching a first failure.
///
/// [`has_errors`]: ValidationResult::has_errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// An empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one issue.
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// All recorded issues, in the order they were raised.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Whether any recorded issue is an error.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    /// Number of error-severity issues.
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_error()).count()
    }

    /// Number of warning-severity issues.
    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    /// Whether nothing was reported at all.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Consume the result, yielding the issues.
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}
