//! Static binding of lookup/reference pairs

use crate::declarations::{
    BUILTIN_DURATION, BUILTIN_NUM_ATTEMPTS, ItemDef, TestDef, VariableDeclaration, VariableKind,
};
use crate::identifier::{Identifier, VariableReferenceIdentifier};
use crate::resolve::Lookup;
use crate::validation::issue::{IssueCode, ValidationIssue, ValidationResult};
use crate::value::{BaseType, Cardinality};

/// The declarations a batch of references is checked against
///
/// The binder sees definitions only, never session state: everything it
/// reports would hold for every session of the item or test.
#[derive(Debug, Clone, Copy)]
pub enum BindingScope<'a> {
    /// Check references as expressions evaluated inside the item
    Item(&'a ItemDef),
    /// Check references as expressions evaluated at test level
    Test(&'a TestDef),
}

/// The shape a caller expects a reference to produce
///
/// `base_type` is `None` for record shapes, mirroring declarations; the base
/// type check only fires when both sides carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedShape {
    /// Expected cardinality
    pub cardinality: Cardinality,
    /// Expected base type, `None` for records
    pub base_type: Option<BaseType>,
}

/// One lookup/reference pair to bind
#[derive(Debug, Clone)]
pub struct BoundReference {
    lookup: Lookup,
    reference: VariableReferenceIdentifier,
    expected: Option<ExpectedShape>,
}

impl BoundReference {
    /// Bind a lookup to a reference without any shape expectation.
    pub fn new(lookup: Lookup, reference: VariableReferenceIdentifier) -> Self {
        Self {
            lookup,
            reference,
            expected: None,
        }
    }

    /// Attach the shape the surrounding expression expects.
    pub fn with_expected(mut self, expected: ExpectedShape) -> Self {
        self.expected = Some(expected);
        self
    }

    /// The lookup being bound.
    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    /// The reference being bound.
    pub fn reference(&self) -> &VariableReferenceIdentifier {
        &self.reference
    }

    /// The expected shape, if one was supplied.
    pub fn expected(&self) -> Option<ExpectedShape> {
        self.expected
    }
}

/// Check every reference against the scope's declarations.
///
/// The pass never aborts: all references are checked and all issues
/// accumulated in input order, so a caller sees the full picture in one
/// round. Anything reported as an error here would fail or yield null when
/// resolved at runtime.
pub fn validate_lookups(
    scope: BindingScope<'_>,
    references: &[BoundReference],
) -> ValidationResult {
    let mut result = ValidationResult::new();
    for bound in references {
        check_reference(scope, bound, &mut result);
    }
    result
}

/// What a reference statically binds to: a declaration, or one of the
/// built-in session variables with a fixed shape.
enum Target<'a> {
    Declared(&'a VariableDeclaration),
    Builtin {
        cardinality: Cardinality,
        base_type: BaseType,
    },
}

impl Target<'_> {
    fn kind(&self) -> Option<VariableKind> {
        match self {
            Target::Declared(declaration) => Some(declaration.kind()),
            Target::Builtin { .. } => None,
        }
    }

    fn cardinality(&self) -> Cardinality {
        match self {
            Target::Declared(declaration) => declaration.cardinality(),
            Target::Builtin { cardinality, .. } => *cardinality,
        }
    }

    fn base_type(&self) -> Option<BaseType> {
        match self {
            Target::Declared(declaration) => declaration.base_type(),
            Target::Builtin { base_type, .. } => Some(*base_type),
        }
    }

    fn is_single_numeric(&self) -> bool {
        match self {
            Target::Declared(declaration) => declaration.is_single_numeric(),
            Target::Builtin { .. } => true,
        }
    }
}

fn item_target<'a>(item: &'a ItemDef, variable: &Identifier) -> Option<Target<'a>> {
    if let Some(declaration) = item.declaration(variable) {
        return Some(Target::Declared(declaration));
    }
    match variable.as_str() {
        BUILTIN_DURATION => Some(Target::Builtin {
            cardinality: Cardinality::Single,
            base_type: BaseType::Float,
        }),
        BUILTIN_NUM_ATTEMPTS => Some(Target::Builtin {
            cardinality: Cardinality::Single,
            base_type: BaseType::Integer,
        }),
        _ => None,
    }
}

fn test_target<'a>(test: &'a TestDef, variable: &Identifier) -> Option<Target<'a>> {
    if variable.as_str() == BUILTIN_DURATION {
        return Some(Target::Builtin {
            cardinality: Cardinality::Single,
            base_type: BaseType::Float,
        });
    }
    test.outcome_declaration(variable).map(Target::Declared)
}

fn weight_of(lookup: &Lookup) -> Option<&Identifier> {
    match lookup {
        Lookup::Variable { weight } => weight.as_ref(),
        _ => None,
    }
}

fn check_reference(
    scope: BindingScope<'_>,
    bound: &BoundReference,
    result: &mut ValidationResult,
) {
    let subject = bound.reference.to_string();
    match (scope, &bound.reference) {
        (BindingScope::Item(item), VariableReferenceIdentifier::Local(variable)) => {
            if weight_of(&bound.lookup).is_some() {
                result.push(ValidationIssue::error(
                    IssueCode::WeightOnLocal,
                    &subject,
                    "weights only apply to references that cross into an item instance",
                ));
            }
            let Some(target) = item_target(item, variable) else {
                result.push(ValidationIssue::error(
                    IssueCode::UnknownVariable,
                    subject,
                    format!(
                        "variable '{variable}' is not declared in item '{}'",
                        item.identifier()
                    ),
                ));
                return;
            };
            check_target(&bound.lookup, &target, bound.expected, &subject, result);
        }
        (BindingScope::Item(_), VariableReferenceIdentifier::Dotted { .. }) => {
            result.push(ValidationIssue::error(
                IssueCode::DottedInItemScope,
                subject,
                "item expressions cannot reach into other items",
            ));
        }
        (BindingScope::Test(test), VariableReferenceIdentifier::Local(variable)) => {
            if weight_of(&bound.lookup).is_some() {
                result.push(ValidationIssue::error(
                    IssueCode::WeightOnLocal,
                    &subject,
                    "weights only apply to references that cross into an item instance",
                ));
            }
            // Correct lookups at test level yield null for every identifier,
            // declared or not, so there is nothing further to bind.
            if matches!(bound.lookup, Lookup::Correct) {
                result.push(ValidationIssue::warning(
                    IssueCode::CorrectOnNonResponse,
                    subject,
                    format!(
                        "test '{}' declares no response variables; a correct lookup always yields null",
                        test.identifier()
                    ),
                ));
                return;
            }
            let Some(target) = test_target(test, variable) else {
                result.push(ValidationIssue::error(
                    IssueCode::UnknownVariable,
                    subject,
                    format!(
                        "variable '{variable}' is not declared in test '{}'",
                        test.identifier()
                    ),
                ));
                return;
            };
            check_target(&bound.lookup, &target, bound.expected, &subject, result);
        }
        (BindingScope::Test(test), VariableReferenceIdentifier::Dotted { item, variable }) => {
            let Some(item_ref) = test.item_ref(item) else {
                result.push(ValidationIssue::error(
                    IssueCode::UnknownItemRef,
                    subject,
                    format!(
                        "test '{}' has no item reference '{item}'",
                        test.identifier()
                    ),
                ));
                return;
            };
            if let Some(weight) = weight_of(&bound.lookup) {
                if item_ref.weight(weight).is_none() {
                    result.push(ValidationIssue::error(
                        IssueCode::UnknownWeight,
                        &subject,
                        format!("item reference '{item}' declares no weight '{weight}'"),
                    ));
                }
            }
            let Some(target) = item_target(item_ref.item(), variable) else {
                result.push(ValidationIssue::error(
                    IssueCode::UnknownVariable,
                    subject,
                    format!(
                        "variable '{variable}' is not declared in item '{}'",
                        item_ref.item().identifier()
                    ),
                ));
                return;
            };
            check_target(&bound.lookup, &target, bound.expected, &subject, result);
        }
    }
}

fn check_target(
    lookup: &Lookup,
    target: &Target<'_>,
    expected: Option<ExpectedShape>,
    subject: &str,
    result: &mut ValidationResult,
) {
    if weight_of(lookup).is_some() && !target.is_single_numeric() {
        result.push(ValidationIssue::error(
            IssueCode::WeightNotNumeric,
            subject,
            format!(
                "weights apply to single integer or float variables, not {}",
                shape_text(target.cardinality(), target.base_type())
            ),
        ));
    }
    if matches!(lookup, Lookup::Correct) && target.kind() != Some(VariableKind::Response) {
        let message = match target.kind() {
            Some(kind) => format!("{kind} variables carry no correct response"),
            None => "built-in variables carry no correct response".to_string(),
        };
        result.push(ValidationIssue::warning(
            IssueCode::CorrectOnNonResponse,
            subject,
            message,
        ));
    }
    let Some(expected) = expected else {
        return;
    };
    if expected.cardinality != target.cardinality() {
        result.push(ValidationIssue::error(
            IssueCode::ShapeMismatch,
            subject,
            format!(
                "declared {}, expected {}",
                shape_text(target.cardinality(), target.base_type()),
                shape_text(expected.cardinality, expected.base_type)
            ),
        ));
    } else if let (Some(declared), Some(wanted)) = (target.base_type(), expected.base_type) {
        if declared != wanted {
            result.push(ValidationIssue::error(
                IssueCode::ShapeMismatch,
                subject,
                format!("declared base type {declared}, expected {wanted}"),
            ));
        }
    }
}

fn shape_text(cardinality: Cardinality, base_type: Option<BaseType>) -> String {
    match base_type {
        Some(base_type) => format!("{cardinality} {base_type}"),
        None => cardinality.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::declarations::ItemRef;
    use crate::value::Value;

    fn ident(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    fn reference(text: &str) -> VariableReferenceIdentifier {
        VariableReferenceIdentifier::parse(text).unwrap()
    }

    fn scoring_item() -> ItemDef {
        let response = VariableDeclaration::new(
            ident("RESPONSE"),
            VariableKind::Response,
            Cardinality::Single,
            Some(BaseType::Identifier),
        )
        .unwrap()
        .with_correct_response(Value::single(crate::value::SingleValue::Identifier(ident(
            "A",
        ))))
        .unwrap();
        let score = VariableDeclaration::new(
            ident("SCORE"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::Float),
        )
        .unwrap();
        let label = VariableDeclaration::new(
            ident("LABEL"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::String),
        )
        .unwrap();
        ItemDef::new(ident("scoring-item"), vec![response, score, label]).unwrap()
    }

    fn scoring_test() -> TestDef {
        let item = Arc::new(scoring_item());
        let q1 = ItemRef::new(ident("Q1"), item)
            .with_weight(ident("W1"), 2.0)
            .unwrap();
        let total = VariableDeclaration::new(
            ident("TOTAL"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::Float),
        )
        .unwrap();
        TestDef::new(ident("T1"), vec![total], vec![q1]).unwrap()
    }

    fn codes(result: &ValidationResult) -> Vec<IssueCode> {
        result.issues().iter().map(|issue| issue.code()).collect()
    }

    #[test]
    fn well_formed_references_bind_cleanly() {
        let item = scoring_item();
        let references = [
            BoundReference::new(Lookup::variable(), reference("RESPONSE")),
            BoundReference::new(Lookup::Correct, reference("RESPONSE")),
            BoundReference::new(Lookup::Default, reference("SCORE")),
            BoundReference::new(Lookup::variable(), reference("numAttempts")),
        ];
        let result = validate_lookups(BindingScope::Item(&item), &references);
        assert!(result.is_empty(), "unexpected issues: {:?}", result.issues());
    }

    #[test]
    fn unknown_variables_are_reported_per_scope() {
        let item = scoring_item();
        let result = validate_lookups(
            BindingScope::Item(&item),
            &[BoundReference::new(Lookup::variable(), reference("TYPO"))],
        );
        assert_eq!(codes(&result), vec![IssueCode::UnknownVariable]);
        assert!(result.has_errors());
        assert_eq!(result.issues()[0].subject(), "TYPO");

        let test = scoring_test();
        let result = validate_lookups(
            BindingScope::Test(&test),
            &[
                BoundReference::new(Lookup::variable(), reference("TYPO")),
                BoundReference::new(Lookup::variable(), reference("Q1.TYPO")),
                BoundReference::new(Lookup::variable(), reference("Q9.SCORE")),
            ],
        );
        assert_eq!(
            codes(&result),
            vec![
                IssueCode::UnknownVariable,
                IssueCode::UnknownVariable,
                IssueCode::UnknownItemRef,
            ]
        );
    }

    #[test]
    fn dotted_references_are_rejected_in_item_scope() {
        let item = scoring_item();
        let result = validate_lookups(
            BindingScope::Item(&item),
            &[BoundReference::new(Lookup::variable(), reference("Q1.SCORE"))],
        );
        assert_eq!(codes(&result), vec![IssueCode::DottedInItemScope]);
    }

    #[test]
    fn weights_require_a_crossing_reference() {
        let item = scoring_item();
        let result = validate_lookups(
            BindingScope::Item(&item),
            &[BoundReference::new(
                Lookup::weighted(ident("W1")),
                reference("SCORE"),
            )],
        );
        assert_eq!(codes(&result), vec![IssueCode::WeightOnLocal]);

        let test = scoring_test();
        let result = validate_lookups(
            BindingScope::Test(&test),
            &[BoundReference::new(
                Lookup::weighted(ident("W1")),
                reference("TOTAL"),
            )],
        );
        assert_eq!(codes(&result), vec![IssueCode::WeightOnLocal]);
    }

    #[test]
    fn weight_names_and_targets_are_checked() {
        let test = scoring_test();
        let references = [
            // Clean: declared weight on a single float.
            BoundReference::new(Lookup::weighted(ident("W1")), reference("Q1.SCORE")),
            // Clean: built-ins are numeric.
            BoundReference::new(Lookup::weighted(ident("W1")), reference("Q1.numAttempts")),
            BoundReference::new(Lookup::weighted(ident("W9")), reference("Q1.SCORE")),
            BoundReference::new(Lookup::weighted(ident("W1")), reference("Q1.LABEL")),
        ];
        let result = validate_lookups(BindingScope::Test(&test), &references);
        assert_eq!(
            codes(&result),
            vec![IssueCode::UnknownWeight, IssueCode::WeightNotNumeric]
        );
    }

    #[test]
    fn correct_lookups_warn_outside_response_variables() {
        let test = scoring_test();
        let references = [
            BoundReference::new(Lookup::Correct, reference("TOTAL")),
            BoundReference::new(Lookup::Correct, reference("Q1.SCORE")),
            BoundReference::new(Lookup::Correct, reference("Q1.duration")),
            BoundReference::new(Lookup::Correct, reference("Q1.RESPONSE")),
        ];
        let result = validate_lookups(BindingScope::Test(&test), &references);
        assert_eq!(
            codes(&result),
            vec![
                IssueCode::CorrectOnNonResponse,
                IssueCode::CorrectOnNonResponse,
                IssueCode::CorrectOnNonResponse,
            ]
        );
        // Warnings only; the pass stays usable.
        assert!(!result.has_errors());
        assert_eq!(result.warning_count(), 3);
    }

    #[test]
    fn expected_shapes_are_compared_against_declarations() {
        let item = scoring_item();
        let references = [
            BoundReference::new(Lookup::variable(), reference("SCORE")).with_expected(
                ExpectedShape {
                    cardinality: Cardinality::Single,
                    base_type: Some(BaseType::Float),
                },
            ),
            BoundReference::new(Lookup::variable(), reference("SCORE")).with_expected(
                ExpectedShape {
                    cardinality: Cardinality::Multiple,
                    base_type: Some(BaseType::Float),
                },
            ),
            BoundReference::new(Lookup::variable(), reference("RESPONSE")).with_expected(
                ExpectedShape {
                    cardinality: Cardinality::Single,
                    base_type: Some(BaseType::Float),
                },
            ),
        ];
        let result = validate_lookups(BindingScope::Item(&item), &references);
        assert_eq!(
            codes(&result),
            vec![IssueCode::ShapeMismatch, IssueCode::ShapeMismatch]
        );
        assert_eq!(result.issues()[0].message(), "declared single float, expected multiple float");
        assert_eq!(
            result.issues()[1].message(),
            "declared base type identifier, expected float"
        );
    }

    #[test]
    fn one_reference_can_raise_several_issues() {
        let item = scoring_item();
        let result = validate_lookups(
            BindingScope::Item(&item),
            &[BoundReference::new(
                Lookup::weighted(ident("W1")),
                reference("TYPO"),
            )],
        );
        assert_eq!(
            codes(&result),
            vec![IssueCode::WeightOnLocal, IssueCode::UnknownVariable]
        );
        assert_eq!(result.error_count(), 2);
    }
}
