//! Scopes, lookups and the resolution algorithm

use crate::declarations::{BUILTIN_DURATION, BUILTIN_NUM_ATTEMPTS, ItemDef, ItemRef, TestDef};
use crate::identifier::{Identifier, VariableReferenceIdentifier};
use crate::plan::TestPlanNodeKey;
use crate::resolve::error::ResolutionError;
use crate::session::{ItemSessionState, TestSessionState};
use crate::value::Value;

/// Which of a variable's values a resolution targets
///
/// The closed set keeps dispatch in one match: the current value (optionally
/// weighted on the way from an item into a test expression), the correct
/// response and the declared default are the only lookups the engine
/// performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The declared or overridden correct response
    Correct,
    /// The declared or overridden default value
    Default,
    /// The variable's current value
    Variable {
        /// Weight applied when the reference crosses from a test into an
        /// item instance; `None` leaves the value unscaled
        weight: Option<Identifier>,
    },
}

impl Lookup {
    /// A plain current-value lookup.
    pub fn variable() -> Self {
        Lookup::Variable { weight: None }
    }

    /// A current-value lookup scaled by the named weight.
    pub fn weighted(weight: Identifier) -> Self {
        Lookup::Variable {
            weight: Some(weight),
        }
    }
}

/// How a dotted reference picks among several instances of one item
///
/// Selection with replacement can put the same item reference into the plan
/// repeatedly, and a dotted reference then no longer names a single state
/// container. The policy makes that choice explicit instead of silently
/// taking the first match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmbiguityPolicy {
    /// Target the entered instance with the highest entry sequence
    #[default]
    MostRecentlyEntered,
    /// Refuse to choose: more than one plan instance is an error
    RequireUnique,
}

/// The scope an expression is evaluated in
///
/// Carries the static definitions and the one mutable state container the
/// expression may read and write. Borrowing the container exclusively
/// matches the ownership rule of the session layer: a container is only
/// ever touched by the thread currently processing its item or test, so
/// resolution itself needs no synchronization.
pub enum EvaluationScope<'a> {
    /// Evaluation inside one item session
    Item {
        /// The item's declarations
        item: &'a ItemDef,
        /// The item instance's state
        state: &'a mut ItemSessionState,
    },
    /// Evaluation inside a test session
    Test {
        /// The test's declarations and item references
        test: &'a TestDef,
        /// The whole test session, plan included
        state: &'a mut TestSessionState,
        /// How dotted references disambiguate repeated instances
        policy: AmbiguityPolicy,
    },
}

impl<'a> EvaluationScope<'a> {
    /// Evaluate inside an item session.
    pub fn item(item: &'a ItemDef, state: &'a mut ItemSessionState) -> Self {
        EvaluationScope::Item { item, state }
    }

    /// Evaluate inside a test session under the default ambiguity policy.
    pub fn test(test: &'a TestDef, state: &'a mut TestSessionState) -> Self {
        Self::test_with_policy(test, state, AmbiguityPolicy::default())
    }

    /// Evaluate inside a test session under an explicit ambiguity policy.
    pub fn test_with_policy(
        test: &'a TestDef,
        state: &'a mut TestSessionState,
        policy: AmbiguityPolicy,
    ) -> Self {
        EvaluationScope::Test {
            test,
            state,
            policy,
        }
    }

    /// Resolve a reference to a value.
    ///
    /// Local references read this scope's own container; dotted references
    /// are only legal in test scope and cross into the targeted item
    /// instance's container. The returned value is a snapshot: built-in
    /// variables and weight application synthesize values that exist in no
    /// map.
    ///
    /// Weighting a non-numeric, non-null value is the one failure tolerated
    /// at runtime; it logs a warning and yields [`Value::Null`] instead of
    /// an error so a whole expression degrades to null rather than
    /// aborting.
    pub fn resolve(
        &self,
        lookup: &Lookup,
        reference: &VariableReferenceIdentifier,
    ) -> Result<Value, ResolutionError> {
        match (self, reference) {
            (
                EvaluationScope::Item { item, state },
                VariableReferenceIdentifier::Local(variable),
            ) => {
                if let Lookup::Variable { weight: Some(_) } = lookup {
                    return Err(ResolutionError::WeightOnLocal {
                        variable: variable.clone(),
                    });
                }
                resolve_in_item(lookup, item, Some(&**state), variable)
            }
            (
                EvaluationScope::Item { .. },
                VariableReferenceIdentifier::Dotted { item, variable },
            ) => Err(ResolutionError::DottedInItemScope {
                item: item.clone(),
                variable: variable.clone(),
            }),
            (
                EvaluationScope::Test { test, state, .. },
                VariableReferenceIdentifier::Local(variable),
            ) => {
                if let Lookup::Variable { weight: Some(_) } = lookup {
                    return Err(ResolutionError::WeightOnLocal {
                        variable: variable.clone(),
                    });
                }
                resolve_in_test(lookup, test, state, variable)
            }
            (
                EvaluationScope::Test {
                    test,
                    state,
                    policy,
                },
                VariableReferenceIdentifier::Dotted { item, variable },
            ) => {
                let item_ref =
                    test.item_ref(item)
                        .ok_or_else(|| ResolutionError::UnknownItemRef {
                            test: test.identifier().clone(),
                            item: item.clone(),
                        })?;
                let key = choose_instance(state, item, *policy)?;
                let value =
                    resolve_in_item(lookup, item_ref.item(), state.item_state(&key), variable)?;
                Ok(match lookup {
                    Lookup::Variable {
                        weight: Some(weight),
                    } => apply_weight(item_ref, weight, value),
                    _ => value,
                })
            }
        }
    }

    /// Write a variable's current value through the same location logic as
    /// [`resolve`](Self::resolve).
    ///
    /// The target must be declared and the value lands in the map matching
    /// the declared kind. Built-in variables are derived from session
    /// fields and reject writes; a dotted write requires the targeted
    /// instance to have been entered, because there is no container before
    /// that.
    pub fn set(
        &mut self,
        reference: &VariableReferenceIdentifier,
        value: Value,
    ) -> Result<(), ResolutionError> {
        match (self, reference) {
            (
                EvaluationScope::Item { item, state },
                VariableReferenceIdentifier::Local(variable),
            ) => {
                if is_item_builtin(variable) {
                    return Err(ResolutionError::BuiltinNotSettable {
                        variable: variable.clone(),
                    });
                }
                let Some(declaration) = item.declaration(variable) else {
                    return Err(ResolutionError::UnknownVariable {
                        scope: item.identifier().clone(),
                        variable: variable.clone(),
                    });
                };
                state.set_variable_value(declaration.kind(), variable.clone(), value);
                Ok(())
            }
            (
                EvaluationScope::Item { .. },
                VariableReferenceIdentifier::Dotted { item, variable },
            ) => Err(ResolutionError::DottedInItemScope {
                item: item.clone(),
                variable: variable.clone(),
            }),
            (
                EvaluationScope::Test { test, state, .. },
                VariableReferenceIdentifier::Local(variable),
            ) => {
                if variable.as_str() == BUILTIN_DURATION {
                    return Err(ResolutionError::BuiltinNotSettable {
                        variable: variable.clone(),
                    });
                }
                if test.outcome_declaration(variable).is_none() {
                    return Err(ResolutionError::UnknownVariable {
                        scope: test.identifier().clone(),
                        variable: variable.clone(),
                    });
                }
                state.set_outcome_value(variable.clone(), value);
                Ok(())
            }
            (
                EvaluationScope::Test {
                    test,
                    state,
                    policy,
                },
                VariableReferenceIdentifier::Dotted { item, variable },
            ) => {
                let item_ref =
                    test.item_ref(item)
                        .ok_or_else(|| ResolutionError::UnknownItemRef {
                            test: test.identifier().clone(),
                            item: item.clone(),
                        })?;
                if is_item_builtin(variable) {
                    return Err(ResolutionError::BuiltinNotSettable {
                        variable: variable.clone(),
                    });
                }
                let Some(declaration) = item_ref.item().declaration(variable) else {
                    return Err(ResolutionError::UnknownVariable {
                        scope: item_ref.item().identifier().clone(),
                        variable: variable.clone(),
                    });
                };
                let kind = declaration.kind();
                let key = choose_instance(&**state, item, *policy)?;
                let Some(instance) = state.item_state_mut(&key) else {
                    return Err(ResolutionError::InstanceNotEntered { key });
                };
                instance.set_variable_value(kind, variable.clone(), value);
                Ok(())
            }
        }
    }
}

/// Resolve a lookup against one item's declarations and state.
///
/// `state` is `None` for a plan instance that was never entered, which
/// reads exactly like a freshly created container: every variable null,
/// zero attempts, zero duration.
fn resolve_in_item(
    lookup: &Lookup,
    item: &ItemDef,
    state: Option<&ItemSessionState>,
    variable: &Identifier,
) -> Result<Value, ResolutionError> {
    if let Some(declaration) = item.declaration(variable) {
        let value = match lookup {
            Lookup::Variable { .. } => state
                .and_then(|state| state.variable_value(declaration.kind(), variable))
                .cloned()
                .unwrap_or(Value::Null),
            Lookup::Correct => state
                .and_then(|state| state.overridden_correct_response(variable))
                .or_else(|| declaration.correct_response())
                .cloned()
                .unwrap_or(Value::Null),
            Lookup::Default => state
                .and_then(|state| state.overridden_default(declaration.kind(), variable))
                .or_else(|| declaration.default_value())
                .cloned()
                .unwrap_or(Value::Null),
        };
        return Ok(value);
    }
    match builtin_item_value(state, variable) {
        // Built-ins have no declaration to fall back to, so their correct
        // and default lookups are null.
        Some(value) => Ok(match lookup {
            Lookup::Variable { .. } => value,
            Lookup::Correct | Lookup::Default => Value::Null,
        }),
        None => Err(ResolutionError::UnknownVariable {
            scope: item.identifier().clone(),
            variable: variable.clone(),
        }),
    }
}

/// Resolve a local lookup against the test's own variables.
fn resolve_in_test(
    lookup: &Lookup,
    test: &TestDef,
    state: &TestSessionState,
    variable: &Identifier,
) -> Result<Value, ResolutionError> {
    if variable.as_str() == BUILTIN_DURATION {
        return Ok(match lookup {
            Lookup::Variable { .. } => Value::single(state.duration_accumulated()),
            Lookup::Correct | Lookup::Default => Value::Null,
        });
    }
    // Tests carry no response variables; a correct lookup is null no matter
    // what the identifier names.
    if matches!(lookup, Lookup::Correct) {
        return Ok(Value::Null);
    }
    let Some(declaration) = test.outcome_declaration(variable) else {
        return Err(ResolutionError::UnknownVariable {
            scope: test.identifier().clone(),
            variable: variable.clone(),
        });
    };
    Ok(match lookup {
        Lookup::Default => declaration.default_value().cloned().unwrap_or(Value::Null),
        _ => state.outcome_value(variable).cloned().unwrap_or(Value::Null),
    })
}

fn builtin_item_value(state: Option<&ItemSessionState>, variable: &Identifier) -> Option<Value> {
    if variable.as_str() == BUILTIN_DURATION {
        let seconds = state.map_or(0.0, ItemSessionState::duration_accumulated);
        return Some(Value::single(seconds));
    }
    if variable.as_str() == BUILTIN_NUM_ATTEMPTS {
        let attempts = state.map_or(0, ItemSessionState::num_attempts);
        return Some(Value::single(attempts as i64));
    }
    None
}

fn is_item_builtin(variable: &Identifier) -> bool {
    variable.as_str() == BUILTIN_DURATION || variable.as_str() == BUILTIN_NUM_ATTEMPTS
}

/// Pick the plan instance a dotted reference targets.
fn choose_instance(
    state: &TestSessionState,
    item: &Identifier,
    policy: AmbiguityPolicy,
) -> Result<TestPlanNodeKey, ResolutionError> {
    let plan = state.plan();
    match plan.item_instances(item) {
        [] => Err(ResolutionError::AmbiguousReference {
            item: item.clone(),
            instances: 0,
            entered: 0,
        }),
        [only] => Ok(plan.node(*only).key().clone()),
        instances => {
            let entered: Vec<&TestPlanNodeKey> = instances
                .iter()
                .map(|id| plan.node(*id).key())
                .filter(|key| state.item_state(key).is_some())
                .collect();
            if policy == AmbiguityPolicy::RequireUnique {
                return Err(ResolutionError::AmbiguousReference {
                    item: item.clone(),
                    instances: instances.len(),
                    entered: entered.len(),
                });
            }
            let latest = entered.into_iter().max_by_key(|key| {
                state
                    .item_state(key)
                    .and_then(ItemSessionState::entry_sequence)
                    .unwrap_or(0)
            });
            match latest {
                Some(key) => {
                    log::debug!(
                        "dotted reference into '{item}' targets most recently entered instance {key}"
                    );
                    Ok(key.clone())
                }
                None => Err(ResolutionError::AmbiguousReference {
                    item: item.clone(),
                    instances: instances.len(),
                    entered: 0,
                }),
            }
        }
    }
}

/// Scale a resolved value by a named weight.
///
/// A weight name missing from the reference's table applies 1.0; the static
/// binder reports unknown names ahead of evaluation. Weighted results are
/// always floats, an unweightable value degrades to null.
fn apply_weight(item_ref: &ItemRef, weight: &Identifier, value: Value) -> Value {
    let factor = item_ref.weight(weight).unwrap_or(1.0);
    if value.is_null() {
        return Value::Null;
    }
    match value.as_f64() {
        Some(number) => Value::single(number * factor),
        None => {
            log::warn!(
                "weight '{weight}' on item reference '{}' applied to a non-numeric value; yielding null",
                item_ref.identifier()
            );
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::declarations::{VariableDeclaration, VariableKind};
    use crate::plan::{TestPlan, TestPlanBuilder};
    use crate::value::{BaseType, Cardinality, SingleValue};

    fn ident(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    fn reference(text: &str) -> VariableReferenceIdentifier {
        VariableReferenceIdentifier::parse(text).unwrap()
    }

    /// RESPONSE (response, single identifier, correct A), SCORE (outcome,
    /// single float, default 0.0), LABEL (outcome, single string), SEED
    /// (template, single integer).
    fn choice_item() -> ItemDef {
        let response = VariableDeclaration::new(
            ident("RESPONSE"),
            VariableKind::Response,
            Cardinality::Single,
            Some(BaseType::Identifier),
        )
        .unwrap()
        .with_correct_response(Value::single(SingleValue::Identifier(ident("A"))))
        .unwrap();
        let score = VariableDeclaration::new(
            ident("SCORE"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::Float),
        )
        .unwrap()
        .with_default_value(Value::single(0.0));
        let label = VariableDeclaration::new(
            ident("LABEL"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::String),
        )
        .unwrap();
        let seed = VariableDeclaration::new(
            ident("SEED"),
            VariableKind::Template,
            Cardinality::Single,
            Some(BaseType::Integer),
        )
        .unwrap();
        ItemDef::new(ident("choice-item"), vec![response, score, label, seed]).unwrap()
    }

    /// Test T1 over { Q1, Q1, Q2 }, all referencing [`choice_item`]; Q1
    /// carries weight W1 = 2.0. TOTAL is the only declared test outcome.
    fn test_def() -> TestDef {
        let item = Arc::new(choice_item());
        let q1 = ItemRef::new(ident("Q1"), Arc::clone(&item))
            .with_weight(ident("W1"), 2.0)
            .unwrap();
        let q2 = ItemRef::new(ident("Q2"), item);
        let total = VariableDeclaration::new(
            ident("TOTAL"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::Float),
        )
        .unwrap()
        .with_default_value(Value::single(0.0));
        TestDef::new(ident("T1"), vec![total], vec![q1, q2]).unwrap()
    }

    fn plan() -> TestPlan {
        let mut builder = TestPlanBuilder::new();
        let part = builder.add_test_part(ident("P1"));
        let section = builder.add_section(part, ident("S1")).unwrap();
        builder.add_item_ref(section, ident("Q1")).unwrap();
        builder.add_item_ref(section, ident("Q1")).unwrap();
        builder.add_item_ref(section, ident("Q2")).unwrap();
        builder.build()
    }

    fn enter(session: &mut TestSessionState, item: &str, occurrence: usize) {
        let id = session.plan().item_instances(&ident(item))[occurrence];
        session.enter_item(id).unwrap();
    }

    #[test]
    fn local_variable_resolves_to_current_value() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        state.set_response_value(
            ident("RESPONSE"),
            Value::single(SingleValue::Identifier(ident("B"))),
        );
        let scope = EvaluationScope::item(&item, &mut state);

        assert_eq!(
            scope
                .resolve(&Lookup::variable(), &reference("RESPONSE"))
                .unwrap(),
            Value::single(SingleValue::Identifier(ident("B")))
        );
        // Declared but never written resolves to null, not an error.
        assert_eq!(
            scope
                .resolve(&Lookup::variable(), &reference("SCORE"))
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn undeclared_local_variable_is_an_error() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        let scope = EvaluationScope::item(&item, &mut state);
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("MISSING")),
            Err(ResolutionError::UnknownVariable {
                scope: ident("choice-item"),
                variable: ident("MISSING"),
            })
        );
    }

    #[test]
    fn dotted_reference_in_item_scope_is_an_error() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        let scope = EvaluationScope::item(&item, &mut state);
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q1.SCORE")),
            Err(ResolutionError::DottedInItemScope {
                item: ident("Q1"),
                variable: ident("SCORE"),
            })
        );
    }

    #[test]
    fn item_builtins_read_session_fields() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        state.set_num_attempts(2);
        state.set_duration_accumulated(12.5);
        let scope = EvaluationScope::item(&item, &mut state);

        assert_eq!(
            scope
                .resolve(&Lookup::variable(), &reference("duration"))
                .unwrap(),
            Value::single(12.5)
        );
        assert_eq!(
            scope
                .resolve(&Lookup::variable(), &reference("numAttempts"))
                .unwrap(),
            Value::single(2)
        );
        // Built-ins carry no correct response or default.
        assert_eq!(
            scope
                .resolve(&Lookup::Correct, &reference("duration"))
                .unwrap(),
            Value::Null
        );
        assert_eq!(
            scope
                .resolve(&Lookup::Default, &reference("numAttempts"))
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn correct_lookup_prefers_the_overridden_response() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        {
            let scope = EvaluationScope::item(&item, &mut state);
            assert_eq!(
                scope.resolve(&Lookup::Correct, &reference("RESPONSE")).unwrap(),
                Value::single(SingleValue::Identifier(ident("A")))
            );
            // Outcomes have no correct response.
            assert_eq!(
                scope.resolve(&Lookup::Correct, &reference("SCORE")).unwrap(),
                Value::Null
            );
        }
        state.set_overridden_correct_response(
            ident("RESPONSE"),
            Value::single(SingleValue::Identifier(ident("C"))),
        );
        let scope = EvaluationScope::item(&item, &mut state);
        assert_eq!(
            scope.resolve(&Lookup::Correct, &reference("RESPONSE")).unwrap(),
            Value::single(SingleValue::Identifier(ident("C")))
        );
    }

    #[test]
    fn default_lookup_prefers_the_overridden_default() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        {
            let scope = EvaluationScope::item(&item, &mut state);
            assert_eq!(
                scope.resolve(&Lookup::Default, &reference("SCORE")).unwrap(),
                Value::single(0.0)
            );
            // No static default and no override.
            assert_eq!(
                scope.resolve(&Lookup::Default, &reference("SEED")).unwrap(),
                Value::Null
            );
        }
        state.set_overridden_default(VariableKind::Outcome, ident("SCORE"), Value::single(1.0));
        let scope = EvaluationScope::item(&item, &mut state);
        assert_eq!(
            scope.resolve(&Lookup::Default, &reference("SCORE")).unwrap(),
            Value::single(1.0)
        );
    }

    #[test]
    fn weight_on_a_local_reference_is_an_error() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        let scope = EvaluationScope::item(&item, &mut state);
        assert_eq!(
            scope.resolve(&Lookup::weighted(ident("W1")), &reference("SCORE")),
            Err(ResolutionError::WeightOnLocal {
                variable: ident("SCORE"),
            })
        );

        let test = test_def();
        let mut session = TestSessionState::new(plan());
        let scope = EvaluationScope::test(&test, &mut session);
        assert_eq!(
            scope.resolve(&Lookup::weighted(ident("W1")), &reference("TOTAL")),
            Err(ResolutionError::WeightOnLocal {
                variable: ident("TOTAL"),
            })
        );
    }

    #[test]
    fn test_scope_resolves_outcomes_and_duration() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        session.set_outcome_value(ident("TOTAL"), Value::single(4.0));
        session.set_duration_accumulated(90.0);
        let scope = EvaluationScope::test(&test, &mut session);

        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("TOTAL")).unwrap(),
            Value::single(4.0)
        );
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("duration")).unwrap(),
            Value::single(90.0)
        );
        assert_eq!(
            scope.resolve(&Lookup::Default, &reference("TOTAL")).unwrap(),
            Value::single(0.0)
        );
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("MISSING")),
            Err(ResolutionError::UnknownVariable {
                scope: ident("T1"),
                variable: ident("MISSING"),
            })
        );
    }

    #[test]
    fn correct_at_test_scope_is_always_null() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        let scope = EvaluationScope::test(&test, &mut session);
        assert_eq!(
            scope.resolve(&Lookup::Correct, &reference("TOTAL")).unwrap(),
            Value::Null
        );
        // Even for identifiers the test never declared.
        assert_eq!(
            scope.resolve(&Lookup::Correct, &reference("ANYTHING")).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn dotted_reference_reads_the_unique_instance() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        enter(&mut session, "Q2", 0);
        let q2_key = session.plan().node(session.plan().item_instances(&ident("Q2"))[0]).key().clone();
        session
            .item_state_mut(&q2_key)
            .unwrap()
            .set_response_value(ident("RESPONSE"), Value::single(SingleValue::Identifier(ident("B"))));

        let scope = EvaluationScope::test(&test, &mut session);
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q2.RESPONSE")).unwrap(),
            Value::single(SingleValue::Identifier(ident("B")))
        );
        assert_eq!(
            scope.resolve(&Lookup::Correct, &reference("Q2.RESPONSE")).unwrap(),
            Value::single(SingleValue::Identifier(ident("A")))
        );
    }

    #[test]
    fn unentered_unique_instance_reads_like_a_fresh_container() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        let scope = EvaluationScope::test(&test, &mut session);

        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q2.RESPONSE")).unwrap(),
            Value::Null
        );
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q2.numAttempts")).unwrap(),
            Value::single(0)
        );
    }

    #[test]
    fn dotted_reference_to_unknown_item_ref_is_an_error() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        let scope = EvaluationScope::test(&test, &mut session);
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q9.SCORE")),
            Err(ResolutionError::UnknownItemRef {
                test: ident("T1"),
                item: ident("Q9"),
            })
        );
    }

    #[test]
    fn repeated_instances_resolve_to_the_most_recently_entered() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        enter(&mut session, "Q1", 0);
        enter(&mut session, "Q1", 1);

        let keys: Vec<TestPlanNodeKey> = session
            .plan()
            .item_instances(&ident("Q1"))
            .iter()
            .map(|id| session.plan().node(*id).key().clone())
            .collect();
        session
            .item_state_mut(&keys[0])
            .unwrap()
            .set_outcome_value(ident("SCORE"), Value::single(1.0));
        session
            .item_state_mut(&keys[1])
            .unwrap()
            .set_outcome_value(ident("SCORE"), Value::single(2.0));

        let scope = EvaluationScope::test(&test, &mut session);
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q1.SCORE")).unwrap(),
            Value::single(2.0)
        );
    }

    #[test]
    fn repeated_instances_with_none_entered_are_ambiguous() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        let scope = EvaluationScope::test(&test, &mut session);
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q1.SCORE")),
            Err(ResolutionError::AmbiguousReference {
                item: ident("Q1"),
                instances: 2,
                entered: 0,
            })
        );
    }

    #[test]
    fn require_unique_policy_rejects_repeated_instances() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        enter(&mut session, "Q1", 0);
        let scope =
            EvaluationScope::test_with_policy(&test, &mut session, AmbiguityPolicy::RequireUnique);
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q1.SCORE")),
            Err(ResolutionError::AmbiguousReference {
                item: ident("Q1"),
                instances: 2,
                entered: 1,
            })
        );
        // A genuinely unique instance is still fine.
        assert_eq!(
            scope.resolve(&Lookup::variable(), &reference("Q2.SCORE")).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn weights_scale_numeric_values_into_floats() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        enter(&mut session, "Q2", 0);
        enter(&mut session, "Q1", 0);
        let q1_key = session.plan().node(session.plan().item_instances(&ident("Q1"))[0]).key().clone();
        let q1_state = session.item_state_mut(&q1_key).unwrap();
        q1_state.set_outcome_value(ident("SCORE"), Value::single(3.0));
        q1_state.set_num_attempts(1);

        let scope = EvaluationScope::test(&test, &mut session);
        assert_eq!(
            scope.resolve(&Lookup::weighted(ident("W1")), &reference("Q1.SCORE")).unwrap(),
            Value::single(6.0)
        );
        // Integers weight into floats.
        assert_eq!(
            scope
                .resolve(&Lookup::weighted(ident("W1")), &reference("Q1.numAttempts"))
                .unwrap(),
            Value::single(2.0)
        );
        // An unknown weight name scales by 1.0.
        assert_eq!(
            scope.resolve(&Lookup::weighted(ident("W9")), &reference("Q1.SCORE")).unwrap(),
            Value::single(3.0)
        );
    }

    #[test]
    fn weighting_non_numeric_values_yields_null() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        enter(&mut session, "Q1", 0);
        let q1_key = session.plan().node(session.plan().item_instances(&ident("Q1"))[0]).key().clone();
        session
            .item_state_mut(&q1_key)
            .unwrap()
            .set_outcome_value(ident("LABEL"), Value::single(SingleValue::from("partial")));

        let scope = EvaluationScope::test(&test, &mut session);
        assert_eq!(
            scope.resolve(&Lookup::weighted(ident("W1")), &reference("Q1.LABEL")).unwrap(),
            Value::Null
        );
        // Null stays null rather than becoming a warning.
        assert_eq!(
            scope.resolve(&Lookup::weighted(ident("W1")), &reference("Q1.SCORE")).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn set_writes_into_the_declared_kind() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        let mut scope = EvaluationScope::item(&item, &mut state);
        scope
            .set(&reference("RESPONSE"), Value::single(SingleValue::Identifier(ident("C"))))
            .unwrap();
        scope.set(&reference("SCORE"), Value::single(0.5)).unwrap();
        drop(scope);

        assert_eq!(
            state.response_value(&ident("RESPONSE")),
            Some(&Value::single(SingleValue::Identifier(ident("C"))))
        );
        assert_eq!(state.outcome_value(&ident("SCORE")), Some(&Value::single(0.5)));
        assert_eq!(state.template_value(&ident("SCORE")), None);
    }

    #[test]
    fn set_rejects_builtins_and_undeclared_targets() {
        let item = choice_item();
        let mut state = ItemSessionState::new();
        let mut scope = EvaluationScope::item(&item, &mut state);
        assert_eq!(
            scope.set(&reference("duration"), Value::single(1.0)),
            Err(ResolutionError::BuiltinNotSettable {
                variable: ident("duration"),
            })
        );
        assert_eq!(
            scope.set(&reference("MISSING"), Value::single(1.0)),
            Err(ResolutionError::UnknownVariable {
                scope: ident("choice-item"),
                variable: ident("MISSING"),
            })
        );
        assert_eq!(
            scope.set(&reference("Q1.SCORE"), Value::single(1.0)),
            Err(ResolutionError::DottedInItemScope {
                item: ident("Q1"),
                variable: ident("SCORE"),
            })
        );
    }

    #[test]
    fn test_scope_set_writes_outcomes_only() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        let mut scope = EvaluationScope::test(&test, &mut session);
        scope.set(&reference("TOTAL"), Value::single(7.0)).unwrap();
        assert_eq!(
            scope.set(&reference("duration"), Value::single(1.0)),
            Err(ResolutionError::BuiltinNotSettable {
                variable: ident("duration"),
            })
        );
        drop(scope);
        assert_eq!(session.outcome_value(&ident("TOTAL")), Some(&Value::single(7.0)));
    }

    #[test]
    fn dotted_set_requires_an_entered_instance() {
        let test = test_def();
        let mut session = TestSessionState::new(plan());
        {
            let mut scope = EvaluationScope::test(&test, &mut session);
            let error = scope.set(&reference("Q2.SCORE"), Value::single(1.0)).unwrap_err();
            assert!(matches!(error, ResolutionError::InstanceNotEntered { .. }));
        }

        enter(&mut session, "Q2", 0);
        let q2_key = session.plan().node(session.plan().item_instances(&ident("Q2"))[0]).key().clone();
        let mut scope = EvaluationScope::test(&test, &mut session);
        scope.set(&reference("Q2.SCORE"), Value::single(1.0)).unwrap();
        drop(scope);
        assert_eq!(
            session.item_state(&q2_key).unwrap().outcome_value(&ident("SCORE")),
            Some(&Value::single(1.0))
        );
    }
}
