//! Mutable state of one item instance within a candidate session

use indexmap::{IndexMap, IndexSet};

use crate::declarations::VariableKind;
use crate::identifier::Identifier;
use crate::session::SessionStatus;
use crate::value::Value;

/// The full mutable state of one item instance
///
/// Created empty when the instance is first entered and mutated by response
/// binding, template/outcome processing and defaults recomputation. The three
/// variable namespaces and the override maps are fully independent: no setter
/// touches anything beyond the field it names, so closing an item never
/// clears its recorded responses.
///
/// Maps preserve insertion order, which keeps serialized state stable across
/// save/reload cycles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemSessionState {
    initialized: bool,
    presented: bool,
    responded: bool,
    closed: bool,
    session_status: Option<SessionStatus>,
    num_attempts: u64,
    duration_accumulated: f64,
    entry_sequence: Option<u64>,
    candidate_comment: Option<String>,
    bad_responses: IndexSet<Identifier>,
    invalid_responses: IndexSet<Identifier>,
    shuffled_orders: IndexMap<Identifier, Vec<Identifier>>,
    template_values: IndexMap<Identifier, Value>,
    response_values: IndexMap<Identifier, Value>,
    outcome_values: IndexMap<Identifier, Value>,
    overridden_template_defaults: IndexMap<Identifier, Value>,
    overridden_response_defaults: IndexMap<Identifier, Value>,
    overridden_outcome_defaults: IndexMap<Identifier, Value>,
    overridden_correct_responses: IndexMap<Identifier, Value>,
}

impl ItemSessionState {
    /// Fresh state: all flags false, no attempts, every map empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether template processing has run for this instance.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    /// Whether the item body has been shown to the candidate.
    pub fn is_presented(&self) -> bool {
        self.presented
    }

    pub fn set_presented(&mut self, presented: bool) {
        self.presented = presented;
    }

    /// Whether the candidate has submitted at least one response.
    pub fn is_responded(&self) -> bool {
        self.responded
    }

    pub fn set_responded(&mut self, responded: bool) {
        self.responded = responded;
    }

    /// Whether the session for this instance has ended.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// The reported QTI session status, if one has been recorded.
    pub fn session_status(&self) -> Option<SessionStatus> {
        self.session_status
    }

    pub fn set_session_status(&mut self, status: Option<SessionStatus>) {
        self.session_status = status;
    }

    /// Number of attempts made on this instance, feeding the built-in
    /// `numAttempts` response variable.
    pub fn num_attempts(&self) -> u64 {
        self.num_attempts
    }

    pub fn set_num_attempts(&mut self, attempts: u64) {
        self.num_attempts = attempts;
    }

    /// Accumulated time in seconds, feeding the built-in `duration` variable.
    pub fn duration_accumulated(&self) -> f64 {
        self.duration_accumulated
    }

    pub fn set_duration_accumulated(&mut self, seconds: f64) {
        self.duration_accumulated = seconds;
    }

    /// Add time spent in this instance.
    pub fn accumulate_duration(&mut self, seconds: f64) {
        self.duration_accumulated += seconds;
    }

    /// Order stamp assigned when the enclosing test session first entered
    /// this instance; `None` for standalone item sessions.
    pub fn entry_sequence(&self) -> Option<u64> {
        self.entry_sequence
    }

    pub fn set_entry_sequence(&mut self, sequence: Option<u64>) {
        self.entry_sequence = sequence;
    }

    /// Free-text comment left by the candidate, if any.
    pub fn candidate_comment(&self) -> Option<&str> {
        self.candidate_comment.as_deref()
    }

    pub fn set_candidate_comment(&mut self, comment: Option<String>) {
        self.candidate_comment = comment;
    }

    /// Responses whose raw candidate input could not be bound to the declared
    /// type.
    pub fn bad_responses(&self) -> &IndexSet<Identifier> {
        &self.bad_responses
    }

    pub fn set_bad_responses(&mut self, responses: IndexSet<Identifier>) {
        self.bad_responses = responses;
    }

    /// Responses that bound but failed their validity constraints.
    pub fn invalid_responses(&self) -> &IndexSet<Identifier> {
        &self.invalid_responses
    }

    pub fn set_invalid_responses(&mut self, responses: IndexSet<Identifier>) {
        self.invalid_responses = responses;
    }

    /// The shuffled choice order recorded for a response interaction, or
    /// `None` if no shuffling was recorded.
    pub fn shuffled_order(&self, response: &Identifier) -> Option<&[Identifier]> {
        self.shuffled_orders.get(response).map(Vec::as_slice)
    }

    pub fn set_shuffled_order(&mut self, response: Identifier, order: Vec<Identifier>) {
        self.shuffled_orders.insert(response, order);
    }

    /// All recorded shuffled orders, keyed by response identifier.
    pub fn shuffled_orders(&self) -> &IndexMap<Identifier, Vec<Identifier>> {
        &self.shuffled_orders
    }

    fn values_of(&self, kind: VariableKind) -> &IndexMap<Identifier, Value> {
        match kind {
            VariableKind::Template => &self.template_values,
            VariableKind::Response => &self.response_values,
            VariableKind::Outcome => &self.outcome_values,
        }
    }

    fn values_of_mut(&mut self, kind: VariableKind) -> &mut IndexMap<Identifier, Value> {
        match kind {
            VariableKind::Template => &mut self.template_values,
            VariableKind::Response => &mut self.response_values,
            VariableKind::Outcome => &mut self.outcome_values,
        }
    }

    fn overridden_defaults_of(&self, kind: VariableKind) -> &IndexMap<Identifier, Value> {
        match kind {
            VariableKind::Template => &self.overridden_template_defaults,
            VariableKind::Response => &self.overridden_response_defaults,
            VariableKind::Outcome => &self.overridden_outcome_defaults,
        }
    }

    fn overridden_defaults_of_mut(&mut self, kind: VariableKind) -> &mut IndexMap<Identifier, Value> {
        match kind {
            VariableKind::Template => &mut self.overridden_template_defaults,
            VariableKind::Response => &mut self.overridden_response_defaults,
            VariableKind::Outcome => &mut self.overridden_outcome_defaults,
        }
    }

    /// Current value of a variable in the given namespace.
    pub fn variable_value(&self, kind: VariableKind, identifier: &Identifier) -> Option<&Value> {
        self.values_of(kind).get(identifier)
    }

    /// Set a variable in the given namespace, inserting if absent.
    ///
    /// Declarations are not consulted here; checking a write against them is
    /// the binder's job.
    pub fn set_variable_value(&mut self, kind: VariableKind, identifier: Identifier, value: Value) {
        self.values_of_mut(kind).insert(identifier, value);
    }

    /// A default recomputed at runtime for the given variable, shadowing the
    /// declaration's static default.
    pub fn overridden_default(&self, kind: VariableKind, identifier: &Identifier) -> Option<&Value> {
        self.overridden_defaults_of(kind).get(identifier)
    }

    pub fn set_overridden_default(
        &mut self,
        kind: VariableKind,
        identifier: Identifier,
        value: Value,
    ) {
        self.overridden_defaults_of_mut(kind).insert(identifier, value);
    }

    /// A correct response recomputed at runtime, shadowing the declaration's
    /// static correct response.
    pub fn overridden_correct_response(&self, identifier: &Identifier) -> Option<&Value> {
        self.overridden_correct_responses.get(identifier)
    }

    pub fn set_overridden_correct_response(&mut self, identifier: Identifier, value: Value) {
        self.overridden_correct_responses.insert(identifier, value);
    }

    /// Current template variable value.
    pub fn template_value(&self, identifier: &Identifier) -> Option<&Value> {
        self.template_values.get(identifier)
    }

    pub fn set_template_value(&mut self, identifier: Identifier, value: Value) {
        self.template_values.insert(identifier, value);
    }

    /// Current response variable value.
    pub fn response_value(&self, identifier: &Identifier) -> Option<&Value> {
        self.response_values.get(identifier)
    }

    pub fn set_response_value(&mut self, identifier: Identifier, value: Value) {
        self.response_values.insert(identifier, value);
    }

    /// Current outcome variable value.
    pub fn outcome_value(&self, identifier: &Identifier) -> Option<&Value> {
        self.outcome_values.get(identifier)
    }

    pub fn set_outcome_value(&mut self, identifier: Identifier, value: Value) {
        self.outcome_values.insert(identifier, value);
    }

    /// All template values, in insertion order.
    pub fn template_values(&self) -> &IndexMap<Identifier, Value> {
        &self.template_values
    }

    /// All response values, in insertion order.
    pub fn response_values(&self) -> &IndexMap<Identifier, Value> {
        &self.response_values
    }

    /// All outcome values, in insertion order.
    pub fn outcome_values(&self) -> &IndexMap<Identifier, Value> {
        &self.outcome_values
    }

    /// All overridden template defaults, in insertion order.
    pub fn overridden_template_defaults(&self) -> &IndexMap<Identifier, Value> {
        &self.overridden_template_defaults
    }

    /// All overridden response defaults, in insertion order.
    pub fn overridden_response_defaults(&self) -> &IndexMap<Identifier, Value> {
        &self.overridden_response_defaults
    }

    /// All overridden outcome defaults, in insertion order.
    pub fn overridden_outcome_defaults(&self) -> &IndexMap<Identifier, Value> {
        &self.overridden_outcome_defaults
    }

    /// All overridden correct responses, in insertion order.
    pub fn overridden_correct_responses(&self) -> &IndexMap<Identifier, Value> {
        &self.overridden_correct_responses
    }
}
