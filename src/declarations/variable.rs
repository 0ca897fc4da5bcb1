//! Variable declarations shared by items and tests

use crate::declarations::error::DeclarationError;
use crate::declarations::mapping::Mapping;
use crate::declarations::VariableKind;
use crate::identifier::Identifier;
use crate::value::{BaseType, Cardinality, Value};

/// The static declaration of one variable
///
/// Declares the variable's namespace ([`VariableKind`]), its shape
/// (cardinality plus base type), and the optional static default. Response
/// declarations may additionally carry a correct response and a scoring
/// mapping. Record variables declare no shared base type; every other
/// cardinality requires one.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    identifier: Identifier,
    kind: VariableKind,
    cardinality: Cardinality,
    base_type: Option<BaseType>,
    default_value: Option<Value>,
    correct_response: Option<Value>,
    mapping: Option<Mapping>,
}

impl VariableDeclaration {
    /// Declare a variable with the given shape.
    ///
    /// `base_type` must be `None` exactly when `cardinality` is record.
    pub fn new(
        identifier: Identifier,
        kind: VariableKind,
        cardinality: Cardinality,
        base_type: Option<BaseType>,
    ) -> Result<Self, DeclarationError> {
        match (cardinality, base_type) {
            (Cardinality::Record, Some(_)) => {
                return Err(DeclarationError::RecordWithBaseType { identifier });
            }
            (Cardinality::Record, None) | (_, Some(_)) => {}
            (_, None) => {
                return Err(DeclarationError::MissingBaseType { identifier });
            }
        }
        Ok(Self {
            identifier,
            kind,
            cardinality,
            base_type,
            default_value: None,
            correct_response: None,
            mapping: None,
        })
    }

    /// Attach the static default applied when the variable is initialized.
    pub fn with_default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Attach the declared correct response; response declarations only.
    pub fn with_correct_response(mut self, value: Value) -> Result<Self, DeclarationError> {
        if self.kind != VariableKind::Response {
            return Err(DeclarationError::CorrectResponseOnNonResponse {
                identifier: self.identifier,
                kind: self.kind,
            });
        }
        self.correct_response = Some(value);
        Ok(self)
    }

    /// Attach a scoring mapping; response declarations only.
    pub fn with_mapping(mut self, mapping: Mapping) -> Result<Self, DeclarationError> {
        if self.kind != VariableKind::Response {
            return Err(DeclarationError::MappingOnNonResponse {
                identifier: self.identifier,
                kind: self.kind,
            });
        }
        self.mapping = Some(mapping);
        Ok(self)
    }

    /// The declared variable name.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Which of the three namespaces the variable lives in.
    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// The declared cardinality.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// The declared base type; `None` for record variables.
    pub fn base_type(&self) -> Option<BaseType> {
        self.base_type
    }

    /// The static default value, if declared.
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// The declared correct response, if any.
    pub fn correct_response(&self) -> Option<&Value> {
        self.correct_response.as_ref()
    }

    /// The scoring mapping, if any.
    pub fn mapping(&self) -> Option<&Mapping> {
        self.mapping.as_ref()
    }

    /// Whether a single value of this declaration's base type is numeric,
    /// which is what weight application requires.
    pub fn is_single_numeric(&self) -> bool {
        self.cardinality == Cardinality::Single
            && self.base_type.is_some_and(|base_type| base_type.is_numeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SingleValue;

    fn ident(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    #[test]
    fn record_shape_forbids_a_base_type() {
        assert!(matches!(
            VariableDeclaration::new(
                ident("R"),
                VariableKind::Response,
                Cardinality::Record,
                Some(BaseType::Integer),
            ),
            Err(DeclarationError::RecordWithBaseType { .. })
        ));
        assert!(VariableDeclaration::new(
            ident("R"),
            VariableKind::Response,
            Cardinality::Record,
            None,
        )
        .is_ok());
    }

    #[test]
    fn non_record_shape_requires_a_base_type() {
        assert!(matches!(
            VariableDeclaration::new(ident("X"), VariableKind::Template, Cardinality::Single, None),
            Err(DeclarationError::MissingBaseType { .. })
        ));
    }

    #[test]
    fn correct_response_is_response_only() {
        let outcome = VariableDeclaration::new(
            ident("SCORE"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::Float),
        )
        .unwrap();
        assert!(matches!(
            outcome.with_correct_response(Value::single(1.0)),
            Err(DeclarationError::CorrectResponseOnNonResponse { .. })
        ));

        let response = VariableDeclaration::new(
            ident("RESPONSE"),
            VariableKind::Response,
            Cardinality::Single,
            Some(BaseType::Identifier),
        )
        .unwrap()
        .with_correct_response(Value::single(SingleValue::Identifier(ident("A"))))
        .unwrap();
        assert!(response.correct_response().is_some());
    }

    #[test]
    fn single_numeric_shapes_accept_weights() {
        let score = VariableDeclaration::new(
            ident("SCORE"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::Float),
        )
        .unwrap();
        assert!(score.is_single_numeric());

        let label = VariableDeclaration::new(
            ident("LABEL"),
            VariableKind::Outcome,
            Cardinality::Single,
            Some(BaseType::String),
        )
        .unwrap();
        assert!(!label.is_single_numeric());

        let scores = VariableDeclaration::new(
            ident("SCORES"),
            VariableKind::Outcome,
            Cardinality::Multiple,
            Some(BaseType::Float),
        )
        .unwrap();
        assert!(!scores.is_single_numeric());
    }
}
