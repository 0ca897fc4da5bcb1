//! Response mappings: scoring tables applied by `mapResponse`

use crate::declarations::error::DeclarationError;
use crate::value::{SingleValue, Value};

/// One row of a [`Mapping`]: a key scalar and the score it maps to
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    map_key: SingleValue,
    mapped_value: f64,
    case_sensitive: bool,
}

impl MapEntry {
    /// A case-sensitive entry, which is the QTI default.
    pub fn new(map_key: impl Into<SingleValue>, mapped_value: f64) -> Self {
        Self {
            map_key: map_key.into(),
            mapped_value,
            case_sensitive: true,
        }
    }

    /// Make string comparison against this entry ignore case.
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// The scalar this entry matches.
    pub fn map_key(&self) -> &SingleValue {
        &self.map_key
    }

    /// The score contributed when this entry matches.
    pub fn mapped_value(&self) -> f64 {
        self.mapped_value
    }

    /// Whether string matching respects case.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn matches(&self, element: &SingleValue) -> bool {
        if !self.case_sensitive {
            if let (SingleValue::String(key), SingleValue::String(candidate)) =
                (&self.map_key, element)
            {
                return key.to_lowercase() == candidate.to_lowercase();
            }
        }
        self.map_key == *element
    }
}

/// A response mapping: per-value scores with a default and optional bounds
///
/// Applied by [`map_response`](Self::map_response) with the QTI "count once"
/// rule: each distinct element of a container contributes exactly once, no
/// matter how often it was submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    default_value: f64,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
    entries: Vec<MapEntry>,
}

impl Mapping {
    /// Assemble a mapping; fails if the bounds are inverted.
    pub fn new(
        default_value: f64,
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
        entries: Vec<MapEntry>,
    ) -> Result<Self, DeclarationError> {
        if let (Some(lower), Some(upper)) = (lower_bound, upper_bound) {
            if lower > upper {
                return Err(DeclarationError::BadMappingBounds { lower, upper });
            }
        }
        Ok(Self {
            default_value,
            lower_bound,
            upper_bound,
            entries,
        })
    }

    /// Score contributed by an element no entry matches.
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Lower clamp applied to the final result.
    pub fn lower_bound(&self) -> Option<f64> {
        self.lower_bound
    }

    /// Upper clamp applied to the final result.
    pub fn upper_bound(&self) -> Option<f64> {
        self.upper_bound
    }

    /// The mapping rows, in declaration order.
    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    fn score_element(&self, element: &SingleValue) -> f64 {
        self.entries
            .iter()
            .find(|entry| entry.matches(element))
            .map_or(self.default_value, MapEntry::mapped_value)
    }

    fn clamp(&self, total: f64) -> f64 {
        let mut result = total;
        if let Some(lower) = self.lower_bound {
            result = result.max(lower);
        }
        if let Some(upper) = self.upper_bound {
            result = result.min(upper);
        }
        result
    }

    /// Apply the mapping to a response value.
    ///
    /// Singles score directly; multiple and ordered containers sum over their
    /// distinct elements, counting repeats once. Null and record values score
    /// the default. The result is clamped to the declared bounds.
    pub fn map_response(&self, value: &Value) -> f64 {
        let total = match value {
            Value::Null | Value::Record(_) => self.default_value,
            Value::Single(element) => self.score_element(element),
            Value::Multiple(elements) | Value::Ordered(elements) => {
                let mut seen: Vec<&SingleValue> = Vec::new();
                let mut sum = 0.0;
                for element in elements {
                    if seen.contains(&element) {
                        continue;
                    }
                    seen.push(element);
                    sum += self.score_element(element);
                }
                sum
            }
        };
        self.clamp(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;
    use crate::value::SingleValue;

    fn ident(text: &str) -> SingleValue {
        SingleValue::Identifier(Identifier::parse(text).unwrap())
    }

    fn letter_mapping() -> Mapping {
        Mapping::new(
            0.0,
            None,
            None,
            vec![
                MapEntry::new(ident("A"), 0.0),
                MapEntry::new(ident("B"), 1.0),
                MapEntry::new(ident("C"), 0.5),
                MapEntry::new(ident("D"), 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn container_sums_matched_entries() {
        let mapping = letter_mapping();
        let response = Value::multiple(vec![ident("C"), ident("B")]).unwrap();
        assert_eq!(mapping.map_response(&response), 1.5);
    }

    #[test]
    fn repeats_count_once() {
        let mapping = letter_mapping();
        let response = Value::multiple(vec![ident("B"), ident("B"), ident("C")]).unwrap();
        assert_eq!(mapping.map_response(&response), 1.5);
    }

    #[test]
    fn unmatched_elements_score_the_default() {
        let mapping = Mapping::new(
            -1.0,
            None,
            None,
            vec![MapEntry::new(ident("A"), 2.0)],
        )
        .unwrap();
        let response = Value::multiple(vec![ident("A"), ident("Z")]).unwrap();
        assert_eq!(mapping.map_response(&response), 1.0);
    }

    #[test]
    fn null_scores_the_clamped_default() {
        let mapping = Mapping::new(-2.0, Some(0.0), None, vec![]).unwrap();
        assert_eq!(mapping.map_response(&Value::Null), 0.0);
    }

    #[test]
    fn bounds_clamp_the_total() {
        let mapping = Mapping::new(
            0.0,
            Some(0.0),
            Some(2.0),
            vec![
                MapEntry::new(ident("A"), 1.5),
                MapEntry::new(ident("B"), 1.5),
            ],
        )
        .unwrap();
        let response = Value::multiple(vec![ident("A"), ident("B")]).unwrap();
        assert_eq!(mapping.map_response(&response), 2.0);
    }

    #[test]
    fn case_insensitive_entries_match_any_casing() {
        let mapping = Mapping::new(
            0.0,
            None,
            None,
            vec![
                MapEntry::new(SingleValue::from("York"), 1.0).case_insensitive(),
                MapEntry::new(SingleValue::from("Leeds"), 1.0),
            ],
        )
        .unwrap();
        assert_eq!(
            mapping.map_response(&Value::single(SingleValue::from("YORK"))),
            1.0
        );
        // The case-sensitive entry does not match a different casing.
        assert_eq!(
            mapping.map_response(&Value::single(SingleValue::from("LEEDS"))),
            0.0
        );
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert_eq!(
            Mapping::new(0.0, Some(2.0), Some(1.0), vec![]),
            Err(DeclarationError::BadMappingBounds {
                lower: 2.0,
                upper: 1.0
            })
        );
    }

    #[test]
    fn single_scores_directly() {
        let mapping = letter_mapping();
        assert_eq!(mapping.map_response(&Value::single(ident("C"))), 0.5);
    }
}
