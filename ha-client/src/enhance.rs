//! Display-friendly view of hub state objects.

use std::ops::Deref;

use serde_json::Value;

const STATE_KEY: &str = "state";
const VALUE_KEY: &str = "value";
const ATTRIBUTES_KEY: &str = "attributes";
const UNIT_KEY: &str = "unit_of_measurement";
const TRUE_LITERAL: &str = "True";

/// A decoded hub response with its unit folded into `state`.
///
/// Construction rewrites `state` to `state + attributes.unit_of_measurement` once
/// (`"21"` and `"°C"` become `"21°C"`). Documents lacking either key are kept as they
/// are. Nothing else changes: the key set is the same as the decoded document, which is
/// also reachable through `Deref<Target = Value>`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateResult {
    document: Value,
}

impl StateResult {
    pub fn new(document: Value) -> Self {
        Self {
            document: with_unit(document),
        }
    }

    /// The (unit-suffixed) `state` entry
    pub fn state(&self) -> Option<&Value> {
        self.document.get(STATE_KEY)
    }

    /// `value` when present, otherwise `state`
    pub fn value(&self) -> Option<&Value> {
        self.document
            .get(VALUE_KEY)
            .or_else(|| self.document.get(STATE_KEY))
    }

    /// True only when [`value`](Self::value) is the string `"True"`
    pub fn is_true(&self) -> bool {
        matches!(self.value(), Some(Value::String(s)) if s == TRUE_LITERAL)
    }

    pub fn is_false(&self) -> bool {
        !self.is_true()
    }

    pub fn as_value(&self) -> &Value {
        &self.document
    }

    pub fn into_value(self) -> Value {
        self.document
    }
}

impl Deref for StateResult {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.document
    }
}

impl From<StateResult> for Value {
    fn from(result: StateResult) -> Self {
        result.document
    }
}

fn with_unit(mut document: Value) -> Value {
    let unit = document
        .get(ATTRIBUTES_KEY)
        .and_then(|attributes| attributes.get(UNIT_KEY))
        .and_then(Value::as_str)
        .map(str::to_owned);

    let Some(unit) = unit else {
        return document;
    };

    if let Some(state) = document.get_mut(STATE_KEY) {
        let text = match &*state {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        };
        if let Some(text) = text {
            *state = Value::String(text + &unit);
        }
    }

    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_unit_appended_to_state() {
        let result = StateResult::new(json!({
            "state": "21",
            "attributes": {"unit_of_measurement": "°C"}
        }));
        assert_eq!(result.state(), Some(&json!("21°C")));
        assert_eq!(result["attributes"]["unit_of_measurement"], json!("°C"));
    }

    #[test]
    fn test_numeric_state_is_stringified() {
        let result = StateResult::new(json!({
            "state": 55.5,
            "attributes": {"unit_of_measurement": "%"}
        }));
        assert_eq!(result.state(), Some(&json!("55.5%")));
    }

    #[test]
    fn test_state_rewritten_in_place() {
        let result = StateResult::new(json!({
            "entity_id": "binary_sensor.door",
            "state": true,
            "attributes": {"unit_of_measurement": "!"}
        }));
        assert_eq!(
            result.as_value(),
            &json!({
                "entity_id": "binary_sensor.door",
                "state": "true!",
                "attributes": {"unit_of_measurement": "!"}
            })
        );
    }

    #[rstest]
    #[case(json!({"state": "21"}))]
    #[case(json!({"state": "21", "attributes": {}}))]
    #[case(json!({"state": "21", "attributes": {"friendly_name": "Kitchen"}}))]
    #[case(json!({"state": null, "attributes": {"unit_of_measurement": "°C"}}))]
    #[case(json!({"attributes": {"unit_of_measurement": "°C"}}))]
    #[case(json!([{"state": "21", "attributes": {"unit_of_measurement": "°C"}}]))]
    fn test_documents_without_both_keys_untouched(#[case] document: Value) {
        let result = StateResult::new(document.clone());
        assert_eq!(result.as_value(), &document);
    }

    #[test]
    fn test_value_prefers_value_key() {
        let result = StateResult::new(json!({"state": "on", "value": "True"}));
        assert_eq!(result.value(), Some(&json!("True")));
        assert!(result.is_true());

        let result = StateResult::new(json!({"state": "True"}));
        assert_eq!(result.value(), Some(&json!("True")));
        assert!(result.is_true());
    }

    #[rstest]
    #[case(json!({"state": "true"}))]
    #[case(json!({"state": "TRUE"}))]
    #[case(json!({"state": 1}))]
    #[case(json!({"state": true}))]
    #[case(json!({"state": null}))]
    #[case(json!({"value": "False", "state": "True"}))]
    #[case(json!({}))]
    fn test_only_exact_true_string_is_true(#[case] document: Value) {
        let result = StateResult::new(document);
        assert!(!result.is_true());
        assert!(result.is_false());
    }
}
