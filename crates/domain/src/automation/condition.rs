//! Condition evaluation — does an event occurrence pass a rule's filters?

use serde_json::{Map, Value};

use crate::automation::trigger::{ConditionRule, TriggerDefinition};
use crate::path;

/// Check a rule's `triggerConfig` against an event payload.
///
/// Every configured key must be satisfied (logical AND); keys unknown to
/// the trigger's schema are not filters. An empty config always passes.
/// Unresolvable paths and non-numeric values never fail loudly, they
/// simply do not satisfy the condition.
#[must_use]
pub fn conditions_satisfied(
    trigger: &TriggerDefinition,
    config: &Map<String, Value>,
    payload: &Value,
) -> bool {
    config.iter().all(|(key, expected)| {
        let Some(spec) = trigger.condition(key) else {
            return true;
        };
        if is_any(expected) {
            return true;
        }
        let actual = path::resolve(payload, spec.field);
        match spec.rule {
            ConditionRule::OneOf { values } => one_of_satisfied(values, expected, actual),
            ConditionRule::Range { min, max } => range_satisfied(min, max, expected, actual),
        }
    })
}

/// A configured `null` or empty string means "any value".
fn is_any(expected: &Value) -> bool {
    match expected {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn one_of_satisfied(allowed: &[&str], expected: &Value, actual: Option<&Value>) -> bool {
    let Some(actual) = actual.and_then(comparable) else {
        return false;
    };
    if !allowed.contains(&actual.as_str()) {
        return false;
    }
    match expected {
        Value::Array(choices) => choices
            .iter()
            .filter_map(comparable)
            .any(|choice| choice == actual),
        other => comparable(other).is_some_and(|choice| choice == actual),
    }
}

fn range_satisfied(min: f64, max: f64, expected: &Value, actual: Option<&Value>) -> bool {
    let Some(value) = actual.and_then(as_number) else {
        return false;
    };
    if !(min..=max).contains(&value) {
        return false;
    }
    match expected {
        Value::Object(bounds) => {
            let lower = bounds.get("min").and_then(as_number).unwrap_or(min);
            let upper = bounds.get("max").and_then(as_number).unwrap_or(max);
            (lower..=upper).contains(&value)
        }
        other => as_number(other).is_some_and(|n| (n - value).abs() < f64::EPSILON),
    }
}

/// Render a scalar for loose comparison (`3` and `"3"` compare equal).
fn comparable(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(_) => as_number(value).map(|n| {
            if n.fract().abs() < f64::EPSILON && n.abs() < 1e15 {
                format!("{n:.0}")
            } else {
                n.to_string()
            }
        }),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a JSON value as a finite number, accepting numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
