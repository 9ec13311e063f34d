//! Variable substitution for action configuration.
//!
//! Placeholders take the form `{{ path }}` where `path` is a dot path into
//! the event payload. A placeholder whose path does not resolve is kept
//! verbatim so authoring mistakes stay visible in the produced text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::path;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("placeholder pattern is valid")
});

/// Replace every `{{ path }}` in `template` with the payload value at `path`.
#[must_use]
pub fn substitute<'t>(template: &'t str, payload: &Value) -> Cow<'t, str> {
    PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match path::resolve(payload, &caps[1]) {
            Some(value) => path::render(value),
            None => caps[0].to_string(),
        }
    })
}

/// Substitute placeholders in every string value of an action config.
///
/// Nested objects (e.g. webhook headers) are walked; numbers, booleans and
/// arrays pass through untouched.
#[must_use]
pub fn substitute_config(config: &Map<String, Value>, payload: &Value) -> Map<String, Value> {
    config
        .iter()
        .map(|(key, value)| (key.clone(), substitute_value(value, payload)))
        .collect()
}

fn substitute_value(value: &Value, payload: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(substitute(text, payload).into_owned()),
        Value::Object(map) => Value::Object(substitute_config(map, payload)),
        other => other.clone(),
    }
}

/// Substitute placeholders in a template meant to produce a JSON document.
///
/// A template that parses as JSON has its string leaves substituted and is
/// re-serialized. Any other text gets each substituted value JSON-escaped in
/// place, so `{"n": {{amount}}, "title": "{{title}}"}` stays well formed.
#[must_use]
pub fn substitute_json<'t>(template: &'t str, payload: &Value) -> Cow<'t, str> {
    if !PLACEHOLDER.is_match(template) {
        return Cow::Borrowed(template);
    }
    if let Ok(document) = serde_json::from_str::<Value>(template) {
        return Cow::Owned(substitute_leaves(&document, payload).to_string());
    }
    PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match path::resolve(payload, &caps[1]) {
            Some(value) => escape(&path::render(value)),
            None => caps[0].to_string(),
        }
    })
}

fn substitute_leaves(value: &Value, payload: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(substitute(text, payload).into_owned()),
        Value::Array(items) => items.iter().map(|item| substitute_leaves(item, payload)).collect(),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), substitute_leaves(item, payload)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn escape(text: &str) -> String {
    let quoted = Value::String(text.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
