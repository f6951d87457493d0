//! Template helpers.
//!
//! Each helper is a plain function over JSON values so it can be tested
//! without a template engine. [`register`] and [`bind_context`] adapt them to
//! Tera:
//!
//! | Helper | Kind | Usage |
//! |--------|------|-------|
//! | [`json`] | filter | `{{ page.tags \| json }}` |
//! | [`format_date`] | filter | `{{ date \| format_date }}` |
//! | [`debug`] | filter | `{{ page \| debug }}` |
//! | [`active_page`] | function | `class="{{ active_page(page="projects") }}"` |
//! | [`link`] | function | `href="{{ link(path="about") }}"` |
//! | [`or`] | function `any` | `{% if any(a=page.draft, b=page.hidden) %}` |
//! | [`set_and_false`] | test | `{% if page.comments is set_and_false %}` |
//!
//! `or` is a Tera operator, so the helper is registered as `any`.
//!
//! `active_page` depends on the record being rendered. The renderer calls
//! [`bind_context`] before each record, which replaces the registered function
//! with one closed over that record's [`RenderContext`].

use crate::config::EnvironmentSettings;
use crate::naming;
use crate::record::is_truthy;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tera::Tera;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelperError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read {0} as a date")]
    Date(String),
    #[error("{helper}: missing argument '{name}'")]
    MissingArgument {
        helper: &'static str,
        name: &'static str,
    },
}

/// The parts of the record being rendered that helpers may look at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    /// Permalink of the record (`posts/my-post`).
    pub path: String,
    /// Collection memberships of the record.
    pub collection: Vec<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Compact JSON serialization.
pub fn json(value: &Value) -> Result<String, HelperError> {
    Ok(serde_json::to_string(value)?)
}

/// Format a date as `YYYY-MM-DD` after shifting it forward five hours.
///
/// Post dates are written as local midnight or evening times; the shift puts
/// them on the intended calendar day.
pub fn format_date(value: &Value) -> Result<String, HelperError> {
    let date = parse_date(value).ok_or_else(|| HelperError::Date(value.to_string()))?;
    let shifted = date
        .checked_add_signed(TimeDelta::hours(5))
        .ok_or_else(|| HelperError::Date(value.to_string()))?;
    Ok(shifted.format("%Y-%m-%d").to_string())
}

fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return date.and_hms_opt(0, 0, 0);
            }
            for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(datetime);
                }
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|datetime| datetime.naive_local())
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|millis| millis.is_finite())
                    .map(|millis| millis.trunc() as i64)
            })
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|datetime| datetime.naive_utc()),
        _ => None,
    }
}

/// JSON dump of a record with its bulky fields masked.
pub fn debug(value: &Value) -> Result<String, HelperError> {
    match value {
        Value::Object(map) => {
            let mut copy = map.clone();
            copy.insert("contents".into(), Value::String("...".into()));
            copy.insert("stats".into(), Value::String("...".into()));
            json(&Value::Object(copy))
        }
        other => json(other),
    }
}

/// `"active"` if the record being rendered is `page` or belongs to it.
pub fn active_page(context: &RenderContext, page: &str) -> &'static str {
    if naming::last_segment(&context.path) == page || context.collection.iter().any(|c| c == page)
    {
        "active"
    } else {
        ""
    }
}

/// Absolute link for the current environment.
pub fn link(environment: &EnvironmentSettings, path: &str) -> String {
    format!("{}/{}", environment.base_url, path)
}

/// True if any argument is truthy.
pub fn or(values: &[Value]) -> bool {
    values.iter().any(is_truthy)
}

/// True exactly when the value is present and is `false`.
pub fn set_and_false(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(false)))
}

// ============================================================================
// Tera glue
// ============================================================================

fn tera_error(err: HelperError) -> tera::Error {
    tera::Error::msg(err.to_string())
}

fn string_arg<'a>(
    args: &'a HashMap<String, Value>,
    helper: &'static str,
    name: &'static str,
) -> tera::Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| tera_error(HelperError::MissingArgument { helper, name }))
}

fn json_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    json(value).map(Value::String).map_err(tera_error)
}

fn format_date_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    format_date(value).map(Value::String).map_err(tera_error)
}

fn debug_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    debug(value).map(Value::String).map_err(tera_error)
}

fn or_function(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let values: Vec<Value> = args.values().cloned().collect();
    Ok(Value::Bool(or(&values)))
}

fn set_and_false_test(value: Option<&Value>, _: &[Value]) -> tera::Result<bool> {
    Ok(set_and_false(value))
}

/// Register every helper. `active_page` starts bound to an empty context.
pub fn register(tera: &mut Tera, environment: &EnvironmentSettings) {
    tera.register_filter("json", json_filter);
    tera.register_filter("format_date", format_date_filter);
    tera.register_filter("debug", debug_filter);
    tera.register_function("any", or_function);
    tera.register_tester("set_and_false", set_and_false_test);

    let environment = environment.clone();
    tera.register_function("link", move |args: &HashMap<String, Value>| {
        let path = string_arg(args, "link", "path")?;
        Ok(Value::String(link(&environment, path)))
    });

    bind_context(tera, RenderContext::default());
}

/// Rebind `active_page` to the record about to be rendered.
pub fn bind_context(tera: &mut Tera, context: RenderContext) {
    tera.register_function("active_page", move |args: &HashMap<String, Value>| {
        let page = string_arg(args, "active_page", "page")?;
        Ok(Value::String(active_page(&context, page).to_string()))
    });
}
