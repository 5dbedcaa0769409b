//! Leaf type checks and their coercions.
//!
//! Shared by the tree interpreter and the compiler.

use crate::check::Check;
use crate::messages::{self, Issue};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};

/// The rejection for a value that is absent or of the wrong JSON type.
pub(crate) fn mismatch(expected: &str, value: Option<&Value>) -> String {
    match value {
        None => messages::format(&Issue::Required),
        Some(received) => messages::format(&Issue::InvalidType { expected, received }),
    }
}

pub(crate) fn string(value: Option<&Value>, coerce: bool) -> Check {
    match value {
        Some(Value::String(_)) => Check::Accept,
        Some(Value::Number(n)) if coerce => Check::AcceptCoerced(Value::String(n.to_string())),
        Some(Value::Bool(b)) if coerce => Check::AcceptCoerced(Value::String(b.to_string())),
        other => Check::Reject(mismatch("string", other)),
    }
}

pub(crate) fn number(value: Option<&Value>, coerce: bool) -> Check {
    match value {
        Some(Value::Number(_)) => Check::Accept,
        Some(Value::String(s)) if coerce => match parse_number(s) {
            Some(n) => Check::AcceptCoerced(Value::Number(n)),
            None => Check::Reject(mismatch("number", value)),
        },
        other => Check::Reject(mismatch("number", other)),
    }
}

pub(crate) fn boolean(value: Option<&Value>, coerce: bool) -> Check {
    match value {
        Some(Value::Bool(_)) => Check::Accept,
        Some(Value::String(s)) if coerce && s == "true" => Check::AcceptCoerced(Value::Bool(true)),
        Some(Value::String(s)) if coerce && s == "false" => {
            Check::AcceptCoerced(Value::Bool(false))
        }
        other => Check::Reject(mismatch("boolean", other)),
    }
}

/// Dates travel as RFC 3339 strings. With coercion on, integer epoch
/// milliseconds are converted to that form.
pub(crate) fn date(value: Option<&Value>, coerce: bool) -> Check {
    match value {
        Some(Value::String(s)) => match parse_date(s) {
            Some(_) => Check::Accept,
            None => Check::Reject(messages::format(&Issue::InvalidDate)),
        },
        Some(Value::Number(n)) if coerce => match n.as_i64().and_then(from_millis) {
            Some(date) => Check::AcceptCoerced(Value::String(format_date(&date))),
            None => Check::Reject(messages::format(&Issue::InvalidDate)),
        },
        other => Check::Reject(mismatch("date", other)),
    }
}

pub(crate) fn literal(expected: &Value, value: Option<&Value>) -> Check {
    match value {
        None => Check::Reject(messages::format(&Issue::Required)),
        Some(v) if v == expected => Check::Accept,
        Some(_) => Check::Reject(messages::format(&Issue::InvalidLiteral { expected })),
    }
}

pub(crate) fn enumeration(options: &[String], value: Option<&Value>) -> Check {
    match value {
        None => Check::Reject(messages::format(&Issue::Required)),
        Some(Value::String(s)) if options.iter().any(|o| o == s) => Check::Accept,
        Some(received) => Check::Reject(messages::format(&Issue::InvalidEnum { options, received })),
    }
}

/// Integers stay integers, so that `"42"` coerces to the same value as `42`.
pub(crate) fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(n) = s.parse::<i64>() {
        return Some(n.into());
    }

    if let Ok(n) = s.parse::<u64>() {
        return Some(n.into());
    }

    s.parse::<f64>().ok().and_then(Number::from_f64)
}

pub(crate) fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
