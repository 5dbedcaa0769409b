//! Refinements: the ordered checks layered on top of a schema's base check.

use crate::errors::SchemaError;
use crate::messages::{self, Issue, Origin};
use crate::primitive;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A user-supplied refinement. `Err` carries the refinement's own message.
pub type Predicate = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// A built-in constraint, independent of the schema it is attached to.
///
/// `Min`, `Max` and `Length` take their meaning from the schema they are
/// added to: numeric value for numbers, character count for strings, item
/// count for arrays. On dates, `Min`, `Max`, `Gt` and `Lt` compare instants,
/// reading the limit as milliseconds since the Unix epoch.
///
/// | constraint | number | string | array | date |
/// |---|---|---|---|---|
/// | `Min`, `Max` | yes | yes | yes | yes |
/// | `Gt`, `Lt` | yes | | | yes |
/// | `MultipleOf`, `Int` | yes | | | |
/// | `Length` | | yes | yes | |
/// | `Pattern` | | yes | | |
/// | `Before`, `After` | | | | yes |
#[derive(Debug, Clone)]
pub enum Constraint {
    Min(f64),
    Max(f64),
    Gt(f64),
    Lt(f64),
    MultipleOf(f64),
    Int,
    Length(usize),
    Pattern(Regex),
    Before(DateTime<Utc>),
    After(DateTime<Utc>),
}

impl Constraint {
    /// The name this constraint goes by in serialized schemas.
    pub fn keyword(&self) -> &'static str {
        match self {
            Constraint::Min(_) => "min",
            Constraint::Max(_) => "max",
            Constraint::Gt(_) => "gt",
            Constraint::Lt(_) => "lt",
            Constraint::MultipleOf(_) => "multipleOf",
            Constraint::Int => "int",
            Constraint::Length(_) => "length",
            Constraint::Pattern(_) => "pattern",
            Constraint::Before(_) => "before",
            Constraint::After(_) => "after",
        }
    }
}

/// Compiles a pattern, reporting a bad one as a schema error.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, SchemaError> {
    Regex::new(pattern).map_err(|err| SchemaError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: err.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    AtLeast,
    Above,
    AtMost,
    Below,
    Exactly,
}

impl Bound {
    fn holds<T: PartialOrd>(self, actual: T, limit: T) -> bool {
        match self {
            Bound::AtLeast => actual >= limit,
            Bound::Above => actual > limit,
            Bound::AtMost => actual <= limit,
            Bound::Below => actual < limit,
            Bound::Exactly => actual == limit,
        }
    }
}

/// A constraint resolved against the kind of schema it was attached to.
///
/// Values of a JSON type a rule does not talk about pass it; the base check
/// in front of the rule is what rules those out.
#[derive(Debug, Clone)]
pub(crate) enum Rule {
    Number(Bound, f64),
    MultipleOf(f64),
    Integer,
    Length(Bound, usize),
    Items(Bound, usize),
    Pattern(Regex),
    Date(Bound, DateTime<Utc>),
}

impl Rule {
    /// Resolves `constraint` against a schema measured as `origin`. `None`
    /// means the constraint says nothing about such values.
    pub(crate) fn resolve(constraint: Constraint, origin: Origin) -> Option<Rule> {
        let rule = match (constraint, origin) {
            (Constraint::Min(limit), origin) => sized(Bound::AtLeast, limit, origin),
            (Constraint::Max(limit), origin) => sized(Bound::AtMost, limit, origin),
            (Constraint::Gt(limit), Origin::Number) => Rule::Number(Bound::Above, limit),
            (Constraint::Gt(limit), Origin::Date) => Rule::Date(Bound::Above, instant(limit)),
            (Constraint::Lt(limit), Origin::Number) => Rule::Number(Bound::Below, limit),
            (Constraint::Lt(limit), Origin::Date) => Rule::Date(Bound::Below, instant(limit)),
            (Constraint::MultipleOf(divisor), Origin::Number) => Rule::MultipleOf(divisor),
            (Constraint::Int, Origin::Number) => Rule::Integer,
            (Constraint::Length(size), Origin::String) => Rule::Length(Bound::Exactly, size),
            (Constraint::Length(size), Origin::Array) => Rule::Items(Bound::Exactly, size),
            (Constraint::Pattern(regex), Origin::String) => Rule::Pattern(regex),
            (Constraint::Before(limit), Origin::Date) => Rule::Date(Bound::Below, limit),
            (Constraint::After(limit), Origin::Date) => Rule::Date(Bound::Above, limit),
            _ => return None,
        };

        Some(rule)
    }

    pub(crate) fn holds(&self, value: &Value) -> bool {
        match self {
            Rule::Number(bound, limit) => value.as_f64().map_or(true, |n| bound.holds(n, *limit)),
            Rule::MultipleOf(divisor) => value.as_f64().map_or(true, |n| is_multiple(n, *divisor)),
            Rule::Integer => value.as_f64().map_or(true, |n| n.fract() == 0.0),
            Rule::Length(bound, limit) => value
                .as_str()
                .map_or(true, |s| bound.holds(s.chars().count(), *limit)),
            Rule::Items(bound, limit) => value
                .as_array()
                .map_or(true, |items| bound.holds(items.len(), *limit)),
            Rule::Pattern(regex) => value.as_str().map_or(true, |s| regex.is_match(s)),
            Rule::Date(bound, limit) => value.as_str().map_or(true, |s| {
                primitive::parse_date(s).map_or(false, |date| bound.holds(date, *limit))
            }),
        }
    }

    /// The message used when no override is supplied.
    pub(crate) fn default_message(&self) -> String {
        match self {
            Rule::Number(bound, limit) => bounded(Origin::Number, *bound, &limit.to_string()),
            Rule::MultipleOf(divisor) => {
                messages::format(&Issue::NotMultipleOf { divisor: *divisor })
            }
            Rule::Integer => messages::format(&Issue::NotInteger),
            Rule::Length(bound, limit) => bounded(Origin::String, *bound, &limit.to_string()),
            Rule::Items(bound, limit) => bounded(Origin::Array, *bound, &limit.to_string()),
            Rule::Pattern(regex) => messages::format(&Issue::InvalidPattern {
                pattern: regex.as_str(),
            }),
            Rule::Date(bound, limit) => {
                bounded(Origin::Date, *bound, &primitive::format_date(limit))
            }
        }
    }
}

fn sized(bound: Bound, limit: f64, origin: Origin) -> Rule {
    match origin {
        Origin::Number => Rule::Number(bound, limit),
        Origin::String => Rule::Length(bound, count(bound, limit)),
        Origin::Array => Rule::Items(bound, count(bound, limit)),
        Origin::Date => Rule::Date(bound, instant(limit)),
    }
}

/// A fractional size limit rounded to the nearest whole count that keeps
/// the same set of lengths valid.
fn count(bound: Bound, limit: f64) -> usize {
    let whole = match bound {
        Bound::AtLeast => limit.ceil(),
        _ => limit.floor(),
    };

    whole.max(0.0) as usize
}

/// Epoch milliseconds as an instant, saturating at the representable range.
fn instant(millis: f64) -> DateTime<Utc> {
    primitive::from_millis(millis as i64).unwrap_or(if millis > 0.0 {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}

fn bounded(origin: Origin, bound: Bound, limit: &str) -> String {
    let issue = match bound {
        Bound::AtLeast | Bound::Above => Issue::TooSmall {
            origin,
            limit,
            inclusive: bound == Bound::AtLeast,
        },
        Bound::AtMost | Bound::Below => Issue::TooBig {
            origin,
            limit,
            inclusive: bound == Bound::AtMost,
        },
        Bound::Exactly => Issue::ExactSize {
            origin,
            size: limit,
        },
    };

    messages::format(&issue)
}

pub(crate) fn is_multiple(n: f64, divisor: f64) -> bool {
    let quotient = n / divisor;
    (quotient - quotient.round()).abs() < 1e-9
}

/// One link of a schema's refinement chain.
#[derive(Clone)]
pub(crate) enum Refinement {
    /// A built-in rule; its message is resolved when the rule is attached.
    Builtin { rule: Rule, message: String },

    /// A user predicate. The override, if any, beats the predicate's own
    /// message.
    Custom {
        predicate: Predicate,
        message: Option<String>,
    },
}

impl Refinement {
    pub(crate) fn builtin(rule: Rule, message: Option<&str>) -> Self {
        let message = match message {
            Some(message) => message.to_owned(),
            None => rule.default_message(),
        };

        Refinement::Builtin { rule, message }
    }

    pub(crate) fn run(&self, value: &Value) -> Result<(), String> {
        match self {
            Refinement::Builtin { rule, message } => {
                if rule.holds(value) {
                    Ok(())
                } else {
                    Err(message.clone())
                }
            }
            Refinement::Custom { predicate, message } => {
                predicate(value).map_err(|own| message.clone().unwrap_or(own))
            }
        }
    }
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Refinement::Builtin { rule, message } => f
                .debug_struct("Builtin")
                .field("rule", rule)
                .field("message", message)
                .finish(),
            Refinement::Custom { message, .. } => f
                .debug_struct("Custom")
                .field("message", message)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn min_resolves_by_origin() {
        let rule = Rule::resolve(Constraint::Min(3.0), Origin::String).unwrap();
        assert!(rule.holds(&json!("abc")));
        assert!(!rule.holds(&json!("ab")));
        assert_eq!(
            rule.default_message(),
            "String must contain at least 3 character(s)"
        );

        let rule = Rule::resolve(Constraint::Min(3.0), Origin::Number).unwrap();
        assert!(rule.holds(&json!(3)));
        assert!(!rule.holds(&json!(2.5)));
        assert_eq!(
            rule.default_message(),
            "Number must be greater than or equal to 3"
        );

        let rule = Rule::resolve(Constraint::Max(1.0), Origin::Array).unwrap();
        assert!(!rule.holds(&json!([1, 2])));
        assert_eq!(
            rule.default_message(),
            "Array must contain at most 1 element(s)"
        );
    }

    #[test]
    fn min_and_max_on_dates_compare_instants() {
        let rule = Rule::resolve(Constraint::Min(1_577_836_800_000.0), Origin::Date).unwrap();
        assert!(rule.holds(&json!("2020-01-01T00:00:00Z")));
        assert!(!rule.holds(&json!("2019-12-31T23:59:59Z")));
        assert_eq!(
            rule.default_message(),
            "Date must be greater than or equal to 2020-01-01T00:00:00.000Z"
        );

        let rule = Rule::resolve(Constraint::Max(0.0), Origin::Date).unwrap();
        assert!(rule.holds(&json!("1970-01-01T00:00:00Z")));
        assert!(!rule.holds(&json!("2020-01-01T00:00:00Z")));
        assert_eq!(
            rule.default_message(),
            "Date must be smaller than or equal to 1970-01-01T00:00:00.000Z"
        );

        let rule = Rule::resolve(Constraint::Min(1e18), Origin::Date).unwrap();
        assert!(!rule.holds(&json!("1970-01-01T00:00:00Z")));
    }

    #[test]
    fn fractional_sizes_round_inward() {
        let rule = Rule::resolve(Constraint::Min(2.5), Origin::String).unwrap();
        assert!(!rule.holds(&json!("ab")));
        assert!(rule.holds(&json!("abc")));
        assert_eq!(
            rule.default_message(),
            "String must contain at least 3 character(s)"
        );

        let rule = Rule::resolve(Constraint::Max(2.5), Origin::Array).unwrap();
        assert!(rule.holds(&json!([1, 2])));
        assert!(!rule.holds(&json!([1, 2, 3])));
        assert_eq!(rule.default_message(), "Array must contain at most 2 element(s)");
    }

    #[test]
    fn inapplicable_pairs_do_not_resolve() {
        assert!(Rule::resolve(Constraint::Gt(0.0), Origin::String).is_none());
        assert!(Rule::resolve(Constraint::Length(3), Origin::Number).is_none());
        assert!(Rule::resolve(Constraint::Int, Origin::Array).is_none());
        assert!(Rule::resolve(Constraint::Pattern(Regex::new("x").unwrap()), Origin::Date).is_none());
        assert!(Rule::resolve(Constraint::Before(Utc::now()), Origin::Number).is_none());
    }

    #[test]
    fn bad_patterns_are_schema_errors() {
        match compile_pattern("(") {
            Err(SchemaError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "("),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn multiple_of_tolerates_float_noise() {
        assert!(is_multiple(0.3, 0.1));
        assert!(is_multiple(9.0, 3.0));
        assert!(!is_multiple(10.0, 3.0));
    }

    #[test]
    fn exact_length() {
        let rule = Rule::resolve(Constraint::Length(2), Origin::String).unwrap();
        assert!(rule.holds(&json!("ab")));
        assert_eq!(
            rule.default_message(),
            "String must contain exactly 2 character(s)"
        );
    }

    #[test]
    fn override_beats_custom_message() {
        let predicate: Predicate = Arc::new(|_| Err("own".to_owned()));
        let refinement = Refinement::Custom {
            predicate: predicate.clone(),
            message: None,
        };
        assert_eq!(refinement.run(&json!(1)), Err("own".to_owned()));

        let refinement = Refinement::Custom {
            predicate,
            message: Some("override".to_owned()),
        };
        assert_eq!(refinement.run(&json!(1)), Err("override".to_owned()));
    }
}
