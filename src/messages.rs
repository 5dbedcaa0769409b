//! The human-readable message table.
//!
//! Every rejection string in this crate is produced here, from an [`Issue`]
//! describing what went wrong. Both the tree interpreter and the compiled
//! validator go through [`format`], which is what keeps their messages
//! byte-for-byte identical.

use serde_json::Value;
use std::fmt::Display;

/// The kinds of size limits a constraint can impose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Number,
    String,
    Array,
    Date,
}

/// Everything the message table knows how to describe.
#[derive(Debug, Clone, PartialEq)]
pub enum Issue<'a> {
    /// A value was absent where one was required.
    Required,

    /// The value had the wrong JSON type.
    InvalidType {
        expected: &'a str,
        received: &'a Value,
    },

    /// A string was expected to be an RFC 3339 timestamp.
    InvalidDate,

    InvalidLiteral {
        expected: &'a Value,
    },

    InvalidEnum {
        options: &'a [String],
        received: &'a Value,
    },

    TooSmall {
        origin: Origin,
        limit: &'a str,
        inclusive: bool,
    },

    TooBig {
        origin: Origin,
        limit: &'a str,
        inclusive: bool,
    },

    /// A string or array length was required to match exactly.
    ExactSize {
        origin: Origin,
        size: &'a str,
    },

    NotMultipleOf {
        divisor: f64,
    },

    NotInteger,

    InvalidPattern {
        pattern: &'a str,
    },

    /// A boolean refinement returned `false` and nobody supplied a message.
    Custom,

    UnrecognizedKeys {
        keys: &'a [&'a str],
    },

    /// Every branch of a union rejected; carries their messages in order.
    InvalidUnion {
        messages: &'a [String],
    },

    InvalidDiscriminator {
        options: &'a [String],
    },
}

/// The JSON type name of a value, as it appears in messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders an issue as a message.
pub fn format(issue: &Issue) -> String {
    match issue {
        Issue::Required => "Required".to_owned(),
        Issue::InvalidType { expected, received } => {
            format!("Expected {}, received {}", expected, type_name(received))
        }
        Issue::InvalidDate => "Invalid date".to_owned(),
        Issue::InvalidLiteral { expected } => {
            format!("Invalid literal value, expected {}", expected)
        }
        Issue::InvalidEnum { options, received } => {
            let received = match received {
                Value::String(s) => format!("'{}'", s),
                other => type_name(other).to_owned(),
            };
            format!(
                "Invalid enum value. Expected {}, received {}",
                quoted(options.iter()),
                received
            )
        }
        Issue::TooSmall {
            origin,
            limit,
            inclusive,
        } => match origin {
            Origin::Number if *inclusive => {
                format!("Number must be greater than or equal to {}", limit)
            }
            Origin::Number => format!("Number must be greater than {}", limit),
            Origin::String => format!("String must contain at least {} character(s)", limit),
            Origin::Array => format!("Array must contain at least {} element(s)", limit),
            Origin::Date if *inclusive => {
                format!("Date must be greater than or equal to {}", limit)
            }
            Origin::Date => format!("Date must be after {}", limit),
        },
        Issue::TooBig {
            origin,
            limit,
            inclusive,
        } => match origin {
            Origin::Number if *inclusive => {
                format!("Number must be less than or equal to {}", limit)
            }
            Origin::Number => format!("Number must be less than {}", limit),
            Origin::String => format!("String must contain at most {} character(s)", limit),
            Origin::Array => format!("Array must contain at most {} element(s)", limit),
            Origin::Date if *inclusive => {
                format!("Date must be smaller than or equal to {}", limit)
            }
            Origin::Date => format!("Date must be before {}", limit),
        },
        Issue::ExactSize { origin, size } => match origin {
            Origin::Array => format!("Array must contain exactly {} element(s)", size),
            _ => format!("String must contain exactly {} character(s)", size),
        },
        Issue::NotMultipleOf { divisor } => format!("Number must be a multiple of {}", divisor),
        Issue::NotInteger => "Expected integer, received float".to_owned(),
        Issue::InvalidPattern { pattern } => {
            format!("Invalid string: must match pattern {}", pattern)
        }
        Issue::Custom => "Invalid input".to_owned(),
        Issue::UnrecognizedKeys { keys } => {
            format!("Unrecognized key(s) in object: {}", quoted_with(keys.iter(), ", "))
        }
        Issue::InvalidUnion { messages } => {
            format!("No union branch matched: {}", messages.join("; "))
        }
        Issue::InvalidDiscriminator { options } => format!(
            "Invalid discriminator value. Expected {}",
            options.join(" | ")
        ),
    }
}

/// Location marker for an array item or a bulk batch entry.
pub fn at_index(index: usize, message: &str) -> String {
    format!("Index {}: {}", index, message)
}

/// Location marker for an object field.
pub fn at_field(field: &str, message: &str) -> String {
    format!("Field {}: {}", field, message)
}

fn quoted<T: Display>(items: impl Iterator<Item = T>) -> String {
    quoted_with(items, " | ")
}

fn quoted_with<T: Display>(items: impl Iterator<Item = T>, separator: &str) -> String {
    items
        .map(|item| format!("'{}'", item))
        .collect::<Vec<_>>()
        .join(separator)
}
