//! Parse single values and batches of values.
//!
//! This module turns the three-outcome [`Check`](../check/enum.Check.html)
//! protocol into ordinary Rust results. It works with anything implementing
//! [`Validate`](../check/trait.Validate.html), so a
//! [`Schema`](../schema/struct.Schema.html) and its
//! [`Compiled`](../compiler/struct.Compiled.html) form share one code path.

use crate::check::{Check, Validate};
use crate::errors::{BulkError, ParseError};
use crate::messages;
use serde_json::Value;
use std::borrow::Cow;
use tracing::trace;

/// Validates one value.
///
/// An accepted value is handed back borrowed: the result *is* the input,
/// not a copy of it. A coerced value is handed back owned.
pub fn parse<'a, V>(validator: &V, value: &'a Value) -> Result<Cow<'a, Value>, ParseError>
where
    V: Validate + ?Sized,
{
    match validator.check(Some(value)) {
        Check::Accept => Ok(Cow::Borrowed(value)),
        Check::AcceptCoerced(coerced) => Ok(Cow::Owned(coerced)),
        Check::Reject(message) => Err(ParseError::new(message)),
    }
}

/// Validates a batch of values, each exactly once.
///
/// With [`Config::early_abort`](struct.Config.html#method.early_abort) set,
/// the batch stops at the first failing item and the error list holds that
/// one item. Otherwise every item is checked and every failure is reported,
/// in index order. Every message is prefixed with `"Index {i}: "`.
///
/// The input slice is never modified.
pub fn parse_bulk<'a, V>(
    validator: &V,
    values: &'a [Value],
    config: &Config,
) -> Result<Batch<'a>, BulkError>
where
    V: Validate + ?Sized,
{
    let result = if config.early_abort {
        early_abort(validator, values)
    } else {
        collect_all(validator, values)
    };

    trace!(
        early_abort = config.early_abort,
        items = values.len(),
        errors = result.as_ref().err().map_or(0, |err| err.errors().len()),
        "parsed batch"
    );

    result
}

fn early_abort<'a, V>(validator: &V, values: &'a [Value]) -> Result<Batch<'a>, BulkError>
where
    V: Validate + ?Sized,
{
    // No buffer until the first coercion.
    let mut buffer: Option<Vec<Cow<'a, Value>>> = None;

    for (index, value) in values.iter().enumerate() {
        match validator.check(Some(value)) {
            Check::Accept => {
                if let Some(buffer) = buffer.as_mut() {
                    buffer.push(Cow::Borrowed(value));
                }
            }
            Check::AcceptCoerced(coerced) => buffer
                .get_or_insert_with(|| {
                    let mut buffer = Vec::with_capacity(values.len());
                    buffer.extend(values[..index].iter().map(Cow::Borrowed));
                    buffer
                })
                .push(Cow::Owned(coerced)),
            Check::Reject(message) => {
                return Err(BulkError::new(vec![messages::at_index(index, &message)]));
            }
        }
    }

    Ok(match buffer {
        Some(buffer) => Batch::Owned(buffer),
        None => Batch::Borrowed(values),
    })
}

fn collect_all<'a, V>(validator: &V, values: &'a [Value]) -> Result<Batch<'a>, BulkError>
where
    V: Validate + ?Sized,
{
    let mut buffer = Vec::with_capacity(values.len());
    let mut errors = Vec::new();

    for (index, value) in values.iter().enumerate() {
        match validator.check(Some(value)) {
            Check::Accept => buffer.push(Cow::Borrowed(value)),
            Check::AcceptCoerced(coerced) => buffer.push(Cow::Owned(coerced)),
            Check::Reject(message) => {
                buffer.push(Cow::Borrowed(value));
                errors.push(messages::at_index(index, &message));
            }
        }
    }

    if errors.is_empty() {
        Ok(Batch::Owned(buffer))
    } else {
        Err(BulkError::new(errors))
    }
}

/// The successful result of a bulk parse.
///
/// `Borrowed` is the caller's own slice, returned when nothing needed
/// coercion. It is not a copy: it shares storage with the input for as long
/// as it lives, and converting it with `into_values` is the way to detach.
/// `Owned` holds one entry per item; entries that were accepted as-is still
/// borrow the input item.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch<'a> {
    Borrowed(&'a [Value]),
    Owned(Vec<Cow<'a, Value>>),
}

impl<'a> Batch<'a> {
    pub fn len(&self) -> usize {
        match self {
            Batch::Borrowed(values) => values.len(),
            Batch::Owned(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this batch is the caller's input slice itself.
    pub fn is_borrowed(&self) -> bool {
        matches!(self, Batch::Borrowed(_))
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Batch::Borrowed(values) => values.get(index),
            Batch::Owned(values) => values.get(index).map(|value| value.as_ref()),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Batch::Borrowed(values) => Box::new(values.iter()),
            Batch::Owned(values) => Box::new(values.iter().map(|value| value.as_ref())),
        }
    }

    /// Copies the batch out into owned values.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Batch::Borrowed(values) => values.to_vec(),
            Batch::Owned(values) => values.into_iter().map(Cow::into_owned).collect(),
        }
    }
}

/// Configuration for how bulk parsing should proceed.
#[derive(Debug, Default, Eq, PartialEq, Clone, Hash)]
pub struct Config {
    early_abort: bool,
}

impl Config {
    /// Create a new, default `Config`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to stop at the first failing item. The default is to
    /// check every item and report every failure.
    ///
    /// Stopping early also avoids allocating an output buffer at all when no
    /// item needs coercion: the result is then the input slice itself.
    pub fn early_abort(&mut self, early_abort: bool) -> &mut Self {
        self.early_abort = early_abort;
        self
    }

    pub fn is_early_abort(&self) -> bool {
        self.early_abort
    }
}
