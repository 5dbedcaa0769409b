//! Error types for schema construction and parsing.

use crate::schema::Tag;
use failure::Fail;

/// An enum of possible errors that can emerge while building a schema.
///
/// These are programmer errors detected at composition time. Validation
/// failures are never reported through this type; see
/// [`ParseError`](struct.ParseError.html) and
/// [`BulkError`](struct.BulkError.html) instead.
#[derive(Debug, Fail, PartialEq, Clone, Eq, Hash)]
pub enum SchemaError {
    /// A discriminated union was given a branch that is not an object schema.
    ///
    /// Every branch of a discriminated union must be an `object(..)` schema,
    /// possibly with refinements attached.
    #[fail(display = "discriminated union branch {} is not an object schema", index)]
    BranchNotObject { index: usize },

    /// A discriminated union branch does not declare the discriminant field.
    #[fail(
        display = "discriminated union branch {} has no field named {:?}",
        index, field
    )]
    MissingDiscriminant { index: usize, field: String },

    /// A discriminated union branch declares the discriminant field, but not
    /// as a literal (or string enum) of a supported type.
    ///
    /// Supported discriminant values are strings, integers, booleans and null.
    #[fail(
        display = "discriminated union branch {} has an unsupported discriminant for field {:?}",
        index, field
    )]
    UnsupportedDiscriminant { index: usize, field: String },

    /// Two discriminated union branches claim the same discriminant value.
    #[fail(display = "duplicate discriminant value: {}", value)]
    DuplicateDiscriminant { value: String },

    /// A string pattern could not be compiled into a regular expression.
    #[fail(display = "invalid pattern {:?}: {}", pattern, reason)]
    InvalidPattern { pattern: String, reason: String },

    /// A built-in constraint was attached to a kind of schema it says nothing
    /// about, such as `positive` on a string.
    #[fail(display = "{} does not apply to {:?} schemas", keyword, tag)]
    InapplicableConstraint { keyword: &'static str, tag: Tag },

    /// A date bound was not a valid RFC 3339 timestamp.
    #[fail(display = "invalid date: {:?}", value)]
    InvalidDate { value: String },

    /// A serialized schema did not take on a valid form.
    ///
    /// Only certain combinations of keywords make for valid serialized
    /// schemas. For example, `items` is only meaningful alongside
    /// `"type": "array"`.
    #[fail(display = "invalid schema form: {}", reason)]
    InvalidForm { reason: String },

    /// A serialized schema used a `type` this crate does not know about.
    #[fail(display = "unknown schema type: {}", name)]
    UnknownType { name: String },
}

/// The failure half of [`parse`](../parser/fn.parse.html).
///
/// Despite implementing `Fail`, a `ParseError` is an ordinary result of
/// validating bad input. It carries the fully resolved, location-tagged
/// message.
#[derive(Debug, Fail, PartialEq, Clone, Eq, Hash)]
#[fail(display = "{}", message)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: String) -> Self {
        Self { message }
    }

    /// The rejection message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Same as [`message`](#method.message), but moves ownership.
    pub fn into_message(self) -> String {
        self.message
    }
}

/// The failure half of [`parse_bulk`](../parser/fn.parse_bulk.html).
///
/// Every entry is formatted as `"Index {i}: {message}"`. In early-abort mode
/// there is exactly one entry; otherwise there is one per failing item, in
/// ascending index order.
#[derive(Debug, Fail, PartialEq, Clone, Eq, Hash)]
#[fail(display = "batch failed validation: {:?}", errors)]
pub struct BulkError {
    errors: Vec<String>,
}

impl BulkError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Same as [`errors`](#method.errors), but moves ownership.
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}
