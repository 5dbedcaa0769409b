//! Schema representations and constructors.
//!
//! A [`Schema`](struct.Schema.html) is an immutable, cheaply clonable handle
//! to a node in a schema tree. Every builder method returns a *new* handle;
//! the node it was called on is never modified, and children are shared
//! rather than copied.

use crate::check::{Check, Validate};
use crate::compiler::{self, Compiled};
use crate::constraint::{self, Constraint, Predicate, Refinement, Rule};
use crate::errors::{BulkError, ParseError, SchemaError};
use crate::messages::{self, Issue, Origin};
use crate::parser::{self, Batch, Config};
use crate::vm;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// A user-supplied check function, used by [`custom`](fn.custom.html).
pub type CustomCheck = Arc<dyn Fn(&Value) -> Check + Send + Sync>;

/// An immutable description of a value's expected shape, plus the logic to
/// check it.
#[derive(Clone)]
pub struct Schema(Arc<Node>);

pub(crate) struct Node {
    pub(crate) kind: Kind,
    pub(crate) message: Option<String>,
    pub(crate) refinements: Vec<Refinement>,
    pub(crate) compiled: OnceLock<Arc<Compiled>>,
}

#[derive(Clone)]
pub(crate) enum Kind {
    String { coerce: bool },
    Number { coerce: bool },
    Boolean { coerce: bool },
    Date { coerce: bool },
    Any,
    Literal(Value),
    Enum(Vec<String>),
    Custom(CustomCheck),
    Array(Schema),
    Object(Shape),
    Union(Vec<Schema>),
    DiscriminatedUnion(Arc<Dispatch>),
    Optional(Schema),
    Nullable(Schema),
    Nullish(Schema),
}

/// The declared fields of an object schema, in declaration order.
#[derive(Clone)]
pub(crate) struct Shape {
    pub(crate) fields: Vec<(String, Schema)>,
    pub(crate) unknown_keys: UnknownKeys,
}

impl Shape {
    pub(crate) fn declares(&self, key: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == key)
    }
}

/// What an object schema does with keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnknownKeys {
    /// Undeclared keys are ignored and kept in the output.
    Passthrough,

    /// Undeclared keys are removed from the output. Removing a key counts as
    /// a coercion.
    Strip,

    /// Undeclared keys are rejected.
    Strict,
}

impl Default for UnknownKeys {
    fn default() -> Self {
        UnknownKeys::Passthrough
    }
}

/// The precomputed dispatch table of a discriminated union.
pub(crate) struct Dispatch {
    pub(crate) field: String,
    pub(crate) branches: Vec<Schema>,
    pub(crate) mapping: HashMap<Discriminant, usize>,
    pub(crate) options: Vec<String>,
}

impl Dispatch {
    /// Finds the branch selected by an object's discriminant, reading only
    /// that one field.
    pub(crate) fn branch(&self, object: &serde_json::Map<String, Value>) -> Option<usize> {
        object
            .get(&self.field)
            .and_then(Discriminant::from_value)
            .and_then(|key| self.mapping.get(&key).copied())
    }

    pub(crate) fn unrecognized(&self) -> String {
        messages::format(&Issue::InvalidDiscriminator {
            options: &self.options,
        })
    }
}

/// A value that can select a discriminated union branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminant {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Discriminant {
    /// Returns `None` for values that cannot act as a discriminant (floats,
    /// arrays, objects).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Discriminant::Null),
            Value::Bool(b) => Some(Discriminant::Bool(*b)),
            Value::Number(n) => n.as_i64().map(Discriminant::Int),
            Value::String(s) => Some(Discriminant::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Discriminant::Null => write!(f, "null"),
            Discriminant::Bool(b) => write!(f, "{}", b),
            Discriminant::Int(n) => write!(f, "{}", n),
            Discriminant::Str(s) => write!(f, "'{}'", s),
        }
    }
}

/// A coarse tag identifying what a schema node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    String,
    Number,
    Boolean,
    Date,
    Any,
    Literal,
    Enum,
    Custom,
    Array,
    Object,
    Union,
    DiscriminatedUnion,
    Optional,
    Nullable,
    Nullish,
}

impl Schema {
    fn new(kind: Kind) -> Self {
        Schema(Arc::new(Node {
            kind,
            message: None,
            refinements: Vec::new(),
            compiled: OnceLock::new(),
        }))
    }

    pub(crate) fn node(&self) -> &Node {
        &self.0
    }

    /// A fresh node with the same contents as this one, after `edit`.
    fn derive(&self, edit: impl FnOnce(&mut Kind, &mut Option<String>, &mut Vec<Refinement>)) -> Self {
        let mut kind = self.0.kind.clone();
        let mut message = self.0.message.clone();
        let mut refinements = self.0.refinements.clone();
        edit(&mut kind, &mut message, &mut refinements);

        Schema(Arc::new(Node {
            kind,
            message,
            refinements,
            compiled: OnceLock::new(),
        }))
    }

    /// Whether two handles point at the same node.
    ///
    /// This is the only way to tell a shared default schema apart from a
    /// freshly built one; they behave identically.
    pub fn ptr_eq(a: &Schema, b: &Schema) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn tag(&self) -> Tag {
        match self.0.kind {
            Kind::String { .. } => Tag::String,
            Kind::Number { .. } => Tag::Number,
            Kind::Boolean { .. } => Tag::Boolean,
            Kind::Date { .. } => Tag::Date,
            Kind::Any => Tag::Any,
            Kind::Literal(_) => Tag::Literal,
            Kind::Enum(_) => Tag::Enum,
            Kind::Custom(_) => Tag::Custom,
            Kind::Array(_) => Tag::Array,
            Kind::Object(_) => Tag::Object,
            Kind::Union(_) => Tag::Union,
            Kind::DiscriminatedUnion(_) => Tag::DiscriminatedUnion,
            Kind::Optional(_) => Tag::Optional,
            Kind::Nullable(_) => Tag::Nullable,
            Kind::Nullish(_) => Tag::Nullish,
        }
    }

    /// The override for this schema's own base error, if any.
    pub fn custom_message(&self) -> Option<&str> {
        self.0.message.as_ref().map(String::as_str)
    }

    /// Number of refinements attached to this node.
    pub fn refinement_count(&self) -> usize {
        self.0.refinements.len()
    }

    /// Returns a schema that reports `message` instead of its own errors.
    ///
    /// A node's own errors are the ones it raises itself, not the ones its
    /// children or its refinements raise:
    ///
    /// * leaves: the type, literal, enum and date errors;
    /// * arrays: "not an array";
    /// * objects: "not an object" and, for strict objects, the unrecognized
    ///   keys error;
    /// * unions: "no branch matched";
    /// * discriminated unions: "not an object" and the invalid discriminator
    ///   error;
    /// * wrappers: whatever the inner schema rejected with.
    ///
    /// Field and item errors keep their own messages and location markers,
    /// and constraint messages are set per constraint with
    /// [`constrain`](#method.constrain).
    pub fn message(&self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.derive(move |_, slot, _| *slot = Some(message))
    }

    /// Returns a schema that coerces compatible input into its type.
    ///
    /// Numeric strings become numbers, numbers and booleans become strings,
    /// `"true"`/`"false"` become booleans and integer epoch milliseconds
    /// become dates. Has no effect on other kinds of schemas.
    pub fn coerce(&self) -> Self {
        self.derive(|kind, _, _| match kind {
            Kind::String { coerce }
            | Kind::Number { coerce }
            | Kind::Boolean { coerce }
            | Kind::Date { coerce } => *coerce = true,
            _ => {}
        })
    }

    /// Rejects object keys the schema does not declare.
    pub fn strict(&self) -> Self {
        self.unknown_keys(UnknownKeys::Strict)
    }

    /// Removes object keys the schema does not declare. Removing a key
    /// counts as a coercion.
    pub fn strip(&self) -> Self {
        self.unknown_keys(UnknownKeys::Strip)
    }

    /// Keeps undeclared object keys untouched. This is the default.
    pub fn passthrough(&self) -> Self {
        self.unknown_keys(UnknownKeys::Passthrough)
    }

    /// Sets the unknown-keys policy. Has no effect on non-object schemas.
    pub fn unknown_keys(&self, policy: UnknownKeys) -> Self {
        self.derive(|kind, _, _| {
            if let Kind::Object(shape) = kind {
                shape.unknown_keys = policy;
            }
        })
    }

    /// Appends a built-in constraint to the refinement chain.
    ///
    /// `message`, when given, replaces the constraint's default message.
    ///
    /// A constraint that does not apply to this kind of schema (see
    /// [`Constraint`](../constraint/enum.Constraint.html)) is not attached:
    /// the schema comes back unchanged and a warning is logged. Use
    /// [`try_constrain`](#method.try_constrain) to get an error instead.
    /// Every shorthand below goes through this method.
    pub fn constrain(&self, constraint: Constraint, message: Option<&str>) -> Self {
        match self.try_constrain(constraint, message) {
            Ok(schema) => schema,
            Err(err) => {
                warn!(%err, "constraint not attached");
                self.clone()
            }
        }
    }

    /// Like [`constrain`](#method.constrain), but fails with
    /// `SchemaError::InapplicableConstraint` when the constraint does not
    /// apply to this kind of schema.
    pub fn try_constrain(
        &self,
        constraint: Constraint,
        message: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let keyword = constraint.keyword();
        let rule = self
            .origin()
            .and_then(|origin| Rule::resolve(constraint, origin))
            .ok_or_else(|| SchemaError::InapplicableConstraint {
                keyword,
                tag: self.tag(),
            })?;

        let refinement = Refinement::builtin(rule, message);
        Ok(self.derive(move |_, _, refinements| refinements.push(refinement)))
    }

    /// Inclusive lower bound: the value of a number, the character count of
    /// a string, the item count of an array, or an instant (epoch
    /// milliseconds) for a date. Fractional counts round up.
    pub fn min(&self, limit: f64) -> Self {
        self.constrain(Constraint::Min(limit), None)
    }

    /// Inclusive upper bound, measured like [`min`](#method.min).
    /// Fractional counts round down.
    pub fn max(&self, limit: f64) -> Self {
        self.constrain(Constraint::Max(limit), None)
    }

    /// Exclusive lower bound for numbers, or for dates in epoch milliseconds.
    pub fn gt(&self, limit: f64) -> Self {
        self.constrain(Constraint::Gt(limit), None)
    }

    /// Exclusive upper bound for numbers, or for dates in epoch milliseconds.
    pub fn lt(&self, limit: f64) -> Self {
        self.constrain(Constraint::Lt(limit), None)
    }

    /// Shorthand for `gt(0.0)`.
    pub fn positive(&self) -> Self {
        self.gt(0.0)
    }

    /// Shorthand for `lt(0.0)`.
    pub fn negative(&self) -> Self {
        self.lt(0.0)
    }

    /// Shorthand for `min(0.0)`.
    pub fn nonnegative(&self) -> Self {
        self.min(0.0)
    }

    /// Shorthand for `max(0.0)`.
    pub fn nonpositive(&self) -> Self {
        self.max(0.0)
    }

    /// Requires a number that is a whole multiple of `divisor`, within a
    /// small tolerance for floating point noise.
    pub fn multiple_of(&self, divisor: f64) -> Self {
        self.constrain(Constraint::MultipleOf(divisor), None)
    }

    /// Requires a number with no fractional part.
    pub fn int(&self) -> Self {
        self.constrain(Constraint::Int, None)
    }

    /// Requires exactly `size` characters of a string or items of an array.
    pub fn length(&self, size: usize) -> Self {
        self.constrain(Constraint::Length(size), None)
    }

    /// Shorthand for `min(1.0)`.
    pub fn nonempty(&self) -> Self {
        self.min(1.0)
    }

    /// Requires a string matching `regex` anywhere; anchor it to match the
    /// whole string.
    pub fn regex(&self, regex: Regex) -> Self {
        self.constrain(Constraint::Pattern(regex), None)
    }

    /// Like [`regex`](#method.regex), compiling the pattern first.
    pub fn pattern(&self, pattern: &str) -> Result<Self, SchemaError> {
        Ok(self.regex(constraint::compile_pattern(pattern)?))
    }

    /// Requires a date strictly earlier than `limit`.
    pub fn before(&self, limit: DateTime<Utc>) -> Self {
        self.constrain(Constraint::Before(limit), None)
    }

    /// Requires a date strictly later than `limit`.
    pub fn after(&self, limit: DateTime<Utc>) -> Self {
        self.constrain(Constraint::After(limit), None)
    }

    /// Appends a boolean refinement. A `false` result rejects with `message`,
    /// or with a generic "Invalid input" when no message is given.
    pub fn refine<F>(&self, predicate: F, message: Option<&str>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(move |value: &Value| {
            if predicate(value) {
                Ok(())
            } else {
                Err(messages::format(&Issue::Custom))
            }
        });

        self.refine_shared(predicate, message)
    }

    /// Appends a refinement that supplies its own failure message.
    /// `message`, when given, takes precedence over it.
    pub fn refine_with<F>(&self, predicate: F, message: Option<&str>) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.refine_shared(Arc::new(predicate), message)
    }

    /// Appends an already shared predicate. Attaching the same `Arc` to
    /// several schemas registers it only once when the tree is compiled.
    pub fn refine_shared(&self, predicate: Predicate, message: Option<&str>) -> Self {
        let refinement = Refinement::Custom {
            predicate,
            message: message.map(str::to_owned),
        };

        self.derive(move |_, _, refinements| refinements.push(refinement))
    }

    /// What `min`/`max`/`length` should measure on this schema.
    fn origin(&self) -> Option<Origin> {
        match &self.0.kind {
            Kind::Number { .. } => Some(Origin::Number),
            Kind::String { .. } | Kind::Enum(_) => Some(Origin::String),
            Kind::Array(_) => Some(Origin::Array),
            Kind::Date { .. } => Some(Origin::Date),
            Kind::Optional(inner) | Kind::Nullable(inner) | Kind::Nullish(inner) => inner.origin(),
            _ => None,
        }
    }

    /// Validates a single value.
    pub fn parse<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, ParseError> {
        parser::parse(self, value)
    }

    /// Validates a batch of values.
    pub fn parse_bulk<'a>(&self, values: &'a [Value], config: &Config) -> Result<Batch<'a>, BulkError> {
        parser::parse_bulk(self, values, config)
    }

    /// Returns the compiled form of this schema, compiling it on first use.
    pub fn compile(&self) -> Arc<Compiled> {
        compiler::compile(self)
    }

    /// Builds a schema from its serialized form.
    pub fn from_serde(serde_schema: crate::serde_schema::SerdeSchema) -> Result<Self, SchemaError> {
        crate::serde_schema::convert(serde_schema)
    }
}

impl Validate for Schema {
    fn check(&self, value: Option<&Value>) -> Check {
        vm::eval(self, value)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Schema")
            .field("tag", &self.tag())
            .field("message", &self.0.message)
            .field("refinements", &self.0.refinements)
            .finish()
    }
}

macro_rules! shared {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        pub fn $name() -> Schema {
            static SHARED: OnceLock<Schema> = OnceLock::new();
            SHARED.get_or_init(|| Schema::new($kind)).clone()
        }
    };
}

shared!(
    /// Accepts strings. Without a custom message or coercion, every call
    /// returns the same shared node.
    string,
    Kind::String { coerce: false }
);

shared!(
    /// Accepts numbers.
    number,
    Kind::Number { coerce: false }
);

shared!(
    /// Accepts `true` and `false`.
    boolean,
    Kind::Boolean { coerce: false }
);

shared!(
    /// Accepts RFC 3339 timestamp strings.
    date,
    Kind::Date { coerce: false }
);

shared!(
    /// Accepts anything, including an absent value.
    any,
    Kind::Any
);

/// Accepts exactly `value`.
pub fn literal(value: impl Into<Value>) -> Schema {
    Schema::new(Kind::Literal(value.into()))
}

/// Accepts any one of a fixed set of strings.
pub fn enumeration<I, S>(values: I) -> Schema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Schema::new(Kind::Enum(values.into_iter().map(Into::into).collect()))
}

/// A leaf schema backed by an arbitrary check function.
///
/// The function only sees present values; an absent value is rejected as
/// required without calling it. It may accept, reject or coerce.
pub fn custom<F>(check: F) -> Schema
where
    F: Fn(&Value) -> Check + Send + Sync + 'static,
{
    Schema::new(Kind::Custom(Arc::new(check)))
}

/// An array whose every item satisfies `item`.
pub fn array(item: Schema) -> Schema {
    Schema::new(Kind::Array(item))
}

/// An object with the given fields, checked in the order given.
pub fn object<I, K>(fields: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    Schema::new(Kind::Object(Shape {
        fields: fields
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect(),
        unknown_keys: UnknownKeys::default(),
    }))
}

/// Accepts whatever the first matching branch accepts.
pub fn union<I>(branches: I) -> Schema
where
    I: IntoIterator<Item = Schema>,
{
    Schema::new(Kind::Union(branches.into_iter().collect()))
}

/// A union whose branch is chosen by the value of one field.
///
/// Every branch must be an object schema declaring `field` as a literal (or
/// a string enum, which maps each of its values to the branch).
pub fn discriminated_union<I>(field: &str, branches: I) -> Result<Schema, SchemaError>
where
    I: IntoIterator<Item = Schema>,
{
    let branches: Vec<Schema> = branches.into_iter().collect();
    let mut mapping = HashMap::new();
    let mut options = Vec::new();

    for (index, branch) in branches.iter().enumerate() {
        let shape = match &branch.0.kind {
            Kind::Object(shape) => shape,
            _ => return Err(SchemaError::BranchNotObject { index }),
        };

        let discriminant = shape
            .fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, schema)| schema)
            .ok_or_else(|| SchemaError::MissingDiscriminant {
                index,
                field: field.to_owned(),
            })?;

        let unsupported = || SchemaError::UnsupportedDiscriminant {
            index,
            field: field.to_owned(),
        };

        let keys = match &discriminant.0.kind {
            Kind::Literal(value) => vec![Discriminant::from_value(value).ok_or_else(unsupported)?],
            Kind::Enum(values) => values.iter().cloned().map(Discriminant::Str).collect(),
            _ => return Err(unsupported()),
        };

        for key in keys {
            options.push(key.to_string());
            if mapping.insert(key.clone(), index).is_some() {
                return Err(SchemaError::DuplicateDiscriminant {
                    value: key.to_string(),
                });
            }
        }
    }

    debug!(field, branches = branches.len(), "built discriminated union");

    Ok(Schema::new(Kind::DiscriminatedUnion(Arc::new(Dispatch {
        field: field.to_owned(),
        branches,
        mapping,
        options,
    }))))
}

/// Accepts an absent value without consulting `inner`.
pub fn optional(inner: Schema) -> Schema {
    Schema::new(Kind::Optional(inner))
}

/// Accepts `null` without consulting `inner`. An absent value is still
/// handed to `inner`.
pub fn nullable(inner: Schema) -> Schema {
    Schema::new(Kind::Nullable(inner))
}

/// Accepts both an absent value and `null` without consulting `inner`.
pub fn nullish(inner: Schema) -> Schema {
    Schema::new(Kind::Nullish(inner))
}

/// Free-function form of [`Schema::refine`](struct.Schema.html#method.refine).
pub fn refine<F>(schema: &Schema, predicate: F, message: Option<&str>) -> Schema
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    schema.refine(predicate, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_shared() {
        assert!(Schema::ptr_eq(&string(), &string()));
        assert!(Schema::ptr_eq(&number(), &number()));
        assert!(!Schema::ptr_eq(&string(), &string().message("nope")));
        assert!(!Schema::ptr_eq(&number(), &number().coerce()));
    }

    #[test]
    fn sharing_is_invisible_to_behavior() {
        let shared = string();
        let fresh = string().message("Expected string, received number");
        assert_eq!(shared.check(Some(&json!(1))), fresh.check(Some(&json!(1))));
        assert_eq!(shared.check(Some(&json!("a"))), fresh.check(Some(&json!("a"))));
    }

    #[test]
    fn constraints_do_not_touch_the_original() {
        let base = number();
        let constrained = base.min(5.0);
        assert_eq!(base.refinement_count(), 0);
        assert_eq!(constrained.refinement_count(), 1);
        assert_eq!(base.check(Some(&json!(1))), Check::Accept);
        assert!(constrained.check(Some(&json!(1))).is_reject());
    }

    #[test]
    fn tags() {
        assert_eq!(string().tag(), Tag::String);
        assert_eq!(optional(string()).tag(), Tag::Optional);
        assert_eq!(array(number()).min(1.0).tag(), Tag::Array);
    }

    #[test]
    fn discriminated_union_requires_objects() {
        let err = discriminated_union("type", vec![string()]).unwrap_err();
        assert_eq!(err, SchemaError::BranchNotObject { index: 0 });
    }

    #[test]
    fn discriminated_union_requires_the_field() {
        let err = discriminated_union(
            "type",
            vec![
                object(vec![("type", literal("a"))]),
                object(vec![("kind", literal("b"))]),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            SchemaError::MissingDiscriminant {
                index: 1,
                field: "type".to_owned()
            }
        );
    }

    #[test]
    fn discriminated_union_requires_literals() {
        let err = discriminated_union("type", vec![object(vec![("type", string())])]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedDiscriminant {
                index: 0,
                field: "type".to_owned()
            }
        );

        let err =
            discriminated_union("type", vec![object(vec![("type", literal(1.5))])]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedDiscriminant {
                index: 0,
                field: "type".to_owned()
            }
        );
    }

    #[test]
    fn discriminated_union_rejects_duplicates() {
        let err = discriminated_union(
            "type",
            vec![
                object(vec![("type", enumeration(vec!["a", "b"]))]),
                object(vec![("type", literal("b"))]),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            SchemaError::DuplicateDiscriminant {
                value: "'b'".to_owned()
            }
        );
    }

    #[test]
    fn bad_patterns_are_reported() {
        match string().pattern("(") {
            Err(SchemaError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "("),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn inapplicable_constraints_are_not_attached() {
        let schema = string().positive();
        assert_eq!(schema.refinement_count(), 0);
        assert_eq!(schema.check(Some(&json!("a"))), Check::Accept);

        assert_eq!(number().length(3).refinement_count(), 0);
        assert_eq!(boolean().min(3.0).refinement_count(), 0);

        assert_eq!(
            string().try_constrain(Constraint::Gt(0.0), None).unwrap_err(),
            SchemaError::InapplicableConstraint {
                keyword: "gt",
                tag: Tag::String
            }
        );
        assert_eq!(
            number()
                .try_constrain(Constraint::Length(3), None)
                .unwrap_err(),
            SchemaError::InapplicableConstraint {
                keyword: "length",
                tag: Tag::Number
            }
        );
        assert!(optional(number())
            .try_constrain(Constraint::Int, None)
            .is_ok());
    }

    #[test]
    fn min_and_max_on_dates_bound_the_instant() {
        let schema = date().max(0.0);
        assert_eq!(
            schema.check(Some(&json!("2020-01-01T00:00:00Z"))),
            Check::Reject("Date must be smaller than or equal to 1970-01-01T00:00:00.000Z".to_owned())
        );
        assert_eq!(schema.check(Some(&json!("1970-01-01T00:00:00Z"))), Check::Accept);

        let schema = date().min(1e18);
        assert!(schema.check(Some(&json!("1970-01-01T00:00:00Z"))).is_reject());

        let schema = date().gt(0.0);
        assert_eq!(
            schema.check(Some(&json!("1970-01-01T00:00:00Z"))),
            Check::Reject("Date must be after 1970-01-01T00:00:00.000Z".to_owned())
        );
    }

    #[test]
    fn min_on_wrapped_string_counts_characters() {
        let schema = optional(string()).min(2.0);
        assert_eq!(
            schema.check(Some(&json!("a"))),
            Check::Reject("String must contain at least 2 character(s)".to_owned())
        );
        assert_eq!(schema.check(None), Check::Accept);
    }
}
