//! Specializes a schema tree into a tree of pre-resolved closures.
//!
//! The interpreter in `vm` re-dispatches on every node's kind, re-reads its
//! coercion flags and walks refinement lists of trait objects for each
//! value. Compiling does that work once: each node becomes a closure chosen
//! for its exact configuration, built-in constraints become specialized
//! predicates with their messages already rendered, and the discriminated
//! union table and strict-object key sets are hashed up front.
//!
//! Closures the compiler cannot see into (custom refinements and custom
//! checks) are registered once each in an externals table and called by
//! index, at the same position in the chain they occupied in the tree.
//!
//! A compiled validator must agree with the interpreter on every input,
//! down to the message text.

use crate::check::{Check, Validate};
use crate::constraint::{is_multiple, Bound, Predicate, Refinement, Rule};
use crate::errors::{BulkError, ParseError};
use crate::messages::{self, Issue};
use crate::parser::{self, Batch, Config};
use crate::primitive;
use crate::schema::{CustomCheck, Discriminant, Kind, Node, Schema, UnknownKeys};
use crate::vm;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Op = Box<dyn Fn(&Externals, Option<&Value>) -> Check + Send + Sync>;
type Test = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// A schema specialized for repeated validation.
///
/// Behaves exactly like the schema it was compiled from. It holds no mutable
/// state, so one instance can be shared across threads freely.
pub struct Compiled {
    root: Op,
    externals: Externals,
}

impl Compiled {
    pub fn parse<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, ParseError> {
        parser::parse(self, value)
    }

    pub fn parse_bulk<'a>(
        &self,
        values: &'a [Value],
        config: &Config,
    ) -> Result<Batch<'a>, BulkError> {
        parser::parse_bulk(self, values, config)
    }

    /// Number of distinct custom closures the compiled tree calls by index.
    pub fn externals_len(&self) -> usize {
        self.externals.refinements.len() + self.externals.checks.len()
    }
}

impl Validate for Compiled {
    fn check(&self, value: Option<&Value>) -> Check {
        (self.root)(&self.externals, value)
    }
}

impl fmt::Debug for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Compiled")
            .field("refinements", &self.externals.refinements.len())
            .field("checks", &self.externals.checks.len())
            .finish()
    }
}

/// The closures a compiled validator calls by index.
#[derive(Default)]
struct Externals {
    refinements: Vec<Predicate>,
    checks: Vec<CustomCheck>,
}

/// Returns the compiled form of `schema`, compiling it on first use.
///
/// The result is cached on the schema node; later calls (from any thread)
/// return the same `Arc`.
pub fn compile(schema: &Schema) -> Arc<Compiled> {
    schema
        .node()
        .compiled
        .get_or_init(|| {
            let mut compiler = Compiler::default();
            let root = compiler.node(schema);
            let compiled = Compiled {
                root,
                externals: compiler.externals,
            };

            debug!(
                tag = ?schema.tag(),
                externals = compiled.externals_len(),
                "compiled schema"
            );

            Arc::new(compiled)
        })
        .clone()
}

#[derive(Default)]
struct Compiler {
    externals: Externals,
    // Keyed by closure address, so a closure shared between nodes gets one
    // slot.
    refinement_slots: HashMap<usize, usize>,
    check_slots: HashMap<usize, usize>,
}

enum Step {
    Inline { test: Test, message: String },
    External { index: usize, message: Option<String> },
}

impl Compiler {
    fn node(&mut self, schema: &Schema) -> Op {
        let node = schema.node();
        let base = self.base(node);
        let steps: Vec<Step> = node
            .refinements
            .iter()
            .map(|refinement| self.step(refinement))
            .collect();

        let op = if steps.is_empty() {
            base
        } else {
            boxed(move |externals, value| {
                run_steps(&steps, externals, value, base(externals, value))
            })
        };

        match node.kind {
            Kind::Optional(_) => boxed(move |externals, value| match value {
                None => Check::Accept,
                Some(_) => op(externals, value),
            }),
            Kind::Nullable(_) => boxed(move |externals, value| match value {
                Some(Value::Null) => Check::Accept,
                _ => op(externals, value),
            }),
            Kind::Nullish(_) => boxed(move |externals, value| match value {
                None | Some(Value::Null) => Check::Accept,
                _ => op(externals, value),
            }),
            _ => op,
        }
    }

    fn step(&mut self, refinement: &Refinement) -> Step {
        match refinement {
            Refinement::Builtin { rule, message } => Step::Inline {
                test: specialize(rule),
                message: message.clone(),
            },
            Refinement::Custom { predicate, message } => Step::External {
                index: self.register_refinement(predicate),
                message: message.clone(),
            },
        }
    }

    fn register_refinement(&mut self, predicate: &Predicate) -> usize {
        let key = Arc::as_ptr(predicate) as *const () as usize;
        let externals = &mut self.externals;
        *self.refinement_slots.entry(key).or_insert_with(|| {
            externals.refinements.push(predicate.clone());
            externals.refinements.len() - 1
        })
    }

    fn register_check(&mut self, check: &CustomCheck) -> usize {
        let key = Arc::as_ptr(check) as *const () as usize;
        let externals = &mut self.externals;
        *self.check_slots.entry(key).or_insert_with(|| {
            externals.checks.push(check.clone());
            externals.checks.len() - 1
        })
    }

    fn base(&mut self, node: &Node) -> Op {
        let message = node.message.clone();

        match &node.kind {
            Kind::String { coerce: false } => boxed(move |_, value| match value {
                Some(Value::String(_)) => Check::Accept,
                other => rejection(&message, || primitive::mismatch("string", other)),
            }),
            Kind::Number { coerce: false } => boxed(move |_, value| match value {
                Some(Value::Number(_)) => Check::Accept,
                other => rejection(&message, || primitive::mismatch("number", other)),
            }),
            Kind::Boolean { coerce: false } => boxed(move |_, value| match value {
                Some(Value::Bool(_)) => Check::Accept,
                other => rejection(&message, || primitive::mismatch("boolean", other)),
            }),
            Kind::String { coerce: true } => boxed(move |_, value| {
                overridden(&message, primitive::string(value, true))
            }),
            Kind::Number { coerce: true } => boxed(move |_, value| {
                overridden(&message, primitive::number(value, true))
            }),
            Kind::Boolean { coerce: true } => boxed(move |_, value| {
                overridden(&message, primitive::boolean(value, true))
            }),
            Kind::Date { coerce } => {
                let coerce = *coerce;
                boxed(move |_, value| overridden(&message, primitive::date(value, coerce)))
            }
            Kind::Any => boxed(|_, _| Check::Accept),
            Kind::Literal(expected) => {
                let expected = expected.clone();
                let mismatch = message.clone().unwrap_or_else(|| {
                    messages::format(&Issue::InvalidLiteral {
                        expected: &expected,
                    })
                });
                let required = message.unwrap_or_else(|| messages::format(&Issue::Required));
                boxed(move |_, value| match value {
                    Some(value) if *value == expected => Check::Accept,
                    Some(_) => Check::Reject(mismatch.clone()),
                    None => Check::Reject(required.clone()),
                })
            }
            Kind::Enum(options) => {
                let options = options.clone();
                let members: HashSet<String> = options.iter().cloned().collect();
                boxed(move |_, value| match value {
                    Some(Value::String(s)) if members.contains(s) => Check::Accept,
                    other => overridden(&message, primitive::enumeration(&options, other)),
                })
            }
            Kind::Custom(check) => {
                let index = self.register_check(check);
                boxed(move |externals, value| match value {
                    Some(value) => overridden(&message, (externals.checks[index])(value)),
                    None => rejection(&message, || messages::format(&Issue::Required)),
                })
            }
            Kind::Array(item) => self.array(message, item),
            Kind::Object(shape) => {
                let fields: Vec<(String, Op)> = shape
                    .fields
                    .iter()
                    .map(|(name, schema)| (name.clone(), self.node(schema)))
                    .collect();
                let declared: HashSet<String> =
                    fields.iter().map(|(name, _)| name.clone()).collect();
                compile_object(message, fields, declared, shape.unknown_keys)
            }
            Kind::Union(branches) => {
                let branches: Vec<Op> = branches.iter().map(|branch| self.node(branch)).collect();
                boxed(move |externals, value| {
                    let mut rejections = Vec::with_capacity(branches.len());
                    for branch in &branches {
                        match branch(externals, value) {
                            Check::Reject(rejection) => rejections.push(rejection),
                            accepted => return accepted,
                        }
                    }

                    rejection(&message, || {
                        messages::format(&Issue::InvalidUnion {
                            messages: &rejections,
                        })
                    })
                })
            }
            Kind::DiscriminatedUnion(dispatch) => {
                let field = dispatch.field.clone();
                let mapping: HashMap<Discriminant, usize> = dispatch.mapping.clone();
                let branches: Vec<Op> = dispatch
                    .branches
                    .iter()
                    .map(|branch| self.node(branch))
                    .collect();
                let unrecognized = message.clone().unwrap_or_else(|| dispatch.unrecognized());

                boxed(move |externals, value| {
                    let object = match value {
                        Some(Value::Object(object)) => object,
                        other => {
                            return rejection(&message, || primitive::mismatch("object", other))
                        }
                    };

                    let selected = object
                        .get(&field)
                        .and_then(Discriminant::from_value)
                        .and_then(|key| mapping.get(&key));

                    match selected {
                        Some(&index) => branches[index](externals, value),
                        None => Check::Reject(unrecognized.clone()),
                    }
                })
            }
            Kind::Optional(inner) | Kind::Nullable(inner) | Kind::Nullish(inner) => {
                let inner = self.node(inner);
                boxed(move |externals, value| overridden(&message, inner(externals, value)))
            }
        }
    }

    fn array(&mut self, message: Option<String>, item: &Schema) -> Op {
        let item = self.node(item);

        boxed(move |externals, value| {
            let items = match value {
                Some(Value::Array(items)) => items,
                other => return rejection(&message, || primitive::mismatch("array", other)),
            };

            let mut output: Option<Vec<Value>> = None;
            for (index, element) in items.iter().enumerate() {
                match item(externals, Some(element)) {
                    Check::Accept => {
                        if let Some(output) = output.as_mut() {
                            output.push(element.clone());
                        }
                    }
                    Check::AcceptCoerced(coerced) => output
                        .get_or_insert_with(|| vm::prefix(items, index))
                        .push(coerced),
                    Check::Reject(rejection) => {
                        return Check::Reject(messages::at_index(index, &rejection))
                    }
                }
            }

            match output {
                Some(output) => Check::AcceptCoerced(Value::Array(output)),
                None => Check::Accept,
            }
        })
    }
}

fn compile_object(
    message: Option<String>,
    fields: Vec<(String, Op)>,
    declared: HashSet<String>,
    unknown_keys: UnknownKeys,
) -> Op {
    boxed(move |externals, value| {
        let object = match value {
            Some(Value::Object(object)) => object,
            other => return rejection(&message, || primitive::mismatch("object", other)),
        };

        let mut output: Option<Map<String, Value>> = None;
        for (name, field) in &fields {
            match field(externals, object.get(name)) {
                Check::Accept => {}
                Check::AcceptCoerced(coerced) => {
                    output
                        .get_or_insert_with(|| object.clone())
                        .insert(name.clone(), coerced);
                }
                Check::Reject(rejection) => {
                    return Check::Reject(messages::at_field(name, &rejection))
                }
            }
        }

        match unknown_keys {
            UnknownKeys::Passthrough => {}
            UnknownKeys::Strict => {
                let unknown: Vec<&str> = object
                    .keys()
                    .filter(|key| !declared.contains(key.as_str()))
                    .map(String::as_str)
                    .collect();

                if !unknown.is_empty() {
                    return rejection(&message, || {
                        messages::format(&Issue::UnrecognizedKeys { keys: &unknown })
                    });
                }
            }
            UnknownKeys::Strip => {
                if object.keys().any(|key| !declared.contains(key.as_str())) {
                    output
                        .get_or_insert_with(|| object.clone())
                        .retain(|key, _| declared.contains(key.as_str()));
                }
            }
        }

        match output {
            Some(output) => Check::AcceptCoerced(Value::Object(output)),
            None => Check::Accept,
        }
    })
}

fn boxed<F>(op: F) -> Op
where
    F: Fn(&Externals, Option<&Value>) -> Check + Send + Sync + 'static,
{
    Box::new(op)
}

fn inline<F>(test: F) -> Test
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Box::new(test)
}

fn run_steps(steps: &[Step], externals: &Externals, value: Option<&Value>, checked: Check) -> Check {
    if let Some(effective) = checked.effective(value) {
        for step in steps {
            let failure = match step {
                Step::Inline { test, message } => {
                    if test(effective) {
                        None
                    } else {
                        Some(message.clone())
                    }
                }
                Step::External { index, message } => (externals.refinements[*index])(effective)
                    .err()
                    .map(|own| message.clone().unwrap_or(own)),
            };

            if let Some(failure) = failure {
                return Check::Reject(failure);
            }
        }
    }

    checked
}

/// Turns a rule into a predicate with its parameters baked in.
fn specialize(rule: &Rule) -> Test {
    match rule.clone() {
        Rule::Number(bound, limit) => match bound {
            Bound::AtLeast => inline(move |v| v.as_f64().map_or(true, |n| n >= limit)),
            Bound::Above => inline(move |v| v.as_f64().map_or(true, |n| n > limit)),
            Bound::AtMost => inline(move |v| v.as_f64().map_or(true, |n| n <= limit)),
            Bound::Below => inline(move |v| v.as_f64().map_or(true, |n| n < limit)),
            #[allow(clippy::float_cmp)]
            Bound::Exactly => inline(move |v| v.as_f64().map_or(true, |n| n == limit)),
        },
        Rule::MultipleOf(divisor) => {
            inline(move |v| v.as_f64().map_or(true, |n| is_multiple(n, divisor)))
        }
        Rule::Integer => inline(|v| v.as_f64().map_or(true, |n| n.fract() == 0.0)),
        Rule::Length(bound, limit) => match bound {
            Bound::AtLeast => inline(move |v| v.as_str().map_or(true, |s| s.chars().count() >= limit)),
            Bound::AtMost => inline(move |v| v.as_str().map_or(true, |s| s.chars().count() <= limit)),
            Bound::Exactly => inline(move |v| v.as_str().map_or(true, |s| s.chars().count() == limit)),
            Bound::Above | Bound::Below => {
                let rule = Rule::Length(bound, limit);
                inline(move |v| rule.holds(v))
            }
        },
        Rule::Items(bound, limit) => match bound {
            Bound::AtLeast => inline(move |v| v.as_array().map_or(true, |a| a.len() >= limit)),
            Bound::AtMost => inline(move |v| v.as_array().map_or(true, |a| a.len() <= limit)),
            Bound::Exactly => inline(move |v| v.as_array().map_or(true, |a| a.len() == limit)),
            Bound::Above | Bound::Below => {
                let rule = Rule::Items(bound, limit);
                inline(move |v| rule.holds(v))
            }
        },
        Rule::Pattern(regex) => inline(move |v| v.as_str().map_or(true, |s| regex.is_match(s))),
        rule @ Rule::Date(..) => inline(move |v| rule.holds(v)),
    }
}

fn rejection(message: &Option<String>, default: impl FnOnce() -> String) -> Check {
    Check::Reject(message.clone().unwrap_or_else(default))
}

fn overridden(message: &Option<String>, checked: Check) -> Check {
    match (message, checked) {
        (Some(message), Check::Reject(_)) => Check::Reject(message.clone()),
        (_, checked) => checked,
    }
}
