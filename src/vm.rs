use crate::check::Check;
use crate::messages::{self, Issue};
use crate::primitive;
use crate::schema::{Dispatch, Kind, Node, Schema, Shape, UnknownKeys};
use serde_json::{Map, Value};

/// Interprets a schema tree against a value.
pub(crate) fn eval(schema: &Schema, value: Option<&Value>) -> Check {
    let node = schema.node();

    if is_sentinel(&node.kind, value) {
        return Check::Accept;
    }

    let checked = eval_kind(node, value);
    refine(node, value, checked)
}

/// Wrappers accept their sentinel before anything else runs, including their
/// own refinements.
pub(crate) fn is_sentinel(kind: &Kind, value: Option<&Value>) -> bool {
    match (kind, value) {
        (Kind::Optional(_), None) => true,
        (Kind::Nullable(_), Some(Value::Null)) => true,
        (Kind::Nullish(_), None) | (Kind::Nullish(_), Some(Value::Null)) => true,
        _ => false,
    }
}

fn eval_kind(node: &Node, value: Option<&Value>) -> Check {
    match &node.kind {
        Kind::String { coerce } => overridden(node, primitive::string(value, *coerce)),
        Kind::Number { coerce } => overridden(node, primitive::number(value, *coerce)),
        Kind::Boolean { coerce } => overridden(node, primitive::boolean(value, *coerce)),
        Kind::Date { coerce } => overridden(node, primitive::date(value, *coerce)),
        Kind::Any => Check::Accept,
        Kind::Literal(expected) => overridden(node, primitive::literal(expected, value)),
        Kind::Enum(options) => overridden(node, primitive::enumeration(options, value)),
        Kind::Custom(check) => match value {
            Some(value) => overridden(node, check(value)),
            None => reject(node, || messages::format(&Issue::Required)),
        },
        Kind::Array(item) => eval_array(node, item, value),
        Kind::Object(shape) => eval_object(node, shape, value),
        Kind::Union(branches) => eval_union(node, branches, value),
        Kind::DiscriminatedUnion(dispatch) => eval_dispatch(node, dispatch, value),
        Kind::Optional(inner) | Kind::Nullable(inner) | Kind::Nullish(inner) => {
            overridden(node, eval(inner, value))
        }
    }
}

/// Replaces a rejection message with the node's own override, if it has one.
pub(crate) fn overridden(node: &Node, checked: Check) -> Check {
    match (&node.message, checked) {
        (Some(message), Check::Reject(_)) => Check::Reject(message.clone()),
        (_, checked) => checked,
    }
}

fn reject(node: &Node, message: impl FnOnce() -> String) -> Check {
    Check::Reject(node.message.clone().unwrap_or_else(message))
}

/// Runs the refinement chain in order; the first failure wins.
fn refine(node: &Node, value: Option<&Value>, checked: Check) -> Check {
    if node.refinements.is_empty() {
        return checked;
    }

    if let Some(effective) = checked.effective(value) {
        for refinement in &node.refinements {
            if let Err(message) = refinement.run(effective) {
                return Check::Reject(message);
            }
        }
    }

    checked
}

fn eval_array(node: &Node, item: &Schema, value: Option<&Value>) -> Check {
    let items = match value {
        Some(Value::Array(items)) => items,
        other => return reject(node, || primitive::mismatch("array", other)),
    };

    // Stays empty until some item coerces.
    let mut output: Option<Vec<Value>> = None;

    for (index, element) in items.iter().enumerate() {
        match eval(item, Some(element)) {
            Check::Accept => {
                if let Some(output) = output.as_mut() {
                    output.push(element.clone());
                }
            }
            Check::AcceptCoerced(coerced) => output
                .get_or_insert_with(|| prefix(items, index))
                .push(coerced),
            Check::Reject(message) => {
                return Check::Reject(messages::at_index(index, &message));
            }
        }
    }

    match output {
        Some(output) => Check::AcceptCoerced(Value::Array(output)),
        None => Check::Accept,
    }
}

pub(crate) fn prefix(items: &[Value], index: usize) -> Vec<Value> {
    let mut output = Vec::with_capacity(items.len());
    output.extend_from_slice(&items[..index]);
    output
}

fn eval_object(node: &Node, shape: &Shape, value: Option<&Value>) -> Check {
    let object = match value {
        Some(Value::Object(object)) => object,
        other => return reject(node, || primitive::mismatch("object", other)),
    };

    let mut output: Option<Map<String, Value>> = None;

    for (name, field) in &shape.fields {
        match eval(field, object.get(name)) {
            Check::Accept => {}
            Check::AcceptCoerced(coerced) => {
                output
                    .get_or_insert_with(|| object.clone())
                    .insert(name.clone(), coerced);
            }
            Check::Reject(message) => {
                return Check::Reject(messages::at_field(name, &message));
            }
        }
    }

    match shape.unknown_keys {
        UnknownKeys::Passthrough => {}
        UnknownKeys::Strict => {
            let unknown: Vec<&str> = object
                .keys()
                .filter(|key| !shape.declares(key))
                .map(String::as_str)
                .collect();

            if !unknown.is_empty() {
                return reject(node, || {
                    messages::format(&Issue::UnrecognizedKeys { keys: &unknown })
                });
            }
        }
        UnknownKeys::Strip => {
            if object.keys().any(|key| !shape.declares(key)) {
                output
                    .get_or_insert_with(|| object.clone())
                    .retain(|key, _| shape.declares(key));
            }
        }
    }

    match output {
        Some(output) => Check::AcceptCoerced(Value::Object(output)),
        None => Check::Accept,
    }
}

fn eval_union(node: &Node, branches: &[Schema], value: Option<&Value>) -> Check {
    let mut rejections = Vec::with_capacity(branches.len());

    for branch in branches {
        match eval(branch, value) {
            Check::Reject(message) => rejections.push(message),
            accepted => return accepted,
        }
    }

    reject(node, || {
        messages::format(&Issue::InvalidUnion {
            messages: &rejections,
        })
    })
}

fn eval_dispatch(node: &Node, dispatch: &Dispatch, value: Option<&Value>) -> Check {
    let object = match value {
        Some(Value::Object(object)) => object,
        other => return reject(node, || primitive::mismatch("object", other)),
    };

    match dispatch.branch(object) {
        Some(index) => eval(&dispatch.branches[index], value),
        None => reject(node, || dispatch.unrecognized()),
    }
}
