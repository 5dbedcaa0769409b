//! A serializable representation of schemas.
//!
//! [`SerdeSchema`](struct.SerdeSchema.html) is meant for use with the `serde`
//! crate: it is convenient for loading schemas from JSON or any other data
//! format, but does not enforce which keywords make sense together. Convert
//! it into a [`Schema`](../schema/struct.Schema.html) with
//! [`Schema::from_serde`](../schema/struct.Schema.html#method.from_serde) to
//! get those checks.
//!
//! Custom refinements and custom checks are closures, so they have no
//! serialized form.

use crate::constraint::{self, Constraint};
use crate::errors::SchemaError;
use crate::primitive;
use crate::schema::{self, Schema, UnknownKeys};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A serialization/deserialization-friendly representation of a schema.
///
/// Object fields are held in a `BTreeMap`, so a schema loaded this way
/// checks its fields in name order.
#[derive(Debug, PartialEq, Deserialize, Serialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SerdeSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub typ: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coerce: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub int: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    /// The expected value of a `literal`. Absent means `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SerdeSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, SerdeSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_keys: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<SerdeSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<SerdeSchema>>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

fn invalid(reason: &str) -> SchemaError {
    SchemaError::InvalidForm {
        reason: reason.to_owned(),
    }
}

fn date_bound(value: &str) -> Result<chrono::DateTime<chrono::Utc>, SchemaError> {
    primitive::parse_date(value).ok_or_else(|| SchemaError::InvalidDate {
        value: value.to_owned(),
    })
}

pub(crate) fn convert(serde_schema: SerdeSchema) -> Result<Schema, SchemaError> {
    let SerdeSchema {
        typ,
        message,
        coerce,
        min,
        max,
        gt,
        lt,
        length,
        multiple_of,
        int,
        pattern,
        before,
        after,
        value,
        values,
        items,
        fields,
        unknown_keys,
        branches,
        discriminator,
        inner,
        extra: _,
    } = serde_schema;

    let typ = typ.ok_or_else(|| invalid("missing type"))?;

    // Structural keywords belong to exactly one type each.
    let structural = [
        ("literal", value.is_some(), "value"),
        ("enum", values.is_some(), "values"),
        ("array", items.is_some(), "items"),
        ("object", fields.is_some(), "fields"),
        ("object", unknown_keys.is_some(), "unknownKeys"),
        ("discriminatedUnion", discriminator.is_some(), "discriminator"),
    ];
    for (owner, present, keyword) in structural.iter() {
        if *present && typ != *owner {
            return Err(invalid(&format!("{} is only allowed on {}", keyword, owner)));
        }
    }

    if branches.is_some() && typ != "union" && typ != "discriminatedUnion" {
        return Err(invalid("branches is only allowed on unions"));
    }

    if inner.is_some() && !matches!(typ.as_str(), "optional" | "nullable" | "nullish") {
        return Err(invalid("inner is only allowed on optional, nullable and nullish"));
    }

    let convert_all = |schemas: Vec<SerdeSchema>| -> Result<Vec<Schema>, SchemaError> {
        schemas.into_iter().map(convert).collect()
    };
    let convert_inner = |inner: Option<Box<SerdeSchema>>| -> Result<Schema, SchemaError> {
        convert(*inner.ok_or_else(|| invalid("wrapper is missing inner"))?)
    };

    let mut result = match typ.as_str() {
        "string" => schema::string(),
        "number" => schema::number(),
        "boolean" => schema::boolean(),
        "date" => schema::date(),
        "any" => schema::any(),
        "literal" => schema::literal(value.unwrap_or(Value::Null)),
        "enum" => schema::enumeration(values.ok_or_else(|| invalid("enum is missing values"))?),
        "array" => schema::array(convert(*items.ok_or_else(|| invalid("array is missing items"))?)?),
        "object" => {
            let mut fields_out = Vec::new();
            for (name, field) in fields.unwrap_or_default() {
                fields_out.push((name, convert(field)?));
            }

            let policy = match unknown_keys.as_ref().map(String::as_str) {
                None | Some("passthrough") => UnknownKeys::Passthrough,
                Some("strip") => UnknownKeys::Strip,
                Some("strict") => UnknownKeys::Strict,
                Some(other) => {
                    return Err(invalid(&format!("unknown unknownKeys policy: {}", other)))
                }
            };

            schema::object(fields_out).unknown_keys(policy)
        }
        "union" => schema::union(convert_all(branches.unwrap_or_default())?),
        "discriminatedUnion" => {
            let field = discriminator.ok_or_else(|| invalid("discriminatedUnion is missing discriminator"))?;
            schema::discriminated_union(&field, convert_all(branches.unwrap_or_default())?)?
        }
        "optional" => schema::optional(convert_inner(inner)?),
        "nullable" => schema::nullable(convert_inner(inner)?),
        "nullish" => schema::nullish(convert_inner(inner)?),
        other => {
            return Err(SchemaError::UnknownType {
                name: other.to_owned(),
            })
        }
    };

    if let Some(message) = message {
        result = result.message(message);
    }

    if coerce == Some(true) {
        if !matches!(typ.as_str(), "string" | "number" | "boolean" | "date") {
            return Err(invalid(&format!("coerce is not allowed on {}", typ)));
        }

        result = result.coerce();
    }

    let mut constraints = Vec::new();
    if int == Some(true) {
        constraints.push(Constraint::Int);
    }
    constraints.extend(gt.map(Constraint::Gt));
    constraints.extend(min.map(Constraint::Min));
    constraints.extend(lt.map(Constraint::Lt));
    constraints.extend(max.map(Constraint::Max));
    constraints.extend(length.map(Constraint::Length));
    constraints.extend(multiple_of.map(Constraint::MultipleOf));
    if let Some(pattern) = pattern {
        constraints.push(Constraint::Pattern(constraint::compile_pattern(&pattern)?));
    }
    if let Some(limit) = after {
        constraints.push(Constraint::After(date_bound(&limit)?));
    }
    if let Some(limit) = before {
        constraints.push(Constraint::Before(date_bound(&limit)?));
    }

    for constraint in constraints {
        let keyword = constraint.keyword();
        result = result
            .try_constrain(constraint, None)
            .map_err(|_| invalid(&format!("{} is not allowed on {}", keyword, typ)))?;
    }

    debug!(tag = ?result.tag(), refinements = result.refinement_count(), "converted serialized schema");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{Check, Validate};
    use serde_json::json;

    #[test]
    fn roundtrip_json() {
        let data = r#"{
  "type": "object",
  "fields": {
    "age": {
      "type": "number",
      "min": 0.0,
      "int": true
    },
    "name": {
      "type": "optional",
      "inner": {
        "type": "string"
      }
    }
  },
  "unknownKeys": "strict",
  "extra": "foo"
}"#;

        let parsed: SerdeSchema = serde_json::from_str(data).expect("failed to parse json");
        assert_eq!(
            parsed,
            SerdeSchema {
                typ: Some("object".to_owned()),
                fields: Some(
                    vec![
                        (
                            "age".to_owned(),
                            SerdeSchema {
                                typ: Some("number".to_owned()),
                                min: Some(0.0),
                                int: Some(true),
                                ..SerdeSchema::default()
                            }
                        ),
                        (
                            "name".to_owned(),
                            SerdeSchema {
                                typ: Some("optional".to_owned()),
                                inner: Some(Box::new(SerdeSchema {
                                    typ: Some("string".to_owned()),
                                    ..SerdeSchema::default()
                                })),
                                ..SerdeSchema::default()
                            }
                        ),
                    ]
                    .into_iter()
                    .collect()
                ),
                unknown_keys: Some("strict".to_owned()),
                extra: [("extra".to_owned(), json!("foo"))]
                    .iter()
                    .cloned()
                    .collect(),
                ..SerdeSchema::default()
            }
        );

        let round_trip = serde_json::to_string_pretty(&parsed).expect("failed to serialize json");
        assert_eq!(round_trip, data);
    }

    #[test]
    fn converts_into_a_working_schema() {
        let serde_schema: SerdeSchema = serde_json::from_value(json!({
            "type": "object",
            "fields": {
                "age": { "type": "number", "coerce": true, "min": 18 },
            },
            "unknownKeys": "strip",
        }))
        .unwrap();

        let schema = Schema::from_serde(serde_schema).unwrap();
        assert_eq!(
            schema.check(Some(&json!({ "age": "21", "x": 1 }))),
            Check::AcceptCoerced(json!({ "age": 21 }))
        );
        assert_eq!(
            schema.check(Some(&json!({ "age": 3 }))),
            Check::Reject("Field age: Number must be greater than or equal to 18".to_owned())
        );
    }

    #[test]
    fn invalid_forms() {
        let cases = vec![
            json!({}),
            json!({ "type": "string", "items": { "type": "string" } }),
            json!({ "type": "number", "fields": {} }),
            json!({ "type": "array" }),
            json!({ "type": "optional" }),
            json!({ "type": "object", "unknownKeys": "sometimes" }),
            json!({ "type": "discriminatedUnion", "branches": [] }),
            json!({ "type": "boolean", "min": 3 }),
            json!({ "type": "boolean", "pattern": "^x" }),
            json!({ "type": "number", "length": 3 }),
            json!({ "type": "string", "gt": 0 }),
            json!({ "type": "string", "int": true }),
            json!({ "type": "number", "before": "2020-01-01T00:00:00Z" }),
            json!({ "type": "object", "coerce": true }),
            json!({ "type": "optional", "inner": { "type": "boolean" }, "max": 1 }),
        ];

        for case in cases {
            let serde_schema: SerdeSchema = serde_json::from_value(case.clone()).unwrap();
            match Schema::from_serde(serde_schema) {
                Err(SchemaError::InvalidForm { .. }) => {}
                other => panic!("{} gave {:?}", case, other),
            }
        }
    }

    #[test]
    fn date_bounds_from_epoch_millis() {
        let serde_schema: SerdeSchema = serde_json::from_value(json!({
            "type": "date",
            "min": 1_577_836_800_000u64,
            "max": 1_893_456_000_000u64,
        }))
        .unwrap();

        let schema = Schema::from_serde(serde_schema).unwrap();
        assert_eq!(schema.refinement_count(), 2);
        assert_eq!(schema.check(Some(&json!("2025-06-01T00:00:00Z"))), Check::Accept);
        assert_eq!(
            schema.check(Some(&json!("2019-06-01T00:00:00Z"))),
            Check::Reject(
                "Date must be greater than or equal to 2020-01-01T00:00:00.000Z".to_owned()
            )
        );
    }

    #[test]
    fn unknown_types_and_bad_keywords() {
        let serde_schema: SerdeSchema =
            serde_json::from_value(json!({ "type": "bigint" })).unwrap();
        assert_eq!(
            Schema::from_serde(serde_schema).unwrap_err(),
            SchemaError::UnknownType {
                name: "bigint".to_owned()
            }
        );

        let serde_schema: SerdeSchema =
            serde_json::from_value(json!({ "type": "date", "before": "soon" })).unwrap();
        assert_eq!(
            Schema::from_serde(serde_schema).unwrap_err(),
            SchemaError::InvalidDate {
                value: "soon".to_owned()
            }
        );
    }
}
