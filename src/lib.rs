//! `vet` checks and coerces untyped, JSON-shaped data against schemas built
//! out of composable parts.
//!
//! A [`Schema`](schema/struct.Schema.html) is an immutable description of
//! what a value should look like. Every builder method returns a new schema
//! and leaves the one it was called on untouched, so schemas can be shared
//! freely between threads and reused as building blocks.
//!
//! # Validating data
//!
//! ```
//! use serde_json::json;
//! use vet::{array, number, object, optional, string, Config};
//!
//! let user = object(vec![
//!     ("name", string().min(1.0)),
//!     ("age", number().coerce().int().nonnegative()),
//!     ("tags", optional(array(string()))),
//! ]);
//!
//! // Coercion hands back a new value; the input is never modified.
//! let input = json!({ "name": "Ada", "age": "36" });
//! let output = user.parse(&input).unwrap();
//! assert_eq!(output.into_owned(), json!({ "name": "Ada", "age": 36 }));
//!
//! // Failures carry a location marker for every level they pass through.
//! let err = user.parse(&json!({ "name": "Ada", "age": -1 })).unwrap_err();
//! assert_eq!(err.message(), "Field age: Number must be greater than or equal to 0");
//!
//! // Batches can stop at the first failure, or report all of them.
//! let batch = vec![json!(1), json!("x"), json!(3), json!(null)];
//! let err = number().parse_bulk(&batch, &Config::new()).unwrap_err();
//! assert_eq!(
//!     err.errors(),
//!     &[
//!         "Index 1: Expected number, received string".to_owned(),
//!         "Index 3: Expected number, received null".to_owned(),
//!     ]
//! );
//! ```
//!
//! # Compiling schemas
//!
//! Checking a value with a [`Schema`](schema/struct.Schema.html) walks its
//! description every time. For hot paths,
//! [`Schema::compile`](schema/struct.Schema.html#method.compile) builds a
//! [`Compiled`](compiler/struct.Compiled.html) validator once and caches it
//! on the schema. Both give exactly the same answers.
//!
//! # Loading schemas from data
//!
//! [`SerdeSchema`](serde_schema/struct.SerdeSchema.html) is a
//! serde-friendly form of a schema, for schemas kept in configuration files.

mod primitive;
mod vm;

pub mod check;
pub mod compiler;
pub mod constraint;
pub mod errors;
pub mod messages;
pub mod parser;
pub mod schema;
pub mod serde_schema;

pub use crate::check::{Check, Validate};
pub use crate::compiler::{compile, Compiled};
pub use crate::constraint::{Constraint, Predicate};
pub use crate::errors::{BulkError, ParseError, SchemaError};
pub use crate::parser::{parse, parse_bulk, Batch, Config};
pub use crate::schema::{
    any, array, boolean, custom, date, discriminated_union, enumeration, literal, nullable,
    nullish, number, object, optional, refine, string, union, CustomCheck, Discriminant, Schema,
    Tag, UnknownKeys,
};
pub use crate::serde_schema::SerdeSchema;
