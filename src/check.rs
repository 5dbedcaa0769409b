//! The three-outcome result every check function returns.

use serde_json::Value;

/// The outcome of checking one value against one schema.
///
/// `Accept` promises that the input is already well-typed and will be handed
/// back to the caller untouched. `Reject` carries a final, fully resolved
/// message. `AcceptCoerced` carries a replacement value that satisfies the
/// schema and needs no further coercion downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Accept,
    Reject(String),
    AcceptCoerced(Value),
}

impl Check {
    pub fn is_accept(&self) -> bool {
        !self.is_reject()
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Check::Reject(_))
    }

    /// The value a follow-up check should look at: the coerced value if there
    /// is one, otherwise the original input.
    ///
    /// Returns `None` on `Reject`, or when the original input was absent.
    pub fn effective<'a>(&'a self, original: Option<&'a Value>) -> Option<&'a Value> {
        match self {
            Check::Accept => original,
            Check::AcceptCoerced(value) => Some(value),
            Check::Reject(_) => None,
        }
    }
}

/// Anything that can run the check protocol against an optional value.
///
/// Implemented by [`Schema`](../schema/struct.Schema.html) (tree
/// interpretation) and [`Compiled`](../compiler/struct.Compiled.html) (the
/// specialized closure tree). Both must produce identical outcomes.
pub trait Validate {
    /// Check a value. `None` stands for an absent value (for example a
    /// missing object field).
    fn check(&self, value: Option<&Value>) -> Check;
}

impl<T: Validate + ?Sized> Validate for &T {
    fn check(&self, value: Option<&Value>) -> Check {
        (**self).check(value)
    }
}

impl<T: Validate + ?Sized> Validate for std::sync::Arc<T> {
    fn check(&self, value: Option<&Value>) -> Check {
        (**self).check(value)
    }
}
