//! `Value`: Type-erased call arguments and return values
//!
//! Dynamic method matchers inspect the actual arguments of a call, and
//! introduced methods return a result to the caller. Both travel as [`Value`].
//!
//! # Extensibility via `Custom`
//!
//! For domain objects not covered by the primitives, implement
//! [`CustomValue`] and wrap in `Value::Custom(Arc::new(your_type))`.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// Extension trait for custom argument / return values.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::Arc;
/// use weft::{CustomValue, Value};
///
/// #[derive(Debug)]
/// struct Account {
///     id: u64,
/// }
///
/// impl CustomValue for Account {
///     fn custom_type_name(&self) -> &'static str {
///         "account"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let value = Value::Custom(Arc::new(Account { id: 7 }));
/// assert_eq!(value.type_name(), "account");
/// ```
pub trait CustomValue: Send + Sync + Debug {
    /// Human-readable type identifier, `snake_case` by convention.
    fn custom_type_name(&self) -> &'static str;

    /// Enables downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// The erased value passed to and returned from methods.
///
/// # Variants
///
/// - `Unit`: no value (a method returning nothing, or a null argument)
/// - `String`, `Int`, `Bool`, `Bytes`: primitives
/// - `Custom`: user-defined values implementing [`CustomValue`]
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Unit,

    /// String value.
    String(String),

    /// Integer value.
    Int(i64),

    /// Boolean value.
    Bool(bool),

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// Custom domain value.
    Custom(Arc<dyn CustomValue>),
}

// Custom values compare by Arc pointer (same allocation = equal).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unit, Self::Unit) => true,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Returns `true` if this is the `Unit` variant.
    #[inline]
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }

    /// Try to get the value as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a byte slice.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Try to get the inner [`CustomValue`].
    #[inline]
    #[must_use]
    pub fn as_custom(&self) -> Option<&dyn CustomValue> {
        match self {
            Self::Custom(c) => Some(c.as_ref()),
            _ => None,
        }
    }

    /// Short name of the variant (or the custom type name).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "bytes",
            Self::Custom(c) => c.custom_type_name(),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Unit, Into::into)
    }
}
