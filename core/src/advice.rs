//! Advice payloads and the interception seam.
//!
//! Advice is opaque to the matching core: it only needs a kind (for
//! diagnostics) and an optional order. The [`MethodInterceptor`] and
//! [`MethodInvocation`] traits are the seam the introduction interceptor
//! forwards through; building full interceptor chains is left to the proxy
//! layer.

use crate::{AopError, Method, TypeInfo, Value};
use std::any::Any;
use std::fmt::{self, Debug};

/// An error raised by a target or delegate, passed through unchanged.
pub type Thrown = Box<dyn std::error::Error + Send + Sync>;

/// What the advice does when its pointcut matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AdviceKind {
    /// Runs before the call.
    Before,
    /// Runs after a normal return.
    AfterReturning,
    /// Runs after the call fails.
    AfterThrowing,
    /// Wraps the call.
    Around,
    /// Adds interfaces to the proxy.
    Introduction,
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Before => "before",
            Self::AfterReturning => "after-returning",
            Self::AfterThrowing => "after-throwing",
            Self::Around => "around",
            Self::Introduction => "introduction",
        };
        f.write_str(s)
    }
}

/// Behavior bound into an [`Advisor`](crate::Advisor).
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Advice`",
    label = "this type cannot be used as advice",
    note = "implement `kind(&self) -> AdviceKind` and `as_any(&self) -> &dyn Any`"
)]
pub trait Advice: Send + Sync + Debug {
    /// What this advice does.
    fn kind(&self) -> AdviceKind;

    /// Ordering hint; lower runs first. `None` means lowest precedence.
    fn order(&self) -> Option<i32> {
        None
    }

    /// Downcasting hook for the proxy layer.
    fn as_any(&self) -> &dyn Any;
}

/// Failure of a reflective-style invocation.
///
/// [`into_thrown`](Self::into_thrown) is the explicit unwrap step: a target
/// failure becomes the target's own error, unchanged.
#[derive(Debug, thiserror::Error)]
pub enum InvocationFailure {
    /// The invoked code itself failed.
    #[error("invocation target failed: {0}")]
    Target(Thrown),

    /// The receiver has no such method.
    #[error("no method {0} on the receiver")]
    NoSuchMethod(Method),
}

impl InvocationFailure {
    /// Unwrap into the error the caller should see.
    #[must_use]
    pub fn into_thrown(self) -> Thrown {
        match self {
            Self::Target(thrown) => thrown,
            Self::NoSuchMethod(method) => Box::new(AopError::NoSuchMethod {
                type_name: method.declaring_type().to_owned(),
                name: method.name().to_owned(),
                parameter_types: method.parameter_types().to_vec(),
            }),
        }
    }
}

/// One in-flight call as seen by an interceptor.
pub trait MethodInvocation {
    /// The method being called.
    fn method(&self) -> &Method;

    /// The call's arguments.
    fn arguments(&self) -> &[Value];

    /// The proxied target's type.
    fn target_type(&self) -> &TypeInfo;

    /// Continue down the chain toward the target.
    ///
    /// # Errors
    ///
    /// Whatever the rest of the chain or the target raises.
    fn proceed(&mut self) -> Result<Value, Thrown>;
}

/// Around-style interceptor.
pub trait MethodInterceptor: Send + Sync + Debug {
    /// Handle `invocation`, usually by calling `proceed` at some point.
    ///
    /// # Errors
    ///
    /// Whatever the interceptor or the rest of the chain raises.
    fn invoke(&self, invocation: &mut dyn MethodInvocation) -> Result<Value, Thrown>;
}
