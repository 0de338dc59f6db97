//! weft-test: Test domain for conformance testing
//!
//! Provides a small banking type model, named advice, an introduction
//! delegate, and a recording invocation for exercising weft end to end.
//!
//! # Example
//!
//! ```
//! use weft_test::prelude::*;
//!
//! let bank = Bank::new();
//! let deposit = bank.basic_account.find_method("deposit", &["i64"]).unwrap();
//! assert_eq!(deposit.identity(), "bank.Account.deposit");
//!
//! let audit = TestAdvice::before("audit");
//! assert_eq!(audit.name(), "audit");
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use weft::prelude::*;
use weft::{InvocationFailure, MethodInvocation, Thrown};

#[cfg(feature = "fixtures")]
pub mod fixture;

// ═══════════════════════════════════════════════════════════════════════════════
// Type model
// ═══════════════════════════════════════════════════════════════════════════════

/// A small banking domain.
///
/// ```text
/// bank.Account (interface)        bank.Lockable (interface)   bank.Internal (interface)
///   └─ bank.BasicAccount            └──────┬───────────────────────┘
///        └─ bank.SavingsAccount      bank.LockMixin
/// bank.Ledger
/// ```
#[derive(Debug, Clone)]
pub struct Bank {
    pub account: TypeRef,
    pub basic_account: TypeRef,
    pub savings_account: TypeRef,
    pub ledger: TypeRef,
    pub lockable: TypeRef,
    pub internal: TypeRef,
    pub lock_mixin: TypeRef,
}

impl Bank {
    /// Build the domain.
    #[must_use]
    pub fn new() -> Self {
        let account = TypeInfo::interface("bank.Account")
            .method_returning("getBalance", &[], "i64")
            .method("deposit", &["i64"])
            .method("withdraw", &["i64"])
            .build();
        let basic_account = TypeInfo::class("bank.BasicAccount")
            .implements(&account)
            .method("setOwner", &["String"])
            .method_returning("getOwner", &[], "String")
            .build();
        let savings_account = TypeInfo::class("bank.SavingsAccount")
            .extends(&basic_account)
            .method("setRate", &["i64"])
            .method_returning("getRate", &[], "i64")
            .build();
        let ledger = TypeInfo::class("bank.Ledger")
            .method("post", &["String", "i64"])
            .method_returning("entries", &[], "i64")
            .build();
        let lockable = TypeInfo::interface("bank.Lockable")
            .method("lock", &["String"])
            .method("unlock", &[])
            .method_returning("isLocked", &[], "bool")
            .build();
        let internal = TypeInfo::interface("bank.Internal").method("reset", &[]).build();
        let lock_mixin = TypeInfo::class("bank.LockMixin")
            .implements(&lockable)
            .implements(&internal)
            .build();
        Self {
            account,
            basic_account,
            savings_account,
            ledger,
            lockable,
            internal,
            lock_mixin,
        }
    }

    /// Every type, for registering with a type registry.
    #[must_use]
    pub fn all(&self) -> Vec<TypeRef> {
        vec![
            Arc::clone(&self.account),
            Arc::clone(&self.basic_account),
            Arc::clone(&self.savings_account),
            Arc::clone(&self.ledger),
            Arc::clone(&self.lockable),
            Arc::clone(&self.internal),
            Arc::clone(&self.lock_mixin),
        ]
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Advice
// ═══════════════════════════════════════════════════════════════════════════════

/// Named advice payload with an optional own order.
#[derive(Debug, Clone)]
pub struct TestAdvice {
    name: String,
    kind: AdviceKind,
    order: Option<i32>,
}

impl TestAdvice {
    /// Create advice of `kind` named `name`.
    pub fn new(name: impl Into<String>, kind: AdviceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            order: None,
        }
    }

    /// Before advice named `name`.
    pub fn before(name: impl Into<String>) -> Self {
        Self::new(name, AdviceKind::Before)
    }

    /// Around advice named `name`.
    pub fn around(name: impl Into<String>) -> Self {
        Self::new(name, AdviceKind::Around)
    }

    /// Give the advice its own ordering hint.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// The advice name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the [`TestAdvice`] behind `advisor`, if it is one.
    #[must_use]
    pub fn name_of(advisor: &Advisor) -> Option<String> {
        advisor
            .advice()
            .as_any()
            .downcast_ref::<TestAdvice>()
            .map(|a| a.name.clone())
    }
}

impl Advice for TestAdvice {
    fn kind(&self) -> AdviceKind {
        self.kind
    }

    fn order(&self) -> Option<i32> {
        self.order
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Introduction delegate
// ═══════════════════════════════════════════════════════════════════════════════

/// Raised by [`LockMixin`] when locking an already locked object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("already locked by {owner}")]
pub struct AlreadyLocked {
    pub owner: String,
}

/// Delegate backing `bank.Lockable` (and the plumbing `bank.Internal`).
#[derive(Debug)]
pub struct LockMixin {
    ty: TypeRef,
    locked: AtomicBool,
    owner: Mutex<String>,
}

impl LockMixin {
    /// Create an unlocked mixin of type `bank.LockMixin`.
    #[must_use]
    pub fn new(bank: &Bank) -> Self {
        Self {
            ty: Arc::clone(&bank.lock_mixin),
            locked: AtomicBool::new(false),
            owner: Mutex::new(String::new()),
        }
    }
}

impl IntroductionDelegate for LockMixin {
    fn delegate_type(&self) -> &TypeRef {
        &self.ty
    }

    fn invoke(&self, method: &Method, args: &[Value]) -> Result<Value, InvocationFailure> {
        let mut owner = self
            .owner
            .lock()
            .map_err(|e| InvocationFailure::Target(e.to_string().into()))?;
        match method.name() {
            "lock" => {
                if self.locked.swap(true, Ordering::SeqCst) {
                    return Err(InvocationFailure::Target(Box::new(AlreadyLocked {
                        owner: owner.clone(),
                    })));
                }
                *owner = args.first().and_then(Value::as_str).unwrap_or_default().to_owned();
                Ok(Value::Unit)
            }
            "unlock" => {
                self.locked.store(false, Ordering::SeqCst);
                owner.clear();
                Ok(Value::Unit)
            }
            "isLocked" => Ok(Value::Bool(self.locked.load(Ordering::SeqCst))),
            "reset" => Ok(Value::Unit),
            _ => Err(InvocationFailure::NoSuchMethod(method.clone())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Invocation double
// ═══════════════════════════════════════════════════════════════════════════════

/// A call that records how often it proceeded to the target.
#[derive(Debug)]
pub struct RecordingInvocation {
    method: Method,
    args: Vec<Value>,
    target: TypeRef,
    result: Value,
    proceeded: AtomicUsize,
}

impl RecordingInvocation {
    /// A call to `method` on `target`; the target returns `Value::Unit`.
    #[must_use]
    pub fn new(method: Method, target: &TypeRef, args: Vec<Value>) -> Self {
        Self {
            method,
            args,
            target: Arc::clone(target),
            result: Value::Unit,
            proceeded: AtomicUsize::new(0),
        }
    }

    /// Set what the target returns.
    #[must_use]
    pub fn returning(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    /// How many times `proceed` ran.
    #[must_use]
    pub fn proceed_count(&self) -> usize {
        self.proceeded.load(Ordering::Relaxed)
    }
}

impl MethodInvocation for RecordingInvocation {
    fn method(&self) -> &Method {
        &self.method
    }

    fn arguments(&self) -> &[Value] {
        &self.args
    }

    fn target_type(&self) -> &TypeInfo {
        &self.target
    }

    fn proceed(&mut self) -> Result<Value, Thrown> {
        self.proceeded.fetch_add(1, Ordering::Relaxed);
        Ok(self.result.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry support (feature = "registry")
// ═══════════════════════════════════════════════════════════════════════════════

/// Register the bank domain: all types, advice `audit`/`tx`/`trace`, and the
/// `lock` delegate.
#[cfg(feature = "registry")]
#[must_use]
pub fn register(builder: weft::RegistryBuilder, bank: &Bank) -> weft::RegistryBuilder {
    builder
        .types(bank.all())
        .advice("audit", Arc::new(TestAdvice::before("audit")))
        .advice("tx", Arc::new(TestAdvice::around("tx").with_order(10)))
        .advice("trace", Arc::new(TestAdvice::before("trace")))
        .delegate("lock", Arc::new(LockMixin::new(bank)))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{AlreadyLocked, Bank, LockMixin, RecordingInvocation, TestAdvice};
    pub use weft::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft::{DelegatingIntroductionInterceptor, MethodInterceptor};

    #[test]
    fn inherited_methods_keep_declaring_type() {
        let bank = Bank::new();
        let deposit = bank.savings_account.find_method("deposit", &["i64"]).unwrap();
        assert_eq!(deposit.declaring_type(), "bank.Account");
        assert!(bank.savings_account.is_assignable_to("bank.Account"));
    }

    #[test]
    fn lock_mixin_raises_already_locked() {
        let bank = Bank::new();
        let mixin = LockMixin::new(&bank);
        let lock = Method::new("bank.Lockable", "lock", &["String"]);
        mixin.invoke(&lock, &["alice".into()]).unwrap();
        let err = mixin.invoke(&lock, &["bob".into()]).unwrap_err().into_thrown();
        assert_eq!(
            err.downcast_ref::<AlreadyLocked>(),
            Some(&AlreadyLocked {
                owner: "alice".into()
            })
        );
    }

    #[test]
    fn recording_invocation_counts_proceeds() {
        let bank = Bank::new();
        let interceptor =
            DelegatingIntroductionInterceptor::new(Arc::new(LockMixin::new(&bank)));
        let mut call = RecordingInvocation::new(
            Method::new("bank.Ledger", "post", &["String", "i64"]),
            &bank.ledger,
            vec!["memo".into(), Value::Int(3)],
        )
        .returning(Value::Bool(true));
        assert_eq!(interceptor.invoke(&mut call).unwrap(), Value::Bool(true));
        assert_eq!(call.proceed_count(), 1);
    }
}
