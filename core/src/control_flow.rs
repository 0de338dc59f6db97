//! Control-flow matching: "is there an active call to T (or T.m) on this thread?"
//!
//! Rust has no reflective stack walk, so the interception layer records its
//! own frames: [`CallStack::enter`] pushes a frame for the current thread and
//! returns a [`FrameGuard`] that pops it on drop. [`ControlFlowMatcher`] takes
//! a fresh [`ControlFlow`] snapshot on every dynamic evaluation.
//!
//! # Cost
//!
//! An order of magnitude more expensive than other matchers: every candidate
//! evaluation copies the thread's stack. Combine with cheaper pointcuts via
//! intersection so the snapshot only runs when everything else has accepted.

use crate::{Method, MethodMatcher, TypeInfo, Value};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

thread_local! {
    static STACK: RefCell<Vec<CallFrame>> = const { RefCell::new(Vec::new()) };
}

/// One active call: the type it was invoked on and the method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    type_name: Arc<str>,
    method_name: Arc<str>,
}

impl CallFrame {
    /// The type the call was made on.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The method being executed.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    fn token(&self) -> String {
        format!("{}.{}", self.type_name, self.method_name)
    }
}

/// The calling thread's invocation stack.
#[derive(Debug, Clone, Copy)]
pub struct CallStack;

impl CallStack {
    /// Record entry into `type_name.method_name` on this thread.
    ///
    /// The frame is popped when the returned guard drops.
    #[must_use = "the frame is popped as soon as the guard is dropped"]
    pub fn enter(type_name: &str, method_name: &str) -> FrameGuard {
        let type_name: Arc<str> = Arc::from(type_name);
        let depth = STACK.with_borrow_mut(|s| {
            s.push(CallFrame {
                type_name: Arc::clone(&type_name),
                method_name: Arc::from(method_name),
            });
            s.len() - 1
        });
        FrameGuard {
            depth,
            type_name,
            _not_send: PhantomData,
        }
    }

    /// A copy of this thread's active frames, innermost last.
    #[must_use]
    pub fn snapshot() -> ControlFlow {
        ControlFlow {
            frames: STACK.with_borrow(Clone::clone),
        }
    }

    /// Number of active frames on this thread.
    #[must_use]
    pub fn depth() -> usize {
        STACK.with_borrow(Vec::len)
    }
}

/// Pops its frame when dropped.
///
/// Dropping a guard also pops every frame pushed after its own, so guards
/// dropped out of order never leave an ended call on the stack. A guard whose
/// frame is already gone does nothing.
///
/// `!Send`: a frame must be popped on the thread that pushed it.
#[derive(Debug)]
pub struct FrameGuard {
    depth: usize,
    type_name: Arc<str>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        STACK.with_borrow_mut(|s| {
            let ours = s
                .get(self.depth)
                .is_some_and(|f| Arc::ptr_eq(&f.type_name, &self.type_name));
            if ours {
                s.truncate(self.depth);
            }
        });
    }
}

/// Point-in-time view of a thread's call stack.
#[derive(Debug, Clone, Default)]
pub struct ControlFlow {
    frames: Vec<CallFrame>,
}

impl ControlFlow {
    /// Is any frame a call on `type_name`?
    #[must_use]
    pub fn under_type(&self, type_name: &str) -> bool {
        self.frames.iter().any(|f| f.type_name() == type_name)
    }

    /// Is any frame a call to `type_name.method_name`?
    #[must_use]
    pub fn under_method(&self, type_name: &str, method_name: &str) -> bool {
        self.frames
            .iter()
            .any(|f| f.type_name() == type_name && f.method_name() == method_name)
    }

    /// Does any frame's `Type.method` string contain `token`?
    #[must_use]
    pub fn under_token(&self, token: &str) -> bool {
        self.frames.iter().any(|f| f.token().contains(token))
    }

    /// The captured frames, innermost last.
    #[must_use]
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }
}

/// Runtime matcher that accepts calls made beneath a given type or method.
///
/// Unrelated type or method names simply never match.
///
/// # Example
///
/// ```
/// use weft::{CallStack, ControlFlowMatcher, Method, MethodMatcher, TypeInfo};
///
/// let m = ControlFlowMatcher::new("app.Batch").with_method("run");
/// let ty = TypeInfo::class("app.Repo").build();
/// let save = Method::new("app.Repo", "save", &[]);
///
/// assert!(!m.matches_dynamic(&save, &ty, &[]));
/// let _frame = CallStack::enter("app.Batch", "run");
/// assert!(m.matches_dynamic(&save, &ty, &[]));
/// assert_eq!(m.evaluation_count(), 2);
/// ```
#[derive(Debug)]
pub struct ControlFlowMatcher {
    type_name: String,
    method_name: Option<String>,
    evaluations: AtomicUsize,
}

impl ControlFlowMatcher {
    /// Match calls made anywhere beneath a call on `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            method_name: None,
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Narrow to calls beneath `type_name.method_name`.
    #[must_use]
    pub fn with_method(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    /// The type this matcher looks for.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The method this matcher looks for, if narrowed.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// How many dynamic evaluations have run.
    #[must_use]
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl MethodMatcher for ControlFlowMatcher {
    fn matches_static(&self, _method: &Method, _target: &TypeInfo) -> bool {
        true
    }

    fn is_runtime(&self) -> bool {
        true
    }

    fn matches_dynamic(&self, method: &Method, _target: &TypeInfo, _args: &[Value]) -> bool {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let flow = CallStack::snapshot();
        let matched = match &self.method_name {
            Some(name) => flow.under_method(&self.type_name, name),
            None => flow.under_type(&self.type_name),
        };
        tracing::trace!(
            method = %method,
            under = %self.type_name,
            depth = flow.frames().len(),
            matched,
            "control flow evaluated"
        );
        matched
    }
}
