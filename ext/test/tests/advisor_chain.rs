//! End-to-end: advisor config → applicability → ordering → dispatch.
//!
//! Run with: cargo test -p weft-test --test advisor_chain --features weft-test/registry

#![cfg(feature = "registry")]

use weft::{Advisor, AdvisorConfig, AopError, MethodInterceptor, Registry, RegistryBuilder};
use weft_test::prelude::*;

const ADVISORS: &str = r"
- kind: pointcut
  advice: audit
  order: 20
  pointcut:
    type: name_match
    names: ['bank.Account.*']
    type_filter: { type: subtype_of, name: bank.Account }
- kind: pointcut
  advice: tx
  pointcut:
    type: union
    pointcuts:
      - { type: setters }
      - { type: regex, patterns: ['.*\.post'] }
- kind: unconditional
  advice: trace
  per_instance: true
- kind: introduction
  delegate: lock
  interfaces: [bank.Lockable]
  suppress: [bank.Internal]
  type_filter: { type: subtype_of, name: bank.BasicAccount }
  order: 0
";

fn registry(bank: &Bank) -> Registry {
    weft_test::register(RegistryBuilder::new(), bank).build()
}

fn load(bank: &Bank, yaml: &str) -> Result<Vec<Advisor>, AopError> {
    let configs: Vec<AdvisorConfig> = serde_yaml::from_str(yaml).unwrap();
    registry(bank).load_advisors(&configs)
}

fn labels(advisors: &[Advisor]) -> Vec<String> {
    advisors
        .iter()
        .map(|a| TestAdvice::name_of(a).unwrap_or_else(|| a.advice().kind().to_string()))
        .collect()
}

fn introduction(advisors: &[Advisor]) -> &weft::IntroductionAdvisor {
    advisors
        .iter()
        .find_map(|a| match a {
            Advisor::Introduction(intro) => Some(intro),
            _ => None,
        })
        .expect("an introduction advisor")
}

#[test]
fn chain_for_an_account() {
    let bank = Bank::new();
    let advisors = load(&bank, ADVISORS).unwrap();

    let mut chain = find_applicable_advisors(&advisors, &bank.savings_account);
    assert_eq!(labels(&chain), ["audit", "tx", "trace", "introduction"]);

    let per_instance: Vec<bool> = chain.iter().map(Advisor::is_per_instance).collect();
    assert_eq!(per_instance, [false, false, true, true]);

    sort_by_order(&mut chain);
    // Explicit 0, advice-level 10, explicit 20, then unordered.
    assert_eq!(labels(&chain), ["introduction", "tx", "audit", "trace"]);
}

#[test]
fn chain_for_the_ledger() {
    let bank = Bank::new();
    let advisors = load(&bank, ADVISORS).unwrap();

    let mut chain = find_applicable_advisors(&advisors, &bank.ledger);
    sort_by_order(&mut chain);
    assert_eq!(labels(&chain), ["tx", "trace"]);
}

#[test]
fn per_call_decisions_follow_the_pointcut() {
    let bank = Bank::new();
    let advisors = load(&bank, ADVISORS).unwrap();
    let tx = advisors[1].pointcut().unwrap();

    let set_rate = bank.savings_account.find_method("setRate", &["i64"]).unwrap();
    let get_rate = bank.savings_account.find_method("getRate", &[]).unwrap();
    let post = bank.ledger.find_method("post", &["String", "i64"]).unwrap();
    assert!(tx.applies_to(set_rate, &bank.savings_account, &[Value::Int(2)]));
    assert!(!tx.applies_to(get_rate, &bank.savings_account, &[]));
    assert!(tx.applies_to(post, &bank.ledger, &["memo".into(), Value::Int(1)]));
}

#[test]
fn introduction_dispatches_to_the_delegate() {
    let bank = Bank::new();
    let advisors = load(&bank, ADVISORS).unwrap();
    let intro = introduction(&advisors);
    let names: Vec<&str> = intro.interfaces().iter().map(|i| i.name()).collect();
    assert_eq!(names, ["bank.Lockable"]);
    let interceptor = intro.interceptor();

    let lock = bank.lockable.find_method("lock", &["String"]).unwrap().clone();
    let is_locked = bank.lockable.find_method("isLocked", &[]).unwrap().clone();

    let mut call = RecordingInvocation::new(lock.clone(), &bank.savings_account, vec!["alice".into()]);
    assert_eq!(interceptor.invoke(&mut call).unwrap(), Value::Unit);
    assert_eq!(call.proceed_count(), 0);

    let mut query = RecordingInvocation::new(is_locked, &bank.savings_account, vec![]);
    assert_eq!(interceptor.invoke(&mut query).unwrap(), Value::Bool(true));

    // The delegate's own error reaches the caller unwrapped.
    let mut again = RecordingInvocation::new(lock, &bank.savings_account, vec!["bob".into()]);
    let err = interceptor.invoke(&mut again).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AlreadyLocked>(),
        Some(&AlreadyLocked {
            owner: "alice".into()
        })
    );
}

#[test]
fn non_introduced_calls_proceed() {
    let bank = Bank::new();
    let advisors = load(&bank, ADVISORS).unwrap();
    let interceptor = introduction(&advisors).interceptor();

    let deposit = bank.account.find_method("deposit", &["i64"]).unwrap().clone();
    let mut call = RecordingInvocation::new(deposit, &bank.savings_account, vec![Value::Int(5)])
        .returning(Value::Int(105));
    assert_eq!(interceptor.invoke(&mut call).unwrap(), Value::Int(105));
    assert_eq!(call.proceed_count(), 1);

    // Suppressed interfaces are not introduced either.
    let reset = bank.internal.find_method("reset", &[]).unwrap().clone();
    let mut call = RecordingInvocation::new(reset, &bank.savings_account, vec![]);
    interceptor.invoke(&mut call).unwrap();
    assert_eq!(call.proceed_count(), 1);
}

#[test]
fn load_errors_name_the_advisor() {
    let bank = Bank::new();
    let err = load(
        &bank,
        r"
- { kind: unconditional, advice: trace }
- kind: pointcut
  advice: audit
  pointcut: { type: regex, patterns: ['(unclosed'] }
",
    )
    .unwrap_err();
    assert_eq!(err.location(), Some("advisors[1], pointcut, patterns[0]"));

    let err = load(&bank, "- { kind: unconditional, advice: metrics }").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown advice \"metrics\"; registered: audit, trace, tx"
    );
}

#[test]
fn introducing_a_class_is_rejected() {
    let bank = Bank::new();
    let err = load(
        &bank,
        "- { kind: introduction, delegate: lock, interfaces: [bank.Ledger] }",
    )
    .unwrap_err();
    assert_eq!(
        err,
        AopError::NotAnInterface {
            name: "bank.Ledger".into()
        }
    );
}
