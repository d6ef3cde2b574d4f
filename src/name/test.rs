use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;

use super::fake::FakeEncoder;
use super::{InitGuard, InitState, Resolver};
use crate::error::Error;

const THREADS: usize = 8;

#[test]
fn test_guard_runs_init_once() {
    let guard = InitGuard::new();
    let runs = AtomicUsize::new(0);
    let barrier = Barrier::new(THREADS);

    let states: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    guard.ensure(|| {
                        runs.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(20));
                        true
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(states.iter().all(|it| *it == InitState::Succeeded));
    assert_eq!(guard.state(), InitState::Succeeded);
}

#[test]
fn test_guard_failure_is_permanent() {
    let guard = InitGuard::new();
    assert_eq!(guard.state(), InitState::Uninitialized);

    assert_eq!(guard.ensure(|| false), InitState::Failed);
    // A later caller would succeed, but is never asked.
    assert_eq!(guard.ensure(|| unreachable!()), InitState::Failed);
}

#[test]
fn test_guard_publishes_failure_on_panic() {
    let guard = InitGuard::new();

    let res = catch_unwind(AssertUnwindSafe(|| guard.ensure(|| panic!("init"))));
    assert!(res.is_err());
    assert_eq!(guard.state(), InitState::Failed);
}

#[test]
fn test_resolver_concurrent_first_use() {
    let resolver = Resolver::new(FakeEncoder::new());
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                resolver.ensure_initialized().unwrap();
            });
        }
    });

    assert_eq!(resolver.encoder().inits(), 1);
    assert_eq!(resolver.state(), InitState::Succeeded);
}

#[test]
fn test_resolver_broken_encoder() {
    let resolver = Resolver::new(FakeEncoder::broken());

    for _ in 0..3 {
        let err = resolver.translate("CYCLES").unwrap_err();
        assert!(matches!(err, Error::Uninitialized));
    }
    assert_eq!(resolver.encoder().inits(), 1);
    assert_eq!(resolver.encoder().encodes(), 0);
}

#[test]
fn test_translate() {
    let resolver = Resolver::new(FakeEncoder::new());

    let attr = resolver.translate("INST_RETIRED:ANY_P").unwrap();
    assert_eq!(attr.type_, 4);
    assert_eq!(attr.config, 0x00c0);
    assert_eq!(attr.size as usize, size_of::<crate::ffi::Attr>());
    assert_eq!(attr.exclude_kernel(), 1);
}

#[test]
fn test_translate_unknown_name() {
    let resolver = Resolver::new(FakeEncoder::new());

    let err = resolver.translate("NOT_AN_EVENT").unwrap_err();
    assert!(matches!(err, Error::Encode(name) if name == "NOT_AN_EVENT"));
}

#[test]
fn test_translate_interior_nul() {
    let resolver = Resolver::new(FakeEncoder::new());

    let err = resolver.translate("CYC\0LES").unwrap_err();
    assert!(matches!(err, Error::Encode(_)));
    assert_eq!(resolver.encoder().encodes(), 0);
}
