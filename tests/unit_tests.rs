//! End-to-end behaviour of the engine facade: registration, resolution and
//! execution observed through host bindings.

mod test_harness;

use hostscript::prelude::*;
use hostscript::{BoundHandle, ParseErrorKind, ResolveError, RuntimeError};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use test_harness::Host;

// =============================================================================
// Summation scenario
// =============================================================================

#[test]
fn test_summation_calls_output_once() {
    let host = Host::new();
    host.run_file("summation.hs").unwrap();
    assert_eq!(host.ints(), vec![5050]);
}

#[test]
fn test_summation_follows_bound_limit() {
    let host = Host::with_loop_max(10);
    host.run_file("summation.hs").unwrap();
    assert_eq!(host.ints(), vec![55]);
}

#[test]
fn test_reruns_are_deterministic() {
    let host = Host::new();
    let source = "int acc = 7; for (int i = 0; i < LOOP_MAX; i++) { acc = (acc * 31 + i) % 1000; } acc;";
    let first = host.run(source).unwrap();
    for _ in 0..5 {
        assert_eq!(host.run(source).unwrap(), first);
    }
}

#[test]
fn test_each_run_gets_fresh_globals() {
    let host = Host::new();
    let source = "int count; count++; output(count);";
    host.run(source).unwrap();
    host.run(source).unwrap();
    assert_eq!(host.ints(), vec![1, 1]);
}

// =============================================================================
// Overloads
// =============================================================================

#[test]
fn test_overloads_dispatch_on_argument_types() {
    let host = Host::new();
    host.run("output(3); output(2.5); output(LOOP_MAX / 4);").unwrap();
    assert_eq!(host.ints(), vec![3, 25]);
    assert_eq!(host.floats(), vec![2.5]);
}

#[test]
fn test_no_matching_overload_is_unresolved() {
    let host = Host::new();
    let err = host.run("output(true);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedSymbol);
    assert!(matches!(err.resolve_error(), Some(ResolveError::NoMatchingOverload { .. })));
}

#[test]
fn test_equal_promotion_is_ambiguous() {
    let host = Host::new();
    let pair = |params: [ScriptType; 2]| {
        BoundFunction::builder("pair")
            .params(params.to_vec())
            .native(|_| Ok(()))
            .build()
            .unwrap()
    };
    host.engine.register("pair(int, float)", pair([ScriptType::Int, ScriptType::Float])).unwrap();
    host.engine.register("pair(float, int)", pair([ScriptType::Float, ScriptType::Int])).unwrap();

    host.run("pair(1, 2.0); pair(1.0, 2);").unwrap();

    let err = host.run("output(1); pair(1, 2);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousOverload);
    match err.resolve_error() {
        Some(ResolveError::AmbiguousOverload { candidates, .. }) => assert_eq!(candidates.len(), 2),
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert!(host.ints().is_empty(), "nothing may run when resolution fails");
}

#[test]
fn test_exact_match_beats_promotion() {
    let host = Host::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    for ty in [ScriptType::Int, ScriptType::Float] {
        let seen = Arc::clone(&seen);
        let label = ty.to_string();
        let f = BoundFunction::builder("which")
            .params(vec![ty.clone(), ty])
            .native(move |_| {
                seen.lock().unwrap().push(label.clone());
                Ok(())
            })
            .build()
            .unwrap();
        host.engine.register("which", f).unwrap();
    }
    host.run("which(1, 2); which(1.0, 2); which(1.5, 2.5);").unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["int", "float", "float"]);
}

// =============================================================================
// Namespaces
// =============================================================================

struct Physics {
    gravity: RwLock<f64>,
    steps: AtomicI64,
}

impl HostObject for Physics {
    fn bind_members(binder: &mut MemberBinder<Self>) {
        binder
            .variable_mut(
                "gravity",
                |p: &Physics| *p.gravity.read().unwrap(),
                |p: &Physics, g: f64| *p.gravity.write().unwrap() = g,
            )
            .variable("steps", |p: &Physics| p.steps.load(Ordering::SeqCst))
            .function("void step(int)", |p, ctx| {
                let n: i64 = ctx.arg(0)?;
                p.steps.fetch_add(n, Ordering::SeqCst);
                Ok(())
            });
    }
}

fn physics() -> Arc<Physics> {
    Arc::new(Physics {
        gravity: RwLock::new(9.8),
        steps: AtomicI64::new(0),
    })
}

#[test]
fn test_namespace_binds_qualified_and_bare_names() {
    let host = Host::new();
    let world = physics();
    let skipped = host.engine.register_namespace("World", &world).unwrap();
    assert!(skipped.is_empty());

    host.run("World.step(2); step(3); World.gravity = 1.5; output(gravity); output(World.steps);")
        .unwrap();
    assert_eq!(world.steps.load(Ordering::SeqCst), 5);
    assert_eq!(host.floats(), vec![1.5]);
    assert_eq!(host.ints(), vec![5]);
}

#[test]
fn test_failed_namespace_registration_binds_nothing() {
    let host = Host::new();
    host.engine.register("W.b", BoundVariable::constant("b", 1i64)).unwrap();
    let noop = |name: &str| BoundFunction::builder(name).native(|_| Ok(())).build().unwrap();

    let handles: Vec<BoundHandle> = vec![noop("a").into(), noop("b").into()];
    let err = host.engine.register_namespace_handles("W", handles).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Registration);

    assert_eq!(host.run("a();").unwrap_err().kind(), ErrorKind::UnresolvedSymbol);
    assert_eq!(host.run("W.a();").unwrap_err().kind(), ErrorKind::UnresolvedSymbol);
    assert_eq!(host.run("W.b;").unwrap(), Value::Int(1));
}

#[test]
fn test_first_namespace_keeps_bare_name() {
    let host = Host::new();
    let first = physics();
    let second = physics();
    host.engine.register_namespace("A", &first).unwrap();
    let skipped = host.engine.register_namespace("B", &second).unwrap();
    assert_eq!(skipped.len(), 3);

    host.run("step(1); B.step(10);").unwrap();
    assert_eq!(first.steps.load(Ordering::SeqCst), 1);
    assert_eq!(second.steps.load(Ordering::SeqCst), 10);
}

#[test]
fn test_namespace_does_not_own_object() {
    let host = Host::new();
    let world = physics();
    host.engine.register_namespace("World", &world).unwrap();
    assert_eq!(Arc::strong_count(&world), 1);

    drop(world);
    let err = host.run("World.step(1);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostInvocation);
    match err.runtime_error() {
        Some(RuntimeError::HostInvocation { name, cause }) => {
            assert_eq!(name, "step");
            assert!(matches!(cause, NativeError::OwnerDropped { .. }));
        }
        other => panic!("expected host invocation error, got {other:?}"),
    }
}

// =============================================================================
// Failures before execution
// =============================================================================

#[test]
fn test_unregistered_identifier_has_no_side_effects() {
    let host = Host::new();
    let err = host.run("output(1); output(missing);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedSymbol);
    assert_eq!(err.script_name(), Some("main script"));
    assert_eq!(host.side_effects(), 0);
}

#[test]
fn test_unbalanced_braces_are_a_syntax_error() {
    let host = Host::new();
    let err = host
        .run("int sum = 0; for (int i = 0; i < 3; i++) { output(i); sum += i;")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    let first = err.parse_errors().and_then(|e| e.first()).unwrap();
    assert_eq!(first.kind, ParseErrorKind::ExpectedToken);
    assert!(first.message.contains("expected"), "{}", first.message);
    assert_eq!(host.side_effects(), 0);
}

#[test]
fn test_pathological_nesting_is_a_syntax_error() {
    let host = Host::new();
    let open = "(".repeat(100_000);
    let close = ")".repeat(100_000);

    let err = host.run(&format!("int x = {open}1{close};")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    let first = err.parse_errors().and_then(|e| e.first()).unwrap();
    assert_eq!(first.kind, ParseErrorKind::NestingTooDeep);

    let err = host.run(&format!("output(1); {open}1;")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);

    let blocks = format!("{}{}", "{".repeat(50_000), "}".repeat(50_000));
    assert_eq!(host.run(&blocks).unwrap_err().kind(), ErrorKind::Syntax);
    assert_eq!(host.side_effects(), 0);
}

#[test]
fn test_long_operator_chain_is_rejected_before_running() {
    let host = Host::new();
    let source = format!("output(1); int total = 0{};", " + 1".repeat(100_000));
    let err = host.run(&source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert!(matches!(err.resolve_error(), Some(ResolveError::NestingTooDeep { .. })));
    assert_eq!(host.side_effects(), 0);
}

#[test]
fn test_type_mismatch_is_reported() {
    let host = Host::new();
    let err = host.run("int x = \"text\";").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_read_only_binding_rejected_before_running() {
    let host = Host::new();
    let err = host.run("output(1); LOOP_MAX = 5;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(matches!(err.resolve_error(), Some(ResolveError::ReadOnlyBinding { .. })));
    assert_eq!(host.side_effects(), 0);
}

// =============================================================================
// Failures during execution
// =============================================================================

#[test]
fn test_runtime_fault_keeps_earlier_side_effects() {
    let host = Host::new();
    let err = host.run("int zero = 0; output(1); output(1 / zero); output(2);").unwrap_err();
    assert!(matches!(err.runtime_error(), Some(RuntimeError::DivisionByZero { .. })));
    assert_eq!(host.ints(), vec![1]);
}

#[test]
fn test_oversized_array_is_a_runtime_error() {
    let host = Host::new();
    let err = host.run("output(1); int a[1000000000000000000]; output(2);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert!(matches!(err.runtime_error(), Some(RuntimeError::ArrayTooLarge { .. })));
    assert_eq!(host.ints(), vec![1]);
}

#[test]
fn test_host_fault_is_wrapped_with_cause() {
    let host = Host::new();
    let fail = BoundFunction::builder("explode")
        .native(|_| Err(NativeError::host("disk full")))
        .build()
        .unwrap();
    host.engine.register("explode()", fail).unwrap();

    let err = host.run("output(1); explode(); output(2);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostInvocation);
    assert_eq!(err.to_string(), "host invocation of 'explode' failed: disk full");
    assert_eq!(host.ints(), vec![1]);
}

#[test]
fn test_deep_recursion_with_default_options() {
    let host = Host::new();
    let down = "int down(int n) { if (n == 0) return 0; return down(n - 1) + 0; } down(1000);";
    assert_eq!(host.run(down).unwrap(), Value::Int(0));

    let err = host.run("int deeper(int n) { return deeper(n + 1); } deeper(0);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StackOverflow);
    assert_eq!(
        err.runtime_error(),
        Some(&RuntimeError::StackOverflow {
            depth: EngineOptions::default().max_call_depth
        })
    );
}

#[test]
fn test_unbounded_recursion_overflows() {
    let host = Host::new();
    host.engine.set_option(EngineOption::MaxCallDepth(32));
    let err = host.run("int deeper(int n) { return deeper(n + 1); } deeper(0);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StackOverflow);
    assert_eq!(err.runtime_error(), Some(&RuntimeError::StackOverflow { depth: 32 }));
}

// =============================================================================
// Bound variables
// =============================================================================

#[test]
fn test_host_cell_is_written_through() {
    let host = Host::new();
    let total = Arc::new(RwLock::new(0i64));
    host.engine.register("total", BoundVariable::from_cell("total", &total)).unwrap();

    host.run("for (int i = 1; i <= 4; i++) total += i;").unwrap();
    assert_eq!(*total.read().unwrap(), 10);

    *total.write().unwrap() = 100;
    host.run("output(total);").unwrap();
    assert_eq!(host.ints(), vec![100]);
}

#[test]
fn test_unregister_removes_binding() {
    let host = Host::new();
    assert!(host.engine.unregister("LOOP_MAX").unwrap());
    assert!(!host.engine.unregister("LOOP_MAX").unwrap());
    let err = host.run("output(LOOP_MAX);").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnresolvedSymbol);

    host.engine.disconnect_all().unwrap();
    assert_eq!(host.run("output(1);").unwrap_err().kind(), ErrorKind::UnresolvedSymbol);
}
