//! Performance benchmarks for the hostscript engine.
//!
//! - Phases: parsing alone, parse + resolve (`Engine::check`), full runs
//! - Workloads: the sample programs under test_scripts/
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- "engine/run"
//! ```

use bumpalo::Bump;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use hostscript::prelude::*;
use hostscript_parser::Parser;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

const SCRIPTS: [(&str, &str); 4] = [
    ("summation", include_str!("../test_scripts/summation.hs")),
    ("fibonacci", include_str!("../test_scripts/fibonacci.hs")),
    ("primes", include_str!("../test_scripts/primes.hs")),
    ("matrix", include_str!("../test_scripts/matrix.hs")),
];

/// An engine with silent versions of the test host bindings.
fn bench_engine(loop_max: i64) -> Engine {
    let engine = Engine::new();
    engine
        .register("LOOP_MAX", BoundVariable::constant("LOOP_MAX", loop_max))
        .unwrap();
    for ty in [ScriptType::Int, ScriptType::Float] {
        let sink = BoundFunction::builder("output")
            .param(ty)
            .native(|ctx| {
                black_box(ctx.arg_value(0)?);
                Ok(())
            })
            .build()
            .unwrap();
        engine.register("output", sink).unwrap();
    }
    engine
}

fn parse_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/parse");
    for (name, source) in SCRIPTS {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let arena = Bump::new();
                let script = Parser::parse(black_box(source), &arena).unwrap();
                black_box(script.stmts().len())
            });
        });
    }
    group.finish();
}

fn check_benchmarks(c: &mut Criterion) {
    let engine = bench_engine(100);
    let mut group = c.benchmark_group("engine/check");
    for (name, source) in SCRIPTS {
        group.bench_function(name, |b| {
            b.iter(|| engine.check(black_box(source)).unwrap());
        });
    }
    group.finish();
}

fn run_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let engine = bench_engine(1000);
    let mut group = c.benchmark_group("engine/run");
    for (name, source) in SCRIPTS {
        group.bench_function(name, |b| {
            b.iter(|| {
                let value = engine.run(black_box(source)).unwrap();
                end_profiling_frame();
                black_box(value)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, parse_benchmarks, check_benchmarks, run_benchmarks);
criterion_main!(benches);
