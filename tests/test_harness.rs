//! Shared host fixture for the integration tests.
//!
//! Provides an [`Engine`] with the bindings the sample scripts expect:
//! `LOOP_MAX`, `output(int)`, `output(float)` and `print(string)`, each
//! recording what the script passed in.

#![allow(dead_code)]

use hostscript::prelude::*;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Load a script from the test_scripts directory.
pub fn load_script(filename: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_scripts")
        .join(filename);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Route engine logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Host {
    pub engine: Engine,
    pub ints: Arc<Mutex<Vec<i64>>>,
    pub floats: Arc<Mutex<Vec<f64>>>,
    pub lines: Arc<Mutex<Vec<String>>>,
}

impl Host {
    pub fn new() -> Self {
        Self::with_loop_max(100)
    }

    pub fn with_loop_max(loop_max: i64) -> Self {
        init_tracing();
        let host = Self {
            engine: Engine::new(),
            ints: Arc::default(),
            floats: Arc::default(),
            lines: Arc::default(),
        };

        host.engine
            .register("LOOP_MAX", BoundVariable::constant("LOOP_MAX", loop_max))
            .unwrap();

        let ints = Arc::clone(&host.ints);
        host.engine
            .register("output(int)", recorder("output", ScriptType::Int, move |v| {
                ints.lock().unwrap().push(v.as_int().unwrap());
            }))
            .unwrap();

        let floats = Arc::clone(&host.floats);
        host.engine
            .register("output(float)", recorder("output", ScriptType::Float, move |v| {
                floats.lock().unwrap().push(v.as_float().unwrap());
            }))
            .unwrap();

        let lines = Arc::clone(&host.lines);
        host.engine
            .register("print(string)", recorder("print", ScriptType::String, move |v| {
                lines.lock().unwrap().push(v.as_str().unwrap().to_string());
            }))
            .unwrap();

        host
    }

    pub fn run(&self, source: &str) -> ScriptResult<Value> {
        self.engine.run(source)
    }

    pub fn run_file(&self, filename: &str) -> ScriptResult<Value> {
        self.engine.run(&load_script(filename))
    }

    pub fn ints(&self) -> Vec<i64> {
        self.ints.lock().unwrap().clone()
    }

    pub fn floats(&self) -> Vec<f64> {
        self.floats.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Number of host calls recorded so far.
    pub fn side_effects(&self) -> usize {
        self.ints.lock().unwrap().len() + self.floats.lock().unwrap().len() + self.lines.lock().unwrap().len()
    }
}

fn recorder(
    name: &str,
    ty: ScriptType,
    record: impl Fn(&Value) + Send + Sync + 'static,
) -> BoundFunction {
    BoundFunction::builder(name)
        .param(ty)
        .native(move |ctx| {
            record(ctx.arg_value(0)?);
            Ok(())
        })
        .build()
        .unwrap()
}
