use futures::future::BoxFuture;

use crate::signal::SimObject;
use crate::tb_obj::TbObjSafe;
use crate::TbResult;

/// A named test routine. The generator is handed the DUT toplevel and
/// returns the scenario future.
#[derive(Debug)]
pub struct Test {
    pub name: String,
    pub generator: fn(SimObject) -> BoxFuture<'static, TbResult>,
    pub result: Option<TbResult>,
    pub time_secs: f64,
    pub sim_time_ns: f64,
}

impl Test {
    pub fn new(name: String, generator: fn(SimObject) -> BoxFuture<'static, TbResult>) -> Self {
        Self {
            name,
            generator,
            result: None,
            time_secs: 0.0,
            sim_time_ns: 0.0,
        }
    }
    pub fn set_result(&mut self, result: TbResult) {
        self.result = Some(result);
    }
}

pub struct TbTests(Vec<TbObjSafe<Test>>);

impl TbTests {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> core::slice::Iter<'_, TbObjSafe<Test>> {
        self.0.iter()
    }
    pub fn push(&mut self, test: Test) {
        self.0.push(TbObjSafe::new(test));
    }
}

/// Flattened per-test outcome handed back to callers once the simulation
/// has finished.
#[derive(Debug, Clone)]
pub struct TestSummary {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub time_secs: f64,
    pub sim_time_ns: f64,
}
