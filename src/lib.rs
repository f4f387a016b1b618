mod executor;
mod junit;
pub mod model;
pub mod prelude;
pub mod scenarios;
mod signal;
pub mod sim;
pub mod sim_if;
mod tb_obj;
pub mod test;
pub mod testbench;
mod trigger;
pub mod utils;
mod value;

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time;

use executor::Task;
use sim_if::SIM_IF;
use tb_obj::TbObjSafe;
use test::{TbTests, TestSummary};
use value::Val;

/// Result type of every test routine and forked bench task: `Ok` passes,
/// `Err` fails, either side carrying a message or payload.
pub type TbResult = Result<Val, Val>;

pub static CRATE_NAME: OnceCell<String> = OnceCell::new();

lazy_static! {
    static ref SIM_START_TIME: TbObjSafe<Option<time::Instant>> = TbObjSafe::new(None);
}
lazy_static! {
    static ref CURRENT_TEST: TbObjSafe<Option<(Arc<Task>, TbObjSafe<test::Test>)>> =
        TbObjSafe::new(None);
}

/// Pass the running test, unless it already passed or failed.
pub fn pass_test(msg: &str) {
    if let Some((task, test)) = CURRENT_TEST.get().take() {
        test.with_mut(|mut t| t.set_result(Ok(Val::String(msg.to_string()))));
        tear_down_test(task);
    }
}

/// Fail the running test, unless it already passed or failed.
pub fn fail_test(msg: &str) {
    if let Some((task, test)) = CURRENT_TEST.get().take() {
        test.with_mut(|mut t| t.set_result(Err(Val::String(msg.to_string()))));
        tear_down_test(task);
    }
}

fn tear_down_test(test_task: Arc<Task>) {
    // Outstanding triggers hold the wakers of every task the test forked
    // (its clock above all); cancelling them bounds those tasks to the
    // test's execution span.
    trigger::cancel_all_triggers();
    executor::clear_ready_queue();
    test_task.cancel();
}

pub(crate) fn clear_current_test() {
    let _ = CURRENT_TEST.get().take();
}

/// Schedule all tests in a chain and kick off the executor. Each test is
/// wrapped in a task that records its result and timing, then tears the
/// session down for the next one.
pub(crate) fn start_of_simulation(tests: &TbTests) {
    SIM_START_TIME.with_mut(|mut t| {
        let _ = t.replace(time::Instant::now());
    });

    let sim_root = signal::SimObject::get_root().unwrap();

    let mut join_handle: Option<executor::JoinHandle> = None;
    for test in tests.iter() {
        let test = test.clone();
        let prev = join_handle.take();
        join_handle = Some(Task::spawn_from_future(async move {
            // await the previous test, if there is one
            if let Some(handle) = prev {
                let _ = handle.await;
            }
            let test_inner = test.clone();
            let test_handle = Task::spawn_from_future(async move {
                let time_start = time::Instant::now();
                let sim_time_start = SIM_IF.get_sim_time("ns");
                let generator = test_inner.get().generator;
                // await test execution
                let result = (generator)(sim_root).await;

                test_inner.with_mut(|mut test| {
                    test.time_secs = time_start.elapsed().as_secs_f64();
                    test.sim_time_ns = SIM_IF.get_sim_time("ns") - sim_time_start;
                });
                match result {
                    Ok(val) => pass_test(&val.to_string()),
                    Err(val) => fail_test(&val.to_string()),
                }
                Ok(Val::None)
            });
            // publish the test task so pass_test/fail_test can find it
            let test_task = test_handle.task().unwrap().clone();
            CURRENT_TEST.with_mut(move |mut c| {
                let _ = c.replace((test_task, test));
            });
            // await test execution
            let _ = test_handle.await;
            Ok(Val::None)
        }));
    }

    // execute first simulation tick
    executor::run_once();
}

/// Collect per-test summaries, log the totals and print the result table.
pub(crate) fn end_of_simulation(tests: &TbTests) -> Vec<TestSummary> {
    let start = SIM_START_TIME.with_mut(|mut t| t.take());
    let duration = start.map(|s| s.elapsed().as_secs_f64()).unwrap_or(0.0);
    let final_sim_time = SIM_IF.get_sim_time("ns");

    let mut summaries = Vec::with_capacity(tests.len());
    for test in tests.iter() {
        let (name, result, time_secs, sim_time_ns) = test.with_mut(|t| {
            (t.name.clone(), t.result.clone(), t.time_secs, t.sim_time_ns)
        });
        let (passed, message) = match result {
            Some(Ok(val)) => (true, val.to_string()),
            Some(Err(val)) => (false, val.to_string()),
            None => (false, "Test did not run to completion".to_string()),
        };
        let sim_speed = match time_secs > 0.0 {
            true => sim_time_ns / time_secs,
            false => 0.0,
        };
        SIM_IF.log(&format!(
            "TEST {}: Result={}, Time={:.3}s, SimTime={}ns, SimSpeed={:.3}ns/s",
            name,
            match passed {
                true => "passed",
                false => "failed",
            },
            time_secs,
            sim_time_ns,
            sim_speed
        ));
        summaries.push(TestSummary {
            name,
            passed,
            message,
            time_secs,
            sim_time_ns,
        });
    }
    SIM_IF.log("TOTAL SIMULATION");
    SIM_IF.log(&format!("Simulation time: {} ns", final_sim_time));
    SIM_IF.log(&format!("Real time: {:.3} s", duration));
    if duration > 0.0 {
        SIM_IF.log(&format!(
            "Simulation speed: {:.3} ns/s",
            final_sim_time / duration
        ));
    }
    print_result_table(&summaries);
    summaries
}

fn print_result_table(summaries: &[TestSummary]) {
    use prettytable::{Cell, Row, Table};

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Test"),
        Cell::new("Result"),
        Cell::new("Time [s]"),
        Cell::new("SimTime [ns]"),
        Cell::new("Message"),
    ]));
    for s in summaries {
        table.add_row(Row::new(vec![
            Cell::new(&s.name),
            Cell::new(match s.passed {
                true => "passed",
                false => "FAILED",
            }),
            Cell::new(&format!("{:.3}", s.time_secs)),
            Cell::new(&format!("{}", s.sim_time_ns)),
            Cell::new(&s.message),
        ]));
    }
    table.printstd();
}
