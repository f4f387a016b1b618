//! In-process behavioral backend.
//!
//! Hosts the simulation when no external simulator process exists: a fixed
//! tile pinout, an absolute-time timer set, per-signal edge watches and the
//! read-write/read-only phase callbacks, all driven by a small event loop
//! that settles a [`TileModel`](crate::model::TileModel) between phases.

use lazy_static::lazy_static;
use log::info;
use num_format::{Locale, ToFormattedString};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::executor;
use crate::model::{TileIo, TileModel};
use crate::signal::{ObjectKind, SimObject};
use crate::sim_if::{SimCallback, SimError, SimIf, SimpleResult};
use crate::tb_obj::TbObjSafe;
use crate::test::{TbTests, TestSummary};
use crate::trigger::{self, EdgeKind};

// Fixed pinout of the tile toplevel. Handle 0 is the toplevel itself,
// pins follow in declaration order.
const PINS: [(&str, i32); 7] = [
    ("clk", 1),
    ("rst_n", 1),
    ("ena", 1),
    ("ui_in", 8),
    ("uio_in", 8),
    ("uo_out", 8),
    ("uio_out", 8),
];
const N_OBJ: usize = PINS.len() + 1;

const CLK: usize = 1;
const RST_N: usize = 2;
const ENA: usize = 3;
const UI_IN: usize = 4;
const UIO_IN: usize = 5;
const UO_OUT: usize = 6;
const UIO_OUT: usize = 7;

enum CbKind {
    Time(u64),
    Edge(usize),
    Rw,
    Ro,
}

struct SimState {
    time: u64,
    values: [u32; N_OBJ],
    widths: [i32; N_OBJ],
    names: Vec<String>,
    by_name: HashMap<String, usize>,
    model: Option<Box<dyn TileModel>>,
    // key is absolute fire time, value the callback handle
    timers: BTreeMap<u64, usize>,
    // per-signal edge watch: (callback handle, last seen value)
    watches: [Option<(usize, u64)>; N_OBJ],
    rw: Option<usize>,
    ro: Option<usize>,
    cb_index: HashMap<usize, CbKind>,
    next_cb_hdl: usize,
}

impl SimState {
    fn empty() -> Self {
        SimState {
            time: 0,
            values: [0; N_OBJ],
            widths: [0; N_OBJ],
            names: Vec::new(),
            by_name: HashMap::new(),
            model: None,
            timers: BTreeMap::new(),
            watches: [None; N_OBJ],
            rw: None,
            ro: None,
            cb_index: HashMap::new(),
            next_cb_hdl: 1,
        }
    }

    fn install(model: Box<dyn TileModel>) -> Self {
        let mut state = SimState::empty();
        let root = model.name().to_string();
        state.names.push(root.clone());
        state.by_name.insert(root.clone(), 0);
        for (i, (pin, width)) in PINS.iter().enumerate() {
            let full_name = format!("{}.{}", root, pin);
            state.by_name.insert(full_name.clone(), i + 1);
            state.names.push(full_name);
            state.widths[i + 1] = *width;
        }
        state.model = Some(model);
        state
    }

    fn new_cb_hdl(&mut self) -> usize {
        let hdl = self.next_cb_hdl;
        self.next_cb_hdl += 1;
        hdl
    }

    /// Settle the model against the current pin values and diff all
    /// watched signals. Returns the edge events to dispatch as
    /// (signal handle, callback handle, edge kind).
    fn eval_once(&mut self) -> Vec<(usize, usize, EdgeKind)> {
        let mut io = TileIo {
            clk: self.values[CLK] as u8,
            rst_n: self.values[RST_N] as u8,
            ena: self.values[ENA] as u8,
            ui_in: self.values[UI_IN] as u8,
            uio_in: self.values[UIO_IN] as u8,
            uo_out: self.values[UO_OUT] as u8,
            uio_out: self.values[UIO_OUT] as u8,
        };
        if let Some(model) = self.model.as_mut() {
            model.eval(&mut io);
        }
        self.values[UO_OUT] = io.uo_out as u32;
        self.values[UIO_OUT] = io.uio_out as u32;

        let mut events = Vec::new();
        for hdl in 1..N_OBJ {
            if let Some((cb_hdl, last)) = self.watches[hdl] {
                let current = self.values[hdl] as u64;
                if current != last {
                    let kind = match (last, current) {
                        (0, 1) => EdgeKind::Rising,
                        (1, 0) => EdgeKind::Falling,
                        _ => EdgeKind::Any,
                    };
                    self.watches[hdl] = Some((cb_hdl, current));
                    events.push((hdl, cb_hdl, kind));
                }
            }
        }
        events
    }
}

lazy_static! {
    static ref STATE: TbObjSafe<SimState> = TbObjSafe::new(SimState::empty());
}
lazy_static! {
    static ref RUN_LOCK: Mutex<()> = Mutex::new(());
}

pub(crate) struct Bhv;

impl Bhv {
    pub(crate) fn new() -> Self {
        Bhv
    }
}

impl SimIf for Bhv {
    fn set_value(&self, obj: &SimObject, value: u32) -> SimpleResult<()> {
        let width = match obj.kind() {
            ObjectKind::Int(width) => width,
            ObjectKind::Hier => return Err(SimError::NotAValue(obj.name())),
        };
        let mask = if width >= 32 {
            u32::MAX
        } else {
            (1u32 << width) - 1
        };
        STATE.with_mut(|mut s| {
            if obj.handle() == 0 || obj.handle() >= N_OBJ {
                return Err(SimError::BadHandle(obj.handle()));
            }
            s.values[obj.handle()] = value & mask;
            Ok(())
        })
    }

    fn get_value(&self, obj: &SimObject) -> SimpleResult<u32> {
        STATE.with_mut(|s| {
            if obj.handle() == 0 || obj.handle() >= N_OBJ {
                return Err(SimError::BadHandle(obj.handle()));
            }
            Ok(s.values[obj.handle()])
        })
    }

    fn get_object_by_name(&self, name: &str) -> SimpleResult<SimObject> {
        STATE.with_mut(|s| {
            let handle = *s
                .by_name
                .get(name)
                .ok_or_else(|| SimError::UnknownObject(name.to_string()))?;
            let kind = match handle {
                0 => ObjectKind::Hier,
                _ => ObjectKind::Int(s.widths[handle]),
            };
            Ok(SimObject { handle, kind })
        })
    }

    fn get_root_object(&self) -> SimpleResult<SimObject> {
        STATE.with_mut(|s| {
            if s.names.is_empty() {
                return Err(SimError::UnknownObject("<root>".to_string()));
            }
            Ok(SimObject {
                handle: 0,
                kind: ObjectKind::Hier,
            })
        })
    }

    fn get_full_name(&self, obj: &SimObject) -> SimpleResult<String> {
        STATE.with_mut(|s| {
            s.names
                .get(obj.handle())
                .cloned()
                .ok_or(SimError::BadHandle(obj.handle()))
        })
    }

    fn get_kind(&self, handle: usize) -> ObjectKind {
        match handle {
            0 => ObjectKind::Hier,
            _ => STATE.with_mut(|s| ObjectKind::Int(s.widths[handle])),
        }
    }

    fn get_sim_time_steps(&self) -> u64 {
        STATE.with_mut(|s| s.time)
    }

    fn get_sim_precision(&self) -> i8 {
        // one step = 1 ns
        -9
    }

    fn register_callback(&self, cb: SimCallback) -> SimpleResult<usize> {
        STATE.with_mut(|mut s| {
            let hdl = s.new_cb_hdl();
            match cb {
                SimCallback::Time(abs_time) => {
                    if s.timers.insert(abs_time, hdl).is_some() {
                        panic!("Can not register same timer callback twice.");
                    }
                }
                SimCallback::Edge(sig_hdl) => {
                    if sig_hdl == 0 || sig_hdl >= N_OBJ {
                        return Err(SimError::BadHandle(sig_hdl));
                    }
                    if s.watches[sig_hdl].is_some() {
                        panic!("Can not register same edge callback twice.");
                    }
                    let current = s.values[sig_hdl] as u64;
                    s.watches[sig_hdl] = Some((hdl, current));
                }
                SimCallback::ReadWrite => {
                    if s.rw.replace(hdl).is_some() {
                        panic!("Can not register ReadWrite callback twice.");
                    }
                }
                SimCallback::ReadOnly => {
                    if s.ro.replace(hdl).is_some() {
                        panic!("Can not register ReadOnly callback twice.");
                    }
                }
            }
            s.cb_index.insert(hdl, kind_of(cb));
            Ok(hdl)
        })
    }

    fn cancel_callback(&self, cb_hdl: usize) -> SimpleResult<()> {
        STATE.with_mut(|mut s| {
            let kind = s
                .cb_index
                .remove(&cb_hdl)
                .ok_or(SimError::BadCallback(cb_hdl))?;
            match kind {
                CbKind::Time(abs_time) => {
                    s.timers.remove(&abs_time);
                }
                CbKind::Edge(sig_hdl) => {
                    s.watches[sig_hdl] = None;
                }
                CbKind::Rw => s.rw = None,
                CbKind::Ro => s.ro = None,
            }
            Ok(())
        })
    }

    fn log(&self, msg: &str) {
        let steps = self.get_sim_time_steps();
        info!("[{:>12} ns] {}", steps.to_formatted_string(&Locale::en), msg);
    }
}

fn kind_of(cb: SimCallback) -> CbKind {
    match cb {
        SimCallback::Time(t) => CbKind::Time(t),
        SimCallback::Edge(h) => CbKind::Edge(h),
        SimCallback::ReadWrite => CbKind::Rw,
        SimCallback::ReadOnly => CbKind::Ro,
    }
}

/// Evaluate and dispatch edge triggers until no watched signal changes.
fn settle() {
    loop {
        let events = STATE.with_mut(|mut s| s.eval_once());
        if events.is_empty() {
            break;
        }
        for (sig_hdl, cb_hdl, edge) in events {
            // a reacting task may have torn the watch down (test teardown)
            // or replaced it; only dispatch events whose watch is current
            let live = STATE.with_mut(|s| s.watches[sig_hdl].map(|(h, _)| h) == Some(cb_hdl));
            if live {
                trigger::react(SimCallback::Edge(sig_hdl), Some(edge));
            }
        }
    }
}

fn fire_rw() -> bool {
    let fired = STATE.with_mut(|mut s| {
        if let Some(hdl) = s.rw.take() {
            s.cb_index.remove(&hdl);
            true
        } else {
            false
        }
    });
    if fired {
        trigger::react(SimCallback::ReadWrite, None);
    }
    fired
}

fn fire_ro() -> bool {
    let fired = STATE.with_mut(|mut s| {
        if let Some(hdl) = s.ro.take() {
            s.cb_index.remove(&hdl);
            true
        } else {
            false
        }
    });
    if fired {
        trigger::react(SimCallback::ReadOnly, None);
    }
    fired
}

/// Jump to the earliest pending timer and fire it. Returns false when no
/// timer remains, which ends the simulation.
fn advance_time() -> bool {
    let next = STATE.with_mut(|mut s| {
        if let Some((abs_time, hdl)) = s.timers.pop_first() {
            s.cb_index.remove(&hdl);
            s.time = abs_time;
            Some(abs_time)
        } else {
            None
        }
    });
    match next {
        Some(abs_time) => {
            trigger::react(SimCallback::Time(abs_time), None);
            true
        }
        None => false,
    }
}

fn run_sim() {
    loop {
        // delta cycles for the current timestep
        loop {
            settle();
            if fire_rw() {
                continue;
            }
            break;
        }
        if fire_ro() {
            settle();
        }
        if !advance_time() {
            break;
        }
    }
}

fn reset_session(model: Box<dyn TileModel>) {
    trigger::cancel_all_triggers();
    executor::clear_ready_queue();
    crate::signal::clear_objects();
    crate::clear_current_test();
    STATE.with_mut(|mut s| *s = SimState::install(model));
}

/// Run a suite of tests against a DUT model and hand back one summary per
/// test. Suites are serialized process-wide; all session state is reset
/// up front, so this can be called repeatedly (e.g. from `cargo test`).
pub fn run_tests(tests: TbTests, model: Box<dyn TileModel>) -> Vec<TestSummary> {
    let _guard = match RUN_LOCK.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    reset_session(model);
    crate::start_of_simulation(&tests);
    run_sim();
    crate::end_of_simulation(&tests)
}

/// Binary entry point: run the suite, print the summary table, write the
/// JUnit report. Returns whether every test passed.
pub fn run_and_report(tests: TbTests, model: Box<dyn TileModel>) -> bool {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .try_init();
    let summaries = run_tests(tests, model);
    crate::junit::create_junit_xml(&summaries);
    summaries.iter().all(|s| s.passed)
}

/// Generate `fn main()` running the given tests against a DUT model.
#[macro_export]
macro_rules! run_with_model {
    ($model:expr; $( $t:ident ),+ $(,)?) => {
        fn main() {
            $crate::CRATE_NAME
                .set(std::module_path!().to_string())
                .unwrap();
            let mut tests = $crate::test::TbTests::new();
            $(
                tests.push($crate::test::Test::new(
                    stringify!($t).to_string(),
                    |dut| $t(dut).boxed(),
                ));
            )+
            if !$crate::sim::run_and_report(tests, Box::new($model)) {
                std::process::exit(1);
            }
        }
    };
}
