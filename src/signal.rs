use intmap::IntMap;
use lazy_mut::lazy_mut;
use std::collections::HashMap;

use crate::sim_if::{SimpleResult, SIM_IF};
use crate::trigger::Trigger;
use crate::value::Val;
use crate::TbResult;

lazy_mut! {
    static mut SIG_MAP_NAME: HashMap<String, usize> = HashMap::new();
}
lazy_mut! {
    static mut SIG_MAP: IntMap<SimObject> = IntMap::new();
}

/// Handle to an object in the simulation hierarchy. Cheap to copy; the
/// backend owns the actual signal state.
#[derive(Clone, Copy, Debug)]
pub struct SimObject {
    pub(crate) handle: usize,
    pub(crate) kind: ObjectKind,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ObjectKind {
    /// Integer signal of the given bit width.
    Int(i32),
    /// Hierarchy level (the DUT toplevel).
    Hier,
}

impl SimObject {
    pub fn handle(&self) -> usize {
        self.handle
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> String {
        SIM_IF
            .get_full_name(self)
            .expect("Couldn't get name of SimObject")
    }

    pub fn size(&self) -> i32 {
        match self.kind {
            ObjectKind::Int(size) => size,
            ObjectKind::Hier => panic!("SimObject does not have a size."),
        }
    }

    pub fn get_child(&self, name: &str) -> SimpleResult<Self> {
        let mut child_name = self.name();
        child_name.push('.');
        child_name.push_str(name);
        SimObject::from_name(child_name.as_str())
    }

    pub fn from_name(full_name: &str) -> SimpleResult<Self> {
        let cached = unsafe { SIG_MAP_NAME.get(full_name).copied() };
        match cached {
            Some(handle) => Ok(unsafe { *SIG_MAP.get(handle as u64).unwrap() }),
            None => SimObject::new_from_name(full_name),
        }
    }

    fn new_from_name(full_name: &str) -> SimpleResult<Self> {
        let signal = SIM_IF.get_object_by_name(full_name)?;
        unsafe {
            SIG_MAP.insert(signal.handle as u64, signal);
            SIG_MAP_NAME.insert(full_name.to_string(), signal.handle);
        }
        Ok(signal)
    }

    pub fn get_root() -> SimpleResult<Self> {
        SIM_IF.get_root_object()
    }

    /// Child lookup which panics on unknown names. Scenario code uses this
    /// for the fixed pinout, where a missing pin is a bench bug.
    pub fn c(&self, name: &str) -> Self {
        self.get_child(name)
            .unwrap_or_else(|_| panic!("Could not get object with name {}.{}", self.name(), name))
    }

    pub fn u32(&self) -> u32 {
        SIM_IF.get_value(self).unwrap()
    }

    pub fn set(&self, val: u32) {
        SIM_IF.set_value(self, val).unwrap();
    }

    // convenience functions to get edge triggers for this signal
    pub fn rising_edge(self) -> Trigger {
        Trigger::rising_edge(self)
    }
    pub async fn rising_edge_ro(self) -> TbResult {
        self.rising_edge().await;
        Trigger::read_only().await;
        Ok(Val::None)
    }
    pub async fn rising_edge_rw(self) -> TbResult {
        self.rising_edge().await;
        Trigger::read_write().await;
        Ok(Val::None)
    }
    pub fn falling_edge(self) -> Trigger {
        Trigger::falling_edge(self)
    }
    pub fn edge(self) -> Trigger {
        Trigger::edge(self)
    }
}

pub(crate) fn clear_objects() {
    unsafe {
        SIG_MAP_NAME.clear();
        SIG_MAP.clear();
    }
}
