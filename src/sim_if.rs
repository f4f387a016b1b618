use lazy_static::lazy_static;
use thiserror::Error;

use crate::signal::{ObjectKind, SimObject};

lazy_static! {
    pub static ref SIM_IF: Box<dyn SimIf + Sync> = new_interface();
}

fn new_interface() -> Box<dyn SimIf + Sync> {
    Box::new(crate::sim::Bhv::new())
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("no object named '{0}' in the simulation hierarchy")]
    UnknownObject(String),
    #[error("object handle {0} is not registered")]
    BadHandle(usize),
    #[error("callback handle {0} is not registered")]
    BadCallback(usize),
    #[error("object '{0}' does not hold a value")]
    NotAValue(String),
}

pub type SimpleResult<T> = Result<T, SimError>;

#[derive(Debug, Hash, Clone, Copy, Eq, PartialEq)]
pub enum SimCallback {
    /// Absolute simulation step at which to fire.
    Time(u64),
    /// Value change on the signal with the given handle.
    Edge(usize),
    ReadWrite,
    ReadOnly,
}

pub trait SimIf {
    fn set_value(&self, obj: &SimObject, value: u32) -> SimpleResult<()>;
    fn get_value(&self, obj: &SimObject) -> SimpleResult<u32>;
    fn get_object_by_name(&self, name: &str) -> SimpleResult<SimObject>;
    fn get_root_object(&self) -> SimpleResult<SimObject>;
    fn get_full_name(&self, obj: &SimObject) -> SimpleResult<String>;
    fn get_kind(&self, handle: usize) -> ObjectKind;
    fn get_sim_time_steps(&self) -> u64;
    fn get_sim_precision(&self) -> i8;
    fn register_callback(&self, cb: SimCallback) -> SimpleResult<usize>;
    fn cancel_callback(&self, cb_hdl: usize) -> SimpleResult<()>;
    fn log(&self, msg: &str);

    fn get_sim_time(&self, unit: &str) -> f64 {
        // does not preserve precision, so don't use carelessly
        let t = self.get_sim_time_steps() as f64;
        let precision = self.get_sim_precision();
        ldexp10(t, precision - time_scale(unit))
    }
    fn get_sim_steps(&self, time: f64, unit: &str) -> u64 {
        let precision = self.get_sim_precision();
        let steps = ldexp10(time, time_scale(unit) - precision);
        if steps % 1.0 == 0.0 {
            steps as u64
        } else {
            panic!(
                "Can't convert time {} {} to sim steps without rounding (sim precision: {})",
                time,
                unit,
                scale_time(precision)
            );
        }
    }
}

fn time_scale(unit: &str) -> i8 {
    match unit {
        "fs" => -15,
        "ps" => -12,
        "ns" => -9,
        "us" => -6,
        "ms" => -3,
        "sec" => 0,
        _ => panic!("Unknown time unit '{}'", unit),
    }
}

fn scale_time(unit: i8) -> String {
    match unit {
        -15 => "fs".to_string(),
        -12 => "ps".to_string(),
        -9 => "ns".to_string(),
        -6 => "us".to_string(),
        -3 => "ms".to_string(),
        0 => "sec".to_string(),
        _ => panic!("No time unit for scale {}", unit),
    }
}

fn ldexp10(frac: f64, exp: i8) -> f64 {
    // Like math.ldexp, but base 10
    // Stolen from cocotb.
    if exp >= 0 {
        frac * 10_u64.pow(exp as u32) as f64
    } else {
        let div = 10_u64.pow(-exp as u32) as f64;
        frac / div
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_round_trip() {
        for (unit, exp) in [("fs", -15), ("ps", -12), ("ns", -9), ("us", -6), ("ms", -3)] {
            assert_eq!(time_scale(unit), exp);
            assert_eq!(scale_time(exp), unit);
        }
    }

    #[test]
    fn ldexp10_both_directions() {
        assert_eq!(ldexp10(5.0, 3), 5000.0);
        assert_eq!(ldexp10(5000.0, -3), 5.0);
        assert_eq!(ldexp10(1.0, 0), 1.0);
    }
}
