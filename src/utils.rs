use crate::prelude::*;
use rand as rnd;

/// Advance exactly `n_cycles` rising edges of `signal`.
pub async fn clock_cycles(signal: SimObject, n_cycles: u32) -> TbResult {
    for _ in 0..n_cycles {
        signal.rising_edge().await;
    }
    Ok(Val::None)
}

#[inline]
pub fn rand() -> f32 {
    rnd::random::<f32>()
}

#[inline]
pub fn rand_int(ceil: u32) -> u32 {
    rnd::random::<u32>() % ceil
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rand_int_stays_below_ceiling() {
        for _ in 0..1000 {
            assert!(rand_int(256) < 256);
        }
    }
}
