//! Pin-accurate DUT models evaluated by the behavioral backend.
//!
//! A model stands in for the hardware the bench was written against, the
//! same way a bench-side memory model stands in for a RAM macro. It sees
//! the pin values on every delta cycle and drives the output pins.

/// Snapshot of the fixed tile pinout. Inputs are driven by the bench; the
/// model writes `uo_out`/`uio_out` (writes to input fields are ignored).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TileIo {
    pub clk: u8,
    pub rst_n: u8,
    pub ena: u8,
    pub ui_in: u8,
    pub uio_in: u8,
    pub uo_out: u8,
    pub uio_out: u8,
}

pub trait TileModel: Send {
    /// Toplevel name the pins are published under.
    fn name(&self) -> &'static str {
        "dut"
    }
    /// Settle the model against the current pin values. Called on every
    /// delta cycle; clock edges must be detected against state kept by the
    /// model itself.
    fn eval(&mut self, io: &mut TileIo);
}

/// Golden model of the adder tile.
///
/// Registered data path: on a sampled rising edge with the internal reset
/// released and `ena` high, `uo_out` latches `ui_in + uio_in` (8-bit
/// wrapping) and `uio_out` latches `uio_in`. Reset assertion clears state
/// immediately; release is synchronized over two sampled edges, so the
/// first edge after `rst_n` goes high still reads as reset.
#[derive(Debug, Default)]
pub struct AdderTile {
    prev_clk: u8,
    rst_meta: bool,
    rst_sync: bool,
    sum: u8,
    pass: u8,
}

impl TileModel for AdderTile {
    fn name(&self) -> &'static str {
        "tt_um_adder"
    }

    fn eval(&mut self, io: &mut TileIo) {
        let posedge = self.prev_clk == 0 && io.clk == 1;
        self.prev_clk = io.clk;

        if io.rst_n == 0 {
            self.rst_meta = false;
            self.rst_sync = false;
            self.sum = 0;
            self.pass = 0;
        } else if posedge {
            // registers sample their inputs before the synchronizer shifts
            let released = self.rst_sync;
            self.rst_sync = self.rst_meta;
            self.rst_meta = true;
            if !released {
                self.sum = 0;
                self.pass = 0;
            } else if io.ena == 1 {
                self.sum = io.ui_in.wrapping_add(io.uio_in);
                self.pass = io.uio_in;
            }
        }

        io.uo_out = self.sum;
        io.uio_out = self.pass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(model: &mut AdderTile, io: &mut TileIo) {
        io.clk = 0;
        model.eval(io);
        io.clk = 1;
        model.eval(io);
    }

    fn reset_and_release(model: &mut AdderTile, io: &mut TileIo) {
        io.rst_n = 0;
        for _ in 0..3 {
            cycle(model, io);
        }
        io.rst_n = 1;
        // flush the release synchronizer
        cycle(model, io);
        cycle(model, io);
    }

    #[test]
    fn outputs_zero_while_reset_asserted() {
        let mut model = AdderTile::default();
        let mut io = TileIo {
            ena: 1,
            ui_in: 0xff,
            uio_in: 0xff,
            ..TileIo::default()
        };
        for _ in 0..4 {
            cycle(&mut model, &mut io);
            assert_eq!(io.uo_out, 0);
            assert_eq!(io.uio_out, 0);
        }
    }

    #[test]
    fn first_edge_after_release_still_reads_as_reset() {
        let mut model = AdderTile::default();
        let mut io = TileIo {
            ena: 1,
            ui_in: 15,
            uio_in: 25,
            ..TileIo::default()
        };
        io.rst_n = 0;
        cycle(&mut model, &mut io);
        io.rst_n = 1;
        cycle(&mut model, &mut io);
        assert_eq!(io.uo_out, 0);
        assert_eq!(io.uio_out, 0);
    }

    #[test]
    fn sum_and_passthrough_after_release() {
        let mut model = AdderTile::default();
        let mut io = TileIo {
            ena: 1,
            ..TileIo::default()
        };
        reset_and_release(&mut model, &mut io);
        io.ui_in = 10;
        io.uio_in = 20;
        cycle(&mut model, &mut io);
        assert_eq!(io.uo_out, 30);
        assert_eq!(io.uio_out, 20);
    }

    #[test]
    fn enable_low_holds_state() {
        let mut model = AdderTile::default();
        let mut io = TileIo {
            ena: 1,
            ..TileIo::default()
        };
        reset_and_release(&mut model, &mut io);
        io.ui_in = 3;
        io.uio_in = 4;
        cycle(&mut model, &mut io);
        assert_eq!(io.uo_out, 7);
        io.ena = 0;
        io.ui_in = 100;
        cycle(&mut model, &mut io);
        assert_eq!(io.uo_out, 7, "disabled tile must hold its outputs");
        io.ena = 1;
        cycle(&mut model, &mut io);
        assert_eq!(io.uo_out, 104);
    }

    #[test]
    fn sum_wraps_at_eight_bits() {
        let mut model = AdderTile::default();
        let mut io = TileIo {
            ena: 1,
            ..TileIo::default()
        };
        reset_and_release(&mut model, &mut io);
        io.ui_in = 200;
        io.uio_in = 100;
        cycle(&mut model, &mut io);
        assert_eq!(io.uo_out, 44);
        assert_eq!(io.uio_out, 100);
    }
}
