//! WS2812 strip transmitter
//!
//! Drives one strip from a PIO state machine so bit timing is generated
//! entirely in hardware. The CPU only pushes one 24-bit word per LED
//! into the TX FIFO; everything above treats this as an opaque
//! "transmit N pixels" primitive.

use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pio::{
    Common, Config, Direction, FifoJoin, Instance, PioPin, ShiftConfig, ShiftDirection,
    StateMachine,
};
use embassy_rp::Peri;
use embassy_time::Timer;
use fixed::types::U24F8;

/// WS2812 bit rate in kHz
const BIT_RATE_KHZ: u32 = 800;

/// PIO cycles per transmitted bit (T1 + T2 + T3)
const CYCLES_PER_BIT: u32 = 2 + 5 + 3;

/// Low time after a frame so the strip latches
const LATCH_DELAY_US: u64 = 300;

/// One WS2812 strip behind a PIO state machine
pub struct Ws2812<'d, P: Instance, const S: usize> {
    sm: StateMachine<'d, P, S>,
}

impl<'d, P: Instance, const S: usize> Ws2812<'d, P, S> {
    /// Claim a state machine and configure it for WS2812 timing on `pin`
    pub fn new(
        common: &mut Common<'d, P>,
        mut sm: StateMachine<'d, P, S>,
        pin: Peri<'d, impl PioPin>,
    ) -> Self {
        let prg = pio_proc::pio_asm!(
            "
                .side_set 1
                .wrap_target
                bitloop:
                    out x, 1        side 0 [2]
                    jmp !x do_zero  side 1 [1]
                do_one:
                    jmp bitloop     side 1 [4]
                do_zero:
                    nop             side 0 [4]
                .wrap
            "
        );

        let out_pin = common.make_pio_pin(pin);

        let mut cfg = Config::default();
        cfg.use_program(&common.load_program(&prg.program), &[&out_pin]);

        let clock_khz = U24F8::from_num(clk_sys_freq() / 1000);
        let bit_khz = U24F8::from_num(BIT_RATE_KHZ) * CYCLES_PER_BIT;
        cfg.clock_divider = clock_khz / bit_khz;

        cfg.shift_out = ShiftConfig {
            auto_fill: true,
            threshold: 24,
            direction: ShiftDirection::Left,
        };
        cfg.fifo_join = FifoJoin::TxOnly;

        sm.set_pin_dirs(Direction::Out, &[&out_pin]);
        sm.set_config(&cfg);
        sm.set_enable(true);

        Self { sm }
    }

    /// Transmit `pixels` (already in strip channel order), then hold the
    /// line low long enough for the strip to latch
    pub async fn write(&mut self, pixels: &[[u8; 3]]) {
        for pixel in pixels {
            let word = (u32::from(pixel[0]) << 24)
                | (u32::from(pixel[1]) << 16)
                | (u32::from(pixel[2]) << 8);
            self.sm.tx().wait_push(word).await;
        }
        Timer::after_micros(LATCH_DELAY_US).await;
    }
}
