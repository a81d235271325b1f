//! Pins task
//!
//! Owns every master-side output line and executes the controller's pin
//! commands: the brief Update/Disable pulses toward the driver boards,
//! the DemoEnable levels, and the host-visible digital outputs with
//! their 1 ms pulse and toggle modes.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::Timer;
use portable_atomic::Ordering;

use chroma_core::registers::{DoChannel, OutputAction, OutputsOp};

use crate::channels::{PinCommand, OUTPUTS_MIRROR, PIN_CMD};

/// Width of the Update/Disable trigger pulses
const TRIGGER_PULSE_US: u64 = 10;

/// Width of the DO pulse modes
const DO_PULSE_MS: u64 = 1;

/// All master-side output lines
pub struct MasterPins {
    /// Update trigger, one per bus
    pub update: [Output<'static>; 2],
    /// Disable trigger, one per bus
    pub disable: [Output<'static>; 2],
    /// DemoEnable level, one per bus
    pub demo: [Output<'static>; 2],
    /// Host-visible digital outputs DO0..DO4
    pub dout: [Output<'static>; 5],
}

impl MasterPins {
    fn do_line(&mut self, channel: DoChannel) -> &mut Output<'static> {
        &mut self.dout[match channel {
            DoChannel::Do0 => 0,
            DoChannel::Do1 => 1,
        }]
    }

    fn refresh_mirror(&self) {
        let mut mirror = 0u8;
        for (i, line) in self.dout.iter().enumerate() {
            if line.is_set_high() {
                mirror |= 1 << i;
            }
        }
        OUTPUTS_MIRROR.store(mirror, Ordering::Relaxed);
    }
}

/// Pins task - executes pin commands from the controller
#[embassy_executor::task]
pub async fn pins_task(mut pins: MasterPins) {
    info!("Pins task started");

    loop {
        match PIN_CMD.receive().await {
            PinCommand::PulseUpdate => {
                for line in &mut pins.update {
                    line.set_high();
                }
                Timer::after_micros(TRIGGER_PULSE_US).await;
                for line in &mut pins.update {
                    line.set_low();
                }
            }
            PinCommand::PulseDisable => {
                for line in &mut pins.disable {
                    line.set_high();
                }
                Timer::after_micros(TRIGGER_PULSE_US).await;
                for line in &mut pins.disable {
                    line.set_low();
                }
            }
            PinCommand::SetDemo(enabled) => {
                for line in &mut pins.demo {
                    if enabled {
                        line.set_high();
                    } else {
                        line.set_low();
                    }
                }
            }
            PinCommand::Output(channel, action) => {
                let line = pins.do_line(channel);
                match action {
                    OutputAction::Clear => line.set_low(),
                    OutputAction::Toggle => line.toggle(),
                    OutputAction::Pulse => {
                        line.set_high();
                        Timer::after_millis(DO_PULSE_MS).await;
                        pins.do_line(channel).set_low();
                    }
                }
                pins.refresh_mirror();
            }
            PinCommand::Outputs(op, mask) => {
                for i in 0..pins.dout.len() {
                    let bit = mask & (1 << i) != 0;
                    let line = &mut pins.dout[i];
                    match op {
                        OutputsOp::Set if bit => line.set_high(),
                        OutputsOp::Clear if bit => line.set_low(),
                        OutputsOp::Toggle if bit => line.toggle(),
                        OutputsOp::Write => {
                            if bit {
                                line.set_high();
                            } else {
                                line.set_low();
                            }
                        }
                        _ => {}
                    }
                }
                pins.refresh_mirror();
            }
        }
    }
}
