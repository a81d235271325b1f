//! Register bank state and power-on defaults

use super::{bits, Di0Mode, DoMode};

/// Number of independent LED buses driven by the master
pub const BUS_COUNT: usize = 2;

/// Maximum LEDs per bus on the master side
pub const LEDS_PER_BUS_MAX: usize = 32;

/// Combined color array length: both buses, 3 bytes per LED
pub const COMBINED_ARRAY_LEN: usize = BUS_COUNT * LEDS_PER_BUS_MAX * 3;

/// Per-bus slice of the combined array
pub const BUS_ARRAY_LEN: usize = COMBINED_ARRAY_LEN / BUS_COUNT;

/// The master's host-visible register state
///
/// `inputs_state` and `outputs_out` mirror pin levels and are refreshed by
/// the firmware, not by register writes.
#[derive(Debug, Clone)]
pub struct RegisterBank {
    pub leds_status: u8,
    pub leds_on_bus: u8,
    pub color_array: [u8; COMBINED_ARRAY_LEN],
    pub color_off: [u8; 3],
    pub di0_conf: Di0Mode,
    pub do_conf: [DoMode; 2],
    pub latch_next_update: u8,
    pub inputs_state: u8,
    pub outputs_out: u8,
    pub pulse_period_ms: u16,
    pub pulse_count: u8,
    pub event_enable: u8,
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBank {
    /// Power-on register values
    pub fn new() -> Self {
        Self {
            leds_status: 0,
            leds_on_bus: LEDS_PER_BUS_MAX as u8,
            color_array: [0; COMBINED_ARRAY_LEN],
            color_off: [0; 3],
            di0_conf: Di0Mode::Sync,
            do_conf: [DoMode::Digital; 2],
            latch_next_update: 0,
            inputs_state: 0,
            outputs_out: 0,
            pulse_period_ms: 100,
            pulse_count: 0,
            event_enable: bits::EVT_LED_STATUS | bits::EVT_INPUTS_STATE,
        }
    }

    /// True when LEDS_STATUS change events are enabled
    pub fn led_status_events_enabled(&self) -> bool {
        self.event_enable & bits::EVT_LED_STATUS != 0
    }

    /// True when INPUTS_STATE change events are enabled
    pub fn input_events_enabled(&self) -> bool {
        self.event_enable & bits::EVT_INPUTS_STATE != 0
    }

    /// Current DI0 level, from the mirrored input state
    pub fn di0_high(&self) -> bool {
        self.inputs_state & bits::DI0 != 0
    }

    /// The bus-0 / bus-1 halves of the combined color array
    pub fn bus_halves(&self) -> (&[u8], &[u8]) {
        self.color_array.split_at(BUS_ARRAY_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_defaults() {
        let bank = RegisterBank::new();
        assert_eq!(bank.leds_on_bus, 32);
        assert_eq!(bank.pulse_period_ms, 100);
        assert_eq!(bank.di0_conf, Di0Mode::Sync);
        assert!(bank.led_status_events_enabled());
        assert!(bank.input_events_enabled());
        assert!(bank.color_array.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_bus_halves() {
        let mut bank = RegisterBank::new();
        bank.color_array[0] = 0xAA;
        bank.color_array[BUS_ARRAY_LEN] = 0xBB;

        let (low, high) = bank.bus_halves();
        assert_eq!(low.len(), BUS_ARRAY_LEN);
        assert_eq!(high.len(), BUS_ARRAY_LEN);
        assert_eq!(low[0], 0xAA);
        assert_eq!(high[0], 0xBB);
    }
}
