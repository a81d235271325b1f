//! Host-visible register bank
//!
//! The generic register transport (address-range checks, typed access,
//! host framing) is a pre-existing core owned elsewhere; this module
//! supplies what plugs into it: the register identifiers, the bank state,
//! and a typed handler map built once at startup.

mod bank;
mod map;

pub use bank::{RegisterBank, BUS_ARRAY_LEN, BUS_COUNT, COMBINED_ARRAY_LEN, LEDS_PER_BUS_MAX};
pub use map::RegisterMap;

/// Register bit and mask definitions
pub mod bits {
    /// LEDS_STATUS control: refresh strips from the on-frames
    pub const RGB_ON: u8 = 1 << 0;
    /// LEDS_STATUS control: blank strips from the off-frames
    pub const RGB_OFF: u8 = 1 << 1;
    /// LEDS_STATUS control: start demo mode
    pub const DEMO_ON: u8 = 1 << 2;
    /// LEDS_STATUS control: stop demo mode
    pub const DEMO_OFF: u8 = 1 << 3;

    /// Digital input 0
    pub const DI0: u8 = 1 << 0;
    /// Digital outputs
    pub const DO0: u8 = 1 << 0;
    pub const DO1: u8 = 1 << 1;
    pub const DO2: u8 = 1 << 2;
    pub const DO3: u8 = 1 << 3;
    pub const DO4: u8 = 1 << 4;
    /// All digital output bits
    pub const DO_MASK: u8 = DO0 | DO1 | DO2 | DO3 | DO4;

    /// Event enable: LEDS_STATUS change events
    pub const EVT_LED_STATUS: u8 = 1 << 0;
    /// Event enable: INPUTS_STATE change events
    pub const EVT_INPUTS_STATE: u8 = 1 << 1;
    /// All defined event bits
    pub const EVT_MASK: u8 = EVT_LED_STATUS | EVT_INPUTS_STATE;
}

/// Register identifiers, one per host-visible address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Strip status and control (write-to-command)
    LedsStatus,
    /// LEDs used on each bus (1..=32)
    LedsOnBus,
    /// Combined color array, both buses, R G B per LED
    ColorArray,
    /// Bus 0 half of the color array
    ColorArrayBus0,
    /// Bus 1 half of the color array
    ColorArrayBus1,
    /// Color transmitted when a bus is blanked
    ColorOff,
    /// Digital input 0 behavior
    Di0Conf,
    /// Digital output 0 behavior
    Do0Conf,
    /// Digital output 1 behavior
    Do1Conf,
    /// Nonzero latches the next array update
    LatchNextUpdate,
    /// Digital input levels (read-only)
    InputsState,
    /// Set digital output bits
    OutputsSet,
    /// Clear digital output bits
    OutputsClear,
    /// Toggle digital output bits
    OutputsToggle,
    /// Write all digital outputs at once
    OutputsOut,
    /// Pulse-train period in milliseconds
    PulsePeriod,
    /// Pulse-train pulse count; writing starts the train
    PulseCount,
    /// Event propagation enable mask
    EventEnable,
}

impl Register {
    /// All registers, in address order
    pub const ALL: [Register; 18] = [
        Register::LedsStatus,
        Register::LedsOnBus,
        Register::ColorArray,
        Register::ColorArrayBus0,
        Register::ColorArrayBus1,
        Register::ColorOff,
        Register::Di0Conf,
        Register::Do0Conf,
        Register::Do1Conf,
        Register::LatchNextUpdate,
        Register::InputsState,
        Register::OutputsSet,
        Register::OutputsClear,
        Register::OutputsToggle,
        Register::OutputsOut,
        Register::PulsePeriod,
        Register::PulseCount,
        Register::EventEnable,
    ];

    /// Host-visible address of this register
    pub fn address(self) -> u8 {
        match self {
            Register::LedsStatus => 32,
            Register::LedsOnBus => 33,
            Register::ColorArray => 34,
            Register::ColorArrayBus0 => 35,
            Register::ColorArrayBus1 => 36,
            Register::ColorOff => 37,
            Register::Di0Conf => 39,
            Register::Do0Conf => 40,
            Register::Do1Conf => 41,
            Register::LatchNextUpdate => 43,
            Register::InputsState => 44,
            Register::OutputsSet => 45,
            Register::OutputsClear => 46,
            Register::OutputsToggle => 47,
            Register::OutputsOut => 48,
            Register::PulsePeriod => 49,
            Register::PulseCount => 50,
            Register::EventEnable => 51,
        }
    }

    /// Look a register up by host address
    pub fn from_address(address: u8) -> Option<Self> {
        Register::ALL.iter().copied().find(|r| r.address() == address)
    }

    /// Payload size in bytes
    pub fn size(self) -> usize {
        match self {
            Register::ColorArray => COMBINED_ARRAY_LEN,
            Register::ColorArrayBus0 | Register::ColorArrayBus1 => BUS_ARRAY_LEN,
            Register::ColorOff => 3,
            Register::PulsePeriod => 2,
            _ => 1,
        }
    }
}

/// Digital input 0 operating modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Di0Mode {
    /// Pure digital input; updates pulse when both buses report ready
    #[default]
    Sync,
    /// Rising edge on DI0 pulses an update
    RiseUpdate,
    /// Updates allowed while DI0 is high; falling edge blanks the strips
    HighOn,
}

impl Di0Mode {
    /// Parse from register bits
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Di0Mode::Sync),
            1 => Some(Di0Mode::RiseUpdate),
            2 => Some(Di0Mode::HighOn),
            _ => None,
        }
    }

    /// Register bit value
    pub fn bits(self) -> u8 {
        match self {
            Di0Mode::Sync => 0,
            Di0Mode::RiseUpdate => 1,
            Di0Mode::HighOn => 2,
        }
    }
}

/// Digital output operating modes (DO0 and DO1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoMode {
    /// Pure digital output, host-controlled
    #[default]
    Digital,
    /// Pulse 1 ms when the strips refresh
    PulseOnUpdated,
    /// Pulse 1 ms when a new color array finishes loading
    PulseOnLoaded,
    /// Toggle when the strips refresh
    ToggleOnUpdated,
    /// Toggle when a new color array finishes loading
    ToggleOnLoaded,
}

impl DoMode {
    /// Parse from register bits
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(DoMode::Digital),
            1 => Some(DoMode::PulseOnUpdated),
            2 => Some(DoMode::PulseOnLoaded),
            3 => Some(DoMode::ToggleOnUpdated),
            4 => Some(DoMode::ToggleOnLoaded),
            _ => None,
        }
    }

    /// Register bit value
    pub fn bits(self) -> u8 {
        match self {
            DoMode::Digital => 0,
            DoMode::PulseOnUpdated => 1,
            DoMode::PulseOnLoaded => 2,
            DoMode::ToggleOnUpdated => 3,
            DoMode::ToggleOnLoaded => 4,
        }
    }

    /// True for the pulse modes (line is cleared when the mode is set)
    pub fn is_pulsed(self) -> bool {
        matches!(self, DoMode::PulseOnUpdated | DoMode::PulseOnLoaded)
    }
}

/// One of the two configurable outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoChannel {
    Do0,
    Do1,
}

impl DoChannel {
    /// Bit of this channel in the outputs registers
    pub fn bit(self) -> u8 {
        match self {
            DoChannel::Do0 => bits::DO0,
            DoChannel::Do1 => bits::DO1,
        }
    }
}

/// Errors reported back through the register dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError {
    /// No register at this address
    UnknownAddress,
    /// Payload length does not match the register size
    LengthMismatch,
    /// Value outside the register's declared range
    ValueOutOfRange,
    /// Register cannot be written
    ReadOnly,
    /// Read destination too small
    BufferTooSmall,
}

/// How a digital output line should move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputAction {
    /// Drive the line low
    Clear,
    /// 1 ms high pulse
    Pulse,
    /// Invert the line
    Toggle,
}

/// Mask operations on the output port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputsOp {
    Set,
    Clear,
    Toggle,
    Write,
}

/// Side effects a register write or bus event asks the firmware to perform
///
/// Handlers stay pure: they validate, mutate the bank, and describe what
/// must happen at the hardware boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlAction {
    /// Send the combined color array halves to their bus links
    ForwardArray,
    /// Send the off color to both bus links
    ForwardOffColor,
    /// Pulse the Update line on both buses
    PulseUpdate,
    /// Pulse the Disable line on both buses
    PulseDisable,
    /// Raise or drop the DemoEnable lines; raising also sends demo
    /// trigger frames on both links
    SetDemoMode(bool),
    /// Move one configurable output line
    Output(DoChannel, OutputAction),
    /// Apply a bit mask to the digital output port
    Outputs(OutputsOp, u8),
    /// Arm the pulse train for its next tick
    StartPulseTrain,
    /// Propagate a register event to the host
    Notify(Register),
}

/// Actions produced by a single dispatch
pub type Actions = heapless::Vec<ControlAction, 6>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        for reg in Register::ALL {
            assert_eq!(Register::from_address(reg.address()), Some(reg));
        }
    }

    #[test]
    fn test_reserved_addresses_unmapped() {
        assert_eq!(Register::from_address(38), None);
        assert_eq!(Register::from_address(42), None);
        assert_eq!(Register::from_address(0), None);
        assert_eq!(Register::from_address(52), None);
    }

    #[test]
    fn test_mode_bits_roundtrip() {
        for mode in [Di0Mode::Sync, Di0Mode::RiseUpdate, Di0Mode::HighOn] {
            assert_eq!(Di0Mode::from_bits(mode.bits()), Some(mode));
        }
        assert_eq!(Di0Mode::from_bits(3), None);

        for bits in 0..=4 {
            let mode = DoMode::from_bits(bits).unwrap();
            assert_eq!(mode.bits(), bits);
        }
        assert_eq!(DoMode::from_bits(5), None);
    }
}
