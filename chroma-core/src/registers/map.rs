//! Typed register dispatch map
//!
//! The mapping from register identifier to its handler pair — validate +
//! apply for writes, compute for reads — is built once at startup and
//! handed to whatever owns the host link. Handlers never touch hardware;
//! they mutate the bank and return [`ControlAction`]s for the firmware to
//! carry out. A rejected write leaves the bank untouched and surfaces only
//! through the returned error.

use super::bank::{RegisterBank, BUS_ARRAY_LEN};
use super::{
    bits, Actions, ControlAction, Di0Mode, DoChannel, DoMode, OutputAction, OutputsOp, Register,
    RegisterError,
};

type ReadFn = fn(&mut RegisterBank, &mut [u8]);
type WriteFn = fn(&mut RegisterBank, &[u8]) -> Result<Actions, RegisterError>;

/// Handler pair for one register
struct Handler {
    register: Register,
    read: ReadFn,
    write: WriteFn,
}

/// The register dispatch table
pub struct RegisterMap {
    handlers: [Handler; Register::ALL.len()],
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterMap {
    /// Build the dispatch table
    pub fn new() -> Self {
        Self {
            handlers: [
                Handler {
                    register: Register::LedsStatus,
                    read: read_zero,
                    write: write_leds_status,
                },
                Handler {
                    register: Register::LedsOnBus,
                    read: read_leds_on_bus,
                    write: write_leds_on_bus,
                },
                Handler {
                    register: Register::ColorArray,
                    read: read_color_array,
                    write: write_color_array,
                },
                Handler {
                    register: Register::ColorArrayBus0,
                    read: read_color_array_bus0,
                    write: write_color_array_bus0,
                },
                Handler {
                    register: Register::ColorArrayBus1,
                    read: read_color_array_bus1,
                    write: write_color_array_bus1,
                },
                Handler {
                    register: Register::ColorOff,
                    read: read_color_off,
                    write: write_color_off,
                },
                Handler {
                    register: Register::Di0Conf,
                    read: read_di0_conf,
                    write: write_di0_conf,
                },
                Handler {
                    register: Register::Do0Conf,
                    read: read_do0_conf,
                    write: write_do0_conf,
                },
                Handler {
                    register: Register::Do1Conf,
                    read: read_do1_conf,
                    write: write_do1_conf,
                },
                Handler {
                    register: Register::LatchNextUpdate,
                    read: read_latch_next_update,
                    write: write_latch_next_update,
                },
                Handler {
                    register: Register::InputsState,
                    read: read_inputs_state,
                    write: write_read_only,
                },
                Handler {
                    register: Register::OutputsSet,
                    read: read_zero,
                    write: write_outputs_set,
                },
                Handler {
                    register: Register::OutputsClear,
                    read: read_zero,
                    write: write_outputs_clear,
                },
                Handler {
                    register: Register::OutputsToggle,
                    read: read_zero,
                    write: write_outputs_toggle,
                },
                Handler {
                    register: Register::OutputsOut,
                    read: read_outputs_out,
                    write: write_outputs_out,
                },
                Handler {
                    register: Register::PulsePeriod,
                    read: read_pulse_period,
                    write: write_pulse_period,
                },
                Handler {
                    register: Register::PulseCount,
                    read: read_pulse_count,
                    write: write_pulse_count,
                },
                Handler {
                    register: Register::EventEnable,
                    read: read_event_enable,
                    write: write_event_enable,
                },
            ],
        }
    }

    fn lookup(&self, address: u8) -> Result<&Handler, RegisterError> {
        self.handlers
            .iter()
            .find(|h| h.register.address() == address)
            .ok_or(RegisterError::UnknownAddress)
    }

    /// Dispatch a host write
    ///
    /// On rejection the bank is unchanged and no actions are produced.
    pub fn write(
        &self,
        bank: &mut RegisterBank,
        address: u8,
        payload: &[u8],
    ) -> Result<Actions, RegisterError> {
        let handler = self.lookup(address)?;
        if payload.len() != handler.register.size() {
            return Err(RegisterError::LengthMismatch);
        }
        (handler.write)(bank, payload)
    }

    /// Dispatch a host read, returning the number of bytes produced
    pub fn read(
        &self,
        bank: &mut RegisterBank,
        address: u8,
        out: &mut [u8],
    ) -> Result<usize, RegisterError> {
        let handler = self.lookup(address)?;
        let size = handler.register.size();
        if out.len() < size {
            return Err(RegisterError::BufferTooSmall);
        }
        (handler.read)(bank, &mut out[..size]);
        Ok(size)
    }
}

fn acts(list: &[ControlAction]) -> Actions {
    let mut v = Actions::new();
    for action in list {
        let _ = v.push(*action);
    }
    v
}

// ---- reads ----

/// Command/strobe registers read back as zero
fn read_zero(_bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = 0;
}

fn read_leds_on_bus(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.leds_on_bus;
}

fn read_color_array(bank: &mut RegisterBank, out: &mut [u8]) {
    out.copy_from_slice(&bank.color_array);
}

fn read_color_array_bus0(bank: &mut RegisterBank, out: &mut [u8]) {
    out.copy_from_slice(&bank.color_array[..BUS_ARRAY_LEN]);
}

fn read_color_array_bus1(bank: &mut RegisterBank, out: &mut [u8]) {
    out.copy_from_slice(&bank.color_array[BUS_ARRAY_LEN..]);
}

fn read_color_off(bank: &mut RegisterBank, out: &mut [u8]) {
    out.copy_from_slice(&bank.color_off);
}

fn read_di0_conf(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.di0_conf.bits();
}

fn read_do0_conf(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.do_conf[0].bits();
}

fn read_do1_conf(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.do_conf[1].bits();
}

fn read_latch_next_update(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.latch_next_update;
}

fn read_inputs_state(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.inputs_state;
}

fn read_outputs_out(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.outputs_out;
}

fn read_pulse_period(bank: &mut RegisterBank, out: &mut [u8]) {
    out.copy_from_slice(&bank.pulse_period_ms.to_le_bytes());
}

fn read_pulse_count(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.pulse_count;
}

fn read_event_enable(bank: &mut RegisterBank, out: &mut [u8]) {
    out[0] = bank.event_enable;
}

// ---- writes ----

fn write_read_only(_bank: &mut RegisterBank, _payload: &[u8]) -> Result<Actions, RegisterError> {
    Err(RegisterError::ReadOnly)
}

fn write_leds_status(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    let value = payload[0];

    // Exactly one command bit per write
    if !matches!(
        value,
        bits::RGB_ON | bits::RGB_OFF | bits::DEMO_ON | bits::DEMO_OFF
    ) {
        return Err(RegisterError::ValueOutOfRange);
    }

    bank.leds_status = value;
    Ok(match value {
        bits::RGB_ON => acts(&[
            ControlAction::SetDemoMode(false),
            ControlAction::PulseUpdate,
        ]),
        bits::RGB_OFF => acts(&[
            ControlAction::SetDemoMode(false),
            ControlAction::PulseDisable,
        ]),
        bits::DEMO_ON => acts(&[ControlAction::SetDemoMode(true)]),
        _ => acts(&[ControlAction::SetDemoMode(false)]),
    })
}

fn write_leds_on_bus(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    let value = payload[0];
    if value < 1 || value as usize > super::LEDS_PER_BUS_MAX {
        return Err(RegisterError::ValueOutOfRange);
    }
    bank.leds_on_bus = value;
    Ok(Actions::new())
}

fn write_color_array(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    bank.color_array.copy_from_slice(payload);
    Ok(acts(&[
        ControlAction::SetDemoMode(false),
        ControlAction::ForwardArray,
    ]))
}

fn write_color_array_bus0(
    bank: &mut RegisterBank,
    payload: &[u8],
) -> Result<Actions, RegisterError> {
    bank.color_array[..BUS_ARRAY_LEN].copy_from_slice(payload);
    Ok(acts(&[
        ControlAction::SetDemoMode(false),
        ControlAction::ForwardArray,
    ]))
}

fn write_color_array_bus1(
    bank: &mut RegisterBank,
    payload: &[u8],
) -> Result<Actions, RegisterError> {
    bank.color_array[BUS_ARRAY_LEN..].copy_from_slice(payload);
    Ok(acts(&[
        ControlAction::SetDemoMode(false),
        ControlAction::ForwardArray,
    ]))
}

fn write_color_off(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    bank.color_off.copy_from_slice(payload);
    Ok(acts(&[
        ControlAction::SetDemoMode(false),
        ControlAction::ForwardOffColor,
    ]))
}

fn write_di0_conf(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    let mode = Di0Mode::from_bits(payload[0]).ok_or(RegisterError::ValueOutOfRange)?;

    // Entering HighOn applies the current level immediately
    let actions = if mode == Di0Mode::HighOn {
        if bank.di0_high() {
            acts(&[
                ControlAction::SetDemoMode(false),
                ControlAction::PulseUpdate,
            ])
        } else {
            acts(&[
                ControlAction::SetDemoMode(false),
                ControlAction::PulseDisable,
            ])
        }
    } else {
        Actions::new()
    };

    bank.di0_conf = mode;
    Ok(actions)
}

fn write_do_conf(
    bank: &mut RegisterBank,
    payload: &[u8],
    channel: DoChannel,
) -> Result<Actions, RegisterError> {
    let mode = DoMode::from_bits(payload[0]).ok_or(RegisterError::ValueOutOfRange)?;

    let actions = if mode.is_pulsed() {
        acts(&[ControlAction::Output(channel, OutputAction::Clear)])
    } else {
        Actions::new()
    };

    bank.do_conf[match channel {
        DoChannel::Do0 => 0,
        DoChannel::Do1 => 1,
    }] = mode;
    Ok(actions)
}

fn write_do0_conf(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    write_do_conf(bank, payload, DoChannel::Do0)
}

fn write_do1_conf(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    write_do_conf(bank, payload, DoChannel::Do1)
}

fn write_latch_next_update(
    bank: &mut RegisterBank,
    payload: &[u8],
) -> Result<Actions, RegisterError> {
    bank.latch_next_update = payload[0];
    Ok(Actions::new())
}

/// DO0/DO1 bits are only host-drivable while their channel is in Digital
/// mode; the remaining outputs always pass through.
fn host_drivable_mask(bank: &RegisterBank, requested: u8) -> u8 {
    let mut mask = requested & bits::DO_MASK;
    if bank.do_conf[0] != DoMode::Digital {
        mask &= !bits::DO0;
    }
    if bank.do_conf[1] != DoMode::Digital {
        mask &= !bits::DO1;
    }
    mask
}

fn write_outputs_set(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    let mask = host_drivable_mask(bank, payload[0]);
    Ok(acts(&[ControlAction::Outputs(OutputsOp::Set, mask)]))
}

fn write_outputs_clear(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    let mask = host_drivable_mask(bank, payload[0]);
    Ok(acts(&[ControlAction::Outputs(OutputsOp::Clear, mask)]))
}

fn write_outputs_toggle(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    let mask = host_drivable_mask(bank, payload[0]);
    Ok(acts(&[ControlAction::Outputs(OutputsOp::Toggle, mask)]))
}

fn write_outputs_out(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    // Channels outside Digital mode keep their current level
    let mut value = payload[0] & bits::DO_MASK;
    if bank.do_conf[0] != DoMode::Digital {
        value = (value & !bits::DO0) | (bank.outputs_out & bits::DO0);
    }
    if bank.do_conf[1] != DoMode::Digital {
        value = (value & !bits::DO1) | (bank.outputs_out & bits::DO1);
    }
    Ok(acts(&[ControlAction::Outputs(OutputsOp::Write, value)]))
}

fn write_pulse_period(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    let value = u16::from_le_bytes([payload[0], payload[1]]);
    if value < 20 {
        return Err(RegisterError::ValueOutOfRange);
    }
    bank.pulse_period_ms = value;
    Ok(Actions::new())
}

fn write_pulse_count(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    bank.pulse_count = payload[0];
    Ok(acts(&[ControlAction::StartPulseTrain]))
}

fn write_event_enable(bank: &mut RegisterBank, payload: &[u8]) -> Result<Actions, RegisterError> {
    let value = payload[0];
    if value & !bits::EVT_MASK != 0 {
        return Err(RegisterError::ValueOutOfRange);
    }
    bank.event_enable = value;
    Ok(Actions::new())
}

#[cfg(test)]
mod tests {
    use super::super::bank::COMBINED_ARRAY_LEN;
    use super::*;

    fn setup() -> (RegisterMap, RegisterBank) {
        (RegisterMap::new(), RegisterBank::new())
    }

    fn addr(reg: Register) -> u8 {
        reg.address()
    }

    #[test]
    fn test_unknown_address_rejected() {
        let (map, mut bank) = setup();
        assert_eq!(
            map.write(&mut bank, 0x10, &[0]),
            Err(RegisterError::UnknownAddress)
        );
        let mut out = [0u8; 1];
        assert_eq!(
            map.read(&mut bank, 38, &mut out),
            Err(RegisterError::UnknownAddress)
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let (map, mut bank) = setup();
        assert_eq!(
            map.write(&mut bank, addr(Register::LedsOnBus), &[1, 2]),
            Err(RegisterError::LengthMismatch)
        );
        assert_eq!(
            map.write(&mut bank, addr(Register::ColorArray), &[0u8; 100]),
            Err(RegisterError::LengthMismatch)
        );
    }

    #[test]
    fn test_leds_on_bus_range() {
        let (map, mut bank) = setup();

        for bad in [0u8, 33, 255] {
            assert_eq!(
                map.write(&mut bank, addr(Register::LedsOnBus), &[bad]),
                Err(RegisterError::ValueOutOfRange)
            );
            // Prior value retained on rejection
            assert_eq!(bank.leds_on_bus, 32);
        }

        map.write(&mut bank, addr(Register::LedsOnBus), &[16]).unwrap();
        assert_eq!(bank.leds_on_bus, 16);
    }

    #[test]
    fn test_leds_status_commands() {
        let (map, mut bank) = setup();

        let actions = map
            .write(&mut bank, addr(Register::LedsStatus), &[bits::RGB_ON])
            .unwrap();
        assert_eq!(
            actions.as_slice(),
            &[
                ControlAction::SetDemoMode(false),
                ControlAction::PulseUpdate
            ]
        );

        let actions = map
            .write(&mut bank, addr(Register::LedsStatus), &[bits::RGB_OFF])
            .unwrap();
        assert_eq!(
            actions.as_slice(),
            &[
                ControlAction::SetDemoMode(false),
                ControlAction::PulseDisable
            ]
        );

        let actions = map
            .write(&mut bank, addr(Register::LedsStatus), &[bits::DEMO_ON])
            .unwrap();
        assert_eq!(actions.as_slice(), &[ControlAction::SetDemoMode(true)]);
    }

    #[test]
    fn test_leds_status_rejects_combined_bits() {
        let (map, mut bank) = setup();
        for bad in [0u8, 3, 5, 0x0F, 0x10, 0xFF] {
            assert_eq!(
                map.write(&mut bank, addr(Register::LedsStatus), &[bad]),
                Err(RegisterError::ValueOutOfRange)
            );
        }
    }

    #[test]
    fn test_color_array_write_forwards() {
        let (map, mut bank) = setup();
        let mut payload = [0u8; COMBINED_ARRAY_LEN];
        payload[0] = 0x11;
        payload[BUS_ARRAY_LEN] = 0x22;

        let actions = map
            .write(&mut bank, addr(Register::ColorArray), &payload)
            .unwrap();
        assert_eq!(
            actions.as_slice(),
            &[
                ControlAction::SetDemoMode(false),
                ControlAction::ForwardArray
            ]
        );
        assert_eq!(bank.color_array[0], 0x11);
        assert_eq!(bank.color_array[BUS_ARRAY_LEN], 0x22);
    }

    #[test]
    fn test_bus_half_writes_land_in_combined() {
        let (map, mut bank) = setup();

        let low = [0xAAu8; BUS_ARRAY_LEN];
        map.write(&mut bank, addr(Register::ColorArrayBus0), &low)
            .unwrap();
        let high = [0xBBu8; BUS_ARRAY_LEN];
        map.write(&mut bank, addr(Register::ColorArrayBus1), &high)
            .unwrap();

        assert!(bank.color_array[..BUS_ARRAY_LEN].iter().all(|b| *b == 0xAA));
        assert!(bank.color_array[BUS_ARRAY_LEN..].iter().all(|b| *b == 0xBB));

        // Half reads come back out of the combined array
        let mut out = [0u8; BUS_ARRAY_LEN];
        map.read(&mut bank, addr(Register::ColorArrayBus1), &mut out)
            .unwrap();
        assert!(out.iter().all(|b| *b == 0xBB));
    }

    #[test]
    fn test_di0_conf_high_on_applies_level() {
        let (map, mut bank) = setup();

        bank.inputs_state = bits::DI0;
        let actions = map
            .write(&mut bank, addr(Register::Di0Conf), &[Di0Mode::HighOn.bits()])
            .unwrap();
        assert!(actions.contains(&ControlAction::PulseUpdate));

        bank.inputs_state = 0;
        let actions = map
            .write(&mut bank, addr(Register::Di0Conf), &[Di0Mode::HighOn.bits()])
            .unwrap();
        assert!(actions.contains(&ControlAction::PulseDisable));

        assert_eq!(
            map.write(&mut bank, addr(Register::Di0Conf), &[7]),
            Err(RegisterError::ValueOutOfRange)
        );
    }

    #[test]
    fn test_do_conf_pulse_mode_clears_line() {
        let (map, mut bank) = setup();
        let actions = map
            .write(
                &mut bank,
                addr(Register::Do0Conf),
                &[DoMode::PulseOnUpdated.bits()],
            )
            .unwrap();
        assert_eq!(
            actions.as_slice(),
            &[ControlAction::Output(DoChannel::Do0, OutputAction::Clear)]
        );
        assert_eq!(bank.do_conf[0], DoMode::PulseOnUpdated);
    }

    #[test]
    fn test_outputs_gated_by_do_conf() {
        let (map, mut bank) = setup();

        // DO0 not in Digital mode: its bit is stripped
        map.write(
            &mut bank,
            addr(Register::Do0Conf),
            &[DoMode::ToggleOnUpdated.bits()],
        )
        .unwrap();

        let actions = map
            .write(&mut bank, addr(Register::OutputsSet), &[bits::DO_MASK])
            .unwrap();
        assert_eq!(
            actions.as_slice(),
            &[ControlAction::Outputs(
                OutputsOp::Set,
                bits::DO_MASK & !bits::DO0
            )]
        );
    }

    #[test]
    fn test_outputs_out_preserves_non_digital_channels() {
        let (map, mut bank) = setup();
        map.write(
            &mut bank,
            addr(Register::Do1Conf),
            &[DoMode::PulseOnLoaded.bits()],
        )
        .unwrap();
        bank.outputs_out = bits::DO1; // DO1 currently high

        let actions = map
            .write(&mut bank, addr(Register::OutputsOut), &[bits::DO2])
            .unwrap();
        assert_eq!(
            actions.as_slice(),
            &[ControlAction::Outputs(
                OutputsOp::Write,
                bits::DO2 | bits::DO1
            )]
        );
    }

    #[test]
    fn test_pulse_period_minimum() {
        let (map, mut bank) = setup();
        assert_eq!(
            map.write(&mut bank, addr(Register::PulsePeriod), &19u16.to_le_bytes()),
            Err(RegisterError::ValueOutOfRange)
        );
        assert_eq!(bank.pulse_period_ms, 100);

        map.write(&mut bank, addr(Register::PulsePeriod), &500u16.to_le_bytes())
            .unwrap();
        assert_eq!(bank.pulse_period_ms, 500);
    }

    #[test]
    fn test_pulse_count_starts_train() {
        let (map, mut bank) = setup();
        let actions = map
            .write(&mut bank, addr(Register::PulseCount), &[5])
            .unwrap();
        assert_eq!(actions.as_slice(), &[ControlAction::StartPulseTrain]);
        assert_eq!(bank.pulse_count, 5);
    }

    #[test]
    fn test_event_enable_mask() {
        let (map, mut bank) = setup();
        assert_eq!(
            map.write(&mut bank, addr(Register::EventEnable), &[0x04]),
            Err(RegisterError::ValueOutOfRange)
        );
        map.write(&mut bank, addr(Register::EventEnable), &[bits::EVT_LED_STATUS])
            .unwrap();
        assert!(bank.led_status_events_enabled());
        assert!(!bank.input_events_enabled());
    }

    #[test]
    fn test_inputs_state_read_only() {
        let (map, mut bank) = setup();
        assert_eq!(
            map.write(&mut bank, addr(Register::InputsState), &[1]),
            Err(RegisterError::ReadOnly)
        );

        bank.inputs_state = bits::DI0;
        let mut out = [0u8; 1];
        map.read(&mut bank, addr(Register::InputsState), &mut out)
            .unwrap();
        assert_eq!(out[0], bits::DI0);
    }

    #[test]
    fn test_control_registers_read_zero() {
        let (map, mut bank) = setup();
        bank.leds_status = bits::RGB_ON;
        let mut out = [0xFFu8; 1];
        map.read(&mut bank, addr(Register::LedsStatus), &mut out)
            .unwrap();
        assert_eq!(out[0], 0);

        map.read(&mut bank, addr(Register::OutputsSet), &mut out)
            .unwrap();
        assert_eq!(out[0], 0);
    }
}
