//! Driver→master event bridge
//!
//! Translates acknowledgement tokens from the bus links and DI0 edges
//! into register state changes, output-line motion, and host events.

use chroma_protocol::EventToken;

use super::{BusId, ReadyRendezvous};
use crate::registers::{
    bits, Actions, ControlAction, Di0Mode, DoChannel, DoMode, OutputAction, Register, RegisterBank,
};

/// Bridges bus acknowledgements and input edges into control actions
#[derive(Debug, Default)]
pub struct EventBridge {
    rendezvous: ReadyRendezvous,
}

impl EventBridge {
    /// Create with an idle rendezvous
    pub fn new() -> Self {
        Self::default()
    }

    /// A new array dispatch invalidates any half-completed readiness pair
    pub fn on_array_dispatched(&mut self) {
        self.rendezvous.clear();
    }

    /// Process one acknowledgement token from a bus link
    pub fn on_token(&mut self, bus: BusId, token: EventToken, bank: &mut RegisterBank) -> Actions {
        match token {
            EventToken::LoadDone => self.on_load_done(bus, bank),
            EventToken::LedsUpdated => Self::on_leds_updated(bank),
            EventToken::LedsOff => Self::on_leds_off(bank),
        }
    }

    fn on_load_done(&mut self, bus: BusId, bank: &mut RegisterBank) -> Actions {
        let mut actions = Actions::new();

        if !self.rendezvous.report(bus) {
            return actions;
        }

        // Both buses hold a fresh frame: pulse updates per the DI0 gate
        match bank.di0_conf {
            Di0Mode::Sync => {
                let _ = actions.push(ControlAction::PulseUpdate);
            }
            Di0Mode::HighOn if bank.di0_high() => {
                let _ = actions.push(ControlAction::PulseUpdate);
            }
            _ => {}
        }

        for (i, channel) in [DoChannel::Do0, DoChannel::Do1].into_iter().enumerate() {
            match bank.do_conf[i] {
                DoMode::PulseOnLoaded => {
                    let _ = actions.push(ControlAction::Output(channel, OutputAction::Pulse));
                }
                DoMode::ToggleOnLoaded => {
                    let _ = actions.push(ControlAction::Output(channel, OutputAction::Toggle));
                }
                _ => {}
            }
        }

        actions
    }

    fn on_leds_updated(bank: &mut RegisterBank) -> Actions {
        let mut actions = Actions::new();

        if bank.led_status_events_enabled() {
            bank.leds_status = bits::RGB_ON;
            let _ = actions.push(ControlAction::Notify(Register::LedsStatus));
        }

        for (i, channel) in [DoChannel::Do0, DoChannel::Do1].into_iter().enumerate() {
            match bank.do_conf[i] {
                DoMode::PulseOnUpdated => {
                    let _ = actions.push(ControlAction::Output(channel, OutputAction::Pulse));
                }
                DoMode::ToggleOnUpdated => {
                    let _ = actions.push(ControlAction::Output(channel, OutputAction::Toggle));
                }
                _ => {}
            }
        }

        actions
    }

    fn on_leds_off(bank: &mut RegisterBank) -> Actions {
        let mut actions = Actions::new();

        if bank.led_status_events_enabled() {
            bank.leds_status = bits::RGB_OFF;
            let _ = actions.push(ControlAction::Notify(Register::LedsStatus));
        }

        actions
    }

    /// Process a DI0 level change
    pub fn on_input_edge(&mut self, bank: &mut RegisterBank, high: bool) -> Actions {
        let mut actions = Actions::new();

        let state = if high { bits::DI0 } else { 0 };
        if bank.inputs_state == state {
            return actions;
        }
        bank.inputs_state = state;

        if bank.input_events_enabled() {
            let _ = actions.push(ControlAction::Notify(Register::InputsState));
        }

        match bank.di0_conf {
            Di0Mode::RiseUpdate if high => {
                let _ = actions.push(ControlAction::PulseUpdate);
            }
            Di0Mode::HighOn if high => {
                let _ = actions.push(ControlAction::PulseUpdate);
            }
            Di0Mode::HighOn => {
                let _ = actions.push(ControlAction::PulseDisable);
            }
            _ => {}
        }

        actions
    }
}
