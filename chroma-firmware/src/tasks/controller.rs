//! Main controller task
//!
//! Owns the register bank, its dispatch map, the event bridge, and the
//! pulse train. Every mutation flows through here: host register
//! accesses, acknowledgement tokens from the bus links, DI0 edges, and
//! the millisecond tick. Resulting control actions fan out to the pin
//! and bus-link tasks.

use defmt::*;
use embassy_futures::select::{select4, Either4};
use heapless::Vec;
use portable_atomic::Ordering;

use chroma_core::bridge::{array_frame, demo_frame, off_color_frame, BusId, EventBridge};
use chroma_core::pulse::{PulsePhase, PulseTrain};
use chroma_core::registers::{
    bits, Actions, ControlAction, Register, RegisterBank, RegisterMap,
};

use crate::channels::{
    HostEvent, HostReply, HostRequest, PinCommand, BUS_EVENT, BUS_TX, DI0_EVENT, HOST_EVENT,
    HOST_PAYLOAD_MAX, HOST_REPLY, HOST_REQUEST, OUTPUTS_MIRROR, PIN_CMD,
};
use crate::tasks::tick::TICK_SIGNAL;

/// Controller task - main coordination loop
#[embassy_executor::task]
pub async fn controller_task() {
    info!("Controller task started");

    let map = RegisterMap::new();
    let mut bank = RegisterBank::new();
    let mut bridge = EventBridge::new();
    let mut pulse = PulseTrain::new();

    // Push the boot off color to the drivers and blank both strips
    for bus in BusId::ALL {
        BUS_TX[bus.index()].send(off_color_frame(&bank)).await;
    }
    PIN_CMD.send(PinCommand::PulseDisable).await;

    loop {
        match select4(
            HOST_REQUEST.receive(),
            BUS_EVENT.receive(),
            DI0_EVENT.receive(),
            TICK_SIGNAL.wait(),
        )
        .await
        {
            Either4::First(request) => {
                handle_host_request(request, &map, &mut bank, &mut bridge, &mut pulse).await;
            }

            Either4::Second((bus, token)) => {
                trace!("Bus {:?} token: {:?}", bus, token);
                let actions = bridge.on_token(bus, token, &mut bank);
                perform(&actions, &bank, &mut bridge, &mut pulse).await;
            }

            Either4::Third(level) => {
                debug!("DI0 level: {}", level);
                let actions = bridge.on_input_edge(&mut bank, level);
                perform(&actions, &bank, &mut bridge, &mut pulse).await;
            }

            Either4::Fourth(()) => {
                if let Some(phase) = pulse.tick(&mut bank) {
                    // Each pulse phase goes through the same path as a
                    // host LEDS_STATUS command
                    let command = match phase {
                        PulsePhase::On => bits::RGB_ON,
                        PulsePhase::Off => bits::RGB_OFF,
                    };
                    match map.write(&mut bank, Register::LedsStatus.address(), &[command]) {
                        Ok(actions) => perform(&actions, &bank, &mut bridge, &mut pulse).await,
                        Err(e) => warn!("Pulse train status write rejected: {:?}", e),
                    }
                }
            }
        }
    }
}

/// Apply one host register access and answer it
async fn handle_host_request(
    request: HostRequest,
    map: &RegisterMap,
    bank: &mut RegisterBank,
    bridge: &mut EventBridge,
    pulse: &mut PulseTrain,
) {
    match request {
        HostRequest::Read { address } => {
            let mut out = [0u8; HOST_PAYLOAD_MAX];
            let reply = match map.read(bank, address, &mut out) {
                Ok(n) => {
                    let mut value = Vec::new();
                    let _ = value.extend_from_slice(&out[..n]);
                    HostReply::Value { address, value }
                }
                Err(error) => HostReply::Rejected { address, error },
            };
            HOST_REPLY.send(reply).await;
        }
        HostRequest::Write { address, payload } => {
            // Handlers that gate on pin state see fresh levels
            bank.outputs_out = OUTPUTS_MIRROR.load(Ordering::Relaxed);

            match map.write(bank, address, &payload) {
                Ok(actions) => {
                    perform(&actions, bank, bridge, pulse).await;
                    HOST_REPLY.send(HostReply::Written { address }).await;
                }
                Err(error) => {
                    debug!("Register write to {} rejected: {:?}", address, error);
                    HOST_REPLY.send(HostReply::Rejected { address, error }).await;
                }
            }
        }
    }
}

/// Carry out the control actions produced by a dispatch
async fn perform(
    actions: &Actions,
    bank: &RegisterBank,
    bridge: &mut EventBridge,
    pulse: &mut PulseTrain,
) {
    for action in actions {
        match action {
            ControlAction::ForwardArray => {
                bridge.on_array_dispatched();
                for bus in BusId::ALL {
                    BUS_TX[bus.index()].send(array_frame(bank, bus)).await;
                }
            }
            ControlAction::ForwardOffColor => {
                for bus in BusId::ALL {
                    BUS_TX[bus.index()].send(off_color_frame(bank)).await;
                }
            }
            ControlAction::PulseUpdate => {
                PIN_CMD.send(PinCommand::PulseUpdate).await;
            }
            ControlAction::PulseDisable => {
                PIN_CMD.send(PinCommand::PulseDisable).await;
            }
            ControlAction::SetDemoMode(enabled) => {
                PIN_CMD.send(PinCommand::SetDemo(*enabled)).await;
                if *enabled {
                    for bus in BusId::ALL {
                        BUS_TX[bus.index()].send(demo_frame(bank)).await;
                    }
                }
            }
            ControlAction::Output(channel, motion) => {
                PIN_CMD.send(PinCommand::Output(*channel, *motion)).await;
            }
            ControlAction::Outputs(op, mask) => {
                PIN_CMD.send(PinCommand::Outputs(*op, *mask)).await;
            }
            ControlAction::StartPulseTrain => {
                pulse.arm();
            }
            ControlAction::Notify(register) => {
                let value = match register {
                    Register::LedsStatus => bank.leds_status,
                    Register::InputsState => bank.inputs_state,
                    _ => 0,
                };
                let event = HostEvent {
                    register: *register,
                    value,
                };
                // Drop rather than stall the controller on a slow host
                if HOST_EVENT.try_send(event).is_err() {
                    warn!("Host event channel full, dropping event");
                }
            }
        }
    }
}
