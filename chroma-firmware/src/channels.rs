//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy
//! tasks, plus the request/reply/event surface the external host
//! register core plugs into.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use portable_atomic::AtomicU8;

use chroma_core::bridge::{BusFrame, BusId};
use chroma_core::registers::{
    DoChannel, OutputAction, OutputsOp, Register, RegisterError, COMBINED_ARRAY_LEN,
};
use chroma_protocol::EventToken;

/// Largest host register payload (the combined color array)
pub const HOST_PAYLOAD_MAX: usize = COMBINED_ARRAY_LEN;

/// A register access arriving from the host transport
pub enum HostRequest {
    Read {
        address: u8,
    },
    Write {
        address: u8,
        payload: Vec<u8, HOST_PAYLOAD_MAX>,
    },
}

/// Controller's answer to a [`HostRequest`]
pub enum HostReply {
    Value {
        address: u8,
        value: Vec<u8, HOST_PAYLOAD_MAX>,
    },
    Written {
        address: u8,
    },
    Rejected {
        address: u8,
        error: RegisterError,
    },
}

/// Asynchronous register event pushed toward the host
pub struct HostEvent {
    pub register: Register,
    pub value: u8,
}

/// Pin motions requested by the controller
pub enum PinCommand {
    /// Brief pulse on both Update lines
    PulseUpdate,
    /// Brief pulse on both Disable lines
    PulseDisable,
    /// Level on both DemoEnable lines
    SetDemo(bool),
    /// Move one configurable output
    Output(DoChannel, OutputAction),
    /// Mask operation on the whole output port
    Outputs(OutputsOp, u8),
}

/// Host register accesses (fed by the external register core)
pub static HOST_REQUEST: Channel<CriticalSectionRawMutex, HostRequest, 4> = Channel::new();

/// Replies to host register accesses
pub static HOST_REPLY: Channel<CriticalSectionRawMutex, HostReply, 4> = Channel::new();

/// Outward event notifications
pub static HOST_EVENT: Channel<CriticalSectionRawMutex, HostEvent, 8> = Channel::new();

/// Frames queued for each bus link, indexed by `BusId::index()`
pub static BUS_TX: [Channel<CriticalSectionRawMutex, BusFrame, 4>; 2] =
    [Channel::new(), Channel::new()];

/// Acknowledgement tokens arriving from the bus links
pub static BUS_EVENT: Channel<CriticalSectionRawMutex, (BusId, EventToken), 8> = Channel::new();

/// DI0 level changes (true = high)
pub static DI0_EVENT: Channel<CriticalSectionRawMutex, bool, 4> = Channel::new();

/// Pin motions for the pins task
pub static PIN_CMD: Channel<CriticalSectionRawMutex, PinCommand, 8> = Channel::new();

/// Mirror of the output port levels, maintained by the pins task
pub static OUTPUTS_MIRROR: AtomicU8 = AtomicU8::new(0);
