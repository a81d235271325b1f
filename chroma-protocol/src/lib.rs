//! Bus Communication Protocol
//!
//! This crate defines the UART-based protocol between the Chroma master
//! (register-bank holder) and its bus driver boards, plus the single-byte
//! acknowledgement tokens flowing the other way.
//!
//! # Protocol Overview
//!
//! Master → driver messages are header-framed byte sequences:
//! ```text
//! ┌─────┬─────┬──────┬───────┬──────────────────────┐
//! │ 'r' │ 'g' │ MODE │ COUNT │ PAYLOAD              │
//! │ 1B  │ 1B  │ 1B   │ 1B    │ mode-specific        │
//! └─────┴─────┴──────┴───────┴──────────────────────┘
//! ```
//! Mode `'b'` carries `COUNT * 3` color bytes, mode `'c'` (demo trigger)
//! carries nothing, mode `'d'` carries one off-color triplet.
//!
//! There is no terminator and no checksum; the receiving side recovers
//! from garbage and truncated frames purely through an inactivity timeout
//! (see [`FrameDecoder`]).
//!
//! Driver → master traffic is single [`EventToken`] bytes, fire-and-forget.

#![no_std]
#![deny(unsafe_code)]

pub mod color;
pub mod events;
pub mod frame;

pub use color::{ChannelOrder, ColorFrame, BYTES_PER_LED, MAX_LEDS};
pub use events::EventToken;
pub use frame::{BusCommand, Decoded, FrameDecoder, WireError, MAX_FRAME_SIZE};
