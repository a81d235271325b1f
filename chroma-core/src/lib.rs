//! Board-agnostic core logic for the Chroma RGB array controller
//!
//! This crate contains all master-side application logic that does not
//! depend on specific hardware implementations:
//!
//! - The host-visible register bank and its typed handler map
//! - Bus dispatch (splitting the combined color array across two links)
//! - The two-bus readiness rendezvous and driver→master event bridge
//! - The pulse-train generator
//! - The demo animation step generator (consumed by the driver firmware)

#![no_std]
#![deny(unsafe_code)]

pub mod bridge;
pub mod demo;
pub mod pulse;
pub mod registers;
