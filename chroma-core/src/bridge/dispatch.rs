//! Per-bus frame preparation
//!
//! The host writes one combined color array; each bus link receives its
//! own half, framed for the driver's decoder. The LED count on the wire
//! is always the LEDS_ON_BUS register, so a driver's notion of strip
//! length follows the master's.

use chroma_protocol::frame::BusCommand;
use heapless::Vec;

use super::BusId;
use crate::registers::{RegisterBank, BUS_ARRAY_LEN};

/// Largest master→driver frame: header + mode + count + one bus half
pub const MAX_BUS_FRAME: usize = 4 + BUS_ARRAY_LEN;

/// An encoded frame ready for one bus link
pub type BusFrame = Vec<u8, MAX_BUS_FRAME>;

fn encode(cmd: &BusCommand<'_>) -> BusFrame {
    let mut buf = [0u8; MAX_BUS_FRAME];
    let mut frame = BusFrame::new();
    // Count is register-validated (1..=32), so encoding cannot fail
    if let Ok(len) = cmd.encode(&mut buf) {
        let _ = frame.extend_from_slice(&buf[..len]);
    }
    frame
}

/// Frame carrying `bus`'s half of the combined color array
pub fn array_frame(bank: &RegisterBank, bus: BusId) -> BusFrame {
    let count = bank.leds_on_bus;
    let (low, high) = bank.bus_halves();
    let half = match bus {
        BusId::Bus0 => low,
        BusId::Bus1 => high,
    };
    encode(&BusCommand::LoadArray {
        count,
        payload: &half[..count as usize * 3],
    })
}

/// Demo trigger frame (identical for both buses)
pub fn demo_frame(bank: &RegisterBank) -> BusFrame {
    encode(&BusCommand::StartDemo {
        count: bank.leds_on_bus,
    })
}

/// Off-color frame (identical for both buses)
pub fn off_color_frame(bank: &RegisterBank) -> BusFrame {
    encode(&BusCommand::SetOffColor {
        count: bank.leds_on_bus,
        color: bank.color_off,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_frame_splits_halves() {
        let mut bank = RegisterBank::new();
        bank.leds_on_bus = 2;
        bank.color_array[..6].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        bank.color_array[BUS_ARRAY_LEN..BUS_ARRAY_LEN + 6]
            .copy_from_slice(&[7, 8, 9, 10, 11, 12]);

        let frame0 = array_frame(&bank, BusId::Bus0);
        assert_eq!(frame0.as_slice(), b"rgb\x02\x01\x02\x03\x04\x05\x06");

        let frame1 = array_frame(&bank, BusId::Bus1);
        assert_eq!(frame1.as_slice(), b"rgb\x02\x07\x08\x09\x0A\x0B\x0C");
    }

    #[test]
    fn test_array_frame_length_tracks_count() {
        let mut bank = RegisterBank::new();
        bank.leds_on_bus = 32;
        let frame = array_frame(&bank, BusId::Bus0);
        assert_eq!(frame.len(), 4 + 32 * 3);
    }

    #[test]
    fn test_demo_and_off_frames() {
        let mut bank = RegisterBank::new();
        bank.leds_on_bus = 8;
        bank.color_off = [5, 6, 7];

        assert_eq!(demo_frame(&bank).as_slice(), b"rgc\x08");
        assert_eq!(off_color_frame(&bank).as_slice(), b"rgd\x08\x05\x06\x07");
    }
}
