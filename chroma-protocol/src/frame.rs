//! Bus frame encoding and the byte-at-a-time decoder
//!
//! Frame formats (master → driver):
//! - Array:     `'r' 'g' 'b' <count> <count*3 bytes, R G B per LED>`
//! - Demo:      `'r' 'g' 'c' <count>`
//! - Off color: `'r' 'g' 'd' <count> <r> <g> <b>`
//!
//! There is no frame terminator and no checksum. A driver resynchronizes
//! in two ways only: any byte that does not fit the grammar drops the
//! decoder back to [`Idle`](FrameDecoder::is_idle), and the owning task
//! resets the decoder when the line goes quiet mid-frame (inactivity
//! timeout). A lost frame is silent — the next `'r' 'g'` header starts a
//! fresh decode.

use crate::color::{ChannelOrder, ColorFrame, BYTES_PER_LED, MAX_LEDS};

/// First header byte
pub const HEADER_FIRST: u8 = b'r';

/// Second header byte
pub const HEADER_SECOND: u8 = b'g';

/// Mode byte: full color array follows
pub const MODE_ARRAY: u8 = b'b';

/// Mode byte: start demo animation
pub const MODE_DEMO: u8 = b'c';

/// Mode byte: off-color triplet follows
pub const MODE_OFF_COLOR: u8 = b'd';

/// Maximum payload bytes (array mode, 255 LEDs)
pub const MAX_PAYLOAD: usize = MAX_LEDS * BYTES_PER_LED;

/// Maximum complete frame size (header + mode + count + payload)
pub const MAX_FRAME_SIZE: usize = 4 + MAX_PAYLOAD;

/// Errors that can occur while encoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// LED count must be 1..=255
    CountOutOfRange,
    /// Payload length does not match `count * 3`
    LengthMismatch,
    /// Destination buffer too small
    BufferTooSmall,
}

/// A master-side command ready to be put on a bus link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCommand<'a> {
    /// Load a color array; `payload` is `count * 3` bytes in wire (R,G,B) order
    LoadArray { count: u8, payload: &'a [u8] },
    /// Start the driver's demo animation over `count` LEDs
    StartDemo { count: u8 },
    /// Define the driver's off color
    SetOffColor { count: u8, color: [u8; 3] },
}

impl BusCommand<'_> {
    /// Encode this command into `buf`, returning the number of bytes written
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        let (mode, count, payload_len) = match self {
            BusCommand::LoadArray { count, payload } => {
                if payload.len() != *count as usize * BYTES_PER_LED {
                    return Err(WireError::LengthMismatch);
                }
                (MODE_ARRAY, *count, payload.len())
            }
            BusCommand::StartDemo { count } => (MODE_DEMO, *count, 0),
            BusCommand::SetOffColor { count, .. } => (MODE_OFF_COLOR, *count, BYTES_PER_LED),
        };

        if count == 0 {
            return Err(WireError::CountOutOfRange);
        }
        let frame_len = 4 + payload_len;
        if buf.len() < frame_len {
            return Err(WireError::BufferTooSmall);
        }

        buf[0] = HEADER_FIRST;
        buf[1] = HEADER_SECOND;
        buf[2] = mode;
        buf[3] = count;
        match self {
            BusCommand::LoadArray { payload, .. } => {
                buf[4..4 + payload.len()].copy_from_slice(payload);
            }
            BusCommand::StartDemo { .. } => {}
            BusCommand::SetOffColor { color, .. } => {
                buf[4..7].copy_from_slice(color);
            }
        }

        Ok(frame_len)
    }
}

/// Payload-carrying frame modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum FrameMode {
    Array,
    OffColor,
}

/// Decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum DecodeState {
    /// Scanning for the first header byte
    Idle,
    /// Got `'r'`, waiting for `'g'`
    SawR,
    /// Got `'r' 'g'`, waiting for the mode byte
    SawRg,
    /// Got a valid mode, waiting for the count byte
    GotMode(u8),
    /// Accumulating payload bytes
    Receiving(FrameMode),
}

/// Result of feeding one byte to the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Nothing complete yet
    Pending,
    /// Byte did not fit the grammar; decoder returned to idle
    Rejected,
    /// A full color array, remapped to physical channel order
    Frame { count: u8, frame: ColorFrame },
    /// Demo trigger for `count` LEDs
    DemoTrigger { count: u8 },
    /// New off color (already in physical order) for `count` LEDs
    OffColor { count: u8, color: [u8; 3] },
}

/// State machine turning a raw byte stream into validated bus commands
///
/// Feed one received byte at a time with [`feed`](Self::feed); the decoder
/// never blocks and never requires a higher-level reset. While
/// [`is_idle`](Self::is_idle) is false a frame is in flight and the owning
/// task must keep an inactivity window armed, calling
/// [`reset`](Self::reset) when it expires.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecodeState,
    order: ChannelOrder,
    expected_count: u8,
    buf: heapless::Vec<u8, MAX_PAYLOAD>,
}

impl FrameDecoder {
    /// Create a decoder producing frames in the given physical order
    pub fn new(order: ChannelOrder) -> Self {
        Self {
            state: DecodeState::Idle,
            order,
            expected_count: 0,
            buf: heapless::Vec::new(),
        }
    }

    /// True when no frame is in flight (inactivity timer disarmed)
    pub fn is_idle(&self) -> bool {
        self.state == DecodeState::Idle
    }

    /// Discard any partial frame and return to idle
    ///
    /// Called by the owning task when the inactivity timeout fires.
    pub fn reset(&mut self) {
        self.state = DecodeState::Idle;
        self.expected_count = 0;
        self.buf.clear();
    }

    /// Consume one received byte
    pub fn feed(&mut self, byte: u8) -> Decoded {
        match self.state {
            DecodeState::Idle => {
                if byte == HEADER_FIRST {
                    self.state = DecodeState::SawR;
                }
                // Everything else is inter-frame noise
                Decoded::Pending
            }
            DecodeState::SawR => {
                if byte == HEADER_SECOND {
                    self.state = DecodeState::SawRg;
                    Decoded::Pending
                } else {
                    self.reset();
                    Decoded::Rejected
                }
            }
            DecodeState::SawRg => match byte {
                MODE_ARRAY | MODE_DEMO | MODE_OFF_COLOR => {
                    self.state = DecodeState::GotMode(byte);
                    Decoded::Pending
                }
                _ => {
                    self.reset();
                    Decoded::Rejected
                }
            },
            DecodeState::GotMode(mode) => {
                if byte == 0 {
                    self.reset();
                    return Decoded::Rejected;
                }
                self.expected_count = byte;
                match mode {
                    MODE_DEMO => {
                        let count = self.expected_count;
                        self.reset();
                        Decoded::DemoTrigger { count }
                    }
                    MODE_OFF_COLOR => {
                        self.buf.clear();
                        self.state = DecodeState::Receiving(FrameMode::OffColor);
                        Decoded::Pending
                    }
                    _ => {
                        self.buf.clear();
                        self.state = DecodeState::Receiving(FrameMode::Array);
                        Decoded::Pending
                    }
                }
            }
            DecodeState::Receiving(mode) => {
                // Cannot overflow: expected payload never exceeds MAX_PAYLOAD
                let _ = self.buf.push(byte);
                if self.buf.len() == self.expected_payload_len(mode) {
                    self.complete(mode)
                } else {
                    Decoded::Pending
                }
            }
        }
    }

    fn expected_payload_len(&self, mode: FrameMode) -> usize {
        match mode {
            FrameMode::Array => self.expected_count as usize * BYTES_PER_LED,
            FrameMode::OffColor => BYTES_PER_LED,
        }
    }

    /// Build the completed frame, applying the wire→physical permutation
    fn complete(&mut self, mode: FrameMode) -> Decoded {
        let count = self.expected_count;
        let decoded = match mode {
            FrameMode::Array => {
                let mut frame = ColorFrame::new();
                for led in self.buf.chunks_exact(BYTES_PER_LED) {
                    frame.push(self.order.from_wire([led[0], led[1], led[2]]));
                }
                Decoded::Frame { count, frame }
            }
            FrameMode::OffColor => Decoded::OffColor {
                count,
                color: self.order.from_wire([self.buf[0], self.buf[1], self.buf[2]]),
            },
        };
        self.reset();
        decoded
    }

    /// Feed a byte slice, returning the first completed command, if any
    ///
    /// Remaining bytes after a completed command are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Decoded {
        for &byte in bytes {
            match self.feed(byte) {
                Decoded::Pending | Decoded::Rejected => {}
                done => return done,
            }
        }
        Decoded::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> FrameDecoder {
        FrameDecoder::new(ChannelOrder::Grb)
    }

    #[test]
    fn test_encode_array() {
        let payload = [10, 20, 30, 40, 50, 60];
        let cmd = BusCommand::LoadArray {
            count: 2,
            payload: &payload,
        };
        let mut buf = [0u8; 16];
        let len = cmd.encode(&mut buf).unwrap();

        assert_eq!(len, 10);
        assert_eq!(&buf[..4], b"rgb\x02");
        assert_eq!(&buf[4..10], &payload);
    }

    #[test]
    fn test_encode_demo_and_off() {
        let mut buf = [0u8; 8];

        let len = BusCommand::StartDemo { count: 32 }.encode(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"rgc\x20");

        let len = BusCommand::SetOffColor {
            count: 32,
            color: [1, 2, 3],
        }
        .encode(&mut buf)
        .unwrap();
        assert_eq!(&buf[..len], b"rgd\x20\x01\x02\x03");
    }

    #[test]
    fn test_encode_rejects_bad_input() {
        let mut buf = [0u8; 16];
        assert_eq!(
            BusCommand::StartDemo { count: 0 }.encode(&mut buf),
            Err(WireError::CountOutOfRange)
        );
        assert_eq!(
            BusCommand::LoadArray {
                count: 2,
                payload: &[0; 3]
            }
            .encode(&mut buf),
            Err(WireError::LengthMismatch)
        );
        assert_eq!(
            BusCommand::StartDemo { count: 1 }.encode(&mut buf[..2]),
            Err(WireError::BufferTooSmall)
        );
    }

    #[test]
    fn test_decode_array_applies_permutation() {
        let mut dec = decoder();
        // Two LEDs, wire order R,G,B
        let stream = b"rgb\x02\x01\x02\x03\x0A\x0B\x0C";

        match dec.feed_bytes(stream) {
            Decoded::Frame { count, frame } => {
                assert_eq!(count, 2);
                assert_eq!(frame.pixels(), &[[2, 1, 3], [0x0B, 0x0A, 0x0C]]);
            }
            other => panic!("expected frame, got {:?}", other),
        }
        assert!(dec.is_idle());
    }

    #[test]
    fn test_decode_exact_byte_count() {
        let mut dec = decoder();
        let stream = b"rgb\x01\x07\x08\x09";

        // Nothing completes before the final byte
        for &byte in &stream[..stream.len() - 1] {
            assert!(matches!(dec.feed(byte), Decoded::Pending));
        }
        assert!(matches!(
            dec.feed(stream[stream.len() - 1]),
            Decoded::Frame { count: 1, .. }
        ));
    }

    #[test]
    fn test_decode_demo_trigger() {
        let mut dec = decoder();
        assert_eq!(dec.feed_bytes(b"rgc\x20"), Decoded::DemoTrigger { count: 32 });
        assert!(dec.is_idle());
    }

    #[test]
    fn test_decode_off_color() {
        let mut dec = decoder();
        assert_eq!(
            dec.feed_bytes(b"rgd\x08\x01\x02\x03"),
            Decoded::OffColor {
                count: 8,
                color: [2, 1, 3]
            }
        );
    }

    #[test]
    fn test_garbage_stays_idle() {
        let mut dec = decoder();
        for byte in [0x00, 0xFF, b'g', b'b', 0xA1] {
            assert_eq!(dec.feed(byte), Decoded::Pending);
            assert!(dec.is_idle());
        }
    }

    #[test]
    fn test_bad_mode_resets() {
        let mut dec = decoder();
        assert_eq!(dec.feed(b'r'), Decoded::Pending);
        assert_eq!(dec.feed(b'g'), Decoded::Pending);
        assert_eq!(dec.feed(b'x'), Decoded::Rejected);
        assert!(dec.is_idle());
    }

    #[test]
    fn test_zero_count_resets() {
        let mut dec = decoder();
        assert_eq!(dec.feed_bytes(b"rgb"), Decoded::Pending);
        assert_eq!(dec.feed(0), Decoded::Rejected);
        assert!(dec.is_idle());
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut dec = decoder();
        assert_eq!(dec.feed_bytes(b"rgb\x02\x01\x02"), Decoded::Pending);
        assert!(!dec.is_idle());

        // Inactivity timeout fires
        dec.reset();
        assert!(dec.is_idle());

        // A fresh frame decodes with no residue from the partial one
        match dec.feed_bytes(b"rgb\x01\x09\x09\x09") {
            Decoded::Frame { count, frame } => {
                assert_eq!(count, 1);
                assert_eq!(frame.pixels(), &[[9, 9, 9]]);
            }
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut dec = decoder();
        dec.feed_bytes(b"\x00\xFFr\x12rgq");
        assert!(dec.is_idle());
        assert!(matches!(
            dec.feed_bytes(b"rgb\x01\x01\x02\x03"),
            Decoded::Frame { count: 1, .. }
        ));
    }

    #[test]
    fn test_header_byte_mid_header_resets() {
        let mut dec = decoder();
        // Second 'r' is a mismatch for 'g'; it is consumed, not re-examined
        assert_eq!(dec.feed(b'r'), Decoded::Pending);
        assert_eq!(dec.feed(b'r'), Decoded::Rejected);
        assert!(dec.is_idle());
    }

    #[test]
    fn test_max_count_frame() {
        let mut dec = decoder();
        dec.feed_bytes(b"rgb\xFF");
        let mut result = Decoded::Pending;
        for i in 0..255u16 * 3 {
            result = dec.feed((i % 251) as u8);
        }
        match result {
            Decoded::Frame { count, frame } => {
                assert_eq!(count, 255);
                assert_eq!(frame.len(), 255);
            }
            other => panic!("expected frame, got {:?}", other),
        }
    }
}
