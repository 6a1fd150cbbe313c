use serde::{Deserialize, Serialize};

use crate::error::WireError;
use crate::marshal::{SharedAlloc, SharedStr};

/// Operation kinds understood by the destination runtime's decoder.
///
/// Discriminant values are part of the wire contract; append-only.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Connect = 0,
    Send = 1,
    Recv = 2,
    Close = 3,
    Stdout = 4,
    Stderr = 5,
    Spawn = 6,
    Cast = 7,
    Time = 8,
    Exit = 9,
}

impl OpKind {
    pub fn from_u32(raw: u32) -> Result<OpKind, WireError> {
        Ok(match raw {
            0 => OpKind::Connect,
            1 => OpKind::Send,
            2 => OpKind::Recv,
            3 => OpKind::Close,
            4 => OpKind::Stdout,
            5 => OpKind::Stderr,
            6 => OpKind::Spawn,
            7 => OpKind::Cast,
            8 => OpKind::Time,
            9 => OpKind::Exit,
            _ => return Err(WireError::UnknownOp(raw)),
        })
    }
}

/// Frame header: `op | payload_len | correlation_id | timeout_ms | reserved`,
/// all `u32` little-endian. The payload bytes follow immediately.
pub const FRAME_HEADER_LEN: usize = 20;

/// Largest payload `decode` accepts.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024 * 1024;

/// A dispatched message: one operation crossing the runtime boundary.
///
/// The value is moved into the delivery interface at send time and the
/// sender keeps nothing. Destination decoders consume the frame layout
/// directly, so field order and widths are load-bearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub op: OpKind,
    pub payload: SharedStr,
    pub correlation_id: u32,
    pub timeout_ms: u32,
}

impl Envelope {
    pub fn new(op: OpKind, payload: SharedStr, correlation_id: u32, timeout_ms: u32) -> Envelope {
        Envelope { op, payload, correlation_id, timeout_ms }
    }

    /// Serialize to the frame layout the destination decoder expects.
    pub fn encode(&self) -> Vec<u8> {
        let text = self.payload.text_bytes();
        debug_assert!(text.len() <= MAX_PAYLOAD_LEN, "payload exceeds the frame cap");
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + text.len());
        frame.extend_from_slice(&(self.op as u32).to_le_bytes());
        frame.extend_from_slice(&(text.len() as u32).to_le_bytes());
        frame.extend_from_slice(&self.correlation_id.to_le_bytes());
        frame.extend_from_slice(&self.timeout_ms.to_le_bytes());
        frame.extend_from_slice(&0u32.to_le_bytes());
        frame.extend_from_slice(text);
        frame
    }

    /// Decode one complete frame, allocating the payload through `alloc`.
    pub fn decode(frame: &[u8], alloc: &dyn SharedAlloc) -> Result<Envelope, WireError> {
        if frame.len() < FRAME_HEADER_LEN {
            return Err(WireError::LengthMismatch { expected: FRAME_HEADER_LEN, got: frame.len() });
        }
        let word = |i: usize| {
            let bytes: [u8; 4] = frame[i * 4..i * 4 + 4].try_into().expect("4-byte word");
            u32::from_le_bytes(bytes)
        };

        let op = OpKind::from_u32(word(0))?;
        let payload_len = word(1) as usize;
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(WireError::PayloadTooLarge { requested: payload_len, limit: MAX_PAYLOAD_LEN });
        }
        let correlation_id = word(2);
        let timeout_ms = word(3);
        let reserved = word(4);
        if reserved != 0 {
            return Err(WireError::ReservedNotZero(reserved));
        }

        let expected = FRAME_HEADER_LEN + payload_len;
        if frame.len() != expected {
            return Err(WireError::LengthMismatch { expected, got: frame.len() });
        }
        let text = std::str::from_utf8(&frame[FRAME_HEADER_LEN..expected])
            .map_err(|_| WireError::PayloadNotUtf8)?;
        let payload = SharedStr::marshal(alloc, text)?;

        Ok(Envelope { op, payload, correlation_id, timeout_ms })
    }
}
