use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown operation discriminant: {0}")]
    UnknownOp(u32),

    #[error("frame length mismatch: expected {expected} bytes, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("reserved word must be zero, got {0:#010x}")]
    ReservedNotZero(u32),

    #[error("payload of {requested} bytes exceeds the {limit}-byte frame cap")]
    PayloadTooLarge { requested: usize, limit: usize },

    #[error("payload is not valid UTF-8")]
    PayloadNotUtf8,

    #[error("shared allocation of {requested} bytes failed")]
    AllocFailed { requested: usize },
}
