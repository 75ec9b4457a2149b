use crate::packet::ElementType;

/// Errors returned by the packet builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("type mismatch: packet holds {expected} values, got {found}")]
    TypeMismatch {
        expected: ElementType,
        found: ElementType,
    },

    #[error("capacity exceeded: packet already holds its {count} declared values")]
    CapacityExceeded { count: u8 },

    #[error("incomplete packet: payload is {actual} bytes, expected {expected}")]
    IncompletePacket { expected: usize, actual: usize },

    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Errors returned when turning received bytes back into values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("packet too short: {len} bytes (minimum 3)")]
    TooShort { len: usize },

    #[error("unknown data type code: 0x{0:02X}")]
    UnknownType(u8),

    #[error("invalid element count: 0 (must be 1-255)")]
    InvalidCount,

    #[error(
        "payload size mismatch: got {actual} bytes, expected {expected} bytes (type={element_type}, count={count})"
    )]
    PayloadMismatch {
        expected: usize,
        actual: usize,
        element_type: ElementType,
        count: u8,
    },

    #[error("invalid hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
