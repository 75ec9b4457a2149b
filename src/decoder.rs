use crate::error::{DecodeError, PacketError};
use crate::packet::{Element, ElementType, HEADER_LEN, Packet};
use std::fmt;
use tracing::trace;


#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Int8(Vec<u8>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl Values {
    pub fn element_type(&self) -> ElementType {
        match self {
            Values::Int8(_) => ElementType::Int8,
            Values::Float32(_) => ElementType::Float32,
            Values::Float64(_) => ElementType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Int8(v) => v.len(),
            Values::Float32(v) => v.len(),
            Values::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Values::Int8(v) => write!(f, "{v:?}"),
            Values::Float32(v) => write!(f, "{v:?}"),
            Values::Float64(v) => write!(f, "{v:?}"),
        }
    }
}

/// A packet received off the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPacket {
    pub source_address: u8,
    pub values: Values,
}

impl DecodedPacket {
    pub fn element_type(&self) -> ElementType {
        self.values.element_type()
    }

    pub fn element_count(&self) -> usize {
        self.values.len()
    }

    /// Rebuilds a full [`Packet`] holding the same values.
    pub fn to_packet(&self) -> Result<Packet, PacketError> {
        let mut packet =
            Packet::with_count(self.source_address, self.element_type(), self.element_count())?;
        match &self.values {
            Values::Int8(v) => packet.extend(v.iter().copied())?,
            Values::Float32(v) => packet.extend(v.iter().copied())?,
            Values::Float64(v) => packet.extend(v.iter().copied())?,
        }
        Ok(packet)
    }
}

impl fmt::Display for DecodedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source Address: {}", self.source_address)?;
        writeln!(f, "Data Type: {}", self.element_type())?;
        writeln!(f, "Element Count: {}", self.element_count())?;
        write!(f, "Values: {}", self.values)
    }
}

/// Header fields of a frame, validated but without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub source_address: u8,
    pub element_type: ElementType,
    pub element_count: u8,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_LEN {
            return Err(DecodeError::TooShort { len: bytes.len() });
        }
        let element_type =
            ElementType::try_from(bytes[1]).map_err(|_| DecodeError::UnknownType(bytes[1]))?;
        if bytes[2] == 0 {
            return Err(DecodeError::InvalidCount);
        }
        Ok(Self {
            source_address: bytes[0],
            element_type,
            element_count: bytes[2],
        })
    }

    pub fn payload_len(&self) -> usize {
        self.element_count as usize * self.element_type.width()
    }

    pub fn frame_len(&self) -> usize {
        HEADER_LEN + self.payload_len()
    }
}

fn decode_values<T: Element>(payload: &[u8]) -> Vec<T> {
    payload
        .chunks_exact(T::TYPE.width())
        .map_while(T::from_le_chunk)
        .collect()
}

pub fn depacketize(bytes: &[u8]) -> Result<DecodedPacket, DecodeError> {
    let header = Header::parse(bytes).inspect_err(|err| {
        trace!(error = %err, len = bytes.len(), "Rejected packet header");
    })?;

    let payload = &bytes[HEADER_LEN..];
    let expected = header.payload_len();
    if payload.len() != expected {
        trace!(expected, actual = payload.len(), "Payload size mismatch");
        return Err(DecodeError::PayloadMismatch {
            expected,
            actual: payload.len(),
            element_type: header.element_type,
            count: header.element_count,
        });
    }

    let values = match header.element_type {
        ElementType::Int8 => Values::Int8(decode_values(payload)),
        ElementType::Float32 => Values::Float32(decode_values(payload)),
        ElementType::Float64 => Values::Float64(decode_values(payload)),
    };

    Ok(DecodedPacket {
        source_address: header.source_address,
        values,
    })
}

/// Decodes a packet written as hex, e.g. `"01 01 03 19 3C 0D"`.
pub fn depacketize_hex(text: &str) -> Result<DecodedPacket, DecodeError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = hex::decode(compact)?;
    depacketize(&bytes)
}

pub fn depacketize_batch<B: AsRef<[u8]>>(packets: &[B]) -> Result<Vec<DecodedPacket>, DecodeError> {
    packets.iter().map(|p| depacketize(p.as_ref())).collect()
}
