//! Fixed-format sensor packet builder.
//!
//! Wire layout:
//!
//! ```text
//! offset 0   source address   (1 byte)
//! offset 1   element type tag (1 byte, 0x01 int8, 0x02 float32, 0x03 float64)
//! offset 2   element count    (1 byte, 1..=255)
//! offset 3.. payload          (count * width bytes, little-endian, no padding)
//! ```

use crate::error::PacketError;
use std::fmt;


pub const HEADER_LEN: usize = 3;
pub const MAX_ELEMENTS: usize = u8::MAX as usize;
pub const MAX_WIDTH: usize = 8;
pub const MAX_PAYLOAD_LEN: usize = MAX_ELEMENTS * MAX_WIDTH;
pub const MAX_PACKET_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LEN;

/// The scalar type shared by every value of one packet.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8 = 0x01,
    Float32 = 0x02,
    Float64 = 0x03,
}

impl ElementType {
    pub const ALL: [ElementType; 3] = [ElementType::Int8, ElementType::Float32, ElementType::Float64];

    /// Byte width of a single element on the wire.
    pub const fn width(self) -> usize {
        match self {
            ElementType::Int8 => 1,
            ElementType::Float32 => 4,
            ElementType::Float64 => 8,
        }
    }

    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            ElementType::Int8 => "int8",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
        }
    }
}

impl TryFrom<u8> for ElementType {
    type Error = PacketError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x01 => Ok(ElementType::Int8),
            0x02 => Ok(ElementType::Float32),
            0x03 => Ok(ElementType::Float64),
            other => Err(PacketError::InvalidArgument(format!(
                "unknown element type tag 0x{other:02X}"
            ))),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A scalar that can be stored in a packet.
///
/// Implemented for `u8` (int8 packets), `f32` and `f64` only.
pub trait Element: sealed::Sealed + Copy {
    const TYPE: ElementType;

    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes one element from exactly `Self::TYPE.width()` bytes; any other
    /// length yields `None`.
    fn from_le_chunk(chunk: &[u8]) -> Option<Self>;
}

impl Element for u8 {
    const TYPE: ElementType = ElementType::Int8;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    fn from_le_chunk(chunk: &[u8]) -> Option<Self> {
        match chunk {
            [byte] => Some(*byte),
            _ => None,
        }
    }
}

impl Element for f32 {
    const TYPE: ElementType = ElementType::Float32;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn from_le_chunk(chunk: &[u8]) -> Option<Self> {
        chunk.try_into().ok().map(f32::from_le_bytes)
    }
}

impl Element for f64 {
    const TYPE: ElementType = ElementType::Float64;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn from_le_chunk(chunk: &[u8]) -> Option<Self> {
        chunk.try_into().ok().map(f64::from_le_bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketState {
    Empty,
    Filling,
    Full,
}

/// A packet under construction.
///
/// The element type and count are fixed at creation. Values are appended
/// one at a time until the declared count is reached, after which the
/// packet can be serialized any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    source_address: u8,
    element_type: ElementType,
    element_count: u8,
    payload: Vec<u8>,
}

impl Packet {
    pub fn new(
        source_address: u8,
        element_type: ElementType,
        element_count: u8,
    ) -> Result<Self, PacketError> {
        if element_count == 0 {
            return Err(PacketError::InvalidArgument(
                "element count must be between 1 and 255, got 0".to_string(),
            ));
        }

        Ok(Self {
            source_address,
            element_type,
            element_count,
            payload: Vec::with_capacity(element_count as usize * element_type.width()),
        })
    }

    /// Like [`Packet::new`] for callers holding the count in a wider integer.
    pub fn with_count(
        source_address: u8,
        element_type: ElementType,
        element_count: usize,
    ) -> Result<Self, PacketError> {
        let count = u8::try_from(element_count).map_err(|_| {
            PacketError::InvalidArgument(format!(
                "element count must be between 1 and 255, got {element_count}"
            ))
        })?;
        Self::new(source_address, element_type, count)
    }

    pub fn source_address(&self) -> u8 {
        self.source_address
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn element_count(&self) -> u8 {
        self.element_count
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Number of values appended so far.
    pub fn len(&self) -> usize {
        self.payload.len() / self.element_type.width()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Number of values still needed before the packet is full.
    pub fn remaining(&self) -> usize {
        self.element_count as usize - self.len()
    }

    pub fn state(&self) -> PacketState {
        match self.len() {
            0 => PacketState::Empty,
            n if n < self.element_count as usize => PacketState::Filling,
            _ => PacketState::Full,
        }
    }

    /// Size of the serialized packet once full: header plus declared payload.
    pub fn wire_len(&self) -> usize {
        HEADER_LEN + self.expected_payload_len()
    }

    fn expected_payload_len(&self) -> usize {
        self.element_count as usize * self.element_type.width()
    }

    pub fn push<T: Element>(&mut self, value: T) -> Result<(), PacketError> {
        self.check_room::<T>(1)?;
        value.write_le(&mut self.payload);
        Ok(())
    }

    /// Appends an int8 value. Wider readings must be truncated to their low
    /// byte by the caller.
    pub fn push_int8(&mut self, value: u8) -> Result<(), PacketError> {
        self.push(value)
    }

    pub fn push_float32(&mut self, value: f32) -> Result<(), PacketError> {
        self.push(value)
    }

    pub fn push_float64(&mut self, value: f64) -> Result<(), PacketError> {
        self.push(value)
    }

    /// Appends all values or none of them.
    pub fn extend<T, I>(&mut self, values: I) -> Result<(), PacketError>
    where
        T: Element,
        I: IntoIterator<Item = T>,
    {
        let values: Vec<T> = values.into_iter().collect();
        self.check_room::<T>(values.len())?;
        for value in values {
            value.write_le(&mut self.payload);
        }
        Ok(())
    }

    fn check_room<T: Element>(&self, additional: usize) -> Result<(), PacketError> {
        if T::TYPE != self.element_type {
            return Err(PacketError::TypeMismatch {
                expected: self.element_type,
                found: T::TYPE,
            });
        }

        let width = self.element_type.width();
        let over_count = self.len() + additional > self.element_count as usize;
        let over_bytes = self.payload.len() + additional * width > MAX_ELEMENTS * width;
        if over_count || over_bytes {
            return Err(PacketError::CapacityExceeded {
                count: self.element_count,
            });
        }
        Ok(())
    }

    fn check_complete(&self) -> Result<(), PacketError> {
        let expected = self.expected_payload_len();
        if self.payload.len() != expected {
            return Err(PacketError::IncompletePacket {
                expected,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    fn header(&self) -> [u8; HEADER_LEN] {
        [
            self.source_address,
            self.element_type.tag(),
            self.element_count,
        ]
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        self.check_complete()?;

        let mut bytes = Vec::with_capacity(self.wire_len());
        bytes.extend_from_slice(&self.header());
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }

    /// Writes the serialized packet to the front of `buffer` and returns the
    /// number of bytes written.
    pub fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        self.check_complete()?;

        let needed = self.wire_len();
        if buffer.len() < needed {
            return Err(PacketError::BufferTooSmall {
                needed,
                available: buffer.len(),
            });
        }

        buffer[..HEADER_LEN].copy_from_slice(&self.header());
        buffer[HEADER_LEN..needed].copy_from_slice(&self.payload);
        Ok(needed)
    }
}
