//! Builds packets from readings given as text, as the command line receives
//! them.

use crate::packet::{ElementType, Packet};
use anyhow::{Context, Result};
use tracing::warn;


/// Parses an integer reading and keeps its low 8 bits, so 1013 becomes 0xF5
/// and -1 becomes 0xFF.
pub fn parse_int8(raw: &str) -> Result<u8> {
    let wide: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid int8 value {raw:?}"))?;
    let byte = wide as u8;
    if i64::from(byte) != wide {
        warn!(value = wide, truncated = byte, "Value wider than 8 bits; keeping low byte");
    }
    Ok(byte)
}

pub fn build_packet<S: AsRef<str>>(
    address: u8,
    element_type: ElementType,
    values: &[S],
) -> Result<Packet> {
    let mut packet = Packet::with_count(address, element_type, values.len())?;

    for raw in values {
        let raw = raw.as_ref().trim();
        match element_type {
            ElementType::Int8 => packet.push_int8(parse_int8(raw)?)?,
            ElementType::Float32 => {
                let value: f32 = raw
                    .parse()
                    .with_context(|| format!("Invalid float32 value {raw:?}"))?;
                packet.push_float32(value)?;
            }
            ElementType::Float64 => {
                let value: f64 = raw
                    .parse()
                    .with_context(|| format!("Invalid float64 value {raw:?}"))?;
                packet.push_float64(value)?;
            }
        }
    }

    Ok(packet)
}
