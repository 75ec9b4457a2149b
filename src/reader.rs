use crate::decoder::{DecodedPacket, Header, depacketize, depacketize_hex};
use crate::packet::HEADER_LEN;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    Packet { offset: usize, bytes: &'a [u8] },
    /// A byte that does not start a usable frame: its header is invalid, or
    /// claims more bytes than remain while a later offset still holds a
    /// complete frame. The splitter moves past it and tries the next offset.
    Skipped { offset: usize, byte: u8 },
}

/// Splits a buffer of back-to-back packets into frames, sizing each frame
/// from its header.
///
/// After a skipped byte the splitter is resynchronizing: a candidate frame is
/// only accepted when it ends at the end of the buffer, before a tail too
/// short for a header, or right before another valid header.
pub struct FrameSplitter<'a> {
    buffer: &'a [u8],
    pos: usize,
    resyncing: bool,
}

impl<'a> FrameSplitter<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            pos: 0,
            resyncing: false,
        }
    }

    /// Bytes not yet consumed. After iteration ends this is the truncated
    /// tail, if any.
    pub fn remainder(&self) -> &'a [u8] {
        &self.buffer[self.pos..]
    }

    /// Length of the complete frame starting at `pos`, if there is one.
    fn complete_frame_at(&self, pos: usize) -> Option<usize> {
        let rest = &self.buffer[pos..];
        Header::parse(rest)
            .ok()
            .map(|header| header.frame_len())
            .filter(|&len| len <= rest.len())
    }

    fn confirms_frame_end(&self, end: usize) -> bool {
        let rest = &self.buffer[end..];
        rest.len() < HEADER_LEN || Header::parse(rest).is_ok()
    }

    /// Whether any offset after `pos` starts a frame that fits in the buffer.
    /// A header never claims more than `MAX_PACKET_LEN` bytes, so this only
    /// scans the last stretch of the buffer.
    fn complete_frame_after(&self, pos: usize) -> bool {
        let last = self.buffer.len().saturating_sub(HEADER_LEN);
        (pos + 1..=last).any(|p| self.complete_frame_at(p).is_some())
    }
}

impl<'a> Iterator for FrameSplitter<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.remainder();
        if rest.len() < HEADER_LEN {
            return None;
        }

        let offset = self.pos;
        if let Ok(header) = Header::parse(rest) {
            let len = header.frame_len();
            if len <= rest.len() {
                if !self.resyncing || self.confirms_frame_end(offset + len) {
                    self.pos += len;
                    self.resyncing = false;
                    return Some(Frame::Packet {
                        offset,
                        bytes: &rest[..len],
                    });
                }
            } else if !self.complete_frame_after(offset) {
                return None;
            }
        }

        self.pos += 1;
        self.resyncing = true;
        Some(Frame::Skipped {
            offset,
            byte: rest[0],
        })
    }
}

#[derive(Debug, Default)]
pub struct CaptureSummary {
    pub packets: Vec<DecodedPacket>,
    pub skipped_bytes: usize,
    pub trailing_bytes: usize,
}

/// Reads a binary capture of concatenated packets.
pub fn read_capture<F>(file_path: &Path, on_progress: F) -> Result<CaptureSummary>
where
    F: Fn(f32),
{
    let data = std::fs::read(file_path)
        .with_context(|| format!("Failed to read capture {file_path:?}"))?;
    info!(path = ?file_path, size_bytes = data.len(), "Starting capture read");

    let start_time = Instant::now();
    let total = data.len().max(1) as f32;
    let mut last_progress_update = 0;
    let mut summary = CaptureSummary::default();
    let mut splitter = FrameSplitter::new(&data);

    for frame in splitter.by_ref() {
        let offset = match frame {
            Frame::Packet { offset, bytes } => {
                let packet = depacketize(bytes)
                    .with_context(|| format!("Failed to decode packet at offset {offset}"))?;
                debug!(
                    offset,
                    source_address = packet.source_address,
                    element_type = %packet.element_type(),
                    count = packet.element_count(),
                    "Decoded packet"
                );
                summary.packets.push(packet);
                offset
            }
            Frame::Skipped { offset, byte } => {
                debug!(offset, byte, "Byte does not start a packet; skipping");
                summary.skipped_bytes += 1;
                offset
            }
        };

        if offset - last_progress_update > 1_000 {
            on_progress(offset as f32 / total);
            last_progress_update = offset;
        }
    }

    summary.trailing_bytes = splitter.remainder().len();
    if summary.skipped_bytes > 0 {
        warn!(
            path = ?file_path,
            skipped = summary.skipped_bytes,
            "Resynchronized past bytes that did not form a packet"
        );
    }
    if summary.trailing_bytes > 0 {
        warn!(
            path = ?file_path,
            trailing = summary.trailing_bytes,
            "Capture ends with a truncated packet"
        );
    }
    on_progress(1.0);

    info!(
        path = ?file_path,
        packets = summary.packets.len(),
        elapsed_ms = start_time.elapsed().as_millis(),
        "Completed capture read"
    );
    Ok(summary)
}

/// Reads a text capture holding one hex-encoded packet per line. Blank lines
/// and lines starting with `#` are ignored.
pub fn read_hex_lines(file_path: &Path) -> Result<Vec<DecodedPacket>> {
    let text = std::fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read hex capture {file_path:?}"))?;

    let mut packets = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let packet = depacketize_hex(line)
            .with_context(|| format!("{file_path:?} line {}", index + 1))?;
        packets.push(packet);
    }

    info!(path = ?file_path, packets = packets.len(), "Read hex capture");
    Ok(packets)
}
