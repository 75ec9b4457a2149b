use super::*;
use crate::decoder::Values;
use crate::packet::{ElementType, Packet};
use std::cell::Cell;
use std::io::Write;

fn int8_frame(address: u8, values: &[u8]) -> Vec<u8> {
    let mut packet = Packet::with_count(address, ElementType::Int8, values.len()).unwrap();
    packet.extend(values.iter().copied()).unwrap();
    packet.serialize().unwrap()
}

fn float32_frame(address: u8, values: &[f32]) -> Vec<u8> {
    let mut packet = Packet::with_count(address, ElementType::Float32, values.len()).unwrap();
    packet.extend(values.iter().copied()).unwrap();
    packet.serialize().unwrap()
}

#[test]
fn splitter_yields_back_to_back_frames() {
    let first = int8_frame(1, &[25, 60, 13]);
    let second = float32_frame(2, &[3.3, 2.5]);
    let stream = [first.clone(), second.clone()].concat();

    let mut splitter = FrameSplitter::new(&stream);
    assert_eq!(
        splitter.next(),
        Some(Frame::Packet {
            offset: 0,
            bytes: &first[..]
        })
    );
    assert_eq!(
        splitter.next(),
        Some(Frame::Packet {
            offset: 6,
            bytes: &second[..]
        })
    );
    assert_eq!(splitter.next(), None);
    assert!(splitter.remainder().is_empty());
}

#[test]
fn splitter_skips_bytes_with_bad_headers() {
    let frame = int8_frame(4, &[9]);
    // 0x07 0x00 0x00: unknown tag, so the splitter walks forward one byte at a time.
    let stream = [vec![0x07, 0x00, 0x00], frame.clone()].concat();

    let frames: Vec<_> = FrameSplitter::new(&stream).collect();
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0], Frame::Skipped { offset: 0, byte: 0x07 });
    assert_eq!(frames[1], Frame::Skipped { offset: 1, byte: 0x00 });
    assert_eq!(frames[2], Frame::Skipped { offset: 2, byte: 0x00 });
    assert_eq!(
        frames[3],
        Frame::Packet {
            offset: 3,
            bytes: &frame[..]
        }
    );
}

#[test]
fn splitter_stops_at_truncated_tail() {
    let frame = int8_frame(1, &[1, 2]);
    let stream = [frame.clone(), vec![0x02, 0x02, 0x02, 0x00, 0x00]].concat();

    let mut splitter = FrameSplitter::new(&stream);
    assert!(matches!(splitter.next(), Some(Frame::Packet { .. })));
    assert_eq!(splitter.next(), None);
    assert_eq!(splitter.remainder(), &[0x02, 0x02, 0x02, 0x00, 0x00]);
}

#[test]
fn splitter_resyncs_past_header_claiming_too_many_bytes() {
    let frame = int8_frame(1, &[25, 60, 13]);
    // 05 03 FF reads as a float64 header for 255 values, far past the end.
    let stream = [vec![0x05, 0x03, 0xFF], frame.clone()].concat();

    let mut splitter = FrameSplitter::new(&stream);
    let frames: Vec<_> = splitter.by_ref().collect();

    assert_eq!(
        frames,
        vec![
            Frame::Skipped { offset: 0, byte: 0x05 },
            Frame::Skipped { offset: 1, byte: 0x03 },
            // FF 01 01 03 would fit, but it is followed by bytes that are not a header.
            Frame::Skipped { offset: 2, byte: 0xFF },
            Frame::Packet {
                offset: 3,
                bytes: &frame[..]
            },
        ]
    );
    assert!(splitter.remainder().is_empty());
}

#[test]
fn splitter_keeps_every_packet_after_oversized_noise() {
    let first = int8_frame(1, &[25, 60, 13]);
    let second = float32_frame(2, &[3.3, 2.5]);
    let stream = [vec![0x05, 0x03, 0xFF], first.clone(), second.clone()].concat();

    let packets: Vec<_> = FrameSplitter::new(&stream)
        .filter_map(|frame| match frame {
            Frame::Packet { bytes, .. } => Some(bytes),
            Frame::Skipped { .. } => None,
        })
        .collect();

    assert_eq!(packets, vec![&first[..], &second[..]]);
}

#[test]
fn read_capture_recovers_packets_after_oversized_noise() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0x05, 0x03, 0xFF]).unwrap();
    file.write_all(&int8_frame(1, &[25, 60, 13])).unwrap();
    file.flush().unwrap();

    let summary = read_capture(file.path(), |_| {}).unwrap();
    assert_eq!(summary.packets.len(), 1);
    assert_eq!(summary.packets[0].values, Values::Int8(vec![25, 60, 13]));
    assert_eq!(summary.skipped_bytes, 3);
    assert_eq!(summary.trailing_bytes, 0);
}

#[test]
fn read_capture_decodes_file_and_reports_progress() {
    let mut file = tempfile::NamedTempFile::new().expect("temp capture");
    for address in 0..200u8 {
        file.write_all(&float32_frame(address, &[f32::from(address), 0.5]))
            .unwrap();
    }
    file.write_all(&[0x00, 0x09]).unwrap();
    file.flush().unwrap();

    let updates = Cell::new(0usize);
    let last = Cell::new(0.0f32);
    let summary = read_capture(file.path(), |progress| {
        updates.set(updates.get() + 1);
        last.set(progress);
    })
    .expect("read capture");

    assert_eq!(summary.packets.len(), 200);
    assert_eq!(summary.skipped_bytes, 0);
    assert_eq!(summary.trailing_bytes, 2);
    assert_eq!(summary.packets[10].source_address, 10);
    assert_eq!(summary.packets[10].values, Values::Float32(vec![10.0, 0.5]));
    assert!(updates.get() > 1, "expected intermediate progress updates");
    assert_eq!(last.get(), 1.0);
}

#[test]
fn read_capture_counts_skipped_bytes() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0x00, 0x00]).unwrap();
    file.write_all(&int8_frame(0x10, &[1, 2, 3])).unwrap();
    file.flush().unwrap();

    let summary = read_capture(file.path(), |_| {}).unwrap();
    assert_eq!(summary.skipped_bytes, 2);
    assert_eq!(summary.packets.len(), 1);
    assert_eq!(summary.packets[0].values, Values::Int8(vec![1, 2, 3]));
}

#[test]
fn read_capture_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_capture(&dir.path().join("missing.bin"), |_| {}).unwrap_err();
    assert!(err.to_string().contains("Failed to read capture"));
}

#[test]
fn read_hex_lines_skips_comments_and_blanks() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# capture from unit 1").unwrap();
    writeln!(file, "01 01 03 19 3C 0D").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "01020200 00803f00 002040").unwrap();
    file.flush().unwrap();

    let packets = read_hex_lines(file.path()).unwrap();
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0].values, Values::Int8(vec![25, 60, 13]));
    assert_eq!(packets[1].values, Values::Float32(vec![1.0, 2.5]));
}

#[test]
fn read_hex_lines_names_the_failing_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "01 01 01 2A").unwrap();
    writeln!(file, "0101").unwrap();
    file.flush().unwrap();

    let err = read_hex_lines(file.path()).unwrap_err();
    assert!(err.to_string().contains("line 2"), "got: {err}");
    assert!(format!("{err:#}").contains("too short"));
}
