// src/gps/framer.rs
//! Line framing of the raw receiver byte stream

use super::nmea::MAX_LINE_LENGTH;
use tracing::debug;

/// Default line buffer size: one maximum-length line.
pub const LINE_CAPACITY: usize = MAX_LINE_LENGTH;

/// Accumulates bytes into lines, one byte per call.
///
/// A line ends at `\n` or when the buffer is full, whichever comes first, so
/// a stream without terminators can never wedge the framer: it is cut into
/// `capacity`-byte pieces and the decoder rejects them.
#[derive(Debug)]
pub struct LineFramer {
    buf: Box<[u8]>,
    cursor: usize,
    overflows: u64,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_capacity(LINE_CAPACITY)
    }

    /// Capacities below 2 are raised to 2.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(2)].into_boxed_slice(),
            cursor: 0,
            overflows: 0,
        }
    }

    /// Store one byte; return the completed line, terminator included.
    ///
    /// Bytes that are not UTF-8 come out as U+FFFD, which the decoder treats
    /// as a non-printable character.
    pub fn submit_byte(&mut self, byte: u8) -> Option<String> {
        self.buf[self.cursor] = byte;

        let full = self.cursor == self.buf.len() - 1;
        if byte != b'\n' && !full {
            self.cursor += 1;
            return None;
        }

        if byte != b'\n' {
            self.overflows += 1;
            debug!(
                capacity = self.buf.len(),
                "line buffer full without terminator, emitting truncated line"
            );
        }

        let line = String::from_utf8_lossy(&self.buf[..=self.cursor]).into_owned();
        self.cursor = 0;
        Some(line)
    }

    /// Drop any partially received line.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Bytes of the current, unfinished line.
    pub fn pending(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Lines emitted because the buffer filled up.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(framer: &mut LineFramer, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|&b| framer.submit_byte(b)).collect()
    }

    #[test]
    fn test_single_line() {
        let mut framer = LineFramer::new();
        let lines = feed(&mut framer, b"$GPXXX,1,2,3*53\r\n");
        assert_eq!(lines, vec!["$GPXXX,1,2,3*53\r\n".to_string()]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut framer = LineFramer::new();
        assert!(feed(&mut framer, b"$GPXXX,1,").is_empty());
        assert_eq!(framer.pending(), 9);
        let lines = feed(&mut framer, b"2,3*53\n$GP");
        assert_eq!(lines, vec!["$GPXXX,1,2,3*53\n".to_string()]);
        assert_eq!(framer.pending(), 3);
    }

    #[test]
    fn test_truncates_at_capacity() {
        let mut framer = LineFramer::with_capacity(8);
        let lines = feed(&mut framer, b"ABCDEFGHIJ");
        assert_eq!(lines, vec!["ABCDEFGH".to_string()]);
        assert_eq!(framer.pending(), 2);
        assert_eq!(framer.overflows(), 1);

        let lines = feed(&mut framer, b"\n");
        assert_eq!(lines, vec!["IJ\n".to_string()]);
        assert_eq!(framer.overflows(), 1);
    }

    #[test]
    fn test_terminator_in_last_slot_is_not_overflow() {
        let mut framer = LineFramer::with_capacity(4);
        let lines = feed(&mut framer, b"abc\n");
        assert_eq!(lines, vec!["abc\n".to_string()]);
        assert_eq!(framer.overflows(), 0);
    }

    #[test]
    fn test_empty_line() {
        let mut framer = LineFramer::new();
        assert_eq!(feed(&mut framer, b"\n"), vec!["\n".to_string()]);
    }

    #[test]
    fn test_reset_discards_partial_line() {
        let mut framer = LineFramer::new();
        feed(&mut framer, b"$GPGG");
        framer.reset();
        assert_eq!(framer.pending(), 0);
        assert_eq!(feed(&mut framer, b"x\n"), vec!["x\n".to_string()]);
    }

    #[test]
    fn test_minimum_capacity() {
        let mut framer = LineFramer::with_capacity(0);
        assert_eq!(framer.capacity(), 2);
        assert_eq!(feed(&mut framer, b"abc"), vec!["ab".to_string()]);
    }

    #[test]
    fn test_non_utf8_bytes_are_replaced() {
        let mut framer = LineFramer::new();
        let lines = feed(&mut framer, b"$GP\xffX\n");
        assert_eq!(lines, vec!["$GP\u{fffd}X\n".to_string()]);
    }
}
