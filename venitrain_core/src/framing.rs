//! Byte-stream to line framing.
//!
//! The serial link delivers arbitrary chunks: a telemetry line may be split
//! across reads, a read may carry several lines, and a multi-byte UTF-8
//! character may straddle two reads. `FrameAssembler` decodes incrementally,
//! keeps the trailing fragment, and yields complete lines lazily while echoing
//! them into a bounded `RawLineLog`.

use std::collections::VecDeque;

/// Default capacity of the raw-line echo buffer.
pub const DEFAULT_RAW_LINE_CAPACITY: usize = 100;

/// Incremental UTF-8 decoder.
///
/// Incomplete trailing sequences are carried to the next call; invalid
/// sequences are replaced with U+FFFD and decoding continues.
#[derive(Debug, Default, Clone)]
pub struct Utf8StreamDecoder {
    carry: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk` and append the text to `out`.
    pub fn decode(&mut self, chunk: &[u8], out: &mut String) {
        if self.carry.is_empty() {
            let tail = decode_slice(chunk, out);
            self.carry.extend_from_slice(&chunk[chunk.len() - tail..]);
        } else {
            let mut buf = std::mem::take(&mut self.carry);
            buf.extend_from_slice(chunk);
            let tail = decode_slice(&buf, out);
            buf.drain(..buf.len() - tail);
            self.carry = buf;
        }
    }

    /// Flush a dangling partial sequence as a replacement character.
    pub fn finish(&mut self, out: &mut String) {
        if !self.carry.is_empty() {
            self.carry.clear();
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }

    /// Bytes currently held back waiting for the rest of a sequence.
    pub fn carried(&self) -> usize {
        self.carry.len()
    }

    pub fn reset(&mut self) {
        self.carry.clear();
    }
}

/// Decode as much of `input` as possible into `out`; returns the length of an
/// incomplete trailing sequence that must be retried with more bytes.
fn decode_slice(mut input: &[u8], out: &mut String) -> usize {
    loop {
        match std::str::from_utf8(input) {
            Ok(s) => {
                out.push_str(s);
                return 0;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(std::str::from_utf8(&input[..valid]).unwrap_or_default());
                match e.error_len() {
                    Some(bad) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        input = &input[valid + bad..];
                    }
                    None => return input.len() - valid,
                }
            }
        }
    }
}

/// Bounded log of raw lines for diagnostic echo.
///
/// Tracks how many of the stored lines have already been handed to the
/// telemetry parser; the cursor is shifted down on eviction so it keeps
/// pointing at the same logical line.
#[derive(Debug, Clone)]
pub struct RawLineLog {
    lines: VecDeque<String>,
    capacity: usize,
    processed: usize,
}

impl Default for RawLineLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RAW_LINE_CAPACITY)
    }
}

impl RawLineLog {
    /// Capacity is clamped to at least one line.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            processed: 0,
        }
    }

    /// Append a line, evicting the oldest entries beyond capacity.
    /// Returns the number of evicted lines.
    pub fn push(&mut self, line: String) -> usize {
        self.lines.push_back(line);
        let mut evicted = 0;
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
            evicted += 1;
        }
        self.processed = self.processed.saturating_sub(evicted);
        evicted
    }

    /// Mark every stored line as processed.
    pub fn mark_processed(&mut self) {
        self.processed = self.lines.len();
    }

    /// Number of stored lines already processed.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Lines not yet processed, oldest first.
    pub fn unprocessed(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().skip(self.processed).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.processed = 0;
    }
}

/// Streaming line assembler.
#[derive(Debug, Clone, Default)]
pub struct FrameAssembler {
    decoder: Utf8StreamDecoder,
    pending: String,
    raw: RawLineLog,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw_capacity(capacity: usize) -> Self {
        Self {
            raw: RawLineLog::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Decode `chunk` and return the complete lines it finishes.
    ///
    /// Lines are produced lazily; each one is echoed into the raw-line log as
    /// it is yielded. Lines left unconsumed when the iterator is dropped stay
    /// buffered and are yielded by the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> FeedLines<'_> {
        self.decoder.decode(chunk, &mut self.pending);
        FeedLines {
            assembler: self,
            start: 0,
        }
    }

    /// Text received after the last line terminator.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn raw_lines(&self) -> &RawLineLog {
        &self.raw
    }

    pub fn raw_lines_mut(&mut self) -> &mut RawLineLog {
        &mut self.raw
    }

    /// Drop the pending fragment, any carried partial character and the raw log.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.decoder.reset();
        self.raw.clear();
    }
}

/// Lazy sequence of complete lines produced by one `FrameAssembler::feed` call.
pub struct FeedLines<'a> {
    assembler: &'a mut FrameAssembler,
    start: usize,
}

impl Iterator for FeedLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let rest = &self.assembler.pending[self.start..];
            let nl = rest.find('\n')?;
            let segment = &rest[..nl];
            let line = segment.strip_suffix('\r').unwrap_or(segment).to_owned();
            self.start += nl + 1;
            if line.is_empty() {
                continue;
            }
            let evicted = self.assembler.raw.push(line.clone());
            if evicted > 0 {
                tracing::trace!(evicted, "raw line log full, dropped oldest");
            }
            return Some(line);
        }
    }
}

impl Drop for FeedLines<'_> {
    fn drop(&mut self) {
        if self.start > 0 {
            self.assembler.pending.drain(..self.start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_line_is_joined_and_tail_kept() {
        let mut fa = FrameAssembler::new();
        assert_eq!(fa.feed(b"ab").count(), 0);
        let lines: Vec<String> = fa.feed(b"c\nd").collect();
        assert_eq!(lines, vec!["abc".to_string()]);
        assert_eq!(fa.pending(), "d");
    }

    #[test]
    fn crlf_and_lf_both_terminate() {
        let mut fa = FrameAssembler::new();
        let lines: Vec<String> = fa.feed(b"one\r\ntwo\nthree\r").collect();
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(fa.pending(), "three\r");
        let lines: Vec<String> = fa.feed(b"\n").collect();
        assert_eq!(lines, vec!["three"]);
        assert_eq!(fa.pending(), "");
    }

    #[test]
    fn empty_lines_are_discarded() {
        let mut fa = FrameAssembler::new();
        let lines: Vec<String> = fa.feed(b"\n\r\nx\n\n").collect();
        assert_eq!(lines, vec!["x"]);
        assert_eq!(fa.raw_lines().len(), 1);
    }

    #[test]
    fn multibyte_char_split_across_reads() {
        // "°" is 0xC2 0xB0
        let mut fa = FrameAssembler::new();
        assert_eq!(fa.feed(b"15\xC2").count(), 0);
        let lines: Vec<String> = fa.feed(b"\xB0\n").collect();
        assert_eq!(lines, vec!["15°".to_string()]);
    }

    #[test]
    fn four_byte_char_split_three_ways() {
        let bytes = "😀".as_bytes();
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        dec.decode(&bytes[..1], &mut out);
        dec.decode(&bytes[1..3], &mut out);
        assert_eq!(out, "");
        assert_eq!(dec.carried(), 3);
        dec.decode(&bytes[3..], &mut out);
        assert_eq!(out, "😀");
        assert_eq!(dec.carried(), 0);
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let mut fa = FrameAssembler::new();
        let lines: Vec<String> = fa.feed(b"a\xFFb\n").collect();
        assert_eq!(lines, vec!["a\u{FFFD}b".to_string()]);
    }

    #[test]
    fn finish_flushes_dangling_sequence() {
        let mut dec = Utf8StreamDecoder::new();
        let mut out = String::new();
        dec.decode(b"x\xE2\x82", &mut out);
        dec.finish(&mut out);
        assert_eq!(out, "x\u{FFFD}");
        assert_eq!(dec.carried(), 0);
    }

    #[test]
    fn unconsumed_lines_survive_early_drop() {
        let mut fa = FrameAssembler::new();
        {
            let mut it = fa.feed(b"a\nb\nc");
            assert_eq!(it.next().as_deref(), Some("a"));
        }
        assert_eq!(fa.pending(), "b\nc");
        let lines: Vec<String> = fa.feed(b"\n").collect();
        assert_eq!(lines, vec!["b", "c"]);
    }

    #[test]
    fn raw_log_evicts_oldest_and_shifts_cursor() {
        let mut log = RawLineLog::with_capacity(3);
        for l in ["a", "b", "c"] {
            log.push(l.to_string());
        }
        log.mark_processed();
        assert_eq!(log.processed(), 3);
        let evicted = log.push("d".to_string());
        assert_eq!(evicted, 1);
        assert_eq!(log.processed(), 2);
        assert_eq!(log.unprocessed().collect::<Vec<_>>(), vec!["d"]);
        assert_eq!(log.iter().collect::<Vec<_>>(), vec!["b", "c", "d"]);
    }

    #[test]
    fn assembler_echo_respects_capacity() {
        let mut fa = FrameAssembler::with_raw_capacity(100);
        let mut data = Vec::new();
        for i in 0..130 {
            data.extend_from_slice(format!("line{i}\n").as_bytes());
        }
        assert_eq!(fa.feed(&data).count(), 130);
        let raw = fa.raw_lines();
        assert_eq!(raw.len(), 100);
        assert_eq!(raw.iter().next(), Some("line30"));
    }
}
