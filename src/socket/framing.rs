//! Newline-delimited frame reader for the plugin socket.
//!
//! The host writes one JSON object per line:
//!
//! ```text
//! {"type":"info",...}\n{"type":"action",...}\n
//! ```
//!
//! [`FrameReader`] owns a fixed-size buffer that the receive loop reads
//! into directly. After each read the newly filled region is scanned for
//! the delimiter, complete lines are copied out as [`Frame`]s, and any
//! trailing partial line is moved to the front of the buffer to be
//! completed by later reads.
//!
//! # Overflow
//!
//! A line longer than the buffer can never complete. When the buffer fills
//! without a delimiter the partial line is dropped and the reader skips
//! everything up to the next delimiter, then resumes normal framing. The
//! longest line that can be framed is `capacity - 1` bytes.

use std::borrow::Cow;

use bytes::Bytes;

use crate::constants::FRAME_DELIMITER;

/// One complete line from the wire, delimiter excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Wrap raw line bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Raw bytes of the line.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Line decoded as UTF-8, replacing invalid sequences.
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the frame has no bytes. The reader never emits these.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&'static str> for Frame {
    fn from(s: &'static str) -> Self {
        Self::new(Bytes::from_static(s.as_bytes()))
    }
}

/// Outcome of committing a read into the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Bytes were framed or buffered normally.
    Ok,
    /// The buffer filled without a delimiter; the partial line was dropped.
    Overflow,
}

/// Incremental line framer over a reusable fixed-size buffer.
#[derive(Debug)]
pub struct FrameReader {
    buf: Vec<u8>,
    /// Bytes `buf[..filled]` hold an incomplete line.
    filled: usize,
    /// Set after an overflow: drop bytes until the next delimiter.
    discarding: bool,
    overflows: u64,
}

impl FrameReader {
    /// Create a reader with a buffer of `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame buffer capacity must be non-zero");
        Self {
            buf: vec![0; capacity],
            filled: 0,
            discarding: false,
            overflows: 0,
        }
    }

    /// Buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes held for an incomplete line.
    pub fn buffered(&self) -> usize {
        self.filled
    }

    /// How many overflows have occurred since creation.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    /// Writable region past the buffered bytes. Never empty.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    /// Account for `n` bytes just written into [`spare_mut`](Self::spare_mut)
    /// and hand every completed frame to `emit`, in wire order.
    pub fn commit(&mut self, n: usize, mut emit: impl FnMut(Frame)) -> FeedStatus {
        let end = self.filled + n;
        debug_assert!(end <= self.buf.len());

        // Bytes before `filled` were already scanned and hold no delimiter.
        let mut start = 0;
        let mut scan = self.filled;
        while let Some(offset) = self.buf[scan..end]
            .iter()
            .position(|&b| b == FRAME_DELIMITER)
        {
            let delimiter = scan + offset;
            if self.discarding {
                // Tail of an oversized line; resync here.
                self.discarding = false;
            } else if delimiter > start {
                emit(Frame::new(Bytes::copy_from_slice(&self.buf[start..delimiter])));
            }
            start = delimiter + 1;
            scan = start;
        }

        if self.discarding {
            self.filled = 0;
            return FeedStatus::Ok;
        }

        let remaining = end - start;
        if remaining == 0 {
            self.filled = 0;
        } else if remaining == self.buf.len() {
            self.overflows += 1;
            log::error!(
                "[Framing] Receive buffer overflow: no delimiter in {} bytes, dropping partial message",
                self.buf.len()
            );
            self.filled = 0;
            self.discarding = true;
            return FeedStatus::Overflow;
        } else {
            if start > 0 {
                self.buf.copy_within(start..end, 0);
            }
            self.filled = remaining;
        }
        FeedStatus::Ok
    }

    /// Feed an arbitrary byte slice and collect the completed frames.
    ///
    /// Slices larger than the spare space are copied in pieces, exactly as
    /// a sequence of short socket reads would deliver them.
    pub fn feed(&mut self, mut bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        while !bytes.is_empty() {
            let spare = self.spare_mut();
            let n = spare.len().min(bytes.len());
            spare[..n].copy_from_slice(&bytes[..n]);
            bytes = &bytes[n..];
            self.commit(n, |frame| frames.push(frame));
        }
        frames
    }

    /// Drop any buffered partial line and leave overflow recovery.
    pub fn reset(&mut self) {
        self.filled = 0;
        self.discarding = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(frames: &[Frame]) -> Vec<String> {
        frames.iter().map(|f| f.to_text_lossy().into_owned()).collect()
    }

    #[test]
    fn test_lines_simple() {
        let mut reader = FrameReader::new(64);
        let frames = reader.feed(b"{\"a\":1}\n{\"b\":2}\n");
        assert_eq!(texts(&frames), vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_partial_frame_reassembly() {
        let mut reader = FrameReader::new(64);
        assert!(reader.feed(b"{\"type\":").is_empty());
        assert_eq!(reader.buffered(), 8);

        let frames = reader.feed(b"\"info\"}\n");
        assert_eq!(texts(&frames), vec!["{\"type\":\"info\"}"]);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_split_at_every_offset_yields_one_frame() {
        let message = br#"{"type":"action","actionId":"tj.press","data":[{"id":"a","value":"1"}]}"#;
        let mut wire = message.to_vec();
        wire.push(b'\n');

        for split in 0..=wire.len() {
            let mut reader = FrameReader::new(256);
            let mut frames = reader.feed(&wire[..split]);
            frames.extend(reader.feed(&wire[split..]));
            assert_eq!(frames.len(), 1, "split at {split}");
            assert_eq!(frames[0].as_bytes(), message, "split at {split}");
        }
    }

    #[test]
    fn test_arbitrary_chunking_preserves_order_and_bytes() {
        let messages: Vec<String> = (0..40)
            .map(|i| format!(r#"{{"type":"stateUpdate","id":"s{i}","value":"{}"}}"#, "x".repeat(i % 7)))
            .collect();
        let wire: Vec<u8> = messages
            .iter()
            .flat_map(|m| m.bytes().chain(std::iter::once(b'\n')))
            .collect();

        for chunk in [1, 2, 3, 5, 13, 64, 200, wire.len()] {
            let mut reader = FrameReader::new(128);
            let frames: Vec<Frame> = wire.chunks(chunk).flat_map(|c| reader.feed(c)).collect();
            assert_eq!(texts(&frames), messages, "chunk size {chunk}");
            assert_eq!(reader.overflow_count(), 0);
        }
    }

    #[test]
    fn test_empty_frames_discarded() {
        let mut reader = FrameReader::new(64);
        let frames = reader.feed(b"\n\n{\"a\":1}\n\n\n{\"b\":2}\n\n");
        assert_eq!(texts(&frames), vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_commit_through_spare_region() {
        let mut reader = FrameReader::new(32);
        let input = b"{\"x\":1}\n{\"y\"";
        reader.spare_mut()[..input.len()].copy_from_slice(input);

        let mut frames = Vec::new();
        let status = reader.commit(input.len(), |f| frames.push(f));
        assert_eq!(status, FeedStatus::Ok);
        assert_eq!(texts(&frames), vec!["{\"x\":1}"]);
        assert_eq!(reader.buffered(), 5);
        assert_eq!(reader.spare_mut().len(), 27);
    }

    #[test]
    fn test_overflow_recovers_on_next_delimiter() {
        let mut reader = FrameReader::new(64);
        let junk = vec![b'x'; 150];
        assert!(reader.feed(&junk).is_empty());
        assert!(reader.overflow_count() >= 1);

        let frames = reader.feed(b"tail-of-junk\n{\"type\":\"info\"}\n");
        assert_eq!(texts(&frames), vec!["{\"type\":\"info\"}"]);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_overflow_status_reported_once_per_full_buffer() {
        let mut reader = FrameReader::new(16);
        let n = reader.spare_mut().len();
        reader.spare_mut().fill(b'z');
        assert_eq!(reader.commit(n, |_| panic!("no frame expected")), FeedStatus::Overflow);

        // Still discarding: more junk is swallowed without another overflow.
        let frames = reader.feed(&[b'z'; 10]);
        assert!(frames.is_empty());
        assert_eq!(reader.overflow_count(), 1);
    }

    #[test]
    fn test_largest_frame_fits() {
        let mut reader = FrameReader::new(16);
        let line = "a".repeat(15);
        let frames = reader.feed(format!("{line}\n").as_bytes());
        assert_eq!(texts(&frames), vec![line]);
        assert_eq!(reader.overflow_count(), 0);
    }

    #[test]
    fn test_reset_drops_partial() {
        let mut reader = FrameReader::new(32);
        reader.feed(b"{\"partial\":");
        reader.reset();
        let frames = reader.feed(b"{\"a\":1}\n");
        assert_eq!(texts(&frames), vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_frame_text_lossy() {
        let frame = Frame::new(vec![b'o', b'k', 0xFF]);
        assert_eq!(frame.to_text_lossy(), "ok\u{FFFD}");
        assert_eq!(frame.len(), 3);
        assert!(!Frame::from("x").is_empty());
    }
}
