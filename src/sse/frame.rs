//! Record framing for the chat stream
//!
//! The body is a sequence of records separated by a blank line. Records of
//! interest look like `data: <payload>`, where the payload is either the
//! `[DONE]` sentinel or a JSON object carrying a `content` string.

use serde_json::Value;

/// Separator between records
pub const RECORD_DELIMITER: &[u8] = b"\n\n";
/// Prefix of content records
pub const DATA_PREFIX: &[u8] = b"data: ";
/// Payload that ends the stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// A decoded protocol unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaFrame {
    /// Partial assistant text; may be empty
    Content(String),
    /// Terminal sentinel, nothing follows
    Done,
}

impl DeltaFrame {
    pub fn content(&self) -> Option<&str> {
        match self {
            DeltaFrame::Content(text) => Some(text),
            DeltaFrame::Done => None,
        }
    }
}

/// Counters kept while parsing, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Complete records seen
    pub records: u64,
    /// Records without the `data: ` prefix
    pub ignored: u64,
    /// `data: ` records whose payload could not be decoded
    pub malformed: u64,
}

/// Incremental record parser.
///
/// Holds only the trailing incomplete record between calls to [`feed`].
///
/// [`feed`]: FrameParser::feed
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
    terminated: bool,
    stats: ParseStats,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal sentinel has been seen
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Bytes of the incomplete record currently held
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Append a chunk and return the frames of every record it completes.
    ///
    /// Once the sentinel has been decoded, the rest of the buffer and all
    /// later chunks are discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DeltaFrame> {
        let mut frames = Vec::new();
        if self.terminated {
            return frames;
        }

        // A delimiter may straddle the previous chunk and this one
        let mut search_from = self
            .buffer
            .len()
            .saturating_sub(RECORD_DELIMITER.len() - 1);
        self.buffer.extend_from_slice(chunk);

        let mut record_start = 0;
        while let Some(offset) = find_delimiter(&self.buffer[search_from..]) {
            let record_end = search_from + offset;
            let outcome = decode_record(&self.buffer[record_start..record_end]);
            record_start = record_end + RECORD_DELIMITER.len();
            search_from = record_start;

            self.stats.records += 1;
            match outcome {
                RecordOutcome::Frame(DeltaFrame::Done) => {
                    frames.push(DeltaFrame::Done);
                    self.terminated = true;
                    break;
                }
                RecordOutcome::Frame(frame) => frames.push(frame),
                RecordOutcome::Ignored => self.stats.ignored += 1,
                RecordOutcome::Malformed => self.stats.malformed += 1,
            }
        }

        if self.terminated {
            self.buffer.clear();
        } else {
            self.buffer.drain(..record_start);
        }
        frames
    }

    /// Finish parsing after the source is exhausted.
    ///
    /// Returns the number of bytes of the unterminated trailing record that
    /// were dropped.
    pub fn finish(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }
}

enum RecordOutcome {
    Frame(DeltaFrame),
    Ignored,
    Malformed,
}

fn find_delimiter(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(RECORD_DELIMITER.len())
        .position(|window| window == RECORD_DELIMITER)
}

fn decode_record(record: &[u8]) -> RecordOutcome {
    let Some(payload) = record.strip_prefix(DATA_PREFIX) else {
        return RecordOutcome::Ignored;
    };

    let payload = match std::str::from_utf8(payload) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, len = payload.len(), "Dropping stream record with invalid UTF-8");
            return RecordOutcome::Malformed;
        }
    };

    if payload == DONE_SENTINEL {
        return RecordOutcome::Frame(DeltaFrame::Done);
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => {
            let content = value
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default();
            RecordOutcome::Frame(DeltaFrame::Content(content.to_string()))
        }
        Err(e) => {
            tracing::warn!(error = %e, payload = %payload, "Dropping malformed stream record");
            RecordOutcome::Malformed
        }
    }
}
