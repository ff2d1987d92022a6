//! SSE (Server-Sent Events) parser
//!
//! Splits the SSE wire format into frames. Decoding the frame payload is left
//! to the caller so a bad payload stays local to its frame.

use std::time::Duration;

use tracing::trace;

use super::types::{StreamError, StreamResult};

/// Longest line the parser buffers before giving up on it
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// One dispatched SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event type (`event:` field); `None` means the default `message` type
    pub event: Option<String>,
    /// Last event ID seen when the frame was dispatched
    pub id: Option<String>,
    /// Data lines joined with `\n`
    pub data: String,
}

impl SseFrame {
    /// Whether this frame is an unnamed (`message`) event
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// SSE parser state
#[derive(Debug, Default)]
pub struct SseParser {
    /// Buffer for incomplete lines
    buffer: Vec<u8>,
    /// Leading bytes of `buffer` already known to hold no newline
    scanned: usize,
    /// Dropping the rest of an overlong line
    discarding: bool,
    /// Current event data being accumulated
    data_buffer: String,
    /// Whether a `data` field was seen for the current frame
    has_data: bool,
    /// Current event type (if any)
    event_type: Option<String>,
    /// Last event ID (if any)
    last_id: Option<String>,
    /// Reconnection time advertised by the server
    retry: Option<Duration>,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Last event ID received on this connection
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Reconnection delay advertised by the server, if any
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Feed bytes into the parser and extract any complete frames
    ///
    /// A line that is not valid UTF-8 yields an error entry in place; the
    /// parser keeps going with the following lines. A line longer than
    /// [`MAX_LINE_LENGTH`] yields one error, drops the frame being built and
    /// is skipped up to its newline.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamResult<SseFrame>> {
        let mut frames = Vec::new();

        self.buffer.extend_from_slice(bytes);
        let mut buffer = std::mem::take(&mut self.buffer);

        let mut start = 0;
        let mut cursor = self.scanned;
        while let Some(offset) = buffer[cursor..].iter().position(|&b| b == b'\n') {
            let end = cursor + offset;

            if self.discarding {
                self.discarding = false;
            } else if end - start > MAX_LINE_LENGTH {
                frames.push(self.overlong());
            } else {
                // Handle \r\n line endings
                let line = &buffer[start..end];
                let line = line.strip_suffix(b"\r").unwrap_or(line);

                if let Some(frame) = self.process_line(line) {
                    frames.push(frame);
                }
            }

            start = end + 1;
            cursor = start;
        }

        buffer.drain(..start);
        if buffer.len() > MAX_LINE_LENGTH {
            if !self.discarding {
                frames.push(self.overlong());
                self.discarding = true;
            }
            buffer.clear();
        }

        self.scanned = buffer.len();
        self.buffer = buffer;
        frames
    }

    /// Drop the frame being built and report an overlong line
    fn overlong(&mut self) -> StreamResult<SseFrame> {
        self.data_buffer.clear();
        self.has_data = false;
        self.event_type = None;
        Err(StreamError::Decode(format!(
            "SSE line exceeds {} bytes",
            MAX_LINE_LENGTH
        )))
    }

    /// Process a single line of SSE data
    fn process_line(&mut self, line: &[u8]) -> Option<StreamResult<SseFrame>> {
        // Empty line signals end of frame
        if line.is_empty() {
            return self.dispatch_frame().map(Ok);
        }

        // Comment line (keepalive)
        if line.starts_with(b":") {
            trace!("SSE keepalive/comment");
            return None;
        }

        let line_str = match std::str::from_utf8(line) {
            Ok(s) => s,
            Err(_) => {
                return Some(Err(StreamError::Decode("Invalid UTF-8 in SSE line".into())));
            }
        };

        // Split on first colon
        let (field, value) = match line_str.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line_str, ""),
        };

        match field {
            "data" => {
                if self.has_data {
                    self.data_buffer.push('\n');
                }
                self.data_buffer.push_str(value);
                self.has_data = true;
            }
            "event" => {
                self.event_type = Some(value.to_string());
            }
            "id" => {
                self.last_id = Some(value.to_string());
            }
            "retry" => match value.parse::<u64>() {
                Ok(ms) => self.retry = Some(Duration::from_millis(ms)),
                Err(_) => trace!("SSE invalid retry: {}", value),
            },
            _ => {
                trace!("SSE unknown field: {}", field);
            }
        }

        None
    }

    /// Dispatch the accumulated frame
    fn dispatch_frame(&mut self) -> Option<SseFrame> {
        let event = self.event_type.take();

        if !self.has_data {
            return None;
        }

        self.has_data = false;
        Some(SseFrame {
            event,
            id: self.last_id.clone(),
            data: std::mem::take(&mut self.data_buffer),
        })
    }
}
