//! Frame decoder for the chat stream body.
//!
//! The body is a sequence of blank-line-terminated frames, each of the form
//! `data: <json>`. Network reads may split a frame (or a UTF-8 sequence)
//! anywhere, so bytes are accumulated until a full frame is available.
//!
//! Incomplete trailing data is never emitted. Frames that are empty, lack the
//! `data: ` prefix, or carry unparsable JSON are skipped without ending the
//! stream.

use futures::{Stream, StreamExt};
use kubechat_application::{EventStream, StreamError};
use kubechat_domain::ChatEvent;
use kubechat_domain::util::log_preview;
use std::fmt::Display;
use tracing::{debug, warn};

/// Separator between two frames.
pub const FRAME_DELIMITER: &str = "\n\n";

/// Field prefix of a data frame.
pub const DATA_PREFIX: &str = "data: ";

/// Accumulates body chunks and yields complete frames in arrival order.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    utf8_tail: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes and return every frame they complete.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decode_utf8(chunk);
        self.push_str(&text)
    }

    /// Append text and return every frame it completes.
    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.find(FRAME_DELIMITER) {
            frames.push(self.buffer[..end].to_string());
            self.buffer.drain(..end + FRAME_DELIMITER.len());
        }
        frames
    }

    /// Data received but not yet part of a complete frame.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut input = bytes.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    text.push_str(valid);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        // Sequence continues in the next chunk
                        None => {
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }
        self.utf8_tail = input.to_vec();
        text
    }
}

/// Turn one candidate frame into an event.
///
/// Returns `None` for frames that carry no event.
pub fn parse_frame(frame: &str) -> Option<ChatEvent> {
    let frame = frame.trim();
    if frame.is_empty() {
        return None;
    }
    let Some(payload) = frame.strip_prefix(DATA_PREFIX) else {
        debug!("Skipping non-data frame: {}", log_preview(frame, 80));
        return None;
    };
    match ChatEvent::from_json(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(
                "Error parsing SSE data: {} (payload: {})",
                e,
                log_preview(payload, 200)
            );
            None
        }
    }
}

/// Decode a response body into chat events.
///
/// A body read error is yielded as [`StreamError::Body`].
pub fn decode_events<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: Display + 'static,
{
    let mut decoder = FrameDecoder::new();
    body.map(move |chunk| match chunk {
        Ok(bytes) => decoder
            .push_bytes(bytes.as_ref())
            .iter()
            .filter_map(|frame| parse_frame(frame))
            .map(Ok)
            .collect::<Vec<_>>(),
        Err(e) => vec![Err(StreamError::Body(e.to_string()))],
    })
    .flat_map(futures::stream::iter)
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    const HELLO_STREAM: &str = concat!(
        "data: {\"type\":\"content\",\"content\":\"Hel\"}\n\n",
        "data: {\"type\":\"content\",\"content\":\"lo\"}\n\n",
        "data: {\"type\":\"done\",\"commands_executed\":[]}\n\n",
    );

    fn content(text: &str) -> ChatEvent {
        ChatEvent::Content {
            content: text.to_string(),
        }
    }

    fn decode_all(chunks: &[&[u8]]) -> Vec<ChatEvent> {
        let mut decoder = FrameDecoder::new();
        chunks
            .iter()
            .flat_map(|chunk| decoder.push_bytes(chunk))
            .filter_map(|frame| parse_frame(&frame))
            .collect()
    }

    async fn collect(chunks: Vec<&'static str>) -> Vec<Result<ChatEvent, StreamError>> {
        let body = futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, Infallible>(c.as_bytes())),
        );
        decode_events(body).collect().await
    }

    #[test]
    fn test_frames_split_on_blank_line() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push_str("data: a\n\ndata: b\n\ndata: c");
        assert_eq!(frames, vec!["data: a", "data: b"]);
        assert_eq!(decoder.pending(), "data: c");
    }

    #[test]
    fn test_partial_frame_is_held_back() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push_str("data: {\"type\":\"con").is_empty());
        assert!(decoder.push_str("tent\",\"content\":\"x\"}\n").is_empty());
        let frames = decoder.push_str("\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(parse_frame(&frames[0]), Some(content("x")));
        assert_eq!(decoder.pending(), "");
    }

    #[test]
    fn test_skipped_frames() {
        assert_eq!(parse_frame("   \n "), None);
        assert_eq!(parse_frame(": keep-alive"), None);
        assert_eq!(parse_frame("event: ping"), None);
        assert_eq!(parse_frame("data: {not json"), None);
    }

    #[test]
    fn test_two_read_scenario() {
        let (first, second) = HELLO_STREAM.split_at(HELLO_STREAM.find("\n\n").unwrap() + 2);
        let events = decode_all(&[first.as_bytes(), second.as_bytes()]);
        assert_eq!(
            events,
            vec![
                content("Hel"),
                content("lo"),
                ChatEvent::Done {
                    commands_executed: Some(vec![])
                },
            ]
        );
    }

    #[test]
    fn test_every_two_way_split_yields_same_events() {
        let bytes = HELLO_STREAM.as_bytes();
        let expected = decode_all(&[bytes]);
        assert_eq!(expected.len(), 3);

        for at in 0..=bytes.len() {
            let (a, b) = bytes.split_at(at);
            assert_eq!(decode_all(&[a, b]), expected, "split at {}", at);
        }
    }

    #[test]
    fn test_byte_at_a_time_yields_same_events() {
        let stream = concat!(
            "data: {\"type\":\"metadata\",\"response_type\":\"investigation\"}\n\n",
            "data: {\"type\":\"content\",\"content\":\"Pod ✅ läuft\"}\n\n",
            "data: {\"type\":\"command_blocked\",\"command\":\"kubectl delete ns prod\",\"reason\":\"destructive\"}\n\n",
            "data: {\"type\":\"done\"}\n\n",
        );
        let bytes = stream.as_bytes();
        let expected = decode_all(&[bytes]);
        assert_eq!(expected.len(), 4);

        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_all(&singles), expected);
        assert_eq!(expected[1], content("Pod ✅ läuft"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push_bytes(b"data: {\"type\":\"content\",\"content\":\"a\xffb\"}\n\n");
        assert_eq!(parse_frame(&frames[0]), Some(content("a\u{FFFD}b")));
    }

    #[tokio::test]
    async fn test_malformed_frame_does_not_end_stream() {
        let events = collect(vec![
            "data: {\"type\":\"content\",\"content\":\"a\"}\n\n",
            "data: {broken\n\n",
            "data: {\"type\":\"content\",\"content\":\"b\"}\n\ndata: {\"type\":\"done\"}\n\n",
        ])
        .await;

        assert_eq!(
            events,
            vec![
                Ok(content("a")),
                Ok(content("b")),
                Ok(ChatEvent::Done {
                    commands_executed: None
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_unterminated_trailing_frame_is_dropped() {
        let events = collect(vec![
            "data: {\"type\":\"content\",\"content\":\"a\"}\n\n",
            "data: {\"type\":\"done\"}",
        ])
        .await;
        assert_eq!(events, vec![Ok(content("a"))]);
    }

    #[tokio::test]
    async fn test_body_error_is_yielded() {
        let body = futures::stream::iter(vec![
            Ok("data: {\"type\":\"content\",\"content\":\"a\"}\n\n".as_bytes()),
            Err("connection reset"),
        ]);
        let events: Vec<_> = decode_events(body).collect().await;
        assert_eq!(
            events,
            vec![
                Ok(content("a")),
                Err(StreamError::Body("connection reset".to_string())),
            ]
        );
    }
}
