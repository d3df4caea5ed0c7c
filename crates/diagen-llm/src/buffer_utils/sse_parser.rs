use anyhow::Result;
use futures::{Stream, StreamExt};
use std::fmt::Display;

use super::buffering::CircularLineBuffer;
use crate::traits::EventStream;
use crate::StreamEvent;

/// Strategy pattern for parsing different SSE response types
pub trait SseLineParser: Send {
    /// Parse a data line into stream events
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>>;

    /// Check if this line signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Generic SSE stream parser over any byte-chunk stream.
///
/// Yields exactly one `Done` at the end: either from the parser, the `[DONE]`
/// marker, or synthesized when the byte stream closes without one.
pub fn parse_sse_bytes<S, B, E, P>(bytes: S, parser: P) -> EventStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
    P: SseLineParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = CircularLineBuffer::with_capacity(4096);
        let mut done = false;

        'outer: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend(chunk.as_ref());

                    while let Some(line_result) = buffer.next_line() {
                        match line_result {
                            Ok(line) => {
                                for event in handle_line(&parser, &line) {
                                    let is_done = matches!(event, Ok(StreamEvent::Done { .. }));
                                    yield event;
                                    if is_done {
                                        done = true;
                                        break 'outer;
                                    }
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    return;
                }
            }
        }

        if !done {
            if let Some(Ok(line)) = buffer.take_remainder() {
                for event in handle_line(&parser, &line) {
                    let is_done = matches!(event, Ok(StreamEvent::Done { .. }));
                    yield event;
                    if is_done {
                        return;
                    }
                }
            }
            yield Ok(StreamEvent::Done { finish_reason: None });
        }
    })
}

fn handle_line<P: SseLineParser>(parser: &P, line: &str) -> Vec<Result<StreamEvent>> {
    let Some(data) = line.strip_prefix("data:") else {
        return Vec::new();
    };
    let data = data.trim_start();

    if parser.is_done_marker(data) {
        return vec![Ok(StreamEvent::Done { finish_reason: None })];
    }

    match parser.parse_data_line(data) {
        Ok(events) => events.into_iter().map(Ok).collect(),
        Err(e) => vec![Err(e)],
    }
}
