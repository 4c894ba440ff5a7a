//! SSE streaming support for OpenAI-compatible chat completions.
//!
//! The wire format is line oriented: every payload line looks like
//! `data: {json}` and the stream ends with `data: [DONE]`. Blank lines,
//! comments and other SSE fields are ignored.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use tokio_util::sync::CancellationToken;

use super::TextSink;
use super::accumulator::{StreamAccumulator, StreamChunk};
use crate::types::ChatResponse;
use crate::{Error, Result};

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone)]
pub enum SseEvent {
    Chunk(StreamChunk),
    Done,
}

pin_project! {
    pub struct SseStream<S> {
        #[pin]
        inner: S,
        buffer: Vec<u8>,
        pos: usize,
        finished: bool,
    }
}

impl<S> SseStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>>,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(4096),
            pos: 0,
            finished: false,
        }
    }

    #[inline]
    fn find_delimiter(buf: &[u8]) -> Option<usize> {
        buf.iter().position(|&b| b == b'\n')
    }

    fn extract_data(line: &str) -> Option<&str> {
        let data = line.trim().strip_prefix("data:")?.trim();
        (!data.is_empty()).then_some(data)
    }

    fn parse_line(line: &str) -> Option<SseEvent> {
        let data = Self::extract_data(line)?;
        if data == DONE_MARKER {
            return Some(SseEvent::Done);
        }
        serde_json::from_str::<StreamChunk>(data)
            .inspect_err(|e| tracing::warn!("Failed to parse stream chunk: {} - data: {}", e, data))
            .ok()
            .map(SseEvent::Chunk)
    }
}

impl<S> Stream for SseStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>>,
{
    type Item = Result<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            let search_slice = &this.buffer[*this.pos..];
            if let Some(rel_pos) = Self::find_delimiter(search_slice) {
                let start_pos = *this.pos;
                let end_pos = start_pos + rel_pos;
                let line = match std::str::from_utf8(&this.buffer[start_pos..end_pos]) {
                    Ok(s) => s,
                    Err(e) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Err(Error::Stream(format!(
                            "Invalid UTF-8 in stream: {}",
                            e
                        )))));
                    }
                };

                let event = Self::parse_line(line);
                *this.pos = end_pos + 1;

                if this.buffer.len() > 8192 && *this.pos > this.buffer.len() / 2 {
                    this.buffer.drain(..*this.pos);
                    *this.pos = 0;
                }

                match event {
                    Some(SseEvent::Done) => {
                        *this.finished = true;
                        return Poll::Ready(Some(Ok(SseEvent::Done)));
                    }
                    Some(event) => return Poll::Ready(Some(Ok(event))),
                    None => continue,
                }
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    if *this.pos > 0 && this.buffer.len() + bytes.len() > 16384 {
                        this.buffer.drain(..*this.pos);
                        *this.pos = 0;
                    }
                    this.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(e))) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(Error::Network(e))));
                }
                Poll::Ready(None) => {
                    *this.finished = true;
                    if *this.pos < this.buffer.len()
                        && let Ok(rest) = std::str::from_utf8(&this.buffer[*this.pos..])
                        && let Some(event) = Self::parse_line(rest)
                    {
                        return Poll::Ready(Some(Ok(event)));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Drain an SSE body into a complete [`ChatResponse`].
///
/// Every non-empty content delta is handed to `sink` exactly once, in
/// arrival order. Returns [`Error::Cancelled`] as soon as `cancel` fires;
/// dropping the body stream releases the connection.
pub async fn process_stream<S>(
    body: S,
    sink: &mut TextSink<'_>,
    cancel: &CancellationToken,
) -> Result<ChatResponse>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>>,
{
    let events = SseStream::new(body);
    futures::pin_mut!(events);
    let mut accumulator = StreamAccumulator::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            next = events.next() => next,
        };

        match next {
            Some(Ok(SseEvent::Chunk(chunk))) => accumulator.apply(chunk, sink),
            Some(Ok(SseEvent::Done)) | None => break,
            Some(Err(e)) => return Err(e),
        }
    }

    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FinishReason;

    type EmptyStream = futures::stream::Empty<std::result::Result<Bytes, reqwest::Error>>;

    fn body(parts: &[&str]) -> impl Stream<Item = std::result::Result<Bytes, reqwest::Error>> {
        let parts: Vec<_> = parts
            .iter()
            .map(|p| Ok::<_, reqwest::Error>(Bytes::from(p.to_string())))
            .collect();
        futures::stream::iter(parts)
    }

    #[test]
    fn test_extract_data() {
        assert_eq!(
            SseStream::<EmptyStream>::extract_data("data: {\"a\":1}"),
            Some("{\"a\":1}")
        );
        assert_eq!(
            SseStream::<EmptyStream>::extract_data("data:{\"a\":1}\r"),
            Some("{\"a\":1}")
        );
        assert!(SseStream::<EmptyStream>::extract_data("event: message").is_none());
        assert!(SseStream::<EmptyStream>::extract_data(": keep-alive").is_none());
        assert!(SseStream::<EmptyStream>::extract_data("data: ").is_none());
    }

    #[test]
    fn test_parse_line() {
        assert!(matches!(
            SseStream::<EmptyStream>::parse_line("data: [DONE]"),
            Some(SseEvent::Done)
        ));
        assert!(SseStream::<EmptyStream>::parse_line("data: {not json").is_none());
        assert!(matches!(
            SseStream::<EmptyStream>::parse_line(r#"data: {"id":"c1","choices":[]}"#),
            Some(SseEvent::Chunk(_))
        ));
    }

    #[tokio::test]
    async fn test_text_stream_split_across_reads() {
        let stream = body(&[
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n",
            "\ndata: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"con",
            "tent\":\"lo\"}}]}\n\n",
            "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}],\"usage\":{\"prompt_tokens\":5,\"completion_tokens\":2,\"total_tokens\":7}}\n\n",
            "data: [DONE]\n\n",
        ]);

        let mut seen = Vec::new();
        let response = process_stream(
            stream,
            &mut |chunk: &str| seen.push(chunk.to_string()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(seen, vec!["Hel", "lo"]);
        assert_eq!(response.id, "c1");
        assert_eq!(response.content(), "Hello");
        assert_eq!(response.finish_reason(), Some(FinishReason::Stop));
        assert_eq!(response.usage.total_tokens, 7);
    }

    #[tokio::test]
    async fn test_tool_call_fragments_merge_by_index() {
        let stream = body(&[
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"type\":\"function\",\"function\":{\"name\":\"read_file\",\"arguments\":\"{\\\"pa\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":1,\"id\":\"call_2\",\"function\":{\"name\":\"list_directory\",\"arguments\":\"{}\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"th\\\":\\\"a.txt\\\"}\"}}]}}]}\n\n",
            "data: [DONE]\n\n",
        ]);

        let response = process_stream(stream, &mut |_: &str| {}, &CancellationToken::new())
            .await
            .unwrap();

        let calls = response.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name(), "read_file");
        assert_eq!(calls[0].function.arguments, r#"{"path":"a.txt"}"#);
        assert_eq!(calls[1].name(), "list_directory");
        assert_eq!(response.finish_reason(), Some(FinishReason::ToolCalls));
        assert_eq!(response.content(), "");
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_skipped() {
        let stream = body(&[
            "data: {broken\n\n",
            ": comment\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        ]);

        let response = process_stream(stream, &mut |_: &str| {}, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.content(), "ok");
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let stream = body(&["data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"]);
        let response = process_stream(stream, &mut |_: &str| {}, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.content(), "tail");
    }

    #[tokio::test]
    async fn test_stops_at_done() {
        let stream = body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n",
        ]);
        let response = process_stream(stream, &mut |_: &str| {}, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.content(), "a");
    }

    #[tokio::test]
    async fn test_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stream = futures::stream::pending::<std::result::Result<Bytes, reqwest::Error>>();

        let err = process_stream(stream, &mut |_: &str| {}, &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
