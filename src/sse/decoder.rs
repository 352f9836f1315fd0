//! Pull-based delta stream over a byte source

use super::frame::{DeltaFrame, FrameParser, ParseStats};
use futures::stream::{FusedStream, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Decodes a chunked chat body into [`DeltaFrame`]s.
///
/// Forward-only and finite: it ends after yielding [`DeltaFrame::Done`], after
/// yielding a source error, or when the source is exhausted. It never polls
/// the source again once it has ended.
pub struct StreamDecoder<S> {
    source: S,
    parser: FrameParser,
    ready: VecDeque<DeltaFrame>,
    finished: bool,
}

impl<S> StreamDecoder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            parser: FrameParser::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    pub fn stats(&self) -> ParseStats {
        self.parser.stats()
    }
}

impl<S, B, E> Stream for StreamDecoder<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<DeltaFrame, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if let Some(frame) = this.ready.pop_front() {
                if frame == DeltaFrame::Done {
                    this.ready.clear();
                    this.finished = true;
                }
                return Poll::Ready(Some(Ok(frame)));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            match this.source.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => {
                    this.ready.extend(this.parser.feed(chunk.as_ref()));
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    let dropped = this.parser.finish();
                    if dropped > 0 {
                        tracing::debug!(bytes = dropped, "Stream ended inside a record, dropping fragment");
                    }
                    this.finished = true;
                }
            }
        }
    }
}

impl<S, B, E> FusedStream for StreamDecoder<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    fn is_terminated(&self) -> bool {
        self.finished && self.ready.is_empty()
    }
}
