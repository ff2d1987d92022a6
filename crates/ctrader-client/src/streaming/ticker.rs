//! Cold ticker stream over one SSE connection

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use ctrader_core::TickerEvent;
use futures::future::BoxFuture;
use futures::stream::{BoxStream, Stream, StreamExt};
use futures::FutureExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::{debug, trace, warn};
use url::Url;

use super::parser::{SseFrame, SseParser};
use super::subscription::{SubscriptionHandle, TickerObserver};
use super::types::{StreamError, StreamResult};
use super::update_loop::Scheduler;

type ByteStream = BoxStream<'static, reqwest::Result<Bytes>>;

enum State {
    /// Nothing acquired yet
    Idle,
    Connecting(BoxFuture<'static, StreamResult<ByteStream>>),
    Streaming(ByteStream),
    Done,
}

/// Ticker events from one timeseries event stream
///
/// The stream is cold: building it does no I/O. The connection is opened on
/// the first poll (or when an observer is attached with [`subscribe`]) and
/// stays open until the stream is dropped, the subscription is cancelled,
/// or the connection fails.
///
/// Items are `Ok(event)` for each decoded frame. Frames whose payload cannot
/// be decoded are logged, counted and skipped. A connection failure is
/// yielded once as `Err`, after which the stream ends.
///
/// [`subscribe`]: TickerStream::subscribe
pub struct TickerStream {
    http_client: Client,
    url: Url,
    state: State,
    parser: SseParser,
    pending: VecDeque<TickerEvent>,
    decode_faults: Arc<AtomicU64>,
}

impl TickerStream {
    pub(crate) fn new(http_client: Client, url: Url) -> Self {
        Self {
            http_client,
            url,
            state: State::Idle,
            parser: SseParser::new(),
            pending: VecDeque::new(),
            decode_faults: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Connection target of this stream
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the connection has been requested yet
    pub fn is_connected(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// Number of frames skipped because they could not be decoded
    pub fn decode_faults(&self) -> u64 {
        self.decode_faults.load(Ordering::Relaxed)
    }

    /// Attach an observer and start the connection
    ///
    /// Spawns a producer task on the current tokio runtime that reads the
    /// connection and schedules every callback on the update loop behind
    /// `scheduler`. Returns immediately; must be called from within a
    /// runtime.
    pub fn subscribe<O: TickerObserver>(
        self,
        scheduler: &Scheduler,
        observer: O,
    ) -> SubscriptionHandle {
        SubscriptionHandle::spawn(self, scheduler.clone(), observer)
    }

    pub(crate) fn decode_fault_counter(&self) -> Arc<AtomicU64> {
        self.decode_faults.clone()
    }

    fn handle_frame(&mut self, frame: StreamResult<SseFrame>) {
        let frame = match frame {
            Ok(frame) if frame.is_message() => frame,
            Ok(frame) => {
                trace!(event = ?frame.event, "Ignoring named SSE event");
                return;
            }
            Err(e) => {
                self.record_decode_fault(&e);
                return;
            }
        };

        match serde_json::from_str::<TickerEvent>(&frame.data) {
            Ok(event) => self.pending.push_back(event),
            Err(e) => {
                let preview: String = frame.data.chars().take(100).collect();
                self.record_decode_fault(&StreamError::Decode(format!(
                    "Failed to parse ticker JSON: {} (data: {})",
                    e, preview
                )));
            }
        }
    }

    fn record_decode_fault(&self, error: &StreamError) {
        self.decode_faults.fetch_add(1, Ordering::Relaxed);
        warn!(url = %self.url, "Skipping ticker frame: {}", error);
    }
}

async fn connect(http_client: Client, url: Url) -> StreamResult<ByteStream> {
    debug!("Connecting to SSE stream: {}", url);

    let response = http_client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        return Err(StreamError::Server { status, message });
    }

    Ok(response.bytes_stream().boxed())
}

impl Stream for TickerStream {
    type Item = StreamResult<TickerEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }

            match &mut this.state {
                State::Idle => {
                    let connecting = connect(this.http_client.clone(), this.url.clone()).boxed();
                    this.state = State::Connecting(connecting);
                }
                State::Connecting(connecting) => match connecting.poll_unpin(cx) {
                    Poll::Ready(Ok(bytes)) => {
                        debug!("SSE stream established: {}", this.url);
                        this.state = State::Streaming(bytes);
                    }
                    Poll::Ready(Err(e)) => {
                        this.state = State::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                },
                State::Streaming(bytes) => match bytes.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(chunk))) => {
                        for frame in this.parser.feed(&chunk) {
                            this.handle_frame(frame);
                        }
                    }
                    Poll::Ready(Some(Err(e))) => {
                        this.state = State::Done;
                        return Poll::Ready(Some(Err(StreamError::Connection(e))));
                    }
                    Poll::Ready(None) => {
                        debug!("SSE stream closed by server: {}", this.url);
                        this.state = State::Done;
                    }
                    Poll::Pending => return Poll::Pending,
                },
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl std::fmt::Debug for TickerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerStream")
            .field("url", &self.url.as_str())
            .field("connected", &self.is_connected())
            .field("decode_faults", &self.decode_faults())
            .finish()
    }
}
