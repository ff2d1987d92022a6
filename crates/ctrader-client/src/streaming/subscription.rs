//! Observer subscriptions on a ticker stream

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use ctrader_core::TickerEvent;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::ticker::TickerStream;
use super::types::StreamError;
use super::update_loop::Scheduler;

/// Receives the events of a subscribed [`TickerStream`]
///
/// All callbacks run on the update loop the subscription was created with.
/// Closures `FnMut(TickerEvent)` implement this trait directly.
pub trait TickerObserver: Send + 'static {
    /// A decoded ticker event
    fn on_event(&mut self, event: TickerEvent);

    /// The connection failed; no further callbacks follow
    fn on_error(&mut self, error: StreamError) {
        warn!("Ticker stream failed: {}", error);
    }

    /// The server closed the stream; no further callbacks follow
    fn on_complete(&mut self) {}
}

impl<F> TickerObserver for F
where
    F: FnMut(TickerEvent) + Send + 'static,
{
    fn on_event(&mut self, event: TickerEvent) {
        self(event)
    }
}

struct Shared {
    cancelled: AtomicBool,
    decode_faults: Arc<AtomicU64>,
}

/// Cancellation handle of an observer subscription
///
/// Owns the producer task, and through it the connection. `cancel` is
/// idempotent and irrevocable; dropping the handle cancels it.
pub struct SubscriptionHandle {
    shared: Arc<Shared>,
    task: AbortHandle,
}

impl SubscriptionHandle {
    pub(crate) fn spawn<O: TickerObserver>(
        stream: TickerStream,
        scheduler: Scheduler,
        observer: O,
    ) -> Self {
        let shared = Arc::new(Shared {
            cancelled: AtomicBool::new(false),
            decode_faults: stream.decode_fault_counter(),
        });

        let task = tokio::spawn(produce(
            stream,
            scheduler,
            Arc::new(Mutex::new(observer)),
            shared.clone(),
        ));

        Self {
            shared,
            task: task.abort_handle(),
        }
    }

    /// Stop receiving events and release the connection
    ///
    /// Returns `true` on the call that actually cancelled, `false` on any
    /// later call. Callbacks already queued on the update loop are discarded
    /// when they run, so once this returns on the loop's own task no further
    /// callback is invoked.
    pub fn cancel(&self) -> bool {
        if self.shared.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }

        self.task.abort();
        debug!("Ticker subscription cancelled");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the producer task has stopped (cancelled, failed or completed)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Number of frames skipped because they could not be decoded
    pub fn decode_faults(&self) -> u64 {
        self.shared.decode_faults.load(Ordering::Relaxed)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("cancelled", &self.is_cancelled())
            .field("decode_faults", &self.decode_faults())
            .finish()
    }
}

/// Read the stream and forward every item to the update loop
async fn produce<O: TickerObserver>(
    mut stream: TickerStream,
    scheduler: Scheduler,
    observer: Arc<Mutex<O>>,
    shared: Arc<Shared>,
) {
    while let Some(item) = stream.next().await {
        let scheduled = match item {
            Ok(event) => deliver(&scheduler, &observer, &shared, move |o| o.on_event(event)),
            Err(error) => {
                deliver(&scheduler, &observer, &shared, move |o| o.on_error(error));
                return;
            }
        };

        if !scheduled {
            debug!("Update loop closed, stopping ticker producer");
            return;
        }
    }

    deliver(&scheduler, &observer, &shared, |o| o.on_complete());
}

fn deliver<O, F>(scheduler: &Scheduler, observer: &Arc<Mutex<O>>, shared: &Arc<Shared>, f: F) -> bool
where
    O: TickerObserver,
    F: FnOnce(&mut O) + Send + 'static,
{
    let observer = observer.clone();
    let shared = shared.clone();

    scheduler.schedule(move || {
        let mut observer = observer.lock();
        if shared.cancelled.load(Ordering::SeqCst) {
            return;
        }
        f(&mut *observer);
    })
}
