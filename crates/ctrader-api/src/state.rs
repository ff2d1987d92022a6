//! Application state for the ctrader API

use std::collections::{BTreeMap, HashMap};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use ctrader_core::{Campaign, DataPoint, TickerEvent, Timeseries};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;

/// Buffered events per ticker channel before slow receivers lag
const TICKER_CHANNEL_CAPACITY: usize = 100;
/// Prices kept per channel for history reads
const TIMESERIES_CAPACITY: usize = 5000;

/// In-memory campaign records
#[derive(Debug, Default)]
pub struct CampaignStore {
    next_id: u64,
    items: BTreeMap<u64, Campaign>,
}

impl CampaignStore {
    /// Allocate the next campaign ID (starting at 1)
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn insert(&mut self, campaign: Campaign) {
        self.next_id = self.next_id.max(campaign.id);
        self.items.insert(campaign.id, campaign);
    }

    pub fn get(&self, id: u64) -> Option<&Campaign> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Campaign> {
        self.items.get_mut(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Campaign> {
        self.items.remove(&id)
    }

    /// All campaigns in ID order
    pub fn all(&self) -> impl Iterator<Item = &Campaign> {
        self.items.values()
    }
}

/// Fan-out of ticker events to stream subscribers
///
/// One broadcast channel per `provider-FROM-TO` key, created on demand and
/// removed when its last [`TickerSubscription`] is dropped. Every published
/// price is also recorded in a bounded per-key [`Timeseries`].
#[derive(Clone)]
pub struct TickerHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<TickerEvent>>>>,
    history: Arc<RwLock<HashMap<String, Timeseries>>>,
    history_capacity: usize,
}

impl Default for TickerHub {
    fn default() -> Self {
        Self::with_history_capacity(TIMESERIES_CAPACITY)
    }
}

impl TickerHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hub keeping at most `capacity` prices per key
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::default(),
            history: Arc::default(),
            history_capacity: capacity,
        }
    }

    /// Channel key of a provider's product, e.g. `gdax-BTC-EUR`
    pub fn key(provider: &str, product: &str) -> String {
        format!("{}-{}", provider, product.to_ascii_uppercase())
    }

    /// Subscribe to a channel
    pub fn subscribe(&self, key: &str) -> TickerSubscription {
        let receiver = match self.channels.read().get(key) {
            Some(sender) => Some(sender.subscribe()),
            None => None,
        };
        let receiver = receiver.unwrap_or_else(|| {
            self.channels
                .write()
                .entry(key.to_string())
                .or_insert_with(|| broadcast::channel(TICKER_CHANNEL_CAPACITY).0)
                .subscribe()
        });

        TickerSubscription {
            events: Some(BroadcastStream::new(receiver)),
            hub: self.clone(),
            key: key.to_string(),
        }
    }

    /// Publish an event on the channel of its product
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, provider: &str, event: TickerEvent) -> usize {
        let key = Self::key(provider, &event.product);

        self.history
            .write()
            .entry(key.clone())
            .or_insert_with(|| Timeseries::new(self.history_capacity))
            .add(event.time.timestamp(), event.price);

        match self.channels.read().get(&key) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Recorded prices of a channel, oldest first
    ///
    /// `None` if nothing was ever published on it.
    pub fn timeseries(&self, key: &str) -> Option<Vec<DataPoint>> {
        self.history.read().get(key).map(Timeseries::all)
    }

    /// Number of live subscribers on a channel
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.channels
            .read()
            .get(key)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of channels that currently exist
    pub fn channel_count(&self) -> usize {
        self.channels.read().len()
    }

    /// Drop the channel if nobody listens anymore
    fn release(&self, key: &str) {
        let mut channels = self.channels.write();
        if channels
            .get(key)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(key);
            tracing::debug!(%key, "Ticker channel removed");
        }
    }
}

/// Events of one hub channel
///
/// Lagged receivers yield `Err` for the skipped messages. Dropping the
/// subscription removes the channel once it has no other subscriber.
pub struct TickerSubscription {
    events: Option<BroadcastStream<TickerEvent>>,
    hub: TickerHub,
    key: String,
}

impl TickerSubscription {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Stream for TickerSubscription {
    type Item = Result<TickerEvent, BroadcastStreamRecvError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().events.as_mut() {
            Some(events) => Pin::new(events).poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}

impl Drop for TickerSubscription {
    fn drop(&mut self) {
        // The receiver must be gone before the count is checked
        self.events.take();
        self.hub.release(&self.key);
    }
}

/// Application state shared across all handlers
#[derive(Clone, Default)]
pub struct AppState {
    campaigns: Arc<RwLock<CampaignStore>>,
    hub: TickerHub,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state around an existing ticker hub
    pub fn with_hub(hub: TickerHub) -> Self {
        Self {
            campaigns: Arc::default(),
            hub,
        }
    }

    pub fn campaigns(&self) -> &RwLock<CampaignStore> {
        &self.campaigns
    }

    pub fn hub(&self) -> &TickerHub {
        &self.hub
    }
}
