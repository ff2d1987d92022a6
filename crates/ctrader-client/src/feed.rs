//! Live chart feed
//!
//! [`ChartFeed`] subscribes to a ticker stream when activated and appends
//! every price to the chart it has been given. Deactivation cancels the
//! subscription exactly once and then lets go of the chart.

use std::sync::Arc;

use ctrader_core::{LiveChart, Point, TickerEvent};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::streaming::{Scheduler, StreamError, SubscriptionHandle, TickerObserver};
use crate::ApiClient;

/// Series of the chart that receives ticker prices
pub const PRICE_SERIES: usize = 0;

/// Lifecycle state of a [`ChartFeed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Not subscribed
    Idle,
    /// Subscribed and receiving
    Live,
    /// The connection failed
    Failed(String),
    /// The server closed the stream
    Ended,
}

impl FeedStatus {
    /// Whether the subscription has stopped on its own
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Ended)
    }
}

/// Feeds ticker prices into a live chart
pub struct ChartFeed<C: LiveChart> {
    provider: String,
    product: String,
    chart: Arc<Mutex<Option<C>>>,
    status: Arc<Mutex<FeedStatus>>,
    subscription: Option<SubscriptionHandle>,
}

impl<C: LiveChart> ChartFeed<C> {
    pub fn new(provider: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            product: product.into(),
            chart: Arc::new(Mutex::new(None)),
            status: Arc::new(Mutex::new(FeedStatus::Idle)),
            subscription: None,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// Subscribe to the ticker of this feed's product
    ///
    /// Returns `Ok(false)` without subscribing again if already active.
    pub fn activate(&mut self, client: &ApiClient, scheduler: &Scheduler) -> Result<bool> {
        if self.subscription.is_some() {
            return Ok(false);
        }

        let stream = client.ticker(&self.provider, &self.product)?;
        debug!(url = %stream.url(), "Activating chart feed");

        *self.status.lock() = FeedStatus::Live;
        let observer = FeedObserver {
            chart: self.chart.clone(),
            status: self.status.clone(),
        };
        self.subscription = Some(stream.subscribe(scheduler, observer));

        Ok(true)
    }

    /// Install the chart that receives points, returning the previous one
    ///
    /// Events that arrive while no chart is attached are not plotted.
    pub fn attach_chart(&self, chart: C) -> Option<C> {
        self.chart.lock().replace(chart)
    }

    /// Run a closure against the attached chart
    pub fn with_chart<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        self.chart.lock().as_ref().map(f)
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn status(&self) -> FeedStatus {
        self.status.lock().clone()
    }

    /// Frames skipped by the current subscription because they did not decode
    pub fn decode_faults(&self) -> u64 {
        self.subscription
            .as_ref()
            .map_or(0, SubscriptionHandle::decode_faults)
    }

    /// Cancel the subscription and release the chart
    ///
    /// Safe to call when never activated or when no chart was attached.
    /// Returns the released chart.
    pub fn deactivate(&mut self) -> Option<C> {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            *self.status.lock() = FeedStatus::Idle;
        }
        self.chart.lock().take()
    }
}

impl<C: LiveChart> Drop for ChartFeed<C> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

struct FeedObserver<C> {
    chart: Arc<Mutex<Option<C>>>,
    status: Arc<Mutex<FeedStatus>>,
}

impl<C: LiveChart> TickerObserver for FeedObserver<C> {
    fn on_event(&mut self, event: TickerEvent) {
        if let Some(chart) = self.chart.lock().as_mut() {
            chart.add_point(PRICE_SERIES, Point::new(event.epoch_millis(), event.price));
        }
    }

    fn on_error(&mut self, error: StreamError) {
        warn!("Chart feed stream failed: {}", error);
        *self.status.lock() = FeedStatus::Failed(error.to_string());
    }

    fn on_complete(&mut self) {
        debug!("Chart feed stream ended");
        *self.status.lock() = FeedStatus::Ended;
    }
}
