//! Real-time ticker streaming
//!
//! Bridges the timeseries SSE endpoint into either a pull-style
//! [`TickerStream`] or an observer subscription whose callbacks run on the
//! application's [`UpdateLoop`].
//!
//! # Example
//!
//! ```no_run
//! use ctrader_client::{ApiClient, UpdateLoop};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new("http://localhost:8080")?;
//! let mut update_loop = UpdateLoop::new();
//!
//! // Nothing is connected until the observer is attached
//! let stream = client.ticker("gdax", "BTC-EUR")?;
//! let handle = stream.subscribe(&update_loop.scheduler(), |event: ctrader_client::TickerEvent| {
//!     println!("{} {}", event.time, event.price);
//! });
//!
//! // Callbacks run here, on the loop's task
//! for _ in 0..10 {
//!     update_loop.turn().await;
//! }
//!
//! handle.cancel();
//! # Ok(())
//! # }
//! ```

mod parser;
mod subscription;
mod ticker;
mod types;
mod update_loop;

pub use parser::{SseFrame, SseParser};
pub use subscription::{SubscriptionHandle, TickerObserver};
pub use ticker::TickerStream;
pub use types::{StreamError, StreamResult};
pub use update_loop::{Scheduler, UpdateLoop};
