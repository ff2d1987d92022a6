//! ctrader Client Library
//!
//! Typed HTTP client for the ctrader API and the real-time ticker bridge
//! that feeds the dashboard's live chart.
//!
//! # Example
//!
//! ```rust,no_run
//! use ctrader_client::{ApiClient, CampaignQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new("http://localhost:8080")?;
//!
//!     // Only gdax campaigns
//!     let query = CampaignQuery::new().with("provider", "gdax");
//!     let campaigns = client.list_campaigns(&query).await?;
//!     println!("{} campaigns", campaigns.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Live chart
//!
//! [`ChartFeed`] ties a ticker subscription to a [`LiveChart`]; its
//! callbacks run on an [`UpdateLoop`] owned by the application task.
//!
//! # Testing
//!
//! The `testing` module serves an axum router on an ephemeral port:
//!
//! ```rust,ignore
//! use ctrader_client::testing::TestServer;
//! use ctrader_api::{create_router, AppState};
//!
//! let server = TestServer::start(create_router(AppState::new())).await?;
//! let campaigns = server.client.list_campaigns(&Default::default()).await?;
//! ```

mod campaigns;
mod client;
mod error;
pub mod feed;
pub mod streaming;
pub mod testing;
mod types;

pub use campaigns::CampaignListView;
pub use client::ApiClient;
pub use error::{ClientError, Result};
pub use feed::{ChartFeed, FeedStatus, PRICE_SERIES};
pub use types::{ContentType, ErrorResponse, RequestOptions};

// Re-export streaming types for convenience
pub use streaming::{
    Scheduler, StreamError, SubscriptionHandle, TickerObserver, TickerStream, UpdateLoop,
};

// Re-export core types for convenience
pub use ctrader_core::{
    Campaign, CampaignQuery, CampaignState, Chart, ChartOptions, ColumnFilter, DataPoint,
    LiveChart, NewCampaign, Point, TickerEvent,
};
