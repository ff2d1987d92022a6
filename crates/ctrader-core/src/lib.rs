//! ctrader-core - Domain models shared by the ctrader crates
//!
//! This crate holds the types that cross crate boundaries: the ticker events
//! pushed by the timeseries stream, campaign records served by the REST API,
//! the column-filter translation used by the list view, and the chart model
//! fed by the live ticker.

pub mod chart;
pub mod error;
pub mod models;

pub use chart::{Chart, ChartOptions, LiveChart, Point, SeriesKind, SeriesOptions};
pub use error::{CoreError, CoreResult};
pub use models::*;
