//! Domain models

mod campaign;
mod filter;
mod ticker;
mod timeseries;

pub use campaign::{Campaign, CampaignState, NewCampaign};
pub use filter::{CampaignQuery, ColumnFilter};
pub use ticker::{Product, TickerEvent};
pub use timeseries::{DataPoint, Timeseries};
