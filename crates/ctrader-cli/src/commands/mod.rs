//! Command implementations for the ctrader CLI

pub mod campaigns;
pub mod history;
pub mod ticker;
pub mod watch;

pub use campaigns::campaigns;
pub use history::history;
pub use ticker::ticker;
pub use watch::watch;
