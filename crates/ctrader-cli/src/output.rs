//! Output formatting for the ctrader CLI (table, json)

use clap::ValueEnum;
use colored::Colorize;
use chrono::DateTime;
use ctrader_client::{Campaign, DataPoint, TickerEvent};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    let table = Table::new(data).to_string();
                    println!("{}", table);
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
        }
    }

    /// Print one item per line, for streams
    pub fn print_line<T: Serialize>(&self, data: &T, table_line: impl FnOnce() -> String) {
        match self.format {
            OutputFormat::Table => println!("{}", table_line()),
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Campaign display for the campaigns command
#[derive(Debug, Tabled, Serialize)]
pub struct CampaignRow {
    #[tabled(rename = "ID")]
    pub id: u64,
    #[tabled(rename = "Provider")]
    pub provider: String,
    #[tabled(rename = "Product")]
    pub product_id: String,
    #[tabled(rename = "Volume")]
    pub volume: f64,
    #[tabled(rename = "Buy limit")]
    pub buy_limit: f64,
    #[tabled(rename = "Sell limit")]
    pub sell_limit: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl From<&Campaign> for CampaignRow {
    fn from(c: &Campaign) -> Self {
        let updated = c.updated_at.or(c.created_at);
        Self {
            id: c.id,
            provider: c.provider.clone(),
            product_id: c.product_id.clone(),
            volume: c.volume,
            buy_limit: c.buy_limit,
            sell_limit: format!("{} {}", c.sell_limit, c.sell_limit_unit),
            state: c.state.to_string(),
            updated: updated.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

/// Table row for a recorded price
#[derive(Tabled, Serialize)]
pub struct PriceRow {
    #[tabled(rename = "Time")]
    pub time: String,
    #[tabled(rename = "Price")]
    pub price: f64,
}

impl From<&DataPoint> for PriceRow {
    fn from(p: &DataPoint) -> Self {
        let time = DateTime::from_timestamp(p.time, 0)
            .map_or_else(|| p.time.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        Self {
            time,
            price: p.value,
        }
    }
}

/// One line of the ticker command
pub fn ticker_line(event: &TickerEvent) -> String {
    let side = if event.is_buy() {
        event.side.green()
    } else {
        event.side.red()
    };
    format!(
        "[{}] {} {} {} @ {}",
        event.time.format("%H:%M:%S%.3f"),
        event.product.bold(),
        side,
        event.size,
        event.price
    )
}
