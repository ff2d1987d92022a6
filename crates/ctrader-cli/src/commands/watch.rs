//! Watch command - live price chart in the terminal

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::DateTime;
use colored::Colorize;
use ctrader_client::{
    ApiClient, ChartFeed, ChartOptions, FeedStatus, LiveChart, Point, UpdateLoop,
};
use ctrader_core::Product;
use serde::Serialize;

use crate::output::{OutputContext, OutputFormat};

/// Follow a product's ticker and plot every price until Ctrl+C or the
/// server closes the stream
pub async fn watch(
    client: &ApiClient,
    provider: &str,
    product: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let parsed = Product::parse(&product.to_lowercase())
        .with_context(|| format!("Invalid product: {}", product))?;
    let options = ChartOptions::price_chart(parsed.from_currency(), parsed.to_currency());

    if !ctx.quiet && ctx.format == OutputFormat::Table {
        println!("{}", options.title.bold());
    }
    ctx.info("Press Ctrl+C to stop");

    let mut update_loop = UpdateLoop::new();
    let mut feed = ChartFeed::new(provider, product);
    feed.activate(client, &update_loop.scheduler())?;
    feed.attach_chart(TerminalChart::new(options, ctx.format));

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    update_loop
        .run_until(async {
            while running.load(Ordering::SeqCst) && !feed.status().is_terminal() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

    match feed.status() {
        FeedStatus::Failed(e) => ctx.error(&format!("Stream error: {}", e)),
        FeedStatus::Ended => ctx.info("Stream ended"),
        _ => ctx.info("\nStopping feed..."),
    }

    let faults = feed.decode_faults();
    if let Some(chart) = feed.deactivate() {
        ctx.success(&chart.summary());
    }
    if faults > 0 {
        ctx.warn(&format!("Skipped {} malformed frame(s)", faults));
    }

    Ok(())
}

/// Chart that draws each appended point as one terminal line
pub struct TerminalChart {
    options: ChartOptions,
    format: OutputFormat,
    count: usize,
    last: Option<f64>,
    low: f64,
    high: f64,
}

#[derive(Serialize)]
struct PlottedPoint<'a> {
    series: &'a str,
    x: i64,
    y: f64,
}

impl TerminalChart {
    pub fn new(options: ChartOptions, format: OutputFormat) -> Self {
        Self {
            options,
            format,
            count: 0,
            last: None,
            low: f64::INFINITY,
            high: f64::NEG_INFINITY,
        }
    }

    pub fn summary(&self) -> String {
        if self.count == 0 {
            return "No points plotted".to_string();
        }
        format!(
            "{} point(s), low {}, high {}",
            self.count, self.low, self.high
        )
    }

    fn line(&self, name: &str, point: Point) -> String {
        let time = DateTime::from_timestamp_millis(point.x)
            .map_or_else(|| point.x.to_string(), |t| t.format("%H:%M:%S%.3f").to_string());

        let price = match self.last {
            Some(last) if point.y > last => format!("{} ▲", point.y).green(),
            Some(last) if point.y < last => format!("{} ▼", point.y).red(),
            _ => format!("{} ·", point.y).normal(),
        };

        format!("[{}] {}: {}", time, name, price)
    }
}

impl LiveChart for TerminalChart {
    fn add_point(&mut self, series: usize, point: Point) -> bool {
        let Some(name) = self.options.series.get(series).map(|s| s.name.clone()) else {
            return false;
        };

        match self.format {
            OutputFormat::Table => println!("{}", self.line(&name, point)),
            OutputFormat::Json => {
                let plotted = PlottedPoint {
                    series: &name,
                    x: point.x,
                    y: point.y,
                };
                if let Ok(json) = serde_json::to_string(&plotted) {
                    println!("{}", json);
                }
            }
        }

        self.count += 1;
        self.last = Some(point.y);
        self.low = self.low.min(point.y);
        self.high = self.high.max(point.y);
        true
    }
}
