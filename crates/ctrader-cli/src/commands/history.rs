//! History command - print the prices a server recorded for a product

use anyhow::Result;
use ctrader_client::ApiClient;

use crate::output::{OutputContext, PriceRow};

/// Print the recorded prices of a provider/product pair, oldest first
pub async fn history(
    client: &ApiClient,
    provider: &str,
    product: &str,
    last: Option<usize>,
    ctx: &OutputContext,
) -> Result<()> {
    let points = client.timeseries(provider, product).await?;
    let skip = last.map_or(0, |n| points.len().saturating_sub(n));

    let rows: Vec<PriceRow> = points[skip..].iter().map(PriceRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
