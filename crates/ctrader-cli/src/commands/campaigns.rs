//! Campaigns command - list campaigns with column filters

use anyhow::Result;
use ctrader_client::{ApiClient, CampaignListView, ColumnFilter};

use crate::output::{CampaignRow, OutputContext};

/// List campaigns, filtered by `property=value` pairs
pub async fn campaigns(
    client: &ApiClient,
    filters: &[ColumnFilter],
    ctx: &OutputContext,
) -> Result<()> {
    let mut view = CampaignListView::new();
    let filters = (!filters.is_empty()).then_some(filters);

    let rows: Vec<CampaignRow> = view
        .refresh(client, filters)
        .await?
        .iter()
        .map(CampaignRow::from)
        .collect();

    ctx.print(&rows);
    if !ctx.quiet && ctx.format == crate::output::OutputFormat::Table {
        println!("{} campaign(s)", view.total);
    }
    Ok(())
}
