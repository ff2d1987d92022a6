//! Ticker command - print raw ticker events

use anyhow::Result;
use ctrader_client::ApiClient;
use futures::StreamExt;

use crate::output::{ticker_line, OutputContext};

/// Pull events from a ticker stream until Ctrl+C, the stream ends or
/// `count` events were printed
pub async fn ticker(
    client: &ApiClient,
    provider: &str,
    product: &str,
    count: Option<usize>,
    ctx: &OutputContext,
) -> Result<()> {
    let stream = client.ticker(provider, product)?;
    ctx.info(&format!("Streaming {} from {}...", product, stream.url()));
    ctx.info("Press Ctrl+C to stop");

    let mut events = stream.take(count.unwrap_or(usize::MAX));

    loop {
        tokio::select! {
            item = events.next() => match item {
                Some(Ok(event)) => ctx.print_line(&event, || ticker_line(&event)),
                Some(Err(e)) => {
                    ctx.error(&format!("Stream error: {}", e));
                    break;
                }
                None => {
                    ctx.info("Stream ended");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let faults = events.get_ref().decode_faults();
    if faults > 0 {
        ctx.warn(&format!("Skipped {} malformed frame(s)", faults));
    }

    Ok(())
}
