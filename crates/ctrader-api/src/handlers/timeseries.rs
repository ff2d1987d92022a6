//! Timeseries handlers
//!
//! The event stream serves ticker events as SSE frames: `id` is the event
//! time in Unix seconds, `data` the JSON-encoded event.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use ctrader_core::{DataPoint, Product, TickerEvent};
use tokio_stream::StreamExt;

use crate::error::ApiError;
use crate::state::AppState;

/// Reconnection delay advertised to clients
const RETRY: Duration = Duration::from_secs(5);

/// Validate route parameters and build the hub key
///
/// `provider` is lowercase letters, `product` a lowercase `from-to` pair.
fn channel_key(provider: &str, product: &str) -> Result<String, ApiError> {
    if provider.is_empty() || !provider.bytes().all(|b| b.is_ascii_lowercase()) {
        return Err(ApiError::BadRequest(format!("Invalid provider: {}", provider)));
    }
    let parsed = Product::parse(product)?;
    if parsed.route_segment() != product {
        return Err(ApiError::BadRequest(format!("Invalid product: {}", product)));
    }

    Ok(parsed.channel_key(provider))
}

/// GET /api/v1/timeseries/{provider}/{product}
///
/// Recorded prices of the product, oldest first.
pub async fn get_timeseries(
    State(state): State<AppState>,
    Path((provider, product)): Path<(String, String)>,
) -> Result<Json<Vec<DataPoint>>, ApiError> {
    let key = channel_key(&provider, &product)?;

    state
        .hub()
        .timeseries(&key)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Timeseries not found: {}", key)))
}

/// GET /api/v1/timeseries/{provider}/{product}/events
pub async fn ticker_events(
    State(state): State<AppState>,
    Path((provider, product)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let key = channel_key(&provider, &product)?;

    // No replay: the header is only logged
    if let Some(last_id) = headers.get("last-event-id").and_then(|v| v.to_str().ok()) {
        tracing::debug!(%key, "Recovery requested with ID: {}", last_id);
    }

    let subscription = state.hub().subscribe(&key);
    tracing::debug!(%key, "Ticker stream opened");

    let events = subscription.filter_map(|result| match result {
        Ok(event) => to_sse_event(&event).map(Ok::<_, Infallible>),
        Err(_) => None, // Skip lagged messages
    });
    let stream = tokio_stream::once(Ok(Event::default().retry(RETRY))).chain(events);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &TickerEvent) -> Option<Event> {
    match Event::default()
        .id(event.time.timestamp().to_string())
        .json_data(event)
    {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::error!(error = %e, "Encoding ticker event failed");
            None
        }
    }
}
