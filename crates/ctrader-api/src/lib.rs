//! ctrader-api - REST API for campaigns and ticker streams
//!
//! # Usage
//!
//! ```ignore
//! use ctrader_api::{create_router, AppState};
//!
//! let state = AppState::new();
//! let hub = state.hub().clone();
//! let router = create_router(state);
//!
//! // Elsewhere: push exchange ticks to stream subscribers
//! hub.publish("gdax", event);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::{AppState, CampaignStore, TickerHub, TickerSubscription};

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the ctrader REST API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Campaign routes
        .route(
            "/api/v1/campaigns",
            get(handlers::campaigns::list_campaigns).post(handlers::campaigns::create_campaign),
        )
        .route(
            "/api/v1/campaigns/{id}",
            get(handlers::campaigns::get_campaign)
                .put(handlers::campaigns::update_campaign)
                .delete(handlers::campaigns::delete_campaign),
        )
        // Timeseries history and event stream
        .route(
            "/api/v1/timeseries/{provider}/{product}",
            get(handlers::timeseries::get_timeseries),
        )
        .route(
            "/api/v1/timeseries/{provider}/{product}/events",
            get(handlers::timeseries::ticker_events),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
