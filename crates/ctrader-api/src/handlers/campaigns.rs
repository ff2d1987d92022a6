//! Campaign handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use ctrader_core::{Campaign, CampaignQuery, NewCampaign};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/campaigns
///
/// Optional filters (`provider`, `product_id`, `state`, ...) may repeat;
/// a campaign matches when every filtered property has one of the values.
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<Vec<Campaign>> {
    let query = CampaignQuery::from_pairs(pairs);
    let store = state.campaigns().read();

    Json(store.all().filter(|c| query.matches(c)).cloned().collect())
}

/// POST /api/v1/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(request): Json<NewCampaign>,
) -> (StatusCode, Json<Campaign>) {
    let mut store = state.campaigns().write();

    let mut campaign = Campaign::from_new(store.next_id(), request);
    campaign.created_at = Some(Utc::now());
    store.insert(campaign.clone());

    tracing::debug!(id = campaign.id, provider = %campaign.provider, "Campaign created");
    (StatusCode::CREATED, Json(campaign))
}

/// GET /api/v1/campaigns/{id}
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Campaign>, ApiError> {
    state
        .campaigns()
        .read()
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// PUT /api/v1/campaigns/{id}
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<NewCampaign>,
) -> Result<Json<Campaign>, ApiError> {
    let mut store = state.campaigns().write();
    let campaign = store.get_mut(id).ok_or_else(|| not_found(id))?;

    let previous_state = campaign.state.clone();
    let created_at = campaign.created_at;
    *campaign = Campaign::from_new(id, request.clone());
    campaign.created_at = created_at;
    campaign.updated_at = Some(Utc::now());
    if request.state.is_none() {
        campaign.state = previous_state;
    }

    Ok(Json(campaign.clone()))
}

/// DELETE /api/v1/campaigns/{id}
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Campaign>, ApiError> {
    state
        .campaigns()
        .write()
        .remove(id)
        .map(Json)
        .ok_or_else(|| not_found(id))
}

fn not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("Campaign not found: {}", id))
}
