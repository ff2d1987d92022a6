//! Campaign records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state tag of a campaign
///
/// Tags are defined by the trading engine and are not enforced here; the
/// constants cover the ones it currently emits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignState(String);

impl CampaignState {
    pub const BUY: &'static str = "buy";
    pub const BUYING: &'static str = "buying";
    pub const SELL: &'static str = "sell";
    pub const SELLING: &'static str = "selling";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this state carries the given tag
    pub fn is(&self, tag: &str) -> bool {
        self.0 == tag
    }
}

impl Default for CampaignState {
    fn default() -> Self {
        Self::new(Self::BUY)
    }
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configured trading campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: u64,
    pub provider: String,
    pub product_id: String,
    pub volume: f64,
    pub buy_limit: f64,
    pub sell_limit: f64,
    pub sell_limit_unit: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: CampaignState,
}

/// Payload for creating or replacing a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub provider: String,
    pub product_id: String,
    pub volume: f64,
    pub buy_limit: f64,
    pub sell_limit: f64,
    pub sell_limit_unit: String,
    /// Initial state; the server defaults it to `buy`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CampaignState>,
}

impl Campaign {
    /// Build a campaign record from a creation payload
    pub fn from_new(id: u64, new: NewCampaign) -> Self {
        Self {
            id,
            provider: new.provider,
            product_id: new.product_id,
            volume: new.volume,
            buy_limit: new.buy_limit,
            sell_limit: new.sell_limit,
            sell_limit_unit: new.sell_limit_unit,
            created_at: None,
            updated_at: None,
            state: new.state.unwrap_or_default(),
        }
    }

    /// Value of a filterable property, by its wire name
    pub fn property(&self, property: &str) -> Option<String> {
        match property {
            "id" => Some(self.id.to_string()),
            "provider" => Some(self.provider.clone()),
            "product_id" => Some(self.product_id.clone()),
            "sell_limit_unit" => Some(self.sell_limit_unit.clone()),
            "state" => Some(self.state.to_string()),
            _ => None,
        }
    }
}
