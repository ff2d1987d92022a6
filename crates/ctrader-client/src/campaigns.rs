//! Campaign list view state

use ctrader_core::{Campaign, CampaignQuery, ColumnFilter};
use tracing::warn;

use crate::error::Result;
use crate::ApiClient;

/// Rows, total and loading indicator of the campaign list
#[derive(Debug, Clone, Default)]
pub struct CampaignListView {
    pub campaigns: Vec<Campaign>,
    pub total: usize,
    pub loading: bool,
}

impl CampaignListView {
    /// A fresh view starts out loading, before the first fetch completes
    pub fn new() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// Refetch the campaigns matching the selected column filters
    ///
    /// On failure the previous rows stay in place, `loading` is cleared and
    /// the error is returned for the caller to present.
    pub async fn refresh(
        &mut self,
        client: &ApiClient,
        filters: Option<&[ColumnFilter]>,
    ) -> Result<&[Campaign]> {
        self.loading = true;
        let query = CampaignQuery::from_filters(filters);

        let result = client.list_campaigns(&query).await;
        self.loading = false;

        match result {
            Ok(campaigns) => {
                self.total = campaigns.len();
                self.campaigns = campaigns;
                Ok(&self.campaigns)
            }
            Err(e) => {
                warn!("Campaign refresh failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_view_is_loading() {
        let view = CampaignListView::new();
        assert!(view.loading);
        assert_eq!(view.total, 0);
        assert!(view.campaigns.is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_rows() {
        // Nothing listens on port 9: the request fails
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let mut view = CampaignListView::new();
        view.campaigns = vec![Campaign::from_new(
            1,
            ctrader_core::NewCampaign {
                provider: "gdax".into(),
                product_id: "BTC-EUR".into(),
                volume: 1.0,
                buy_limit: 1.0,
                sell_limit: 2.0,
                sell_limit_unit: "%".into(),
                state: None,
            },
        )];
        view.total = 1;

        assert!(view.refresh(&client, None).await.is_err());
        assert!(!view.loading);
        assert_eq!(view.total, 1);
        assert_eq!(view.campaigns.len(), 1);
    }
}
