//! Column filter translation for the campaign list view

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::campaign::Campaign;
use crate::error::CoreError;

/// A single column filter selected in the list view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub property: String,
    pub value: String,
}

impl ColumnFilter {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Parses `property=value`
impl FromStr for ColumnFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((property, value)) if !property.trim().is_empty() => {
                Ok(Self::new(property.trim(), value.trim()))
            }
            _ => Err(CoreError::InvalidFilter(s.to_string())),
        }
    }
}

/// Campaign listing query: property name -> permitted values
///
/// An empty query means an unfiltered fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignQuery(BTreeMap<String, Vec<String>>);

impl CampaignQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate list-view column filters into a query
    ///
    /// Each property carries exactly one value; a later filter on the same
    /// property replaces an earlier one.
    pub fn from_filters(filters: Option<&[ColumnFilter]>) -> Self {
        let mut query = Self::new();
        for filter in filters.unwrap_or_default() {
            query
                .0
                .insert(filter.property.clone(), vec![filter.value.clone()]);
        }
        query
    }

    /// Add a permitted value for a property
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.entry(property.into()).or_default().push(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, property: &str) -> Option<&[String]> {
        self.0.get(property).map(Vec::as_slice)
    }

    /// Flatten into `(key, value)` pairs, one per permitted value
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .flat_map(|(property, values)| {
                values.iter().map(move |v| (property.clone(), v.clone()))
            })
            .collect()
    }

    /// Rebuild a query from repeated `(key, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |query, (k, v)| query.with(k, v))
    }

    /// Check whether a campaign satisfies every property of the query
    ///
    /// Unknown properties never match.
    pub fn matches(&self, campaign: &Campaign) -> bool {
        self.0.iter().all(|(property, values)| {
            campaign
                .property(property)
                .is_some_and(|actual| values.iter().any(|v| *v == actual))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCampaign;
    use pretty_assertions::assert_eq;

    fn campaign(provider: &str, state: Option<&str>) -> Campaign {
        Campaign::from_new(
            1,
            NewCampaign {
                provider: provider.into(),
                product_id: "BTC-EUR".into(),
                volume: 1.0,
                buy_limit: 1.0,
                sell_limit: 2.0,
                sell_limit_unit: "%".into(),
                state: state.map(crate::models::CampaignState::new),
            },
        )
    }

    #[test]
    fn test_translate_single_filter() {
        let filters = vec![ColumnFilter::new("provider", "gdax")];
        let query = CampaignQuery::from_filters(Some(&filters));

        assert_eq!(query.len(), 1);
        assert_eq!(query.get("provider"), Some(&["gdax".to_string()][..]));
    }

    #[test]
    fn test_translate_empty_and_absent() {
        assert!(CampaignQuery::from_filters(None).is_empty());
        assert!(CampaignQuery::from_filters(Some(&[])).is_empty());
    }

    #[test]
    fn test_translate_serializes_as_map() {
        let filters = vec![ColumnFilter::new("provider", "gdax")];
        let query = CampaignQuery::from_filters(Some(&filters));
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({ "provider": ["gdax"] })
        );
        assert_eq!(
            serde_json::to_value(CampaignQuery::from_filters(None)).unwrap(),
            serde_json::json!({})
        );
    }

    #[test]
    fn test_translate_last_filter_wins() {
        let filters = vec![
            ColumnFilter::new("state", "buy"),
            ColumnFilter::new("state", "sell"),
        ];
        let query = CampaignQuery::from_filters(Some(&filters));
        assert_eq!(query.get("state"), Some(&["sell".to_string()][..]));
    }

    #[test]
    fn test_parse_filter() {
        let filter: ColumnFilter = "provider=gdax".parse().unwrap();
        assert_eq!(filter, ColumnFilter::new("provider", "gdax"));
        assert!("provider".parse::<ColumnFilter>().is_err());
        assert!("=gdax".parse::<ColumnFilter>().is_err());
    }

    #[test]
    fn test_pairs_roundtrip_keeps_multiple_values() {
        let query = CampaignQuery::new().with("state", "buy").with("state", "sell");
        let pairs = query.to_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(CampaignQuery::from_pairs(pairs), query);
    }

    #[test]
    fn test_matches() {
        let query = CampaignQuery::new().with("provider", "gdax");
        assert!(query.matches(&campaign("gdax", None)));
        assert!(!query.matches(&campaign("kraken", None)));

        let query = CampaignQuery::new().with("state", "buy").with("state", "selling");
        assert!(query.matches(&campaign("gdax", Some("selling"))));
        assert!(!query.matches(&campaign("gdax", Some("sell"))));

        assert!(!CampaignQuery::new().with("color", "red").matches(&campaign("gdax", None)));
        assert!(CampaignQuery::new().matches(&campaign("gdax", None)));
    }
}
