//! ctrader HTTP client implementation

use std::time::Duration;

use ctrader_core::{Campaign, CampaignQuery, DataPoint, NewCampaign};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};
use crate::streaming::TickerStream;
use crate::types::{ContentType, ErrorResponse, RequestOptions};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// ctrader REST API client
///
/// Request paths are relative to `{base}/api/`; a leading `/` is ignored.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    /// Client for event streams: no total timeout, they are long-lived
    stream_client: Client,
    base_url: Url,
    api_url: Url,
}

impl ApiClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the server (e.g., "http://localhost:8080")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts
    pub fn with_config(base_url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let stream_client = Client::builder().connect_timeout(connect_timeout).build()?;

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let api_url = base_url.join("api/")?;

        Ok(Self {
            client,
            stream_client,
            base_url,
            api_url,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path
    pub fn url(&self, path: &str) -> Result<Url> {
        let path = path.strip_prefix('/').unwrap_or(path);
        Ok(self.api_url.join(path)?)
    }

    // =========================================================================
    // Health Check
    // =========================================================================

    /// Check server health
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String> {
        let url = self.base_url.join("health")?;
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(extract_error(response).await)
        }
    }

    // =========================================================================
    // Request/Response
    // =========================================================================

    /// Perform a request with the `GET` method
    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> Result<T> {
        self.request(Method::GET, path, None::<&()>, options).await
    }

    /// Perform a request with the `POST` method
    pub async fn post<B, T>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body), options).await
    }

    /// Perform a request with the `PUT` method
    pub async fn put<B, T>(&self, path: &str, body: &B, options: &RequestOptions) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body), options).await
    }

    /// Perform a request with the `DELETE` method
    pub async fn delete<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> Result<T> {
        self.request(Method::DELETE, path, None::<&()>, options).await
    }

    #[instrument(skip(self, body, options), fields(content_type = options.content_type.mime()))]
    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut url = self.url(path)?;
        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&options.query);
        }
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, options.content_type.mime())
                .body(encode_body(body, options.content_type)?);
        }

        let response = request.send().await?;
        handle_response(response).await
    }

    // =========================================================================
    // Campaigns
    // =========================================================================

    /// List campaigns matching a query (empty query = all campaigns)
    #[instrument(skip(self))]
    pub async fn list_campaigns(&self, query: &CampaignQuery) -> Result<Vec<Campaign>> {
        let options = RequestOptions::new().with_query_pairs(query.to_pairs());
        self.get("/v1/campaigns", &options).await
    }

    /// Get a campaign by ID
    #[instrument(skip(self))]
    pub async fn get_campaign(&self, id: u64) -> Result<Campaign> {
        self.get(&format!("/v1/campaigns/{}", id), &RequestOptions::new())
            .await
    }

    /// Create a campaign
    #[instrument(skip(self))]
    pub async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign> {
        self.post("/v1/campaigns", campaign, &RequestOptions::new())
            .await
    }

    /// Replace a campaign's parameters
    #[instrument(skip(self))]
    pub async fn update_campaign(&self, id: u64, campaign: &NewCampaign) -> Result<Campaign> {
        self.put(
            &format!("/v1/campaigns/{}", id),
            campaign,
            &RequestOptions::new(),
        )
        .await
    }

    /// Delete a campaign, returning the deleted record
    #[instrument(skip(self))]
    pub async fn delete_campaign(&self, id: u64) -> Result<Campaign> {
        self.delete(&format!("/v1/campaigns/{}", id), &RequestOptions::new())
            .await
    }

    // =========================================================================
    // Timeseries
    // =========================================================================

    /// Resolve `v1/timeseries/{provider}/{product}` plus extra segments
    ///
    /// Both identifiers are trimmed and must be ASCII letters, digits, `-`
    /// or `_`; the product is lower-cased so callers may pass `BTC-EUR`.
    fn timeseries_url(&self, provider: &str, product: &str, extra: &[&str]) -> Result<Url> {
        let provider = identifier("provider", provider)?;
        let product = identifier("product", product)?.to_lowercase();

        let mut url = self.url("v1/timeseries")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidArgument("server URL cannot be a base".into()))?
            .pop_if_empty()
            .extend([provider, product.as_str()])
            .extend(extra);
        Ok(url)
    }

    /// Get the recorded prices of a provider/product pair, oldest first
    #[instrument(skip(self))]
    pub async fn timeseries(&self, provider: &str, product: &str) -> Result<Vec<DataPoint>> {
        let url = self.timeseries_url(provider, product, &[])?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        handle_response(response).await
    }

    // =========================================================================
    // Ticker Streaming
    // =========================================================================

    /// Get the event stream URL for a provider/product pair
    pub fn ticker_url(&self, provider: &str, product: &str) -> Result<Url> {
        self.timeseries_url(provider, product, &["events"])
    }

    /// Build a ticker stream for a provider/product pair
    ///
    /// No connection is made here; see [`TickerStream`].
    pub fn ticker(&self, provider: &str, product: &str) -> Result<TickerStream> {
        let url = self.ticker_url(provider, product)?;
        Ok(TickerStream::new(self.stream_client.clone(), url))
    }
}

/// Check that a route identifier is one plain path segment
fn identifier<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ClientError::InvalidArgument(format!("{} must not be empty", name)));
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(ClientError::InvalidArgument(format!(
            "invalid {}: {:?}",
            name, value
        )));
    }

    Ok(value)
}

/// Encode a request body for the given content type
///
/// Form bodies must serialize to a JSON object; each member becomes a
/// percent-encoded `key=value` pair, pairs joined by `&`.
fn encode_body<B: Serialize + ?Sized>(body: &B, content_type: ContentType) -> Result<String> {
    match content_type {
        ContentType::Json => {
            serde_json::to_string(body).map_err(|e| ClientError::EncodeError(e.to_string()))
        }
        ContentType::FormUrlEncoded => {
            let value =
                serde_json::to_value(body).map_err(|e| ClientError::EncodeError(e.to_string()))?;
            let object = value.as_object().ok_or_else(|| {
                ClientError::EncodeError("form body must be an object".to_string())
            })?;

            let mut form = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in object {
                match value {
                    serde_json::Value::String(s) => form.append_pair(key, s),
                    other => form.append_pair(key, &other.to_string()),
                };
            }
            Ok(form.finish())
        }
    }
}

/// Handle response and deserialize JSON
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if response.status().is_success() {
        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    } else {
        Err(extract_error(response).await)
    }
}

/// Extract error from failed response
async fn extract_error(response: reqwest::Response) -> ClientError {
    let status = response.status();

    let message = match response.json::<ErrorResponse>().await {
        Ok(err) if !err.message.is_empty() => err.message,
        Ok(err) => err.error,
        Err(_) => format!("HTTP {}", status),
    };

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ClientError::Timeout,
        _ => ClientError::server_error(status.as_u16(), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new("http://localhost:8080");
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = ApiClient::new("not a url");
        assert!(client.is_err());
    }

    #[test]
    fn test_url_strips_leading_slash() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.url("/v1/campaigns").unwrap().as_str(),
            "http://localhost:8080/api/v1/campaigns"
        );
        assert_eq!(
            client.url("v1/campaigns").unwrap().as_str(),
            "http://localhost:8080/api/v1/campaigns"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = ApiClient::new("http://localhost:8080/dashboard").unwrap();
        assert_eq!(
            client.url("/v1/campaigns").unwrap().as_str(),
            "http://localhost:8080/dashboard/api/v1/campaigns"
        );
    }

    #[test]
    fn test_ticker_url_lowercases_product() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        let url = client.ticker_url("gdax", "BTC-EUR").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v1/timeseries/gdax/btc-eur/events"
        );
    }

    #[test]
    fn test_ticker_url_rejects_path_injection() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        for product in ["btc-eur?x=1", "../../campaigns/1", "btc-eur#frag", "btc/eur", "btc eur"] {
            assert!(
                matches!(
                    client.ticker_url("gdax", product),
                    Err(ClientError::InvalidArgument(_))
                ),
                "product {:?}",
                product
            );
        }
        assert!(matches!(
            client.ticker_url("..", "btc-eur"),
            Err(ClientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_ticker_url_keeps_base_path() {
        let client = ApiClient::new("http://localhost:8080/dashboard/").unwrap();
        assert_eq!(
            client.ticker_url(" gdax ", "ETH-EUR").unwrap().as_str(),
            "http://localhost:8080/dashboard/api/v1/timeseries/gdax/eth-eur/events"
        );
    }

    #[test]
    fn test_ticker_rejects_empty_identifiers() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert!(matches!(
            client.ticker("", "btc-eur"),
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            client.ticker("gdax", "  "),
            Err(ClientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_ticker_is_lazy() {
        // Port 9 (discard) is never contacted: building the stream does no I/O
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let stream = client.ticker("gdax", "BTC-EUR").unwrap();
        assert!(!stream.is_connected());
        assert_eq!(stream.decode_faults(), 0);
    }

    #[test]
    fn test_encode_json_body() {
        let body = encode_body(&json!({"volume": 1.5}), ContentType::Json).unwrap();
        assert_eq!(body, r#"{"volume":1.5}"#);
    }

    #[test]
    fn test_encode_form_body() {
        let body = encode_body(
            &json!({"name": "a b&c", "volume": 2, "enabled": true}),
            ContentType::FormUrlEncoded,
        )
        .unwrap();

        let pairs: Vec<&str> = body.split('&').collect();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&"name=a+b%26c"));
        assert!(pairs.contains(&"volume=2"));
        assert!(pairs.contains(&"enabled=true"));
    }

    #[test]
    fn test_encode_form_body_requires_object() {
        let result = encode_body(&json!([1, 2]), ContentType::FormUrlEncoded);
        assert!(matches!(result, Err(ClientError::EncodeError(_))));
    }
}
