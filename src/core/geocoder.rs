use crate::domain::model::{Coordinates, GeocodeOutcome};
use crate::domain::ports::Geocoder;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_GEOCODING_ENDPOINT: &str = "https://maps.googleapis.com/maps/api";

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeApiResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeApiResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: Coordinates,
}

/// 組合查詢字串：有城市時為 `"<address>, <city>"`
pub fn build_query(cleaned_address: &str, city: &str) -> String {
    let city = city.trim();
    if city.is_empty() {
        cleaned_address.to_string()
    } else {
        format!("{}, {}", cleaned_address, city)
    }
}

/// 將 API 回應對應到三種結果之一
pub fn interpret_response(response: GeocodeResponse) -> GeocodeOutcome {
    match response.status.as_str() {
        "OK" => match response.results.into_iter().next() {
            Some(result) => GeocodeOutcome::Found(result.geometry.location),
            None => GeocodeOutcome::Failed {
                reason: "status OK without results".to_string(),
            },
        },
        "ZERO_RESULTS" => GeocodeOutcome::ZeroResults,
        status => GeocodeOutcome::Failed {
            reason: match response.error_message {
                Some(message) => format!("{}: {}", status, message),
                None => status.to_string(),
            },
        },
    }
}

/// Google Geocoding API 用戶端，一次一個請求，不重試
pub struct GoogleGeocoder {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// 未指定逾時則使用 client 預設值
    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    pub fn request_url(&self, query: &str) -> std::result::Result<Url, url::ParseError> {
        let base = format!("{}/geocode/json", self.endpoint.trim_end_matches('/'));
        Url::parse_with_params(&base, &[("address", query), ("key", self.api_key.as_str())])
    }

    async fn fetch(&self, url: Url) -> std::result::Result<GeocodeResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        tracing::debug!("Geocoding API response status: {}", response.status());
        response.json::<GeocodeResponse>().await
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, query: &str) -> GeocodeOutcome {
        let url = match self.request_url(query) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("❌ Could not build geocoding URL for {}: {}", query, e);
                return GeocodeOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let outcome = match self.fetch(url).await {
            Ok(response) => interpret_response(response),
            // 錯誤訊息中的 URL 含有 API key，先移除
            Err(e) => GeocodeOutcome::Failed {
                reason: e.without_url().to_string(),
            },
        };

        match &outcome {
            GeocodeOutcome::Found(location) => {
                tracing::debug!("📍 {} -> ({}, {})", query, location.lat, location.lng);
            }
            GeocodeOutcome::ZeroResults => {
                tracing::warn!("⚠️ No results found for address: {}", query);
            }
            GeocodeOutcome::Failed { reason } => {
                tracing::error!("❌ Geocoding error for {}: {}", query, reason);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_build_query_with_and_without_city() {
        assert_eq!(build_query("Av. Reforma 123", " CDMX "), "Av. Reforma 123, CDMX");
        assert_eq!(build_query("Av. Reforma 123", "   "), "Av. Reforma 123");
        assert_eq!(build_query("Av. Reforma 123", ""), "Av. Reforma 123");
    }

    #[test]
    fn test_request_url_encodes_query() {
        let geocoder = GoogleGeocoder::new("https://maps.googleapis.com/maps/api/", "k3y");
        let url = geocoder.request_url("Calle 5 #12, Bogotá").unwrap();

        assert_eq!(url.path(), "/maps/api/geocode/json");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("address".to_string(), "Calle 5 #12, Bogotá".to_string()),
                ("key".to_string(), "k3y".to_string()),
            ]
        );
        assert!(!url.as_str().contains('#'));
    }

    #[test]
    fn test_interpret_ok_takes_first_result() {
        let response: GeocodeResponse = serde_json::from_value(serde_json::json!({
            "status": "OK",
            "results": [
                {"geometry": {"location": {"lat": 19.43, "lng": -99.13}}},
                {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
            ]
        }))
        .unwrap();

        assert_eq!(
            interpret_response(response),
            GeocodeOutcome::Found(Coordinates {
                lat: 19.43,
                lng: -99.13
            })
        );
    }

    #[test]
    fn test_interpret_zero_results_and_errors() {
        let zero: GeocodeResponse =
            serde_json::from_value(serde_json::json!({"status": "ZERO_RESULTS"})).unwrap();
        assert_eq!(interpret_response(zero), GeocodeOutcome::ZeroResults);

        let denied: GeocodeResponse = serde_json::from_value(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        }))
        .unwrap();
        assert_eq!(
            interpret_response(denied),
            GeocodeOutcome::Failed {
                reason: "REQUEST_DENIED: The provided API key is invalid.".to_string()
            }
        );

        let empty_ok: GeocodeResponse =
            serde_json::from_value(serde_json::json!({"status": "OK", "results": []})).unwrap();
        assert!(matches!(
            interpret_response(empty_ok),
            GeocodeOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_geocode_success_against_mock_api() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/geocode/json")
                .query_param("address", "Av. Reforma 123, CDMX")
                .query_param("key", "test-key");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "status": "OK",
                    "results": [{"geometry": {"location": {"lat": 19.4326, "lng": -99.1332}}}]
                }));
        });

        let geocoder = GoogleGeocoder::new(server.base_url(), "test-key");
        let outcome = geocoder.geocode("Av. Reforma 123, CDMX").await;

        api_mock.assert();
        assert_eq!(
            outcome.coordinates(),
            Some(Coordinates {
                lat: 19.4326,
                lng: -99.1332
            })
        );
    }

    #[tokio::test]
    async fn test_geocode_http_error_is_swallowed() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/geocode/json");
            then.status(500).body("upstream exploded");
        });

        let geocoder = GoogleGeocoder::new(server.base_url(), "secret-key");
        let outcome = geocoder.geocode("Calle Luna 8").await;

        api_mock.assert();
        match outcome {
            GeocodeOutcome::Failed { reason } => assert!(!reason.contains("secret-key")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_geocode_unreachable_host_is_swallowed() {
        let geocoder = GoogleGeocoder::with_timeout(
            "http://127.0.0.1:1",
            "secret-key",
            Some(Duration::from_secs(2)),
        )
        .unwrap();

        let outcome = geocoder.geocode("Calle Luna 8").await;
        assert!(matches!(outcome, GeocodeOutcome::Failed { .. }));
    }
}
