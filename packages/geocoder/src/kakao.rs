//! Kakao Local address search client.
//!
//! One `GET` per address against `/v2/local/search/address.json`, with the
//! REST key sent as `Authorization: KakaoAK <key>`. Kakao allows
//! **10 requests per second** per key; the caller paces requests (see
//! `rate_limit_ms` in the service TOML configuration).
//!
//! See <https://developers.kakao.com/docs/latest/ko/local/dev-guide#address-coord>

use std::time::Duration;

use async_trait::async_trait;

use crate::service_registry::{GeocodingService, ProviderConfig};
use crate::{GeocodeError, GeocodedAddress, Geocoder, GeocodingProvider};

/// Geocoder backed by the Kakao Local address search API.
#[derive(Debug, Clone)]
pub struct KakaoGeocoder {
    id: String,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl KakaoGeocoder {
    /// Creates a client for `base_url` authenticating with `api_key`.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            id: "kakao".to_string(),
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Builds a client from a registry entry, applying its request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_service(
        service: &GeocodingService,
        api_key: impl Into<String>,
    ) -> Result<Self, GeocodeError> {
        let ProviderConfig::Kakao {
            base_url,
            timeout_secs,
            ..
        } = &service.provider;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(*timeout_secs))
            .build()?;

        let mut geocoder = Self::new(client, base_url.clone(), api_key);
        geocoder.id.clone_from(&service.id);
        Ok(geocoder)
    }
}

/// Reads the REST API key from the environment variable `var`.
///
/// Blank values count as missing.
#[must_use]
pub fn api_key_from_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

#[async_trait]
impl Geocoder for KakaoGeocoder {
    fn id(&self) -> &str {
        &self.id
    }

    async fn resolve(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("query", address)])
            .header(reqwest::header::AUTHORIZATION, format!("KakaoAK {}", self.api_key))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !status.is_success() {
            log::debug!("Kakao returned {status} for '{address}'");
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await?;
        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| GeocodeError::Parse {
                message: format!("Kakao response is not JSON: {e}"),
            })?;

        parse_response(&body)?.ok_or(GeocodeError::NoMatch)
    }
}

/// Parses a Kakao address search response, taking the first document.
///
/// Coordinates arrive as strings (`x` is longitude, `y` is latitude); bare
/// numbers are accepted too.
///
/// # Errors
///
/// Returns [`GeocodeError::Parse`] if `documents` is missing or the first
/// document has no usable coordinates.
pub fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let documents = body["documents"]
        .as_array()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Kakao response has no documents array".to_string(),
        })?;

    let Some(first) = documents.first() else {
        return Ok(None);
    };

    let lat = coordinate(&first["y"]).ok_or_else(|| GeocodeError::Parse {
        message: "Missing y in Kakao response".to_string(),
    })?;

    let lng = coordinate(&first["x"]).ok_or_else(|| GeocodeError::Parse {
        message: "Missing x in Kakao response".to_string(),
    })?;

    Ok(Some(GeocodedAddress {
        latitude: lat,
        longitude: lng,
        matched_address: non_blank(&first["address_name"]),
        road_address: non_blank(&first["road_address"]["address_name"]),
        provider: GeocodingProvider::Kakao,
    }))
}

fn coordinate(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn non_blank(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
