//! OpenRouteService HTTP adapter for route directions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RoutingError;
use crate::model::{Coordinate, RouteResult};
use crate::ors_response::parse_directions;
use crate::traits::RoutingProvider;

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Default user agent for directions requests.
pub const DEFAULT_USER_AGENT: &str = "route-engine/0.1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Idle pooled connections are dropped after this long.
const DEFAULT_POOL_IDLE_SECS: u64 = 300;

const ACCEPT_TYPES: &str = "application/geo+json, application/json, */*";

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub user_agent: String,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl OrsConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Travel profile understood by the directions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrsProfile {
    DrivingCar,
    FootWalking,
    CyclingRegular,
}

impl OrsProfile {
    /// Map a caller travel mode, case-insensitively. Unknown modes drive.
    pub fn from_mode(mode: &str) -> Self {
        match mode.to_ascii_lowercase().as_str() {
            "walking" | "foot" => Self::FootWalking,
            "bicycle" | "cycling" => Self::CyclingRegular,
            _ => Self::DrivingCar,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DrivingCar => "driving-car",
            Self::FootWalking => "foot-walking",
            Self::CyclingRegular => "cycling-regular",
        }
    }
}

/// Body of a directions request. Coordinates are `[lng, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsRequest {
    pub coordinates: Vec<[f64; 2]>,
    pub instructions: bool,
    pub geometry: bool,
    pub units: &'static str,
    pub elevation: bool,
}

impl DirectionsRequest {
    pub fn new(coordinates: &[Coordinate]) -> Self {
        Self {
            coordinates: coordinates.iter().map(|c| [c.lng, c.lat]).collect(),
            instructions: true,
            geometry: true,
            units: "m",
            elevation: false,
        }
    }
}

/// Routing provider backed by an OpenRouteService-compatible endpoint.
///
/// The underlying client is pooled and shared; nothing about it changes
/// between calls.
#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::Client,
}

impl OrsClient {
    /// Build a client. Fails when no API key is configured.
    pub fn new(config: OrsConfig) -> Result<Self, RoutingError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                RoutingError::Configuration("routing provider API key is not configured".to_string())
            })?;

        let mut auth = HeaderValue::from_str(api_key).map_err(|_| {
            RoutingError::Configuration("routing provider API key is not a valid header".to_string())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_TYPES));

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()
            .map_err(|err| {
                RoutingError::Configuration(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(Self { config, client })
    }

    /// `{base_url}/v2/directions/{profile}/geojson`
    pub fn directions_url(&self, profile: OrsProfile) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.config.base_url.trim_end_matches('/'),
            profile.as_str()
        )
    }

    async fn fetch(
        &self,
        coordinates: &[Coordinate],
        mode: &str,
    ) -> Result<RouteResult, RoutingError> {
        let profile = OrsProfile::from_mode(mode);
        let url = self.directions_url(profile);
        let body = DirectionsRequest::new(coordinates);

        debug!(
            url = %url,
            profile = profile.as_str(),
            points = coordinates.len(),
            "sending directions request"
        );

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!(status = status.as_u16(), body = %text, "directions response received");

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "directions request rejected");
            return Err(RoutingError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(parse_directions(&text))
    }
}

#[async_trait]
impl RoutingProvider for OrsClient {
    async fn optimize(
        &self,
        coordinates: &[Coordinate],
        mode: &str,
    ) -> Result<RouteResult, RoutingError> {
        if coordinates.len() < 2 {
            return Err(RoutingError::Validation(
                "at least two coordinates (origin and destination) are required".to_string(),
            ));
        }
        self.fetch(coordinates, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> OrsClient {
        OrsClient::new(OrsConfig::new(base_url).with_api_key("test-key")).expect("client should build")
    }

    #[test]
    fn test_profile_mapping() {
        assert_eq!(OrsProfile::from_mode("walking"), OrsProfile::FootWalking);
        assert_eq!(OrsProfile::from_mode("Foot"), OrsProfile::FootWalking);
        assert_eq!(OrsProfile::from_mode("BICYCLE"), OrsProfile::CyclingRegular);
        assert_eq!(OrsProfile::from_mode("cycling"), OrsProfile::CyclingRegular);
        assert_eq!(OrsProfile::from_mode("driving"), OrsProfile::DrivingCar);
        assert_eq!(OrsProfile::from_mode(""), OrsProfile::DrivingCar);
        assert_eq!(OrsProfile::from_mode("skateboard"), OrsProfile::DrivingCar);
    }

    #[test]
    fn test_request_body_uses_lng_lat() {
        let body = DirectionsRequest::new(&[Coordinate::new(10.0, 20.0), Coordinate::new(11.0, 21.0)]);
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "coordinates": [[20.0, 10.0], [21.0, 11.0]],
                "instructions": true,
                "geometry": true,
                "units": "m",
                "elevation": false
            })
        );
    }

    #[test]
    fn test_directions_url() {
        let ors = client("http://ors.example.com/");
        assert_eq!(
            ors.directions_url(OrsProfile::FootWalking),
            "http://ors.example.com/v2/directions/foot-walking/geojson"
        );
    }

    #[test]
    fn test_missing_api_key() {
        let err = OrsClient::new(OrsConfig::default()).unwrap_err();
        assert!(matches!(err, RoutingError::Configuration(_)));

        let err = OrsClient::new(OrsConfig::default().with_api_key("   ")).unwrap_err();
        assert!(matches!(err, RoutingError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_requires_two_coordinates() {
        // Unroutable address: the call must fail before any I/O.
        let ors = client("http://127.0.0.1:9");

        let err = ors
            .optimize(&[Coordinate::new(1.0, 1.0)], "driving")
            .await
            .unwrap_err();

        assert!(matches!(err, RoutingError::Validation(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = OrsConfig::new("http://example.com")
            .with_api_key("k")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "agent/1.0");
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(DEFAULT_POOL_IDLE_SECS));
    }
}
