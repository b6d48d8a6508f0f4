//! Immutable configuration for the routing core.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::RoutingError;
use crate::haversine::LocalSpeeds;
use crate::ors::OrsConfig;
use crate::resolver::DEFAULT_MAX_POINTS;

/// Which routing provider backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    Local,
    #[default]
    External,
}

impl FromStr for ProviderKind {
    type Err = RoutingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "basic" => Ok(Self::Local),
            "external" | "ors" | "openrouteservice" => Ok(Self::External),
            other => Err(RoutingError::Configuration(format!(
                "unknown routing provider '{other}'"
            ))),
        }
    }
}

/// A route needs an origin and at least one waypoint.
const MIN_POINTS: usize = 2;

#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Maximum points per request, origin included.
    pub max_points: usize,
    pub local: LocalSpeeds,
    pub provider: ProviderKind,
    pub ors: OrsConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            local: LocalSpeeds::default(),
            provider: ProviderKind::default(),
            ors: OrsConfig::default(),
        }
    }
}

impl RoutingConfig {
    /// Local provider only; no network settings needed.
    pub fn local() -> Self {
        Self {
            provider: ProviderKind::Local,
            ..Self::default()
        }
    }

    /// Read overrides from the process environment.
    ///
    /// Recognized: `ROUTING_PROVIDER`, `ROUTING_MAX_POINTS`, `ORS_URL`,
    /// `ORS_API_KEY`, `ORS_TIMEOUT_SECS`. Unset variables keep defaults.
    pub fn from_env() -> Result<Self, RoutingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`RoutingConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RoutingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(provider) = lookup("ROUTING_PROVIDER") {
            config.provider = provider.parse()?;
        }
        if let Some(max_points) = lookup("ROUTING_MAX_POINTS") {
            config.max_points = parse_number("ROUTING_MAX_POINTS", &max_points)?;
            if config.max_points < MIN_POINTS {
                return Err(RoutingError::Configuration(format!(
                    "ROUTING_MAX_POINTS must be at least {MIN_POINTS}, got {}",
                    config.max_points
                )));
            }
        }
        if let Some(url) = lookup("ORS_URL") {
            config.ors.base_url = url;
        }
        if let Some(key) = lookup("ORS_API_KEY") {
            config.ors.api_key = Some(key);
        }
        if let Some(timeout) = lookup("ORS_TIMEOUT_SECS") {
            config.ors.timeout = Duration::from_secs(parse_number("ORS_TIMEOUT_SECS", &timeout)?);
        }

        Ok(config)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, RoutingError> {
    value
        .trim()
        .parse()
        .map_err(|_| RoutingError::Configuration(format!("{name} must be a number, got '{value}'")))
}
