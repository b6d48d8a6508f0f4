//! Request and result types shared by the resolver and the providers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RoutingError;

/// Default travel mode when the request omits one.
pub const DEFAULT_MODE: &str = "driving";

/// Default recalculation mode. Carried on the request but not consulted.
pub const DEFAULT_RECALC_MODE: &str = "reoptimize_remaining";

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a stored point of interest.
    PoiId
);
id_newtype!(
    /// Identifier of a stored route.
    RouteId
);
id_newtype!(
    /// Identifier of an authenticated user.
    UserId
);

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when latitude is in [-90, 90] and longitude in [-180, 180].
    ///
    /// NaN fails both range checks.
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A waypoint as it arrives on the wire: either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointInput {
    #[serde(default)]
    pub poi_id: Option<PoiId>,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

impl WaypointInput {
    pub fn poi(id: PoiId) -> Self {
        Self {
            poi_id: Some(id),
            coordinate: None,
        }
    }

    pub fn literal(coordinate: Coordinate) -> Self {
        Self {
            poi_id: None,
            coordinate: Some(coordinate),
        }
    }

    /// Convert into a [`WaypointRef`], rejecting inputs that carry both or
    /// neither of a reference and a literal coordinate.
    pub fn to_ref(&self) -> Result<WaypointRef, RoutingError> {
        match (self.poi_id, self.coordinate) {
            (Some(id), None) => Ok(WaypointRef::Poi(id)),
            (None, Some(coordinate)) => Ok(WaypointRef::Literal(coordinate)),
            (Some(_), Some(_)) => Err(RoutingError::Validation(
                "waypoint must carry either a poiId or a coordinate, not both".to_string(),
            )),
            (None, None) => Err(RoutingError::Validation(
                "waypoint must carry a poiId or a coordinate".to_string(),
            )),
        }
    }
}

/// A waypoint with exactly one source of position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaypointRef {
    Poi(PoiId),
    Literal(Coordinate),
}

/// Inbound routing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    #[serde(default)]
    pub origin: Option<Coordinate>,
    #[serde(default)]
    pub waypoints: Vec<WaypointInput>,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_recalc_mode")]
    pub recalc_mode: String,
}

fn default_mode() -> String {
    DEFAULT_MODE.to_string()
}

fn default_recalc_mode() -> String {
    DEFAULT_RECALC_MODE.to_string()
}

impl RouteRequest {
    pub fn new(origin: Coordinate, waypoints: Vec<WaypointInput>) -> Self {
        Self {
            origin: Some(origin),
            waypoints,
            mode: default_mode(),
            recalc_mode: default_recalc_mode(),
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Parse a JSON request body. A missing or blank body is a validation
    /// failure, as is malformed JSON.
    pub fn from_json_body(body: Option<&[u8]>) -> Result<Self, RoutingError> {
        let body = body
            .filter(|bytes| bytes.iter().any(|b| !b.is_ascii_whitespace()))
            .ok_or_else(|| RoutingError::Validation("request body is required".to_string()))?;

        serde_json::from_slice(body)
            .map_err(|err| RoutingError::Validation(format!("malformed request body: {err}")))
    }
}

/// One leg of a computed route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub distance_meters: f64,
    pub duration_seconds: u32,
    pub instruction: String,
    #[serde(flatten)]
    pub destination: Coordinate,
}

/// Canonical result returned by every provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub polyline: String,
    pub total_distance_meters: f64,
    pub total_duration_seconds: u32,
    pub steps: Vec<RouteStep>,
}

impl RouteResult {
    /// Zero-valued result with the given geometry marker.
    pub fn empty(polyline: impl Into<String>) -> Self {
        Self {
            polyline: polyline.into(),
            ..Self::default()
        }
    }
}

/// A stored point of interest, as exposed by the lookup collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    pub id: PoiId,
    pub name: String,
    pub category: String,
    pub location: Coordinate,
}

/// A persisted route aggregate, as exposed by the route store collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRoute {
    pub id: RouteId,
    pub owner: UserId,
    pub name: String,
    pub mode: String,
    pub polyline: String,
    pub total_distance_meters: f64,
    pub total_duration_seconds: u32,
}

/// Convert a non-negative seconds value into whole seconds.
///
/// Negative and non-finite inputs map to zero.
pub(crate) fn whole_seconds(seconds: f64) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    let rounded = seconds.round();
    if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Clamp a distance into the non-negative finite range.
pub(crate) fn non_negative_meters(meters: f64) -> f64 {
    if meters.is_finite() && meters > 0.0 {
        meters
    } else {
        0.0
    }
}
