//! route-engine core
//!
//! Resolves waypoint requests into ordered coordinates and computes routes
//! through a local haversine estimate or an external directions service.

pub mod config;
pub mod error;
pub mod haversine;
pub mod model;
pub mod ors;
pub mod ors_response;
pub mod polyline;
pub mod resolver;
pub mod service;
pub mod traits;

#[doc(hidden)]
pub mod test_support;

pub use config::{ProviderKind, RoutingConfig};
pub use error::{ErrorClass, RoutingError};
pub use model::{Coordinate, RouteRequest, RouteResult, RouteStep, WaypointInput, WaypointRef};
pub use service::RouteService;
