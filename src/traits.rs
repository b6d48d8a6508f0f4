//! Capability traits at the seams of the routing core.
//!
//! Providers compute geometry for an ordered coordinate list. The remaining
//! traits describe the external collaborators the core depends on: a POI
//! lookup, a route store and the current identity.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::RoutingError;
use crate::model::{Coordinate, PoiId, PointOfInterest, RouteId, RouteResult, StoredRoute, UserId};

/// Computes a route over coordinates in the order given.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn optimize(
        &self,
        coordinates: &[Coordinate],
        mode: &str,
    ) -> Result<RouteResult, RoutingError>;
}

/// Batched access to stored points of interest.
#[async_trait]
pub trait PoiLookup: Send + Sync {
    /// Fetch every POI in `ids` in one round trip.
    ///
    /// Identifiers with no stored POI are simply absent from the map.
    async fn find_many(
        &self,
        ids: &[PoiId],
    ) -> Result<HashMap<PoiId, PointOfInterest>, RoutingError>;
}

/// Read access to persisted routes.
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn find_route(&self, id: RouteId) -> Result<Option<StoredRoute>, RoutingError>;
}

/// The authenticated identity of the current caller.
pub trait CurrentUser: Send + Sync {
    fn user_id(&self) -> Option<UserId>;
}

impl CurrentUser for Option<UserId> {
    fn user_id(&self) -> Option<UserId> {
        *self
    }
}

impl CurrentUser for UserId {
    fn user_id(&self) -> Option<UserId> {
        Some(*self)
    }
}
