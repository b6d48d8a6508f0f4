//! Route optimization and owner-checked recalculation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{ProviderKind, RoutingConfig};
use crate::error::RoutingError;
use crate::haversine::HaversineProvider;
use crate::model::{RouteId, RouteRequest, RouteResult};
use crate::ors::OrsClient;
use crate::resolver::CoordinateResolver;
use crate::traits::{CurrentUser, PoiLookup, RouteStore, RoutingProvider};

/// Build the provider selected by `config`.
pub fn build_provider(config: &RoutingConfig) -> Result<Arc<dyn RoutingProvider>, RoutingError> {
    Ok(match config.provider {
        ProviderKind::Local => Arc::new(HaversineProvider::new(config.local)),
        ProviderKind::External => Arc::new(OrsClient::new(config.ors.clone())?),
    })
}

#[derive(Clone)]
pub struct RouteService {
    resolver: CoordinateResolver,
    provider: Arc<dyn RoutingProvider>,
    routes: Arc<dyn RouteStore>,
}

impl std::fmt::Debug for RouteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteService")
            .field("resolver", &self.resolver)
            .field("provider", &"<dyn RoutingProvider>")
            .field("routes", &"<dyn RouteStore>")
            .finish()
    }
}

impl RouteService {
    pub fn new(
        resolver: CoordinateResolver,
        provider: Arc<dyn RoutingProvider>,
        routes: Arc<dyn RouteStore>,
    ) -> Self {
        Self {
            resolver,
            provider,
            routes,
        }
    }

    /// Wire the service from configuration and the storage collaborators.
    pub fn from_config(
        config: &RoutingConfig,
        pois: Arc<dyn PoiLookup>,
        routes: Arc<dyn RouteStore>,
    ) -> Result<Self, RoutingError> {
        let resolver = CoordinateResolver::new(pois, config.max_points);
        Ok(Self::new(resolver, build_provider(config)?, routes))
    }

    /// Resolve the request and compute a route. Nothing is persisted.
    pub async fn optimize(&self, request: &RouteRequest) -> Result<RouteResult, RoutingError> {
        let coordinates = self.resolver.resolve(request).await?;
        self.provider.optimize(&coordinates, &request.mode).await
    }

    /// Recompute a stored route for its owner.
    ///
    /// The stored route is only read; persisting the new result is up to
    /// the caller.
    pub async fn recalculate(
        &self,
        identity: &dyn CurrentUser,
        route_id: RouteId,
        request: &RouteRequest,
    ) -> Result<RouteResult, RoutingError> {
        let route = self
            .routes
            .find_route(route_id)
            .await?
            .ok_or(RoutingError::RouteNotFound(route_id))?;

        if identity.user_id() != Some(route.owner) {
            info!(route = %route_id, "recalculation refused: caller does not own route");
            return Err(RoutingError::Forbidden);
        }

        info!(route = %route_id, mode = %request.mode, "recalculating route");
        self.optimize(request).await
    }

    /// [`RouteService::optimize`], abandoned as soon as `cancel` fires.
    ///
    /// Cancellation drops the in-flight work, including any outbound HTTP
    /// call, and no partial result is returned.
    pub async fn optimize_cancellable(
        &self,
        request: &RouteRequest,
        cancel: &CancellationToken,
    ) -> Result<RouteResult, RoutingError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RoutingError::Cancelled),
            result = self.optimize(request) => result,
        }
    }

    /// [`RouteService::recalculate`], abandoned as soon as `cancel` fires.
    pub async fn recalculate_cancellable(
        &self,
        identity: &dyn CurrentUser,
        route_id: RouteId,
        request: &RouteRequest,
        cancel: &CancellationToken,
    ) -> Result<RouteResult, RoutingError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RoutingError::Cancelled),
            result = self.recalculate(identity, route_id, request) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;
    use crate::model::WaypointInput;
    use crate::test_support::{InMemoryPoiLookup, InMemoryRouteStore};

    fn request() -> RouteRequest {
        RouteRequest::new(
            Coordinate::new(40.0, -3.0),
            vec![WaypointInput::literal(Coordinate::new(40.01, -3.0))],
        )
    }

    #[test]
    fn test_build_provider_local_needs_no_key() {
        assert!(build_provider(&RoutingConfig::local()).is_ok());
    }

    #[test]
    fn test_build_provider_external_needs_key() {
        let err = build_provider(&RoutingConfig::default()).err().unwrap();
        assert!(matches!(err, RoutingError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_optimize_with_local_provider() {
        let service = RouteService::from_config(
            &RoutingConfig::local(),
            Arc::new(InMemoryPoiLookup::default()),
            Arc::new(InMemoryRouteStore::default()),
        )
        .unwrap();

        let result = service.optimize(&request()).await.unwrap();

        assert_eq!(result.steps.len(), 1);
        assert!(result.total_distance_meters > 1000.0);
        assert!(result.polyline.starts_with("[["));
    }

    #[tokio::test]
    async fn test_precancelled_token() {
        let service = RouteService::from_config(
            &RoutingConfig::local(),
            Arc::new(InMemoryPoiLookup::default()),
            Arc::new(InMemoryRouteStore::default()),
        )
        .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service.optimize_cancellable(&request(), &cancel).await.unwrap_err();

        assert!(matches!(err, RoutingError::Cancelled));
    }
}
