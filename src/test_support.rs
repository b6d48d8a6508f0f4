//! Deterministic collaborators for tests.
//!
//! In-memory POI lookup and route store, a store whose backend is down, plus
//! a provider that records how often it was called. None of them perform I/O.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::RoutingError;
use crate::model::{Coordinate, PoiId, PointOfInterest, RouteId, RouteResult, StoredRoute, UserId};
use crate::traits::{PoiLookup, RouteStore, RoutingProvider};

/// POI lookup backed by a map, recording every batch it receives.
#[derive(Debug, Default)]
pub struct InMemoryPoiLookup {
    pois: HashMap<PoiId, PointOfInterest>,
    batches: Mutex<Vec<Vec<PoiId>>>,
    failure: Option<String>,
}

impl InMemoryPoiLookup {
    pub fn new(pois: impl IntoIterator<Item = PointOfInterest>) -> Self {
        Self {
            pois: pois.into_iter().map(|poi| (poi.id, poi)).collect(),
            batches: Mutex::default(),
            failure: None,
        }
    }

    /// Lookup whose every call fails with a `Collaborator` error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Identifier batches received so far, in call order.
    pub fn batches(&self) -> Vec<Vec<PoiId>> {
        self.batches
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PoiLookup for InMemoryPoiLookup {
    async fn find_many(
        &self,
        ids: &[PoiId],
    ) -> Result<HashMap<PoiId, PointOfInterest>, RoutingError> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(ids.to_vec());
        }
        if let Some(message) = &self.failure {
            return Err(RoutingError::Collaborator(message.clone()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.pois.get(id).map(|poi| (*id, poi.clone())))
            .collect())
    }
}

/// Route store backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryRouteStore {
    routes: HashMap<RouteId, StoredRoute>,
}

impl InMemoryRouteStore {
    pub fn new(routes: impl IntoIterator<Item = StoredRoute>) -> Self {
        Self {
            routes: routes.into_iter().map(|route| (route.id, route)).collect(),
        }
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn find_route(&self, id: RouteId) -> Result<Option<StoredRoute>, RoutingError> {
        Ok(self.routes.get(&id).cloned())
    }
}

/// Route store whose backend is unreachable.
#[derive(Debug)]
pub struct FailingRouteStore {
    message: String,
}

impl FailingRouteStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl RouteStore for FailingRouteStore {
    async fn find_route(&self, _id: RouteId) -> Result<Option<StoredRoute>, RoutingError> {
        Err(RoutingError::Collaborator(self.message.clone()))
    }
}

/// Provider returning a fixed result and counting calls.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    result: RouteResult,
    calls: AtomicUsize,
    last_input: Mutex<Option<(Vec<Coordinate>, String)>>,
}

impl RecordingProvider {
    pub fn returning(result: RouteResult) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Coordinates and mode of the most recent call.
    pub fn last_input(&self) -> Option<(Vec<Coordinate>, String)> {
        self.last_input.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl RoutingProvider for RecordingProvider {
    async fn optimize(
        &self,
        coordinates: &[Coordinate],
        mode: &str,
    ) -> Result<RouteResult, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_input.lock() {
            *last = Some((coordinates.to_vec(), mode.to_string()));
        }
        Ok(self.result.clone())
    }
}

/// Build a stored route owned by `owner`.
pub fn stored_route(owner: UserId) -> StoredRoute {
    StoredRoute {
        id: RouteId::new_random(),
        owner,
        name: "Saturday loop".to_string(),
        mode: "walking".to_string(),
        polyline: String::new(),
        total_distance_meters: 0.0,
        total_duration_seconds: 0,
    }
}

/// Build a POI at the given position.
pub fn poi_at(lat: f64, lng: f64) -> PointOfInterest {
    PointOfInterest {
        id: PoiId::new_random(),
        name: format!("poi {lat},{lng}"),
        category: "landmark".to_string(),
        location: Coordinate::new(lat, lng),
    }
}
