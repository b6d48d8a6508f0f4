//! Turns a route request into the ordered coordinate list handed to a
//! routing provider.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::RoutingError;
use crate::model::{Coordinate, PoiId, RouteRequest, WaypointRef};
use crate::traits::PoiLookup;

/// Maximum number of points (origin plus waypoints) in one request.
pub const DEFAULT_MAX_POINTS: usize = 50;

#[derive(Clone)]
pub struct CoordinateResolver {
    pois: Arc<dyn PoiLookup>,
    max_points: usize,
}

impl std::fmt::Debug for CoordinateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateResolver")
            .field("pois", &"<dyn PoiLookup>")
            .field("max_points", &self.max_points)
            .finish()
    }
}

impl CoordinateResolver {
    pub fn new(pois: Arc<dyn PoiLookup>, max_points: usize) -> Self {
        Self { pois, max_points }
    }

    /// Resolve `request` into `[origin, waypoint_1, ..., waypoint_n]`.
    ///
    /// The whole request is validated before any lookup is made. Referenced
    /// POIs are fetched in a single batch of distinct identifiers.
    pub async fn resolve(&self, request: &RouteRequest) -> Result<Vec<Coordinate>, RoutingError> {
        let origin = request
            .origin
            .ok_or_else(|| RoutingError::Validation("origin is required".to_string()))?;
        if !origin.is_in_range() {
            return Err(RoutingError::Validation(
                "origin coordinates are out of range".to_string(),
            ));
        }

        if request.waypoints.is_empty() {
            return Err(RoutingError::Validation(
                "at least one waypoint is required".to_string(),
            ));
        }
        let total = request.waypoints.len() + 1;
        if total > self.max_points {
            return Err(RoutingError::Validation(format!(
                "a route may contain at most {} points including the origin, got {total}",
                self.max_points
            )));
        }

        let waypoints = request
            .waypoints
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let waypoint = input.to_ref().map_err(|err| match err {
                    RoutingError::Validation(message) => {
                        RoutingError::Validation(format!("waypoint {index}: {message}"))
                    }
                    other => other,
                })?;
                if let WaypointRef::Literal(coordinate) = waypoint {
                    if !coordinate.is_in_range() {
                        return Err(RoutingError::Validation(format!(
                            "waypoint {index}: coordinates are out of range"
                        )));
                    }
                }
                Ok(waypoint)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ids = distinct_poi_ids(&waypoints);
        let found = if ids.is_empty() {
            Default::default()
        } else {
            debug!(distinct = ids.len(), "resolving referenced points of interest");
            self.pois.find_many(&ids).await?
        };

        let mut coordinates = Vec::with_capacity(total);
        coordinates.push(origin);
        for waypoint in waypoints {
            let coordinate = match waypoint {
                WaypointRef::Literal(coordinate) => coordinate,
                WaypointRef::Poi(id) => found
                    .get(&id)
                    .map(|poi| poi.location)
                    .ok_or(RoutingError::PoiNotFound(id))?,
            };
            coordinates.push(coordinate);
        }

        Ok(coordinates)
    }
}

/// Referenced identifiers in first-seen order, without duplicates.
fn distinct_poi_ids(waypoints: &[WaypointRef]) -> Vec<PoiId> {
    let mut seen = HashSet::new();
    waypoints
        .iter()
        .filter_map(|waypoint| match waypoint {
            WaypointRef::Poi(id) => Some(*id),
            WaypointRef::Literal(_) => None,
        })
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PointOfInterest, WaypointInput};
    use crate::test_support::InMemoryPoiLookup;

    fn poi(lat: f64, lng: f64) -> PointOfInterest {
        PointOfInterest {
            id: PoiId::new_random(),
            name: "Museum".to_string(),
            category: "culture".to_string(),
            location: Coordinate::new(lat, lng),
        }
    }

    fn resolver(lookup: &Arc<InMemoryPoiLookup>) -> CoordinateResolver {
        CoordinateResolver::new(lookup.clone(), DEFAULT_MAX_POINTS)
    }

    fn literal(lat: f64, lng: f64) -> WaypointInput {
        WaypointInput::literal(Coordinate::new(lat, lng))
    }

    #[tokio::test]
    async fn test_resolves_in_input_order() {
        let museum = poi(40.0, -3.0);
        let lookup = Arc::new(InMemoryPoiLookup::new([museum.clone()]));
        let request = RouteRequest::new(
            Coordinate::new(1.0, 1.0),
            vec![literal(2.0, 2.0), WaypointInput::poi(museum.id), literal(3.0, 3.0)],
        );

        let coords = resolver(&lookup).resolve(&request).await.unwrap();

        assert_eq!(
            coords,
            vec![
                Coordinate::new(1.0, 1.0),
                Coordinate::new(2.0, 2.0),
                Coordinate::new(40.0, -3.0),
                Coordinate::new(3.0, 3.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_references_batch_once() {
        let museum = poi(40.0, -3.0);
        let park = poi(41.0, -4.0);
        let lookup = Arc::new(InMemoryPoiLookup::new([museum.clone(), park.clone()]));
        let request = RouteRequest::new(
            Coordinate::new(1.0, 1.0),
            vec![
                WaypointInput::poi(museum.id),
                WaypointInput::poi(park.id),
                WaypointInput::poi(museum.id),
            ],
        );

        let coords = resolver(&lookup).resolve(&request).await.unwrap();

        assert_eq!(coords.len(), 4);
        assert_eq!(coords[1], coords[3]);
        assert_eq!(lookup.batches(), vec![vec![museum.id, park.id]]);
    }

    #[tokio::test]
    async fn test_literal_only_skips_lookup() {
        let lookup = Arc::new(InMemoryPoiLookup::default());
        let request = RouteRequest::new(Coordinate::new(1.0, 1.0), vec![literal(2.0, 2.0)]);

        resolver(&lookup).resolve(&request).await.unwrap();

        assert!(lookup.batches().is_empty());
    }

    #[tokio::test]
    async fn test_missing_poi_is_not_found() {
        let lookup = Arc::new(InMemoryPoiLookup::default());
        let missing = PoiId::new_random();
        let request = RouteRequest::new(Coordinate::new(1.0, 1.0), vec![WaypointInput::poi(missing)]);

        let err = resolver(&lookup).resolve(&request).await.unwrap_err();

        assert!(matches!(err, RoutingError::PoiNotFound(id) if id == missing));
        assert!(err.to_string().contains(&missing.to_string()));
    }

    #[tokio::test]
    async fn test_origin_required_and_ranged() {
        let lookup = Arc::new(InMemoryPoiLookup::default());
        let mut request = RouteRequest::new(Coordinate::new(1.0, 1.0), vec![literal(2.0, 2.0)]);
        request.origin = None;
        assert!(matches!(
            resolver(&lookup).resolve(&request).await,
            Err(RoutingError::Validation(_))
        ));

        request.origin = Some(Coordinate::new(91.0, 0.0));
        assert!(matches!(
            resolver(&lookup).resolve(&request).await,
            Err(RoutingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_waypoints_required() {
        let lookup = Arc::new(InMemoryPoiLookup::default());
        let request = RouteRequest::new(Coordinate::new(1.0, 1.0), vec![]);

        assert!(matches!(
            resolver(&lookup).resolve(&request).await,
            Err(RoutingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_literal_out_of_range() {
        let lookup = Arc::new(InMemoryPoiLookup::default());
        let request = RouteRequest::new(Coordinate::new(1.0, 1.0), vec![literal(0.0, 181.0)]);

        let err = resolver(&lookup).resolve(&request).await.unwrap_err();

        assert!(matches!(err, RoutingError::Validation(ref m) if m.contains("waypoint 0")));
    }

    #[tokio::test]
    async fn test_invalid_waypoint_fails_before_lookup() {
        let lookup = Arc::new(InMemoryPoiLookup::default());
        let request = RouteRequest::new(
            Coordinate::new(1.0, 1.0),
            vec![WaypointInput::poi(PoiId::new_random()), WaypointInput::default()],
        );

        let err = resolver(&lookup).resolve(&request).await.unwrap_err();

        assert!(matches!(err, RoutingError::Validation(ref m) if m.contains("waypoint 1")));
        assert!(lookup.batches().is_empty());
    }

    #[tokio::test]
    async fn test_point_limit_boundary() {
        let lookup = Arc::new(InMemoryPoiLookup::default());
        let origin = Coordinate::new(0.0, 0.0);

        let at_limit = RouteRequest::new(origin, (0..49).map(|i| literal(0.0, f64::from(i))).collect());
        assert_eq!(resolver(&lookup).resolve(&at_limit).await.unwrap().len(), 50);

        let over = RouteRequest::new(origin, (0..50).map(|i| literal(0.0, f64::from(i))).collect());
        let err = resolver(&lookup).resolve(&over).await.unwrap_err();
        assert!(matches!(err, RoutingError::Validation(ref m) if m.contains("50")));
    }
}
