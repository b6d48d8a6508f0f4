//! Haversine routing provider (fallback when no routing service is used).
//!
//! Uses great-circle distance between consecutive points and an assumed
//! speed to estimate travel time. Less accurate than a road network router
//! but always available and never touches the network.

use async_trait::async_trait;

use crate::error::RoutingError;
use crate::model::{Coordinate, RouteResult, RouteStep, whole_seconds};
use crate::traits::RoutingProvider;

/// Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Average driving speed in m/s (about 50 km/h).
pub const DEFAULT_DRIVING_MPS: f64 = 13.9;

/// Average walking speed in m/s (about 5 km/h).
pub const DEFAULT_WALKING_MPS: f64 = 1.4;

/// Geometry marker the local provider emits for degenerate input.
pub const EMPTY_GEOMETRY: &str = "[]";

/// Assumed travel speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSpeeds {
    pub driving_mps: f64,
    pub walking_mps: f64,
}

impl Default for LocalSpeeds {
    fn default() -> Self {
        Self {
            driving_mps: DEFAULT_DRIVING_MPS,
            walking_mps: DEFAULT_WALKING_MPS,
        }
    }
}

impl LocalSpeeds {
    /// Only "walking" selects pedestrian speed; anything else drives.
    pub fn for_mode(&self, mode: &str) -> f64 {
        if mode.eq_ignore_ascii_case("walking") {
            self.walking_mps
        } else {
            self.driving_mps
        }
    }
}

/// Great-circle distance between two points in meters.
pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Haversine-based routing provider.
#[derive(Debug, Clone, Default)]
pub struct HaversineProvider {
    speeds: LocalSpeeds,
}

impl HaversineProvider {
    pub fn new(speeds: LocalSpeeds) -> Self {
        Self { speeds }
    }

    /// Compute the route synchronously. Never fails.
    pub fn route(&self, coordinates: &[Coordinate], mode: &str) -> RouteResult {
        if coordinates.len() < 2 {
            return RouteResult::empty(EMPTY_GEOMETRY);
        }

        let speed = self.speeds.for_mode(mode);
        let mut total_distance = 0.0;
        let mut total_duration: u32 = 0;

        let steps: Vec<RouteStep> = coordinates
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                let distance = haversine_m(pair[0], pair[1]);
                let duration = whole_seconds(distance / speed);
                total_distance += distance;
                total_duration = total_duration.saturating_add(duration);

                RouteStep {
                    distance_meters: distance,
                    duration_seconds: duration,
                    instruction: format!("Continue to the next point ({})", index + 1),
                    destination: pair[1],
                }
            })
            .collect();

        RouteResult {
            polyline: bracketed_geometry(coordinates),
            total_distance_meters: total_distance,
            total_duration_seconds: total_duration,
            steps,
        }
    }
}

/// Serialize points as `[[lat,lng],[lat,lng]]` in input order.
fn bracketed_geometry(coordinates: &[Coordinate]) -> String {
    let pairs = coordinates
        .iter()
        .map(|point| format!("[{},{}]", point.lat, point.lng))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{pairs}]")
}

#[async_trait]
impl RoutingProvider for HaversineProvider {
    async fn optimize(
        &self,
        coordinates: &[Coordinate],
        mode: &str,
    ) -> Result<RouteResult, RoutingError> {
        Ok(self.route(coordinates, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_antipodal_points_are_half_circumference() {
        let half = std::f64::consts::PI * EARTH_RADIUS_M;
        for (from, to) in [
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0)),
            (Coordinate::new(90.0, 0.0), Coordinate::new(-90.0, 0.0)),
            (Coordinate::new(40.4168, -3.7038), Coordinate::new(-40.4168, 176.2962)),
        ] {
            let distance = haversine_m(from, to);
            assert!(distance.is_finite());
            assert!((distance - half).abs() < 1.0, "got {distance}");
        }
    }

    #[test]
    fn test_one_degree_along_equator() {
        let distance = haversine_m(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((distance - EARTH_RADIUS_M * 1f64.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_small_latitude_offset() {
        let provider = HaversineProvider::default();
        let from = Coordinate::new(10.0, 20.0);
        let to = Coordinate::new(10.001, 20.0);

        let result = provider.route(&[from, to], "driving");

        let expected = EARTH_RADIUS_M * 0.001_f64.to_radians();
        assert!((result.total_distance_meters - expected).abs() < 1e-6);
        assert_eq!(
            result.total_duration_seconds,
            (result.total_distance_meters / DEFAULT_DRIVING_MPS).round() as u32
        );
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].destination, to);
    }

    #[test]
    fn test_degenerate_input() {
        let provider = HaversineProvider::default();
        for input in [vec![], vec![Coordinate::new(1.0, 1.0)]] {
            let result = provider.route(&input, "driving");
            assert_eq!(result.total_distance_meters, 0.0);
            assert_eq!(result.total_duration_seconds, 0);
            assert!(result.steps.is_empty());
            assert_eq!(result.polyline, "[]");
        }
    }

    #[test]
    fn test_walking_is_slower() {
        let provider = HaversineProvider::default();
        let coords = [Coordinate::new(0.0, 0.0), Coordinate::new(0.01, 0.0)];

        let driving = provider.route(&coords, "driving");
        let walking = provider.route(&coords, "WALKING");

        assert!(walking.total_duration_seconds > driving.total_duration_seconds);
        assert_eq!(
            walking.total_duration_seconds,
            (walking.total_distance_meters / DEFAULT_WALKING_MPS).round() as u32
        );
    }

    #[test]
    fn test_unknown_modes_drive() {
        let speeds = LocalSpeeds::default();
        assert_eq!(speeds.for_mode("foot"), DEFAULT_DRIVING_MPS);
        assert_eq!(speeds.for_mode("cycling"), DEFAULT_DRIVING_MPS);
        assert_eq!(speeds.for_mode("hovercraft"), DEFAULT_DRIVING_MPS);
    }

    #[test]
    fn test_steps_follow_traversal_order() {
        let provider = HaversineProvider::default();
        let coords = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.01),
            Coordinate::new(0.01, 0.01),
        ];

        let result = provider.route(&coords, "driving");

        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].destination, coords[1]);
        assert_eq!(result.steps[1].destination, coords[2]);
        let summed: u32 = result.steps.iter().map(|s| s.duration_seconds).sum();
        assert_eq!(result.total_duration_seconds, summed);
    }

    #[test]
    fn test_bracketed_geometry() {
        let provider = HaversineProvider::default();
        let result = provider.route(
            &[Coordinate::new(1.5, -2.25), Coordinate::new(3.0, 4.0)],
            "driving",
        );
        assert_eq!(result.polyline, "[[1.5,-2.25],[3,4]]");
    }
}
