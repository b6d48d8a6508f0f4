//! Parsing of directions responses into [`RouteResult`].
//!
//! Two incompatible payloads are accepted without knowing in advance which
//! one the service returned:
//!
//! - a feature collection (`features[0].properties.summary`,
//!   `properties.segments[0].steps`, step positions resolved through
//!   `way_points` indices into the feature geometry);
//! - a routes array (`routes[0].distance`/`duration`, `legs[*].steps`,
//!   step positions from `maneuver.location`).
//!
//! Parsing never fails. Each shape is tried in turn over the generic JSON
//! document; a payload matching neither yields a zero-valued result and a
//! warning. Fields with an unexpected type are skipped individually.

use serde_json::Value;
use tracing::warn;

use crate::model::{Coordinate, RouteResult, RouteStep, non_negative_meters, whole_seconds};
use crate::polyline::{Polyline, decode_any_precision};

/// Top-level payload shape, borrowed from the parsed document.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PayloadShape<'a> {
    FeatureCollection { feature: &'a Value },
    RoutesArray { route: &'a Value },
    Unrecognized,
}

impl<'a> PayloadShape<'a> {
    fn classify(root: &'a Value) -> Self {
        if let Some(feature) = first_of(root, "features") {
            return Self::FeatureCollection { feature };
        }
        if let Some(route) = first_of(root, "routes") {
            return Self::RoutesArray { route };
        }
        Self::Unrecognized
    }
}

/// Geometry as found on the feature or route.
#[derive(Debug, Clone, PartialEq)]
enum Geometry {
    Points(Vec<Coordinate>),
    Encoded(String),
    Missing,
}

impl Geometry {
    fn from_container(container: &Value) -> Self {
        match container.get("geometry").and_then(|g| g.get("coordinates")) {
            Some(Value::Array(items)) => Self::Points(flatten_positions(items)),
            Some(Value::String(encoded)) => Self::Encoded(encoded.clone()),
            _ => Self::Missing,
        }
    }

    /// Points usable for step lookup; encoded strings are decoded here.
    fn points(&self) -> Vec<Coordinate> {
        match self {
            Self::Points(points) => points.clone(),
            Self::Encoded(encoded) => decode_any_precision(encoded),
            Self::Missing => Vec::new(),
        }
    }

    /// Canonical polyline text for the result.
    ///
    /// Encoded geometry that decodes to nothing is kept verbatim.
    fn into_polyline_text(self) -> String {
        match self {
            Self::Points(points) => Polyline::new(points).to_canonical_text(),
            Self::Encoded(encoded) => {
                let decoded = decode_any_precision(&encoded);
                if decoded.is_empty() {
                    encoded
                } else {
                    Polyline::new(decoded).to_canonical_text()
                }
            }
            Self::Missing => String::new(),
        }
    }
}

/// Parse a successful directions response body.
pub fn parse_directions(body: &str) -> RouteResult {
    match serde_json::from_str::<Value>(body) {
        Ok(root) => parse_document(&root),
        Err(err) => {
            warn!(error = %err, "directions response is not valid JSON");
            RouteResult::default()
        }
    }
}

/// Parse an already-decoded directions document.
pub fn parse_document(root: &Value) -> RouteResult {
    match PayloadShape::classify(root) {
        PayloadShape::FeatureCollection { feature } => parse_feature(feature),
        PayloadShape::RoutesArray { route } => parse_route(route),
        PayloadShape::Unrecognized => {
            warn!(body = %root, "directions response has an unexpected structure");
            RouteResult::default()
        }
    }
}

fn parse_feature(feature: &Value) -> RouteResult {
    let geometry = Geometry::from_container(feature);
    let mut result = RouteResult::default();

    let properties = feature.get("properties");
    if let Some(summary) = properties.and_then(|p| p.get("summary")) {
        apply_totals(&mut result, summary);
    }

    let steps = properties
        .and_then(|p| first_of(p, "segments"))
        .and_then(|segment| segment.get("steps"))
        .and_then(Value::as_array);
    if let Some(steps) = steps {
        let points = geometry.points();
        result.steps = steps
            .iter()
            .map(|step| {
                let mut parsed = parse_step(step, "instruction");
                if let Some(destination) = way_point_index(step).and_then(|i| points.get(i)) {
                    parsed.destination = *destination;
                }
                parsed
            })
            .collect();
    }

    result.polyline = geometry.into_polyline_text();
    result
}

fn parse_route(route: &Value) -> RouteResult {
    let mut result = RouteResult::default();
    apply_totals(&mut result, route);

    if let Some(legs) = route.get("legs").and_then(Value::as_array) {
        result.steps = legs
            .iter()
            .filter_map(|leg| leg.get("steps").and_then(Value::as_array))
            .flatten()
            .map(|step| {
                let mut parsed = parse_step(step, "name");
                let location = step
                    .get("maneuver")
                    .and_then(|m| m.get("location"))
                    .and_then(position);
                if let Some(location) = location {
                    parsed.destination = location;
                }
                parsed
            })
            .collect();
    }

    result.polyline = Geometry::from_container(route).into_polyline_text();
    result
}

fn apply_totals(result: &mut RouteResult, source: &Value) {
    if let Some(distance) = source.get("distance").and_then(Value::as_f64) {
        result.total_distance_meters = non_negative_meters(distance);
    }
    if let Some(duration) = source.get("duration").and_then(Value::as_f64) {
        result.total_duration_seconds = whole_seconds(duration);
    }
}

fn parse_step(step: &Value, instruction_field: &str) -> RouteStep {
    RouteStep {
        distance_meters: step
            .get("distance")
            .and_then(Value::as_f64)
            .map(non_negative_meters)
            .unwrap_or_default(),
        duration_seconds: step
            .get("duration")
            .and_then(Value::as_f64)
            .map(whole_seconds)
            .unwrap_or_default(),
        instruction: step
            .get(instruction_field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        destination: Coordinate::default(),
    }
}

fn way_point_index(step: &Value) -> Option<usize> {
    step.get("way_points")
        .and_then(|wp| wp.get(0))
        .and_then(Value::as_u64)
        .and_then(|index| usize::try_from(index).ok())
}

/// First element of `root[key]` when it is a non-empty array.
fn first_of<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    root.get(key).and_then(Value::as_array).and_then(|items| items.first())
}

/// Read a `[lng, lat, ...]` position.
fn position(value: &Value) -> Option<Coordinate> {
    let items = value.as_array()?;
    let lng = items.first()?.as_f64()?;
    let lat = items.get(1)?.as_f64()?;
    Some(Coordinate::new(lat, lng))
}

/// Collect positions from a line (`[[lng,lat],...]`) or a multi-line
/// (`[[[lng,lat],...],...]`) coordinate array.
fn flatten_positions(items: &[Value]) -> Vec<Coordinate> {
    let is_line = match items.first() {
        Some(Value::Number(_)) => true,
        Some(Value::Array(inner)) => inner.first().is_some_and(Value::is_number),
        _ => false,
    };

    if is_line {
        items.iter().filter_map(position).collect()
    } else {
        items
            .iter()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(position)
            .collect()
    }
}
