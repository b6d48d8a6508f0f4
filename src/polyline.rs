//! Polyline representation for route geometries.
//!
//! Geometry arrives from routing services either as coordinate arrays or as
//! an encoded polyline string: per-axis deltas, zig-zag sign folded, split
//! into 5-bit groups and offset by 63. Decoding happens here, at the
//! boundary; the rest of the crate works with [`Polyline`] values and their
//! canonical `"lat,lng;lat,lng"` text form.

use thiserror::Error;

use crate::model::Coordinate;

/// Precision used by most encoders (Google, OSRM, ORS).
pub const DEFAULT_PRECISION: u32 = 5;

/// Precision tried when the default yields nothing.
pub const FALLBACK_PRECISION: u32 = 6;

const CHUNK_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
const MAX_SHIFT: u32 = 60;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolylineError {
    #[error("invalid polyline byte {byte:#04x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },
    #[error("polyline ends in the middle of a coordinate")]
    Truncated,
    #[error("polyline value at offset {offset} overflows")]
    Overflow { offset: usize },
    #[error("unsupported polyline precision {0}")]
    UnsupportedPrecision(u32),
}

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    /// Canonical text: `"lat1,lng1;lat2,lng2"`, empty for no points.
    pub fn to_canonical_text(&self) -> String {
        self.points
            .iter()
            .map(|point| format!("{},{}", point.lat, point.lng))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Decode `encoded` into coordinates at `precision` decimal places.
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coordinate>, PolylineError> {
    let exponent =
        i32::try_from(precision).map_err(|_| PolylineError::UnsupportedPrecision(precision))?;
    if precision > 15 {
        return Err(PolylineError::UnsupportedPrecision(precision));
    }
    let factor = 10f64.powi(exponent);

    let bytes = encoded.as_bytes();
    let mut offset = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while offset < bytes.len() {
        let lat_start = offset;
        lat = lat
            .checked_add(read_delta(bytes, &mut offset)?)
            .ok_or(PolylineError::Overflow { offset: lat_start })?;
        if offset >= bytes.len() {
            return Err(PolylineError::Truncated);
        }
        let lng_start = offset;
        lng = lng
            .checked_add(read_delta(bytes, &mut offset)?)
            .ok_or(PolylineError::Overflow { offset: lng_start })?;
        points.push(Coordinate::new(lat as f64 / factor, lng as f64 / factor));
    }

    Ok(points)
}

/// Decode trying the default precision first and then the fallback.
///
/// Returns an empty vector when neither attempt produces points; a decode
/// error counts as zero points.
pub fn decode_any_precision(encoded: &str) -> Vec<Coordinate> {
    [DEFAULT_PRECISION, FALLBACK_PRECISION]
        .into_iter()
        .find_map(|precision| decode(encoded, precision).ok().filter(|p| !p.is_empty()))
        .unwrap_or_default()
}

/// Read one signed delta starting at `offset`, advancing past it.
fn read_delta(bytes: &[u8], offset: &mut usize) -> Result<i64, PolylineError> {
    let start = *offset;
    let mut accumulated: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*offset) else {
            return Err(PolylineError::Truncated);
        };
        let chunk = byte
            .checked_sub(CHUNK_OFFSET)
            .filter(|chunk| *chunk < 0x40)
            .map(i64::from)
            .ok_or(PolylineError::InvalidByte {
                byte,
                offset: *offset,
            })?;
        *offset += 1;

        if shift > MAX_SHIFT {
            return Err(PolylineError::Overflow { offset: start });
        }
        accumulated |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    Ok(if accumulated & 1 != 0 {
        !(accumulated >> 1)
    } else {
        accumulated >> 1
    })
}
