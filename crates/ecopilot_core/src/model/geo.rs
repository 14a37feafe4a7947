//! Geolocation primitives: coordinates, sensor samples, home reference.
//!
//! # Responsibility
//! - Validate latitude/longitude pairs at model boundaries.
//! - Compute great-circle distance via the Haversine formula.
//! - Parse user-entered `"lat, lon"` strings for manual home entry.
//!
//! # Invariants
//! - `|latitude| <= 90`, `|longitude| <= 180` for every constructed value.
//! - Distances are kilometers; Earth radius is fixed at 6371 km.
//!
//! # See also
//! - docs/architecture/location-tracking.md

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mean Earth radius used by the Haversine distance, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

static LAT_LON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*[,;]\s*(-?\d+(?:\.\d+)?)\s*$")
        .expect("valid lat/lon regex")
});

/// Validation and parse errors for coordinate inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// Latitude outside `[-90, 90]`.
    LatitudeOutOfRange(f64),
    /// Longitude outside `[-180, 180]`.
    LongitudeOutOfRange(f64),
    /// Input text does not match the `"lat, lon"` shape.
    Unparsable(String),
}

impl Display for CoordinateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LatitudeOutOfRange(value) => write!(f, "latitude out of range: {value}"),
            Self::LongitudeOutOfRange(value) => write!(f, "longitude out of range: {value}"),
            Self::Unparsable(input) => write!(f, "cannot parse coordinates from `{input}`"),
        }
    }
}

impl Error for CoordinateError {}

/// Validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a validated coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parses user-entered text like `"45.4215, -75.6972"`.
    ///
    /// Accepts `,` or `;` separators and surrounding whitespace.
    pub fn parse(input: &str) -> Result<Self, CoordinateError> {
        let captures = LAT_LON_RE
            .captures(input)
            .ok_or_else(|| CoordinateError::Unparsable(input.to_string()))?;

        // Regex guarantees both groups are plain decimal numbers.
        let latitude: f64 = captures[1]
            .parse()
            .map_err(|_| CoordinateError::Unparsable(input.to_string()))?;
        let longitude: f64 = captures[2]
            .parse()
            .map_err(|_| CoordinateError::Unparsable(input.to_string()))?;

        Self::new(latitude, longitude)
    }
}

/// One location sensor sample.
///
/// Produced at irregular intervals by the device location subscription.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported sensor accuracy in meters.
    pub accuracy_m: f64,
    /// Sample time in epoch milliseconds.
    pub timestamp_ms: i64,
    /// Ground speed in m/s when the sensor reports it.
    pub speed_mps: Option<f64>,
    /// Heading in degrees when the sensor reports it.
    pub heading_deg: Option<f64>,
}

impl Position {
    /// Creates a sample with validated coordinates and no motion metadata.
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_m: f64,
        timestamp_ms: i64,
    ) -> Result<Self, CoordinateError> {
        let coords = Coordinates::new(latitude, longitude)?;
        Ok(Self {
            latitude: coords.latitude,
            longitude: coords.longitude,
            accuracy_m,
            timestamp_ms,
            speed_mps: None,
            heading_deg: None,
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// How the home reference point was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeSource {
    /// First sensor sample observed by the tracker.
    Auto,
    /// Explicit "set as home" user action.
    Manual,
    /// Resolved from a typed home address.
    Geocoded,
}

/// The fixed "home" reference point zone classification runs against.
///
/// Set once from the first sample, or overwritten by user action. Persisted
/// in local storage only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeReference {
    pub latitude: f64,
    pub longitude: f64,
    pub source: HomeSource,
    /// When this reference was established, epoch milliseconds.
    pub set_at_ms: i64,
}

impl HomeReference {
    pub fn new(
        coordinates: Coordinates,
        source: HomeSource,
        set_at_ms: i64,
    ) -> Self {
        Self {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            source,
            set_at_ms,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Great-circle distance between two points in kilometers.
///
/// Haversine formula with a 6371 km Earth radius. Always defined for
/// validated coordinates.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Renders a distance the way the companion UI displays it.
///
/// Above one kilometer: one decimal in km. Below: whole meters.
pub fn format_distance_km(distance_km: f64) -> String {
    if distance_km > 1.0 {
        format!("{distance_km:.1} km")
    } else {
        format!("{}m", (distance_km * 1000.0).round() as i64)
    }
}
