//! Core domain logic for the EcoPilot plant-care companion.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod locale;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use locale::{negotiate_language, Language, Localizer};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::geo::{
    format_distance_km, haversine_km, CoordinateError, Coordinates, HomeReference, HomeSource,
    Position,
};
pub use model::notification::{CooldownKey, Notification, NotificationId, NotificationKind};
pub use model::plant::{Plant, PlantId, PlantValidationError};
pub use model::settings::{clamp_home_radius_km, NotificationPrefs, UserSettings};
pub use model::weather::{CareLevel, WeatherAdvice, WeatherAlert, WeatherSnapshot};
pub use repo::{RepoError, RepoResult};
pub use service::location_service::{
    LocationService, SensorError, ZoneClassifier, ZoneTransition, ZoneUpdate,
};
pub use service::notification_service::{
    NotificationCenter, NotificationDebouncer, NotificationSink,
};

use std::time::{SystemTime, UNIX_EPOCH};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Wall-clock time in epoch milliseconds.
///
/// Clamped to zero for clocks set before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
