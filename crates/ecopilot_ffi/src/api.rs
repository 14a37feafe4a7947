//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Rehydrate state from local storage on every call; no globals beyond
//!   the resolved database path.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every response is an envelope with `ok` and a diagnostic message.
//!
//! # See also
//! - docs/architecture/location-tracking.md

use ecopilot_core::db::open_db;
use ecopilot_core::repo::location_repo::SqliteLocationRepository;
use ecopilot_core::repo::notification_repo::SqliteNotificationRepository;
use ecopilot_core::repo::plant_repo::SqlitePlantRepository;
use ecopilot_core::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
use ecopilot_core::service::care_service::CareService;
use ecopilot_core::service::location_service::{LocationService, ZoneTransition};
use ecopilot_core::service::notification_service::{
    build_home_arrival, build_home_departure, LogSink, NotificationCenter,
    NotificationDebouncer,
};
use ecopilot_core::service::plant_service::PlantService;
use ecopilot_core::service::weather_service::{advice_message, WeatherService};
use ecopilot_core::{
    core_version as core_version_inner, format_distance_km, init_logging as init_logging_inner,
    negotiate_language, now_epoch_ms, ping as ping_inner, CareLevel, CooldownKey, Coordinates,
    HomeSource, Language, Localizer, NotificationKind, Plant, Position, UserSettings,
    ZoneClassifier,
};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const DB_FILE_NAME: &str = "ecopilot.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Idempotent for the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Optional created/affected record ID.
    pub record_id: Option<String>,
    /// Localized user-facing or diagnostic message.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, record_id: Option<String>) -> Self {
        Self {
            ok: true,
            record_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            record_id: None,
            message: message.into(),
        }
    }
}

/// One plant as the UI lists it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantItem {
    pub plant_id: String,
    pub name: String,
    pub species: String,
    pub location: String,
    pub days_since_watered: i64,
    pub needs_water: bool,
    pub watering_frequency_days: u32,
    pub tip: Option<String>,
}

/// Plant list response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantListResponse {
    pub items: Vec<PlantItem>,
    pub message: String,
}

/// Lists all plants with derived watering status.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `language_tag` accepts BCP 47 tags; unsupported tags fall back to
///   French.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn plants_list(language_tag: String, watering_multiplier: f64) -> PlantListResponse {
    let language = negotiate_language(&language_tag);
    let (conn, localizer) = match open_runtime() {
        Ok(pair) => pair,
        Err(message) => {
            return PlantListResponse {
                items: Vec::new(),
                message,
            };
        }
    };

    let service = PlantService::new(SqlitePlantRepository::new(&conn));
    match service.list_plants(now_epoch_ms(), watering_multiplier, language) {
        Ok(statuses) => PlantListResponse {
            items: statuses
                .into_iter()
                .map(|status| PlantItem {
                    plant_id: status.plant.uuid.to_string(),
                    name: status.display_name,
                    species: status.plant.species,
                    location: status.display_location,
                    days_since_watered: status.days_since_watered,
                    needs_water: status.needs_water,
                    watering_frequency_days: status.plant.watering_frequency_days,
                    tip: status.tip,
                })
                .collect(),
            message: String::new(),
        },
        Err(err) => PlantListResponse {
            items: Vec::new(),
            message: err.localized_message(&localizer, language),
        },
    }
}

/// Creates one plant.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; validation failures surface in the message.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_add(
    name: String,
    species: String,
    location: String,
    watering_frequency_days: u32,
    language_tag: String,
) -> ActionResponse {
    let language = negotiate_language(&language_tag);
    let (conn, localizer) = match open_runtime() {
        Ok(pair) => pair,
        Err(message) => return ActionResponse::failure(message),
    };

    let plant = Plant::new(
        name.trim(),
        species.trim(),
        location.trim(),
        watering_frequency_days,
        now_epoch_ms(),
    );
    let service = PlantService::new(SqlitePlantRepository::new(&conn));
    match service.add_plant(plant, &localizer, language) {
        Ok(outcome) => {
            info!(
                "event=ffi_plant_add module=ffi status=ok plant_id={}",
                outcome.plant.uuid
            );
            ActionResponse::success(outcome.message, Some(outcome.plant.uuid.to_string()))
        }
        Err(err) => ActionResponse::failure(err.localized_message(&localizer, language)),
    }
}

/// Marks one plant watered now.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; a missing plant reports `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_water(plant_id: String, language_tag: String) -> ActionResponse {
    let language = negotiate_language(&language_tag);
    let (conn, localizer) = match open_runtime() {
        Ok(pair) => pair,
        Err(message) => return ActionResponse::failure(message),
    };

    let id = match parse_plant_id(&plant_id, &localizer, language) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(message),
    };

    let service = PlantService::new(SqlitePlantRepository::new(&conn));
    match service.water_plant(id, now_epoch_ms(), &localizer, language) {
        Ok(outcome) => ActionResponse::success(outcome.message, Some(plant_id)),
        Err(err) => ActionResponse::failure(err.localized_message(&localizer, language)),
    }
}

/// Deletes one plant.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; a missing plant reports `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_delete(plant_id: String, language_tag: String) -> ActionResponse {
    let language = negotiate_language(&language_tag);
    let (conn, localizer) = match open_runtime() {
        Ok(pair) => pair,
        Err(message) => return ActionResponse::failure(message),
    };

    let id = match parse_plant_id(&plant_id, &localizer, language) {
        Ok(id) => id,
        Err(message) => return ActionResponse::failure(message),
    };

    let service = PlantService::new(SqlitePlantRepository::new(&conn));
    match service.delete_plant(id, &localizer, language) {
        Ok(message) => ActionResponse::success(message, Some(plant_id)),
        Err(err) => ActionResponse::failure(err.localized_message(&localizer, language)),
    }
}

/// Zone classification result for one observed sample.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationResponse {
    pub ok: bool,
    pub distance_km: f64,
    /// Distance rendered for display (`150m`, `2.3 km`).
    pub distance_label: String,
    pub is_at_home: bool,
    /// `arrived`, `departed`, or empty when no boundary was crossed.
    pub transition: String,
    /// Localized notification delivered for this sample, when any.
    pub notification_title: Option<String>,
    pub notification_body: Option<String>,
    pub message: String,
}

impl LocationResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            distance_km: 0.0,
            distance_label: String::new(),
            is_at_home: false,
            transition: String::new(),
            notification_title: None,
            notification_body: None,
            message: message.into(),
        }
    }
}

/// Feeds one location sample through zone classification and the
/// notification debouncer.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - The first call ever establishes the automatic home reference.
/// - Never panics; sensor-level failures are handled Dart-side.
#[flutter_rust_bridge::frb(sync)]
pub fn location_observe(
    latitude: f64,
    longitude: f64,
    accuracy_m: f64,
    language_tag: String,
) -> LocationResponse {
    let language = negotiate_language(&language_tag);
    let (conn, localizer) = match open_runtime() {
        Ok(pair) => pair,
        Err(message) => return LocationResponse::failure(message),
    };

    let now_ms = now_epoch_ms();
    let position = match Position::new(latitude, longitude, accuracy_m, now_ms) {
        Ok(position) => position,
        Err(err) => return LocationResponse::failure(err.to_string()),
    };

    let settings = match SqliteSettingsRepository::new(&conn).load() {
        Ok(settings) => settings,
        Err(err) => return LocationResponse::failure(err.to_string()),
    };

    let location = LocationService::new(
        SqliteLocationRepository::new(&conn),
        ZoneClassifier::for_home_radius(settings.home_radius_km),
    );
    let update = match location.observe(position) {
        Ok(update) => update,
        Err(err) => return LocationResponse::failure(err.to_string()),
    };

    let mut response = LocationResponse {
        ok: true,
        distance_km: update.distance_km,
        distance_label: format_distance_km(update.distance_km),
        is_at_home: update.is_at_home,
        transition: match update.transition {
            Some(ZoneTransition::Arrived) => "arrived".to_string(),
            Some(ZoneTransition::Departed) => "departed".to_string(),
            None => String::new(),
        },
        notification_title: None,
        notification_body: None,
        message: String::new(),
    };

    let notifications_on =
        settings.notifications.enabled && settings.notifications.location_based;
    let Some(transition) = update.transition else {
        return response;
    };
    if !notifications_on {
        return response;
    }

    let notification = match transition {
        ZoneTransition::Arrived => {
            let plants = PlantService::new(SqlitePlantRepository::new(&conn));
            let needing_water = plants
                .plants_needing_water(now_ms, 1.0)
                .map(|list| list.len())
                .unwrap_or(0);
            build_home_arrival(&localizer, language, needing_water, update.distance_km, now_ms)
        }
        ZoneTransition::Departed => {
            build_home_departure(&localizer, language, update.distance_km, now_ms)
        }
    };

    let mut center = NotificationCenter::new(
        SqliteNotificationRepository::new(&conn),
        LogSink,
        NotificationDebouncer::default(),
    );
    let kind = match transition {
        ZoneTransition::Arrived => NotificationKind::HomeArrival,
        ZoneTransition::Departed => NotificationKind::HomeDeparture,
    };
    if let Err(err) = center.restore_stream(CooldownKey::for_subject(kind, "home")) {
        response.message = err.to_string();
        return response;
    }

    match center.notify(notification) {
        Ok(Some(delivered)) => {
            info!(
                "event=ffi_location_observe module=ffi status=notified transition={} distance_km={:.3}",
                response.transition, update.distance_km
            );
            response.notification_title = Some(delivered.title);
            response.notification_body = Some(delivered.body);
        }
        Ok(None) => {
            info!(
                "event=ffi_location_observe module=ffi status=debounced transition={}",
                response.transition
            );
        }
        Err(err) => response.message = err.to_string(),
    }

    response
}

/// Sets the home reference from user-entered `"lat, lon"` text.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; unparsable input reports `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn home_set_manual(coordinates_text: String, language_tag: String) -> ActionResponse {
    let language = negotiate_language(&language_tag);
    let (conn, localizer) = match open_runtime() {
        Ok(pair) => pair,
        Err(message) => return ActionResponse::failure(message),
    };

    let coordinates = match Coordinates::parse(&coordinates_text) {
        Ok(coordinates) => coordinates,
        Err(err) => return ActionResponse::failure(err.to_string()),
    };

    let location = LocationService::new(
        SqliteLocationRepository::new(&conn),
        ZoneClassifier::for_home_radius(UserSettings::default().home_radius_km),
    );
    match location.set_home(coordinates, HomeSource::Manual, now_epoch_ms()) {
        Ok(_) => ActionResponse::success(localizer.text(language, "home-updated"), None),
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}

/// One entry of the in-app notification feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub notification_id: String,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub timestamp_ms: i64,
    pub read: bool,
}

/// The in-app notification feed, newest first (at most 10 entries).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; failures return an empty feed.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_feed() -> Vec<FeedItem> {
    let Ok((conn, _)) = open_runtime() else {
        return Vec::new();
    };

    let center = NotificationCenter::new(
        SqliteNotificationRepository::new(&conn),
        LogSink,
        NotificationDebouncer::default(),
    );
    match center.feed() {
        Ok(entries) => entries
            .into_iter()
            .map(|entry| FeedItem {
                notification_id: entry.uuid.to_string(),
                kind: kind_label(entry.kind).to_string(),
                title: entry.title,
                body: entry.body,
                timestamp_ms: entry.timestamp_ms,
                read: entry.read,
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// User settings envelope mirroring the settings page.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsResponse {
    pub language_tag: String,
    pub home_radius_km: f64,
    pub notifications_enabled: bool,
    pub notification_sound: bool,
    pub notification_vibration: bool,
    pub location_based: bool,
    pub user_name: String,
    pub home_address: String,
}

/// Loads user settings (defaults when never saved).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; failures return defaults.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_get() -> SettingsResponse {
    let settings = open_runtime()
        .ok()
        .and_then(|(conn, _)| SqliteSettingsRepository::new(&conn).load().ok())
        .unwrap_or_default();
    to_settings_response(settings)
}

/// Saves user settings; out-of-range values are clamped.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_set(
    language_tag: String,
    home_radius_km: f64,
    notifications_enabled: bool,
    notification_sound: bool,
    notification_vibration: bool,
    location_based: bool,
    user_name: String,
    home_address: String,
) -> ActionResponse {
    let (conn, _) = match open_runtime() {
        Ok(pair) => pair,
        Err(message) => return ActionResponse::failure(message),
    };

    let mut settings = UserSettings::default();
    settings.language = negotiate_language(&language_tag);
    settings.home_radius_km = home_radius_km;
    settings.notifications.enabled = notifications_enabled;
    settings.notifications.sound = notification_sound;
    settings.notifications.vibration = notification_vibration;
    settings.notifications.location_based = location_based;
    settings.user_name = user_name.trim().to_string();
    settings.home_address = home_address.trim().to_string();

    match SqliteSettingsRepository::new(&conn).save(&settings) {
        Ok(()) => ActionResponse::success(String::new(), None),
        Err(err) => ActionResponse::failure(err.to_string()),
    }
}

/// Weather snapshot plus derived plant advice.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherResponse {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub description: String,
    pub city: String,
    pub is_mock: bool,
    pub care_level: String,
    pub watering_multiplier: f64,
    pub advice: String,
}

/// Current weather and plant-care advice for the given coordinates.
///
/// # FFI contract
/// - Sync call; serves fallback data when no live provider is wired.
/// - Never panics; invalid coordinates yield the Ottawa fallback.
#[flutter_rust_bridge::frb(sync)]
pub fn weather_current(latitude: f64, longitude: f64, language_tag: String) -> WeatherResponse {
    let language = negotiate_language(&language_tag);
    let coordinates = Coordinates::new(latitude, longitude)
        .unwrap_or(Coordinates {
            latitude: 45.4215,
            longitude: -75.6972,
        });

    let mut weather = WeatherService::default();
    let snapshot = weather.current(coordinates, language, now_epoch_ms());
    let advice = snapshot.advice();

    let advice_text = Localizer::new()
        .map(|localizer| advice_message(&localizer, language, advice.care_level))
        .unwrap_or_default();

    WeatherResponse {
        temperature_c: snapshot.temperature_c,
        humidity_pct: snapshot.humidity_pct,
        description: snapshot.description,
        city: snapshot.city,
        is_mock: snapshot.is_mock,
        care_level: care_level_label(advice.care_level).to_string(),
        watering_multiplier: advice.watering_multiplier,
        advice: advice_text,
    }
}

/// Localized care guide for a species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareResponse {
    pub watering: String,
    pub light: String,
    pub humidity: String,
    pub temperature: String,
    pub winter_note: String,
}

/// Care guidance for a species from the built-in database.
///
/// # FFI contract
/// - Sync call, in-memory lookup.
/// - Never panics; unknown species get the generic guide.
#[flutter_rust_bridge::frb(sync)]
pub fn care_guide(species: String, language_tag: String) -> CareResponse {
    let language = negotiate_language(&language_tag);
    let mut care = CareService::default();
    let guide = care.guide(&species, language, now_epoch_ms());
    CareResponse {
        watering: guide.watering,
        light: guide.light,
        humidity: guide.humidity,
        temperature: guide.temperature,
        winter_note: guide.winter_note,
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("ECOPILOT_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn open_runtime() -> Result<(rusqlite::Connection, Localizer), String> {
    let conn = open_db(resolve_db_path()).map_err(|err| {
        warn!("event=ffi_open module=ffi status=error error={err}");
        format!("DB open failed: {err}")
    })?;
    let localizer = Localizer::new().map_err(|err| {
        warn!("event=ffi_localizer module=ffi status=error error={err}");
        format!("localizer init failed: {err}")
    })?;
    Ok((conn, localizer))
}

fn parse_plant_id(
    raw: &str,
    localizer: &Localizer,
    language: Language,
) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| localizer.text(language, "plant-not-found"))
}

fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::HomeArrival => "home_arrival",
        NotificationKind::HomeDeparture => "home_departure",
        NotificationKind::WaterReminder => "water_reminder",
        NotificationKind::PlantHealth => "plant_health",
        NotificationKind::WeatherAlert => "weather_alert",
    }
}

fn care_level_label(level: CareLevel) -> &'static str {
    match level {
        CareLevel::Low => "low",
        CareLevel::Normal => "normal",
        CareLevel::Medium => "medium",
        CareLevel::High => "high",
        CareLevel::Perfect => "perfect",
    }
}

fn to_settings_response(settings: UserSettings) -> SettingsResponse {
    SettingsResponse {
        language_tag: settings.language.tag().to_string(),
        home_radius_km: settings.home_radius_km,
        notifications_enabled: settings.notifications.enabled,
        notification_sound: settings.notifications.sound,
        notification_vibration: settings.notifications.vibration,
        location_based: settings.notifications.location_based,
        user_name: settings.user_name,
        home_address: settings.home_address,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        care_guide, core_version, home_set_manual, init_logging, ping, plant_add, plant_water,
        plants_list, settings_get, settings_set, weather_current,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn plant_roundtrip_through_the_ffi_surface() {
        let created = plant_add(
            "Monstera".to_string(),
            "Monstera deliciosa".to_string(),
            "Salon".to_string(),
            7,
            "fr".to_string(),
        );
        assert!(created.ok, "{}", created.message);
        let plant_id = created.record_id.clone().expect("created plant id");

        let listed = plants_list("fr".to_string(), 1.0);
        assert!(listed.items.iter().any(|item| item.plant_id == plant_id));

        let watered = plant_water(plant_id, "en".to_string());
        assert!(watered.ok, "{}", watered.message);
        assert!(watered.message.contains("watered"));
    }

    #[test]
    fn watering_garbage_id_fails_localized() {
        let response = plant_water("not-a-uuid".to_string(), "fr".to_string());
        assert!(!response.ok);
        assert_eq!(response.message, "Plante non trouvée");
    }

    #[test]
    fn manual_home_accepts_lat_lon_text() {
        let response = home_set_manual("45.4215, -75.6972".to_string(), "en".to_string());
        assert!(response.ok, "{}", response.message);

        let garbage = home_set_manual("chez moi".to_string(), "fr".to_string());
        assert!(!garbage.ok);
    }

    #[test]
    fn settings_roundtrip_clamps_the_radius() {
        let saved = settings_set(
            "en".to_string(),
            9.0,
            true,
            false,
            true,
            true,
            "Camille".to_string(),
            "123 Main St".to_string(),
        );
        assert!(saved.ok, "{}", saved.message);

        let settings = settings_get();
        assert_eq!(settings.home_radius_km, 0.5);
        assert_eq!(settings.language_tag, "en");
        assert!(!settings.notification_sound);
    }

    #[test]
    fn weather_serves_fallback_data_with_advice() {
        let response = weather_current(45.4215, -75.6972, "fr".to_string());
        assert!(response.is_mock);
        assert_eq!(response.city, "Ottawa");
        assert!(!response.advice.is_empty());
    }

    #[test]
    fn care_guide_is_localized() {
        let fr = care_guide("Monstera deliciosa".to_string(), "fr".to_string());
        assert!(fr.watering.contains("jours"));

        let en = care_guide("Monstera deliciosa".to_string(), "en".to_string());
        assert!(en.watering.contains("days"));
    }
}
