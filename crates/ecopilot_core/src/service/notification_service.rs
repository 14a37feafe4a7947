//! Notification debouncing, delivery and in-app feed.
//!
//! # Responsibility
//! - Enforce one notification per cooldown stream per cooldown window.
//! - Build localized notification content.
//! - Deliver best-effort through a platform sink and persist the feed.
//!
//! # Invariants
//! - `try_emit` updates `last_sent[key]` only when it allows the emission.
//! - The in-app feed never exceeds [`FEED_CAP`] entries, newest first.
//! - Sink failures never fail the operation; the entry still reaches the
//!   feed.
//!
//! # See also
//! - docs/architecture/location-tracking.md

use crate::locale::{Language, Localizer};
use crate::model::geo::format_distance_km;
use crate::model::notification::{CooldownKey, Notification, NotificationKind};
use crate::model::plant::Plant;
use crate::model::weather::{WeatherAlert, WeatherAlertKind};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::RepoError;
use fluent::FluentValue;
use log::{info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum entries surfaced in the in-app feed.
pub const FEED_CAP: u32 = 10;

/// Default cooldown between two emissions of the same stream: 5 minutes.
pub const DEFAULT_COOLDOWN_MS: i64 = 5 * 60 * 1000;
/// Smallest configurable cooldown: 5 minutes.
pub const MIN_COOLDOWN_MS: i64 = 5 * 60 * 1000;
/// Largest configurable cooldown: 10 minutes.
pub const MAX_COOLDOWN_MS: i64 = 10 * 60 * 1000;

/// Clamps a cooldown into the configurable window.
pub fn clamp_cooldown_ms(cooldown_ms: i64) -> i64 {
    cooldown_ms.clamp(MIN_COOLDOWN_MS, MAX_COOLDOWN_MS)
}

/// Errors from notification operations.
#[derive(Debug)]
pub enum NotificationServiceError {
    Repo(RepoError),
}

impl Display for NotificationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotificationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for NotificationServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Platform delivery boundary (system tray, push, ...).
///
/// Delivery is best-effort; the feed is the source of truth.
pub trait NotificationSink {
    fn deliver(&self, notification: &Notification) -> Result<(), String>;
}

/// Sink that only writes a log line. Default for tests and the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, notification: &Notification) -> Result<(), String> {
        info!(
            "event=notification_delivered module=notification status=ok kind={:?} timestamp_ms={}",
            notification.kind, notification.timestamp_ms
        );
        Ok(())
    }
}

/// Per-stream cooldown bookkeeping.
///
/// Purely in-memory; callers rehydrate streams from stored notification
/// history after a restart via [`NotificationDebouncer::preload`].
#[derive(Debug)]
pub struct NotificationDebouncer {
    cooldown_ms: i64,
    last_sent: HashMap<CooldownKey, i64>,
}

impl NotificationDebouncer {
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            cooldown_ms: clamp_cooldown_ms(cooldown_ms),
            last_sent: HashMap::new(),
        }
    }

    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown_ms
    }

    /// Seeds a stream with a previously persisted emission time.
    ///
    /// Keeps the newest value when called twice for the same stream.
    pub fn preload(&mut self, key: CooldownKey, last_sent_ms: i64) {
        self.last_sent
            .entry(key)
            .and_modify(|existing| *existing = (*existing).max(last_sent_ms))
            .or_insert(last_sent_ms);
    }

    /// Whether the stream may fire now; records the emission when allowed.
    pub fn try_emit(&mut self, key: &CooldownKey, now_ms: i64) -> bool {
        if let Some(last) = self.last_sent.get(key) {
            if now_ms - last < self.cooldown_ms {
                return false;
            }
        }
        self.last_sent.insert(key.clone(), now_ms);
        true
    }

    /// Milliseconds until the stream may fire again; zero when it may.
    pub fn remaining_ms(&self, key: &CooldownKey, now_ms: i64) -> i64 {
        self.last_sent
            .get(key)
            .map(|last| (last + self.cooldown_ms - now_ms).max(0))
            .unwrap_or(0)
    }
}

impl Default for NotificationDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}

/// Notification facade: debounce, localize, deliver, persist.
pub struct NotificationCenter<R: NotificationRepository, S: NotificationSink> {
    repo: R,
    sink: S,
    debouncer: NotificationDebouncer,
}

impl<R: NotificationRepository, S: NotificationSink> NotificationCenter<R, S> {
    pub fn new(repo: R, sink: S, debouncer: NotificationDebouncer) -> Self {
        Self {
            repo,
            sink,
            debouncer,
        }
    }

    /// Rehydrates one cooldown stream from stored history.
    pub fn restore_stream(&mut self, key: CooldownKey) -> Result<(), NotificationServiceError> {
        if let Some(last_ms) = self.repo.last_emitted_ms(&key)? {
            self.debouncer.preload(key, last_ms);
        }
        Ok(())
    }

    /// Emits a notification unless its stream is cooling down.
    ///
    /// Returns the delivered entry, or `None` when suppressed.
    pub fn notify(
        &mut self,
        notification: Notification,
    ) -> Result<Option<Notification>, NotificationServiceError> {
        let key = notification.cooldown_key();
        if !self.debouncer.try_emit(&key, notification.timestamp_ms) {
            info!(
                "event=notification_suppressed module=notification status=ok kind={:?} remaining_ms={}",
                notification.kind,
                self.debouncer.remaining_ms(&key, notification.timestamp_ms)
            );
            return Ok(None);
        }

        self.repo.record(&notification)?;
        if let Err(reason) = self.sink.deliver(&notification) {
            warn!(
                "event=notification_delivery module=notification status=error reason={reason}"
            );
        }
        Ok(Some(notification))
    }

    /// The in-app feed: newest entries first, capped.
    pub fn feed(&self) -> Result<Vec<Notification>, NotificationServiceError> {
        Ok(self.repo.list_recent(FEED_CAP)?)
    }

    pub fn mark_read(
        &self,
        id: crate::model::notification::NotificationId,
    ) -> Result<(), NotificationServiceError> {
        Ok(self.repo.mark_read(id)?)
    }

    pub fn clear(&self) -> Result<(), NotificationServiceError> {
        Ok(self.repo.clear()?)
    }
}

/// Builds the home-arrival notification.
///
/// `plants_needing_water` drives the localized body text.
pub fn build_home_arrival(
    localizer: &Localizer,
    language: Language,
    plants_needing_water: usize,
    distance_km: f64,
    now_ms: i64,
) -> Notification {
    let title = localizer.text(language, "home-arrival-title");
    let body = localizer.format(
        language,
        "home-arrival-body",
        &[("count", FluentValue::from(plants_needing_water as i64))],
    );
    Notification::new(NotificationKind::HomeArrival, title, body, now_ms)
        .with_subject("home")
        .with_distance(distance_km)
}

/// Builds the home-departure notification.
pub fn build_home_departure(
    localizer: &Localizer,
    language: Language,
    distance_km: f64,
    now_ms: i64,
) -> Notification {
    let title = localizer.text(language, "home-departure-title");
    let body = localizer.format(
        language,
        "home-departure-body",
        &[(
            "distance",
            FluentValue::from(format_distance_km(distance_km)),
        )],
    );
    Notification::new(NotificationKind::HomeDeparture, title, body, now_ms)
        .with_subject("home")
        .with_distance(distance_km)
}

/// Builds a per-plant watering reminder.
pub fn build_water_reminder(
    localizer: &Localizer,
    language: Language,
    plant: &Plant,
    now_ms: i64,
) -> Notification {
    let title = localizer.text(language, "water-reminder-title");
    let body = localizer.format(
        language,
        "water-reminder-body",
        &[
            ("name", FluentValue::from(plant.display_name(language))),
            (
                "days",
                FluentValue::from(plant.days_since_watered(now_ms)),
            ),
        ],
    );
    Notification::new(NotificationKind::WaterReminder, title, body, now_ms)
        .with_subject(plant.uuid.to_string())
}

/// Builds a per-plant health alert.
pub fn build_plant_health(
    localizer: &Localizer,
    language: Language,
    plant: &Plant,
    issue: &str,
    now_ms: i64,
) -> Notification {
    let title = localizer.text(language, "plant-health-title");
    let body = localizer.format(
        language,
        "plant-health-body",
        &[
            ("name", FluentValue::from(plant.display_name(language))),
            ("issue", FluentValue::from(issue)),
        ],
    );
    Notification::new(NotificationKind::PlantHealth, title, body, now_ms)
        .with_subject(plant.uuid.to_string())
}

/// Builds a weather protection alert.
pub fn build_weather_alert(
    localizer: &Localizer,
    language: Language,
    alert: WeatherAlert,
    now_ms: i64,
) -> Notification {
    let title = localizer.text(language, "weather-alert-title");
    let (body_key, subject) = match alert.kind {
        WeatherAlertKind::Heat => ("weather-alert-heat", "heat"),
        WeatherAlertKind::Cold => ("weather-alert-cold", "cold"),
        WeatherAlertKind::DryAir => ("weather-alert-dry", "dry_air"),
    };
    let body = localizer.text(language, body_key);
    Notification::new(NotificationKind::WeatherAlert, title, body, now_ms)
        .with_subject(subject)
}
