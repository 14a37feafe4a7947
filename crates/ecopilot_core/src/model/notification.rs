//! Notification domain model.
//!
//! # Responsibility
//! - Define notification kinds emitted by the companion core.
//! - Define the in-app feed entry record.
//!
//! # Invariants
//! - A feed entry is immutable after creation except for its `read` flag.
//! - Cooldown identity is `(kind, subject)`, never the bare kind, so
//!   unrelated subjects cannot suppress each other.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a feed entry.
pub type NotificationId = Uuid;

/// Category of a companion notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// User entered the home zone while plants need water.
    HomeArrival,
    /// User left the home zone while plants need water.
    HomeDeparture,
    /// A specific plant is due for watering.
    WaterReminder,
    /// A specific plant shows a health issue.
    PlantHealth,
    /// Weather conditions call for plant protection.
    WeatherAlert,
}

/// Composite debounce identity for one notification stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub kind: NotificationKind,
    /// Subject discriminator, e.g. a plant ID for per-plant reminders.
    pub subject: Option<String>,
}

impl CooldownKey {
    pub fn of(kind: NotificationKind) -> Self {
        Self {
            kind,
            subject: None,
        }
    }

    pub fn for_subject(kind: NotificationKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: Some(subject.into()),
        }
    }
}

/// One entry of the in-app notification feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable feed entry ID.
    pub uuid: NotificationId,
    pub kind: NotificationKind,
    /// Subject discriminator matching the cooldown key, when any.
    pub subject: Option<String>,
    /// Localized title as delivered.
    pub title: String,
    /// Localized body as delivered.
    pub body: String,
    /// Emission time, epoch milliseconds.
    pub timestamp_ms: i64,
    pub read: bool,
    /// Distance from home at emission time, for location notifications.
    pub distance_km: Option<f64>,
}

impl Notification {
    /// Creates an unread entry with a generated stable ID.
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            subject: None,
            title: title.into(),
            body: body.into(),
            timestamp_ms,
            read: false,
            distance_km: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_distance(mut self, distance_km: f64) -> Self {
        self.distance_km = Some(distance_km);
        self
    }

    /// Cooldown identity this entry belongs to.
    pub fn cooldown_key(&self) -> CooldownKey {
        CooldownKey {
            kind: self.kind,
            subject: self.subject.clone(),
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
