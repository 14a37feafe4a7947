//! User settings model.
//!
//! # Responsibility
//! - Define the per-user configuration the companion persists locally.
//! - Normalize out-of-range values instead of erroring on them.
//!
//! # Invariants
//! - `home_radius_km` stays within `[0.05, 0.5]` (50 m – 500 m) once
//!   normalized.
//! - French is the default language.

use crate::locale::Language;
use serde::{Deserialize, Serialize};

/// Default home-zone radius: 100 m.
pub const DEFAULT_HOME_RADIUS_KM: f64 = 0.1;
/// Smallest configurable home-zone radius: 50 m.
pub const MIN_HOME_RADIUS_KM: f64 = 0.05;
/// Largest configurable home-zone radius: 500 m.
pub const MAX_HOME_RADIUS_KM: f64 = 0.5;

/// Notification delivery preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub enabled: bool,
    pub sound: bool,
    pub vibration: bool,
    /// Whether zone transitions may trigger notifications at all.
    pub location_based: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            vibration: true,
            location_based: true,
        }
    }
}

/// Locally persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub language: Language,
    /// Radius of the "at home" zone in kilometers.
    pub home_radius_km: f64,
    pub notifications: NotificationPrefs,
    pub user_name: String,
    /// Free-form home address used for geocoded home entry.
    pub home_address: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::Fr,
            home_radius_km: DEFAULT_HOME_RADIUS_KM,
            notifications: NotificationPrefs::default(),
            user_name: String::new(),
            home_address: String::new(),
        }
    }
}

impl UserSettings {
    /// Returns a copy with all values forced into their allowed ranges.
    pub fn normalized(mut self) -> Self {
        self.home_radius_km = clamp_home_radius_km(self.home_radius_km);
        self
    }
}

/// Clamps a radius into the configurable 50 m – 500 m window.
///
/// Non-finite input falls back to the default radius.
pub fn clamp_home_radius_km(radius_km: f64) -> f64 {
    if !radius_km.is_finite() {
        return DEFAULT_HOME_RADIUS_KM;
    }
    radius_km.clamp(MIN_HOME_RADIUS_KM, MAX_HOME_RADIUS_KM)
}

#[cfg(test)]
mod tests {
    use super::{clamp_home_radius_km, UserSettings, DEFAULT_HOME_RADIUS_KM};
    use crate::locale::Language;

    #[test]
    fn defaults_match_the_companion_baseline() {
        let settings = UserSettings::default();
        assert_eq!(settings.language, Language::Fr);
        assert_eq!(settings.home_radius_km, DEFAULT_HOME_RADIUS_KM);
        assert!(settings.notifications.location_based);
    }

    #[test]
    fn radius_is_clamped_into_the_allowed_window() {
        assert_eq!(clamp_home_radius_km(0.01), 0.05);
        assert_eq!(clamp_home_radius_km(0.2), 0.2);
        assert_eq!(clamp_home_radius_km(3.0), 0.5);
        assert_eq!(clamp_home_radius_km(f64::NAN), DEFAULT_HOME_RADIUS_KM);
    }

    #[test]
    fn normalized_applies_the_clamp() {
        let settings = UserSettings {
            home_radius_km: 9.0,
            ..UserSettings::default()
        };
        assert_eq!(settings.normalized().home_radius_km, 0.5);
    }
}
