//! User settings persistence.
//!
//! # Responsibility
//! - Persist the single user settings row with typed columns.
//! - Normalize out-of-range values on both read and write.
//!
//! # Invariants
//! - `settings` holds at most one row (`id = 1`).
//! - A missing row reads back as `UserSettings::default()`.

use crate::locale::Language;
use crate::model::settings::{NotificationPrefs, UserSettings};
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for user settings.
pub trait SettingsRepository {
    /// Loads settings, falling back to defaults when none were saved yet.
    fn load(&self) -> RepoResult<UserSettings>;
    /// Saves normalized settings, replacing any previous row.
    fn save(&self, settings: &UserSettings) -> RepoResult<()>;
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load(&self) -> RepoResult<UserSettings> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    language,
                    home_radius_km,
                    notif_enabled,
                    notif_sound,
                    notif_vibration,
                    notif_location_based,
                    user_name,
                    home_address
                 FROM settings
                 WHERE id = 1;",
                [],
                |row| {
                    Ok(UserSettings {
                        language: Language::from_tag(&row.get::<_, String>("language")?)
                            .unwrap_or_default(),
                        home_radius_km: row.get("home_radius_km")?,
                        notifications: NotificationPrefs {
                            enabled: row.get::<_, i64>("notif_enabled")? != 0,
                            sound: row.get::<_, i64>("notif_sound")? != 0,
                            vibration: row.get::<_, i64>("notif_vibration")? != 0,
                            location_based: row.get::<_, i64>("notif_location_based")? != 0,
                        },
                        user_name: row.get("user_name")?,
                        home_address: row.get("home_address")?,
                    })
                },
            )
            .optional()?;

        Ok(row.unwrap_or_default().normalized())
    }

    fn save(&self, settings: &UserSettings) -> RepoResult<()> {
        let settings = settings.clone().normalized();
        self.conn.execute(
            "INSERT INTO settings (
                id,
                language,
                home_radius_km,
                notif_enabled,
                notif_sound,
                notif_vibration,
                notif_location_based,
                user_name,
                home_address
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (id) DO UPDATE SET
                language = excluded.language,
                home_radius_km = excluded.home_radius_km,
                notif_enabled = excluded.notif_enabled,
                notif_sound = excluded.notif_sound,
                notif_vibration = excluded.notif_vibration,
                notif_location_based = excluded.notif_location_based,
                user_name = excluded.user_name,
                home_address = excluded.home_address;",
            params![
                settings.language.tag(),
                settings.home_radius_km,
                i64::from(settings.notifications.enabled),
                i64::from(settings.notifications.sound),
                i64::from(settings.notifications.vibration),
                i64::from(settings.notifications.location_based),
                settings.user_name.as_str(),
                settings.home_address.as_str(),
            ],
        )?;
        Ok(())
    }
}
