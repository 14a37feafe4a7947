//! JSON export/import of the full local state.
//!
//! # Responsibility
//! - Serialize plants, settings, home reference and notification history
//!   into one versioned JSON document.
//! - Restore that document over a migrated database.
//!
//! # Invariants
//! - Import replaces local state wholesale; it is not a merge.
//! - A document with an unknown version is rejected before any write.
//! - Import runs in one transaction; a failed import leaves the previous
//!   local state untouched.

use crate::model::geo::HomeReference;
use crate::model::notification::Notification;
use crate::model::plant::Plant;
use crate::model::settings::UserSettings;
use crate::repo::location_repo::{LocationRepository, SqliteLocationRepository};
use crate::repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
use crate::repo::plant_repo::{PlantRepository, SqlitePlantRepository};
use crate::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
use crate::repo::RepoError;
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version written into every exported document.
pub const BACKUP_VERSION: u32 = 1;

/// Errors from backup operations.
#[derive(Debug)]
pub enum BackupError {
    /// Document version newer than this binary understands.
    UnsupportedVersion(u32),
    /// Document is not valid JSON for the expected shape.
    Malformed(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported backup version: {version}")
            }
            Self::Malformed(message) => write!(f, "malformed backup document: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BackupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}

/// The exported document shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupDocument {
    pub version: u32,
    pub exported_at_ms: i64,
    pub settings: UserSettings,
    pub home: Option<HomeState>,
    pub plants: Vec<Plant>,
    pub notifications: Vec<Notification>,
}

/// Persisted home reference plus its zone state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeState {
    pub reference: HomeReference,
    pub is_at_home: bool,
}

/// Backup facade over one migrated connection.
pub struct BackupService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BackupService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Exports the full local state as pretty-printed JSON.
    pub fn export(&self, now_ms: i64) -> Result<String, BackupError> {
        let plants = SqlitePlantRepository::new(self.conn).list_plants()?;
        let settings = SqliteSettingsRepository::new(self.conn).load()?;
        let home = SqliteLocationRepository::new(self.conn)
            .load_home()?
            .map(|(reference, is_at_home)| HomeState {
                reference,
                is_at_home,
            });
        let notifications =
            SqliteNotificationRepository::new(self.conn).list_recent(u32::MAX)?;

        let document = BackupDocument {
            version: BACKUP_VERSION,
            exported_at_ms: now_ms,
            settings,
            home,
            plants,
            notifications,
        };

        let json = serde_json::to_string_pretty(&document)?;
        info!(
            "event=backup_export module=backup status=ok plants={} notifications={}",
            document.plants.len(),
            document.notifications.len()
        );
        Ok(json)
    }

    /// Replaces local state with the document's content.
    ///
    /// The whole replacement runs in one transaction: any mid-import
    /// failure rolls back and the previous state survives.
    pub fn import(&self, json: &str) -> Result<BackupDocument, BackupError> {
        let document: BackupDocument = serde_json::from_str(json)?;
        if document.version > BACKUP_VERSION {
            return Err(BackupError::UnsupportedVersion(document.version));
        }

        let tx = self.conn.unchecked_transaction().map_err(RepoError::from)?;

        let plant_repo = SqlitePlantRepository::new(&tx);
        for existing in plant_repo.list_plants()? {
            plant_repo.delete_plant(existing.uuid)?;
        }
        for plant in &document.plants {
            plant_repo.create_plant(plant)?;
        }

        SqliteSettingsRepository::new(&tx).save(&document.settings)?;

        if let Some(home) = &document.home {
            SqliteLocationRepository::new(&tx).save_home(&home.reference, home.is_at_home)?;
        }

        let notification_repo = SqliteNotificationRepository::new(&tx);
        notification_repo.clear()?;
        // Oldest first so cap pruning keeps the newest entries.
        let mut notifications = document.notifications.clone();
        notifications.sort_by_key(|entry| entry.timestamp_ms);
        for notification in &notifications {
            notification_repo.record(notification)?;
        }

        tx.commit().map_err(RepoError::from)?;

        info!(
            "event=backup_import module=backup status=ok plants={} notifications={}",
            document.plants.len(),
            document.notifications.len()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::{BackupError, BackupService, BACKUP_VERSION};
    use crate::db::open_db_in_memory;
    use crate::locale::Language;
    use crate::model::geo::{Coordinates, HomeReference, HomeSource};
    use crate::model::notification::{Notification, NotificationKind};
    use crate::model::plant::Plant;
    use crate::model::settings::UserSettings;
    use crate::repo::location_repo::{LocationRepository, SqliteLocationRepository};
    use crate::repo::notification_repo::{
        NotificationRepository, SqliteNotificationRepository,
    };
    use crate::repo::plant_repo::{PlantRepository, SqlitePlantRepository};
    use crate::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};

    fn seeded_db() -> rusqlite::Connection {
        let conn = open_db_in_memory().expect("open in-memory db");

        SqlitePlantRepository::new(&conn)
            .create_plant(&Plant::new("Monstera", "Monstera deliciosa", "Salon", 7, 0))
            .expect("seed plant");

        let mut settings = UserSettings::default();
        settings.language = Language::En;
        settings.user_name = "Camille".to_string();
        SqliteSettingsRepository::new(&conn)
            .save(&settings)
            .expect("seed settings");

        let coords = Coordinates::new(45.4215, -75.6972).expect("valid coords");
        SqliteLocationRepository::new(&conn)
            .save_home(&HomeReference::new(coords, HomeSource::Manual, 1_000), true)
            .expect("seed home");

        SqliteNotificationRepository::new(&conn)
            .record(&Notification::new(
                NotificationKind::HomeArrival,
                "t",
                "b",
                2_000,
            ))
            .expect("seed notification");

        conn
    }

    #[test]
    fn export_then_import_restores_the_full_state() {
        let source = seeded_db();
        let json = BackupService::new(&source).export(5_000).expect("export");

        let target = open_db_in_memory().expect("open target db");
        let restored = BackupService::new(&target).import(&json).expect("import");
        assert_eq!(restored.version, BACKUP_VERSION);

        let plants = SqlitePlantRepository::new(&target)
            .list_plants()
            .expect("list plants");
        assert_eq!(plants.len(), 1);
        assert_eq!(plants[0].name_fr, "Monstera");

        let settings = SqliteSettingsRepository::new(&target).load().expect("load");
        assert_eq!(settings.language, Language::En);
        assert_eq!(settings.user_name, "Camille");

        let (home, at_home) = SqliteLocationRepository::new(&target)
            .load_home()
            .expect("load home")
            .expect("present");
        assert_eq!(home.source, HomeSource::Manual);
        assert!(at_home);

        let feed = SqliteNotificationRepository::new(&target)
            .list_recent(10)
            .expect("list notifications");
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn import_replaces_existing_plants() {
        let source = seeded_db();
        let json = BackupService::new(&source).export(5_000).expect("export");

        let target = seeded_db();
        SqlitePlantRepository::new(&target)
            .create_plant(&Plant::new("Ficus", "Ficus elastica", "Bureau", 7, 0))
            .expect("extra plant");

        BackupService::new(&target).import(&json).expect("import");
        let plants = SqlitePlantRepository::new(&target)
            .list_plants()
            .expect("list");
        assert_eq!(plants.len(), 1);
    }

    #[test]
    fn future_version_is_rejected_before_any_write() {
        let target = seeded_db();
        let json = format!(
            r#"{{"version":{},"exported_at_ms":0,"settings":{},"home":null,"plants":[],"notifications":[]}}"#,
            BACKUP_VERSION + 1,
            serde_json::to_string(&UserSettings::default()).expect("settings json"),
        );

        let err = BackupService::new(&target)
            .import(&json)
            .expect_err("should reject");
        assert!(matches!(err, BackupError::UnsupportedVersion(v) if v == BACKUP_VERSION + 1));

        // The seeded plant survived.
        let plants = SqlitePlantRepository::new(&target)
            .list_plants()
            .expect("list");
        assert_eq!(plants.len(), 1);
    }

    #[test]
    fn failed_import_rolls_back_to_the_previous_state() {
        let target = seeded_db();

        // Valid plant first so the import writes rows before it fails.
        let mut blank = Plant::new("Ficus", "Ficus elastica", "Bureau", 7, 0);
        blank.name_fr = String::new();
        blank.name_en = " ".to_string();
        let document = super::BackupDocument {
            version: BACKUP_VERSION,
            exported_at_ms: 0,
            settings: UserSettings::default(),
            home: None,
            plants: vec![Plant::new("Pothos", "Epipremnum aureum", "Cuisine", 7, 0), blank],
            notifications: Vec::new(),
        };
        let json = serde_json::to_string(&document).expect("document json");

        let err = BackupService::new(&target)
            .import(&json)
            .expect_err("should reject the blank plant");
        assert!(matches!(
            err,
            BackupError::Repo(crate::repo::RepoError::Validation(_))
        ));

        // The seeded state survived untouched.
        let plants = SqlitePlantRepository::new(&target)
            .list_plants()
            .expect("list");
        assert_eq!(plants.len(), 1);
        assert_eq!(plants[0].name_fr, "Monstera");
        let feed = SqliteNotificationRepository::new(&target)
            .list_recent(10)
            .expect("list notifications");
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn garbage_input_is_malformed() {
        let target = open_db_in_memory().expect("open db");
        let err = BackupService::new(&target)
            .import("not json at all")
            .expect_err("should reject");
        assert!(matches!(err, BackupError::Malformed(_)));
    }
}
