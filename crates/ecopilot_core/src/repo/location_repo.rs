//! Home reference and location history persistence.
//!
//! # Responsibility
//! - Persist the single home reference row together with its last zone
//!   classification.
//! - Keep the rolling location history window bounded.
//!
//! # Invariants
//! - `home_location` holds at most one row (`id = 1`).
//! - History is capped at [`HISTORY_CAP`] rows; samples older than
//!   [`HISTORY_RETENTION_MS`] are pruned on write.
//!
//! # See also
//! - docs/architecture/location-tracking.md

use crate::model::geo::{HomeReference, HomeSource, Position};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Maximum rows kept in `location_history`.
pub const HISTORY_CAP: u32 = 100;
/// History samples older than seven days are pruned on write.
pub const HISTORY_RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// One persisted history sample with its derived classification.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub position: Position,
    pub distance_km: f64,
    pub is_at_home: bool,
}

/// Repository interface for home reference and history storage.
pub trait LocationRepository {
    /// Saves (or replaces) the home reference and its zone state.
    fn save_home(&self, home: &HomeReference, is_at_home: bool) -> RepoResult<()>;
    /// Loads the home reference and the last persisted zone state.
    fn load_home(&self) -> RepoResult<Option<(HomeReference, bool)>>;
    /// Updates only the persisted zone state for the existing home row.
    fn set_at_home(&self, is_at_home: bool) -> RepoResult<()>;
    /// Appends one sample, then enforces cap and retention.
    fn append_history(&self, entry: &HistoryEntry) -> RepoResult<()>;
    /// Returns history entries, newest first.
    fn list_history(&self, limit: u32) -> RepoResult<Vec<HistoryEntry>>;
    /// Drops all history rows.
    fn clear_history(&self) -> RepoResult<()>;
}

/// SQLite-backed location repository.
pub struct SqliteLocationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLocationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LocationRepository for SqliteLocationRepository<'_> {
    fn save_home(&self, home: &HomeReference, is_at_home: bool) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO home_location (id, latitude, longitude, source, set_at_ms, is_at_home)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (id) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                source = excluded.source,
                set_at_ms = excluded.set_at_ms,
                is_at_home = excluded.is_at_home;",
            params![
                home.latitude,
                home.longitude,
                home_source_to_db(home.source),
                home.set_at_ms,
                bool_to_int(is_at_home),
            ],
        )?;
        Ok(())
    }

    fn load_home(&self) -> RepoResult<Option<(HomeReference, bool)>> {
        let row = self
            .conn
            .query_row(
                "SELECT latitude, longitude, source, set_at_ms, is_at_home
                 FROM home_location
                 WHERE id = 1;",
                [],
                |row| {
                    Ok((
                        row.get::<_, f64>("latitude")?,
                        row.get::<_, f64>("longitude")?,
                        row.get::<_, String>("source")?,
                        row.get::<_, i64>("set_at_ms")?,
                        row.get::<_, i64>("is_at_home")?,
                    ))
                },
            )
            .optional()?;

        let Some((latitude, longitude, source, set_at_ms, is_at_home)) = row else {
            return Ok(None);
        };

        let home = HomeReference {
            latitude,
            longitude,
            source: home_source_from_db(&source)?,
            set_at_ms,
        };
        Ok(Some((home, is_at_home != 0)))
    }

    fn set_at_home(&self, is_at_home: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE home_location SET is_at_home = ?1 WHERE id = 1;",
            [bool_to_int(is_at_home)],
        )?;
        if changed == 0 {
            return Err(RepoError::InvalidData(
                "cannot set zone state before a home reference exists".to_string(),
            ));
        }
        Ok(())
    }

    fn append_history(&self, entry: &HistoryEntry) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO location_history (
                latitude, longitude, accuracy_m, timestamp_ms, distance_km, is_at_home
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.position.latitude,
                entry.position.longitude,
                entry.position.accuracy_m,
                entry.position.timestamp_ms,
                entry.distance_km,
                bool_to_int(entry.is_at_home),
            ],
        )?;

        self.conn.execute(
            "DELETE FROM location_history WHERE timestamp_ms < ?1;",
            [entry.position.timestamp_ms - HISTORY_RETENTION_MS],
        )?;

        self.conn.execute(
            "DELETE FROM location_history
             WHERE id NOT IN (
                SELECT id FROM location_history
                ORDER BY timestamp_ms DESC, id DESC
                LIMIT ?1
             );",
            [i64::from(HISTORY_CAP)],
        )?;

        Ok(())
    }

    fn list_history(&self, limit: u32) -> RepoResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT latitude, longitude, accuracy_m, timestamp_ms, distance_km, is_at_home
             FROM location_history
             ORDER BY timestamp_ms DESC, id DESC
             LIMIT ?1;",
        )?;

        let mut rows = stmt.query([i64::from(limit)])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let is_at_home: i64 = row.get("is_at_home")?;
            entries.push(HistoryEntry {
                position: Position {
                    latitude: row.get("latitude")?,
                    longitude: row.get("longitude")?,
                    accuracy_m: row.get("accuracy_m")?,
                    timestamp_ms: row.get("timestamp_ms")?,
                    speed_mps: None,
                    heading_deg: None,
                },
                distance_km: row.get("distance_km")?,
                is_at_home: is_at_home != 0,
            });
        }
        Ok(entries)
    }

    fn clear_history(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM location_history;", [])?;
        Ok(())
    }
}

fn home_source_to_db(source: HomeSource) -> &'static str {
    match source {
        HomeSource::Auto => "auto",
        HomeSource::Manual => "manual",
        HomeSource::Geocoded => "geocoded",
    }
}

fn home_source_from_db(value: &str) -> RepoResult<HomeSource> {
    match value {
        "auto" => Ok(HomeSource::Auto),
        "manual" => Ok(HomeSource::Manual),
        "geocoded" => Ok(HomeSource::Geocoded),
        other => Err(RepoError::InvalidData(format!(
            "unknown home source: {other}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

#[cfg(test)]
mod tests {
    use super::{
        HistoryEntry, LocationRepository, SqliteLocationRepository, HISTORY_CAP,
        HISTORY_RETENTION_MS,
    };
    use crate::db::open_db_in_memory;
    use crate::model::geo::{Coordinates, HomeReference, HomeSource, Position};

    fn entry(timestamp_ms: i64) -> HistoryEntry {
        HistoryEntry {
            position: Position::new(45.4215, -75.6972, 10.0, timestamp_ms)
                .expect("valid test position"),
            distance_km: 0.02,
            is_at_home: true,
        }
    }

    #[test]
    fn home_row_upserts_and_roundtrips() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteLocationRepository::new(&conn);

        assert!(repo.load_home().expect("load").is_none());

        let coords = Coordinates::new(45.4215, -75.6972).expect("valid coords");
        let auto = HomeReference::new(coords, HomeSource::Auto, 1_000);
        repo.save_home(&auto, true).expect("save auto");

        let manual = HomeReference::new(coords, HomeSource::Manual, 2_000);
        repo.save_home(&manual, false).expect("save manual");

        let (loaded, at_home) = repo.load_home().expect("load").expect("present");
        assert_eq!(loaded, manual);
        assert!(!at_home);
    }

    #[test]
    fn zone_state_updates_require_an_existing_home() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteLocationRepository::new(&conn);

        assert!(repo.set_at_home(true).is_err());

        let coords = Coordinates::new(45.4215, -75.6972).expect("valid coords");
        let home = HomeReference::new(coords, HomeSource::Auto, 1_000);
        repo.save_home(&home, false).expect("save");
        repo.set_at_home(true).expect("update state");

        let (_, at_home) = repo.load_home().expect("load").expect("present");
        assert!(at_home);
    }

    #[test]
    fn history_is_capped_to_the_window() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteLocationRepository::new(&conn);

        for i in 0..(HISTORY_CAP + 20) {
            repo.append_history(&entry(i64::from(i) * 1_000))
                .expect("append");
        }

        let all = repo.list_history(HISTORY_CAP + 20).expect("list");
        assert_eq!(all.len(), HISTORY_CAP as usize);
        // Newest first; the oldest 20 samples fell off.
        assert_eq!(all[0].position.timestamp_ms, 119_000);
        assert_eq!(all.last().map(|e| e.position.timestamp_ms), Some(20_000));
    }

    #[test]
    fn stale_history_is_pruned_on_write() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteLocationRepository::new(&conn);

        repo.append_history(&entry(0)).expect("append old");
        repo.append_history(&entry(HISTORY_RETENTION_MS + 1_000))
            .expect("append fresh");

        let all = repo.list_history(10).expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].position.timestamp_ms, HISTORY_RETENTION_MS + 1_000);
    }
}
