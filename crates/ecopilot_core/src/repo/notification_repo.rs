//! Notification history persistence.
//!
//! # Responsibility
//! - Persist delivered notifications for the in-app feed.
//! - Answer "when did this cooldown stream last fire" queries for the
//!   debouncer after a process restart.
//!
//! # Invariants
//! - Storage is capped at [`STORED_CAP`] rows; rows older than
//!   [`STORED_RETENTION_MS`] are pruned on write.
//! - `(kind, subject)` lookups return the newest emission only.

use crate::model::notification::{
    CooldownKey, Notification, NotificationId, NotificationKind,
};
use crate::repo::plant_repo::parse_uuid;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Maximum rows kept in the `notifications` table.
pub const STORED_CAP: u32 = 50;
/// Stored notifications older than thirty days are pruned on write.
pub const STORED_RETENTION_MS: i64 = 30 * 24 * 60 * 60 * 1000;

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    subject,
    title,
    body,
    timestamp_ms,
    read,
    distance_km
FROM notifications";

/// Repository interface for notification history.
pub trait NotificationRepository {
    /// Persists one delivered notification, then enforces cap and retention.
    fn record(&self, notification: &Notification) -> RepoResult<()>;
    /// Returns the newest entries, newest first.
    fn list_recent(&self, limit: u32) -> RepoResult<Vec<Notification>>;
    /// Newest emission time for a cooldown stream, if any survives pruning.
    fn last_emitted_ms(&self, key: &CooldownKey) -> RepoResult<Option<i64>>;
    /// Marks one entry read.
    fn mark_read(&self, id: NotificationId) -> RepoResult<()>;
    /// Drops all stored notifications.
    fn clear(&self) -> RepoResult<()>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn record(&self, notification: &Notification) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notifications (
                uuid, kind, subject, title, body, timestamp_ms, read, distance_km
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                notification.uuid.to_string(),
                kind_to_db(notification.kind),
                notification.subject.as_deref(),
                notification.title.as_str(),
                notification.body.as_str(),
                notification.timestamp_ms,
                i64::from(notification.read),
                notification.distance_km,
            ],
        )?;

        self.conn.execute(
            "DELETE FROM notifications WHERE timestamp_ms < ?1;",
            [notification.timestamp_ms - STORED_RETENTION_MS],
        )?;

        self.conn.execute(
            "DELETE FROM notifications
             WHERE uuid NOT IN (
                SELECT uuid FROM notifications
                ORDER BY timestamp_ms DESC, uuid DESC
                LIMIT ?1
             );",
            [i64::from(STORED_CAP)],
        )?;

        Ok(())
    }

    fn list_recent(&self, limit: u32) -> RepoResult<Vec<Notification>> {
        let sql = format!(
            "{NOTIFICATION_SELECT_SQL} ORDER BY timestamp_ms DESC, uuid DESC LIMIT ?1;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([i64::from(limit)])?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(notification_from_row(row)?);
        }
        Ok(entries)
    }

    fn last_emitted_ms(&self, key: &CooldownKey) -> RepoResult<Option<i64>> {
        let newest = self
            .conn
            .query_row(
                "SELECT MAX(timestamp_ms)
                 FROM notifications
                 WHERE kind = ?1
                   AND subject IS ?2;",
                params![kind_to_db(key.kind), key.subject.as_deref()],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();
        Ok(newest)
    }

    fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET read = 1 WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::InvalidData(format!(
                "notification not found: {id}"
            )));
        }
        Ok(())
    }

    fn clear(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM notifications;", [])?;
        Ok(())
    }
}

fn notification_from_row(row: &Row<'_>) -> RepoResult<Notification> {
    let uuid_text: String = row.get("uuid")?;
    let kind_text: String = row.get("kind")?;
    let read: i64 = row.get("read")?;

    Ok(Notification {
        uuid: parse_uuid(&uuid_text)?,
        kind: kind_from_db(&kind_text)?,
        subject: row.get("subject")?,
        title: row.get("title")?,
        body: row.get("body")?,
        timestamp_ms: row.get("timestamp_ms")?,
        read: read != 0,
        distance_km: row.get("distance_km")?,
    })
}

fn kind_to_db(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::HomeArrival => "home_arrival",
        NotificationKind::HomeDeparture => "home_departure",
        NotificationKind::WaterReminder => "water_reminder",
        NotificationKind::PlantHealth => "plant_health",
        NotificationKind::WeatherAlert => "weather_alert",
    }
}

fn kind_from_db(value: &str) -> RepoResult<NotificationKind> {
    match value {
        "home_arrival" => Ok(NotificationKind::HomeArrival),
        "home_departure" => Ok(NotificationKind::HomeDeparture),
        "water_reminder" => Ok(NotificationKind::WaterReminder),
        "plant_health" => Ok(NotificationKind::PlantHealth),
        "weather_alert" => Ok(NotificationKind::WeatherAlert),
        other => Err(RepoError::InvalidData(format!(
            "unknown notification kind: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        NotificationRepository, SqliteNotificationRepository, STORED_CAP, STORED_RETENTION_MS,
    };
    use crate::db::open_db_in_memory;
    use crate::model::notification::{CooldownKey, Notification, NotificationKind};

    fn arrival(timestamp_ms: i64) -> Notification {
        Notification::new(NotificationKind::HomeArrival, "title", "body", timestamp_ms)
    }

    #[test]
    fn record_then_list_returns_newest_first() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteNotificationRepository::new(&conn);

        repo.record(&arrival(1_000)).expect("record");
        repo.record(&arrival(3_000)).expect("record");
        repo.record(&arrival(2_000)).expect("record");

        let listed = repo.list_recent(10).expect("list");
        let stamps: Vec<i64> = listed.iter().map(|n| n.timestamp_ms).collect();
        assert_eq!(stamps, vec![3_000, 2_000, 1_000]);
    }

    #[test]
    fn storage_is_capped() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteNotificationRepository::new(&conn);

        for i in 0..(STORED_CAP + 10) {
            repo.record(&arrival(i64::from(i) * 1_000)).expect("record");
        }

        let listed = repo.list_recent(STORED_CAP + 10).expect("list");
        assert_eq!(listed.len(), STORED_CAP as usize);
    }

    #[test]
    fn stale_rows_are_pruned_on_write() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteNotificationRepository::new(&conn);

        repo.record(&arrival(0)).expect("record old");
        repo.record(&arrival(STORED_RETENTION_MS + 1_000))
            .expect("record fresh");

        let listed = repo.list_recent(10).expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn last_emitted_distinguishes_subjects() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteNotificationRepository::new(&conn);

        let reminder = Notification::new(NotificationKind::WaterReminder, "t", "b", 5_000)
            .with_subject("plant-a");
        repo.record(&reminder).expect("record");

        let key_a = CooldownKey::for_subject(NotificationKind::WaterReminder, "plant-a");
        let key_b = CooldownKey::for_subject(NotificationKind::WaterReminder, "plant-b");
        assert_eq!(repo.last_emitted_ms(&key_a).expect("query"), Some(5_000));
        assert_eq!(repo.last_emitted_ms(&key_b).expect("query"), None);
    }

    #[test]
    fn mark_read_flips_the_flag() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqliteNotificationRepository::new(&conn);

        let entry = arrival(1_000);
        repo.record(&entry).expect("record");
        repo.mark_read(entry.uuid).expect("mark read");

        let listed = repo.list_recent(1).expect("list");
        assert!(listed[0].read);
    }
}
