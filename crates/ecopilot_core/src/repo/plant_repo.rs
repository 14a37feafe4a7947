//! Plant repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical `plants` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Plant::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::model::plant::{Plant, PlantId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

const PLANT_SELECT_SQL: &str = "SELECT
    uuid,
    name_fr,
    name_en,
    species,
    location_fr,
    location_en,
    last_watered_ms,
    watering_frequency_days,
    created_at_ms,
    tip_fr,
    tip_en
FROM plants";

/// Repository interface for plant CRUD operations.
pub trait PlantRepository {
    /// Creates one plant record and returns its stable id.
    fn create_plant(&self, plant: &Plant) -> RepoResult<PlantId>;
    /// Replaces the full record for the given id.
    fn update_plant(&self, plant: &Plant) -> RepoResult<()>;
    /// Gets one plant by id.
    fn get_plant(&self, id: PlantId) -> RepoResult<Option<Plant>>;
    /// Lists all plants, oldest creation first.
    fn list_plants(&self) -> RepoResult<Vec<Plant>>;
    /// Deletes the record for the given id.
    fn delete_plant(&self, id: PlantId) -> RepoResult<()>;
}

/// SQLite-backed plant repository.
pub struct SqlitePlantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlantRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PlantRepository for SqlitePlantRepository<'_> {
    fn create_plant(&self, plant: &Plant) -> RepoResult<PlantId> {
        plant.validate()?;

        self.conn.execute(
            "INSERT INTO plants (
                uuid,
                name_fr,
                name_en,
                species,
                location_fr,
                location_en,
                last_watered_ms,
                watering_frequency_days,
                created_at_ms,
                tip_fr,
                tip_en
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                plant.uuid.to_string(),
                plant.name_fr.as_str(),
                plant.name_en.as_str(),
                plant.species.as_str(),
                plant.location_fr.as_str(),
                plant.location_en.as_str(),
                plant.last_watered_ms,
                plant.watering_frequency_days,
                plant.created_at_ms,
                plant.tip_fr.as_deref(),
                plant.tip_en.as_deref(),
            ],
        )?;

        Ok(plant.uuid)
    }

    fn update_plant(&self, plant: &Plant) -> RepoResult<()> {
        plant.validate()?;

        let changed = self.conn.execute(
            "UPDATE plants
             SET
                name_fr = ?1,
                name_en = ?2,
                species = ?3,
                location_fr = ?4,
                location_en = ?5,
                last_watered_ms = ?6,
                watering_frequency_days = ?7,
                tip_fr = ?8,
                tip_en = ?9,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?10;",
            params![
                plant.name_fr.as_str(),
                plant.name_en.as_str(),
                plant.species.as_str(),
                plant.location_fr.as_str(),
                plant.location_en.as_str(),
                plant.last_watered_ms,
                plant.watering_frequency_days,
                plant.tip_fr.as_deref(),
                plant.tip_en.as_deref(),
                plant.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(plant.uuid));
        }

        Ok(())
    }

    fn get_plant(&self, id: PlantId) -> RepoResult<Option<Plant>> {
        let sql = format!("{PLANT_SELECT_SQL} WHERE uuid = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(plant_from_row(row)?));
        }
        Ok(None)
    }

    fn list_plants(&self) -> RepoResult<Vec<Plant>> {
        let sql = format!("{PLANT_SELECT_SQL} ORDER BY created_at_ms ASC, uuid ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let mut plants = Vec::new();
        while let Some(row) = rows.next()? {
            plants.push(plant_from_row(row)?);
        }
        Ok(plants)
    }

    fn delete_plant(&self, id: PlantId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM plants WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn plant_from_row(row: &Row<'_>) -> RepoResult<Plant> {
    let uuid_text: String = row.get("uuid")?;
    let frequency: i64 = row.get("watering_frequency_days")?;
    let frequency = u32::try_from(frequency).map_err(|_| {
        RepoError::InvalidData(format!("watering_frequency_days out of range: {frequency}"))
    })?;

    Ok(Plant {
        uuid: parse_uuid(&uuid_text)?,
        name_fr: row.get("name_fr")?,
        name_en: row.get("name_en")?,
        species: row.get("species")?,
        location_fr: row.get("location_fr")?,
        location_en: row.get("location_en")?,
        last_watered_ms: row.get("last_watered_ms")?,
        watering_frequency_days: frequency,
        created_at_ms: row.get("created_at_ms")?,
        tip_fr: row.get("tip_fr")?,
        tip_en: row.get("tip_en")?,
    })
}

pub(crate) fn parse_uuid(text: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(text).map_err(|_| RepoError::InvalidData(format!("invalid uuid: {text}")))
}

/// In-memory plant repository for host-side tests and previews.
#[derive(Default)]
pub struct InMemoryPlantRepository {
    plants: Mutex<HashMap<PlantId, Plant>>,
}

impl InMemoryPlantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlantRepository for InMemoryPlantRepository {
    fn create_plant(&self, plant: &Plant) -> RepoResult<PlantId> {
        plant.validate()?;
        let mut plants = self
            .plants
            .lock()
            .map_err(|_| RepoError::InvalidData("plant store poisoned".to_string()))?;
        plants.insert(plant.uuid, plant.clone());
        Ok(plant.uuid)
    }

    fn update_plant(&self, plant: &Plant) -> RepoResult<()> {
        plant.validate()?;
        let mut plants = self
            .plants
            .lock()
            .map_err(|_| RepoError::InvalidData("plant store poisoned".to_string()))?;
        if !plants.contains_key(&plant.uuid) {
            return Err(RepoError::NotFound(plant.uuid));
        }
        plants.insert(plant.uuid, plant.clone());
        Ok(())
    }

    fn get_plant(&self, id: PlantId) -> RepoResult<Option<Plant>> {
        let plants = self
            .plants
            .lock()
            .map_err(|_| RepoError::InvalidData("plant store poisoned".to_string()))?;
        Ok(plants.get(&id).cloned())
    }

    fn list_plants(&self) -> RepoResult<Vec<Plant>> {
        let plants = self
            .plants
            .lock()
            .map_err(|_| RepoError::InvalidData("plant store poisoned".to_string()))?;
        let mut all: Vec<Plant> = plants.values().cloned().collect();
        all.sort_by_key(|plant| (plant.created_at_ms, plant.uuid));
        Ok(all)
    }

    fn delete_plant(&self, id: PlantId) -> RepoResult<()> {
        let mut plants = self
            .plants
            .lock()
            .map_err(|_| RepoError::InvalidData("plant store poisoned".to_string()))?;
        if plants.remove(&id).is_none() {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryPlantRepository, PlantRepository, SqlitePlantRepository};
    use crate::db::open_db_in_memory;
    use crate::model::plant::Plant;
    use crate::repo::RepoError;
    use uuid::Uuid;

    fn sample_plant(now_ms: i64) -> Plant {
        Plant::new("Pothos doré", "Epipremnum aureum", "Cuisine", 10, now_ms)
    }

    #[test]
    fn sqlite_create_then_get_roundtrips() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqlitePlantRepository::new(&conn);

        let plant = sample_plant(1_000);
        let id = repo.create_plant(&plant).expect("create");
        let loaded = repo.get_plant(id).expect("get").expect("present");
        assert_eq!(loaded, plant);
    }

    #[test]
    fn sqlite_update_changes_persisted_fields() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqlitePlantRepository::new(&conn);

        let mut plant = sample_plant(1_000);
        repo.create_plant(&plant).expect("create");

        plant.mark_watered(5_000);
        plant.tip_fr = Some("Arroser quand le sol est sec".to_string());
        repo.update_plant(&plant).expect("update");

        let loaded = repo.get_plant(plant.uuid).expect("get").expect("present");
        assert_eq!(loaded.last_watered_ms, 5_000);
        assert_eq!(
            loaded.tip_fr.as_deref(),
            Some("Arroser quand le sol est sec")
        );
    }

    #[test]
    fn sqlite_list_orders_by_creation_time() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqlitePlantRepository::new(&conn);

        let older = sample_plant(1_000);
        let newer = sample_plant(2_000);
        repo.create_plant(&newer).expect("create newer");
        repo.create_plant(&older).expect("create older");

        let listed = repo.list_plants().expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].uuid, older.uuid);
        assert_eq!(listed[1].uuid, newer.uuid);
    }

    #[test]
    fn sqlite_delete_missing_plant_is_not_found() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqlitePlantRepository::new(&conn);

        let missing = Uuid::new_v4();
        assert!(matches!(
            repo.delete_plant(missing),
            Err(RepoError::NotFound(id)) if id == missing
        ));
    }

    #[test]
    fn sqlite_rejects_invalid_records_before_sql() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let repo = SqlitePlantRepository::new(&conn);

        let mut plant = sample_plant(1_000);
        plant.watering_frequency_days = 0;
        assert!(matches!(
            repo.create_plant(&plant),
            Err(RepoError::Validation(_))
        ));
    }

    #[test]
    fn in_memory_repository_mirrors_sqlite_semantics() {
        let repo = InMemoryPlantRepository::new();
        let plant = sample_plant(1_000);
        repo.create_plant(&plant).expect("create");
        assert_eq!(repo.list_plants().expect("list").len(), 1);
        repo.delete_plant(plant.uuid).expect("delete");
        assert!(repo.get_plant(plant.uuid).expect("get").is_none());
    }
}
