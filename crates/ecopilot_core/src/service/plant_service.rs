//! Plant use-case service.
//!
//! # Responsibility
//! - Provide create/update/get/list/delete/water operations.
//! - Derive watering status at read time, optionally scaled by weather.
//! - Attach localized user-facing outcome messages.
//!
//! # Invariants
//! - Listing is sorted by creation time, oldest first.
//! - `days_since_watered`/`needs_water` are recomputed on every read and
//!   never persisted.

use crate::locale::{Language, Localizer};
use crate::model::plant::{Plant, PlantId};
use crate::repo::plant_repo::PlantRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for plant use-cases.
#[derive(Debug)]
pub enum PlantServiceError {
    /// Target plant does not exist.
    PlantNotFound(PlantId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for PlantServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlantNotFound(id) => write!(f, "plant not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PlantServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::PlantNotFound(_) => None,
        }
    }
}

impl From<RepoError> for PlantServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::PlantNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl PlantServiceError {
    /// Localized user-facing message for this failure.
    pub fn localized_message(&self, localizer: &Localizer, language: Language) -> String {
        match self {
            Self::PlantNotFound(_) => localizer.text(language, "plant-not-found"),
            Self::Repo(err) => err.to_string(),
        }
    }
}

/// One plant with its derived watering status, as the UI displays it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantStatus {
    pub plant: Plant,
    pub days_since_watered: i64,
    pub needs_water: bool,
    /// Display fields resolved for the requested language.
    pub display_name: String,
    pub display_location: String,
    pub tip: Option<String>,
}

/// Outcome envelope carrying the localized confirmation message.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantOutcome {
    pub plant: Plant,
    pub message: String,
}

/// Plant service facade over repository implementations.
pub struct PlantService<R: PlantRepository> {
    repo: R,
}

impl<R: PlantRepository> PlantService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one plant and returns it with a localized confirmation.
    pub fn add_plant(
        &self,
        plant: Plant,
        localizer: &Localizer,
        language: Language,
    ) -> Result<PlantOutcome, PlantServiceError> {
        self.repo.create_plant(&plant)?;
        info!("event=plant_created module=plant status=ok");
        Ok(PlantOutcome {
            plant,
            message: localizer.text(language, "plant-added"),
        })
    }

    /// Replaces a full plant record.
    pub fn update_plant(
        &self,
        plant: Plant,
        localizer: &Localizer,
        language: Language,
    ) -> Result<PlantOutcome, PlantServiceError> {
        self.repo.update_plant(&plant)?;
        Ok(PlantOutcome {
            plant,
            message: localizer.text(language, "plant-updated"),
        })
    }

    pub fn get_plant(&self, id: PlantId) -> Result<Option<Plant>, PlantServiceError> {
        Ok(self.repo.get_plant(id)?)
    }

    /// Lists all plants with derived watering status.
    ///
    /// `watering_multiplier` comes from current weather advice; pass 1.0
    /// when no snapshot is available.
    pub fn list_plants(
        &self,
        now_ms: i64,
        watering_multiplier: f64,
        language: Language,
    ) -> Result<Vec<PlantStatus>, PlantServiceError> {
        let plants = self.repo.list_plants()?;
        Ok(plants
            .into_iter()
            .map(|plant| status_for(plant, now_ms, watering_multiplier, language))
            .collect())
    }

    /// Plants currently due for water.
    pub fn plants_needing_water(
        &self,
        now_ms: i64,
        watering_multiplier: f64,
    ) -> Result<Vec<Plant>, PlantServiceError> {
        let plants = self.repo.list_plants()?;
        Ok(plants
            .into_iter()
            .filter(|plant| plant.needs_water_given(now_ms, watering_multiplier))
            .collect())
    }

    /// Marks one plant watered now.
    pub fn water_plant(
        &self,
        id: PlantId,
        now_ms: i64,
        localizer: &Localizer,
        language: Language,
    ) -> Result<PlantOutcome, PlantServiceError> {
        let mut plant = self
            .repo
            .get_plant(id)?
            .ok_or(PlantServiceError::PlantNotFound(id))?;
        plant.mark_watered(now_ms);
        self.repo.update_plant(&plant)?;
        info!("event=plant_watered module=plant status=ok");
        Ok(PlantOutcome {
            plant,
            message: localizer.text(language, "plant-watered"),
        })
    }

    /// Deletes one plant and returns the localized confirmation.
    pub fn delete_plant(
        &self,
        id: PlantId,
        localizer: &Localizer,
        language: Language,
    ) -> Result<String, PlantServiceError> {
        self.repo.delete_plant(id)?;
        info!("event=plant_deleted module=plant status=ok");
        Ok(localizer.text(language, "plant-deleted"))
    }
}

fn status_for(
    plant: Plant,
    now_ms: i64,
    watering_multiplier: f64,
    language: Language,
) -> PlantStatus {
    PlantStatus {
        days_since_watered: plant.days_since_watered(now_ms),
        needs_water: plant.needs_water_given(now_ms, watering_multiplier),
        display_name: plant.display_name(language).to_string(),
        display_location: plant.display_location(language).to_string(),
        tip: plant.current_tip(language).map(str::to_string),
        plant,
    }
}

#[cfg(test)]
mod tests {
    use super::{PlantService, PlantServiceError};
    use crate::db::open_db_in_memory;
    use crate::locale::{Language, Localizer};
    use crate::model::plant::Plant;
    use crate::repo::plant_repo::SqlitePlantRepository;
    use uuid::Uuid;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    #[test]
    fn add_water_and_delete_carry_localized_messages() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = PlantService::new(SqlitePlantRepository::new(&conn));
        let localizer = Localizer::new().unwrap();

        let plant = Plant::new("Ficus", "Ficus elastica", "Bureau", 7, 0);
        let id = plant.uuid;

        let added = service
            .add_plant(plant, &localizer, Language::Fr)
            .expect("add");
        assert!(added.message.contains("ajoutée"));

        let watered = service
            .water_plant(id, 3 * DAY_MS, &localizer, Language::En)
            .expect("water");
        assert!(watered.message.contains("watered"));
        assert_eq!(watered.plant.last_watered_ms, 3 * DAY_MS);

        let farewell = service
            .delete_plant(id, &localizer, Language::En)
            .expect("delete");
        assert!(farewell.contains("deleted"));
    }

    #[test]
    fn watering_a_missing_plant_is_plant_not_found() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = PlantService::new(SqlitePlantRepository::new(&conn));
        let localizer = Localizer::new().unwrap();

        let missing = Uuid::new_v4();
        let err = service
            .water_plant(missing, 0, &localizer, Language::Fr)
            .expect_err("should fail");
        assert!(matches!(err, PlantServiceError::PlantNotFound(id) if id == missing));
        assert_eq!(
            err.localized_message(&localizer, Language::Fr),
            "Plante non trouvée"
        );
    }

    #[test]
    fn list_derives_watering_status_per_plant() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = PlantService::new(SqlitePlantRepository::new(&conn));
        let localizer = Localizer::new().unwrap();

        let thirsty = Plant::new("Monstera", "Monstera deliciosa", "Salon", 5, 0);
        let fine = Plant::new("Pothos", "Epipremnum aureum", "Cuisine", 10, 0);
        service
            .add_plant(thirsty, &localizer, Language::Fr)
            .expect("add thirsty");
        service
            .add_plant(fine, &localizer, Language::Fr)
            .expect("add fine");

        let statuses = service
            .list_plants(6 * DAY_MS, 1.0, Language::Fr)
            .expect("list");
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].needs_water);
        assert!(!statuses[1].needs_water);
        assert_eq!(statuses[0].days_since_watered, 6);
    }

    #[test]
    fn hot_weather_multiplier_flags_more_plants() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = PlantService::new(SqlitePlantRepository::new(&conn));
        let localizer = Localizer::new().unwrap();

        let plant = Plant::new("Philodendron", "Philodendron hederaceum", "Chambre", 7, 0);
        service
            .add_plant(plant, &localizer, Language::Fr)
            .expect("add");

        // 7 / 1.3 ~= 5.4 effective days.
        assert!(service
            .plants_needing_water(6 * DAY_MS, 1.3)
            .expect("list")
            .first()
            .is_some());
        assert!(service
            .plants_needing_water(6 * DAY_MS, 1.0)
            .expect("list")
            .is_empty());
    }
}
