//! Plant domain model.
//!
//! # Responsibility
//! - Define the canonical bilingual houseplant record.
//! - Derive watering state (`days_since_watered`, `needs_water`) from it.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another plant.
//! - `watering_frequency_days >= 1`.
//! - Display names are non-blank in at least one language.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::locale::Language;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a tracked plant.
pub type PlantId = Uuid;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Validation error for plant records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlantValidationError {
    /// Both language names are blank after trim.
    BlankName,
    /// Watering frequency must be at least one day.
    ZeroWateringFrequency,
}

impl Display for PlantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "plant name cannot be blank"),
            Self::ZeroWateringFrequency => {
                write!(f, "watering frequency must be at least 1 day")
            }
        }
    }
}

impl Error for PlantValidationError {}

/// Canonical record for one tracked houseplant.
///
/// Names, locations and care tips are stored per language so the UI can
/// switch locale without re-fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    /// Stable global ID used for linking and notification subjects.
    pub uuid: PlantId,
    pub name_fr: String,
    pub name_en: String,
    /// Botanical species name, shared across languages.
    pub species: String,
    pub location_fr: String,
    pub location_en: String,
    /// Last watering time, epoch milliseconds.
    pub last_watered_ms: i64,
    /// Days between waterings under normal conditions.
    pub watering_frequency_days: u32,
    /// Creation time, epoch milliseconds.
    pub created_at_ms: i64,
    pub tip_fr: Option<String>,
    pub tip_en: Option<String>,
}

impl Plant {
    /// Creates a plant watered "now" with a generated stable ID.
    pub fn new(
        name: impl Into<String>,
        species: impl Into<String>,
        location: impl Into<String>,
        watering_frequency_days: u32,
        now_ms: i64,
    ) -> Self {
        let name = name.into();
        let location = location.into();
        Self {
            uuid: Uuid::new_v4(),
            name_fr: name.clone(),
            name_en: name,
            species: species.into(),
            location_fr: location.clone(),
            location_en: location,
            last_watered_ms: now_ms,
            watering_frequency_days,
            created_at_ms: now_ms,
            tip_fr: None,
            tip_en: None,
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), PlantValidationError> {
        if self.name_fr.trim().is_empty() && self.name_en.trim().is_empty() {
            return Err(PlantValidationError::BlankName);
        }
        if self.watering_frequency_days == 0 {
            return Err(PlantValidationError::ZeroWateringFrequency);
        }
        Ok(())
    }

    /// Whole days elapsed since the last watering.
    pub fn days_since_watered(&self, now_ms: i64) -> i64 {
        (now_ms - self.last_watered_ms).max(0) / MS_PER_DAY
    }

    /// Whether the plant is due for water under normal conditions.
    pub fn needs_water(&self, now_ms: i64) -> bool {
        self.needs_water_given(now_ms, 1.0)
    }

    /// Watering need scaled by a weather multiplier.
    ///
    /// A multiplier above 1.0 means more water is needed (hot, dry), so the
    /// effective frequency shrinks; below 1.0 stretches it.
    pub fn needs_water_given(&self, now_ms: i64, watering_multiplier: f64) -> bool {
        let multiplier = if watering_multiplier > 0.0 {
            watering_multiplier
        } else {
            1.0
        };
        let effective_days = f64::from(self.watering_frequency_days) / multiplier;
        self.days_since_watered(now_ms) as f64 >= effective_days
    }

    /// Marks the plant watered at the given time.
    pub fn mark_watered(&mut self, now_ms: i64) {
        self.last_watered_ms = now_ms;
    }

    /// Display name for the requested language, falling back to the other
    /// language when the requested one is blank.
    pub fn display_name(&self, language: Language) -> &str {
        pick_localized(language, &self.name_fr, &self.name_en)
    }

    /// Display location for the requested language.
    pub fn display_location(&self, language: Language) -> &str {
        pick_localized(language, &self.location_fr, &self.location_en)
    }

    /// Care tip for the requested language, falling back to the other
    /// language.
    pub fn current_tip(&self, language: Language) -> Option<&str> {
        let (preferred, fallback) = match language {
            Language::Fr => (&self.tip_fr, &self.tip_en),
            Language::En => (&self.tip_en, &self.tip_fr),
        };
        preferred.as_deref().or(fallback.as_deref())
    }
}

fn pick_localized<'a>(language: Language, fr: &'a str, en: &'a str) -> &'a str {
    let (preferred, fallback) = match language {
        Language::Fr => (fr, en),
        Language::En => (en, fr),
    };
    if preferred.trim().is_empty() {
        fallback
    } else {
        preferred
    }
}
