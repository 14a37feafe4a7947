//! Species care guidance provider and local database.
//!
//! # Responsibility
//! - Define the external care-advice seam.
//! - Serve the built-in bilingual care database keyed by species keyword.
//! - Cache guide lookups per normalized species name.
//!
//! # Invariants
//! - Lookup is case-insensitive substring matching on known keywords.
//! - Unknown species fall back to the generic guide, never to an error.
//! - A cached guide is reused for [`CARE_CACHE_TTL_MS`].

use crate::locale::Language;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Cached guides stay fresh for thirty minutes.
pub const CARE_CACHE_TTL_MS: i64 = 30 * 60 * 1000;

/// Failure reported by an external care-advice provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareProviderError(pub String);

impl Display for CareProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "care provider failure: {}", self.0)
    }
}

impl Error for CareProviderError {}

/// Bilingual care guidance for one species family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareGuide {
    pub watering_fr: &'static str,
    pub watering_en: &'static str,
    pub light_fr: &'static str,
    pub light_en: &'static str,
    pub humidity_fr: &'static str,
    pub humidity_en: &'static str,
    pub temperature_fr: &'static str,
    pub temperature_en: &'static str,
    pub winter_note_fr: &'static str,
    pub winter_note_en: &'static str,
}

/// One localized view over a [`CareGuide`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedCareGuide {
    pub watering: String,
    pub light: String,
    pub humidity: String,
    pub temperature: String,
    pub winter_note: String,
}

impl CareGuide {
    pub fn localized(&self, language: Language) -> LocalizedCareGuide {
        match language {
            Language::Fr => LocalizedCareGuide {
                watering: self.watering_fr.to_string(),
                light: self.light_fr.to_string(),
                humidity: self.humidity_fr.to_string(),
                temperature: self.temperature_fr.to_string(),
                winter_note: self.winter_note_fr.to_string(),
            },
            Language::En => LocalizedCareGuide {
                watering: self.watering_en.to_string(),
                light: self.light_en.to_string(),
                humidity: self.humidity_en.to_string(),
                temperature: self.temperature_en.to_string(),
                winter_note: self.winter_note_en.to_string(),
            },
        }
    }
}

/// External care-advice source boundary.
pub trait CareAdviceProvider {
    fn guide_for(&self, species: &str) -> Result<CareGuide, CareProviderError>;
}

const GENERIC_GUIDE: CareGuide = CareGuide {
    watering_fr: "Arroser quand les 2-3 premiers centimètres de terre sont secs",
    watering_en: "Water when the top 2-3 cm of soil feel dry",
    light_fr: "Lumière indirecte moyenne à vive",
    light_en: "Medium to bright indirect light",
    humidity_fr: "Humidité ambiante normale (40-60%)",
    humidity_en: "Normal ambient humidity (40-60%)",
    temperature_fr: "18-24°C, éviter les courants d'air froids",
    temperature_en: "18-24°C, avoid cold drafts",
    winter_note_fr: "Réduire l'arrosage en hiver",
    winter_note_en: "Reduce watering in winter",
};

const KNOWN_GUIDES: &[(&[&str], CareGuide)] = &[
    (
        &["monstera"],
        CareGuide {
            watering_fr: "Arroser tous les 7-10 jours, laisser sécher entre deux arrosages",
            watering_en: "Water every 7-10 days, let the soil dry between waterings",
            light_fr: "Lumière indirecte vive, pas de soleil direct",
            light_en: "Bright indirect light, no direct sun",
            humidity_fr: "Humidité élevée (60% et plus), brumiser régulièrement",
            humidity_en: "High humidity (60%+), mist regularly",
            temperature_fr: "18-27°C toute l'année",
            temperature_en: "18-27°C year round",
            winter_note_fr: "Espacer les arrosages à 10-14 jours en hiver",
            winter_note_en: "Stretch waterings to 10-14 days in winter",
        },
    ),
    (
        &["pothos", "epipremnum"],
        CareGuide {
            watering_fr: "Arroser tous les 10-14 jours, très tolérant à l'oubli",
            watering_en: "Water every 10-14 days, very forgiving if you forget",
            light_fr: "Tolère la faible lumière, préfère la lumière indirecte",
            light_en: "Tolerates low light, prefers indirect light",
            humidity_fr: "Humidité normale, aucun soin particulier",
            humidity_en: "Normal humidity, no special care",
            temperature_fr: "15-29°C",
            temperature_en: "15-29°C",
            winter_note_fr: "Réduire l'arrosage de moitié en hiver",
            winter_note_en: "Halve the watering in winter",
        },
    ),
    (
        &["sansevieria", "snake"],
        CareGuide {
            watering_fr: "Arroser toutes les 2-4 semaines, redoute l'excès d'eau",
            watering_en: "Water every 2-4 weeks, hates overwatering",
            light_fr: "De l'ombre au plein soleil, très adaptable",
            light_en: "From shade to full sun, very adaptable",
            humidity_fr: "Préfère l'air sec",
            humidity_en: "Prefers dry air",
            temperature_fr: "15-29°C, craint le gel",
            temperature_en: "15-29°C, frost-sensitive",
            winter_note_fr: "Un arrosage par mois suffit en hiver",
            winter_note_en: "Once a month is enough in winter",
        },
    ),
    (
        &["ficus"],
        CareGuide {
            watering_fr: "Arroser quand la surface est sèche, environ chaque semaine",
            watering_en: "Water when the surface is dry, roughly weekly",
            light_fr: "Lumière vive, quelques heures de soleil doux tolérées",
            light_en: "Bright light, a few hours of gentle sun are fine",
            humidity_fr: "Humidité moyenne, brumiser en air sec",
            humidity_en: "Medium humidity, mist in dry air",
            temperature_fr: "16-24°C, déteste les déplacements",
            temperature_en: "16-24°C, dislikes being moved",
            winter_note_fr: "Garder loin des radiateurs en hiver",
            winter_note_en: "Keep away from radiators in winter",
        },
    ),
    (
        &["philodendron"],
        CareGuide {
            watering_fr: "Arroser tous les 7-9 jours, terre légèrement humide",
            watering_en: "Water every 7-9 days, keep the soil slightly moist",
            light_fr: "Lumière indirecte moyenne à vive",
            light_en: "Medium to bright indirect light",
            humidity_fr: "Apprécie une humidité au-dessus de 50%",
            humidity_en: "Appreciates humidity above 50%",
            temperature_fr: "18-27°C",
            temperature_en: "18-27°C",
            winter_note_fr: "Espacer les arrosages en hiver",
            winter_note_en: "Space out waterings in winter",
        },
    ),
];

/// Built-in care database: keyword lookup with a generic fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalCareDatabase;

impl LocalCareDatabase {
    fn lookup(species: &str) -> CareGuide {
        let normalized = normalize_species(species);
        for (keywords, guide) in KNOWN_GUIDES {
            if keywords.iter().any(|keyword| normalized.contains(keyword)) {
                return guide.clone();
            }
        }
        GENERIC_GUIDE
    }
}

impl CareAdviceProvider for LocalCareDatabase {
    fn guide_for(&self, species: &str) -> Result<CareGuide, CareProviderError> {
        Ok(Self::lookup(species))
    }
}

fn normalize_species(species: &str) -> String {
    species.trim().to_lowercase()
}

struct CachedGuide {
    guide: CareGuide,
    fetched_at_ms: i64,
}

/// Care facade: provider with local fallback, plus a TTL cache.
pub struct CareService<P: CareAdviceProvider> {
    provider: P,
    cache: HashMap<String, CachedGuide>,
}

impl<P: CareAdviceProvider> CareService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: HashMap::new(),
        }
    }

    /// Care guide for a species, localized for display.
    pub fn guide(
        &mut self,
        species: &str,
        language: Language,
        now_ms: i64,
    ) -> LocalizedCareGuide {
        let key = normalize_species(species);
        if let Some(cached) = self.cache.get(&key) {
            if now_ms - cached.fetched_at_ms < CARE_CACHE_TTL_MS {
                return cached.guide.localized(language);
            }
        }

        let guide = match self.provider.guide_for(species) {
            Ok(guide) => guide,
            Err(err) => {
                warn!("event=care_fetch module=care status=error reason={err}");
                LocalCareDatabase::lookup(species)
            }
        };

        let localized = guide.localized(language);
        self.cache.insert(
            key,
            CachedGuide {
                guide,
                fetched_at_ms: now_ms,
            },
        );
        localized
    }
}

impl Default for CareService<LocalCareDatabase> {
    fn default() -> Self {
        Self::new(LocalCareDatabase)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CareAdviceProvider, CareGuide, CareProviderError, CareService, LocalCareDatabase,
        CARE_CACHE_TTL_MS, GENERIC_GUIDE,
    };
    use crate::locale::Language;
    use std::cell::Cell;

    #[test]
    fn keyword_lookup_is_case_insensitive_substring() {
        let db = LocalCareDatabase;
        let guide = db.guide_for("Monstera Deliciosa").expect("lookup");
        assert!(guide.watering_en.contains("7-10 days"));

        let snake = db.guide_for("SNAKE plant").expect("lookup");
        assert!(snake.humidity_en.contains("dry air"));
    }

    #[test]
    fn unknown_species_gets_the_generic_guide() {
        let db = LocalCareDatabase;
        let guide = db.guide_for("Calathea orbifolia").expect("lookup");
        assert_eq!(guide, GENERIC_GUIDE);
    }

    #[test]
    fn localization_picks_the_requested_language() {
        let db = LocalCareDatabase;
        let guide = db.guide_for("pothos").expect("lookup");
        assert!(guide.localized(Language::Fr).watering.contains("10-14 jours"));
        assert!(guide.localized(Language::En).watering.contains("10-14 days"));
    }

    struct CountingProvider<'a> {
        calls: &'a Cell<u32>,
    }

    impl CareAdviceProvider for CountingProvider<'_> {
        fn guide_for(&self, _species: &str) -> Result<CareGuide, CareProviderError> {
            self.calls.set(self.calls.get() + 1);
            Ok(GENERIC_GUIDE)
        }
    }

    #[test]
    fn cache_suppresses_repeat_lookups_within_the_ttl() {
        let calls = Cell::new(0);
        let mut service = CareService::new(CountingProvider { calls: &calls });

        service.guide("ficus", Language::Fr, 0);
        service.guide("Ficus ", Language::En, 1_000);
        assert_eq!(calls.get(), 1);

        service.guide("ficus", Language::Fr, CARE_CACHE_TTL_MS);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn provider_failure_falls_back_to_the_local_database() {
        struct FailingProvider;
        impl CareAdviceProvider for FailingProvider {
            fn guide_for(&self, _species: &str) -> Result<CareGuide, CareProviderError> {
                Err(CareProviderError("offline".to_string()))
            }
        }

        let mut service = CareService::new(FailingProvider);
        let guide = service.guide("monstera", Language::En, 0);
        assert!(guide.watering.contains("7-10 days"));
    }
}
