//! Weather provider boundary, fallback data and snapshot cache.
//!
//! # Responsibility
//! - Define the external weather provider seam.
//! - Serve deterministic per-city fallback snapshots when the provider
//!   fails or none is wired.
//! - Cache snapshots per rounded coordinates and language.
//!
//! # Invariants
//! - A cached snapshot is reused for [`WEATHER_CACHE_TTL_MS`].
//! - Provider failures are never fatal; the fallback always answers.
//! - Fallback snapshots are deterministic for the same coordinates.

use crate::locale::{Language, Localizer};
use crate::model::geo::{haversine_km, Coordinates};
use crate::model::weather::{CareLevel, WeatherSnapshot};
use log::warn;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Cached snapshots stay fresh for ten minutes.
pub const WEATHER_CACHE_TTL_MS: i64 = 10 * 60 * 1000;

/// Failure reported by an external weather provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherProviderError(pub String);

impl Display for WeatherProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "weather provider failure: {}", self.0)
    }
}

impl Error for WeatherProviderError {}

/// External weather source boundary.
pub trait WeatherProvider {
    fn fetch(
        &self,
        coordinates: Coordinates,
        language: Language,
        now_ms: i64,
    ) -> Result<WeatherSnapshot, WeatherProviderError>;
}

struct FallbackCity {
    latitude: f64,
    longitude: f64,
    name: &'static str,
    temperature_c: f64,
    humidity_pct: f64,
    wind_speed_kmh: f64,
    description_fr: &'static str,
    description_en: &'static str,
}

const FALLBACK_CITIES: &[FallbackCity] = &[
    FallbackCity {
        latitude: 45.4215,
        longitude: -75.6972,
        name: "Ottawa",
        temperature_c: 22.0,
        humidity_pct: 55.0,
        wind_speed_kmh: 12.0,
        description_fr: "Partiellement nuageux",
        description_en: "Partly cloudy",
    },
    FallbackCity {
        latitude: 45.5017,
        longitude: -73.5673,
        name: "Montréal",
        temperature_c: 21.0,
        humidity_pct: 60.0,
        wind_speed_kmh: 15.0,
        description_fr: "Ensoleillé",
        description_en: "Sunny",
    },
    FallbackCity {
        latitude: 43.6532,
        longitude: -79.3832,
        name: "Toronto",
        temperature_c: 23.0,
        humidity_pct: 50.0,
        wind_speed_kmh: 10.0,
        description_fr: "Ciel dégagé",
        description_en: "Clear sky",
    },
];

/// Offline provider serving fixed per-city snapshots.
///
/// Picks the closest known city so the displayed name stays plausible
/// anywhere in the supported region.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticWeatherProvider;

impl StaticWeatherProvider {
    fn snapshot(
        coordinates: Coordinates,
        language: Language,
        now_ms: i64,
    ) -> WeatherSnapshot {
        let city = FALLBACK_CITIES
            .iter()
            .min_by(|a, b| {
                let da = haversine_km(coordinates, city_coordinates(a));
                let db = haversine_km(coordinates, city_coordinates(b));
                da.total_cmp(&db)
            })
            .unwrap_or(&FALLBACK_CITIES[0]);

        let description = match language {
            Language::Fr => city.description_fr,
            Language::En => city.description_en,
        };

        WeatherSnapshot {
            temperature_c: city.temperature_c,
            humidity_pct: city.humidity_pct,
            description: description.to_string(),
            wind_speed_kmh: city.wind_speed_kmh,
            city: city.name.to_string(),
            country: "CA".to_string(),
            is_mock: true,
            timestamp_ms: now_ms,
        }
    }
}

impl WeatherProvider for StaticWeatherProvider {
    fn fetch(
        &self,
        coordinates: Coordinates,
        language: Language,
        now_ms: i64,
    ) -> Result<WeatherSnapshot, WeatherProviderError> {
        Ok(Self::snapshot(coordinates, language, now_ms))
    }
}

fn city_coordinates(city: &FallbackCity) -> Coordinates {
    Coordinates {
        latitude: city.latitude,
        longitude: city.longitude,
    }
}

type CacheKey = (i64, i64, Language);

/// Weather facade: provider with fallback, plus a TTL cache.
pub struct WeatherService<P: WeatherProvider> {
    provider: P,
    cache: HashMap<CacheKey, WeatherSnapshot>,
}

impl<P: WeatherProvider> WeatherService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: HashMap::new(),
        }
    }

    /// Current snapshot for the given coordinates and language.
    ///
    /// Serves from cache within the TTL; on provider failure falls back
    /// to the static table.
    pub fn current(
        &mut self,
        coordinates: Coordinates,
        language: Language,
        now_ms: i64,
    ) -> WeatherSnapshot {
        let key = cache_key(coordinates, language);
        if let Some(cached) = self.cache.get(&key) {
            if now_ms - cached.timestamp_ms < WEATHER_CACHE_TTL_MS {
                return cached.clone();
            }
        }

        let snapshot = match self.provider.fetch(coordinates, language, now_ms) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("event=weather_fetch module=weather status=error reason={err}");
                StaticWeatherProvider::snapshot(coordinates, language, now_ms)
            }
        };

        self.cache.insert(key, snapshot.clone());
        snapshot
    }
}

impl Default for WeatherService<StaticWeatherProvider> {
    fn default() -> Self {
        Self::new(StaticWeatherProvider)
    }
}

// Two decimals ≈ 1.1 km grid, enough to share a snapshot across a
// neighborhood without leaking precise positions into the cache key.
fn cache_key(coordinates: Coordinates, language: Language) -> CacheKey {
    (
        (coordinates.latitude * 100.0).round() as i64,
        (coordinates.longitude * 100.0).round() as i64,
        language,
    )
}

/// Localized advice text for a derived care level.
pub fn advice_message(localizer: &Localizer, language: Language, level: CareLevel) -> String {
    let key = match level {
        CareLevel::High => "care-advice-high",
        CareLevel::Low => "care-advice-low",
        CareLevel::Medium => "care-advice-medium",
        CareLevel::Perfect => "care-advice-perfect",
        CareLevel::Normal => "care-advice-normal",
    };
    localizer.text(language, key)
}
