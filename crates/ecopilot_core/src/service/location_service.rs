//! Zone classification and location tracking use-cases.
//!
//! # Responsibility
//! - Classify each sensor sample as inside or outside the home zone.
//! - Detect arrival/departure transitions against the persisted state.
//! - Establish the home reference from the first sample or user action.
//!
//! # Invariants
//! - With equal enter/exit radii the classifier reduces to
//!   `is_at_home == (distance <= radius)`.
//! - The exit radius is never smaller than the enter radius.
//! - Every observed sample lands in the bounded history window.
//!
//! # See also
//! - docs/architecture/location-tracking.md

use crate::locale::{Language, Localizer};
use crate::model::geo::{haversine_km, Coordinates, HomeReference, HomeSource, Position};
use crate::repo::location_repo::{HistoryEntry, LocationRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default hysteresis margin: the exit radius is 20% wider than the enter
/// radius, so small GPS jitter at the boundary cannot toggle the zone.
pub const DEFAULT_EXIT_MARGIN: f64 = 1.2;

/// Device location failures surfaced by the UI layer.
///
/// The sensor itself lives outside core; these variants exist so every
/// failure has one localized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    PermissionDenied,
    Unavailable,
    Timeout,
}

impl SensorError {
    /// User-facing message for this failure.
    pub fn localized_message(self, localizer: &Localizer, language: Language) -> String {
        let key = match self {
            Self::PermissionDenied => "geo-error-permission-denied",
            Self::Unavailable => "geo-error-unavailable",
            Self::Timeout => "geo-error-timeout",
        };
        localizer.text(language, key)
    }
}

/// Errors from location tracking operations.
#[derive(Debug)]
pub enum LocationServiceError {
    Repo(RepoError),
}

impl Display for LocationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LocationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for LocationServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Zone boundary crossing detected between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneTransition {
    /// Outside -> inside the home zone.
    Arrived,
    /// Inside -> outside the home zone.
    Departed,
}

/// Result of classifying one sensor sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneUpdate {
    pub home: HomeReference,
    pub distance_km: f64,
    pub is_at_home: bool,
    /// Set only when the sample crossed the zone boundary.
    pub transition: Option<ZoneTransition>,
}

/// Stateless inside/outside decision with optional hysteresis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneClassifier {
    enter_radius_km: f64,
    exit_radius_km: f64,
}

impl ZoneClassifier {
    /// Single-radius classifier: `is_at_home == (distance <= radius)`.
    pub fn with_radius(radius_km: f64) -> Self {
        Self {
            enter_radius_km: radius_km,
            exit_radius_km: radius_km,
        }
    }

    /// Dual-threshold classifier. The exit radius is raised to the enter
    /// radius when a smaller value is passed.
    pub fn with_hysteresis(enter_radius_km: f64, exit_radius_km: f64) -> Self {
        Self {
            enter_radius_km,
            exit_radius_km: exit_radius_km.max(enter_radius_km),
        }
    }

    /// Default tracker classifier for a configured radius.
    pub fn for_home_radius(radius_km: f64) -> Self {
        Self::with_hysteresis(radius_km, radius_km * DEFAULT_EXIT_MARGIN)
    }

    pub fn enter_radius_km(&self) -> f64 {
        self.enter_radius_km
    }

    pub fn exit_radius_km(&self) -> f64 {
        self.exit_radius_km
    }

    /// Classifies a distance given the previous zone state.
    ///
    /// Between the two radii the previous state sticks; that band is what
    /// damps boundary toggling.
    pub fn classify(&self, distance_km: f64, was_at_home: bool) -> bool {
        if distance_km <= self.enter_radius_km {
            true
        } else if distance_km > self.exit_radius_km {
            false
        } else {
            was_at_home
        }
    }
}

/// Location tracking facade over a [`LocationRepository`].
pub struct LocationService<R: LocationRepository> {
    repo: R,
    classifier: ZoneClassifier,
}

impl<R: LocationRepository> LocationService<R> {
    pub fn new(repo: R, classifier: ZoneClassifier) -> Self {
        Self { repo, classifier }
    }

    /// Processes one sensor sample.
    ///
    /// The first sample ever observed establishes an automatic home
    /// reference at its own coordinates, so it is always "at home" and
    /// never a transition.
    pub fn observe(&self, position: Position) -> Result<ZoneUpdate, LocationServiceError> {
        let (home, was_at_home) = match self.repo.load_home()? {
            Some(state) => state,
            None => {
                let home = HomeReference::new(
                    position.coordinates(),
                    HomeSource::Auto,
                    position.timestamp_ms,
                );
                self.repo.save_home(&home, true)?;
                info!(
                    "event=home_set module=location status=ok source=auto set_at_ms={}",
                    home.set_at_ms
                );
                (home, true)
            }
        };

        let distance_km = haversine_km(position.coordinates(), home.coordinates());
        let is_at_home = self.classifier.classify(distance_km, was_at_home);

        let transition = match (was_at_home, is_at_home) {
            (false, true) => Some(ZoneTransition::Arrived),
            (true, false) => Some(ZoneTransition::Departed),
            _ => None,
        };

        if transition.is_some() {
            self.repo.set_at_home(is_at_home)?;
            info!(
                "event=zone_transition module=location status=ok at_home={is_at_home} distance_km={distance_km:.4}"
            );
        }

        self.repo.append_history(&HistoryEntry {
            position,
            distance_km,
            is_at_home,
        })?;

        Ok(ZoneUpdate {
            home,
            distance_km,
            is_at_home,
            transition,
        })
    }

    /// Overwrites the home reference from a user action.
    ///
    /// The zone state restarts as "at home"; the next sample reclassifies
    /// against the new reference and may emit a departure.
    pub fn set_home(
        &self,
        coordinates: Coordinates,
        source: HomeSource,
        now_ms: i64,
    ) -> Result<HomeReference, LocationServiceError> {
        let home = HomeReference::new(coordinates, source, now_ms);
        self.repo.save_home(&home, true)?;
        info!(
            "event=home_set module=location status=ok source={:?} set_at_ms={now_ms}",
            source
        );
        Ok(home)
    }

    /// Current home reference and persisted zone state, if any.
    pub fn home(&self) -> Result<Option<(HomeReference, bool)>, LocationServiceError> {
        Ok(self.repo.load_home()?)
    }

    /// Recent samples, newest first.
    pub fn history(&self, limit: u32) -> Result<Vec<HistoryEntry>, LocationServiceError> {
        Ok(self.repo.list_history(limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{LocationService, ZoneClassifier, ZoneTransition};
    use crate::db::open_db_in_memory;
    use crate::model::geo::{Coordinates, HomeSource, Position};
    use crate::repo::location_repo::SqliteLocationRepository;

    const HOME_LAT: f64 = 45.4215;
    const HOME_LON: f64 = -75.6972;

    fn sample(latitude: f64, longitude: f64, timestamp_ms: i64) -> Position {
        Position::new(latitude, longitude, 10.0, timestamp_ms).expect("valid test position")
    }

    #[test]
    fn equal_radii_reduce_to_the_single_radius_rule() {
        let classifier = ZoneClassifier::with_radius(0.1);
        assert!(classifier.classify(0.0, false));
        assert!(classifier.classify(0.1, false));
        assert!(!classifier.classify(0.100_1, true));
        assert!(!classifier.classify(0.15, true));
    }

    #[test]
    fn hysteresis_band_keeps_the_previous_state() {
        let classifier = ZoneClassifier::with_hysteresis(0.1, 0.12);
        // Inside the band the previous state sticks.
        assert!(classifier.classify(0.11, true));
        assert!(!classifier.classify(0.11, false));
        // Outside the band both states agree.
        assert!(classifier.classify(0.09, false));
        assert!(!classifier.classify(0.13, true));
    }

    #[test]
    fn exit_radius_never_undercuts_enter_radius() {
        let classifier = ZoneClassifier::with_hysteresis(0.2, 0.1);
        assert_eq!(classifier.exit_radius_km(), 0.2);
    }

    #[test]
    fn first_sample_establishes_auto_home_without_transition() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = LocationService::new(
            SqliteLocationRepository::new(&conn),
            ZoneClassifier::for_home_radius(0.1),
        );

        let update = service
            .observe(sample(HOME_LAT, HOME_LON, 1_000))
            .expect("observe");
        assert_eq!(update.distance_km, 0.0);
        assert!(update.is_at_home);
        assert!(update.transition.is_none());
        assert_eq!(update.home.source, HomeSource::Auto);
    }

    #[test]
    fn leaving_the_zone_emits_a_departure_once() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = LocationService::new(
            SqliteLocationRepository::new(&conn),
            ZoneClassifier::for_home_radius(0.1),
        );

        service
            .observe(sample(HOME_LAT, HOME_LON, 1_000))
            .expect("home sample");

        // ~0.0015 degrees of latitude is roughly 170 m, past the 120 m
        // exit radius.
        let away = service
            .observe(sample(HOME_LAT + 0.0015, HOME_LON, 2_000))
            .expect("away sample");
        assert!(!away.is_at_home);
        assert_eq!(away.transition, Some(ZoneTransition::Departed));

        let still_away = service
            .observe(sample(HOME_LAT + 0.0016, HOME_LON, 3_000))
            .expect("second away sample");
        assert!(still_away.transition.is_none());
    }

    #[test]
    fn returning_emits_an_arrival() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = LocationService::new(
            SqliteLocationRepository::new(&conn),
            ZoneClassifier::for_home_radius(0.1),
        );

        service
            .observe(sample(HOME_LAT, HOME_LON, 1_000))
            .expect("home sample");
        service
            .observe(sample(HOME_LAT + 0.0015, HOME_LON, 2_000))
            .expect("away sample");

        let back = service
            .observe(sample(HOME_LAT, HOME_LON, 3_000))
            .expect("return sample");
        assert!(back.is_at_home);
        assert_eq!(back.transition, Some(ZoneTransition::Arrived));
    }

    #[test]
    fn jitter_inside_the_hysteresis_band_does_not_toggle() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = LocationService::new(
            SqliteLocationRepository::new(&conn),
            ZoneClassifier::for_home_radius(0.1),
        );

        service
            .observe(sample(HOME_LAT, HOME_LON, 1_000))
            .expect("home sample");

        // ~110 m: past the 100 m enter radius but inside the 120 m exit
        // radius, so the user stays "home".
        let jitter = service
            .observe(sample(HOME_LAT + 0.001, HOME_LON, 2_000))
            .expect("jitter sample");
        assert!(jitter.is_at_home);
        assert!(jitter.transition.is_none());
    }

    #[test]
    fn sensor_errors_localize_in_both_languages() {
        let localizer = crate::locale::Localizer::new().unwrap();
        assert_eq!(
            super::SensorError::PermissionDenied
                .localized_message(&localizer, crate::locale::Language::Fr),
            "Permission de géolocalisation refusée"
        );
        assert_eq!(
            super::SensorError::Timeout
                .localized_message(&localizer, crate::locale::Language::En),
            "Geolocation timeout"
        );
    }

    #[test]
    fn manual_home_overrides_the_auto_reference() {
        let conn = open_db_in_memory().expect("open in-memory db");
        let service = LocationService::new(
            SqliteLocationRepository::new(&conn),
            ZoneClassifier::for_home_radius(0.1),
        );

        service
            .observe(sample(HOME_LAT, HOME_LON, 1_000))
            .expect("auto home");

        let montreal = Coordinates::new(45.5017, -73.5673).expect("valid coords");
        service
            .set_home(montreal, HomeSource::Manual, 2_000)
            .expect("set manual home");

        let (home, _) = service.home().expect("load").expect("present");
        assert_eq!(home.source, HomeSource::Manual);

        // Still standing in Ottawa, so the next sample is a departure.
        let update = service
            .observe(sample(HOME_LAT, HOME_LON, 3_000))
            .expect("observe after move");
        assert!(!update.is_at_home);
        assert_eq!(update.transition, Some(super::ZoneTransition::Departed));
    }
}
