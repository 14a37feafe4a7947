//! Use-case orchestration services.
//!
//! # Responsibility
//! - Compose model computation, repositories and localization into the
//!   operations the UI layer calls.
//! - Keep provider boundaries (weather, care, notification sink) behind
//!   traits with local fallbacks.
//!
//! # Invariants
//! - Services own no global state; repositories are injected.
//! - Provider failures degrade to fallbacks or localized warnings, never
//!   to panics.
//!
//! # See also
//! - docs/architecture/location-tracking.md

pub mod backup_service;
pub mod care_service;
pub mod location_service;
pub mod notification_service;
pub mod plant_service;
pub mod weather_service;
