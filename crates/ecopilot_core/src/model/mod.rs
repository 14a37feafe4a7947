//! Domain model for the plant-care companion core.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep pure derivations (distance, watering need, weather advice) next to
//!   the data they are computed from.
//!
//! # Invariants
//! - Every stored domain object is identified by a stable UUID.
//! - Timestamps are epoch milliseconds (`i64`) throughout.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod geo;
pub mod notification;
pub mod plant;
pub mod settings;
pub mod weather;
