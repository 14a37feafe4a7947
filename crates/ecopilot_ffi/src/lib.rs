//! FFI surface of the EcoPilot companion core.
//! Exposes flutter_rust_bridge sync endpoints over `ecopilot_core`.

pub mod api;
