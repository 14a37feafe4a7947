//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `ecopilot_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("ecopilot_core ping={}", ecopilot_core::ping());
    println!("ecopilot_core version={}", ecopilot_core::core_version());
}
