//! sm-core: stable foundation for the synchronous motor simulator.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - units (uom SI types + constructors)
//! - conversions (phasor, angle, speed and power-factor helpers)
//! - params (motor parameter record and derived getters)
//! - error (shared error types)

pub mod conversions;
pub mod error;
pub mod numeric;
pub mod params;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use conversions::{Connection, PowerFactorKind};
pub use error::{CoreError, CoreResult};
pub use nalgebra::Complex;
pub use numeric::*;
pub use params::{EMF_CONSTANT_V_PER_A, MotorParameters};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
