//! Shared primitives: geometry, errors and numeric helpers.

/// Geometry, viewport and colour primitives.
pub mod core;
/// Error taxonomy and result alias.
pub mod error;
/// Clamping, interpolation and the seeded RNG.
pub mod math;
