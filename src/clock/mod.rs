//! The ceremony timeline.

/// Monotonic 0→1 clock and its observer trait.
pub mod ceremony;
