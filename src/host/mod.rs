//! The headless stand-in for the browser: document, canvases and frame timing.

/// Animation-frame loops and the simulated frame driver.
pub mod frame;
/// Elements, canvas slots and resize listeners.
pub mod stage;
/// Owned canvases and their display lists.
pub mod surface;
