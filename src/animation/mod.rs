//! Easing curves and phase windows.

/// Easing curves selectable from configs.
pub mod ease;
/// Mapping the global timeline onto a module's window.
pub mod phase;
