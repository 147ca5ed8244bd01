//! Running ceremonies: trigger, clock fan-out, signal routing and teardown.

/// The orchestrator and its run lifecycle.
pub mod ceremony;
/// Memory payloads by id.
pub mod content;
/// Typed registry of the effect modules.
pub mod modules;
/// Cork clicks on the vial shelf.
pub mod trigger;
/// Update order and signal edges between modules.
pub mod wiring;
