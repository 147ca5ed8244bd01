//! Sound cue hooks.

/// Threshold cues and the sink they call.
pub mod cues;
