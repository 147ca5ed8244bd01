//! Option overrides and scene documents.

/// Deep merge of JSON overrides onto typed defaults.
pub mod merge;
/// The whole-scene document.
pub mod scene;
