//! Headless export of effect canvases.

/// CPU rasterizer for surfaces and the water shader.
pub mod cpu;
