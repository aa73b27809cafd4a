//! Shared defaults for the projector compositor workspace.

/// Default projector intrinsics and orientation.
pub mod projector;

/// Depth pre-pass surface, packing and render layer settings.
pub mod render_settings;

/// Procedural test card dimensions.
pub mod texture;
