//! Bookkeeping for projection targets.

/// Target → overlay/proxy map plus the systems keeping it in step with the scene.
pub mod target_registry;

/// Marker-driven registration and stale target tracking.
pub mod target_systems;
