//! Compositor lifecycle and the host-facing API.

/// `ProjectorCompositor` system parameter: add/remove/dispose and live setters.
pub mod compositor;

/// System sets, lifecycle state, owned resources and startup.
pub mod lifecycle;
