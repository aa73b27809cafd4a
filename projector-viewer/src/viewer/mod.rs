//! Interactive demo of the projector compositor.
//!
//! Builds a small scene, registers every mesh as a projection target and maps
//! the keyboard onto the compositor's live setters.

/// App construction, plugin configuration and system scheduling.
pub mod app_setup;

/// Keyboard controls and the on-screen status text.
pub mod controls;

/// JSON projector preset asset, applied on load and on hot reload.
pub mod preset;

/// Ground, boxes, sphere, main camera and light.
pub mod scene;

/// Platform-specific window configuration for native and WASM builds.
pub mod window_config;
