//! Depth pre-pass and overlay composition.
//!
//! The pre-pass renders every depth proxy from the projector into a packed
//! RGBA8 depth texture. Overlays then reproject the source image per fragment,
//! test against that texture and feather towards the frustum edges.

/// CPU reference of the overlay fragment and the composition uniforms.
pub mod composition;

/// Per-frame pre-pass system for both back-ends.
pub mod depth_prepass;

/// Packed depth surface plus packing and sampling helpers.
pub mod depth_target;

/// Overlay and depth proxy materials and the uniform publishing system.
pub mod materials;

/// CPU triangle rasterizer used by the software back-end.
pub mod software_raster;

/// Source image loading and the generated test card.
pub mod source_texture;
