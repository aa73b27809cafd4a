use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use thiserror::Error;

/// Recoverable failures hit while maintaining overlays and the depth pre-pass.
/// Systems log these and carry on with the next target.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectorError {
    #[error("mesh for entity {0} is not loaded")]
    MeshNotLoaded(Entity),

    #[error("mesh for entity {0} has no Float32x3 position attribute")]
    MissingPositions(Entity),

    #[error("mesh for entity {entity} uses {topology:?}, only triangle lists are rasterized")]
    UnsupportedTopology {
        entity: Entity,
        topology: PrimitiveTopology,
    },

    #[error("entity {0} has no Mesh3d and GlobalTransform to project onto")]
    TargetNotFound(Entity),
}
