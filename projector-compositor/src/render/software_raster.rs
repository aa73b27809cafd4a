use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};

use super::depth_target::{pack_depth, unpack_depth};
use crate::error::ProjectorError;

/// Triangle in screen space: pixel x/y (row 0 at the top) and NDC depth.
type ScreenTriangle = [Vec3; 3];

/// Smallest clip-space `w` kept by clipping.
const MIN_CLIP_W: f32 = 1e-5;

/// Rasterizes a triangle-list mesh into a packed depth image, keeping the
/// nearest depth per texel. `clip_from_local` is `projector_matrix * model`.
///
/// Triangles are clipped in clip space against `w > 0` and the near plane
/// (`z >= 0`) before the perspective divide, so geometry crossing the
/// projector plane still writes depth for its visible part. Coverage is
/// tested at pixel centres with no face culling, and fragments past the far
/// plane are dropped. Returns the number of source triangles that survived
/// clipping.
pub fn rasterize_mesh(
    image: &mut Image,
    clip_from_local: Mat4,
    mesh: &Mesh,
    entity: Entity,
) -> Result<usize, ProjectorError> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return Err(ProjectorError::UnsupportedTopology {
            entity,
            topology: mesh.primitive_topology(),
        });
    }

    let Some(VertexAttributeValues::Float32x3(positions)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION)
    else {
        return Err(ProjectorError::MissingPositions(entity));
    };

    let indices: Vec<usize> = match mesh.indices() {
        Some(Indices::U16(values)) => values.iter().map(|&i| i as usize).collect(),
        Some(Indices::U32(values)) => values.iter().map(|&i| i as usize).collect(),
        None => (0..positions.len()).collect(),
    };

    let size = image.size();
    let Some(data) = image.data.as_mut() else {
        return Ok(0);
    };
    let Ok(texels) = bytemuck::try_cast_slice_mut::<u8, [u8; 4]>(data.as_mut_slice()) else {
        return Ok(0);
    };

    let mut drawn = 0;
    for triangle in indices.chunks_exact(3) {
        let Some(corners) = triangle
            .iter()
            .map(|&i| positions.get(i).map(|p| Vec3::from_array(*p)))
            .collect::<Option<Vec<_>>>()
        else {
            continue;
        };

        let clip: Vec<Vec4> = corners
            .iter()
            .map(|corner| clip_from_local * corner.extend(1.0))
            .collect();
        let polygon = clip_polygon(clip_polygon(clip, |v| v.w - MIN_CLIP_W), |v| v.z);
        if polygon.len() < 3 {
            continue;
        }

        let screen: Vec<Vec3> = polygon.iter().map(|&v| to_screen(v, size)).collect();
        for i in 1..screen.len() - 1 {
            fill_triangle(texels, size, [screen[0], screen[i], screen[i + 1]]);
        }
        drawn += 1;
    }

    Ok(drawn)
}

/// Sutherland-Hodgman against a single plane, keeping vertices where
/// `distance(v) >= 0`. The result is convex and may be empty.
fn clip_polygon(polygon: Vec<Vec4>, distance: impl Fn(Vec4) -> f32) -> Vec<Vec4> {
    let mut clipped = Vec::with_capacity(polygon.len() + 1);
    for (i, &current) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let (d_current, d_next) = (distance(current), distance(next));
        if d_current >= 0.0 {
            clipped.push(current);
        }
        if (d_current >= 0.0) != (d_next >= 0.0) {
            clipped.push(current.lerp(next, d_current / (d_current - d_next)));
        }
    }
    clipped
}

/// Pixel x/y (row 0 at the top) and NDC depth of a clipped vertex.
fn to_screen(clip: Vec4, size: UVec2) -> Vec3 {
    let ndc = clip.truncate() / clip.w;
    let uv = ndc.truncate() * 0.5 + 0.5;
    let extent = size.as_vec2();
    Vec3::new(uv.x * extent.x, (1.0 - uv.y) * extent.y, ndc.z)
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn fill_triangle(texels: &mut [[u8; 4]], size: UVec2, [a, b, c]: ScreenTriangle) {
    let (a2, b2, c2) = (a.truncate(), b.truncate(), c.truncate());
    let area = edge(a2, b2, c2);
    if area == 0.0 || !area.is_finite() {
        return;
    }

    let extent = size.as_vec2();
    let min = a2.min(b2).min(c2).floor().max(Vec2::ZERO);
    let max = a2.max(b2).max(c2).ceil().min(extent);
    if min.x >= max.x || min.y >= max.y {
        return;
    }

    for y in min.y as u32..max.y as u32 {
        for x in min.x as u32..max.x as u32 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b2, c2, p) / area;
            let w1 = edge(c2, a2, p) / area;
            let w2 = edge(a2, b2, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            // NDC depth is affine in screen space, so linear weights are exact.
            // Clipping leaves z >= 0 up to rounding.
            let depth = (w0 * a.z + w1 * b.z + w2 * c.z).max(0.0);
            if depth > 1.0 {
                continue;
            }

            let texel = &mut texels[(y * size.x + x) as usize];
            if depth < unpack_depth(*texel) {
                *texel = pack_depth(depth);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::projector_camera::ProjectorState;
    use crate::render::composition::{project_point, texture_coord};
    use crate::render::depth_target::{create_depth_image, sample_depth};
    use bevy::asset::RenderAssetUsages;

    fn triangle_mesh(positions: Vec<[f32; 3]>) -> Mesh {
        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    }

    /// Covers the whole [-1,1] NDC square at constant depth when drawn with an identity matrix.
    fn fullscreen(depth: f32) -> Mesh {
        triangle_mesh(vec![[-1.0, -1.0, depth], [3.0, -1.0, depth], [-1.0, 3.0, depth]])
    }

    #[test]
    fn fullscreen_triangle_fills_every_texel() {
        let mut image = create_depth_image(8);
        let drawn = rasterize_mesh(&mut image, Mat4::IDENTITY, &fullscreen(0.5), Entity::PLACEHOLDER);
        assert_eq!(drawn, Ok(1));

        for uv in [Vec2::ZERO, Vec2::splat(0.5), Vec2::new(0.99, 0.01), Vec2::ONE] {
            assert!((sample_depth(&image, uv) - 0.5).abs() < 1e-6, "uv={uv}");
        }
    }

    #[test]
    fn nearest_depth_wins() {
        let mut image = create_depth_image(4);
        let id = Entity::PLACEHOLDER;
        rasterize_mesh(&mut image, Mat4::IDENTITY, &fullscreen(0.5), id).unwrap();
        rasterize_mesh(&mut image, Mat4::IDENTITY, &fullscreen(0.7), id).unwrap();
        assert!((sample_depth(&image, Vec2::splat(0.5)) - 0.5).abs() < 1e-6);

        rasterize_mesh(&mut image, Mat4::IDENTITY, &fullscreen(0.2), id).unwrap();
        assert!((sample_depth(&image, Vec2::splat(0.5)) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn upper_ndc_half_lands_in_first_rows() {
        let mut image = create_depth_image(8);
        // Quad over NDC y in [0,1], winding reversed on the second triangle.
        let mesh = triangle_mesh(vec![
            [-1.0, 0.0, 0.3],
            [1.0, 0.0, 0.3],
            [1.0, 1.0, 0.3],
            [-1.0, 0.0, 0.3],
            [-1.0, 1.0, 0.3],
            [1.0, 1.0, 0.3],
        ]);
        rasterize_mesh(&mut image, Mat4::IDENTITY, &mesh, Entity::PLACEHOLDER).unwrap();

        assert!(sample_depth(&image, Vec2::new(0.5, 0.1)) < 0.31);
        assert_eq!(sample_depth(&image, Vec2::new(0.5, 0.9)), 1.0);
    }

    #[test]
    fn triangles_behind_the_projector_are_skipped() {
        let mut image = create_depth_image(4);
        let flip_w = Mat4::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::new(0.0, 0.0, 0.0, -1.0));
        let drawn = rasterize_mesh(&mut image, flip_w, &fullscreen(0.5), Entity::PLACEHOLDER);
        assert_eq!(drawn, Ok(0));
        assert_eq!(sample_depth(&image, Vec2::splat(0.5)), 1.0);
    }

    #[test]
    fn triangles_crossing_the_projector_plane_are_clipped() {
        let mut image = create_depth_image(64);
        let projector_matrix = ProjectorState::default().projector_matrix();
        // Ground below a projector at the origin aiming +X, reaching behind it.
        let ground = triangle_mesh(vec![
            [-10.0, -1.0, -40.0],
            [-10.0, -1.0, 40.0],
            [40.0, -1.0, 0.0],
        ]);

        let drawn = rasterize_mesh(&mut image, projector_matrix, &ground, Entity::PLACEHOLDER);
        assert_eq!(drawn, Ok(1));

        for x in [5.0, 10.0, 20.0] {
            let (uv, expected) = project_point(projector_matrix, Vec3::new(x, -1.0, 0.0)).unwrap();
            let depth = sample_depth(&image, texture_coord(uv));
            assert!((depth - expected).abs() < 1e-2, "x={x} depth={depth} expected={expected}");
        }
        // Above the horizon nothing was drawn.
        assert_eq!(sample_depth(&image, Vec2::new(0.5, 0.1)), 1.0);
    }

    #[test]
    fn clipping_keeps_the_front_part_of_a_polygon() {
        let square = vec![
            Vec4::new(-1.0, -1.0, -0.5, 1.0),
            Vec4::new(1.0, -1.0, -0.5, 1.0),
            Vec4::new(1.0, 1.0, 0.5, 1.0),
            Vec4::new(-1.0, 1.0, 0.5, 1.0),
        ];
        let clipped = clip_polygon(square, |v| v.z);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|v| v.z >= 0.0));
        assert!(clipped.iter().any(|v| v.abs_diff_eq(Vec4::new(1.0, 0.0, 0.0, 1.0), 1e-6)));

        let behind = vec![Vec4::new(0.0, 0.0, -1.0, 1.0); 3];
        assert!(clip_polygon(behind, |v| v.z).is_empty());
    }

    #[test]
    fn indexed_meshes_are_supported() {
        let mut image = create_depth_image(4);
        let mesh = triangle_mesh(vec![[-1.0, -1.0, 0.4], [3.0, -1.0, 0.4], [-1.0, 3.0, 0.4]])
            .with_inserted_indices(Indices::U16(vec![2, 1, 0]));
        assert_eq!(rasterize_mesh(&mut image, Mat4::IDENTITY, &mesh, Entity::PLACEHOLDER), Ok(1));
        assert!((sample_depth(&image, Vec2::splat(0.5)) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn unreadable_meshes_are_reported() {
        let mut image = create_depth_image(4);
        let id = Entity::PLACEHOLDER;

        let lines = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
        assert!(matches!(
            rasterize_mesh(&mut image, Mat4::IDENTITY, &lines, id),
            Err(ProjectorError::UnsupportedTopology { .. })
        ));

        let empty = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        assert_eq!(
            rasterize_mesh(&mut image, Mat4::IDENTITY, &empty, id),
            Err(ProjectorError::MissingPositions(id))
        );
    }
}
