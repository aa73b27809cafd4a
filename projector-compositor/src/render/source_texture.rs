use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use constants::texture::{TEST_CARD_BORDER, TEST_CARD_CELLS, TEST_CARD_SIZE};

const CELL_LIGHT: [u8; 3] = [235, 140, 40];
const CELL_DARK: [u8; 3] = [30, 120, 190];
const BORDER: [u8; 3] = [255, 255, 255];

/// Alpha at the bottom row of the test card; the top row is opaque.
const MIN_ALPHA: u8 = 96;

/// Picks the image to project: `path` through the asset server when given,
/// otherwise a generated test card.
pub fn load_source_texture(
    path: Option<&str>,
    asset_server: Option<&AssetServer>,
    images: &mut Assets<Image>,
) -> Handle<Image> {
    match (path, asset_server) {
        (Some(path), Some(server)) => {
            debug!("Loading projector source image {}", path);
            server.load(path.to_owned())
        }
        (Some(path), None) => {
            warn!("No asset server to load {}, using the test card", path);
            images.add(test_card())
        }
        (None, _) => images.add(test_card()),
    }
}

/// Checkerboard with a white border and a vertical alpha ramp, so orientation,
/// edge feathering and premultiplication are all visible at a glance.
pub fn test_card() -> Image {
    let size = TEST_CARD_SIZE;
    let cell = (size / TEST_CARD_CELLS).max(1);
    let mut data = Vec::with_capacity((size * size * 4) as usize);

    for y in 0..size {
        let alpha = 255 - ((255 - MIN_ALPHA as u32) * y / (size - 1).max(1)) as u8;
        for x in 0..size {
            let on_border = x < TEST_CARD_BORDER
                || y < TEST_CARD_BORDER
                || x >= size - TEST_CARD_BORDER
                || y >= size - TEST_CARD_BORDER;
            let rgb = if on_border {
                BORDER
            } else if (x / cell + y / cell) % 2 == 0 {
                CELL_LIGHT
            } else {
                CELL_DARK
            };
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], alpha]);
        }
    }

    Image::new(
        Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_layout() {
        let card = test_card();
        assert_eq!(card.size(), UVec2::splat(TEST_CARD_SIZE));

        let corner = card.get_color_at(0, 0).unwrap().to_srgba();
        assert_eq!((corner.red, corner.green, corner.blue, corner.alpha), (1.0, 1.0, 1.0, 1.0));

        let last = TEST_CARD_SIZE - 1;
        let bottom = card.get_color_at(last / 2, last).unwrap().to_srgba();
        assert_eq!((bottom.alpha * 255.0).round() as u8, MIN_ALPHA);

        let inner = TEST_CARD_BORDER + 1;
        let cell = TEST_CARD_SIZE / TEST_CARD_CELLS;
        let a = card.get_color_at(inner, inner).unwrap().to_srgba();
        let b = card.get_color_at(inner + cell, inner).unwrap().to_srgba();
        assert_ne!(a.red, b.red);
    }

    #[test]
    fn missing_asset_server_falls_back_to_test_card() {
        let mut images = Assets::<Image>::default();
        let handle = load_source_texture(Some("textures/missing.png"), None, &mut images);
        assert_eq!(images.get(&handle).map(Image::size), Some(UVec2::splat(TEST_CARD_SIZE)));
    }
}
