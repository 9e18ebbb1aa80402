// The three conversion phases, run strictly in order: palette, tileset, map.

use log::info;

use crate::{
    error::{Error, Result},
    image::Image,
    map::Map,
    palette::Palette,
    settings::Settings,
    tiles::Tileset,
};

pub struct Conversion {
    pub palette: Palette,
    pub tileset: Tileset,
    pub map: Map,
}

// Map size in tiles: explicit settings, otherwise the image size rounded up.
// The map area in pixels has to be addressable as a single image.
pub fn map_size(image: &Image, settings: &Settings) -> Result<(u32, u32)> {
    let width = match settings.map_width {
        0 => image.width().div_ceil(settings.tile_width),
        w => w,
    };
    let height = match settings.map_height {
        0 => image.height().div_ceil(settings.tile_height),
        h => h,
    };
    let too_large = Error::InvalidMapSize {
        width,
        height,
        reason: "map area is too large",
    };
    let pixel_width = width.checked_mul(settings.tile_width);
    let pixel_height = height.checked_mul(settings.tile_height);
    match (pixel_width, pixel_height) {
        (Some(w), Some(h)) if w.checked_mul(h).is_some() => Ok((width, height)),
        _ => Err(too_large),
    }
}

// Crop (or pad) the image to the map area and split it into blocks.
pub fn map_blocks(image: &Image, settings: &Settings) -> Result<(u32, u32, Vec<Image>)> {
    let (width, height) = map_size(image, settings)?;
    let area = image.crop(
        0,
        0,
        width * settings.tile_width,
        height * settings.tile_height,
    );
    Ok((width, height, area.crops(settings.tile_width, settings.tile_height)))
}

pub fn build_palette(
    blocks: &[Image],
    settings: &Settings,
    palette_count: usize,
    colors_per_palette: usize,
) -> Result<Palette> {
    info!(
        "Mapping optimized palette ({}x{} entries for {}x{} tiles)",
        palette_count, colors_per_palette, settings.tile_width, settings.tile_height
    );
    let mut palette = Palette::new(settings.mode, palette_count, colors_per_palette);
    let color_zero = settings
        .color_zero
        .or_else(|| blocks.first().and_then(|b| b.pixels().first().copied()));
    if let Some(c) = color_zero {
        info!("Setting color zero to {}", crate::color::to_hex(c));
        palette.add_color(c);
    }
    palette.add_blocks(blocks)?;
    palette.sort();
    info!("Generated palette with {}", palette.description());
    Ok(palette)
}

pub fn build_tileset(blocks: &[Image], palette: &Palette, settings: &Settings) -> Result<Tileset> {
    let mut tileset = Tileset::new(
        settings.mode,
        settings.bpp,
        settings.tile_width,
        settings.tile_height,
        settings.no_discard,
        settings.no_flip,
    );
    for block in blocks {
        tileset.add(block, palette)?;
    }
    if settings.no_discard {
        info!("Created tileset with {} tiles", tileset.len());
    } else {
        info!(
            "Created optimized tileset with {} tiles (discarded {} redundant tiles)",
            tileset.len(),
            tileset.discarded_tiles
        );
    }
    Ok(tileset)
}

pub fn build_map(
    blocks: &[Image],
    width: u32,
    height: u32,
    tileset: &Tileset,
    palette: &Palette,
    settings: &Settings,
) -> Result<Map> {
    info!(
        "Mapping {} ({}x{}) image slices",
        blocks.len(),
        settings.tile_width,
        settings.tile_height
    );
    let mut map = Map::new(settings.mode, width, height).with_priority(settings.priority);
    for (i, block) in blocks.iter().enumerate() {
        let i = i as u32;
        map.add(block, tileset, palette, settings.bpp, i % width, i / width)?;
    }
    Ok(map)
}

pub fn convert(image: &Image, settings: &Settings) -> Result<Conversion> {
    settings.validate()?;
    let (width, height, blocks) = map_blocks(image, settings)?;
    let palette = build_palette(
        &blocks,
        settings,
        settings.palette_count(),
        settings.colors_per_palette(),
    )?;
    let tileset = build_tileset(&blocks, &palette, settings)?;
    let map = build_map(&blocks, width, height, &tileset, &palette, settings)?;
    Ok(Conversion {
        palette,
        tileset,
        map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::Rgba, tiles::Flip};
    use pretty_assertions::assert_eq;

    const BLACK: Rgba = [0, 0, 0, 255];
    const WHITE: Rgba = [255, 255, 255, 255];
    const RED: Rgba = [255, 0, 0, 255];

    fn settings() -> Settings {
        Settings::new("snes", None, None, None).unwrap()
    }

    fn striped(width: u32, height: u32) -> Image {
        let pixels = (0..width * height)
            .map(|i| if (i % width) % 3 == 0 { WHITE } else { BLACK })
            .collect();
        Image::from_pixels(width, height, pixels)
    }

    #[test]
    fn test_map_size_inferred_and_explicit() {
        let image = striped(20, 9);
        assert_eq!(map_size(&image, &settings()).unwrap(), (3, 2));
        let mut s = settings();
        s.map_width = 5;
        assert_eq!(map_size(&image, &s).unwrap(), (5, 2));
    }

    #[test]
    fn test_oversized_map_is_rejected() {
        let image = striped(8, 8);
        let mut s = settings();
        s.map_width = 600_000_000;
        let err = convert(&image, &s).err().unwrap();
        assert!(matches!(
            err,
            Error::InvalidMapSize {
                width: 600_000_000,
                height: 1,
                ..
            }
        ));
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);

        // Each dimension fits on its own, the area does not.
        s.map_width = 70_000;
        s.map_height = 70_000;
        assert!(matches!(
            map_size(&image, &s),
            Err(Error::InvalidMapSize { .. })
        ));
    }

    #[test]
    fn test_tile_index_overflow_fails_the_map_phase() {
        // 272 distinct two-color tiles, more than a gb map entry can address.
        let (cols, rows) = (16, 17);
        let pixels = vec![BLACK; (cols * rows * 64) as usize];
        let mut image = Image::from_pixels(cols * 8, rows * 8, pixels);
        for i in 0..cols * rows {
            for bit in 0..9 {
                if i >> bit & 1 == 1 {
                    image.set_pixel((i % cols) * 8 + bit % 8, (i / cols) * 8 + bit / 8, WHITE);
                }
            }
        }
        let s = Settings::new("gb", None, None, None).unwrap();
        let err = convert(&image, &s).err().unwrap();
        assert!(matches!(
            err,
            Error::TileIndexOverflow {
                index: 256,
                max: 255,
                col: 0,
                row: 16,
                ..
            }
        ));
    }

    #[test]
    fn test_explicit_map_size_pads_with_background() {
        let mut s = settings();
        s.map_width = 3;
        s.map_height = 1;
        let result = convert(&striped(8, 8), &s).unwrap();
        assert_eq!(result.map.width(), 3);
        assert_eq!(result.map.entries().len(), 3);
        // Padding is transparent, which resolves to an all-background tile.
        assert_eq!(result.tileset.len(), 2);
        assert_eq!(result.map.entry(2, 0).unwrap().tile, 1);
    }

    #[test]
    fn test_convert_is_deterministic() {
        let image = striped(32, 16);
        let a = convert(&image, &settings()).unwrap();
        let b = convert(&image, &settings()).unwrap();
        assert_eq!(a.palette.native_data(), b.palette.native_data());
        assert_eq!(a.tileset.native_data(), b.tileset.native_data());
        assert_eq!(a.map.native_data(), b.map.native_data());
    }

    #[test]
    fn test_capacity_error_carries_position() {
        let mut image = Image::from_pixels(16, 8, vec![BLACK; 128]);
        for i in 0..5 {
            image.set_pixel(8 + i, 0, [i as u8 * 40, 255, 0, 255]);
        }
        let s = Settings::new("snes", Some(2), None, None).unwrap();
        let err = convert(&image, &s).err().unwrap();
        assert!(matches!(err, Error::TooManyColors { x: 8, y: 0, .. }));
    }

    #[test]
    fn test_single_flip_scenario() {
        let mut image = Image::from_pixels(16, 8, vec![BLACK; 128]);
        image.set_pixel(0, 0, RED);
        image.set_pixel(15, 0, RED);
        let result = convert(&image, &settings()).unwrap();
        assert_eq!(result.tileset.len(), 1);
        assert_eq!(result.map.entry(1, 0).unwrap().flip, Flip::Horizontal);
    }
}
