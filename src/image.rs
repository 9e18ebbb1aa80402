use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use log::info;

use crate::{
    common::{Rgba, TILES_PER_ROW},
    error::{Error, Result},
    palette::Palette,
    tiles::Tileset,
};

const TRANSPARENT: Rgba = [0, 0, 0, 0];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    // Position of this image within the image it was cropped from.
    origin: (u32, u32),
    pixels: Vec<Rgba>,
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_pixels(width, height, vec![TRANSPARENT; (width * height) as usize])
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba>) -> Self {
        assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            origin: (0, 0),
            pixels,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading {}", path.display());
        let mut decoder = png::Decoder::new(BufReader::new(File::open(path)?));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        let data = &buf[..info.buffer_size()];

        let pixels: Vec<Rgba> = match info.color_type {
            png::ColorType::Rgba => data.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]]).collect(),
            png::ColorType::Rgb => data.chunks_exact(3).map(|p| [p[0], p[1], p[2], 255]).collect(),
            png::ColorType::GrayscaleAlpha => {
                data.chunks_exact(2).map(|p| [p[0], p[0], p[0], p[1]]).collect()
            }
            png::ColorType::Grayscale => data.iter().map(|&v| [v, v, v, 255]).collect(),
            png::ColorType::Indexed => {
                return Err(Error::UnsupportedImage(format!(
                    "{}: indexed data was not expanded",
                    path.display()
                )))
            }
        };
        if info.bit_depth != png::BitDepth::Eight {
            return Err(Error::UnsupportedImage(format!(
                "{}: bit depth {:?}",
                path.display(),
                info.bit_depth
            )));
        }
        Ok(Self::from_pixels(info.width, info.height, pixels))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        info!("Saving {}", path.display());
        let writer = BufWriter::new(File::create(path)?);
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.pixels.concat())?;
        writer.finish()?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: Rgba) {
        self.pixels[(y * self.width + x) as usize] = rgba;
    }

    pub fn description(&self) -> String {
        format!("{}x{}px", self.width, self.height)
    }

    // Parts outside of the image are transparent.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Image {
        let mut out = Image::new(width, height);
        out.origin = (self.origin.0 + x, self.origin.1 + y);
        for cy in 0..height {
            for cx in 0..width {
                let (sx, sy) = (x + cx, y + cy);
                if sx < self.width && sy < self.height {
                    out.set_pixel(cx, cy, self.pixel(sx, sy));
                }
            }
        }
        out
    }

    // Row-major; blocks at the right and bottom edges are padded.
    pub fn crops(&self, tile_width: u32, tile_height: u32) -> Vec<Image> {
        let cols = self.width.div_ceil(tile_width);
        let rows = self.height.div_ceil(tile_height);
        let mut out = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                out.push(self.crop(col * tile_width, row * tile_height, tile_width, tile_height));
            }
        }
        out
    }

    pub fn from_palette(palette: &Palette) -> Image {
        let width = palette.colors_per_palette() as u32;
        let height = palette.subpalettes().len() as u32;
        let mut out = Image::new(width, height.max(1));
        for (y, sub) in palette.subpalettes().iter().enumerate() {
            for (x, &c) in sub.iter().enumerate() {
                out.set_pixel(x as u32, y as u32, palette.color_format().to_rgba(c));
            }
        }
        out
    }

    pub fn from_tileset(tileset: &Tileset, palette: &Palette) -> Image {
        let (tw, th) = tileset.tile_size();
        let count = tileset.len() as u32;
        let cols = count.clamp(1, TILES_PER_ROW);
        let rows = count.div_ceil(TILES_PER_ROW).max(1);
        let mut out = Image::new(cols * tw, rows * th);
        for (i, tile) in tileset.tiles().iter().enumerate() {
            let ox = (i as u32 % TILES_PER_ROW) * tw;
            let oy = (i as u32 / TILES_PER_ROW) * th;
            for y in 0..th {
                for x in 0..tw {
                    let idx = tile.pixels[(y * tw + x) as usize];
                    if let Some(rgba) = palette.rgba_at(tile.palette, idx) {
                        out.set_pixel(ox + x, oy + y, rgba);
                    }
                }
            }
        }
        out
    }
}
