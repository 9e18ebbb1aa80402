// Module for building the deduplicated set of indexed-color tiles.
use hashbrown::{hash_map::Entry, HashMap};
use log::debug;
use serde::Serialize;

use crate::{
    color::is_transparent,
    common::{ColorIdx, PaletteIdx, TileIdx},
    error::{Error, Result},
    image::Image,
    mode::Mode,
    palette::Palette,
};

mod codec;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    // Matching order: the first orientation that matches wins.
    pub const ALL: [Flip; 4] = [Flip::None, Flip::Horizontal, Flip::Vertical, Flip::Both];

    pub fn h(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    pub fn v(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }

    pub fn from_hv(h: bool, v: bool) -> Self {
        match (h, v) {
            (false, false) => Flip::None,
            (true, false) => Flip::Horizontal,
            (false, true) => Flip::Vertical,
            (true, true) => Flip::Both,
        }
    }

    pub fn apply_to_pixels(self, pixels: &[ColorIdx], width: u32, height: u32) -> Vec<ColorIdx> {
        let (w, h) = (width as usize, height as usize);
        let mut out = Vec::with_capacity(pixels.len());
        for y in 0..h {
            let sy = if self.v() { h - 1 - y } else { y };
            for x in 0..w {
                let sx = if self.h() { w - 1 - x } else { x };
                out.push(pixels[sy * w + sx]);
            }
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    // Subpalette the tile was first resolved against.
    pub palette: PaletteIdx,
    // Row-major subpalette indices.
    pub pixels: Vec<ColorIdx>,
}

// Transparent pixels become index 0.
pub fn resolve_block(block: &Image, palette: &Palette, bpp: u32) -> Result<Tile> {
    let (x, y) = block.origin();
    let no_match = || Error::NoMatchingSubpalette { x, y };
    let colors = palette.block_colors(block);
    let sub = palette.resolve(&colors).ok_or_else(no_match)?;
    let format = palette.color_format();

    let mut pixels = Vec::with_capacity(block.pixels().len());
    for &p in block.pixels() {
        let idx = if is_transparent(p) {
            0
        } else {
            palette
                .index_of(sub, format.quantize(p))
                .ok_or_else(no_match)?
        };
        if (idx as u32) >= 1 << bpp {
            return Err(Error::TooManyColors {
                x,
                y,
                colors: idx as usize + 1,
                max: 1 << bpp,
            });
        }
        pixels.push(idx);
    }
    Ok(Tile {
        palette: sub,
        pixels,
    })
}

#[derive(Debug)]
pub struct Tileset {
    mode: Mode,
    bpp: u32,
    tile_width: u32,
    tile_height: u32,
    no_discard: bool,
    no_flip: bool,
    tiles: Vec<Tile>,
    // Every enabled orientation of every accepted tile, mapped to the first
    // (tile, flip) pair that produced it.
    lookup: HashMap<Vec<ColorIdx>, (TileIdx, Flip)>,
    pub discarded_tiles: usize,
}

impl Tileset {
    pub fn new(
        mode: Mode,
        bpp: u32,
        tile_width: u32,
        tile_height: u32,
        no_discard: bool,
        no_flip: bool,
    ) -> Self {
        Self {
            mode,
            bpp,
            tile_width,
            tile_height,
            no_discard,
            no_flip,
            tiles: vec![],
            lookup: HashMap::new(),
            discarded_tiles: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn bpp(&self) -> u32 {
        self.bpp
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn flipping_enabled(&self) -> bool {
        self.mode.tile_flipping_allowed() && !self.no_flip
    }

    pub fn add(&mut self, block: &Image, palette: &Palette) -> Result<(TileIdx, Flip)> {
        let tile = resolve_block(block, palette, self.bpp)?;
        if !self.no_discard {
            if let Some(found) = self.find(&tile.pixels) {
                self.discarded_tiles += 1;
                return Ok(found);
            }
        }
        Ok((self.push(tile), Flip::None))
    }

    pub fn find(&self, pixels: &[ColorIdx]) -> Option<(TileIdx, Flip)> {
        self.lookup.get(pixels).copied()
    }

    fn push(&mut self, tile: Tile) -> TileIdx {
        let idx = self.tiles.len();
        let flips: &[Flip] = if self.flipping_enabled() {
            &Flip::ALL
        } else {
            &[Flip::None]
        };
        for &flip in flips {
            let key = flip.apply_to_pixels(&tile.pixels, self.tile_width, self.tile_height);
            if let Entry::Vacant(entry) = self.lookup.entry(key) {
                entry.insert((idx, flip));
            }
        }
        debug!("Adding tile {} (subpalette {})", idx, tile.palette);
        self.tiles.push(tile);
        idx
    }

    pub fn native_data(&self) -> Vec<u8> {
        let format = self.mode.tile_format(self.bpp);
        let mut out = Vec::with_capacity(self.tiles.len() * self.tile_byte_size());
        for tile in &self.tiles {
            codec::encode_tile(
                format,
                self.bpp,
                &tile.pixels,
                self.tile_width,
                self.tile_height,
                &mut out,
            );
        }
        out
    }

    // Tile data carries no subpalette, so every tile gets subpalette 0.
    pub fn from_native(
        mode: Mode,
        bpp: u32,
        tile_width: u32,
        tile_height: u32,
        no_flip: bool,
        data: &[u8],
    ) -> Result<Self> {
        let mut tileset = Tileset::new(mode, bpp, tile_width, tile_height, true, no_flip);
        let tile_size = tileset.tile_byte_size();
        if tile_size == 0 || data.len() % tile_size != 0 {
            return Err(Error::TileDataLength {
                len: data.len(),
                tile_size,
            });
        }
        let format = mode.tile_format(bpp);
        for chunk in data.chunks_exact(tile_size) {
            let pixels = codec::decode_tile(format, bpp, chunk, tile_width, tile_height);
            tileset.push(Tile { palette: 0, pixels });
        }
        Ok(tileset)
    }

    fn tile_byte_size(&self) -> usize {
        (self.tile_width * self.tile_height * self.bpp / 8) as usize
    }

    pub fn description(&self) -> String {
        format!(
            "{} tiles of {}x{}px at {}bpp",
            self.tiles.len(),
            self.tile_width,
            self.tile_height,
            self.bpp
        )
    }
}
