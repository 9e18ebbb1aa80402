use serde::Serialize;

use crate::{
    common::{PaletteIdx, TileIdx},
    error::{Error, Result},
    image::Image,
    mode::Mode,
    palette::Palette,
    tiles::{resolve_block, Flip, Tileset},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MapEntry {
    pub tile: TileIdx,
    pub palette: PaletteIdx,
    pub flip: Flip,
    pub priority: bool,
}

impl MapEntry {
    // GBC entries are a (tile, attribute) byte pair; this is the attribute byte.
    pub fn word(&self, mode: Mode) -> u16 {
        let tile = (self.tile & (mode.max_tile_count() - 1)) as u16;
        let pal = self.palette as u16;
        let h = self.flip.h() as u16;
        let v = self.flip.v() as u16;
        let prio = self.priority as u16;
        match mode {
            Mode::Snes => v << 15 | h << 14 | prio << 13 | (pal & 7) << 10 | tile,
            Mode::SnesMode7 | Mode::Gb | Mode::GbaAffine => tile,
            Mode::Gbc => prio << 7 | v << 6 | h << 5 | (tile >> 8) << 3 | (pal & 7),
            Mode::Gba => (pal & 0xF) << 12 | v << 11 | h << 10 | tile,
            Mode::Md => prio << 15 | (pal & 3) << 13 | v << 12 | h << 11 | tile,
            Mode::Pce | Mode::PceSprite => (pal & 0xF) << 12 | tile,
            Mode::Ws | Mode::Wsc | Mode::WscPacked => {
                v << 15 | h << 14 | (tile >> 9) << 13 | (pal & 0xF) << 9 | (tile & 0x1FF)
            }
            Mode::Ngp | Mode::Ngpc => h << 15 | v << 14 | (pal & 0xF) << 9 | tile,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Map {
    #[serde(skip)]
    mode: Mode,
    width: u32,
    height: u32,
    #[serde(skip)]
    priority: bool,
    entries: Vec<MapEntry>,
}

impl Map {
    pub fn new(mode: Mode, width: u32, height: u32) -> Self {
        Self {
            mode,
            width,
            height,
            priority: false,
            entries: vec![MapEntry::default(); width as usize * height as usize],
        }
    }

    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn entry(&self, col: u32, row: u32) -> Option<&MapEntry> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.entries.get((row * self.width + col) as usize)
    }

    // The tileset and palette are not modified.
    pub fn add(
        &mut self,
        block: &Image,
        tileset: &Tileset,
        palette: &Palette,
        bpp: u32,
        col: u32,
        row: u32,
    ) -> Result<()> {
        if col >= self.width || row >= self.height {
            return Err(Error::MapOutOfBounds {
                col,
                row,
                width: self.width,
                height: self.height,
            });
        }
        let tile = resolve_block(block, palette, bpp)?;
        let (x, y) = block.origin();
        let (index, flip) = tileset
            .find(&tile.pixels)
            .ok_or(Error::NoTileMatch { x, y })?;
        let max_tiles = self.mode.max_tile_count();
        if index >= max_tiles {
            return Err(Error::TileIndexOverflow {
                mode: self.mode,
                index,
                max: max_tiles - 1,
                col,
                row,
            });
        }
        self.entries[(row * self.width + col) as usize] = MapEntry {
            tile: index,
            palette: tile.palette,
            flip,
            priority: self.priority,
        };
        Ok(())
    }

    pub fn native_data(&self) -> Vec<u8> {
        let mode = self.mode;
        match mode {
            Mode::SnesMode7 | Mode::Gb | Mode::GbaAffine => {
                self.entries.iter().map(|e| e.word(mode) as u8).collect()
            }
            // Tile numbers first, then the attribute plane.
            Mode::Gbc => self
                .entries
                .iter()
                .map(|e| e.tile as u8)
                .chain(self.entries.iter().map(|e| e.word(mode) as u8))
                .collect(),
            Mode::Md => self
                .entries
                .iter()
                .flat_map(|e| e.word(mode).to_be_bytes())
                .collect(),
            _ => self
                .entries
                .iter()
                .flat_map(|e| e.word(mode).to_le_bytes())
                .collect(),
        }
    }

    pub fn description(&self) -> String {
        format!("{}x{} entries", self.width, self.height)
    }
}
