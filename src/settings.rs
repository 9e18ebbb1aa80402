use serde::Serialize;

use crate::{
    color::from_hex,
    common::Rgba,
    error::{Error, Result},
    mode::Mode,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub mode: Mode,
    pub bpp: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    // 0 = inferred from the image size
    pub map_width: u32,
    pub map_height: u32,
    pub no_discard: bool,
    pub no_flip: bool,
    // None = color of the top-left pixel
    pub color_zero: Option<Rgba>,
    pub priority: bool,
}

impl Settings {
    // Mode defaults for everything not given explicitly.
    pub fn new(
        mode_name: &str,
        bpp: Option<u32>,
        tile_width: Option<u32>,
        tile_height: Option<u32>,
    ) -> Result<Self> {
        let mode: Mode = mode_name.parse()?;
        let (default_w, default_h) = mode.default_tile_size();
        let settings = Settings {
            mode,
            bpp: bpp.unwrap_or(mode.default_bpp()),
            tile_width: tile_width.unwrap_or(default_w),
            tile_height: tile_height.unwrap_or(default_h),
            map_width: 0,
            map_height: 0,
            no_discard: false,
            no_flip: !mode.tile_flipping_allowed(),
            color_zero: None,
            priority: false,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_color_zero(mut self, hex: Option<&str>) -> Result<Self> {
        self.color_zero = hex.map(from_hex).transpose()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mode.bpp_allowed(self.bpp) {
            return Err(Error::InvalidBpp {
                mode: self.mode,
                bpp: self.bpp,
            });
        }
        let (w, h) = (self.tile_width, self.tile_height);
        let invalid = |reason| Error::InvalidTileSize {
            width: w,
            height: h,
            reason,
        };
        if w == 0 || h == 0 {
            return Err(invalid("dimensions must be non-zero"));
        }
        if self.mode == Mode::PceSprite && (w, h) != (16, 16) {
            return Err(invalid("pce_sprite tiles are 16x16"));
        }
        if w % 8 != 0 || h % 8 != 0 {
            return Err(invalid("dimensions must be multiples of 8"));
        }
        Ok(())
    }

    pub fn colors_per_palette(&self) -> usize {
        1 << self.bpp
    }

    pub fn palette_count(&self) -> usize {
        self.mode.palette_count(self.colors_per_palette())
    }

    pub fn flipping_enabled(&self) -> bool {
        self.mode.tile_flipping_allowed() && !self.no_flip
    }

    // Subpalette count and width, with optional overrides that must stay
    // within what the mode can address.
    pub fn palette_limits(
        &self,
        palettes: Option<usize>,
        colors: Option<usize>,
    ) -> Result<(usize, usize)> {
        let max_colors = self.colors_per_palette();
        let colors = colors.unwrap_or(max_colors);
        if colors < 2 || colors > max_colors {
            return Err(Error::InvalidPaletteSize(format!(
                "{} colors per subpalette (allowed 2 to {})",
                colors, max_colors
            )));
        }
        let max_palettes = self.mode.palette_count(colors);
        let palettes = palettes.unwrap_or(max_palettes);
        if palettes == 0 || palettes > max_palettes {
            return Err(Error::InvalidPaletteSize(format!(
                "{} subpalettes (allowed 1 to {} in {} mode)",
                palettes, max_palettes, self.mode
            )));
        }
        Ok((palettes, colors))
    }
}
