// Subpalettes share a background color at index 0.

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    color::{from_hex, is_transparent, luminance, to_hex},
    common::{ColorIdx, NativeColor, PaletteIdx, Rgba},
    error::{Error, Result},
    image::Image,
    mode::{ColorFormat, Mode},
};

// Number of entries in an ACT color table.
const ACT_COLORS: usize = 256;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PaletteJson {
    pub palettes: Vec<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct Palette {
    mode: Mode,
    max_subpalettes: usize,
    colors_per_palette: usize,
    background: Option<NativeColor>,
    subpalettes: Vec<Vec<NativeColor>>,
}

impl Palette {
    pub fn new(mode: Mode, palette_count: usize, colors_per_palette: usize) -> Self {
        Self {
            mode,
            max_subpalettes: palette_count,
            colors_per_palette,
            background: None,
            subpalettes: vec![],
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn color_format(&self) -> ColorFormat {
        self.mode.color_format()
    }

    pub fn colors_per_palette(&self) -> usize {
        self.colors_per_palette
    }

    pub fn max_subpalettes(&self) -> usize {
        self.max_subpalettes
    }

    pub fn subpalettes(&self) -> &[Vec<NativeColor>] {
        &self.subpalettes
    }

    pub fn background(&self) -> Option<NativeColor> {
        self.background
    }

    pub fn add_color(&mut self, rgba: Rgba) {
        let native = self.color_format().quantize(rgba);
        self.background = Some(native);
        if self.subpalettes.is_empty() {
            self.subpalettes.push(vec![native]);
        } else {
            for sub in &mut self.subpalettes {
                sub[0] = native;
            }
        }
    }

    // All colors of a block go into one subpalette, first-fit by subpalette order.
    pub fn add_block(&mut self, block: &Image) -> Result<()> {
        if self.background.is_none() {
            if let Some(&first) = block.pixels().first() {
                self.add_color(first);
            }
        }
        let Some(background) = self.background else {
            return Ok(());
        };
        let (x, y) = block.origin();
        let colors = self
            .block_colors(block)
            .into_iter()
            .filter(|&c| c != background)
            .collect_vec();

        let capacity = self.colors_per_palette;
        if colors.len() > capacity - 1 {
            return Err(Error::TooManyColors {
                x,
                y,
                colors: colors.len(),
                max: capacity - 1,
            });
        }
        if colors.is_empty() || self.resolve(&colors).is_some() {
            return Ok(());
        }

        for sub in &mut self.subpalettes {
            let missing = colors.iter().filter(|c| !sub.contains(c)).copied().collect_vec();
            if sub.len() + missing.len() <= capacity {
                sub.extend(missing);
                return Ok(());
            }
        }

        if self.subpalettes.len() >= self.max_subpalettes {
            return Err(Error::PaletteOverflow {
                x,
                y,
                max: self.max_subpalettes,
            });
        }
        debug!(
            "Allocating subpalette {} for tile at ({}, {})",
            self.subpalettes.len(),
            x,
            y
        );
        let mut sub = vec![background];
        sub.extend(colors);
        self.subpalettes.push(sub);
        Ok(())
    }

    pub fn add_blocks(&mut self, blocks: &[Image]) -> Result<()> {
        for block in blocks {
            self.add_block(block)?;
        }
        Ok(())
    }

    pub fn sort(&mut self) {
        let format = self.color_format();
        for sub in &mut self.subpalettes {
            sub[1..].sort_by_key(|&c| (luminance(format.to_rgba(c)), c));
        }
    }

    // In order of first appearance.
    pub fn block_colors(&self, block: &Image) -> Vec<NativeColor> {
        let format = self.color_format();
        block
            .pixels()
            .iter()
            .filter(|&&p| !is_transparent(p))
            .map(|&p| format.quantize(p))
            .unique()
            .collect()
    }

    pub fn resolve(&self, colors: &[NativeColor]) -> Option<PaletteIdx> {
        self.subpalettes
            .iter()
            .position(|sub| colors.iter().all(|c| sub.contains(c)))
    }

    pub fn index_of(&self, palette: PaletteIdx, color: NativeColor) -> Option<ColorIdx> {
        self.subpalettes
            .get(palette)?
            .iter()
            .position(|&c| c == color)
            .map(|i| i as ColorIdx)
    }

    pub fn rgba_at(&self, palette: PaletteIdx, index: ColorIdx) -> Option<Rgba> {
        let c = *self.subpalettes.get(palette)?.get(index as usize)?;
        Some(self.color_format().to_rgba(c))
    }

    // Each subpalette is padded to full width with the zero word.
    pub fn native_data(&self) -> Vec<u8> {
        let format = self.color_format();
        let mut out = vec![];
        for sub in &self.subpalettes {
            for i in 0..self.colors_per_palette {
                format.write_word(sub.get(i).copied().unwrap_or(0), &mut out);
            }
        }
        out
    }

    // Adobe color table: 256 RGB triplets, color count, transparent index.
    pub fn act_data(&self) -> Vec<u8> {
        let format = self.color_format();
        let colors = self
            .subpalettes
            .iter()
            .flat_map(|sub| {
                (0..self.colors_per_palette).map(move |i| match sub.get(i) {
                    Some(&c) => format.to_rgba(c),
                    None => [0, 0, 0, 255],
                })
            })
            .take(ACT_COLORS)
            .collect_vec();

        let mut out = vec![0; ACT_COLORS * 3];
        for (i, rgba) in colors.iter().enumerate() {
            out[i * 3..i * 3 + 3].copy_from_slice(&rgba[..3]);
        }
        out.extend((colors.len() as u16).to_be_bytes());
        out.extend(0xFFFFu16.to_be_bytes());
        out
    }

    pub fn to_json(&self) -> PaletteJson {
        let format = self.color_format();
        PaletteJson {
            palettes: self
                .subpalettes
                .iter()
                .map(|sub| sub.iter().map(|&c| to_hex(format.to_rgba(c))).collect())
                .collect(),
        }
    }

    pub fn from_json(mode: Mode, colors_per_palette: usize, json: &PaletteJson) -> Result<Self> {
        let max_subpalettes = mode.palette_count(colors_per_palette);
        let widest = json.palettes.iter().map(|p| p.len()).max().unwrap_or(0);
        if json.palettes.len() > max_subpalettes || widest > colors_per_palette {
            return Err(Error::PaletteDataTooLarge {
                subpalettes: json.palettes.len(),
                colors: widest,
                max_subpalettes,
                max_colors: colors_per_palette,
            });
        }
        if json.palettes.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidPaletteSize(
                "empty subpalette in palette data".to_string(),
            ));
        }

        let format = mode.color_format();
        let mut palette = Palette::new(mode, max_subpalettes, colors_per_palette);
        for colors in &json.palettes {
            let sub = colors
                .iter()
                .map(|hex| from_hex(hex).map(|rgba| format.quantize(rgba)))
                .collect::<Result<Vec<_>>>()?;
            palette.subpalettes.push(sub);
        }
        palette.background = palette.subpalettes.first().map(|sub| sub[0]);
        Ok(palette)
    }

    pub fn description(&self) -> String {
        let colors: usize = self.subpalettes.iter().map(|s| s.len()).sum();
        format!(
            "{} subpalettes, {} colors",
            self.subpalettes.len(),
            colors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BLACK: Rgba = [0, 0, 0, 255];
    const WHITE: Rgba = [255, 255, 255, 255];
    const RED: Rgba = [255, 0, 0, 255];
    const GREEN: Rgba = [0, 255, 0, 255];
    const BLUE: Rgba = [0, 0, 255, 255];

    // A 2x2 block made of the given colors, repeated as needed.
    fn block(colors: &[Rgba]) -> Image {
        let pixels = (0..4).map(|i| colors[i % colors.len()]).collect();
        Image::from_pixels(2, 2, pixels)
    }

    fn snes_palette(colors_per_palette: usize) -> Palette {
        Palette::new(Mode::Snes, Mode::Snes.palette_count(colors_per_palette), colors_per_palette)
    }

    #[test]
    fn test_background_occupies_index_zero() {
        let mut palette = snes_palette(4);
        palette.add_color(BLACK);
        palette.add_block(&block(&[RED, GREEN, BLUE])).unwrap();
        palette.add_block(&block(&[WHITE, RED])).unwrap();
        assert_eq!(palette.subpalettes().len(), 2);
        for sub in palette.subpalettes() {
            assert_eq!(sub[0], 0x0000);
        }
    }

    #[test]
    fn test_background_defaults_to_first_pixel() {
        let mut palette = snes_palette(16);
        palette.add_block(&block(&[BLUE, RED])).unwrap();
        assert_eq!(palette.background(), Some(0x7C00));
        assert_eq!(palette.subpalettes(), &[vec![0x7C00, 0x001F]]);
    }

    #[test]
    fn test_forced_background_absent_from_image() {
        let mut palette = snes_palette(16);
        palette.add_color(WHITE);
        palette.add_block(&block(&[RED, GREEN])).unwrap();
        assert_eq!(palette.subpalettes(), &[vec![0x7FFF, 0x001F, 0x03E0]]);
        assert_eq!(palette.index_of(0, 0x7FFF), Some(0));
    }

    #[test]
    fn test_first_fit_by_subpalette_order() {
        let mut palette = snes_palette(4);
        palette.add_color(BLACK);
        palette.add_block(&block(&[RED, GREEN])).unwrap();
        palette.add_block(&block(&[BLUE, WHITE, RED])).unwrap();
        // The second subpalette exists now; a single new color still goes to the first.
        palette.add_block(&block(&[[0, 0, 128, 255]])).unwrap();
        assert_eq!(palette.subpalettes()[0], vec![0x0000, 0x001F, 0x03E0, 0x4000]);
        assert_eq!(palette.subpalettes()[1], vec![0x0000, 0x7C00, 0x7FFF, 0x001F]);
    }

    #[test]
    fn test_transparent_pixels_need_no_slot() {
        let mut palette = snes_palette(4);
        palette.add_color(BLACK);
        palette
            .add_block(&block(&[[0, 0, 0, 0], RED, [9, 9, 9, 0], GREEN]))
            .unwrap();
        assert_eq!(palette.subpalettes(), &[vec![0x0000, 0x001F, 0x03E0]]);
    }

    #[test]
    fn test_too_many_colors_in_block() {
        let mut palette = snes_palette(4);
        palette.add_color(BLACK);
        let err = palette
            .add_block(&block(&[RED, GREEN, BLUE, WHITE]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TooManyColors {
                colors: 4,
                max: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_subpalette_budget_exceeded() {
        let mut palette = Palette::new(Mode::Gb, 1, 4);
        palette.add_color(WHITE);
        palette
            .add_block(&block(&[[170, 170, 170, 255], [85, 85, 85, 255]]))
            .unwrap();
        palette.add_block(&block(&[BLACK])).unwrap();
        let mut palette = Palette::new(Mode::Gbc, 1, 4);
        palette.add_color(BLACK);
        palette.add_block(&block(&[RED, GREEN, BLUE])).unwrap();
        let err = palette.add_block(&block(&[WHITE])).unwrap_err();
        assert!(matches!(err, Error::PaletteOverflow { max: 1, .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Capacity);
    }

    #[test]
    fn test_sort_keeps_background_and_colors() {
        let mut palette = snes_palette(16);
        palette.add_color(RED);
        palette.add_block(&block(&[WHITE, BLACK, GREEN, BLUE])).unwrap();
        palette.sort();
        assert_eq!(
            palette.subpalettes()[0],
            vec![0x001F, 0x0000, 0x7C00, 0x03E0, 0x7FFF]
        );
    }

    #[test]
    fn test_native_data_is_padded() {
        let mut palette = snes_palette(4);
        palette.add_color(BLACK);
        palette.add_block(&block(&[WHITE])).unwrap();
        assert_eq!(
            palette.native_data(),
            vec![0x00, 0x00, 0xFF, 0x7F, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_act_data() {
        let mut palette = snes_palette(4);
        palette.add_color(BLACK);
        palette.add_block(&block(&[WHITE, RED])).unwrap();
        let act = palette.act_data();
        assert_eq!(act.len(), 772);
        assert_eq!(&act[..9], &[0, 0, 0, 255, 255, 255, 255, 0, 0]);
        assert_eq!(&act[768..], &[0, 4, 0xFF, 0xFF]);
    }

    #[test]
    fn test_json_round_trip() {
        let mut palette = snes_palette(16);
        palette.add_color(BLACK);
        palette.add_block(&block(&[WHITE, RED])).unwrap();
        let json = palette.to_json();
        assert_eq!(
            json.palettes,
            vec![vec!["#000000", "#ffffff", "#ff0000"]]
        );
        let loaded = Palette::from_json(Mode::Snes, 16, &json).unwrap();
        assert_eq!(loaded.subpalettes(), palette.subpalettes());
        assert_eq!(loaded.background(), Some(0));
    }

    #[test]
    fn test_json_too_large_for_mode() {
        let json = PaletteJson {
            palettes: vec![vec!["#000000".to_string(); 5]],
        };
        assert!(matches!(
            Palette::from_json(Mode::Gb, 4, &json),
            Err(Error::PaletteDataTooLarge { .. })
        ));
    }
}
