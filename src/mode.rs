// Per-platform capabilities. Everything mode-dependent in the pipeline goes
// through one of the tables below.
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Snes,
    SnesMode7,
    Gb,
    Gbc,
    Gba,
    GbaAffine,
    Md,
    Pce,
    PceSprite,
    Ws,
    Wsc,
    WscPacked,
    Ngp,
    Ngpc,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorFormat {
    Bgr555,
    Bgr333Md,
    Grb333,
    Rgb444,
    Bgr444,
    Gray2,
    Gray3,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileFormat {
    // Bitplanes stored in pairs: 8 rows of (plane n, plane n+1), then the next pair.
    PlanarPairs,
    // All planes of a row stored together.
    PlanarRows,
    PackedLowFirst,
    PackedHighFirst,
    Linear,
    NgpRows,
    PceSprite,
}

impl Mode {
    pub const ALL: [Mode; 14] = [
        Mode::Snes,
        Mode::SnesMode7,
        Mode::Gb,
        Mode::Gbc,
        Mode::Gba,
        Mode::GbaAffine,
        Mode::Md,
        Mode::Pce,
        Mode::PceSprite,
        Mode::Ws,
        Mode::Wsc,
        Mode::WscPacked,
        Mode::Ngp,
        Mode::Ngpc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Snes => "snes",
            Mode::SnesMode7 => "snes_mode7",
            Mode::Gb => "gb",
            Mode::Gbc => "gbc",
            Mode::Gba => "gba",
            Mode::GbaAffine => "gba_affine",
            Mode::Md => "md",
            Mode::Pce => "pce",
            Mode::PceSprite => "pce_sprite",
            Mode::Ws => "ws",
            Mode::Wsc => "wsc",
            Mode::WscPacked => "wsc_packed",
            Mode::Ngp => "ngp",
            Mode::Ngpc => "ngpc",
        }
    }

    pub fn allowed_bpp(self) -> &'static [u32] {
        match self {
            Mode::Snes => &[2, 4, 8],
            Mode::SnesMode7 => &[8],
            Mode::Gb | Mode::Gbc => &[2],
            Mode::Gba => &[4, 8],
            Mode::GbaAffine => &[8],
            Mode::Md | Mode::Pce | Mode::PceSprite => &[4],
            Mode::Ws => &[2],
            Mode::Wsc => &[2, 4],
            Mode::WscPacked => &[4],
            Mode::Ngp | Mode::Ngpc => &[2],
        }
    }

    pub fn bpp_allowed(self, bpp: u32) -> bool {
        self.allowed_bpp().contains(&bpp)
    }

    pub fn default_bpp(self) -> u32 {
        match self {
            Mode::Snes => 4,
            Mode::SnesMode7 => 8,
            Mode::Gb | Mode::Gbc => 2,
            Mode::Gba => 4,
            Mode::GbaAffine => 8,
            Mode::Md | Mode::Pce | Mode::PceSprite => 4,
            Mode::Ws => 2,
            Mode::Wsc | Mode::WscPacked => 4,
            Mode::Ngp | Mode::Ngpc => 2,
        }
    }

    pub fn tile_flipping_allowed(self) -> bool {
        match self {
            Mode::Snes | Mode::Gbc | Mode::Gba | Mode::Md => true,
            Mode::Ws | Mode::Wsc | Mode::WscPacked => true,
            Mode::Ngp | Mode::Ngpc => true,
            Mode::SnesMode7 | Mode::Gb | Mode::GbaAffine => false,
            Mode::Pce | Mode::PceSprite => false,
        }
    }

    pub fn palette_count(self, colors_per_palette: usize) -> usize {
        match self {
            Mode::Snes => {
                if colors_per_palette >= 256 {
                    1
                } else {
                    8
                }
            }
            Mode::Gba => {
                if colors_per_palette >= 256 {
                    1
                } else {
                    16
                }
            }
            Mode::SnesMode7 | Mode::GbaAffine | Mode::Gb | Mode::Ngp => 1,
            Mode::Gbc => 8,
            Mode::Md => 4,
            Mode::Pce | Mode::PceSprite => 16,
            Mode::Ws | Mode::Wsc | Mode::WscPacked | Mode::Ngpc => 16,
        }
    }

    pub fn default_tile_size(self) -> (u32, u32) {
        match self {
            Mode::PceSprite => (16, 16),
            _ => (8, 8),
        }
    }

    pub fn color_format(self) -> ColorFormat {
        match self {
            Mode::Snes | Mode::SnesMode7 | Mode::Gbc | Mode::Gba | Mode::GbaAffine => {
                ColorFormat::Bgr555
            }
            Mode::Md => ColorFormat::Bgr333Md,
            Mode::Pce | Mode::PceSprite => ColorFormat::Grb333,
            Mode::Wsc | Mode::WscPacked => ColorFormat::Rgb444,
            Mode::Ngpc => ColorFormat::Bgr444,
            Mode::Gb => ColorFormat::Gray2,
            Mode::Ws | Mode::Ngp => ColorFormat::Gray3,
        }
    }

    pub fn tile_format(self, bpp: u32) -> TileFormat {
        match (self, bpp) {
            (Mode::Snes, _) | (Mode::Gb | Mode::Gbc | Mode::Pce | Mode::Ws, _) => {
                TileFormat::PlanarPairs
            }
            (Mode::Wsc, 2) => TileFormat::PlanarPairs,
            (Mode::Wsc, _) => TileFormat::PlanarRows,
            (Mode::Gba, 4) => TileFormat::PackedLowFirst,
            (Mode::Gba | Mode::GbaAffine | Mode::SnesMode7, _) => TileFormat::Linear,
            (Mode::Md | Mode::WscPacked, _) => TileFormat::PackedHighFirst,
            (Mode::Ngp | Mode::Ngpc, _) => TileFormat::NgpRows,
            (Mode::PceSprite, _) => TileFormat::PceSprite,
        }
    }

    pub fn max_tile_count(self) -> usize {
        match self {
            Mode::Snes | Mode::Gba => 1024,
            Mode::SnesMode7 | Mode::Gb | Mode::GbaAffine => 256,
            Mode::Gbc => 512,
            Mode::Md => 2048,
            Mode::Pce | Mode::PceSprite => 4096,
            Mode::Ws | Mode::Ngp | Mode::Ngpc => 512,
            Mode::Wsc | Mode::WscPacked => 1024,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.name().parse::<Mode>().unwrap(), mode);
        }
        assert!(matches!(
            "nes".parse::<Mode>(),
            Err(Error::UnknownMode(name)) if name == "nes"
        ));
    }

    #[test]
    fn test_default_bpp_is_allowed() {
        for mode in Mode::ALL {
            assert!(mode.bpp_allowed(mode.default_bpp()), "{}", mode);
        }
    }

    #[test]
    fn test_snes_capabilities() {
        assert_eq!(Mode::Snes.default_bpp(), 4);
        assert!(Mode::Snes.tile_flipping_allowed());
        assert_eq!(Mode::Snes.palette_count(16), 8);
        assert_eq!(Mode::Snes.palette_count(256), 1);
        assert_eq!(Mode::Snes.color_format(), ColorFormat::Bgr555);
        assert!(!Mode::SnesMode7.tile_flipping_allowed());
        assert!(!Mode::Snes.bpp_allowed(3));
    }

    #[test]
    fn test_tile_formats() {
        assert_eq!(Mode::Gba.tile_format(4), TileFormat::PackedLowFirst);
        assert_eq!(Mode::Gba.tile_format(8), TileFormat::Linear);
        assert_eq!(Mode::Wsc.tile_format(2), TileFormat::PlanarPairs);
        assert_eq!(Mode::Wsc.tile_format(4), TileFormat::PlanarRows);
        assert_eq!(Mode::PceSprite.default_tile_size(), (16, 16));
    }
}
