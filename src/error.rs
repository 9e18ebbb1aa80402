use thiserror::Error;

use crate::mode::Mode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Capacity,
    Consistency,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown mode: \"{0}\"")]
    UnknownMode(String),

    #[error("{bpp} bits per pixel is not supported in {mode} mode")]
    InvalidBpp { mode: Mode, bpp: u32 },

    #[error("Invalid tile size {width}x{height}: {reason}")]
    InvalidTileSize {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    #[error("Invalid color \"{0}\"")]
    InvalidColor(String),

    #[error("Invalid palette size: {0}")]
    InvalidPaletteSize(String),

    #[error("Invalid map size {width}x{height}: {reason}")]
    InvalidMapSize {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    #[error("{0} required")]
    MissingInput(&'static str),

    #[error("Tile at ({x}, {y}) has {colors} colors, more than a subpalette can hold ({max})")]
    TooManyColors {
        x: u32,
        y: u32,
        colors: usize,
        max: usize,
    },

    #[error("Tile at ({x}, {y}) needs a new subpalette, but {max} are already in use")]
    PaletteOverflow { x: u32, y: u32, max: usize },

    #[error("Tile at ({x}, {y}) uses colors not found together in any subpalette")]
    NoMatchingSubpalette { x: u32, y: u32 },

    #[error("Tile index {index} at map position ({col}, {row}) does not fit in a {mode} map entry (max {max})")]
    TileIndexOverflow {
        mode: Mode,
        index: usize,
        max: usize,
        col: u32,
        row: u32,
    },

    #[error("Palette data has {subpalettes} subpalettes of up to {colors} colors, mode allows {max_subpalettes}x{max_colors}")]
    PaletteDataTooLarge {
        subpalettes: usize,
        colors: usize,
        max_subpalettes: usize,
        max_colors: usize,
    },

    #[error("No matching tile for image slice at ({x}, {y})")]
    NoTileMatch { x: u32, y: u32 },

    #[error("Map position ({col}, {row}) is outside of the {width}x{height} map")]
    MapOutOfBounds {
        col: u32,
        row: u32,
        width: u32,
        height: u32,
    },

    #[error("Tile data length {len} is not a multiple of the tile size ({tile_size} bytes)")]
    TileDataLength { len: usize, tile_size: usize },

    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG decode error: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownMode(_)
            | Error::InvalidBpp { .. }
            | Error::InvalidTileSize { .. }
            | Error::InvalidColor(_)
            | Error::InvalidPaletteSize(_)
            | Error::InvalidMapSize { .. }
            | Error::MissingInput(_) => ErrorKind::Configuration,
            Error::TooManyColors { .. }
            | Error::PaletteOverflow { .. }
            | Error::NoMatchingSubpalette { .. }
            | Error::TileIndexOverflow { .. }
            | Error::PaletteDataTooLarge { .. } => ErrorKind::Capacity,
            Error::NoTileMatch { .. }
            | Error::MapOutOfBounds { .. }
            | Error::TileDataLength { .. } => ErrorKind::Consistency,
            Error::UnsupportedImage(_)
            | Error::Io(_)
            | Error::PngDecode(_)
            | Error::PngEncode(_)
            | Error::Json(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bpp_message() {
        let error = Error::InvalidBpp {
            mode: Mode::Gb,
            bpp: 4,
        };
        assert_eq!(
            error.to_string(),
            "4 bits per pixel is not supported in gb mode"
        );
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_too_many_colors_message() {
        let error = Error::TooManyColors {
            x: 8,
            y: 16,
            colors: 20,
            max: 15,
        };
        assert_eq!(
            error.to_string(),
            "Tile at (8, 16) has 20 colors, more than a subpalette can hold (15)"
        );
        assert_eq!(error.kind(), ErrorKind::Capacity);
    }

    #[test]
    fn test_tile_index_overflow_message() {
        let error = Error::TileIndexOverflow {
            mode: Mode::Gb,
            index: 256,
            max: 255,
            col: 0,
            row: 16,
        };
        assert_eq!(
            error.to_string(),
            "Tile index 256 at map position (0, 16) does not fit in a gb map entry (max 255)"
        );
        assert_eq!(error.kind(), ErrorKind::Capacity);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::NoTileMatch { x: 0, y: 0 }.kind(),
            ErrorKind::Consistency
        );
        let map_size = Error::InvalidMapSize {
            width: 1,
            height: 1,
            reason: "too large",
        };
        assert_eq!(map_size.kind(), ErrorKind::Configuration);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = io.into();
        assert_eq!(error.kind(), ErrorKind::Io);
        assert_eq!(error.to_string(), "IO error: missing");
    }
}
