pub mod color;
pub mod common;
pub mod error;
pub mod image;
pub mod map;
pub mod mode;
pub mod palette;
pub mod persist;
pub mod pipeline;
pub mod settings;
pub mod tiles;

pub use error::{Error, ErrorKind, Result};
pub use image::Image;
pub use map::{Map, MapEntry};
pub use mode::Mode;
pub use palette::{Palette, PaletteJson};
pub use pipeline::{convert, Conversion};
pub use settings::Settings;
pub use tiles::{Flip, Tileset};
