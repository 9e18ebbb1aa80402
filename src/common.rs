pub type Rgba = [u8; 4]; // Source pixel (r, g, b, a)
pub type NativeColor = u16; // Mode-specific packed color word
pub type ColorIdx = u8; // Index into a subpalette (0 = background)
pub type PaletteIdx = usize; // Index into the list of subpalettes
pub type TileIdx = usize; // Index into the tileset

// Number of tiles per row when rendering a tileset sheet.
pub const TILES_PER_ROW: u32 = 16;
