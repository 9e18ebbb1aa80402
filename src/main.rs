use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{debug, info, warn};
use superfamiconv::{
    convert,
    error::Error,
    persist::{load_binary, load_json, save_binary, save_json},
    pipeline::{build_map, build_palette, build_tileset, map_blocks},
    Image, Palette, PaletteJson, Settings, Tileset,
};

#[derive(Parser, Debug)]
#[command(
    name = "superfamiconv",
    version,
    about = "Convert images to native palette, tile and map data",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    shorthand: ShorthandArgs,

    /// Print progress information
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a palette from an image
    Palette(PaletteArgs),
    /// Create a tileset from an image and a palette
    Tiles(TilesArgs),
    /// Create a map from an image, a palette and a tileset
    Map(MapArgs),
}

#[derive(Args, Debug)]
struct ModeArgs {
    /// Target mode (snes, snes_mode7, gb, gbc, gba, gba_affine, md, pce,
    /// pce_sprite, ws, wsc, wsc_packed, ngp, ngpc)
    #[arg(short = 'M', long, default_value = "snes")]
    mode: String,

    /// Bits per pixel [default: mode dependent]
    #[arg(short = 'B', long)]
    bpp: Option<u32>,

    /// Tile width [default: mode dependent]
    #[arg(short = 'W', long)]
    tile_width: Option<u32>,

    /// Tile height [default: mode dependent]
    #[arg(short = 'H', long)]
    tile_height: Option<u32>,
}

impl ModeArgs {
    fn settings(&self) -> Result<Settings> {
        Ok(Settings::new(
            &self.mode,
            self.bpp,
            self.tile_width,
            self.tile_height,
        )?)
    }
}

#[derive(Args, Debug)]
struct ShorthandArgs {
    /// Input image
    #[arg(short, long)]
    in_image: Option<PathBuf>,

    /// Output native palette data
    #[arg(short = 'p', long)]
    out_palette: Option<PathBuf>,

    /// Output native tile data
    #[arg(short = 't', long)]
    out_tiles: Option<PathBuf>,

    /// Output native map data
    #[arg(short = 'm', long)]
    out_map: Option<PathBuf>,

    /// Output palette swatch image
    #[arg(long)]
    out_palette_image: Option<PathBuf>,

    /// Output palette as Adobe color table
    #[arg(long)]
    out_palette_act: Option<PathBuf>,

    /// Output tileset image
    #[arg(long)]
    out_tiles_image: Option<PathBuf>,

    #[command(flatten)]
    mode: ModeArgs,

    /// Map width in tiles [default: inferred]
    #[arg(long, default_value_t = 0)]
    map_width: u32,

    /// Map height in tiles [default: inferred]
    #[arg(long, default_value_t = 0)]
    map_height: u32,

    /// Keep redundant tiles
    #[arg(short = 'D', long)]
    no_discard: bool,

    /// Don't match flipped tiles
    #[arg(short = 'F', long)]
    no_flip: bool,

    /// Color for palette index zero [default: color of top left pixel]
    #[arg(short = 'R', long)]
    color_zero: Option<String>,

    /// Set the priority bit in map entries
    #[arg(long)]
    priority: bool,
}

#[derive(Args, Debug)]
struct PaletteArgs {
    /// Input image
    #[arg(short, long)]
    in_image: PathBuf,

    /// Output native palette data
    #[arg(short = 'd', long)]
    out_data: Option<PathBuf>,

    /// Output palette JSON
    #[arg(short = 'j', long)]
    out_json: Option<PathBuf>,

    /// Output palette swatch image
    #[arg(short = 'o', long)]
    out_image: Option<PathBuf>,

    /// Output palette as Adobe color table
    #[arg(long)]
    out_act: Option<PathBuf>,

    #[command(flatten)]
    mode: ModeArgs,

    /// Color for palette index zero [default: color of top left pixel]
    #[arg(short = 'R', long)]
    color_zero: Option<String>,

    /// Number of subpalettes [default: mode dependent]
    #[arg(short = 'P', long)]
    palettes: Option<usize>,

    /// Colors per subpalette [default: 2^bpp]
    #[arg(short = 'C', long)]
    colors: Option<usize>,
}

#[derive(Args, Debug)]
struct TilesArgs {
    /// Input image
    #[arg(short, long)]
    in_image: PathBuf,

    /// Input palette JSON
    #[arg(short = 'p', long)]
    in_palette: PathBuf,

    /// Output native tile data
    #[arg(short = 'd', long)]
    out_data: Option<PathBuf>,

    /// Output tileset image
    #[arg(short = 'o', long)]
    out_image: Option<PathBuf>,

    #[command(flatten)]
    mode: ModeArgs,

    /// Keep redundant tiles
    #[arg(short = 'D', long)]
    no_discard: bool,

    /// Don't match flipped tiles
    #[arg(short = 'F', long)]
    no_flip: bool,
}

#[derive(Args, Debug)]
struct MapArgs {
    /// Input image
    #[arg(short, long)]
    in_image: PathBuf,

    /// Input palette JSON
    #[arg(short = 'p', long)]
    in_palette: PathBuf,

    /// Input native tile data
    #[arg(short = 't', long)]
    in_tiles: PathBuf,

    /// Output native map data
    #[arg(short = 'd', long)]
    out_data: Option<PathBuf>,

    /// Output map JSON
    #[arg(short = 'j', long)]
    out_json: Option<PathBuf>,

    #[command(flatten)]
    mode: ModeArgs,

    /// Map width in tiles [default: inferred]
    #[arg(long, default_value_t = 0)]
    map_width: u32,

    /// Map height in tiles [default: inferred]
    #[arg(long, default_value_t = 0)]
    map_height: u32,

    /// Don't match flipped tiles
    #[arg(short = 'F', long)]
    no_flip: bool,

    /// Set the priority bit in map entries
    #[arg(long)]
    priority: bool,
}

fn load_image(path: &Path) -> Result<Image> {
    let image = Image::load(path).with_context(|| format!("Loading image {}", path.display()))?;
    info!("Loaded image from \"{}\" ({})", path.display(), image.description());
    Ok(image)
}

fn load_palette(path: &Path, settings: &Settings) -> Result<Palette> {
    let json: PaletteJson =
        load_json(path).with_context(|| format!("Loading palette {}", path.display()))?;
    let palette = Palette::from_json(settings.mode, settings.colors_per_palette(), &json)
        .with_context(|| format!("Reading palette {}", path.display()))?;
    info!("Loaded palette from \"{}\" ({})", path.display(), palette.description());
    Ok(palette)
}

fn write_binary(path: &Option<PathBuf>, data: &[u8], what: &str) -> Result<()> {
    if let Some(path) = path {
        save_binary(path, data).with_context(|| format!("Saving {} {}", what, path.display()))?;
    }
    Ok(())
}

fn write_image(path: &Option<PathBuf>, image: &Image, what: &str) -> Result<()> {
    if let Some(path) = path {
        image
            .save(path)
            .with_context(|| format!("Saving {} {}", what, path.display()))?;
    }
    Ok(())
}

fn run_shorthand(args: &ShorthandArgs) -> Result<()> {
    let mut settings = args
        .mode
        .settings()?
        .with_color_zero(args.color_zero.as_deref())?;
    settings.map_width = args.map_width;
    settings.map_height = args.map_height;
    settings.no_discard = args.no_discard;
    settings.no_flip |= args.no_flip;
    settings.priority = args.priority;
    debug!("Settings: {}", serde_json::to_string(&settings)?);

    let in_image = args
        .in_image
        .as_deref()
        .ok_or(Error::MissingInput("Input image"))?;
    let outputs = [
        &args.out_palette,
        &args.out_tiles,
        &args.out_map,
        &args.out_palette_image,
        &args.out_palette_act,
        &args.out_tiles_image,
    ];
    if outputs.iter().all(|o| o.is_none()) {
        warn!("No output files specified");
    }

    let image = load_image(in_image)?;
    let result = convert(&image, &settings)?;

    // Nothing is written unless every output could be produced.
    let palette_data = result.palette.native_data();
    let palette_act = result.palette.act_data();
    let palette_image = Image::from_palette(&result.palette);
    let tiles_data = result.tileset.native_data();
    let tiles_image = Image::from_tileset(&result.tileset, &result.palette);
    let map_data = result.map.native_data();

    write_binary(&args.out_palette, &palette_data, "palette")?;
    write_binary(&args.out_palette_act, &palette_act, "palette")?;
    write_image(&args.out_palette_image, &palette_image, "palette image")?;
    write_binary(&args.out_tiles, &tiles_data, "tiles")?;
    write_image(&args.out_tiles_image, &tiles_image, "tiles image")?;
    write_binary(&args.out_map, &map_data, "map")?;
    Ok(())
}

fn run_palette(args: &PaletteArgs) -> Result<()> {
    let settings = args
        .mode
        .settings()?
        .with_color_zero(args.color_zero.as_deref())?;
    debug!("Settings: {}", serde_json::to_string(&settings)?);
    let (palettes, colors) = settings.palette_limits(args.palettes, args.colors)?;

    let image = load_image(&args.in_image)?;
    let (_, _, blocks) = map_blocks(&image, &settings)?;
    let palette = build_palette(&blocks, &settings, palettes, colors)?;

    write_binary(&args.out_data, &palette.native_data(), "palette")?;
    write_binary(&args.out_act, &palette.act_data(), "palette")?;
    write_image(&args.out_image, &Image::from_palette(&palette), "palette image")?;
    if let Some(path) = &args.out_json {
        save_json(path, &palette.to_json())
            .with_context(|| format!("Saving palette {}", path.display()))?;
    }
    Ok(())
}

fn run_tiles(args: &TilesArgs) -> Result<()> {
    let mut settings = args.mode.settings()?;
    settings.no_discard = args.no_discard;
    settings.no_flip |= args.no_flip;
    debug!("Settings: {}", serde_json::to_string(&settings)?);

    let palette = load_palette(&args.in_palette, &settings)?;
    let image = load_image(&args.in_image)?;
    let (_, _, blocks) = map_blocks(&image, &settings)?;
    let tileset = build_tileset(&blocks, &palette, &settings)?;

    write_binary(&args.out_data, &tileset.native_data(), "tiles")?;
    write_image(
        &args.out_image,
        &Image::from_tileset(&tileset, &palette),
        "tiles image",
    )?;
    Ok(())
}

fn run_map(args: &MapArgs) -> Result<()> {
    let mut settings = args.mode.settings()?;
    settings.map_width = args.map_width;
    settings.map_height = args.map_height;
    settings.no_flip |= args.no_flip;
    settings.priority = args.priority;
    debug!("Settings: {}", serde_json::to_string(&settings)?);

    let palette = load_palette(&args.in_palette, &settings)?;
    let data = load_binary(&args.in_tiles)
        .with_context(|| format!("Loading tiles {}", args.in_tiles.display()))?;
    let tileset = Tileset::from_native(
        settings.mode,
        settings.bpp,
        settings.tile_width,
        settings.tile_height,
        settings.no_flip,
        &data,
    )
    .with_context(|| format!("Reading tiles {}", args.in_tiles.display()))?;
    info!("Loaded tiles from \"{}\" ({})", args.in_tiles.display(), tileset.description());

    let image = load_image(&args.in_image)?;
    let (width, height, blocks) = map_blocks(&image, &settings)?;
    let map = build_map(&blocks, width, height, &tileset, &palette, &settings)?;

    write_binary(&args.out_data, &map.native_data(), "map")?;
    if let Some(path) = &args.out_json {
        save_json(path, &map).with_context(|| format!("Saving map {}", path.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match &cli.command {
        Some(Command::Palette(args)) => run_palette(args),
        Some(Command::Tiles(args)) => run_tiles(args),
        Some(Command::Map(args)) => run_map(args),
        None => run_shorthand(&cli.shorthand),
    }
}
