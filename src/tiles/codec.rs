// Native tile data layouts. Tiles larger than 8x8 are stored as their 8x8
// sub-tiles in row-major order, except for PCE sprites which are 16x16 cells.
use crate::{common::ColorIdx, mode::TileFormat};

pub fn encode_tile(
    format: TileFormat,
    bpp: u32,
    pixels: &[ColorIdx],
    width: u32,
    height: u32,
    out: &mut Vec<u8>,
) {
    if format == TileFormat::PceSprite {
        encode_pce_sprite(pixels, out);
        return;
    }
    let (w, h) = (width as usize, height as usize);
    for sy in (0..h).step_by(8) {
        for sx in (0..w).step_by(8) {
            let mut sub = [0; 64];
            for y in 0..8 {
                sub[y * 8..y * 8 + 8].copy_from_slice(&pixels[(sy + y) * w + sx..][..8]);
            }
            encode_8x8(format, bpp, &sub, out);
        }
    }
}

pub fn decode_tile(
    format: TileFormat,
    bpp: u32,
    data: &[u8],
    width: u32,
    height: u32,
) -> Vec<ColorIdx> {
    if format == TileFormat::PceSprite {
        return decode_pce_sprite(data);
    }
    let (w, h) = (width as usize, height as usize);
    let sub_size = 8 * bpp as usize;
    let mut pixels = vec![0; w * h];
    let mut chunks = data.chunks_exact(sub_size);
    for sy in (0..h).step_by(8) {
        for sx in (0..w).step_by(8) {
            let Some(chunk) = chunks.next() else {
                return pixels;
            };
            let sub = decode_8x8(format, bpp, chunk);
            for y in 0..8 {
                pixels[(sy + y) * w + sx..][..8].copy_from_slice(&sub[y * 8..y * 8 + 8]);
            }
        }
    }
    pixels
}

fn plane_byte(row: &[ColorIdx], plane: u32) -> u8 {
    row.iter()
        .enumerate()
        .fold(0, |acc, (x, &p)| acc | ((p >> plane) & 1) << (7 - x))
}

fn set_plane(sub: &mut [ColorIdx; 64], y: usize, plane: u32, byte: u8) {
    for x in 0..8 {
        sub[y * 8 + x] |= ((byte >> (7 - x)) & 1) << plane;
    }
}

fn encode_8x8(format: TileFormat, bpp: u32, sub: &[ColorIdx; 64], out: &mut Vec<u8>) {
    match format {
        TileFormat::PlanarPairs => {
            for pair in (0..bpp).step_by(2) {
                for row in sub.chunks_exact(8) {
                    out.push(plane_byte(row, pair));
                    out.push(plane_byte(row, pair + 1));
                }
            }
        }
        TileFormat::PlanarRows => {
            for row in sub.chunks_exact(8) {
                for plane in 0..bpp {
                    out.push(plane_byte(row, plane));
                }
            }
        }
        TileFormat::PackedLowFirst => {
            out.extend(sub.chunks_exact(2).map(|p| (p[0] & 0xF) | (p[1] & 0xF) << 4));
        }
        TileFormat::PackedHighFirst => {
            out.extend(sub.chunks_exact(2).map(|p| (p[0] & 0xF) << 4 | (p[1] & 0xF)));
        }
        TileFormat::Linear => out.extend_from_slice(sub),
        TileFormat::NgpRows => {
            for row in sub.chunks_exact(8) {
                let word = row
                    .iter()
                    .enumerate()
                    .fold(0u16, |acc, (x, &p)| acc | ((p as u16 & 3) << (14 - 2 * x)));
                out.extend(word.to_le_bytes());
            }
        }
        TileFormat::PceSprite => unreachable!("PCE sprites are encoded as 16x16 cells"),
    }
}

fn decode_8x8(format: TileFormat, bpp: u32, data: &[u8]) -> [ColorIdx; 64] {
    let mut sub = [0; 64];
    match format {
        TileFormat::PlanarPairs => {
            for (i, pair) in (0..bpp).step_by(2).enumerate() {
                for y in 0..8 {
                    let base = i * 16 + y * 2;
                    set_plane(&mut sub, y, pair, data[base]);
                    set_plane(&mut sub, y, pair + 1, data[base + 1]);
                }
            }
        }
        TileFormat::PlanarRows => {
            for y in 0..8 {
                for plane in 0..bpp {
                    set_plane(&mut sub, y, plane, data[y * bpp as usize + plane as usize]);
                }
            }
        }
        TileFormat::PackedLowFirst => {
            for (i, &b) in data.iter().take(32).enumerate() {
                sub[i * 2] = b & 0xF;
                sub[i * 2 + 1] = b >> 4;
            }
        }
        TileFormat::PackedHighFirst => {
            for (i, &b) in data.iter().take(32).enumerate() {
                sub[i * 2] = b >> 4;
                sub[i * 2 + 1] = b & 0xF;
            }
        }
        TileFormat::Linear => sub.copy_from_slice(&data[..64]),
        TileFormat::NgpRows => {
            for y in 0..8 {
                let word = u16::from_le_bytes([data[y * 2], data[y * 2 + 1]]);
                for x in 0..8 {
                    sub[y * 8 + x] = ((word >> (14 - 2 * x)) & 3) as ColorIdx;
                }
            }
        }
        TileFormat::PceSprite => unreachable!("PCE sprites are decoded as 16x16 cells"),
    }
    sub
}

// Four bitplanes of sixteen 16-bit rows, leftmost pixel in bit 15.
fn encode_pce_sprite(pixels: &[ColorIdx], out: &mut Vec<u8>) {
    for plane in 0..4 {
        for row in pixels.chunks_exact(16) {
            let word = row
                .iter()
                .enumerate()
                .fold(0u16, |acc, (x, &p)| acc | (((p >> plane) & 1) as u16) << (15 - x));
            out.extend(word.to_le_bytes());
        }
    }
}

fn decode_pce_sprite(data: &[u8]) -> Vec<ColorIdx> {
    let mut pixels = vec![0; 256];
    for (i, word) in data.chunks_exact(2).take(64).enumerate() {
        let (plane, y) = (i / 16, i % 16);
        let word = u16::from_le_bytes([word[0], word[1]]);
        for x in 0..16 {
            pixels[y * 16 + x] |= (((word >> (15 - x)) & 1) as ColorIdx) << plane;
        }
    }
    pixels
}
