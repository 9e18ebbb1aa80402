use crate::{
    common::{NativeColor, Rgba},
    error::{Error, Result},
    mode::ColorFormat,
};

// Expand an n-bit channel to 8 bits by replicating its high bits.
pub fn scale_color(c: u8, bits: u32) -> u8 {
    let c = c as u32 & ((1 << bits) - 1);
    let mut out = 0;
    let mut shift = 8i32 - bits as i32;
    while shift > -(bits as i32) {
        out |= if shift >= 0 { c << shift } else { c >> -shift };
        shift -= bits as i32;
    }
    out as u8
}

// Rec.601 luma, integer-only.
pub fn luminance(rgba: Rgba) -> u8 {
    ((rgba[0] as u32 * 299 + rgba[1] as u32 * 587 + rgba[2] as u32 * 114) / 1000) as u8
}

pub fn is_transparent(rgba: Rgba) -> bool {
    rgba[3] == 0
}

impl ColorFormat {
    pub fn quantize(self, rgba: Rgba) -> NativeColor {
        let [r, g, b, _] = rgba.map(|c| c as NativeColor);
        match self {
            ColorFormat::Bgr555 => (b >> 3) << 10 | (g >> 3) << 5 | r >> 3,
            ColorFormat::Bgr333Md => (b >> 5) << 9 | (g >> 5) << 5 | (r >> 5) << 1,
            ColorFormat::Grb333 => (g >> 5) << 6 | (r >> 5) << 3 | b >> 5,
            ColorFormat::Rgb444 => (r >> 4) << 8 | (g >> 4) << 4 | b >> 4,
            ColorFormat::Bgr444 => (b >> 4) << 8 | (g >> 4) << 4 | r >> 4,
            ColorFormat::Gray2 => 3 - (luminance(rgba) >> 6) as NativeColor,
            ColorFormat::Gray3 => 7 - (luminance(rgba) >> 5) as NativeColor,
        }
    }

    pub fn to_rgba(self, c: NativeColor) -> Rgba {
        let (r, g, b, bits) = match self {
            ColorFormat::Bgr555 => (c, c >> 5, c >> 10, 5),
            ColorFormat::Bgr333Md => (c >> 1, c >> 5, c >> 9, 3),
            ColorFormat::Grb333 => (c >> 3, c >> 6, c, 3),
            ColorFormat::Rgb444 => (c >> 8, c >> 4, c, 4),
            ColorFormat::Bgr444 => (c, c >> 4, c >> 8, 4),
            ColorFormat::Gray2 => {
                let v = scale_color(3 - (c & 3) as u8, 2);
                return [v, v, v, 255];
            }
            ColorFormat::Gray3 => {
                let v = scale_color(7 - (c & 7) as u8, 3);
                return [v, v, v, 255];
            }
        };
        [
            scale_color(r as u8, bits),
            scale_color(g as u8, bits),
            scale_color(b as u8, bits),
            255,
        ]
    }

    pub fn word_size(self) -> usize {
        match self {
            ColorFormat::Gray2 | ColorFormat::Gray3 => 1,
            _ => 2,
        }
    }

    pub fn write_word(self, c: NativeColor, out: &mut Vec<u8>) {
        match self {
            ColorFormat::Gray2 | ColorFormat::Gray3 => out.push(c as u8),
            ColorFormat::Bgr333Md => out.extend(c.to_be_bytes()),
            _ => out.extend(c.to_le_bytes()),
        }
    }
}

// "#rgb", "#rrggbb" or "#rrggbbaa", leading '#' optional.
pub fn from_hex(s: &str) -> Result<Rgba> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || Error::InvalidColor(s.to_string());
    if !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize, len: usize| -> Result<u8> {
        u8::from_str_radix(&hex[i * len..(i + 1) * len], 16).map_err(|_| invalid())
    };
    match hex.len() {
        3 => {
            let mut rgba = [0, 0, 0, 255];
            for i in 0..3 {
                rgba[i] = channel(i, 1)? * 17;
            }
            Ok(rgba)
        }
        6 | 8 => {
            let mut rgba = [0, 0, 0, 255];
            for i in 0..hex.len() / 2 {
                rgba[i] = channel(i, 2)?;
            }
            Ok(rgba)
        }
        _ => Err(invalid()),
    }
}

pub fn to_hex(rgba: Rgba) -> String {
    format!("#{:02x}{:02x}{:02x}", rgba[0], rgba[1], rgba[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_color() {
        assert_eq!(scale_color(31, 5), 255);
        assert_eq!(scale_color(0, 5), 0);
        assert_eq!(scale_color(16, 5), 0x84);
        assert_eq!(scale_color(7, 3), 255);
        assert_eq!(scale_color(4, 3), 0x92);
        assert_eq!(scale_color(15, 4), 255);
        assert_eq!(scale_color(3, 2), 255);
        assert_eq!(scale_color(1, 2), 0x55);
    }

    #[test]
    fn test_bgr555() {
        let f = ColorFormat::Bgr555;
        assert_eq!(f.quantize([255, 0, 0, 255]), 0x001F);
        assert_eq!(f.quantize([0, 255, 0, 255]), 0x03E0);
        assert_eq!(f.quantize([0, 0, 255, 255]), 0x7C00);
        assert_eq!(f.quantize([255, 255, 255, 255]), 0x7FFF);
        // Colors differing only below the 5-bit resolution are the same native color.
        assert_eq!(f.quantize([8, 8, 8, 255]), f.quantize([15, 15, 15, 255]));
        assert_eq!(f.to_rgba(0x7FFF), [255, 255, 255, 255]);
        assert_eq!(f.to_rgba(0x001F), [255, 0, 0, 255]);
    }

    #[test]
    fn test_md_word() {
        let f = ColorFormat::Bgr333Md;
        assert_eq!(f.quantize([255, 255, 255, 255]), 0x0EEE);
        assert_eq!(f.quantize([255, 0, 0, 255]), 0x000E);
        let mut out = vec![];
        f.write_word(0x0E00, &mut out);
        assert_eq!(out, vec![0x0E, 0x00]);
    }

    #[test]
    fn test_quantize_round_trip_is_stable() {
        let formats = [
            ColorFormat::Bgr555,
            ColorFormat::Bgr333Md,
            ColorFormat::Grb333,
            ColorFormat::Rgb444,
            ColorFormat::Bgr444,
            ColorFormat::Gray2,
            ColorFormat::Gray3,
        ];
        let samples = [[0, 0, 0, 255], [255, 255, 255, 255], [12, 200, 99, 255]];
        for f in formats {
            for rgba in samples {
                let native = f.quantize(rgba);
                assert_eq!(f.quantize(f.to_rgba(native)), native, "{:?} {:?}", f, rgba);
            }
        }
    }

    #[test]
    fn test_gray_shades() {
        assert_eq!(ColorFormat::Gray2.quantize([255, 255, 255, 255]), 0);
        assert_eq!(ColorFormat::Gray2.quantize([0, 0, 0, 255]), 3);
        assert_eq!(ColorFormat::Gray3.quantize([0, 0, 0, 255]), 7);
        assert_eq!(ColorFormat::Gray2.to_rgba(0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_hex() {
        assert_eq!(from_hex("#ff8000").unwrap(), [255, 128, 0, 255]);
        assert_eq!(from_hex("00ff00").unwrap(), [0, 255, 0, 255]);
        assert_eq!(from_hex("#f00").unwrap(), [255, 0, 0, 255]);
        assert_eq!(from_hex("#11223300").unwrap(), [0x11, 0x22, 0x33, 0]);
        assert!(matches!(from_hex("#12345"), Err(Error::InvalidColor(_))));
        assert!(matches!(from_hex("#gg0000"), Err(Error::InvalidColor(_))));
        assert_eq!(to_hex([255, 128, 0, 255]), "#ff8000");
    }
}
