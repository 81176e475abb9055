use std::path::Path;

use anyhow::{Context, Result};
use image::{ColorType, Rgba, RgbaImage};
use log::info;
use wgpu::Extent3d;

use crate::font::{FontData, GlyphCode, FIRST_GLYPH, GLYPH_COUNT, GLYPH_HEIGHT, GLYPH_WIDTH};

pub const ATLAS_WIDTH: u32 = (GLYPH_COUNT * GLYPH_WIDTH) as u32;
pub const ATLAS_HEIGHT: u32 = GLYPH_HEIGHT as u32;

const LIT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// An rgba8 image ready to be uploaded with [crate::render::Render::write_texture].
pub struct Texture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn extent(&self) -> Extent3d {
        Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    /// All 96 glyphs side by side. Texel `(glyph * 8 + x, y)` is white where bit `x` of row `y` is set.
    pub fn from_font(font: &FontData) -> Self {
        let img = RgbaImage::from_fn(ATLAS_WIDTH, ATLAS_HEIGHT, |x, y| {
            let glyph = GlyphCode::clamped((FIRST_GLYPH + x / GLYPH_WIDTH as u32) as i64);
            let row = font.glyph(glyph)[y as usize];
            if (row >> (x % GLYPH_WIDTH as u32)) & 1 == 1 {
                LIT
            } else {
                Rgba([0, 0, 0, 0])
            }
        });

        Self {
            width: img.width(),
            height: img.height(),
            data: img.into_raw(),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        self.data
            .get(offset..offset + 4)
            .and_then(|texel| texel.try_into().ok())
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        image::save_buffer(path, &self.data, self.width, self.height, ColorType::Rgba8)
            .with_context(|| format!("Couldn't write {}", path.display()))?;
        info!("Wrote {}x{} atlas to {}", self.width, self.height, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_matches_font_bits() {
        let mut font = FontData::new();
        let a = GlyphCode::from_char('a').unwrap();
        font.set_pixel(a, 3, 5, true).unwrap();

        let atlas = Texture::from_font(&font);
        assert_eq!((atlas.width(), atlas.height()), (768, 12));
        assert_eq!(atlas.data.len(), 768 * 12 * 4);

        let x = a.index() as u32 * 8 + 3;
        assert_eq!(atlas.pixel(x, 5), Some([255, 255, 255, 255]));
        assert_eq!(atlas.pixel(x, 4), Some([0, 0, 0, 0]));
        assert_eq!(atlas.pixel(x + 1, 5), Some([0, 0, 0, 0]));
        assert_eq!(atlas.pixel(768, 0), None);
        assert_eq!(
            atlas.data.chunks(4).filter(|texel| texel[3] == 255).count(),
            1
        );
    }

    #[test]
    fn png_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.png");

        let atlas = Texture::from_font(&FontData::new());
        atlas.save_png(&path).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (768, 12));
    }
}
