use std::{fs, io, path::Path};

use log::{info, warn};
use thiserror::Error;

pub const FIRST_GLYPH: u32 = 32;
pub const LAST_GLYPH: u32 = 127;
pub const GLYPH_COUNT: usize = 96;
pub const GLYPH_WIDTH: usize = 8;
pub const GLYPH_HEIGHT: usize = 12;
/// Size of a font file on disk and of the in-memory store.
pub const FONT_DATA_LEN: usize = GLYPH_COUNT * GLYPH_HEIGHT;

pub const DEFAULT_FONT_PATH: &str = "new_font.dat";

#[derive(Debug, Error)]
pub enum FontError {
    #[error("glyph code {0} is outside the printable range 32..=127")]
    GlyphOutOfRange(u32),
    #[error("pixel ({column}, {row}) is outside the 8x12 glyph cell")]
    PixelOutOfRange { column: usize, row: usize },
    #[error("couldn't access font file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FontError {
    fn io(path: &Path, source: io::Error) -> Self {
        FontError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FontError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// A printable ascii code in `32..=127`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphCode(u32);

impl GlyphCode {
    pub fn new(code: u32) -> Result<Self, FontError> {
        if (FIRST_GLYPH..=LAST_GLYPH).contains(&code) {
            Ok(Self(code))
        } else {
            Err(FontError::GlyphOutOfRange(code))
        }
    }

    pub fn clamped(code: i64) -> Self {
        Self(code.clamp(FIRST_GLYPH as i64, LAST_GLYPH as i64) as u32)
    }

    pub fn from_char(character: char) -> Result<Self, FontError> {
        Self::new(character as u32)
    }

    pub fn code(self) -> u32 {
        self.0
    }

    /// Position of the glyph inside the font, `0..96`.
    pub fn index(self) -> usize {
        (self.0 - FIRST_GLYPH) as usize
    }

    pub fn as_char(self) -> char {
        char::from_u32(self.0).unwrap_or('?')
    }
}

impl Default for GlyphCode {
    fn default() -> Self {
        Self('a' as u32)
    }
}

/// The bitmap font: 96 glyphs, 12 row bytes each, bit `i` of a row byte is column `i`.
#[derive(Clone, PartialEq, Eq)]
pub struct FontData {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for FontData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.bytes.iter().map(|b| b.count_ones()).sum::<u32>();
        f.debug_struct("FontData")
            .field("len", &self.bytes.len())
            .field("lit_pixels", &lit)
            .finish()
    }
}

impl FontData {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; FONT_DATA_LEN],
        }
    }

    /// Builds a store from raw file contents. Short input is zero padded, long input truncated.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() != FONT_DATA_LEN {
            warn!(
                "Font data is {} bytes, expected {}; {}",
                bytes.len(),
                FONT_DATA_LEN,
                if bytes.len() < FONT_DATA_LEN {
                    "padding with empty rows"
                } else {
                    "ignoring trailing bytes"
                }
            );
        }
        let mut data = Self::new();
        let len = bytes.len().min(FONT_DATA_LEN);
        data.bytes[..len].copy_from_slice(&bytes[..len]);
        data
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FontError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| FontError::io(path, err))?;
        info!("Loaded font {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(&bytes))
    }

    /// Replaces the contents with the file at `path`. On failure the current glyphs are kept.
    pub fn reload<P: AsRef<Path>>(&mut self, path: P) -> Result<(), FontError> {
        *self = Self::load(path)?;
        Ok(())
    }

    /// Writes the store to `path`, creating the file if needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FontError> {
        let path = path.as_ref();
        fs::write(path, &self.bytes).map_err(|err| FontError::io(path, err))?;
        info!("Saved font {} ({} bytes)", path.display(), self.bytes.len());
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_index(glyph: GlyphCode, row: usize) -> Result<usize, FontError> {
        if row >= GLYPH_HEIGHT {
            return Err(FontError::PixelOutOfRange { column: 0, row });
        }
        Ok(glyph.index() * GLYPH_HEIGHT + row)
    }

    /// The 12 row bytes of `glyph`, bottom row first.
    pub fn glyph(&self, glyph: GlyphCode) -> &[u8] {
        let start = glyph.index() * GLYPH_HEIGHT;
        &self.bytes[start..start + GLYPH_HEIGHT]
    }

    pub fn row(&self, glyph: GlyphCode, row: usize) -> Result<u8, FontError> {
        Ok(self.bytes[Self::byte_index(glyph, row)?])
    }

    pub fn pixel(&self, glyph: GlyphCode, column: usize, row: usize) -> Result<bool, FontError> {
        check_pixel(column, row)?;
        Ok((self.row(glyph, row)? >> column) & 1 == 1)
    }

    pub fn set_pixel(
        &mut self,
        glyph: GlyphCode,
        column: usize,
        row: usize,
        lit: bool,
    ) -> Result<(), FontError> {
        check_pixel(column, row)?;
        let index = Self::byte_index(glyph, row)?;
        if lit {
            self.bytes[index] |= 1 << column;
        } else {
            self.bytes[index] &= !(1 << column);
        }
        Ok(())
    }
}

impl Default for FontData {
    fn default() -> Self {
        Self::new()
    }
}

fn check_pixel(column: usize, row: usize) -> Result<(), FontError> {
    if column >= GLYPH_WIDTH || row >= GLYPH_HEIGHT {
        return Err(FontError::PixelOutOfRange { column, row });
    }
    Ok(())
}
