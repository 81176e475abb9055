use crate::font::{GlyphCode, FIRST_GLYPH, LAST_GLYPH};

/// Number of glyphs per row of the preview grid; up/down navigation moves by this much.
pub const PREVIEW_COLUMNS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigate {
    Next,
    Previous,
    RowUp,
    RowDown,
    Select(char),
}

/// The glyph currently being edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    glyph: GlyphCode,
}

impl Selection {
    pub fn new(glyph: GlyphCode) -> Self {
        Self { glyph }
    }

    pub fn glyph(&self) -> GlyphCode {
        self.glyph
    }

    pub fn apply(&mut self, navigate: Navigate) {
        let code = self.glyph.code() as i64;
        self.glyph = match navigate {
            Navigate::Next => GlyphCode::clamped(code + 1),
            Navigate::Previous => GlyphCode::clamped(code - 1),
            Navigate::RowUp => GlyphCode::clamped(code + PREVIEW_COLUMNS as i64),
            Navigate::RowDown => GlyphCode::clamped(code - PREVIEW_COLUMNS as i64),
            // non printable keys keep the current glyph
            Navigate::Select(character) => {
                GlyphCode::from_char(character).unwrap_or(self.glyph)
            }
        };
    }

    /// Column and row of the selected glyph inside the preview grid.
    pub fn preview_cell(&self) -> (usize, usize) {
        let index = self.glyph.index();
        (index % PREVIEW_COLUMNS, index / PREVIEW_COLUMNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_stays_in_range() {
        let mut selection = Selection::default();
        for _ in 0..500 {
            selection.apply(Navigate::RowUp);
            assert!(selection.glyph().code() <= LAST_GLYPH);
        }
        assert_eq!(selection.glyph().code(), LAST_GLYPH);
        selection.apply(Navigate::Next);
        assert_eq!(selection.glyph().code(), LAST_GLYPH);

        for _ in 0..500 {
            selection.apply(Navigate::RowDown);
            assert!(selection.glyph().code() >= FIRST_GLYPH);
        }
        assert_eq!(selection.glyph().code(), FIRST_GLYPH);
        selection.apply(Navigate::Previous);
        assert_eq!(selection.glyph().code(), FIRST_GLYPH);
    }

    #[test]
    fn row_down_near_the_start_clamps() {
        let mut selection = Selection::new(GlyphCode::new(35).unwrap());
        selection.apply(Navigate::RowDown);
        assert_eq!(selection.glyph().code(), FIRST_GLYPH);
    }

    #[test]
    fn select_printable_only() {
        let mut selection = Selection::default();
        selection.apply(Navigate::Select('Z'));
        assert_eq!(selection.glyph().as_char(), 'Z');
        selection.apply(Navigate::Select('\u{7}'));
        assert_eq!(selection.glyph().as_char(), 'Z');
        selection.apply(Navigate::Select('é'));
        assert_eq!(selection.glyph().as_char(), 'Z');
    }

    #[test]
    fn preview_cell_wraps_every_eight() {
        let selection = Selection::new(GlyphCode::from_char('a').unwrap());
        // 'a' is glyph 65
        assert_eq!(selection.preview_cell(), (1, 8));
    }
}
