use crate::{
    font::{FIRST_GLYPH, GLYPH_COUNT, GLYPH_HEIGHT, GLYPH_WIDTH, LAST_GLYPH},
    quad::{pack_color, TexturedQuad},
};

pub const MIN_CELL_SIZE: u16 = 2;
pub const STATUS_POSITION: [f32; 2] = [100.0, 400.0];
pub const TEXT_POSITION: [f32; 2] = [100.0, 100.0];

/// Pen position plus the size of one character cell. Quads are centered on the pen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
    char_width: u16,
    char_height: u16,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            char_width: GLYPH_WIDTH as u16,
            char_height: GLYPH_HEIGHT as u16,
        }
    }
}

impl Cursor {
    pub fn char_width(&self) -> u16 {
        self.char_width
    }

    pub fn char_height(&self) -> u16 {
        self.char_height
    }

    pub fn move_to(&mut self, [x, y]: [f32; 2]) {
        self.x = x;
        self.y = y;
    }

    /// Grows (positive) or shrinks (negative) the cell width, never below [MIN_CELL_SIZE].
    pub fn resize_width(&mut self, delta: i32) {
        self.char_width = resized(self.char_width, delta);
    }

    pub fn resize_height(&mut self, delta: i32) {
        self.char_height = resized(self.char_height, delta);
    }
}

fn resized(size: u16, delta: i32) -> u16 {
    (size as i32 + delta).clamp(MIN_CELL_SIZE as i32, u16::MAX as i32) as u16
}

pub fn text_color() -> u32 {
    pack_color([0.0, 1.0, 0.0, 1.0])
}

/// Left atlas coordinate of `character`. Anything without a glyph maps to `?`.
pub fn glyph_uv(character: char) -> [f32; 2] {
    let code = match character as u32 {
        code @ FIRST_GLYPH..=LAST_GLYPH => code,
        _ => '?' as u32,
    };
    [(code - FIRST_GLYPH) as f32 / GLYPH_COUNT as f32, 0.0]
}

/// Appends one quad per character at the pen and advances it by the cell width.
pub fn add_text(text: &str, quads: &mut Vec<TexturedQuad>, cursor: &mut Cursor) {
    let color = text_color();
    quads.extend(text.chars().map(|character| {
        let quad = TexturedQuad::new(
            [cursor.x, cursor.y],
            cursor.char_width,
            cursor.char_height,
            color,
            glyph_uv(character),
        );
        cursor.x += cursor.char_width as f32;
        quad
    }));
}

/// Rebuilds the whole overlay: a `w{W},h{H}` status line and the user text below it.
pub fn update_text(text: &str, quads: &mut Vec<TexturedQuad>, cursor: &mut Cursor) {
    quads.clear();

    cursor.move_to(STATUS_POSITION);
    let status = format!("w{},h{}", cursor.char_width, cursor.char_height);
    add_text(&status, quads, cursor);

    cursor.move_to(TEXT_POSITION);
    add_text(text, quads, cursor);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn pen_advances_by_cell_width() {
        let mut cursor = Cursor::default();
        cursor.move_to([10.0, 20.0]);
        let mut quads = Vec::new();

        add_text("ab", &mut quads, &mut cursor);

        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].position, [10.0, 20.0]);
        assert_eq!(quads[1].position, [18.0, 20.0]);
        assert_eq!(cursor.x, 26.0);
        assert_eq!(quads[0].uv, [65.0 / 96.0, 0.0]);
        assert_eq!(quads[0].color, text_color());
    }

    #[test]
    fn unknown_characters_draw_question_marks() {
        assert_eq!(glyph_uv('é'), glyph_uv('?'));
        assert_eq!(glyph_uv('\n'), glyph_uv('?'));
        assert_eq!(glyph_uv(' '), [0.0, 0.0]);
        assert_eq!(glyph_uv('\u{7f}'), [95.0 / 96.0, 0.0]);
    }

    #[test]
    fn cell_size_has_a_floor() {
        let mut cursor = Cursor::default();
        for _ in 0..20 {
            cursor.resize_width(-1);
            cursor.resize_height(-1);
        }
        assert_eq!((cursor.char_width(), cursor.char_height()), (2, 2));

        cursor.resize_width(1);
        assert_eq!(cursor.char_width(), 3);
    }

    #[test]
    fn overlay_has_status_then_text() {
        let mut cursor = Cursor::default();
        cursor.resize_height(4);
        let mut quads = vec![TexturedQuad::new([0.0, 0.0], 1, 1, 0, [0.0, 0.0])];

        update_text("Hi", &mut quads, &mut cursor);

        // "w8,h16" then "Hi"
        assert_eq!(quads.len(), 8);
        assert_eq!(quads[0].position, STATUS_POSITION);
        assert_eq!(quads[0].uv, glyph_uv('w'));
        assert_eq!(quads[6].position, TEXT_POSITION);
        assert_eq!(quads[7].position, [108.0, 100.0]);
        assert!(quads.iter().all(|quad| quad.size == crate::quad::pack_size(8, 16)));
    }
}
