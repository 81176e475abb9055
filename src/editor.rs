use itertools::iproduct;
use winit::{
    dpi::PhysicalSize,
    keyboard::{Key, KeyCode, NamedKey},
};

use crate::{
    font::{FontData, GlyphCode, GLYPH_HEIGHT, GLYPH_WIDTH},
    input::{KeyInput, PointerState},
    selection::Navigate,
};

pub const BUTTON_SIZE: u16 = 20;
pub const SMALL_BUTTON_SIZE: u16 = 2;
pub const BORDER_SIZE: u16 = 2;
/// Distance between the centers of two neighbouring edit buttons.
pub const CELL_PITCH: f32 = (BORDER_SIZE + BUTTON_SIZE) as f32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Save,
    Reload,
    ExportAtlas,
    Quit,
    Navigate(Navigate),
}

impl Command {
    /// Maps a key press to an editor command. Releases map to nothing.
    pub fn from_key(input: &KeyInput) -> Option<Command> {
        if !input.pressed {
            return None;
        }
        if input.ctrl() {
            let character = input.character().map(|c| c.to_ascii_lowercase());
            return match (input.code, character) {
                (Some(KeyCode::KeyS), _) | (_, Some('s')) => Some(Command::Save),
                (Some(KeyCode::KeyL), _) | (_, Some('l')) => Some(Command::Reload),
                (Some(KeyCode::KeyE), _) | (_, Some('e')) => Some(Command::ExportAtlas),
                _ => None,
            };
        }
        match &input.key {
            Key::Named(NamedKey::Escape) => Some(Command::Quit),
            Key::Named(NamedKey::ArrowRight) => Some(Command::Navigate(Navigate::Next)),
            Key::Named(NamedKey::ArrowLeft) => Some(Command::Navigate(Navigate::Previous)),
            Key::Named(NamedKey::ArrowUp) => Some(Command::Navigate(Navigate::RowUp)),
            Key::Named(NamedKey::ArrowDown) => Some(Command::Navigate(Navigate::RowDown)),
            _ => input
                .character()
                .filter(|c| (' '..='~').contains(c))
                .map(|c| Command::Navigate(Navigate::Select(c))),
        }
    }
}

/// A single pixel change made by the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelEdit {
    pub glyph: GlyphCode,
    pub column: usize,
    pub row: usize,
    pub lit: bool,
}

/// Center of the zoomed edit button for `(column, row)`; the grid is centered in the window.
pub fn cell_center(column: usize, row: usize, window: PhysicalSize<u32>) -> [f32; 2] {
    [
        (column as f32 - (GLYPH_WIDTH / 2) as f32) * CELL_PITCH + window.width as f32 * 0.5,
        (row as f32 - (GLYPH_HEIGHT / 2) as f32) * CELL_PITCH + window.height as f32 * 0.5,
    ]
}

/// The edit button under the pointer, if any. Edges between buttons belong to neither.
pub fn hit_cell(x: f32, y: f32, window: PhysicalSize<u32>) -> Option<(usize, usize)> {
    let half = CELL_PITCH * 0.5;
    iproduct!(0..GLYPH_HEIGHT, 0..GLYPH_WIDTH)
        .map(|(row, column)| (column, row))
        .find(|&(column, row)| {
            let [cx, cy] = cell_center(column, row, window);
            x > cx - half && x < cx + half && y > cy - half && y < cy + half
        })
}

/// Paints (left button) or erases (right button) the pixel under the pointer in `glyph`.
pub fn apply_pointer(
    font: &mut FontData,
    glyph: GlyphCode,
    pointer: &PointerState,
    window: PhysicalSize<u32>,
) -> Option<PixelEdit> {
    let lit = if pointer.left {
        true
    } else if pointer.right {
        false
    } else {
        return None;
    };
    let (column, row) = hit_cell(pointer.x, pointer.y, window)?;

    // hit_cell only yields in-range cells
    let was = font.pixel(glyph, column, row).ok()?;
    if was == lit {
        return None;
    }
    font.set_pixel(glyph, column, row, lit).ok()?;
    Some(PixelEdit {
        glyph,
        column,
        row,
        lit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FIRST_GLYPH, LAST_GLYPH};
    use winit::keyboard::ModifiersState;

    const WINDOW: PhysicalSize<u32> = PhysicalSize::new(640, 540);

    fn press(key: Key) -> KeyInput {
        KeyInput::pressed(key, None, ModifiersState::empty())
    }

    #[test]
    fn cell_centers_follow_pitch() {
        assert_eq!(cell_center(4, 6, WINDOW), [320.0, 270.0]);
        assert_eq!(cell_center(0, 0, WINDOW), [320.0 - 88.0, 270.0 - 132.0]);
        assert_eq!(cell_center(7, 11, WINDOW), [320.0 + 66.0, 270.0 + 110.0]);
    }

    #[test]
    fn hit_test_is_strict() {
        assert_eq!(hit_cell(320.0, 270.0, WINDOW), Some((4, 6)));
        assert_eq!(hit_cell(330.9, 280.9, WINDOW), Some((4, 6)));
        // shared edge between (4, 6) and (5, 6)
        assert_eq!(hit_cell(331.0, 270.0, WINDOW), None);
        assert_eq!(hit_cell(10.0, 10.0, WINDOW), None);
        assert_eq!(hit_cell(-50.0, 1e6, WINDOW), None);
    }

    #[test]
    fn no_buttons_no_change() {
        let mut font = FontData::new();
        let pointer = PointerState::at(320.0, 270.0);
        assert_eq!(
            apply_pointer(&mut font, GlyphCode::default(), &pointer, WINDOW),
            None
        );
        assert_eq!(font, FontData::new());
    }

    fn pointer_on(column: usize, row: usize, left: bool, right: bool) -> PointerState {
        let [x, y] = cell_center(column, row, WINDOW);
        PointerState { x, y, left, right }
    }

    #[test]
    fn paint_and_erase_every_cell() {
        let mut font = FontData::new();
        for code in FIRST_GLYPH..=LAST_GLYPH {
            let glyph = GlyphCode::new(code).unwrap();
            for (row, column) in iproduct!(0..GLYPH_HEIGHT, 0..GLYPH_WIDTH) {
                let paint = pointer_on(column, row, true, false);
                let edit = apply_pointer(&mut font, glyph, &paint, WINDOW).unwrap();
                assert_eq!((edit.column, edit.row, edit.lit), (column, row, true));
                let index = FontData::byte_index(glyph, row).unwrap();
                assert_eq!(font.as_bytes()[index], 1 << column);

                let erase = pointer_on(column, row, false, true);
                apply_pointer(&mut font, glyph, &erase, WINDOW).unwrap();
                assert!(font.as_bytes().iter().all(|&byte| byte == 0));
            }
        }
    }

    #[test]
    fn erase_then_paint_restores_lit_bits() {
        let full = FontData::from_bytes(&[0xff; crate::font::FONT_DATA_LEN]);
        let mut font = full.clone();
        for code in FIRST_GLYPH..=LAST_GLYPH {
            let glyph = GlyphCode::new(code).unwrap();
            for (row, column) in iproduct!(0..GLYPH_HEIGHT, 0..GLYPH_WIDTH) {
                let erase = pointer_on(column, row, false, true);
                let edit = apply_pointer(&mut font, glyph, &erase, WINDOW).unwrap();
                assert!(!edit.lit);
                assert!(!font.pixel(glyph, column, row).unwrap());

                let paint = pointer_on(column, row, true, false);
                apply_pointer(&mut font, glyph, &paint, WINDOW).unwrap();
                assert_eq!(font, full);
            }
        }
    }

    #[test]
    fn left_wins_over_right() {
        let mut font = FontData::new();
        let [x, y] = cell_center(2, 3, WINDOW);
        let pointer = PointerState {
            x,
            y,
            left: true,
            right: true,
        };
        let edit = apply_pointer(&mut font, GlyphCode::default(), &pointer, WINDOW).unwrap();
        assert!(edit.lit);
    }

    #[test]
    fn holding_the_button_reports_once() {
        let mut font = FontData::new();
        let [x, y] = cell_center(1, 1, WINDOW);
        let pointer = PointerState {
            x,
            y,
            left: true,
            right: false,
        };
        assert!(apply_pointer(&mut font, GlyphCode::default(), &pointer, WINDOW).is_some());
        assert!(apply_pointer(&mut font, GlyphCode::default(), &pointer, WINDOW).is_none());
    }

    #[test]
    fn key_commands() {
        let ctrl_s = KeyInput::pressed(
            Key::Character("s".into()),
            Some(KeyCode::KeyS),
            ModifiersState::CONTROL,
        );
        assert_eq!(Command::from_key(&ctrl_s), Some(Command::Save));
        let ctrl_l = KeyInput::pressed(
            Key::Character("\u{c}".into()),
            Some(KeyCode::KeyL),
            ModifiersState::CONTROL,
        );
        assert_eq!(Command::from_key(&ctrl_l), Some(Command::Reload));
        assert_eq!(
            Command::from_key(&press(Key::Named(NamedKey::Escape))),
            Some(Command::Quit)
        );
        assert_eq!(
            Command::from_key(&press(Key::Named(NamedKey::ArrowUp))),
            Some(Command::Navigate(Navigate::RowUp))
        );
        assert_eq!(
            Command::from_key(&press(Key::Character("s".into()))),
            Some(Command::Navigate(Navigate::Select('s')))
        );
        assert_eq!(
            Command::from_key(&press(Key::Named(NamedKey::Space))),
            Some(Command::Navigate(Navigate::Select(' ')))
        );
        assert_eq!(Command::from_key(&press(Key::Named(NamedKey::Enter))), None);

        let mut release = press(Key::Named(NamedKey::Escape));
        release.pressed = false;
        assert_eq!(Command::from_key(&release), None);
    }
}
