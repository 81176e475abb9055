use itertools::iproduct;
use winit::dpi::PhysicalSize;

use crate::{
    editor::{cell_center, BUTTON_SIZE, SMALL_BUTTON_SIZE},
    font::{FontData, GlyphCode, FIRST_GLYPH, GLYPH_COUNT, GLYPH_HEIGHT, GLYPH_WIDTH},
    quad::{pack_color, QuadRecord, TRANSPARENT, WHITE},
    selection::{Selection, PREVIEW_COLUMNS},
};

pub const PREVIEW_MARGIN: f32 = 10.0;
pub const PREVIEW_GAP: f32 = 2.0;
/// The marker frames a preview block with a 2px border on every side.
pub const MARKER_WIDTH: u16 = SMALL_BUTTON_SIZE * GLYPH_WIDTH as u16 + 4;
pub const MARKER_HEIGHT: u16 = SMALL_BUTTON_SIZE * GLYPH_HEIGHT as u16 + 4;

const PIXELS_PER_GLYPH: usize = GLYPH_WIDTH * GLYPH_HEIGHT;
/// Marker, zoomed glyph, then one block per glyph.
pub const EDITOR_QUAD_COUNT: usize = 1 + PIXELS_PER_GLYPH + GLYPH_COUNT * PIXELS_PER_GLYPH;

fn pixel_color(lit: bool) -> u32 {
    if lit {
        WHITE
    } else {
        TRANSPARENT
    }
}

fn lit(font: &FontData, glyph: GlyphCode, column: usize, row: usize) -> bool {
    let row_bits = font.glyph(glyph)[row];
    (row_bits >> column) & 1 == 1
}

/// Lower left corner of the preview block at `(block_x, block_y)`, offset to the first pixel center.
fn preview_block_origin(block_x: usize, block_y: usize) -> [f32; 2] {
    let small = SMALL_BUTTON_SIZE as f32;
    [
        PREVIEW_MARGIN + (block_x * GLYPH_WIDTH) as f32 * small + block_x as f32 * PREVIEW_GAP,
        PREVIEW_MARGIN + (block_y * GLYPH_HEIGHT) as f32 * small + block_y as f32 * PREVIEW_GAP,
    ]
}

/// Center of preview pixel `(column, row)` of `glyph`.
pub fn preview_pixel_center(glyph: GlyphCode, column: usize, row: usize) -> [f32; 2] {
    let index = glyph.index();
    let [x, y] = preview_block_origin(index % PREVIEW_COLUMNS, index / PREVIEW_COLUMNS);
    let small = SMALL_BUTTON_SIZE as f32;
    [x + column as f32 * small, y + row as f32 * small]
}

pub fn marker(selection: &Selection) -> QuadRecord {
    let (block_x, block_y) = selection.preview_cell();
    let [x, y] = preview_block_origin(block_x, block_y);
    let small = SMALL_BUTTON_SIZE as f32;
    QuadRecord::new(
        [
            x + (GLYPH_WIDTH / 2) as f32 * small - 1.0,
            y + (GLYPH_HEIGHT / 2) as f32 * small - 1.0,
        ],
        MARKER_WIDTH,
        MARKER_HEIGHT,
        pack_color([1.0, 0.0, 0.0, 1.0]),
    )
}

/// The 96 edit buttons of the selected glyph, row by row.
pub fn zoomed_glyph<'a>(
    font: &'a FontData,
    glyph: GlyphCode,
    window: PhysicalSize<u32>,
) -> impl Iterator<Item = QuadRecord> + 'a {
    iproduct!(0..GLYPH_HEIGHT, 0..GLYPH_WIDTH).map(move |(row, column)| {
        QuadRecord::square(
            cell_center(column, row, window),
            BUTTON_SIZE,
            pixel_color(lit(font, glyph, column, row)),
        )
    })
}

/// Every glyph at 2px per pixel, eight glyphs per row.
pub fn preview_grid(font: &FontData) -> impl Iterator<Item = QuadRecord> + '_ {
    iproduct!(0..GLYPH_COUNT as u32, 0..GLYPH_HEIGHT, 0..GLYPH_WIDTH).map(
        move |(index, row, column)| {
            let glyph = GlyphCode::clamped((FIRST_GLYPH + index) as i64);
            QuadRecord::square(
                preview_pixel_center(glyph, column, row),
                SMALL_BUTTON_SIZE,
                pixel_color(lit(font, glyph, column, row)),
            )
        },
    )
}

/// Builds the whole editor frame. Same inputs, same quads.
pub fn build_editor_batch(
    font: &FontData,
    selection: &Selection,
    window: PhysicalSize<u32>,
) -> Vec<QuadRecord> {
    let mut quads = Vec::with_capacity(EDITOR_QUAD_COUNT);
    quads.push(marker(selection));
    quads.extend(zoomed_glyph(font, selection.glyph(), window));
    quads.extend(preview_grid(font));
    quads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{editor::apply_pointer, input::PointerState, selection::Navigate};
    use pretty_assertions::assert_eq;

    const WINDOW: PhysicalSize<u32> = PhysicalSize::new(640, 540);

    fn a() -> GlyphCode {
        GlyphCode::from_char('a').unwrap()
    }

    #[test]
    fn batch_size_is_fixed() {
        assert_eq!(EDITOR_QUAD_COUNT, 9313);
        let quads = build_editor_batch(&FontData::new(), &Selection::default(), WINDOW);
        assert_eq!(quads.len(), EDITOR_QUAD_COUNT);
        assert!(quads.len() <= crate::shapes::MAX_QUADS as usize);
    }

    #[test]
    fn blank_font_draws_only_the_marker() {
        let quads = build_editor_batch(&FontData::new(), &Selection::default(), WINDOW);
        assert_eq!(quads[0].color, pack_color([1.0, 0.0, 0.0, 1.0]));
        assert!(quads[1..].iter().all(|quad| quad.color == TRANSPARENT));
    }

    #[test]
    fn lit_pixel_shows_in_zoom_and_preview() {
        let mut font = FontData::new();
        font.set_pixel(a(), 3, 5, true).unwrap();
        let selection = Selection::new(a());
        let quads = build_editor_batch(&font, &selection, WINDOW);

        let zoomed = 1 + 5 * GLYPH_WIDTH + 3;
        assert_eq!(quads[zoomed].color, WHITE);
        assert_eq!(quads[zoomed].position, cell_center(3, 5, WINDOW));
        assert_eq!(quads[zoomed].width(), BUTTON_SIZE);

        let preview = 1 + PIXELS_PER_GLYPH + a().index() * PIXELS_PER_GLYPH + 5 * GLYPH_WIDTH + 3;
        assert_eq!(quads[preview].color, WHITE);
        assert_eq!(quads[preview].width(), SMALL_BUTTON_SIZE);
        let lit_count = quads.iter().filter(|quad| quad.color == WHITE).count();
        assert_eq!(lit_count, 2);
    }

    #[test]
    fn preview_layout_positions() {
        let space = GlyphCode::new(32).unwrap();
        assert_eq!(preview_pixel_center(space, 0, 0), [10.0, 10.0]);
        assert_eq!(preview_pixel_center(space, 7, 11), [24.0, 32.0]);
        // 'a' sits in block (1, 8)
        assert_eq!(preview_pixel_center(a(), 0, 0), [10.0 + 18.0, 10.0 + 8.0 * 26.0]);
    }

    #[test]
    fn marker_frames_selected_block() {
        let selection = Selection::new(a());
        let quad = marker(&selection);
        let [x, y, w, h] = quad.bounds();
        let first = preview_pixel_center(a(), 0, 0);
        let last = preview_pixel_center(a(), 7, 11);
        // pixel edges are one unit either side of their centers
        assert_eq!(x, first[0] - 1.0 - 2.0);
        assert_eq!(y, first[1] - 1.0 - 2.0);
        assert_eq!(x + w, last[0] + 1.0 + 2.0);
        assert_eq!(y + h, last[1] + 1.0 + 2.0);
    }

    #[test]
    fn marker_follows_navigation() {
        let mut selection = Selection::new(a());
        let before = marker(&selection);
        selection.apply(Navigate::RowUp);
        let after = marker(&selection);
        assert_eq!(after.position[0], before.position[0]);
        assert_eq!(after.position[1], before.position[1] + 26.0);
    }

    #[test]
    fn resize_moves_quads_not_glyphs() {
        let mut font = FontData::new();
        let selection = Selection::new(a());
        let small = PhysicalSize::new(640, 540);
        let large = PhysicalSize::new(800, 600);

        let [x, y] = cell_center(0, 0, small);
        let pointer = PointerState {
            x,
            y,
            left: true,
            right: false,
        };
        apply_pointer(&mut font, selection.glyph(), &pointer, small).unwrap();
        let saved = font.clone();

        let before = build_editor_batch(&font, &selection, small);
        let after = build_editor_batch(&font, &selection, large);
        assert_eq!(font, saved);
        assert_eq!(before.len(), after.len());

        for (i, (b, a)) in before.iter().zip(after.iter()).enumerate() {
            assert_eq!(b.color, a.color, "quad {i}");
            assert_eq!(b.size, a.size, "quad {i}");
            if (1..=PIXELS_PER_GLYPH).contains(&i) {
                assert_eq!(a.position[0] - b.position[0], 80.0);
                assert_eq!(a.position[1] - b.position[1], 30.0);
            } else {
                assert_eq!(a.position, b.position);
            }
        }
    }

    #[test]
    fn build_is_deterministic() {
        let font = FontData::from_bytes(&[0b1010_0101; 1152]);
        let selection = Selection::new(GlyphCode::new(100).unwrap());
        assert_eq!(
            build_editor_batch(&font, &selection, WINDOW),
            build_editor_batch(&font, &selection, WINDOW)
        );
    }
}
