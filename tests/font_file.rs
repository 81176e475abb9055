use pretty_assertions::assert_eq;
use quadfont::{
    editor::{apply_pointer, cell_center},
    font::{FontData, GlyphCode, FONT_DATA_LEN},
    input::PointerState,
    selection::{Navigate, Selection},
};
use winit::dpi::PhysicalSize;

const WINDOW: PhysicalSize<u32> = PhysicalSize::new(640, 540);

fn left_click(column: usize, row: usize) -> PointerState {
    let [x, y] = cell_center(column, row, WINDOW);
    PointerState {
        left: true,
        ..PointerState::at(x, y)
    }
}

#[test]
fn paint_save_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new_font.dat");

    let mut font = FontData::new();
    let mut selection = Selection::default();
    selection.apply(Navigate::Select('a'));
    assert_eq!(selection.glyph().code(), 97);

    let edit = apply_pointer(&mut font, selection.glyph(), &left_click(0, 0), WINDOW);
    assert!(edit.is_some());

    font.save(&path).unwrap();
    let mut loaded = FontData::new();
    loaded.reload(&path).unwrap();

    let mut expected = vec![0u8; FONT_DATA_LEN];
    expected[780] = 0b0000_0001;
    assert_eq!(loaded.as_bytes(), expected.as_slice());
}

#[test]
fn save_creates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.dat");
    assert!(!path.exists());

    FontData::new().save(&path).unwrap();

    assert_eq!(std::fs::metadata(&path).unwrap().len(), FONT_DATA_LEN as u64);
}

#[test]
fn arbitrary_bytes_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.dat");
    let bytes: Vec<u8> = (0..FONT_DATA_LEN).map(|i| (i * 37 % 251) as u8).collect();

    FontData::from_bytes(&bytes).save(&path).unwrap();

    assert_eq!(FontData::load(&path).unwrap().as_bytes(), bytes.as_slice());
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}

#[test]
fn wrong_sized_files_are_normalized() {
    let dir = tempfile::tempdir().unwrap();

    let short = dir.path().join("short.dat");
    std::fs::write(&short, [0xffu8; 10]).unwrap();
    let font = FontData::load(&short).unwrap();
    assert_eq!(font.as_bytes().len(), FONT_DATA_LEN);
    assert_eq!(&font.as_bytes()[..10], &[0xff; 10]);
    assert!(font.as_bytes()[10..].iter().all(|&b| b == 0));

    let long = dir.path().join("long.dat");
    std::fs::write(&long, vec![1u8; FONT_DATA_LEN + 5]).unwrap();
    assert_eq!(FontData::load(&long).unwrap().as_bytes(), vec![1u8; FONT_DATA_LEN].as_slice());
}

#[test]
fn failed_reload_keeps_glyphs() {
    let dir = tempfile::tempdir().unwrap();
    let mut font = FontData::new();
    let a = GlyphCode::from_char('a').unwrap();
    font.set_pixel(a, 2, 3, true).unwrap();

    let err = font.reload(dir.path().join("missing.dat")).unwrap_err();

    assert!(err.is_not_found());
    assert!(font.pixel(a, 2, 3).unwrap());
}

#[test]
fn resize_keeps_font_bytes() {
    let mut font = FontData::new();
    let glyph = Selection::default().glyph();
    apply_pointer(&mut font, glyph, &left_click(3, 4), WINDOW);
    let before = font.as_bytes().to_vec();

    // the same screen position lands on a different cell after the resize, but nothing is held
    let resized = PhysicalSize::new(800, 600);
    let [x, y] = cell_center(3, 4, WINDOW);
    apply_pointer(&mut font, glyph, &PointerState::at(x, y), resized);

    assert_eq!(font.as_bytes(), before.as_slice());
}
