// text is drawn from the bitmap font itself:
// - the font store is turned into a 768x12 atlas, one 8px column per glyph
// - every character becomes a textured quad pointing at its column
// - the quads go through the same static index buffer as the solid quads

pub mod pipeline;
pub mod text_builder;

pub use text_builder::{add_text, update_text, Cursor};
