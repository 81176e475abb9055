pub mod batch;
pub mod bind;
pub mod editor;
pub mod font;
pub mod geometry;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod quad;
pub mod render;
pub mod selection;
pub mod shapes;
pub mod text;
pub mod texture;
pub mod window;

