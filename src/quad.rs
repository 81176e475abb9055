use bytemuck::{Pod, Zeroable};

/// Index pattern of one quad, two triangles over corners 0..4.
pub const QUAD_INDEX_TEMPLATE: [u32; 6] = [0, 1, 2, 0, 2, 3];

pub const WHITE: u32 = u32::MAX;
pub const TRANSPARENT: u32 = 0;

/// One screen aligned rectangle as the quad shader reads it from the storage buffer.
/// `position` is the center in window pixels with a bottom-left origin.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadRecord {
    pub position: [f32; 2],
    pub size: u32,
    pub color: u32,
}

impl QuadRecord {
    pub fn new(position: [f32; 2], width: u16, height: u16, color: u32) -> Self {
        Self {
            position,
            size: pack_size(width, height),
            color,
        }
    }

    pub fn square(position: [f32; 2], side: u16, color: u32) -> Self {
        Self::new(position, side, side, color)
    }

    pub fn width(&self) -> u16 {
        unpack_size(self.size).0
    }

    pub fn height(&self) -> u16 {
        unpack_size(self.size).1
    }

    /// `(x, y, w, h)` of the covered area.
    pub fn bounds(&self) -> [f32; 4] {
        let (w, h) = unpack_size(self.size);
        let (w, h) = (w as f32, h as f32);
        [
            self.position[0] - w * 0.5,
            self.position[1] - h * 0.5,
            w,
            h,
        ]
    }
}

/// Quad record with an atlas coordinate, used for text.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TexturedQuad {
    pub position: [f32; 2],
    pub size: u32,
    pub color: u32,
    pub uv: [f32; 2],
    pub _padding: [f32; 2],
}

impl TexturedQuad {
    pub fn new(position: [f32; 2], width: u16, height: u16, color: u32, uv: [f32; 2]) -> Self {
        Self {
            position,
            size: pack_size(width, height),
            color,
            uv,
            _padding: [0.0; 2],
        }
    }
}

pub fn pack_size(width: u16, height: u16) -> u32 {
    width as u32 | (height as u32) << 16
}

pub fn unpack_size(size: u32) -> (u16, u16) {
    ((size & 0xFFFF) as u16, ((size >> 16) & 0xFFFF) as u16)
}

/// Packs a normalized color into rgba8, red in the lowest byte. Channels are clamped to [0, 1].
pub fn pack_color(color: [f32; 4]) -> u32 {
    color
        .iter()
        .enumerate()
        .fold(0u32, |acc, (channel, value)| {
            let byte = (value.clamp(0.0, 1.0) * 255.0) as u32 & 255;
            acc | byte << (channel * 8)
        })
}

pub fn unpack_color(color: u32) -> [f32; 4] {
    [0, 8, 16, 24].map(|shift| ((color >> shift) & 255) as f32 / 255.0)
}

/// Index buffer contents for `capacity` quads. Any prefix of `6 * n` indices draws the first `n` quads.
pub fn quad_indices(capacity: u32) -> Vec<u32> {
    (0..capacity)
        .flat_map(|quad| QUAD_INDEX_TEMPLATE.map(|corner| quad * 4 + corner))
        .collect()
}
