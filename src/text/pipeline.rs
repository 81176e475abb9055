use anyhow::Result;
use wgpu::{
    Extent3d, FilterMode, SamplerBindingType, ShaderStages, TextureFormat, TextureSampleType,
    TextureUsages, TextureViewDimension,
};

use crate::{
    bind::{BindEntry, BindEntryType},
    font::FontData,
    pipeline::PipelineBuilder,
    quad::TexturedQuad,
    render::Render,
    shapes::{QuadBatch, ScreenUniform},
    texture::{Texture, ATLAS_HEIGHT, ATLAS_WIDTH},
};

pub const ATLAS_BINDING: u32 = 2;

/// Quad batch whose records sample the font atlas. The atlas starts blank; fill it with [upload_atlas].
pub fn text_batch(render: &mut Render, capacity: u32) -> Result<QuadBatch> {
    let bind = render.build_bind(&[
        BindEntry::uniform::<ScreenUniform>(ShaderStages::VERTEX),
        BindEntry::storage::<TexturedQuad>(ShaderStages::VERTEX, capacity as usize),
        // font atlas
        BindEntry {
            visibility: ShaderStages::FRAGMENT,
            ty: BindEntryType::Texture {
                sample_type: TextureSampleType::Float { filterable: false },
                view_dimension: TextureViewDimension::D2,
                format: TextureFormat::Rgba8Unorm,
                size: Extent3d {
                    width: ATLAS_WIDTH,
                    height: ATLAS_HEIGHT,
                    depth_or_array_layers: 1,
                },
                usage: TextureUsages::COPY_DST | TextureUsages::TEXTURE_BINDING,
            },
            count: None,
        },
        // sampler
        BindEntry {
            visibility: ShaderStages::FRAGMENT,
            ty: BindEntryType::Sampler {
                binding_type: SamplerBindingType::NonFiltering,
                filter: FilterMode::Nearest,
            },
            count: None,
        },
    ])?;

    let pipeline = PipelineBuilder::new()
        .with_label("text")
        .with_format(render.surface_format())
        .with_cull_mode(None)
        .with_bind(bind)
        .with_shader(include_str!("../shaders/text.wgsl"))
        .build(render)?;
    let pipeline = render.add_pipeline(pipeline);

    let batch = QuadBatch::new(render, pipeline, bind, capacity);
    batch.set_screen_size(render, render.size())?;
    Ok(batch)
}

/// Rebuilds the atlas from `font` and uploads it to the batch's texture.
pub fn upload_atlas(render: &Render, batch: &QuadBatch, font: &FontData) -> Result<()> {
    let atlas = Texture::from_font(font);
    render.write_texture(&atlas.data, atlas.extent(), batch.bind, ATLAS_BINDING)
}
