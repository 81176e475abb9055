use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use log::warn;
use wgpu::ShaderStages;
use winit::dpi::PhysicalSize;

use crate::{
    bind::{BindEntry, BindHandle},
    geometry::IndexGeometry,
    pipeline::{PipelineBuilder, PipelineHandle},
    quad::QuadRecord,
    render::{DrawCommand, MeshHandle, Render},
};

/// Largest number of quads one batch can draw per frame.
pub const MAX_QUADS: u32 = 10240;

pub const SCREEN_BINDING: u32 = 0;
pub const QUADS_BINDING: u32 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ScreenUniform {
    pub size: [f32; 2],
    pub _padding: [f32; 2],
}

impl ScreenUniform {
    pub fn new(size: PhysicalSize<u32>) -> Self {
        Self {
            size: [size.width.max(1) as f32, size.height.max(1) as f32],
            _padding: [0.0; 2],
        }
    }
}

/// Number of records of a `submitted`-long batch that fit into `capacity`.
pub fn clamp_to_capacity(submitted: usize, capacity: u32) -> u32 {
    if submitted > capacity as usize {
        warn!(
            "Dropping {} quads over the batch capacity of {}",
            submitted - capacity as usize,
            capacity
        );
    }
    submitted.min(capacity as usize) as u32
}

/// A storage buffer of quad records drawn through a static index buffer.
/// The index buffer is built once for `capacity` quads; each frame only the index count changes.
pub struct QuadBatch {
    pub pipeline: PipelineHandle,
    pub bind: BindHandle,
    pub mesh: MeshHandle,
    pub capacity: u32,
}

impl QuadBatch {
    pub fn new(render: &mut Render, pipeline: PipelineHandle, bind: BindHandle, capacity: u32) -> Self {
        let mesh = render.add_mesh(&IndexGeometry::quads(capacity));
        Self {
            pipeline,
            bind,
            mesh,
            capacity,
        }
    }

    pub fn set_screen_size(&self, render: &Render, size: PhysicalSize<u32>) -> Result<()> {
        let screen = ScreenUniform::new(size);
        render.write_buffer(bytemuck::bytes_of(&screen), self.bind, SCREEN_BINDING)
    }

    /// Replaces the batch contents and queues its draw. Returns how many quads will be drawn.
    pub fn submit<Q: Pod>(&self, render: &mut Render, records: &[Q]) -> Result<u32> {
        let count = clamp_to_capacity(records.len(), self.capacity);
        render.write_buffer(
            bytemuck::cast_slice(&records[..count as usize]),
            self.bind,
            QUADS_BINDING,
        )?;
        render.add_draw(DrawCommand {
            pipeline: self.pipeline,
            mesh: self.mesh,
            elements: 0..count * 6,
            instances: 0..1,
        });
        Ok(count)
    }
}

/// Pipeline for solid colored [QuadRecord]s.
pub fn quad_batch(render: &mut Render, capacity: u32) -> Result<QuadBatch> {
    let bind = render.build_bind(&[
        BindEntry::uniform::<ScreenUniform>(ShaderStages::VERTEX),
        BindEntry::storage::<QuadRecord>(ShaderStages::VERTEX, capacity as usize),
    ])?;

    let pipeline = PipelineBuilder::new()
        .with_label("quads")
        .with_format(render.surface_format())
        .with_cull_mode(None)
        // unlit pixels are transparent black and must still cover what is below
        .with_blend(None)
        .with_bind(bind)
        .with_shader(include_str!("shaders/quad.wgsl"))
        .build(render)?;
    let pipeline = render.add_pipeline(pipeline);

    let batch = QuadBatch::new(render, pipeline, bind, capacity);
    batch.set_screen_size(render, render.size())?;
    Ok(batch)
}
