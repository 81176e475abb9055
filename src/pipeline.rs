use std::mem::take;

use anyhow::{anyhow, bail, Context, Result};
use generational_arena::Index;
use wgpu::{
    BlendState, ColorTargetState, ColorWrites, Device, ErrorFilter, Face, FragmentState,
    MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor, PrimitiveState,
    RenderPipeline, RenderPipelineDescriptor, ShaderModule, ShaderModuleDescriptor, TextureFormat,
    VertexAttribute, VertexState, VertexStepMode,
};

use crate::{
    bind::{BindHandle, VertexBufferEntry},
    render::Render,
};

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct PipelineHandle(pub Index);

/// A render pipeline plus the binds it expects, in group order.
/// Built with a [PipelineBuilder]:
/// ```ignore
/// let pipeline = PipelineBuilder::new()
///     .with_format(render.surface_format())
///     .with_bind(bind)
///     .with_shader(include_str!("shaders/quad.wgsl"))
///     .build(&render)?;
/// ```
pub struct Pipeline {
    pub pipeline: RenderPipeline,
    pub binds: Vec<BindHandle>,
}

pub struct PipelineBuilder {
    binds: Vec<BindHandle>,
    shader_src: Option<String>,
    label: Option<String>,
    primitive_state: PrimitiveState,
    format: TextureFormat,
    blend: Option<BlendState>,
    vertex_entries: Vec<VertexBufferEntry>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            binds: Vec::new(),
            shader_src: None,
            label: None,
            primitive_state: PrimitiveState::default(),
            format: TextureFormat::Bgra8UnormSrgb,
            blend: Some(BlendState::ALPHA_BLENDING),
            vertex_entries: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: Option<Face>) -> Self {
        self.primitive_state.cull_mode = cull_mode;
        self
    }

    pub fn with_shader(mut self, shader_src: &str) -> Self {
        self.shader_src = Some(shader_src.into());
        self
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// `None` writes fragments as they are, without blending.
    pub fn with_blend(mut self, blend: Option<BlendState>) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_bind(mut self, handle: BindHandle) -> Self {
        self.binds.push(handle);
        self
    }

    pub fn with_vb<T>(mut self, step_mode: VertexStepMode, attributes: &[VertexAttribute]) -> Self {
        self.vertex_entries.push(VertexBufferEntry {
            array_stride: std::mem::size_of::<T>() as u64,
            step_mode,
            attributes: attributes.into(),
        });
        self
    }

    fn create_module(&self, device: &Device) -> Result<ShaderModule> {
        let source = self
            .shader_src
            .as_ref()
            .ok_or(anyhow!("Shader source should be set."))?;

        device.push_error_scope(ErrorFilter::Validation);
        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: self.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            bail!("Shader compilation failed: {}", error);
        }
        Ok(module)
    }

    pub fn build(&mut self, render: &Render) -> Result<Pipeline> {
        let bgls = self
            .binds
            .iter()
            .map(|handle| render.get_bind(*handle).map(|bind| &bind.bgl))
            .collect::<Result<Vec<_>>>()?;

        let device = render.device();
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: bgls.as_slice(),
            push_constant_ranges: &[],
        });

        let module = self
            .create_module(device)
            .with_context(|| format!("Couldn't build pipeline {:?}", self.label))?;

        let vbs = self
            .vertex_entries
            .iter()
            .map(|ent| ent.layout())
            .collect::<Vec<_>>();

        device.push_error_scope(ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: self.label.as_deref(),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &module,
                entry_point: "vertex",
                buffers: vbs.as_slice(),
                compilation_options: PipelineCompilationOptions::default(),
            },
            primitive: self.primitive_state,
            // the 2d demos draw in submission order, no depth test
            depth_stencil: None,
            multisample: MultisampleState::default(),
            fragment: Some(FragmentState {
                module: &module,
                entry_point: "fragment",
                targets: &[Some(ColorTargetState {
                    format: self.format,
                    blend: self.blend,
                    write_mask: ColorWrites::all(),
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            multiview: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            bail!("Pipeline {:?} failed to link: {}", self.label, error);
        }

        Ok(Pipeline {
            pipeline,
            binds: take(&mut self.binds),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
