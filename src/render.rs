use std::{ops::Range, sync::Arc};

use anyhow::{anyhow, Context, Result};
use generational_arena::{Arena, Index};
use log::{debug, error, info};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    Buffer, BufferUsages, Color, CommandEncoderDescriptor, Device, DeviceDescriptor, Extent3d,
    ImageCopyTexture, ImageDataLayout, Instance, Operations, Origin3d, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RequestAdapterOptions, StoreOp, Surface,
    SurfaceConfiguration, SurfaceError, TextureAspect, TextureFormat, TextureViewDescriptor,
};
pub use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    bind::{Bind, BindEntry, BindHandle},
    geometry::Geometry,
    pipeline::{Pipeline, PipelineHandle},
};

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub struct MeshHandle(pub Index);

/// GPU buffers of a mesh. `vertex` is absent for meshes that pull vertices from storage.
pub struct Mesh {
    pub vertex: Option<Buffer>,
    pub index: Option<Buffer>,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// One queued draw. `elements` counts indices for indexed meshes and vertices otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCommand {
    pub pipeline: PipelineHandle,
    pub mesh: MeshHandle,
    pub elements: Range<u32>,
    pub instances: Range<u32>,
}

// renderer owns the gpu objects and draws whatever was queued since the last frame
pub struct Render {
    device: Device,
    queue: Queue,
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    pipelines: Arena<Pipeline>,
    binds: Arena<Bind>,
    meshes: Arena<Mesh>,
    draws: Vec<DrawCommand>,
    clear_color: Color,
}

impl Render {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = Instance::default();
        let size = window.inner_size();

        let surface = instance.create_surface(window)?;

        let (adapter, device, queue) = pollster::block_on(async {
            let adapter = instance
                .request_adapter(&RequestAdapterOptions {
                    compatible_surface: Some(&surface),
                    ..Default::default()
                })
                .await
                .ok_or(anyhow!("No suitable adapter found."))?;

            let (device, queue) = adapter
                .request_device(&DeviceDescriptor::default(), None)
                .await?;

            Ok::<(wgpu::Adapter, wgpu::Device, wgpu::Queue), anyhow::Error>((
                adapter, device, queue,
            ))
        })?;

        let info = adapter.get_info();
        info!("Adapter: {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        // errors that nobody scoped are the equivalent of a high severity driver message
        device.on_uncaptured_error(Box::new(|err| {
            error!("Unrecoverable gpu error: {}", err);
            error!("Aborting...");
            std::process::abort();
        }));

        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(anyhow!("Surface isn't supported by the adapter."))?;
        config.format = *surface
            .get_capabilities(&adapter)
            .formats
            .first()
            .ok_or(anyhow!("No formats found."))?;
        config.present_mode = wgpu::PresentMode::Fifo;
        surface.configure(&device, &config);
        info!("Screen res: {}:{}", config.width, config.height);

        Ok(Self {
            device,
            queue,
            surface,
            config,
            pipelines: Arena::new(),
            binds: Arena::new(),
            meshes: Arena::new(),
            draws: Vec::new(),
            clear_color: Color {
                r: 0.0,
                g: 0.5,
                b: 1.0,
                a: 0.0,
            },
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn set_clear_color(&mut self, clear_color: Color) {
        self.clear_color = clear_color;
    }

    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> PipelineHandle {
        PipelineHandle(self.pipelines.insert(pipeline))
    }

    pub fn build_bind(&mut self, bind_entries: &[BindEntry]) -> Result<BindHandle> {
        let bind = Bind::new(bind_entries.to_vec(), &self.device)?;
        Ok(BindHandle(self.binds.insert(bind)))
    }

    pub fn get_bind(&self, handle: BindHandle) -> Result<&Bind> {
        self.binds
            .get(handle.0)
            .ok_or(anyhow!("No Bind for handle {:?}.", handle))
    }

    /// Overwrites the start of the buffer at `binding`. The write lands before the next submit.
    pub fn write_buffer(&self, data: &[u8], handle: BindHandle, binding: u32) -> Result<()> {
        let buffer = self.get_bind(handle)?.resource(binding)?.buffer()?;
        if data.len() as u64 > buffer.size() {
            return Err(anyhow!(
                "{} bytes don't fit the {} byte buffer at binding {}.",
                data.len(),
                buffer.size(),
                binding
            ));
        }
        if !data.is_empty() {
            self.queue.write_buffer(buffer, 0, data);
        }
        Ok(())
    }

    /// Uploads an rgba8 image to the texture at `binding`. The image must match the texture size.
    pub fn write_texture(
        &self,
        data: &[u8],
        size: Extent3d,
        handle: BindHandle,
        binding: u32,
    ) -> Result<()> {
        let (texture, _) = self.get_bind(handle)?.resource(binding)?.texture_view()?;
        check_texture_size(texture.size(), size, binding)?;

        self.queue.write_texture(
            ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            data,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: None,
            },
            size,
        );
        Ok(())
    }

    pub fn add_mesh<G: Geometry>(&mut self, geometry: &G) -> MeshHandle {
        let vertex = (!geometry.contents().is_empty()).then(|| {
            self.device.create_buffer_init(&BufferInitDescriptor {
                label: None,
                contents: geometry.contents(),
                usage: BufferUsages::VERTEX,
            })
        });
        let index = geometry.indices().map(|indices| {
            self.device.create_buffer_init(&BufferInitDescriptor {
                label: None,
                contents: bytemuck::cast_slice(indices),
                usage: BufferUsages::INDEX,
            })
        });
        let mesh = Mesh {
            vertex,
            index,
            vertex_count: geometry.length(),
            index_count: geometry.indices().map_or(0, |indices| indices.len() as u32),
        };
        MeshHandle(self.meshes.insert(mesh))
    }

    /// Queues a draw for the next [Render::draw]. Draws run in the order they were added.
    pub fn add_draw(&mut self, draw: DrawCommand) {
        if !draw.elements.is_empty() && !draw.instances.is_empty() {
            self.draws.push(draw);
        }
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            debug!("Ignoring resize to {}x{}", size.width, size.height);
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        info!("Window size: {}: {}", size.width, size.height);
    }

    pub fn draw(&mut self) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                debug!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.draws.clear();
                return Ok(());
            }
            Err(err) => return Err(err).context("Couldn't acquire the next frame"),
        };

        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor::default());

        let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let mut current_pipeline = None;
        for draw in &self.draws {
            let pipeline = self
                .pipelines
                .get(draw.pipeline.0)
                .ok_or(anyhow!("No pipeline found at index {:?}.", draw.pipeline))?;
            // only rebind when the pipeline changes between consecutive draws
            if current_pipeline != Some(draw.pipeline) {
                rpass.set_pipeline(&pipeline.pipeline);
                for (idx, handle) in pipeline.binds.iter().enumerate() {
                    let bind = self
                        .binds
                        .get(handle.0)
                        .ok_or(anyhow!("No Bind for handle {:?}.", handle))?;
                    rpass.set_bind_group(idx as u32, &bind.bg, &[]);
                }
                current_pipeline = Some(draw.pipeline);
            }

            let mesh = self
                .meshes
                .get(draw.mesh.0)
                .ok_or(anyhow!("Mesh not found for handle id {:?}", draw.mesh.0))?;
            if let Some(vertex_buffer) = &mesh.vertex {
                rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
            }
            if let Some(index_buffer) = &mesh.index {
                let end = draw.elements.end.min(mesh.index_count);
                rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(draw.elements.start..end, 0, draw.instances.clone());
            } else {
                let end = draw.elements.end.min(mesh.vertex_count);
                rpass.draw(draw.elements.start..end, draw.instances.clone());
            }
        }

        drop(rpass);

        self.queue.submit([encoder.finish()]);

        frame.present();

        self.draws.clear();
        Ok(())
    }
}

fn check_texture_size(texture: Extent3d, image: Extent3d, binding: u32) -> Result<()> {
    if texture != image {
        return Err(anyhow!(
            "A {}x{} image doesn't fit the {}x{} texture at binding {}.",
            image.width,
            image.height,
            texture.width,
            texture.height,
            binding
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(width: u32, height: u32) -> Extent3d {
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    #[test]
    fn texture_upload_needs_matching_size() {
        assert!(check_texture_size(extent(768, 12), extent(768, 12), 2).is_ok());

        let err = check_texture_size(extent(768, 12), extent(800, 12), 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "A 800x12 image doesn't fit the 768x12 texture at binding 2."
        );
        assert!(check_texture_size(extent(768, 12), extent(768, 13), 2).is_err());
    }
}
