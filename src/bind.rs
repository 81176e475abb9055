use std::num::NonZeroU32;

use anyhow::{anyhow, Result};
use generational_arena::Index;
use itertools::Itertools;
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, Buffer, BufferBinding, BufferDescriptor,
    BufferUsages, Device, Extent3d, FilterMode, Sampler, SamplerBindingType, SamplerDescriptor,
    ShaderStages, Texture, TextureDescriptor, TextureFormat, TextureSampleType, TextureUsages,
    TextureView, TextureViewDescriptor, TextureViewDimension, VertexAttribute,
    VertexBufferLayout, VertexStepMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindHandle(pub Index);

#[derive(Debug, Clone)]
pub enum BindEntryType {
    BufferUniform {
        size: u64,
        usages: BufferUsages,
    },
    BufferStorage {
        size: u64,
        read_only: bool,
        usages: BufferUsages,
    },
    Sampler {
        binding_type: SamplerBindingType,
        filter: FilterMode,
    },
    Texture {
        sample_type: TextureSampleType,
        view_dimension: TextureViewDimension,
        format: TextureFormat,
        size: Extent3d,
        usage: TextureUsages,
    },
}

pub enum BindEntryResource {
    Buffer(Buffer),
    Texture(Texture, TextureView),
    Sampler(Sampler),
}

impl BindEntryResource {
    pub fn buffer(&self) -> Result<&Buffer> {
        match self {
            BindEntryResource::Buffer(buffer) => Ok(buffer),
            _ => Err(anyhow!("Bind entry is not a buffer.")),
        }
    }

    pub fn sampler(&self) -> Result<&Sampler> {
        match self {
            BindEntryResource::Sampler(sampler) => Ok(sampler),
            _ => Err(anyhow!("Bind entry is not a sampler.")),
        }
    }

    pub fn texture_view(&self) -> Result<(&Texture, &TextureView)> {
        match self {
            BindEntryResource::Texture(texture, view) => Ok((texture, view)),
            _ => Err(anyhow!("Bind entry is not a texture.")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BindEntry {
    pub visibility: ShaderStages,
    pub ty: BindEntryType,
    pub count: Option<NonZeroU32>,
}

impl BindEntry {
    pub fn uniform<T>(visibility: ShaderStages) -> Self {
        Self {
            visibility,
            ty: BindEntryType::BufferUniform {
                size: std::mem::size_of::<T>() as u64,
                usages: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            },
            count: None,
        }
    }

    /// A read-only storage buffer large enough for `capacity` records of `T`.
    pub fn storage<T>(visibility: ShaderStages, capacity: usize) -> Self {
        Self {
            visibility,
            ty: BindEntryType::BufferStorage {
                size: (std::mem::size_of::<T>() * capacity.max(1)) as u64,
                read_only: true,
                usages: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            },
            count: None,
        }
    }

    pub fn layout_entry(&self, binding: u32) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility: self.visibility,
            ty: match &self.ty {
                BindEntryType::BufferUniform { .. } => wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                BindEntryType::BufferStorage { read_only, .. } => wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage {
                        read_only: *read_only,
                    },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                BindEntryType::Sampler { binding_type, .. } => {
                    wgpu::BindingType::Sampler(*binding_type)
                }
                BindEntryType::Texture {
                    sample_type,
                    view_dimension,
                    ..
                } => wgpu::BindingType::Texture {
                    sample_type: *sample_type,
                    view_dimension: *view_dimension,
                    multisampled: false,
                },
            },
            count: self.count,
        }
    }

    pub fn group_entry<'b>(
        &self,
        binding: u32,
        resource: &'b BindEntryResource,
    ) -> Result<BindGroupEntry<'b>> {
        let binding_resource = match &self.ty {
            BindEntryType::BufferUniform { .. } | BindEntryType::BufferStorage { .. } => {
                wgpu::BindingResource::Buffer(BufferBinding {
                    buffer: resource.buffer()?,
                    offset: 0,
                    size: None,
                })
            }
            BindEntryType::Sampler { .. } => wgpu::BindingResource::Sampler(resource.sampler()?),
            BindEntryType::Texture { .. } => {
                wgpu::BindingResource::TextureView(resource.texture_view()?.1)
            }
        };

        Ok(BindGroupEntry {
            binding,
            resource: binding_resource,
        })
    }

    pub fn binding_resource(&self, device: &Device) -> BindEntryResource {
        match &self.ty {
            BindEntryType::BufferUniform { size, usages }
            | BindEntryType::BufferStorage { size, usages, .. } => {
                BindEntryResource::Buffer(device.create_buffer(&BufferDescriptor {
                    label: None,
                    size: *size,
                    usage: *usages,
                    mapped_at_creation: false,
                }))
            }
            BindEntryType::Sampler { filter, .. } => {
                BindEntryResource::Sampler(device.create_sampler(&SamplerDescriptor {
                    address_mode_u: AddressMode::ClampToEdge,
                    address_mode_v: AddressMode::ClampToEdge,
                    mag_filter: *filter,
                    min_filter: *filter,
                    ..Default::default()
                }))
            }
            BindEntryType::Texture {
                view_dimension,
                format,
                size,
                usage,
                ..
            } => {
                let (texture, view) = create_texture(device, *size, *view_dimension, *format, *usage);
                BindEntryResource::Texture(texture, view)
            }
        }
    }
}

fn create_texture(
    device: &Device,
    size: Extent3d,
    view_dimension: TextureViewDimension,
    format: TextureFormat,
    usage: TextureUsages,
) -> (Texture, TextureView) {
    let texture = device.create_texture(&TextureDescriptor {
        label: None,
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: view_dimension.compatible_texture_dimension(),
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&TextureViewDescriptor::default());
    (texture, view)
}

/// A bind group together with the resources it binds, one per entry, in binding order.
pub struct Bind {
    pub bg: BindGroup,
    pub bgl: BindGroupLayout,
    pub resources: Vec<BindEntryResource>,
    pub bind_entries: Vec<BindEntry>,
}

impl Bind {
    pub fn new(bind_entries: Vec<BindEntry>, device: &Device) -> Result<Self> {
        let layout_entries = bind_entries
            .iter()
            .enumerate()
            .map(|(idx, g)| g.layout_entry(idx as u32))
            .collect_vec();

        let bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: None,
            entries: &layout_entries,
        });
        let resources = bind_entries
            .iter()
            .map(|g| g.binding_resource(device))
            .collect_vec();

        let bg = Self::create_bind_group(device, &bgl, &bind_entries, &resources)?;

        Ok(Self {
            bg,
            bgl,
            resources,
            bind_entries,
        })
    }

    fn create_bind_group(
        device: &Device,
        bgl: &BindGroupLayout,
        bind_entries: &[BindEntry],
        resources: &[BindEntryResource],
    ) -> Result<BindGroup> {
        let group_entries = bind_entries
            .iter()
            .zip(resources)
            .enumerate()
            .map(|(idx, (g, resource))| g.group_entry(idx as u32, resource))
            .collect::<Result<Vec<_>>>()?;
        Ok(device.create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: bgl,
            entries: &group_entries,
        }))
    }

    pub fn resource(&self, binding: u32) -> Result<&BindEntryResource> {
        self.resources
            .get(binding as usize)
            .ok_or(anyhow!("No resource at binding {}.", binding))
    }
}

pub struct VertexBufferEntry {
    pub array_stride: u64,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexBufferEntry {
    pub fn layout(&self) -> VertexBufferLayout {
        VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: self.attributes.as_slice(),
        }
    }
}
