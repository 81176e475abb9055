use std::f32::consts::TAU;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use log::debug;
use nalgebra::{Rotation2, Vector2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use thiserror::Error;
use wgpu::ShaderStages;
use winit::dpi::PhysicalSize;

use crate::{
    bind::{BindEntry, BindHandle},
    geometry::IndexGeometry,
    pipeline::{PipelineBuilder, PipelineHandle},
    quad::WHITE,
    render::{DrawCommand, MeshHandle, Render},
    shapes::ScreenUniform,
};

/// The local vertex number lives in the low byte of an encoded index.
pub const MAX_MODEL_VERTICES: usize = 256;
pub const MAX_INSTANCES: usize = 1 << 24;

pub const ASTEROID_CORNERS: u32 = 32;
pub const ASTEROID_COUNT: usize = 100;
pub const ASTEROID_SEED: u64 = 100;
pub const FIELD_SIZE: f32 = 500.0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("model has {0} vertices, at most 256 fit an encoded index")]
    TooManyVertices(usize),
    #[error("index {index} is outside a model of {vertices} vertices")]
    IndexOutOfModel { index: u32, vertices: usize },
    #[error("scene is full")]
    TooManyInstances,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelVertex {
    pub pos: [f32; 3],
    pub _padding: f32,
}

impl ModelVertex {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            pos: [x, y, 0.5],
            _padding: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelInstance {
    pub position: [f32; 3],
    /// Radians.
    pub rotation: f32,
    pub color: u32,
    /// Scale in pixels.
    pub size: f32,
    pub vertex_start: u32,
    pub index_count: u32,
}

impl ModelInstance {
    pub fn at(x: f32, y: f32, size: f32, color: u32) -> Self {
        Self {
            position: [x, y, 0.0],
            rotation: 0.0,
            color,
            size,
            vertex_start: 0,
            index_count: 0,
        }
    }
}

pub fn encode_index(instance: u32, local: u32) -> u32 {
    (instance << 8) | (local & 0xff)
}

pub fn decode_index(encoded: u32) -> (u32, u32) {
    (encoded >> 8, encoded & 0xff)
}

/// Every model of a scene, flattened into one vertex array, one encoded index list and
/// one instance per model, so a single indexed draw renders all of them.
#[derive(Debug, Clone, Default)]
pub struct ModelScene {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub instances: Vec<ModelInstance>,
    spin: Vec<f32>,
}

impl ModelScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model and its instance. Returns the instance number.
    pub fn push_model(
        &mut self,
        vertices: &[ModelVertex],
        indices: &[u32],
        mut instance: ModelInstance,
    ) -> Result<u32, ModelError> {
        if vertices.len() > MAX_MODEL_VERTICES {
            return Err(ModelError::TooManyVertices(vertices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(ModelError::IndexOutOfModel {
                index,
                vertices: vertices.len(),
            });
        }
        if self.instances.len() >= MAX_INSTANCES {
            return Err(ModelError::TooManyInstances);
        }

        let instance_index = self.instances.len() as u32;
        instance.vertex_start = self.vertices.len() as u32;
        instance.index_count = indices.len() as u32;

        self.vertices.extend_from_slice(vertices);
        self.indices
            .extend(indices.iter().map(|&local| encode_index(instance_index, local)));
        self.instances.push(instance);
        self.spin.push(0.0);
        Ok(instance_index)
    }

    /// Rotation speed of `instance` in radians per millisecond.
    pub fn set_spin(&mut self, instance: u32, speed: f32) {
        if let Some(spin) = self.spin.get_mut(instance as usize) {
            *spin = speed;
        }
    }

    pub fn update(&mut self, dt_ms: f32) {
        for (instance, spin) in self.instances.iter_mut().zip(&self.spin) {
            instance.rotation = (instance.rotation + spin * dt_ms) % TAU;
        }
    }

    /// A triangle at (200, 200) followed by a reproducible field of [ASTEROID_COUNT] asteroids.
    pub fn asteroid_demo() -> Result<Self, ModelError> {
        let mut scene = Self::new();
        let (vertices, indices) = triangle_model();
        scene.push_model(&vertices, &indices, ModelInstance::at(200.0, 200.0, 10.0, WHITE))?;

        let mut rng = StdRng::seed_from_u64(ASTEROID_SEED);
        asteroid_field(&mut scene, &mut rng, ASTEROID_COUNT)?;
        debug!(
            "Asteroid scene: {} vertices, {} indices, {} instances",
            scene.vertices.len(),
            scene.indices.len(),
            scene.instances.len()
        );
        Ok(scene)
    }
}

pub fn triangle_model() -> (Vec<ModelVertex>, Vec<u32>) {
    (
        vec![
            ModelVertex::new(-1.0, -1.0),
            ModelVertex::new(0.0, 1.0),
            ModelVertex::new(1.0, -1.0),
        ],
        vec![0, 1, 2],
    )
}

/// A center vertex plus [ASTEROID_CORNERS] corners at a random radius, as a triangle fan.
pub fn asteroid_model<R: Rng>(rng: &mut R) -> (Vec<ModelVertex>, Vec<u32>) {
    let mut vertices = vec![ModelVertex::new(0.0, 0.0)];
    vertices.extend((0..ASTEROID_CORNERS).map(|i| {
        let angle = i as f32 * TAU / ASTEROID_CORNERS as f32;
        let radius = 0.8 + 0.2 * rng.gen::<f32>();
        let corner = Rotation2::new(angle) * Vector2::new(radius, 0.0);
        ModelVertex::new(corner.x, corner.y)
    }));

    let indices = (0..ASTEROID_CORNERS)
        .flat_map(|i| [0, 1 + i, 1 + (i + 1) % ASTEROID_CORNERS])
        .collect();
    (vertices, indices)
}

pub fn asteroid_field<R: Rng>(
    scene: &mut ModelScene,
    rng: &mut R,
    count: usize,
) -> Result<(), ModelError> {
    for _ in 0..count {
        let x = rng.gen_range(0.0..FIELD_SIZE);
        let y = rng.gen_range(0.0..FIELD_SIZE);
        let size = rng.gen_range(5.0..15.0);
        let (vertices, indices) = asteroid_model(rng);
        let instance = scene.push_model(&vertices, &indices, ModelInstance::at(x, y, size, WHITE))?;
        scene.set_spin(instance, rng.gen_range(-0.002..0.002));
    }
    Ok(())
}

pub const SCREEN_BINDING: u32 = 0;
pub const VERTICES_BINDING: u32 = 1;
pub const INSTANCES_BINDING: u32 = 2;

/// Draws a [ModelScene] with one indexed call. The model topology is fixed at creation;
/// instances are re-uploaded every frame.
pub struct ModelRenderer {
    pipeline: PipelineHandle,
    bind: BindHandle,
    mesh: MeshHandle,
    index_count: u32,
    instance_count: usize,
}

impl ModelRenderer {
    pub fn new(render: &mut Render, scene: &ModelScene) -> Result<Self> {
        let bind = render.build_bind(&[
            BindEntry::uniform::<ScreenUniform>(ShaderStages::VERTEX),
            BindEntry::storage::<ModelVertex>(ShaderStages::VERTEX, scene.vertices.len()),
            BindEntry::storage::<ModelInstance>(ShaderStages::VERTEX, scene.instances.len()),
        ])?;

        let pipeline = PipelineBuilder::new()
            .with_label("models")
            .with_format(render.surface_format())
            .with_cull_mode(None)
            .with_bind(bind)
            .with_shader(include_str!("shaders/model.wgsl"))
            .build(render)?;
        let pipeline = render.add_pipeline(pipeline);

        let mesh = render.add_mesh(&IndexGeometry {
            indices: scene.indices.clone(),
        });

        render.write_buffer(bytemuck::cast_slice(&scene.vertices), bind, VERTICES_BINDING)?;
        let renderer = Self {
            pipeline,
            bind,
            mesh,
            index_count: scene.indices.len() as u32,
            instance_count: scene.instances.len(),
        };
        renderer.set_screen_size(render, render.size())?;
        Ok(renderer)
    }

    pub fn set_screen_size(&self, render: &Render, size: PhysicalSize<u32>) -> Result<()> {
        let screen = ScreenUniform::new(size);
        render.write_buffer(bytemuck::bytes_of(&screen), self.bind, SCREEN_BINDING)
    }

    pub fn submit(&self, render: &mut Render, scene: &ModelScene) -> Result<()> {
        let instances = &scene.instances[..scene.instances.len().min(self.instance_count)];
        render.write_buffer(bytemuck::cast_slice(instances), self.bind, INSTANCES_BINDING)?;
        render.add_draw(DrawCommand {
            pipeline: self.pipeline,
            mesh: self.mesh,
            elements: 0..self.index_count,
            instances: 0..1,
        });
        Ok(())
    }
}
