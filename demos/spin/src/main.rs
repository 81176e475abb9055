use std::sync::Arc;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use clap::{Parser, ValueEnum};
use nalgebra::{Rotation3, Vector3};
use quadfont::{
    bind::{BindEntry, BindHandle},
    geometry::{quad_geometry, triangle_geometry, Geometry, Vertex},
    input::InputEvent,
    pipeline::{PipelineBuilder, PipelineHandle},
    render::{DrawCommand, MeshHandle, Render},
    window::{make_window, App, AppLoop},
};
use wgpu::{vertex_attr_array, ShaderStages};
use winit::{
    dpi::PhysicalSize,
    keyboard::{Key, NamedKey},
    window::Window,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Shape {
    Triangle,
    Quad,
}

#[derive(Parser)]
#[command(about = "A rotating triangle or quad")]
struct Cli {
    #[arg(help = "Shape to spin.", long, value_enum, default_value_t = Shape::Triangle)]
    shape: Shape,

    #[arg(help = "Frames per second.", long, default_value_t = 60.0)]
    fps: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SpinUniform {
    transform: [[f32; 4]; 4],
    color: [f32; 4],
}

const ORANGE: [f32; 4] = [1.0, 0.5, 0.2, 1.0];
/// Radians per millisecond.
const SPIN_SPEED: f32 = 0.001;

struct Spin {
    render: Render,
    pipeline: PipelineHandle,
    bind: BindHandle,
    mesh: MeshHandle,
    elements: u32,
    angle: f32,
}

impl Spin {
    fn update_uniform(&self) -> Result<()> {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), self.angle);
        let uniform = SpinUniform {
            transform: rotation.to_homogeneous().into(),
            color: ORANGE,
        };
        self.render
            .write_buffer(bytemuck::bytes_of(&uniform), self.bind, 0)
    }
}

impl AppLoop for Spin {
    type Config = Shape;

    fn init(window: Arc<Window>, _app: &App, shape: Shape) -> Result<Self> {
        let mut render = Render::new(window)?;

        let bind = render.build_bind(&[BindEntry::uniform::<SpinUniform>(
            ShaderStages::VERTEX | ShaderStages::FRAGMENT,
        )])?;

        let pipeline = PipelineBuilder::new()
            .with_label("spin")
            .with_format(render.surface_format())
            .with_cull_mode(None)
            .with_bind(bind)
            .with_shader(include_str!("shader.wgsl"))
            .with_vb::<Vertex>(
                wgpu::VertexStepMode::Vertex,
                &vertex_attr_array![0 => Float32x3],
            )
            .build(&render)?;
        let pipeline = render.add_pipeline(pipeline);

        let geometry = match shape {
            Shape::Triangle => triangle_geometry(),
            Shape::Quad => quad_geometry(),
        };
        let elements = geometry
            .indices()
            .map_or(geometry.length(), |indices| indices.len() as u32);
        let mesh = render.add_mesh(&geometry);

        let spin = Self {
            render,
            pipeline,
            bind,
            mesh,
            elements,
            angle: 0.0,
        };
        spin.update_uniform()?;
        Ok(spin)
    }

    fn draw(&mut self, app: &mut App) -> Result<()> {
        self.angle += SPIN_SPEED * app.frame_time().as_secs_f32() * 1000.0;
        self.update_uniform()?;

        self.render.add_draw(DrawCommand {
            pipeline: self.pipeline,
            mesh: self.mesh,
            elements: 0..self.elements,
            instances: 0..1,
        });
        self.render.draw()?;

        app.set_title(&app.frame_stats());
        Ok(())
    }

    fn input(&mut self, input: InputEvent, app: &mut App) {
        let InputEvent::KeyboardInput(key) = input else {
            return;
        };
        let quit = key.pressed
            && (key.key == Key::Named(NamedKey::Escape)
                || key.character().map(|c| c.to_ascii_lowercase()) == Some('q'));
        if quit {
            app.exit();
        }
    }

    fn resized(&mut self, new_size: PhysicalSize<u32>, _app: &App) {
        self.render.resize(new_size);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    make_window()
        .with_title("spin")
        .with_framerate(cli.fps)
        .run::<Spin>(cli.shape)
}
