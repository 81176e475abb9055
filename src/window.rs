use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use log::{debug, error};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::ModifiersState,
    window::{Window, WindowId},
};

use crate::input::{InputEvent, PointerState};

pub trait AppLoop: Sized {
    /// Whatever the demo needs from its command line.
    type Config;

    fn init(window: Arc<Window>, app: &App, config: Self::Config) -> Result<Self>;

    fn draw(&mut self, app: &mut App) -> Result<()>;

    fn input(&mut self, _input: InputEvent, _app: &mut App) {}

    fn resized(&mut self, _new_size: PhysicalSize<u32>, _app: &App) {}
}

/// Window configuration plus the state every demo reads each frame: size, pointer, modifiers,
/// frame time. Passed explicitly to the [AppLoop] callbacks.
pub struct App {
    title: String,
    frame_rate: f32,
    window_size: (u32, u32),
    window: Option<Arc<Window>>,
    size: PhysicalSize<u32>,
    pointer: PointerState,
    modifiers: ModifiersState,
    frame_time: Duration,
    exit_requested: bool,
}

impl App {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_framerate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate.max(1.0);
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn window_size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Duration of the previous frame.
    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// `"{ms}ms, fps: {fps}"` for the previous frame, the start of every demo's title.
    pub fn frame_stats(&self) -> String {
        let ms = self.frame_time.as_secs_f32() * 1000.0;
        let fps = if ms > 0.0 { 1000.0 / ms } else { 0.0 };
        format!("{:2.2}ms, fps: {:4.2}", ms, fps)
    }

    pub fn set_title(&self, title: &str) {
        if let Some(window) = &self.window {
            window.set_title(title);
        }
    }

    pub fn exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn run<T: AppLoop>(self, config: T::Config) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = Runner::<T> {
            app: self,
            app_loop: None,
            config: Some(config),
            last_frame: Instant::now(),
            failure: None,
        };
        event_loop.run_app(&mut runner)?;

        match runner.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.frame_rate)
    }
}

struct Runner<T: AppLoop> {
    app: App,
    app_loop: Option<T>,
    config: Option<T::Config>,
    last_frame: Instant,
    failure: Option<anyhow::Error>,
}

impl<T: AppLoop> Runner<T> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.failure = Some(err);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let config = self
            .config
            .take()
            .ok_or(anyhow!("The app was already started."))?;
        let attributes = Window::default_attributes()
            .with_title(self.app.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.app.window_size.0,
                self.app.window_size.1,
            ))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(attributes)?);
        self.app.size = window.inner_size();
        self.app.window = Some(window.clone());

        self.app_loop = Some(T::init(window, &self.app, config)?);
        self.last_frame = Instant::now();
        Ok(())
    }
}

impl<T: AppLoop> ApplicationHandler for Runner<T> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app_loop.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err.context("Couldn't start the app"));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(app_loop) = self.app_loop.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(new_size) => {
                debug!("resized {:?}", new_size);
                self.app.pointer.reflip(self.app.size.height, new_size.height);
                self.app.size = *new_size;
                app_loop.resized(*new_size, &self.app);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.app.modifiers = modifiers.state();
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                self.app.frame_time = now - self.last_frame;
                self.last_frame = now;
                if let Err(err) = app_loop.draw(&mut self.app) {
                    self.fail(event_loop, err);
                    return;
                }
            }
            _ => {
                if let Some(input) =
                    InputEvent::from_window_event(&event, self.app.modifiers, self.app.size.height)
                {
                    if let InputEvent::MouseInput(mouse) = &input {
                        self.app.pointer.update(mouse);
                    }
                    app_loop.input(input, &mut self.app);
                }
            }
        }

        if self.app.exit_requested {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let next_frame = self.last_frame + self.app.frame_interval();
        if Instant::now() >= next_frame {
            if let Some(window) = &self.app.window {
                window.request_redraw();
            }
            event_loop.set_control_flow(ControlFlow::Wait);
        } else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(next_frame));
        }
    }
}

/// Sets up logging and returns the default app configuration.
pub fn make_window() -> App {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    App {
        title: "quadfont".into(),
        frame_rate: 60.0,
        window_size: (640, 540),
        window: None,
        size: PhysicalSize::new(640, 540),
        pointer: PointerState::default(),
        modifiers: ModifiersState::empty(),
        frame_time: Duration::ZERO,
        exit_requested: false,
    }
}
