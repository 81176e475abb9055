use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, warn};
use quadfont::{
    batch::build_editor_batch,
    editor::{apply_pointer, Command},
    font::{FontData, DEFAULT_FONT_PATH},
    input::InputEvent,
    render::Render,
    selection::Selection,
    shapes::{quad_batch, QuadBatch, MAX_QUADS},
    texture::Texture,
    window::{make_window, App, AppLoop},
};
use winit::{dpi::PhysicalSize, window::Window};

#[derive(Parser)]
#[command(about = "Paint the glyphs of an 8x12 bitmap font")]
struct Cli {
    #[arg(help = "Raw font file to edit, created on the first save.", default_value = DEFAULT_FONT_PATH)]
    font: PathBuf,

    #[arg(help = "Initial window width.", long, default_value_t = 640)]
    width: u32,

    #[arg(help = "Initial window height.", long, default_value_t = 540)]
    height: u32,

    #[arg(help = "Frames per second.", long, default_value_t = 60.0)]
    fps: f32,
}

struct FontEditor {
    render: Render,
    quads: QuadBatch,
    font: FontData,
    font_path: PathBuf,
    selection: Selection,
    modified: bool,
}

/// `font.dat` exports to `font.dat.png`.
fn atlas_path(font_path: &Path) -> PathBuf {
    let mut name = font_path.as_os_str().to_owned();
    name.push(".png");
    PathBuf::from(name)
}

fn load_or_blank(path: &Path) -> Result<FontData> {
    match FontData::load(path) {
        Ok(font) => Ok(font),
        Err(err) if err.is_not_found() => {
            warn!("{}; starting from a blank font", err);
            Ok(FontData::new())
        }
        Err(err) => Err(err.into()),
    }
}

impl FontEditor {
    fn run_command(&mut self, command: Command, app: &mut App) {
        match command {
            Command::Save => match self.font.save(&self.font_path) {
                Ok(()) => self.modified = false,
                Err(err) => error!("{}", err),
            },
            Command::Reload => match self.font.reload(&self.font_path) {
                Ok(()) => self.modified = false,
                Err(err) => warn!("{}; keeping the current glyphs", err),
            },
            Command::ExportAtlas => {
                let path = atlas_path(&self.font_path);
                if let Err(err) = Texture::from_font(&self.font).save_png(&path) {
                    error!("{:#}", err);
                }
            }
            Command::Quit => app.exit(),
            Command::Navigate(navigate) => {
                self.selection.apply(navigate);
                debug!("Editing '{}'", self.selection.glyph().as_char());
            }
        }
    }

    fn title(&self, app: &App) -> String {
        let pointer = app.pointer();
        format!(
            "{}, mx: {}, my: {}, ml: {}, mr: {}, Letter: {}{}",
            app.frame_stats(),
            pointer.x as i32,
            pointer.y as i32,
            pointer.left as u8,
            pointer.right as u8,
            self.selection.glyph().as_char(),
            if self.modified { " *" } else { "" }
        )
    }
}

impl AppLoop for FontEditor {
    type Config = PathBuf;

    fn init(window: Arc<Window>, _app: &App, font_path: PathBuf) -> Result<Self> {
        let mut render = Render::new(window)?;
        let quads = quad_batch(&mut render, MAX_QUADS)?;
        let font = load_or_blank(&font_path)?;
        info!("Editing {}", font_path.display());

        Ok(Self {
            render,
            quads,
            font,
            font_path,
            selection: Selection::default(),
            modified: false,
        })
    }

    fn draw(&mut self, app: &mut App) -> Result<()> {
        let size = app.window_size();
        if let Some(edit) = apply_pointer(&mut self.font, self.selection.glyph(), app.pointer(), size)
        {
            debug!("{:?}", edit);
            self.modified = true;
        }

        let quads = build_editor_batch(&self.font, &self.selection, size);
        self.quads.submit(&mut self.render, &quads)?;
        self.render.draw()?;

        app.set_title(&self.title(app));
        Ok(())
    }

    fn input(&mut self, input: InputEvent, app: &mut App) {
        if let InputEvent::KeyboardInput(key) = input {
            if let Some(command) = Command::from_key(&key) {
                self.run_command(command, app);
            }
        }
    }

    fn resized(&mut self, new_size: PhysicalSize<u32>, _app: &App) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.render.resize(new_size);
        if let Err(err) = self.quads.set_screen_size(&self.render, new_size) {
            error!("{:#}", err);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    make_window()
        .with_title("font editor")
        .with_window_size((cli.width, cli.height))
        .with_framerate(cli.fps)
        .run::<FontEditor>(cli.font)
}
