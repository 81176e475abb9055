use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use quadfont::{
    font::FontData,
    input::{InputEvent, KeyInput},
    model::{ModelRenderer, ModelScene},
    quad::TexturedQuad,
    render::Render,
    shapes::{QuadBatch, MAX_QUADS},
    text::{
        pipeline::{text_batch, upload_atlas},
        update_text, Cursor,
    },
    window::{make_window, App, AppLoop},
};
use wgpu::Color;
use winit::{
    dpi::PhysicalSize,
    keyboard::{Key, KeyCode, NamedKey},
    window::Window,
};

#[derive(Parser)]
#[command(about = "Asteroid field with a line of editable bitmap font text")]
struct Cli {
    #[arg(help = "Raw font file to draw the text with.", default_value = "assets/font/new_font.dat")]
    font: PathBuf,

    #[arg(help = "Initial window width.", long, default_value_t = 640)]
    width: u32,

    #[arg(help = "Initial window height.", long, default_value_t = 540)]
    height: u32,

    #[arg(help = "Frames per second.", long, default_value_t = 60.0)]
    fps: f32,

    #[arg(help = "Text shown at startup.", long, default_value = "Hiiohoi")]
    text: String,
}

struct Config {
    font_path: PathBuf,
    text: String,
}

struct FontRender {
    render: Render,
    font: FontData,
    font_path: PathBuf,
    models: ModelRenderer,
    scene: ModelScene,
    text_batch: QuadBatch,
    text_quads: Vec<TexturedQuad>,
    cursor: Cursor,
    text: String,
}

impl FontRender {
    /// Applies a key press to the text or the cell size. Returns false if nothing changed.
    fn edit_text(&mut self, key: &KeyInput) -> bool {
        match &key.key {
            Key::Named(NamedKey::ArrowUp) => self.cursor.resize_height(1),
            Key::Named(NamedKey::ArrowDown) => self.cursor.resize_height(-1),
            Key::Named(NamedKey::ArrowRight) => self.cursor.resize_width(1),
            Key::Named(NamedKey::ArrowLeft) => self.cursor.resize_width(-1),
            Key::Named(NamedKey::Backspace) => return self.text.pop().is_some(),
            _ => match typed_char(key) {
                Some(character) => self.text.push(character),
                None => return false,
            },
        }
        true
    }

    /// Reads the font file again and rebuilds the atlas. The old glyphs stay if the read fails.
    fn reload_font(&mut self) -> Result<()> {
        self.font
            .reload(&self.font_path)
            .with_context(|| format!("Couldn't reload the font {}", self.font_path.display()))?;
        upload_atlas(&self.render, &self.text_batch, &self.font)?;
        info!("Reloaded {}", self.font_path.display());
        Ok(())
    }
}

/// The printable character a key adds to the text. Ctrl chords type nothing.
fn typed_char(key: &KeyInput) -> Option<char> {
    if key.ctrl() {
        return None;
    }
    key.character().filter(|c| (' '..='~').contains(c))
}

fn is_reload(key: &KeyInput) -> bool {
    key.ctrl()
        && (key.code == Some(KeyCode::KeyL)
            || key.character().map(|c| c.to_ascii_lowercase()) == Some('l'))
}

impl AppLoop for FontRender {
    type Config = Config;

    fn init(window: Arc<Window>, _app: &App, config: Config) -> Result<Self> {
        let font = FontData::load(&config.font_path)
            .with_context(|| format!("Couldn't load the font {}", config.font_path.display()))?;

        let mut render = Render::new(window)?;
        render.set_clear_color(Color::TRANSPARENT);

        let scene = ModelScene::asteroid_demo()?;
        let models = ModelRenderer::new(&mut render, &scene)?;

        let text_batch = text_batch(&mut render, MAX_QUADS)?;
        upload_atlas(&render, &text_batch, &font)?;

        let mut cursor = Cursor::default();
        let mut text_quads = Vec::new();
        update_text(&config.text, &mut text_quads, &mut cursor);

        Ok(Self {
            render,
            font,
            font_path: config.font_path,
            models,
            scene,
            text_batch,
            text_quads,
            cursor,
            text: config.text,
        })
    }

    fn draw(&mut self, app: &mut App) -> Result<()> {
        self.scene.update(app.frame_time().as_secs_f32() * 1000.0);

        self.models.submit(&mut self.render, &self.scene)?;
        self.text_batch.submit(&mut self.render, &self.text_quads)?;
        self.render.draw()?;

        app.set_title(&app.frame_stats());
        Ok(())
    }

    fn input(&mut self, input: InputEvent, app: &mut App) {
        let InputEvent::KeyboardInput(key) = input else {
            return;
        };
        if !key.pressed {
            return;
        }
        if key.key == Key::Named(NamedKey::Escape) {
            app.exit();
            return;
        }
        if is_reload(&key) {
            if let Err(err) = self.reload_font() {
                error!("{:#}", err);
            }
            return;
        }
        if self.edit_text(&key) {
            debug!("text {:?}", self.text);
            update_text(&self.text, &mut self.text_quads, &mut self.cursor);
        }
    }

    fn resized(&mut self, new_size: PhysicalSize<u32>, _app: &App) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.render.resize(new_size);
        let result = self
            .models
            .set_screen_size(&self.render, new_size)
            .and_then(|_| self.text_batch.set_screen_size(&self.render, new_size));
        if let Err(err) = result {
            error!("{:#}", err);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    make_window()
        .with_title("font render")
        .with_window_size((cli.width, cli.height))
        .with_framerate(cli.fps)
        .run::<FontRender>(Config {
            font_path: cli.font,
            text: cli.text,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::ModifiersState;

    fn key(character: &str, code: KeyCode, modifiers: ModifiersState) -> KeyInput {
        KeyInput::pressed(Key::Character(character.into()), Some(code), modifiers)
    }

    #[test]
    fn ctrl_chords_type_nothing() {
        let plain = key("s", KeyCode::KeyS, ModifiersState::empty());
        assert_eq!(typed_char(&plain), Some('s'));
        assert!(!is_reload(&plain));

        let ctrl_s = key("s", KeyCode::KeyS, ModifiersState::CONTROL);
        assert_eq!(typed_char(&ctrl_s), None);
        assert!(!is_reload(&ctrl_s));
    }

    #[test]
    fn ctrl_l_reloads() {
        let ctrl_l = key("\u{c}", KeyCode::KeyL, ModifiersState::CONTROL);
        assert!(is_reload(&ctrl_l));
        assert_eq!(typed_char(&ctrl_l), None);
        assert!(!is_reload(&key("l", KeyCode::KeyL, ModifiersState::empty())));
    }
}
