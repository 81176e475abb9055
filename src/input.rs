use winit::{
    event::{ElementState, MouseScrollDelta, WindowEvent},
    keyboard::{Key, KeyCode, ModifiersState, PhysicalKey},
};

#[derive(Debug, Clone)]
pub enum InputEvent {
    MouseInput(MouseInputEvent),
    KeyboardInput(KeyInput),
}

/// A key press or release with the modifiers held at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInput {
    pub key: Key,
    pub code: Option<KeyCode>,
    pub pressed: bool,
    pub modifiers: ModifiersState,
}

impl KeyInput {
    pub fn pressed(key: Key, code: Option<KeyCode>, modifiers: ModifiersState) -> Self {
        Self {
            key,
            code,
            pressed: true,
            modifiers,
        }
    }

    pub fn ctrl(&self) -> bool {
        self.modifiers.control_key()
    }

    /// The single character this key types, if any.
    pub fn character(&self) -> Option<char> {
        match &self.key {
            Key::Character(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(character), None) => Some(character),
                    _ => None,
                }
            }
            Key::Named(named) => named.to_text().and_then(|text| text.chars().next()),
            _ => None,
        }
    }
}

impl InputEvent {
    /// Translates a winit event. `window_height` flips the cursor into a bottom-left origin.
    pub fn from_window_event(
        event: &WindowEvent,
        modifiers: ModifiersState,
        window_height: u32,
    ) -> Option<InputEvent> {
        match event {
            WindowEvent::MouseWheel { .. } => Self::mouse_wheel(event),
            WindowEvent::MouseInput { .. } => Self::mouse_button(event),
            WindowEvent::CursorMoved { .. } => Self::mouse_motion(event, window_height),
            WindowEvent::KeyboardInput { .. } => Self::keyboard_input(event, modifiers),
            _ => None,
        }
    }

    pub fn mouse_wheel(event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                    MouseScrollDelta::PixelDelta(size) => (size.x as f32, size.y as f32),
                };
                Some(InputEvent::MouseInput(MouseInputEvent::MouseScroll {
                    delta,
                }))
            }
            _ => None,
        }
    }

    pub fn keyboard_input(event: &WindowEvent, modifiers: ModifiersState) -> Option<InputEvent> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                Some(InputEvent::KeyboardInput(KeyInput {
                    key: event.logical_key.clone(),
                    code: match event.physical_key {
                        PhysicalKey::Code(code) => Some(code),
                        PhysicalKey::Unidentified(_) => None,
                    },
                    pressed: event.state == ElementState::Pressed,
                    modifiers,
                }))
            }
            _ => None,
        }
    }

    pub fn mouse_motion(event: &WindowEvent, window_height: u32) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                Some(InputEvent::MouseInput(MouseInputEvent::MouseMovement {
                    position: (
                        position.x as f32,
                        window_height as f32 - position.y as f32,
                    ),
                }))
            }
            _ => None,
        }
    }

    pub fn mouse_button(event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Left => MouseButton::MouseLeft,
                    winit::event::MouseButton::Right => MouseButton::MouseRight,
                    winit::event::MouseButton::Middle => MouseButton::MouseMiddle,
                    _ => return None,
                };
                Some(InputEvent::MouseInput(MouseInputEvent::MouseButton {
                    button,
                    pressed: *state == ElementState::Pressed,
                }))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseInputEvent {
    MouseMovement { position: (f32, f32) },
    MouseButton { button: MouseButton, pressed: bool },
    MouseScroll { delta: (f32, f32) },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    MouseLeft,
    MouseRight,
    MouseMiddle,
}

/// Pointer position (bottom-left origin) and held buttons, as polled once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub left: bool,
    pub right: bool,
}

impl PointerState {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn update(&mut self, event: &MouseInputEvent) {
        match *event {
            MouseInputEvent::MouseMovement { position } => {
                self.x = position.0;
                self.y = position.1;
            }
            MouseInputEvent::MouseButton { button, pressed } => match button {
                MouseButton::MouseLeft => self.left = pressed,
                MouseButton::MouseRight => self.right = pressed,
                MouseButton::MouseMiddle => {}
            },
            MouseInputEvent::MouseScroll { .. } => {}
        }
    }

    /// Re-anchors the y coordinate after the window height changed.
    pub fn reflip(&mut self, old_height: u32, new_height: u32) {
        self.y += new_height as f32 - old_height as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NamedKey;

    #[test]
    fn pointer_tracks_buttons() {
        let mut pointer = PointerState::default();
        pointer.update(&MouseInputEvent::MouseMovement {
            position: (12.0, 30.0),
        });
        pointer.update(&MouseInputEvent::MouseButton {
            button: MouseButton::MouseLeft,
            pressed: true,
        });
        assert_eq!(
            pointer,
            PointerState {
                x: 12.0,
                y: 30.0,
                left: true,
                right: false
            }
        );
        pointer.update(&MouseInputEvent::MouseButton {
            button: MouseButton::MouseLeft,
            pressed: false,
        });
        pointer.update(&MouseInputEvent::MouseButton {
            button: MouseButton::MouseRight,
            pressed: true,
        });
        assert!(!pointer.left && pointer.right);
    }

    #[test]
    fn reflip_keeps_distance_to_top() {
        let mut pointer = PointerState::at(0.0, 500.0);
        pointer.reflip(540, 600);
        assert_eq!(pointer.y, 560.0);
    }

    #[test]
    fn key_characters() {
        let key = KeyInput::pressed(Key::Character("q".into()), None, ModifiersState::empty());
        assert_eq!(key.character(), Some('q'));
        let space = KeyInput::pressed(Key::Named(NamedKey::Space), None, ModifiersState::empty());
        assert_eq!(space.character(), Some(' '));
        let arrow = KeyInput::pressed(
            Key::Named(NamedKey::ArrowLeft),
            None,
            ModifiersState::empty(),
        );
        assert_eq!(arrow.character(), None);
        let ctrl = KeyInput::pressed(Key::Character("s".into()), None, ModifiersState::CONTROL);
        assert!(ctrl.ctrl());
    }
}
