use std::collections::HashSet;

use glam::Vec2;
use sdl2::{event::Event, keyboard::Keycode};

/// The current state of the keyboard.
#[derive(Debug, Default)]
pub struct KeyboardState {
    pub down: HashSet<Keycode>,
    /// Keys that went down since the last [`InputState::begin_frame`], even if already released.
    pub pressed: HashSet<Keycode>,
}

/// The current state of the mouse cursor, in window pixels.
#[derive(Debug, Default)]
pub struct MouseState {
    pub position: Vec2,
}

/// Input collected by the frame loop. Written by [`InputState::handle_event`], read once per
/// frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub keyboard: KeyboardState,
    pub mouse: MouseState,
    pub quit_requested: bool,
}

impl InputState {
    /// Forgets which keys were pressed last frame before new events arrive.
    pub fn begin_frame(&mut self) {
        self.keyboard.pressed.clear();
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Quit { .. } => self.request_quit(),
            Event::KeyDown {
                keycode: Some(keycode),
                repeat: false,
                ..
            } => self.key_down(*keycode),
            Event::KeyUp {
                keycode: Some(keycode),
                repeat: false,
                ..
            } => self.key_up(*keycode),
            Event::MouseMotion { x, y, .. } => {
                self.cursor_moved(Vec2::new(*x as f32, *y as f32))
            }
            _ => {}
        }
    }

    pub fn key_down(&mut self, keycode: Keycode) {
        if self.keyboard.down.insert(keycode) {
            self.keyboard.pressed.insert(keycode);
        }
    }

    pub fn key_up(&mut self, keycode: Keycode) {
        self.keyboard.down.remove(&keycode);
    }

    pub fn cursor_moved(&mut self, position: Vec2) {
        self.mouse.position = position;
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn is_down(&self, keycode: Keycode) -> bool {
        self.keyboard.down.contains(&keycode)
    }

    /// True if `keycode` is held, or was tapped since the last [`InputState::begin_frame`].
    pub fn was_pressed(&self, keycode: Keycode) -> bool {
        self.is_down(keycode) || self.keyboard.pressed.contains(&keycode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(keycode: Keycode, down: bool) -> Event {
        if down {
            Event::KeyDown {
                timestamp: 0,
                window_id: 0,
                keycode: Some(keycode),
                scancode: None,
                keymod: sdl2::keyboard::Mod::NOMOD,
                repeat: false,
            }
        } else {
            Event::KeyUp {
                timestamp: 0,
                window_id: 0,
                keycode: Some(keycode),
                scancode: None,
                keymod: sdl2::keyboard::Mod::NOMOD,
                repeat: false,
            }
        }
    }

    #[test]
    fn test_key_edges_reset_each_frame() {
        let mut input = InputState::default();
        input.key_down(Keycode::Return);
        assert!(input.is_down(Keycode::Return));
        assert!(input.keyboard.pressed.contains(&Keycode::Return));

        input.begin_frame();
        assert!(input.is_down(Keycode::Return));
        assert!(input.keyboard.pressed.is_empty());

        input.key_up(Keycode::Return);
        assert!(!input.is_down(Keycode::Return));
        assert!(!input.was_pressed(Keycode::Return));
    }

    #[test]
    fn test_tap_within_one_poll_is_remembered() {
        let mut input = InputState::default();
        input.handle_event(&key(Keycode::Return, true));
        input.handle_event(&key(Keycode::Return, false));
        assert!(!input.is_down(Keycode::Return));
        assert!(input.was_pressed(Keycode::Return));

        input.begin_frame();
        assert!(!input.was_pressed(Keycode::Return));
    }

    #[test]
    fn test_cursor_keeps_last_position() {
        let mut input = InputState::default();
        input.cursor_moved(Vec2::new(10.0, 5.0));
        input.cursor_moved(Vec2::new(12.0, 6.0));
        input.begin_frame();
        assert_eq!(input.mouse.position, Vec2::new(12.0, 6.0));
    }
}
