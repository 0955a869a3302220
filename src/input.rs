//! Keyboard state folded from winit events into a per-frame snapshot.

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Keys the tank reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Exit,
    RotateLeft,
    RotateRight,
    RotateUp,
    RotateDown,
    ZoomIn,
    ZoomOut,
    Reset,
    Pause,
}

impl Action {
    /// Fixed key bindings
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Escape => Some(Action::Exit),
            KeyCode::ArrowLeft => Some(Action::RotateLeft),
            KeyCode::ArrowRight => Some(Action::RotateRight),
            KeyCode::ArrowUp => Some(Action::RotateUp),
            KeyCode::ArrowDown => Some(Action::RotateDown),
            KeyCode::KeyW => Some(Action::ZoomIn),
            KeyCode::KeyS => Some(Action::ZoomOut),
            KeyCode::KeyR => Some(Action::Reset),
            KeyCode::Space => Some(Action::Pause),
            _ => None,
        }
    }
}

/// Held state of every bound key at the top of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeysHeld {
    pub exit: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub rotate_up: bool,
    pub rotate_down: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
}

/// Accumulates key events between frames
#[derive(Debug, Default)]
pub struct InputState {
    held: KeysHeld,
    reset_pressed: bool,
    pause_pressed: bool,
    close_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition; auto-repeat is ignored for the toggles
    pub fn handle_key(&mut self, code: KeyCode, state: ElementState, repeat: bool) {
        let Some(action) = Action::from_key(code) else {
            return;
        };
        let pressed = state == ElementState::Pressed;

        match action {
            Action::Exit => self.held.exit = pressed,
            Action::RotateLeft => self.held.rotate_left = pressed,
            Action::RotateRight => self.held.rotate_right = pressed,
            Action::RotateUp => self.held.rotate_up = pressed,
            Action::RotateDown => self.held.rotate_down = pressed,
            Action::ZoomIn => self.held.zoom_in = pressed,
            Action::ZoomOut => self.held.zoom_out = pressed,
            Action::Reset => self.reset_pressed |= pressed && !repeat,
            Action::Pause => self.pause_pressed |= pressed && !repeat,
        }
    }

    /// Window close button counts as an exit request
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Snapshot of held keys for this frame
    pub fn poll(&self) -> KeysHeld {
        KeysHeld {
            exit: self.held.exit || self.close_requested,
            ..self.held
        }
    }

    /// True once per R press
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_pressed)
    }

    /// True once per Space press
    pub fn take_pause_toggle(&mut self) -> bool {
        std::mem::take(&mut self.pause_pressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_keys_follow_press_and_release() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::ArrowUp, ElementState::Pressed, false);
        input.handle_key(KeyCode::KeyW, ElementState::Pressed, false);
        let keys = input.poll();
        assert!(keys.rotate_up);
        assert!(keys.zoom_in);
        assert!(!keys.exit);

        input.handle_key(KeyCode::ArrowUp, ElementState::Released, false);
        assert!(!input.poll().rotate_up);
        assert!(input.poll().zoom_in);
    }

    #[test]
    fn test_close_request_sets_exit() {
        let mut input = InputState::new();
        input.request_close();
        assert!(input.poll().exit);
    }

    #[test]
    fn test_reset_is_edge_triggered() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyR, ElementState::Pressed, false);
        input.handle_key(KeyCode::KeyR, ElementState::Pressed, true);
        assert!(input.take_reset());
        assert!(!input.take_reset());
    }

    #[test]
    fn test_unbound_keys_are_ignored() {
        let mut input = InputState::new();
        input.handle_key(KeyCode::KeyQ, ElementState::Pressed, false);
        assert_eq!(input.poll(), KeysHeld::default());
    }
}
