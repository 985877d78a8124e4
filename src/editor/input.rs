use glam::Vec2;
use rustc_hash::FxHashSet;

/// Pointer buttons, independent of the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Per-frame pointer state accumulated from host events.
#[derive(Default, Debug, Clone)]
pub struct Input {
    /// Cursor position in surface pixels, origin top-left.
    pub cursor_position: Vec2,
    /// Cursor travel since the last [`Input::end_frame`].
    pub cursor_delta: Vec2,
    /// Wheel travel since the last [`Input::end_frame`], in lines.
    pub scroll_delta: Vec2,
    pub screen_size: Vec2,
    pub buttons: FxHashSet<PointerButton>,
    has_cursor: bool,
}

impl Input {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-frame deltas.
    pub fn end_frame(&mut self) {
        self.cursor_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.screen_size = Vec2::new(width as f32, height as f32);
    }

    pub fn handle_cursor_move(&mut self, x: f32, y: f32) {
        let new_pos = Vec2::new(x, y);
        // First event after entering the surface carries no delta
        if self.has_cursor {
            self.cursor_delta += new_pos - self.cursor_position;
        }
        self.cursor_position = new_pos;
        self.has_cursor = true;
    }

    pub fn handle_button(&mut self, button: PointerButton, pressed: bool) {
        if pressed {
            self.buttons.insert(button);
        } else {
            self.buttons.remove(&button);
        }
    }

    pub fn handle_wheel(&mut self, lines: f32) {
        self.scroll_delta.y += lines;
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: PointerButton) -> bool {
        self.buttons.contains(&button)
    }
}
