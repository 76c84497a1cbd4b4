//! Keyboard and pointer mapping

use std::collections::BTreeSet;

use glam::Vec2;

use crate::sim::TickInput;

/// Held movement directions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveKeys {
    /// Map held key names (WASD or arrow keys, any case)
    pub fn from_pressed<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut held = Self::default();
        for key in keys {
            match key.to_lowercase().as_str() {
                "w" | "arrowup" => held.up = true,
                "s" | "arrowdown" => held.down = true,
                "a" | "arrowleft" => held.left = true,
                "d" | "arrowright" => held.right = true,
                _ => {}
            }
        }
        held
    }

    /// Per-axis direction in screen space (y grows downward); opposite keys
    /// cancel out
    pub fn axes(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// Collects host events between frames
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    held: BTreeSet<String>,
    aim: Option<Vec2>,
    fire: Option<Vec2>,
    pause: bool,
    restart: bool,
    autopilot: bool,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: &str) {
        let key = key.to_lowercase();
        // Pause acts on the press, not while held
        if key == "p" && !self.held.contains(&key) {
            self.pause = true;
        }
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.remove(&key.to_lowercase());
    }

    /// Drop all held keys (focus lost)
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.aim = Some(pos);
    }

    /// Mouse button press; fires toward the click position
    pub fn pointer_down(&mut self, pos: Vec2) {
        self.aim = Some(pos);
        self.fire = Some(pos);
    }

    pub fn toggle_pause(&mut self) {
        self.pause = true;
    }

    pub fn request_restart(&mut self) {
        self.restart = true;
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.autopilot = on;
    }

    pub fn move_keys(&self) -> MoveKeys {
        MoveKeys::from_pressed(self.held.iter().map(String::as_str))
    }

    /// Move this frame's host events into the persistent tick input.
    ///
    /// Held state is overwritten. One-shot triggers are merged and stay set
    /// on `input` until a tick runs and `FrameClock` clears them, so a frame
    /// too short for a tick does not lose them.
    pub fn feed(&mut self, input: &mut TickInput) {
        input.movement = self.move_keys().axes();
        input.aim = self.aim;
        input.autopilot = self.autopilot;
        if let Some(at) = self.fire.take() {
            input.fire = Some(at);
        }
        input.pause |= std::mem::take(&mut self.pause);
        input.restart |= std::mem::take(&mut self.restart);
    }
}
