//! Robot Cannon - a wave-based arena shooter core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, spawning, progression)
//! - `tuning`: Data-driven game balance
//! - `settings`: Host preferences (quality, volume)
//! - `audio`: Sound cue vocabulary and sink capability
//! - `renderer`: Read-only draw list for an external renderer
//! - `ui`: HUD snapshot for an external presenter
//! - `platform`: Host input mapping

pub mod audio;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use settings::{QualityPreset, Settings};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const SIM_DT_MS: f32 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest host frame accepted before clamping (tab switches, debugger stops)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Hard ceiling on live particles regardless of settings
    pub const MAX_PARTICLES: usize = 2000;
    /// Particle lifetime in milliseconds
    pub const PARTICLE_LIFE_MS: f32 = 1000.0;
}

/// Axis-aligned arena, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// True if `pos` lies inside the arena grown by `margin` on every side
    #[inline]
    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }

    /// Clamp `pos` so it sits at least `margin` inside every edge.
    ///
    /// When the arena is narrower than `2 * margin` the point is pinned to the
    /// center line on that axis instead of producing an inverted range.
    pub fn clamp(&self, pos: Vec2, margin: f32) -> Vec2 {
        Vec2::new(
            clamp_axis(pos.x, margin, self.width - margin),
            clamp_axis(pos.y, margin, self.height - margin),
        )
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

#[inline]
fn clamp_axis(v: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi { (lo + hi) / 2.0 } else { v.clamp(lo, hi) }
}

/// Unit vector from `from` toward `to`, or `None` when the points coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Option<Vec2> {
    (to - from).try_normalize()
}

/// Circle-circle overlap (strict: touching circles do not overlap)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// Point at `distance` from `origin` along `angle` (radians)
#[inline]
pub fn polar_offset(origin: Vec2, angle: f32, distance: f32) -> Vec2 {
    origin + Vec2::from_angle(angle) * distance
}
