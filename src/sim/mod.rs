//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (cosmetics on their own stream)
//! - Stable iteration order (by entity ID)
//! - Delays are scheduled against the simulation clock, never wall time
//! - No rendering, audio or platform dependencies

pub mod boss;
pub mod collision;
pub mod progression;
pub mod schedule;
pub mod spawn;
pub mod state;
pub mod tick;

pub use boss::{Ability, ActingWindow, BossKit};
pub use collision::{Body, first_overlap, overlaps};
pub use progression::{Advance, LevelPhase, Progression};
pub use schedule::{PhaseGuard, Schedule, ScheduledAction, ScheduledEvent};
pub use state::{
    Buff, Enemy, EnemyProjectile, EnemyRole, EntityIds, GameEvent, GameState, GameStatus,
    Particle, ParticleColor, Player, PowerUp, PowerUpKind, Projectile,
};
pub use tick::{FrameClock, TickInput, tick};
