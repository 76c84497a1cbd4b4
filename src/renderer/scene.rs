//! Draw list generation
//!
//! Flattens the simulation into paint-ordered sprites: pickups, enemies,
//! enemy shots, bullets, the player, then particles on top.

use glam::Vec2;

use crate::Arena;
use crate::sim::{Ability, EnemyRole, GameState, GameStatus, ParticleColor, PowerUpKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Sprite {
    Player {
        pos: Vec2,
        radius: f32,
        /// Cannon angle in radians
        aim_angle: f32,
        health_ratio: f32,
        buff: Option<PowerUpKind>,
        /// Blink while damage immunity runs
        immune: bool,
    },
    Bullet {
        pos: Vec2,
        radius: f32,
    },
    Enemy {
        id: u32,
        pos: Vec2,
        radius: f32,
        role: EnemyRole,
        /// Boss variant
        ability: Option<Ability>,
        health_ratio: f32,
    },
    EnemyShot {
        pos: Vec2,
        radius: f32,
    },
    PowerUp {
        pos: Vec2,
        radius: f32,
        kind: PowerUpKind,
    },
    Particle {
        pos: Vec2,
        /// Already scaled by remaining life
        size: f32,
        color: ParticleColor,
        alpha: f32,
    },
}

/// One frame's worth of drawing
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub arena: Arena,
    /// Index into the map rotation (background theme)
    pub map_index: usize,
    pub status: GameStatus,
    pub sprites: Vec<Sprite>,
}

impl DrawList {
    pub fn from_state(state: &GameState) -> Self {
        let mut sprites = Vec::with_capacity(
            state.power_ups.len()
                + state.enemies.len()
                + state.projectiles.len()
                + state.particles.len()
                + 1,
        );

        sprites.extend(state.power_ups.iter().map(|p| Sprite::PowerUp {
            pos: p.pos,
            radius: p.radius,
            kind: p.kind,
        }));

        for enemy in &state.enemies {
            sprites.push(Sprite::Enemy {
                id: enemy.id,
                pos: enemy.pos,
                radius: enemy.radius,
                role: enemy.role,
                ability: enemy.boss.as_ref().map(|k| k.ability),
                health_ratio: enemy.health_ratio(),
            });
        }
        for kit in state.enemies.iter().filter_map(|e| e.boss.as_ref()) {
            sprites.extend(kit.projectiles.iter().map(|p| Sprite::EnemyShot {
                pos: p.pos,
                radius: p.radius,
            }));
        }

        sprites.extend(state.projectiles.iter().map(|p| Sprite::Bullet {
            pos: p.pos,
            radius: p.radius,
        }));

        let player = &state.player;
        let aim = player.aim - player.pos;
        sprites.push(Sprite::Player {
            pos: player.pos,
            radius: player.radius,
            aim_angle: aim.y.atan2(aim.x),
            health_ratio: player.health_ratio(),
            buff: player.buff.map(|b| b.kind),
            immune: player.is_immune(),
        });

        sprites.extend(state.particles.iter().map(|p| {
            let alpha = p.alpha();
            Sprite::Particle {
                pos: p.pos,
                size: p.size * alpha,
                color: p.color,
                alpha,
            }
        }));

        Self {
            arena: state.arena,
            map_index: state.progress.map_index,
            status: state.status,
            sprites,
        }
    }
}
