//! Game state and core simulation types
//!
//! Everything the tick mutates lives here. Collections are owned by
//! `GameState`; the spawn director and progression machine only hand back
//! new entities or decisions, never touch the vectors themselves.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::BossKit;
use super::progression::{LevelPhase, Progression};
use super::schedule::Schedule;
use crate::consts::*;
use crate::tuning::{BuffProfile, EnemyTuning, PlayerTuning, PowerUpTuning, Tuning};
use crate::{Arena, direction_to};

/// Outer run status, orthogonal to the level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Active gameplay
    Playing,
    /// Ticks are frozen; no time accrues
    Paused,
    /// Player died; only a restart leaves this state
    GameOver,
}

/// Which bookkeeping an enemy participates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyRole {
    Regular,
    WaveBoss,
    LevelBoss,
}

impl EnemyRole {
    pub fn is_boss(self) -> bool {
        self != EnemyRole::Regular
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Speed,
    Damage,
    Health,
    RapidFire,
    Explosive,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::Speed,
        PowerUpKind::Damage,
        PowerUpKind::Health,
        PowerUpKind::RapidFire,
        PowerUpKind::Explosive,
    ];

    /// Timed buff granted on pickup; `Health` is an instant heal instead
    pub fn buff(self, tuning: &PowerUpTuning) -> Option<BuffProfile> {
        match self {
            PowerUpKind::Speed => Some(tuning.speed),
            PowerUpKind::Damage => Some(tuning.damage),
            PowerUpKind::RapidFire => Some(tuning.rapid_fire),
            PowerUpKind::Explosive => Some(tuning.explosive),
            PowerUpKind::Health => None,
        }
    }
}

/// The single active timed stat modification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub kind: PowerUpKind,
    pub remaining_ms: f32,
    pub profile: BuffProfile,
}

/// The player's robot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    /// Baseline units per second (before buffs)
    pub speed: f32,
    /// Baseline time between shots
    pub fire_cooldown_ms: f32,
    /// Time until the cannon can fire again
    pub fire_cooldown_remaining_ms: f32,
    pub immunity_ms: f32,
    /// Time until damage can land again
    pub immunity_remaining_ms: f32,
    pub buff: Option<Buff>,
    /// Last known aim point, for the renderer's cannon angle
    pub aim: Vec2,
}

impl Player {
    pub fn new(pos: Vec2, tuning: &PlayerTuning) -> Self {
        Self {
            pos,
            radius: tuning.radius,
            health: tuning.max_health,
            max_health: tuning.max_health,
            speed: tuning.speed,
            fire_cooldown_ms: tuning.fire_cooldown_ms,
            fire_cooldown_remaining_ms: 0.0,
            immunity_ms: tuning.immunity_ms,
            immunity_remaining_ms: 0.0,
            buff: None,
            aim: pos,
        }
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.buff.map_or(1.0, |b| b.profile.speed_multiplier)
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.buff.map_or(1.0, |b| b.profile.damage_multiplier)
    }

    /// Effective time between shots (rapid fire overrides the baseline)
    pub fn fire_cooldown(&self) -> f32 {
        self.buff
            .and_then(|b| b.profile.fire_cooldown_override_ms)
            .unwrap_or(self.fire_cooldown_ms)
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn is_immune(&self) -> bool {
        self.immunity_remaining_ms > 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Move by held-key axes and run all player timers.
    ///
    /// Each axis moves at full speed independently, so diagonals are faster.
    pub fn advance(&mut self, axes: Vec2, dt_ms: f32, arena: &Arena) {
        let step = self.speed * self.speed_multiplier() * (dt_ms / 1000.0);
        self.pos = arena.clamp(self.pos + axes * step, self.radius);

        if let Some(buff) = &mut self.buff {
            buff.remaining_ms -= dt_ms;
            if buff.remaining_ms <= 0.0 {
                self.buff = None;
            }
        }

        if let Some(buff) = self.buff {
            let regen = buff.profile.health_regen_per_sec;
            if regen > 0.0 {
                self.heal(regen * dt_ms / 1000.0);
            }
        }

        self.fire_cooldown_remaining_ms = (self.fire_cooldown_remaining_ms - dt_ms).max(0.0);
        self.immunity_remaining_ms = (self.immunity_remaining_ms - dt_ms).max(0.0);
    }

    /// Apply damage unless the immunity window is still running.
    ///
    /// Returns true if the hit landed; a landed hit re-arms immunity.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_immune() {
            return false;
        }
        self.health = (self.health - amount).clamp(0.0, self.max_health);
        self.immunity_remaining_ms = self.immunity_ms;
        true
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Replace whatever buff is active (no stacking, timer restarts)
    pub fn apply_buff(&mut self, kind: PowerUpKind, profile: BuffProfile, duration_ms: f32) {
        self.buff = Some(Buff {
            kind,
            remaining_ms: duration_ms,
            profile,
        });
    }

    /// Try to fire toward `aim`; returns (origin, direction, damage).
    ///
    /// A shot at the player's own center is suppressed without consuming
    /// the cooldown.
    pub fn try_fire(
        &mut self,
        aim: Vec2,
        muzzle_offset: f32,
        base_damage: f32,
    ) -> Option<(Vec2, Vec2, f32)> {
        if self.fire_cooldown_remaining_ms > 0.0 {
            return None;
        }
        let dir = direction_to(self.pos, aim)?;
        self.fire_cooldown_remaining_ms = self.fire_cooldown();
        Some((
            self.pos + dir * muzzle_offset,
            dir,
            base_damage * self.damage_multiplier(),
        ))
    }
}

/// A player-fired cannon ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Unit direction
    pub dir: Vec2,
    pub speed: f32,
    pub radius: f32,
    pub damage: f32,
}

impl Projectile {
    pub fn advance(&mut self, dt_ms: f32) {
        self.pos += self.dir * self.speed * (dt_ms / 1000.0);
    }
}

/// A boss-fired projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyProjectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    pub life_ms: f32,
}

impl EnemyProjectile {
    pub fn advance(&mut self, dt_ms: f32) {
        self.pos += self.vel * (dt_ms / 1000.0);
        self.life_ms -= dt_ms;
    }
}

/// Regular zombie or boss; bosses carry a `BossKit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub role: EnemyRole,
    pub pos: Vec2,
    pub radius: f32,
    /// Baseline units per second
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub contact_damage: f32,
    pub points: u64,
    pub boss: Option<BossKit>,
}

impl Enemy {
    pub fn regular(id: u32, pos: Vec2, tuning: &EnemyTuning) -> Self {
        Self {
            id,
            role: EnemyRole::Regular,
            pos,
            radius: tuning.radius,
            speed: tuning.speed,
            health: tuning.health,
            max_health: tuning.health,
            contact_damage: tuning.contact_damage,
            points: tuning.points,
            boss: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_regular(&self) -> bool {
        self.role == EnemyRole::Regular
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health -= amount;
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).max(0.0)
        } else {
            0.0
        }
    }

    /// Step toward `target` at the given multiple of baseline speed
    pub fn chase(&mut self, target: Vec2, speed_multiplier: f32, dt_ms: f32) {
        if speed_multiplier <= 0.0 {
            return;
        }
        if let Some(dir) = direction_to(self.pos, target) {
            self.pos += dir * self.speed * speed_multiplier * (dt_ms / 1000.0);
        }
    }
}

/// A collectible power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub radius: f32,
}

/// Palette hint for particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleColor {
    Hit,
    Damage,
    Death,
    Experience,
    PowerUp(PowerUpKind),
    EnemyShot,
}

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: ParticleColor,
    pub life_ms: f32,
    pub size: f32,
}

impl Particle {
    pub fn advance(&mut self, dt_ms: f32) {
        self.pos += self.vel * (dt_ms / 1000.0);
        self.vel *= 0.98;
        self.life_ms -= dt_ms;
    }

    /// Remaining life in [0, 1] for fading
    pub fn alpha(&self) -> f32 {
        (self.life_ms / PARTICLE_LIFE_MS).clamp(0.0, 1.0)
    }
}

/// Things that happened during a tick, in order. Drained by the host for
/// sound cues and screen effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Shot { pos: Vec2 },
    PlayerHit { damage: f32 },
    EnemyHit { id: u32, pos: Vec2 },
    EnemyKilled { role: EnemyRole, pos: Vec2, points: u64 },
    ProjectileDestroyed { pos: Vec2 },
    PowerUpCollected { kind: PowerUpKind, pos: Vec2 },
    BossSpawned { role: EnemyRole, pos: Vec2 },
    WaveStarted { wave: u32, required: u32 },
    LevelUp { level: u32 },
    LevelCleared { map_index: usize },
    MapEntered { map_index: usize },
    GameOver { score: u64 },
}

/// Monotonic entity id source shared by every collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIds(u32);

impl Default for EntityIds {
    fn default() -> Self {
        Self(1)
    }
}

impl EntityIds {
    pub fn next(&mut self) -> u32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub arena: Arena,
    /// Gameplay randomness
    pub rng: Pcg32,
    /// Cosmetic randomness, kept apart so particles never shift gameplay
    pub fx_rng: Pcg32,
    pub status: GameStatus,
    /// Simulation clock (ms since the run began, excluding pauses)
    pub time_ms: f64,
    pub score: u64,
    pub enemies_defeated: u32,
    pub player: Player,
    /// Player projectiles (sorted by id)
    pub projectiles: Vec<Projectile>,
    /// Enemies (sorted by id)
    pub enemies: Vec<Enemy>,
    /// Power-ups (sorted by id)
    pub power_ups: Vec<PowerUp>,
    pub progress: Progression,
    pub schedule: Schedule,
    /// Events raised by the most recent tick
    pub events: Vec<GameEvent>,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    #[serde(skip, default = "default_particle_cap")]
    pub particle_cap: usize,
    pub ids: EntityIds,
}

fn default_particle_cap() -> usize {
    MAX_PARTICLES
}

/// Stream selector for the cosmetic RNG
const FX_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

impl GameState {
    /// Create a new game with default tuning and arena
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Arena::default(), Tuning::default())
    }

    pub fn with_tuning(seed: u64, arena: Arena, tuning: Tuning) -> Self {
        let player = Player::new(arena.center(), &tuning.player);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            fx_rng: Pcg32::seed_from_u64(seed ^ FX_STREAM),
            status: GameStatus::Playing,
            time_ms: 0.0,
            score: 0,
            enemies_defeated: 0,
            player,
            projectiles: Vec::new(),
            enemies: Vec::new(),
            power_ups: Vec::new(),
            progress: Progression::new(&tuning),
            schedule: Schedule::default(),
            events: Vec::new(),
            particles: Vec::new(),
            particle_cap: MAX_PARTICLES,
            ids: EntityIds::default(),
            arena,
            tuning,
        };
        state.schedule_opening();
        state
    }

    /// Reinitialize everything from the same seed, tuning and arena
    pub fn restart(&mut self) {
        let cap = self.particle_cap;
        *self = Self::with_tuning(self.seed, self.arena, self.tuning.clone());
        self.particle_cap = cap;
        log::info!("Game restarted (seed {})", self.seed);
    }

    fn schedule_opening(&mut self) {
        let at = self.time_ms + f64::from(self.tuning.waves.first_wave_delay_ms);
        let guard = self.progress.guard();
        self.schedule
            .push(at, super::schedule::ScheduledAction::StartWave, guard);
    }

    /// Host-driven arena resize.
    ///
    /// The player and power-ups are pulled inside the new bounds at once.
    /// Bullets and boss shots are pruned against them on the next tick.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.arena = Arena::new(width, height);
        self.player.pos = self.arena.clamp(self.player.pos, self.player.radius);
        for power_up in &mut self.power_ups {
            power_up.pos = self.arena.clamp(power_up.pos, power_up.radius * 2.0);
        }
        log::debug!("Arena resized to {}x{}", self.arena.width, self.arena.height);
    }

    /// Cap cosmetic particles (from quality settings)
    pub fn set_particle_cap(&mut self, cap: usize) {
        self.particle_cap = cap.min(MAX_PARTICLES);
        let excess = self.particles.len().saturating_sub(self.particle_cap);
        self.particles.drain(..excess);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        self.ids.next()
    }

    /// Insert an enemy, keeping id order
    pub fn spawn_enemy(&mut self, enemy: Enemy) {
        let at = self.enemies.partition_point(|e| e.id < enemy.id);
        self.enemies.insert(at, enemy);
    }

    pub fn spawn_power_up(&mut self, power_up: PowerUp) {
        let at = self.power_ups.partition_point(|p| p.id < power_up.id);
        self.power_ups.insert(at, power_up);
    }

    pub fn spawn_projectile(&mut self, origin: Vec2, dir: Vec2, damage: f32) -> u32 {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile {
            id,
            pos: origin,
            dir,
            speed: self.tuning.bullet.speed,
            radius: self.tuning.bullet.radius,
            damage,
        });
        id
    }

    /// Live regular enemies (bosses excluded)
    pub fn regular_alive(&self) -> usize {
        self.enemies
            .iter()
            .filter(|e| e.is_regular() && e.is_alive())
            .count()
    }

    /// The boss the progression machine is tracking, if still present
    pub fn tracked_boss(&self) -> Option<&Enemy> {
        let id = self.progress.active_boss?;
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn phase(&self) -> LevelPhase {
        self.progress.phase
    }

    pub fn map_name(&self) -> &str {
        self.tuning
            .maps
            .get(self.progress.map_index)
            .map_or("", String::as_str)
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(Vec2::new(100.0, 100.0), &PlayerTuning::default())
    }

    #[test]
    fn test_immunity_blocks_until_elapsed() {
        let mut p = player();
        let arena = Arena::default();
        assert!(p.take_damage(10.0));
        assert_eq!(p.health, 90.0);
        assert!(!p.take_damage(10.0));

        p.advance(Vec2::ZERO, 999.0, &arena);
        assert!(!p.take_damage(10.0));
        p.advance(Vec2::ZERO, 1.0, &arena);
        assert!(p.take_damage(10.0));
        assert_eq!(p.health, 80.0);
    }

    #[test]
    fn test_health_clamps_at_zero() {
        let mut p = player();
        assert!(p.take_damage(500.0));
        assert_eq!(p.health, 0.0);
        assert!(p.is_dead());
    }

    #[test]
    fn test_new_buff_replaces_old() {
        let tuning = Tuning::default();
        let mut p = player();
        p.apply_buff(
            PowerUpKind::RapidFire,
            tuning.power_ups.rapid_fire,
            tuning.power_ups.duration_ms,
        );
        assert_eq!(p.fire_cooldown(), 100.0);

        p.advance(Vec2::ZERO, 3000.0, &Arena::default());
        p.apply_buff(
            PowerUpKind::Speed,
            tuning.power_ups.speed,
            tuning.power_ups.duration_ms,
        );
        let buff = p.buff.unwrap();
        assert_eq!(buff.kind, PowerUpKind::Speed);
        assert_eq!(buff.remaining_ms, 5000.0);
        assert_eq!(p.fire_cooldown(), 200.0);
        assert_eq!(p.speed_multiplier(), 1.5);
    }

    #[test]
    fn test_buff_expires_to_baseline() {
        let tuning = Tuning::default();
        let mut p = player();
        p.apply_buff(PowerUpKind::Damage, tuning.power_ups.damage, 100.0);
        assert_eq!(p.damage_multiplier(), 2.0);
        p.advance(Vec2::ZERO, 100.0, &Arena::default());
        assert!(p.buff.is_none());
        assert_eq!(p.damage_multiplier(), 1.0);
    }

    #[test]
    fn test_regen_buff_heals_and_caps() {
        let mut p = player();
        p.health = 95.0;
        let profile = BuffProfile {
            health_regen_per_sec: 10.0,
            ..BuffProfile::default()
        };
        p.apply_buff(PowerUpKind::Health, profile, 5000.0);
        p.advance(Vec2::ZERO, 250.0, &Arena::default());
        assert!((p.health - 97.5).abs() < 1e-4);
        p.advance(Vec2::ZERO, 1000.0, &Arena::default());
        assert_eq!(p.health, 100.0);
    }

    #[test]
    fn test_movement_clamps_to_arena() {
        let arena = Arena::new(300.0, 300.0);
        let mut p = player();
        p.advance(Vec2::new(-1.0, -1.0), 10_000.0, &arena);
        assert_eq!(p.pos, Vec2::new(25.0, 25.0));
    }

    #[test]
    fn test_zero_aim_does_not_consume_cooldown() {
        let mut p = player();
        assert!(p.try_fire(p.pos, 30.0, 10.0).is_none());
        assert_eq!(p.fire_cooldown_remaining_ms, 0.0);

        let (origin, dir, damage) = p.try_fire(Vec2::new(200.0, 100.0), 30.0, 10.0).unwrap();
        assert_eq!(dir, Vec2::X);
        assert_eq!(origin, Vec2::new(130.0, 100.0));
        assert_eq!(damage, 10.0);
        assert_eq!(p.fire_cooldown_remaining_ms, 200.0);
        assert!(p.try_fire(Vec2::new(200.0, 100.0), 30.0, 10.0).is_none());
    }

    #[test]
    fn test_spawn_enemy_keeps_id_order() {
        let mut state = GameState::new(1);
        let tuning = EnemyTuning::default();
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        state.spawn_enemy(Enemy::regular(b, Vec2::ZERO, &tuning));
        state.spawn_enemy(Enemy::regular(a, Vec2::ZERO, &tuning));
        let ids: Vec<_> = state.enemies.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);
    }
}
