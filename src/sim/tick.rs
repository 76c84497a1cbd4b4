//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;
use rand::Rng;

use super::boss::advance_enemy;
use super::collision::{first_overlap, overlaps};
use super::progression::Advance;
use super::schedule::ScheduledAction;
use super::spawn;
use super::state::{
    Enemy, EnemyRole, GameEvent, GameState, GameStatus, Particle, ParticleColor,
};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Held movement keys as per-axis directions in [-1, 1]
    pub movement: Vec2,
    /// Current pointer position (cannon angle only)
    pub aim: Option<Vec2>,
    /// Fire trigger, carrying the aim point at the time of the click
    pub fire: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
    /// Rebuild the run from its seed
    pub restart: bool,
    /// Demo mode - the autopilot plays the game
    pub autopilot: bool,
}

impl TickInput {
    /// Drop triggers that must only act once per host event
    pub fn clear_one_shots(&mut self) {
        self.fire = None;
        self.pause = false;
        self.restart = false;
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    state.events.clear();
    if input.restart {
        state.restart();
        return;
    }

    // Handle pause toggle
    if input.pause {
        match state.status {
            GameStatus::Playing => {
                state.status = GameStatus::Paused;
                log::debug!("Paused at {:.0} ms", state.time_ms);
                return;
            }
            GameStatus::Paused => {
                state.status = GameStatus::Playing;
                log::debug!("Resumed");
            }
            GameStatus::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if state.status != GameStatus::Playing {
        return;
    }

    let input = if input.autopilot {
        autopilot(state)
    } else {
        input.clone()
    };

    state.time_ms += f64::from(dt_ms);

    simulate(state, &input, dt_ms);
    spawn_feedback_particles(state);
}

fn simulate(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    update_player(state, input, dt_ms);

    let arena = state.arena;
    state.projectiles.retain_mut(|p| {
        p.advance(dt_ms);
        arena.contains(p.pos, 0.0)
    });

    let target = state.player.pos;
    for enemy in state.enemies.iter_mut() {
        advance_enemy(
            enemy,
            dt_ms,
            target,
            &arena,
            &state.tuning.abilities,
            &mut state.rng,
        );
    }

    if resolve_player_hits(state) {
        return;
    }
    collect_power_ups(state);
    resolve_bullet_hits(state);
    resolve_intercepts(state);

    state.particles.retain_mut(|p| {
        p.advance(dt_ms);
        p.life_ms > 0.0
    });

    run_schedule(state);
    advance_progression(state);

    let p = spawn::roll_power_up(
        || state.ids.next(),
        &state.arena,
        &state.tuning,
        &mut state.rng,
    );
    if let Some(power_up) = p {
        log::trace!("Power-up {:?} dropped", power_up.kind);
        state.spawn_power_up(power_up);
    }
}

fn update_player(state: &mut GameState, input: &TickInput, dt_ms: f32) {
    let arena = state.arena;
    let axes = input.movement.clamp(Vec2::NEG_ONE, Vec2::ONE);
    state.player.advance(axes, dt_ms, &arena);

    if let Some(aim) = input.aim {
        state.player.aim = aim;
    }
    let Some(target) = input.fire else {
        return;
    };
    state.player.aim = target;
    let muzzle = state.tuning.player.muzzle_offset;
    let damage = state.tuning.bullet.damage;
    if let Some((origin, dir, damage)) = state.player.try_fire(target, muzzle, damage) {
        state.spawn_projectile(origin, dir, damage);
        state.emit(GameEvent::Shot { pos: origin });
    }
}

/// Enemy bodies and boss shots against the player.
///
/// Returns true when the player died and the run is over.
fn resolve_player_hits(state: &mut GameState) -> bool {
    let mut incoming = Vec::new();
    for enemy in &state.enemies {
        if enemy.is_alive() && overlaps(&state.player, enemy) {
            incoming.push(enemy.contact_damage);
        }
    }
    // Shots are spent on contact whether or not the hit lands
    for enemy in state.enemies.iter_mut() {
        if let Some(kit) = enemy.boss.as_mut() {
            kit.projectiles.retain(|shot| {
                if overlaps(&state.player, shot) {
                    incoming.push(shot.damage);
                    false
                } else {
                    true
                }
            });
        }
    }

    for damage in incoming {
        if state.player.take_damage(damage) {
            state.emit(GameEvent::PlayerHit { damage });
        }
    }

    if state.player.is_dead() {
        state.status = GameStatus::GameOver;
        let score = state.score;
        log::info!(
            "Game over: score {}, level {}, {} enemies defeated, survived {}",
            score,
            state.progress.level,
            state.enemies_defeated,
            crate::ui::format_survival_time(state.time_ms)
        );
        state.emit(GameEvent::GameOver { score });
        return true;
    }
    false
}

fn collect_power_ups(state: &mut GameState) {
    let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.power_ups)
        .into_iter()
        .partition(|p| overlaps(&state.player, p));
    state.power_ups = kept;

    for power_up in taken {
        let tuning = &state.tuning.power_ups;
        match power_up.kind.buff(tuning) {
            Some(profile) => {
                state
                    .player
                    .apply_buff(power_up.kind, profile, tuning.duration_ms);
            }
            None => {
                let amount = tuning.heal_amount;
                state.player.heal(amount);
            }
        }
        log::debug!("Collected {:?}", power_up.kind);
        state.emit(GameEvent::PowerUpCollected {
            kind: power_up.kind,
            pos: power_up.pos,
        });
    }
}

/// Player bullets against enemies. Each bullet is spent on the first live
/// enemy it overlaps, in id order.
fn resolve_bullet_hits(state: &mut GameState) {
    let mut spent = vec![false; state.projectiles.len()];
    let mut killed = Vec::new();

    for (i, bullet) in state.projectiles.iter().enumerate() {
        let Some(hit) = first_overlap(bullet, &state.enemies, |_, e| !e.is_alive()) else {
            continue;
        };
        spent[i] = true;
        let enemy = &mut state.enemies[hit];
        enemy.take_damage(bullet.damage);
        state.events.push(GameEvent::EnemyHit {
            id: enemy.id,
            pos: enemy.pos,
        });
        if !enemy.is_alive() {
            killed.push(hit);
        }
    }

    let mut flags = spent.into_iter();
    state
        .projectiles
        .retain(|_| !flags.next().unwrap_or(false));

    if killed.is_empty() {
        return;
    }
    let dead: Vec<Enemy> = killed
        .into_iter()
        .map(|i| state.enemies[i].clone())
        .collect();
    state.enemies.retain(Enemy::is_alive);

    for enemy in dead {
        on_enemy_killed(state, &enemy);
    }
}

fn on_enemy_killed(state: &mut GameState, enemy: &Enemy) {
    state.score += enemy.points;
    state.enemies_defeated += 1;
    state.progress.record_kill(enemy.id, enemy.role);
    if enemy.role.is_boss() {
        log::info!("{:?} {} defeated", enemy.role, enemy.id);
    }
    state.emit(GameEvent::EnemyKilled {
        role: enemy.role,
        pos: enemy.pos,
        points: enemy.points,
    });

    let xp = &state.tuning.experience;
    let amount = match enemy.role {
        EnemyRole::Regular => xp.regular_kill,
        EnemyRole::WaveBoss => xp.wave_boss_kill,
        EnemyRole::LevelBoss => xp.level_boss_kill,
    };
    award_experience(state, amount);
}

fn award_experience(state: &mut GameState, amount: u32) {
    let xp = &state.tuning.experience;
    let (growth, heal) = (xp.threshold_growth, xp.level_up_heal);
    let gained = state.progress.gain_experience(amount, growth);
    let level = state.progress.level;
    for l in (level - gained + 1)..=level {
        state.player.heal(heal);
        log::info!("Level up! Now level {}", l);
        state.emit(GameEvent::LevelUp { level: l });
    }
}

/// Player bullets against boss shots; both are destroyed
fn resolve_intercepts(state: &mut GameState) {
    let mut spent = vec![false; state.projectiles.len()];

    for (i, bullet) in state.projectiles.iter().enumerate() {
        for enemy in state.enemies.iter_mut() {
            let Some(kit) = enemy.boss.as_mut() else {
                continue;
            };
            if let Some(hit) = first_overlap(bullet, &kit.projectiles, |_, _| false) {
                let shot = kit.projectiles.remove(hit);
                spent[i] = true;
                state
                    .events
                    .push(GameEvent::ProjectileDestroyed { pos: shot.pos });
                break;
            }
        }
    }

    let mut flags = spent.into_iter();
    state
        .projectiles
        .retain(|_| !flags.next().unwrap_or(false));
}

/// Fire every scheduled event that has come due, dropping stale ones
fn run_schedule(state: &mut GameState) {
    while let Some(event) = state.schedule.pop_due(state.time_ms) {
        if event.guard != state.progress.guard() {
            log::debug!(
                "Skipping stale {:?} (scheduled under {:?})",
                event.action,
                event.guard
            );
            continue;
        }

        match event.action {
            ScheduledAction::StartWave => {
                let required = state.progress.begin_wave(&state.tuning.waves);
                let guard = state.progress.guard();
                let interval = f64::from(state.tuning.waves.spawn_interval_ms);
                for i in 0..required {
                    let at = event.fire_at_ms + f64::from(i) * interval;
                    state.schedule.push(
                        at,
                        ScheduledAction::SpawnRegular { ordinal: i + 1 },
                        guard,
                    );
                }
                let wave = state.progress.wave;
                state.emit(GameEvent::WaveStarted { wave, required });
            }
            ScheduledAction::SpawnRegular { ordinal } => {
                let id = state.next_entity_id();
                let enemy = spawn::regular_enemy(id, &state.arena, &state.tuning, &mut state.rng);
                log::trace!("Spawn {}/{}", ordinal, state.progress.required_kills);
                state.spawn_enemy(enemy);
            }
            ScheduledAction::EnterNextMap => {
                state.progress.enter_next_map();
                let map_index = state.progress.map_index;
                log::info!("Entering {} (level {})", state.map_name(), state.progress.level);
                state.emit(GameEvent::MapEntered { map_index });
                let at = state.time_ms + f64::from(state.tuning.waves.map_intro_delay_ms);
                let guard = state.progress.guard();
                state.schedule.push(at, ScheduledAction::StartWave, guard);
            }
        }
    }
}

/// Carry out whatever the progression machine decided this tick
fn advance_progression(state: &mut GameState) {
    let alive = state.regular_alive();
    let Some(advance) = state.progress.evaluate(alive, &state.tuning.experience) else {
        return;
    };

    match advance {
        Advance::SpawnWaveBoss => spawn_boss(state, EnemyRole::WaveBoss),
        Advance::NextWave { bonus_xp } => {
            award_experience(state, bonus_xp);
            let at = state.time_ms + f64::from(state.tuning.waves.next_wave_delay_ms);
            let guard = state.progress.guard();
            state.schedule.push(at, ScheduledAction::StartWave, guard);
        }
        Advance::SpawnLevelBoss { bonus_xp } => {
            award_experience(state, bonus_xp);
            state.enemies.clear();
            spawn_boss(state, EnemyRole::LevelBoss);
        }
        Advance::LevelCleared { bonus_xp } => {
            award_experience(state, bonus_xp);
            let map_index = state.progress.map_index;
            log::info!("{} cleared", state.map_name());
            state.emit(GameEvent::LevelCleared { map_index });
            let at = state.time_ms + f64::from(state.tuning.waves.transition_delay_ms);
            let guard = state.progress.guard();
            state.schedule.push(at, ScheduledAction::EnterNextMap, guard);
        }
    }
}

fn spawn_boss(state: &mut GameState, role: EnemyRole) {
    let id = state.next_entity_id();
    let level = state.progress.level;
    let player = state.player.pos;
    let boss = match role {
        EnemyRole::LevelBoss => {
            spawn::level_boss(id, level, &state.arena, player, &state.tuning, &mut state.rng)
        }
        _ => spawn::wave_boss(id, level, &state.arena, player, &state.tuning, &mut state.rng),
    };
    log::info!(
        "{:?} spawned: {:.0} HP, ability {:?}",
        role,
        boss.health,
        boss.boss.as_ref().map(|k| k.ability)
    );
    state.progress.track_boss(id);
    state.emit(GameEvent::BossSpawned {
        role,
        pos: boss.pos,
    });
    state.spawn_enemy(boss);
}

/// Cosmetic bursts for this tick's events (separate RNG stream)
fn spawn_feedback_particles(state: &mut GameState) {
    if state.particle_cap == 0 {
        return;
    }
    let player = state.player.pos;
    let mut bursts = Vec::new();
    for event in &state.events {
        match *event {
            GameEvent::EnemyHit { pos, .. } => bursts.push((pos, ParticleColor::Hit, 3)),
            GameEvent::PlayerHit { .. } => bursts.push((player, ParticleColor::Damage, 5)),
            GameEvent::EnemyKilled { pos, .. } => {
                bursts.push((pos, ParticleColor::Death, 6));
                bursts.push((player - Vec2::Y * 30.0, ParticleColor::Experience, 3));
            }
            GameEvent::PowerUpCollected { kind, pos } => {
                bursts.push((pos, ParticleColor::PowerUp(kind), 8))
            }
            GameEvent::ProjectileDestroyed { pos } => {
                bursts.push((pos, ParticleColor::EnemyShot, 3))
            }
            GameEvent::LevelUp { .. } => bursts.push((player, ParticleColor::Experience, 10)),
            _ => {}
        }
    }

    for (pos, color, count) in bursts {
        for _ in 0..count {
            let vel = Vec2::new(
                state.fx_rng.random_range(-100.0..100.0),
                state.fx_rng.random_range(-100.0..100.0),
            );
            state.particles.push(Particle {
                pos,
                vel,
                color,
                life_ms: PARTICLE_LIFE_MS,
                size: state.fx_rng.random_range(2.0..6.0),
            });
        }
    }

    let excess = state.particles.len().saturating_sub(state.particle_cap);
    state.particles.drain(..excess);
}

/// Distance within which the autopilot backs away from a threat
const AUTOPILOT_FLEE_RADIUS: f32 = 150.0;

/// Demo-mode input: shoot the nearest enemy, back off from anything close,
/// otherwise wander toward power-ups.
fn autopilot(state: &GameState) -> TickInput {
    let me = state.player.pos;

    let mut input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let enemy = nearest(me, state.enemies.iter().filter(|e| e.is_alive()).map(|e| e.pos));
    if let Some(target) = enemy {
        input.aim = Some(target);
        input.fire = Some(target);
    }

    let shots = state
        .enemies
        .iter()
        .filter_map(|e| e.boss.as_ref())
        .flat_map(|kit| kit.projectiles.iter().map(|p| p.pos));
    let threat = nearest(me, enemy.into_iter().chain(shots))
        .filter(|t| t.distance(me) < AUTOPILOT_FLEE_RADIUS);

    if let Some(threat) = threat {
        input.movement = -key_axes(me, threat);
    } else if let Some(goal) = nearest(me, state.power_ups.iter().map(|p| p.pos)) {
        input.movement = key_axes(me, goal);
    }
    input
}

fn nearest(me: Vec2, points: impl Iterator<Item = Vec2>) -> Option<Vec2> {
    points.min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)))
}

/// Per-axis key presses that would move `from` toward `to`
fn key_axes(from: Vec2, to: Vec2) -> Vec2 {
    let press = |d: f32| {
        if d > 1.0 {
            1.0
        } else if d < -1.0 {
            -1.0
        } else {
            0.0
        }
    };
    let d = to - from;
    Vec2::new(press(d.x), press(d.y))
}

/// Fixed-step driver: turns variable host frames into whole ticks
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator_ms: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many ticks as `frame_ms` covers.
    ///
    /// One-shot inputs are cleared after the first tick. Events from every
    /// tick are drained out of the state and returned in order.
    pub fn step(
        &mut self,
        state: &mut GameState,
        input: &mut TickInput,
        frame_ms: f32,
    ) -> Vec<GameEvent> {
        let frame_ms = if frame_ms.is_finite() {
            frame_ms.clamp(0.0, MAX_FRAME_MS)
        } else {
            0.0
        };
        self.accumulator_ms += frame_ms;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator_ms >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            tick(state, input, SIM_DT_MS);
            events.append(&mut state.events);
            self.accumulator_ms -= SIM_DT_MS;
            substeps += 1;

            // Clear one-shot inputs after processing
            input.clear_one_shots();
        }
        if substeps == MAX_SUBSTEPS && self.accumulator_ms >= SIM_DT_MS {
            log::debug!("Dropping {:.1} ms of simulation backlog", self.accumulator_ms);
            self.accumulator_ms = 0.0;
        }
        events
    }

    /// Fraction of a tick left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator_ms / SIM_DT_MS
    }
}
