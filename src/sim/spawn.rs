//! Spawn director
//!
//! Builds new entities at legal positions. Returns them to the caller; the
//! tick decides when they enter the world.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::boss::{Ability, BossKit};
use super::state::{Enemy, EnemyRole, PowerUp, PowerUpKind};
use crate::tuning::Tuning;
use crate::{Arena, polar_offset};

/// One regular enemy just outside a random arena edge
pub fn regular_enemy(id: u32, arena: &Arena, tuning: &Tuning, rng: &mut Pcg32) -> Enemy {
    let offset = tuning.waves.spawn_edge_offset;
    let along_x = rng.random_range(0.0..=arena.width);
    let along_y = rng.random_range(0.0..=arena.height);
    let pos = match rng.random_range(0..4) {
        0 => Vec2::new(along_x, -offset),
        1 => Vec2::new(arena.width + offset, along_y),
        2 => Vec2::new(along_x, arena.height + offset),
        _ => Vec2::new(-offset, along_y),
    };
    log::trace!("Regular enemy {} at ({:.0}, {:.0})", id, pos.x, pos.y);
    Enemy::regular(id, pos, &tuning.enemy)
}

/// Placement band for a boss search
struct Placement {
    min_radius: f32,
    max_radius: f32,
    edge_margin: f32,
    min_player_distance: f32,
}

/// Random point in a ring around the arena center, kept off the player.
///
/// Gives up after `attempts` tries and keeps the last candidate.
fn place_boss(
    band: &Placement,
    attempts: u32,
    arena: &Arena,
    player: Vec2,
    rng: &mut Pcg32,
) -> Vec2 {
    let center = arena.center();
    let mut candidate = center;
    for _ in 0..attempts.max(1) {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let distance = rng.random_range(band.min_radius..=band.max_radius);
        candidate = arena.clamp(polar_offset(center, angle, distance), band.edge_margin);
        if candidate.distance(player) >= band.min_player_distance {
            return candidate;
        }
    }
    log::warn!(
        "Boss placement exhausted {} attempts; spawning {:.0} from player",
        attempts,
        candidate.distance(player)
    );
    candidate
}

#[allow(clippy::too_many_arguments)]
fn boss_body(
    id: u32,
    role: EnemyRole,
    pos: Vec2,
    radius: f32,
    health: f32,
    contact_damage: f32,
    tuning: &Tuning,
    rng: &mut Pcg32,
) -> Enemy {
    Enemy {
        id,
        role,
        pos,
        radius,
        speed: tuning.boss.speed,
        health,
        max_health: health,
        contact_damage,
        points: tuning.boss.points,
        boss: Some(BossKit::new(Ability::random(rng))),
    }
}

pub fn wave_boss(
    id: u32,
    level: u32,
    arena: &Arena,
    player: Vec2,
    tuning: &Tuning,
    rng: &mut Pcg32,
) -> Enemy {
    let b = &tuning.boss;
    let band = Placement {
        min_radius: b.wave_spawn_min,
        max_radius: b.wave_spawn_max,
        edge_margin: b.wave_edge_margin,
        min_player_distance: b.wave_min_player_distance,
    };
    let pos = place_boss(&band, b.placement_attempts, arena, player, rng);
    let health = b.wave_base_health + b.wave_health_per_level * level as f32;
    boss_body(
        id,
        EnemyRole::WaveBoss,
        pos,
        b.wave_radius,
        health,
        b.contact_damage,
        tuning,
        rng,
    )
}

pub fn level_boss(
    id: u32,
    level: u32,
    arena: &Arena,
    player: Vec2,
    tuning: &Tuning,
    rng: &mut Pcg32,
) -> Enemy {
    let b = &tuning.boss;
    let band = Placement {
        min_radius: b.level_spawn_min,
        max_radius: b.level_spawn_max,
        edge_margin: b.level_edge_margin,
        min_player_distance: b.level_min_player_distance,
    };
    let pos = place_boss(&band, b.placement_attempts, arena, player, rng);
    let health = b.level_base_health + b.level_health_per_level * level as f32;
    let damage = b.level_base_damage + b.level_damage_per_level * level as f32;
    boss_body(
        id,
        EnemyRole::LevelBoss,
        pos,
        b.level_radius,
        health,
        damage,
        tuning,
        rng,
    )
}

/// Per-tick power-up roll; `id` is only consumed when one spawns
pub fn roll_power_up(
    next_id: impl FnOnce() -> u32,
    arena: &Arena,
    tuning: &Tuning,
    rng: &mut Pcg32,
) -> Option<PowerUp> {
    let p = &tuning.power_ups;
    if !rng.random_bool(p.spawn_chance) {
        return None;
    }
    let margin = p.radius * 2.0;
    let x = inset_range(rng, arena.width, margin);
    let y = inset_range(rng, arena.height, margin);
    let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
    Some(PowerUp {
        id: next_id(),
        kind,
        pos: Vec2::new(x, y),
        radius: p.radius,
    })
}

/// Uniform in [margin, extent - margin], or the midpoint if that is empty
fn inset_range(rng: &mut Pcg32, extent: f32, margin: f32) -> f32 {
    if extent > margin * 2.0 {
        rng.random_range(margin..=extent - margin)
    } else {
        extent / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_regular_spawns_just_off_an_edge() {
        let arena = Arena::new(800.0, 600.0);
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(11);
        for id in 0..200 {
            let e = regular_enemy(id, &arena, &tuning, &mut rng);
            let p = e.pos;
            let on_edge = p.y == -50.0 || p.y == 650.0 || p.x == -50.0 || p.x == 850.0;
            assert!(on_edge, "{p:?}");
            assert!(!arena.contains(p, 0.0));
            assert!(arena.contains(p, 50.0));
            assert_eq!(e.role, EnemyRole::Regular);
            assert_eq!(e.health, 30.0);
        }
    }

    #[test]
    fn test_boss_stats_scale_with_level() {
        let arena = Arena::default();
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(12);
        let player = Vec2::new(50.0, 50.0);

        let wb = wave_boss(1, 3, &arena, player, &tuning, &mut rng);
        assert_eq!(wb.health, 90.0);
        assert_eq!(wb.max_health, 90.0);
        assert_eq!(wb.contact_damage, 25.0);

        let lb = level_boss(2, 3, &arena, player, &tuning, &mut rng);
        assert_eq!(lb.health, 240.0);
        assert_eq!(lb.contact_damage, 45.0);
        assert!(lb.radius > wb.radius);
        assert!(wb.radius > tuning.enemy.radius);
        assert!(lb.boss.is_some() && wb.boss.is_some());
    }

    #[test]
    fn test_boss_keeps_distance_from_player() {
        let arena = Arena::default();
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(13);
        let player = Vec2::new(300.0, 300.0);
        for id in 0..100 {
            let b = wave_boss(id, 1, &arena, player, &tuning, &mut rng);
            assert!(b.pos.distance(player) >= 100.0);
            assert!(b.pos.x >= 50.0 && b.pos.x <= 1150.0);
            assert!(b.pos.y >= 50.0 && b.pos.y <= 750.0);
        }
    }

    #[test]
    fn test_boss_placement_accepts_last_candidate() {
        // Tiny arena: every candidate clamps to the center, where the player is
        let arena = Arena::new(100.0, 100.0);
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(14);
        let b = level_boss(1, 1, &arena, arena.center(), &tuning, &mut rng);
        assert_eq!(b.pos, arena.center());
    }

    #[test]
    fn test_power_up_roll_respects_chance() {
        let arena = Arena::default();
        let mut rng = Pcg32::seed_from_u64(15);

        let mut never = Tuning::default();
        never.power_ups.spawn_chance = 0.0;
        assert!(roll_power_up(|| 1, &arena, &never, &mut rng).is_none());

        let mut always = Tuning::default();
        always.power_ups.spawn_chance = 1.0;
        for _ in 0..50 {
            let p = roll_power_up(|| 7, &arena, &always, &mut rng).unwrap();
            assert_eq!(p.id, 7);
            assert!(p.pos.x >= 30.0 && p.pos.x <= 1170.0);
            assert!(p.pos.y >= 30.0 && p.pos.y <= 770.0);
        }
    }
}
