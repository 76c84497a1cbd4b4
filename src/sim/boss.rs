//! Boss abilities
//!
//! Every boss gets one ability for life. Abilities are rows in a small
//! strategy table (cooldown lookup + effect fn) rather than boss subtypes.
//! A boss that is teleporting or charging holds an `ActingWindow`; the
//! window owns any speed override, so expiry always restores baseline.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Enemy, EnemyProjectile};
use crate::Arena;
use crate::tuning::{AbilityTuning, VolleyTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Single aimed fireball
    Ranged,
    /// Blink near the player, then hold still briefly
    Teleport,
    /// Burst of speed toward the player
    Charge,
    /// Three-way poison spread
    AreaRanged,
}

impl Ability {
    pub const ALL: [Ability; 4] = [
        Ability::Ranged,
        Ability::Teleport,
        Ability::Charge,
        Ability::AreaRanged,
    ];

    pub fn random(rng: &mut Pcg32) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    fn def(self) -> &'static AbilityDef {
        &ABILITY_TABLE[self as usize]
    }

    pub fn cooldown_ms(self, tuning: &AbilityTuning) -> f32 {
        (self.def().cooldown)(tuning)
    }
}

/// Timed interval in which a boss is busy with an ability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActingWindow {
    /// No movement (post-teleport recovery)
    Stunned { remaining_ms: f32 },
    /// Moves at a multiple of baseline speed
    Charging {
        remaining_ms: f32,
        speed_multiplier: f32,
    },
}

impl ActingWindow {
    pub fn speed_multiplier(&self) -> f32 {
        match *self {
            ActingWindow::Stunned { .. } => 0.0,
            ActingWindow::Charging {
                speed_multiplier, ..
            } => speed_multiplier,
        }
    }

    /// Run the window down; returns true once it has expired
    fn elapse(&mut self, dt_ms: f32) -> bool {
        let remaining = match self {
            ActingWindow::Stunned { remaining_ms } => remaining_ms,
            ActingWindow::Charging { remaining_ms, .. } => remaining_ms,
        };
        *remaining -= dt_ms;
        *remaining <= 0.0
    }
}

/// Boss-only state carried by an `Enemy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossKit {
    pub ability: Ability,
    /// Time accumulated since the ability last fired
    pub ability_timer_ms: f32,
    pub acting: Option<ActingWindow>,
    pub projectiles: Vec<EnemyProjectile>,
}

impl BossKit {
    pub fn new(ability: Ability) -> Self {
        Self {
            ability,
            ability_timer_ms: 0.0,
            acting: None,
            projectiles: Vec::new(),
        }
    }

    /// Multiple of baseline speed this tick (0 while stunned)
    pub fn movement_multiplier(&self) -> f32 {
        self.acting.map_or(1.0, |w| w.speed_multiplier())
    }
}

/// What an ability effect may touch
struct AbilityCtx<'a> {
    pos: &'a mut Vec2,
    radius: f32,
    target: Vec2,
    arena: &'a Arena,
    tuning: &'a AbilityTuning,
    rng: &'a mut Pcg32,
    acting: &'a mut Option<ActingWindow>,
    projectiles: &'a mut Vec<EnemyProjectile>,
}

struct AbilityDef {
    cooldown: fn(&AbilityTuning) -> f32,
    effect: fn(&mut AbilityCtx<'_>),
}

/// Indexed by `Ability as usize`
static ABILITY_TABLE: [AbilityDef; 4] = [
    AbilityDef {
        cooldown: ranged_cooldown,
        effect: fire_single,
    },
    AbilityDef {
        cooldown: teleport_cooldown,
        effect: teleport,
    },
    AbilityDef {
        cooldown: charge_cooldown,
        effect: charge,
    },
    AbilityDef {
        cooldown: area_cooldown,
        effect: fire_spread,
    },
];

fn ranged_cooldown(t: &AbilityTuning) -> f32 {
    t.ranged_cooldown_ms
}

fn teleport_cooldown(t: &AbilityTuning) -> f32 {
    t.teleport_cooldown_ms
}

fn charge_cooldown(t: &AbilityTuning) -> f32 {
    t.charge_cooldown_ms
}

fn area_cooldown(t: &AbilityTuning) -> f32 {
    t.area_cooldown_ms
}

fn aim_angle(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

fn launch(ctx: &mut AbilityCtx<'_>, angle: f32, volley: &VolleyTuning) {
    ctx.projectiles.push(EnemyProjectile {
        pos: *ctx.pos,
        vel: Vec2::from_angle(angle) * volley.speed,
        radius: volley.radius,
        damage: volley.damage,
        life_ms: volley.lifetime_ms,
    });
}

fn fire_single(ctx: &mut AbilityCtx<'_>) {
    let tuning = ctx.tuning;
    let angle = aim_angle(*ctx.pos, ctx.target);
    launch(ctx, angle, &tuning.ranged);
}

fn fire_spread(ctx: &mut AbilityCtx<'_>) {
    let tuning = ctx.tuning;
    let base = aim_angle(*ctx.pos, ctx.target);
    let half = tuning.area_count.saturating_sub(1) as f32 / 2.0;
    for i in 0..tuning.area_count {
        let offset = (i as f32 - half) * tuning.area_spread;
        launch(ctx, base + offset, &tuning.area);
    }
}

fn teleport(ctx: &mut AbilityCtx<'_>) {
    let angle = ctx.rng.random_range(0.0..std::f32::consts::TAU);
    let distance = ctx
        .rng
        .random_range(ctx.tuning.teleport_min..=ctx.tuning.teleport_max);
    let dest = crate::polar_offset(ctx.target, angle, distance);
    *ctx.pos = ctx.arena.clamp(dest, ctx.radius);
    *ctx.acting = Some(ActingWindow::Stunned {
        remaining_ms: ctx.tuning.teleport_stun_ms,
    });
}

fn charge(ctx: &mut AbilityCtx<'_>) {
    *ctx.acting = Some(ActingWindow::Charging {
        remaining_ms: ctx.tuning.charge_ms,
        speed_multiplier: ctx.tuning.charge_multiplier,
    });
}

/// Per-tick enemy update: move toward `target`, and for bosses run the
/// acting window, their projectiles and the ability trigger.
pub fn advance_enemy(
    enemy: &mut Enemy,
    dt_ms: f32,
    target: Vec2,
    arena: &Arena,
    tuning: &AbilityTuning,
    rng: &mut Pcg32,
) {
    if enemy.boss.is_none() {
        enemy.chase(target, 1.0, dt_ms);
        return;
    }
    let Some(kit) = enemy.boss.as_mut() else {
        return;
    };

    // Movement uses the window as it stood when the tick began
    let multiplier = kit.movement_multiplier();
    if let Some(window) = kit.acting.as_mut() {
        if window.elapse(dt_ms) {
            kit.acting = None;
        }
    }

    let margin = tuning.projectile_bounds_margin;
    kit.projectiles.retain_mut(|p| {
        p.advance(dt_ms);
        p.life_ms > 0.0 && arena.contains(p.pos, margin)
    });

    kit.ability_timer_ms += dt_ms;
    let ready = kit.acting.is_none() && kit.ability_timer_ms >= kit.ability.cooldown_ms(tuning);

    // Split borrows: chase needs the enemy, effects need the kit
    let ability = kit.ability;
    if ready {
        kit.ability_timer_ms = 0.0;
    }
    enemy.chase(target, multiplier, dt_ms);

    if ready {
        let radius = enemy.radius;
        let Some(kit) = enemy.boss.as_mut() else {
            return;
        };
        let mut ctx = AbilityCtx {
            pos: &mut enemy.pos,
            radius,
            target,
            arena,
            tuning,
            rng,
            acting: &mut kit.acting,
            projectiles: &mut kit.projectiles,
        };
        (ability.def().effect)(&mut ctx);
        log::trace!("Boss {} used {:?}", enemy.id, ability);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::EnemyRole;
    use rand::SeedableRng;

    fn boss(ability: Ability, pos: Vec2) -> Enemy {
        Enemy {
            id: 1,
            role: EnemyRole::WaveBoss,
            pos,
            radius: 30.0,
            speed: 80.0,
            health: 100.0,
            max_health: 100.0,
            contact_damage: 25.0,
            points: 50,
            boss: Some(BossKit::new(ability)),
        }
    }

    fn kit(e: &Enemy) -> &BossKit {
        e.boss.as_ref().unwrap()
    }

    #[test]
    fn test_table_order_matches_variants() {
        let t = AbilityTuning::default();
        assert_eq!(Ability::Ranged.cooldown_ms(&t), 2000.0);
        assert_eq!(Ability::Teleport.cooldown_ms(&t), 3000.0);
        assert_eq!(Ability::Charge.cooldown_ms(&t), 4000.0);
        assert_eq!(Ability::AreaRanged.cooldown_ms(&t), 2500.0);
    }

    #[test]
    fn test_ranged_fires_on_cooldown() {
        let arena = Arena::new(2000.0, 2000.0);
        let t = AbilityTuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut e = boss(Ability::Ranged, Vec2::new(500.0, 500.0));
        let player = Vec2::new(900.0, 500.0);

        advance_enemy(&mut e, 1999.0, player, &arena, &t, &mut rng);
        assert!(kit(&e).projectiles.is_empty());
        advance_enemy(&mut e, 1.0, player, &arena, &t, &mut rng);
        let shots = &kit(&e).projectiles;
        assert_eq!(shots.len(), 1);
        assert!(shots[0].vel.x > 299.0);
        assert_eq!(shots[0].damage, 20.0);
        assert_eq!(kit(&e).ability_timer_ms, 0.0);
    }

    #[test]
    fn test_area_spread_is_symmetric() {
        let arena = Arena::new(2000.0, 2000.0);
        let t = AbilityTuning::default();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut e = boss(Ability::AreaRanged, Vec2::new(500.0, 500.0));
        advance_enemy(&mut e, 2500.0, Vec2::new(500.0, 900.0), &arena, &t, &mut rng);

        let shots = &kit(&e).projectiles;
        assert_eq!(shots.len(), 3);
        let angles: Vec<f32> = shots.iter().map(|p| p.vel.y.atan2(p.vel.x)).collect();
        let center = std::f32::consts::FRAC_PI_2;
        assert!((angles[0] - (center - 0.3)).abs() < 1e-4);
        assert!((angles[1] - center).abs() < 1e-4);
        assert!((angles[2] - (center + 0.3)).abs() < 1e-4);
    }

    #[test]
    fn test_teleport_lands_in_band_and_stuns() {
        let arena = Arena::new(2000.0, 2000.0);
        let t = AbilityTuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let player = Vec2::new(1000.0, 1000.0);
        let mut e = boss(Ability::Teleport, Vec2::new(100.0, 100.0));

        advance_enemy(&mut e, 3000.0, player, &arena, &t, &mut rng);
        let d = e.pos.distance(player);
        assert!((100.0..=200.0).contains(&d), "distance {d}");
        assert!(matches!(kit(&e).acting, Some(ActingWindow::Stunned { .. })));

        // Stunned: no movement for the window
        let before = e.pos;
        advance_enemy(&mut e, 400.0, player, &arena, &t, &mut rng);
        assert_eq!(e.pos, before);
        advance_enemy(&mut e, 100.0, player, &arena, &t, &mut rng);
        assert_eq!(e.pos, before);
        assert!(kit(&e).acting.is_none());
        advance_enemy(&mut e, 100.0, player, &arena, &t, &mut rng);
        assert_ne!(e.pos, before);
    }

    #[test]
    fn test_teleport_clamps_to_arena() {
        let arena = Arena::new(300.0, 300.0);
        let t = AbilityTuning::default();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut e = boss(Ability::Teleport, Vec2::new(150.0, 150.0));
        for _ in 0..10 {
            advance_enemy(&mut e, 3000.0, Vec2::new(10.0, 10.0), &arena, &t, &mut rng);
            assert!(e.pos.x >= 30.0 && e.pos.x <= 270.0);
            assert!(e.pos.y >= 30.0 && e.pos.y <= 270.0);
        }
    }

    #[test]
    fn test_charge_moves_faster_then_restores() {
        let arena = Arena::new(10_000.0, 10_000.0);
        let t = AbilityTuning::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let player = Vec2::new(9000.0, 100.0);
        let mut e = boss(Ability::Charge, Vec2::new(100.0, 100.0));

        advance_enemy(&mut e, 4000.0, player, &arena, &t, &mut rng);
        assert!(matches!(kit(&e).acting, Some(ActingWindow::Charging { .. })));

        let x0 = e.pos.x;
        advance_enemy(&mut e, 100.0, player, &arena, &t, &mut rng);
        assert!((e.pos.x - x0 - 20.0).abs() < 1e-3, "charging step");

        // Run out the rest of the window (1400 ms)
        advance_enemy(&mut e, 1400.0, player, &arena, &t, &mut rng);
        assert!(kit(&e).acting.is_none());
        let x1 = e.pos.x;
        advance_enemy(&mut e, 100.0, player, &arena, &t, &mut rng);
        assert!((e.pos.x - x1 - 8.0).abs() < 1e-3, "baseline step");
        assert_eq!(e.speed, 80.0);
    }

    #[test]
    fn test_no_ability_while_acting() {
        let arena = Arena::new(10_000.0, 10_000.0);
        let mut t = AbilityTuning::default();
        t.charge_cooldown_ms = 100.0;
        let mut rng = Pcg32::seed_from_u64(6);
        let mut e = boss(Ability::Charge, Vec2::new(100.0, 100.0));
        advance_enemy(&mut e, 100.0, Vec2::new(5000.0, 100.0), &arena, &t, &mut rng);
        let Some(ActingWindow::Charging { remaining_ms, .. }) = kit(&e).acting else {
            panic!("expected a charge");
        };
        // Cooldown elapses again mid-charge but the window is not refreshed
        advance_enemy(&mut e, 200.0, Vec2::new(5000.0, 100.0), &arena, &t, &mut rng);
        let Some(ActingWindow::Charging { remaining_ms: later, .. }) = kit(&e).acting else {
            panic!("charge should still run");
        };
        assert!(later < remaining_ms);
    }

    #[test]
    fn test_projectiles_expire_by_lifetime_and_bounds() {
        let arena = Arena::new(1000.0, 1000.0);
        let mut t = AbilityTuning::default();
        t.charge_cooldown_ms = f32::MAX;
        let mut rng = Pcg32::seed_from_u64(7);
        let mut e = boss(Ability::Charge, Vec2::new(500.0, 500.0));
        let kit = e.boss.as_mut().unwrap();
        kit.projectiles.push(EnemyProjectile {
            pos: Vec2::new(500.0, 100.0),
            vel: Vec2::ZERO,
            radius: 8.0,
            damage: 20.0,
            life_ms: 3000.0,
        });
        kit.projectiles.push(EnemyProjectile {
            pos: Vec2::new(1040.0, 500.0),
            vel: Vec2::new(100.0, 0.0),
            radius: 8.0,
            damage: 20.0,
            life_ms: 3000.0,
        });

        // Second one drifts past the 50 unit margin after 100 ms
        advance_enemy(&mut e, 200.0, Vec2::new(500.0, 900.0), &arena, &t, &mut rng);
        assert_eq!(kit_len(&e), 1);
        advance_enemy(&mut e, 2799.0, Vec2::new(500.0, 900.0), &arena, &t, &mut rng);
        assert_eq!(kit_len(&e), 1);
        advance_enemy(&mut e, 1.0, Vec2::new(500.0, 900.0), &arena, &t, &mut rng);
        assert_eq!(kit_len(&e), 0);
    }

    fn kit_len(e: &Enemy) -> usize {
        kit(e).projectiles.len()
    }
}
