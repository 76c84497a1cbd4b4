//! Data-driven game balance
//!
//! Every gameplay number lives here so a run can be rebalanced from a JSON
//! file without touching the simulation. Defaults reproduce the stock game.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load or validate a tuning table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f32,
    /// Units per second
    pub speed: f32,
    pub max_health: f32,
    pub fire_cooldown_ms: f32,
    pub immunity_ms: f32,
    /// Bullets leave the cannon this far from the player center
    pub muzzle_offset: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 25.0,
            speed: 200.0,
            max_health: 100.0,
            fire_cooldown_ms: 200.0,
            immunity_ms: 1000.0,
            muzzle_offset: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub radius: f32,
    pub speed: f32,
    pub damage: f32,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            radius: 4.0,
            speed: 500.0,
            damage: 10.0,
        }
    }
}

/// Base stats of an enemy body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub radius: f32,
    pub speed: f32,
    pub health: f32,
    pub contact_damage: f32,
    pub points: u64,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            radius: 20.0,
            speed: 50.0,
            health: 30.0,
            contact_damage: 10.0,
            points: 10,
        }
    }
}

/// Boss placement and per-level scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub speed: f32,
    pub contact_damage: f32,
    pub points: u64,

    pub wave_radius: f32,
    pub wave_base_health: f32,
    pub wave_health_per_level: f32,
    /// Distance band from arena center for placement
    pub wave_spawn_min: f32,
    pub wave_spawn_max: f32,
    pub wave_edge_margin: f32,
    pub wave_min_player_distance: f32,

    pub level_radius: f32,
    pub level_base_health: f32,
    pub level_health_per_level: f32,
    pub level_base_damage: f32,
    pub level_damage_per_level: f32,
    pub level_spawn_min: f32,
    pub level_spawn_max: f32,
    pub level_edge_margin: f32,
    pub level_min_player_distance: f32,

    pub placement_attempts: u32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            speed: 80.0,
            contact_damage: 25.0,
            points: 50,

            wave_radius: 30.0,
            wave_base_health: 60.0,
            wave_health_per_level: 10.0,
            wave_spawn_min: 150.0,
            wave_spawn_max: 350.0,
            wave_edge_margin: 50.0,
            wave_min_player_distance: 100.0,

            level_radius: 40.0,
            level_base_health: 150.0,
            level_health_per_level: 30.0,
            level_base_damage: 30.0,
            level_damage_per_level: 5.0,
            level_spawn_min: 200.0,
            level_spawn_max: 450.0,
            level_edge_margin: 60.0,
            level_min_player_distance: 120.0,

            placement_attempts: 10,
        }
    }
}

/// A boss-fired projectile pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolleyTuning {
    pub speed: f32,
    pub radius: f32,
    pub damage: f32,
    pub lifetime_ms: f32,
}

impl Default for VolleyTuning {
    fn default() -> Self {
        Self {
            speed: 300.0,
            radius: 8.0,
            damage: 20.0,
            lifetime_ms: 3000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTuning {
    pub ranged_cooldown_ms: f32,
    pub teleport_cooldown_ms: f32,
    pub charge_cooldown_ms: f32,
    pub area_cooldown_ms: f32,

    pub ranged: VolleyTuning,
    pub area: VolleyTuning,
    /// Angle between neighbouring projectiles of the area spread (radians)
    pub area_spread: f32,
    pub area_count: u32,

    pub teleport_min: f32,
    pub teleport_max: f32,
    pub teleport_stun_ms: f32,

    pub charge_multiplier: f32,
    pub charge_ms: f32,

    /// Enemy projectiles survive this far outside the arena
    pub projectile_bounds_margin: f32,
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            ranged_cooldown_ms: 2000.0,
            teleport_cooldown_ms: 3000.0,
            charge_cooldown_ms: 4000.0,
            area_cooldown_ms: 2500.0,

            ranged: VolleyTuning::default(),
            area: VolleyTuning {
                speed: 200.0,
                radius: 6.0,
                damage: 15.0,
                lifetime_ms: 4000.0,
            },
            area_spread: 0.3,
            area_count: 3,

            teleport_min: 100.0,
            teleport_max: 200.0,
            teleport_stun_ms: 500.0,

            charge_multiplier: 2.5,
            charge_ms: 1500.0,

            projectile_bounds_margin: 50.0,
        }
    }
}

/// Stat changes granted by a timed power-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffProfile {
    pub speed_multiplier: f32,
    pub damage_multiplier: f32,
    pub health_regen_per_sec: f32,
    pub fire_cooldown_override_ms: Option<f32>,
}

impl Default for BuffProfile {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            damage_multiplier: 1.0,
            health_regen_per_sec: 0.0,
            fire_cooldown_override_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpTuning {
    pub radius: f32,
    /// Bernoulli chance per simulation tick
    pub spawn_chance: f64,
    pub duration_ms: f32,
    pub heal_amount: f32,
    pub speed: BuffProfile,
    pub damage: BuffProfile,
    pub rapid_fire: BuffProfile,
    pub explosive: BuffProfile,
}

impl Default for PowerUpTuning {
    fn default() -> Self {
        Self {
            radius: 15.0,
            spawn_chance: 0.002,
            duration_ms: 5000.0,
            heal_amount: 30.0,
            speed: BuffProfile {
                speed_multiplier: 1.5,
                ..BuffProfile::default()
            },
            damage: BuffProfile {
                damage_multiplier: 2.0,
                ..BuffProfile::default()
            },
            rapid_fire: BuffProfile {
                fire_cooldown_override_ms: Some(100.0),
                ..BuffProfile::default()
            },
            explosive: BuffProfile {
                damage_multiplier: 1.5,
                ..BuffProfile::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub waves_per_level: u32,
    /// Required kills = min(base + level + wave, cap)
    pub base_enemies: u32,
    pub max_enemies: u32,
    pub spawn_interval_ms: f32,
    /// Regular enemies appear this far outside the arena edge
    pub spawn_edge_offset: f32,
    pub first_wave_delay_ms: f32,
    pub next_wave_delay_ms: f32,
    pub transition_delay_ms: f32,
    pub map_intro_delay_ms: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            waves_per_level: 3,
            base_enemies: 4,
            max_enemies: 12,
            spawn_interval_ms: 800.0,
            spawn_edge_offset: 50.0,
            first_wave_delay_ms: 1000.0,
            next_wave_delay_ms: 2000.0,
            transition_delay_ms: 2000.0,
            map_intro_delay_ms: 3000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceTuning {
    pub initial_threshold: u32,
    pub threshold_growth: f64,
    pub level_up_heal: f32,
    pub regular_kill: u32,
    pub wave_boss_kill: u32,
    pub level_boss_kill: u32,
    pub wave_boss_bonus: u32,
    pub level_boss_bonus: u32,
}

impl Default for ExperienceTuning {
    fn default() -> Self {
        Self {
            initial_threshold: 100,
            threshold_growth: 1.3,
            level_up_heal: 30.0,
            regular_kill: 10,
            wave_boss_kill: 25,
            level_boss_kill: 50,
            wave_boss_bonus: 25,
            level_boss_bonus: 100,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub bullet: BulletTuning,
    pub enemy: EnemyTuning,
    pub boss: BossTuning,
    pub abilities: AbilityTuning,
    pub power_ups: PowerUpTuning,
    pub waves: WaveTuning,
    pub experience: ExperienceTuning,
    /// Cyclic map rotation, display names in order
    pub maps: Vec<String>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            bullet: BulletTuning::default(),
            enemy: EnemyTuning::default(),
            boss: BossTuning::default(),
            abilities: AbilityTuning::default(),
            power_ups: PowerUpTuning::default(),
            waves: WaveTuning::default(),
            experience: ExperienceTuning::default(),
            maps: [
                "City Streets",
                "Zombie Park",
                "Space Station",
                "Underwater Base",
                "Desert Outpost",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning table; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a tuning file, falling back to defaults when it is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Reject tables that would stall or break the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, v: f32) -> Result<(), TuningError> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: "must be positive",
                })
            }
        }

        positive("player.radius", self.player.radius)?;
        positive("player.speed", self.player.speed)?;
        positive("player.max_health", self.player.max_health)?;
        positive("bullet.radius", self.bullet.radius)?;
        positive("bullet.speed", self.bullet.speed)?;
        positive("bullet.damage", self.bullet.damage)?;
        positive("enemy.radius", self.enemy.radius)?;
        positive("enemy.health", self.enemy.health)?;
        positive("boss.wave_base_health", self.boss.wave_base_health)?;
        positive("boss.level_base_health", self.boss.level_base_health)?;
        positive("power_ups.radius", self.power_ups.radius)?;

        if self.boss.wave_spawn_min > self.boss.wave_spawn_max
            || self.boss.level_spawn_min > self.boss.level_spawn_max
        {
            return Err(TuningError::Invalid {
                field: "boss.*_spawn_min",
                reason: "spawn band minimum exceeds maximum",
            });
        }
        if self.abilities.teleport_min > self.abilities.teleport_max {
            return Err(TuningError::Invalid {
                field: "abilities.teleport_min",
                reason: "exceeds teleport_max",
            });
        }
        if !(0.0..=1.0).contains(&self.power_ups.spawn_chance) {
            return Err(TuningError::Invalid {
                field: "power_ups.spawn_chance",
                reason: "must be a probability in [0, 1]",
            });
        }
        if self.waves.waves_per_level == 0 {
            return Err(TuningError::Invalid {
                field: "waves.waves_per_level",
                reason: "must be at least 1",
            });
        }
        if self.waves.max_enemies == 0 {
            return Err(TuningError::Invalid {
                field: "waves.max_enemies",
                reason: "a wave needs at least one enemy",
            });
        }
        if self.experience.initial_threshold == 0 || self.experience.threshold_growth < 1.0 {
            return Err(TuningError::Invalid {
                field: "experience.initial_threshold",
                reason: "threshold must be non-zero and never shrink",
            });
        }
        if self.maps.is_empty() {
            return Err(TuningError::Invalid {
                field: "maps",
                reason: "at least one map is required",
            });
        }
        Ok(())
    }
}
