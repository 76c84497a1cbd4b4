//! Level progression state machine
//!
//! wave -> waveBoss -> (wave ... | levelBoss) -> transition -> wave (next map)
//!
//! The machine only decides. It hands back an `Advance` and the tick carries
//! it out (spawning bosses, clearing the field, queueing delayed events).
//! Boss deaths are edge-triggered: the tick reports the kill once via
//! `record_kill` and `evaluate` consumes it once.

use serde::{Deserialize, Serialize};

use super::schedule::PhaseGuard;
use super::state::EnemyRole;
use crate::tuning::{ExperienceTuning, Tuning, WaveTuning};

/// Current stage of level progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Regular enemies stream in until the kill quota is met
    Wave,
    /// One wave boss is on the field
    WaveBoss,
    /// The level boss is on the field
    LevelBoss,
    /// Level cleared; waiting to enter the next map
    Transition,
}

/// Work the tick must perform after a phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Wave quota met with the field clear
    SpawnWaveBoss,
    /// Wave boss defeated, another wave follows after a delay
    NextWave { bonus_xp: u32 },
    /// Final wave boss defeated; clear the field and bring the level boss
    SpawnLevelBoss { bonus_xp: u32 },
    /// Level boss defeated
    LevelCleared { bonus_xp: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub phase: LevelPhase,
    /// 1-based wave within the current level
    pub wave: u32,
    pub waves_per_level: u32,
    /// Zero until the wave's spawn schedule has started
    pub required_kills: u32,
    pub kills: u32,
    pub map_index: usize,
    map_count: usize,
    /// Levels cleared so far
    pub stage: u32,
    /// Entity id of the boss being tracked (not owned)
    pub active_boss: Option<u32>,
    boss_down: bool,
}

impl Progression {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            level: 1,
            experience: 0,
            experience_to_next: tuning.experience.initial_threshold,
            phase: LevelPhase::Wave,
            wave: 1,
            waves_per_level: tuning.waves.waves_per_level,
            required_kills: 0,
            kills: 0,
            map_index: 0,
            map_count: tuning.maps.len().max(1),
            stage: 0,
            active_boss: None,
            boss_down: false,
        }
    }

    /// Snapshot that delayed events must still match when they fire
    pub fn guard(&self) -> PhaseGuard {
        PhaseGuard {
            phase: self.phase,
            stage: self.stage,
            wave: self.wave,
        }
    }

    /// Regular kills needed to finish a wave
    pub fn required_for(level: u32, wave: u32, waves: &WaveTuning) -> u32 {
        (waves.base_enemies + level + wave).min(waves.max_enemies)
    }

    /// Start the current wave's quota; returns the number of spawns to queue
    pub fn begin_wave(&mut self, waves: &WaveTuning) -> u32 {
        self.required_kills = Self::required_for(self.level, self.wave, waves);
        self.kills = 0;
        log::debug!(
            "Wave {}/{} starting: {} enemies (level {})",
            self.wave,
            self.waves_per_level,
            self.required_kills,
            self.level
        );
        self.required_kills
    }

    pub fn track_boss(&mut self, id: u32) {
        self.active_boss = Some(id);
        self.boss_down = false;
    }

    /// Book a kill made by the tick
    pub fn record_kill(&mut self, id: u32, role: EnemyRole) {
        match role {
            EnemyRole::Regular => {
                if self.phase == LevelPhase::Wave {
                    self.kills += 1;
                }
            }
            EnemyRole::WaveBoss | EnemyRole::LevelBoss => {
                if self.active_boss == Some(id) {
                    self.boss_down = true;
                }
            }
        }
    }

    pub fn wave_complete(&self, regular_alive: usize) -> bool {
        self.required_kills > 0 && self.kills >= self.required_kills && regular_alive == 0
    }

    /// Check transition conditions once per tick
    pub fn evaluate(&mut self, regular_alive: usize, xp: &ExperienceTuning) -> Option<Advance> {
        match self.phase {
            LevelPhase::Wave => {
                if self.wave_complete(regular_alive) {
                    log::debug!("Wave {} cleared ({} kills)", self.wave, self.kills);
                    self.phase = LevelPhase::WaveBoss;
                    Some(Advance::SpawnWaveBoss)
                } else {
                    None
                }
            }
            LevelPhase::WaveBoss => {
                if !self.take_boss_down() {
                    return None;
                }
                self.wave += 1;
                self.kills = 0;
                self.required_kills = 0;
                if self.wave > self.waves_per_level {
                    self.phase = LevelPhase::LevelBoss;
                    Some(Advance::SpawnLevelBoss {
                        bonus_xp: xp.wave_boss_bonus,
                    })
                } else {
                    self.phase = LevelPhase::Wave;
                    Some(Advance::NextWave {
                        bonus_xp: xp.wave_boss_bonus,
                    })
                }
            }
            LevelPhase::LevelBoss => {
                if !self.take_boss_down() {
                    return None;
                }
                self.phase = LevelPhase::Transition;
                Some(Advance::LevelCleared {
                    bonus_xp: xp.level_boss_bonus,
                })
            }
            LevelPhase::Transition => None,
        }
    }

    fn take_boss_down(&mut self) -> bool {
        if self.boss_down {
            self.boss_down = false;
            self.active_boss = None;
            true
        } else {
            false
        }
    }

    /// Leave `Transition` for the first wave of the next map
    pub fn enter_next_map(&mut self) {
        self.stage += 1;
        self.map_index = (self.map_index + 1) % self.map_count;
        self.wave = 1;
        self.kills = 0;
        self.required_kills = 0;
        self.phase = LevelPhase::Wave;
    }

    /// Add XP and level up as many times as it covers.
    ///
    /// Returns the number of levels gained.
    pub fn gain_experience(&mut self, amount: u32, growth: f64) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        let mut gained = 0;
        while self.experience >= self.experience_to_next {
            self.experience -= self.experience_to_next;
            self.level += 1;
            let next = (f64::from(self.experience_to_next) * growth).floor() as u32;
            self.experience_to_next = next.max(1);
            gained += 1;
        }
        gained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fresh() -> (Progression, Tuning) {
        let tuning = Tuning::default();
        (Progression::new(&tuning), tuning)
    }

    #[test]
    fn test_required_formula() {
        let waves = WaveTuning::default();
        assert_eq!(Progression::required_for(1, 1, &waves), 6);
        assert_eq!(Progression::required_for(3, 2, &waves), 9);
        assert_eq!(Progression::required_for(10, 3, &waves), 12);
    }

    #[test]
    fn test_no_transition_before_wave_starts() {
        let (mut p, t) = fresh();
        assert_eq!(p.evaluate(0, &t.experience), None);
        assert_eq!(p.phase, LevelPhase::Wave);
    }

    #[test]
    fn test_wave_needs_kills_and_empty_field() {
        let (mut p, t) = fresh();
        assert_eq!(p.begin_wave(&t.waves), 6);
        for id in 0..6 {
            p.record_kill(id, EnemyRole::Regular);
        }
        assert_eq!(p.evaluate(1, &t.experience), None);
        assert_eq!(p.evaluate(0, &t.experience), Some(Advance::SpawnWaveBoss));
        assert_eq!(p.phase, LevelPhase::WaveBoss);
    }

    #[test]
    fn test_regular_kills_outside_wave_do_not_count() {
        let (mut p, t) = fresh();
        p.begin_wave(&t.waves);
        p.phase = LevelPhase::WaveBoss;
        p.record_kill(7, EnemyRole::Regular);
        assert_eq!(p.kills, 0);
    }

    #[test]
    fn test_full_level_cycle() {
        let (mut p, t) = fresh();
        for wave in 1..=3 {
            assert_eq!(p.wave, wave);
            let n = p.begin_wave(&t.waves);
            for id in 0..n {
                p.record_kill(id, EnemyRole::Regular);
            }
            assert_eq!(p.evaluate(0, &t.experience), Some(Advance::SpawnWaveBoss));

            p.track_boss(100 + wave);
            assert_eq!(p.evaluate(0, &t.experience), None);
            // A different boss dying is not ours
            p.record_kill(999, EnemyRole::WaveBoss);
            assert_eq!(p.evaluate(0, &t.experience), None);

            p.record_kill(100 + wave, EnemyRole::WaveBoss);
            let advance = p.evaluate(0, &t.experience);
            if wave < 3 {
                assert_eq!(advance, Some(Advance::NextWave { bonus_xp: 25 }));
                assert_eq!(p.phase, LevelPhase::Wave);
            } else {
                assert_eq!(advance, Some(Advance::SpawnLevelBoss { bonus_xp: 25 }));
                assert_eq!(p.phase, LevelPhase::LevelBoss);
            }
            assert!(p.active_boss.is_none());
            // Edge-triggered: a second evaluate does nothing
            assert_ne!(
                p.evaluate(0, &t.experience),
                Some(Advance::NextWave { bonus_xp: 25 })
            );
        }

        p.track_boss(500);
        p.record_kill(500, EnemyRole::LevelBoss);
        assert_eq!(
            p.evaluate(0, &t.experience),
            Some(Advance::LevelCleared { bonus_xp: 100 })
        );
        assert_eq!(p.phase, LevelPhase::Transition);
        assert_eq!(p.evaluate(0, &t.experience), None);

        p.enter_next_map();
        assert_eq!(p.phase, LevelPhase::Wave);
        assert_eq!(p.wave, 1);
        assert_eq!(p.map_index, 1);
        assert_eq!(p.stage, 1);
        assert_eq!(p.required_kills, 0);
    }

    #[test]
    fn test_map_rotation_wraps() {
        let (mut p, _) = fresh();
        for _ in 0..5 {
            p.enter_next_map();
        }
        assert_eq!(p.map_index, 0);
        assert_eq!(p.stage, 5);
    }

    #[test]
    fn test_level_up_wraps_and_grows() {
        let (mut p, _) = fresh();
        assert_eq!(p.gain_experience(99, 1.3), 0);
        assert_eq!(p.gain_experience(11, 1.3), 1);
        assert_eq!(p.level, 2);
        assert_eq!(p.experience, 10);
        assert_eq!(p.experience_to_next, 130);
    }

    #[test]
    fn test_level_up_cascades() {
        let (mut p, _) = fresh();
        // 100 + 130 + 169 = 399
        assert_eq!(p.gain_experience(400, 1.3), 3);
        assert_eq!(p.level, 4);
        assert_eq!(p.experience, 1);
        assert_eq!(p.experience_to_next, 219);
    }

    proptest! {
        #[test]
        fn prop_xp_cascade_counts_every_threshold(amount in 0u32..20_000) {
            let (mut p, _) = fresh();
            let mut threshold = 100u32;
            let mut left = amount;
            let mut expected = 0;
            while left >= threshold {
                left -= threshold;
                threshold = (f64::from(threshold) * 1.3).floor() as u32;
                expected += 1;
            }

            let gained = p.gain_experience(amount, 1.3);
            prop_assert_eq!(gained, expected);
            prop_assert_eq!(p.level, 1 + expected);
            prop_assert_eq!(p.experience, left);
            prop_assert!(p.experience < p.experience_to_next);
        }

        /// Random interleavings of staggered spawns and kills never open
        /// the boss phase early.
        #[test]
        fn prop_no_premature_wave_boss(ops in proptest::collection::vec(any::<bool>(), 0..80)) {
            let (mut p, t) = fresh();
            let required = p.begin_wave(&t.waves);
            let mut spawned = 0u32;
            let mut alive = 0usize;
            let mut next_id = 0u32;

            for spawn in ops {
                if spawn && spawned < required {
                    spawned += 1;
                    alive += 1;
                } else if alive > 0 {
                    alive -= 1;
                    p.record_kill(next_id, EnemyRole::Regular);
                    next_id += 1;
                }

                let kills_before = p.kills;
                match p.evaluate(alive, &t.experience) {
                    Some(Advance::SpawnWaveBoss) => {
                        prop_assert!(kills_before >= required);
                        prop_assert_eq!(alive, 0);
                        break;
                    }
                    None => prop_assert!(kills_before < required || alive > 0),
                    other => prop_assert!(false, "unexpected {:?}", other),
                }
            }
        }
    }
}
