//! HUD data for an external presenter
//!
//! The presenter never sees `GameState`; it gets a flat snapshot rebuilt
//! after every frame.

use serde::Serialize;

use crate::sim::{GameState, GameStatus, LevelPhase};

/// Everything the HUD shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub wave: u32,
    pub waves_per_level: u32,
    /// Regular kills toward the current wave's quota
    pub kills: u32,
    pub required_kills: u32,
    pub enemies_defeated: u32,
    /// `m:ss`
    pub survival_time: String,
    pub health_ratio: f32,
    pub map_name: String,
    pub phase: LevelPhase,
    pub status: GameStatus,
    /// Health of the tracked boss, if one is on the field
    pub boss_health_ratio: Option<f32>,
}

impl HudSnapshot {
    pub fn from_state(state: &GameState) -> Self {
        let p = &state.progress;
        Self {
            score: state.score,
            level: p.level,
            experience: p.experience,
            experience_to_next: p.experience_to_next,
            wave: p.wave.min(p.waves_per_level),
            waves_per_level: p.waves_per_level,
            kills: p.kills,
            required_kills: p.required_kills,
            enemies_defeated: state.enemies_defeated,
            survival_time: format_survival_time(state.time_ms),
            health_ratio: state.player.health_ratio(),
            map_name: state.map_name().to_string(),
            phase: p.phase,
            status: state.status,
            boss_health_ratio: state.tracked_boss().map(|b| b.health_ratio()),
        }
    }

    /// Short banner text for the current phase
    pub fn phase_label(&self) -> String {
        match self.phase {
            LevelPhase::Wave => format!("Wave {}/{}", self.wave, self.waves_per_level),
            LevelPhase::WaveBoss => "Wave Boss".to_string(),
            LevelPhase::LevelBoss => "Level Boss".to_string(),
            LevelPhase::Transition => "Level Complete".to_string(),
        }
    }
}

/// Consumer of HUD snapshots (DOM overlay, terminal, ...)
pub trait Presenter {
    fn present(&mut self, hud: &HudSnapshot);
}

/// Milliseconds as `m:ss`
pub fn format_survival_time(time_ms: f64) -> String {
    let secs = (time_ms.max(0.0) / 1000.0).floor() as u64;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_survival_time() {
        assert_eq!(format_survival_time(0.0), "0:00");
        assert_eq!(format_survival_time(59_999.0), "0:59");
        assert_eq!(format_survival_time(61_000.0), "1:01");
        assert_eq!(format_survival_time(600_000.0), "10:00");
    }

    #[test]
    fn test_snapshot_of_fresh_game() {
        let state = GameState::new(1);
        let hud = HudSnapshot::from_state(&state);
        assert_eq!(hud.level, 1);
        assert_eq!(hud.experience_to_next, 100);
        assert_eq!(hud.wave, 1);
        assert_eq!(hud.waves_per_level, 3);
        assert_eq!(hud.health_ratio, 1.0);
        assert_eq!(hud.map_name, "City Streets");
        assert_eq!(hud.survival_time, "0:00");
        assert_eq!(hud.boss_health_ratio, None);
        assert_eq!(hud.phase_label(), "Wave 1/3");
    }

    #[test]
    fn test_presenter_receives_snapshot() {
        struct Last(Option<HudSnapshot>);
        impl Presenter for Last {
            fn present(&mut self, hud: &HudSnapshot) {
                self.0 = Some(hud.clone());
            }
        }
        let mut presenter = Last(None);
        presenter.present(&HudSnapshot::from_state(&GameState::new(2)));
        assert_eq!(presenter.0.unwrap().score, 0);
    }
}
