//! Sound cues
//!
//! Procedurally described sound effects - no external files needed. The core
//! only decides *what* to play; a host `SoundSink` turns the oscillator cue
//! into actual audio. Playback is fire-and-forget and never fails.

use serde::{Deserialize, Serialize};

use crate::Settings;
use crate::sim::{EnemyRole, GameEvent};

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

/// One oscillator blip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    /// Hz
    pub frequency: f32,
    /// Seconds
    pub duration: f32,
    pub waveform: Waveform,
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Cannon fired
    Shoot,
    /// Player took damage
    PlayerHit,
    /// Enemy destroyed
    EnemyDeath,
    /// Boss shot intercepted
    ProjectileDestroyed,
    /// Power-up collected
    PowerUp,
    /// Wave boss arrives
    WaveBoss,
    /// Level boss arrives
    LevelBoss,
    LevelUp,
}

impl SoundEffect {
    pub fn cue(self) -> SoundCue {
        let (frequency, duration, waveform) = match self {
            SoundEffect::Shoot => (800.0, 0.1, Waveform::Square),
            SoundEffect::PlayerHit => (150.0, 0.3, Waveform::Sawtooth),
            SoundEffect::EnemyDeath => (300.0, 0.2, Waveform::Square),
            SoundEffect::ProjectileDestroyed => (400.0, 0.2, Waveform::Sine),
            SoundEffect::PowerUp => (600.0, 0.3, Waveform::Sine),
            SoundEffect::WaveBoss => (180.0, 0.7, Waveform::Sawtooth),
            SoundEffect::LevelBoss => (120.0, 1.2, Waveform::Sawtooth),
            SoundEffect::LevelUp => (600.0, 0.5, Waveform::Sine),
        };
        SoundCue {
            frequency,
            duration,
            waveform,
        }
    }
}

impl GameEvent {
    /// Sound to play for this event, if any
    pub fn sound(&self) -> Option<SoundEffect> {
        match self {
            GameEvent::Shot { .. } => Some(SoundEffect::Shoot),
            GameEvent::PlayerHit { .. } => Some(SoundEffect::PlayerHit),
            GameEvent::EnemyKilled { .. } => Some(SoundEffect::EnemyDeath),
            GameEvent::ProjectileDestroyed { .. } => Some(SoundEffect::ProjectileDestroyed),
            GameEvent::PowerUpCollected { .. } => Some(SoundEffect::PowerUp),
            GameEvent::BossSpawned {
                role: EnemyRole::LevelBoss,
                ..
            } => Some(SoundEffect::LevelBoss),
            GameEvent::BossSpawned { .. } => Some(SoundEffect::WaveBoss),
            GameEvent::LevelUp { .. } => Some(SoundEffect::LevelUp),
            _ => None,
        }
    }
}

/// Host audio output
pub trait SoundSink {
    /// Play `cue` at `volume` (0.0 - 1.0)
    fn play(&mut self, cue: SoundCue, volume: f32);
}

/// Sink that only traces cues, for headless runs
#[derive(Debug, Default)]
pub struct LogSink;

impl SoundSink for LogSink {
    fn play(&mut self, cue: SoundCue, volume: f32) {
        log::trace!(
            "cue {:.0} Hz {:?} for {:.1}s at {:.2}",
            cue.frequency,
            cue.waveform,
            cue.duration,
            volume
        );
    }
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Option<Box<dyn SoundSink>>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("has_sink", &self.sink.is_some())
            .field("master_volume", &self.master_volume)
            .field("sfx_volume", &self.sfx_volume)
            .field("muted", &self.muted)
            .finish()
    }
}

impl AudioManager {
    /// Manager with no output; every sound is a no-op
    pub fn new() -> Self {
        Self {
            sink: None,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    pub fn with_sink(sink: impl SoundSink + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            ..Self::new()
        }
    }

    /// Take volume and mute from settings
    pub fn configure(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        sink.play(effect.cue(), vol);
    }

    /// Play the cue of every event that has one, in order
    pub fn play_events<'a>(&mut self, events: impl IntoIterator<Item = &'a GameEvent>) {
        for effect in events.into_iter().filter_map(GameEvent::sound) {
            self.play(effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(SoundCue, f32)>>>);

    impl SoundSink for Recorder {
        fn play(&mut self, cue: SoundCue, volume: f32) {
            self.0.borrow_mut().push((cue, volume));
        }
    }

    #[test]
    fn test_cue_table() {
        let shoot = SoundEffect::Shoot.cue();
        assert_eq!(shoot.frequency, 800.0);
        assert_eq!(shoot.waveform, Waveform::Square);
        let boss = SoundEffect::LevelBoss.cue();
        assert_eq!((boss.frequency, boss.duration), (120.0, 1.2));
    }

    #[test]
    fn test_event_mapping() {
        let spawn = |role| GameEvent::BossSpawned {
            role,
            pos: Vec2::ZERO,
        };
        assert_eq!(spawn(EnemyRole::WaveBoss).sound(), Some(SoundEffect::WaveBoss));
        assert_eq!(spawn(EnemyRole::LevelBoss).sound(), Some(SoundEffect::LevelBoss));
        assert_eq!(GameEvent::MapEntered { map_index: 1 }.sound(), None);
    }

    #[test]
    fn test_volume_and_mute() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::with_sink(recorder.clone());
        audio.set_master_volume(0.5);
        audio.set_sfx_volume(0.5);
        audio.play(SoundEffect::LevelUp);
        audio.set_muted(true);
        audio.play(SoundEffect::LevelUp);

        let played = recorder.0.borrow();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].1, 0.25);
        assert_eq!(played[0].0, SoundEffect::LevelUp.cue());
    }

    #[test]
    fn test_missing_sink_is_silent() {
        let mut audio = AudioManager::new();
        audio.play_events(&[GameEvent::Shot { pos: Vec2::ZERO }]);
    }

    #[test]
    fn test_play_events_in_order() {
        let recorder = Recorder::default();
        let mut audio = AudioManager::with_sink(recorder.clone());
        let events = [
            GameEvent::Shot { pos: Vec2::ZERO },
            GameEvent::WaveStarted { wave: 1, required: 6 },
            GameEvent::LevelUp { level: 2 },
        ];
        audio.play_events(&events);
        let freqs: Vec<f32> = recorder.0.borrow().iter().map(|(c, _)| c.frequency).collect();
        assert_eq!(freqs, vec![800.0, 600.0]);
    }
}
