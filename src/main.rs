//! Robot Cannon - headless native driver
//!
//! Runs an autopilot session through the same frame loop a windowed host
//! would use, logging HUD changes and sound cues.

use std::path::PathBuf;

use clap::Parser;
use robot_cannon::audio::{AudioManager, LogSink};
use robot_cannon::platform::InputLatch;
use robot_cannon::renderer::{DrawList, Renderer};
use robot_cannon::sim::{FrameClock, GameState, GameStatus, TickInput};
use robot_cannon::ui::{HudSnapshot, Presenter};
use robot_cannon::{Arena, Settings, Tuning};

/// Host frame length (a 60 Hz display)
const FRAME_MS: f32 = 1000.0 / 60.0;

/// Play one autopilot run without a window.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Options {
    /// Seed for the gameplay RNG; equal seeds replay equal runs.
    #[arg(long, value_name = "SEED", default_value_t = 42)]
    seed: u64,
    /// Simulated session length before the run is cut off.
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 120,
        value_parser = clap::value_parser!(u32).range(1..=86_400)
    )]
    seconds: u32,
    /// Gameplay tuning JSON; missing or invalid files fall back to defaults.
    #[arg(long, value_name = "FILE")]
    tuning: Option<PathBuf>,
    /// Host settings JSON (quality, particles, volume).
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Print the final game state as JSON on stdout.
    #[arg(long)]
    dump: bool,
}

/// Logs a HUD line whenever the phase banner or level changes
#[derive(Default)]
struct LogPresenter {
    last: Option<(String, u32)>,
}

impl Presenter for LogPresenter {
    fn present(&mut self, hud: &HudSnapshot) {
        let key = (hud.phase_label(), hud.level);
        if self.last.as_ref() == Some(&key) {
            return;
        }
        log::info!(
            "[{}] {} | {} | level {} ({}/{} xp) | score {} | hp {:.0}%",
            hud.survival_time,
            hud.map_name,
            key.0,
            hud.level,
            hud.experience,
            hud.experience_to_next,
            hud.score,
            hud.health_ratio * 100.0
        );
        self.last = Some(key);
    }
}

/// Counts sprites instead of drawing them
struct TraceRenderer;

impl Renderer for TraceRenderer {
    fn draw(&mut self, frame: &DrawList) {
        log::trace!("frame: {} sprites", frame.sprites.len());
    }
}

fn run(opts: Options) {
    log::info!("Robot Cannon (headless) starting: {:?}", opts);

    let tuning = opts
        .tuning
        .as_ref()
        .map(Tuning::load_or_default)
        .unwrap_or_default();
    let settings = opts
        .settings
        .as_ref()
        .map(Settings::load)
        .unwrap_or_default();

    let mut state = GameState::with_tuning(opts.seed, Arena::default(), tuning);
    settings.apply(&mut state);
    let mut audio = AudioManager::with_sink(LogSink);
    audio.configure(&settings);

    let mut latch = InputLatch::new();
    latch.set_autopilot(true);
    let mut input = TickInput::default();
    let mut clock = FrameClock::new();
    let mut presenter = LogPresenter::default();
    let mut renderer = TraceRenderer;

    let limit_ms = f64::from(opts.seconds) * 1000.0;
    while state.status != GameStatus::GameOver && state.time_ms < limit_ms {
        latch.feed(&mut input);
        let events = clock.step(&mut state, &mut input, FRAME_MS);
        audio.play_events(&events);
        presenter.present(&HudSnapshot::from_state(&state));
        renderer.draw(&DrawList::from_state(&state));
    }

    let hud = HudSnapshot::from_state(&state);
    log::info!(
        "Session over after {}: score {}, level {}, {} enemies defeated, reached {} ({})",
        hud.survival_time,
        hud.score,
        hud.level,
        hud.enemies_defeated,
        hud.map_name,
        hud.phase_label()
    );

    if opts.dump {
        match serde_json::to_string_pretty(&state) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize final state: {}", e),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Options::parse());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let opts = Options::try_parse_from([
            "robot-cannon",
            "--seed=7",
            "--seconds",
            "3",
            "--tuning",
            "balance.json",
            "--dump",
        ])
        .unwrap();
        assert_eq!(opts.seed, 7);
        assert_eq!(opts.seconds, 3);
        assert_eq!(opts.tuning, Some(PathBuf::from("balance.json")));
        assert!(opts.settings.is_none());
        assert!(opts.dump);
    }

    #[test]
    fn test_defaults() {
        let opts = Options::try_parse_from(["robot-cannon"]).unwrap();
        assert_eq!(opts.seed, 42);
        assert_eq!(opts.seconds, 120);
        assert!(!opts.dump);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(Options::try_parse_from(["robot-cannon", "--seed", "many"]).is_err());
        assert!(Options::try_parse_from(["robot-cannon", "--seconds", "0"]).is_err());
        assert!(Options::try_parse_from(["robot-cannon", "--seconds", "-5"]).is_err());
        assert!(Options::try_parse_from(["robot-cannon", "--bogus"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Options::command().debug_assert();
    }
}
