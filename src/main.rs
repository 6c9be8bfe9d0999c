//! Arcade Sports headless demo
//!
//! Plays an AI-vs-AI match with a fixed-timestep accumulator and prints the
//! final snapshot as JSON.
//!
//! Usage: `arcade-sports [foosball|horde] [--config FILE] [--seed N] [--difficulty LEVEL] [--timed SECONDS]`

use std::process::ExitCode;

use arcade_sports::consts::{MAX_STEPS_PER_FRAME, SIM_DT};
use arcade_sports::sim::{GameEvent, MatchPhase, MatchState, start_countdown, tick};
use arcade_sports::{Difficulty, MatchConfig, MatchFormat, MatchSettings};

/// Simulated display refresh interval
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up after this many simulated seconds
const MAX_MATCH_SECONDS: f32 = 600.0;

struct Options {
    config: MatchConfig,
    settings: MatchSettings,
}

fn parse_args() -> Result<Options, String> {
    let mut config = MatchConfig::foosball();
    let mut settings = MatchSettings {
        player_count: 0,
        ..MatchSettings::default()
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "foosball" => config = MatchConfig::foosball(),
            "horde" => config = MatchConfig::horde_defense(),
            "--config" => {
                let path = args.next().ok_or("--config needs a file")?;
                let json = std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?;
                config = MatchConfig::from_json(&json).map_err(|e| format!("{path}: {e}"))?;
            }
            "--seed" => {
                let value = args.next().ok_or("--seed needs a number")?;
                settings.seed = value.parse().map_err(|_| format!("bad seed: {value}"))?;
            }
            "--difficulty" => {
                let value = args.next().ok_or("--difficulty needs a level")?;
                settings.difficulty = Difficulty::from_str(&value).ok_or(format!("unknown difficulty: {value}"))?;
            }
            "--timed" => {
                let value = args.next().ok_or("--timed needs seconds")?;
                let seconds = value.parse().map_err(|_| format!("bad duration: {value}"))?;
                settings.format = MatchFormat::Timed { seconds };
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(Options { config, settings })
}

fn log_events(state: &MatchState) {
    for event in &state.events {
        match event {
            GameEvent::Goal { scorer, goal, .. } => {
                log::info!("[{:7.2}s] goal {goal} for {:?} -> {:?}", state.elapsed, scorer, state.scores)
            }
            GameEvent::SuddenDeath => log::info!("[{:7.2}s] sudden death", state.elapsed),
            GameEvent::PhaseChanged(phase) => log::debug!("phase {:?}", phase),
            other => log::trace!("{:?}", other),
        }
    }
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let mut state = match MatchState::new(options.config, options.settings) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Invalid match: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!("Arcade Sports demo starting (seed {})", state.settings.seed);
    start_countdown(&mut state);

    let mut accumulator = 0.0f32;
    let mut now = 0.0f64;
    let mut frames = 0u64;
    while !matches!(state.phase, MatchPhase::GameOver(_)) && now < MAX_MATCH_SECONDS as f64 {
        accumulator += FRAME_DT;
        let mut steps = 0;
        while accumulator >= SIM_DT && steps < MAX_STEPS_PER_FRAME {
            tick(&mut state, SIM_DT, now);
            log_events(&state);
            accumulator -= SIM_DT;
            now += SIM_DT as f64;
            steps += 1;
        }
        frames += 1;
    }

    match state.phase {
        MatchPhase::GameOver(winner) => log::info!("{:?} wins {:?} after {} frames", winner, state.scores, frames),
        phase => log::warn!("Stopped after {MAX_MATCH_SECONDS}s in {:?}", phase),
    }

    match serde_json::to_string_pretty(&state.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Snapshot failed: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
