//! Sling Siege entry point
//!
//! Headless runner: plays the campaign from a starting level with the
//! autopilot on the rapier world and logs each round's outcome.
//!
//! Usage: `sling-siege [level] [seed]` (set `RUST_LOG=info` to see the log)

use sling_siege::physics::RapierWorld;
use sling_siege::progress::MenuAction;
use sling_siege::render::{FrameRecorder, SpriteKind};
use sling_siege::sim::{Autopilot, LevelDef, Round, RoundPhase, tick};
use sling_siege::{Progress, Screen, SimError, Tuning};

/// Give up on a round after this much simulated time
const MAX_ROUND_SECONDS: f32 = 120.0;

fn play_level(level: u32, seed: u64, tuning: &Tuning) -> Result<Round<RapierWorld>, SimError> {
    let def = LevelDef::builtin(level)?;
    let mut round = Round::from_level(RapierWorld::default(), &def, tuning.clone())?;
    let mut pilot = Autopilot::new(seed.wrapping_add(level as u64));
    let dt = round.tuning.timestep;

    for _ in 0..tuning.ticks_for(MAX_ROUND_SECONDS) {
        let input = pilot.next_input(&round);
        if tick(&mut round, &input, dt)?.is_over() {
            break;
        }
    }
    if round.phase == RoundPhase::Playing {
        log::warn!("Level {} still undecided after {}s", level, MAX_ROUND_SECONDS);
    }
    Ok(round)
}

fn run(start_level: u32, seed: u64) -> Result<(), SimError> {
    let tuning = Tuning::default();
    let mut progress = Progress::new();
    progress.unlocked = start_level;
    let mut screen = Screen::Level(start_level);

    while let Screen::Level(level) = screen {
        let round = play_level(level, seed, &tuning)?;

        let mut frame = FrameRecorder::new();
        round.render(&mut frame);
        log::info!(
            "Level {} final frame: {} sprites ({} targets, {} projectiles)",
            level,
            frame.sprites.len(),
            frame.count(SpriteKind::Target),
            frame.count(SpriteKind::Projectile)
        );

        screen = progress.finish_round(level, round.phase, round.spare_projectiles());
        println!(
            "Level {} ({}): {:?} in {:.1}s, {} launched, {} spare",
            level,
            round.level_name,
            round.phase,
            round.elapsed(),
            round.launches,
            round.spare_projectiles()
        );

        screen = match screen {
            Screen::LevelComplete(_) => progress.navigate(screen, MenuAction::NextLevel),
            other => progress.navigate(other, MenuAction::Home),
        };
    }

    match progress.to_json() {
        Ok(json) => log::info!("Progress: {}", json),
        Err(e) => log::warn!("Could not serialize progress: {}", e),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Sling Siege (headless) starting...");

    let mut args = std::env::args().skip(1);
    let level = args.next().and_then(|a| a.parse().ok()).unwrap_or(1);
    let seed = args.next().and_then(|a| a.parse().ok()).unwrap_or(0x5eed);

    if let Err(e) = run(level, seed) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
