//! Mouse Maze headless driver
//!
//! Runs a session without a window: a simple autopilot steers the mouse at
//! the exit while the log reports what happens.
//!
//! Usage: `mouse-maze [seed] [config.json] [levels.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Mouse Maze (headless) starting...");

    if let Err(err) = native::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation library is target independent; this driver is native only
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::error::Error;

    use mouse_maze::SimConfig;
    use mouse_maze::sim::{
        ExitGate, FixedStep, MoveIntent, Session, SessionPhase, TickInput, TickResult,
        builtin_levels, levels_from_json,
    };

    /// Ticks before the driver gives up on a level
    const MAX_TICKS_PER_LEVEL: u64 = 60 * 60;
    /// Simulated frame time, deliberately off the tick rate
    const FRAME_TIME: f32 = 1.0 / 50.0;

    pub fn run() -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args().skip(1);
        let seed = match args.next() {
            Some(s) => s.parse::<u64>()?,
            None => 0x5EED,
        };
        let config = match args.next() {
            Some(path) => SimConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => SimConfig::default(),
        };
        let levels = match args.next() {
            Some(path) => levels_from_json(&std::fs::read_to_string(path)?)?,
            None => builtin_levels(seed),
        };

        let mut session = Session::new(config, levels, seed)?;
        let mut step = FixedStep::new(session.config().tick_dt());
        log::info!(
            "Seed {} with {} levels, dt {:.4}s",
            session.seed(),
            session.level_count(),
            step.dt()
        );

        let mut result = session.snapshot();
        while !result.phase.is_over() {
            for _ in 0..step.push(FRAME_TIME) {
                let input = autopilot(&session, &result);
                let ticks_before = result.level_ticks;
                result = session.advance_tick(&input, step.dt());

                if result.exit_reached {
                    log::info!("Exit reached after {} ticks", ticks_before + 1);
                } else if result.level_ticks % 300 == 0 {
                    log::debug!(
                        "Level {} tick {}: ({:.0}, {:.0}), {:?}s left",
                        result.level_index,
                        result.level_ticks,
                        result.player_pos.x,
                        result.player_pos.y,
                        result.seconds_left
                    );
                }
                if result.phase.is_over() {
                    break;
                }
            }

            if result.level_ticks >= MAX_TICKS_PER_LEVEL {
                log::warn!(
                    "Autopilot stuck on level {} at ({:.0}, {:.0}), skipping",
                    result.level_index,
                    result.player_pos.x,
                    result.player_pos.y
                );
                let next = result.level_index + 1;
                if next >= session.level_count() {
                    break;
                }
                session.load_level(next)?;
                result = session.snapshot();
            }
        }

        match result.phase {
            SessionPhase::Escaped => log::info!("Escaped!"),
            SessionPhase::Caught => log::info!("Caught on level {}", result.level_index),
            SessionPhase::TimedOut => log::info!("Time's up on level {}", result.level_index),
            SessionPhase::Playing => log::info!("Stopped on level {}", result.level_index),
        }
        Ok(())
    }

    /// Walk at the exit, sprinting in bursts and clicking the door if it is the exit
    fn autopilot(session: &Session, last: &TickResult) -> TickInput {
        let tick = last.level_ticks;
        let level = session.level();
        let goal = level
            .exit
            .region(&level.obstacles)
            .map(|r| r.center())
            .unwrap_or(last.player_pos);

        let click = match level.exit {
            ExitGate::Door if tick == 0 => Some(goal),
            _ => None,
        };

        // Sidestep one second in four to slip off wall corners
        let strafe = (tick / 60) % 4 == 3;
        TickInput {
            move_intent: MoveIntent {
                forward: !strafe,
                strafe_left: strafe,
                sprint: tick % 600 < 120,
                ..Default::default()
            },
            facing_target: Some(goal),
            pointer_click: click,
        }
    }
}
