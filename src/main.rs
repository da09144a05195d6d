//! Skyhop headless driver
//!
//! Plays a number of autopilot runs against the simulation core, logging the
//! score through a bus subscriber and keeping the best score on disk.
//!
//! Usage: `skyhop [TUNING.json] [--runs N] [--seed S] [--max-seconds T]`

use std::process::ExitCode;

use skyhop::consts::{MAX_SUBSTEPS, SIM_DT};
use skyhop::sim::{GameEvent, GamePhase, Session, TickInput, Topic, handler};
use skyhop::{BestScore, Tuning, score_label};

/// Wall-clock frame length the driver pretends to render at
const FRAME_DT: f32 = 1.0 / 60.0;

struct Args {
    tuning: Option<String>,
    runs: u32,
    seed: u64,
    max_seconds: f32,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        tuning: None,
        runs: 3,
        seed: 0x5EED,
        max_seconds: 120.0,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |name: &str| it.next().ok_or_else(|| format!("{name} needs a value"));
        match arg.as_str() {
            "--runs" => args.runs = value("--runs")?.parse().map_err(|e| format!("--runs: {e}"))?,
            "--seed" => args.seed = value("--seed")?.parse().map_err(|e| format!("--seed: {e}"))?,
            "--max-seconds" => {
                args.max_seconds = value("--max-seconds")?
                    .parse()
                    .map_err(|e| format!("--max-seconds: {e}"))?
            }
            other if other.starts_with("--") => return Err(format!("unknown flag {other}")),
            path => args.tuning = Some(path.to_string()),
        }
    }
    Ok(args)
}

/// Game driver holding the session and frame accumulator
struct Game {
    session: Session,
    accumulator: f32,
    input: TickInput,
}

impl Game {
    fn new(session: Session) -> Self {
        Self {
            session,
            accumulator: 0.0,
            input: TickInput {
                autopilot: true,
                ..Default::default()
            },
        }
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.session.tick(&self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.start = false;
            self.input.replay = false;
        }
    }

    /// Play until the ball is gone or the time limit hits
    fn play_run(&mut self, max_seconds: f32) -> u32 {
        let mut elapsed = 0.0;
        while elapsed < max_seconds {
            self.update(FRAME_DT);
            elapsed += FRAME_DT;
            if self.session.phase() == GamePhase::GameOver && self.session.body().is_kinematic() {
                break;
            }
        }
        self.session.final_score().unwrap_or_else(|| self.session.score())
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let tuning = match &args.tuning {
        Some(path) => match Tuning::load(path) {
            Ok(t) => t,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    let session = match Session::new(tuning, args.seed) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to create session: {e}");
            return ExitCode::FAILURE;
        }
    };

    // HUD stand-in
    session.bus().subscribe(
        Topic::ScoreChanged,
        handler(|_, _, event| {
            if let GameEvent::ScoreChanged(score) = event {
                log::debug!("Score: {}", score_label(*score));
            }
            Ok(())
        }),
    );

    let mut best = BestScore::load(BestScore::FILE_NAME);
    let mut game = Game::new(session);

    for run in 0..args.runs {
        if run == 0 {
            game.input.start = true;
        } else {
            game.input.replay = true;
        }
        let score = game.play_run(args.max_seconds);
        log::info!(
            "Run {} finished: score {}, speed {}",
            run + 1,
            score_label(score),
            game.session.speed()
        );

        if best.record(score) {
            log::info!("New best score: {score}");
            if let Err(e) = best.save(BestScore::FILE_NAME) {
                log::warn!("Could not save best score: {e}");
            }
        }
    }

    log::info!("Best score: {}", score_label(best.best_score));
    ExitCode::SUCCESS
}
