use std::env;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use gridplan::astar::format_path;
use gridplan::config::{Algorithm, Config};
use gridplan::map::parse_grid_map;
use gridplan::planner::{drive, Planner};
use gridplan::run_log::{RunEvent, RunLog};
use gridplan::{AStar, QLearning};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const CONFIG_PATH: &str = "config.toml";

/// RUST_LOG wins whenever it parses; the configured directive is the fallback
fn log_filter(rust_log: Option<&str>, default_directive: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive))
}

fn init_logging(default_directive: &str) {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), default_directive))
        .init();
}

/// Tick a planner at the configured cadence, recording events into `log`.
///
/// `observe` runs before each tick is logged, for planner-specific events.
fn run_planner<P, F>(
    planner: &mut P,
    config: &Config,
    log: &mut RunLog,
    mut observe: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    P: Planner,
    F: FnMut(&P, &mut RunLog),
{
    let interval = Duration::from_millis(config.simulation.tick_interval_ms);

    let (last, ticks) = drive(planner, config.simulation.max_ticks, |tick, p, status| {
        observe(p, log);
        log.log(RunEvent::Tick {
            tick,
            cell: p.current_cell(),
            status: format!("{:?}", status),
        });
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    })?;

    let reason = match last {
        Some(status) if planner.is_done(status) => format!("{:?}", status),
        _ => "tick budget exhausted".to_string(),
    };
    info!(algorithm = planner.name(), ticks, %reason, "Run stopped");

    match planner.best_path() {
        Ok(path) => {
            info!("Best path ({} cells): {}", path.len(), format_path(&path));
            log.log(RunEvent::PathReady { path });
        }
        Err(e) => warn!("No best path available: {}", e),
    }
    log.log(RunEvent::Stopped { ticks, reason });
    Ok(())
}

fn run(config: &Config, map_path: &str) -> Result<RunLog, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(map_path)
        .map_err(|e| format!("Failed to read grid map {}: {}", map_path, e))?;
    let grid = parse_grid_map(&text)?;
    info!(
        rows = grid.rows(),
        cols = grid.cols(),
        start = ?grid.start(),
        reward = ?grid.reward(),
        "Loaded grid map {}",
        map_path
    );

    let mut log = RunLog::new();
    let algorithm = match config.simulation.algorithm {
        Algorithm::AStar => "astar",
        Algorithm::QLearning => "qlearning",
    };
    log.log(RunEvent::Started {
        algorithm: algorithm.to_string(),
        rows: grid.rows(),
        cols: grid.cols(),
        start: grid.start(),
        reward: grid.reward(),
    });

    match config.simulation.algorithm {
        Algorithm::AStar => {
            let mut search = AStar::new(&grid);
            run_planner(&mut search, config, &mut log, |_, _| {})?;
        }
        Algorithm::QLearning => {
            let mut learner = QLearning::new(&grid, config.qlearning.to_params());
            let mut episode = learner.episode();
            let mut training = learner.is_training();
            run_planner(&mut learner, config, &mut log, |p, log| {
                if p.episode() != episode {
                    episode = p.episode();
                    log.log(RunEvent::EpisodeRestarted { episode, cell: p.episode_start() });
                }
                if training && !p.is_training() {
                    training = false;
                    info!(episode, "Training finished");
                    log.log(RunEvent::TrainingFinished { episode });
                }
            })?;
        }
    }
    Ok(log)
}

fn main() {
    let (config, config_note) = Config::load_or_default(Path::new(CONFIG_PATH));
    init_logging(&config.logging.filter);
    info!("{}", config_note);

    let map_path = env::args()
        .nth(1)
        .unwrap_or_else(|| config.simulation.map_path.clone());

    match run(&config, &map_path) {
        Ok(log) => {
            println!("{}", log.summary());
            if config.logging.enable_run_log {
                match log.save_to_file(&config.logging.run_log_path) {
                    Ok(()) => info!("Run log saved to {}", config.logging.run_log_path),
                    Err(e) => warn!("Failed to save run log: {}", e),
                }
            }
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
