mod config;
mod population;

use std::{
    env, process,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use config::{AppConfig, ConfigError, Environment};
use population::{FileDenyList, FilePopulationScan};
use standings::{RebuildOutcome, StandingsController, StandingsError};
use thiserror::Error;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("atoll failed: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let config = {
        let env = parse_environment()?;
        AppConfig::load(env)?
    };

    config.standings.ensure_dirs()?;
    let probe = Arc::new(FileDenyList::load(config.deny_list_path())?);
    let scan = Arc::new(FilePopulationScan::new(config.population_path()));
    let controller = Arc::new(StandingsController::bootstrap(
        config.standings.clone(),
        probe,
        scan,
        None,
    )?);

    println!(
        "atoll standings booted in {:?} mode; state at {:?}",
        config.env,
        config.standings.state_dir()
    );
    println!(
        "Population file: {}; deny list: {}",
        config.population_path().display(),
        config.deny_list_path().display()
    );

    let outcome = controller.rebuild().wait();
    log_rebuild_outcome(&outcome);
    print_standings(&controller)?;

    let status_logger = StandingsStatusLogger::spawn(
        Arc::clone(&controller),
        Duration::from_secs(config.status_log_interval_secs),
    );
    println!("Standings refresher is running; press Ctrl+C to shut down.");
    wait_for_shutdown_signal()?;
    println!("Shutdown signal received; stopping...");
    controller.cancel_rebuild();
    status_logger.shutdown();
    Ok(())
}

fn parse_environment() -> Result<Environment, AppError> {
    let arg = env::args().nth(1).ok_or(AppError::Usage)?;
    Environment::from_str(&arg).map_err(AppError::from)
}

fn log_rebuild_outcome(outcome: &RebuildOutcome) {
    match outcome {
        RebuildOutcome::Completed {
            stats,
            persist_error,
        } => {
            println!(
                "Initial rebuild complete: {} records scanned, {} owners ranked, {} skipped",
                stats.scanned, stats.kept, stats.skipped
            );
            if let Some(err) = persist_error {
                eprintln!("Standings were rebuilt but not persisted: {err}");
            }
        }
        RebuildOutcome::Cancelled => println!("Initial rebuild cancelled"),
        RebuildOutcome::Failed { message } => {
            eprintln!("Initial rebuild failed: {message}")
        }
    }
}

fn print_standings(controller: &StandingsController) -> Result<(), AppError> {
    let limit = controller.config().display_limit;
    let entries = controller.top_n(limit)?;
    if entries.is_empty() {
        println!("Standings are empty.");
        return Ok(());
    }
    println!("Top {} standings:", entries.len());
    for entry in entries {
        println!("  #{:<3} {}  {}", entry.rank, entry.owner, entry.score);
    }
    Ok(())
}

fn wait_for_shutdown_signal() -> Result<(), AppError> {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;
    rx.recv()?;
    Ok(())
}

#[derive(Debug, Error)]
enum AppError {
    #[error("usage: atoll <dev|prod>")]
    Usage,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Standings(#[from] StandingsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("failed while waiting for shutdown signal: {0}")]
    ShutdownWait(#[from] mpsc::RecvError),
}

struct StandingsStatusLogger {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StandingsStatusLogger {
    fn spawn(controller: Arc<StandingsController>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !stop_clone.load(Ordering::Relaxed) {
                sleep_with_stop(&stop_clone, interval);
                if stop_clone.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(err) = print_standings(&controller) {
                    eprintln!("failed to refresh standings: {err}");
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StandingsStatusLogger {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn sleep_with_stop(stop: &AtomicBool, interval: Duration) {
    let mut remaining = interval;
    const STEP: Duration = Duration::from_millis(500);
    while remaining > Duration::ZERO {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let sleep_for = if remaining > STEP { STEP } else { remaining };
        thread::sleep(sleep_for);
        remaining = remaining.saturating_sub(sleep_for);
    }
}
