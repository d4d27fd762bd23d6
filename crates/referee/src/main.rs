//! Referee CLI
//!
//! Plays one game between a UCI engine and UltraChess in openMSX.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use referee::{
    emulator, exit_code, logging, Cli, KeyboardDriver, MatchDriver, MatchSettings, MoveProvider,
    OpeningBook, RefereeConfig, TurnSynchronizer, UciEngine,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = logging::init_logging(config.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(1);
    }

    match run(&config) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(config: &RefereeConfig) -> anyhow::Result<u8> {
    let mut rng = config.rng();
    let msx_side = config.msx_side.resolve(rng.as_mut());
    let book = config
        .opening_book
        .as_deref()
        .map(OpeningBook::load)
        .transpose()?;
    let timing = config.timing();

    let engine = UciEngine::spawn(&config.engine, &timing.boot.arm("engine startup"))?;
    println!("{}", engine.name());

    // From here on, dropping the engine or the link kills its process.
    let dump_period = Duration::from_millis(config.emulator.dump_interval_ms);
    let (link, screen) = emulator::launch(&config.emulator, dump_period)?;
    info!(
        msx_side = bridge_core::side_name(msx_side),
        search_time_ms = config.search_time_ms,
        "starting match"
    );

    let mut sync = TurnSynchronizer::new(
        Box::new(screen),
        KeyboardDriver::new(Box::new(link)),
        Box::new(engine),
        timing,
        msx_side,
    )
    .with_rng(rng);
    if let Some(book) = book {
        sync = sync.with_book(book);
    }

    let settings = MatchSettings {
        pgn_file: config.pgn_file.clone(),
        report_file: config.report_file.clone(),
        search_time_ms: config.search_time_ms,
        transcript: true,
    };
    let result = MatchDriver::new(sync, settings).run();
    if matches!(&result, Err(e) if e.is_stall()) {
        eprintln!("Timeout! One of the programs stalled.");
    }
    Ok(exit_code(&result))
}
