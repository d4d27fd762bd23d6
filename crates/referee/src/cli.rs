//! Command-line interface.
//!
//! Flags override the values of the optional TOML config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{RefereeConfig, SidePreference};

/// Referee a game between a UCI engine and UltraChess running in openMSX.
#[derive(Debug, Parser)]
#[command(name = "referee", version, about)]
pub struct Cli {
    /// TOML config file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// UCI engine executable
    #[arg(short = 'e', long = "engine", value_name = "PATH")]
    pub engine: Option<PathBuf>,

    /// Opening book: one line of UCI moves per opening
    #[arg(short = 'b', long = "book", value_name = "FILE")]
    pub book: Option<PathBuf>,

    /// Search time per move in milliseconds
    #[arg(short = 't', long = "search-time", value_name = "MS")]
    pub search_time_ms: Option<u64>,

    /// Side played by UltraChess
    #[arg(short = 's', long = "msx-side", value_enum)]
    pub msx_side: Option<SidePreference>,

    /// Append the finished game to this PGN file
    #[arg(long = "pgn", value_name = "FILE")]
    pub pgn_file: Option<PathBuf>,

    /// Write a JSON match report
    #[arg(long = "report", value_name = "FILE")]
    pub report_file: Option<PathBuf>,

    /// Seed for side selection and book choices
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Run openMSX unthrottled
    #[arg(long = "max-speed")]
    pub max_speed: bool,

    /// Log keyboard and engine traffic
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Config file (or defaults) with the flags applied on top.
    pub fn load_config(&self) -> anyhow::Result<RefereeConfig> {
        let mut config = match &self.config {
            Some(path) => RefereeConfig::load(path)?,
            None => RefereeConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut RefereeConfig) {
        if let Some(engine) = &self.engine {
            config.engine = engine.clone();
        }
        if let Some(book) = &self.book {
            config.opening_book = Some(book.clone());
        }
        if let Some(ms) = self.search_time_ms {
            config.search_time_ms = ms;
        }
        if let Some(side) = self.msx_side {
            config.msx_side = side;
        }
        if let Some(pgn) = &self.pgn_file {
            config.pgn_file = pgn.clone();
        }
        if let Some(report) = &self.report_file {
            config.report_file = Some(report.clone());
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.emulator.max_speed |= self.max_speed;
        config.verbose |= self.verbose;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_flags_keep_defaults() {
        let cli = Cli::try_parse_from(["referee"]).unwrap();
        assert_eq!(cli.load_config().unwrap(), RefereeConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "referee",
            "--engine",
            "/opt/fruit",
            "--book",
            "openings.txt",
            "-t",
            "3000",
            "--msx-side",
            "white",
            "--seed",
            "5",
            "--max-speed",
            "-v",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.engine, PathBuf::from("/opt/fruit"));
        assert_eq!(config.opening_book, Some(PathBuf::from("openings.txt")));
        assert_eq!(config.search_time_ms, 3000);
        assert_eq!(config.msx_side, SidePreference::White);
        assert_eq!(config.seed, Some(5));
        assert!(config.emulator.max_speed);
        assert!(config.verbose);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Cli::try_parse_from(["referee", "--msx-side", "purple"]).is_err());
        let cli = Cli::try_parse_from(["referee", "--search-time", "0"]).unwrap();
        assert!(cli.load_config().is_err());
    }
}
