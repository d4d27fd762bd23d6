//! Referee configuration, loaded from an optional TOML file and overridden
//! by command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use bridge_core::{Color, Watchdog};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::synchronizer::Timing;

/// Which side UltraChess plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SidePreference {
    White,
    Black,
    /// Coin flip at startup
    #[default]
    Random,
}

impl SidePreference {
    pub fn resolve(self, rng: &mut dyn RngCore) -> Color {
        match self {
            SidePreference::White => Color::White,
            SidePreference::Black => Color::Black,
            SidePreference::Random => {
                if rng.gen_bool(0.5) {
                    Color::White
                } else {
                    Color::Black
                }
            }
        }
    }
}

/// How openMSX is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulatorSettings {
    pub binary: PathBuf,
    pub machine: String,
    /// Disk image holding UltraChess
    pub disk_image: PathBuf,
    /// Run unthrottled
    pub max_speed: bool,
    /// Period of the VRAM dump
    pub dump_interval_ms: u64,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("openmsx"),
            machine: "Philips_NMS_8250".to_string(),
            disk_image: PathBuf::from("ultrachess.dsk"),
            max_speed: false,
            dump_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefereeConfig {
    /// UCI engine executable
    pub engine: PathBuf,
    pub opening_book: Option<PathBuf>,
    /// Per-move search time, for the engine and for UltraChess
    pub search_time_ms: u64,
    pub msx_side: SidePreference,
    pub verbose: bool,
    /// Finished games are appended here
    pub pgn_file: PathBuf,
    /// Optional JSON summary of the match
    pub report_file: Option<PathBuf>,
    /// Watchdog budget as a multiple of the search time
    pub stall_factor: f64,
    /// Budget for openMSX to boot and reach each start-up prompt
    pub boot_timeout_secs: u64,
    /// Seed for side selection and book choices
    pub seed: Option<u64>,
    pub screen_poll_ms: u64,
    pub input_poll_ms: u64,
    pub prompt_poll_ms: u64,
    pub emulator: EmulatorSettings,
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self {
            engine: PathBuf::from("/usr/games/stockfish"),
            opening_book: None,
            search_time_ms: 1000,
            msx_side: SidePreference::Random,
            verbose: false,
            pgn_file: PathBuf::from("test.pgn"),
            report_file: None,
            stall_factor: 2.0,
            boot_timeout_secs: 120,
            seed: None,
            screen_poll_ms: 100,
            input_poll_ms: 250,
            prompt_poll_ms: 500,
            emulator: EmulatorSettings::default(),
        }
    }
}

impl RefereeConfig {
    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.search_time_ms == 0 {
            bail!("search_time_ms must be positive");
        }
        if !self.stall_factor.is_finite() || self.stall_factor < 1.0 {
            bail!("stall_factor must be at least 1.0, got {}", self.stall_factor);
        }
        if self.boot_timeout_secs == 0 {
            bail!("boot_timeout_secs must be positive");
        }
        let polls = [
            ("screen_poll_ms", self.screen_poll_ms),
            ("input_poll_ms", self.input_poll_ms),
            ("prompt_poll_ms", self.prompt_poll_ms),
            ("emulator.dump_interval_ms", self.emulator.dump_interval_ms),
        ];
        for (name, value) in polls {
            if value == 0 {
                bail!("{name} must be positive");
            }
        }
        Ok(())
    }

    pub fn search_time(&self) -> Duration {
        Duration::from_millis(self.search_time_ms)
    }

    /// Whole seconds typed at UltraChess's time-limit prompt (at least 1).
    pub fn msx_time_limit_secs(&self) -> u64 {
        (self.search_time_ms / 1000).max(1)
    }

    /// Longest either side may think per move. UltraChess gets whole seconds,
    /// so below one second it can outlast the engine's search time.
    pub fn move_time(&self) -> Duration {
        self.search_time()
            .max(Duration::from_secs(self.msx_time_limit_secs()))
    }

    pub fn timing(&self) -> Timing {
        Timing {
            search_time: self.search_time(),
            watchdog: Watchdog::for_search_time(self.move_time(), self.stall_factor),
            boot: Watchdog::new(Duration::from_secs(self.boot_timeout_secs)),
            screen_poll: Duration::from_millis(self.screen_poll_ms),
            input_poll: Duration::from_millis(self.input_poll_ms),
            prompt_poll: Duration::from_millis(self.prompt_poll_ms),
            msx_time_limit_secs: self.msx_time_limit_secs(),
        }
    }

    pub fn rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
