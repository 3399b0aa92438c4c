use std::path::PathBuf;

use clap::Parser;
use reflex_engine::{ConfigError, OutputTargets, RunConfig};

#[derive(Parser, Debug)]
#[command(
    name = "reflex",
    version,
    about = "Simple reaction-time test: wait for the white screen, then respond",
    long_about = "Runs a series of reaction-time trials in the terminal.\n\
                  Each trial waits a random delay, flips the screen to white and times the\n\
                  first key or mouse press. Pressing early is recorded as a false start.\n\
                  Without --run-once an interactive menu is shown."
)]
pub struct Cli {
    /// Run a single pass without prompts, write outputs and exit
    #[arg(long)]
    pub run_once: bool,

    /// Minimum random delay before the go-cue, in seconds [default: 2.0]
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub min_delay: Option<f64>,

    /// Maximum random delay before the go-cue, in seconds [default: 5.0]
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub max_delay: Option<f64>,

    /// Number of trials [default: 10]
    #[arg(long, value_name = "COUNT", allow_negative_numbers = true)]
    pub trials: Option<i64>,

    /// Write the run record as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub json_out: Option<PathBuf>,

    /// Write the run record as CSV to this path
    #[arg(long, value_name = "PATH")]
    pub csv_out: Option<PathBuf>,

    /// TOML file with run defaults; flags override it
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seed for the delay generator, for reproducible schedules
    #[arg(long)]
    pub seed: Option<u64>,

    /// Ignore presses this soon after a trial is armed, in milliseconds
    #[arg(long, value_name = "MS")]
    pub grace_ms: Option<f64>,

    /// Drive the run from a response script instead of the terminal
    /// (e.g. "200,fs,150,abort")
    #[arg(long, value_name = "SCRIPT")]
    pub simulate: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Built-in defaults, then the config file, then explicit flags.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_toml_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(min) = self.min_delay {
            config.min_delay_seconds = min;
        }
        if let Some(max) = self.max_delay {
            config.max_delay_seconds = max;
        }
        if let Some(trials) = self.trials {
            config.trial_count = trials;
        }
        if let Some(grace) = self.grace_ms {
            config.false_start_grace_ms = grace;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.simulate.is_some() {
            // Scripted input lands on exact instants; spinning buys nothing.
            config.spin_margin_ms = 0.0;
        }
        Ok(config)
    }

    pub fn output_targets(&self) -> OutputTargets {
        OutputTargets {
            json: self.json_out.clone(),
            csv: self.csv_out.clone(),
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("reflex").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_historical_engine() {
        let config = parse(&[]).run_config().unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.min_delay_seconds, 2.0);
        assert_eq!(config.max_delay_seconds, 5.0);
        assert_eq!(config.trial_count, 10);
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min_delay_seconds = 0.5\nmax_delay_seconds = 1.5\ntrial_count = 7").unwrap();
        let path = file.path().to_str().unwrap();
        let config = parse(&["--config", path, "--trials", "3"]).run_config().unwrap();
        assert_eq!(config.min_delay_seconds, 0.5);
        assert_eq!(config.max_delay_seconds, 1.5);
        assert_eq!(config.trial_count, 3);
    }

    #[test]
    fn negative_values_reach_validation() {
        let cli = parse(&["--trials", "-2", "--min-delay", "-1"]);
        let config = cli.run_config().unwrap();
        assert_eq!(config.trial_count, -2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let err = parse(&["--config", "/nonexistent/reflex.toml"])
            .run_config()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(parse(&[]).log_level(), log::LevelFilter::Warn);
        assert_eq!(parse(&["-vv"]).log_level(), log::LevelFilter::Debug);
    }
}
