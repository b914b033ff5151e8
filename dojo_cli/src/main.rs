mod live;
mod simulate;

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dojo_schema::{coerce_bpm, Difficulty, Mode, Pattern, SessionSettings};

#[derive(Debug, Parser)]
#[command(name = "dojo")]
#[command(about = "Rhythm timing trainer", long_about = None)]
struct Cli {
    #[arg(long, global = true, default_value = "warn")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replays a tap script on a simulated clock and prints the session report.
    Run {
        script: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print one line per tap instead of the json report.
        #[arg(long)]
        table: bool,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Live session in the terminal: Enter taps, `q` + Enter stops.
    Play {
        #[arg(long, default_value = "dojo-offset.json")]
        store: PathBuf,
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Offset store file; read at start and updated by calibration.
    #[arg(long)]
    store: Option<PathBuf>,
    /// Latency offset in ms when no store file is given.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset: f64,
}

#[derive(Debug, Args)]
struct SettingsArgs {
    /// JSON file with session settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    bpm: Option<String>,
    #[arg(long)]
    pattern: Option<Pattern>,
    #[arg(long)]
    difficulty: Option<Difficulty>,
    #[arg(long)]
    mode: Option<Mode>,
    /// Session length in seconds, count-in excluded.
    #[arg(long)]
    duration: Option<f64>,
    #[arg(long)]
    count_in: Option<u32>,
}

impl SettingsArgs {
    fn resolve(&self, base: SessionSettings) -> anyhow::Result<SessionSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                let bytes = fs::read(path).with_context(|| format!("failed to read config: {}", path.display()))?;
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("failed to parse config json: {}", path.display()))?
            }
            None => base,
        };
        if let Some(bpm) = &self.bpm {
            settings.bpm = coerce_bpm(bpm);
        }
        if let Some(pattern) = self.pattern {
            settings.pattern = pattern;
        }
        if let Some(difficulty) = self.difficulty {
            settings.difficulty = difficulty;
        }
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(duration) = self.duration {
            settings.duration_secs = duration;
        }
        if let Some(count_in) = self.count_in {
            settings.count_in_beats = count_in;
        }
        Ok(settings.sanitized())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::Run {
            script,
            output,
            table,
            store,
            settings,
        } => {
            let script_data = simulate::load_script(&script)?;
            let settings = settings.resolve(script_data.settings.clone())?;
            let run = match &store.store {
                Some(path) => simulate::run_script(&script_data, settings, dojo_core::store::JsonFileStore::new(path)),
                None => simulate::run_script(
                    &script_data,
                    settings,
                    dojo_core::store::MemoryStore::with_offset(dojo_core::store::DEFAULT_OFFSET_KEY, store.offset),
                ),
            }
            .with_context(|| format!("run failed: {}", script.display()))?;

            if table {
                simulate::print_table(&run);
                return Ok(());
            }
            let json = serde_json::to_string_pretty(&run.report).context("failed to serialize report")?;
            match output {
                Some(out_path) => fs::write(&out_path, json)
                    .with_context(|| format!("failed to write: {}", out_path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Play { store, settings } => {
            let settings = settings.resolve(SessionSettings::default())?;
            let report = live::play(settings, &store)?;
            println!("{}", serde_json::to_string_pretty(&report).context("failed to serialize report")?);
        }
    }

    Ok(())
}
