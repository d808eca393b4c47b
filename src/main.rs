//! Fallwatch: fall-risk assessment for older adults.
//!
//! Main entry point: cohort generation, training, batch prediction and the
//! terminal dashboard.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fallwatch::adapters::files::{write_predictions, CsvCohortStore, FsArtifactStore};
use fallwatch::adapters::sanitize::SanitizingMakeWriter;
use fallwatch::application::{
    CohortService, InferenceService, TrainingService, DEFAULT_TEST_SIZE, DEFAULT_TRAIN_SIZE,
};
use fallwatch::config::{AppConfig, LogMode};
use fallwatch::tui::App;

#[derive(Debug, Parser)]
#[command(name = "fallwatch", version, about = "Six-month fall-risk assessment")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate the synthetic training and held-out cohorts
    Generate {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = DEFAULT_TRAIN_SIZE)]
        train: usize,
        #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
        test: usize,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Train the candidate classifiers and persist the best one
    Train {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// Score every row of a cohort CSV
    Predict {
        #[arg(long)]
        input: PathBuf,
        /// Defaults to stdout
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// Interactive terminal dashboard (default)
    Dashboard {
        #[arg(long)]
        model_dir: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

enum LogSink {
    File,
    Stdout,
    Stderr,
}

fn init_logging(config: &AppConfig, sink: LogSink) -> Result<WorkerGuard> {
    let (writer, guard) = match sink {
        LogSink::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("Cannot open log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogSink::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogSink::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env_or_default();
    let command = cli.command.unwrap_or(Command::Dashboard {
        model_dir: None,
        data_dir: None,
    });

    // Writing logs to the terminal would corrupt the dashboard's alternate
    // screen, and `predict` may own stdout for its CSV.
    let interactive = std::io::stdout().is_terminal();
    let sink = match (&command, config.log_mode) {
        (_, LogMode::File) => LogSink::File,
        (Command::Predict { output: None, .. }, _) => LogSink::Stderr,
        (_, LogMode::Stdout) => LogSink::Stdout,
        (Command::Dashboard { .. }, LogMode::Auto) if interactive => LogSink::File,
        (_, LogMode::Auto) => LogSink::Stdout,
    };
    let _guard = init_logging(&config, sink)?;

    match command {
        Command::Generate {
            seed,
            train,
            test,
            data_dir,
        } => {
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            let service = CohortService::new(Arc::new(CsvCohortStore::new(&config.data_dir)));
            service
                .generate(config.seed, train, test)
                .with_context(|| format!("Failed to write cohort to {:?}", config.data_dir))?;
        }
        Command::Train {
            data_dir,
            model_dir,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(dir) = model_dir {
                config.model_dir = dir;
            }
            let service = TrainingService::new(
                Arc::new(CsvCohortStore::new(&config.data_dir)),
                Arc::new(FsArtifactStore::new(&config.model_dir)),
                config.seed,
            );
            let report = service.train().with_context(|| {
                format!(
                    "Training failed (data {:?}). Run `fallwatch generate` first if the cohort is missing.",
                    config.data_dir
                )
            })?;
            tracing::info!(
                "Saved {} (auc={:.4}) to {:?}",
                report.best().name,
                report.best().metrics.auc,
                config.model_dir
            );
        }
        Command::Predict {
            input,
            output,
            model_dir,
        } => {
            if let Some(dir) = model_dir {
                config.model_dir = dir;
            }
            let service = InferenceService::load(&FsArtifactStore::new(&config.model_dir))
                .with_context(|| format!("Failed to load model from {:?}", config.model_dir))?;
            let records = CsvCohortStore::load_path(&input)
                .with_context(|| format!("Failed to read {input:?}"))?;
            let assessments = service.assess_batch(&records)?;

            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Cannot create {path:?}"))?;
                    write_predictions(std::io::BufWriter::new(file), &assessments)?;
                    tracing::info!("Wrote {} predictions to {:?}", assessments.len(), path);
                }
                None => write_predictions(std::io::stdout().lock(), &assessments)?,
            }
        }
        Command::Dashboard {
            model_dir,
            data_dir,
        } => {
            if let Some(dir) = model_dir {
                config.model_dir = dir;
            }
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }

            tracing::info!("Starting Fallwatch...");
            let mut app = App::new(&config)?;
            app.run()?;
            tracing::info!("Fallwatch shutdown complete.");
        }
    }

    Ok(())
}
