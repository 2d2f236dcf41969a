//! Scorecast - Main Entry Point
//!
//! Trains on the students performance dataset and predicts math scores.

use clap::Parser;
use scorecast::cli::{cmd_predict, cmd_train, Cli, Commands};
use scorecast::pipeline::StudentRecord;

fn main() -> anyhow::Result<()> {
    let log_path = scorecast::logging::init("logs")?;
    tracing::info!(path = %log_path.display(), "logging to file");

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, artifacts_dir } => {
            cmd_train(&data, &artifacts_dir)?;
        }
        Commands::Predict {
            gender,
            ethnicity,
            parental_education,
            lunch,
            test_preparation,
            reading_score,
            writing_score,
            artifacts_dir,
        } => {
            let record = StudentRecord {
                gender,
                ethnicity,
                parental_education,
                lunch,
                test_preparation,
                reading_score,
                writing_score,
            };
            cmd_predict(&record, &artifacts_dir)?;
        }
    }

    Ok(())
}
