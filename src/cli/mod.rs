//! Command-line interface for the training and prediction pipelines.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::{
    run_training_pipeline, PredictConfig, PredictPipeline, StudentRecord, TrainingReport,
};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "scorecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Math score prediction pipeline for the students performance dataset")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train on a students performance CSV and persist the best model
    Train {
        /// Source CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Directory for data splits and fitted artifacts
        #[arg(long, default_value = "artifacts")]
        artifacts_dir: PathBuf,
    },

    /// Predict the math score for one student
    Predict {
        /// Gender (male, female)
        #[arg(long)]
        gender: String,

        /// Race/ethnicity group (group A through group E)
        #[arg(long)]
        ethnicity: String,

        /// Parental level of education
        #[arg(long)]
        parental_education: String,

        /// Lunch type (standard, free/reduced)
        #[arg(long)]
        lunch: String,

        /// Test preparation course (none, completed)
        #[arg(long)]
        test_preparation: String,

        /// Reading score, 0-100
        #[arg(long)]
        reading_score: u32,

        /// Writing score, 0-100
        #[arg(long)]
        writing_score: u32,

        /// Directory holding the fitted artifacts
        #[arg(long, default_value = "artifacts")]
        artifacts_dir: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(data: &Path, artifacts_dir: &Path) -> anyhow::Result<()> {
    section("Train");

    step_run("Running training pipeline");
    let start = Instant::now();
    let report = run_training_pipeline(data, artifacts_dir)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&report);
    Ok(())
}

fn print_report(report: &TrainingReport) {
    println!();
    println!(
        "  {:<20} {:>10} {:>10}",
        muted("Model"),
        muted("CV R²"),
        muted("Test R²")
    );
    println!("  {}", dim(&"─".repeat(42)));

    for candidate in &report.candidates {
        println!(
            "  {:<20} {:>10.4} {:>10.4}",
            candidate.name, candidate.cv_score, candidate.test_r2
        );
    }

    println!("  {}", dim(&"─".repeat(42)));
    println!();
    println!(
        "  {} {} {} {:.4}",
        ok("best"),
        report.best_model.white().bold(),
        muted("R²:"),
        report.best_score
    );
    println!();
    println!(
        "  {:<16} {}",
        muted("RMSE"),
        format!("{:.4}", report.metrics.rmse).white()
    );
    println!(
        "  {:<16} {}",
        muted("MAE"),
        format!("{:.4}", report.metrics.mae).white()
    );
    println!("  {:<16} {}", muted("Model file"), report.model_path.display());
    println!();
}

pub fn cmd_predict(record: &StudentRecord, artifacts_dir: &Path) -> anyhow::Result<()> {
    section("Predict");

    step_run("Scoring record");
    let start = Instant::now();
    let pipeline = PredictPipeline::new(PredictConfig::in_dir(artifacts_dir));
    let score = pipeline.predict(record)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!(
        "  {:<16} {}",
        muted("Math score"),
        format!("{:.1}", score).white().bold()
    );
    println!();
    Ok(())
}
