//! Example: run the full pipeline on a delimited file.
//!
//! Usage:
//!   cargo run --example pipeline -- <file_path> [target_column]
//!
//! Example:
//!   cargo run --example pipeline -- iris.csv species

use std::env;
use std::path::Path;

use benchtop::{EvaluationMetrics, PipelineConfig, TrainingConfig, Workbench};

fn main() -> benchtop::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example pipeline -- <file_path> [target_column]");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let pipeline = PipelineConfig {
        training: args.get(2).map(|target| TrainingConfig::new(target.as_str())),
        ..PipelineConfig::default()
    };
    let run = Workbench::new().run(path, None, &pipeline)?;

    println!("Source: {} ({})", path.display(), run.source.format);
    println!("SHA-256: {}", run.source.hash);
    println!();
    println!("=== Profile ===");
    for col in &run.profile.columns {
        println!(
            "  {:20} {:12} missing {:5.1}%  distinct {}",
            col.name,
            col.kind.label(),
            col.missing_fraction * 100.0,
            col.cardinality
        );
    }

    println!();
    println!("=== Cleaning ===");
    for change in &run.cleaning.report.changes {
        println!("  {}", change.description());
    }
    for warning in &run.cleaning.report.warnings {
        println!("  warning: {}", warning.message);
    }

    if let Some(outcome) = &run.training {
        println!();
        println!("=== Model ===");
        println!(
            "  {} ({}) on {} rows",
            outcome.artifact.model.name(),
            outcome.artifact.task.label(),
            outcome.split.train_rows()
        );
        match &outcome.metrics {
            EvaluationMetrics::Classification(m) => {
                println!("  accuracy {:.4}, weighted F1 {:.4}", m.accuracy, m.f1_weighted)
            }
            EvaluationMetrics::Regression(m) => println!("  RMSE {:.4}, R² {:.4}", m.rmse, m.r2),
        }
    }

    println!();
    println!("Report: {}", run.report_path.display());
    Ok(())
}
