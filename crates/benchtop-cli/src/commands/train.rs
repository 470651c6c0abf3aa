//! Train command - clean, fit a model and save the artifact.

use std::path::PathBuf;

use colored::Colorize;
use benchtop::{EvaluationMetrics, TrainingOutcome, Workbench, WorkbenchConfig};

use crate::cli::{CleaningArgs, InputArgs, TrainingArgs};

pub fn run(
    input: InputArgs,
    cleaning: CleaningArgs,
    training: TrainingArgs,
    output_dir: PathBuf,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.file.exists() {
        return Err(format!("File not found: {}", input.file.display()).into());
    }

    let pipeline = input.pipeline_config()?;
    let cleaning_config = cleaning.apply(pipeline.cleaning);
    let training_config = training
        .options
        .apply(&training.target, pipeline.training);
    cleaning_config.validate()?;
    training_config.validate()?;

    let workbench = Workbench::with_config(WorkbenchConfig::default().with_output_dir(output_dir));
    let (table, _) = workbench.ingest(&input.file, input.hint())?;
    let cleaned = workbench.clean(&table, &cleaning_config)?;
    let outcome = workbench.train(&cleaned.table, &training_config)?;
    let path = workbench.save_model(&outcome.artifact)?;

    if json_output {
        let output = serde_json::json!({
            "target": outcome.artifact.target,
            "task": outcome.artifact.task,
            "model": outcome.artifact.model.name(),
            "train_rows": outcome.split.train_rows(),
            "test_rows": outcome.split.test_rows(),
            "metrics": outcome.metrics,
            "artifact": path,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_outcome(&outcome);
    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        path.display().to_string().white()
    );

    Ok(())
}

pub fn print_outcome(outcome: &TrainingOutcome) {
    let artifact = &outcome.artifact;
    println!(
        "{} {} {} model for {}",
        "Trained".cyan().bold(),
        artifact.model.name(),
        artifact.task.label(),
        artifact.target.white().bold()
    );
    println!(
        "  {} training rows, {} held out, {} features",
        outcome.split.train_rows(),
        outcome.split.test_rows(),
        artifact.features.n_features()
    );
    if outcome.dropped_target_rows > 0 {
        println!(
            "  {} rows without a target value were excluded",
            outcome.dropped_target_rows.to_string().yellow()
        );
    }
    println!();

    println!("{}", "Held-out metrics:".yellow().bold());
    for (name, value) in outcome.metrics.summary() {
        println!("  {:12} {:.4}", name, value);
    }

    if let EvaluationMetrics::Classification(m) = &outcome.metrics {
        let matrix = &m.confusion_matrix;
        println!();
        println!("{}", "Confusion matrix (rows = true, columns = predicted):".yellow().bold());
        print!("  {:>12}", "");
        for label in &matrix.labels {
            print!(" {:>10}", label);
        }
        println!();
        for (label, row) in matrix.labels.iter().zip(&matrix.counts) {
            print!("  {:>12}", label);
            for count in row {
                print!(" {:>10}", count);
            }
            println!();
        }
    }

    let ranked = artifact.ranked_importances();
    if !ranked.is_empty() {
        println!();
        println!("{}", "Top features:".yellow().bold());
        for (name, importance) in ranked.iter().take(10) {
            println!("  {:24} {:.4}", name, importance);
        }
    }
}
