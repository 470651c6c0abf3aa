//! Report command - run every stage and write the consolidated report.

use std::path::PathBuf;

use colored::Colorize;
use benchtop::{Workbench, WorkbenchConfig};

use crate::cli::{CleaningArgs, InputArgs, TrainingOptions};

pub fn run(
    input: InputArgs,
    cleaning: CleaningArgs,
    target: Option<String>,
    training: TrainingOptions,
    title: String,
    head_rows: usize,
    output_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.file.exists() {
        return Err(format!("File not found: {}", input.file.display()).into());
    }

    let mut pipeline = input.pipeline_config()?;
    pipeline.cleaning = cleaning.apply(pipeline.cleaning);
    let target = target.or_else(|| pipeline.training.as_ref().map(|t| t.target.clone()));
    pipeline.training = target.map(|t| training.apply(&t, pipeline.training.take()));

    let workbench = Workbench::with_config(
        WorkbenchConfig::default()
            .with_output_dir(output_dir)
            .with_report_title(title)
            .with_report_head_rows(head_rows),
    );

    println!(
        "{} {}",
        "Running pipeline on".cyan().bold(),
        input.file.display().to_string().white()
    );
    let run = workbench.run(&input.file, input.hint(), &pipeline)?;

    println!(
        "  Raw:     {} rows × {} columns",
        run.raw.row_count(),
        run.raw.column_count()
    );
    println!(
        "  Cleaned: {} rows × {} columns",
        run.cleaning.table.row_count(),
        run.cleaning.table.column_count()
    );

    if let Some(outcome) = &run.training {
        println!();
        super::train::print_outcome(outcome);
    }
    if let Some(path) = &run.model_path {
        println!();
        println!(
            "{} {}",
            "Model saved to".green().bold(),
            path.display().to_string().white()
        );
    }

    println!(
        "{} {}",
        "Report written to".green().bold(),
        run.report_path.display().to_string().white()
    );

    Ok(())
}
