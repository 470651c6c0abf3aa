//! Clean command - apply the cleaning steps and export the result.

use std::path::PathBuf;

use colored::Colorize;
use benchtop::Workbench;
use benchtop::input::write_delimited_file;

use crate::cli::{CleaningArgs, InputArgs};

pub fn run(
    input: InputArgs,
    cleaning: CleaningArgs,
    output: Option<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.file.exists() {
        return Err(format!("File not found: {}", input.file.display()).into());
    }

    let config = cleaning.apply(input.pipeline_config()?.cleaning);
    config.validate()?;

    let workbench = Workbench::new();
    let (table, _) = workbench.ingest(&input.file, input.hint())?;
    let outcome = workbench.clean(&table, &config)?;

    let output_path = output.unwrap_or_else(|| {
        let mut p = input.file.clone();
        let stem = p.file_stem().unwrap_or_default().to_string_lossy();
        p.set_file_name(format!("{}.cleaned.csv", stem));
        p
    });
    write_delimited_file(&outcome.table, &output_path, b',')?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
        return Ok(());
    }

    let report = &outcome.report;
    println!(
        "{} {}",
        "Cleaned".cyan().bold(),
        input.file.display().to_string().white()
    );
    println!(
        "  Rows:    {} → {}",
        report.rows_before,
        report.rows_after.to_string().white().bold()
    );
    println!(
        "  Columns: {} → {}",
        report.columns_before,
        report.columns_after.to_string().white().bold()
    );
    println!();

    if report.changes.is_empty() {
        println!("{}", "No changes needed - data looks clean!".green());
    } else {
        println!("{}", "Changes:".yellow().bold());
        for change in &report.changes {
            println!("  {}", change.description());
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("{}", "Warnings:".yellow().bold());
        for warning in &report.warnings {
            println!(
                "  [{}] {}: {}",
                warning.kind.label().yellow(),
                warning.column,
                warning.message
            );
        }
    }

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().white()
    );

    Ok(())
}
