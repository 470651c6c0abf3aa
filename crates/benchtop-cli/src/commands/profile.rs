//! Profile command - column kinds, missingness and describe statistics.

use colored::Colorize;
use benchtop::{Profiler, Workbench};

use crate::cli::InputArgs;

pub fn run(
    input: InputArgs,
    detect_dates: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.file.exists() {
        return Err(format!("File not found: {}", input.file.display()).into());
    }

    let (table, source) = Workbench::new().ingest(&input.file, input.hint())?;
    let profile = Profiler::new()
        .with_date_detection(detect_dates)
        .profile(&table);

    if json_output {
        let output = serde_json::json!({
            "source": source,
            "profile": profile,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} ({} rows × {} columns, {})",
        "Profile of".cyan().bold(),
        input.file.display().to_string().white(),
        profile.row_count.to_string().white().bold(),
        profile.column_count.to_string().white().bold(),
        source.format
    );
    if profile.duplicate_rows > 0 {
        println!(
            "{} duplicate rows",
            profile.duplicate_rows.to_string().yellow()
        );
    }
    println!();

    println!("{}", "Columns:".yellow().bold());
    for col in &profile.columns {
        let missing = if col.missing_count > 0 {
            format!("{:.1}% missing", col.missing_fraction * 100.0)
                .yellow()
                .to_string()
        } else {
            "complete".green().to_string()
        };
        println!(
            "  {:20} {:12} {:>6} distinct  {}",
            col.name,
            col.kind.label(),
            col.cardinality,
            missing
        );

        if let Some(stats) = &col.numeric {
            println!(
                "  {:20} mean {:.3}  std {:.3}  min {:.3}  q1 {:.3}  median {:.3}  q3 {:.3}  \
                 max {:.3}",
                "",
                stats.mean,
                stats.std,
                stats.min,
                stats.q1,
                stats.median,
                stats.q3,
                stats.max
            );
        }
        if let Some(summary) = &col.categorical {
            if let Some(top) = &summary.top {
                println!(
                    "  {:20} top {:?} ({} rows)",
                    "", top, summary.top_frequency
                );
            }
        }
        if col.is_date_candidate() {
            println!("  {:20} {}", "", "looks like dates".blue());
        }
    }

    if let Some(matrix) = &profile.correlations {
        println!();
        println!("{}", "Correlations:".yellow().bold());
        print!("  {:12}", "");
        for name in &matrix.columns {
            print!(" {:>10.10}", name);
        }
        println!();
        for (name, row) in matrix.columns.iter().zip(&matrix.values) {
            print!("  {:12.12}", name);
            for r in row {
                match r {
                    Some(r) => print!(" {:>10.2}", r),
                    None => print!(" {:>10}", "n/a"),
                }
            }
            println!();
        }
    }

    if !profile.warnings.is_empty() {
        println!();
        println!("{}", "Warnings:".yellow().bold());
        for warning in &profile.warnings {
            println!(
                "  [{}] {}: {}",
                warning.kind.label().yellow(),
                warning.column,
                warning.message
            );
        }
    }

    Ok(())
}
