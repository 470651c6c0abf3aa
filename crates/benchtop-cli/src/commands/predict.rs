//! Predict command - score a table with a saved model artifact.

use std::path::PathBuf;

use colored::Colorize;
use benchtop::input::{write_delimited, write_delimited_file};
use benchtop::{Column, ModelArtifact, Predictions, Value, Workbench};

use crate::cli::InputArgs;

pub fn run(
    input: InputArgs,
    model: PathBuf,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.file.exists() {
        return Err(format!("File not found: {}", input.file.display()).into());
    }

    let artifact = ModelArtifact::load(&model)?;
    let (table, _) = Workbench::new().ingest(&input.file, input.hint())?;
    let predictions = artifact.predict(&table)?;

    let name = format!("predicted_{}", artifact.target);
    let column = match predictions {
        Predictions::Labels(labels) => {
            Column::new(name, labels.into_iter().map(Value::Text).collect())
        }
        Predictions::Values(values) => Column::numeric(name, values.into_iter().map(Some)),
    };
    let scored = table.with_column(column)?;

    match output {
        Some(path) => {
            write_delimited_file(&scored, &path, b',')?;
            eprintln!(
                "{} {} predictions to {}",
                "Wrote".green().bold(),
                scored.row_count(),
                path.display().to_string().white()
            );
        }
        None => {
            let bytes = write_delimited(&scored, b',')?;
            print!("{}", String::from_utf8_lossy(&bytes));
        }
    }

    Ok(())
}
