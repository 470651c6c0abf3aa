//! Integration tests for Benchtop.

use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use benchtop::clean::{CleaningChange, NumericImpute};
use benchtop::input::write_delimited;
use benchtop::metrics::EvaluationMetrics;
use benchtop::model::{ModelArtifact, model_path};
use benchtop::{
    BenchtopError, CleaningConfig, ColumnKind, FormatHint, ModelFamily, PipelineConfig,
    Predictions, StorageType, TaskSelection, TaskType, TrainingConfig, Value, Workbench,
    WorkbenchConfig, WarningKind,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// Two well-separated flower species with a few gaps.
fn flowers_csv() -> String {
    let mut content = String::from("petal_length,petal_width,colour,species\n");
    for i in 0..30 {
        let small = i % 2 == 0;
        let length = if small { 1.0 + (i % 5) as f64 * 0.1 } else { 5.0 + (i % 5) as f64 * 0.2 };
        let width = if i % 7 == 3 {
            String::new()
        } else if small {
            format!("{:.1}", 0.2 + (i % 3) as f64 * 0.1)
        } else {
            format!("{:.1}", 1.8 + (i % 3) as f64 * 0.2)
        };
        let colour = if i % 11 == 5 { "" } else if small { "white" } else { "purple" };
        let species = if small { "setosa" } else { "virginica" };
        content.push_str(&format!("{},{},{},{}\n", length, width, colour, species));
    }
    content
}

// =============================================================================
// Ingestion
// =============================================================================

#[test]
fn test_ingest_csv_with_nulls() {
    let file = create_test_file("id,name,score\n1,Alice,3.5\n2,NA,\n3,Carol,4.0\n", ".csv");

    let (table, source) = Workbench::new().ingest(file.path(), None).expect("Ingest failed");

    assert_eq!(table.shape(), (3, 3));
    assert_eq!(source.format, "csv");
    assert_eq!(source.row_count, 3);
    assert_eq!(source.hash.len(), 64);
    assert_eq!(table.column("score").unwrap().storage, StorageType::Numeric);
    assert_eq!(table.column("name").unwrap().storage, StorageType::Text);
    assert_eq!(table.get(1, 1), Some(&Value::Null));
    assert_eq!(table.get(1, 2), Some(&Value::Null));
}

#[test]
fn test_ingest_semicolon_detected() {
    let file = create_test_file("a;b;c\n1;2;x\n3;4;y\n", ".txt");
    let (table, source) = Workbench::new().ingest(file.path(), None).unwrap();
    assert_eq!(table.shape(), (2, 3));
    assert_eq!(source.format, "csv-semicolon");
}

#[test]
fn test_ingest_explicit_delimiter_hint() {
    let bytes = b"a|b\n1|2\n";
    let (table, _) = Workbench::new()
        .ingest_bytes(bytes, &FormatHint::delimited(b'|'))
        .unwrap();
    assert_eq!(table.column_names(), vec!["a", "b"]);
}

#[test]
fn test_ingest_errors() {
    let bench = Workbench::new();
    assert!(matches!(
        bench.ingest_bytes(b"", &FormatHint::default()),
        Err(BenchtopError::EmptyInput(_))
    ));
    assert!(matches!(
        bench.ingest_bytes(b"a,b\n", &FormatHint::delimited(b',')),
        Err(BenchtopError::EmptyInput(_))
    ));
    assert!(matches!(
        bench.ingest_bytes(b"a,b\n1,2,3\n", &FormatHint::delimited(b',')),
        Err(BenchtopError::Format(_))
    ));
    assert!(matches!(
        bench.ingest("/nonexistent/table.csv", None),
        Err(BenchtopError::Io { .. })
    ));
}

#[test]
fn test_duplicate_headers_are_renamed() {
    let (table, _) = Workbench::new()
        .ingest_bytes(b"x,x,\n1,2,3\n", &FormatHint::delimited(b','))
        .unwrap();
    assert_eq!(table.column_names(), vec!["x", "x.1", "Unnamed: 2"]);
}

#[test]
fn test_write_then_ingest_round_trip() {
    let (table, _) = Workbench::new()
        .ingest_bytes(flowers_csv().as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let bytes = write_delimited(&table, b',').unwrap();
    let (again, _) = Workbench::new()
        .ingest_bytes(&bytes, &FormatHint::delimited(b','))
        .unwrap();
    assert_eq!(table, again);
}

// =============================================================================
// Profiling and cleaning
// =============================================================================

#[test]
fn test_profile_kinds_and_missingness() {
    let (table, _) = Workbench::new()
        .ingest_bytes(flowers_csv().as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let profile = Workbench::new().profile(&table);

    assert_eq!(profile.kind_of("petal_length"), Some(ColumnKind::Numeric));
    assert_eq!(profile.kind_of("species"), Some(ColumnKind::Categorical));

    let width = profile.column("petal_width").unwrap();
    assert_eq!(width.missing_count, 4);
    assert!(width.numeric.is_some());

    let correlations = profile.correlations.as_ref().unwrap();
    assert_eq!(correlations.columns, vec!["petal_length", "petal_width"]);
    assert!(correlations.get("petal_length", "petal_width").unwrap() > 0.9);

    let species = profile.column("species").unwrap();
    assert_eq!(species.cardinality, 2);
    assert_eq!(species.categorical.as_ref().unwrap().top_frequency, 15);
}

#[test]
fn test_clean_imputes_and_reports() {
    let (table, _) = Workbench::new()
        .ingest_bytes(flowers_csv().as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let outcome = Workbench::new()
        .clean(&table, &CleaningConfig::default())
        .unwrap();

    assert_eq!(outcome.table.column("petal_width").unwrap().null_count(), 0);
    assert_eq!(outcome.table.column("colour").unwrap().null_count(), 0);
    assert_eq!(outcome.report.values_imputed(), 4 + 3);
    assert!(outcome
        .report
        .changes
        .iter()
        .any(|c| matches!(c, CleaningChange::Impute { column, .. } if column == "colour")));
    // Input is untouched.
    assert_eq!(table.column("petal_width").unwrap().null_count(), 4);
}

#[test]
fn test_clean_coerces_date_columns() {
    let content =
        "when,value\n2024-01-05,1\n2024-02-10,2\n2024-03-15,3\n2024-04-20,4\n2024-05-25,5\n";
    let (table, _) = Workbench::new()
        .ingest_bytes(content.as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let outcome = Workbench::new()
        .clean(&table, &CleaningConfig::default())
        .unwrap();

    assert_eq!(outcome.table.column("when").unwrap().storage, StorageType::DateTime);
    assert_eq!(outcome.report.coerced_columns(), vec!["when"]);
    assert_eq!(
        Workbench::new().profile(&outcome.table).kind_of("when"),
        Some(ColumnKind::Datetime)
    );
}

#[test]
fn test_clean_prunes_sparse_columns() {
    let content = "keep,sparse,dense\n1,,a\n2,,b\n3,,c\n4,9,d\n5,8,e\n";
    let (table, _) = Workbench::new()
        .ingest_bytes(content.as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let config = CleaningConfig::default().with_missing_threshold(0.5);
    let outcome = Workbench::new().clean(&table, &config).unwrap();

    assert_eq!(outcome.table.column_names(), vec!["keep", "dense"]);
    assert_eq!(outcome.report.dropped_columns(), vec!["sparse"]);
}

// =============================================================================
// Training, persistence and prediction
// =============================================================================

#[test]
fn test_train_save_load_predict() {
    let dir = TempDir::new().unwrap();
    let bench = Workbench::with_config(WorkbenchConfig::default().with_output_dir(dir.path()));

    let (table, _) = bench
        .ingest_bytes(flowers_csv().as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let cleaned = bench.clean(&table, &CleaningConfig::default()).unwrap();
    let config = TrainingConfig::new("species").with_n_estimators(10);
    let outcome = bench.train(&cleaned.table, &config).unwrap();

    assert_eq!(outcome.artifact.task, TaskType::Classification);
    assert_eq!(outcome.split.test_rows(), 6);
    match &outcome.metrics {
        EvaluationMetrics::Classification(m) => {
            assert!(m.accuracy >= 0.6, "accuracy {}", m.accuracy);
            assert_eq!(m.confusion_matrix.labels, vec!["setosa", "virginica"]);
            let total: usize = m.confusion_matrix.counts.iter().flatten().sum();
            assert_eq!(total, 6);
        }
        other => panic!("unexpected metrics {:?}", other),
    }

    let path = bench.save_model(&outcome.artifact).unwrap();
    assert_eq!(path, model_path(dir.path(), "species"));

    let loaded = ModelArtifact::load(&path).unwrap();
    assert_eq!(loaded, outcome.artifact);

    // Raw-schema input with an extra target column and gaps is accepted.
    let predictions = loaded.predict(&table).unwrap();
    assert_eq!(predictions.len(), table.row_count());
    match predictions {
        Predictions::Labels(labels) => {
            assert!(labels.iter().all(|l| l == "setosa" || l == "virginica"));
        }
        other => panic!("unexpected predictions {:?}", other),
    }
}

#[test]
fn test_retraining_overwrites_artifact() {
    let dir = TempDir::new().unwrap();
    let bench = Workbench::with_config(WorkbenchConfig::default().with_output_dir(dir.path()));
    let (table, _) = bench
        .ingest_bytes(flowers_csv().as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let cleaned = bench.clean(&table, &CleaningConfig::default()).unwrap();

    let forest = bench
        .train(&cleaned.table, &TrainingConfig::new("species").with_n_estimators(3))
        .unwrap();
    bench.save_model(&forest.artifact).unwrap();
    let linear = bench
        .train(
            &cleaned.table,
            &TrainingConfig::new("species").with_model(ModelFamily::Linear),
        )
        .unwrap();
    bench.save_model(&linear.artifact).unwrap();

    let loaded = bench.load_model("species").unwrap();
    assert_eq!(loaded.model.name(), "logistic regression");
    let models: Vec<_> = fs::read_dir(dir.path().join("models")).unwrap().collect();
    assert_eq!(models.len(), 1);
}

#[test]
fn test_predict_missing_feature_column() {
    let bench = Workbench::new();
    let (table, _) = bench
        .ingest_bytes(flowers_csv().as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let cleaned = bench.clean(&table, &CleaningConfig::default()).unwrap();
    let outcome = bench
        .train(&cleaned.table, &TrainingConfig::new("species").with_n_estimators(3))
        .unwrap();

    let reduced = table.drop_columns(&["colour"]);
    match outcome.artifact.predict(&reduced) {
        Err(BenchtopError::SchemaMismatch { missing, .. }) => {
            assert_eq!(missing, vec!["colour".to_string()]);
        }
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}

#[test]
fn test_regression_with_linear_model() {
    let mut content = String::from("size,rooms,district,price\n");
    for i in 0..40 {
        let size = 40 + i * 3;
        let rooms = 1 + i % 4;
        let district = ["north", "south"][i % 2];
        let price = 2.0 * size as f64 + 10.0 * rooms as f64 + if i % 2 == 0 { 5.0 } else { 0.0 };
        content.push_str(&format!("{},{},{},{}\n", size, rooms, district, price));
    }
    let bench = Workbench::new();
    let (table, _) = bench
        .ingest_bytes(content.as_bytes(), &FormatHint::delimited(b','))
        .unwrap();

    let config = TrainingConfig::new("price").with_model(ModelFamily::Linear);
    let outcome = bench.train(&table, &config).unwrap();
    assert_eq!(outcome.artifact.task, TaskType::Regression);
    assert_eq!(
        outcome.artifact.features.feature_names(),
        ["size", "rooms", "district_north", "district_south"]
    );
    match &outcome.metrics {
        EvaluationMetrics::Regression(m) => {
            assert!(m.rmse < 1e-3, "rmse {}", m.rmse);
            assert!(m.r2 > 0.9999);
        }
        other => panic!("unexpected metrics {:?}", other),
    }
}

#[test]
fn test_forced_classification_on_numeric_target() {
    let content = "x,y\n1,10\n2,20\n3,10\n4,20\n5,10\n6,20\n7,10\n8,20\n9,10\n10,20\n";
    let bench = Workbench::new();
    let (table, _) = bench
        .ingest_bytes(content.as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let config = TrainingConfig::new("y")
        .with_task(TaskSelection::Classification)
        .with_n_estimators(5);
    let outcome = bench.train(&table, &config).unwrap();
    assert_eq!(outcome.artifact.classes, vec!["10", "20"]);
}

#[test]
fn test_missing_targets_are_excluded_with_warning() {
    let mut content = String::from("x,label\n");
    for i in 0..20 {
        let label = if i % 10 == 0 { "" } else if i < 10 { "a" } else { "b" };
        content.push_str(&format!("{},{}\n", i, label));
    }
    let bench = Workbench::new();
    let (table, _) = bench
        .ingest_bytes(content.as_bytes(), &FormatHint::delimited(b','))
        .unwrap();
    let outcome = bench
        .train(&table, &TrainingConfig::new("label").with_n_estimators(5))
        .unwrap();
    assert_eq!(outcome.dropped_target_rows, 2);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::MissingTarget && w.column == "label"));
}

// =============================================================================
// Full pipeline and report
// =============================================================================

#[test]
fn test_full_pipeline_writes_outputs() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("flowers.csv");
    fs::write(&input, flowers_csv()).unwrap();

    let pipeline = PipelineConfig {
        cleaning: CleaningConfig::default().with_numeric_impute(NumericImpute::Mean),
        training: Some(TrainingConfig::new("species").with_n_estimators(5)),
    };
    let bench = Workbench::with_config(
        WorkbenchConfig::default()
            .with_output_dir(dir.path().join("outputs"))
            .with_report_title("Flowers"),
    );
    let run = bench.run(&input, None, &pipeline).unwrap();

    assert_eq!(
        run.report_path,
        dir.path().join("outputs").join("reports").join("report_consolidated.html")
    );
    assert_eq!(
        run.model_path.as_deref(),
        Some(dir.path().join("outputs").join("models").join("model_species.json").as_path())
    );

    let html = fs::read_to_string(&run.report_path).unwrap();
    assert!(html.contains("<h1>Flowers</h1>"));
    assert!(html.contains("30 rows × 4 columns"));
    assert!(html.contains("<h2>Correlations</h2>"));
    assert!(html.contains("Trained model"));
    assert!(html.contains("Accuracy:"));
}
