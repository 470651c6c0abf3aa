//! HTML rendering for [`Report`].

use crate::metrics::{ClassificationMetrics, EvaluationMetrics, RegressionMetrics};
use crate::profile::CorrelationMatrix;
use crate::table::Table;

use super::{ModelSection, Report, TableSection};

pub(super) fn render(report: &Report) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&report.title)));
    html.push_str("<style>\n");
    html.push_str(CSS_STYLES);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&report.title)));

    if let Some(raw) = &report.raw {
        push_table_section(&mut html, "Raw data", raw);
    }

    if let Some(matrix) = &report.correlations {
        push_correlations(&mut html, matrix);
    }

    if let Some(cleaned) = &report.cleaned {
        push_table_section(&mut html, "Cleaned data", cleaned);
    }

    if let Some(cleaning) = &report.cleaning {
        html.push_str("<h3>Cleaning steps</h3>\n");
        if cleaning.changes.is_empty() {
            html.push_str("<p>No changes were needed.</p>\n");
        } else {
            html.push_str("<ul>\n");
            for change in &cleaning.changes {
                html.push_str(&format!("<li>{}</li>\n", escape_html(&change.description())));
            }
            html.push_str("</ul>\n");
        }
        if !cleaning.warnings.is_empty() {
            html.push_str("<ul class=\"warnings\">\n");
            for warning in &cleaning.warnings {
                html.push_str(&format!(
                    "<li><code>{}</code>: {}</li>\n",
                    escape_html(&warning.column),
                    escape_html(&warning.message)
                ));
            }
            html.push_str("</ul>\n");
        }
    }

    if let Some(model) = &report.model {
        push_model_section(&mut html, model);
    }

    html.push_str("<footer><p>Generated by benchtop</p></footer>\n");
    html.push_str("</body>\n</html>\n");
    html
}

fn push_table_section(html: &mut String, heading: &str, section: &TableSection) {
    html.push_str(&format!("<h2>{}</h2>\n", heading));
    html.push_str(&format!(
        "<p>{} rows × {} columns</p>\n",
        section.rows, section.columns
    ));
    push_table(html, &section.head);
}

fn push_table(html: &mut String, table: &Table) {
    html.push_str("<table>\n<thead><tr>");
    for name in table.column_names() {
        html.push_str(&format!("<th>{}</th>", escape_html(name)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in 0..table.row_count() {
        html.push_str("<tr>");
        for value in table.row(row) {
            html.push_str(&format!("<td>{}</td>", escape_html(&value.to_string())));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
}

fn push_correlations(html: &mut String, matrix: &CorrelationMatrix) {
    html.push_str("<h2>Correlations</h2>\n");
    html.push_str("<table class=\"correlation\">\n<thead><tr><th></th>");
    for name in &matrix.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(name)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for (name, row) in matrix.columns.iter().zip(&matrix.values) {
        html.push_str(&format!("<tr><th>{}</th>", escape_html(name)));
        for r in row {
            match r {
                Some(r) => html.push_str(&format!("<td>{:.2}</td>", r)),
                None => html.push_str("<td>n/a</td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
}

fn push_model_section(html: &mut String, model: &ModelSection) {
    html.push_str("<h2>Trained model</h2>\n");
    html.push_str(&format!(
        "<p>A {} {} model was trained on {} rows to predict <code>{}</code>.</p>\n",
        escape_html(&model.model),
        escape_html(&model.task),
        model.train_rows,
        escape_html(&model.target)
    ));
    if let Some(path) = &model.artifact_path {
        html.push_str(&format!(
            "<p>Saved to <code>{}</code>.</p>\n",
            escape_html(&path.display().to_string())
        ));
    }

    match &model.metrics {
        Some(EvaluationMetrics::Classification(m)) => push_classification(html, m),
        Some(EvaluationMetrics::Regression(m)) => push_regression(html, m),
        None => {}
    }

    if !model.top_features.is_empty() {
        html.push_str("<h3>Feature importances</h3>\n");
        html.push_str("<table>\n<thead><tr><th>Feature</th><th>Importance</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for (name, importance) in &model.top_features {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{:.4}</td></tr>\n",
                escape_html(name),
                importance
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }
}

fn push_classification(html: &mut String, metrics: &ClassificationMetrics) {
    html.push_str("<h3>Held-out metrics</h3>\n");
    html.push_str(&format!(
        "<p>Accuracy: {:.4} | Weighted F1: {:.4}</p>\n",
        metrics.accuracy, metrics.f1_weighted
    ));

    let matrix = &metrics.confusion_matrix;
    html.push_str("<table class=\"confusion\">\n<thead><tr><th>true \\ predicted</th>");
    for label in &matrix.labels {
        html.push_str(&format!("<th>{}</th>", escape_html(label)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for (label, row) in matrix.labels.iter().zip(&matrix.counts) {
        html.push_str(&format!("<tr><th>{}</th>", escape_html(label)));
        for count in row {
            html.push_str(&format!("<td>{}</td>", count));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
}

fn push_regression(html: &mut String, metrics: &RegressionMetrics) {
    html.push_str("<h3>Held-out metrics</h3>\n");
    html.push_str(&format!(
        "<p>RMSE: {:.4} | R²: {:.4}</p>\n",
        metrics.rmse, metrics.r2
    ));
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const CSS_STYLES: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 1100px; margin: 0 auto; padding: 20px; color: #333; background: #fafafa; }
h1 { border-bottom: 2px solid #333; padding-bottom: 10px; }
h2 { color: #555; margin-top: 2em; }
table { border-collapse: collapse; margin: 10px 0; font-size: 0.9em; }
th, td { border: 1px solid #ddd; padding: 6px 10px; text-align: left; }
th { background: #f5f5f5; }
table.confusion td, table.correlation td { text-align: right; }
ul.warnings { color: #b26a00; }
footer { margin-top: 3em; color: #999; font-size: 0.85em; }
"#;
