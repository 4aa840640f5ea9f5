//! Descriptive statistics for one property across many SDF files.

use crate::extract::{self, DuplicatePolicy, ExtractError, ExtractOptions, MarkerScanner, Record};
use crate::stats::{StatsError, Summary};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum AnalyzeError {
    Extract(ExtractError),
    /// A value that must be numeric is text.
    NonNumeric {
        tag: String,
        path: PathBuf,
        value: String,
    },
    /// No record carries the requested tag.
    UnknownProperty { tag: String },
    Stats { tag: String, source: StatsError },
}

impl std::fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzeError::Extract(e) => write!(f, "{e}"),
            AnalyzeError::NonNumeric { tag, path, value } => write!(
                f,
                "non-numeric value '{value}' for {tag} in {}",
                path.display()
            ),
            AnalyzeError::UnknownProperty { tag } => {
                write!(f, "property {tag} not found in any input file")
            }
            AnalyzeError::Stats { tag, source } => write!(f, "{tag}: {source}"),
        }
    }
}

impl std::error::Error for AnalyzeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalyzeError::Extract(e) => Some(e),
            AnalyzeError::Stats { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExtractError> for AnalyzeError {
    fn from(e: ExtractError) -> Self {
        AnalyzeError::Extract(e)
    }
}

/// Every tag seen across `records`, in first-seen order.
pub fn property_names(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .flat_map(|r| r.order.iter())
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

/// Project `tag` out of every record. Records without the tag yield `None`.
pub fn column(records: &[Record], tag: &str) -> Result<Vec<Option<f64>>, AnalyzeError> {
    records
        .iter()
        .map(|r| match r.get(tag) {
            None => Ok(None),
            Some(v) => v
                .as_number()
                .map(Some)
                .ok_or_else(|| AnalyzeError::NonNumeric {
                    tag: tag.to_string(),
                    path: r.source.clone(),
                    value: v.to_string(),
                }),
        })
        .collect()
}

/// Summary statistics of `tag` over `records`.
#[allow(dead_code)]
pub fn describe(records: &[Record], tag: &str) -> Result<Summary, AnalyzeError> {
    let values = column(records, tag)?;
    summarize(tag, &values)
}

fn summarize(tag: &str, column: &[Option<f64>]) -> Result<Summary, AnalyzeError> {
    if column.iter().all(Option::is_none) {
        return Err(AnalyzeError::UnknownProperty {
            tag: tag.to_string(),
        });
    }
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let missing = column.len() - present.len();
    if missing > 0 {
        tracing::warn!(tag, missing, "property absent from some files");
    }
    Summary::compute(&present).map_err(|e| AnalyzeError::Stats {
        tag: tag.to_string(),
        source: e,
    })
}

#[derive(Debug, Serialize)]
struct ColumnEntry<'a> {
    source: &'a Path,
    value: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AnalyzeReport<'a> {
    property: &'a str,
    properties: Vec<String>,
    values: Vec<ColumnEntry<'a>>,
    summary: &'a Summary,
}

fn format_number(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "NaN".to_string(),
    }
}

/// Render the plain-text report: property list, the column, then the summary.
pub fn render_report(
    records: &[Record],
    tag: &str,
    column: &[Option<f64>],
    summary: &Summary,
    precision: usize,
) -> String {
    let mut lines = Vec::new();

    let names = property_names(records);
    if !names.is_empty() {
        lines.push(format!("Retrieved properties: [{}]", names.join(", ")));
    }

    lines.push(format!("Values of {tag}"));
    let index_width = records.len().saturating_sub(1).to_string().len();
    for (i, (record, value)) in records.iter().zip(column).enumerate() {
        lines.push(format!(
            "{i:>index_width$}  {}  {}",
            format_number(*value, precision),
            record.source.display()
        ));
    }

    lines.push("Statistics".to_string());
    for (label, value) in summary.rows() {
        let cell = if label == "count" {
            summary.count.to_string()
        } else {
            format_number(value, precision)
        };
        lines.push(format!("{label:<6}  {cell}"));
    }

    lines.join("\n")
}

/// Render the report as a JSON document.
pub fn render_json(
    records: &[Record],
    tag: &str,
    column: &[Option<f64>],
    summary: &Summary,
) -> Result<String, serde_json::Error> {
    let report = AnalyzeReport {
        property: tag,
        properties: property_names(records),
        values: records
            .iter()
            .zip(column)
            .map(|(r, v)| ColumnEntry {
                source: &r.source,
                value: *v,
            })
            .collect(),
        summary,
    };
    serde_json::to_string_pretty(&report)
}

/// Handle the `analyze` subcommand.
pub fn handle_analyze(
    scanner: &MarkerScanner,
    paths: &[PathBuf],
    tag: &str,
    duplicates: DuplicatePolicy,
    precision: usize,
    json: bool,
) -> Result<(), String> {
    let options = ExtractOptions {
        tags: None,
        duplicates,
    };
    let records = extract::extract_all(scanner, paths, &options).map_err(|e| e.to_string())?;
    let column = column(&records, tag).map_err(|e| e.to_string())?;
    let summary = summarize(tag, &column).map_err(|e| e.to_string())?;

    let output = if json {
        render_json(&records, tag, &column, &summary)
            .map_err(|e| format!("Failed to serialize report: {e}"))?
    } else {
        render_report(&records, tag, &column, &summary, precision)
    };
    println!("{output}");
    Ok(())
}
