//! Single-tag aggregates across files: the `mean` and `stddev` subcommands.

use crate::analyze::AnalyzeError;
use crate::extract::{self, DuplicatePolicy, MarkerScanner};
use crate::stats::{self, EmptyPolicy, ZeroPolicy};
use std::path::PathBuf;

/// Collect `tag`'s numeric value from each file, in order.
///
/// Files without the tag contribute nothing. A text value is an error.
pub fn collect_values(
    scanner: &MarkerScanner,
    paths: &[PathBuf],
    tag: &str,
    duplicates: DuplicatePolicy,
) -> Result<Vec<f64>, AnalyzeError> {
    let mut values = Vec::with_capacity(paths.len());
    for path in paths {
        match extract::extract_tag(scanner, path, tag, duplicates)? {
            Some(value) => match value.as_number() {
                Some(n) => values.push(n),
                None => {
                    return Err(AnalyzeError::NonNumeric {
                        tag: tag.to_string(),
                        path: path.clone(),
                        value: value.to_string(),
                    })
                }
            },
            None => tracing::debug!(path = %path.display(), tag, "tag not present"),
        }
    }
    Ok(values)
}

/// Mean of `tag` across `paths` under the given zero policy.
pub fn mean_of(
    scanner: &MarkerScanner,
    paths: &[PathBuf],
    tag: &str,
    duplicates: DuplicatePolicy,
    zeros: ZeroPolicy,
    empty: EmptyPolicy,
) -> Result<f64, AnalyzeError> {
    let values = collect_values(scanner, paths, tag, duplicates)?;
    tracing::debug!(tag, count = values.len(), ?zeros, "computing mean");
    stats::mean_with(&values, zeros, empty).map_err(|e| AnalyzeError::Stats {
        tag: tag.to_string(),
        source: e,
    })
}

/// Sample standard deviation of `tag` across `paths`.
pub fn stddev_of(
    scanner: &MarkerScanner,
    paths: &[PathBuf],
    tag: &str,
    duplicates: DuplicatePolicy,
) -> Result<f64, AnalyzeError> {
    let values = collect_values(scanner, paths, tag, duplicates)?;
    tracing::debug!(tag, count = values.len(), "computing standard deviation");
    stats::stddev(&values).map_err(|e| AnalyzeError::Stats {
        tag: tag.to_string(),
        source: e,
    })
}

/// Fixed-decimal display of an aggregate. The stored value is never rounded.
pub fn format_aggregate(value: f64, precision: usize) -> String {
    format!("{value:.precision$}")
}

/// Handle the `mean` subcommand.
pub fn handle_mean(
    scanner: &MarkerScanner,
    paths: &[PathBuf],
    tag: &str,
    duplicates: DuplicatePolicy,
    zeros: ZeroPolicy,
    empty: EmptyPolicy,
    precision: usize,
) -> Result<(), String> {
    let mean =
        mean_of(scanner, paths, tag, duplicates, zeros, empty).map_err(|e| e.to_string())?;
    println!("{}", format_aggregate(mean, precision));
    Ok(())
}

/// Handle the `stddev` subcommand.
pub fn handle_stddev(
    scanner: &MarkerScanner,
    paths: &[PathBuf],
    tag: &str,
    duplicates: DuplicatePolicy,
    precision: usize,
) -> Result<(), String> {
    let sd = stddev_of(scanner, paths, tag, duplicates).map_err(|e| e.to_string())?;
    println!("{}", format_aggregate(sd, precision));
    Ok(())
}
