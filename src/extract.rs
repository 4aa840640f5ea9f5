//! SDF property extraction.
//!
//! Scans a file for marker lines of the form `> <TAG>` and reads the line
//! immediately after each one as that tag's value. One `Record` is produced
//! per file.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// A marker line, tested against the trimmed line text.
const MARKER_PATTERN: &str = r"^> *<.*>$";

/// A single property value: numeric when the value line parses as a float,
/// the right-trimmed text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) => PropertyValue::Number(n),
            Err(_) => PropertyValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

/// Which occurrence of a repeated tag is kept within one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DuplicatePolicy {
    #[default]
    #[serde(rename = "last")]
    LastWins,
    #[serde(rename = "first")]
    FirstWins,
}

/// All properties extracted from one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub source: PathBuf,
    pub values: BTreeMap<String, PropertyValue>,
    /// Tags in the order they first appear in the file.
    #[serde(skip)]
    pub order: Vec<String>,
}

impl Record {
    pub fn get(&self, tag: &str) -> Option<&PropertyValue> {
        self.values.get(tag)
    }

    /// Tag/value pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> + '_ {
        self.order
            .iter()
            .filter_map(|tag| self.values.get(tag).map(|v| (tag.as_str(), v)))
    }
}

/// Controls which tags are stored and how repeats are resolved.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// When set, only these tags are stored. `None` stores every tag.
    pub tags: Option<HashSet<String>>,
    pub duplicates: DuplicatePolicy,
}

impl ExtractOptions {
    pub fn only<I, S>(tags: I, duplicates: DuplicatePolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            duplicates,
        }
    }

    fn wants(&self, tag: &str) -> bool {
        self.tags.as_ref().map_or(true, |set| set.contains(tag))
    }
}

/// Recognizes marker lines and pulls the tag name out of them.
pub struct MarkerScanner {
    pattern: Regex,
}

impl MarkerScanner {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(MARKER_PATTERN).expect("marker pattern is a valid regex"),
        }
    }

    /// Returns the tag name if `line` is a marker line.
    ///
    /// The tag is the text between the first `<` and the next `>`, so
    /// `> <A> <B>` yields `A`.
    pub fn tag_of<'a>(&self, line: &'a str) -> Option<&'a str> {
        let trimmed = line.trim();
        if !self.pattern.is_match(trimmed) {
            return None;
        }
        let open = trimmed.find('<')?;
        let rest = &trimmed[open + 1..];
        let close = rest.find('>')?;
        Some(&rest[..close])
    }
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub enum ExtractError {
    /// The path does not name an existing regular file.
    NotFound { path: PathBuf },
    /// A marker line is the last line of the file, so it has no value line.
    MissingValue {
        path: PathBuf,
        line: usize,
        tag: String,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::NotFound { path } => {
                write!(f, "file '{}' is missing!", path.display())
            }
            ExtractError::MissingValue { path, line, tag } => write!(
                f,
                "{}:{line}: marker for <{tag}> has no value line",
                path.display()
            ),
            ExtractError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Extract properties from one SDF file.
pub fn extract(
    scanner: &MarkerScanner,
    path: &Path,
    options: &ExtractOptions,
) -> Result<Record, ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let io_err = |source: std::io::Error| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(io_err)?;
    let reader = std::io::BufReader::new(file);

    let mut values: BTreeMap<String, PropertyValue> = BTreeMap::new();
    let mut order = Vec::new();
    let mut lines = reader.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line = line.map_err(io_err)?;
        let Some(tag) = scanner.tag_of(&line) else {
            continue;
        };

        let raw = match lines.next() {
            Some((_, value_line)) => value_line.map_err(io_err)?,
            None => {
                return Err(ExtractError::MissingValue {
                    path: path.to_path_buf(),
                    line: index + 1,
                    tag: tag.to_string(),
                })
            }
        };

        if !options.wants(tag) {
            continue;
        }
        if options.duplicates == DuplicatePolicy::FirstWins && values.contains_key(tag) {
            tracing::debug!(path = %path.display(), tag, "repeated tag ignored");
            continue;
        }
        let previous = values.insert(tag.to_string(), PropertyValue::parse(raw.trim_end()));
        if previous.is_none() {
            order.push(tag.to_string());
        }
    }

    tracing::info!(
        path = %path.display(),
        count = values.len(),
        "parsed properties"
    );

    Ok(Record {
        source: path.to_path_buf(),
        values,
        order,
    })
}

/// Extract a single tag's value from one file.
pub fn extract_tag(
    scanner: &MarkerScanner,
    path: &Path,
    tag: &str,
    duplicates: DuplicatePolicy,
) -> Result<Option<PropertyValue>, ExtractError> {
    let options = ExtractOptions::only([tag], duplicates);
    let mut record = extract(scanner, path, &options)?;
    Ok(record.values.remove(tag))
}

/// Extract every path in order, stopping at the first failure.
pub fn extract_all(
    scanner: &MarkerScanner,
    paths: &[PathBuf],
    options: &ExtractOptions,
) -> Result<Vec<Record>, ExtractError> {
    paths
        .iter()
        .map(|p| extract(scanner, p, options))
        .collect()
}

/// One `path<TAB>tag<TAB>value` line per extracted property.
pub fn render_records(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        for (tag, value) in record.iter() {
            out.push_str(&format!("{}\t{tag}\t{value}\n", record.source.display()));
        }
    }
    out
}

/// Handle the `extract` subcommand.
pub fn handle_extract(
    scanner: &MarkerScanner,
    paths: &[PathBuf],
    tags: &[String],
    duplicates: DuplicatePolicy,
    json: bool,
) -> Result<(), String> {
    let options = if tags.is_empty() {
        ExtractOptions {
            tags: None,
            duplicates,
        }
    } else {
        ExtractOptions::only(tags.iter().cloned(), duplicates)
    };
    let records = extract_all(scanner, paths, &options).map_err(|e| e.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&records)
            .map_err(|e| format!("Failed to serialize records: {e}"))?;
        println!("{text}");
    } else {
        print!("{}", render_records(&records));
    }
    Ok(())
}
