//! Input file resolution for the `analyze` subcommand.
//!
//! Paths come from a comma-separated list, a glob pattern, or both. Listed
//! paths keep their order; glob matches are sorted and appended after them.

use std::path::PathBuf;

#[derive(Debug)]
pub enum InputError {
    /// Neither a path list nor a pattern was given.
    NoSources,
    /// Sources were given but resolved to no paths.
    Empty,
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    Glob(glob::GlobError),
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::NoSources => write!(f, "no list of pathnames or pattern given"),
            InputError::Empty => write!(f, "no input files found"),
            InputError::Pattern { pattern, source } => {
                write!(f, "invalid pattern '{pattern}': {source}")
            }
            InputError::Glob(e) => write!(f, "failed to read glob match: {e}"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Pattern { source, .. } => Some(source),
            InputError::Glob(e) => Some(e),
            _ => None,
        }
    }
}

/// Resolve the input paths from `list` (comma-separated) and `pattern` (glob).
///
/// Surrounding single quotes on the pattern are stripped so that patterns
/// quoted for a shell that does not remove them still work.
pub fn resolve_inputs(
    list: Option<&str>,
    pattern: Option<&str>,
) -> Result<Vec<PathBuf>, InputError> {
    if list.is_none() && pattern.is_none() {
        return Err(InputError::NoSources);
    }

    let mut paths: Vec<PathBuf> = list
        .into_iter()
        .flat_map(|l| l.split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect();

    if let Some(pattern) = pattern {
        let pattern = pattern.trim_matches('\'');
        let entries = glob::glob(pattern).map_err(|e| InputError::Pattern {
            pattern: pattern.to_string(),
            source: e,
        })?;
        let mut matched = entries
            .collect::<Result<Vec<_>, _>>()
            .map_err(InputError::Glob)?;
        matched.sort();
        if matched.is_empty() {
            tracing::warn!(pattern, "pattern matched no files");
        } else {
            tracing::debug!(pattern, count = matched.len(), "pattern matched files");
        }
        paths.extend(matched);
    }

    if paths.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(paths)
}
