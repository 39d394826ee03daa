// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment deserialization failures and post-load validation failures both
//! become [`ConfigError`]s keyed by the dotted configuration path. When that
//! path can be found in one of the loaded TOML files, the diagnostic carries
//! the file and a span so miette underlines the offending line.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::fmt;
use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity to suggest a correction.
/// Catches typos like `langage` -> `language` without suggesting noise.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Dotted path to a configuration value, e.g. `geocode.timeout_secs`.
///
/// Components that are not bare TOML keys (alias column names) are quoted
/// when displayed: `ingest.field_aliases."GPS Lat"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigKey(Vec<String>);

impl ConfigKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Splits `a.b.c` on dots. Only for paths made of bare keys.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|part| !part.is_empty()))
    }

    pub fn child(&self, part: impl Into<String>) -> Self {
        let mut parts = self.0.clone();
        parts.push(part.into());
        Self(parts)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if is_bare_key(part) {
                f.write_str(part)?;
            } else {
                write!(f, "{part:?}")?;
            }
        }
        Ok(())
    }
}

fn is_bare_key(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A configuration problem, rendered by miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section declares.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(triplog::config::unknown_key),
        help("{}", key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: ConfigKey,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value outside a closed set: storage backend, log level, alias target.
    #[error("`{key}` does not accept `{value}`")]
    #[diagnostic(
        code(triplog::config::unknown_value),
        help("{}", value_help(suggestion.as_deref(), expected))
    )]
    UnknownValue {
        key: ConfigKey,
        value: String,
        suggestion: Option<String>,
        expected: String,
        #[label("set here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong type or outside its allowed range.
    #[error("invalid value for `{key}`: {message}")]
    #[diagnostic(code(triplog::config::invalid_value))]
    InvalidValue {
        key: ConfigKey,
        message: String,
        #[label("invalid value here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// Anything figment reports that has no key to point at.
    #[error("configuration error: {0}")]
    #[diagnostic(code(triplog::config::other))]
    Other(String),
}

fn key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

fn value_help(suggestion: Option<&str>, expected: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Expected one of: {expected}"),
        None => format!("expected one of: {expected}"),
    }
}

impl ConfigError {
    /// A value that parsed but breaks a constraint.
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: ConfigKey::parse(key),
            message: message.into(),
            span: None,
            src: None,
        }
    }

    /// A value that is not one of `expected`, with a suggestion when close.
    pub fn unknown_value(key: ConfigKey, value: &str, expected: &[&str]) -> Self {
        ConfigError::UnknownValue {
            key,
            value: value.to_string(),
            suggestion: suggest(value, expected),
            expected: expected.join(", "),
            span: None,
            src: None,
        }
    }

    /// The configuration path this error is about.
    pub fn key(&self) -> Option<&ConfigKey> {
        match self {
            ConfigError::UnknownKey { key, .. }
            | ConfigError::UnknownValue { key, .. }
            | ConfigError::InvalidValue { key, .. } => Some(key),
            ConfigError::Other(_) => None,
        }
    }

    /// Attaches the source file and span of the key, when it can be found.
    ///
    /// `preferred` names the file figment attributed the error to; it is
    /// searched first.
    pub fn located(mut self, sources: &ConfigSources, preferred: Option<&str>) -> Self {
        match &mut self {
            ConfigError::UnknownKey { key, span, src, .. }
            | ConfigError::UnknownValue { key, span, src, .. }
            | ConfigError::InvalidValue { key, span, src, .. } => {
                if span.is_none() {
                    if let Some((found, named)) = sources.locate(key, preferred) {
                        *span = Some(found);
                        *src = Some(named);
                    }
                }
            }
            ConfigError::Other(_) => {}
        }
        self
    }
}

/// TOML texts that fed the configuration, highest precedence first.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    files: Vec<(String, String)>,
}

impl ConfigSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.push((name.into(), content.into()));
    }

    /// Reads whichever of `paths` exist. Unreadable files are skipped.
    pub fn read<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        let mut sources = Self::new();
        for path in paths {
            let path = path.as_ref();
            if let Ok(content) = std::fs::read_to_string(path) {
                let name = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                sources.push(name.display().to_string(), content);
            }
        }
        sources
    }

    /// Finds `key` in the preferred file first, then in precedence order.
    pub fn locate(
        &self,
        key: &ConfigKey,
        preferred: Option<&str>,
    ) -> Option<(SourceSpan, NamedSource<String>)> {
        let is_preferred = |name: &str| preferred == Some(name);
        let ordered = self
            .files
            .iter()
            .filter(|(name, _)| is_preferred(name))
            .chain(self.files.iter().filter(|(name, _)| !is_preferred(name)));

        for (name, content) in ordered {
            if let Some((offset, len)) = find_key(content, key.parts()) {
                let span = SourceSpan::new(offset.into(), len);
                return Some((span, NamedSource::new(name, content.clone())));
            }
        }
        None
    }
}

/// Byte offset and length of `path` in TOML `content`.
///
/// Looks for the leaf key under its `[table]` header. When the key itself
/// is absent, points at the header of the nearest enclosing table instead.
pub fn find_key(content: &str, path: &[String]) -> Option<(usize, usize)> {
    let (leaf, tables) = path.split_last()?;
    if let Some(found) = find_entry(content, &tables.join("."), leaf) {
        return Some(found);
    }
    (1..=path.len())
        .rev()
        .find_map(|n| find_header(content, &path[..n].join(".")))
}

fn lines_with_offsets(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content.split_inclusive('\n').scan(0, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line.trim_end_matches(|c: char| c == '\r' || c == '\n')))
    })
}

/// Table name of a `[table]` header line, if `line` is one.
fn header_name(line: &str) -> Option<&str> {
    let inner = line.trim_start().strip_prefix('[')?;
    let (name, _) = inner.split_once(']')?;
    Some(name.trim())
}

fn find_header(content: &str, table: &str) -> Option<(usize, usize)> {
    lines_with_offsets(content).find_map(|(start, line)| {
        if header_name(line)? != table {
            return None;
        }
        let name_at = line.find(table)?;
        Some((start + name_at, table.len()))
    })
}

fn find_entry(content: &str, table: &str, leaf: &str) -> Option<(usize, usize)> {
    let quoted = format!("\"{leaf}\"");
    let mut in_table = table.is_empty();

    for (start, line) in lines_with_offsets(content) {
        let trimmed = line.trim_start();
        if let Some(name) = header_name(trimmed) {
            in_table = name == table;
            continue;
        }
        if !in_table {
            continue;
        }
        let indent = line.len() - trimmed.len();
        for candidate in [leaf, quoted.as_str()] {
            if let Some(after) = trimmed.strip_prefix(candidate) {
                if after.trim_start().starts_with('=') {
                    return Some((start + indent, candidate.len()));
                }
            }
        }
    }
    None
}

/// Best Jaro-Winkler match for `unknown` among `candidates`, if close enough.
pub fn suggest(unknown: &str, candidates: &[&str]) -> Option<String> {
    let mut best_score = SUGGESTION_THRESHOLD;
    let mut best_match = None;

    for &candidate in candidates {
        let score = strsim::jaro_winkler(unknown, candidate);
        if score > best_score {
            best_score = score;
            best_match = Some(candidate.to_string());
        }
    }

    best_match
}

/// Converts a figment error into located diagnostics, one per inner error.
pub fn from_figment(err: figment::Error, sources: &ConfigSources) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path = ConfigKey::new(error.path.iter().cloned());
            let preferred = error
                .metadata
                .as_ref()
                .and_then(|m| m.source.as_ref())
                .and_then(|source| match source {
                    figment::Source::File(file) => Some(file.display().to_string()),
                    _ => None,
                });

            let diagnostic = match &error.kind {
                Kind::UnknownField(field, expected) => ConfigError::UnknownKey {
                    key: path.child(field.clone()),
                    suggestion: suggest(field, expected),
                    valid_keys: expected.join(", "),
                    span: None,
                    src: None,
                },
                Kind::UnknownVariant(value, expected) => {
                    ConfigError::unknown_value(path, value, expected)
                }
                Kind::InvalidType(actual, expected) | Kind::InvalidValue(actual, expected) => {
                    ConfigError::InvalidValue {
                        key: path,
                        message: format!("found {actual}, expected {expected}"),
                        span: None,
                        src: None,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            };
            diagnostic.located(sources, preferred.as_deref())
        })
        .collect()
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = "\
[log]
level = \"info\"

[geocode]
enabled = true
langage = \"fr\"

[ingest.field_aliases]
\"GPS Lat\" = \"lattitude\"
";

    fn span_text(content: &str, (offset, len): (usize, usize)) -> &str {
        &content[offset..offset + len]
    }

    #[test]
    fn suggests_close_keys_only() {
        let valid = &["enabled", "api_key", "base_url", "language", "timeout_secs"];
        assert_eq!(suggest("langage", valid), Some("language".to_string()));
        assert_eq!(suggest("zzzzzz", &["level"]), None);
    }

    #[test]
    fn key_display_quotes_column_names() {
        let key = ConfigKey::parse("ingest.field_aliases").child("GPS Lat");
        assert_eq!(key.to_string(), "ingest.field_aliases.\"GPS Lat\"");
        assert_eq!(ConfigKey::parse("geocode.timeout_secs").to_string(), "geocode.timeout_secs");
    }

    #[test]
    fn finds_key_inside_its_table() {
        let path = ConfigKey::parse("geocode.langage");
        let found = find_key(TOML, path.parts()).unwrap();
        assert_eq!(span_text(TOML, found), "langage");

        // `level` exists, but not under [geocode]: point at the table header.
        let found = find_key(TOML, ConfigKey::parse("geocode.level").parts()).unwrap();
        assert_eq!(span_text(TOML, found), "geocode");
    }

    #[test]
    fn finds_quoted_alias_column() {
        let key = ConfigKey::parse("ingest.field_aliases").child("GPS Lat");
        let found = find_key(TOML, key.parts()).unwrap();
        assert_eq!(span_text(TOML, found), "\"GPS Lat\"");
    }

    #[test]
    fn missing_table_is_not_found() {
        assert_eq!(find_key(TOML, ConfigKey::parse("trip.dilution_threshold_km").parts()), None);
    }

    #[test]
    fn crlf_offsets_stay_exact() {
        let content = "[trip]\r\ndilution_threshold_km = -1\r\n";
        let found = find_key(content, ConfigKey::parse("trip.dilution_threshold_km").parts());
        assert_eq!(span_text(content, found.unwrap()), "dilution_threshold_km");
    }

    #[test]
    fn validation_error_is_located_in_sources() {
        let mut sources = ConfigSources::new();
        sources.push("triplog.toml", TOML);
        let error = ConfigError::invalid("geocode.enabled", "needs an api_key").located(&sources, None);
        let ConfigError::InvalidValue { span, src, .. } = &error else {
            panic!("unexpected variant {error:?}");
        };
        let span = span.expect("span attached");
        assert_eq!(&TOML[span.offset()..span.offset() + span.len()], "enabled");
        assert!(src.is_some());
    }

    #[test]
    fn unknown_value_suggests_canonical_name() {
        let error = ConfigError::unknown_value(
            ConfigKey::parse("ingest.field_aliases").child("GPS Lat"),
            "lattitude",
            &["latitude", "longitude"],
        );
        let ConfigError::UnknownValue { suggestion, .. } = &error else {
            panic!("unexpected variant {error:?}");
        };
        assert_eq!(suggestion.as_deref(), Some("latitude"));
        let help = error.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("did you mean `latitude`"), "got: {help}");
    }
}
