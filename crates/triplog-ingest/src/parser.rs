// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delimited telemetry log reader.
//!
//! [`TelemetryIngestParser`] reads the source once up front to build an
//! [`IngestReport`], then hands out lazy [`SampleIter`]s. Every call to
//! [`TelemetryIngestParser::samples`] re-opens the source, so iterating twice
//! yields the same samples with the same epoch.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};
use triplog_core::{Sample, TelemetryField, TriplogError};

use crate::fields::FieldMap;
use crate::normalizer::SampleNormalizer;

const DEFAULT_PROGRESS_EVERY: u64 = 100;

/// Where records are read from.
#[derive(Debug, Clone)]
pub enum RecordSource {
    File(PathBuf),
    Memory(String),
}

impl RecordSource {
    fn open(&self) -> Result<csv::Reader<Box<dyn Read + Send>>, TriplogError> {
        let input: Box<dyn Read + Send> = match self {
            RecordSource::File(path) => Box::new(File::open(path).map_err(|e| {
                TriplogError::Ingest {
                    source: Box::new(e),
                }
            })?),
            RecordSource::Memory(text) => Box::new(Cursor::new(text.clone().into_bytes())),
        };
        Ok(ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(input))
    }
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSource::File(path) => write!(f, "{}", path.display()),
            RecordSource::Memory(_) => f.write_str("<memory>"),
        }
    }
}

/// Diagnostics gathered by the discovery pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Data rows in the source, header excluded.
    pub total_records: u64,
    /// Canonical fields no column maps to. Derivable fields are not listed.
    pub missing_fields: BTreeSet<TelemetryField>,
    /// Columns with no canonical mapping.
    pub not_supported_fields: BTreeSet<String>,
}

/// Reads telemetry rows into [`Sample`]s.
#[derive(Debug)]
pub struct TelemetryIngestParser {
    source: RecordSource,
    fields: FieldMap,
    report: IngestReport,
    progress_every: u64,
}

impl TelemetryIngestParser {
    /// Opens `source` and runs the discovery pass.
    pub fn open(source: RecordSource, fields: FieldMap) -> Result<Self, TriplogError> {
        let mut reader = source.open()?;
        let headers = read_headers(&mut reader)?;

        let mut observed = BTreeSet::new();
        let mut not_supported_fields = BTreeSet::new();
        for header in headers.iter() {
            match fields.lookup(header) {
                Some(field) => {
                    observed.insert(field);
                }
                None => {
                    not_supported_fields.insert(header.to_string());
                }
            }
        }
        let missing_fields = TelemetryField::iter()
            .filter(|field| !field.is_derivable() && !observed.contains(field))
            .collect();
        let total_records = reader.into_records().count() as u64;

        let report = IngestReport {
            total_records,
            missing_fields,
            not_supported_fields,
        };
        info!(
            %source,
            records = report.total_records,
            missing = report.missing_fields.len(),
            not_supported = report.not_supported_fields.len(),
            "telemetry source opened"
        );

        Ok(Self {
            source,
            fields,
            report,
            progress_every: DEFAULT_PROGRESS_EVERY,
        })
    }

    /// Sets how many records pass between progress log lines.
    pub fn with_progress_every(mut self, every: u64) -> Self {
        self.progress_every = every.max(1);
        self
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    pub fn source(&self) -> &RecordSource {
        &self.source
    }

    /// Starts a fresh pass over the source.
    pub fn samples(&self) -> Result<SampleIter<'_>, TriplogError> {
        let mut reader = self.source.open()?;
        let headers = read_headers(&mut reader)?;
        Ok(SampleIter {
            headers,
            records: reader.into_records(),
            normalizer: SampleNormalizer::new(&self.fields),
            total: self.report.total_records,
            progress_every: self.progress_every,
            records_read: 0,
            skipped: 0,
        })
    }
}

fn read_headers(
    reader: &mut csv::Reader<Box<dyn Read + Send>>,
) -> Result<StringRecord, TriplogError> {
    reader
        .headers()
        .cloned()
        .map_err(|e| TriplogError::Ingest {
            source: Box::new(e),
        })
}

/// Lazy single pass over the source. Bad rows are logged and skipped.
pub struct SampleIter<'p> {
    headers: StringRecord,
    records: StringRecordsIntoIter<Box<dyn Read + Send>>,
    normalizer: SampleNormalizer<'p>,
    total: u64,
    progress_every: u64,
    records_read: u64,
    skipped: u64,
}

impl SampleIter<'_> {
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Iterator for SampleIter<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        loop {
            let row = self.records.next()?;
            self.records_read += 1;
            if self.records_read % self.progress_every == 0 {
                debug!(line = self.records_read, total = self.total, "parsing");
            }

            let record = match row {
                Ok(record) => record,
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.records_read, error = %e, "skipping unreadable row");
                    continue;
                }
            };

            match self
                .normalizer
                .normalize(self.headers.iter().zip(record.iter()))
            {
                Ok(sample) => return Some(sample),
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.records_read, error = %e, "skipping record");
                }
            }
        }
    }
}
