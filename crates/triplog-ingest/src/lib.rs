// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telemetry ingestion for Triplog.
//!
//! Turns logger exports (Torque Pro CSV and compatible formats) into canonical
//! [`Sample`](triplog_core::Sample)s. Rows that cannot be normalized are
//! logged and skipped.

pub mod coerce;
pub mod datetime;
pub mod fields;
pub mod normalizer;
pub mod parser;

pub use fields::FieldMap;
pub use normalizer::SampleNormalizer;
pub use parser::{IngestReport, RecordSource, SampleIter, TelemetryIngestParser};
