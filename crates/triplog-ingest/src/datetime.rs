// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device time parsing for logger exports.
//!
//! Torque writes device times like `11-mai-2016 20:23:42.000`, with the month
//! abbreviated in the phone's locale. The month token is rewritten to its
//! number before a strict fixed-format parse.

use chrono::NaiveDateTime;
use triplog_core::TriplogError;

const FORMATS: [&str; 2] = ["%d-%m-%Y %H:%M:%S%.f", "%d-%m-%Y %H:%M:%S"];

/// Month names and abbreviations seen in exports, French and English,
/// lowercase and without trailing dot.
const MONTHS: &[(&str, u32)] = &[
    ("janv", 1),
    ("janvier", 1),
    ("jan", 1),
    ("january", 1),
    ("févr", 2),
    ("fevr", 2),
    ("fév", 2),
    ("fev", 2),
    ("février", 2),
    ("fevrier", 2),
    ("feb", 2),
    ("february", 2),
    ("mars", 3),
    ("mar", 3),
    ("march", 3),
    ("avr", 4),
    ("avril", 4),
    ("apr", 4),
    ("april", 4),
    ("mai", 5),
    ("may", 5),
    ("juin", 6),
    ("jun", 6),
    ("june", 6),
    ("juil", 7),
    ("juillet", 7),
    ("jul", 7),
    ("july", 7),
    ("août", 8),
    ("aout", 8),
    ("aug", 8),
    ("august", 8),
    ("sept", 9),
    ("sep", 9),
    ("septembre", 9),
    ("september", 9),
    ("oct", 10),
    ("octobre", 10),
    ("october", 10),
    ("nov", 11),
    ("novembre", 11),
    ("november", 11),
    ("déc", 12),
    ("dec", 12),
    ("décembre", 12),
    ("decembre", 12),
    ("december", 12),
];

fn unparsable(text: &str, detail: impl std::fmt::Display) -> TriplogError {
    TriplogError::UnparsableRecord {
        reason: format!("device time `{text}`: {detail}"),
    }
}

/// Resolve a month token (`mai`, `Janv.`, `05`) to its number.
pub fn month_number(token: &str) -> Option<u32> {
    let token = token.trim().trim_end_matches('.').to_lowercase();
    if let Ok(n) = token.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    MONTHS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, n)| *n)
}

/// Rewrite `dd-<month>-yyyy hh:mm:ss[.fff]` so the month is numeric.
pub fn normalize_months(text: &str) -> Result<String, TriplogError> {
    let text = text.trim();
    let (date, time) = text
        .split_once(' ')
        .ok_or_else(|| unparsable(text, "missing time part"))?;
    let mut parts = date.splitn(3, '-');
    let (Some(day), Some(month), Some(year)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(unparsable(text, "expected day-month-year"));
    };
    let month = month_number(month).ok_or_else(|| unparsable(text, "unknown month"))?;
    Ok(format!("{day}-{month:02}-{year} {}", time.trim()))
}

/// Parse an exporter device time.
pub fn parse_device_time(text: &str) -> Result<NaiveDateTime, TriplogError> {
    let normalized = normalize_months(text)?;
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .ok_or_else(|| unparsable(text, "does not match the exporter date format"))
}
