// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `triplog sessions` and `triplog show` command implementations.
//!
//! With `--json`, output is structured JSON for scripting. With `--plain` or
//! when stdout is not a TTY, colors are disabled.

use std::io::IsTerminal;

use serde::Serialize;
use triplog_config::TriplogConfig;
use triplog_core::{Sample, SessionRecord, SessionStatus, SessionUid, TriplogError};

use crate::app::App;

/// Structured output of `triplog show --json`.
#[derive(Debug, Serialize)]
pub struct ShowResponse<'a> {
    pub session: &'a SessionRecord,
    pub samples: &'a [Sample],
}

/// Format seconds into a human-readable duration string.
pub fn format_duration(secs: f64) -> String {
    if secs < 0.0 {
        return "-".to_string();
    }
    let secs = secs.round() as u64;
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn format_distance(km: f64) -> String {
    if km < 0.0 {
        "-".to_string()
    } else {
        format!("{km:.2} km")
    }
}

fn status_label(status: SessionStatus, use_color: bool) -> String {
    if !use_color {
        return status.to_string();
    }
    use colored::Colorize;
    match status {
        SessionStatus::NotStarted => status.to_string().dimmed().to_string(),
        SessionStatus::Ongoing => status.to_string().yellow().to_string(),
        SessionStatus::Terminated => status.to_string().green().to_string(),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, TriplogError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TriplogError::Internal(format!("failed to serialize output: {e}")))
}

/// Run the `triplog sessions` command.
pub async fn run_sessions(config: &TriplogConfig, json: bool, plain: bool) -> Result<(), TriplogError> {
    let app = App::open(config).await?;
    let sessions = app.controller.list().await;
    app.close().await?;
    let sessions = sessions?;

    if json {
        println!("{}", to_json(&sessions)?);
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    println!();
    println!("  triplog sessions ({})", sessions.len());
    println!("  {}", "-".repeat(35));
    for record in &sessions {
        println!(
            "    {}  {:<11}  {:>10}  {:>10}  {}",
            &record.uid.as_str()[..12.min(record.uid.as_str().len())],
            status_label(record.status, use_color),
            format_distance(record.distance),
            format_duration(record.duration),
            record.origin
        );
    }
    println!();
    Ok(())
}

/// Run the `triplog show` command.
pub async fn run_show(
    config: &TriplogConfig,
    uid: &str,
    samples: Option<usize>,
    json: bool,
    plain: bool,
) -> Result<(), TriplogError> {
    let app = App::open(config).await?;
    let uid = SessionUid(uid.to_string());
    let result = async {
        let session = app.controller.get(&uid).await?;
        let samples = match samples {
            Some(limit) => app.controller.samples(&uid, None, Some(limit)).await?,
            None => Vec::new(),
        };
        Ok::<_, TriplogError>((session.record().clone(), samples))
    }
    .await;
    app.close().await?;
    let (record, samples) = result?;

    if json {
        let response = ShowResponse {
            session: &record,
            samples: &samples,
        };
        println!("{}", to_json(&response)?);
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print_record(&record, use_color);
    if !samples.is_empty() {
        println!("    {:>8}  {:>10}  {:>10}  {:>6}  {:>8}", "t (s)", "lat", "lon", "fix", "km");
        for sample in &samples {
            println!(
                "    {:>8.1}  {:>10.5}  {:>10.5}  {:>6}  {:>8.3}",
                sample.timestamp, sample.latitude, sample.longitude, sample.fix, sample.distance
            );
        }
        println!();
    }
    Ok(())
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map_or_else(|| "-".to_string(), T::to_string)
}

fn print_record(record: &SessionRecord, use_color: bool) {
    println!();
    println!("  session {}", record.uid);
    println!("  {}", "-".repeat(35));
    println!("    Origin:        {}", record.origin);
    println!("    Status:        {}", status_label(record.status, use_color));
    println!("    Start date:    {}", opt(&record.start_date));
    println!("    Start point:   {}", opt(&record.start_point));
    println!("    First address: {}", opt(&record.first_address));
    println!("    End date:      {}", opt(&record.end_date));
    println!("    End point:     {}", opt(&record.end_point));
    println!("    Last address:  {}", opt(&record.last_address));
    println!("    Distance:      {}", format_distance(record.distance));
    println!("    Duration:      {}", format_duration(record.duration));
    println!("    Last comm:     {}", record.last_comm);
    println!();
}
