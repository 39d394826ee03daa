// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `triplog import` command implementation.
//!
//! Reads one telemetry export into one trip session: create (or re-create)
//! the session for the origin, start it, record every parsed sample, stop it.

use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use triplog_config::TriplogConfig;
use triplog_core::{SessionStatus, TriplogError};
use triplog_ingest::{FieldMap, IngestReport, RecordSource, TelemetryIngestParser};
use triplog_session::{StopOutcome, TripController};

use crate::app::App;

/// Arguments of `triplog import`.
#[derive(Debug, Clone)]
pub struct ImportArgs {
    pub file: PathBuf,
    pub origin: String,
    pub start: Option<DateTime<Utc>>,
    pub recreate: bool,
}

/// What an import did.
#[derive(Debug)]
pub struct ImportSummary {
    pub report: IngestReport,
    pub records_read: u64,
    pub skipped: u64,
    pub samples: u64,
    pub outcome: StopOutcome,
}

/// Drives every sample of `parser` through the session for `args.origin`.
pub async fn import_samples(
    controller: &TripController,
    parser: &TelemetryIngestParser,
    args: &ImportArgs,
    progress: &ProgressBar,
) -> Result<ImportSummary, TriplogError> {
    let mut session = if args.recreate {
        controller.recreate(&args.origin).await?
    } else {
        controller.create(&args.origin).await?
    };
    if session.status() != SessionStatus::NotStarted {
        return Err(TriplogError::InvalidStateTransition {
            operation: "import into",
            from: session.status(),
        });
    }

    info!(source = %parser.source(), origin = %args.origin, uid = %session.uid(), "importing telemetry");
    match args.start {
        Some(start) => session.start(start).await?,
        None => session.start_now().await?,
    }

    let mut iter = parser.samples()?;
    let mut samples = 0u64;
    while let Some(sample) = iter.next() {
        session.record_sample(sample).await?;
        samples += 1;
        progress.set_position(iter.records_read());
    }
    let (records_read, skipped) = (iter.records_read(), iter.skipped());
    progress.finish_and_clear();

    let outcome = session.stop().await?;
    Ok(ImportSummary {
        report: parser.report().clone(),
        records_read,
        skipped,
        samples,
        outcome,
    })
}

fn progress_bar(total: u64, plain: bool) -> ProgressBar {
    if plain || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} records ({eta})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Run the `triplog import` command.
pub async fn run_import(
    config: &TriplogConfig,
    args: ImportArgs,
    plain: bool,
) -> Result<(), TriplogError> {
    let fields = FieldMap::from_config(&config.ingest)?;
    let parser = TelemetryIngestParser::open(RecordSource::File(args.file.clone()), fields)?
        .with_progress_every(config.ingest.progress_every);

    let app = App::open(config).await?;
    let progress = progress_bar(parser.report().total_records, plain);
    let result = import_samples(&app.controller, &parser, &args, &progress).await;
    app.close().await?;
    let summary = result?;

    print_summary(&args, &summary);
    Ok(())
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    let items: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

fn print_summary(args: &ImportArgs, summary: &ImportSummary) {
    println!();
    println!("  triplog import");
    println!("  {}", "-".repeat(35));
    println!("    File:          {}", args.file.display());
    println!("    Origin:        {}", args.origin);
    println!(
        "    Records:       {} read, {} skipped, {} samples",
        summary.records_read, summary.skipped, summary.samples
    );
    println!(
        "    Missing:       {}",
        join(&summary.report.missing_fields)
    );
    println!(
        "    Not supported: {}",
        join(&summary.report.not_supported_fields)
    );
    match &summary.outcome {
        StopOutcome::Terminated(record) => {
            println!("    Session:       {} TERMINATED", record.uid);
            println!("    Distance:      {:.3} km", record.distance);
            println!("    Duration:      {} s", record.duration);
        }
        StopOutcome::Discarded { uid, diagonal_km } => {
            println!("    Session:       {uid} discarded ({diagonal_km:.3} km spread)");
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use triplog_config::TripConfig;
    use triplog_core::SessionStore;
    use triplog_session::AddressResolver;
    use triplog_storage::DocumentSessionStore;
    use triplog_test_utils::paris_trip;

    async fn controller() -> TripController {
        let store: Arc<dyn SessionStore> = Arc::new(DocumentSessionStore::new());
        store.initialize().await.unwrap();
        TripController::new(store, AddressResolver::disabled(), &TripConfig::default())
    }

    fn args(recreate: bool) -> ImportArgs {
        ImportArgs {
            file: PathBuf::from("trackLog.csv"),
            origin: "trackLog-2016-mai-11_20-23-42".into(),
            start: None,
            recreate,
        }
    }

    fn parser() -> TelemetryIngestParser {
        TelemetryIngestParser::open(
            RecordSource::Memory(paris_trip().to_csv()),
            FieldMap::torque(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn import_terminates_paris_trip() {
        let controller = controller().await;
        let summary = import_samples(&controller, &parser(), &args(false), &ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(summary.records_read, 3);
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.skipped, 0);
        let StopOutcome::Terminated(record) = summary.outcome else {
            panic!("expected terminated outcome");
        };
        assert_eq!(record.duration, 20.0);
        assert!(record.first_address.is_none());
    }

    #[tokio::test]
    async fn reimport_requires_recreate() {
        let controller = controller().await;
        let hidden = ProgressBar::hidden();
        import_samples(&controller, &parser(), &args(false), &hidden)
            .await
            .unwrap();

        let err = import_samples(&controller, &parser(), &args(false), &hidden)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TriplogError::InvalidStateTransition {
                from: SessionStatus::Terminated,
                ..
            }
        ));

        let summary = import_samples(&controller, &parser(), &args(true), &hidden)
            .await
            .unwrap();
        assert!(matches!(summary.outcome, StopOutcome::Terminated(_)));
        assert_eq!(controller.list().await.unwrap().len(), 1);
    }
}
