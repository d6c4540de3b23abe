use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::discovery::canonical_path;
use crate::pipeline::convert_file;
use crate::pkg_config::ConverterConfig;
use crate::report::BatchSummary;

fn progress_style_bar() -> ProgressStyle {
    ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Convert every file with bounded concurrency. One task per unique path;
/// counts come from the joined task results only.
pub async fn process_batch(
    files: Vec<PathBuf>,
    cfg: Arc<ConverterConfig>,
    dry_run: bool,
) -> BatchSummary {
    // One task per file on disk, however the caller spelled its path
    let unique: BTreeSet<PathBuf> = files.iter().map(|p| canonical_path(p)).collect();
    // A zero limit would block every task on the semaphore
    let concurrent = cfg.batch.concurrent_limit.max(1);
    info!(
        "Processing {} file(s) with concurrency {}{}",
        unique.len(),
        concurrent,
        if dry_run { " (dry run)" } else { "" }
    );

    // Overall bar; per-file lines are printed above it
    let m = MultiProgress::new();
    let overall = m.add(ProgressBar::new(unique.len() as u64));
    overall.set_style(progress_style_bar());
    overall.set_message("converting");

    let sem = Arc::new(Semaphore::new(concurrent));
    let mut handles = Vec::with_capacity(unique.len());

    for path in unique {
        let permit = sem.clone();
        let cfg = cfg.clone();
        let overall = overall.clone();
        let m = m.clone();

        handles.push(tokio::spawn(async move {
            // Held until the report is printed
            let _permit = permit.acquire_owned().await.ok()?;
            // Parsing and file IO are blocking
            let report = tokio::task::spawn_blocking(move || convert_file(&path, &cfg, dry_run))
                .await
                .ok()?;
            // Print without tearing the progress bar
            m.suspend(|| println!("{}", report.status_line()));
            overall.inc(1);
            Some(report)
        }));
    }

    // Counts come only from joined results; a panicked task still counts as failed
    let mut summary = BatchSummary::default();
    for handle in handles {
        match handle.await {
            Ok(Some(report)) => summary.record(report),
            Ok(None) => summary.record_lost_task(),
            Err(e) => {
                error!("Conversion task panicked: {}", e);
                summary.record_lost_task();
            }
        }
    }

    overall.finish_with_message("done");
    info!("{}", summary);
    summary
}
