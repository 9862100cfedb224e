//! Concurrent row enrichment runner.
//!
//! One run: spawn workers over the input rows, wait for every row to
//! succeed or fail, then rebuild the output in input order. The three
//! vocabulary sets are the only state shared between workers.

use crate::enrich::enrich_row;
use crate::lm::InferenceClient;
use crate::progress::{ProgressSink, ProgressTracker};
use crate::table::{EnrichedRow, Row};
use crate::vocab::Vocabularies;
use anyhow::{bail, Result};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Model name forwarded to the inference endpoint.
    pub model: String,
    /// Upper bound on rows enriched in parallel. `None` keeps the original
    /// one-task-per-row fan-out, which can overwhelm a single local
    /// endpoint.
    pub concurrency: Option<NonZeroUsize>,
}

/// Enrich every row and return the successful results in input order.
///
/// Workers claim row indices from a shared cursor and report
/// `(index, outcome)` pairs over a channel; tasks therefore finish in any
/// order, and the index is what puts results back in place. The scope exit
/// is the join barrier: there is no cancellation, no timeout, and no early
/// exit on failure. Failed rows are holes, dropped during compaction, and a
/// run with per-row failures still succeeds.
pub fn run(
    rows: &[Row],
    client: &dyn InferenceClient,
    sink: &dyn ProgressSink,
    options: &PipelineOptions,
) -> Result<Vec<EnrichedRow>> {
    let total = rows.len();
    if total == 0 {
        bail!("input table is empty");
    }
    let workers = options
        .concurrency
        .map(NonZeroUsize::get)
        .unwrap_or(total)
        .min(total);
    tracing::debug!(rows = total, workers, model = %options.model, "dispatching enrichment");

    let vocab = Vocabularies::new();
    let progress = ProgressTracker::new(total, sink);
    let cursor = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let cursor = &cursor;
            let vocab = &vocab;
            let progress = &progress;
            let model = options.model.as_str();
            scope.spawn(move || loop {
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(row) = rows.get(index) else {
                    break;
                };
                let outcome = enrich_row(row, index, vocab, client, model, progress);
                if tx.send((index, outcome)).is_err() {
                    break;
                }
            });
        }
    });
    drop(tx);

    // Every worker has joined; place each outcome by its original index and
    // compact, skipping the holes left by failed rows.
    let mut slots: Vec<Option<EnrichedRow>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    for (index, outcome) in rx {
        slots[index] = outcome;
    }
    let enriched: Vec<EnrichedRow> = slots.into_iter().flatten().collect();

    tracing::info!(
        rows = total,
        enriched = enriched.len(),
        dropped = total - enriched.len(),
        categories = vocab.categories.len(),
        payees = vocab.payees.len(),
        "enrichment run finished"
    );
    Ok(enriched)
}
