use anyhow::{bail, Context, Result};
use clap::Parser;

mod cli;
mod enrich;
mod lm;
mod pipeline;
mod progress;
mod prompt;
mod table;
mod vocab;

use crate::pipeline::PipelineOptions;
use crate::progress::{ConsolePresenter, NullSink, ProgressEvent, ProgressSink};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.verbose);

    let rows = table::read_rows(&args.input)
        .with_context(|| format!("load input table {}", args.input.display()))?;
    if rows.is_empty() {
        bail!("input table {} has no rows", args.input.display());
    }
    tracing::info!(rows = rows.len(), input = %args.input.display(), "loaded ledger");

    let client = lm::OllamaClient::new(args.endpoint);
    let (sink, presenter): (Box<dyn ProgressSink>, Option<ConsolePresenter>) = if args.quiet {
        (Box::new(NullSink), None)
    } else {
        let (sink, presenter) = progress::console();
        (Box::new(sink), Some(presenter))
    };
    let options = PipelineOptions {
        model: args.model,
        concurrency: args.concurrency,
    };
    sink.publish(ProgressEvent::Message(format!(
        "Enriching {} rows with {}",
        rows.len(),
        options.model
    )));

    let enriched = pipeline::run(&rows, &client, sink.as_ref(), &options);
    drop(sink);
    if let Some(presenter) = presenter {
        presenter.finish();
    }
    let enriched = enriched?;

    table::write_rows(&args.output, &enriched)
        .with_context(|| format!("save enriched table {}", args.output.display()))?;
    tracing::info!(
        enriched = enriched.len(),
        dropped = rows.len() - enriched.len(),
        output = %args.output.display(),
        "enriched ledger saved"
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
