//! CLI argument parsing for the enrichment run.
//!
//! The CLI is intentionally thin: it names the input, the output, and the
//! inference backend, and leaves all policy to the pipeline.
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Default generate endpoint of a locally running Ollama server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";

#[derive(Parser, Debug)]
#[command(
    name = "lenrich",
    version,
    about = "Enrich transaction ledger rows with a local language model",
    after_help = "Examples:\n  lenrich --input ledger.csv --output ledger_enriched.csv\n  lenrich --input ledger.csv --output out.csv --model llama3 --concurrency 4\n  RUST_LOG=debug lenrich --input ledger.csv --output out.csv --quiet"
)]
pub struct Args {
    /// Input ledger CSV with date, amount, and description columns
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output CSV for enriched rows
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Model name passed to the inference endpoint
    #[arg(long, default_value = "mistral")]
    pub model: String,

    /// Generate endpoint of the local inference server
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Maximum rows enriched in parallel (defaults to one task per row)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<NonZeroUsize>,

    /// Suppress the progress line
    #[arg(long)]
    pub quiet: bool,

    /// Emit a verbose transcript of the run
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_model_and_endpoint() {
        let args = Args::try_parse_from(["lenrich", "--input", "in.csv", "--output", "out.csv"])
            .expect("minimal invocation parses");
        assert_eq!(args.model, "mistral");
        assert_eq!(args.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(args.concurrency, None);
        assert!(!args.quiet);
    }

    #[test]
    fn concurrency_rejects_zero() {
        let result = Args::try_parse_from([
            "lenrich",
            "--input",
            "in.csv",
            "--output",
            "out.csv",
            "--concurrency",
            "0",
        ]);
        assert!(result.is_err());
    }
}
