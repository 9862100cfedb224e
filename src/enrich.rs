//! Per-row enrichment orchestration.

use crate::lm::{InferenceClient, LmFields};
use crate::progress::ProgressTracker;
use crate::prompt;
use crate::table::{EnrichedRow, Row};
use crate::vocab::Vocabularies;

/// Enrich one row end to end.
///
/// Takes a vocabulary snapshot, builds the prompt, and submits it. A failed
/// call drops the row: log a diagnostic, return `None`, touch nothing else.
/// A successful call formats the amount, feeds the result back into the
/// shared vocabularies, and records the row as done. Vocabulary mutation and
/// progress emission are the only side effects, and both are safe alongside
/// other rows' calls.
pub fn enrich_row(
    row: &Row,
    index: usize,
    vocab: &Vocabularies,
    client: &dyn InferenceClient,
    model: &str,
    progress: &ProgressTracker<'_>,
) -> Option<EnrichedRow> {
    let snapshot = vocab.snapshot();
    let prompt = prompt::build(&row.prompt_text(), &snapshot);

    let fields = match client.submit(model, &prompt) {
        Ok(fields) => fields,
        Err(err) => {
            tracing::warn!(row = index, error = %err, "row enrichment failed");
            return None;
        }
    };

    let amount = format_amount(&fields.amount, index);
    vocab.categories.add(&fields.category);
    vocab.payees.add(&fields.payee);
    vocab.notes.add(&fields.notes);
    progress.row_done();

    let LmFields {
        date,
        payee,
        notes,
        category,
        ..
    } = fields;
    Some(EnrichedRow {
        date,
        amount,
        payee,
        notes,
        categories: category,
    })
}

/// Render the model's amount as a 2-decimal string.
///
/// An amount that cannot be read as a number degrades to `0.00` instead of
/// dropping the row; structural failures drop rows, a single bad field does
/// not.
fn format_amount(amount: &serde_json::Value, index: usize) -> String {
    let parsed = match amount {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(value) => format!("{value:.2}"),
        None => {
            tracing::warn!(row = index, ?amount, "amount not numeric, defaulting to 0.00");
            "0.00".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::LmError;
    use crate::progress::testing::RecordingSink;
    use serde_json::json;

    struct FixedClient {
        fields: LmFields,
    }

    impl InferenceClient for FixedClient {
        fn submit(&self, _model: &str, _prompt: &str) -> Result<LmFields, LmError> {
            Ok(self.fields.clone())
        }
    }

    struct FailingClient;

    impl InferenceClient for FailingClient {
        fn submit(&self, _model: &str, _prompt: &str) -> Result<LmFields, LmError> {
            Err(LmError::Envelope("missing response field".to_string()))
        }
    }

    fn sample_row() -> Row {
        Row {
            date: "2024-04-03".to_string(),
            amount: "1100".to_string(),
            description: "Pix transfer from Jane Doe".to_string(),
        }
    }

    fn fields(amount: serde_json::Value) -> LmFields {
        LmFields {
            date: "2024-04-03".to_string(),
            payee: "Jane Doe".to_string(),
            notes: "Pix transfer".to_string(),
            category: "income,transfer".to_string(),
            amount,
        }
    }

    #[test]
    fn success_formats_amount_and_feeds_vocabularies() {
        let vocab = Vocabularies::new();
        let sink = RecordingSink::default();
        let progress = ProgressTracker::new(1, &sink);
        let client = FixedClient {
            fields: fields(json!("1100")),
        };

        let enriched = enrich_row(&sample_row(), 0, &vocab, &client, "mistral", &progress)
            .expect("row enriched");
        assert_eq!(enriched.amount, "1100.00");
        assert_eq!(enriched.categories, "income,transfer");
        assert_eq!(enriched.payee, "Jane Doe");
        assert!(vocab.categories.contains("income,transfer"));
        assert!(vocab.payees.contains("Jane Doe"));
        assert!(vocab.notes.contains("Pix transfer"));
        assert_eq!(progress.completed(), 1);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn failure_drops_the_row_and_touches_nothing() {
        let vocab = Vocabularies::new();
        let sink = RecordingSink::default();
        let progress = ProgressTracker::new(1, &sink);

        let enriched = enrich_row(&sample_row(), 0, &vocab, &FailingClient, "mistral", &progress);
        assert!(enriched.is_none());
        assert!(vocab.categories.is_empty());
        assert!(vocab.payees.is_empty());
        assert!(vocab.notes.is_empty());
        assert_eq!(progress.completed(), 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn unparsable_amount_defaults_instead_of_dropping() {
        let vocab = Vocabularies::new();
        let sink = RecordingSink::default();
        let progress = ProgressTracker::new(1, &sink);
        let client = FixedClient {
            fields: fields(json!("about a thousand")),
        };

        let enriched = enrich_row(&sample_row(), 0, &vocab, &client, "mistral", &progress)
            .expect("row kept");
        assert_eq!(enriched.amount, "0.00");
    }

    #[test]
    fn numeric_amount_rounds_to_two_decimals() {
        assert_eq!(format_amount(&json!(1100), 0), "1100.00");
        assert_eq!(format_amount(&json!(42.567), 0), "42.57");
        assert_eq!(format_amount(&json!("-19.5"), 0), "-19.50");
        assert_eq!(format_amount(&json!(null), 0), "0.00");
    }

    #[test]
    fn empty_fields_never_enter_the_vocabularies() {
        let vocab = Vocabularies::new();
        let sink = RecordingSink::default();
        let progress = ProgressTracker::new(1, &sink);
        let client = FixedClient {
            fields: LmFields {
                date: String::new(),
                payee: String::new(),
                notes: String::new(),
                category: String::new(),
                amount: json!(5),
            },
        };

        enrich_row(&sample_row(), 0, &vocab, &client, "mistral", &progress).expect("row kept");
        assert!(vocab.categories.is_empty());
        assert!(vocab.payees.is_empty());
        assert!(vocab.notes.is_empty());
    }
}
