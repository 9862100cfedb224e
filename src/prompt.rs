//! Prompt assembly for the classification call.

use crate::vocab::VocabularySnapshot;
use std::fmt::Write as _;

/// Build the classification prompt for one row.
///
/// Pure function of the row text and the vocabulary snapshot. The
/// accumulated vocabularies are appended as advisory hints so the model
/// reuses names it has already produced; an empty set contributes no hint
/// line. No validation happens here.
pub fn build(row_text: &str, vocab: &VocabularySnapshot) -> String {
    let mut prompt = format!(
        "Analyze the following transaction description to extract structured information:\n\n\
         Description: '{row_text}'\n\n\
         Instructions:\n\
         1. Extract key data points relevant to a financial transaction.\n\
         2. Format this information into a JSON object with specific fields and formats.\n\
         3. Ensure all fields are accurately populated based on the description provided:\n\
         \x20  - 'date' should be formatted as 'YYYY-MM-DD'.\n\
         \x20  - 'payee' should clearly identify the entity involved in the transaction.\n\
         \x20  - 'notes' should include any descriptive information about the transaction.\n\
         \x20  - 'category' should list transaction categories, separated by commas without additional spaces.\n\
         \x20  - 'amount' should be represented as a numeric value with two decimal places.\n\n\
         Format Requirements:\n\
         Return a single JSON object with exactly the keys 'date', 'payee', 'notes', 'category',\n\
         and 'amount', with no deviation in key names or data types. If any field has no\n\
         corresponding data in the description, return it as an empty string.\n"
    );

    append_hints(&mut prompt, "categories", &vocab.categories);
    append_hints(&mut prompt, "payees", &vocab.payees);
    append_hints(&mut prompt, "notes", &vocab.notes);

    prompt.trim_end().to_string()
}

fn append_hints(prompt: &mut String, kind: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = write!(prompt, "\nExisting {kind}: [{}].", items.join(", "));
}
