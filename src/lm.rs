//! Inference client for a local Ollama-style generate endpoint.
//!
//! One blocking POST per row: `{model, prompt, stream: false, format:
//! "json"}`. The response envelope carries the structured fields as a nested
//! JSON-encoded string in its `response` field. No retries and no request
//! timeout; a hung endpoint stalls the row that hit it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single row could not be enriched. The pipeline treats every kind
/// the same way (drop the row); the kinds exist for diagnostics only.
#[derive(Debug, Error)]
pub enum LmError {
    #[error("inference request failed: {0}")]
    Transport(#[from] ureq::Error),
    #[error("inference response envelope invalid: {0}")]
    Envelope(String),
    #[error("inference response payload is not valid JSON: {0}")]
    Fields(#[source] serde_json::Error),
}

/// Structured fields returned by the model for one row.
///
/// `amount` stays a raw JSON value here; models return it as a number or a
/// numeric string, and formatting (with its lossy `0.00` fallback) happens
/// downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct LmFields {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub payee: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: serde_json::Value,
}

/// The seam between the pipeline and the model backend. Implementations are
/// called from many worker threads at once.
pub trait InferenceClient: Sync {
    fn submit(&self, model: &str, prompt: &str) -> Result<LmFields, LmError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateEnvelope {
    #[serde(default)]
    response: Option<String>,
    /// Wall time reported by the endpoint, in nanoseconds.
    #[serde(default)]
    total_duration: Option<u64>,
}

/// Blocking client for the local generate endpoint.
pub struct OllamaClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl OllamaClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl InferenceClient for OllamaClient {
    fn submit(&self, model: &str, prompt: &str) -> Result<LmFields, LmError> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            format: "json",
        };
        let mut response = self.agent.post(self.endpoint.as_str()).send_json(&request)?;
        let body = response.body_mut().read_to_string()?;
        parse_generate_body(&body)
    }
}

/// Decode the generate envelope and the nested field payload.
fn parse_generate_body(body: &str) -> Result<LmFields, LmError> {
    let envelope: GenerateEnvelope = serde_json::from_str(body)
        .map_err(|err| LmError::Envelope(format!("body is not JSON: {err}")))?;
    if let Some(nanos) = envelope.total_duration {
        tracing::debug!(total_duration_ms = nanos / 1_000_000, "generate call finished");
    }
    let payload = envelope
        .response
        .ok_or_else(|| LmError::Envelope("missing response field".to_string()))?;
    serde_json::from_str(&payload).map_err(LmError::Fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope_with_nested_fields() {
        let body = r#"{
            "response": "{\"date\":\"2024-04-03\",\"payee\":\"Jane Doe\",\"notes\":\"Pix transfer\",\"category\":\"income,transfer\",\"amount\":\"1100\"}",
            "total_duration": 2500000000
        }"#;
        let fields = parse_generate_body(body).expect("parse envelope");
        assert_eq!(fields.date, "2024-04-03");
        assert_eq!(fields.payee, "Jane Doe");
        assert_eq!(fields.notes, "Pix transfer");
        assert_eq!(fields.category, "income,transfer");
        assert_eq!(fields.amount, serde_json::Value::String("1100".to_string()));
    }

    #[test]
    fn numeric_amount_survives_the_envelope() {
        let body = r#"{"response": "{\"payee\":\"Cafe\",\"amount\":42.5}"}"#;
        let fields = parse_generate_body(body).expect("parse envelope");
        assert_eq!(fields.amount, serde_json::json!(42.5));
        assert_eq!(fields.date, "");
    }

    #[test]
    fn non_json_body_is_an_envelope_error() {
        let err = parse_generate_body("<html>502</html>").expect_err("must fail");
        assert!(matches!(err, LmError::Envelope(_)), "got {err:?}");
    }

    #[test]
    fn missing_response_field_is_an_envelope_error() {
        let err = parse_generate_body(r#"{"total_duration": 10}"#).expect_err("must fail");
        assert!(matches!(err, LmError::Envelope(_)), "got {err:?}");
        assert!(err.to_string().contains("missing response field"));
    }

    #[test]
    fn non_json_payload_is_a_fields_error() {
        let err =
            parse_generate_body(r#"{"response": "not an object"}"#).expect_err("must fail");
        assert!(matches!(err, LmError::Fields(_)), "got {err:?}");
    }
}
