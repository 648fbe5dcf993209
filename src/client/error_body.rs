//! Extraction of a human-readable message from server error bodies.
//!
//! The backend reports domain errors in several shapes: `{message}`,
//! `{error: "..."}`, `{error: {message}}`, `{errors: [..]}` and
//! `{errors: {field: [..]}}`. They are modeled as one untagged union so
//! every shape is handled in a single match, with the HTTP reason phrase
//! as the fallback for anything else.

use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Message { message: String },
    ErrorObject { error: ErrorDetail },
    ErrorString { error: String },
    ErrorList { errors: Vec<String> },
    ErrorMap { errors: BTreeMap<String, Vec<String>> },
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

impl ErrorBody {
    pub fn into_message(self) -> String {
        match self {
            ErrorBody::Message { message } => message,
            ErrorBody::ErrorObject { error } => error.message,
            ErrorBody::ErrorString { error } => error,
            ErrorBody::ErrorList { errors } => errors.join(", "),
            ErrorBody::ErrorMap { errors } => errors
                .into_iter()
                .map(|(field, msgs)| format!("{}: {}", field, msgs.join(", ")))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Best-effort message for a non-2xx response body.
pub fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        let message = parsed.into_message();
        if !message.trim().is_empty() {
            return message;
        }
    }
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}
