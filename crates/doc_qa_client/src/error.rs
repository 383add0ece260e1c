//! Error taxonomy for the request/response lifecycle.

use std::time::Duration;

use crate::turn::TurnStatus;

/// Message shown to the user when a batch cannot be submitted.
pub const VALIDATION_NOTICE: &str = "Please attach PDF(s) and enter a prompt.";

/// The batch is not submittable. No turn is created and nothing is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", VALIDATION_NOTICE)]
    NoDocuments,
    #[error("{}", VALIDATION_NOTICE)]
    EmptyQuestion,
}

/// Failure before any body fragment was read.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("HTTP error: status {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },
    #[error("timed out after {0:?} waiting for the server to respond")]
    TimedOut(Duration),
    #[error("request failed: {0}")]
    Request(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({d})"),
        None => String::new(),
    }
}

/// A byte sequence that is not valid UTF-8, as opposed to one that is merely
/// split across fragments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed UTF-8 at byte {offset} of the response body")]
    Malformed { offset: u64 },
    #[error("response body ended inside a multi-byte character ({pending} byte(s) pending)")]
    Incomplete { pending: usize },
}

/// Failure while reading the body after the stream started.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream interrupted: {0}")]
    Transport(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),
}

/// `submit` was refused and no turn was started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a question is already in progress")]
    Busy,
}

/// A mutation was attempted in a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} a turn in state {from:?}")]
pub struct InvalidTransition {
    pub from: TurnStatus,
    pub action: &'static str,
}

/// Renders an error together with its `source()` chain, which is where
/// reqwest keeps the useful part ("connection refused", ...).
pub(crate) fn describe(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
