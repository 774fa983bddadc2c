//! Single-call request dispatch for presentation layers.
//!
//! Every request goes in as an action tag plus an optional text payload and
//! comes back as a [`Response`]. Failures never escape as panics or `Err`s:
//! they become `{"Error": "<message>"}` values.

use std::{fmt, str::FromStr};

use log::{debug, warn};
use serde::{ser::SerializeMap, Serialize, Serializer};

use super::ReturnsDesk;
use crate::{
    error::{ErrorCategory, ReturnsError},
    models::{LoadSummary, RecordSet},
    report::ReportOutcome,
};

/// Actions accepted by [`ReturnsDesk::handle_request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Payload: CSV path.
    LoadCsv,
    /// Payload: free-text return description.
    Insert,
    /// No payload.
    Query,
    /// Payload: optional output path.
    Report,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::LoadCsv => "load_csv",
            Action::Insert => "insert",
            Action::Query => "query",
            Action::Report => "report",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ReturnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "load_csv" => Ok(Action::LoadCsv),
            "insert" => Ok(Action::Insert),
            "query" => Ok(Action::Query),
            "report" => Ok(Action::Report),
            other => Err(ReturnsError::invalid_input("action")
                .with_reason(format!("Unknown action '{other}'"))),
        }
    }
}

/// Outcome of a dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Full record set, newest first.
    Table(RecordSet),
    /// CSV load result.
    Loaded(LoadSummary),
    /// Report written.
    Report(ReportOutcome),
    /// Structured failure.
    Error {
        message: String,
        category: ErrorCategory,
    },
    /// Unrecognized action tag.
    Unknown,
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. } | Response::Unknown)
    }

    /// Human-readable error message, if this is a failure.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Error { message, .. } => Some(message),
            Response::Unknown => Some("Error"),
            _ => None,
        }
    }
}

impl From<ReturnsError> for Response {
    fn from(error: ReturnsError) -> Self {
        Response::Error {
            message: error.to_string(),
            category: error.category(),
        }
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Response::Table(records) => records.serialize(serializer),
            Response::Loaded(summary) => summary.serialize(serializer),
            Response::Report(outcome) => outcome.serialize(serializer),
            Response::Error { message, .. } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Error", message)?;
                map.end()
            }
            Response::Unknown => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Error", &Option::<String>::None)?;
                map.end()
            }
        }
    }
}

impl ReturnsDesk {
    /// Dispatches one request by action tag.
    ///
    /// Unknown tags yield [`Response::Unknown`].
    pub fn handle_request(&self, action: &str, payload: Option<&str>) -> Response {
        match action.parse::<Action>() {
            Ok(action) => self.dispatch(action, payload),
            Err(_) => {
                warn!("Unknown action '{action}'");
                Response::Unknown
            }
        }
    }

    /// Dispatches one typed request.
    pub fn dispatch(&self, action: Action, payload: Option<&str>) -> Response {
        debug!("Dispatching {action}");
        let result = match action {
            Action::LoadCsv => self.load_csv(payload.unwrap_or_default()).map(Response::Loaded),
            Action::Insert => self.insert_text(payload.unwrap_or_default()).map(Response::Table),
            Action::Query => self.query().map(Response::Table),
            Action::Report => self.report(payload).map(Response::Report),
        };
        result.unwrap_or_else(|error| {
            warn!("{action} failed: {error}");
            Response::from(error)
        })
    }
}
