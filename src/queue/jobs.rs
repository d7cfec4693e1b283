use serde::Serialize;

use crate::hh::FetchError;

/// Result of one pooled job, tagged with the id it ran for
#[derive(Debug)]
pub struct JobOutcome<T> {
    pub id: String,
    pub result: Result<T, FetchError>,
}

impl<T> JobOutcome<T> {
    pub fn new(id: impl Into<String>, result: Result<T, FetchError>) -> Self {
        Self {
            id: id.into(),
            result,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// A failed job as reported to API clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub id: String,
    pub error: String,
}

impl JobFailure {
    pub fn new(id: impl Into<String>, error: &FetchError) -> Self {
        Self {
            id: id.into(),
            error: error.to_string(),
        }
    }
}
