use thiserror::Error;
use tracing::{debug, error};

use crate::backend_client::{BackendError, HealthInputs};

/// Fixed analysis result shown when the backend cannot be reached.
pub const ANALYSIS_UNREACHABLE: &str =
    "❌ Error: Make sure backend is running on http://127.0.0.1:8000";

/// Analysis was requested with nothing filled in. Detected locally;
/// no request is issued.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Please enter at least one field!")]
pub struct EmptyInputs;

/// An issued analysis request: a snapshot of the inputs at issue time and
/// the sequence number used to discard stale completions.
#[derive(Debug)]
pub struct AnalysisTicket {
    seq: u64,
    inputs: HealthInputs,
}

impl AnalysisTicket {
    pub fn inputs(&self) -> &HealthInputs {
        &self.inputs
    }
}

/// Lifecycle of the health analysis, exposing only the latest result.
/// Overlapping requests are allowed; settlements apply in issue order,
/// so a slow older response never overwrites a newer one.
#[derive(Debug, Default)]
pub struct AnalysisFlow {
    result: Option<String>,
    issued: u64,
    settled: u64,
    applied: u64,
}

impl AnalysisFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and issue a new analysis request. The previous result is
    /// cleared only once validation has passed.
    pub fn begin(&mut self, inputs: &HealthInputs) -> Result<AnalysisTicket, EmptyInputs> {
        if inputs.is_blank() {
            return Err(EmptyInputs);
        }

        self.result = None;
        self.issued += 1;

        Ok(AnalysisTicket {
            seq: self.issued,
            inputs: inputs.clone(),
        })
    }

    /// Record a settlement. The result field is written only if this
    /// request is newer than the last one applied.
    pub fn settle(&mut self, ticket: AnalysisTicket, outcome: Result<String, BackendError>) {
        self.settled += 1;

        if ticket.seq <= self.applied {
            debug!("discarding stale analysis settlement #{}", ticket.seq);
            return;
        }
        self.applied = ticket.seq;

        self.result = Some(match outcome {
            Ok(text) => text,
            Err(e) => {
                error!("analysis request failed: {}", e);
                ANALYSIS_UNREACHABLE.to_string()
            }
        });
    }

    pub fn in_flight(&self) -> bool {
        self.settled < self.issued
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }
}
