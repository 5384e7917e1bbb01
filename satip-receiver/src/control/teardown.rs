use std::fmt;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Sending the TEARDOWN request.
    Request,
    /// Reading the server's answer to it.
    Response,
    /// Discarding anything left on the control connection.
    Drain,
    /// Shutting down the control connection.
    Release,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TeardownStep::Request => write!(f, "request"),
            TeardownStep::Response => write!(f, "response"),
            TeardownStep::Drain => write!(f, "drain"),
            TeardownStep::Release => write!(f, "release"),
        }
    }
}

/// Outcome of each step of a teardown. Teardown is best effort, so a
/// failed step never prevents the steps after it.
#[derive(Debug, Default)]
pub struct TeardownReport {
    steps: Vec<(TeardownStep, Result<(), Error>)>,
}

impl TeardownReport {
    pub fn record(&mut self, step: TeardownStep, outcome: Result<(), Error>) {
        if let Err(error) = &outcome {
            tracing::warn!(%step, %error, "teardown step failed");
        }
        self.steps.push((step, outcome));
    }

    pub fn steps(&self) -> &[(TeardownStep, Result<(), Error>)] {
        &self.steps
    }

    pub fn performed(&self, step: TeardownStep) -> bool {
        self.steps.iter().any(|(performed, _)| *performed == step)
    }

    /// Whether every performed step succeeded.
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(|(_, outcome)| outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (TeardownStep, &Error)> {
        self.steps
            .iter()
            .filter_map(|(step, outcome)| outcome.as_ref().err().map(|error| (*step, error)))
    }
}
