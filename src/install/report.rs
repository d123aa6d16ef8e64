//! Installation report: the sequencer's only output

use serde::Serialize;
use std::fmt;

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Running,
    Success,
    Error,
    Skipped,
    Info,
}

impl StepOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            StepOutcome::Running => "running",
            StepOutcome::Success => "success",
            StepOutcome::Error => "error",
            StepOutcome::Skipped => "skipped",
            StepOutcome::Info => "info",
        }
    }
}

/// One line of the report. Serialized as `{"step", "status", "message"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    #[serde(rename = "step")]
    pub label: String,
    #[serde(rename = "status")]
    pub outcome: StepOutcome,
    pub message: String,
}

impl StepReport {
    pub fn new(label: impl Into<String>, outcome: StepOutcome, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            outcome,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }
}

/// Complete result of one installer invocation.
///
/// Serialized as `{"status", "message", "steps"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallationReport {
    #[serde(rename = "status")]
    pub overall: Outcome,
    #[serde(rename = "message")]
    pub summary: String,
    pub steps: Vec<StepReport>,
}

impl InstallationReport {
    pub fn is_success(&self) -> bool {
        self.overall == Outcome::Success
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Steps with the given outcome.
    pub fn steps_with(&self, outcome: StepOutcome) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(move |s| s.outcome == outcome)
    }
}

impl fmt::Display for InstallationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "[{:>7}] {}: {}", step.outcome.as_str(), step.label, step.message)?;
        }
        write!(f, "{}: {}", self.overall.as_str(), self.summary)
    }
}

/// Builds the step list in order.
///
/// A step may be opened as `Running` and replaced in place before the next
/// step starts; [`ReportBuilder::finish`] never lets a `Running` step escape.
#[derive(Debug, Default)]
pub(crate) struct ReportBuilder {
    steps: Vec<StepReport>,
}

impl ReportBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, label: &str, outcome: StepOutcome, message: impl Into<String>) {
        let step = StepReport::new(label, outcome, message);
        log_step(&step);
        self.steps.push(step);
    }

    /// Append a `Running` placeholder and return its slot.
    pub(crate) fn begin(&mut self, label: &str, message: impl Into<String>) -> usize {
        self.steps.push(StepReport::new(label, StepOutcome::Running, message));
        self.steps.len() - 1
    }

    /// Replace the placeholder at `slot` with its final outcome.
    pub(crate) fn finalize(&mut self, slot: usize, outcome: StepOutcome, message: impl Into<String>) {
        if let Some(step) = self.steps.get_mut(slot) {
            step.outcome = outcome;
            step.message = message.into();
            log_step(step);
        }
    }

    pub(crate) fn has_error(&self) -> bool {
        self.steps.iter().any(|s| s.outcome == StepOutcome::Error)
    }

    pub(crate) fn finish(mut self, overall: Outcome, summary: &str) -> InstallationReport {
        for step in self.steps.iter_mut().filter(|s| s.outcome == StepOutcome::Running) {
            step.outcome = StepOutcome::Error;
            step.message = format!("{} (interrupted)", step.message);
        }

        InstallationReport {
            overall,
            summary: summary.to_string(),
            steps: self.steps,
        }
    }
}

fn log_step(step: &StepReport) {
    match step.outcome {
        StepOutcome::Error => log::warn!("{}: {}", step.label, step.message),
        _ => log::info!("{}: {}", step.label, step.message),
    }
}
