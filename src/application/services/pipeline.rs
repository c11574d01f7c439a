use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::generator::{AlertGenerator, GenerateError};
use super::uploader::{AlertUploader, UploadError};
use crate::domain::ports::data_source::DataSourceError;
use crate::domain::ports::sink::DeliveryError;
use crate::domain::value_objects::run_state::RunState;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILED: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error("illegal run transition {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Delivered { alerts: usize, attempts: u32 },
    Failed(PipelineError),
    /// A newer run took over; `during` is the state the run was in.
    Cancelled { during: RunState },
}

/// Summary of one end-to-end run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: RunState,
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Process exit code for the scheduler: non-zero only for failures.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self.outcome {
            RunOutcome::Delivered { .. } | RunOutcome::Cancelled { .. } => EXIT_OK,
            RunOutcome::Failed(_) => EXIT_FAILED,
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Failed(_))
    }
}

/// Generate then upload, once.
pub struct Pipeline<'a> {
    generator: AlertGenerator<'a>,
    uploader: AlertUploader<'a>,
}

struct Tracker {
    run_id: Uuid,
    state: RunState,
}

impl Tracker {
    fn advance(&mut self, next: RunState) -> Result<(), PipelineError> {
        self.state = self
            .state
            .advance(next)
            .map_err(|(from, to)| PipelineError::InvalidTransition { from, to })?;
        tracing::debug!(run_id = %self.run_id, state = %self.state, "run state");
        Ok(())
    }

    fn finish(mut self, outcome: RunOutcome) -> RunReport {
        let terminal = match &outcome {
            RunOutcome::Delivered { .. } => RunState::Delivered,
            RunOutcome::Failed(_) => RunState::Failed,
            RunOutcome::Cancelled { .. } => RunState::Cancelled,
        };
        if let Err(e) = self.advance(terminal) {
            tracing::error!(run_id = %self.run_id, "{e}");
            self.state = RunState::Failed;
            return RunReport {
                run_id: self.run_id,
                state: self.state,
                outcome: RunOutcome::Failed(e),
            };
        }
        RunReport {
            run_id: self.run_id,
            state: self.state,
            outcome,
        }
    }

    fn cancelled(self) -> RunReport {
        let during = self.state;
        tracing::info!(run_id = %self.run_id, during = %during, "run superseded, stopping");
        self.finish(RunOutcome::Cancelled { during })
    }
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub const fn new(generator: AlertGenerator<'a>, uploader: AlertUploader<'a>) -> Self {
        Self {
            generator,
            uploader,
        }
    }

    /// Run the pipeline to a terminal state. Errors are reported through the
    /// returned `RunReport`, never swallowed.
    pub async fn run_once(&self, run_id: Uuid, cancel: &CancellationToken) -> RunReport {
        let mut tracker = Tracker {
            run_id,
            state: RunState::Idle,
        };
        tracing::info!(run_id = %run_id, "run started");

        if let Err(e) = tracker.advance(RunState::Generating) {
            return tracker.finish(RunOutcome::Failed(e));
        }
        let batch = match self.generator.generate(cancel).await {
            Ok(batch) => batch,
            Err(GenerateError::Cancelled) => return tracker.cancelled(),
            Err(GenerateError::DataSource(e)) => {
                tracing::error!(run_id = %run_id, error = %e, "generation failed");
                return tracker.finish(RunOutcome::Failed(e.into()));
            }
        };

        for next in [RunState::Generated, RunState::Uploading] {
            if let Err(e) = tracker.advance(next) {
                return tracker.finish(RunOutcome::Failed(e));
            }
        }

        match self.uploader.upload(&batch, cancel).await {
            Ok(result) => {
                tracing::info!(
                    run_id = %run_id,
                    alerts = result.delivered,
                    attempts = result.attempts,
                    "run delivered"
                );
                tracker.finish(RunOutcome::Delivered {
                    alerts: result.delivered,
                    attempts: result.attempts,
                })
            }
            Err(UploadError::Cancelled) => tracker.cancelled(),
            Err(UploadError::Delivery(e)) => {
                tracing::error!(run_id = %run_id, error = %e, "upload failed");
                tracker.finish(RunOutcome::Failed(e.into()))
            }
        }
    }
}
