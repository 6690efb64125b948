use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

/// A time budget for one pipeline stage.
///
/// The budget is measured from a start instant. Pipeline stages all start from
/// the request's arrival, so time spent in an earlier stage counts against a
/// later one. On expiry the wrapped future is dropped, which cancels whatever
/// network read or store write it was doing.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    stage: &'static str,
    started: Instant,
    budget: Duration,
}

impl Deadline {
    /// A budget that starts now.
    pub fn new(stage: &'static str, budget: Duration) -> Self {
        Self::starting_at(stage, Instant::now(), budget)
    }

    pub fn starting_at(stage: &'static str, started: Instant, budget: Duration) -> Self {
        Self {
            stage,
            started,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn expires_at(&self) -> Instant {
        self.started + self.budget
    }

    /// Runs `fut` until it completes or the deadline passes.
    ///
    /// `Err` carries the budget and is returned only when the deadline has
    /// actually passed; errors produced by `fut` itself come back as `Ok(Err(_))`.
    /// A deadline that has already passed does not start `fut` at all.
    pub async fn run<F, T>(self, fut: F) -> Result<T, Duration>
    where
        F: Future<Output = T>,
    {
        if Instant::now() >= self.expires_at() {
            debug!(stage = self.stage, budget = ?self.budget(), "Stage deadline passed before start");
            return Err(self.budget());
        }

        match timeout_at(self.expires_at(), fut).await {
            Ok(value) => {
                debug!(stage = self.stage, elapsed = ?self.started.elapsed(), "Stage finished");
                Ok(value)
            }
            Err(_) => {
                debug!(stage = self.stage, budget = ?self.budget(), "Stage deadline elapsed");
                Err(self.budget())
            }
        }
    }
}
