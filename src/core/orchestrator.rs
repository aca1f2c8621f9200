use crate::domain::model::{PipelineState, StageOutcome, StageReport};
use crate::domain::ports::Stage;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Time condition that must hold before the first stage starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gate {
    Immediate,
    /// Opens a fixed delay after the activation instant.
    Delay { seconds: u64 },
    /// Opens at the first occurrence of the weekday and UTC time at or
    /// after the activation instant.
    Weekly { weekday: Weekday, at: NaiveTime },
}

/// Longest accepted `Delay` gate.
pub const MAX_GATE_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

impl Default for Gate {
    fn default() -> Self {
        Gate::Immediate
    }
}

impl Gate {
    pub fn opens_at(&self, activation: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Gate::Immediate => activation,
            Gate::Delay { seconds } => i64::try_from(*seconds)
                .ok()
                .and_then(ChronoDuration::try_seconds)
                .and_then(|delta| activation.checked_add_signed(delta))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Gate::Weekly { weekday, at } => {
                let days_ahead = (7 + weekday.num_days_from_monday() as i64
                    - activation.weekday().num_days_from_monday() as i64)
                    % 7;
                let opening = (activation.date_naive() + ChronoDuration::days(days_ahead))
                    .and_time(*at)
                    .and_utc();
                if opening >= activation {
                    opening
                } else {
                    opening + ChronoDuration::days(7)
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Gate::Delay { seconds } if *seconds > MAX_GATE_DELAY_SECS => {
                Err(EtlError::InvalidConfigValueError {
                    field: "gate.seconds".to_string(),
                    value: seconds.to_string(),
                    reason: format!("Delay must be at most {} seconds", MAX_GATE_DELAY_SECS),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Uniform stage retry policy: `retries` extra attempts, `delay_seconds` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay_seconds: 300,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub pipeline: String,
    pub state: PipelineState,
    pub stages: Vec<StageReport>,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Done
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "pipeline": self.pipeline,
            "final_state": self.state.to_string(),
            "stages": self.stages,
            "total_attempts": self.stages.iter().map(|s| s.attempts).sum::<u32>(),
            "total_duration_ms": self
                .stages
                .iter()
                .map(|s| s.duration.as_millis() as u64)
                .sum::<u64>(),
        })
    }

    pub fn into_result(self) -> Result<()> {
        match self.stages.into_iter().find(|s| !s.succeeded()) {
            None => Ok(()),
            Some(report) => {
                let message = match report.outcome {
                    StageOutcome::Failed { error } => error,
                    StageOutcome::Succeeded => String::new(),
                };
                Err(EtlError::StageError {
                    stage: report.name,
                    attempts: report.attempts,
                    message,
                })
            }
        }
    }
}

/// Sequential executor: gate, then each stage in order with whole-stage retries.
pub struct PipelineOrchestrator {
    name: String,
    gate: Gate,
    retry: RetryPolicy,
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineOrchestrator {
    pub fn new(name: impl Into<String>, gate: Gate, retry: RetryPolicy) -> Self {
        Self {
            name: name.into(),
            gate,
            retry,
            stages: Vec::new(),
        }
    }

    pub fn add_stage(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    pub fn with_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.add_stage(stage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs one scheduled activation to a terminal state.
    pub async fn run(&self, activation: DateTime<Utc>) -> PipelineOutcome {
        self.transition(&PipelineState::WaitingForGate);
        self.wait_for_gate(activation).await;

        let mut reports = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            self.transition(&PipelineState::Running {
                stage: stage.name().to_string(),
            });

            let report = self.run_stage(stage.as_ref()).await;
            let succeeded = report.succeeded();
            reports.push(report);

            if !succeeded {
                let state = PipelineState::Failed {
                    stage: stage.name().to_string(),
                };
                self.transition(&state);
                return PipelineOutcome {
                    pipeline: self.name.clone(),
                    state,
                    stages: reports,
                };
            }
        }

        self.transition(&PipelineState::Done);
        PipelineOutcome {
            pipeline: self.name.clone(),
            state: PipelineState::Done,
            stages: reports,
        }
    }

    fn transition(&self, state: &PipelineState) {
        tracing::info!(pipeline = %self.name, "Pipeline state: {}", state);
    }

    async fn wait_for_gate(&self, activation: DateTime<Utc>) {
        let opens_at = self.gate.opens_at(activation);
        match (opens_at - Utc::now()).to_std() {
            Ok(wait) if !wait.is_zero() => {
                tracing::info!("Gate opens at {}; waiting {:?}", opens_at, wait);
                tokio::time::sleep(wait).await;
            }
            _ => tracing::debug!("Gate already open (opened at {})", opens_at),
        }
    }

    async fn run_stage(&self, stage: &dyn Stage) -> StageReport {
        let started = Instant::now();
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::info!(
                "▶️ Stage {} attempt {}/{}",
                stage.name(),
                attempt,
                max_attempts
            );

            match stage.run().await {
                Ok(()) => {
                    tracing::info!("✅ Stage {} succeeded", stage.name());
                    return StageReport {
                        name: stage.name().to_string(),
                        attempts: attempt,
                        outcome: StageOutcome::Succeeded,
                        duration: started.elapsed(),
                    };
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        "Stage {} attempt {} failed: {}; retrying in {:?}",
                        stage.name(),
                        attempt,
                        e,
                        self.retry.delay()
                    );
                    tokio::time::sleep(self.retry.delay()).await;
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Stage {} failed after {} attempt(s): {}",
                        stage.name(),
                        attempt,
                        e
                    );
                    return StageReport {
                        name: stage.name().to_string(),
                        attempts: attempt,
                        outcome: StageOutcome::Failed {
                            error: e.to_string(),
                        },
                        duration: started.elapsed(),
                    };
                }
            }
        }
    }
}
