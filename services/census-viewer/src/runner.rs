//! Drives a [`Session`] through a scenario and records each step's outcome.

use std::rc::Rc;
use std::time::Instant;

use census_common::{BoundingBox, ChoroplethResult};
use classifier::{ColorClass, Legend};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use view_engine::metrics::FetchStats;
use view_engine::{CensusSource, RefreshOutcome, Session, ViewEvent, ViewerConfig};

use crate::scenario::Scenario;
use crate::sink::TracingSink;

/// What became of one fetching step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepResult {
    Applied {
        sequence: u64,
        level: String,
        stat: String,
        features: usize,
        low_population: usize,
    },
    Superseded {
        sequence: u64,
        latest: u64,
    },
    Failed {
        kind: String,
        message: String,
    },
}

impl StepResult {
    fn from_outcome(outcome: ChoroplethResult<RefreshOutcome>) -> Self {
        match outcome {
            Ok(RefreshOutcome::Applied(layer)) => StepResult::Applied {
                sequence: layer.request.sequence,
                level: layer.request.level.level_id.clone(),
                stat: layer.request.stat.id.clone(),
                features: layer.len(),
                low_population: layer
                    .classified
                    .classes
                    .iter()
                    .filter(|c| **c == ColorClass::LowPopulation)
                    .count(),
            },
            Ok(RefreshOutcome::Superseded { sequence, latest }) => StepResult::Superseded { sequence, latest },
            Err(err) => StepResult::Failed {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepResult::Applied { .. } => "applied",
            StepResult::Superseded { .. } => "superseded",
            StepResult::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub step: String,
    #[serde(flatten)]
    pub result: StepResult,
}

/// The view after the last step.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSummary {
    pub zoom: u8,
    pub level: String,
    pub stat: String,
    pub bounds: BoundingBox,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub overlap: bool,
    pub duration_ms: f64,
    pub steps: Vec<StepOutcome>,
    pub stats: FetchStats,
    pub final_view: ViewSummary,
    /// Legend of the layer left on screen
    pub legend: Option<Legend>,
}

impl RunReport {
    pub fn count(&self, label: &str) -> usize {
        self.steps.iter().filter(|s| s.result.label() == label).count()
    }
}

/// Runs scenarios against one session.
///
/// Overlapping scenarios spawn each step with `spawn_local`, so `run` must be
/// awaited inside a `LocalSet`.
pub struct ScenarioRunner<S> {
    session: Rc<Session<S, TracingSink>>,
}

impl<S: CensusSource + 'static> ScenarioRunner<S> {
    pub async fn bootstrap(source: S, config: &ViewerConfig) -> ChoroplethResult<Self> {
        let session = Session::bootstrap_with_sink(source, config, TracingSink).await?;
        Ok(Self {
            session: Rc::new(session),
        })
    }

    pub fn session(&self) -> &Session<S, TracingSink> {
        &self.session
    }

    pub async fn run(&self, scenario: &Scenario) -> RunReport {
        info!(
            scenario = %scenario.name,
            steps = scenario.steps.len(),
            overlap = scenario.overlap,
            "Running scenario"
        );
        let start = Instant::now();

        let mut outcomes = Vec::with_capacity(scenario.fetch_steps());
        let mut pending: Vec<(usize, String, JoinHandle<ChoroplethResult<RefreshOutcome>>)> = Vec::new();

        for (index, step) in scenario.steps.iter().enumerate() {
            if let Some(pause) = step.pause() {
                debug!(ms = pause.as_millis() as u64, "Pausing");
                tokio::time::sleep(pause).await;
                continue;
            }

            let event = step.event(self.session.resolver(), scenario.viewport);
            if scenario.overlap {
                let session = Rc::clone(&self.session);
                let handle = tokio::task::spawn_local(async move { dispatch(&session, event).await });
                pending.push((index, step.describe(), handle));
                // Let the step issue its request before the next one.
                tokio::task::yield_now().await;
            } else {
                let result = StepResult::from_outcome(dispatch(&self.session, event).await);
                outcomes.push(StepOutcome {
                    index,
                    step: step.describe(),
                    result,
                });
            }
        }

        let (labels, handles): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .map(|(index, step, handle)| ((index, step), handle))
            .unzip();
        for ((index, step), joined) in labels.into_iter().zip(futures::future::join_all(handles).await) {
            let result = match joined {
                Ok(outcome) => StepResult::from_outcome(outcome),
                Err(err) => StepResult::Failed {
                    kind: "Aborted".to_string(),
                    message: err.to_string(),
                },
            };
            outcomes.push(StepOutcome { index, step, result });
        }
        outcomes.sort_by_key(|o| o.index);

        let view = self.session.view();
        let report = RunReport {
            scenario: scenario.name.clone(),
            overlap: scenario.overlap,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            steps: outcomes,
            stats: self.session.coordinator().stats(),
            final_view: ViewSummary {
                zoom: view.zoom(),
                level: view.level().level_id.clone(),
                stat: view.stat_id().to_string(),
                bounds: view.bounds(),
            },
            legend: self
                .session
                .coordinator()
                .rendered()
                .map(|layer| layer.legend().clone()),
        };

        info!(
            scenario = %report.scenario,
            applied = report.count("applied"),
            superseded = report.count("superseded"),
            failed = report.count("failed"),
            duration_ms = report.duration_ms,
            "Scenario finished"
        );
        report
    }
}

async fn dispatch<S: CensusSource>(
    session: &Session<S, TracingSink>,
    event: Option<ViewEvent>,
) -> ChoroplethResult<RefreshOutcome> {
    match event {
        Some(event) => session.handle(event).await,
        None => session.refresh().await,
    }
}
