//! Headless driver for the census choropleth view engine.
//!
//! Replays scripted view events against a data server, logs every layer the
//! engine would hand to the map, and reports what happened to each request.

pub mod report;
pub mod runner;
pub mod scenario;
pub mod sink;

pub use report::{ReportFormat, ResultsReport};
pub use runner::{RunReport, ScenarioRunner, StepOutcome, StepResult};
pub use scenario::{MoveTarget, Scenario, Step};
pub use sink::TracingSink;
