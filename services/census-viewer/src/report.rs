//! Console and JSON output.

use census_common::{Breaks, MapType};
use clap::ValueEnum;
use classifier::legend::format_value;
use classifier::{ClassIndex, ColorClass, Legend};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use view_engine::RenderedLayer;

use crate::runner::{RunReport, StepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Formats run results for output.
pub struct ResultsReport;

impl ResultsReport {
    /// One row per fetching step followed by the session counters.
    pub fn format_table(report: &RunReport) -> String {
        let mut steps = Table::new();
        steps
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec!["#", "Step", "Result", "Seq", "Level", "Stat", "Features"]);

        for outcome in &report.steps {
            let (seq, level, stat, features) = match &outcome.result {
                StepResult::Applied {
                    sequence,
                    level,
                    stat,
                    features,
                    low_population,
                } => (
                    sequence.to_string(),
                    level.clone(),
                    stat.clone(),
                    format!("{} ({} low pop.)", features, low_population),
                ),
                StepResult::Superseded { sequence, latest } => (
                    sequence.to_string(),
                    String::new(),
                    String::new(),
                    format!("dropped, latest {}", latest),
                ),
                StepResult::Failed { kind, message } => {
                    (String::new(), String::new(), String::new(), format!("{}: {}", kind, message))
                }
            };
            steps.add_row(vec![
                outcome.index.to_string(),
                outcome.step.clone(),
                outcome.result.label().to_string(),
                seq,
                level,
                stat,
                features,
            ]);
        }

        let mut summary = Table::new();
        summary
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![format!("Scenario: {}", report.scenario)]);
        summary.add_row(vec!["Duration:", &format!("{:.1}ms", report.duration_ms)]);
        summary.add_row(vec!["Requests:", &report.stats.requests.to_string()]);
        summary.add_row(vec!["Layers applied:", &report.stats.applied.to_string()]);
        summary.add_row(vec!["Stale responses:", &report.stats.stale.to_string()]);
        summary.add_row(vec!["Failures:", &report.stats.failures.to_string()]);
        summary.add_row(vec![
            "Final view:",
            &format!(
                "z{} {} / {}",
                report.final_view.zoom, report.final_view.level, report.final_view.stat
            ),
        ]);
        if let Some(legend) = &report.legend {
            summary.add_row(vec!["Legend:", &legend_summary(legend)]);
        }

        format!("{}\n{}", steps, summary)
    }

    pub fn format_json(report: &RunReport) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// Legend and per-class feature counts of one layer.
    pub fn format_layer(layer: &RenderedLayer) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                format!("{} @ {}", layer.request.stat.id, layer.request.level.level_id),
                "Fill".to_string(),
                "Features".to_string(),
            ]);

        let classes = &layer.classified.classes;
        let count = |wanted: &ColorClass| classes.iter().filter(|c| *c == wanted).count();

        match layer.legend() {
            Legend::Breaks { entries, .. } => {
                for entry in entries {
                    table.add_row(vec![
                        entry.label.clone(),
                        entry.colour.to_hex(),
                        count(&ColorClass::Class(entry.class)).to_string(),
                    ]);
                }
            }
            legend => {
                let shaded = classes
                    .iter()
                    .filter(|c| matches!(c, ColorClass::Colour(_)))
                    .count();
                table.add_row(vec![legend_summary(legend), "gradient".to_string(), shaded.to_string()]);
            }
        }

        let (Legend::Breaks { low_population, .. }
        | Legend::Gradient { low_population, .. }
        | Legend::Unscaled { low_population, .. }) = layer.legend();
        table.add_row(vec![
            "low population".to_string(),
            low_population.to_hex(),
            count(&ColorClass::LowPopulation).to_string(),
        ]);
        table.add_row(vec![
            "no data".to_string(),
            String::new(),
            count(&ColorClass::NoData).to_string(),
        ]);

        table.to_string()
    }

    /// Computed breaks with the class each one closes.
    pub fn format_breaks(breaks: &Breaks, map_type: MapType) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec!["Class", "Upper bound"]);

        for (class, value) in ClassIndex::all().zip(breaks.as_slice()) {
            table.add_row(vec![class.get().to_string(), format_value(*value, map_type)]);
        }
        table.to_string()
    }
}

fn legend_summary(legend: &Legend) -> String {
    match legend {
        Legend::Breaks { breaks, .. } => format!("breaks {} .. {}", breaks.lowest(), breaks.highest()),
        Legend::Gradient { min, max, .. } => format!("gradient {} .. {}", min, max),
        Legend::Unscaled { .. } => "gradient (no range)".to_string(),
    }
}
