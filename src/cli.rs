//! Terminal front end: turns input lines into wizard commands and views into
//! text.

use std::fmt::Write as _;

use async_trait::async_trait;

use crate::error::{Error, UnitError};
use crate::flow::{
    Answer, CompletionHandler, Position, Presenter, Quantity, StepKind, StepView,
};
use crate::metrics::{DerivedSnapshot, MetricKind};
use crate::profile::HealthProfile;
use crate::units::{UnitSystem, parse_height, parse_weight};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Back,
    Quit,
    Restart,
    Units(UnitSystem),
    Answer { step_id: String, answer: Answer },
}

/// Interpret `line` against the step currently shown.
///
/// Empty input means "next". Choice steps accept option ids or 1-based
/// option numbers; multi-choice takes a comma-separated list.
pub fn parse_command(line: &str, view: &StepView) -> Result<Command, Error> {
    let input = line.trim();
    match input.to_ascii_lowercase().as_str() {
        "" | "next" | "n" => return Ok(Command::Next),
        "back" | "b" => return Ok(Command::Back),
        "quit" | "q" | "exit" => return Ok(Command::Quit),
        "restart" => return Ok(Command::Restart),
        lower => {
            if let Some(system) = lower.strip_prefix("units ") {
                let system = system.trim().parse().map_err(|_| UnitError::Unparseable {
                    quantity: "unit system",
                    input: system.trim().to_string(),
                })?;
                return Ok(Command::Units(system));
            }
        }
    }

    let Some(step) = view.step.as_ref() else {
        return Ok(Command::Next);
    };
    let answer = match &step.kind {
        StepKind::SingleChoice { options, .. } => {
            Answer::Choice(resolve_option(input, options.iter().map(|o| o.id.as_str())))
        }
        StepKind::MultiChoice { options, .. } => Answer::Choices(
            input
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| resolve_option(s, options.iter().map(|o| o.id.as_str())))
                .collect(),
        ),
        StepKind::NumericInput { .. } => {
            let value = input.replace(',', ".").parse::<f64>().map_err(|_| {
                UnitError::Unparseable {
                    quantity: "number",
                    input: input.to_string(),
                }
            })?;
            Answer::Number(value)
        }
        StepKind::UnitPairInput { quantity } => match quantity {
            Quantity::Height => Answer::Height(parse_height(input, view.unit_system)?),
            Quantity::Weight => Answer::Weight(parse_weight(input, view.unit_system)?),
        },
        StepKind::Informational
        | StepKind::AutoAdvance { .. }
        | StepKind::ComputedSummary { .. } => return Ok(Command::Next),
    };
    Ok(Command::Answer {
        step_id: step.id.clone(),
        answer,
    })
}

fn resolve_option<'a>(input: &str, mut ids: impl Iterator<Item = &'a str>) -> String {
    match input.parse::<usize>() {
        Ok(n) if n >= 1 => ids.nth(n - 1).map_or_else(|| input.to_string(), str::to_string),
        _ => input.to_string(),
    }
}

/// Render a view as plain text.
pub fn render_view(view: &StepView) -> String {
    let mut out = String::new();
    let filled = (view.progress * 20.0).round() as usize;
    let _ = writeln!(
        out,
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(20 - filled.min(20)),
        view.progress * 100.0
    );

    match (view.position, view.step.as_ref()) {
        (Position::BeforeFirst, _) => {
            let _ = writeln!(out, "Loading {}%", view.timer_percent.unwrap_or(0));
        }
        (Position::AfterLast, _) => {
            let _ = writeln!(out, "All done.");
        }
        (Position::AtStep(_), Some(step)) => {
            if let (Some(position), total) = (view.visible_position, view.visible_total) {
                let _ = write!(out, "({position}/{total}) ");
            }
            let _ = writeln!(out, "{}", step.title.as_deref().unwrap_or(&step.id));
            render_kind(&mut out, view, &step.kind);
            if let Some(answer) = &view.answer {
                let _ = writeln!(out, "  current answer: {answer}");
            }
        }
        (Position::AtStep(_), None) => {}
    }
    out
}

fn render_kind(out: &mut String, view: &StepView, kind: &StepKind) {
    match kind {
        StepKind::SingleChoice { options, .. } | StepKind::MultiChoice { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                let _ = writeln!(out, "  {}. {} [{}]", i + 1, option.label, option.id);
            }
            if matches!(kind, StepKind::MultiChoice { .. }) {
                let _ = writeln!(out, "  (comma-separated, then 'next')");
            }
        }
        StepKind::NumericInput { min, max, unit_label } => {
            let range = match (min, max) {
                (Some(lo), Some(hi)) => format!(" {lo}-{hi}"),
                _ => String::new(),
            };
            let _ = writeln!(out, "  enter a number{range} {}", unit_label.as_deref().unwrap_or(""));
        }
        StepKind::UnitPairInput { quantity } => {
            let hint = match (quantity, view.unit_system) {
                (Quantity::Height, UnitSystem::Metric) => "e.g. 175 cm",
                (Quantity::Height, UnitSystem::Imperial) => "e.g. 5'9\"",
                (Quantity::Weight, UnitSystem::Metric) => "e.g. 70 kg",
                (Quantity::Weight, UnitSystem::Imperial) => "e.g. 154 lb",
            };
            let _ = writeln!(out, "  {hint}");
        }
        StepKind::Informational => {
            let _ = writeln!(out, "  press Enter to continue");
        }
        StepKind::AutoAdvance { .. } => {
            let _ = writeln!(out, "  {}%", view.timer_percent.unwrap_or(0));
        }
        StepKind::ComputedSummary { metrics } => {
            for metric in metrics {
                let _ = writeln!(out, "  {}", render_metric(*metric, &view.derived));
            }
        }
    }
}

/// One line describing a derived metric, or why it is not available yet.
pub fn render_metric(kind: MetricKind, derived: &DerivedSnapshot) -> String {
    let value = match kind {
        MetricKind::Bmi => derived
            .bmi
            .as_ref()
            .map(|b| format!("BMI {} ({})", b.rounded(), b.category)),
        MetricKind::Bmr => derived
            .bmr
            .as_ref()
            .map(|kcal| format!("BMR {} kcal/day", kcal.round())),
        MetricKind::MaintenanceCalories => derived
            .maintenance_calories
            .as_ref()
            .map(|kcal| format!("Maintenance {} kcal/day", kcal.round())),
        MetricKind::Macros => derived.macros.as_ref().map(|m| {
            format!(
                "Carbs {}g / Fat {}g / Protein {}g",
                m.carbs.grams.round(),
                m.fat.grams.round(),
                m.protein.grams.round()
            )
        }),
        MetricKind::WeightDelta => derived.weight_delta.as_ref().map(|d| {
            format!("To lose: {:.1} kg ({:.1} lb)", d.kilograms, d.pounds)
        }),
    };
    value.unwrap_or_else(|e| e.to_string())
}

/// Prints every view to stdout.
#[derive(Debug, Default)]
pub struct TerminalPresenter;

#[async_trait]
impl Presenter for TerminalPresenter {
    async fn render(&self, view: &StepView) {
        // Timer progress redraws the same screen; only show the percentage.
        if view.timer_percent.is_some_and(|p| p > 0) {
            eprint!("\r{}%", view.timer_percent.unwrap_or(0));
            return;
        }
        println!("\n{}", render_view(view));
        eprint!("> ");
    }
}

/// Prints the profile summary when the flow completes.
#[derive(Debug, Default)]
pub struct TerminalCompletion;

#[async_trait]
impl CompletionHandler for TerminalCompletion {
    async fn on_complete(&self, profile: &HealthProfile) -> anyhow::Result<()> {
        println!("\n{}\n", profile.to_summary());
        Ok(())
    }
}
