//! Report formatting utilities for Qlarity outputs.

use std::fmt::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::error::QlarityError;
use crate::risk::{FeatureRisk, RiskLevel};
use crate::views::DashboardView;

/// A dashboard section that can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Headline coverage numbers.
    Overview,
    /// Features ordered by test count.
    Map,
    /// Test distribution per layer.
    Pyramid,
    /// Chart data: files per type, state split, features per type.
    Charts,
    /// Risk tiers and concerns.
    Risks,
    /// Blind spots grouped by reason.
    BlindSpots,
    /// Action plan grouped by criticality.
    Actions,
}

impl Section {
    /// Every section in dashboard tab order.
    pub const ALL: [Section; 7] = [
        Self::Overview,
        Self::Map,
        Self::Pyramid,
        Self::Charts,
        Self::Risks,
        Self::BlindSpots,
        Self::Actions,
    ];
}

impl FromStr for Section {
    type Err = QlarityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "overview" => Ok(Self::Overview),
            "map" => Ok(Self::Map),
            "pyramid" => Ok(Self::Pyramid),
            "charts" => Ok(Self::Charts),
            "risks" => Ok(Self::Risks),
            "blindspots" => Ok(Self::BlindSpots),
            "actions" => Ok(Self::Actions),
            other => Err(QlarityError::Other(format!("unknown section `{other}`"))),
        }
    }
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// Render the selected sections of a dashboard view as Markdown.
pub fn render_dashboard_markdown(view: &DashboardView, sections: &[Section]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "# Qlarity Coverage Report: {}\n",
        view.overview.repository
    );
    for section in sections {
        match section {
            Section::Overview => append_overview_markdown(&mut output, view),
            Section::Map => append_map_markdown(&mut output, view),
            Section::Pyramid => append_pyramid_markdown(&mut output, view),
            Section::Charts => append_charts_markdown(&mut output, view),
            Section::Risks => append_risks_markdown(&mut output, view),
            Section::BlindSpots => append_blind_spots_markdown(&mut output, view),
            Section::Actions => append_actions_markdown(&mut output, view),
        }
    }
    output
}

/// Render the selected sections of a dashboard view as plain text.
pub fn render_dashboard_text(view: &DashboardView, sections: &[Section]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Repository: {}", view.overview.repository);
    let _ = writeln!(output, "Generated: {}", view.overview.generated_at);
    let _ = writeln!(output);
    for section in sections {
        match section {
            Section::Overview => append_overview_text(&mut output, view),
            Section::Map => append_map_text(&mut output, view),
            Section::Pyramid => append_pyramid_text(&mut output, view),
            Section::Charts => append_charts_text(&mut output, view),
            Section::Risks => append_risks_text(&mut output, view),
            Section::BlindSpots => append_blind_spots_text(&mut output, view),
            Section::Actions => append_actions_text(&mut output, view),
        }
        let _ = writeln!(output);
    }
    output
}

fn format_percent(value: Option<u64>) -> String {
    value
        .map(|percent| format!("{percent}%"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn format_tenth(value: Option<f64>) -> String {
    value
        .map(|percent| format!("{percent:.1}%"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn describe_risk(risk: &FeatureRisk) -> String {
    format!(
        "{} (`{}`): {} tests, {}",
        risk.feature.display_name,
        risk.feature.source_module_path,
        risk.signals.total_tests,
        risk.feature.coverage_state
    )
}

/// Escape a value for a Markdown table cell.
fn table_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

fn state_split(view: &DashboardView) -> [(&'static str, usize, Option<f64>); 3] {
    let map = &view.features_map;
    [
        ("full", map.fully_covered, map.fully_covered_share),
        ("partial", map.partially_covered, map.partially_covered_share),
        ("none", map.no_coverage, map.no_coverage_share),
    ]
}

fn append_overview_text(output: &mut String, view: &DashboardView) {
    let overview = &view.overview;
    let _ = writeln!(output, "Features: {}", overview.total_features);
    let _ = writeln!(
        output,
        "- full: {} ({})",
        overview.fully_covered,
        format_percent(overview.fully_covered_percent)
    );
    let _ = writeln!(
        output,
        "- partial: {} ({})",
        overview.partially_covered,
        format_percent(overview.partially_covered_percent)
    );
    let _ = writeln!(
        output,
        "- none: {} ({})",
        overview.no_automated_coverage,
        format_percent(overview.uncovered_percent)
    );
    let _ = writeln!(output, "Test files: {}", overview.total_test_files);
}

fn append_map_text(output: &mut String, view: &DashboardView) {
    if view.features_map.features.is_empty() {
        let _ = writeln!(output, "Features map: none");
        return;
    }
    let _ = writeln!(output, "Features map:");
    for feature in &view.features_map.features {
        let _ = writeln!(
            output,
            "- {} [{}] {} tests ({})",
            feature.display_name,
            feature.coverage_state,
            feature.total_tests(),
            feature.source_module_path
        );
    }
    let split: Vec<String> = state_split(view)
        .iter()
        .map(|(state, count, share)| format!("{state} {count} ({})", format_tenth(*share)))
        .collect();
    let _ = writeln!(output, "States: {}", split.join(", "));
}

fn append_pyramid_text(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "Test pyramid:");
    for layer in &view.pyramid.layers {
        let _ = writeln!(
            output,
            "- {}: {} files ({} of tests), {} features ({})",
            layer.layer,
            layer.test_files,
            format_tenth(layer.test_file_percent),
            layer.features_covered,
            format_tenth(layer.feature_percent)
        );
    }
}

fn append_charts_text(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "Test files by type:");
    for layer in view.pyramid.layers.iter().rev() {
        let _ = writeln!(output, "- {}: {}", layer.layer, layer.test_files);
    }
    let _ = writeln!(output, "Coverage states:");
    for (state, count, share) in state_split(view) {
        let _ = writeln!(output, "- {state}: {count} ({})", format_tenth(share));
    }
    let _ = writeln!(output, "Features covered by type:");
    for layer in view.pyramid.layers.iter().rev() {
        let _ = writeln!(output, "- {}: {}", layer.layer, layer.features_covered);
    }
}

fn append_risks_text(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "Risks:");
    for (level, count) in view.risks.counts() {
        let _ = writeln!(output, "- {level}: {count}");
    }
    for level in [RiskLevel::Critical, RiskLevel::High, RiskLevel::Medium] {
        for risk in view.risks.tier(level) {
            let _ = writeln!(output, "  [{level}] {}", describe_risk(risk));
        }
    }
    for concern in &view.risks.concerns {
        let _ = writeln!(
            output,
            "  concern: {}: {}",
            concern.display_name, concern.reason
        );
    }
}

fn append_blind_spots_text(output: &mut String, view: &DashboardView) {
    if view.blind_spots.is_empty() {
        let _ = writeln!(output, "Blind spots: none");
        return;
    }
    let _ = writeln!(output, "Blind spots:");
    for group in &view.blind_spots {
        let _ = writeln!(output, "- {} ({})", group.reason, group.spots.len());
        for spot in &group.spots {
            let _ = writeln!(output, "  - {}", spot.display_name);
        }
    }
}

fn append_actions_text(output: &mut String, view: &DashboardView) {
    if view.action_plan.is_empty() {
        let _ = writeln!(output, "Action plan: none");
        return;
    }
    let _ = writeln!(output, "Action plan:");
    for (tier, items) in view.action_plan.tiers() {
        for item in items {
            let _ = writeln!(output, "- [{tier}] {}", item.description);
        }
    }
}

fn append_overview_markdown(output: &mut String, view: &DashboardView) {
    let overview = &view.overview;
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Generated: {}", overview.generated_at);
    let _ = writeln!(output, "- Total features: {}", overview.total_features);
    let _ = writeln!(
        output,
        "- Fully covered: {} ({})",
        overview.fully_covered,
        format_percent(overview.fully_covered_percent)
    );
    let _ = writeln!(
        output,
        "- Partially covered: {} ({})",
        overview.partially_covered,
        format_percent(overview.partially_covered_percent)
    );
    let _ = writeln!(
        output,
        "- No automated coverage: {} ({})",
        overview.no_automated_coverage,
        format_percent(overview.uncovered_percent)
    );
    let _ = writeln!(output, "- Test files: {}", overview.total_test_files);
    let _ = writeln!(output);
}

fn append_map_markdown(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "## Features Map");
    if view.features_map.features.is_empty() {
        let _ = writeln!(output, "No features reported.\n");
        return;
    }
    for (state, count, share) in state_split(view) {
        let _ = writeln!(output, "- {state}: {count} ({})", format_tenth(share));
    }
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "| Feature | Module | Unit | Integration | E2E | Total | State |"
    );
    let _ = writeln!(output, "| --- | --- | ---: | ---: | ---: | ---: | --- |");
    for feature in &view.features_map.features {
        let _ = writeln!(
            output,
            "| {} | `{}` | {} | {} | {} | {} | {} |",
            table_cell(&feature.display_name),
            table_cell(&feature.source_module_path),
            feature.unit_integration.unit_test_count,
            feature.unit_integration.integration_test_count,
            feature.e2e.test_count,
            feature.total_tests(),
            table_cell(feature.coverage_state.as_str())
        );
    }
    let _ = writeln!(output);
}

fn append_pyramid_markdown(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "## Test Pyramid");
    for layer in &view.pyramid.layers {
        let _ = writeln!(
            output,
            "- {}: {} test files ({} of tests), {} features covered ({})",
            layer.layer,
            layer.test_files,
            format_tenth(layer.test_file_percent),
            layer.features_covered,
            format_tenth(layer.feature_percent)
        );
    }
    let _ = writeln!(output);
}

fn append_charts_markdown(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "## Charts");
    let _ = writeln!(output, "| Type | Test files | Features covered |");
    let _ = writeln!(output, "| --- | ---: | ---: |");
    for layer in view.pyramid.layers.iter().rev() {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            layer.layer, layer.test_files, layer.features_covered
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "| State | Features | Share |");
    let _ = writeln!(output, "| --- | ---: | ---: |");
    for (state, count, share) in state_split(view) {
        let _ = writeln!(output, "| {state} | {count} | {} |", format_tenth(share));
    }
    let _ = writeln!(output);
}

fn append_risks_markdown(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "## Risk Analysis");
    for (level, count) in view.risks.counts() {
        let _ = writeln!(output, "- {level}: {count}");
    }
    let _ = writeln!(output);
    for level in [RiskLevel::Critical, RiskLevel::High, RiskLevel::Medium] {
        let tier = view.risks.tier(level);
        if tier.is_empty() {
            continue;
        }
        let _ = writeln!(output, "### {level} ({})", tier.len());
        for risk in tier {
            let _ = writeln!(output, "- {}", describe_risk(risk));
        }
        let _ = writeln!(output);
    }
    if !view.risks.concerns.is_empty() {
        let _ = writeln!(output, "### Coverage concerns");
        for concern in &view.risks.concerns {
            let _ = writeln!(output, "- {}: {}", concern.display_name, concern.reason);
        }
        let _ = writeln!(output);
    }
}

fn append_blind_spots_markdown(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "## Blind Spots");
    if view.blind_spots.is_empty() {
        let _ = writeln!(output, "No blind spots reported.\n");
        return;
    }
    for group in &view.blind_spots {
        let _ = writeln!(output, "### {} ({})", group.reason, group.spots.len());
        for spot in &group.spots {
            let _ = writeln!(output, "- {} (`{}`)", spot.display_name, spot.feature_key);
        }
        let _ = writeln!(output);
    }
}

fn append_actions_markdown(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "## Action Plan");
    if view.action_plan.is_empty() {
        let _ = writeln!(output, "No actions planned.\n");
        return;
    }
    for (tier, items) in view.action_plan.tiers() {
        let _ = writeln!(output, "### {tier} ({})", items.len());
        for item in items {
            let _ = writeln!(output, "- {}", item.description);
        }
        let _ = writeln!(output);
    }
}
