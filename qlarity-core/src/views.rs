//! View models built from a single report.
//!
//! Percentages whose denominator is zero come back as `None`.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CoverageReport, CoverageState, Feature, Statistics};
use crate::error::QlarityError;
use crate::grouping::{ActionGroups, BlindSpotGroup, group_blind_spots, group_by_criticality};
use crate::risk::{RiskMatrix, assess};

/// Share of `part` in `total` as a percentage.
pub fn percent(part: u64, total: u64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(part as f64 / total as f64 * 100.0)
    }
}

fn whole_percent(part: u64, total: u64) -> Option<u64> {
    percent(part, total).map(|value| value.round() as u64)
}

fn tenth_percent(part: u64, total: u64) -> Option<f64> {
    percent(part, total).map(|value| (value * 10.0).round() / 10.0)
}

fn total_test_files(stats: &Statistics) -> u64 {
    stats
        .unit
        .test_file_count
        .saturating_add(stats.integration.test_file_count)
        .saturating_add(stats.e2e.test_file_count)
}

/// Headline numbers of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverageOverview {
    /// Repository label.
    pub repository: String,
    /// When the report was generated.
    pub generated_at: String,
    /// Total features analyzed.
    pub total_features: u64,
    /// Fully covered features.
    pub fully_covered: u64,
    /// Partially covered features.
    pub partially_covered: u64,
    /// Features without automated coverage.
    pub no_automated_coverage: u64,
    /// Whole-percent share of fully covered features.
    pub fully_covered_percent: Option<u64>,
    /// Whole-percent share of partially covered features.
    pub partially_covered_percent: Option<u64>,
    /// Whole-percent share of uncovered features.
    pub uncovered_percent: Option<u64>,
    /// Test files across all test types.
    pub total_test_files: u64,
}

impl CoverageOverview {
    /// Build the overview for a report.
    pub fn of(report: &CoverageReport) -> Self {
        let coverage = report.statistics.feature_coverage;
        let stats = &report.statistics;
        Self {
            repository: report.context.repository.clone(),
            generated_at: report.generated_at.clone(),
            total_features: coverage.total_features,
            fully_covered: coverage.fully_covered,
            partially_covered: coverage.partially_covered,
            no_automated_coverage: coverage.no_automated_coverage,
            fully_covered_percent: whole_percent(coverage.fully_covered, coverage.total_features),
            partially_covered_percent: whole_percent(
                coverage.partially_covered,
                coverage.total_features,
            ),
            uncovered_percent: whole_percent(
                coverage.no_automated_coverage,
                coverage.total_features,
            ),
            total_test_files: total_test_files(stats),
        }
    }
}

/// One layer of the test pyramid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PyramidLayer {
    /// Layer label (`unit`, `integration` or `e2e`).
    pub layer: String,
    /// Test files in this layer.
    pub test_files: u64,
    /// Features covered by this layer.
    pub features_covered: u64,
    /// Share of all test files, one decimal.
    pub test_file_percent: Option<f64>,
    /// Share of all features covered, one decimal.
    pub feature_percent: Option<f64>,
}

/// Distribution of tests across layers, top of the pyramid first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestPyramid {
    /// Total test files.
    pub total_test_files: u64,
    /// Layers ordered e2e, integration, unit.
    pub layers: Vec<PyramidLayer>,
}

impl TestPyramid {
    /// Build the pyramid for a report's statistics.
    pub fn of(stats: &Statistics) -> Self {
        let total_test_files = total_test_files(stats);
        let total_features = stats.feature_coverage.total_features;
        let layers = [
            ("e2e", stats.e2e),
            ("integration", stats.integration),
            ("unit", stats.unit),
        ]
        .into_iter()
        .map(|(layer, counts)| PyramidLayer {
            layer: layer.to_string(),
            test_files: counts.test_file_count,
            features_covered: counts.features_covered,
            test_file_percent: tenth_percent(counts.test_file_count, total_test_files),
            feature_percent: tenth_percent(counts.features_covered, total_features),
        })
        .collect();
        Self {
            total_test_files,
            layers,
        }
    }
}

/// Coverage-state filter of the features map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    /// Every feature.
    #[default]
    All,
    /// Only `full`.
    Full,
    /// Only `partial`.
    Partial,
    /// Only `none`.
    None,
}

impl StateFilter {
    /// Whether a feature passes this filter.
    pub fn accepts(self, feature: &Feature) -> bool {
        match self {
            Self::All => true,
            Self::Full => feature.coverage_state == CoverageState::Full,
            Self::Partial => feature.coverage_state == CoverageState::Partial,
            Self::None => feature.coverage_state == CoverageState::None,
        }
    }
}

impl FromStr for StateFilter {
    type Err = QlarityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "all" => Ok(Self::All),
            "full" => Ok(Self::Full),
            "partial" => Ok(Self::Partial),
            "none" => Ok(Self::None),
            other => Err(QlarityError::Other(format!(
                "unknown coverage filter `{other}`"
            ))),
        }
    }
}

/// Features filtered by state and ordered by total tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesMap {
    /// Applied filter.
    pub filter: StateFilter,
    /// Features with the most tests first.
    pub features: Vec<Feature>,
    /// `full` features before filtering.
    pub fully_covered: usize,
    /// `partial` features before filtering.
    pub partially_covered: usize,
    /// `none` features before filtering.
    pub no_coverage: usize,
    /// One-decimal share of `full` features.
    pub fully_covered_share: Option<f64>,
    /// One-decimal share of `partial` features.
    pub partially_covered_share: Option<f64>,
    /// One-decimal share of `none` features.
    pub no_coverage_share: Option<f64>,
}

impl FeaturesMap {
    /// Build the map for `features` under `filter`.
    pub fn of(features: &[Feature], filter: StateFilter) -> Self {
        let count = |state: CoverageState| {
            features
                .iter()
                .filter(|feature| feature.coverage_state == state)
                .count()
        };
        let mut selected: Vec<Feature> = features
            .iter()
            .filter(|feature| filter.accepts(feature))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.total_tests().cmp(&a.total_tests()));
        let (fully_covered, partially_covered, no_coverage) = (
            count(CoverageState::Full),
            count(CoverageState::Partial),
            count(CoverageState::None),
        );
        let share = |part: usize| tenth_percent(part as u64, features.len() as u64);
        Self {
            filter,
            features: selected,
            fully_covered,
            partially_covered,
            no_coverage,
            fully_covered_share: share(fully_covered),
            partially_covered_share: share(partially_covered),
            no_coverage_share: share(no_coverage),
        }
    }
}

/// Ordering of the feature table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeatureOrder {
    /// Alphabetical by display name.
    #[default]
    Name,
    /// Most tests first.
    Tests,
    /// By coverage label.
    State,
}

/// Return `features` ordered for the feature table.
pub fn sort_features(features: &[Feature], order: FeatureOrder) -> Vec<Feature> {
    let mut sorted = features.to_vec();
    sorted.sort_by(|a, b| match order {
        FeatureOrder::Name => compare_labels(&a.display_name, &b.display_name),
        FeatureOrder::Tests => b.total_tests().cmp(&a.total_tests()),
        FeatureOrder::State => a.coverage_state.as_str().cmp(b.coverage_state.as_str()),
    });
    sorted
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Everything the dashboard shows for one selected report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// The report being displayed.
    pub report: CoverageReport,
    /// Headline numbers.
    pub overview: CoverageOverview,
    /// Test pyramid.
    pub pyramid: TestPyramid,
    /// Features map with no filter.
    pub features_map: FeaturesMap,
    /// Risk tiers.
    pub risks: RiskMatrix,
    /// Blind spots grouped by reason.
    pub blind_spots: Vec<BlindSpotGroup>,
    /// Action plan grouped by criticality.
    pub action_plan: ActionGroups,
}

impl DashboardView {
    /// Build every view for `report`.
    pub fn build(report: CoverageReport) -> Self {
        Self {
            overview: CoverageOverview::of(&report),
            pyramid: TestPyramid::of(&report.statistics),
            features_map: FeaturesMap::of(&report.features, StateFilter::All),
            risks: assess(&report.features, &report.coverage_concerns),
            blind_spots: group_blind_spots(&report.blind_spots),
            action_plan: group_by_criticality(&report.action_plan),
            report,
        }
    }
}
