//! Risk classification of features.
//!
//! The tiers come from four signals derived from a feature's test counts and
//! coverage label, resolved by a fixed rule order (first match wins):
//!
//! 1. `untested_despite_suite` (no coverage but more than 10 tests) is critical,
//! 2. `low_coverage` (fewer than 5 tests, or no coverage) is high,
//! 3. `complex` (more than 50 tests) with partial coverage is medium,
//! 4. everything else is low.
//!
//! None of the signals look at version-control history.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Concern, CoverageState, Feature};

const LOW_COVERAGE_TESTS: u64 = 5;
const COMPLEX_TESTS: u64 = 50;
const SUITE_TESTS: u64 = 10;

/// Risk tier of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Prioritize testing now.
    Critical,
    /// Add tests soon.
    High,
    /// Monitor and improve.
    Medium,
    /// Adequately covered.
    Low,
}

impl RiskLevel {
    /// All tiers from most to least severe.
    pub const ALL: [RiskLevel; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals derived from a feature, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskSignals {
    /// Unit + integration + end-to-end tests.
    pub total_tests: u64,
    /// Fewer than 5 tests, or no coverage.
    pub low_coverage: bool,
    /// More than 50 tests.
    pub complex: bool,
    /// No coverage despite more than 10 tests.
    pub untested_despite_suite: bool,
}

impl RiskSignals {
    /// Derive the signals for a feature.
    pub fn of(feature: &Feature) -> Self {
        let total_tests = feature.total_tests();
        let uncovered = feature.coverage_state == CoverageState::None;
        Self {
            total_tests,
            low_coverage: total_tests < LOW_COVERAGE_TESTS || uncovered,
            complex: total_tests > COMPLEX_TESTS,
            untested_despite_suite: uncovered && total_tests > SUITE_TESTS,
        }
    }

    /// Resolve the tier for these signals and a coverage label.
    pub fn level(&self, state: &CoverageState) -> RiskLevel {
        if self.untested_despite_suite {
            RiskLevel::Critical
        } else if self.low_coverage {
            RiskLevel::High
        } else if self.complex && *state == CoverageState::Partial {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Classify a single feature.
pub fn classify(feature: &Feature) -> RiskLevel {
    RiskSignals::of(feature).level(&feature.coverage_state)
}

/// A feature annotated with its signals and tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRisk {
    /// The classified feature.
    pub feature: Feature,
    /// Signals that produced the tier.
    pub signals: RiskSignals,
    /// Resulting tier.
    pub level: RiskLevel,
}

impl FeatureRisk {
    /// Classify `feature` and keep the intermediate signals.
    pub fn assess(feature: &Feature) -> Self {
        let signals = RiskSignals::of(feature);
        Self {
            level: signals.level(&feature.coverage_state),
            signals,
            feature: feature.clone(),
        }
    }
}

/// Features grouped by tier, each tier in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskMatrix {
    /// Critical tier.
    pub critical: Vec<FeatureRisk>,
    /// High tier.
    pub high: Vec<FeatureRisk>,
    /// Medium tier.
    pub medium: Vec<FeatureRisk>,
    /// Low tier.
    pub low: Vec<FeatureRisk>,
    /// Concerns reported alongside the features.
    pub concerns: Vec<Concern>,
}

impl RiskMatrix {
    /// Features of one tier.
    pub fn tier(&self, level: RiskLevel) -> &[FeatureRisk] {
        match level {
            RiskLevel::Critical => &self.critical,
            RiskLevel::High => &self.high,
            RiskLevel::Medium => &self.medium,
            RiskLevel::Low => &self.low,
        }
    }

    /// Number of features per tier, most severe first.
    pub fn counts(&self) -> [(RiskLevel, usize); 4] {
        RiskLevel::ALL.map(|level| (level, self.tier(level).len()))
    }

    /// Total number of classified features.
    pub fn total(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len() + self.low.len()
    }
}

/// Classify every feature and group the results by tier.
pub fn assess(features: &[Feature], concerns: &[Concern]) -> RiskMatrix {
    let mut matrix = RiskMatrix {
        concerns: concerns.to_vec(),
        ..RiskMatrix::default()
    };
    for feature in features {
        let risk = FeatureRisk::assess(feature);
        match risk.level {
            RiskLevel::Critical => matrix.critical.push(risk),
            RiskLevel::High => matrix.high.push(risk),
            RiskLevel::Medium => matrix.medium.push(risk),
            RiskLevel::Low => matrix.low.push(risk),
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{E2eCounts, UnitIntegrationCounts};

    fn feature(unit: u64, integration: u64, e2e: u64, state: &str) -> Feature {
        Feature {
            feature_key: format!("{unit}-{integration}-{e2e}-{state}"),
            display_name: "Feature".to_string(),
            source_module_path: "src/feature".to_string(),
            unit_integration: UnitIntegrationCounts {
                unit_test_count: unit,
                integration_test_count: integration,
            },
            e2e: E2eCounts { test_count: e2e },
            coverage_state: CoverageState::from(state.to_string()),
        }
    }

    #[test]
    fn uncovered_feature_with_many_tests_is_critical() {
        assert_eq!(classify(&feature(8, 4, 0, "none")), RiskLevel::Critical);
        assert_eq!(classify(&feature(11, 0, 0, "none")), RiskLevel::Critical);
    }

    #[test]
    fn uncovered_feature_with_few_tests_is_high() {
        assert_eq!(classify(&feature(5, 5, 0, "none")), RiskLevel::High);
        assert_eq!(classify(&feature(0, 0, 0, "none")), RiskLevel::High);
    }

    #[test]
    fn few_tests_are_high_regardless_of_state() {
        assert_eq!(classify(&feature(1, 1, 1, "partial")), RiskLevel::High);
        assert_eq!(classify(&feature(4, 0, 0, "full")), RiskLevel::High);
        assert_eq!(classify(&feature(2, 0, 0, "mystery")), RiskLevel::High);
    }

    #[test]
    fn complex_partial_feature_is_medium() {
        assert_eq!(classify(&feature(40, 15, 5, "partial")), RiskLevel::Medium);
        assert_eq!(classify(&feature(51, 0, 0, "partial")), RiskLevel::Medium);
    }

    #[test]
    fn boundaries_fall_to_low() {
        assert_eq!(classify(&feature(50, 0, 0, "partial")), RiskLevel::Low);
        assert_eq!(classify(&feature(5, 0, 0, "full")), RiskLevel::Low);
        assert_eq!(classify(&feature(10, 5, 5, "full")), RiskLevel::Low);
        assert_eq!(classify(&feature(60, 0, 0, "full")), RiskLevel::Low);
        assert_eq!(classify(&feature(60, 0, 0, "unknown")), RiskLevel::Low);
    }

    #[test]
    fn signals_are_reported() {
        let signals = RiskSignals::of(&feature(30, 20, 10, "none"));
        assert_eq!(signals.total_tests, 60);
        assert!(signals.low_coverage);
        assert!(signals.complex);
        assert!(signals.untested_despite_suite);
    }

    #[test]
    fn classify_is_total_over_a_grid() {
        let states = ["full", "partial", "none", "", "other"];
        for state in states {
            for total in [0, 4, 5, 10, 11, 50, 51, 200] {
                let level = classify(&feature(total, 0, 0, state));
                assert!(RiskLevel::ALL.contains(&level));
            }
        }
    }

    #[test]
    fn classify_saturates_huge_counts() {
        let huge = feature(u64::MAX, 1, 1, "partial");
        assert_eq!(huge.total_tests(), u64::MAX);
        assert_eq!(classify(&huge), RiskLevel::Medium);
        assert_eq!(classify(&feature(u64::MAX, u64::MAX, 0, "none")), RiskLevel::Critical);
    }

    #[test]
    fn assess_groups_every_feature_once() {
        let features = vec![
            feature(8, 4, 0, "none"),
            feature(1, 1, 1, "partial"),
            feature(40, 15, 5, "partial"),
            feature(10, 5, 5, "full"),
            feature(0, 0, 0, "full"),
        ];
        let matrix = assess(&features, &[]);

        assert_eq!(matrix.total(), features.len());
        assert_eq!(
            matrix.counts(),
            [
                (RiskLevel::Critical, 1),
                (RiskLevel::High, 2),
                (RiskLevel::Medium, 1),
                (RiskLevel::Low, 1),
            ]
        );
        assert_eq!(matrix.high[0].feature.feature_key, features[1].feature_key);
        assert_eq!(matrix.high[1].feature.feature_key, features[4].feature_key);
    }

    #[test]
    fn risk_level_serializes_lowercase() {
        let encoded = serde_json::to_string(&RiskLevel::Critical).expect("encode");
        assert_eq!(encoded, "\"critical\"");
    }
}
