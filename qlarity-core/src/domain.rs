//! Domain entities for Qlarity.
//!
//! The JSON shape of these types is fixed by the coverage analysis tool that
//! produces the reports, so every field uses the camelCase names found in the
//! uploaded files. Missing numbers, strings and arrays decode to their empty
//! values rather than failing the whole report, and so does an explicit
//! `null`. Counter sums saturate at `u64::MAX`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Decode an explicit `null` the same way as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Categorical coverage label attached to a feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CoverageState {
    /// The feature has automated tests covering it fully.
    Full,
    /// The feature is partially covered.
    Partial,
    /// The feature has no automated coverage.
    None,
    /// Any label the analyzer emitted that is not one of the above.
    Unknown(String),
}

impl CoverageState {
    /// The label as it appears in the JSON document.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::None => "none",
            Self::Unknown(label) => label,
        }
    }
}

impl Default for CoverageState {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for CoverageState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "full" => Self::Full,
            "partial" => Self::Partial,
            "none" => Self::None,
            _ => Self::Unknown(value),
        }
    }
}

impl From<CoverageState> for String {
    fn from(value: CoverageState) -> Self {
        match value {
            CoverageState::Unknown(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for CoverageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of an action plan item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Criticality {
    /// Address first.
    High,
    /// Address soon.
    Medium,
    /// Address when convenient.
    Low,
    /// A label outside the three tiers; kept but never grouped.
    Unrecognized(String),
}

impl Criticality {
    /// The fixed presentation order of the recognized tiers.
    pub const TIERS: [Criticality; 3] = [Self::High, Self::Medium, Self::Low];

    /// The label as it appears in the JSON document.
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unrecognized(label) => label,
        }
    }
}

impl Default for Criticality {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<String> for Criticality {
    fn from(value: String) -> Self {
        match value.as_str() {
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<Criticality> for String {
    fn from(value: Criticality) -> Self {
        match value {
            Criticality::Unrecognized(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository context of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportContext {
    /// Repository identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub repository: String,
    /// Paths analyzed, in analysis order.
    #[serde(deserialize_with = "null_as_default")]
    pub paths_analyzed: Vec<String>,
}

/// Per test-type counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TestTypeStats {
    /// Features with at least one test of this type.
    #[serde(deserialize_with = "null_as_default")]
    pub features_covered: u64,
    /// Test files of this type.
    #[serde(deserialize_with = "null_as_default")]
    pub test_file_count: u64,
}

/// Feature coverage-state counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureCoverageStats {
    /// Total features analyzed.
    #[serde(deserialize_with = "null_as_default")]
    pub total_features: u64,
    /// Features in the `full` state.
    #[serde(deserialize_with = "null_as_default")]
    pub fully_covered: u64,
    /// Features in the `partial` state.
    #[serde(deserialize_with = "null_as_default")]
    pub partially_covered: u64,
    /// Features in the `none` state.
    #[serde(deserialize_with = "null_as_default")]
    pub no_automated_coverage: u64,
}

/// Aggregate statistics of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    /// Unit test counters.
    #[serde(deserialize_with = "null_as_default")]
    pub unit: TestTypeStats,
    /// Integration test counters.
    #[serde(deserialize_with = "null_as_default")]
    pub integration: TestTypeStats,
    /// End-to-end test counters.
    #[serde(deserialize_with = "null_as_default")]
    pub e2e: TestTypeStats,
    /// Coverage-state counters.
    #[serde(deserialize_with = "null_as_default")]
    pub feature_coverage: FeatureCoverageStats,
}

/// Unit and integration test counts of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitIntegrationCounts {
    /// Unit tests.
    #[serde(deserialize_with = "null_as_default")]
    pub unit_test_count: u64,
    /// Integration tests.
    #[serde(deserialize_with = "null_as_default")]
    pub integration_test_count: u64,
}

/// End-to-end test count of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct E2eCounts {
    /// End-to-end tests.
    #[serde(deserialize_with = "null_as_default")]
    pub test_count: u64,
}

/// One identifiable unit of product functionality.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Feature {
    /// Identifier, unique within one report.
    #[serde(deserialize_with = "null_as_default")]
    pub feature_key: String,
    /// Human label.
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Location of the implementation.
    #[serde(deserialize_with = "null_as_default")]
    pub source_module_path: String,
    /// Unit and integration test counts.
    #[serde(deserialize_with = "null_as_default")]
    pub unit_integration: UnitIntegrationCounts,
    /// End-to-end test count.
    #[serde(deserialize_with = "null_as_default")]
    pub e2e: E2eCounts,
    /// Coverage label.
    #[schema(value_type = String)]
    #[serde(deserialize_with = "null_as_default")]
    pub coverage_state: CoverageState,
}

impl Feature {
    /// Sum of unit, integration and end-to-end tests.
    pub fn total_tests(&self) -> u64 {
        self.unit_integration
            .unit_test_count
            .saturating_add(self.unit_integration.integration_test_count)
            .saturating_add(self.e2e.test_count)
    }
}

/// A feature flagged as lacking test visibility.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct BlindSpot {
    /// Feature identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub feature_key: String,
    /// Human label.
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Free-text reason, grouped by exact equality.
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
}

/// Advisory note about a feature's coverage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Concern {
    /// Feature identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub feature_key: String,
    /// Human label.
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Free-text reason.
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
}

/// A recommended follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionItem {
    /// What to do.
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    /// How urgently.
    #[schema(value_type = String)]
    #[serde(deserialize_with = "null_as_default")]
    pub criticality: Criticality,
}

/// One analysis run for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverageReport {
    /// Timestamp of the analysis.
    #[serde(deserialize_with = "null_as_default")]
    pub generated_at: String,
    /// Repository context.
    #[serde(deserialize_with = "null_as_default")]
    pub context: ReportContext,
    /// Aggregate statistics.
    #[serde(deserialize_with = "null_as_default")]
    pub statistics: Statistics,
    /// Features in source order.
    #[serde(deserialize_with = "null_as_default")]
    pub features: Vec<Feature>,
    /// Advisory concerns.
    #[serde(deserialize_with = "null_as_default")]
    pub coverage_concerns: Vec<Concern>,
    /// Flagged blind spots.
    #[serde(deserialize_with = "null_as_default")]
    pub blind_spots: Vec<BlindSpot>,
    /// Recommended actions.
    #[serde(deserialize_with = "null_as_default")]
    pub action_plan: Vec<ActionItem>,
}

/// A report held in the list of loaded reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredReport {
    /// Opaque id from the persistence layer, or `default-N` for bundled data.
    pub id: String,
    /// Repository label shown in report pickers.
    pub repository: String,
    /// The report itself.
    pub data: CoverageReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_state_keeps_unknown_labels() {
        let feature: Feature = serde_json::from_str(
            r#"{"featureKey":"a","coverageState":"flaky","e2e":{"testCount":2}}"#,
        )
        .expect("feature");

        assert_eq!(
            feature.coverage_state,
            CoverageState::Unknown("flaky".to_string())
        );
        assert_eq!(feature.total_tests(), 2);
        let encoded = serde_json::to_value(&feature).expect("encode");
        assert_eq!(encoded["coverageState"], "flaky");
    }

    #[test]
    fn missing_statistics_decode_as_zero() {
        let report: CoverageReport =
            serde_json::from_str(r#"{"context":{"repository":"web"},"statistics":{"unit":{}}}"#)
                .expect("report");

        assert_eq!(report.context.repository, "web");
        assert_eq!(report.statistics.unit.test_file_count, 0);
        assert_eq!(report.statistics.feature_coverage.total_features, 0);
        assert!(report.blind_spots.is_empty());
    }

    #[test]
    fn criticality_round_trips_labels() {
        let item: ActionItem =
            serde_json::from_str(r#"{"description":"add tests","criticality":"High"}"#)
                .expect("item");
        assert_eq!(item.criticality, Criticality::High);

        let odd: ActionItem =
            serde_json::from_str(r#"{"description":"x","criticality":"urgent"}"#).expect("item");
        assert_eq!(
            odd.criticality,
            Criticality::Unrecognized("urgent".to_string())
        );
        assert_eq!(String::from(odd.criticality), "urgent");
    }
}
