//! Merging of several repository reports into one synthetic report.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{
    CoverageReport, FeatureCoverageStats, ReportContext, Statistics, TestTypeStats,
};

/// Merge `reports` into a single report stamped with the current time.
pub fn aggregate(reports: &[CoverageReport]) -> CoverageReport {
    aggregate_at(reports, Utc::now())
}

/// Merge `reports` into a single report stamped with `generated_at`.
///
/// Counters are summed, lists are concatenated in input order and every
/// feature's `sourceModulePath` is prefixed with its repository so modules with
/// the same path in different repositories stay distinguishable. Feature keys
/// are left untouched. The repository label is always `All (N)`, even for a
/// single input.
pub fn aggregate_at(reports: &[CoverageReport], generated_at: DateTime<Utc>) -> CoverageReport {
    let mut merged = CoverageReport {
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        context: ReportContext {
            repository: format!("All ({})", reports.len()),
            paths_analyzed: Vec::new(),
        },
        ..CoverageReport::default()
    };

    for report in reports {
        let repository = report.context.repository.as_str();
        merged
            .context
            .paths_analyzed
            .extend(report.context.paths_analyzed.iter().cloned());
        add_statistics(&mut merged.statistics, &report.statistics);
        merged
            .features
            .extend(report.features.iter().cloned().map(|mut feature| {
                feature.source_module_path =
                    format!("{repository}/{}", feature.source_module_path);
                feature
            }));
        merged
            .coverage_concerns
            .extend(report.coverage_concerns.iter().cloned());
        merged.blind_spots.extend(report.blind_spots.iter().cloned());
        merged.action_plan.extend(report.action_plan.iter().cloned());
    }

    merged
}

fn add_statistics(total: &mut Statistics, other: &Statistics) {
    add_test_type(&mut total.unit, &other.unit);
    add_test_type(&mut total.integration, &other.integration);
    add_test_type(&mut total.e2e, &other.e2e);
    add_feature_coverage(&mut total.feature_coverage, &other.feature_coverage);
}

fn add_test_type(total: &mut TestTypeStats, other: &TestTypeStats) {
    total.features_covered = total.features_covered.saturating_add(other.features_covered);
    total.test_file_count = total.test_file_count.saturating_add(other.test_file_count);
}

fn add_feature_coverage(total: &mut FeatureCoverageStats, other: &FeatureCoverageStats) {
    total.total_features = total.total_features.saturating_add(other.total_features);
    total.fully_covered = total.fully_covered.saturating_add(other.fully_covered);
    total.partially_covered = total.partially_covered.saturating_add(other.partially_covered);
    total.no_automated_coverage = total.no_automated_coverage.saturating_add(other.no_automated_coverage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ActionItem, BlindSpot, CoverageState, Criticality, E2eCounts, Feature,
        UnitIntegrationCounts,
    };
    use chrono::TimeZone;

    fn feature(key: &str, path: &str) -> Feature {
        Feature {
            feature_key: key.to_string(),
            display_name: key.to_uppercase(),
            source_module_path: path.to_string(),
            unit_integration: UnitIntegrationCounts {
                unit_test_count: 4,
                integration_test_count: 2,
            },
            e2e: E2eCounts { test_count: 1 },
            coverage_state: CoverageState::Partial,
        }
    }

    fn report(repository: &str, unit_files: u64, features: Vec<Feature>) -> CoverageReport {
        CoverageReport {
            generated_at: "2024-06-01T00:00:00Z".to_string(),
            context: ReportContext {
                repository: repository.to_string(),
                paths_analyzed: vec!["src".to_string()],
            },
            statistics: Statistics {
                unit: TestTypeStats {
                    features_covered: 2,
                    test_file_count: unit_files,
                },
                integration: TestTypeStats {
                    features_covered: 1,
                    test_file_count: 3,
                },
                e2e: TestTypeStats {
                    features_covered: 1,
                    test_file_count: 1,
                },
                feature_coverage: FeatureCoverageStats {
                    total_features: features.len() as u64,
                    fully_covered: 0,
                    partially_covered: features.len() as u64,
                    no_automated_coverage: 0,
                },
            },
            features,
            coverage_concerns: Vec::new(),
            blind_spots: vec![BlindSpot {
                feature_key: "k".to_string(),
                display_name: "K".to_string(),
                reason: "no e2e".to_string(),
            }],
            action_plan: vec![ActionItem {
                description: format!("test {repository}"),
                criticality: Criticality::High,
            }],
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn aggregate_of_nothing_is_an_empty_report() {
        let merged = aggregate_at(&[], fixed_time());

        assert_eq!(merged.context.repository, "All (0)");
        assert!(merged.features.is_empty());
        assert!(merged.context.paths_analyzed.is_empty());
        assert_eq!(merged.statistics, Statistics::default());
        assert_eq!(merged.generated_at, "2025-03-04T05:06:07.000Z");
    }

    #[test]
    fn aggregate_of_one_report_relabels_repository() {
        let single = report("web", 5, vec![feature("login", "src/login")]);
        let merged = aggregate_at(std::slice::from_ref(&single), fixed_time());

        assert_eq!(merged.context.repository, "All (1)");
        assert_ne!(merged.context.repository, single.context.repository);
        assert_ne!(merged.generated_at, single.generated_at);
        assert_eq!(merged.features.len(), single.features.len());
        assert_eq!(merged.statistics, single.statistics);
        assert_eq!(merged.features[0].source_module_path, "web/src/login");
    }

    #[test]
    fn aggregate_sums_and_concatenates() {
        let first = report(
            "web",
            5,
            vec![feature("login", "src/login"), feature("cart", "src/cart")],
        );
        let second = report("api", 7, vec![feature("login", "src/login")]);
        let merged = aggregate_at(&[first.clone(), second.clone()], fixed_time());

        assert_eq!(
            merged.statistics.unit.test_file_count,
            first.statistics.unit.test_file_count + second.statistics.unit.test_file_count
        );
        assert_eq!(merged.statistics.feature_coverage.total_features, 3);
        assert_eq!(merged.statistics.feature_coverage.partially_covered, 3);
        assert_eq!(merged.features.len(), 3);
        assert_eq!(merged.context.paths_analyzed, vec!["src", "src"]);
        assert_eq!(merged.blind_spots.len(), 2);
        assert_eq!(merged.action_plan[1].description, "test api");

        let origins = ["web", "web", "api"];
        for (feature, origin) in merged.features.iter().zip(origins) {
            assert!(feature.source_module_path.starts_with(&format!("{origin}/")));
        }
        // Keys are not namespaced, so the two `login` features collide.
        assert_eq!(merged.features[0].feature_key, merged.features[2].feature_key);
    }

    #[test]
    fn aggregate_saturates_counter_sums() {
        let inputs = vec![
            report("web", u64::MAX, vec![feature("a", "a")]),
            report("api", u64::MAX, vec![feature("b", "b")]),
        ];
        let merged = aggregate_at(&inputs, fixed_time());
        assert_eq!(merged.statistics.unit.test_file_count, u64::MAX);
        assert_eq!(merged.statistics.integration.test_file_count, 6);
    }

    #[test]
    fn aggregate_is_deterministic_for_fixed_time() {
        let inputs = vec![report("web", 1, vec![feature("a", "a")])];
        assert_eq!(
            aggregate_at(&inputs, fixed_time()),
            aggregate_at(&inputs, fixed_time())
        );
    }
}
