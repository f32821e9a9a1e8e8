//! OpenAPI specification for Qlarity server.

use utoipa::OpenApi;

use qlarity_core::{
    ActionGroups, ActionItem, BlindSpot, BlindSpotGroup, Concern, CoverageOverview,
    CoverageReport, DashboardView, E2eCounts, Feature, FeatureCoverageStats, FeatureRisk,
    FeaturesMap, PyramidLayer, ReportContext, RiskLevel, RiskMatrix, RiskSignals, StateFilter,
    Statistics, TestPyramid, TestTypeStats, UnitIntegrationCounts,
};

use crate::routes::{
    DashboardResponse, ErrorResponse, ReportListResponse, ReportOption, StoredReportRow,
    UploadRequest, UploadResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::upload_coverage,
        crate::routes::coverage_reports,
        crate::routes::dashboard,
        crate::routes::openapi_json
    ),
    components(
        schemas(
            UploadRequest,
            UploadResponse,
            StoredReportRow,
            ReportListResponse,
            ReportOption,
            DashboardResponse,
            ErrorResponse,
            DashboardView,
            CoverageReport,
            ReportContext,
            Statistics,
            TestTypeStats,
            FeatureCoverageStats,
            Feature,
            UnitIntegrationCounts,
            E2eCounts,
            Concern,
            BlindSpot,
            ActionItem,
            CoverageOverview,
            TestPyramid,
            PyramidLayer,
            FeaturesMap,
            StateFilter,
            RiskMatrix,
            FeatureRisk,
            RiskSignals,
            RiskLevel,
            BlindSpotGroup,
            ActionGroups
        )
    ),
    tags(
        (name = "coverage", description = "Coverage report upload and dashboard"),
        (name = "system", description = "System endpoints")
    )
)]
/// OpenAPI specification for the Qlarity server.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn openapi_includes_expected_paths() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;

        assert!(paths.contains_key("/upload-coverage"));
        assert!(paths.contains_key("/coverage-reports"));
        assert!(paths.contains_key("/dashboard"));
        assert!(paths.contains_key("/openapi.json"));
    }

    #[test]
    fn openapi_registers_dashboard_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = doc.components.expect("components").schemas;

        assert!(schemas.contains_key("DashboardView"));
        assert!(schemas.contains_key("RiskMatrix"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
