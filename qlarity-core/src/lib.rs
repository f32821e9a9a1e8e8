#![deny(missing_docs)]
//! Qlarity core library.
//!
//! This crate contains the coverage report model and the engine that
//! validates, aggregates, classifies and groups reports for display.

pub mod aggregate;
pub mod domain;
pub mod error;
pub mod fs;
pub mod grouping;
pub mod ingest;
pub mod report;
pub mod risk;
pub mod selection;
pub mod views;

pub use aggregate::{aggregate, aggregate_at};
pub use domain::{
    ActionItem, BlindSpot, Concern, CoverageReport, CoverageState, Criticality, E2eCounts,
    Feature, FeatureCoverageStats, ReportContext, Statistics, StoredReport, TestTypeStats,
    UnitIntegrationCounts,
};
pub use error::{QlarityError, Result};
pub use fs::{
    DEFAULT_FALLBACK_PATH, FileSystem, StdFileSystem, load_bundled, load_report_files,
};
pub use grouping::{
    ActionGroups, BlindSpotGroup, group_blind_spots, group_by_criticality, group_by_size,
};
pub use ingest::{
    NamedReport, ReportEnvelope, detect, infer_repository, normalize, parse_reports,
    sanitize_repository, upload_filename, validate,
};
pub use report::{Section, render_dashboard_markdown, render_dashboard_text, render_json};
pub use risk::{FeatureRisk, RiskLevel, RiskMatrix, RiskSignals, assess, classify};
pub use selection::{
    ALL_REPORTS, Selection, expand_record, records_from_reports, select,
};
pub use views::{
    CoverageOverview, DashboardView, FeatureOrder, FeaturesMap, PyramidLayer, StateFilter,
    TestPyramid, percent, sort_features,
};
