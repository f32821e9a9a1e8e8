//! Database models for Qlarity server.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::coverage_reports;

#[derive(Debug, Clone, PartialEq, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = coverage_reports)]
/// Uploaded coverage document.
pub struct CoverageRecord {
    /// Record identifier.
    pub id: String,
    /// Repository name given at upload time.
    pub repository: String,
    /// Sanitized filename derived from the repository.
    pub filename: String,
    /// Parsed JSON document as uploaded.
    pub data: serde_json::Value,
    /// Upload timestamp.
    pub uploaded_at: NaiveDateTime,
}
