//! Persistence of uploaded coverage documents.

use std::sync::RwLock;

use diesel::prelude::*;

use crate::db::DbPool;
use crate::models::CoverageRecord;
use crate::schema::coverage_reports;

/// Default number of records returned by listing queries.
pub const DEFAULT_LIMIT: i64 = 10;

/// Storage for uploaded coverage documents.
pub trait ReportStore: Send + Sync {
    /// Persist a new record.
    fn insert(&self, record: CoverageRecord) -> Result<CoverageRecord, String>;
    /// Most recent records first, optionally restricted to one repository.
    fn recent(&self, repository: Option<&str>, limit: i64) -> Result<Vec<CoverageRecord>, String>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgReportStore {
    pool: DbPool,
}

impl PgReportStore {
    /// Create a store over an initialized pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ReportStore for PgReportStore {
    fn insert(&self, record: CoverageRecord) -> Result<CoverageRecord, String> {
        let mut conn = self.pool.get().map_err(|err| err.to_string())?;
        diesel::insert_into(coverage_reports::table)
            .values(&record)
            .execute(&mut conn)
            .map_err(|err| err.to_string())?;
        Ok(record)
    }

    fn recent(&self, repository: Option<&str>, limit: i64) -> Result<Vec<CoverageRecord>, String> {
        let mut conn = self.pool.get().map_err(|err| err.to_string())?;
        let mut query = coverage_reports::table
            .select(CoverageRecord::as_select())
            .order(coverage_reports::uploaded_at.desc())
            .limit(limit)
            .into_boxed();
        if let Some(repository) = repository {
            query = query.filter(coverage_reports::repository.eq(repository.to_string()));
        }
        query
            .load::<CoverageRecord>(&mut conn)
            .map_err(|err| err.to_string())
    }
}

/// In-process store used when no database is configured.
#[derive(Default)]
pub struct MemoryReportStore {
    records: RwLock<Vec<CoverageRecord>>,
}

impl MemoryReportStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn insert(&self, record: CoverageRecord) -> Result<CoverageRecord, String> {
        let mut records = self
            .records
            .write()
            .map_err(|_| "report store lock poisoned".to_string())?;
        records.push(record.clone());
        Ok(record)
    }

    fn recent(&self, repository: Option<&str>, limit: i64) -> Result<Vec<CoverageRecord>, String> {
        let records = self
            .records
            .read()
            .map_err(|_| "report store lock poisoned".to_string())?;
        let mut matching: Vec<CoverageRecord> = records
            .iter()
            .rev()
            .filter(|record| repository.is_none_or(|name| record.repository == name))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        matching.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ScratchDatabase;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use serde_json::json;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("timestamp")
    }

    fn record(id: &str, repository: &str, minutes: i64) -> CoverageRecord {
        CoverageRecord {
            id: id.to_string(),
            repository: repository.to_string(),
            filename: format!("{repository}.json"),
            data: json!({ "context": { "repository": repository } }),
            uploaded_at: base_time() + Duration::minutes(minutes),
        }
    }

    fn seed(store: &dyn ReportStore) {
        store.insert(record("a", "web", 0)).expect("insert a");
        store.insert(record("b", "api", 5)).expect("insert b");
        store.insert(record("c", "web", 10)).expect("insert c");
    }

    fn ids(records: &[CoverageRecord]) -> Vec<&str> {
        records.iter().map(|record| record.id.as_str()).collect()
    }

    #[test]
    fn memory_store_lists_newest_first() {
        let store = MemoryReportStore::new();
        seed(&store);

        let all = store.recent(None, DEFAULT_LIMIT).expect("recent");
        assert_eq!(ids(&all), vec!["c", "b", "a"]);

        let limited = store.recent(None, 2).expect("limited");
        assert_eq!(ids(&limited), vec!["c", "b"]);
    }

    #[test]
    fn memory_store_filters_by_repository() {
        let store = MemoryReportStore::new();
        seed(&store);

        let web = store.recent(Some("web"), DEFAULT_LIMIT).expect("web");
        assert_eq!(ids(&web), vec!["c", "a"]);
        assert!(store.recent(Some("jobs"), DEFAULT_LIMIT).expect("none").is_empty());
    }

    #[test]
    fn memory_store_prefers_later_insert_on_equal_time() {
        let store = MemoryReportStore::new();
        store.insert(record("first", "web", 0)).expect("insert");
        store.insert(record("second", "web", 0)).expect("insert");

        let listed = store.recent(None, DEFAULT_LIMIT).expect("recent");
        assert_eq!(ids(&listed), vec!["second", "first"]);
    }

    #[test]
    #[ignore = "requires PostgreSQL via TEST_DATABASE_URL"]
    fn pg_store_lists_newest_first_and_filters() {
        let scratch = ScratchDatabase::create();
        let store = PgReportStore::new(scratch.migrated_pool());
        seed(&store);

        let all = store.recent(None, DEFAULT_LIMIT).expect("recent");
        assert_eq!(ids(&all), vec!["c", "b", "a"]);

        let web = store.recent(Some("web"), 1).expect("web");
        assert_eq!(ids(&web), vec!["c"]);
        assert_eq!(web[0].data["context"]["repository"], "web");
    }
}
