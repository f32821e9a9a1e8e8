//! Resolution of the report to display from the loaded report list.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::aggregate::aggregate;
use crate::domain::{CoverageReport, StoredReport};
use crate::error::{QlarityError, Result};
use crate::ingest::validate;

/// Sentinel that selects every loaded report.
pub const ALL_REPORTS: &str = "all";

/// Which report the caller wants to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// The aggregate of every loaded report.
    #[default]
    All,
    /// One report by id.
    Report(String),
}

impl FromStr for Selection {
    type Err = QlarityError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(QlarityError::Other("selection cannot be empty".to_string()));
        }
        if trimmed == ALL_REPORTS {
            Ok(Self::All)
        } else {
            Ok(Self::Report(trimmed.to_string()))
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_REPORTS),
            Self::Report(id) => f.write_str(id),
        }
    }
}

/// Return the report to render for `selection`.
///
/// `All` aggregates every record (an empty list yields the empty aggregate);
/// an id not present in `records` is an error.
pub fn select(records: &[StoredReport], selection: &Selection) -> Result<CoverageReport> {
    match selection {
        Selection::All => {
            let reports: Vec<CoverageReport> =
                records.iter().map(|record| record.data.clone()).collect();
            Ok(aggregate(&reports))
        }
        Selection::Report(id) => records
            .iter()
            .find(|record| &record.id == id)
            .map(|record| record.data.clone())
            .ok_or_else(|| QlarityError::UnknownReport(id.clone())),
    }
}

/// Wrap bundled reports as records with `default-N` ids.
pub fn records_from_reports(reports: Vec<CoverageReport>) -> Vec<StoredReport> {
    reports
        .into_iter()
        .enumerate()
        .map(|(idx, report)| StoredReport {
            id: format!("default-{idx}"),
            repository: report.context.repository.clone(),
            data: report,
        })
        .collect()
}

/// Turn one persisted JSON document into records.
///
/// A document holding one report keeps `id`; a wrapper with several reports
/// yields `{id}-{n}` ids and takes each repository from the report itself.
pub fn expand_record(id: &str, repository: &str, data: Value) -> Result<Vec<StoredReport>> {
    let reports = validate(data)?;
    if reports.len() == 1 {
        let report = reports.into_iter().next().unwrap_or_default();
        return Ok(vec![StoredReport {
            id: id.to_string(),
            repository: repository.to_string(),
            data: report,
        }]);
    }
    Ok(reports
        .into_iter()
        .enumerate()
        .map(|(idx, report)| StoredReport {
            id: format!("{id}-{idx}"),
            repository: report.context.repository.clone(),
            data: report,
        })
        .collect())
}
