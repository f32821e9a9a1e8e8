//! Recognition and normalization of uploaded coverage documents.
//!
//! Three document shapes are accepted: a bare report, a `{contexts: [...]}`
//! wrapper and a `{reports: [{name, data}, ...]}` wrapper. [`detect`] turns a
//! parsed JSON value into a [`ReportEnvelope`] and [`normalize`] flattens it
//! into the list of reports the rest of the engine works with.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::CoverageReport;
use crate::error::{QlarityError, Result};

/// An entry of the `{reports: [...]}` wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedReport {
    /// Display name that overrides the nested repository when present.
    #[serde(default)]
    pub name: Option<String>,
    /// The wrapped report.
    pub data: CoverageReport,
}

/// A recognized coverage document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEnvelope {
    /// A single report object.
    Single(CoverageReport),
    /// A `{contexts: [...]}` wrapper.
    MultiContext(Vec<CoverageReport>),
    /// A `{reports: [{name, data}, ...]}` wrapper.
    MultiReport(Vec<NamedReport>),
}

/// Classify a parsed JSON value into one of the accepted shapes.
pub fn detect(value: Value) -> Result<ReportEnvelope> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(QlarityError::UnrecognizedFormat(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            )));
        }
    };

    if matches!(object.get("reports"), Some(Value::Array(_))) {
        let reports = object.remove("reports").unwrap_or(Value::Null);
        let named: Vec<NamedReport> =
            serde_json::from_value(reports).map_err(QlarityError::InvalidReport)?;
        return Ok(ReportEnvelope::MultiReport(named));
    }

    if matches!(object.get("contexts"), Some(Value::Array(_))) {
        let contexts = object.remove("contexts").unwrap_or(Value::Null);
        let reports: Vec<CoverageReport> =
            serde_json::from_value(contexts).map_err(QlarityError::InvalidReport)?;
        return Ok(ReportEnvelope::MultiContext(reports));
    }

    if object.contains_key("context") {
        let report: CoverageReport =
            serde_json::from_value(Value::Object(object)).map_err(QlarityError::InvalidReport)?;
        return Ok(ReportEnvelope::Single(report));
    }

    Err(QlarityError::UnrecognizedFormat(
        "object has none of `context`, `contexts` or `reports`".to_string(),
    ))
}

/// Flatten an envelope into reports, applying wrapper names as repositories.
pub fn normalize(envelope: ReportEnvelope) -> Vec<CoverageReport> {
    match envelope {
        ReportEnvelope::Single(report) => vec![report],
        ReportEnvelope::MultiContext(reports) => reports,
        ReportEnvelope::MultiReport(named) => named
            .into_iter()
            .map(|entry| {
                let mut report = entry.data;
                if let Some(name) = entry.name.filter(|name| !name.is_empty()) {
                    report.context.repository = name;
                }
                report
            })
            .collect(),
    }
}

/// Detect and normalize a parsed JSON value.
pub fn validate(value: Value) -> Result<Vec<CoverageReport>> {
    detect(value).map(normalize)
}

/// Parse JSON text and return the normalized reports it contains.
pub fn parse_reports(text: &str) -> Result<Vec<CoverageReport>> {
    let value: Value = serde_json::from_str(text)?;
    validate(value)
}

/// Pick a repository label for an upload the way the dashboard uploader does.
pub fn infer_repository(value: &Value) -> String {
    if let Some(repository) = value
        .pointer("/context/repository")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
    {
        return repository.to_string();
    }
    if let Some(name) = value
        .pointer("/reports/0/name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
    {
        return name.to_string();
    }
    if let Some(reports) = value.get("reports").and_then(Value::as_array) {
        if reports.len() == 1 {
            return reports[0]
                .pointer("/data/context/repository")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .unwrap_or("merged-report")
                .to_string();
        }
    }
    "unknown".to_string()
}

/// Replace every character outside `[a-zA-Z0-9-]` with `-`.
pub fn sanitize_repository(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' {
                ch
            } else {
                '-'
            }
        })
        .collect()
}

/// Filename under which an upload for `repository` is recorded.
pub fn upload_filename(repository: &str) -> String {
    format!("{}.json", sanitize_repository(repository))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
