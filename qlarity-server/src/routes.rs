//! HTTP handlers for Qlarity server.

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{HttpResponse, Responder, get, post, web};
use chrono::{NaiveDateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use qlarity_core::{
    DashboardView, QlarityError, Selection, StoredReport, expand_record, select, upload_filename,
    validate,
};

use crate::models::CoverageRecord;
use crate::openapi::ApiDoc;
use crate::store::{DEFAULT_LIMIT, ReportStore};

#[derive(Clone)]
/// Shared application state for handlers.
pub struct AppState {
    /// Where uploaded documents are kept.
    pub store: Arc<dyn ReportStore>,
}

/// Error payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable error.
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: message.into(),
    })
}

fn payload_too_large(message: impl Into<String>) -> HttpResponse {
    HttpResponse::PayloadTooLarge().json(ErrorResponse {
        error: message.into(),
    })
}

fn internal_error(message: impl Into<String>) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: message.into(),
    })
}

/// Multipart upload form. Documentation only; the handler reads the stream.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadRequest {
    /// Coverage JSON file; the filename must end in `.json`.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Repository the report belongs to.
    pub repository: String,
}

/// Result of a successful upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Always true.
    pub success: bool,
    /// Identifier of the stored record.
    pub id: String,
    /// Sanitized filename derived from the repository.
    pub filename: String,
    /// Repository as submitted.
    pub repository: String,
    /// The uploaded document.
    #[schema(value_type = Object)]
    pub data: Value,
    /// Confirmation message.
    pub message: String,
}

/// A persisted upload as returned by the listing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredReportRow {
    /// Record identifier.
    pub id: String,
    /// Repository given at upload time.
    pub repository: String,
    /// Sanitized filename.
    pub filename: String,
    /// Uploaded document.
    #[schema(value_type = Object)]
    pub data: Value,
    /// Upload timestamp (UTC).
    #[schema(value_type = String)]
    pub uploaded_at: NaiveDateTime,
}

impl From<CoverageRecord> for StoredReportRow {
    fn from(record: CoverageRecord) -> Self {
        Self {
            id: record.id,
            repository: record.repository,
            filename: record.filename,
            data: record.data,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Listing of recent uploads.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportListResponse {
    /// Always true.
    pub success: bool,
    /// Newest first.
    pub reports: Vec<StoredReportRow>,
}

/// Filters for listing uploads.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Only uploads for this repository.
    pub repository: Option<String>,
    /// Maximum number of uploads (default 10).
    pub limit: Option<i64>,
}

/// Parameters for the dashboard view.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// `all` or a report id.
    pub view: Option<String>,
    /// Only uploads for this repository.
    pub repository: Option<String>,
    /// Maximum number of uploads considered (default 10).
    pub limit: Option<i64>,
}

/// Entry in the report picker.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportOption {
    /// Report id usable as `view`.
    pub id: String,
    /// Repository label.
    pub repository: String,
}

/// Dashboard payload for one selection.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    /// Selection that was rendered.
    pub selection: String,
    /// Reports available for selection.
    pub reports: Vec<ReportOption>,
    /// Computed views.
    pub view: DashboardView,
}

fn effective_limit(limit: Option<i64>) -> i64 {
    limit.filter(|value| *value > 0).unwrap_or(DEFAULT_LIMIT)
}

async fn run_blocking<T, F>(task: F) -> Result<T, String>
where
    F: FnOnce() -> Result<T, String> + Send + 'static,
    T: Send + 'static,
{
    web::block(task).await.map_err(|err| err.to_string())?
}

/// Largest accepted coverage file, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const MAX_REPOSITORY_BYTES: usize = 1024;

#[derive(Default)]
struct UploadForm {
    file_name: Option<String>,
    file: Option<Vec<u8>>,
    repository: Option<String>,
}

#[derive(Debug)]
enum FormError {
    TooLarge(String),
    Malformed(String),
}

impl From<MultipartError> for FormError {
    fn from(err: MultipartError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Buffer a field, giving up once it grows past `limit` bytes.
async fn read_field(field: &mut Field, name: &str, limit: usize) -> Result<Vec<u8>, FormError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > limit {
            return Err(FormError::TooLarge(format!(
                "Field `{name}` exceeds {limit} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Consume a field nobody asked for without keeping its bytes.
async fn skip_field(field: &mut Field) -> Result<(), FormError> {
    let mut seen = 0usize;
    while let Some(chunk) = field.next().await {
        seen += chunk?.len();
        if seen > MAX_UPLOAD_BYTES {
            return Err(FormError::TooLarge(format!(
                "Upload exceeds {MAX_UPLOAD_BYTES} bytes"
            )));
        }
    }
    Ok(())
}

async fn read_upload_form(mut payload: Multipart) -> Result<UploadForm, FormError> {
    let mut form = UploadForm::default();
    while let Some(item) = payload.next().await {
        let mut field = item?;
        let (name, file_name) = match field.content_disposition() {
            Some(disposition) => (
                disposition.get_name().map(str::to_string),
                disposition.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };
        match name.as_deref() {
            Some("file") => {
                form.file = Some(read_field(&mut field, "file", MAX_UPLOAD_BYTES).await?);
                form.file_name = file_name;
            }
            Some("repository") => {
                let bytes = read_field(&mut field, "repository", MAX_REPOSITORY_BYTES).await?;
                form.repository = Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            _ => skip_field(&mut field).await?,
        }
    }
    Ok(form)
}

/// Check an upload form and turn it into a record ready to persist.
fn prepare_upload(form: UploadForm) -> Result<CoverageRecord, String> {
    let repository = form
        .repository
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let (Some(bytes), Some(repository)) = (form.file, repository) else {
        return Err("File and repository name are required".to_string());
    };
    let file_name = form.file_name.unwrap_or_default();
    if !file_name.ends_with(".json") {
        return Err("Only JSON files are allowed".to_string());
    }
    let data: Value =
        serde_json::from_slice(&bytes).map_err(|err| QlarityError::InvalidJson(err).to_string())?;
    validate(data.clone()).map_err(|err| err.to_string())?;
    Ok(CoverageRecord {
        id: Uuid::new_v4().to_string(),
        filename: upload_filename(&repository),
        repository,
        data,
        uploaded_at: Utc::now().naive_utc(),
    })
}

/// Expand stored rows into selectable reports, skipping rows that no longer validate.
fn expand_records(records: Vec<CoverageRecord>) -> Vec<StoredReport> {
    let mut reports = Vec::new();
    for record in records {
        match expand_record(&record.id, &record.repository, record.data) {
            Ok(expanded) => reports.extend(expanded),
            Err(err) => log::warn!("skipping stored report {}: {err}", record.id),
        }
    }
    reports
}

#[utoipa::path(
    post,
    path = "/upload-coverage",
    request_body(content = UploadRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Report stored", body = UploadResponse),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "coverage"
)]
#[post("/api/upload-coverage")]
/// Accept a coverage JSON upload and persist it.
pub async fn upload_coverage(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let form = match read_upload_form(payload).await {
        Ok(form) => form,
        Err(FormError::TooLarge(err)) => {
            log::info!("rejected upload: {err}");
            return payload_too_large(err);
        }
        Err(FormError::Malformed(err)) => return bad_request(format!("malformed upload: {err}")),
    };
    let record = match prepare_upload(form) {
        Ok(record) => record,
        Err(err) => {
            log::info!("rejected upload: {err}");
            return bad_request(err);
        }
    };

    let store = state.store.clone();
    match run_blocking(move || store.insert(record)).await {
        Ok(saved) => {
            log::info!("stored coverage report {} for {}", saved.id, saved.repository);
            HttpResponse::Ok().json(UploadResponse {
                success: true,
                id: saved.id,
                filename: saved.filename,
                repository: saved.repository,
                data: saved.data,
                message: "Coverage report uploaded".to_string(),
            })
        }
        Err(err) => {
            log::error!("failed to store coverage report: {err}");
            internal_error(format!("Failed to store report: {err}"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/coverage-reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Recent uploads", body = ReportListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "coverage"
)]
#[get("/api/coverage-reports")]
/// List recent uploads, newest first.
pub async fn coverage_reports(
    state: web::Data<AppState>,
    query: web::Query<ReportQuery>,
) -> impl Responder {
    let ReportQuery { repository, limit } = query.into_inner();
    let limit = effective_limit(limit);
    let store = state.store.clone();
    match run_blocking(move || store.recent(repository.as_deref(), limit)).await {
        Ok(records) => HttpResponse::Ok().json(ReportListResponse {
            success: true,
            reports: records.into_iter().map(StoredReportRow::from).collect(),
        }),
        Err(err) => {
            log::error!("failed to fetch coverage reports: {err}");
            internal_error(format!("Failed to fetch reports: {err}"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard views", body = DashboardResponse),
        (status = 400, description = "Invalid selection", body = ErrorResponse),
        (status = 404, description = "Unknown report id", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "coverage"
)]
#[get("/api/dashboard")]
/// Compute the dashboard for the selected report or the aggregate.
pub async fn dashboard(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> impl Responder {
    let DashboardQuery {
        view,
        repository,
        limit,
    } = query.into_inner();
    let selection = match view.as_deref() {
        Some(raw) => match raw.parse::<Selection>() {
            Ok(selection) => selection,
            Err(err) => return bad_request(err.to_string()),
        },
        None => Selection::All,
    };
    let limit = effective_limit(limit);
    let store = state.store.clone();
    let records = match run_blocking(move || store.recent(repository.as_deref(), limit)).await {
        Ok(records) => records,
        Err(err) => {
            log::error!("failed to fetch coverage reports: {err}");
            return internal_error(format!("Failed to fetch reports: {err}"));
        }
    };

    let reports = expand_records(records);
    let report = match select(&reports, &selection) {
        Ok(report) => report,
        Err(err @ QlarityError::UnknownReport(_)) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: err.to_string(),
            });
        }
        Err(err) => return internal_error(err.to_string()),
    };
    HttpResponse::Ok().json(DashboardResponse {
        selection: selection.to_string(),
        reports: reports
            .into_iter()
            .map(|stored| ReportOption {
                id: stored.id,
                repository: stored.repository,
            })
            .collect(),
        view: DashboardView::build(report),
    })
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document")
    ),
    tag = "system"
)]
#[get("/api/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
