#![deny(missing_docs)]
//! Qlarity command-line interface.
//!
//! Uploads coverage reports to a Qlarity server and renders the dashboard
//! for stored or local reports.

mod api;

use api::{
    CoverageApi, DEFAULT_SERVER_URL, ReportQuery, ServerReport, UploadPayload, normalize_server_url,
};
#[cfg(not(test))]
use clap::Parser;
use clap::{Args, Subcommand, ValueEnum};
use qlarity_core::{
    ALL_REPORTS, DEFAULT_FALLBACK_PATH, DashboardView, QlarityError, Section, Selection,
    StdFileSystem, StoredReport, expand_record, infer_repository, load_bundled, load_report_files,
    render_dashboard_markdown, render_dashboard_text, render_json, select, validate,
};
use serde_json::Value;
use std::fmt::Write;
use std::path::{Path, PathBuf};

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const DEFAULT_LIMIT: i64 = 10;

#[derive(clap::Parser)]
#[command(name = "qlarity", version, about = "Qlarity coverage dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ServerArgs {
    /// Base URL of the Qlarity server.
    #[arg(long, env = "QLARITY_API_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
}

#[derive(Args, Clone)]
struct ViewArgs {
    /// `all` for the aggregate, or a report id.
    #[arg(long, default_value = ALL_REPORTS)]
    view: Selection,
    /// Sections to render (repeatable or comma-separated); every section when omitted.
    #[arg(long = "section", value_delimiter = ',')]
    sections: Vec<Section>,
}

impl ViewArgs {
    fn sections(&self) -> Vec<Section> {
        if self.sections.is_empty() {
            Section::ALL.to_vec()
        } else {
            self.sections.clone()
        }
    }
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Args, Clone)]
struct UploadArgs {
    /// Coverage report JSON file.
    #[arg(short, long)]
    file: PathBuf,
    /// Repository name; inferred from the file when omitted.
    #[arg(long)]
    repository: Option<String>,
    #[command(flatten)]
    server: ServerArgs,
}

#[derive(Args, Clone)]
struct ShowArgs {
    #[command(flatten)]
    server: ServerArgs,
    /// Only reports uploaded for this repository.
    #[arg(long)]
    repository: Option<String>,
    /// Maximum number of uploads to fetch.
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: i64,
    /// Bundled dataset used when the server is unreachable or empty.
    #[arg(long, env = "QLARITY_FALLBACK_DATA", default_value = DEFAULT_FALLBACK_PATH)]
    fallback: PathBuf,
    #[command(flatten)]
    view: ViewArgs,
    #[command(flatten)]
    report: OutputArgs,
}

#[derive(Args, Clone)]
struct InspectArgs {
    /// Local coverage report files.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[command(flatten)]
    view: ViewArgs,
    #[command(flatten)]
    report: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a coverage report and upload it to the server.
    Upload(UploadArgs),
    /// Render the dashboard for reports stored on the server.
    Show(ShowArgs),
    /// Render the dashboard for local report files.
    Inspect(InspectArgs),
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload(args) => {
            let api = api::ReqwestCoverageApi::new()?;
            run_upload(args, &api).await?
        }
        Commands::Show(args) => {
            let api = api::ReqwestCoverageApi::new()?;
            run_show(args, &api).await?
        }
        Commands::Inspect(args) => run_inspect(args).await?,
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

async fn run_upload<C: CoverageApi>(args: UploadArgs, api: &C) -> CliResult<()> {
    let server_url = normalize_server_url(&args.server.server_url)?;
    let payload = prepare_upload(&args.file, args.repository.as_deref()).await?;
    log::info!(
        "uploading {} for {} to {server_url}",
        payload.file_name,
        payload.repository
    );
    let response = api.upload(&server_url, payload).await?;
    println!(
        "Uploaded {} for {} (id {}). {}",
        response.filename, response.repository, response.id, response.message
    );
    Ok(())
}

/// Read and validate a report file locally before it is sent.
async fn prepare_upload(path: &Path, repository: Option<&str>) -> CliResult<UploadPayload> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !file_name.ends_with(".json") {
        return Err(format!("{} is not a .json file", path.display()).into());
    }
    let contents = tokio::fs::read(path).await?;
    let value: Value = serde_json::from_slice(&contents).map_err(QlarityError::InvalidJson)?;
    validate(value.clone())?;
    let repository = match repository.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => infer_repository(&value),
    };
    Ok(UploadPayload {
        file_name,
        contents,
        repository,
    })
}

async fn run_show<C: CoverageApi>(args: ShowArgs, api: &C) -> CliResult<()> {
    let server_url = normalize_server_url(&args.server.server_url)?;
    let query = ReportQuery {
        repository: args.repository.clone(),
        limit: args.limit,
    };
    let records = load_records(api, &server_url, &query, &args.fallback).await?;
    emit_dashboard(&records, &args.view, &args.report).await
}

async fn run_inspect(args: InspectArgs) -> CliResult<()> {
    let records = load_report_files(&StdFileSystem::new(), &args.files)?;
    emit_dashboard(&records, &args.view, &args.report).await
}

/// Fetch stored reports, falling back to the bundled dataset when the
/// server fails or has nothing to show.
async fn load_records<C: CoverageApi>(
    api: &C,
    server_url: &str,
    query: &ReportQuery,
    fallback: &Path,
) -> CliResult<Vec<StoredReport>> {
    match api.fetch_reports(server_url, query).await {
        Ok(rows) => {
            let records = expand_rows(rows);
            if !records.is_empty() {
                return Ok(records);
            }
            log::info!(
                "no stored reports; using bundled data from {}",
                fallback.display()
            );
        }
        Err(err) => {
            log::warn!(
                "failed to fetch reports from {server_url}: {err}; using bundled data from {}",
                fallback.display()
            );
        }
    }
    load_bundled(&StdFileSystem::new(), fallback)
        .map_err(|err| format!("bundled data {} unavailable: {err}", fallback.display()).into())
}

fn expand_rows(rows: Vec<ServerReport>) -> Vec<StoredReport> {
    let mut records = Vec::new();
    for row in rows {
        match expand_record(&row.id, &row.repository, row.data) {
            Ok(expanded) => records.extend(expanded),
            Err(err) => log::warn!("skipping stored report {} ({}): {err}", row.id, row.filename),
        }
    }
    records
}

async fn emit_dashboard(
    records: &[StoredReport],
    view: &ViewArgs,
    output: &OutputArgs,
) -> CliResult<()> {
    let report = select(records, &view.view)?;
    let dashboard = DashboardView::build(report);
    let sections = view.sections();
    let contents = match output.format {
        OutputFormat::Text => {
            let mut text = render_dashboard_text(&dashboard, &sections);
            text.push_str(&render_report_list(records, &view.view));
            text
        }
        OutputFormat::Markdown => render_dashboard_markdown(&dashboard, &sections),
        OutputFormat::Json => format!("{}\n", render_json(&dashboard)?),
    };
    emit_output(output, contents).await
}

fn render_report_list(records: &[StoredReport], selection: &Selection) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "\nReports:");
    let marker = |active: bool| if active { "*" } else { " " };
    let _ = writeln!(
        output,
        "{} {ALL_REPORTS} (All ({}))",
        marker(*selection == Selection::All),
        records.len()
    );
    for record in records {
        let active = matches!(selection, Selection::Report(id) if *id == record.id);
        let _ = writeln!(
            output,
            "{} {} ({})",
            marker(active),
            record.id,
            record.repository
        );
    }
    output
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}
