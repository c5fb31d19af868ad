use crate::core::checker::check_appointments;
use crate::core::report::{render_json, render_text, EMPTY_WINDOW_MESSAGE};
use crate::core::{Appointment, CheckResult, ConfigProvider, Pipeline, ReportSummary, Storage};
use crate::domain::ports::ReportFormat;
use crate::utils::error::{CheckError, Result};
use chrono::Local;

pub const REPORT_FILE: &str = "scheduler_report.txt";
pub const FLAGGED_FILE: &str = "flagged_patients.json";

/// Reads the appointment CSV, checks every patient in the lookahead window and
/// renders the scheduler reports.
pub struct SchedulePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> SchedulePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

/// Parses appointment CSV bytes. Row errors carry the 1-based line number.
pub fn parse_appointments(data: &[u8]) -> Result<Vec<Appointment>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut appointments = Vec::new();
    for row in reader.deserialize::<Appointment>() {
        match row {
            Ok(appointment) => appointments.push(appointment),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                return Err(CheckError::InvalidRecord {
                    line,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(appointments)
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SchedulePipeline<S, C> {
    fn source_name(&self) -> &str {
        self.config.input_file()
    }

    async fn extract(&self) -> Result<Vec<Appointment>> {
        let path = self.config.input_file();
        tracing::debug!("Reading appointments from {}", path);

        let data = self.storage.read_file(path).await?;
        let appointments = parse_appointments(&data)?;

        tracing::debug!("Parsed {} appointment rows", appointments.len());
        Ok(appointments)
    }

    async fn transform(&self, data: Vec<Appointment>) -> Result<CheckResult> {
        let now = self
            .config
            .reference_time()
            .unwrap_or_else(|| Local::now().naive_local());

        tracing::debug!(
            "Checking window {} + {} days with {} rules",
            now,
            self.config.lookahead_days(),
            self.config.rules().len()
        );

        check_appointments(&data, self.config.rules(), now, self.config.lookahead_days())
    }

    async fn load(&self, result: CheckResult) -> Result<ReportSummary> {
        if result.is_window_empty() {
            return Ok(ReportSummary {
                rendered: EMPTY_WINDOW_MESSAGE.to_string(),
                flagged_patients: 0,
                written_files: vec![],
            });
        }

        let text = render_text(&result);
        let json = render_json(&result)?;

        let mut written_files = Vec::new();
        if let Some(dir) = self.config.output_dir() {
            let report_path = format!("{}/{}", dir.trim_end_matches('/'), REPORT_FILE);
            let flagged_path = format!("{}/{}", dir.trim_end_matches('/'), FLAGGED_FILE);

            self.storage.write_file(&report_path, text.as_bytes()).await?;
            self.storage.write_file(&flagged_path, json.as_bytes()).await?;
            written_files.push(report_path);
            written_files.push(flagged_path);
        }

        let rendered = match self.config.report_format() {
            ReportFormat::Text => text,
            ReportFormat::Json => json,
        };

        Ok(ReportSummary {
            rendered,
            flagged_patients: result.flagged.len(),
            written_files,
        })
    }
}
