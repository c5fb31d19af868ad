use crate::domain::model::{Appointment, CheckResult, ReportSummary};
use crate::domain::rules::RuleSet;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub trait ConfigProvider: Send + Sync {
    fn input_file(&self) -> &str;
    fn lookahead_days(&self) -> i64;
    /// Fixed "now" for the lookahead window; wall clock when `None`.
    fn reference_time(&self) -> Option<NaiveDateTime>;
    fn output_dir(&self) -> Option<&str>;
    fn report_format(&self) -> ReportFormat;
    fn rules(&self) -> &RuleSet;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Where appointments are read from, for progress messages.
    fn source_name(&self) -> &str;
    async fn extract(&self) -> Result<Vec<Appointment>>;
    async fn transform(&self, data: Vec<Appointment>) -> Result<CheckResult>;
    async fn load(&self, result: CheckResult) -> Result<ReportSummary>;
}
