pub mod checker;
pub mod engine;
pub mod generator;
pub mod pipeline;
pub mod report;

pub use crate::domain::model::{Appointment, CheckResult, Flag, PatientFlags, ReportSummary};
pub use crate::domain::ports::{ConfigProvider, Pipeline, ReportFormat, Storage};
pub use crate::utils::error::Result;
