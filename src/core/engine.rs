use crate::core::{Pipeline, ReportSummary};
use crate::utils::error::Result;
use crate::utils::monitor::PhaseMonitor;

/// Exit status when the check ran, patients were flagged and the caller asked
/// for flags to fail the run.
pub const FLAGGED_EXIT_CODE: i32 = 4;

/// Process exit status for a finished run.
pub fn exit_status(result: &Result<ReportSummary>, fail_on_flags: bool) -> i32 {
    match result {
        Ok(summary) if fail_on_flags && summary.flagged_patients > 0 => FLAGGED_EXIT_CODE,
        Ok(_) => 0,
        Err(e) => e.exit_code(),
    }
}

/// Runs a pipeline end to end and prints progress the way operators expect
/// to read it in container logs.
pub struct CheckEngine<P: Pipeline> {
    pipeline: P,
    monitor: PhaseMonitor,
}

impl<P: Pipeline> CheckEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: PhaseMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<ReportSummary> {
        let appointments = self.pipeline.extract().await?;
        println!(
            "Loaded {} total appointments from '{}'.",
            appointments.len(),
            self.pipeline.source_name()
        );
        self.monitor.log_phase("extract");

        let result = self.pipeline.transform(appointments).await?;
        println!(
            "Filtered to {} appointments scheduled in the next {} days.",
            result.in_window, result.lookahead_days
        );
        tracing::info!(
            patients = result.patients_checked,
            flagged = result.flagged.len(),
            flags = result.flag_count(),
            "schedule check complete"
        );
        self.monitor.log_phase("check");

        let summary = self.pipeline.load(result).await?;
        println!("{}", summary.rendered);
        for path in &summary.written_files {
            tracing::info!("Report saved to: {}", path);
        }
        self.monitor.log_final();

        Ok(summary)
    }
}
