use crate::domain::datetime;
use crate::domain::ports::ReportFormat;
use chrono::NaiveDateTime;
use clap::Parser;

fn parse_reference_time(value: &str) -> Result<NaiveDateTime, String> {
    datetime::parse(value).ok_or_else(|| format!("expected YYYY-MM-DD[ HH:MM[:SS]], got '{}'", value))
}

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "scheduler-check")]
#[command(about = "Checks upcoming patient appointments against sequencing rules and reports errors per scheduler")]
pub struct CliConfig {
    /// Appointment CSV to check
    #[arg(long)]
    pub input_file: Option<String>,

    /// How many days ahead of now to check
    #[arg(long)]
    pub lookahead_days: Option<i64>,

    /// Treat this time as "now" instead of the wall clock
    #[arg(long, value_parser = parse_reference_time)]
    pub now: Option<NaiveDateTime>,

    /// Also write the report and flagged patients as files into this directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Report format printed to stdout
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,

    /// TOML file with [check] settings and [[rules]]
    #[arg(short, long)]
    pub config: Option<String>,

    /// Exit with status 4 when any patient is flagged
    #[arg(long)]
    pub fail_on_flags: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Log process CPU and memory after each phase
    #[arg(long)]
    pub monitor: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_is_valid() {
        let cli = CliConfig::try_parse_from(["scheduler-check"]).unwrap();
        assert!(cli.input_file.is_none());
        assert!(!cli.fail_on_flags);
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = CliConfig::try_parse_from([
            "scheduler-check",
            "--input-file",
            "data/appts.csv",
            "--lookahead-days",
            "30",
            "--now",
            "2025-03-01 08:00",
            "--output-dir",
            "reports",
            "--format",
            "json",
            "--fail-on-flags",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.input_file.as_deref(), Some("data/appts.csv"));
        assert_eq!(cli.lookahead_days, Some(30));
        assert_eq!(cli.now, datetime::parse("2025-03-01 08:00:00"));
        assert_eq!(cli.format, Some(ReportFormat::Json));
        assert!(cli.fail_on_flags && cli.verbose);
    }

    #[test]
    fn test_bad_reference_time_is_rejected() {
        assert!(CliConfig::try_parse_from(["scheduler-check", "--now", "soon"]).is_err());
    }
}
