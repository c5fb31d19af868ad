#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::core::checker::window_end;
use crate::domain::ports::{ConfigProvider, ReportFormat};
use crate::domain::rules::RuleSet;
use crate::utils::error::{CheckError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_range, Validate,
};
use chrono::NaiveDateTime;

pub const DEFAULT_INPUT_FILE: &str = "generated_appointments_v5.csv";
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 60 * 2;
pub const MAX_LOOKAHEAD_DAYS: i64 = 3650;

/// Effective settings after merging defaults, the TOML file and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub input_file: String,
    pub lookahead_days: i64,
    pub reference_time: Option<NaiveDateTime>,
    pub output_dir: Option<String>,
    pub format: ReportFormat,
    pub rules: RuleSet,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            input_file: DEFAULT_INPUT_FILE.to_string(),
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            reference_time: None,
            output_dir: None,
            format: ReportFormat::Text,
            rules: RuleSet::default(),
        }
    }
}

impl CheckConfig {
    /// Layers a config file over the defaults.
    pub fn with_file(mut self, file: &TomlConfig) -> Self {
        let check = file.check();
        if let Some(input_file) = check.input_file {
            self.input_file = input_file;
        }
        if let Some(days) = check.lookahead_days {
            self.lookahead_days = days;
        }
        if check.output_dir.is_some() {
            self.output_dir = check.output_dir;
        }
        if let Some(format) = check.format {
            self.format = format;
        }
        if let Some(rules) = file.rule_set() {
            self.rules = rules;
        }
        self
    }

    #[cfg(feature = "cli")]
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = &cli.config {
            tracing::info!("Loading configuration from: {}", path);
            config = config.with_file(&TomlConfig::from_file(path)?);
        }

        Ok(config.with_cli(cli))
    }

    /// Explicit command line flags win over everything else.
    #[cfg(feature = "cli")]
    pub fn with_cli(mut self, cli: &CliConfig) -> Self {
        if let Some(input_file) = &cli.input_file {
            self.input_file = input_file.clone();
        }
        if let Some(days) = cli.lookahead_days {
            self.lookahead_days = days;
        }
        if cli.now.is_some() {
            self.reference_time = cli.now;
        }
        if cli.output_dir.is_some() {
            self.output_dir = cli.output_dir.clone();
        }
        if let Some(format) = cli.format {
            self.format = format;
        }
        self
    }

    fn validate_rules(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(CheckError::MissingConfigError {
                field: "rules".to_string(),
            });
        }

        for (i, rule) in self.rules.rules.iter().enumerate() {
            let field = |name: &str| format!("rules[{}].{}", i, name);

            validate_non_empty_string(&field("subject"), &rule.subject)?;
            validate_non_empty_string(&field("prerequisite"), &rule.prerequisite)?;
            validate_range(&field("window_days"), rule.window_days, 1, MAX_LOOKAHEAD_DAYS)?;
            validate_range(&field("min_gap_days"), rule.min_gap_days, 0, rule.window_days)?;
        }

        Ok(())
    }
}

impl ConfigProvider for CheckConfig {
    fn input_file(&self) -> &str {
        &self.input_file
    }

    fn lookahead_days(&self) -> i64 {
        self.lookahead_days
    }

    fn reference_time(&self) -> Option<NaiveDateTime> {
        self.reference_time
    }

    fn output_dir(&self) -> Option<&str> {
        self.output_dir.as_deref()
    }

    fn report_format(&self) -> ReportFormat {
        self.format
    }

    fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl Validate for CheckConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input_file", &self.input_file)?;
        validate_file_extension("input_file", &self.input_file, &["csv"])?;
        validate_range("lookahead_days", self.lookahead_days, 1, MAX_LOOKAHEAD_DAYS)?;
        if let Some(now) = self.reference_time {
            window_end(now, self.lookahead_days)?;
        }
        if let Some(dir) = &self.output_dir {
            validate_path("output_dir", dir)?;
        }
        self.validate_rules()
    }
}
