use crate::domain::ports::ReportFormat;
use crate::domain::rules::{RuleSet, SequencingRule};
use crate::utils::error::{CheckError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional config file. Every field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub check: Option<CheckSection>,
    pub rules: Option<Vec<SequencingRule>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckSection {
    pub input_file: Option<String>,
    pub lookahead_days: Option<i64>,
    pub output_dir: Option<String>,
    pub format: Option<ReportFormat>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| CheckError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CheckError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REPORT_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CheckError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn check(&self) -> CheckSection {
        self.check.clone().unwrap_or_default()
    }

    /// Rules from the file; `None` when the file does not define any.
    pub fn rule_set(&self) -> Option<RuleSet> {
        self.rules.clone().map(RuleSet::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[check]
input_file = "data/appointments.csv"
lookahead_days = 45
output_dir = "reports"
format = "json"

[[rules]]
subject = "Chemo"
prerequisite = "Lab"
window_days = 5
min_gap_days = 1
require_prerequisite = true

[[rules]]
subject = "Surgery"
prerequisite = "Pre-op Consult"
window_days = 30
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let check = config.check();
        assert_eq!(check.input_file.as_deref(), Some("data/appointments.csv"));
        assert_eq!(check.lookahead_days, Some(45));
        assert_eq!(check.format, Some(ReportFormat::Json));

        let rules = config.rule_set().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules[0].window_days, 5);
        assert_eq!(rules.rules[1].min_gap_days, 0);
        assert!(!rules.rules[1].require_prerequisite);
    }

    #[test]
    fn test_empty_config() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.check.is_none());
        assert!(config.rule_set().is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SCHEDULER_CHECK_TEST_DIR", "/tmp/reports");

        let config = TomlConfig::from_toml_str(
            r#"
[check]
output_dir = "${SCHEDULER_CHECK_TEST_DIR}"
input_file = "${SCHEDULER_CHECK_UNSET_VAR}"
"#,
        )
        .unwrap();
        let check = config.check();
        assert_eq!(check.output_dir.as_deref(), Some("/tmp/reports"));
        assert_eq!(check.input_file.as_deref(), Some("${SCHEDULER_CHECK_UNSET_VAR}"));

        std::env::remove_var("SCHEDULER_CHECK_TEST_DIR");
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[check\nlookahead_days = 1").unwrap_err();
        assert!(matches!(err, CheckError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[check]\nlookahead_days = 7\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.check().lookahead_days, Some(7));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            TomlConfig::from_file("/definitely/not/here.toml"),
            Err(CheckError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_example_file_matches_default_rules() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scheduler-check.example.toml");
        let config = TomlConfig::from_file(path).unwrap();
        assert_eq!(config.rule_set(), Some(RuleSet::default()));
    }
}
