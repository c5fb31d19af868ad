use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Appointment type names used by the default rules and the generator.
pub mod appointment_types {
    pub const ONCOLOGY_VISIT: &str = "Oncology Visit";
    pub const LAB: &str = "Lab";
    pub const CHEMO: &str = "Chemo";
    pub const MAMMOGRAM: &str = "Mammogram";
    pub const CT_SIMULATION: &str = "CT Simulation";
    pub const RADIATION_THERAPY: &str = "Radiation Therapy";
}

/// One row of the appointment CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "APPT_ID")]
    pub appt_id: String,
    #[serde(rename = "PATIENT_MRN")]
    pub patient_mrn: u64,
    #[serde(rename = "APPT_TYPE")]
    pub appt_type: String,
    #[serde(rename = "APPT_DTTM", with = "crate::domain::datetime")]
    pub appt_dttm: NaiveDateTime,
    #[serde(rename = "SCHEDULER_ID")]
    pub scheduler_id: String,
}

/// A single rule violation found in a patient's schedule. `message` is the
/// report line, rendered from the rule's template when the flag is raised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Flag {
    MissingPrerequisite {
        subject: String,
        subject_date: NaiveDate,
        prerequisite: String,
        window_days: i64,
        message: String,
    },
    OutOfOrder {
        subject: String,
        subject_date: NaiveDate,
        prerequisite: String,
        prerequisite_date: NaiveDate,
        message: String,
    },
    InsufficientGap {
        subject: String,
        subject_date: NaiveDate,
        prerequisite: String,
        prerequisite_date: NaiveDate,
        min_gap_days: i64,
        message: String,
    },
}

impl Flag {
    pub fn message(&self) -> &str {
        match self {
            Flag::MissingPrerequisite { message, .. }
            | Flag::OutOfOrder { message, .. }
            | Flag::InsufficientGap { message, .. } => message,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientFlags {
    pub patient_mrn: u64,
    pub scheduler_id: String,
    pub flags: Vec<Flag>,
}

/// Output of the transform phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub total_loaded: usize,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    pub lookahead_days: i64,
    pub in_window: usize,
    pub patients_checked: usize,
    pub flagged: Vec<PatientFlags>,
}

impl CheckResult {
    pub fn is_window_empty(&self) -> bool {
        self.in_window == 0
    }

    pub fn flag_count(&self) -> usize {
        self.flagged.iter().map(|p| p.flags.len()).sum()
    }
}

/// What the load phase produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub rendered: String,
    pub flagged_patients: usize,
    pub written_files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_flag_displays_its_message() {
        let missing = Flag::MissingPrerequisite {
            subject: "Chemo".into(),
            subject_date: date("2025-03-10"),
            prerequisite: "Lab".into(),
            window_days: 7,
            message: "Critical Error: A Chemo on 2025-03-10 has no Lab test scheduled within the prior 7 days."
                .into(),
        };
        assert_eq!(missing.to_string(), missing.message());
        assert!(missing.to_string().starts_with("Critical Error: A Chemo"));
    }

    #[test]
    fn test_flag_json_is_tagged() {
        let flag = Flag::OutOfOrder {
            subject: "Radiation Therapy".into(),
            subject_date: date("2025-03-10"),
            prerequisite: "CT Simulation".into(),
            prerequisite_date: date("2025-03-12"),
            message: "Order Error: Radiation Therapy on 2025-03-10 is BEFORE its planning CT Simulation on 2025-03-12."
                .into(),
        };
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["kind"], "out_of_order");
        assert_eq!(json["prerequisite_date"], "2025-03-12");
        assert_eq!(json["message"], flag.to_string());
    }
}
