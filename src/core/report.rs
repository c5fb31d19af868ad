use crate::domain::model::{CheckResult, PatientFlags};
use crate::utils::error::Result;
use std::collections::BTreeMap;
use std::fmt::Write;

pub const NO_ERRORS_MESSAGE: &str = "✅ No scheduling errors were found in the upcoming appointments.";
pub const EMPTY_WINDOW_MESSAGE: &str =
    "No upcoming appointments found in the specified date range. Exiting.";

fn banner(out: &mut String) {
    let rule = "=".repeat(50);
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "--- GENERATING SCHEDULER ERROR REPORTS ---");
    let _ = writeln!(out, "{}\n", rule);
}

/// Flagged patients grouped by scheduler id, both levels in ascending order.
pub fn group_by_scheduler(flagged: &[PatientFlags]) -> BTreeMap<&str, Vec<&PatientFlags>> {
    let mut groups: BTreeMap<&str, Vec<&PatientFlags>> = BTreeMap::new();
    for patient in flagged {
        groups
            .entry(patient.scheduler_id.as_str())
            .or_default()
            .push(patient);
    }
    for patients in groups.values_mut() {
        patients.sort_by_key(|p| p.patient_mrn);
    }
    groups
}

/// One email-style section per scheduler.
pub fn render_text(result: &CheckResult) -> String {
    let mut out = String::new();
    banner(&mut out);

    if result.flagged.is_empty() {
        let _ = writeln!(out, "{}", NO_ERRORS_MESSAGE);
        return out;
    }

    for (scheduler_id, patients) in group_by_scheduler(&result.flagged) {
        let _ = writeln!(out, "--- Email Report for: {} ---", scheduler_id);
        let _ = writeln!(out, "Subject: Daily Patient Schedule Review Required\n");
        let _ = writeln!(
            out,
            "Hello,\nThe automated monitoring system has flagged the following patient schedules for your review:\n"
        );

        for patient in patients {
            let _ = writeln!(out, "  - PATIENT MRN: {}", patient.patient_mrn);
            for flag in &patient.flags {
                let _ = writeln!(out, "    - Reason: {}", flag);
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "Thank you,\nClinical Informatics System\n");
        let _ = writeln!(out, "--- End of Report ---\n\n");
    }

    out
}

pub fn render_json(result: &CheckResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::datetime;
    use crate::domain::rules::RuleSet;
    use chrono::NaiveDate;

    fn result_with(flagged: Vec<PatientFlags>) -> CheckResult {
        CheckResult {
            total_loaded: 10,
            window_start: datetime::parse("2025-03-01").unwrap(),
            window_end: datetime::parse("2025-06-29").unwrap(),
            lookahead_days: 120,
            in_window: 10,
            patients_checked: 4,
            flagged,
        }
    }

    fn missing_lab(mrn: u64, scheduler: &str, day: u32) -> PatientFlags {
        let rules = RuleSet::default();
        let chemo = rules.for_subject("Chemo").next().unwrap();
        PatientFlags {
            patient_mrn: mrn,
            scheduler_id: scheduler.to_string(),
            flags: vec![chemo.missing_flag(NaiveDate::from_ymd_opt(2025, 3, day).unwrap())],
        }
    }

    #[test]
    fn test_render_no_flags() {
        let text = render_text(&result_with(vec![]));
        assert!(text.contains("--- GENERATING SCHEDULER ERROR REPORTS ---"));
        assert!(text.contains(
            "✅ No scheduling errors were found in the upcoming appointments.\n"
        ));
        assert!(!text.contains("Email Report"));
    }

    #[test]
    fn test_render_groups_by_scheduler_in_order() {
        let text = render_text(&result_with(vec![
            missing_lab(3000000, "scheduler_C_forgetful", 4),
            missing_lab(2000000, "scheduler_B_hasty", 5),
            missing_lab(1000000, "scheduler_C_forgetful", 6),
        ]));

        let hasty = text.find("--- Email Report for: scheduler_B_hasty ---").unwrap();
        let forgetful = text
            .find("--- Email Report for: scheduler_C_forgetful ---")
            .unwrap();
        assert!(hasty < forgetful);

        let first = text.find("  - PATIENT MRN: 1000000").unwrap();
        let second = text.find("  - PATIENT MRN: 3000000").unwrap();
        assert!(forgetful < first && first < second);

        assert_eq!(text.matches("--- End of Report ---").count(), 2);
        assert!(text.contains(
            "    - Reason: Critical Error: A Chemo on 2025-03-05 has no Lab test scheduled within the prior 7 days."
        ));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&result_with(vec![missing_lab(42, "scheduler_B_hasty", 5)])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["flagged"][0]["patient_mrn"], 42);
        assert_eq!(value["flagged"][0]["flags"][0]["kind"], "missing_prerequisite");
        assert_eq!(value["window_start"], "2025-03-01T00:00:00");
    }
}
