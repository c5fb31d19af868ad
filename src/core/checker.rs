use crate::domain::model::{Appointment, CheckResult, Flag, PatientFlags};
use crate::domain::rules::{RuleSet, SequencingRule};
use crate::utils::error::{CheckError, Result};
use chrono::{Duration, NaiveDateTime};
use std::collections::{BTreeMap, HashSet};

/// Datetime of the earliest `appt_type` appointment within `window_days` of
/// `base`, bounds inclusive. `appointments` must be sorted chronologically.
/// Bounds past the representable range are clamped to it.
pub fn find_related_appointment(
    appointments: &[Appointment],
    appt_type: &str,
    base: NaiveDateTime,
    window_days: i64,
) -> Option<NaiveDateTime> {
    let window = Duration::try_days(window_days).unwrap_or(Duration::MAX);
    let start = base.checked_sub_signed(window).unwrap_or(NaiveDateTime::MIN);
    let end = base.checked_add_signed(window).unwrap_or(NaiveDateTime::MAX);

    appointments
        .iter()
        .filter(|a| a.appt_type == appt_type)
        .map(|a| a.appt_dttm)
        .find(|t| *t >= start && *t <= end)
}

/// End of the look-ahead window that opens at `now`.
pub fn window_end(now: NaiveDateTime, lookahead_days: i64) -> Result<NaiveDateTime> {
    Duration::try_days(lookahead_days)
        .and_then(|days| now.checked_add_signed(days))
        .ok_or_else(|| CheckError::InvalidConfigValueError {
            field: "now".to_string(),
            value: now.to_string(),
            reason: format!(
                "a {}-day window from this time is past the latest supported date",
                lookahead_days
            ),
        })
}

fn evaluate_rule(
    rule: &SequencingRule,
    appointment: &Appointment,
    schedule: &[Appointment],
) -> Option<Flag> {
    let subject_date = appointment.appt_dttm.date();

    let Some(related) = find_related_appointment(
        schedule,
        &rule.prerequisite,
        appointment.appt_dttm,
        rule.window_days,
    ) else {
        return rule
            .require_prerequisite
            .then(|| rule.missing_flag(subject_date));
    };

    let prerequisite_date = related.date();
    if related > appointment.appt_dttm {
        return Some(rule.order_flag(subject_date, prerequisite_date));
    }

    let gap = (subject_date - prerequisite_date).num_days();
    if rule.min_gap_days > 0 && gap < rule.min_gap_days {
        return Some(rule.gap_flag(subject_date, prerequisite_date));
    }

    None
}

/// Checks one patient's full schedule. Flags are unique and keep the order
/// in which they were first raised.
pub fn check_patient_schedule(appointments: &[Appointment], rules: &RuleSet) -> Vec<Flag> {
    let mut schedule = appointments.to_vec();
    schedule.sort_by_key(|a| a.appt_dttm);

    let mut seen = HashSet::new();
    let mut flags = Vec::new();

    for appointment in &schedule {
        for rule in rules.for_subject(&appointment.appt_type) {
            if let Some(flag) = evaluate_rule(rule, appointment, &schedule) {
                if seen.insert(flag.clone()) {
                    flags.push(flag);
                }
            }
        }
    }

    flags
}

/// Restricts `appointments` to `[now, now + lookahead_days]` and checks every
/// patient in it, in ascending MRN order.
pub fn check_appointments(
    appointments: &[Appointment],
    rules: &RuleSet,
    now: NaiveDateTime,
    lookahead_days: i64,
) -> Result<CheckResult> {
    let window_end = window_end(now, lookahead_days)?;

    let mut by_patient: BTreeMap<u64, Vec<Appointment>> = BTreeMap::new();
    let mut in_window = 0;
    for appointment in appointments
        .iter()
        .filter(|a| a.appt_dttm >= now && a.appt_dttm <= window_end)
    {
        in_window += 1;
        by_patient
            .entry(appointment.patient_mrn)
            .or_default()
            .push(appointment.clone());
    }

    let mut flagged = Vec::new();
    for (mrn, patient_appts) in &by_patient {
        let flags = check_patient_schedule(patient_appts, rules);
        if flags.is_empty() {
            continue;
        }

        let scheduler_id = patient_appts
            .iter()
            .min_by_key(|a| a.appt_dttm)
            .map(|a| a.scheduler_id.clone())
            .unwrap_or_default();

        tracing::debug!(mrn, scheduler = %scheduler_id, flags = flags.len(), "patient flagged");
        flagged.push(PatientFlags {
            patient_mrn: *mrn,
            scheduler_id,
            flags,
        });
    }

    Ok(CheckResult {
        total_loaded: appointments.len(),
        window_start: now,
        window_end,
        lookahead_days,
        in_window,
        patients_checked: by_patient.len(),
        flagged,
    })
}
