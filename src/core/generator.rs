//! Synthetic longitudinal oncology schedules.
//!
//! Each patient follows a master plan made of small care plans. The assigned
//! scheduler persona decides how carefully the steps of a care plan are
//! spaced, and the forgetful one sometimes breaks the sequencing rules.

use crate::domain::model::appointment_types::*;
use crate::domain::model::Appointment;
use crate::utils::error::{CheckError, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_OUTPUT_FILE: &str = "generated_appointments_v5.csv";
pub const DEFAULT_PATIENTS: usize = 100;
pub const DEFAULT_ERROR_RATE: f64 = 0.4;
/// Journeys span about a year, so later starts would leave four-digit years.
pub const LATEST_START_YEAR: i32 = 9990;

const FIRST_SLOT_HOUR: u32 = 8;
const LAST_SLOT_HOUR: u32 = 16;
const SLOT_MINUTES: [u32; 4] = [0, 15, 30, 45];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarePlan {
    pub name: &'static str,
    pub steps: &'static [&'static str],
    pub min_gap_days: Option<i64>,
    pub max_gap_days: Option<i64>,
}

impl CarePlan {
    /// Gap between consecutive steps; plans that do not say use one day.
    pub fn required_gap(&self) -> i64 {
        self.min_gap_days.unwrap_or(1)
    }
}

pub const INITIAL_VISIT: CarePlan = CarePlan {
    name: "initial_visit",
    steps: &[ONCOLOGY_VISIT],
    min_gap_days: None,
    max_gap_days: None,
};

pub const CHEMO_CYCLE: CarePlan = CarePlan {
    name: "chemo_cycle",
    steps: &[LAB, CHEMO],
    min_gap_days: Some(0),
    max_gap_days: Some(2),
};

pub const IMAGING_FOLLOWUP: CarePlan = CarePlan {
    name: "imaging_followup",
    steps: &[MAMMOGRAM, ONCOLOGY_VISIT],
    min_gap_days: Some(2),
    max_gap_days: Some(7),
};

pub const RADIATION_PREP: CarePlan = CarePlan {
    name: "radiation_prep",
    steps: &[CT_SIMULATION, RADIATION_THERAPY],
    min_gap_days: Some(1),
    max_gap_days: Some(5),
};

/// A care pathway: care plans, each starting some weeks after the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterPlan {
    pub name: &'static str,
    pub phases: &'static [(CarePlan, i64)],
}

impl MasterPlan {
    pub fn appointment_count(&self) -> usize {
        self.phases.iter().map(|(plan, _)| plan.steps.len()).sum()
    }
}

pub const MASTER_PLANS: &[MasterPlan] = &[
    MasterPlan {
        name: "standard_chemo",
        phases: &[
            (INITIAL_VISIT, 0),
            (CHEMO_CYCLE, 2),
            (CHEMO_CYCLE, 3),
            (CHEMO_CYCLE, 3),
            (CHEMO_CYCLE, 3),
            (IMAGING_FOLLOWUP, 6),
        ],
    },
    MasterPlan {
        name: "radiation_regimen",
        phases: &[
            (INITIAL_VISIT, 0),
            (RADIATION_PREP, 2),
            // mid-radiation checkup
            (INITIAL_VISIT, 3),
            (IMAGING_FOLLOWUP, 8),
        ],
    },
    MasterPlan {
        name: "active_surveillance",
        phases: &[
            (INITIAL_VISIT, 0),
            (IMAGING_FOLLOWUP, 24),
            (IMAGING_FOLLOWUP, 24),
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerPersona {
    Diligent,
    Hasty,
    Forgetful,
}

impl SchedulerPersona {
    pub const ALL: [SchedulerPersona; 3] = [Self::Diligent, Self::Hasty, Self::Forgetful];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Diligent => "scheduler_A_diligent",
            Self::Hasty => "scheduler_B_hasty",
            Self::Forgetful => "scheduler_C_forgetful",
        }
    }
}

impl fmt::Display for SchedulerPersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First weekday on or after `start` that the patient has no appointment on.
pub fn next_available_day(start: NaiveDate, taken: &HashSet<NaiveDate>) -> NaiveDate {
    let mut day = start;
    while is_weekend(day) || taken.contains(&day) {
        day += Duration::days(1);
    }
    day
}

/// Accepts simulation start times whose journeys stay within `1..=9999`.
pub fn validate_start(start: NaiveDateTime) -> Result<NaiveDateTime> {
    if (1..=LATEST_START_YEAR).contains(&start.year()) {
        Ok(start)
    } else {
        Err(CheckError::InvalidConfigValueError {
            field: "start".to_string(),
            value: start.to_string(),
            reason: format!("year must be between 1 and {}", LATEST_START_YEAR),
        })
    }
}

pub struct AppointmentGenerator<R: Rng> {
    rng: R,
    start: NaiveDateTime,
    error_rate: f64,
    used_mrns: HashSet<u64>,
    used_ids: HashSet<String>,
}

impl<R: Rng> AppointmentGenerator<R> {
    pub fn new(rng: R, start: NaiveDateTime) -> Self {
        Self {
            rng,
            start,
            error_rate: DEFAULT_ERROR_RATE,
            used_mrns: HashSet::new(),
            used_ids: HashSet::new(),
        }
    }

    /// Probability that the forgetful persona botches a multi-step phase.
    pub fn with_error_rate(mut self, rate: f64) -> Self {
        self.error_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Appointments for `patients` patients, sorted by MRN then time.
    pub fn generate(&mut self, patients: usize) -> Vec<Appointment> {
        let mut appointments = Vec::new();
        for _ in 0..patients {
            let persona = *SchedulerPersona::ALL
                .choose(&mut self.rng)
                .unwrap_or(&SchedulerPersona::Diligent);
            let plan = *MASTER_PLANS.choose(&mut self.rng).unwrap_or(&MASTER_PLANS[0]);
            appointments.extend(self.generate_patient(persona, &plan));
        }

        appointments.sort_by(|a, b| {
            a.patient_mrn
                .cmp(&b.patient_mrn)
                .then(a.appt_dttm.cmp(&b.appt_dttm))
        });
        appointments
    }

    pub fn generate_patient(
        &mut self,
        persona: SchedulerPersona,
        plan: &MasterPlan,
    ) -> Vec<Appointment> {
        let mrn = self.next_mrn();
        tracing::debug!(mrn, plan = plan.name, scheduler = %persona, "generating patient");

        let mut cursor = self.start + Duration::days(self.rng.random_range(1..=14));
        let mut taken = HashSet::new();
        let mut appointments = Vec::with_capacity(plan.appointment_count());

        for (care_plan, weeks_after) in plan.phases {
            cursor += Duration::weeks(*weeks_after);
            let phase = self.schedule_phase(persona, care_plan, cursor, &mut taken);

            if let Some((last, _)) = phase.last() {
                cursor = *last;
            }

            for (appt_dttm, appt_type) in phase {
                appointments.push(Appointment {
                    appt_id: self.next_appt_id(),
                    patient_mrn: mrn,
                    appt_type: appt_type.to_string(),
                    appt_dttm,
                    scheduler_id: persona.id().to_string(),
                });
            }
        }

        appointments
    }

    /// Books one care plan starting from `start`. Dates used are added to `taken`.
    pub fn schedule_phase(
        &mut self,
        persona: SchedulerPersona,
        plan: &CarePlan,
        start: NaiveDateTime,
        taken: &mut HashSet<NaiveDate>,
    ) -> Vec<(NaiveDateTime, &'static str)> {
        let mut booked: Vec<(NaiveDateTime, &'static str)> = Vec::with_capacity(plan.steps.len());

        match persona {
            SchedulerPersona::Diligent => {
                for (i, step) in plan.steps.iter().enumerate() {
                    let from = match booked.last() {
                        Some((previous, _)) if i > 0 => {
                            *previous + Duration::days(plan.required_gap())
                        }
                        _ => start,
                    };
                    let day = next_available_day(from.date(), taken);
                    booked.push((self.random_slot(day), *step));
                    taken.insert(day);
                }
            }
            SchedulerPersona::Hasty | SchedulerPersona::Forgetful => {
                let mut from = start.date();
                for step in plan.steps {
                    let day = next_available_day(from, taken);
                    booked.push((self.random_slot(day), *step));
                    taken.insert(day);
                    from = day + Duration::days(self.rng.random_range(2..=5));
                }

                if persona == SchedulerPersona::Forgetful
                    && booked.len() > 1
                    && self.rng.random_bool(self.error_rate)
                {
                    tracing::debug!(plan = plan.name, "forgetful scheduler is making an error");
                    self.botch(plan, &mut booked);
                }
            }
        }

        booked
    }

    fn botch(&mut self, plan: &CarePlan, booked: &mut [(NaiveDateTime, &'static str)]) {
        if plan.required_gap() > 0 {
            // Steps that need a gap all land on the first step's day.
            let base = booked[0].0.date();
            for entry in booked.iter_mut().skip(1) {
                entry.0 = self.random_slot(base);
            }
        } else {
            // Same slots, steps in reverse order.
            let mut steps: Vec<_> = booked.iter().map(|(_, step)| *step).collect();
            steps.reverse();
            for (entry, step) in booked.iter_mut().zip(steps) {
                entry.1 = step;
            }
        }
    }

    fn random_slot(&mut self, day: NaiveDate) -> NaiveDateTime {
        let hour = self.rng.random_range(FIRST_SLOT_HOUR..=LAST_SLOT_HOUR);
        let minute = *SLOT_MINUTES.choose(&mut self.rng).unwrap_or(&0);
        day.and_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN))
    }

    fn next_mrn(&mut self) -> u64 {
        loop {
            let mrn = self.rng.random_range(1_000_000..=9_999_999);
            if self.used_mrns.insert(mrn) {
                return mrn;
            }
        }
    }

    fn next_appt_id(&mut self) -> String {
        loop {
            let id = format!("APT-{}", self.rng.random_range(10_000_000..=99_999_999u32));
            if self.used_ids.insert(id.clone()) {
                return id;
            }
        }
    }
}

pub fn write_csv<W: std::io::Write>(appointments: &[Appointment], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for appointment in appointments {
        wtr.serialize(appointment)?;
    }
    wtr.flush()?;
    Ok(())
}
