use crate::domain::model::appointment_types::*;
use crate::domain::model::Flag;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MISSING_MESSAGE: &str =
    "Critical Error: A {subject} on {subject_date} has no {prerequisite} scheduled within the prior {window_days} days.";
pub const DEFAULT_ORDER_MESSAGE: &str =
    "Order Error: {subject} on {subject_date} is BEFORE its related {prerequisite} on {prerequisite_date}.";
pub const DEFAULT_TIMING_MESSAGE: &str =
    "Timing Error: {subject} on {subject_date} is {gap_days} day(s) after {prerequisite} on {prerequisite_date}. Must be at least {min_gap_days} day(s) prior.";

/// Optional wording for each kind of flag a rule can raise.
///
/// Templates may use `{subject}`, `{subject_date}`, `{prerequisite}`,
/// `{prerequisite_date}`, `{window_days}`, `{min_gap_days}` and `{gap_days}`.
/// Unknown placeholders are left as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMessages {
    #[serde(default)]
    pub missing: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub timing: Option<String>,
}

impl RuleMessages {
    fn is_empty(&self) -> bool {
        self.missing.is_none() && self.order.is_none() && self.timing.is_none()
    }
}

/// "Every `subject` appointment needs a `prerequisite` appointment nearby."
///
/// The prerequisite is looked up within `window_days` on either side of the
/// subject. It must not come after the subject, and when `min_gap_days` is
/// positive it must fall at least that many calendar days earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencingRule {
    pub subject: String,
    pub prerequisite: String,
    pub window_days: i64,
    #[serde(default)]
    pub min_gap_days: i64,
    #[serde(default)]
    pub require_prerequisite: bool,
    #[serde(default, skip_serializing_if = "RuleMessages::is_empty")]
    pub messages: RuleMessages,
}

impl SequencingRule {
    pub fn new(subject: &str, prerequisite: &str, window_days: i64) -> Self {
        Self {
            subject: subject.to_string(),
            prerequisite: prerequisite.to_string(),
            window_days,
            min_gap_days: 0,
            require_prerequisite: false,
            messages: RuleMessages::default(),
        }
    }

    pub fn min_gap(mut self, days: i64) -> Self {
        self.min_gap_days = days;
        self
    }

    pub fn required(mut self) -> Self {
        self.require_prerequisite = true;
        self
    }

    pub fn missing_message(mut self, template: &str) -> Self {
        self.messages.missing = Some(template.to_string());
        self
    }

    pub fn order_message(mut self, template: &str) -> Self {
        self.messages.order = Some(template.to_string());
        self
    }

    pub fn timing_message(mut self, template: &str) -> Self {
        self.messages.timing = Some(template.to_string());
        self
    }

    pub fn missing_flag(&self, subject_date: NaiveDate) -> Flag {
        let template = self.messages.missing.as_deref().unwrap_or(DEFAULT_MISSING_MESSAGE);
        Flag::MissingPrerequisite {
            subject: self.subject.clone(),
            subject_date,
            prerequisite: self.prerequisite.clone(),
            window_days: self.window_days,
            message: self.render(template, subject_date, None),
        }
    }

    pub fn order_flag(&self, subject_date: NaiveDate, prerequisite_date: NaiveDate) -> Flag {
        let template = self.messages.order.as_deref().unwrap_or(DEFAULT_ORDER_MESSAGE);
        Flag::OutOfOrder {
            subject: self.subject.clone(),
            subject_date,
            prerequisite: self.prerequisite.clone(),
            prerequisite_date,
            message: self.render(template, subject_date, Some(prerequisite_date)),
        }
    }

    pub fn gap_flag(&self, subject_date: NaiveDate, prerequisite_date: NaiveDate) -> Flag {
        let template = self.messages.timing.as_deref().unwrap_or(DEFAULT_TIMING_MESSAGE);
        Flag::InsufficientGap {
            subject: self.subject.clone(),
            subject_date,
            prerequisite: self.prerequisite.clone(),
            prerequisite_date,
            min_gap_days: self.min_gap_days,
            message: self.render(template, subject_date, Some(prerequisite_date)),
        }
    }

    fn render(
        &self,
        template: &str,
        subject_date: NaiveDate,
        prerequisite_date: Option<NaiveDate>,
    ) -> String {
        let mut fields = vec![
            ("subject", self.subject.clone()),
            ("subject_date", subject_date.to_string()),
            ("prerequisite", self.prerequisite.clone()),
            ("window_days", self.window_days.to_string()),
            ("min_gap_days", self.min_gap_days.to_string()),
        ];
        if let Some(date) = prerequisite_date {
            fields.push(("prerequisite_date", date.to_string()));
            fields.push(("gap_days", (subject_date - date).num_days().to_string()));
        }

        fields
            .iter()
            .fold(template.to_string(), |message, (key, value)| {
                message.replace(&format!("{{{}}}", key), value)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<SequencingRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<SequencingRule>) -> Self {
        Self { rules }
    }

    pub fn for_subject<'a>(&'a self, appt_type: &'a str) -> impl Iterator<Item = &'a SequencingRule> + 'a {
        self.rules.iter().filter(move |r| r.subject == appt_type)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(vec![
            SequencingRule::new(CHEMO, LAB, 7)
                .min_gap(1)
                .required()
                .missing_message(
                    "Critical Error: A {subject} on {subject_date} has no {prerequisite} test scheduled within the prior {window_days} days.",
                )
                .order_message("Order Error: {prerequisite} on {prerequisite_date} is AFTER {subject} on {subject_date}.")
                .timing_message(
                    "Timing Error: {prerequisite} on {prerequisite_date} is on the same day as {subject} on {subject_date}. Must be at least {min_gap_days} day prior.",
                ),
            SequencingRule::new(ONCOLOGY_VISIT, MAMMOGRAM, 14)
                .min_gap(2)
                .timing_message(
                    "Timing Error: Visit on {subject_date} is too soon after {prerequisite} on {prerequisite_date} (requires {min_gap_days}-day gap for results).",
                ),
            SequencingRule::new(RADIATION_THERAPY, CT_SIMULATION, 14).order_message(
                "Order Error: {subject} on {subject_date} is BEFORE its planning {prerequisite} on {prerequisite_date}.",
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_default_rules() {
        let rules = RuleSet::default();
        assert_eq!(rules.len(), 3);

        let chemo: Vec<_> = rules.for_subject("Chemo").collect();
        assert_eq!(chemo.len(), 1);
        assert_eq!(chemo[0].prerequisite, "Lab");
        assert!(chemo[0].require_prerequisite);
        assert_eq!(chemo[0].min_gap_days, 1);

        assert_eq!(rules.for_subject("Lab").count(), 0);
    }

    #[test]
    fn test_rule_without_templates_uses_generic_wording() {
        let rule = SequencingRule::new("Surgery", "Consult", 30).min_gap(3).required();

        assert_eq!(
            rule.missing_flag(date("2025-06-10")).to_string(),
            "Critical Error: A Surgery on 2025-06-10 has no Consult scheduled within the prior 30 days."
        );
        assert_eq!(
            rule.order_flag(date("2025-06-10"), date("2025-06-12")).to_string(),
            "Order Error: Surgery on 2025-06-10 is BEFORE its related Consult on 2025-06-12."
        );
        assert_eq!(
            rule.gap_flag(date("2025-06-10"), date("2025-06-09")).to_string(),
            "Timing Error: Surgery on 2025-06-10 is 1 day(s) after Consult on 2025-06-09. Must be at least 3 day(s) prior."
        );
    }

    #[test]
    fn test_custom_template_keeps_unknown_placeholders() {
        let rule = SequencingRule::new("Surgery", "Consult", 30)
            .order_message("{prerequisite} ({prerequisite_date}) after {subject} {unknown}");

        assert_eq!(
            rule.order_flag(date("2025-06-10"), date("2025-06-12")).to_string(),
            "Consult (2025-06-12) after Surgery {unknown}"
        );
    }

    #[test]
    fn test_messages_are_optional_in_toml() {
        let rule: SequencingRule = toml::from_str(
            r#"
            subject = "Surgery"
            prerequisite = "Consult"
            window_days = 30

            [messages]
            missing = "No {prerequisite} before {subject} on {subject_date}"
            "#,
        )
        .unwrap();

        assert_eq!(rule.messages.order, None);
        assert_eq!(
            rule.missing_flag(date("2025-06-10")).to_string(),
            "No Consult before Surgery on 2025-06-10"
        );
    }
}
