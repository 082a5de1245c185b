use crate::dates::{format_ymd, parse_ymd_input, readable_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const REASON_LUNCH: &str = "L";
/// Code the filter label recognizes for study hall. Signups store `"S"`, so
/// a study-hall filter renders with an empty label; kept as observed.
pub const REASON_STUDY_HALL_LABEL: &str = "S:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    pub date: NaiveDate,
    pub period_number_enabled: bool,
    /// Raw text of the period input; only used when it parses.
    pub period_number: Option<String>,
    pub student_name: Option<String>,
    pub student_id: Option<String>,
    pub reason: String,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

impl FilterSet {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            period_number_enabled: false,
            period_number: None,
            student_name: None,
            student_id: None,
            reason: String::new(),
        }
    }

    pub fn period_number_value(&self) -> Option<i64> {
        self.period_number
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
    }

    /// Period filter as sent: checkbox ticked and a number typed.
    pub fn active_period_number(&self) -> Option<i64> {
        if self.period_number_enabled {
            self.period_number_value()
        } else {
            None
        }
    }

    pub fn student_name_filter(&self) -> Option<&str> {
        non_empty(&self.student_name)
    }

    pub fn student_id_filter(&self) -> Option<&str> {
        non_empty(&self.student_id)
    }

    pub fn reason_filter(&self) -> Option<&str> {
        Some(self.reason.as_str()).filter(|s| !s.is_empty())
    }

    /// Badges the filter button.
    pub fn more_than_date_active(&self) -> bool {
        self.active_period_number().is_some()
            || self.student_name_filter().is_some()
            || self.student_id_filter().is_some()
            || self.reason_filter().is_some()
    }

    /// A ticked period checkbox with nothing usable typed turns the filter off.
    pub fn normalized(mut self) -> Self {
        if self.period_number_enabled && self.period_number_value().is_none() {
            self.period_number_enabled = false;
        }
        self
    }

    pub fn readable_date(&self) -> String {
        readable_date(self.date)
    }

    pub fn readable_reason(&self) -> &'static str {
        match self.reason.as_str() {
            REASON_LUNCH => "lunch",
            REASON_STUDY_HALL_LABEL => "study hall",
            _ => "",
        }
    }

    pub fn apply(&mut self, patch: FilterPatch) -> anyhow::Result<()> {
        // Validate the date before touching anything else.
        let date = patch.date.as_deref().map(parse_ymd_input).transpose()?;
        if let Some(d) = date {
            self.date = d;
        }
        if let Some(v) = patch.period_number_enabled {
            self.period_number_enabled = v;
        }
        if let Some(v) = patch.period_number {
            self.period_number = match v {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            };
        }
        if let Some(v) = patch.student_name {
            self.student_name = v;
        }
        if let Some(v) = patch.student_id {
            self.student_id = v;
        }
        if let Some(v) = patch.reason {
            self.reason = v;
        }
        Ok(())
    }
}

/// Partial edit of the draft, as sent by the filter modal inputs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPatch {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub period_number_enabled: Option<bool>,
    /// Accepts the number input's value as either a number or text.
    #[serde(default)]
    pub period_number: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub student_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub student_id: Option<Option<String>>,
    #[serde(default)]
    pub reason: Option<String>,
}

// Distinguishes an explicit `null` (clear) from an absent key (keep).
fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

/// Committed filters plus the modal's draft copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEditor {
    committed: FilterSet,
    draft: FilterSet,
    editing: bool,
}

impl FilterEditor {
    pub fn new(initial: FilterSet) -> Self {
        Self {
            draft: initial.clone(),
            committed: initial,
            editing: false,
        }
    }

    pub fn committed(&self) -> &FilterSet {
        &self.committed
    }

    pub fn draft(&self) -> &FilterSet {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn begin_edit(&mut self) {
        self.draft = self.committed.clone();
        self.editing = true;
    }

    pub fn edit_draft(&mut self, patch: FilterPatch) -> anyhow::Result<()> {
        let mut next = self.draft.clone();
        next.apply(patch)?;
        self.draft = next;
        Ok(())
    }

    pub fn draft_date_value(&self) -> String {
        format_ymd(self.draft.date)
    }

    pub fn discard(&mut self) {
        self.draft = self.committed.clone();
        self.editing = false;
    }

    /// Normalizes the draft and makes it the committed set.
    pub fn commit(&mut self) -> &FilterSet {
        self.committed = self.draft.clone().normalized();
        self.draft = self.committed.clone();
        self.editing = false;
        &self.committed
    }
}
