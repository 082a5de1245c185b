use crate::config::DateRangeConfig;
use crate::dates::{format_ymd, parse_ymd_input};
use chrono::NaiveDate;
use serde::Serialize;

/// Start/end picker of the future class periods form.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRangeEditor {
    start: NaiveDate,
    end: NaiveDate,
    // Fixed at load; editing the dates does not change it.
    over_range: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeView {
    pub start_date: String,
    pub end_date: String,
    pub over_range: bool,
}

/// Hidden inputs the form posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeFormFields {
    pub start_date: String,
    pub end_date: String,
}

impl DateRangeEditor {
    pub fn new(config: &DateRangeConfig) -> Self {
        Self {
            start: config.start_date,
            end: config.end_date,
            over_range: config.over_range,
        }
    }

    pub fn start_value(&self) -> String {
        format_ymd(self.start)
    }

    pub fn end_value(&self) -> String {
        format_ymd(self.end)
    }

    pub fn set_start_value(&mut self, value: &str) -> anyhow::Result<()> {
        self.start = parse_ymd_input(value)?;
        Ok(())
    }

    pub fn set_end_value(&mut self, value: &str) -> anyhow::Result<()> {
        self.end = parse_ymd_input(value)?;
        Ok(())
    }

    pub fn form_fields(&self) -> DateRangeFormFields {
        DateRangeFormFields {
            start_date: self.start_value(),
            end_date: self.end_value(),
        }
    }

    pub fn view(&self) -> DateRangeView {
        DateRangeView {
            start_date: self.start_value(),
            end_date: self.end_value(),
            over_range: self.over_range,
        }
    }
}
