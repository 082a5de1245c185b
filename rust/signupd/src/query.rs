use crate::dates::format_ymd;
use crate::filters::FilterSet;
use reqwest::Url;
use serde::Serialize;
use std::str::FromStr;

/// Which lookup the list endpoint accepts for the student id filter. Older
/// deployments filtered on the user pk, current ones on `StudentInfo.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StudentIdParam {
    #[serde(rename = "student__id")]
    StudentId,
    #[serde(rename = "student__info__id")]
    StudentInfoId,
}

impl StudentIdParam {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentIdParam::StudentId => "student__id",
            StudentIdParam::StudentInfoId => "student__info__id",
        }
    }
}

impl FromStr for StudentIdParam {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "student__id" => Ok(StudentIdParam::StudentId),
            "student__info__id" => Ok(StudentIdParam::StudentInfoId),
            other => Err(anyhow::anyhow!(
                "student id parameter must be student__id or student__info__id, got {}",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub key: String,
    pub descending: bool,
}

impl SortState {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            descending: false,
        }
    }

    /// Column header click: the same key flips ascending to descending, any
    /// other case selects `key` ascending.
    pub fn toggle(&mut self, key: &str) {
        if self.key == key && !self.descending {
            self.descending = true;
        } else {
            self.key = key.to_string();
            self.descending = false;
        }
    }

    /// Value of the `ordering` parameter.
    pub fn ordering(&self) -> String {
        if self.descending {
            format!("-{}", self.key)
        } else {
            self.key.clone()
        }
    }
}

/// Ordered list query. Absent filters are left out rather than sent empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub fn build(filters: &FilterSet, sort: &SortState, student_id_param: StudentIdParam) -> Self {
        let mut pairs = vec![("class_period__date", format_ymd(filters.date))];

        if let Some(n) = filters.active_period_number() {
            pairs.push(("class_period__number", n.to_string()));
        }
        if let Some(name) = filters.student_name_filter() {
            pairs.push(("search", name.to_string()));
        }
        if let Some(id) = filters.student_id_filter() {
            pairs.push((student_id_param.as_str(), id.to_string()));
        }
        if let Some(reason) = filters.reason_filter() {
            pairs.push(("reason", reason.to_string()));
        }
        pairs.push(("ordering", sort.ordering()));

        Self { pairs }
    }

    #[cfg(test)]
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `base?query`, form-urlencoded.
    pub fn apply_to(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut()
            .extend_pairs(self.pairs.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }
}
