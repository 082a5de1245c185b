use crate::dates::parse_config_date;
use crate::query::StudentIdParam;
use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use tracing::warn;

pub const SCRIPT_DATA_ELEMENT_ID: &str = "script_data";

pub const DEFAULT_SORT_KEY: &str = "student__name";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptData {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub default_sort: Option<String>,
    #[serde(default)]
    pub default_date: Option<String>,
    #[serde(default)]
    pub list_url: Option<String>,
    #[serde(default)]
    pub spreadsheet_url: Option<String>,
    #[serde(default)]
    pub individual_url: Option<String>,
    #[serde(default)]
    pub delete_multiple_signups: Option<String>,
}

impl ScriptData {
    pub fn from_value(value: &serde_json::Value) -> anyhow::Result<Self> {
        serde_json::from_value(value.clone()).context("scriptData must be an object of strings")
    }

    pub fn from_html(html: &str) -> anyhow::Result<Self> {
        let value = extract_json_script(html, SCRIPT_DATA_ELEMENT_ID)?;
        Self::from_value(&value)
    }
}

pub fn extract_json_script(html: &str, element_id: &str) -> anyhow::Result<serde_json::Value> {
    let needles = [
        format!("id=\"{}\"", element_id),
        format!("id='{}'", element_id),
    ];
    let attr_at = needles
        .iter()
        .filter_map(|n| html.find(n.as_str()))
        .min()
        .ok_or_else(|| anyhow!("no element with id {}", element_id))?;

    let tag_start = html[..attr_at]
        .rfind("<script")
        .ok_or_else(|| anyhow!("element {} is not a <script>", element_id))?;
    if html[tag_start..attr_at].contains('>') {
        bail!("element {} is not a <script>", element_id);
    }

    let body_start = html[attr_at..]
        .find('>')
        .map(|i| attr_at + i + 1)
        .ok_or_else(|| anyhow!("unterminated <script> tag"))?;
    let body_end = html[body_start..]
        .find("</script>")
        .map(|i| body_start + i)
        .ok_or_else(|| anyhow!("missing </script> for {}", element_id))?;

    serde_json::from_str(html[body_start..body_end].trim())
        .with_context(|| format!("{} does not contain valid JSON", element_id))
}

// Django hands out paths, which need the page origin.
pub fn resolve_url(origin: Option<&Url>, raw: &str) -> anyhow::Result<Url> {
    let t = raw.trim();
    if t.is_empty() {
        bail!("url must not be empty");
    }
    if t.starts_with("http://") || t.starts_with("https://") {
        return Url::parse(t).with_context(|| format!("invalid url {}", t));
    }
    let Some(origin) = origin else {
        bail!("relative url {} needs an origin", t);
    };
    origin
        .join(t)
        .with_context(|| format!("cannot resolve {} against {}", t, origin))
}

fn required<'a>(value: &'a Option<String>, key: &str) -> anyhow::Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(anyhow!("scriptData.{} is required", key)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateRangeConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Whether the two raw strings differed, compared before parsing.
    pub over_range: bool,
}

impl DateRangeConfig {
    pub fn from_script_data(data: &ScriptData) -> anyhow::Result<Self> {
        let start_raw = required(&data.start_date, "start_date")?;
        let start_date = parse_config_date(start_raw).context("scriptData.start_date")?;

        // The backend form treats a missing end date as a one-day range.
        let end_raw = match data.end_date.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => start_raw,
        };
        let end_date = parse_config_date(end_raw).context("scriptData.end_date")?;

        Ok(Self {
            start_date,
            end_date,
            over_range: start_raw != end_raw,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub list: Url,
    pub spreadsheet: Url,
    pub individual: Url,
    pub delete_multiple: Url,
}

impl Endpoints {
    pub fn individual_record(&self, id: i64) -> anyhow::Result<Url> {
        let raw = format!("{}{}/", self.individual.as_str(), id);
        Url::parse(&raw).with_context(|| format!("invalid record url {}", raw))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignupsConfig {
    pub default_sort: String,
    pub default_date: NaiveDate,
    pub endpoints: Endpoints,
}

impl SignupsConfig {
    pub fn from_script_data(data: &ScriptData, origin: Option<&Url>) -> anyhow::Result<Self> {
        let default_date = parse_config_date(required(&data.default_date, "default_date")?)
            .context("scriptData.default_date")?;
        let default_sort = match data.default_sort.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => DEFAULT_SORT_KEY.to_string(),
        };

        let endpoints = Endpoints {
            list: resolve_url(origin, required(&data.list_url, "list_url")?)?,
            spreadsheet: resolve_url(origin, required(&data.spreadsheet_url, "spreadsheet_url")?)?,
            individual: resolve_url(origin, required(&data.individual_url, "individual_url")?)?,
            delete_multiple: resolve_url(
                origin,
                required(&data.delete_multiple_signups, "delete_multiple_signups")?,
            )?,
        };

        Ok(Self {
            default_sort,
            default_date,
            endpoints,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub clear_error_on_success: bool,
    pub student_id_param: StudentIdParam,
    pub csrf_cookie_name: String,
    pub csrf_header_name: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            clear_error_on_success: false,
            student_id_param: StudentIdParam::StudentInfoId,
            csrf_cookie_name: "csrftoken".to_string(),
            csrf_header_name: "X-CSRFToken".to_string(),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ViewSettings {
    pub fn from_env() -> Self {
        Self::default().with_lookup(|key| std::env::var(key).ok())
    }

    fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("SIGNUPD_CLEAR_ERROR_ON_SUCCESS") {
            match parse_flag(&raw) {
                Some(v) => self.clear_error_on_success = v,
                None => warn!(value = %raw, "ignoring SIGNUPD_CLEAR_ERROR_ON_SUCCESS"),
            }
        }
        if let Some(raw) = lookup("SIGNUPD_STUDENT_ID_PARAM") {
            match raw.parse::<StudentIdParam>() {
                Ok(v) => self.student_id_param = v,
                Err(e) => warn!(value = %raw, "ignoring SIGNUPD_STUDENT_ID_PARAM: {e}"),
            }
        }
        if let Some(raw) = lookup("SIGNUPD_CSRF_COOKIE") {
            if !raw.trim().is_empty() {
                self.csrf_cookie_name = raw.trim().to_string();
            }
        }
        if let Some(raw) = lookup("SIGNUPD_CSRF_HEADER") {
            if !raw.trim().is_empty() {
                self.csrf_header_name = raw.trim().to_string();
            }
        }
        self
    }

    pub fn apply_overrides(&mut self, params: &serde_json::Value) -> anyhow::Result<()> {
        if params.is_null() {
            return Ok(());
        }
        if !params.is_object() {
            bail!("settings must be an object");
        }
        if let Some(v) = params.get("clearErrorOnSuccess") {
            self.clear_error_on_success = v
                .as_bool()
                .ok_or_else(|| anyhow!("settings.clearErrorOnSuccess must be a boolean"))?;
        }
        if let Some(v) = params.get("studentIdParam") {
            let raw = v
                .as_str()
                .ok_or_else(|| anyhow!("settings.studentIdParam must be a string"))?;
            self.student_id_param = raw.parse()?;
        }
        if let Some(v) = params.get("csrfCookieName").and_then(|v| v.as_str()) {
            self.csrf_cookie_name = v.to_string();
        }
        if let Some(v) = params.get("csrfHeaderName").and_then(|v| v.as_str()) {
            self.csrf_header_name = v.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn origin() -> Url {
        Url::parse("https://library.example.edu/faculty/signups/").unwrap()
    }

    fn signups_data() -> ScriptData {
        ScriptData::from_value(&json!({
            "default_sort": "class_period__number",
            "default_date": "2024-01-15",
            "list_url": "/faculty/api/signups/",
            "spreadsheet_url": "/faculty/api/signups/spreadsheet/",
            "individual_url": "/faculty/api/signups/",
            "delete_multiple_signups": "/faculty/api/signups/delete_multiple/"
        }))
        .unwrap()
    }

    #[test]
    fn extracts_django_json_script() {
        let html = r#"<html><body>
            <div id="app"></div>
            <script id="script_data" type="application/json">{"start_date": "2024-01-15", "end_date": "2024-01-19"}</script>
            <script src="/static/signup/faculty/future_form.js"></script>
        </body></html>"#;
        let data = ScriptData::from_html(html).expect("extract");
        assert_eq!(data.start_date.as_deref(), Some("2024-01-15"));
        assert_eq!(data.end_date.as_deref(), Some("2024-01-19"));
    }

    #[test]
    fn extraction_reports_missing_element() {
        let err = ScriptData::from_html("<div id=\"script_data\">{}</div>").unwrap_err();
        assert!(err.to_string().contains("not a <script>"), "{err}");
        assert!(ScriptData::from_html("<p>nothing</p>").is_err());
    }

    #[test]
    fn date_range_defaults_end_to_start() {
        let cfg = DateRangeConfig::from_script_data(&ScriptData {
            start_date: Some("2024-01-15".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.start_date, cfg.end_date);
        assert!(!cfg.over_range);

        let cfg = DateRangeConfig::from_script_data(&ScriptData {
            start_date: Some("2024-01-15".into()),
            end_date: Some("2024-01-19".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(cfg.over_range);
    }

    #[test]
    fn signups_config_resolves_relative_urls() {
        let cfg = SignupsConfig::from_script_data(&signups_data(), Some(&origin())).unwrap();
        assert_eq!(cfg.default_sort, "class_period__number");
        assert_eq!(
            cfg.endpoints.list.as_str(),
            "https://library.example.edu/faculty/api/signups/"
        );
        assert_eq!(
            cfg.endpoints.individual_record(42).unwrap().as_str(),
            "https://library.example.edu/faculty/api/signups/42/"
        );
    }

    #[test]
    fn relative_urls_without_origin_fail() {
        let err = SignupsConfig::from_script_data(&signups_data(), None).unwrap_err();
        assert!(err.to_string().contains("needs an origin"), "{err}");
    }

    #[test]
    fn missing_default_sort_falls_back() {
        let mut data = signups_data();
        data.default_sort = None;
        let cfg = SignupsConfig::from_script_data(&data, Some(&origin())).unwrap();
        assert_eq!(cfg.default_sort, DEFAULT_SORT_KEY);
    }

    #[test]
    fn env_lookup_overrides_defaults() {
        let env: HashMap<&str, &str> = [
            ("SIGNUPD_CLEAR_ERROR_ON_SUCCESS", "yes"),
            ("SIGNUPD_STUDENT_ID_PARAM", "student__id"),
            ("SIGNUPD_CSRF_COOKIE", "token"),
        ]
        .into_iter()
        .collect();
        let s = ViewSettings::default().with_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert!(s.clear_error_on_success);
        assert_eq!(s.student_id_param, StudentIdParam::StudentId);
        assert_eq!(s.csrf_cookie_name, "token");
        assert_eq!(s.csrf_header_name, "X-CSRFToken");
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let s = ViewSettings::default().with_lookup(|k| match k {
            "SIGNUPD_CLEAR_ERROR_ON_SUCCESS" => Some("maybe".to_string()),
            "SIGNUPD_STUDENT_ID_PARAM" => Some("student__email".to_string()),
            _ => None,
        });
        assert_eq!(s, ViewSettings::default());
    }

    #[test]
    fn page_overrides_validate_types() {
        let mut s = ViewSettings::default();
        s.apply_overrides(&json!({ "clearErrorOnSuccess": true })).unwrap();
        assert!(s.clear_error_on_success);
        assert!(s.apply_overrides(&json!({ "clearErrorOnSuccess": "yes" })).is_err());
        assert!(s.apply_overrides(&json!("nope")).is_err());
        s.apply_overrides(&serde_json::Value::Null).unwrap();
    }
}
