use crate::api::HttpApi;
use crate::config::ViewSettings;
use crate::date_range::DateRangeEditor;
use crate::signups_table::SignupsTable;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything the sidecar holds between requests. Each page slot is filled
/// by `page.load` and replaced wholesale by the next load of that page.
pub struct AppState {
    /// Defaults from the environment; `page.load` layers its overrides on a copy.
    pub settings: ViewSettings,
    pub date_range: Option<DateRangeEditor>,
    pub signups: Option<SignupsTable<HttpApi>>,
}

impl AppState {
    pub fn new(settings: ViewSettings) -> Self {
        Self {
            settings,
            date_range: None,
            signups: None,
        }
    }
}
