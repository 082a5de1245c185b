use reqwest::blocking::{Client, Response};
use reqwest::header::COOKIE;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signup {
    pub id: i64,
    #[serde(default)]
    pub period_number: Option<i64>,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub date_signed_up: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub attendance_confirmed: bool,
    #[serde(default)]
    pub date_attendance_confirmed: Option<String>,
    /// Client-only bulk selection flag.
    #[serde(default, skip_deserializing)]
    pub selected: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendanceUpdate {
    pub attendance_confirmed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteOutcome {
    #[serde(default)]
    pub deleted: Vec<i64>,
    #[serde(default)]
    pub failed: Vec<i64>,
}

impl BulkDeleteOutcome {
    pub fn all_deleted(ids: &[i64]) -> Self {
        Self {
            deleted: ids.to_vec(),
            failed: Vec::new(),
        }
    }

    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        if body.get("deleted").is_none() && body.get("failed").is_none() {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Network,
    Status,
    Parse,
    Csrf,
    Url,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned status {status}")]
    Status {
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("could not parse response: {0}")]
    Parse(String),

    #[error("no CSRF token in cookie {0}")]
    MissingCsrfToken(String),

    #[error("invalid url: {0}")]
    Url(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Status { .. } => ErrorKind::Status,
            ApiError::Parse(_) => ErrorKind::Parse,
            ApiError::MissingCsrfToken(_) => ErrorKind::Csrf,
            ApiError::Url(_) => ErrorKind::Url,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub trait SignupsApi {
    fn list(&self, url: &Url) -> Result<Vec<Signup>, ApiError>;

    fn patch_attendance(&self, url: &Url, confirmed: bool) -> Result<AttendanceUpdate, ApiError>;

    /// A success without a per-id body means every id was deleted.
    fn delete_multiple(&self, url: &Url, ids: &[i64]) -> Result<BulkDeleteOutcome, ApiError>;
}

pub struct HttpApi {
    client: Client,
    cookie_header: Option<String>,
    csrf_token: Option<String>,
    csrf_cookie_name: String,
    csrf_header_name: String,
}

impl HttpApi {
    pub fn new(
        cookie_header: Option<String>,
        csrf_token: Option<String>,
        csrf_cookie_name: impl Into<String>,
        csrf_header_name: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            cookie_header: cookie_header.filter(|c| !c.trim().is_empty()),
            csrf_token,
            csrf_cookie_name: csrf_cookie_name.into(),
            csrf_header_name: csrf_header_name.into(),
        }
    }

    fn with_cookies(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.cookie_header {
            Some(c) => builder.header(COOKIE, c.as_str()),
            None => builder,
        }
    }

    fn csrf_token(&self) -> Result<&str, ApiError> {
        self.csrf_token
            .as_deref()
            .ok_or_else(|| ApiError::MissingCsrfToken(self.csrf_cookie_name.clone()))
    }

    fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.json::<serde_json::Value>().ok();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl SignupsApi for HttpApi {
    fn list(&self, url: &Url) -> Result<Vec<Signup>, ApiError> {
        debug!(%url, "GET signups");
        let response = self
            .with_cookies(self.client.get(url.clone()))
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check_status(response)?
            .json()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn patch_attendance(&self, url: &Url, confirmed: bool) -> Result<AttendanceUpdate, ApiError> {
        let token = self.csrf_token()?;
        debug!(%url, confirmed, "PATCH attendance");
        let response = self
            .with_cookies(self.client.patch(url.clone()))
            .header(self.csrf_header_name.as_str(), token)
            .json(&serde_json::json!({ "attendance_confirmed": confirmed }))
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check_status(response)?
            .json()
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn delete_multiple(&self, url: &Url, ids: &[i64]) -> Result<BulkDeleteOutcome, ApiError> {
        let token = self.csrf_token()?;
        debug!(%url, count = ids.len(), "POST delete multiple");
        let form: Vec<(&str, String)> = ids.iter().map(|id| ("id", id.to_string())).collect();
        let response = self
            .with_cookies(self.client.post(url.clone()))
            .header(self.csrf_header_name.as_str(), token)
            .form(&form)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let response = Self::check_status(response)?;
        let text = response
            .text()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(BulkDeleteOutcome::all_deleted(ids));
        }
        // Older servers answer with an arbitrary body; only a per-id report
        // narrows the result.
        Ok(serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|body| BulkDeleteOutcome::from_body(&body))
            .unwrap_or_else(|| BulkDeleteOutcome::all_deleted(ids)))
    }
}
