use crate::api::HttpApi;
use crate::config::{DateRangeConfig, ScriptData, SignupsConfig};
use crate::csrf::cookie_value;
use crate::date_range::DateRangeEditor;
use crate::ipc::error::{get_required_str, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::signups_table::SignupsTable;
use reqwest::Url;
use serde_json::json;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "pages": {
                "futureForm": state.date_range.is_some(),
                "signups": state.signups.is_some(),
            }
        }),
    )
}

fn bad_config(e: anyhow::Error) -> HandlerErr {
    HandlerErr {
        code: "bad_config",
        message: format!("{e:#}"),
        details: None,
    }
}

/// The bootstrap blob, given either parsed or as the page HTML.
fn script_data(params: &serde_json::Value) -> Result<ScriptData, HandlerErr> {
    if let Some(v) = params.get("scriptData") {
        return ScriptData::from_value(v).map_err(bad_config);
    }
    if let Some(html) = params.get("html").and_then(|v| v.as_str()) {
        return ScriptData::from_html(html).map_err(bad_config);
    }
    Err(HandlerErr::bad_params("missing scriptData or html"))
}

fn origin(params: &serde_json::Value) -> Result<Option<Url>, HandlerErr> {
    match params.get("origin").and_then(|v| v.as_str()) {
        Some(raw) => Url::parse(raw)
            .map(Some)
            .map_err(|e| HandlerErr::bad_params(format!("invalid origin: {}", e))),
        None => Ok(None),
    }
}

fn load_page(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let page = get_required_str(&req.params, "page")?;
    let data = script_data(&req.params)?;

    let mut settings = state.settings.clone();
    settings
        .apply_overrides(req.params.get("settings").unwrap_or(&serde_json::Value::Null))
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;

    match page {
        "futureForm" => {
            let cfg = DateRangeConfig::from_script_data(&data).map_err(bad_config)?;
            let editor = DateRangeEditor::new(&cfg);
            let view = json!({ "page": page, "view": editor.view() });
            info!(start = %cfg.start_date, end = %cfg.end_date, "future form loaded");
            state.date_range = Some(editor);
            Ok(view)
        }
        "signups" => {
            let origin = origin(&req.params)?;
            let cfg = SignupsConfig::from_script_data(&data, origin.as_ref()).map_err(bad_config)?;

            let cookie = req
                .params
                .get("cookie")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let token = cookie
                .as_deref()
                .and_then(|c| cookie_value(c, &settings.csrf_cookie_name));
            let api = HttpApi::new(
                cookie,
                token,
                settings.csrf_cookie_name.clone(),
                settings.csrf_header_name.clone(),
            );

            info!(list = %cfg.endpoints.list, "signups page loaded");
            let table = SignupsTable::load(&cfg, settings, api);
            let view = json!({ "page": page, "view": table.view() });
            state.signups = Some(table);
            Ok(view)
        }
        other => Err(HandlerErr {
            code: "bad_params",
            message: format!("unknown page: {}", other),
            details: Some(json!({ "pages": ["futureForm", "signups"] })),
        }),
    }
}

fn handle_page_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    match load_page(state, req) {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "page.load" => Some(handle_page_load(state, req)),
        _ => None,
    }
}
