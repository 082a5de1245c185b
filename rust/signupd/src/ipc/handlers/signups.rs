use crate::api::{ApiError, HttpApi};
use crate::ipc::error::{get_required_bool, get_required_i64, get_required_str, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::signups_table::SignupsTable;
use serde_json::json;

pub(crate) fn table(state: &mut AppState) -> Result<&mut SignupsTable<HttpApi>, HandlerErr> {
    state
        .signups
        .as_mut()
        .ok_or_else(|| HandlerErr::no_page("signups"))
}

/// Backend failures are part of the view (`errorOccurred`), so they still
/// answer `ok`; `outcome` says whether this call's request went through.
pub(crate) fn view_after(
    table: &SignupsTable<HttpApi>,
    result: Result<(), ApiError>,
) -> serde_json::Value {
    json!({
        "outcome": if result.is_ok() { "ok" } else { "failed" },
        "view": table.view(),
    })
}

fn handle_view(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    Ok(json!({ "view": table.view() }))
}

fn handle_refresh(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    let result = table.update_signups();
    Ok(view_after(table, result))
}

fn handle_sort(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let key = get_required_str(&req.params, "key")?.trim();
    if key.is_empty() {
        return Err(HandlerErr::bad_params("key must not be empty"));
    }
    let table = table(state)?;
    let result = table.sort(key);
    Ok(view_after(table, result))
}

fn handle_confirm_attendance(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(&req.params, "id")?;
    let confirmed = get_required_bool(&req.params, "confirmed")?;
    let table = table(state)?;
    let result = table.confirm_attendance(id, confirmed);
    Ok(view_after(table, result))
}

fn handle_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(&req.params, "id")?;
    let selected = req.params.get("selected").and_then(|v| v.as_bool());
    let table = table(state)?;
    let found = match selected {
        Some(v) => table.set_selected(id, v),
        None => table.toggle_selected(id),
    };
    if !found {
        return Err(HandlerErr {
            code: "not_found",
            message: "signup not listed".to_string(),
            details: Some(json!({ "id": id })),
        });
    }
    Ok(json!({ "view": table.view() }))
}

fn handle_select_all(
    state: &mut AppState,
    _req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    table.toggle_select_all();
    Ok(json!({ "view": table.view() }))
}

fn handle_remove_selected(
    state: &mut AppState,
    _req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    let result = table.remove_multiple();
    Ok(view_after(table, result))
}

fn handle_spreadsheet_url(
    state: &mut AppState,
    _req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    Ok(json!({ "url": table.spreadsheet_url().as_str(), "target": "_blank" }))
}

fn handle_clear_error(
    state: &mut AppState,
    _req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    table.clear_error();
    Ok(json!({ "view": table.view() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "signups.view" => handle_view(state, req),
        "signups.refresh" => handle_refresh(state, req),
        "signups.sort" => handle_sort(state, req),
        "signups.confirmAttendance" => handle_confirm_attendance(state, req),
        "signups.select" => handle_select(state, req),
        "signups.selectAll" => handle_select_all(state, req),
        "signups.removeSelected" => handle_remove_selected(state, req),
        "signups.spreadsheetUrl" => handle_spreadsheet_url(state, req),
        "signups.clearError" => handle_clear_error(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
