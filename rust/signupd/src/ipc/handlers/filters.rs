use super::signups::{table, view_after};
use crate::filters::FilterPatch;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_open(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    table.open_filter_modal();
    Ok(json!({ "view": table.view() }))
}

fn handle_update_draft(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let patch: FilterPatch = if req.params.is_null() {
        FilterPatch::default()
    } else {
        serde_json::from_value(req.params.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid filter fields: {}", e)))?
    };
    let table = table(state)?;
    table.edit_filters(patch).map_err(|e| HandlerErr {
        code: "bad_params",
        message: e.to_string(),
        details: Some(json!({ "field": "date" })),
    })?;
    Ok(json!({
        "draftDate": table.filters().draft_date_value(),
        "view": table.view(),
    }))
}

fn handle_cancel(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    table.cancel_filter_editing();
    Ok(json!({ "view": table.view() }))
}

fn handle_save(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let table = table(state)?;
    let result = table.save_filters();
    Ok(view_after(table, result))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "filters.open" => handle_open(state, req),
        "filters.updateDraft" => handle_update_draft(state, req),
        "filters.cancel" => handle_cancel(state, req),
        "filters.save" => handle_save(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
