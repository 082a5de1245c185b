use crate::date_range::DateRangeEditor;
use crate::ipc::error::{get_required_str, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn editor(state: &mut AppState) -> Result<&mut DateRangeEditor, HandlerErr> {
    state
        .date_range
        .as_mut()
        .ok_or_else(|| HandlerErr::no_page("futureForm"))
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn set_bound(
    state: &mut AppState,
    req: &Request,
    bound: Bound,
) -> Result<serde_json::Value, HandlerErr> {
    let value = get_required_str(&req.params, "value")?;
    let editor = editor(state)?;
    let result = match bound {
        Bound::Start => editor.set_start_value(value),
        Bound::End => editor.set_end_value(value),
    };
    result.map_err(|e| HandlerErr {
        code: "bad_params",
        message: e.to_string(),
        details: Some(json!({ "value": value })),
    })?;
    Ok(json!({ "view": editor.view() }))
}

fn respond(req: &Request, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "dateRange.get" => editor(state).map(|e| json!({ "view": e.view() })),
        "dateRange.setStart" => set_bound(state, req, Bound::Start),
        "dateRange.setEnd" => set_bound(state, req, Bound::End),
        "dateRange.formFields" => editor(state).map(|e| json!({ "fields": e.form_fields() })),
        _ => return None,
    };
    Some(respond(req, result))
}
