use crate::api::{ApiError, BulkDeleteOutcome, ErrorKind, Signup, SignupsApi};
use crate::config::{Endpoints, SignupsConfig, ViewSettings};
use crate::filters::{FilterEditor, FilterPatch, FilterSet};
use crate::query::{QueryParams, SortState};
use crate::selection::{
    nothing_selected, select_all_state, selected_ids, toggle_select_all, SelectAllState,
};
use reqwest::Url;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Fetch,
    ConfirmAttendance,
    RemoveSelected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewError {
    pub kind: ErrorKind,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    url: Url,
}

impl FetchTicket {
    pub fn url(&self) -> &Url {
        &self.url
    }
}

pub struct SignupsTable<A> {
    api: A,
    endpoints: Endpoints,
    settings: ViewSettings,
    filters: FilterEditor,
    sort: SortState,
    signups: Vec<Signup>,
    error: Option<ViewError>,
    issued_seq: u64,
    applied_seq: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView<'a> {
    pub signups: &'a [Signup],
    pub error_occurred: bool,
    pub error: Option<&'a ViewError>,
    pub sort: &'a SortState,
    pub ordering: String,
    pub filters: &'a FilterSet,
    pub draft_filters: &'a FilterSet,
    pub filter_modal_open: bool,
    pub more_than_date_filter_active: bool,
    pub readable_date_filter: String,
    pub readable_reason_filter: &'static str,
    pub select_all: SelectAllState,
    pub nothing_selected: bool,
    pub query: String,
    pub spreadsheet_url: String,
}

impl<A: SignupsApi> SignupsTable<A> {
    pub fn new(config: &SignupsConfig, settings: ViewSettings, api: A) -> Self {
        Self {
            api,
            endpoints: config.endpoints.clone(),
            settings,
            filters: FilterEditor::new(FilterSet::new(config.default_date)),
            sort: SortState::new(config.default_sort.clone()),
            signups: Vec::new(),
            error: None,
            issued_seq: 0,
            applied_seq: 0,
        }
    }

    pub fn load(config: &SignupsConfig, settings: ViewSettings, api: A) -> Self {
        let mut table = Self::new(config, settings, api);
        // A failed first fetch is already recorded as the view error.
        let _ = table.update_signups();
        table
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[cfg(test)]
    pub fn signups(&self) -> &[Signup] {
        &self.signups
    }

    #[cfg(test)]
    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn filters(&self) -> &FilterEditor {
        &self.filters
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&ViewError> {
        self.error.as_ref()
    }

    pub fn error_occurred(&self) -> bool {
        self.error.is_some()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn record_error(&mut self, operation: Operation, e: &ApiError) {
        warn!(?operation, kind = ?e.kind(), "{e}");
        self.error = Some(ViewError {
            kind: e.kind(),
            operation,
            status: e.status(),
            message: e.to_string(),
        });
    }

    pub fn query(&self) -> QueryParams {
        QueryParams::build(
            self.filters.committed(),
            &self.sort,
            self.settings.student_id_param,
        )
    }

    pub fn list_url(&self) -> Url {
        self.query().apply_to(&self.endpoints.list)
    }

    pub fn spreadsheet_url(&self) -> Url {
        self.query().apply_to(&self.endpoints.spreadsheet)
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued_seq += 1;
        FetchTicket {
            seq: self.issued_seq,
            url: self.list_url(),
        }
    }

    /// Applies a list response. `Ok(false)` means the response was older than
    /// the rows already shown and was dropped.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Signup>, ApiError>,
    ) -> Result<bool, ApiError> {
        match result {
            Ok(rows) => {
                if ticket.seq <= self.applied_seq {
                    warn!(
                        seq = ticket.seq,
                        applied = self.applied_seq,
                        "dropping stale signups response"
                    );
                    return Ok(false);
                }
                info!(count = rows.len(), url = %ticket.url, "signups loaded");
                self.signups = rows;
                self.applied_seq = ticket.seq;
                if self.settings.clear_error_on_success {
                    self.error = None;
                }
                Ok(true)
            }
            Err(e) => {
                self.record_error(Operation::Fetch, &e);
                Err(e)
            }
        }
    }

    pub fn update_signups(&mut self) -> Result<(), ApiError> {
        let ticket = self.begin_fetch();
        let result = self.api.list(ticket.url());
        self.finish_fetch(ticket, result).map(|_| ())
    }

    /// PATCHes one row's confirmation. The row takes the value the server
    /// answers with, which may differ from `confirmed`.
    pub fn confirm_attendance(&mut self, id: i64, confirmed: bool) -> Result<(), ApiError> {
        let result = self
            .endpoints
            .individual_record(id)
            .map_err(|e| ApiError::Url(e.to_string()))
            .and_then(|url| self.api.patch_attendance(&url, confirmed));

        match result {
            Ok(update) => {
                match self.signups.iter_mut().find(|s| s.id == id) {
                    Some(row) => row.attendance_confirmed = update.attendance_confirmed,
                    None => warn!(id, "confirmed signup is no longer listed"),
                }
                info!(id, confirmed = update.attendance_confirmed, "attendance updated");
                Ok(())
            }
            Err(e) => {
                self.record_error(Operation::ConfirmAttendance, &e);
                Err(e)
            }
        }
    }

    pub fn sort(&mut self, key: &str) -> Result<(), ApiError> {
        self.sort.toggle(key);
        self.update_signups()
    }

    pub fn open_filter_modal(&mut self) {
        self.filters.begin_edit();
    }

    pub fn edit_filters(&mut self, patch: FilterPatch) -> anyhow::Result<()> {
        self.filters.edit_draft(patch)
    }

    pub fn cancel_filter_editing(&mut self) {
        self.filters.discard();
    }

    pub fn save_filters(&mut self) -> Result<(), ApiError> {
        self.filters.commit();
        self.update_signups()
    }

    pub fn set_selected(&mut self, id: i64, selected: bool) -> bool {
        match self.signups.iter_mut().find(|s| s.id == id) {
            Some(row) => {
                row.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn toggle_selected(&mut self, id: i64) -> bool {
        let current = self.signups.iter().find(|s| s.id == id).map(|s| s.selected);
        match current {
            Some(v) => self.set_selected(id, !v),
            None => false,
        }
    }

    pub fn toggle_select_all(&mut self) {
        toggle_select_all(&mut self.signups);
    }

    pub fn select_all_state(&self) -> SelectAllState {
        select_all_state(&self.signups)
    }

    pub fn nothing_selected(&self) -> bool {
        nothing_selected(&self.signups)
    }

    fn drop_deleted(&mut self, requested: &[i64], deleted: &[i64]) {
        self.signups
            .retain(|s| !(requested.contains(&s.id) && deleted.contains(&s.id)));
    }

    /// Rows leave the table only once the server reports them deleted. Any
    /// other selected id stays listed and selected.
    pub fn remove_multiple(&mut self) -> Result<(), ApiError> {
        let ids = selected_ids(&self.signups);
        if ids.is_empty() {
            return Ok(());
        }

        match self.api.delete_multiple(&self.endpoints.delete_multiple, &ids) {
            Ok(outcome) => {
                self.drop_deleted(&ids, &outcome.deleted);
                info!(
                    requested = ids.len(),
                    deleted = outcome.deleted.len(),
                    "signups deleted"
                );
                // Ids missing from the report count as not deleted.
                let kept: Vec<i64> = ids
                    .iter()
                    .copied()
                    .filter(|id| !outcome.deleted.contains(id))
                    .collect();
                if !kept.is_empty() {
                    self.record_partial_delete(ids.len(), &kept);
                }
                Ok(())
            }
            Err(e) => {
                if let ApiError::Status {
                    body: Some(body), ..
                } = &e
                {
                    if let Some(outcome) = BulkDeleteOutcome::from_body(body) {
                        self.drop_deleted(&ids, &outcome.deleted);
                    }
                }
                self.record_error(Operation::RemoveSelected, &e);
                Err(e)
            }
        }
    }

    fn record_partial_delete(&mut self, requested: usize, kept: &[i64]) {
        let message = format!(
            "{} of {} signups could not be deleted",
            kept.len(),
            requested
        );
        warn!(kept = ?kept, "{message}");
        self.error = Some(ViewError {
            kind: ErrorKind::Partial,
            operation: Operation::RemoveSelected,
            status: None,
            message,
        });
    }

    pub fn more_than_date_filter_active(&self) -> bool {
        self.filters.committed().more_than_date_active()
    }

    pub fn readable_date_filter(&self) -> String {
        self.filters.committed().readable_date()
    }

    pub fn readable_reason_filter(&self) -> &'static str {
        self.filters.committed().readable_reason()
    }

    pub fn view(&self) -> TableView<'_> {
        let list_url = self.list_url();
        TableView {
            signups: &self.signups,
            error_occurred: self.error_occurred(),
            error: self.error.as_ref(),
            sort: &self.sort,
            ordering: self.sort.ordering(),
            filters: self.filters.committed(),
            draft_filters: self.filters.draft(),
            filter_modal_open: self.filters.is_editing(),
            more_than_date_filter_active: self.more_than_date_filter_active(),
            readable_date_filter: self.readable_date_filter(),
            readable_reason_filter: self.readable_reason_filter(),
            select_all: self.select_all_state(),
            nothing_selected: self.nothing_selected(),
            query: list_url.query().unwrap_or_default().to_string(),
            spreadsheet_url: self.spreadsheet_url().to_string(),
        }
    }
}
