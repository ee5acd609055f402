//! Entity picker
//!
//! Searches a remote catalog, shows the candidates, lets the user check one
//! or more rows and commits them into the host form as hidden fields. The
//! picker owns its state; the UI only renders it.
//!
//! Phases: `Idle -> Searching -> ResultsShown -> Idle` (close or new search),
//! with `Failed` as the recoverable error state. Committed entries live in a
//! [`Selection`] that survives searches until removed or reset.

pub mod list_editor;
pub mod model;
pub mod reservations;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::api::Catalog;
use crate::config::{PickerConfig, SelectionMode};
use crate::error::SearchError;
use model::{CandidateRecord, FormField, RecordId, SearchQuery, Selection, SelectionEntry};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PickerPhase {
    #[default]
    Idle,
    Searching,
    ResultsShown,
    Failed(SearchError),
}

/// A dispatched search. The answer must come back with the same `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: SearchQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    pub seq: u64,
    pub outcome: Result<Vec<CandidateRecord>, SearchError>,
}

/// What `finish_search` did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Rows rendered (count of the returned batch)
    Shown(usize),
    /// Empty batch, "no results" indicator on
    Empty,
    Failed,
    /// Superseded by a later search or by closing the picker
    Stale,
}

pub struct EntityPicker {
    config: PickerConfig,
    phase: PickerPhase,
    open: bool,
    filters: Vec<String>,
    candidates: Vec<CandidateRecord>,
    checked: HashSet<RecordId>,
    no_results: bool,
    last_seq: u64,
    last_query: Option<SearchQuery>,
    selection: Selection,
}

impl EntityPicker {
    pub fn new(config: PickerConfig) -> Self {
        let filters = vec![String::new(); config.filter_fields.len()];
        Self {
            config,
            phase: PickerPhase::Idle,
            open: false,
            filters,
            candidates: Vec::new(),
            checked: HashSet::new(),
            no_results: false,
            last_seq: 0,
            last_query: None,
            selection: Selection::new(),
        }
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn phase(&self) -> &PickerPhase {
        &self.phase
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_searching(&self) -> bool {
        self.phase == PickerPhase::Searching
    }

    pub fn show_no_results(&self) -> bool {
        self.no_results
    }

    pub fn error(&self) -> Option<&SearchError> {
        match &self.phase {
            PickerPhase::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn candidates(&self) -> &[CandidateRecord] {
        &self.candidates
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn filter_value(&self, index: usize) -> &str {
        self.filters.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn set_filter(&mut self, index: usize, value: String) {
        if let Some(slot) = self.filters.get_mut(index) {
            *slot = value;
        }
    }

    /// Query built from the current filter inputs
    pub fn query(&self) -> SearchQuery {
        self.config
            .filter_fields
            .iter()
            .zip(&self.filters)
            .fold(SearchQuery::new(), |query, (field, value)| {
                query.with(field.name.as_str(), value.as_str())
            })
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close the modal. Candidates and checks are discarded, the selection stays.
    pub fn close(&mut self) {
        self.open = false;
        self.phase = PickerPhase::Idle;
        self.candidates.clear();
        self.checked.clear();
        self.no_results = false;
    }

    /// Start a search from the filter inputs
    pub fn begin_search(&mut self) -> SearchTicket {
        let query = self.query();
        self.begin_search_with(query)
    }

    pub fn begin_search_with(&mut self, query: SearchQuery) -> SearchTicket {
        self.last_seq += 1;
        self.open = true;
        self.phase = PickerPhase::Searching;
        self.no_results = false;
        if !self.config.append_mode {
            self.candidates.clear();
            self.checked.clear();
        }
        self.last_query = Some(query.clone());

        tracing::debug!(picker = %self.config.name, seq = self.last_seq, fields = query.len(), "Search dispatched");

        SearchTicket {
            seq: self.last_seq,
            query,
        }
    }

    /// Re-issue the last query after a failure
    pub fn retry(&mut self) -> Option<SearchTicket> {
        if !matches!(self.phase, PickerPhase::Failed(_)) {
            return None;
        }
        let query = self.last_query.clone()?;
        Some(self.begin_search_with(query))
    }

    /// Apply a search answer. Only the most recently dispatched search counts.
    pub fn finish_search(&mut self, response: SearchResponse) -> SearchOutcome {
        if response.seq != self.last_seq || self.phase != PickerPhase::Searching {
            tracing::debug!(picker = %self.config.name, seq = response.seq, latest = self.last_seq, "Dropping stale search response");
            return SearchOutcome::Stale;
        }

        match response.outcome {
            Ok(batch) => {
                let count = batch.len();
                self.candidates.extend(batch);
                self.phase = PickerPhase::ResultsShown;
                self.no_results = count == 0;
                tracing::debug!(picker = %self.config.name, seq = response.seq, count, "Search finished");
                if count == 0 {
                    SearchOutcome::Empty
                } else {
                    SearchOutcome::Shown(count)
                }
            }
            Err(err) => {
                tracing::warn!(picker = %self.config.name, seq = response.seq, "Search failed: {}", err);
                self.phase = PickerPhase::Failed(err);
                SearchOutcome::Failed
            }
        }
    }

    pub fn is_checked(&self, id: &RecordId) -> bool {
        self.checked.contains(id)
    }

    /// Check or uncheck a candidate row. Ids not on display are ignored.
    pub fn toggle_checked(&mut self, id: &RecordId) {
        if !self.candidates.iter().any(|c| &c.id == id) {
            return;
        }
        if self.checked.remove(id) {
            return;
        }
        if self.config.selection_mode == SelectionMode::Single {
            self.checked.clear();
        }
        self.checked.insert(id.clone());
    }

    /// Commit the checked candidates and close the modal. Ids already in the
    /// selection are skipped. Returns the newly added entries.
    pub fn confirm_selection(&mut self) -> Vec<SelectionEntry> {
        let mut added = Vec::new();
        for candidate in &self.candidates {
            if !self.checked.contains(&candidate.id) {
                continue;
            }
            let entry = SelectionEntry::from(candidate);
            if self.selection.insert(entry.clone()) {
                added.push(entry);
            }
        }

        tracing::info!(picker = %self.config.name, added = added.len(), total = self.selection.len(), "Selection confirmed");
        self.close();
        added
    }

    pub fn remove_selection(&mut self, id: &RecordId) -> Option<SelectionEntry> {
        let removed = self.selection.remove(id);
        if removed.is_some() {
            tracing::debug!(picker = %self.config.name, %id, "Selection entry removed");
        }
        removed
    }

    /// Hidden inputs for the host form
    pub fn form_fields(&self) -> Vec<FormField> {
        self.selection.form_fields(&self.config.field_name)
    }

    /// Host form submitted or reset: drop everything
    pub fn reset(&mut self) {
        self.selection.clear();
        self.close();
    }
}

/// Execute a ticket against a catalog, bounded by `timeout`
pub async fn run_search(
    catalog: Arc<dyn Catalog>,
    ticket: SearchTicket,
    timeout: Duration,
) -> SearchResponse {
    let outcome = match tokio::time::timeout(timeout, catalog.search(&ticket.query)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SearchError::Timeout(timeout.as_secs())),
    };
    SearchResponse {
        seq: ticket.seq,
        outcome,
    }
}
