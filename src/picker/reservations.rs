//! Reservation table of an event
//!
//! Rows are added, edited in place and removed through the reservation
//! endpoints; the table only changes once the server confirms. At most one
//! row is edited at a time and the edit session belongs to the table.

use serde::{Deserialize, Serialize};

use crate::backend::types::StatusResponse;
use crate::error::{ListEditError, SubmitError};

/// A block of reserved slots. The server identifies reservations by description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub description: String,
    pub slots: u32,
    #[serde(default)]
    pub email: String,
}

/// Raw input values of a reservation row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub description: String,
    pub slots: String,
    pub email: String,
}

impl Default for ReservationDraft {
    fn default() -> Self {
        Self {
            description: String::new(),
            slots: "1".to_string(),
            email: String::new(),
        }
    }
}

impl From<&Reservation> for ReservationDraft {
    fn from(reservation: &Reservation) -> Self {
        Self {
            description: reservation.description.clone(),
            slots: reservation.slots.to_string(),
            email: reservation.email.clone(),
        }
    }
}

impl ReservationDraft {
    pub fn parse(&self) -> Result<Reservation, ListEditError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ListEditError::EmptyValue("description".to_string()));
        }
        let slots = match self.slots.trim().parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => {
                return Err(ListEditError::Invalid {
                    field: "slots".to_string(),
                    value: self.slots.clone(),
                })
            }
        };
        Ok(Reservation {
            description: description.to_string(),
            slots,
            email: self.email.trim().to_string(),
        })
    }
}

/// A change waiting for the server's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    Add(Reservation),
    Edit {
        original_description: String,
        reservation: Reservation,
    },
    Remove {
        description: String,
    },
}

/// The row being edited, tracked by its description on the server so
/// that rows shifting underneath do not redirect the edit
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditSession {
    original_description: String,
    draft: ReservationDraft,
}

#[derive(Debug, Default)]
pub struct ReservationTable {
    rows: Vec<Reservation>,
    editing: Option<EditSession>,
    new_entry: Option<ReservationDraft>,
    slots_available: Option<u32>,
    transmission_error: Option<String>,
}

impl ReservationTable {
    pub fn new(rows: Vec<Reservation>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[Reservation] {
        &self.rows
    }

    /// Index of the row currently being edited
    pub fn editing_index(&self) -> Option<usize> {
        let session = self.editing.as_ref()?;
        self.position(&session.original_description)
    }

    fn position(&self, description: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.description == description)
    }

    pub fn edit_draft_mut(&mut self) -> Option<&mut ReservationDraft> {
        self.editing.as_mut().map(|s| &mut s.draft)
    }

    pub fn edit_draft(&self) -> Option<&ReservationDraft> {
        self.editing.as_ref().map(|s| &s.draft)
    }

    pub fn new_entry(&self) -> Option<&ReservationDraft> {
        self.new_entry.as_ref()
    }

    pub fn new_entry_mut(&mut self) -> Option<&mut ReservationDraft> {
        self.new_entry.as_mut()
    }

    /// Remaining capacity reported by the last overbooked answer
    pub fn slots_available(&self) -> Option<u32> {
        self.slots_available
    }

    pub fn transmission_error(&self) -> Option<&str> {
        self.transmission_error.as_deref()
    }

    fn clear_messages(&mut self) {
        self.slots_available = None;
        self.transmission_error = None;
    }

    /// Start editing a row. A running edit is cancelled first.
    pub fn begin_edit(&mut self, index: usize) {
        self.clear_messages();
        self.new_entry = None;
        self.cancel_edit();
        if let Some(row) = self.rows.get(index) {
            self.editing = Some(EditSession {
                original_description: row.description.clone(),
                draft: ReservationDraft::from(row),
            });
        }
    }

    /// Drop the edit session; the row shows its original values again
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn save_edit(&mut self) -> Result<Option<PendingChange>, ListEditError> {
        self.clear_messages();
        let Some(session) = &self.editing else {
            return Ok(None);
        };
        if self.position(&session.original_description).is_none() {
            self.editing = None;
            return Ok(None);
        }
        let reservation = session.draft.parse()?;
        Ok(Some(PendingChange::Edit {
            original_description: session.original_description.clone(),
            reservation,
        }))
    }

    /// Show the empty "new reservation" row
    pub fn begin_add(&mut self) {
        self.clear_messages();
        self.cancel_edit();
        self.new_entry = Some(ReservationDraft::default());
    }

    pub fn cancel_add(&mut self) {
        self.clear_messages();
        self.new_entry = None;
    }

    pub fn submit_add(&mut self) -> Result<Option<PendingChange>, ListEditError> {
        self.clear_messages();
        match &self.new_entry {
            Some(draft) => draft.parse().map(|r| Some(PendingChange::Add(r))),
            None => Ok(None),
        }
    }

    pub fn request_remove(&mut self, index: usize) -> Option<PendingChange> {
        self.clear_messages();
        self.new_entry = None;
        self.cancel_edit();
        self.rows.get(index).map(|row| PendingChange::Remove {
            description: row.description.clone(),
        })
    }

    /// Apply the server's answer to a pending change
    pub fn apply_response(
        &mut self,
        change: PendingChange,
        response: Result<StatusResponse, SubmitError>,
    ) {
        match response {
            Ok(StatusResponse::Ok) => self.commit(change),
            Ok(StatusResponse::Overbooked { slots_available }) => {
                tracing::info!(slots_available, "Reservation rejected: event overbooked");
                self.slots_available = Some(slots_available);
            }
            Ok(StatusResponse::Error { message }) => {
                tracing::warn!("Reservation change rejected: {}", message);
                self.transmission_error = Some(message);
            }
            Err(err) => {
                tracing::warn!("Reservation change failed: {}", err);
                self.transmission_error = Some(err.to_string());
            }
        }
    }

    fn is_editing(&self, description: &str) -> bool {
        self.editing
            .as_ref()
            .is_some_and(|s| s.original_description == description)
    }

    fn commit(&mut self, change: PendingChange) {
        match change {
            PendingChange::Add(reservation) => {
                self.rows.push(reservation);
                self.new_entry = None;
            }
            PendingChange::Edit {
                original_description,
                reservation,
            } => {
                if self.is_editing(&original_description) {
                    self.editing = None;
                }
                if let Some(row) = self
                    .rows
                    .iter_mut()
                    .find(|r| r.description == original_description)
                {
                    *row = reservation;
                }
            }
            PendingChange::Remove { description } => {
                if self.is_editing(&description) {
                    self.editing = None;
                }
                self.rows.retain(|r| r.description != description);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(description: &str, slots: u32) -> Reservation {
        Reservation {
            description: description.to_string(),
            slots,
            email: String::new(),
        }
    }

    fn table() -> ReservationTable {
        ReservationTable::new(vec![reservation("Bus group", 10), reservation("Choir", 4)])
    }

    #[test]
    fn test_only_one_row_edited_at_a_time() {
        let mut table = table();
        table.begin_edit(0);
        table.edit_draft_mut().unwrap().description = "Changed".to_string();

        table.begin_edit(1);
        assert_eq!(table.editing_index(), Some(1));
        assert_eq!(table.edit_draft().unwrap().description, "Choir");
        assert_eq!(table.rows()[0].description, "Bus group");
    }

    #[test]
    fn test_edit_commits_on_ok() {
        let mut table = table();
        table.begin_edit(1);
        table.edit_draft_mut().unwrap().slots = "6".to_string();

        let change = table.save_edit().unwrap().unwrap();
        assert_eq!(
            change,
            PendingChange::Edit {
                original_description: "Choir".to_string(),
                reservation: reservation("Choir", 6),
            }
        );
        table.apply_response(change, Ok(StatusResponse::Ok));

        assert_eq!(table.rows()[1].slots, 6);
        assert_eq!(table.editing_index(), None);
    }

    #[test]
    fn test_overbooked_keeps_edit_open() {
        let mut table = table();
        table.begin_edit(0);
        table.edit_draft_mut().unwrap().slots = "50".to_string();
        let change = table.save_edit().unwrap().unwrap();

        table.apply_response(change, Ok(StatusResponse::Overbooked { slots_available: 12 }));
        assert_eq!(table.slots_available(), Some(12));
        assert_eq!(table.editing_index(), Some(0));
        assert_eq!(table.rows()[0].slots, 10);
    }

    #[test]
    fn test_add_flow() {
        let mut table = table();
        table.begin_edit(0);
        table.begin_add();
        assert_eq!(table.editing_index(), None);
        assert_eq!(table.new_entry().unwrap().slots, "1");

        table.new_entry_mut().unwrap().description = "Late arrivals".to_string();
        let change = table.submit_add().unwrap().unwrap();
        table.apply_response(change, Ok(StatusResponse::Ok));

        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[2], reservation("Late arrivals", 1));
        assert!(table.new_entry().is_none());
    }

    #[test]
    fn test_invalid_draft_is_rejected_locally() {
        let mut table = table();
        table.begin_add();
        table.new_entry_mut().unwrap().description = "Guests".to_string();
        table.new_entry_mut().unwrap().slots = "0".to_string();

        assert!(matches!(
            table.submit_add(),
            Err(ListEditError::Invalid { .. })
        ));
    }

    #[test]
    fn test_remove_failure_shows_transmission_error() {
        let mut table = table();
        let change = table.request_remove(0).unwrap();
        table.apply_response(
            change,
            Err(SubmitError::Transport {
                url: "http://localhost/api/events/removeReservation".to_string(),
                message: "connection refused".to_string(),
            }),
        );

        assert_eq!(table.rows().len(), 2);
        assert!(table.transmission_error().is_some());

        let change = table.request_remove(0).unwrap();
        assert!(table.transmission_error().is_none());
        table.apply_response(change, Ok(StatusResponse::Ok));
        assert_eq!(table.rows(), &[reservation("Choir", 4)]);
    }

    #[test]
    fn test_edit_follows_row_after_earlier_row_removed() {
        let mut table = ReservationTable::new(vec![
            reservation("Bus group", 10),
            reservation("Choir", 4),
            reservation("Guests", 2),
        ]);
        let remove = table.request_remove(0).unwrap();
        table.begin_edit(1);
        table.edit_draft_mut().unwrap().slots = "5".to_string();

        table.apply_response(remove, Ok(StatusResponse::Ok));
        assert_eq!(table.editing_index(), Some(0));

        let change = table.save_edit().unwrap().unwrap();
        assert_eq!(
            change,
            PendingChange::Edit {
                original_description: "Choir".to_string(),
                reservation: reservation("Choir", 5),
            }
        );
        table.apply_response(change, Ok(StatusResponse::Ok));
        assert_eq!(
            table.rows(),
            &[reservation("Choir", 5), reservation("Guests", 2)]
        );
    }

    #[test]
    fn test_removing_edited_row_ends_edit() {
        let mut table = table();
        let remove = table.request_remove(1).unwrap();
        table.begin_edit(1);

        table.apply_response(remove, Ok(StatusResponse::Ok));
        assert_eq!(table.editing_index(), None);
        assert_eq!(table.save_edit(), Ok(None));
    }

    #[test]
    fn test_remove_cancels_running_edit() {
        let mut table = table();
        table.begin_edit(0);
        table.request_remove(1);
        assert_eq!(table.editing_index(), None);
        assert!(table.request_remove(7).is_none());
    }
}
