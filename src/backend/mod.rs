//! Server communication: catalog searches, reservations, host form submission

pub mod api;
pub mod types;
