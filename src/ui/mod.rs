//! Widgets shared by the form views

pub mod search_bar;
pub mod theme;
