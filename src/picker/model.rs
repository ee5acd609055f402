//! Picker data model
//!
//! Queries sent to a catalog, the candidates it returns and the entries the
//! user commits into the host form. `Selection` is the single source of truth
//! for what the host form will submit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter values for one search, in the order of the configured filter fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    fields: Vec<(String, String)>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder variant of [`SearchQuery::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a filter value. Blank values remove the field from the query.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let value = value.trim();

        self.fields.retain(|(existing, _)| *existing != name);
        if !value.is_empty() {
            self.fields.push((name, value.to_string()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Opaque identifier of a catalog record. Servers send either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

/// A search result row. Lives only while one result set is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    /// Extra display columns (date of birth, address, dates...)
    pub details: Vec<String>,
}

/// A candidate committed into the host form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub id: RecordId,
    pub title: String,
    pub description: String,
}

impl From<&CandidateRecord> for SelectionEntry {
    fn from(record: &CandidateRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
        }
    }
}

/// One hidden input of the host form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered set of committed entries, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns `false` and leaves the selection untouched if
    /// the id is already present.
    pub fn insert(&mut self, entry: SelectionEntry) -> bool {
        if self.contains(&entry.id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove exactly the entry with this id, keeping the order of the rest.
    pub fn remove(&mut self, id: &RecordId) -> Option<SelectionEntry> {
        let index = self.entries.iter().position(|e| &e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.entries.iter().any(|e| &e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Hidden inputs transmitting the selected ids, one per entry.
    pub fn form_fields(&self, field_name: &str) -> Vec<FormField> {
        self.entries
            .iter()
            .map(|e| FormField::new(field_name, e.id.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, title: &str) -> SelectionEntry {
        SelectionEntry {
            id: RecordId::Number(id),
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_query_drops_blank_fields() {
        let query = SearchQuery::new()
            .with("firstname", "Anna")
            .with("lastname", "   ")
            .with("city", "");

        assert_eq!(query.len(), 1);
        assert_eq!(query.get("firstname"), Some("Anna"));
        assert_eq!(query.get("lastname"), None);
    }

    #[test]
    fn test_query_set_replaces_and_clears() {
        let mut query = SearchQuery::new().with("city", "Berlin");
        query.set("city", "Dresden");
        assert_eq!(query.get("city"), Some("Dresden"));

        query.set("city", "");
        assert!(query.is_empty());
    }

    #[test]
    fn test_record_id_accepts_numbers_and_strings() {
        let ids: Vec<RecordId> = serde_json::from_str(r#"[1, "a-7"]"#).unwrap();
        assert_eq!(ids, vec![RecordId::Number(1), RecordId::from("a-7")]);
        assert_eq!(ids[0].to_string(), "1");
        assert_eq!(ids[1].to_string(), "a-7");
    }

    #[test]
    fn test_selection_rejects_duplicate_ids() {
        let mut selection = Selection::new();
        assert!(selection.insert(entry(1, "Anna")));
        assert!(!selection.insert(entry(1, "Anna (updated)")));

        assert_eq!(selection.len(), 1);
        assert_eq!(selection.iter().next().unwrap().title, "Anna");
    }

    #[test]
    fn test_selection_remove_keeps_order() {
        let mut selection = Selection::new();
        for (id, name) in [(1, "Anna"), (2, "Ben"), (3, "Carla")] {
            selection.insert(entry(id, name));
        }

        let removed = selection.remove(&RecordId::Number(2));
        assert_eq!(removed.map(|e| e.title), Some("Ben".to_string()));

        let titles: Vec<_> = selection.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Anna", "Carla"]);
        assert_eq!(selection.remove(&RecordId::Number(2)), None);
    }

    #[test]
    fn test_selection_form_fields() {
        let mut selection = Selection::new();
        selection.insert(entry(1, "Anna"));
        selection.insert(entry(4, "Dora"));

        assert_eq!(
            selection.form_fields("participants"),
            vec![
                FormField::new("participants", "1"),
                FormField::new("participants", "4"),
            ]
        );
    }
}
