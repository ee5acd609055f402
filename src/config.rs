//! Application configuration
//!
//! Read from `<config dir>/adebar-picker/config.json` when present, then
//! overridden by `ADEBAR_*` environment variables. Every picker on the host
//! form is one `PickerConfig` entry; call sites differ only in configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::picker::reservations::Reservation;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;

/// How many candidate rows may be checked at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Radio behaviour: checking a row unchecks all others
    Single,
    #[default]
    Multiple,
}

/// Record layout returned by a search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogShape {
    /// `{id, name, dob?, address?}`
    #[default]
    Person,
    /// `{id, name, startDate, endDate, place}`
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

/// A free-text input whose value becomes a query entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub name: String,
    pub label: String,
}

impl FilterField {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
        }
    }
}

/// Configuration of one picker instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerConfig {
    /// Identifies the picker on the command line and in logs
    pub name: String,
    pub label: String,
    /// Absolute URL or path relative to `AppConfig::base_url`
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub shape: CatalogShape,
    pub filter_fields: Vec<FilterField>,
    /// Name of the hidden input carrying a selected id
    pub field_name: String,
    /// Append new results to the displayed ones instead of replacing them
    #[serde(default)]
    pub append_mode: bool,
    #[serde(default)]
    pub selection_mode: SelectionMode,
}

impl PickerConfig {
    fn person_search(name: &str, label: &str, endpoint: &str, field_name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            endpoint: endpoint.to_string(),
            method: HttpMethod::Post,
            shape: CatalogShape::Person,
            filter_fields: vec![
                FilterField::new("firstname", "First name"),
                FilterField::new("lastname", "Last name"),
                FilterField::new("city", "City"),
            ],
            field_name: field_name.to_string(),
            append_mode: false,
            selection_mode: SelectionMode::Multiple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Form field the CSRF token is sent in
    pub csrf_field: String,
    pub csrf_token: Option<String>,
    pub search_timeout_secs: u64,
    /// Host form action the collected hidden inputs are posted to
    pub form_action: String,
    /// Event whose reservations are edited, if any
    pub event_id: Option<String>,
    /// Reservations already stored for `event_id`
    pub reservations: Vec<Reservation>,
    pub pickers: Vec<PickerConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            csrf_field: "_csrf".to_string(),
            csrf_token: None,
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            form_action: "/events/update".to_string(),
            event_id: None,
            reservations: Vec::new(),
            pickers: vec![
                PickerConfig::person_search(
                    "participants",
                    "Participants",
                    "/api/persons/simpleSearch",
                    "participants",
                ),
                PickerConfig {
                    selection_mode: SelectionMode::Single,
                    ..PickerConfig::person_search(
                        "counselors",
                        "Counselor",
                        "/api/persons/activists/simpleSearch",
                        "counselors",
                    )
                },
            ],
        }
    }
}

impl AppConfig {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply `ADEBAR_*` overrides using the given variable lookup.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("ADEBAR_BASE_URL") {
            self.base_url = url;
        }
        if let Some(token) = lookup("ADEBAR_CSRF_TOKEN") {
            self.csrf_token = Some(token);
        }
        if let Some(action) = lookup("ADEBAR_FORM_ACTION") {
            self.form_action = action;
        }
        if let Some(event) = lookup("ADEBAR_EVENT_ID") {
            self.event_id = Some(event);
        }
        if let Some(raw) = lookup("ADEBAR_SEARCH_TIMEOUT_SECS") {
            self.search_timeout_secs = match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Env {
                        var: "ADEBAR_SEARCH_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            };
        }
        Ok(())
    }

    /// Search timeout, at least one second
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs.max(1))
    }

    /// Resolve an endpoint against the base URL. Absolute URLs pass through.
    pub fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    pub fn picker(&self, name: &str) -> Option<&PickerConfig> {
        self.pickers.iter().find(|p| p.name == name)
    }
}

/// Location of the optional config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("adebar-picker").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_describe_person_pickers() {
        let config = AppConfig::default();
        let participants = config.picker("participants").unwrap();
        assert_eq!(participants.endpoint, "/api/persons/simpleSearch");
        assert_eq!(participants.selection_mode, SelectionMode::Multiple);

        let counselors = config.picker("counselors").unwrap();
        assert_eq!(counselors.endpoint, "/api/persons/activists/simpleSearch");
        assert_eq!(counselors.selection_mode, SelectionMode::Single);
        assert!(config.picker("rooms").is_none());
    }

    #[test]
    fn test_resolve_url() {
        let config = AppConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolve_url("/api/persons/simpleSearch"),
            "http://localhost:8080/api/persons/simpleSearch"
        );
        assert_eq!(
            config.resolve_url("https://example.org/api"),
            "https://example.org/api"
        );
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ADEBAR_BASE_URL", "http://adebar.local"),
            ("ADEBAR_CSRF_TOKEN", "token-1"),
            ("ADEBAR_SEARCH_TIMEOUT_SECS", "3"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env(|var| vars.get(var).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://adebar.local");
        assert_eq!(config.csrf_token.as_deref(), Some("token-1"));
        assert_eq!(config.search_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|var| {
            (var == "ADEBAR_SEARCH_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Env { .. })));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|var| {
            (var == "ADEBAR_SEARCH_TIMEOUT_SECS").then(|| "0".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Env { .. })));
        assert_eq!(config.search_timeout_secs, DEFAULT_SEARCH_TIMEOUT_SECS);

        let from_file: AppConfig = serde_json::from_str(r#"{"search_timeout_secs": 0}"#).unwrap();
        assert_eq!(from_file.search_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_existing_reservations_from_file() {
        let raw = r#"{
            "event_id": "ev-7",
            "reservations": [
                {"description": "Bus group", "slots": 10, "email": "bus@example.org"},
                {"description": "Choir", "slots": 4}
            ]
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.reservations.len(), 2);
        assert_eq!(config.reservations[0].email, "bus@example.org");
        assert_eq!(config.reservations[1].slots, 4);
        assert!(config.reservations[1].email.is_empty());
        assert!(AppConfig::default().reservations.is_empty());
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let raw = r#"{
            "base_url": "http://intranet",
            "pickers": [{
                "name": "events",
                "label": "Events",
                "endpoint": "/api/events/localGroup",
                "method": "GET",
                "shape": "event",
                "filter_fields": [{"name": "groupId", "label": "Local group"}],
                "field_name": "events",
                "append_mode": true
            }]
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.csrf_field, "_csrf");
        assert_eq!(config.search_timeout_secs, DEFAULT_SEARCH_TIMEOUT_SECS);
        let events = config.picker("events").unwrap();
        assert_eq!(events.method, HttpMethod::Get);
        assert_eq!(events.shape, CatalogShape::Event);
        assert!(events.append_mode);
        assert_eq!(events.selection_mode, SelectionMode::Multiple);
    }
}
